//! Contract tests for `FirestoreStore` against a mocked Firestore REST API.

use std::sync::Arc;

use classbase_auth::AccessTokenSource;
use classbase_auth::credentials::http_client;
use classbase_config::{FirebaseConfig, ServiceAccountKey};
use classbase_store::{DocumentPath, DocumentStore, FieldValue, Fields, FirestoreStore, StoreError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS: &str = "/v1/projects/classbase-test/databases/(default)/documents";
const ROOT: &str = "projects/classbase-test/databases/(default)/documents";

fn store(server: &MockServer) -> FirestoreStore {
    let key: ServiceAccountKey = serde_json::from_value(json!({
        "project_id": "classbase-test",
        "private_key": "unused",
        "client_email": "svc@classbase-test.iam.gserviceaccount.com"
    }))
    .unwrap();
    let mut config = FirebaseConfig::new(key);
    config.firestore_url = server.uri();

    FirestoreStore::new(
        &config,
        http_client(5).unwrap(),
        Arc::new(AccessTokenSource::fixed("test-access-token")),
    )
}

fn user_fields() -> Fields {
    let mut fields = Fields::new();
    fields.insert("email".into(), "a@example.com".into());
    fields.insert("role".into(), "teacher".into());
    fields.insert("class".into(), DocumentPath::new("classes", "c1").into());
    fields
}

#[tokio::test]
async fn get_decodes_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/u1")))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{ROOT}/users/u1"),
            "fields": {
                "email": { "stringValue": "a@example.com" },
                "class": { "referenceValue": format!("{ROOT}/classes/c1") }
            },
            "createTime": "2024-09-01T08:00:00Z",
            "updateTime": "2024-09-01T08:00:00Z"
        })))
        .mount(&server)
        .await;

    let doc = store(&server)
        .get(&DocumentPath::new("users", "u1"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(doc.path, DocumentPath::new("users", "u1"));
    assert_eq!(doc.fields["email"], FieldValue::from("a@example.com"));
    assert_eq!(
        doc.fields["class"].as_reference(),
        Some(&DocumentPath::new("classes", "c1"))
    );
}

#[tokio::test]
async fn get_missing_document_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/ghost")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    assert!(
        store(&server)
            .get(&DocumentPath::new("users", "ghost"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn set_sends_encoded_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/users/u1")))
        .and(body_partial_json(json!({
            "fields": {
                "email": { "stringValue": "a@example.com" },
                "class": { "referenceValue": format!("{ROOT}/classes/c1") }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{ROOT}/users/u1")
        })))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .set(&DocumentPath::new("users", "u1"), user_fields())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn update_masks_fields_and_requires_existence() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/users/u1")))
        .and(query_param("updateMask.fieldPaths", "role"))
        .and(query_param("currentDocument.exists", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{ROOT}/users/u1")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("role".into(), "admin".into());
    store(&server)
        .update(&DocumentPath::new("users", "u1"), fields)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_missing_document_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/users/ghost")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("role".into(), "admin".into());
    let result = store(&server)
        .update(&DocumentPath::new("users", "ghost"), fields)
        .await;

    assert!(matches!(result, Err(StoreError::NotFound(p)) if p == "users/ghost"));
}

#[tokio::test]
async fn delete_tolerates_missing_document() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DOCUMENTS}/users/u1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DOCUMENTS}/users/ghost")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store(&server);
    store.delete(&DocumentPath::new("users", "u1")).await.unwrap();
    store.delete(&DocumentPath::new("users", "ghost")).await.unwrap();
}

#[tokio::test]
async fn list_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users")))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "name": format!("{ROOT}/users/u2"),
                "fields": { "role": { "stringValue": "admin" } }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "name": format!("{ROOT}/users/u1"),
                "fields": { "role": { "stringValue": "teacher" } }
            }],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let docs = store(&server).list("users").await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.path.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2"]);
    assert_eq!(docs[1].fields["role"], FieldValue::from("admin"));
}

#[tokio::test]
async fn list_empty_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(store(&server).list("users").await.unwrap().is_empty());
}

#[tokio::test]
async fn backend_errors_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = store(&server).list("users").await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 503, .. }));
}

#[tokio::test]
async fn malformed_documents_are_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/u1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{ROOT}/users/u1"),
            "fields": { "age": { "integerValue": "old" } }
        })))
        .mount(&server)
        .await;

    let result = store(&server).get(&DocumentPath::new("users", "u1")).await;
    assert!(matches!(result, Err(StoreError::Decode(_))));
}

#[tokio::test]
async fn ids_cannot_leave_their_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/secrets/s1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{ROOT}/secrets/s1"),
            "fields": { "apiKey": { "stringValue": "top-secret" } }
        })))
        .mount(&server)
        .await;

    let store = store(&server);
    for id in ["../secrets/s1", "..", "secrets/s1", "__name__"] {
        let result = store.get(&DocumentPath::new("users", id)).await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))), "{id:?}");
    }

    let err = store
        .update(&DocumentPath::new("users", "../secrets/s1"), user_fields())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath(_)));
    assert!(store.list("users/../secrets").await.is_err());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn ids_are_sent_as_one_encoded_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/a%3Fb%23c%20d")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let doc = store(&server)
        .get(&DocumentPath::new("users", "a?b#c d"))
        .await
        .unwrap();
    assert!(doc.is_none());
}
