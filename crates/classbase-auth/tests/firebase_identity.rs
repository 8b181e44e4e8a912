//! Contract tests for `FirebaseIdentity` against a mocked Identity Toolkit.
//!
//! | Endpoint | Test |
//! |----------|------|
//! | JWKS | `verify_*` |
//! | `accounts:lookup` | `get_user_*`, `verify_checks_revocation_*` |
//! | `accounts` | `create_user_*` |
//! | `accounts:update` | `set_custom_user_claims_*`, `revoke_*` |
//! | `accounts:delete` | `delete_user_*` |
//! | `accounts:signInWithCustomToken` | `sign_in_*` |
//! | OAuth2 token | `access_token_*` |

use std::sync::Arc;

use chrono::Utc;
use classbase_auth::claims::role_claims;
use classbase_auth::credentials::http_client;
use classbase_auth::custom_token::CUSTOM_TOKEN_AUDIENCE;
use classbase_auth::{AccessTokenSource, FirebaseIdentity, IdentityError, IdentityProvider, NewIdentity};
use classbase_config::{FirebaseConfig, ServiceAccountKey};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "classbase-test";
const ACCESS_TOKEN: &str = "test-access-token";

fn service_account() -> ServiceAccountKey {
    serde_json::from_str(include_str!("fixtures/service_account.json")).unwrap()
}

fn jwks() -> Value {
    serde_json::from_str(include_str!("fixtures/jwks.json")).unwrap()
}

fn config(server: &MockServer) -> FirebaseConfig {
    let mut config = FirebaseConfig::new(service_account());
    config.identity_toolkit_url = server.uri();
    config.jwks_url = format!("{}/jwks", server.uri());
    config.oauth_token_url = format!("{}/token", server.uri());
    config.api_key = Some("test-api-key".to_string());
    config.http_timeout_secs = 5;
    config
}

fn identity(server: &MockServer) -> FirebaseIdentity {
    identity_with(config(server))
}

fn identity_with(config: FirebaseConfig) -> FirebaseIdentity {
    let http = http_client(config.http_timeout_secs).unwrap();
    FirebaseIdentity::new(config, http, Arc::new(AccessTokenSource::fixed(ACCESS_TOKEN)))
}

/// Signs an ID token the way the platform would, with the fixture key.
fn sign_id_token(kid: &str, claims: Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(service_account().private_key.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, &claims, &key).unwrap()
}

fn id_token_claims(uid: &str, auth_time: i64) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": format!("https://securetoken.google.com/{PROJECT}"),
        "aud": PROJECT,
        "sub": uid,
        "user_id": uid,
        "iat": now,
        "exp": now + 3600,
        "auth_time": auth_time,
        "email": "teacher@example.com",
        "email_verified": true,
        "firebase": { "identities": {}, "sign_in_provider": "custom" },
        "role": "admin"
    })
}

async fn mount_jwks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "public, max-age=600")
                .set_body_json(jwks()),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn lookup_path() -> String {
    format!("/v1/projects/{PROJECT}/accounts:lookup")
}

fn update_path() -> String {
    format!("/v1/projects/{PROJECT}/accounts:update")
}

// ── ID token verification ────────────────────────────────────────────

#[tokio::test]
async fn verify_accepts_platform_signed_token() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let identity = identity(&server);

    let token = sign_id_token("test-key-1", id_token_claims("uid-1", Utc::now().timestamp()));

    let decoded = identity.verify_id_token(&token, false).await.unwrap();
    assert_eq!(decoded.uid, "uid-1");
    assert_eq!(decoded.role(), Some("admin"));
    assert_eq!(decoded.email.as_deref(), Some("teacher@example.com"));

    // Second verification is served from the cached key set.
    identity.verify_id_token(&token, false).await.unwrap();
}

#[tokio::test]
async fn verify_rejects_token_for_other_project() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let identity = identity(&server);

    let mut claims = id_token_claims("uid-1", Utc::now().timestamp());
    claims["aud"] = json!("someone-else");
    let token = sign_id_token("test-key-1", claims);

    let err = identity.verify_id_token(&token, false).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken(_)));
}

#[tokio::test]
async fn verify_rejects_wrong_issuer() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let identity = identity(&server);

    let mut claims = id_token_claims("uid-1", Utc::now().timestamp());
    claims["iss"] = json!("https://accounts.example.com");
    let token = sign_id_token("test-key-1", claims);

    assert!(matches!(
        identity.verify_id_token(&token, false).await,
        Err(IdentityError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn verify_rejects_expired_token() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let identity = identity(&server);

    let now = Utc::now().timestamp();
    let mut claims = id_token_claims("uid-1", now - 7200);
    claims["iat"] = json!(now - 7200);
    claims["exp"] = json!(now - 3600);
    let token = sign_id_token("test-key-1", claims);

    assert!(matches!(
        identity.verify_id_token(&token, false).await,
        Err(IdentityError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn verify_rejects_unknown_key_id() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let identity = identity(&server);

    let token = sign_id_token("rotated-away", id_token_claims("uid-1", Utc::now().timestamp()));

    let err = identity.verify_id_token(&token, false).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken(msg) if msg.contains("rotated-away")));
}

#[tokio::test]
async fn verify_rejects_garbage() {
    let server = MockServer::start().await;
    let identity = identity(&server);

    assert!(matches!(
        identity.verify_id_token("not-a-jwt", false).await,
        Err(IdentityError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn verify_checks_revocation_when_asked() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let now = Utc::now().timestamp();
    Mock::given(method("POST"))
        .and(path(lookup_path()))
        .and(header("authorization", "Bearer test-access-token"))
        .and(body_partial_json(json!({ "localId": ["uid-1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{
                "localId": "uid-1",
                "email": "teacher@example.com",
                "validSince": (now - 60).to_string()
            }]
        })))
        .mount(&server)
        .await;

    let identity = identity(&server);
    let stale = sign_id_token("test-key-1", id_token_claims("uid-1", now - 600));
    let fresh = sign_id_token("test-key-1", id_token_claims("uid-1", now));

    assert!(identity.verify_id_token(&stale, false).await.is_ok());
    assert!(matches!(
        identity.verify_id_token(&stale, true).await,
        Err(IdentityError::TokenRevoked)
    ));
    assert!(identity.verify_id_token(&fresh, true).await.is_ok());
}

#[tokio::test]
async fn verify_checks_revocation_rejects_disabled_user() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    Mock::given(method("POST"))
        .and(path(lookup_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "localId": "uid-1", "disabled": true }]
        })))
        .mount(&server)
        .await;

    let identity = identity(&server);
    let token = sign_id_token("test-key-1", id_token_claims("uid-1", Utc::now().timestamp()));

    assert!(matches!(
        identity.verify_id_token(&token, true).await,
        Err(IdentityError::UserDisabled(uid)) if uid == "uid-1"
    ));
}

// ── User administration ──────────────────────────────────────────────

#[tokio::test]
async fn get_user_parses_custom_claims() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(lookup_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "identitytoolkit#GetAccountInfoResponse",
            "users": [{
                "localId": "uid-1",
                "email": "teacher@example.com",
                "displayName": "Grace",
                "customAttributes": "{\"role\":\"teacher\"}"
            }]
        })))
        .mount(&server)
        .await;

    let user = identity(&server).get_user("uid-1").await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Grace"));
    assert_eq!(user.role(), Some("teacher"));
    assert_eq!(user.tokens_valid_after, None);
}

#[tokio::test]
async fn get_user_reports_missing_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(lookup_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "identitytoolkit#GetAccountInfoResponse"
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        identity(&server).get_user("ghost").await,
        Err(IdentityError::UserNotFound(uid)) if uid == "ghost"
    ));
}

#[tokio::test]
async fn create_user_sends_email_and_display_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{PROJECT}/accounts")))
        .and(body_partial_json(json!({
            "email": "new@example.com",
            "displayName": "New Teacher"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "localId": "new-uid" })))
        .expect(1)
        .mount(&server)
        .await;

    let created = identity(&server)
        .create_user(NewIdentity {
            email: "new@example.com".into(),
            display_name: "New Teacher".into(),
        })
        .await
        .unwrap();

    assert_eq!(created.uid, "new-uid");
    assert_eq!(created.email.as_deref(), Some("new@example.com"));
}

#[tokio::test]
async fn create_user_surfaces_api_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{PROJECT}/accounts")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "EMAIL_EXISTS" }
        })))
        .mount(&server)
        .await;

    let err = identity(&server)
        .create_user(NewIdentity {
            email: "taken@example.com".into(),
            display_name: "Taken".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, IdentityError::Api { status: 400, ref body, .. } if body.contains("EMAIL_EXISTS")));
}

#[tokio::test]
async fn set_custom_user_claims_sends_serialized_claims() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(update_path()))
        .and(header("authorization", "Bearer test-access-token"))
        .and(body_partial_json(json!({
            "localId": "uid-1",
            "customAttributes": "{\"role\":\"teacher\"}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "localId": "uid-1" })))
        .expect(1)
        .mount(&server)
        .await;

    identity(&server)
        .set_custom_user_claims("uid-1", &role_claims("teacher"))
        .await
        .unwrap();
}

#[tokio::test]
async fn set_custom_user_claims_maps_unknown_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(update_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "USER_NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        identity(&server)
            .set_custom_user_claims("ghost", &role_claims("admin"))
            .await,
        Err(IdentityError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn revoke_refresh_tokens_sets_valid_since() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(update_path()))
        .and(body_partial_json(json!({ "localId": "uid-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "localId": "uid-1" })))
        .expect(1)
        .mount(&server)
        .await;

    identity(&server).revoke_refresh_tokens("uid-1").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let valid_since: i64 = body["validSince"].as_str().unwrap().parse().unwrap();
    assert!((valid_since - Utc::now().timestamp()).abs() < 5);
}

#[tokio::test]
async fn delete_user_posts_local_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{PROJECT}/accounts:delete")))
        .and(body_partial_json(json!({ "localId": "uid-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    identity(&server).delete_user("uid-1").await.unwrap();
}

// ── Custom tokens ────────────────────────────────────────────────────

#[tokio::test]
async fn create_custom_token_is_signed_by_service_account() {
    let server = MockServer::start().await;
    let token = identity(&server).create_custom_token("uid-1").await.unwrap();

    let jwks: JwkSet = serde_json::from_value(jwks()).unwrap();
    let key = DecodingKey::from_jwk(jwks.find("test-key-1").unwrap()).unwrap();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[CUSTOM_TOKEN_AUDIENCE]);

    let claims = jsonwebtoken::decode::<Value>(&token, &key, &validation)
        .unwrap()
        .claims;
    let email = service_account().client_email;
    assert_eq!(claims["uid"], "uid-1");
    assert_eq!(claims["iss"], email.as_str());
    assert_eq!(claims["sub"], email.as_str());
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        3600
    );
}

#[tokio::test]
async fn create_custom_token_rejects_empty_uid() {
    let server = MockServer::start().await;
    assert!(matches!(
        identity(&server).create_custom_token("").await,
        Err(IdentityError::InvalidUid(_))
    ));
}

#[tokio::test]
async fn sign_in_with_custom_token_uses_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithCustomToken"))
        .and(query_param("key", "test-api-key"))
        .and(body_partial_json(json!({ "token": "custom", "returnSecureToken": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idToken": "id-token",
            "refreshToken": "refresh-token",
            "expiresIn": "3600"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let signed_in = identity(&server)
        .sign_in_with_custom_token("custom")
        .await
        .unwrap();
    assert_eq!(signed_in.id_token, "id-token");
    assert_eq!(signed_in.refresh_token.as_deref(), Some("refresh-token"));
    assert_eq!(signed_in.expires_in, Some(3600));
}

#[tokio::test]
async fn sign_in_without_api_key_is_a_config_error() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.api_key = None;

    assert!(matches!(
        identity_with(config).sign_in_with_custom_token("custom").await,
        Err(IdentityError::Config(_))
    ));
}

// ── Service account access tokens ────────────────────────────────────

#[tokio::test]
async fn access_token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = AccessTokenSource::service_account(
        http_client(5).unwrap(),
        service_account(),
        format!("{}/token", server.uri()),
    );

    assert_eq!(source.access_token().await.unwrap(), "ya29.test");
    assert_eq!(source.access_token().await.unwrap(), "ya29.test");

    let requests = server.received_requests().await.unwrap();
    let form = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(form.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"));
    assert!(form.contains("assertion="));
}

#[tokio::test]
async fn access_token_reports_rejected_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let source = AccessTokenSource::service_account(
        http_client(5).unwrap(),
        service_account(),
        format!("{}/token", server.uri()),
    );

    assert!(matches!(
        source.access_token().await,
        Err(IdentityError::Credential(msg)) if msg.contains("invalid_grant")
    ));
}
