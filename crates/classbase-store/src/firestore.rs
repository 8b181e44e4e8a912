//! Cloud Firestore over the v1 REST API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get | `GET {documents}/{collection}/{id}` |
//! | set | `PATCH {documents}/{collection}/{id}` |
//! | update | `PATCH ...?updateMask.fieldPaths=..&currentDocument.exists=true` |
//! | delete | `DELETE {documents}/{collection}/{id}` |
//! | list | `GET {documents}/{collection}?pageSize=..&pageToken=..` |

use std::sync::Arc;

use async_trait::async_trait;
use classbase_auth::AccessTokenSource;
use classbase_config::FirebaseConfig;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::encoding::{decode_fields, decode_reference, encode_fields};
use crate::path::check_collection;
use crate::{Document, DocumentPath, DocumentStore, Fields, StoreError};

const PAGE_SIZE: usize = 300;

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug)]
pub struct FirestoreStore {
    http: reqwest::Client,
    /// Base URL of the documents collection group
    documents_url: String,
    /// Resource name prefix of every document, used by references
    root: String,
    tokens: Arc<AccessTokenSource>,
}

impl FirestoreStore {
    pub fn new(config: &FirebaseConfig, http: reqwest::Client, tokens: Arc<AccessTokenSource>) -> Self {
        let root = format!(
            "projects/{}/databases/{}/documents",
            config.project_id, config.database
        );
        Self {
            http,
            documents_url: format!("{}/v1/{root}", config.firestore_url.trim_end_matches('/')),
            root,
            tokens,
        }
    }

    /// `documents_url` extended by `segments`, each percent-encoded as a
    /// single path segment.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, StoreError> {
        let invalid = || StoreError::InvalidUrl(self.documents_url.clone());
        let mut url = Url::parse(&self.documents_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn document_url(&self, path: &DocumentPath) -> Result<Url, StoreError> {
        path.validate()?;
        self.url(path.segments())
    }

    fn collection_url(&self, collection: &str) -> Result<Url, StoreError> {
        check_collection(collection)?;
        self.url(collection.split('/'))
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, StoreError> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    fn decode_document(&self, wire: WireDocument) -> Result<Document, StoreError> {
        let path = decode_reference(&wire.name, &self.root)?;
        let fields = match wire.fields {
            Some(fields) => decode_fields(&fields, &self.root)?,
            None => Fields::new(),
        };
        Ok(Document { path, fields })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let endpoint = format!("get {path}");
        let response = self
            .request(Method::GET, self.document_url(path)?)
            .await?
            .send()
            .await
            .map_err(|source| StoreError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let wire: WireDocument = read_json(response, endpoint).await?;
        self.decode_document(wire).map(Some)
    }

    #[instrument(skip(self, fields), fields(path = %path))]
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let endpoint = format!("set {path}");
        let response = self
            .request(Method::PATCH, self.document_url(path)?)
            .await?
            .json(&json!({ "fields": encode_fields(&fields, &self.root) }))
            .send()
            .await
            .map_err(|source| StoreError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let _: Value = read_json(response, endpoint).await?;
        debug!("Document written");
        Ok(())
    }

    #[instrument(skip(self, fields), fields(path = %path))]
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let endpoint = format!("update {path}");
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", field_path(name)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let response = self
            .request(Method::PATCH, self.document_url(path)?)
            .await?
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields, &self.root) }))
            .send()
            .await
            .map_err(|source| StoreError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let _: Value = read_json(response, endpoint).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let endpoint = format!("delete {path}");
        let response = self
            .request(Method::DELETE, self.document_url(path)?)
            .await?
            .send()
            .await
            .map_err(|source| StoreError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let _: Value = read_json(response, endpoint).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let endpoint = format!("list {collection}");
        let url = self.collection_url(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .request(Method::GET, url.clone())
                .await?
                .query(&query)
                .send()
                .await
                .map_err(|source| StoreError::Http {
                    endpoint: endpoint.clone(),
                    source,
                })?;

            let page: ListResponse = read_json(response, endpoint.clone()).await?;
            for wire in page.documents {
                documents.push(self.decode_document(wire)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    endpoint: String,
) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::Api {
            endpoint,
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    response
        .json()
        .await
        .map_err(|source| StoreError::Http { endpoint, source })
}

/// Quotes a field name for an update mask unless it is a simple identifier.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
