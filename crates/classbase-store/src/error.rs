use classbase_auth::IdentityError;

use crate::path::InvalidSegment;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {0} does not exist")]
    NotFound(String),

    #[error("could not obtain store credentials: {0}")]
    Credentials(#[from] IdentityError),

    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    InvalidPath(#[from] InvalidSegment),

    #[error("invalid store URL {0}")]
    InvalidUrl(String),

    #[error("malformed document: {0}")]
    Decode(String),
}
