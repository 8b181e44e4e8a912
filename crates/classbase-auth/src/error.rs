/// Failures reported by an identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The token is malformed, badly signed, expired or issued for another project.
    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("ID token has been revoked")]
    TokenRevoked,

    #[error("user account {0} is disabled")]
    UserDisabled(String),

    #[error("no user record for uid {0}")]
    UserNotFound(String),

    #[error("invalid custom claims: {0}")]
    InvalidClaims(String),

    #[error("invalid uid: {0}")]
    InvalidUid(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

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

    #[error("configuration error: {0}")]
    Config(String),
}

impl IdentityError {
    /// True when the failure is about the presented token rather than the provider.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken(_) | Self::TokenRevoked | Self::UserDisabled(_) | Self::UserNotFound(_)
        )
    }
}
