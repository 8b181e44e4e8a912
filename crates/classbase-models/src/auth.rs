//! Query parameters and responses of the `/auth` routes.
//!
//! Query fields are optional at the type level: an absent parameter is
//! reported by the service as `Invalid input data` rather than by the
//! extractor.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TokenQuery {
    /// ID token to verify
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct UidQuery {
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RoleQuery {
    pub uid: Option<String>,
    /// Role to assign, e.g. `admin`
    pub role: Option<String>,
}

/// ID token obtained by exchanging a freshly minted custom token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdTokenResponse {
    #[serde(rename = "idToken")]
    pub id_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_token_response_field_name() {
        let body = serde_json::to_value(IdTokenResponse {
            id_token: "abc".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "idToken": "abc" }));
    }

    #[test]
    fn test_role_query_allows_missing_fields() {
        let query: RoleQuery = serde_json::from_value(serde_json::json!({ "uid": "u1" })).unwrap();
        assert_eq!(query.uid.as_deref(), Some("u1"));
        assert!(query.role.is_none());
    }
}
