//! # Classbase Auth
//!
//! Identity provider abstraction for the Classbase API.
//!
//! The application never authenticates anyone itself: it hands bearer tokens
//! to an [`IdentityProvider`] and trusts the decoded identity it gets back.
//! Two implementations are provided:
//!
//! - [`FirebaseIdentity`]: Firebase Authentication over its REST APIs. ID
//!   tokens are verified locally against the published signing keys; user
//!   administration goes through the Identity Toolkit API using an OAuth2
//!   token minted from the service account.
//! - [`MemoryIdentity`]: an in-process provider with the same observable
//!   behavior, for tests and local tooling.
//!
//! # Modules
//!
//! - [`claims`]: decoded ID token, user record and custom claim rules
//! - [`credentials`]: service-account OAuth2 access tokens
//! - [`custom_token`]: service-account signed custom tokens
//! - [`keys`]: public signing key cache
//! - [`firebase`]: Firebase Authentication client
//! - [`memory`]: in-memory provider
//!
//! # Example
//!
//! ```ignore
//! use classbase_auth::{IdentityProvider, MemoryIdentity};
//!
//! let identity = MemoryIdentity::new("demo-project");
//! let user = identity.insert_user("uid-1", "a@example.com", Some("admin")).await;
//! let token = identity.issue_id_token(&user.uid).await?;
//! let decoded = identity.verify_id_token(&token, true).await?;
//! assert_eq!(decoded.role(), Some("admin"));
//! ```

pub mod claims;
pub mod credentials;
pub mod custom_token;
pub mod error;
pub mod firebase;
pub mod keys;
pub mod memory;
pub mod provider;

pub use claims::{DecodedIdToken, FirebaseInfo, NewIdentity, ROLE_CLAIM, SignInResponse, UserRecord};
pub use credentials::AccessTokenSource;
pub use error::IdentityError;
pub use firebase::FirebaseIdentity;
pub use memory::MemoryIdentity;
pub use provider::IdentityProvider;
