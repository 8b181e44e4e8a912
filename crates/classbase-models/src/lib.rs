//! # Classbase Models
//!
//! Document models and request/response DTOs for the Classbase API.
//!
//! # Modules
//!
//! - [`auth`]: query parameters and responses of the `/auth` routes
//! - [`collections`]: collection names and document path helpers
//! - [`users`]: the user document, user DTOs and the role names
//!
//! # Example
//!
//! ```ignore
//! use classbase_models::users::{UpdateUserDto, roles};
//!
//! let dto = UpdateUserDto { role: Some(roles::ADMIN.into()), ..Default::default() };
//! assert!(dto.has_any_field());
//! ```

pub mod auth;
pub mod collections;
pub mod users;

pub use auth::{IdTokenResponse, MessageResponse, RoleQuery, TokenQuery, UidQuery};
pub use users::{CreateUserDto, CreatedUser, NewUser, UpdateUserDto, UserDocument, UserView, roles};
