//! # Classbase Core
//!
//! Foundational types shared by every Classbase crate.
//!
//! - [`errors`]: the application error type and the JSON envelope it renders to
//!
//! # Example
//!
//! ```ignore
//! use classbase_core::AppError;
//!
//! let error = AppError::not_found("User not found");
//! ```

pub mod errors;

pub use errors::{AppError, ErrorResponse, INVALID_INPUT, timestamp_now};
