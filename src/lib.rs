//! # Classbase API
//!
//! A thin REST backend over Firebase Authentication and Cloud Firestore,
//! built with Rust and Axum. It owns no state: each request verifies a token
//! with the identity provider, reads or writes documents by key, and maps
//! provider failures to fixed HTTP errors.
//!
//! ## Overview
//!
//! - **Authentication**: Firebase ID tokens, verified with a revocation check
//! - **Authorization**: a `role` custom claim compared against the role a
//!   route declares
//! - **User Management**: identities and `users/<uid>` documents kept in step,
//!   with the role stored on both
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # Auth guard and role extractors
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Token verification, custom tokens, roles
//! │   ├── users/       # User administration
//! │   └── health.rs    # Liveness probe
//! ├── docs.rs           # OpenAPI document
//! ├── logging.rs        # Tracing setup and request logging
//! ├── metrics.rs        # Prometheus metrics
//! ├── router.rs         # Main application router
//! ├── state.rs          # Shared application state
//! └── validator.rs      # Validated JSON extractor
//! ```
//!
//! Each feature module has the same layout:
//!
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: one function per operation, calling the providers
//! - `router.rs`: Axum router configuration
//!
//! The providers live in their own crates: `classbase-auth` for identities
//! and `classbase-store` for documents. Both come with in-memory
//! implementations used by the tests.
//!
//! ## Quick Start
//!
//! ```bash
//! GOOGLE_APPLICATION_CREDENTIALS=./service-account.json
//! FIREBASE_API_KEY=your-web-api-key
//! ```
//!
//! The first admin is created with the CLI, since creating users over HTTP
//! already needs an admin:
//!
//! ```bash
//! cargo run --bin classbase-cli -- create-admin --email admin@example.com --name Admin --class-id staff
//! ```
//!
//! ### API Documentation
//!
//! When the server is running, API documentation is available at:
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

pub use classbase_auth;
pub use classbase_config;
pub use classbase_core;
pub use classbase_models;
pub use classbase_store;
