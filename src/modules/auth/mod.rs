//! `/auth`: token verification, custom tokens and role management.

pub mod controller;
pub mod router;
pub mod service;
