//! `/users`: user administration over the identity provider and the
//! `users` collection.

pub mod controller;
pub mod router;
pub mod service;
