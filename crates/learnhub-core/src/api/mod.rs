//! REST API module for the learning platform backend.
//!
//! `Gateway` dispatches every request, attaching the session credential
//! and handling credential expiry. `LmsClient` builds the typed domain
//! operations (courses, enrollments, lessons, ...) on top of it. The
//! gateway also serves as the `AuthBackend` for the session store.

mod auth;
pub mod client;
pub mod error;
pub mod gateway;

pub use client::LmsClient;
pub use error::ApiError;
pub use gateway::Gateway;
