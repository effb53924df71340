//! LearnHub core - session management and API access for the LearnHub
//! learning platform.
//!
//! The two central pieces are the [`auth::SessionStore`], which owns who is
//! logged in and mirrors it to persistent storage, and the
//! [`api::Gateway`], which sends every backend request with the current
//! credential and forces re-authentication when that credential is
//! rejected. [`app::App`] wires them together.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod events;
pub mod models;
pub mod utils;

pub use api::{ApiError, Gateway, LmsClient};
pub use app::App;
pub use auth::{Identity, RegisterRequest, Session, SessionStore};
pub use config::{AuthScheme, Config, StorageBackend};
pub use events::{EventSender, Notice, NoticeLevel, SessionEvent};
