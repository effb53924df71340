//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `SessionStore`: the current session, its state transitions and its
//!   persisted mirror
//! - `AuthBackend`: the login/register/logout service the store delegates to
//! - `KeyValueStore` implementations: JSON file, OS keychain, memory

pub mod backend;
pub mod credentials;
pub mod session;
pub mod storage;
pub mod store;

pub use backend::{AuthBackend, AuthResponse, LoginRequest, RegisterRequest};
pub use credentials::KeyringStore;
pub use session::{Identity, Session};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::SessionStore;
