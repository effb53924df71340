//! The backend authentication service as seen by the session store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiError;

/// Shown when a failed login carries no message of its own
pub(crate) const LOGIN_FAILED: &str = "Login failed";

/// Shown when a failed registration carries no message of its own
pub(crate) const REGISTER_FAILED: &str = "Registration failed";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Profile fields submitted when creating an account.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            confirm_password: password.clone(),
            password,
        }
    }
}

/// Success payload of login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Any other identity fields the backend chose to echo
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credential verification, account creation and token revocation.
///
/// Errors come back unclassified (`Unauthorized`, `ValidationFailed`,
/// `NetworkFailure`, ...); the session store maps them to its own outcomes.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// Revoke `credential` on the server.
    async fn logout(&self, credential: &str) -> Result<(), ApiError>;
}
