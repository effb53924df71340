//! The single source of truth for "who is logged in".
//!
//! `SessionStore` is a cheap handle: clones share the same in-memory session
//! and the same persisted mirror. The lock is never held across an await, so
//! reads stay synchronous.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Duration;
use tracing::{debug, info, warn};

use super::backend::{AuthBackend, LoginRequest, RegisterRequest, LOGIN_FAILED, REGISTER_FAILED};
use super::session::{Identity, Session, StoredIdentity};
use super::storage::{KeyValueStore, StorageError};
use crate::api::ApiError;
use crate::events::EventSender;

/// Persisted entry holding the credential
const TOKEN_KEY: &str = "token";

/// Persisted entry holding the serialized identity
const USER_KEY: &str = "user";

#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    storage: Arc<dyn KeyValueStore>,
    events: EventSender,
    token_ttl: Option<Duration>,
}

impl SessionStore {
    /// Create an unauthenticated store. Call `initialize` to restore a
    /// persisted session.
    pub fn new(storage: Arc<dyn KeyValueStore>, events: EventSender) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            storage,
            events,
            token_ttl: None,
        }
    }

    /// Treat persisted sessions older than `ttl` as absent at startup.
    pub fn with_token_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn events(&self) -> &EventSender {
        &self.events
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Restore the persisted session, if any. Returns whether a session was
    /// installed. Missing, partial, corrupt or expired data all mean
    /// "unauthenticated"; this never fails.
    pub fn initialize(&self) -> bool {
        let restored = match self.load_persisted() {
            Ok(Some(session)) if session.is_expired(self.token_ttl) => {
                info!(username = %session.username(), "Persisted session expired");
                self.remove_persisted();
                None
            }
            Ok(Some(session)) => Some(session),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt persisted session");
                self.remove_persisted();
                None
            }
        };

        let authenticated = restored.is_some();
        if let Some(ref session) = restored {
            debug!(username = %session.username(), "Session restored");
        }
        *self.write() = restored;
        authenticated
    }

    fn load_persisted(&self) -> Result<Option<Session>, StorageError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;

        match (token, user) {
            (Some(credential), Some(user)) if !credential.is_empty() => {
                let stored: StoredIdentity = serde_json::from_str(&user)?;
                Ok(Some(Session {
                    identity: stored.identity,
                    credential,
                    created_at: stored.created_at,
                }))
            }
            (None, None) => Ok(None),
            _ => {
                debug!("Partial persisted session, discarding");
                self.remove_persisted();
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Verify credentials with the backend and install the resulting session.
    ///
    /// On failure any existing session is left untouched and the error is
    /// `InvalidCredentials` or `NetworkFailure`.
    pub async fn login<B>(
        &self,
        backend: &B,
        username: &str,
        password: &str,
    ) -> Result<Session, ApiError>
    where
        B: AuthBackend + ?Sized,
    {
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };

        match backend.login(&request).await {
            Ok(response) => {
                let identity = Identity::from_login(&request.username, &response);
                let session = Session::new(identity, response.token);
                self.install(session.clone());
                info!(username = %session.username(), "Login successful");
                self.events.success(
                    response
                        .message
                        .unwrap_or_else(|| "Login successful!".to_string()),
                );
                Ok(session)
            }
            Err(e) => {
                let error = auth_failure(e, LOGIN_FAILED, ApiError::InvalidCredentials);
                warn!(username = %request.username, error = %error, "Login failed");
                self.events.error(error.to_string());
                Err(error)
            }
        }
    }

    /// Create an account and, on success, log straight into it.
    pub async fn register<B>(
        &self,
        backend: &B,
        profile: &RegisterRequest,
    ) -> Result<Session, ApiError>
    where
        B: AuthBackend + ?Sized,
    {
        match backend.register(profile).await {
            Ok(response) => {
                let identity = Identity::from_registration(&profile.username, &response);
                let session = Session::new(identity, response.token);
                self.install(session.clone());
                info!(username = %session.username(), "Registration successful");
                self.events.success(
                    response
                        .message
                        .unwrap_or_else(|| "Registration successful!".to_string()),
                );
                Ok(session)
            }
            Err(e) => {
                let error = auth_failure(e, REGISTER_FAILED, ApiError::ValidationFailed);
                warn!(username = %profile.username, error = %error, "Registration failed");
                self.events.error(error.to_string());
                Err(error)
            }
        }
    }

    /// Tell the backend (best effort) and then forget the session. Always
    /// succeeds from the caller's point of view.
    pub async fn logout<B>(&self, backend: &B)
    where
        B: AuthBackend + ?Sized,
    {
        if let Some(credential) = self.credential() {
            if let Err(e) = backend.logout(&credential).await {
                warn!(error = %e, "Failed to notify backend of logout");
            }
        }
        self.clear();
        info!("Logged out");
        self.events.success("Logged out successfully");
    }

    /// Forced transition to unauthenticated. Returns whether a session was
    /// present.
    pub fn invalidate(&self) -> bool {
        let had_session = self.write().take().is_some();
        self.remove_persisted();
        had_session
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn current_session(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Credential to attach to outgoing requests
    pub fn credential(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.credential.clone())
    }

    /// Guard for protected views: the session, or `NotAuthenticated` plus a
    /// login-required signal.
    pub fn require_session(&self) -> Result<Session, ApiError> {
        match self.current_session() {
            Some(session) => Ok(session),
            None => {
                self.events.login_required();
                Err(ApiError::NotAuthenticated)
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn install(&self, session: Session) {
        if let Err(e) = self.persist(&session) {
            warn!(error = %e, "Failed to persist session");
            self.remove_persisted();
        }
        *self.write() = Some(session);
    }

    fn clear(&self) {
        *self.write() = None;
        self.remove_persisted();
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let stored = StoredIdentity {
            identity: session.identity.clone(),
            created_at: session.created_at,
        };
        self.storage.set(USER_KEY, &serde_json::to_string(&stored)?)?;
        self.storage.set(TOKEN_KEY, &session.credential)?;
        Ok(())
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove persisted entry");
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fold a backend failure into the one class login/register report.
/// Transport failures stay `NetworkFailure`; statuses whose body named a
/// reason keep it, anything else gets `fallback`.
fn auth_failure(error: ApiError, fallback: &str, class: fn(String) -> ApiError) -> ApiError {
    match error {
        ApiError::NetworkFailure(e) => ApiError::NetworkFailure(e),
        ApiError::InvalidCredentials(msg)
        | ApiError::ValidationFailed(msg)
        | ApiError::Unauthorized(msg)
        | ApiError::AccessDenied(msg)
        | ApiError::NotFound(msg) => class(msg),
        other => {
            debug!(error = %other, "Reporting generic authentication failure");
            class(fallback.to_string())
        }
    }
}
