use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::backend::AuthResponse;

/// Who is logged in. Beyond `username` and `email` the shape is whatever
/// the backend echoes back; extra fields are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            profile: Map::new(),
        }
    }

    /// Build an identity from the login input plus what the backend echoed.
    /// The login form's username always wins.
    pub(crate) fn from_login(username: &str, response: &AuthResponse) -> Self {
        Self {
            username: username.to_string(),
            email: response.email.clone(),
            profile: response.extra.clone(),
        }
    }

    /// Registration trusts the backend's username (it may be normalized).
    pub(crate) fn from_registration(username: &str, response: &AuthResponse) -> Self {
        Self {
            username: response
                .username
                .clone()
                .unwrap_or_else(|| username.to_string()),
            email: response.email.clone(),
            profile: response.extra.clone(),
        }
    }

    /// Friendly name for greetings, e.g. "Welcome back, Ann!"
    pub fn display_name(&self) -> &str {
        self.profile
            .get("first_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// A complete session: identity and credential always travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    /// Opaque token issued by the backend
    pub credential: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: Identity, credential: impl Into<String>) -> Self {
        Self {
            identity,
            credential: credential.into(),
            created_at: Utc::now(),
        }
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// `None` when the expiry lies beyond what a timestamp can hold.
    fn expires_at(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        self.created_at.checked_add_signed(ttl)
    }

    /// Sessions never expire locally unless a TTL is configured.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.and_then(|ttl| self.expires_at(ttl))
            .is_some_and(|expiry| Utc::now() > expiry)
    }

    /// Minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, ttl: Duration) -> Option<i64> {
        self.expires_at(ttl)
            .map(|expiry| (expiry - Utc::now()).num_minutes().max(0))
    }
}

/// On-disk shape of the identity entry in the persisted mirror.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredIdentity {
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
}
