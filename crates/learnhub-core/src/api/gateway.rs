//! Authenticated request gateway.
//!
//! Every backend call goes through `Gateway`. It reads the credential from
//! the session store before each dispatch and turns an HTTP 401 into a
//! forced logout: session cleared, one `LoginRequired` event, and
//! `ApiError::SessionExpired` for the caller. Nothing is retried.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::error::{ApiError, ErrorFields};
use crate::auth::SessionStore;
use crate::config::{AuthScheme, Config};

/// Clone is cheap - reqwest::Client and SessionStore share their state.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    scheme: AuthScheme,
    store: SessionStore,
}

impl Gateway {
    pub fn new(config: &Config, store: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.api_base_url),
            scheme: config.auth_scheme,
            store,
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    // =========================================================================
    // Authenticated dispatch
    // =========================================================================

    /// Perform a request with the current credential attached (if any).
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let credential = self.store.credential();
        match self
            .dispatch(method, path, body, credential.as_deref(), ErrorFields::default())
            .await
        {
            Err(ApiError::Unauthorized(reason)) => Err(self.expire_session(path, &reason)),
            other => other,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    fn expire_session(&self, path: &str, reason: &str) -> ApiError {
        let had_session = self.store.invalidate();
        warn!(path, reason, had_session, "Credential rejected, forcing re-authentication");
        let events = self.store.events();
        events.error("Your session has expired. Please log in again.");
        events.login_required();
        ApiError::SessionExpired
    }

    // =========================================================================
    // Raw dispatch
    // =========================================================================

    /// Send a request with an explicit credential and no expiry handling.
    /// `errors` says where a failure message is taken from.
    pub(crate) async fn dispatch<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Option<&str>,
        errors: ErrorFields<'_>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        debug!(%method, url = %url, authenticated = credential.is_some(), "Sending request");

        let mut builder = self
            .client
            .request(method, &url)
            .header(header::ACCEPT, "application/json");
        if let Some(credential) = credential {
            builder = builder.header(header::AUTHORIZATION, self.scheme.header_value(credential));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(url = %url, %status, "Request failed");
            return Err(ApiError::from_response(status, &text, errors));
        }

        decode(status, &text, &url)
    }
}

/// Ensure exactly one trailing slash so paths join cleanly.
fn normalize_base_url(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}

/// Empty bodies (204, bare 200) decode as JSON `null`, which suits `()`,
/// `Option<T>` and `serde_json::Value`.
fn decode<T: DeserializeOwned>(status: StatusCode, text: &str, url: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse {} response from {}: {}", status, url, e))
    })
}
