use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Login rejected by the backend.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Request rejected with field-level validation errors (HTTP 400).
    #[error("{0}")]
    ValidationFailed(String),

    /// An authenticated call was rejected; the session has been cleared.
    #[error("Session expired - please log in again")]
    SessionExpired,

    /// A protected operation was attempted without a session.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Raw HTTP 401 before the gateway turns it into `SessionExpired`.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Keys checked before any other field when looking for a message.
const GENERIC_ERROR_FIELDS: &[&str] = &["non_field_errors", "detail", "error"];

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Self::from_status_with(status, body, &[])
    }

    /// Classify a failed response, looking for a human-readable message in
    /// `fields` first, then in the generic DRF error keys, then anywhere.
    pub fn from_status_with(status: StatusCode, body: &str, fields: &[&str]) -> Self {
        Self::from_response(
            status,
            body,
            ErrorFields {
                preferred: fields,
                fallback: None,
            },
        )
    }

    pub(crate) fn from_response(status: StatusCode, body: &str, fields: ErrorFields<'_>) -> Self {
        let truncated = Self::truncate_body(body);
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| first_error_message(&value, fields.preferred))
            .or_else(|| fields.fallback.map(str::to_string))
            .unwrap_or_else(|| {
                if truncated.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                } else {
                    truncated.clone()
                }
            });

        match status.as_u16() {
            400 => ApiError::ValidationFailed(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

/// Where to find the message of a failed response.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ErrorFields<'a> {
    /// Payload keys checked before the generic ones
    pub preferred: &'a [&'a str],
    /// Used instead of the raw body when the payload carries no message
    pub fallback: Option<&'a str>,
}

/// Pull the first error message out of a DRF-style error payload.
///
/// Payloads look like `{"email": ["already exists"]}`,
/// `{"non_field_errors": ["..."]}`, `{"detail": "..."}` or a bare
/// `["..."]`. Preferred keys win, then the generic keys, then any field.
pub fn first_error_message(body: &Value, preferred: &[&str]) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|item| first_error_message(item, &[])),
        Value::Object(map) => preferred
            .iter()
            .chain(GENERIC_ERROR_FIELDS)
            .filter_map(|key| map.get(*key))
            .chain(map.values())
            .find_map(|value| first_error_message(value, &[])),
        _ => None,
    }
}
