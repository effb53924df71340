//! Backend authentication endpoints.
//!
//! These bypass the gateway's expiry handling: a rejected login must not
//! clear an unrelated session, and logout revokes the credential it is
//! given rather than whatever the store holds.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::error::ErrorFields;
use super::{ApiError, Gateway};
use crate::auth::backend::{LOGIN_FAILED, REGISTER_FAILED};
use crate::auth::{AuthBackend, AuthResponse, LoginRequest, RegisterRequest};

const LOGIN_PATH: &str = "accounts/login/";
const REGISTER_PATH: &str = "accounts/register/";
const LOGOUT_PATH: &str = "accounts/logout/";

const LOGIN_ERRORS: ErrorFields<'static> = ErrorFields {
    preferred: &["non_field_errors"],
    fallback: Some(LOGIN_FAILED),
};

const REGISTER_ERRORS: ErrorFields<'static> = ErrorFields {
    preferred: &["email", "non_field_errors"],
    fallback: Some(REGISTER_FAILED),
};

#[async_trait]
impl AuthBackend for Gateway {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.dispatch(Method::POST, LOGIN_PATH, Some(request), None, LOGIN_ERRORS)
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.dispatch(Method::POST, REGISTER_PATH, Some(request), None, REGISTER_ERRORS)
            .await
    }

    async fn logout(&self, credential: &str) -> Result<(), ApiError> {
        let _: Value = self
            .dispatch(Method::POST, LOGOUT_PATH, None::<&()>, Some(credential), ErrorFields::default())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStore, SessionStore};
    use crate::config::Config;
    use crate::events::{drain, EventSender, SessionEvent};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Arc;

    fn gateway(server: &Server) -> (Gateway, tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = EventSender::channel();
        let store = SessionStore::new(Arc::new(MemoryStore::new()), events);
        let config = Config {
            api_base_url: format!("{}/api", server.url()),
            ..Config::default()
        };
        (Gateway::new(&config, store).unwrap(), rx)
    }

    #[tokio::test]
    async fn test_login_through_store() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/accounts/login/")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({"username": "ann", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"message": "Login Successfully!", "token": "knox-token"}"#)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway(&server);
        let session = gateway.store().login(&gateway, "ann", "pw").await.unwrap();
        assert_eq!(session.username(), "ann");
        assert_eq!(gateway.store().credential().as_deref(), Some("knox-token"));
        mock.assert_async().await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_login_does_not_expire_session() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/accounts/login/")
            .with_status(401)
            .with_body(r#"{"non_field_errors": ["Unable to log in"]}"#)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway(&server);
        let err = gateway.store().login(&gateway, "ann", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials(ref msg) if msg == "Unable to log in"));
        assert!(!drain(&mut rx).contains(&SessionEvent::LoginRequired));
    }

    #[tokio::test]
    async fn test_register_surfaces_email_error_first() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/accounts/register/")
            .match_body(Matcher::PartialJson(json!({
                "username": "bob",
                "email": "dup@example.com",
                "confirm_password": "x"
            })))
            .with_status(400)
            .with_body(r#"{"username": ["bad"], "email": ["already exists"]}"#)
            .create_async()
            .await;

        let (gateway, _rx) = gateway(&server);
        let err = gateway
            .store()
            .register(&gateway, &RegisterRequest::new("bob", "dup@example.com", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(ref msg) if msg == "already exists"));
    }

    #[tokio::test]
    async fn test_messageless_failures_use_generic_text() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/accounts/login/")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/api/accounts/register/")
            .with_status(502)
            .with_body("<html><body>Bad Gateway</body></html>")
            .create_async()
            .await;

        let (gateway, mut rx) = gateway(&server);
        let err = gateway.store().login(&gateway, "ann", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials(ref msg) if msg == "Login failed"));

        let err = gateway
            .store()
            .register(&gateway, &RegisterRequest::new("bob", "bob@example.com", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(ref msg) if msg == "Registration failed"));

        let shown: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Notice(n) => Some(n.message),
                SessionEvent::LoginRequired => None,
            })
            .collect();
        assert_eq!(shown, vec!["Login failed", "Registration failed"]);
    }

    #[tokio::test]
    async fn test_logout_sends_credential() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/accounts/login/")
            .with_status(200)
            .with_body(r#"{"token": "knox-token"}"#)
            .create_async()
            .await;
        let logout = server
            .mock("POST", "/api/accounts/logout/")
            .match_header("authorization", "Token knox-token")
            .with_status(200)
            .with_body(r#"{"message": "Logout successful.", "Token": "Token Destroyed"}"#)
            .expect(1)
            .create_async()
            .await;

        let (gateway, _rx) = gateway(&server);
        gateway.store().login(&gateway, "ann", "pw").await.unwrap();
        gateway.store().logout(&gateway).await;

        assert!(!gateway.store().is_authenticated());
        logout.assert_async().await;
    }
}
