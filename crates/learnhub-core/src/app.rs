//! Composition root: one session store, one gateway, one domain client,
//! all sharing the same event channel.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::api::{ApiError, Gateway, LmsClient};
use crate::auth::{KeyValueStore, RegisterRequest, Session, SessionStore};
use crate::config::Config;
use crate::events::{EventSender, SessionEvent};

pub struct App {
    pub config: Config,
    pub store: SessionStore,
    pub client: LmsClient,
}

impl App {
    /// Open the persisted mirror selected by `config` and restore any saved
    /// session.
    pub fn open(config: Config) -> Result<(Self, UnboundedReceiver<SessionEvent>)> {
        let storage = config.open_storage()?;
        Self::with_storage(config, storage)
    }

    pub fn with_storage(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<(Self, UnboundedReceiver<SessionEvent>)> {
        let (events, rx) = EventSender::channel();
        let store = SessionStore::new(storage, events).with_token_ttl(config.token_ttl());

        let authenticated = store.initialize();
        debug!(authenticated, "Session store initialized");

        let gateway = Gateway::new(&config, store.clone())?;
        info!(base_url = gateway.base_url(), "API gateway configured");

        Ok((
            Self {
                config,
                store,
                client: LmsClient::new(gateway),
            },
            rx,
        ))
    }

    fn gateway(&self) -> &Gateway {
        self.client.gateway()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        self.store.login(self.gateway(), username, password).await
    }

    pub async fn register(&self, profile: &RegisterRequest) -> Result<Session, ApiError> {
        self.store.register(self.gateway(), profile).await
    }

    pub async fn logout(&self) {
        self.store.logout(self.gateway()).await
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.current_session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }
}
