//! Presence service: owns the realtime engine and the shared snapshot.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::info;

use crate::models::presence::PresenceSnapshot;
use crate::presence::channel::{ChannelConfig, ChannelHandle, PresenceChannel, SnapshotStore};
use crate::presence::fallback::{FallbackFetcher, FetchError};
use crate::presence::reducer::PresenceEvent;
use crate::presence::ConnectionState;

/// Facade over the presence engine for the web layer: start/stop the realtime
/// channel, read the snapshot, refresh over REST on demand.
#[derive(Clone)]
pub struct PresenceService {
    cfg: ChannelConfig,
    store: SnapshotStore,
    fallback: FallbackFetcher,
    engine: Arc<Mutex<Option<ChannelHandle>>>,
}

impl PresenceService {
    pub fn new(cfg: ChannelConfig, fallback: FallbackFetcher) -> Self {
        Self {
            cfg,
            store: SnapshotStore::new(),
            fallback,
            engine: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the realtime engine. Idempotent: a live engine is torn down
    /// before the new one spawns.
    pub fn start(&self) {
        let mut engine = self.engine.lock().expect("presence engine lock");
        if let Some(handle) = engine.take() {
            handle.stop();
        }
        info!(identity = %self.cfg.identity, "starting presence engine");
        *engine = Some(PresenceChannel::spawn(
            self.cfg.clone(),
            self.store.clone(),
            self.fallback.clone(),
        ));
    }

    /// Stops the engine and cancels all of its timers. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut engine = self.engine.lock().expect("presence engine lock");
        if let Some(handle) = engine.take() {
            handle.stop();
            info!("presence engine stopped");
        }
    }

    pub fn snapshot(&self) -> Option<PresenceSnapshot> {
        self.store.snapshot()
    }

    /// Receiver for snapshot changes; the relay endpoint streams from this.
    pub fn subscribe(&self) -> watch::Receiver<Option<PresenceSnapshot>> {
        self.store.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.engine
            .lock()
            .expect("presence engine lock")
            .as_ref()
            .map(|handle| handle.connection_state())
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Open
    }

    /// Manual-retry path: one REST fetch, fed through the same reducer as
    /// realtime events so rendering stays transport-agnostic.
    pub async fn refresh(&self) -> Result<PresenceSnapshot, FetchError> {
        let snapshot = self.fallback.fetch_once().await?;
        Ok(self.store.apply(PresenceEvent::Init(snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(rest_base: &str) -> PresenceService {
        let cfg = ChannelConfig {
            gateway_url: "wss://gateway.invalid/socket".to_string(),
            identity: "81".to_string(),
        };
        let fallback = FallbackFetcher::new(reqwest::Client::new(), rest_base, "81");
        PresenceService::new(cfg, fallback)
    }

    #[tokio::test]
    async fn refresh_populates_the_store() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/81"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "discord_user": { "id": "81", "username": "wren" },
                    "discord_status": "idle",
                    "activities": []
                }
            })))
            .mount(&server)
            .await;

        let service = service(&server.uri());
        assert!(service.snapshot().is_none());

        let snapshot = service.refresh().await.expect("refresh");
        assert_eq!(snapshot.user.username, "wren");
        assert_eq!(service.snapshot(), Some(snapshot));
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let service = service("http://127.0.0.1:1");
        service.stop();
        service.stop();
        assert_eq!(service.connection_state(), ConnectionState::Closed);
    }
}
