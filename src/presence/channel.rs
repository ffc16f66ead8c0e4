//! Presence channel: owns the realtime connection and drives snapshot updates.
//!
//! Lifecycle: connect -> subscribe -> heartbeat on HELLO -> decode events into
//! the reducer -> on close, the reconnect policy picks a delayed retry or the
//! terminal REST fallback. The engine runs as one task that owns the socket,
//! the heartbeat timer, and the reconnect sleep, so aborting it tears all
//! three down.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::models::frame::{self, opcode, GatewayFrame, DEFAULT_HEARTBEAT_INTERVAL};
use crate::models::presence::PresenceSnapshot;
use crate::presence::fallback::FallbackFetcher;
use crate::presence::heartbeat::Heartbeat;
use crate::presence::reducer::{reduce, PresenceEvent};
use crate::presence::retry::{CloseDecision, ReconnectPolicy};
use crate::presence::ConnectionState;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection-level failures. Handled inside the engine: logged, fed to the
/// reconnect policy, never propagated to the web layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
}

/// The single shared snapshot. The engine (and the manual-refresh path) write
/// through [`apply`](SnapshotStore::apply); everything else only reads.
#[derive(Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<Option<PresenceSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Option<PresenceSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PresenceSnapshot>> {
        self.tx.subscribe()
    }

    /// Runs the pure reducer against the stored snapshot and publishes the
    /// result.
    pub fn apply(&self, event: PresenceEvent) -> PresenceSnapshot {
        let prev = self.tx.borrow().clone();
        let next = reduce(prev, event);
        self.tx.send_replace(Some(next.clone()));
        next
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the engine connects and which identity it subscribes to.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub gateway_url: String,
    pub identity: String,
}

/// Handle to a spawned engine.
pub struct ChannelHandle {
    task: JoinHandle<()>,
    conn: Arc<watch::Sender<ConnectionState>>,
}

impl ChannelHandle {
    pub fn connection_state(&self) -> ConnectionState {
        *self.conn.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.conn.subscribe()
    }

    /// Tears down the connection, the heartbeat timer, and any pending
    /// reconnect sleep. Safe to call more than once.
    pub fn stop(&self) {
        self.task.abort();
        self.conn.send_replace(ConnectionState::Closed);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct PresenceChannel {
    cfg: ChannelConfig,
    store: SnapshotStore,
    fallback: FallbackFetcher,
    policy: ReconnectPolicy,
    conn: Arc<watch::Sender<ConnectionState>>,
}

impl PresenceChannel {
    /// Spawns the engine task and returns its handle.
    pub fn spawn(cfg: ChannelConfig, store: SnapshotStore, fallback: FallbackFetcher) -> ChannelHandle {
        Self::spawn_with_policy(cfg, store, fallback, ReconnectPolicy::default())
    }

    /// Same, with an explicit policy (tests shrink the delay and budget).
    pub fn spawn_with_policy(
        cfg: ChannelConfig,
        store: SnapshotStore,
        fallback: FallbackFetcher,
        policy: ReconnectPolicy,
    ) -> ChannelHandle {
        let (conn_tx, _rx) = watch::channel(ConnectionState::Closed);
        let conn = Arc::new(conn_tx);
        let channel = PresenceChannel {
            cfg,
            store,
            fallback,
            policy,
            conn: conn.clone(),
        };
        let task = tokio::spawn(channel.run());
        ChannelHandle { task, conn }
    }

    async fn run(mut self) {
        loop {
            self.conn.send_replace(ConnectionState::Connecting);
            let outcome = self.connect_and_drive().await;
            self.conn.send_replace(ConnectionState::Closed);

            match outcome {
                Ok(()) => debug!("gateway connection closed"),
                Err(GatewayError::Transport(ref e))
                    if matches!(
                        e,
                        tungstenite::Error::Url(_) | tungstenite::Error::HttpFormat(_)
                    ) =>
                {
                    // The connection cannot be constructed at all; realtime is
                    // off the table for this instance.
                    warn!(error = %e, "gateway unreachable by construction, using fallback");
                    self.fall_back().await;
                    return;
                }
                Err(ref e) => warn!(error = %e, "gateway connection lost"),
            }

            match self.policy.on_close() {
                CloseDecision::Retry { attempt, delay } => {
                    info!(attempt, ?delay, "scheduling gateway reconnect");
                    tokio::time::sleep(delay).await;
                }
                CloseDecision::FallBack => {
                    info!("reconnect budget exhausted, falling back to REST");
                    self.fall_back().await;
                    return;
                }
                CloseDecision::Halt => return,
            }
        }
    }

    async fn fall_back(&self) {
        match self.fallback.fetch_once().await {
            Ok(snapshot) => {
                self.store.apply(PresenceEvent::Init(snapshot));
                info!("fallback snapshot applied");
            }
            Err(e) => warn!(error = %e, "fallback fetch failed"),
        }
    }

    async fn connect_and_drive(&mut self) -> Result<(), GatewayError> {
        let connect = connect_async(self.cfg.gateway_url.as_str());
        let (stream, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect)
            .await
            .map_err(|_| GatewayError::ConnectTimeout(CONNECT_TIMEOUT))??;
        self.drive(stream).await
    }

    async fn drive(
        &mut self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ) -> Result<(), GatewayError> {
        let (mut sink, mut source) = stream.split();

        // Subscribe immediately; a successful open resets the retry budget.
        sink.send(Message::Text(frame::subscribe_frame(&self.cfg.identity)))
            .await?;
        self.policy.on_open();
        self.conn.send_replace(ConnectionState::Open);
        info!(identity = %self.cfg.identity, "gateway subscribed");

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let mut heartbeat = Heartbeat::new(self.conn.subscribe());

        loop {
            tokio::select! {
                incoming = source.next() => match incoming {
                    None => return Ok(()),
                    Some(Err(e)) => {
                        // Transport errors are non-fatal by themselves; the
                        // stream ends right behind them and the close path
                        // decides what happens next.
                        warn!(error = %e, "gateway transport error");
                        return Err(e.into());
                    }
                    Some(Ok(message)) => self.handle_message(message, &out_tx, &mut heartbeat),
                },
                Some(text) = out_rx.recv() => {
                    sink.send(Message::Text(text)).await?;
                }
            }
        }
    }

    /// Decodes one inbound message. Malformed payloads are logged and skipped;
    /// they never close the connection.
    fn handle_message(
        &mut self,
        message: Message,
        out: &mpsc::UnboundedSender<String>,
        heartbeat: &mut Heartbeat,
    ) {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(cf) => {
                debug!(frame = ?cf, "gateway close frame");
                return;
            }
            // Ping/pong are answered by the transport layer.
            other => {
                debug!(kind = ?other, "ignoring non-text gateway message");
                return;
            }
        };

        let parsed: GatewayFrame = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "malformed gateway frame, skipping");
                return;
            }
        };

        match parsed.op {
            opcode::HELLO => {
                let interval = parsed
                    .heartbeat_interval()
                    .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);
                debug!(?interval, "gateway hello, starting heartbeat");
                heartbeat.begin(interval, out.clone());
            }
            opcode::EVENT => {
                let Some(payload) = parsed.d else {
                    warn!(event = ?parsed.t, "event frame without payload, skipping");
                    return;
                };
                match parsed.t.as_deref() {
                    Some(frame::INIT_STATE) => match serde_json::from_value(payload) {
                        Ok(snapshot) => {
                            self.store.apply(PresenceEvent::Init(snapshot));
                            debug!("snapshot initialized");
                        }
                        Err(e) => warn!(error = %e, "malformed INIT_STATE payload, skipping"),
                    },
                    Some(frame::PRESENCE_UPDATE) => match serde_json::from_value(payload) {
                        Ok(patch) => {
                            self.store.apply(PresenceEvent::Update(patch));
                            debug!("snapshot updated");
                        }
                        Err(e) => warn!(error = %e, "malformed PRESENCE_UPDATE payload, skipping"),
                    },
                    other => debug!(event = ?other, "ignoring unrecognized gateway event"),
                }
            }
            other => debug!(op = other, "ignoring unrecognized gateway opcode"),
        }
    }
}
