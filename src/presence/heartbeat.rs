//! Keep-alive scheduler: emits heartbeat frames while the channel is open.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::frame::heartbeat_frame;
use crate::presence::ConnectionState;

/// Periodic heartbeat emitter backed by one owned timer task.
///
/// Emission checks the connection state at fire time, not at scheduling time:
/// a close can race a pending tick, and a tick that fires after the channel
/// left `Open` must not produce a frame.
pub struct Heartbeat {
    state: watch::Receiver<ConnectionState>,
    task: Option<JoinHandle<()>>,
}

impl Heartbeat {
    pub fn new(state: watch::Receiver<ConnectionState>) -> Self {
        Self { state, task: None }
    }

    /// Starts the periodic timer, one frame per `interval`. Calling `begin`
    /// while already running restarts the timer cleanly (no duplicates).
    pub fn begin(&mut self, interval: Duration, out: mpsc::UnboundedSender<String>) {
        self.end();

        let state = self.state.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the wire expects a full
            // interval before the first beat.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if *state.borrow() != ConnectionState::Open {
                    debug!("heartbeat tick after close, stopping");
                    break;
                }
                if out.send(heartbeat_frame()).is_err() {
                    break;
                }
            }
        }));
    }

    /// Cancels the timer. Idempotent; nothing is emitted afterwards.
    pub fn end(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.end();
    }
}
