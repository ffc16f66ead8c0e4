//! Realtime presence client: connection lifecycle, keep-alives, bounded
//! reconnect, and the one-shot REST fallback.

pub mod channel;
pub mod fallback;
pub mod heartbeat;
pub mod reducer;
pub mod retry;

pub use channel::{ChannelConfig, ChannelHandle, PresenceChannel, SnapshotStore};
pub use fallback::{FallbackFetcher, FetchError};

use serde::Serialize;

/// Connection lifecycle. Owned exclusively by the channel; everything else
/// observes it through a watch receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    #[default]
    Closed,
}
