//! Pure view-state reducer: turns gateway events into the next snapshot.
//!
//! Transport-agnostic: the realtime channel and the REST fallback both feed
//! through here, so state logic is testable without any socket.

use crate::models::presence::{PresenceSnapshot, SnapshotPatch};

/// A state-changing presence event, already decoded.
#[derive(Debug, Clone)]
pub enum PresenceEvent {
    /// Full replacement (`INIT_STATE` or a fallback fetch).
    Init(PresenceSnapshot),
    /// Shallow overlay (`PRESENCE_UPDATE`).
    Update(SnapshotPatch),
}

/// `(previous, event) -> next`. Never fails for well-typed input; an update
/// with no prior snapshot overlays onto the default (empty/offline) state.
pub fn reduce(prev: Option<PresenceSnapshot>, event: PresenceEvent) -> PresenceSnapshot {
    match event {
        PresenceEvent::Init(snapshot) => snapshot,
        PresenceEvent::Update(patch) => overlay(prev.unwrap_or_default(), patch),
    }
}

/// Field-by-field shallow overlay: present fields win, absent fields keep the
/// prior value. Nested objects present in the patch replace the stored object
/// wholesale (no deep merge).
fn overlay(mut snapshot: PresenceSnapshot, patch: SnapshotPatch) -> PresenceSnapshot {
    if let Some(user) = patch.user {
        snapshot.user = user;
    }
    if let Some(status) = patch.status {
        snapshot.status = status;
    }
    if let Some(activities) = patch.activities {
        snapshot.activities = activities;
    }
    if let Some(music) = patch.music {
        snapshot.music = music;
    }
    if let Some(listening) = patch.listening {
        snapshot.listening = listening;
    }
    snapshot
}
