//! Presence snapshot: the tracked identity's current status, activities, and music session.

use serde::{Deserialize, Deserializer, Serialize};

/// Online status reported by the presence gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnlineState {
    Online,
    Idle,
    #[serde(rename = "dnd")]
    DoNotDisturb,
    #[default]
    Offline,
}

/// The tracked identity as the gateway reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserIdentity {
    /// Name to display: the global name when set, the username otherwise.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

/// Inclusive start/end pair in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Fraction of the range elapsed at `now_ms`, clamped to [0, 1].
    pub fn progress(&self, now_ms: i64) -> f64 {
        let span = self.end - self.start;
        if span <= 0 {
            return if now_ms >= self.end { 1.0 } else { 0.0 };
        }
        ((now_ms - self.start) as f64 / span as f64).clamp(0.0, 1.0)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).max(0)
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.start).clamp(0, self.duration_ms())
    }
}

/// Start/end timestamps on an activity; either side may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimes {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

/// Image references attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityAssets {
    #[serde(default)]
    pub large_image: Option<String>,
    #[serde(default)]
    pub large_text: Option<String>,
    #[serde(default)]
    pub small_image: Option<String>,
    #[serde(default)]
    pub small_text: Option<String>,
}

/// One activity from the gateway (game, editor, custom status, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    /// Numeric activity-type code as sent on the wire.
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub timestamps: Option<ActivityTimes>,
    #[serde(default)]
    pub assets: Option<ActivityAssets>,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<String>,
}

/// Current music playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSession {
    #[serde(rename = "song")]
    pub track: String,
    pub artist: String,
    pub album: String,
    pub album_art_url: String,
    pub timestamps: TimeRange,
}

/// Full known state of the tracked identity at a point in time.
///
/// Replaced wholesale by an `INIT_STATE` event; patched field-by-field by
/// `PRESENCE_UPDATE` (see [`SnapshotPatch`]). The music session, when present,
/// takes display priority over generic activities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    #[serde(rename = "discord_user", default)]
    pub user: UserIdentity,
    #[serde(rename = "discord_status", default)]
    pub status: OnlineState,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(rename = "spotify", default, skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicSession>,
    #[serde(rename = "listening_to_spotify", default)]
    pub listening: bool,
}

impl PresenceSnapshot {
    pub fn is_online(&self) -> bool {
        self.status != OnlineState::Offline
    }
}

/// Partial overlay carried by a `PRESENCE_UPDATE` event.
///
/// Absent fields leave the previous snapshot untouched. `music` distinguishes
/// "absent" (keep) from explicit `null` (session ended); a nested object that
/// is present replaces the stored one wholesale rather than deep-merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotPatch {
    #[serde(rename = "discord_user", default)]
    pub user: Option<UserIdentity>,
    #[serde(rename = "discord_status", default)]
    pub status: Option<OnlineState>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
    #[serde(rename = "spotify", default, deserialize_with = "double_option")]
    pub music: Option<Option<MusicSession>>,
    #[serde(rename = "listening_to_spotify", default)]
    pub listening: Option<bool>,
}

/// Maps a present-but-null field to `Some(None)`; absence stays `None` via
/// `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range(start: i64, end: i64) -> TimeRange {
        TimeRange { start, end }
    }

    #[test]
    fn progress_clamps_outside_range() {
        let r = range(1_000, 2_000);
        assert_eq!(r.progress(500), 0.0);
        assert_eq!(r.progress(1_000), 0.0);
        assert_eq!(r.progress(1_500), 0.5);
        assert_eq!(r.progress(2_000), 1.0);
        assert_eq!(r.progress(9_999), 1.0);
    }

    #[test]
    fn progress_is_monotone_in_now() {
        let r = range(0, 180_000);
        let mut prev = 0.0;
        for now in (-10_000..200_000).step_by(7_000) {
            let p = r.progress(now);
            assert!(p >= prev, "progress regressed at now={}", now);
            prev = p;
        }
    }

    #[test]
    fn progress_degenerate_range() {
        let r = range(2_000, 2_000);
        assert_eq!(r.progress(1_999), 0.0);
        assert_eq!(r.progress(2_000), 1.0);
    }

    #[test]
    fn online_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&OnlineState::DoNotDisturb).unwrap(),
            "\"dnd\""
        );
        let s: OnlineState = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(s, OnlineState::Idle);
    }

    #[test]
    fn snapshot_parses_full_payload() {
        let snap: PresenceSnapshot = serde_json::from_value(json!({
            "discord_user": { "id": "81", "username": "wren", "global_name": "Wren", "avatar": "a1b2" },
            "discord_status": "online",
            "activities": [{
                "name": "Code",
                "type": 0,
                "details": "editing main.rs",
                "application_id": "383226320970055681",
                "assets": { "large_image": "editor" }
            }],
            "listening_to_spotify": true,
            "spotify": {
                "song": "Holocene",
                "artist": "Bon Iver",
                "album": "Bon Iver",
                "album_art_url": "https://i.scdn.co/image/abc",
                "timestamps": { "start": 1000, "end": 241000 }
            }
        }))
        .unwrap();

        assert_eq!(snap.user.display_name(), "Wren");
        assert_eq!(snap.status, OnlineState::Online);
        assert_eq!(snap.activities[0].kind, 0);
        assert!(snap.listening);
        assert_eq!(snap.music.as_ref().unwrap().track, "Holocene");
    }

    #[test]
    fn patch_distinguishes_absent_from_null_music() {
        let absent: SnapshotPatch = serde_json::from_value(json!({
            "discord_status": "idle"
        }))
        .unwrap();
        assert!(absent.music.is_none());
        assert_eq!(absent.status, Some(OnlineState::Idle));

        let cleared: SnapshotPatch = serde_json::from_value(json!({
            "spotify": null,
            "listening_to_spotify": false
        }))
        .unwrap();
        assert_eq!(cleared.music, Some(None));
        assert_eq!(cleared.listening, Some(false));
    }
}
