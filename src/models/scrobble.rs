//! Scrobble models: the recent-tracks wire format and the view shape served to the site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `user.getrecenttracks` response envelope.
#[derive(Debug, Deserialize)]
pub struct RecentTracksResponse {
    pub recenttracks: RecentTracksPage,
}

#[derive(Debug, Deserialize)]
pub struct RecentTracksPage {
    #[serde(default)]
    pub track: Vec<ScrobbledTrack>,
}

/// One track as the scrobble API reports it. Nested values arrive under
/// `#text` keys.
#[derive(Debug, Deserialize)]
pub struct ScrobbledTrack {
    pub name: String,
    pub artist: TextField,
    pub album: TextField,
    #[serde(default)]
    pub image: Vec<ImageField>,
    #[serde(default)]
    pub date: Option<ScrobbleDate>,
    #[serde(rename = "@attr", default)]
    pub attr: Option<TrackAttr>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextField {
    #[serde(rename = "#text", default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageField {
    #[serde(rename = "#text", default)]
    pub url: String,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Deserialize)]
pub struct ScrobbleDate {
    pub uts: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackAttr {
    #[serde(default)]
    pub nowplaying: Option<String>,
}

/// The most recent track, flattened for the site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTrack {
    pub track: String,
    pub artist: String,
    pub album: String,
    pub album_art_url: Option<String>,
    pub now_playing: bool,
    pub scrobbled_at: Option<DateTime<Utc>>,
}

impl From<ScrobbledTrack> for RecentTrack {
    fn from(wire: ScrobbledTrack) -> Self {
        let album_art_url = pick_album_art(&wire.image);
        let now_playing = wire
            .attr
            .as_ref()
            .and_then(|a| a.nowplaying.as_deref())
            .map(|v| v == "true")
            .unwrap_or(false);
        let scrobbled_at = wire
            .date
            .as_ref()
            .and_then(|d| d.uts.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Self {
            track: wire.name,
            artist: wire.artist.text,
            album: wire.album.text,
            album_art_url,
            now_playing,
            scrobbled_at,
        }
    }
}

/// Prefers the `extralarge` rendition, falling back to the first non-empty URL.
fn pick_album_art(images: &[ImageField]) -> Option<String> {
    images
        .iter()
        .find(|img| img.size == "extralarge" && !img.url.is_empty())
        .or_else(|| images.iter().find(|img| !img.url.is_empty()))
        .map(|img| img.url.clone())
}
