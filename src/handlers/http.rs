//! HTTP handlers: presence snapshot, now-playing, music search, download, health.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::presence::ConnectionState;
use crate::services::{MusicSearchService, PresenceService, ScrobbleService, VisitorService};

/// Shared application state for the HTTP and WebSocket surface.
#[derive(Clone)]
pub struct AppState {
    pub presence: PresenceService,
    pub scrobble: ScrobbleService,
    pub visitors: VisitorService,
    pub search: MusicSearchService,
    pub download_url: String,
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "perch" })),
    )
}

/// GET /api/presence — the current snapshot plus the connection indicator.
/// `data` is null until a first snapshot arrives over either transport.
pub async fn presence(State(state): State<AppState>) -> Json<serde_json::Value> {
    let connection = state.presence.connection_state();
    Json(json!({
        "connection": connection,
        "connected": connection == ConnectionState::Open,
        "data": state.presence.snapshot(),
    }))
}

/// POST /api/presence/refresh — manual retry over REST when realtime is down.
pub async fn refresh_presence(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let snapshot = state.presence.refresh().await?;
    Ok(Json(json!({ "success": true, "data": snapshot })))
}

/// GET /api/now-playing — the live music session when there is one, the most
/// recent scrobble otherwise.
pub async fn now_playing(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(snapshot) = state.presence.snapshot() {
        if snapshot.listening {
            if let Some(music) = snapshot.music {
                let now = chrono::Utc::now().timestamp_millis();
                return Ok(Json(json!({
                    "source": "presence",
                    "track": music.track,
                    "artist": music.artist,
                    "album": music.album,
                    "album_art_url": music.album_art_url,
                    "progress": music.timestamps.progress(now),
                    "elapsed_ms": music.timestamps.elapsed_ms(now),
                    "duration_ms": music.timestamps.duration_ms(),
                })));
            }
        }
    }

    let recent = state.scrobble.recent_track().await?;
    Ok(Json(json!({ "source": "scrobbles", "track": recent })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/search-music?q= — proxied track search.
pub async fn search_music(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?;

    Ok(Json(state.search.search(query).await?))
}

/// GET /api/download — 302 to the hosted build.
pub async fn download(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.download_url.clone())],
    )
}
