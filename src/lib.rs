//! Backend for my personal site: live presence, scrobbles, and visitor stats.
//!
//! Keeps one realtime connection to the presence gateway (heartbeats, bounded
//! reconnect, REST fallback) and serves the site's JSON routes plus a
//! WebSocket relay for the status widget.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod presence;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::{MusicSearchService, PresenceService, ScrobbleService, VisitorService};

use axum::routing::{get, post};
use handlers::http;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router (ws, api, health). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    // The widgets are fetched cross-origin in development; mirror the wide-open
    // CORS the API responses always carried.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = axum::Router::new()
        .route("/presence", get(http::presence))
        .route("/presence/refresh", post(http::refresh_presence))
        .route("/now-playing", get(http::now_playing))
        .route("/visitors", get(handlers::visitors::visitor_stats))
        .route("/track-visitor", post(handlers::visitors::track_visitor))
        .route("/search-music", get(http::search_music))
        .route("/download", get(http::download))
        .layer(cors);

    axum::Router::new()
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/health", get(http::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
