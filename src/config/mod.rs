//! Application configuration loaded from environment.

use std::net::SocketAddr;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3000`).
    pub server_addr: SocketAddr,
    /// Presence gateway WebSocket URL.
    pub gateway_url: String,
    /// Presence REST base URL for the fallback fetch.
    pub presence_rest_url: String,
    /// Identity tracked by the presence widget.
    pub presence_identity: String,
    /// Scrobble API endpoint (audioscrobbler 2.0).
    pub scrobble_api_url: String,
    /// Scrobble API key.
    pub scrobble_api_key: String,
    /// Scrobble account whose history the site shows.
    pub scrobble_user: String,
    /// Visitor-counting backend base URL.
    pub visitor_api_url: String,
    /// Music search API base URL.
    pub music_search_url: String,
    /// Where GET /api/download redirects.
    pub download_url: String,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let server_addr = std::env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let gateway_url = std::env::var("PRESENCE_GATEWAY_URL")
            .unwrap_or_else(|_| "wss://api.lanyard.rest/socket".to_string());
        let presence_rest_url = std::env::var("PRESENCE_REST_URL")
            .unwrap_or_else(|_| "https://api.lanyard.rest/v1".to_string());
        let presence_identity = std::env::var("PRESENCE_USER_ID")
            .unwrap_or_else(|_| "481734993622728715".to_string());
        let scrobble_api_url = std::env::var("SCROBBLE_API_URL")
            .unwrap_or_else(|_| "https://ws.audioscrobbler.com/2.0/".to_string());
        let scrobble_api_key = std::env::var("SCROBBLE_API_KEY").unwrap_or_default();
        let scrobble_user =
            std::env::var("SCROBBLE_USER").unwrap_or_else(|_| "burung25".to_string());
        let visitor_api_url = std::env::var("VISITOR_API_URL")
            .unwrap_or_else(|_| "https://portfolio-backend-jade-one.vercel.app".to_string());
        let music_search_url = std::env::var("MUSIC_SEARCH_URL")
            .unwrap_or_else(|_| "https://api.deezer.com".to_string());
        let download_url = std::env::var("DOWNLOAD_URL").unwrap_or_else(|_| {
            "https://drive.usercontent.google.com/u/0/uc?id=1d2nztTjFlZzXIQ19Kp6crvAYgFNj7UcY&export=download"
                .to_string()
        });
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            server_addr,
            gateway_url,
            presence_rest_url,
            presence_identity,
            scrobble_api_url,
            scrobble_api_key,
            scrobble_user,
            visitor_api_url,
            music_search_url,
            download_url,
            log_level,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,
}
