//! Entry point: load config, wire services, start the presence engine, run the server.

use axum::routing::get_service;
use perch::config::Config;
use perch::presence::channel::ChannelConfig;
use perch::presence::fallback::FallbackFetcher;
use perch::services::{MusicSearchService, PresenceService, ScrobbleService, VisitorService};
use perch::{create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let http = reqwest::Client::new();

    let fallback = FallbackFetcher::new(
        http.clone(),
        &config.presence_rest_url,
        &config.presence_identity,
    );
    let presence = PresenceService::new(
        ChannelConfig {
            gateway_url: config.gateway_url.clone(),
            identity: config.presence_identity.clone(),
        },
        fallback,
    );
    presence.start();

    let scrobble = ScrobbleService::new(
        http.clone(),
        &config.scrobble_api_url,
        &config.scrobble_api_key,
        &config.scrobble_user,
    );
    let visitors = VisitorService::new(http.clone(), &config.visitor_api_url);
    let search = MusicSearchService::new(http, &config.music_search_url);

    let state = AppState {
        presence,
        scrobble,
        visitors,
        search,
        download_url: config.download_url.clone(),
    };

    let app = create_app(state)
        // Root and /index.html: serve the site shell.
        .route_service(
            "/",
            get_service(tower_http::services::ServeFile::new(
                "site_static/index.html",
            )),
        )
        .route_service(
            "/index.html",
            get_service(tower_http::services::ServeFile::new(
                "site_static/index.html",
            )),
        );

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
