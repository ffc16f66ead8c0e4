//! Visitor handlers: stats proxy and visit recording with client IP resolution.

use std::net::{IpAddr, Ipv4Addr};

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::visitor::VisitorStats;

/// Forwarded-header priority order for resolving the caller's address.
const IP_HEADERS: [&str; 9] = [
    "x-client-ip",
    "x-forwarded-for",
    "cf-connecting-ip",
    "x-real-ip",
    "x-forwarded",
    "x-cluster-client-ip",
    "forwarded-for",
    "forwarded",
    "remote-addr",
];

/// First header in priority order whose leading entry parses as an address.
/// Comma-separated lists keep only the first entry. Loopback when nothing
/// usable is present.
pub(crate) fn client_ip(headers: &HeaderMap) -> IpAddr {
    for name in IP_HEADERS {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = value.split(',').next().map(str::trim).unwrap_or("");
        if let Ok(ip) = candidate.parse::<IpAddr>() {
            return ip;
        }
    }
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// GET /api/visitors — aggregate counts by country.
pub async fn visitor_stats(State(state): State<AppState>) -> Result<Json<VisitorStats>, AppError> {
    Ok(Json(state.visitors.stats().await?))
}

/// POST /api/track-visitor — records the caller's resolved address upstream.
pub async fn track_visitor(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let ip = client_ip(&headers);
    debug!(%ip, "tracking visitor");
    let recorded = state.visitors.track(ip).await?;
    Ok(Json(json!({ "success": true, "data": recorded })))
}
