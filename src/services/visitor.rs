//! Visitor backend client: aggregate stats and visit recording.

use std::net::IpAddr;

use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::visitor::{TrackVisitorResponse, VisitorStats};

/// Client for the visitor-counting backend (`GET`/`POST {base}/visitors`).
#[derive(Clone)]
pub struct VisitorService {
    http: reqwest::Client,
    base_url: String,
}

impl VisitorService {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Aggregate counts by country, ordered by share for display.
    pub async fn stats(&self) -> AppResult<VisitorStats> {
        let response = self
            .http
            .get(format!("{}/visitors", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "visitor backend returned {}",
                status
            )));
        }

        let mut stats: VisitorStats = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("visitor stats body: {}", e)))?;
        stats.sort_countries();
        debug!(count = stats.visitor_count, countries = stats.countries.len(), "visitor stats fetched");
        Ok(stats)
    }

    /// Records one visit for the resolved address.
    pub async fn track(&self, ip: IpAddr) -> AppResult<TrackVisitorResponse> {
        let response = self
            .http
            .post(format!("{}/visitors", self.base_url))
            .json(&json!({ "ip_address": ip.to_string() }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "visitor backend returned {}",
                status
            )));
        }

        let recorded: TrackVisitorResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("track-visitor body: {}", e)))?;
        info!(%ip, "visitor recorded");
        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn stats_arrive_sorted_by_share() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/visitors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "visitor_count": 24,
                "countries": [
                    { "country": "Netherlands", "total": 3, "percentage": "12.5" },
                    { "country": "Indonesia", "total": 14, "percentage": "58.3" },
                    { "country": "United States", "total": 7, "percentage": "29.2" }
                ]
            })))
            .mount(&server)
            .await;

        let service = VisitorService::new(reqwest::Client::new(), server.uri());
        let stats = service.stats().await.expect("stats");
        assert_eq!(stats.visitor_count, 24);
        assert_eq!(stats.countries[0].country, "Indonesia");
        assert_eq!(stats.countries[2].country, "Netherlands");
    }

    #[tokio::test]
    async fn track_posts_the_resolved_address() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/visitors"))
            .and(body_json(json!({ "ip_address": "203.0.113.7" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "recorded",
                "visitor": { "ip_address": "203.0.113.7", "country": "ID" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = VisitorService::new(reqwest::Client::new(), server.uri());
        let recorded = service.track("203.0.113.7".parse().unwrap()).await.expect("track");
        assert!(recorded.success);
        assert_eq!(recorded.visitor.unwrap().ip_address, "203.0.113.7");
    }

    #[tokio::test]
    async fn upstream_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let service = VisitorService::new(reqwest::Client::new(), server.uri());
        assert!(matches!(service.stats().await, Err(AppError::Upstream(_))));
    }
}
