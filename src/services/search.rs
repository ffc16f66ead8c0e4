//! Music search proxy: forwards track queries to the search API unchanged.

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Thin proxy for `GET {base}/search?q=`; the response body passes through
/// untouched so the widget sees the search API's own shape.
#[derive(Clone)]
pub struct MusicSearchService {
    http: reqwest::Client,
    base_url: String,
}

impl MusicSearchService {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn search(&self, query: &str) -> AppResult<serde_json::Value> {
        debug!(query, "music search");
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "music search returned {}",
                status
            )));
        }

        Ok(response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("music search body: {}", e)))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn passes_the_query_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "bon iver"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "title": "Holocene" }],
                "total": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = MusicSearchService::new(reqwest::Client::new(), server.uri());
        let body = service.search("bon iver").await.expect("search");
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["title"], "Holocene");
    }

    #[tokio::test]
    async fn upstream_failure_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let service = MusicSearchService::new(reqwest::Client::new(), server.uri());
        assert!(matches!(service.search("x").await, Err(AppError::Upstream(_))));
    }
}
