//! Scrobble history client: most recent track from the music-tracking API.

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::scrobble::{RecentTrack, RecentTracksResponse};

/// Client for the scrobble API's `user.getrecenttracks` method.
#[derive(Clone)]
pub struct ScrobbleService {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    user: String,
}

impl ScrobbleService {
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
            user: user.into(),
        }
    }

    /// The single most recent track, or `None` when the history is empty.
    pub async fn recent_track(&self) -> AppResult<Option<RecentTrack>> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("method", "user.getrecenttracks"),
                ("user", self.user.as_str()),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "scrobble service returned {}",
                status
            )));
        }

        let page: RecentTracksResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("scrobble body: {}", e)))?;
        let track = page.recenttracks.track.into_iter().next().map(RecentTrack::from);
        debug!(user = %self.user, found = track.is_some(), "recent track fetched");
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> ScrobbleService {
        ScrobbleService::new(reqwest::Client::new(), server.uri(), "key", "wren")
    }

    #[tokio::test]
    async fn maps_the_most_recent_track() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("method", "user.getrecenttracks"))
            .and(query_param("user", "wren"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "recenttracks": {
                    "track": [{
                        "name": "Perth",
                        "artist": { "#text": "Bon Iver" },
                        "album": { "#text": "Bon Iver" },
                        "image": [
                            { "#text": "https://img/xl.png", "size": "extralarge" }
                        ],
                        "@attr": { "nowplaying": "true" }
                    }],
                    "@attr": { "user": "wren", "total": "4821" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let track = service(&server).recent_track().await.expect("track").expect("some");
        assert_eq!(track.track, "Perth");
        assert!(track.now_playing);
        assert_eq!(track.album_art_url.as_deref(), Some("https://img/xl.png"));
    }

    #[tokio::test]
    async fn empty_history_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "recenttracks": { "track": [] }
            })))
            .mount(&server)
            .await;

        let track = service(&server).recent_track().await.expect("ok");
        assert!(track.is_none());
    }

    #[tokio::test]
    async fn upstream_failure_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service(&server).recent_track().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
