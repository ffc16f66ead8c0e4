//! One-shot REST fallback: fetch the current snapshot when realtime is unavailable.

use serde::Deserialize;

use crate::models::presence::PresenceSnapshot;

/// Why a fallback fetch failed. Surfaced to the site as a retryable error.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("presence request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("presence service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed presence body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("presence service rejected the lookup")]
    Rejected,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<PresenceSnapshot>,
}

/// Plain request/response client for `GET {rest_base}/users/{identity}`.
///
/// Fetches exactly once per call; any polling policy belongs to the caller.
#[derive(Clone)]
pub struct FallbackFetcher {
    http: reqwest::Client,
    rest_base: String,
    identity: String,
}

impl FallbackFetcher {
    pub fn new(http: reqwest::Client, rest_base: impl Into<String>, identity: impl Into<String>) -> Self {
        let rest_base = rest_base.into().trim_end_matches('/').to_string();
        Self {
            http,
            rest_base,
            identity: identity.into(),
        }
    }

    /// One snapshot over REST, through the same `{success, data}` envelope the
    /// service uses everywhere.
    pub async fn fetch_once(&self) -> Result<PresenceSnapshot, FetchError> {
        let url = format!("{}/users/{}", self.rest_base, self.identity);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&body)?;
        match envelope {
            Envelope { success: true, data: Some(data) } => Ok(data),
            _ => Err(FetchError::Rejected),
        }
    }
}
