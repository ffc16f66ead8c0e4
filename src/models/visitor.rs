//! Visitor models: aggregate stats from the counting backend and track-visitor replies.

use serde::{Deserialize, Serialize};

/// Aggregate visitor counts by country, as the counting backend reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorStats {
    pub visitor_count: u64,
    #[serde(default)]
    pub countries: Vec<CountryStats>,
}

/// Per-country slice. The backend sends `percentage` pre-formatted as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryStats {
    pub country: String,
    pub total: u64,
    pub percentage: String,
}

impl CountryStats {
    fn percentage_value(&self) -> f64 {
        self.percentage.trim_end_matches('%').trim().parse().unwrap_or(0.0)
    }
}

impl VisitorStats {
    /// Orders countries by percentage, highest first.
    pub fn sort_countries(&mut self) {
        self.countries.sort_by(|a, b| {
            b.percentage_value()
                .partial_cmp(&a.percentage_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Reply from the counting backend when a visit is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackVisitorResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub visitor: Option<VisitorRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub ip_address: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
