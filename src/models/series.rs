use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked series, keyed by the page URL it is scraped from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Canonical episode ids seen on the most recent authoritative scrape.
    pub history: Vec<String>,
    pub current: String,
    pub is_watched: bool,
    pub is_tracking: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub crawler_last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSeries {
    pub name: String,
    pub url: String,
}
