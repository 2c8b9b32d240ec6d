use serde::{Deserialize, Serialize};

/// One scrape of one series page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeObservation {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub update: String,
    #[serde(default)]
    pub series: Vec<String>,
}

/// URLs handed to the crawler for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBatch {
    pub tasks: Vec<String>,
}

/// What the crawler reports back after a batch. A negative `status` marks the
/// whole batch as failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub results: Vec<ScrapeObservation>,
    pub status: i32,
    #[serde(default)]
    pub message: String,
}

impl CrawlReport {
    pub fn success(tasks: Vec<String>, results: Vec<ScrapeObservation>) -> Self {
        Self {
            tasks,
            results,
            status: 1,
            message: "success".to_string(),
        }
    }

    #[cfg(test)]
    pub fn failure(tasks: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            tasks,
            results: Vec::new(),
            status: -1,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status < 0
    }
}
