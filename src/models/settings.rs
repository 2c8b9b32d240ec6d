use serde::{Deserialize, Serialize};

/// Global settings singleton. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub crawler_start_time: String,
    #[serde(default)]
    pub crawler_end_time: String,
    #[serde(default)]
    pub notification_webhook: String,
}

impl Settings {
    pub const START_TIME_KEY: &'static str = "crawler_start_time";
    pub const END_TIME_KEY: &'static str = "crawler_end_time";
    pub const WEBHOOK_KEY: &'static str = "notification_webhook";

    pub fn start_time(&self) -> Option<&str> {
        non_empty(&self.crawler_start_time)
    }

    pub fn end_time(&self) -> Option<&str> {
        non_empty(&self.crawler_end_time)
    }

    pub fn webhook(&self) -> Option<&str> {
        non_empty(&self.notification_webhook)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
