use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;

use crate::error::{AppError, Result};

const APP_DIR: &str = "episode-watch";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Offset of the reference time zone used by the working-hours gate.
    #[serde(default = "default_reference_offset")]
    pub reference_utc_offset_hours: i32,

    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,

    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("series.db").to_string_lossy().to_string()
}

fn default_reference_offset() -> i32 {
    8
}

fn default_scrape_timeout() -> u64 {
    120
}

fn default_settle_delay() -> u64 {
    3
}

fn default_retry_backoff() -> u64 {
    1
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            reference_utc_offset_hours: default_reference_offset(),
            scrape_timeout_secs: default_scrape_timeout(),
            settle_delay_secs: default_settle_delay(),
            retry_backoff_secs: default_retry_backoff(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        if let Ok(db_path) = std::env::var("EPISODE_WATCH_DB") {
            if !db_path.is_empty() {
                config.db_path = db_path;
            }
        }

        config.reference_offset()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    pub fn reference_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.reference_utc_offset_hours * 3600).ok_or_else(|| {
            AppError::Config(format!(
                "reference_utc_offset_hours out of range: {}",
                self.reference_utc_offset_hours
            ))
        })
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}
