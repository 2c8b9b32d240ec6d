use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Scrape failed: {0}")]
    Scrape(String),

    #[error("Scrape of {url} failed after {attempts} attempts")]
    ScrapeExhausted { url: String, attempts: u32 },

    #[error("Crawl batch failed: {0}")]
    BatchFailed(String),

    #[error("Invalid working hours: {0}")]
    WorkingHours(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
