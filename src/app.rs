use std::path::Path;

use chrono::Utc;

use crate::config::Config;
use crate::crawler::{crawl_batch, HttpSessionFactory, RetryPolicy, ScrapeRunner};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{CrawlReport, NewSeries, Series, Settings, TaskBatch};
use crate::reconcile::{ReportProcessor, ReportSummary};
use crate::schedule::crawl_permitted;
use crate::services::{Dispatcher, SlackClient};

pub struct App {
    config: Config,
    repository: Repository,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        Ok(Self {
            config: config.clone(),
            repository,
        })
    }

    /// URLs to crawl right now. Empty outside the configured working hours.
    pub async fn task_batch(&self) -> Result<TaskBatch> {
        let settings = self.repository.get_settings().await?;

        if !crawl_permitted(&settings, Utc::now(), self.config.reference_offset()?) {
            tracing::info!("outside crawler working hours, no tasks issued");
            return Ok(TaskBatch::default());
        }

        let tasks = self.repository.get_tracking_urls().await?;
        tracing::info!("issued {} crawl task(s)", tasks.len());
        Ok(TaskBatch { tasks })
    }

    /// One full crawl run: fetch tasks, scrape them in order, reconcile the
    /// results and wait for queued notifications to go out.
    pub async fn crawl_once(&self) -> Result<ReportSummary> {
        let batch = self.task_batch().await?;
        if batch.tasks.is_empty() {
            tracing::info!("nothing to crawl");
            return Ok(ReportSummary::default());
        }

        let runner = ScrapeRunner::new(
            HttpSessionFactory::new(self.config.user_agent.clone(), self.config.scrape_timeout()),
            RetryPolicy {
                backoff_unit: self.config.retry_backoff(),
                ..RetryPolicy::default()
            },
            self.config.settle_delay(),
            self.config.scrape_timeout(),
        );

        tracing::info!("crawling {} task(s)", batch.tasks.len());
        let outcome = crawl_batch(&runner, &batch.tasks).await;
        let report = CrawlReport::success(batch.tasks, outcome.observations);

        self.process_report(&report).await
    }

    /// Reconciles a report produced by an external crawler.
    pub async fn ingest_report(&self, path: &Path) -> Result<ReportSummary> {
        let content = std::fs::read_to_string(path)?;
        let report: CrawlReport = serde_json::from_str(&content)?;
        self.process_report(&report).await
    }

    async fn process_report(&self, report: &CrawlReport) -> Result<ReportSummary> {
        let settings = self.repository.get_settings().await?;
        let slack = SlackClient::new(settings.webhook().map(str::to_string));
        if !slack.is_configured() {
            tracing::warn!("notification webhook not configured, notifications will be dropped");
        }

        let (notifier, dispatcher) = Dispatcher::spawn(slack);
        let result = ReportProcessor::new(&self.repository, notifier)
            .process(report)
            .await;

        let delivered = dispatcher.finish().await;
        tracing::debug!("{} notification(s) delivered", delivered);
        result
    }

    // Series management

    pub async fn add_series(&self, name: &str, url: &str) -> Result<Series> {
        let (name, url) = validate_series_input(name, url)?;
        self.repository
            .create_series(NewSeries { name, url }, Utc::now())
            .await
    }

    pub async fn edit_series(&self, id: i64, name: &str, url: &str) -> Result<Series> {
        let (name, url) = validate_series_input(name, url)?;
        self.repository.update_series(id, name, url).await
    }

    pub async fn remove_series(&self, id: i64) -> Result<()> {
        self.repository.delete_series(id).await
    }

    pub async fn list_series(&self) -> Result<Vec<Series>> {
        self.repository.list_series().await
    }

    pub async fn set_watched(&self, id: i64, watched: bool) -> Result<()> {
        self.repository.set_watched(id, watched).await
    }

    pub async fn toggle_tracking(&self, id: i64) -> Result<bool> {
        self.repository.toggle_tracking(id).await
    }

    pub async fn clear_history(&self, id: i64) -> Result<Series> {
        self.repository.clear_history(id, Utc::now()).await
    }

    // Settings

    pub async fn settings(&self) -> Result<Settings> {
        self.repository.get_settings().await
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<()> {
        self.repository.update_settings(settings).await
    }

    pub async fn send_test_notification(&self) -> Result<()> {
        let settings = self.repository.get_settings().await?;
        SlackClient::new(settings.webhook().map(str::to_string))
            .send_test()
            .await
    }
}

fn validate_series_input(name: &str, url: &str) -> Result<(String, String)> {
    let name = name.trim();
    let url = url.trim();

    if name.is_empty() || url.is_empty() {
        return Err(AppError::InvalidInput("name and url must not be empty".to_string()));
    }
    url::Url::parse(url).map_err(|e| AppError::InvalidInput(format!("invalid url {url:?}: {e}")))?;

    Ok((name.to_string(), url.to_string()))
}
