use chrono::Utc;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{CrawlReport, ScrapeObservation};
use crate::services::Notifier;

use super::{reconcile, Outcome};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub new_episodes: usize,
    pub status_changes: usize,
    pub unchanged: usize,
    /// Observations whose URL has no stored series.
    pub skipped: usize,
    /// Observations whose state could not be written.
    pub failed: usize,
}

/// Applies crawl reports: reads prior state, reconciles, writes the delta and
/// enqueues any notification.
pub struct ReportProcessor<'a> {
    repository: &'a Repository,
    notifier: Notifier,
}

impl<'a> ReportProcessor<'a> {
    pub fn new(repository: &'a Repository, notifier: Notifier) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    pub async fn process(&self, report: &CrawlReport) -> Result<ReportSummary> {
        tracing::info!(
            "received crawl report: status={}, message={}, results={}",
            report.status,
            report.message,
            report.results.len()
        );

        if report.is_failure() {
            tracing::error!("crawl batch failed: {}", report.message);
            return Err(AppError::BatchFailed(report.message.clone()));
        }

        let mut summary = ReportSummary::default();
        for observation in &report.results {
            match self.apply(observation).await {
                Ok(Outcome::NewEpisodes) => summary.new_episodes += 1,
                Ok(Outcome::StatusChange) => summary.status_changes += 1,
                Ok(Outcome::NoChange) => summary.unchanged += 1,
                Err(AppError::SeriesNotFound(_)) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }

        Ok(summary)
    }

    async fn apply(&self, observation: &ScrapeObservation) -> Result<Outcome> {
        let prior = match self.repository.get_series_by_url(&observation.url).await {
            Ok(Some(prior)) => prior,
            Ok(None) => {
                tracing::warn!("no series stored for {} [{}], skipping", observation.url, observation.name);
                return Err(AppError::SeriesNotFound(observation.url.clone()));
            }
            Err(e) => {
                tracing::error!("failed to load series [{}]: {}", observation.name, e);
                return Err(e);
            }
        };

        let result = reconcile(&prior, observation);

        if let Err(e) = self
            .repository
            .apply_delta(&observation.url, result.delta, Utc::now())
            .await
        {
            tracing::error!("failed to update series [{}]: {}", observation.name, e);
            return Err(e);
        }

        match result.outcome {
            Outcome::NewEpisodes => {
                tracing::info!("new episodes for {}: {:?}", observation.name, result.new_episodes)
            }
            Outcome::StatusChange => tracing::info!(
                "status change for {}: {:?} -> {:?}",
                observation.name,
                prior.current,
                observation.update
            ),
            Outcome::NoChange => tracing::debug!("no change for {}", observation.name),
        }

        // Only announce what has been stored.
        if let Some(notification) = result.notification {
            self.notifier.send(notification);
        } else if result.outcome == Outcome::NewEpisodes {
            tracing::info!("status unchanged for {}, notification suppressed", observation.name);
        }

        Ok(result.outcome)
    }
}
