use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::ScrapeObservation;

use super::episodes::extract_episode_ids;
use super::session::{PageSession, SessionFactory};

pub const TITLE_SELECTOR: &str = ".ch-title";
pub const STATUS_SELECTOR: &str = ".tv-status.runing";
pub const EPISODE_LINK_SELECTOR: &str = r#"td a[hreflang="zh-hans"]"#;
pub const EPISODE_LABEL_ATTRIBUTE: &str = "title";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Attempt `i` that fails waits `i * backoff_unit` before the next one.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

pub struct ScrapeRunner<F> {
    factory: F,
    policy: RetryPolicy,
    settle_delay: Duration,
    attempt_timeout: Duration,
}

impl<F: SessionFactory> ScrapeRunner<F> {
    pub fn new(factory: F, policy: RetryPolicy, settle_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            factory,
            policy,
            settle_delay,
            attempt_timeout,
        }
    }

    /// Scrapes one series page, retrying with linear backoff.
    pub async fn scrape(&self, url: &str) -> Result<ScrapeObservation> {
        let max = self.policy.max_attempts.max(1);

        for attempt in 1..=max {
            tracing::info!("fetching {} (attempt {}/{})", url, attempt, max);

            match self.attempt(url).await {
                Ok(observation) => return Ok(observation),
                Err(e) => {
                    tracing::warn!("attempt {} for {} failed: {}", attempt, url, e);
                    if attempt < max {
                        tokio::time::sleep(self.policy.backoff_unit * attempt).await;
                    }
                }
            }
        }

        Err(AppError::ScrapeExhausted {
            url: url.to_string(),
            attempts: max,
        })
    }

    async fn attempt(&self, url: &str) -> Result<ScrapeObservation> {
        let mut session = self.factory.open().await?;

        let result = match tokio::time::timeout(self.attempt_timeout, self.read_page(session.as_mut(), url)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Scrape(format!(
                "timed out after {}s",
                self.attempt_timeout.as_secs_f32()
            ))),
        };

        session.close().await;
        result
    }

    async fn read_page(&self, session: &mut dyn PageSession, url: &str) -> Result<ScrapeObservation> {
        session.navigate(url).await?;
        tokio::time::sleep(self.settle_delay).await;

        let name = session
            .text(TITLE_SELECTOR)
            .await?
            .ok_or_else(|| AppError::Scrape(format!("no series title on {url}")))?;
        let update = session.text(STATUS_SELECTOR).await?.unwrap_or_default();
        let labels = session
            .attribute_values(EPISODE_LINK_SELECTOR, EPISODE_LABEL_ATTRIBUTE)
            .await?;

        Ok(build_observation(url, name, update, &labels))
    }
}

/// Normalizes scraped labels and fills in a status line when the page had none.
pub fn build_observation(url: &str, name: String, update: String, labels: &[String]) -> ScrapeObservation {
    let series = extract_episode_ids(labels);

    let update = match series.last() {
        Some(last) if update.is_empty() => format!("updated through {last}"),
        _ => update,
    };

    ScrapeObservation {
        name,
        url: url.to_string(),
        update,
        series,
    }
}
