use crate::models::ScrapeObservation;

use super::runner::ScrapeRunner;
use super::session::SessionFactory;

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub observations: Vec<ScrapeObservation>,
    pub failed: Vec<String>,
}

/// Crawls `urls` one at a time. A URL that exhausts its retries is logged and
/// left out of the results; the rest of the batch still runs.
pub async fn crawl_batch<F: SessionFactory>(runner: &ScrapeRunner<F>, urls: &[String]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for url in urls {
        match runner.scrape(url).await {
            Ok(observation) => {
                tracing::info!("crawled {} -> {}", url, observation.name);
                outcome.observations.push(observation);
            }
            Err(e) => {
                tracing::error!("crawl of {} failed: {}", url, e);
                outcome.failed.push(url.clone());
            }
        }
    }

    tracing::info!(
        "batch finished: {} crawled, {} failed",
        outcome.observations.len(),
        outcome.failed.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::crawler::runner::RetryPolicy;
    use crate::crawler::testing::{FakePage, ScriptedFactory};

    #[tokio::test]
    async fn failing_url_is_skipped_and_batch_continues() {
        let factory = ScriptedFactory::new(vec![
            Ok(FakePage::new("First", None, &["S01E01"])),
            Err("down".to_string()),
            Err("down".to_string()),
            Err("down".to_string()),
            Ok(FakePage::new("Third", Some("Airing"), &["S02E05"])),
        ]);
        let navigations = factory.navigations();
        let runner = ScrapeRunner::new(
            factory,
            RetryPolicy {
                max_attempts: 3,
                backoff_unit: Duration::from_millis(1),
            },
            Duration::ZERO,
            Duration::from_secs(5),
        );
        let urls = vec![
            "https://example.com/1".to_string(),
            "https://example.com/2".to_string(),
            "https://example.com/3".to_string(),
        ];

        let outcome = crawl_batch(&runner, &urls).await;

        let names: Vec<_> = outcome.observations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);
        assert_eq!(outcome.failed, vec!["https://example.com/2"]);
        assert_eq!(
            *navigations.lock().unwrap(),
            vec![
                "https://example.com/1",
                "https://example.com/2",
                "https://example.com/2",
                "https://example.com/2",
                "https://example.com/3",
            ]
        );
    }

    #[tokio::test]
    async fn empty_batch_does_nothing() {
        let factory = ScriptedFactory::new(Vec::new());
        let opened = factory.opened_counter();
        let runner = ScrapeRunner::new(factory, RetryPolicy::default(), Duration::ZERO, Duration::from_secs(1));

        let outcome = crawl_batch(&runner, &[]).await;
        assert!(outcome.observations.is_empty());
        assert!(outcome.failed.is_empty());
        assert_eq!(opened.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
