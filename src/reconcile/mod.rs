//! Classifies a fresh scrape against the stored series record.
//!
//! `reconcile` is pure: it reads the prior record and the observation and
//! returns what to persist and what to announce. Applying the result is the
//! job of [`ReportProcessor`].

mod processor;

use std::collections::HashSet;

use crate::models::{ScrapeObservation, Series};

pub use processor::{ReportProcessor, ReportSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoChange,
    NewEpisodes,
    StatusChange,
}

/// State change to write back for one series, keyed by URL.
///
/// `Replace` and `Status` reset `is_watched` and touch `updated_at`;
/// every variant touches `crawler_last_seen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesDelta {
    Replace { history: Vec<String>, current: String },
    Status { current: String },
    Seen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NewEpisodes {
        name: String,
        episodes: Vec<String>,
        url: String,
    },
    StatusChange {
        name: String,
        old_status: String,
        new_status: String,
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub outcome: Outcome,
    /// Episodes in the observation that the prior history lacked.
    pub new_episodes: Vec<String>,
    pub delta: SeriesDelta,
    pub notification: Option<Notification>,
}

pub fn reconcile(prior: &Series, observation: &ScrapeObservation) -> Reconciliation {
    let existing: HashSet<&str> = prior.history.iter().map(String::as_str).collect();

    let new_episodes: Vec<String> = observation
        .series
        .iter()
        .filter(|ep| !existing.contains(ep.as_str()))
        .cloned()
        .collect();

    if !new_episodes.is_empty() {
        // The summary text not moving means the site hasn't announced anything yet.
        let suppressed = !observation.update.is_empty() && observation.update == prior.current;

        let notification = (!suppressed).then(|| Notification::NewEpisodes {
            name: observation.name.clone(),
            episodes: new_episodes.clone(),
            url: observation.url.clone(),
        });

        return Reconciliation {
            outcome: Outcome::NewEpisodes,
            new_episodes,
            delta: SeriesDelta::Replace {
                history: observation.series.clone(),
                current: observation.update.clone(),
            },
            notification,
        };
    }

    if observation.update != prior.current {
        return Reconciliation {
            outcome: Outcome::StatusChange,
            new_episodes: Vec::new(),
            delta: SeriesDelta::Status {
                current: observation.update.clone(),
            },
            notification: Some(Notification::StatusChange {
                name: observation.name.clone(),
                old_status: prior.current.clone(),
                new_status: observation.update.clone(),
                url: observation.url.clone(),
            }),
        };
    }

    Reconciliation {
        outcome: Outcome::NoChange,
        new_episodes: Vec::new(),
        delta: SeriesDelta::Seen,
        notification: None,
    }
}
