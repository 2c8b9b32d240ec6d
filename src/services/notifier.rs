//! Detached notification delivery.
//!
//! Reconciliation only enqueues; a dedicated task drains the queue and hands
//! each notification to the sink. Delivery failures are logged and dropped.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::reconcile::Notification;

#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Cheap, cloneable handle for enqueueing notifications.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Never blocks; if the dispatcher is gone the notification is dropped.
    pub fn send(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::warn!("notification dropped: dispatcher has stopped");
        }
    }
}

pub struct Dispatcher {
    handle: JoinHandle<usize>,
}

impl Dispatcher {
    /// Spawns the delivery task and returns the handle used to feed it.
    pub fn spawn<S: NotificationSink>(sink: S) -> (Notifier, Dispatcher) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        let handle = tokio::spawn(async move {
            let mut delivered = 0;
            while let Some(notification) = rx.recv().await {
                match sink.deliver(&notification).await {
                    Ok(()) => {
                        delivered += 1;
                        tracing::info!("sent notification: {}", describe(&notification));
                    }
                    Err(e) => {
                        tracing::error!("failed to send notification ({}): {}", describe(&notification), e);
                    }
                }
            }
            delivered
        });

        (Notifier { tx }, Dispatcher { handle })
    }

    /// Waits for every queued notification to be attempted. Resolves once all
    /// `Notifier` clones are dropped. Returns how many were delivered.
    pub async fn finish(self) -> usize {
        match self.handle.await {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::error!("notification dispatcher panicked: {}", e);
                0
            }
        }
    }
}

fn describe(notification: &Notification) -> String {
    match notification {
        Notification::NewEpisodes { name, episodes, .. } => {
            format!("{} +{} episode(s)", name, episodes.len())
        }
        Notification::StatusChange {
            name,
            old_status,
            new_status,
            ..
        } => format!("{} {} -> {}", name, old_status, new_status),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::AppError;

    /// Records every notification; fails the ones whose series name is listed.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub seen: Arc<Mutex<Vec<Notification>>>,
        pub fail_for: Vec<String>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, notification: &Notification) -> Result<()> {
            self.seen.lock().unwrap().push(notification.clone());
            let name = match notification {
                Notification::NewEpisodes { name, .. } | Notification::StatusChange { name, .. } => name,
            };
            if self.fail_for.contains(name) {
                return Err(AppError::Webhook("HTTP 500".to_string()));
            }
            Ok(())
        }
    }
}
