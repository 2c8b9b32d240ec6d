mod notifier;
mod slack;

pub use notifier::{Dispatcher, Notifier};
pub use slack::SlackClient;

#[cfg(test)]
pub(crate) use notifier::testing;
