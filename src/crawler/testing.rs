//! Scripted page sessions for runner and batch tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{AppError, Result};

use super::runner::{EPISODE_LINK_SELECTOR, STATUS_SELECTOR, TITLE_SELECTOR};
use super::session::{PageSession, SessionFactory};

#[derive(Debug, Clone)]
pub struct FakePage {
    title: Option<String>,
    status: Option<String>,
    labels: Vec<String>,
}

impl FakePage {
    pub fn new(title: &str, status: Option<&str>, labels: &[&str]) -> Self {
        Self {
            title: Some(title.to_string()),
            status: status.map(str::to_string),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn untitled() -> Self {
        Self {
            title: None,
            status: None,
            labels: Vec::new(),
        }
    }
}

/// Each `open` consumes the next scripted step. An `Err` step makes the
/// session fail on navigate; running out of steps does too.
pub struct ScriptedFactory {
    steps: Mutex<VecDeque<std::result::Result<FakePage, String>>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    navigated: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFactory {
    pub fn new(steps: Vec<std::result::Result<FakePage, String>>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            navigated: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn opened_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opened)
    }

    pub fn closed_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }

    pub fn navigations(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.navigated)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        Ok(Box::new(FakeSession {
            step,
            closed: Arc::clone(&self.closed),
            navigated: Arc::clone(&self.navigated),
        }))
    }
}

struct FakeSession {
    step: std::result::Result<FakePage, String>,
    closed: Arc<AtomicUsize>,
    navigated: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    fn page(&self) -> Result<&FakePage> {
        self.step.as_ref().map_err(|e| AppError::Scrape(e.clone()))
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.navigated.lock().unwrap().push(url.to_string());
        self.page().map(|_| ())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        let page = self.page()?;
        Ok(match selector {
            TITLE_SELECTOR => page.title.clone(),
            STATUS_SELECTOR => page.status.clone(),
            _ => None,
        })
    }

    async fn attribute_values(&self, selector: &str, _attribute: &str) -> Result<Vec<String>> {
        let page = self.page()?;
        Ok(if selector == EPISODE_LINK_SELECTOR {
            page.labels.clone()
        } else {
            Vec::new()
        })
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
