use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shelf_core::canonicalize_url;

use crate::html_session::{LoadedPage, PageLoader};
use crate::session::SessionError;

#[derive(Debug, Clone)]
enum FixtureEntry {
    Page { final_url: String, frames: Vec<String> },
    Failure(String),
}

/// In-memory site for offline runs and tests.
///
/// Pages are looked up by exact URL first, then by canonical URL, so a fixture
/// registered without tracking parameters still answers a link that has them.
/// Clones share the visit log.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    entries: HashMap<String, FixtureEntry>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: impl Into<String>) -> Self {
        self.scrolling_page(url, vec![html.into()])
    }

    /// A page whose content grows as it is scrolled.
    pub fn scrolling_page(mut self, url: &str, frames: Vec<String>) -> Self {
        self.entries.insert(
            url.to_string(),
            FixtureEntry::Page {
                final_url: url.to_string(),
                frames,
            },
        );
        self
    }

    /// `from` serves the content of `to` and reports `to` as its location.
    pub fn redirect(mut self, from: &str, to: &str, html: impl Into<String>) -> Self {
        self.entries.insert(
            from.to_string(),
            FixtureEntry::Page {
                final_url: to.to_string(),
                frames: vec![html.into()],
            },
        );
        self
    }

    pub fn failing(mut self, url: &str, message: impl Into<String>) -> Self {
        self.entries
            .insert(url.to_string(), FixtureEntry::Failure(message.into()));
        self
    }

    /// Every URL requested so far, in order.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn lookup(&self, url: &str) -> Option<&FixtureEntry> {
        self.entries.get(url).or_else(|| {
            canonicalize_url(url).and_then(|key| self.entries.get(&key))
        })
    }
}

#[async_trait]
impl PageLoader for FixtureSite {
    async fn load(&self, url: &str) -> Result<LoadedPage, SessionError> {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(url.to_string());
        }
        match self.lookup(url) {
            Some(FixtureEntry::Page { final_url, frames }) => Ok(LoadedPage {
                final_url: final_url.clone(),
                frames: frames.clone(),
            }),
            Some(FixtureEntry::Failure(message)) => Err(SessionError::navigation(url, message.clone())),
            None => Err(SessionError::navigation(url, "404 not found")),
        }
    }
}
