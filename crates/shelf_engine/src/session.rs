//! Browser session capability consumed by the harvesting pipeline.
//!
//! The pipeline never starts, configures or closes a browser. It receives an
//! already-initialized session and drives it through [`BrowserSession`]. Who
//! opened the session closes it, see [`SessionFactory`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use shelf_core::FailureClass;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("no page loaded")]
    NoPage,
    #[error("invalid selector {0}")]
    InvalidSelector(String),
    #[error("element vanished: {0}")]
    StaleElement(String),
    #[error("script failed: {0}")]
    Script(String),
    #[error("{0} is not supported by this session")]
    Unsupported(&'static str),
    #[error("network error: {0}")]
    Network(String),
    #[error("browser session unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            waited,
        }
    }

    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Coarse class recorded in failure notes.
    pub fn class(&self) -> FailureClass {
        match self {
            SessionError::Timeout { .. } => FailureClass::Timeout,
            SessionError::Navigation { .. } | SessionError::NoPage => FailureClass::Navigation,
            SessionError::InvalidSelector(_) | SessionError::StaleElement(_) => {
                FailureClass::ElementNotFound
            }
            SessionError::Script(_) => FailureClass::Script,
            SessionError::Network(_) => FailureClass::Network,
            SessionError::Unsupported(_) | SessionError::Unavailable(_) => FailureClass::Session,
        }
    }
}

/// The narrow set of browser operations the pipeline needs.
///
/// Element handles are only valid until the next `navigate`.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    async fn current_url(&self) -> Result<String, SessionError>;

    /// Full text of the currently rendered document (its HTML source).
    async fn page_text(&self) -> Result<String, SessionError>;

    /// Wait until at least one element matches `selector`, never longer than
    /// `timeout`, and return the matches.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, SessionError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, SessionError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    async fn text(&self, element: &Self::Element) -> Result<String, SessionError>;

    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), SessionError>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, SessionError>;
}

/// Opens and closes sessions for the engine, one per request.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession + 'static;

    async fn open(&self) -> Result<Self::Session, SessionError>;

    /// Release the session. Called exactly once per opened session, also when
    /// the workflow failed or was cancelled.
    async fn close(&self, session: Self::Session);
}

/// Run one session call under a hard deadline.
pub(crate) async fn bounded<T>(
    limit: Duration,
    what: &str,
    step: impl Future<Output = Result<T, SessionError>>,
) -> Result<T, SessionError> {
    tokio::time::timeout(limit, step)
        .await
        .unwrap_or_else(|_| Err(SessionError::timeout(what, limit)))
}
