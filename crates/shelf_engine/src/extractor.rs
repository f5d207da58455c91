use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use shelf_core::{canonicalize_url, parse_price, parse_score_line, ProductRecord, ScoreLine};
use thiserror::Error;

use crate::session::{bounded, BrowserSession, SessionError};
use crate::settings::ExtractorSettings;

/// Why one field group came back empty. Only ever logged.
#[derive(Debug, Error)]
enum FieldIssue {
    #[error("no element matches {0}")]
    Missing(String),
    #[error("cannot parse {0:?}")]
    Unparsable(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Reads one product record from the page the session currently shows.
///
/// Title, price and score are independent: each one that fails is left
/// absent and logged, the rest are still read. Extraction never fails.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    settings: ExtractorSettings,
}

impl FieldExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    /// `page_url` is the link the caller navigated to; it only stands in when
    /// the session cannot report its location.
    pub async fn extract<S: BrowserSession>(&self, session: &S, page_url: &str) -> ProductRecord {
        let read = self.settings.read_timeout;
        let location = match bounded(read, "current url", session.current_url()).await {
            Ok(current) => canonicalize_url(&current),
            Err(err) => {
                engine_warn!("  - location unknown for {}: {}", page_url, err);
                None
            }
        };
        let url = location
            .or_else(|| canonicalize_url(page_url))
            .unwrap_or_else(|| page_url.trim().to_string());
        let mut record = ProductRecord::new(url);

        match self.read_title(session).await {
            Ok(title) => record.title = Some(title),
            Err(issue) => degrade("title", &record.url, &issue),
        }

        match self.read_price(session).await {
            Ok(price) => record.price = Some(price),
            Err(issue) => degrade("price", &record.url, &issue),
        }

        match self.read_score(session).await {
            Ok(score) => {
                if score.rating.is_none() || score.reviews_count.is_none() {
                    engine_debug!("  - partial score on {}: {:?}", record.url, score);
                }
                record.apply_score(score);
            }
            Err(issue) => degrade("rating/reviews", &record.url, &issue),
        }

        if let Some(title) = &record.title {
            let short: String = title.chars().take(30).collect();
            engine_info!("  - parsed: {}...", short);
        }
        record
    }

    async fn read_title<S: BrowserSession>(&self, session: &S) -> Result<String, FieldIssue> {
        let selector = &self.settings.title_selector;
        let limit = self.settings.title_timeout + Duration::from_secs(1);
        let found = bounded(
            limit,
            selector,
            session.wait_for_selector(selector, self.settings.title_timeout),
        )
        .await?;
        let first = found
            .first()
            .ok_or_else(|| FieldIssue::Missing(selector.clone()))?;
        let text = bounded(self.settings.read_timeout, selector, session.text(first)).await?;
        let title = text.trim();
        if title.is_empty() {
            return Err(FieldIssue::Missing(selector.clone()));
        }
        Ok(title.to_string())
    }

    async fn read_price<S: BrowserSession>(&self, session: &S) -> Result<u64, FieldIssue> {
        let text = self.first_text(session, &self.settings.price_selector).await?;
        parse_price(&text).ok_or(FieldIssue::Unparsable(text))
    }

    async fn read_score<S: BrowserSession>(&self, session: &S) -> Result<ScoreLine, FieldIssue> {
        let text = self.first_text(session, &self.settings.score_selector).await?;
        let score = parse_score_line(&text, self.settings.score_separator);
        if score == ScoreLine::default() {
            return Err(FieldIssue::Unparsable(text));
        }
        Ok(score)
    }

    async fn first_text<S: BrowserSession>(
        &self,
        session: &S,
        selector: &str,
    ) -> Result<String, FieldIssue> {
        let found = bounded(self.settings.read_timeout, selector, session.find_all(selector)).await?;
        let first = found
            .first()
            .ok_or_else(|| FieldIssue::Missing(selector.to_string()))?;
        Ok(bounded(self.settings.read_timeout, selector, session.text(first)).await?)
    }
}

fn degrade(field: &str, url: &str, issue: &FieldIssue) {
    engine_warn!("  - {} absent on {}: {}", field, url, issue);
}
