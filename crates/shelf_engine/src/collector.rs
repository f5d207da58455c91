use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use shelf_core::{resolve_link, FailureNote, LinkSet, TerminationReason};

use crate::capture::FailureCapture;
use crate::progress::JobContext;
use crate::session::{bounded, BrowserSession, SessionError};
use crate::settings::CollectorSettings;
use crate::Stage;

/// What one collection pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCollection {
    pub links: LinkSet,
    pub termination: TerminationReason,
    /// Set when a page-level failure interrupted the loop.
    pub failure: Option<FailureNote>,
    /// Product links still rendered on the page where the cap was hit.
    pub skipped_at_cap: usize,
    pub cancelled: bool,
}

/// Scrolls a search-results view and gathers product links up to a cap.
///
/// One collector serves one workflow run; it holds no state between calls.
pub struct LinkCollector {
    settings: CollectorSettings,
    capture: FailureCapture,
}

impl LinkCollector {
    pub fn new(settings: CollectorSettings, capture: FailureCapture) -> Self {
        Self { settings, capture }
    }

    /// Collect at most `target` links over at most `max_pages` scroll
    /// iterations of the view the session already shows.
    ///
    /// Never fails: a broken page ends the loop with
    /// [`TerminationReason::Interrupted`], a captured [`FailureNote`] and
    /// whatever links were gathered before it.
    pub async fn collect<S: BrowserSession>(
        &self,
        session: &mut S,
        target: usize,
        max_pages: u32,
        ctx: &JobContext<'_>,
    ) -> LinkCollection {
        let mut collection = LinkCollection {
            links: LinkSet::new(target),
            termination: TerminationReason::PagesExhausted,
            failure: None,
            skipped_at_cap: 0,
            cancelled: false,
        };
        let max_pages = max_pages.max(1);

        for page in 1..=max_pages {
            if collection.links.is_full() {
                engine_info!(
                    "Enough links collected ({}), no more scrolling.",
                    collection.links.len()
                );
                collection.termination = TerminationReason::CapReached;
                break;
            }
            if ctx.is_cancelled() {
                engine_warn!("Link collection cancelled before page {}", page);
                collection.termination = TerminationReason::Interrupted;
                collection.cancelled = true;
                break;
            }

            ctx.report(
                Stage::CollectingLinks {
                    page,
                    pages: max_pages,
                },
                collection.links.len(),
                0,
            );
            engine_info!("--- Collecting links: scroll iteration {}/{} ---", page, max_pages);

            let step = match self.read_page(session, &mut collection.links).await {
                Ok(skipped) => {
                    collection.skipped_at_cap = skipped;
                    engine_info!("  - unique links so far: {}", collection.links.len());
                    if collection.links.is_full() {
                        collection.termination = TerminationReason::CapReached;
                        break;
                    }
                    if page < max_pages {
                        engine_debug!("  - scrolling down...");
                        bounded(
                            self.settings.read_timeout,
                            "scroll",
                            session.scroll_by(self.settings.scroll_delta),
                        )
                        .await
                    } else {
                        Ok(())
                    }
                }
                Err(err) => Err(err),
            };

            if let Err(err) = step {
                self.interrupt(session, &mut collection, page, err, ctx).await;
                break;
            }

            if page < max_pages {
                ctx.pause(self.settings.scroll_pause).await;
            }
        }

        collection
    }

    /// Wait for the results container, then add its links until the cap.
    /// Returns how many rendered links were left unread because the cap hit.
    async fn read_page<S: BrowserSession>(
        &self,
        session: &S,
        links: &mut LinkSet,
    ) -> Result<usize, SessionError> {
        let wait = self.settings.wait_timeout;
        let read = self.settings.read_timeout;
        bounded(
            wait + Duration::from_secs(1),
            &self.settings.results_selector,
            session.wait_for_selector(&self.settings.results_selector, wait),
        )
        .await?;

        let base = bounded(read, "current url", session.current_url())
            .await
            .ok();
        let selector = self.settings.scoped_link_selector();
        let elements = bounded(read, &selector, session.find_all(&selector)).await?;

        for (index, element) in elements.iter().enumerate() {
            let href = bounded(read, "href", session.attribute(element, "href")).await?;
            let Some(href) = href else { continue };
            if let Some(link) = resolve_link(&href, base.as_deref()) {
                links.insert(&link);
            }
            if links.is_full() {
                return Ok(elements.len() - index - 1);
            }
        }
        Ok(0)
    }

    async fn interrupt<S: BrowserSession>(
        &self,
        session: &S,
        collection: &mut LinkCollection,
        page: u32,
        err: SessionError,
        ctx: &JobContext<'_>,
    ) {
        engine_warn!("!!! Link collection broke on page {}: {}. Saving debug artifacts.", page, err);
        ctx.report(Stage::CapturingFailure, collection.links.len(), 0);
        let artifacts = self.capture.capture(session, &format!("error_page{page}")).await;
        collection.failure = Some(FailureNote {
            page,
            class: err.class(),
            message: err.to_string(),
            artifacts,
        });
        collection.termination = TerminationReason::Interrupted;
    }
}
