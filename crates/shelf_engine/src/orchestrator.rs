//! Query and analog workflows over one browser session.
//!
//! Query: search, collect links, extract each product in collection order.
//! Analogs: extract the seed product, search with its title, drop the seed
//! from the hits and merge it back in first.

use engine_logging::{engine_info, engine_warn};
use shelf_core::{
    canonicalize_url, merge_with_seed, AbortReason, CapSignal, CapStage, CollectionRequest,
    FailureNote, HarvestResult, OmittedLink, ProductRecord, RequestKind, TerminationReason,
};

use crate::capture::FailureCapture;
use crate::collector::LinkCollector;
use crate::extractor::FieldExtractor;
use crate::progress::JobContext;
use crate::session::{bounded, BrowserSession, SessionError};
use crate::settings::HarvestSettings;
use crate::{HarvestError, Stage};

pub struct ScenarioOrchestrator {
    settings: HarvestSettings,
    capture: FailureCapture,
}

impl ScenarioOrchestrator {
    pub fn new(settings: HarvestSettings) -> Self {
        let capture = FailureCapture::new(settings.artifact_dir.clone())
            .with_step_timeout(settings.capture_timeout);
        Self { settings, capture }
    }

    /// Replace the artifact writer, e.g. to pin artifact ids in tests.
    pub fn with_capture(mut self, capture: FailureCapture) -> Self {
        self.capture = capture;
        self
    }

    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    /// Validate `request` and run the matching workflow.
    pub async fn run<S: BrowserSession>(
        &self,
        session: &mut S,
        request: &CollectionRequest,
        ctx: &JobContext<'_>,
    ) -> Result<HarvestResult, HarvestError> {
        request.validate()?;
        match &request.kind {
            RequestKind::Query { text } => {
                self.run_query_workflow(session, text.trim(), request.pages, request.max_items, ctx)
                    .await
            }
            RequestKind::AnalogsOf { seed_url } => {
                self.run_analogs_workflow(
                    session,
                    seed_url.trim(),
                    request.pages,
                    request.max_items,
                    ctx,
                )
                .await
            }
        }
    }

    /// Links are gathered up to [`CollectorSettings::link_target`], records
    /// are extracted up to `max_items`. The two caps are applied separately.
    ///
    /// [`CollectorSettings::link_target`]: crate::CollectorSettings::link_target
    pub async fn run_query_workflow<S: BrowserSession>(
        &self,
        session: &mut S,
        text: &str,
        pages: u32,
        max_items: usize,
        ctx: &JobContext<'_>,
    ) -> Result<HarvestResult, HarvestError> {
        let link_target = self.settings.collector.link_target_for(max_items);
        self.search_and_extract(session, text, pages, max_items, link_target, None, ctx)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn search_and_extract<S: BrowserSession>(
        &self,
        session: &mut S,
        text: &str,
        pages: u32,
        max_items: usize,
        link_target: usize,
        exclude: Option<&str>,
        ctx: &JobContext<'_>,
    ) -> Result<HarvestResult, HarvestError> {
        let search_url = self
            .settings
            .site
            .search_url(text)
            .map_err(|err| HarvestError::SearchUrl(err.to_string()))?;
        let max_items = max_items.max(1);
        let mut result = HarvestResult::default();

        engine_info!("Searching for \"{}\": {}", text, search_url);
        ctx.report(Stage::Searching, 0, 0);
        if let Err(err) = self.navigate(session, &search_url).await {
            engine_warn!("!!! Search page did not open: {}", err);
            ctx.report(Stage::CapturingFailure, 0, 0);
            let artifacts = self.capture.capture(session, "error_search").await;
            result.failure = Some(FailureNote {
                page: 0,
                class: err.class(),
                message: err.to_string(),
                artifacts,
            });
            result.termination = Some(TerminationReason::Interrupted);
            return Ok(result);
        }

        let collector = LinkCollector::new(self.settings.collector.clone(), self.capture.clone());
        let collection = collector.collect(session, link_target, pages, ctx).await;
        result.termination = Some(collection.termination);
        result.failure = collection.failure;
        if collection.termination == TerminationReason::CapReached {
            result.cap_signals.push(CapSignal {
                stage: CapStage::Links,
                cap: collection.links.cap(),
                skipped: collection.skipped_at_cap,
            });
        }
        if collection.cancelled {
            result.abort = Some(AbortReason::Cancelled);
            return Ok(result);
        }

        let mut links = collection.links.into_vec();
        engine_info!("Collected {} unique links", links.len());
        if let Some(excluded) = exclude {
            let before = links.len();
            links.retain(|link| link_key(link) != excluded);
            if links.len() < before {
                engine_info!("  - seed found among the hits, skipped");
            }
        }
        if links.len() > max_items {
            result.cap_signals.push(CapSignal {
                stage: CapStage::Records,
                cap: max_items,
                skipped: links.len() - max_items,
            });
        }

        let total = links.len().min(max_items);
        for (index, link) in links.iter().take(max_items).enumerate() {
            if ctx.is_cancelled() {
                engine_warn!("Extraction cancelled after {} records", result.records.len());
                result.abort = Some(AbortReason::Cancelled);
                break;
            }
            ctx.report(
                Stage::Extracting {
                    index: index + 1,
                    total,
                },
                total,
                result.records.len(),
            );
            engine_info!("[{}/{}] Parsing: {}", index + 1, total, link);

            if let Err(err) = self.navigate(session, link).await {
                engine_warn!("  - product page skipped: {}", err);
                result.omitted.push(OmittedLink {
                    url: link.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
            ctx.pause(self.settings.product_pause).await;

            let extractor = FieldExtractor::new(self.settings.extractor.clone());
            let record = extractor.extract(session, link).await;
            result.records.push(record);
        }

        Ok(result)
    }

    pub async fn run_analogs_workflow<S: BrowserSession>(
        &self,
        session: &mut S,
        seed_url: &str,
        pages: u32,
        max_items: usize,
        ctx: &JobContext<'_>,
    ) -> Result<HarvestResult, HarvestError> {
        engine_info!("Parsing seed product: {}", seed_url);
        ctx.report(Stage::ParsingSeed, 0, 0);

        let seed = match self.navigate(session, seed_url).await {
            Ok(()) => {
                ctx.pause(self.settings.product_pause).await;
                FieldExtractor::new(self.settings.extractor.clone())
                    .extract(session, seed_url)
                    .await
            }
            Err(err) => {
                engine_warn!("!!! Seed page did not open: {}", err);
                let url = canonicalize_url(seed_url).unwrap_or_else(|| seed_url.to_string());
                ProductRecord::new(url)
            }
        };

        let title = match seed.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                let reason = AbortReason::SeedWithoutTitle {
                    seed_url: seed.url.clone(),
                };
                engine_warn!("Analog search aborted: {}", reason);
                return Ok(HarvestResult::aborted(reason));
            }
        };
        if ctx.is_cancelled() {
            let mut result = HarvestResult::aborted(AbortReason::Cancelled);
            result.records = merge_with_seed(seed, Vec::new());
            return Ok(result);
        }

        engine_info!("Seed title: {}", title);
        let seed_key = link_key(&seed.url);
        let link_target = self
            .settings
            .collector
            .link_target
            .unwrap_or(max_items.saturating_add(1))
            .max(1);
        let mut result = self
            .search_and_extract(
                session,
                &title,
                pages,
                max_items,
                link_target,
                Some(&seed_key),
                ctx,
            )
            .await?;
        let analogs = std::mem::take(&mut result.records);
        result.records = merge_with_seed(seed, analogs);
        Ok(result)
    }

    async fn navigate<S: BrowserSession>(&self, session: &mut S, url: &str) -> Result<(), SessionError> {
        let limit = self.settings.navigation_timeout;
        bounded(limit, url, session.navigate(url)).await
    }
}

fn link_key(url: &str) -> String {
    canonicalize_url(url).unwrap_or_else(|| url.trim().to_string())
}
