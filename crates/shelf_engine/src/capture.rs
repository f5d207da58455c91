use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use shelf_core::ArtifactRefs;

use crate::filename::{stamped_stem, ARTIFACT_STAMP_FORMAT};
use crate::persist::AtomicFileWriter;
use crate::session::{bounded, BrowserSession};

const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(20);

/// Source of the timestamp part of artifact ids.
pub type StampFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Saves a screenshot and the rendered document when a pipeline step breaks.
///
/// Both artifacts share one id. Each is attempted on its own; a failure of
/// one is recorded in [`ArtifactRefs::errors`] and never stops the other.
#[derive(Clone)]
pub struct FailureCapture {
    writer: AtomicFileWriter,
    stamp: StampFn,
    step_timeout: Duration,
}

impl FailureCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_stamp(
            dir,
            Arc::new(|| chrono::Local::now().format(ARTIFACT_STAMP_FORMAT).to_string()),
        )
    }

    pub fn with_stamp(dir: impl Into<PathBuf>, stamp: StampFn) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir.into()),
            stamp,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Bound each of the two artifact reads by `limit`.
    pub fn with_step_timeout(mut self, limit: Duration) -> Self {
        self.step_timeout = limit;
        self
    }

    pub async fn capture<S: BrowserSession>(&self, session: &S, label: &str) -> ArtifactRefs {
        let id = stamped_stem(label, &(self.stamp)());
        let mut refs = ArtifactRefs {
            id: id.clone(),
            ..ArtifactRefs::default()
        };
        engine_error!("Capturing failure artifacts as {}", id);

        match bounded(self.step_timeout, "screenshot", session.screenshot()).await {
            Ok(png) => match self.writer.write_bytes(&format!("{id}.png"), &png) {
                Ok(path) => refs.screenshot = Some(path),
                Err(err) => refs.errors.push(format!("screenshot not saved: {err}")),
            },
            Err(err) => refs.errors.push(format!("screenshot not taken: {err}")),
        }

        match bounded(self.step_timeout, "page dump", session.page_text()).await {
            Ok(html) => match self.writer.write(&format!("{id}.html"), &html) {
                Ok(path) => refs.dom_dump = Some(path),
                Err(err) => refs.errors.push(format!("page dump not saved: {err}")),
            },
            Err(err) => refs.errors.push(format!("page dump not taken: {err}")),
        }

        if let Some(path) = &refs.screenshot {
            engine_info!("  - screenshot: {}", path.display());
        }
        if let Some(path) = &refs.dom_dump {
            engine_info!("  - html: {}", path.display());
        }
        for note in &refs.errors {
            engine_warn!("  - {}", note);
        }
        refs
    }
}
