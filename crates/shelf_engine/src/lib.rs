//! Shelf engine: browser-driven harvesting pipeline and its IO.
mod capture;
mod collector;
mod decode;
mod engine;
mod export;
mod extractor;
mod fetch;
mod filename;
mod fixture;
mod html_session;
mod orchestrator;
mod persist;
mod progress;
mod session;
mod settings;
mod types;
#[cfg(feature = "webdriver")]
mod webdriver;

pub use capture::{FailureCapture, StampFn};
pub use collector::{LinkCollection, LinkCollector};
pub use decode::decode_page;
pub use engine::EngineHandle;
pub use export::{records_to_csv, save_results, ExportError, SavedResults};
pub use extractor::FieldExtractor;
pub use fetch::{FetchSettings, HttpLoader};
pub use filename::{sanitize_stem, stamped_stem, ARTIFACT_STAMP_FORMAT, RESULT_STAMP_FORMAT};
pub use fixture::FixtureSite;
pub use html_session::{HtmlElement, HtmlSession, HtmlSessionFactory, LoadedPage, PageLoader};
pub use orchestrator::ScenarioOrchestrator;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use progress::{ChannelProgressSink, JobContext, NullProgressSink, ProgressSink};
pub use session::{BrowserSession, SessionError, SessionFactory};
pub use settings::{CollectorSettings, DelayRange, ExtractorSettings, HarvestSettings, SiteSettings};
pub use types::{HarvestError, HarvestEvent, JobId, JobProgress, Stage};
#[cfg(feature = "webdriver")]
pub use webdriver::{WebDriverFactory, WebDriverSession, WebDriverSettings};
