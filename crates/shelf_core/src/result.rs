use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ProductRecord;

/// Why a link-collection loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    CapReached,
    PagesExhausted,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapStage {
    Links,
    Records,
}

/// Items left on the table because a cap was hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapSignal {
    pub stage: CapStage,
    pub cap: usize,
    /// How many further candidates were known but not taken.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Timeout,
    Navigation,
    ElementNotFound,
    Script,
    Network,
    Session,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::Timeout => write!(f, "timeout"),
            FailureClass::Navigation => write!(f, "navigation failure"),
            FailureClass::ElementNotFound => write!(f, "element not found"),
            FailureClass::Script => write!(f, "script error"),
            FailureClass::Network => write!(f, "network error"),
            FailureClass::Session => write!(f, "session error"),
        }
    }
}

/// Diagnostic files written for one failure. Either path may be missing when
/// its capture failed; `errors` says why.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactRefs {
    pub id: String,
    pub screenshot: Option<PathBuf>,
    pub dom_dump: Option<PathBuf>,
    pub errors: Vec<String>,
}

impl ArtifactRefs {
    pub fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.dom_dump.is_none()
    }
}

/// The one page-level failure that ended collection early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureNote {
    /// 1-based page iteration; 0 when the failure hit before the first page.
    pub page: u32,
    pub class: FailureClass,
    pub message: String,
    pub artifacts: ArtifactRefs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// The seed product page yielded no title, so there is nothing to search for.
    SeedWithoutTitle { seed_url: String },
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::SeedWithoutTitle { seed_url } => {
                write!(f, "seed product {seed_url} has no title")
            }
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A collected link whose product page could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmittedLink {
    pub url: String,
    pub reason: String,
}

/// Everything a workflow run produced, including how and why it stopped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestResult {
    pub records: Vec<ProductRecord>,
    pub cap_signals: Vec<CapSignal>,
    pub omitted: Vec<OmittedLink>,
    pub failure: Option<FailureNote>,
    pub termination: Option<TerminationReason>,
    pub abort: Option<AbortReason>,
}

impl HarvestResult {
    pub fn aborted(reason: AbortReason) -> Self {
        Self {
            abort: Some(reason),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn seed(&self) -> Option<&ProductRecord> {
        self.records.iter().find(|r| r.is_seed == Some(true))
    }
}
