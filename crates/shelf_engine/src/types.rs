use std::fmt;

use shelf_core::{HarvestResult, RequestError};
use thiserror::Error;

use crate::session::SessionError;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    OpeningSession,
    ParsingSeed,
    Searching,
    CollectingLinks { page: u32, pages: u32 },
    Extracting { index: usize, total: usize },
    CapturingFailure,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Queued => write!(f, "queued"),
            Stage::OpeningSession => write!(f, "opening session"),
            Stage::ParsingSeed => write!(f, "parsing seed product"),
            Stage::Searching => write!(f, "searching"),
            Stage::CollectingLinks { page, pages } => write!(f, "collecting links {page}/{pages}"),
            Stage::Extracting { index, total } => write!(f, "extracting {index}/{total}"),
            Stage::CapturingFailure => write!(f, "capturing failure"),
            Stage::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    pub links: usize,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    Progress(JobProgress),
    JobCompleted {
        job_id: JobId,
        result: Result<HarvestResult, HarvestError>,
    },
}

/// Hard failures: the only errors that reach the caller instead of being
/// folded into a partial [`HarvestResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("cannot run workflow: {0}")]
    SessionStart(SessionError),
    #[error("search url could not be built: {0}")]
    SearchUrl(String),
}
