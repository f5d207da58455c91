use std::sync::mpsc;

use tokio_util::sync::CancellationToken;

use crate::settings::DelayRange;
use crate::{HarvestEvent, JobId, JobProgress, Stage};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<HarvestEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: HarvestEvent) {}
}

pub(crate) fn report(sink: &dyn ProgressSink, job_id: JobId, stage: Stage, links: usize, records: usize) {
    sink.emit(HarvestEvent::Progress(JobProgress {
        job_id,
        stage,
        links,
        records,
    }));
}

static DETACHED_SINK: NullProgressSink = NullProgressSink;

/// Per-job handles threaded through one workflow run.
#[derive(Clone)]
pub struct JobContext<'a> {
    pub job_id: JobId,
    pub sink: &'a dyn ProgressSink,
    pub cancel: CancellationToken,
}

impl<'a> JobContext<'a> {
    pub fn new(job_id: JobId, sink: &'a dyn ProgressSink, cancel: CancellationToken) -> Self {
        Self {
            job_id,
            sink,
            cancel,
        }
    }

    /// No progress reporting, never cancelled from outside.
    pub fn detached() -> JobContext<'static> {
        JobContext {
            job_id: 0,
            sink: &DETACHED_SINK,
            cancel: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn report(&self, stage: Stage, links: usize, records: usize) {
        report(self.sink, self.job_id, stage, links, records);
    }

    /// Sleep for a pacing pause, waking early on cancellation.
    pub(crate) async fn pause(&self, range: DelayRange) {
        tokio::select! {
            _ = range.pause() => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}
