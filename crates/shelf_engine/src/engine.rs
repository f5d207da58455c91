use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use shelf_core::{AbortReason, CollectionRequest, HarvestResult};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::orchestrator::ScenarioOrchestrator;
use crate::progress::{report, ChannelProgressSink, JobContext};
use crate::session::{bounded, SessionError, SessionFactory};
use crate::settings::HarvestSettings;
use crate::{HarvestError, HarvestEvent, JobId, Stage};

enum EngineCommand {
    Submit {
        job_id: JobId,
        request: CollectionRequest,
    },
    Cancel {
        job_id: JobId,
    },
    Shutdown,
}

struct RunningJob {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Runs harvest jobs on a background runtime, each with its own session.
///
/// At most `max_sessions` sessions are open at once; further jobs queue.
/// Events arrive in order per job and always end with
/// [`HarvestEvent::JobCompleted`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<HarvestEvent>,
}

impl EngineHandle {
    pub fn new<F>(factory: F, settings: HarvestSettings, max_sessions: usize) -> Self
    where
        F: SessionFactory + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let factory = Arc::new(factory);
        let orchestrator = Arc::new(ScenarioOrchestrator::new(settings));
        let permits = Arc::new(Semaphore::new(max_sessions.max(1)));

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let shutdown = CancellationToken::new();
            let mut jobs: HashMap<JobId, RunningJob> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                jobs.retain(|_, job| !job.task.is_finished());
                match command {
                    EngineCommand::Submit { job_id, request } => {
                        let cancel = shutdown.child_token();
                        let task = runtime.spawn(run_job(
                            factory.clone(),
                            orchestrator.clone(),
                            permits.clone(),
                            job_id,
                            request,
                            cancel.clone(),
                            event_tx.clone(),
                        ));
                        if let Some(previous) = jobs.insert(job_id, RunningJob { cancel, task }) {
                            engine_warn!("Job {} resubmitted while still running", job_id);
                            previous.cancel.cancel();
                        }
                    }
                    EngineCommand::Cancel { job_id } => match jobs.get(&job_id) {
                        Some(job) => {
                            engine_info!("Cancelling job {}", job_id);
                            job.cancel.cancel();
                        }
                        None => engine_warn!("Cancel for unknown or finished job {}", job_id),
                    },
                    EngineCommand::Shutdown => break,
                }
            }

            shutdown.cancel();
            permits.close();
            runtime.block_on(async {
                for (_, job) in jobs.drain() {
                    let _ = job.task.await;
                }
            });
            runtime.shutdown_timeout(Duration::from_secs(5));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, job_id: JobId, request: CollectionRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { job_id, request });
    }

    /// Ask a job to stop at its next loop boundary. It still completes with
    /// its partial result.
    pub fn cancel(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { job_id });
    }

    /// Cancel every job, wait for their sessions to close, stop the runtime.
    /// Pending events stay readable until the channel drains.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<HarvestEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block until the next event. `None` once the engine has shut down and
    /// every event was read.
    pub fn recv(&self) -> Option<HarvestEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<HarvestEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn run_job<F: SessionFactory>(
    factory: Arc<F>,
    orchestrator: Arc<ScenarioOrchestrator>,
    permits: Arc<Semaphore>,
    job_id: JobId,
    request: CollectionRequest,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<HarvestEvent>,
) {
    let sink = ChannelProgressSink::new(event_tx.clone());
    report(&sink, job_id, Stage::Queued, 0, 0);

    let result = match request.validate() {
        Err(err) => Err(HarvestError::from(err)),
        Ok(()) => {
            let permit = tokio::select! {
                permit = permits.acquire_owned() => permit.ok(),
                _ = cancel.cancelled() => None,
            };
            match permit {
                None if cancel.is_cancelled() => Ok(HarvestResult::aborted(AbortReason::Cancelled)),
                None => Err(HarvestError::SessionStart(SessionError::Unavailable(
                    "engine shut down".to_string(),
                ))),
                Some(_permit) => {
                    report(&sink, job_id, Stage::OpeningSession, 0, 0);
                    let limit = orchestrator.settings().session_timeout;
                    match bounded(limit, "session start", factory.open()).await {
                        Err(err) => {
                            engine_warn!("Job {}: session did not start: {}", job_id, err);
                            Err(HarvestError::SessionStart(err))
                        }
                        Ok(mut session) => {
                            let ctx = JobContext::new(job_id, &sink, cancel);
                            let outcome = orchestrator.run(&mut session, &request, &ctx).await;
                            if tokio::time::timeout(limit, factory.close(session)).await.is_err() {
                                engine_warn!(
                                    "Job {}: session did not close within {:?}",
                                    job_id,
                                    limit
                                );
                            }
                            outcome
                        }
                    }
                }
            }
        }
    };

    let records = result.as_ref().map(|r| r.records.len()).unwrap_or(0);
    report(&sink, job_id, Stage::Done, 0, records);
    let _ = event_tx.send(HarvestEvent::JobCompleted { job_id, result });
}
