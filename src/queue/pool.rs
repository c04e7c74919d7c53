use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::error::{QueueError, QueueResult};
use crate::cache::{CacheStore, MemoryStore};
use crate::gateway::InferenceBackend;
use crate::orchestrator::{Orchestrator, OrchestratorResult, Submission, SuspicionVerdict, Task};

struct Job {
    task: Task,
    submission: Submission,
    reply: oneshot::Sender<OrchestratorResult<SuspicionVerdict>>,
    enqueued_at: Instant,
}

/// Handle to one queued evaluation.
#[derive(Debug)]
pub struct Ticket {
    pub(super) task_id: String,
    pub(super) receiver: oneshot::Receiver<OrchestratorResult<SuspicionVerdict>>,
}

impl Ticket {
    /// Id of the task the job evaluates.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Waits for the worker's answer.
    ///
    /// The outer result reports queue failures; the inner one is the evaluation outcome.
    pub async fn wait(self) -> QueueResult<OrchestratorResult<SuspicionVerdict>> {
        self.receiver.await.map_err(|_| QueueError::WorkerGone)
    }
}

/// Bounded channel of evaluation jobs drained by `workers` tokio tasks.
///
/// [`Self::submit`] waits for room when the channel is full; [`Self::try_submit`]
/// fails with [`QueueError::Full`] instead.
pub struct EvaluationQueue<B: InferenceBackend, S: CacheStore = MemoryStore> {
    sender: parking_lot::Mutex<Option<mpsc::Sender<Job>>>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    capacity: usize,
    orchestrator: Arc<Orchestrator<B, S>>,
}

impl<B, S> EvaluationQueue<B, S>
where
    B: InferenceBackend + 'static,
    S: CacheStore + 'static,
{
    /// Spawns the worker pool. Zero `workers` or `capacity` is treated as one.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(orchestrator: Arc<Orchestrator<B, S>>, workers: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(AsyncMutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&receiver),
                    Arc::clone(&orchestrator),
                ))
            })
            .collect::<Vec<_>>();

        info!(workers = handles.len(), capacity, "Evaluation queue started");

        Self {
            sender: parking_lot::Mutex::new(Some(sender)),
            workers: parking_lot::Mutex::new(handles),
            capacity,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator<B, S>> {
        &self.orchestrator
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs accepted but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map(|sender| self.capacity - sender.capacity())
            .unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Enqueues a job, waiting for room if the queue is full.
    #[instrument(skip(self, task, submission), fields(task_id = %task.id))]
    pub async fn submit(&self, task: Task, submission: Submission) -> QueueResult<Ticket> {
        let sender = self.sender()?;
        let (job, ticket) = job(task, submission);

        sender.send(job).await.map_err(|_| QueueError::Closed)?;
        debug!("Job queued");
        Ok(ticket)
    }

    /// Enqueues a job only if there is room right now.
    pub fn try_submit(&self, task: Task, submission: Submission) -> QueueResult<Ticket> {
        let sender = self.sender()?;
        let (job, ticket) = job(task, submission);

        match sender.try_send(job) {
            Ok(()) => Ok(ticket),
            Err(TrySendError::Full(_)) => {
                warn!(capacity = self.capacity, "Evaluation queue full");
                Err(QueueError::Full)
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Stops accepting jobs, lets the workers drain what is queued, then joins them.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        let pending = self.capacity - sender.capacity();
        drop(sender);
        info!(pending, "Evaluation queue shutting down");

        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Evaluation worker failed");
            }
        }
        info!("Evaluation queue stopped");
    }

    fn sender(&self) -> QueueResult<mpsc::Sender<Job>> {
        self.sender.lock().clone().ok_or(QueueError::Closed)
    }
}

impl<B: InferenceBackend, S: CacheStore> std::fmt::Debug for EvaluationQueue<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationQueue")
            .field("capacity", &self.capacity)
            .field("workers", &self.workers.lock().len())
            .finish_non_exhaustive()
    }
}

fn job(task: Task, submission: Submission) -> (Job, Ticket) {
    let (reply, receiver) = oneshot::channel();
    let ticket = Ticket {
        task_id: task.id.clone(),
        receiver,
    };
    let job = Job {
        task,
        submission,
        reply,
        enqueued_at: Instant::now(),
    };
    (job, ticket)
}

async fn run_worker<B, S>(
    id: usize,
    receiver: Arc<AsyncMutex<mpsc::Receiver<Job>>>,
    orchestrator: Arc<Orchestrator<B, S>>,
) where
    B: InferenceBackend + 'static,
    S: CacheStore + 'static,
{
    debug!(worker = id, "Evaluation worker started");

    loop {
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        let waited = job.enqueued_at.elapsed();
        debug!(
            worker = id,
            task_id = %job.task.id,
            queued_ms = waited.as_millis() as u64,
            "Job picked up"
        );

        let result = orchestrator
            .evaluate_submission(&job.task, &job.submission)
            .await;

        if job.reply.send(result).is_err() {
            debug!(worker = id, task_id = %job.task.id, "Ticket dropped before completion");
        }
    }

    debug!(worker = id, "Evaluation worker stopped");
}
