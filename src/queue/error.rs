use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// Errors returned by [`super::EvaluationQueue`] and [`super::Ticket`].
pub enum QueueError {
    /// The queue is at capacity and the caller asked not to wait.
    #[error("evaluation queue is full")]
    Full,

    /// The queue has been shut down.
    #[error("evaluation queue is closed")]
    Closed,

    /// The worker holding the job went away without answering.
    #[error("worker exited before completing the job")]
    WorkerGone,
}

/// Convenience result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;
