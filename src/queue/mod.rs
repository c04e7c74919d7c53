//! Bounded evaluation queue served by a fixed pool of workers.
//!
//! Every accepted job is acknowledged: its [`Ticket`] resolves with the verdict or the
//! evaluation error once a worker has run it.

pub mod error;
pub mod pool;

#[cfg(test)]
mod tests;

pub use error::{QueueError, QueueResult};
pub use pool::{EvaluationQueue, Ticket};
