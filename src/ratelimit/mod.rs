//! Per-model sliding-window request quotas.
//!
//! Each model id owns an independent [`RateWindow`] behind its own lock, so a burst against
//! one model never delays callers of another.

pub mod limiter;


pub use limiter::{RateLimiter, RateWindow};
