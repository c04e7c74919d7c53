use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::constants::RATE_WINDOW;

/// Request timestamps for one model inside the trailing window.
///
/// Entries are ordered oldest first and pruned lazily on every acquisition.
#[derive(Debug)]
pub struct RateWindow {
    limit: usize,
    stamps: Mutex<VecDeque<Instant>>,
}

impl RateWindow {
    fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            stamps: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }

    /// Configured requests per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records `now` if there is room, otherwise returns how long until the oldest entry
    /// leaves the window.
    fn try_record(&self, now: Instant, window: Duration) -> Result<(), Duration> {
        let mut stamps = self.stamps.lock();
        prune(&mut stamps, now, window);

        if stamps.len() < self.limit {
            stamps.push_back(now);
            return Ok(());
        }

        let oldest = stamps.front().copied().unwrap_or(now);
        Err((oldest + window).saturating_duration_since(now))
    }

    fn occupancy(&self, now: Instant, window: Duration) -> usize {
        let mut stamps = self.stamps.lock();
        prune(&mut stamps, now, window);
        stamps.len()
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = stamps.front() {
        if now.saturating_duration_since(oldest) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Sliding-window limiter keyed by model id.
///
/// The set of limited models is fixed at construction. Unknown ids pass straight through.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    models: HashMap<String, RateWindow>,
}

impl RateLimiter {
    /// Creates a limiter with the standard 60 second window.
    pub fn new(limits: HashMap<String, usize>) -> Self {
        Self::with_window(limits, RATE_WINDOW)
    }

    /// Creates a limiter with a custom window length.
    pub fn with_window(limits: HashMap<String, usize>, window: Duration) -> Self {
        let models = limits
            .into_iter()
            .map(|(model, limit)| (model, RateWindow::new(limit)))
            .collect();
        Self { window, models }
    }

    /// Returns the window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the limit configured for `model`, if any.
    pub fn limit(&self, model: &str) -> Option<usize> {
        self.models.get(model).map(RateWindow::limit)
    }

    /// Number of requests recorded for `model` inside the current window.
    pub fn occupancy(&self, model: &str) -> Option<usize> {
        self.models
            .get(model)
            .map(|w| w.occupancy(Instant::now(), self.window))
    }

    /// Waits until a request for `model` fits in its window, then records it.
    ///
    /// Dropping the returned future while it waits leaves the window untouched.
    #[instrument(skip(self), fields(model = %model))]
    pub async fn acquire(&self, model: &str) {
        let Some(window) = self.models.get(model) else {
            warn!("Unknown model, skipping rate limit");
            return;
        };

        loop {
            match window.try_record(Instant::now(), self.window) {
                Ok(()) => {
                    debug!("Rate limit slot acquired");
                    return;
                }
                Err(wait) => {
                    info!(
                        wait_ms = wait.as_millis() as u64,
                        limit = window.limit(),
                        "Rate limit reached, waiting"
                    );
                    sleep(wait).await;
                }
            }
        }
    }

    /// Records a request for `model` only if it fits right now.
    ///
    /// Unknown models always succeed.
    pub fn try_acquire(&self, model: &str) -> bool {
        match self.models.get(model) {
            Some(window) => window.try_record(Instant::now(), self.window).is_ok(),
            None => true,
        }
    }
}
