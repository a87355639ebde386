//! Clock abstraction and request rate limiting.
//!
//! Every wait the ingestion controller performs goes through a [`Clock`], so
//! throttling and back-off can be exercised with [`ManualClock`] without real
//! elapsed time.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Source of monotonic time and sleeps.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio's timer.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// Clock whose sleeps return immediately, advancing virtual time and
/// recording each requested duration.
#[derive(Debug, Default)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.state().now += duration;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state().now
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state();
        state.now += duration;
        state.sleeps.push(duration);
    }
}

/// Sliding-window limiter: at most `max_requests` acquisitions in any
/// `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    issued: Mutex<VecDeque<Duration>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            window,
            issued: Mutex::new(VecDeque::new()),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Time to wait before a slot frees up, or `None` if one was taken.
    fn try_take(&self, now: Duration) -> Option<Duration> {
        // The queue stays consistent even if a holder panicked.
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some(&oldest) = issued.front() {
            if now.saturating_sub(oldest) >= self.window {
                issued.pop_front();
            } else {
                break;
            }
        }

        if issued.len() < self.max_requests {
            issued.push_back(now);
            return None;
        }

        issued
            .front()
            .map(|&oldest| (oldest + self.window).saturating_sub(now))
    }

    /// Wait on `clock` until a request slot is available, then take it.
    pub async fn acquire(&self, clock: &dyn Clock) {
        while let Some(wait) = self.try_take(clock.now()) {
            tracing::debug!(wait_secs = wait.as_secs_f64(), "Rate limit reached, waiting");
            clock.sleep(wait).await;
        }
    }
}
