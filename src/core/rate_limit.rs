//! Dual sliding-window rate limiting for outbound API calls
//!
//! The Toast API publishes two ceilings at once: a short burst budget and a
//! longer sustained budget. Each is modelled as a [`SlidingWindow`] and a
//! single [`RateLimiter::acquire`] waits until both windows admit the call.
//!
//! Waiting is an async sleep, never an error. Callers queue on a fair
//! `tokio::sync::Mutex`, so permits are granted in arrival order.

use crate::config::RateLimitConfig;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Call budget of `max_calls` within any `period`-long interval
#[derive(Debug)]
pub struct SlidingWindow {
    max_calls: usize,
    period: Duration,
    calls: VecDeque<Instant>,
}

impl SlidingWindow {
    /// Create a window admitting at most `max_calls` per `period`
    pub fn new(max_calls: usize, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            period,
            calls: VecDeque::with_capacity(max_calls.min(1024)),
        }
    }

    /// How long a call issued at `now` must wait to stay within budget
    pub fn delay_at(&mut self, now: Instant) -> Duration {
        self.prune(now);
        if self.calls.len() < self.max_calls {
            return Duration::ZERO;
        }
        match self.calls.front() {
            Some(oldest) => (*oldest + self.period).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Record a call admitted at `now`
    pub fn record(&mut self, now: Instant) {
        self.calls.push_back(now);
    }

    /// Number of calls currently inside the window
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.calls.front() {
            if now.saturating_duration_since(*oldest) >= self.period {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }
}

#[derive(Debug)]
struct Windows {
    short: SlidingWindow,
    long: SlidingWindow,
}

/// Rate limiter shared by every outbound call of a run
///
/// # Example
///
/// ```no_run
/// use toast_extractor::core::rate_limit::RateLimiter;
/// use std::time::Duration;
///
/// # async fn example() {
/// let limiter = RateLimiter::new(20, Duration::from_secs(1), 10_000, Duration::from_secs(900));
/// limiter.acquire().await;
/// // issue the request
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<Windows>,
    calls_throttled: AtomicU64,
    total_wait_ms: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter from a short (burst) and a long (sustained) window
    pub fn new(
        short_calls: usize,
        short_period: Duration,
        long_calls: usize,
        long_period: Duration,
    ) -> Self {
        Self {
            windows: Mutex::new(Windows {
                short: SlidingWindow::new(short_calls, short_period),
                long: SlidingWindow::new(long_calls, long_period),
            }),
            calls_throttled: AtomicU64::new(0),
            total_wait_ms: AtomicU64::new(0),
        }
    }

    /// Create a limiter from the `[rate_limit]` configuration section
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.short_window_calls,
            Duration::from_secs(config.short_window_seconds),
            config.long_window_calls,
            Duration::from_secs(config.long_window_seconds),
        )
    }

    /// Wait until one more call fits in both windows, then record it
    ///
    /// Returns the total time spent waiting (zero if the call was admitted
    /// immediately).
    pub async fn acquire(&self) -> Duration {
        let mut windows = self.windows.lock().await;
        let started = Instant::now();

        loop {
            let now = Instant::now();
            let delay = windows
                .short
                .delay_at(now)
                .max(windows.long.delay_at(now));

            if delay.is_zero() {
                windows.short.record(now);
                windows.long.record(now);
                break;
            }

            tracing::debug!(
                delay_ms = delay.as_millis() as u64,
                short_in_flight = windows.short.in_flight(),
                long_in_flight = windows.long.in_flight(),
                "Rate limit reached, waiting"
            );
            tokio::time::sleep(delay).await;
        }

        let waited = started.elapsed();
        if !waited.is_zero() {
            self.calls_throttled.fetch_add(1, Ordering::Relaxed);
            self.total_wait_ms
                .fetch_add(waited.as_millis() as u64, Ordering::Relaxed);
        }
        waited
    }

    /// Number of calls that had to wait for a permit
    pub fn calls_throttled(&self) -> u64 {
        self.calls_throttled.load(Ordering::Relaxed)
    }

    /// Cumulative time spent waiting for permits
    pub fn total_wait(&self) -> Duration {
        Duration::from_millis(self.total_wait_ms.load(Ordering::Relaxed))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
