//! Rate limiter shared by every request of a run
//!
//! This module handles:
//! - Global concurrency limiting via a fair semaphore
//! - A minimum spacing between request admissions
//! - In-flight accounting for instrumentation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::Instant;

/// Issues permission to send a request
///
/// `acquire` waits for a free concurrency slot and then for the spacing
/// interval since the previous admission. Both waits are FIFO (tokio's
/// semaphore and mutex queue waiters in arrival order), so a blocked caller
/// is admitted before anyone who asked after it.
#[derive(Debug)]
pub struct RateLimiter {
    /// Caps the number of admitted callers still holding a permit
    semaphore: Semaphore,

    /// Time of the most recent admission
    last_admission: Mutex<Option<Instant>>,

    /// Minimum time between two admissions
    min_interval: Duration,

    max_concurrent: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Admission to send one request
///
/// The concurrency slot is released when the permit is dropped.
#[derive(Debug)]
pub struct RatePermit<'a> {
    limiter: &'a RateLimiter,
    _permit: SemaphorePermit<'a>,
}

impl Drop for RatePermit<'_> {
    fn drop(&mut self) {
        self.limiter.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RateLimiter {
    /// Creates a limiter admitting at most `max_concurrent` callers at once,
    /// spaced at least `min_interval` apart
    ///
    /// A cap of zero is raised to one.
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(max_concurrent),
            last_admission: Mutex::new(None),
            min_interval,
            max_concurrent,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Waits until the caller may proceed
    pub async fn acquire(&self) -> RatePermit<'_> {
        // The semaphore is owned here and never closed.
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("rate limiter semaphore is never closed");

        {
            let mut last = self.last_admission.lock().await;
            if let Some(previous) = *last {
                let ready_at = previous + self.min_interval;
                let now = Instant::now();
                if ready_at > now {
                    tracing::trace!(
                        wait_ms = (ready_at - now).as_millis() as u64,
                        "Spacing request admission"
                    );
                    tokio::time::sleep_until(ready_at).await;
                }
            }
            *last = Some(Instant::now());
        }

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        RatePermit {
            limiter: self,
            _permit: permit,
        }
    }

    /// Configured concurrency cap
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Configured admission spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}
