//! Bounded retry of whole execution calls.

use log::{debug, error, warn};
use sqlbridge_commons::{BridgeError, ExecutionSettings, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Blocks the calling thread. Injectable so tests can record waits instead.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Plain `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Re-executes a call on retryable failures.
///
/// `max_attempts` of 0 runs the call exactly once with no retry bookkeeping.
/// Otherwise the call runs at most `max_attempts` times; configuration,
/// capability and credential errors are returned immediately.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn from_settings(settings: &ExecutionSettings) -> Self {
        Self::new(settings.retry_attempts)
    }

    /// Fixed wait between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op`, retrying retryable failures. `op` receives the 1-based attempt.
    pub fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        self.run_if(op, |_| true)
    }

    /// Like [`run`](Self::run), with an extra predicate that may veto a retry
    /// (e.g. once output has already reached the caller).
    pub fn run_if<T, F, P>(&self, mut op: F, mut may_retry: P) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
        P: FnMut(&BridgeError) -> bool,
    {
        if self.max_attempts == 0 {
            return op(1);
        }

        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("[RETRY] Succeeded on attempt {}/{}", attempt, self.max_attempts);
                    }
                    return Ok(value);
                },
                Err(e) if attempt < self.max_attempts && e.is_retryable() && may_retry(&e) => {
                    warn!("[RETRY] Attempt {}/{} failed: {}", attempt, self.max_attempts, e);
                    if !self.delay.is_zero() {
                        self.sleeper.sleep(self.delay);
                    }
                    attempt += 1;
                },
                Err(e) => {
                    error!(
                        "[RETRY] Giving up after attempt {}/{}: {}",
                        attempt, self.max_attempts, e
                    );
                    return Err(e);
                },
            }
        }
    }
}
