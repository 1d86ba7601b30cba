//! Completion polling with capped exponential backoff.

use super::StatementApi;
use crate::models::{StatementResponse, StatementState};
use crate::protocol::ExecutionTracker;
use crate::retry::{Sleeper, ThreadSleeper};
use log::debug;
use sqlbridge_commons::{BridgeError, PollingSettings, Result};
use std::sync::Arc;
use std::time::Duration;

/// Wait sequence: base, doubling up to the cap, then back to base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let max = max.max(base);
        Self { base, max, next: base }
    }

    pub fn next_wait(&mut self) -> Duration {
        let wait = self.next;
        self.next = if wait >= self.max {
            self.base
        } else {
            (wait * 2).min(self.max)
        };
        wait
    }
}

/// Polls a running statement until it reaches a terminal state.
#[derive(Clone)]
pub struct Poller {
    base: Duration,
    max: Duration,
    max_polls: Option<u32>,
    timeout: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("base", &self.base)
            .field("max", &self.max)
            .field("max_polls", &self.max_polls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Poller {
    pub fn new(settings: &PollingSettings) -> Self {
        Self {
            base: Duration::from_millis(settings.base_interval_ms),
            max: Duration::from_millis(settings.max_interval_ms),
            max_polls: settings.max_polls,
            timeout: Duration::ZERO,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Bound the total time spent waiting between polls. Zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Poll until `response` succeeds. A failed statement surfaces as an
    /// execution error carrying the remote status and message.
    pub fn wait(
        &self,
        api: &mut dyn StatementApi,
        mut response: StatementResponse,
        tracker: &mut ExecutionTracker,
    ) -> Result<StatementResponse> {
        let mut backoff = Backoff::new(self.base, self.max);
        let mut polls = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            match response.state {
                StatementState::Succeeded => return Ok(response),
                StatementState::Failed => return Err(failure(&response)),
                StatementState::Running => {},
            }

            if let Some(max_polls) = self.max_polls {
                if polls >= max_polls {
                    return Err(BridgeError::execution_with_status(
                        "running",
                        format!("Statement {} still running after {} polls", response.handle, polls),
                    ));
                }
            }
            if !self.timeout.is_zero() && waited >= self.timeout {
                return Err(BridgeError::execution_with_status(
                    "timeout",
                    format!("Statement {} still running after {:?}", response.handle, waited),
                ));
            }

            let wait = backoff.next_wait();
            self.sleeper.sleep(wait);
            waited += wait;
            polls += 1;
            tracker.poll()?;
            debug!("[POLL] Poll #{} of {} after {:?}", polls, response.handle, wait);

            let handle = response.handle.clone();
            response = api.poll(&handle)?;
        }
    }
}

fn failure(response: &StatementResponse) -> BridgeError {
    let (status, message) = match &response.error {
        Some(detail) => (
            detail.code.clone().unwrap_or_else(|| response.state.to_string()),
            detail.message.clone(),
        ),
        None => (
            response.state.to_string(),
            format!("Statement {} failed without details", response.handle),
        ),
    };
    BridgeError::execution_with_status(status, message)
}
