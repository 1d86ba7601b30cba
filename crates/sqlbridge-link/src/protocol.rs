//! Execution state machine and the three delivery modes.
//!
//! ```text
//! Idle -> Submitted -> Completed
//!                   -> Polling -> Completed
//!                   -> Failed   (from Submitted or Polling)
//! ```

use crate::models::ResultFormat;
use crate::sink::RowSink;
use crate::stats::StreamingStats;
use log::debug;
use serde_json::Value as JsonValue;
use sqlbridge_commons::{BridgeError, Result};
use std::fmt;
use std::ops::ControlFlow;

/// Lifecycle state of one execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Submitted,
    Polling,
    Completed,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Failed)
    }

    fn can_move_to(self, next: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (Idle, Submitted)
                | (Submitted, Completed)
                | (Submitted, Polling)
                | (Submitted, Failed)
                | (Polling, Polling)
                | (Polling, Completed)
                | (Polling, Failed)
        )
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Submitted => "submitted",
            ExecutionState::Polling => "polling",
            ExecutionState::Completed => "completed",
            ExecutionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records state transitions of one call and rejects illegal ones.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTracker {
    state: ExecutionState,
    polls: u32,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Number of transitions into `Polling`.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn transition(&mut self, next: ExecutionState) -> Result<()> {
        if !self.state.can_move_to(next) {
            return Err(BridgeError::execution(format!(
                "Illegal execution transition {} -> {}",
                self.state, next
            )));
        }
        debug!("[STREAM] {} -> {}", self.state, next);
        if next == ExecutionState::Polling {
            self.polls += 1;
        }
        self.state = next;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<()> {
        self.transition(ExecutionState::Submitted)
    }

    pub fn poll(&mut self) -> Result<()> {
        self.transition(ExecutionState::Polling)
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(ExecutionState::Completed)
    }

    /// Mark the call failed. Ignored once terminal or before submission.
    pub fn fail(&mut self) {
        if matches!(self.state, ExecutionState::Submitted | ExecutionState::Polling) {
            debug!("[STREAM] {} -> failed", self.state);
            self.state = ExecutionState::Failed;
        }
    }

    /// Run `f` after submitting; failures mark the tracker failed.
    pub fn track<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.submit()?;
        match f(self) {
            Ok(value) => {
                if !self.state.is_terminal() {
                    self.complete()?;
                }
                Ok(value)
            },
            Err(e) => {
                self.fail();
                Err(e)
            },
        }
    }
}

/// One unit handed to a streaming callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamItem<'a> {
    /// A decoded row (driver and statement-API transports)
    Row(&'a [JsonValue]),
    /// A raw byte chunk (chunked HTTP transports)
    Chunk(&'a [u8]),
}

/// Streaming callback; returning `ControlFlow::Break(())` stops iteration.
pub type StreamCallback<'a> = dyn FnMut(StreamItem<'_>) -> ControlFlow<()> + 'a;

/// How a call delivers its result.
pub enum ExecutionMode<'a> {
    /// Materialize the full result before returning
    Buffered(ResultFormat),
    /// Write incrementally to a sink, optionally counting into stats
    Sink {
        sink: &'a mut dyn RowSink,
        stats: Option<&'a StreamingStats>,
    },
    /// Hand each row or chunk to a callback
    Callback(&'a mut StreamCallback<'a>),
}

impl fmt::Debug for ExecutionMode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Buffered(format) => write!(f, "Buffered({})", format),
            ExecutionMode::Sink { stats, .. } => write!(f, "Sink(stats: {})", stats.is_some()),
            ExecutionMode::Callback(_) => write!(f, "Callback"),
        }
    }
}
