//! Paginated, partitioned and asynchronously completed result sources.
//!
//! A statement is submitted, polled until it leaves the running state, then its
//! rows are drained partition by partition or page by page into one
//! [`RowConsumer`]. Any failure aborts the whole fetch; rows already pushed to a
//! sink must not be trusted.

pub mod accumulator;
pub mod pages;
pub mod partitions;
pub mod polling;

pub use accumulator::{CallbackConsumer, CollectingConsumer, RowConsumer, SinkAccumulator};
pub use pages::drain_pages;
pub use partitions::drain_partitions;
pub use polling::{Backoff, Poller};

use crate::models::{Page, PartitionData, ResultLayout, StatementResponse};
use crate::protocol::ExecutionTracker;
use crate::retry::Sleeper;
use log::debug;
use sqlbridge_commons::{PollingSettings, Result};
use std::sync::Arc;
use std::time::Duration;

/// Remote statement API of a paginated or partitioned engine.
pub trait StatementApi: Send {
    /// Submit SQL; the response is terminal or `running`.
    fn submit(&mut self, sql: &str) -> Result<StatementResponse>;

    /// Current status of a submitted statement.
    fn poll(&mut self, handle: &str) -> Result<StatementResponse>;

    /// Rows of partition `index` (1-based follow-ups; partition 0 is embedded).
    fn fetch_partition(&mut self, handle: &str, index: usize) -> Result<PartitionData>;

    /// Page addressed by a continuation token.
    fn fetch_page(&mut self, handle: &str, token: &str) -> Result<Page>;

    /// Release server-side resources of the API.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Totals of one drained result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Rows handed to the consumer
    pub rows: u64,
    /// Partitions or pages read
    pub segments: usize,
    /// The consumer asked to stop before the source was exhausted
    pub stopped_early: bool,
}

impl FetchSummary {
    fn stopped(mut self) -> Self {
        self.stopped_early = true;
        self
    }
}

/// Submits a statement, waits for completion and drains its rows.
pub struct FetchDriver {
    api: Box<dyn StatementApi>,
    poller: Poller,
}

impl FetchDriver {
    pub fn new(api: Box<dyn StatementApi>, polling: &PollingSettings) -> Self {
        Self {
            api,
            poller: Poller::new(polling),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.poller = self.poller.with_sleeper(sleeper);
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poller = self.poller.with_timeout(timeout);
        self
    }

    pub fn api_mut(&mut self) -> &mut dyn StatementApi {
        self.api.as_mut()
    }

    /// Run `sql` to completion, pushing every row into `consumer`.
    ///
    /// `tracker` must already be submitted; it moves through `Polling` while the
    /// statement is running.
    pub fn run(
        &mut self,
        sql: &str,
        consumer: &mut dyn RowConsumer,
        tracker: &mut ExecutionTracker,
    ) -> Result<FetchSummary> {
        let submitted = self.api.submit(sql)?;
        debug!("[FETCH] Submitted statement {} ({})", submitted.handle, submitted.state);

        let mut response = self.poller.wait(self.api.as_mut(), submitted, tracker)?;
        let columns_known = !response.columns.is_empty();
        if columns_known {
            consumer.columns(&response.columns)?;
        }

        let handle = response.handle.clone();
        match response.take_layout() {
            ResultLayout::Partitioned {
                count,
                first,
                leading_header,
            } => drain_partitions(
                self.api.as_mut(),
                &handle,
                count,
                first,
                leading_header,
                columns_known,
                consumer,
            ),
            ResultLayout::Paged { first, leading_header } => drain_pages(
                self.api.as_mut(),
                &handle,
                first,
                leading_header,
                columns_known,
                consumer,
            ),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        self.api.close()
    }
}
