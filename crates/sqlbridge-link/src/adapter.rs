//! Engine adapter: one dialect, one transport, three delivery modes.

use crate::chunked::DecoderOptions;
use crate::fetch::{CallbackConsumer, CollectingConsumer, SinkAccumulator};
use crate::models::{ExecutionResult, QueryOutput, ResultFormat};
use crate::protocol::{ExecutionMode, ExecutionState, ExecutionTracker, StreamCallback, StreamItem};
use crate::retry::RetryPolicy;
use crate::sink::RowSink;
use crate::stats::StreamingStats;
use crate::transport::{chunked, driver, Transport, TransportKind};
use log::{debug, info};
use sqlbridge_commons::{BridgeError, ExecutionSettings, Result};
use sqlbridge_dialect::Dialect;
use std::cell::Cell;
use std::ops::ControlFlow;

const TEST_QUERY: &str = "SELECT 1";

/// Executes rendered SQL against one engine.
///
/// Every call runs under the adapter's [`RetryPolicy`]. Sink statistics are
/// reset at the start of every attempt and a retried sink call starts from an
/// empty sink. A retried callback call is only attempted while nothing has
/// reached the callback yet.
#[derive(Debug)]
pub struct Adapter {
    dialect: Dialect,
    transport: Transport,
    settings: ExecutionSettings,
    retry: RetryPolicy,
    last_state: ExecutionState,
}

impl Adapter {
    pub fn new(dialect: Dialect, transport: Transport) -> Self {
        let settings = ExecutionSettings::default();
        Self {
            dialect,
            transport,
            retry: RetryPolicy::from_settings(&settings),
            settings,
            last_state: ExecutionState::Idle,
        }
    }

    /// Replace the execution settings; the retry budget follows them.
    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.retry = RetryPolicy::from_settings(&settings);
        self.settings = settings;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn dialect_mut(&mut self) -> &mut Dialect {
        &mut self.dialect
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// A statistics collector sized by this adapter's settings.
    pub fn streaming_stats(&self) -> StreamingStats {
        StreamingStats::from_settings(&self.settings)
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Final state of the most recent attempt.
    pub fn last_state(&self) -> ExecutionState {
        self.last_state
    }

    /// Buffered mode: materialize the whole result.
    pub fn execute(&mut self, sql: &str, format: ResultFormat) -> Result<QueryOutput> {
        debug!("[STREAM] Buffered {} execution on {}", format, self.dialect.engine());
        let retry = self.retry.clone();
        retry.run(|_| self.buffered_once(sql, format))
    }

    /// Sink mode: write delimited text to `sink`, then rewind it. Returns the
    /// number of data rows written.
    pub fn execute_to_sink(
        &mut self,
        sql: &str,
        sink: &mut dyn RowSink,
        stats: Option<&StreamingStats>,
    ) -> Result<u64> {
        debug!("[STREAM] Sink execution on {}", self.dialect.engine());
        let retry = self.retry.clone();
        retry.run(|attempt| {
            if attempt > 1 {
                sink.clear()?;
            }
            if let Some(stats) = stats {
                stats.reset();
            }
            self.sink_once(sql, &mut *sink, stats)
        })
    }

    /// Callback mode: hand rows (or raw chunks on chunked transports) to
    /// `callback`. Returns items delivered and whether the callback stopped
    /// early.
    pub fn execute_streaming(&mut self, sql: &str, callback: &mut StreamCallback<'_>) -> Result<(u64, bool)> {
        debug!("[STREAM] Callback execution on {}", self.dialect.engine());
        let retry = self.retry.clone();
        let delivered = Cell::new(0u64);
        retry.run_if(
            |_| {
                let mut counting = |item: StreamItem<'_>| -> ControlFlow<()> {
                    delivered.set(delivered.get() + 1);
                    callback(item)
                };
                self.callback_once(sql, &mut counting)
            },
            |_| delivered.get() == 0,
        )
    }

    /// Dispatch on the delivery mode.
    pub fn run(&mut self, sql: &str, mode: ExecutionMode<'_>) -> Result<ExecutionResult> {
        match mode {
            ExecutionMode::Buffered(format) => self.execute(sql, format).map(ExecutionResult::Materialized),
            ExecutionMode::Sink { sink, stats } => self
                .execute_to_sink(sql, sink, stats)
                .map(|rows| ExecutionResult::Flushed { rows }),
            ExecutionMode::Callback(callback) => self
                .execute_streaming(sql, callback)
                .map(|(items, stopped_early)| ExecutionResult::Delivered { items, stopped_early }),
        }
    }

    /// Validate the transport with a trivial query. Any failure other than a
    /// credential failure is reported as a connection error.
    pub fn test_connection(&mut self) -> Result<()> {
        let outcome = match &mut self.transport {
            Transport::Driver(connection) => connection.test_connection(),
            Transport::ChunkedHttp(source) => source
                .open(TEST_QUERY)
                .and_then(|chunks| chunks.map(|chunk| chunk.map(|_| ())).collect::<Result<()>>()),
            Transport::PagedHttp(fetch) => {
                let mut tracker = ExecutionTracker::new();
                let mut consumer = CollectingConsumer::new();
                tracker.track(|t| fetch.run(TEST_QUERY, &mut consumer, t)).map(|_| ())
            },
        };

        match outcome {
            Ok(()) => {
                info!("[STREAM] Connection test passed for {}", self.dialect.engine());
                Ok(())
            },
            Err(e) if e.is_connection_failure() => Err(e),
            Err(e) => Err(BridgeError::ConnectionError(format!("Connection test failed: {}", e))),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        debug!("[STREAM] Closing {} transport for {}", self.transport.kind(), self.dialect.engine());
        self.transport.close()
    }

    fn buffered_once(&mut self, sql: &str, format: ResultFormat) -> Result<QueryOutput> {
        let delimiter = self.settings.delimiter_byte();
        let options = DecoderOptions::from_settings(&self.settings);
        let mut tracker = ExecutionTracker::new();

        let result = match &mut self.transport {
            Transport::Driver(connection) => tracker.track(|_| {
                let mut consumer = CollectingConsumer::new();
                driver::drain(connection.as_mut(), sql, &mut consumer)?;
                consumer.into_output(format, delimiter)
            }),
            Transport::ChunkedHttp(source) => {
                tracker.track(|_| chunked::collect(source.as_mut(), sql, format, options))
            },
            Transport::PagedHttp(fetch) => tracker.track(|t| {
                let mut consumer = CollectingConsumer::new();
                fetch.run(sql, &mut consumer, t)?;
                consumer.into_output(format, delimiter)
            }),
        };

        self.last_state = tracker.state();
        result
    }

    fn sink_once(&mut self, sql: &str, sink: &mut dyn RowSink, stats: Option<&StreamingStats>) -> Result<u64> {
        let delimiter = self.settings.delimiter_byte();
        let write_header = self.settings.write_header;
        let options = DecoderOptions::from_settings(&self.settings);
        let mut tracker = ExecutionTracker::new();

        let result = match &mut self.transport {
            Transport::Driver(connection) => tracker.track(|_| {
                let mut acc = SinkAccumulator::new(sink, stats, delimiter).with_header(write_header);
                driver::drain(connection.as_mut(), sql, &mut acc)?;
                acc.finish()
            }),
            Transport::ChunkedHttp(source) => tracker.track(|_| {
                chunked::stream_to_sink(source.as_mut(), sql, sink, stats, options).map(|summary| summary.rows)
            }),
            Transport::PagedHttp(fetch) => tracker.track(|t| {
                let mut acc = SinkAccumulator::new(sink, stats, delimiter).with_header(write_header);
                fetch.run(sql, &mut acc, t)?;
                acc.finish()
            }),
        };

        self.last_state = tracker.state();
        result
    }

    fn callback_once(&mut self, sql: &str, callback: &mut StreamCallback<'_>) -> Result<(u64, bool)> {
        let mut tracker = ExecutionTracker::new();

        let result = match &mut self.transport {
            Transport::Driver(connection) => tracker.track(|_| {
                let mut consumer = CallbackConsumer::new(callback);
                driver::drain(connection.as_mut(), sql, &mut consumer)?;
                Ok((consumer.delivered(), consumer.stopped_early()))
            }),
            Transport::ChunkedHttp(source) => {
                tracker.track(|_| chunked::stream_to_callback(source.as_mut(), sql, callback))
            },
            Transport::PagedHttp(fetch) => tracker.track(|t| {
                let mut consumer = CallbackConsumer::new(callback);
                fetch.run(sql, &mut consumer, t)?;
                Ok((consumer.delivered(), consumer.stopped_early()))
            }),
        };

        self.last_state = tracker.state();
        result
    }
}
