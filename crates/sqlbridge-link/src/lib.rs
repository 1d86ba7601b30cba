//! sqlbridge-link
//!
//! Transport-agnostic execution protocol for SQLBridge adapters. An
//! [`Adapter`] pairs a dialect with one [`Transport`] and delivers results in
//! one of three modes:
//!
//! - buffered: the whole result as tuples, records, delimited text or a native
//!   [`QueryResult`]
//! - sink-streamed: delimited text written to a [`RowSink`] with optional
//!   [`StreamingStats`]
//! - callback-streamed: rows or raw chunks handed to a callback that may stop
//!   early
//!
//! ```rust,ignore
//! use sqlbridge_link::{EngineRegistry, ResultFormat, StreamingStats};
//!
//! let registry = EngineRegistry::from_config(&config)?;
//! registry.register("snowflake", http_constructor(config.http.clone(), config.polling.clone()));
//! let mut adapter = registry.create_adapter(&engine_config)?;
//!
//! let stats = StreamingStats::new(100);
//! let mut file = tempfile::tempfile()?;
//! let rows = adapter.execute_to_sink("SELECT * FROM orders", &mut file, Some(&stats))?;
//! ```

pub mod adapter;
pub mod chunked;
pub mod fetch;
pub mod models;
pub mod protocol;
pub mod registry;
pub mod retry;
pub mod sink;
pub mod stats;
pub mod transport;

pub use adapter::Adapter;
pub use chunked::{ChunkedDecoder, DecodeSummary, DecoderOptions};
pub use fetch::{FetchDriver, FetchSummary, RowConsumer, StatementApi};
pub use models::{
    ColumnField, ExecutionResult, QueryOutput, QueryRequest, QueryResult, ResultFormat, Row,
    StatementResponse, StatementState,
};
pub use protocol::{ExecutionMode, ExecutionState, ExecutionTracker, StreamCallback, StreamItem};
pub use registry::{http_constructor, ConnectionHandle, EngineRegistry, TransportConstructor};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use sink::RowSink;
pub use stats::{PreviewRow, StatsSnapshot, StreamingStats};
pub use transport::{
    AuthProvider, ChunkSource, ChunkStream, DriverConnection, DriverRows, HttpChunkSource, HttpEndpoint,
    HttpStatementApi, Transport, TransportKind,
};

pub use sqlbridge_commons::{BridgeError, Result};
