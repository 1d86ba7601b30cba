#![allow(dead_code)]
//! In-memory transports and helpers shared by the integration tests.

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::json;
use sqlbridge_commons::{BridgeError, Result};
use sqlbridge_link::models::{Page, PartitionData, Row, StatementResponse};
use sqlbridge_link::{ChunkSource, ChunkStream, DriverConnection, DriverRows, Sleeper, StatementApi};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

pub fn rows(n: usize) -> Vec<Row> {
    (1..=n).map(|i| vec![json!(i), json!(format!("name-{}", i))]).collect()
}

/// Records waits instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Driver returning fixed rows. The first `failures` executions fail, either
/// up front or after `fail_after_rows` rows.
pub struct FakeDriver {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub failures: u32,
    pub fail_after_rows: usize,
    pub executions: Arc<AtomicU32>,
    pub closed: Arc<AtomicU32>,
}

impl FakeDriver {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            columns: vec!["id".to_string(), "name".to_string()],
            rows,
            failures: 0,
            fail_after_rows: 0,
            executions: Arc::new(AtomicU32::new(0)),
            closed: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn failing(mut self, failures: u32, after_rows: usize) -> Self {
        self.failures = failures;
        self.fail_after_rows = after_rows;
        self
    }
}

impl DriverConnection for FakeDriver {
    fn execute(&mut self, _sql: &str) -> Result<DriverRows<'_>> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let failing = self.failures > 0;
        if failing {
            self.failures -= 1;
            if self.fail_after_rows == 0 {
                return Err(BridgeError::ConnectionError("connection reset".into()));
            }
        }

        let mut out: Vec<Result<Row>> = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if failing && i == self.fail_after_rows {
                out.push(Err(BridgeError::execution("cursor lost")));
                break;
            }
            out.push(Ok(row.clone()));
        }
        Ok(DriverRows::new(self.columns.clone(), out.into_iter()))
    }

    fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Chunk source replaying fixed chunks. The first `failures` opens fail after
/// delivering the first chunk.
pub struct FakeChunkSource {
    pub chunks: Vec<Vec<u8>>,
    pub failures: u32,
    pub opens: Arc<AtomicU32>,
}

impl FakeChunkSource {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            failures: 0,
            opens: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn failing(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }
}

impl ChunkSource for FakeChunkSource {
    fn open(&mut self, _sql: &str) -> Result<ChunkStream<'_>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let mut items: Vec<Result<Bytes>> = self.chunks.iter().map(|c| Ok(Bytes::from(c.clone()))).collect();
        if self.failures > 0 {
            self.failures -= 1;
            items.truncate(1);
            items.push(Err(BridgeError::ConnectionError("stream interrupted".into())));
        }
        Ok(Box::new(items.into_iter()))
    }
}

/// Scripted statement API recording every call.
#[derive(Default)]
pub struct FakeStatementApi {
    pub submit_response: Option<StatementResponse>,
    pub poll_responses: VecDeque<StatementResponse>,
    pub partitions: HashMap<usize, PartitionData>,
    pub pages: HashMap<String, Page>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeStatementApi {
    pub fn new(submit: StatementResponse) -> Self {
        Self {
            submit_response: Some(submit),
            ..Self::default()
        }
    }

    pub fn then_poll(mut self, response: StatementResponse) -> Self {
        self.poll_responses.push_back(response);
        self
    }

    pub fn with_partition(mut self, index: usize, data: Vec<Row>) -> Self {
        self.partitions.insert(index, PartitionData { data });
        self
    }

    pub fn with_page(mut self, token: &str, data: Vec<Row>, next: Option<&str>) -> Self {
        self.pages.insert(
            token.to_string(),
            Page {
                data,
                next_token: next.map(str::to_string),
            },
        );
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl StatementApi for FakeStatementApi {
    fn submit(&mut self, _sql: &str) -> Result<StatementResponse> {
        self.calls.lock().push("submit".to_string());
        self.submit_response
            .clone()
            .ok_or_else(|| BridgeError::ConnectionError("no submit response".into()))
    }

    fn poll(&mut self, handle: &str) -> Result<StatementResponse> {
        self.calls.lock().push(format!("poll:{}", handle));
        self.poll_responses
            .pop_front()
            .ok_or_else(|| BridgeError::execution("poll script exhausted"))
    }

    fn fetch_partition(&mut self, _handle: &str, index: usize) -> Result<PartitionData> {
        self.calls.lock().push(format!("partition:{}", index));
        self.partitions
            .get(&index)
            .cloned()
            .ok_or_else(|| BridgeError::execution_with_status("404", format!("no partition {}", index)))
    }

    fn fetch_page(&mut self, _handle: &str, token: &str) -> Result<Page> {
        self.calls.lock().push(format!("page:{}", token));
        self.pages
            .get(token)
            .cloned()
            .ok_or_else(|| BridgeError::execution_with_status("404", format!("no page {}", token)))
    }
}
