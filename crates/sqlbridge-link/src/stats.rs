//! Thread-safe streaming statistics.
//!
//! One execution thread appends while any number of monitoring threads read.
//! Every operation takes the single lock for one increment, one append or one
//! snapshot, never across I/O.

use parking_lot::Mutex;
use sqlbridge_commons::ExecutionSettings;

/// A preview row as text fields.
pub type PreviewRow = Vec<String>;

#[derive(Debug, Default)]
struct StatsInner {
    total_rows: u64,
    max_row_bytes: usize,
    preview: Vec<PreviewRow>,
}

/// Point-in-time copy of the collector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_rows: u64,
    pub max_row_bytes: usize,
    pub preview: Vec<PreviewRow>,
}

/// Row counter, max row size and a capacity-capped preview of the first rows.
#[derive(Debug)]
pub struct StreamingStats {
    capacity: usize,
    inner: Mutex<StatsInner>,
}

impl StreamingStats {
    pub fn new(preview_capacity: usize) -> Self {
        Self {
            capacity: preview_capacity,
            inner: Mutex::new(StatsInner {
                total_rows: 0,
                max_row_bytes: 0,
                preview: Vec::with_capacity(preview_capacity.min(1024)),
            }),
        }
    }

    /// A collector whose preview holds `preview_capacity` rows.
    pub fn from_settings(settings: &ExecutionSettings) -> Self {
        Self::new(settings.preview_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count one row and keep it in the preview while there is room.
    pub fn append(&self, row: PreviewRow, byte_size: usize) {
        let mut inner = self.inner.lock();
        inner.total_rows += 1;
        if byte_size > inner.max_row_bytes {
            inner.max_row_bytes = byte_size;
        }
        if inner.preview.len() < self.capacity {
            inner.preview.push(row);
        }
    }

    /// Count rows seen in a raw chunk without previewing them.
    pub fn record_rows(&self, rows: u64, max_row_bytes: usize) {
        let mut inner = self.inner.lock();
        inner.total_rows += rows;
        if max_row_bytes > inner.max_row_bytes {
            inner.max_row_bytes = max_row_bytes;
        }
    }

    /// Add parsed rows to the preview without counting them. Returns how many
    /// were kept.
    pub fn extend_preview(&self, rows: impl IntoIterator<Item = PreviewRow>) -> usize {
        let mut inner = self.inner.lock();
        let room = self.capacity.saturating_sub(inner.preview.len());
        let before = inner.preview.len();
        inner.preview.extend(rows.into_iter().take(room));
        inner.preview.len() - before
    }

    pub fn total_rows(&self) -> u64 {
        self.inner.lock().total_rows
    }

    pub fn max_row_bytes(&self) -> usize {
        self.inner.lock().max_row_bytes
    }

    pub fn preview_len(&self) -> usize {
        self.inner.lock().preview.len()
    }

    pub fn preview(&self) -> Vec<PreviewRow> {
        self.inner.lock().preview.clone()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            total_rows: inner.total_rows,
            max_row_bytes: inner.max_row_bytes,
            preview: inner.preview.clone(),
        }
    }

    /// Clear all three fields under one lock.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.total_rows = 0;
        inner.max_row_bytes = 0;
        inner.preview.clear();
    }
}
