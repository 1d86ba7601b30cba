//! Row consumers shared by every row-producing transport.
//!
//! Producers announce column names at most once and then push rows; consumers
//! decide whether rows land in a sink, a buffer or a callback.

use crate::models::{row_to_fields, ColumnField, QueryOutput, ResultFormat, Row};
use crate::protocol::{StreamCallback, StreamItem};
use crate::sink::{encode_record, RowSink};
use crate::stats::StreamingStats;
use sqlbridge_commons::Result;
use std::ops::ControlFlow;

pub trait RowConsumer {
    /// Column names, announced before the first row. Later announcements are
    /// ignored.
    fn columns(&mut self, columns: &[String]) -> Result<()>;

    /// Accept one row; `Break` asks the producer to stop.
    fn row(&mut self, row: Row) -> Result<ControlFlow<()>>;
}

/// Writes delimited rows to a sink with the header written exactly once,
/// before the first data row, no matter how many partitions or pages feed it.
pub struct SinkAccumulator<'a> {
    sink: &'a mut dyn RowSink,
    stats: Option<&'a StreamingStats>,
    delimiter: u8,
    write_header: bool,
    header: Option<Vec<String>>,
    header_written: bool,
    rows: u64,
}

impl<'a> SinkAccumulator<'a> {
    pub fn new(sink: &'a mut dyn RowSink, stats: Option<&'a StreamingStats>, delimiter: u8) -> Self {
        Self {
            sink,
            stats,
            delimiter,
            write_header: true,
            header: None,
            header_written: false,
            rows: 0,
        }
    }

    pub fn with_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Write a pending header (an empty result still gets one) and rewind.
    pub fn finish(mut self) -> Result<u64> {
        self.write_header_once()?;
        self.sink.rewind_to_start()?;
        Ok(self.rows)
    }

    fn write_header_once(&mut self) -> Result<()> {
        if self.header_written || !self.write_header {
            return Ok(());
        }
        if let Some(header) = &self.header {
            let bytes = encode_record(header, self.delimiter)?;
            self.sink.write_bytes(&bytes)?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl RowConsumer for SinkAccumulator<'_> {
    fn columns(&mut self, columns: &[String]) -> Result<()> {
        if self.header.is_none() && !columns.is_empty() {
            self.header = Some(columns.to_vec());
        }
        Ok(())
    }

    fn row(&mut self, row: Row) -> Result<ControlFlow<()>> {
        self.write_header_once()?;
        let fields = row_to_fields(&row);
        let bytes = encode_record(&fields, self.delimiter)?;
        self.sink.write_bytes(&bytes)?;
        if let Some(stats) = self.stats {
            stats.append(fields, bytes.len());
        }
        self.rows += 1;
        Ok(ControlFlow::Continue(()))
    }
}

/// Buffers every row for a materialized result.
#[derive(Debug, Default)]
pub struct CollectingConsumer {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl CollectingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns_seen(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_output(self, format: ResultFormat, delimiter: u8) -> Result<QueryOutput> {
        QueryOutput::build(format, ColumnField::from_names(self.columns), self.rows, delimiter)
    }
}

impl RowConsumer for CollectingConsumer {
    fn columns(&mut self, columns: &[String]) -> Result<()> {
        if self.columns.is_empty() {
            self.columns = columns.to_vec();
        }
        Ok(())
    }

    fn row(&mut self, row: Row) -> Result<ControlFlow<()>> {
        self.rows.push(row);
        Ok(ControlFlow::Continue(()))
    }
}

/// Hands each row to a caller callback without buffering.
pub struct CallbackConsumer<'a, 'b> {
    callback: &'a mut StreamCallback<'b>,
    delivered: u64,
    stopped: bool,
}

impl<'a, 'b> CallbackConsumer<'a, 'b> {
    pub fn new(callback: &'a mut StreamCallback<'b>) -> Self {
        Self {
            callback,
            delivered: 0,
            stopped: false,
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn stopped_early(&self) -> bool {
        self.stopped
    }
}

impl RowConsumer for CallbackConsumer<'_, '_> {
    fn columns(&mut self, _columns: &[String]) -> Result<()> {
        Ok(())
    }

    fn row(&mut self, row: Row) -> Result<ControlFlow<()>> {
        self.delivered += 1;
        let flow = (self.callback)(StreamItem::Row(&row));
        if flow.is_break() {
            self.stopped = true;
        }
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_header_written_once_before_first_row() {
        let mut sink = Cursor::new(Vec::new());
        let stats = StreamingStats::new(5);
        let mut acc = SinkAccumulator::new(&mut sink, Some(&stats), b',');

        acc.columns(&["id".to_string(), "v".to_string()]).unwrap();
        acc.columns(&["ignored".to_string()]).unwrap();
        acc.row(vec![json!(1), json!("a")]).unwrap();
        acc.row(vec![json!(2), json!(null)]).unwrap();
        assert_eq!(acc.finish().unwrap(), 2);

        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "id,v\n1,a\n2,\n");
        assert_eq!(stats.total_rows(), 2);
        assert_eq!(stats.preview()[0], vec!["1", "a"]);
    }

    #[test]
    fn test_empty_result_still_writes_header() {
        let mut sink = Cursor::new(Vec::new());
        let mut acc = SinkAccumulator::new(&mut sink, None, b';');
        acc.columns(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(acc.finish().unwrap(), 0);
        assert_eq!(sink.into_inner(), b"a;b\n");
    }

    #[test]
    fn test_header_can_be_disabled() {
        let mut sink = Cursor::new(Vec::new());
        let mut acc = SinkAccumulator::new(&mut sink, None, b',').with_header(false);
        acc.columns(&["a".to_string()]).unwrap();
        acc.row(vec![json!(1)]).unwrap();
        acc.finish().unwrap();
        assert_eq!(sink.into_inner(), b"1\n");
    }

    #[test]
    fn test_callback_consumer_stops() {
        let mut seen = Vec::new();
        let mut callback = |item: StreamItem<'_>| {
            if let StreamItem::Row(row) = item {
                seen.push(row[0].clone());
            }
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let mut consumer = CallbackConsumer::new(&mut callback);
        assert!(consumer.row(vec![json!(1)]).unwrap().is_continue());
        assert!(consumer.row(vec![json!(2)]).unwrap().is_break());
        assert!(consumer.stopped_early());
        assert_eq!(consumer.delivered(), 2);
        drop(consumer);
        assert_eq!(seen, vec![json!(1), json!(2)]);
    }
}
