//! Chunked HTTP transport: a byte stream of delimited text whose chunks are not
//! aligned to records.

use crate::chunked::{parse_records, ChunkedDecoder, DecodeSummary, DecoderOptions};
use crate::models::{ColumnField, QueryOutput, ResultFormat, Row};
use crate::protocol::{StreamCallback, StreamItem};
use crate::sink::RowSink;
use crate::stats::StreamingStats;
use bytes::Bytes;
use log::debug;
use serde_json::Value as JsonValue;
use sqlbridge_commons::{BridgeError, Result};

/// Chunks of one response body.
pub type ChunkStream<'a> = Box<dyn Iterator<Item = Result<Bytes>> + 'a>;

pub trait ChunkSource: Send {
    /// Start `sql` and stream its delimited result.
    fn open(&mut self, sql: &str) -> Result<ChunkStream<'_>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Pass every chunk to the sink and decode a bounded preview.
pub fn stream_to_sink(
    source: &mut dyn ChunkSource,
    sql: &str,
    sink: &mut dyn RowSink,
    stats: Option<&StreamingStats>,
    options: DecoderOptions,
) -> Result<DecodeSummary> {
    let mut decoder = ChunkedDecoder::new(options);
    for chunk in source.open(sql)? {
        decoder.feed(&chunk?, sink, stats)?;
    }
    decoder.finish(sink, stats)
}

/// Hand raw chunks to a callback. Returns chunks delivered and whether the
/// callback stopped early.
pub fn stream_to_callback(
    source: &mut dyn ChunkSource,
    sql: &str,
    callback: &mut StreamCallback<'_>,
) -> Result<(u64, bool)> {
    let mut delivered = 0u64;
    for chunk in source.open(sql)? {
        let chunk = chunk?;
        delivered += 1;
        if callback(StreamItem::Chunk(&chunk)).is_break() {
            debug!("[CHUNKED] Callback stopped after {} chunks", delivered);
            return Ok((delivered, true));
        }
    }
    Ok((delivered, false))
}

/// Read the whole body and shape it. Delimited output is the body verbatim.
pub fn collect(
    source: &mut dyn ChunkSource,
    sql: &str,
    format: ResultFormat,
    options: DecoderOptions,
) -> Result<QueryOutput> {
    let mut body = Vec::new();
    for chunk in source.open(sql)? {
        body.extend_from_slice(&chunk?);
    }

    if format == ResultFormat::Delimited {
        return String::from_utf8(body)
            .map(QueryOutput::Delimited)
            .map_err(|e| BridgeError::Serialization(e.to_string()));
    }

    let mut records = parse_records(&body, options.delimiter)?.into_iter();
    let columns = if options.has_header {
        records.next().unwrap_or_default()
    } else {
        Vec::new()
    };
    let rows: Vec<Row> = records
        .map(|record| record.into_iter().map(JsonValue::String).collect())
        .collect();
    QueryOutput::build(format, ColumnField::from_names(columns), rows, options.delimiter)
}
