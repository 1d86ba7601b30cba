//! Delimited-record reconstruction from arbitrarily split byte chunks.
//!
//! Every chunk goes to the sink untouched. A copy is scanned for record
//! boundaries: everything up to the last complete record is decoded at once
//! and only the incomplete tail is kept for the next chunk. Row statistics come
//! from each chunk's own line breaks, so they never wait on the preview parse.

use crate::sink::RowSink;
use crate::stats::{PreviewRow, StreamingStats};
use log::{debug, warn};
use sqlbridge_commons::{ExecutionSettings, Result};

/// Decoder limits and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Stop preview parsing after this many data rows
    pub max_rows_in_memory: usize,
    /// Stop preview parsing when a single record grows past this many bytes
    pub max_parse_buffer_bytes: usize,
    pub delimiter: u8,
    /// The first line of the stream holds column names
    pub has_header: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::from_settings(&ExecutionSettings::default())
    }
}

impl DecoderOptions {
    pub fn from_settings(settings: &ExecutionSettings) -> Self {
        Self {
            max_rows_in_memory: settings.max_rows_in_memory,
            max_parse_buffer_bytes: settings.max_parse_buffer_bytes,
            delimiter: settings.delimiter_byte(),
            has_header: true,
        }
    }
}

/// Totals reported when the stream ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Data rows counted from line breaks (header excluded)
    pub rows: u64,
    pub bytes: u64,
    pub chunks: u64,
    pub header: Option<Vec<String>>,
    /// Preview parsing stopped because a record outgrew the parse buffer
    pub overflowed: bool,
}

/// Position inside the record being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    FieldStart,
    Unquoted,
    Quoted,
    /// A quote inside a quoted field: closes it unless another quote follows
    QuoteInQuoted,
}

impl Scan {
    /// Advance by one byte. Returns true when the byte ends a record.
    ///
    /// Only a quote at the start of a field opens a quoted field; a stray
    /// quote inside an unquoted field is plain data.
    fn advance(&mut self, byte: u8, delimiter: u8) -> bool {
        let (next, ends_record) = match (*self, byte) {
            (Scan::Quoted, b'"') => (Scan::QuoteInQuoted, false),
            (Scan::Quoted, _) => (Scan::Quoted, false),
            (Scan::QuoteInQuoted, b'"') => (Scan::Quoted, false),
            (Scan::FieldStart, b'"') => (Scan::Quoted, false),
            (_, b'\n') => (Scan::FieldStart, true),
            (_, b) if b == delimiter => (Scan::FieldStart, false),
            _ => (Scan::Unquoted, false),
        };
        *self = next;
        ends_record
    }
}

#[derive(Debug)]
pub struct ChunkedDecoder {
    options: DecoderOptions,
    /// Bytes of the current incomplete record
    buffer: Vec<u8>,
    scan: Scan,
    header: Option<Vec<String>>,
    rows: Vec<PreviewRow>,
    parsing: bool,
    overflowed: bool,
    header_line_pending: bool,
    line_len: usize,
    line_rows: u64,
    bytes: u64,
    chunks: u64,
}

impl ChunkedDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            buffer: Vec::new(),
            scan: Scan::FieldStart,
            header: None,
            rows: Vec::new(),
            parsing: options.max_rows_in_memory > 0,
            overflowed: false,
            header_line_pending: options.has_header,
            line_len: 0,
            line_rows: 0,
            bytes: 0,
            chunks: 0,
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Rows decoded so far, capped at `max_rows_in_memory`.
    pub fn rows(&self) -> &[PreviewRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PreviewRow> {
        self.rows
    }

    /// Bytes waiting for the rest of their record.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn feed(
        &mut self,
        chunk: &[u8],
        sink: &mut dyn RowSink,
        stats: Option<&StreamingStats>,
    ) -> Result<()> {
        sink.write_bytes(chunk)?;
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
        self.count_lines(chunk, stats);

        if !self.parsing {
            return Ok(());
        }

        let scanned = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut complete = 0;
        let mut overflow = false;
        for (i, &byte) in self.buffer.iter().enumerate().skip(scanned) {
            if self.scan.advance(byte, self.options.delimiter) {
                complete = i + 1;
            } else if i + 1 - complete > self.options.max_parse_buffer_bytes {
                overflow = true;
                break;
            }
        }

        if complete > 0 {
            let parsed = parse_records(&self.buffer[..complete], self.options.delimiter);
            match parsed {
                Ok(records) => self.accept(records, stats),
                Err(e) => debug!("[CHUNKED] Skipping {} unparsable bytes: {}", complete, e),
            }
            if self.parsing {
                self.buffer.drain(..complete);
            }
        }

        if overflow && self.parsing {
            warn!(
                "[CHUNKED] Record exceeded {} bytes; preview parsing stopped",
                self.options.max_parse_buffer_bytes
            );
            self.parsing = false;
            self.overflowed = true;
            self.buffer = Vec::new();
        } else if self.parsing && !self.buffer.is_empty() {
            debug!("[CHUNKED] Incomplete record, deferring {} bytes", self.buffer.len());
        }
        Ok(())
    }

    /// Flush a final unterminated record and rewind the sink.
    pub fn finish(&mut self, sink: &mut dyn RowSink, stats: Option<&StreamingStats>) -> Result<DecodeSummary> {
        if self.line_len > 0 {
            if self.header_line_pending {
                self.header_line_pending = false;
            } else {
                self.line_rows += 1;
                if let Some(stats) = stats {
                    stats.record_rows(1, self.line_len);
                }
            }
            self.line_len = 0;
        }

        if self.parsing && !self.buffer.is_empty() {
            match parse_records(&self.buffer, self.options.delimiter) {
                Ok(records) => self.accept(records, stats),
                Err(e) => debug!("[CHUNKED] Dropping unparsable trailing bytes: {}", e),
            }
            self.buffer.clear();
        }

        sink.rewind_to_start()?;
        debug!(
            "[CHUNKED] Stream finished: chunks={} bytes={} rows={} preview={}",
            self.chunks,
            self.bytes,
            self.line_rows,
            self.rows.len()
        );

        Ok(DecodeSummary {
            rows: self.line_rows,
            bytes: self.bytes,
            chunks: self.chunks,
            header: self.header.clone(),
            overflowed: self.overflowed,
        })
    }

    fn count_lines(&mut self, chunk: &[u8], stats: Option<&StreamingStats>) {
        let mut rows = 0u64;
        let mut longest = 0usize;
        for &byte in chunk {
            if byte == b'\n' {
                if self.header_line_pending {
                    self.header_line_pending = false;
                } else {
                    rows += 1;
                    longest = longest.max(self.line_len);
                }
                self.line_len = 0;
            } else {
                self.line_len += 1;
            }
        }

        self.line_rows += rows;
        if let Some(stats) = stats {
            if rows > 0 {
                stats.record_rows(rows, longest);
            }
        }
    }

    fn accept(&mut self, records: Vec<PreviewRow>, stats: Option<&StreamingStats>) {
        let mut records = records.into_iter();
        if self.options.has_header && self.header.is_none() {
            self.header = records.next();
        }

        let room = self.options.max_rows_in_memory.saturating_sub(self.rows.len());
        let fresh: Vec<PreviewRow> = records.take(room).collect();
        if let Some(stats) = stats {
            stats.extend_preview(fresh.iter().cloned());
        }
        self.rows.extend(fresh);

        if self.rows.len() >= self.options.max_rows_in_memory {
            debug!("[CHUNKED] Row cap {} reached, preview parsing stopped", self.options.max_rows_in_memory);
            self.parsing = false;
            self.buffer = Vec::new();
        }
    }
}

/// Parse complete delimited records.
pub fn parse_records(bytes: &[u8], delimiter: u8) -> Result<Vec<PreviewRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(record.iter().map(|field| String::from_utf8_lossy(field).into_owned()).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn options(max_rows: usize) -> DecoderOptions {
        DecoderOptions {
            max_rows_in_memory: max_rows,
            max_parse_buffer_bytes: 1024,
            delimiter: b',',
            has_header: true,
        }
    }

    fn decode(chunks: &[&[u8]], options: DecoderOptions) -> (ChunkedDecoder, DecodeSummary, Vec<u8>, StreamingStats) {
        let mut sink = Cursor::new(Vec::new());
        let stats = StreamingStats::new(10);
        let mut decoder = ChunkedDecoder::new(options);
        for chunk in chunks {
            decoder.feed(chunk, &mut sink, Some(&stats)).unwrap();
        }
        let summary = decoder.finish(&mut sink, Some(&stats)).unwrap();
        (decoder, summary, sink.into_inner(), stats)
    }

    #[test]
    fn test_mid_record_split_is_deferred() {
        let mut sink = Cursor::new(Vec::new());
        let mut decoder = ChunkedDecoder::new(options(100));
        decoder.feed(b"id,name\n1,Al", &mut sink, None).unwrap();
        assert!(decoder.rows().is_empty());
        assert_eq!(decoder.header().unwrap(), ["id", "name"]);
        assert_eq!(decoder.pending_bytes(), 4);

        decoder.feed(b"ice\n2,Bob\n", &mut sink, None).unwrap();
        assert_eq!(decoder.pending_bytes(), 0);
        assert_eq!(decoder.header().unwrap(), ["id", "name"]);
        assert_eq!(decoder.rows(), [vec!["1", "Alice"], vec!["2", "Bob"]]);
        assert_eq!(sink.get_ref().as_slice(), b"id,name\n1,Alice\n2,Bob\n");
    }

    #[test]
    fn test_quoted_newline_waits_for_closing_quote() {
        let (decoder, summary, _, _) = decode(
            &[b"id,note\n1,\"line one\n", b"line two\"\n"],
            options(100),
        );
        assert_eq!(decoder.rows(), [vec!["1", "line one\nline two"]]);
        assert!(!summary.overflowed);
    }

    #[test]
    fn test_stats_follow_chunks_not_preview() {
        let (decoder, summary, _, stats) = decode(&[b"a,b\n1,2\n3,4\n5,6\n"], options(1));
        assert_eq!(decoder.rows().len(), 1);
        assert_eq!(summary.rows, 3);
        assert_eq!(stats.total_rows(), 3);
        assert_eq!(stats.max_row_bytes(), 3);
        assert_eq!(stats.preview_len(), 1);
    }

    #[test]
    fn test_unterminated_final_record() {
        let (decoder, summary, sink, stats) = decode(&[b"a\n1\n", b"22"], options(100));
        assert_eq!(decoder.rows(), [vec!["1"], vec!["22"]]);
        assert_eq!(summary.rows, 2);
        assert_eq!(stats.total_rows(), 2);
        assert_eq!(sink, b"a\n1\n22");
    }

    #[test]
    fn test_buffer_bound_stops_preview_but_not_passthrough() {
        let mut opts = options(100);
        opts.max_parse_buffer_bytes = 8;
        let (decoder, summary, sink, stats) = decode(&[b"h\n\"unterminated", b" and more\n"], opts);
        assert!(summary.overflowed);
        assert!(decoder.rows().is_empty());
        assert_eq!(sink, b"h\n\"unterminated and more\n");
        assert_eq!(stats.total_rows(), 1);
    }

    #[test]
    fn test_complete_records_in_large_chunk_fit_small_bound() {
        let mut opts = options(100);
        opts.max_parse_buffer_bytes = 4;
        let (unsplit, summary, _, _) = decode(&[b"h\n1\n2\n3\n"], opts);
        assert!(!summary.overflowed);
        assert_eq!(unsplit.rows(), [vec!["1"], vec!["2"], vec!["3"]]);

        let (split, summary, _, _) = decode(&[b"h\n", b"1\n", b"2\n", b"3\n"], opts);
        assert!(!summary.overflowed);
        assert_eq!(split.rows(), unsplit.rows());
    }

    #[test]
    fn test_only_incomplete_tail_is_retained() {
        let mut sink = Cursor::new(Vec::new());
        let mut decoder = ChunkedDecoder::new(options(100));
        decoder.feed(b"a,b\n1,2\n3,", &mut sink, None).unwrap();
        assert_eq!(decoder.rows(), [vec!["1", "2"]]);
        assert_eq!(decoder.pending_bytes(), 2);
    }

    #[test]
    fn test_stray_quote_in_unquoted_field() {
        let (decoder, summary, _, _) = decode(&[b"a,b\n1,6\"x\n", b"2,y\n"], options(100));
        assert!(!summary.overflowed);
        assert_eq!(decoder.rows(), [vec!["1", "6\"x"], vec!["2", "y"]]);
    }

    #[test]
    fn test_escaped_quotes_keep_field_open() {
        let (decoder, _, _, _) = decode(&[b"a\n\"say \"\"hi\n", b"\"\" now\"\n"], options(100));
        assert_eq!(decoder.rows(), [vec!["say \"hi\n\" now"]]);
    }

    #[test]
    fn test_zero_row_cap_never_parses() {
        let (decoder, summary, _, _) = decode(&[b"a\n1\n2\n"], options(0));
        assert!(decoder.header().is_none());
        assert_eq!(summary.rows, 2);
    }
}
