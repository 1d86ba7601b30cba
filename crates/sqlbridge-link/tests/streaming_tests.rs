//! Statistics under concurrent readers and chunk-boundary independence of the
//! chunked decoder.

mod common;

use common::init_logger;
use proptest::prelude::*;
use sqlbridge_link::{ChunkedDecoder, DecoderOptions, StreamingStats};
use std::io::Cursor;
use std::sync::Arc;
use std::thread;

const PAYLOAD: &[u8] = b"id,city,note\n1,Oslo,plain\n2,\"Rio, BR\",\"two\nlines\"\n3,Lima,\"say \"\"hi\"\"\"\n4,,empty\n";

#[test]
fn test_concurrent_appends_count_exactly() {
    init_logger();
    let threads = 8;
    let per_thread = 250;
    let stats = Arc::new(StreamingStats::new(100));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for i in 0..per_thread {
                    stats.append(vec![format!("{}-{}", t, i)], i + 1);
                }
            })
        })
        .collect();

    // A monitor reading while writers append.
    let monitor = {
        let stats = Arc::clone(&stats);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..100 {
                let snapshot = stats.snapshot();
                assert!(snapshot.total_rows >= last);
                assert!(snapshot.preview.len() <= 100);
                last = snapshot.total_rows;
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    monitor.join().unwrap();

    assert_eq!(stats.total_rows(), (threads * per_thread) as u64);
    assert_eq!(stats.preview_len(), 100);
    assert_eq!(stats.max_row_bytes(), per_thread);
}

#[test]
fn test_preview_smaller_than_capacity() {
    let stats = Arc::new(StreamingStats::new(50));
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for _ in 0..5 {
                    stats.append(vec!["x".to_string()], 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(stats.total_rows(), 15);
    assert_eq!(stats.preview_len(), 15);
}

fn decode(chunks: &[&[u8]]) -> (Vec<Vec<String>>, Option<Vec<String>>, Vec<u8>, u64) {
    let (rows, header, sink, total, _) = decode_with_summary(chunks, 1 << 20);
    (rows, header, sink, total)
}

fn decode_with_summary(
    chunks: &[&[u8]],
    bound: usize,
) -> (Vec<Vec<String>>, Option<Vec<String>>, Vec<u8>, u64, bool) {
    let options = DecoderOptions {
        max_rows_in_memory: 1000,
        max_parse_buffer_bytes: bound,
        delimiter: b',',
        has_header: true,
    };
    let mut sink = Cursor::new(Vec::new());
    let stats = StreamingStats::new(10);
    let mut decoder = ChunkedDecoder::new(options);
    for chunk in chunks {
        decoder.feed(chunk, &mut sink, Some(&stats)).unwrap();
    }
    let summary = decoder.finish(&mut sink, Some(&stats)).unwrap();
    let header = decoder.header().map(|h| h.to_vec());
    (decoder.into_rows(), header, sink.into_inner(), stats.total_rows(), summary.overflowed)
}

fn split_at_points(payload: &[u8], mut points: Vec<usize>) -> Vec<&[u8]> {
    points.sort_unstable();
    points.dedup();
    let mut chunks = Vec::new();
    let mut start = 0;
    for point in points {
        chunks.push(&payload[start..point]);
        start = point;
    }
    chunks.push(&payload[start..]);
    chunks
}

#[test]
fn test_unsplit_payload() {
    init_logger();
    let (rows, header, sink, _) = decode(&[PAYLOAD]);
    assert_eq!(header.unwrap(), ["id", "city", "note"]);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], ["2", "Rio, BR", "two\nlines"]);
    assert_eq!(rows[2], ["3", "Lima", "say \"hi\""]);
    assert_eq!(sink, PAYLOAD);
}

#[test]
fn test_small_bound_overflows_on_the_same_record_however_split() {
    // The quoted two-line record is the only one longer than 16 bytes.
    let (rows, header, _, _, overflowed) = decode_with_summary(&[PAYLOAD], 16);
    assert!(overflowed);
    assert_eq!(header.unwrap(), ["id", "city", "note"]);
    assert_eq!(rows, [vec!["1", "Oslo", "plain"]]);

    let per_byte: Vec<&[u8]> = PAYLOAD.chunks(1).collect();
    let (split_rows, _, _, _, split_overflowed) = decode_with_summary(&per_byte, 16);
    assert!(split_overflowed);
    assert_eq!(split_rows, rows);
}

proptest! {
    #[test]
    fn prop_split_points_do_not_change_rows_or_bytes(
        points in prop::collection::vec(1..PAYLOAD.len(), 0..12)
    ) {
        let (expected_rows, expected_header, expected_sink, _) = decode(&[PAYLOAD]);
        let chunks = split_at_points(PAYLOAD, points);
        let (rows, header, sink, _) = decode(&chunks);

        prop_assert_eq!(rows, expected_rows);
        prop_assert_eq!(header, expected_header);
        prop_assert_eq!(sink, expected_sink);
    }

    #[test]
    fn prop_small_parse_bound_ignores_split_points(
        points in prop::collection::vec(1..PAYLOAD.len(), 0..12),
        bound in 4usize..40
    ) {
        let expected = decode_with_summary(&[PAYLOAD], bound);
        let actual = decode_with_summary(&split_at_points(PAYLOAD, points), bound);
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_line_count_stats_ignore_split_points(
        points in prop::collection::vec(1..PAYLOAD.len(), 0..12)
    ) {
        let (_, _, _, unsplit) = decode(&[PAYLOAD]);
        let (_, _, _, split) = decode(&split_at_points(PAYLOAD, points));
        prop_assert_eq!(split, unsplit);
    }
}
