//! Partition fan-out: partition 0 arrives with the initiating response,
//! partitions 1..N are fetched by index.

use super::accumulator::RowConsumer;
use super::{FetchSummary, StatementApi};
use crate::models::{row_to_fields, Row};
use log::debug;
use sqlbridge_commons::Result;

/// Drain partition 0 and fetch the rest. A leading label row in partition 0
/// is handled as in [`super::drain_pages`]; later partitions are all data.
pub fn drain_partitions(
    api: &mut dyn StatementApi,
    handle: &str,
    count: usize,
    mut first: Vec<Row>,
    leading_header: bool,
    columns_known: bool,
    consumer: &mut dyn RowConsumer,
) -> Result<FetchSummary> {
    if leading_header {
        take_leading_header(&mut first, columns_known, consumer)?;
    }

    let mut summary = FetchSummary {
        segments: 1,
        ..FetchSummary::default()
    };
    if push_rows(first, consumer, &mut summary)? {
        return Ok(summary.stopped());
    }

    for index in 1..count {
        debug!("[FETCH] Fetching partition {}/{} of {}", index + 1, count, handle);
        let partition = api.fetch_partition(handle, index)?;
        summary.segments += 1;
        if push_rows(partition.data, consumer, &mut summary)? {
            return Ok(summary.stopped());
        }
    }

    debug!(
        "[FETCH] Drained {} partitions of {} ({} rows)",
        summary.segments, handle, summary.rows
    );
    Ok(summary)
}

/// Remove the label row heading the first segment and announce it as the
/// column names unless they are already known.
pub(super) fn take_leading_header(
    data: &mut Vec<Row>,
    columns_known: bool,
    consumer: &mut dyn RowConsumer,
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let labels = data.remove(0);
    if !columns_known {
        consumer.columns(&row_to_fields(&labels))?;
    }
    Ok(())
}

/// Push rows; true when the consumer asked to stop.
pub(super) fn push_rows(
    rows: Vec<Row>,
    consumer: &mut dyn RowConsumer,
    summary: &mut FetchSummary,
) -> Result<bool> {
    for row in rows {
        summary.rows += 1;
        if consumer.row(row)?.is_break() {
            return Ok(true);
        }
    }
    Ok(false)
}
