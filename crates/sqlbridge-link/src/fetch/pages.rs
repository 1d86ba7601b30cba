//! Token pagination: loop until a page comes back without a continuation token.

use super::accumulator::RowConsumer;
use super::partitions::{push_rows, take_leading_header};
use super::{FetchSummary, StatementApi};
use crate::models::Page;
use log::debug;
use sqlbridge_commons::Result;

/// Drain the first page and every follow-up page.
///
/// When `leading_header` is set the first row of the first page is a label row:
/// it is announced as the column names unless `columns_known`, and never
/// emitted as data. Rows of later pages are always data.
pub fn drain_pages(
    api: &mut dyn StatementApi,
    handle: &str,
    first: Page,
    leading_header: bool,
    columns_known: bool,
    consumer: &mut dyn RowConsumer,
) -> Result<FetchSummary> {
    let mut summary = FetchSummary::default();
    let Page { mut data, next_token } = first;

    if leading_header {
        take_leading_header(&mut data, columns_known, consumer)?;
    }

    summary.segments = 1;
    if push_rows(data, consumer, &mut summary)? {
        return Ok(summary.stopped());
    }

    let mut token = next_token;
    while let Some(current) = token {
        debug!("[FETCH] Fetching page {} of {}", summary.segments + 1, handle);
        let page = api.fetch_page(handle, &current)?;
        summary.segments += 1;
        if push_rows(page.data, consumer, &mut summary)? {
            return Ok(summary.stopped());
        }
        token = page.next_token;
    }

    debug!(
        "[FETCH] Drained {} pages of {} ({} rows)",
        summary.segments, handle, summary.rows
    );
    Ok(summary)
}
