//! Synchronous driver transport: a cursor over a local or native connection.

use crate::fetch::{FetchSummary, RowConsumer};
use crate::models::Row;
use log::debug;
use sqlbridge_commons::Result;

/// Cursor returned by a driver: columns up front, then rows on demand.
pub struct DriverRows<'a> {
    pub columns: Vec<String>,
    pub rows: Box<dyn Iterator<Item = Result<Row>> + 'a>,
}

impl<'a> DriverRows<'a> {
    pub fn new<I>(columns: Vec<String>, rows: I) -> Self
    where
        I: Iterator<Item = Result<Row>> + 'a,
    {
        Self {
            columns,
            rows: Box::new(rows),
        }
    }
}

/// A live connection of a synchronous database driver.
pub trait DriverConnection: Send {
    fn execute(&mut self, sql: &str) -> Result<DriverRows<'_>>;

    fn test_connection(&mut self) -> Result<()> {
        self.execute("SELECT 1").map(|_| ())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Pull every row from the cursor into `consumer`, stopping when it asks.
pub fn drain(
    connection: &mut dyn DriverConnection,
    sql: &str,
    consumer: &mut dyn RowConsumer,
) -> Result<FetchSummary> {
    let cursor = connection.execute(sql)?;
    consumer.columns(&cursor.columns)?;

    let mut summary = FetchSummary {
        segments: 1,
        ..FetchSummary::default()
    };
    for row in cursor.rows {
        summary.rows += 1;
        if consumer.row(row?)?.is_break() {
            summary.stopped_early = true;
            break;
        }
    }
    debug!("[STREAM] Driver cursor drained: rows={} stopped={}", summary.rows, summary.stopped_early);
    Ok(summary)
}
