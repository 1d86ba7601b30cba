//! Byte sinks for sink-streamed execution.

use sqlbridge_commons::Result;
use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom, Write};

/// Incremental text sink that can be rewound for re-reading.
pub trait RowSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Reposition to the start so the caller can read what was written.
    fn rewind_to_start(&mut self) -> Result<()>;

    /// Discard everything written so far; used before a retried attempt.
    fn clear(&mut self) -> Result<()>;
}

impl RowSink for File {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    fn rewind_to_start(&mut self) -> Result<()> {
        self.flush()?;
        self.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.set_len(0)?;
        self.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl RowSink for Cursor<Vec<u8>> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    fn rewind_to_start(&mut self) -> Result<()> {
        self.set_position(0);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.get_mut().clear();
        self.set_position(0);
        Ok(())
    }
}

impl<T: RowSink + ?Sized> RowSink for &mut T {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn rewind_to_start(&mut self) -> Result<()> {
        (**self).rewind_to_start()
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// Encode one delimited record terminated by `\n`, quoting fields as needed.
pub fn encode_record<I, S>(fields: I, delimiter: u8) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64));
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| sqlbridge_commons::BridgeError::Io(e.error().to_string()))
}
