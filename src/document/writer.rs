use super::extractor::RecordListener;
use crate::error::Result;
use crate::types::{LoadSummary, Object};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes records as JSON Lines, one record per line, ready for bulk insertion
pub struct RecordWriter<W: Write> {
    writer: W,
    written: usize,
}

impl RecordWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write records into it
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(RecordWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        RecordWriter { writer, written: 0 }
    }

    pub fn write_record(&mut self, record: &Object) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordListener for RecordWriter<W> {
    fn record_complete(&mut self, record: Object) -> Result<()> {
        self.write_record(&record)
    }
}

/// Write a session summary (key map and field catalog) as pretty JSON
pub fn write_summary<W: Write>(mut writer: W, summary: &LoadSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
