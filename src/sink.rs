use std::fs::File;
use std::path::Path;

use crate::errors::AppError;
use crate::models::OutputRow;

/// Append-only CSV sink for accepted records.
///
/// The header row is written at creation so the artifact is well-formed
/// even when no company is accepted. Rows land in acceptance order;
/// `flush` is the durability boundary.
pub struct CsvSink {
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl CsvSink {
    pub fn create(path: &Path) -> Result<Self, AppError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| AppError::Io(format!("failed to create {}: {}", path.display(), e)))?;
        writer.write_record(OutputRow::HEADERS)?;
        tracing::info!("Writing results to {}", path.display());
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn append(&mut self, row: &OutputRow) -> Result<(), AppError> {
        self.writer.serialize(row)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flushes all appended rows to disk. Failure here is fatal to the run.
    pub fn flush(&mut self) -> Result<(), AppError> {
        self.writer
            .flush()
            .map_err(|e| AppError::Io(format!("failed to flush output: {}", e)))
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}
