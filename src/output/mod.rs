//! Tabular output writers

use serde::Serialize;

pub mod csv;
pub mod path;

pub use self::csv::{write_table, CsvTableWriter};
pub use path::OutputPaths;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A row type with a fixed column layout
///
/// `COLUMNS` must list the serialized field names in order; it is written as
/// the header even when the table has no rows.
pub trait TableRow: Serialize {
    /// Header row
    const COLUMNS: &'static [&'static str];
}

/// Generic output writer
pub trait OutputWriter {
    /// Flush any buffered data
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Writer for rows of one table
pub trait TableWriter<T: TableRow>: OutputWriter {
    /// Write a single row
    fn write_row(&mut self, row: &T) -> OutputResult<()>;

    /// Write multiple rows at once
    fn write_rows(&mut self, rows: &[T]) -> OutputResult<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }
}
