//! CSV table writer
//!
//! Rows go to a temp file next to the target; `close` syncs it and renames it
//! over the destination. A writer dropped before `close` leaves the previous
//! file untouched.

use csv::{Writer, WriterBuilder};
use std::io::BufWriter;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, TableRow, TableWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Flush every N rows
const FLUSH_EVERY_ROWS: u64 = 1000;

/// CSV writer for one table
pub struct CsvTableWriter<T: TableRow> {
    writer: Writer<BufWriter<NamedTempFile>>,
    path: PathBuf,
    rows_written: u64,
    _row: PhantomData<T>,
}

impl<T: TableRow> CsvTableWriter<T> {
    /// Create a writer targeting `path` and write the header row
    ///
    /// The parent directory is created if it doesn't exist.
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer with a custom buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(path: P, buffer_size: usize) -> OutputResult<Self> {
        let path = path.as_ref();
        debug!("Creating CSV writer: path={}", path.display());

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        std::fs::create_dir_all(dir)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;

        let temp = NamedTempFile::new_in(dir)
            .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {}", e)))?;

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::with_capacity(buffer_size, temp));

        writer
            .write_record(T::COLUMNS)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
            _row: PhantomData,
        })
    }

    /// Number of data rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: TableRow> TableWriter<T> for CsvTableWriter<T> {
    fn write_row(&mut self, row: &T) -> OutputResult<()> {
        self.writer
            .serialize(row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;

        self.rows_written += 1;

        if self.rows_written % FLUSH_EVERY_ROWS == 0 {
            self.flush()?;
        }

        Ok(())
    }
}

impl<T: TableRow> OutputWriter for CsvTableWriter<T> {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    /// Sync the temp file and move it over the destination
    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {}", e)))?;

        let temp = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get temp file: {}", e)))?;

        temp.as_file()
            .sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        temp.persist(&self.path).map_err(|e| {
            OutputError::IoError(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        info!("Wrote {} ({} rows)", self.path.display(), self.rows_written);
        Ok(())
    }
}

/// Write a whole table to `path`, replacing any existing file
///
/// Returns the number of data rows written.
pub fn write_table<T: TableRow, P: AsRef<Path>>(path: P, rows: &[T]) -> OutputResult<u64> {
    let mut writer = CsvTableWriter::new(path)?;
    writer.write_rows(rows)?;
    let written = writer.rows_written();
    writer.close()?;
    Ok(written)
}
