//! Pipe-delimited line writers

use csv::{QuoteStyle, Writer, WriterBuilder};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{field_text, OutputError, OutputResult, OutputWriter, RecordWriter, FIELD_DELIMITER};
use crate::config::FLUSH_INTERVAL;
use crate::{PipelineRecord, RecordKind};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

fn line_writer<W: Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .quote_style(QuoteStyle::Never)
        .has_headers(false)
        .flexible(true)
        .from_writer(inner)
}

fn field_strings(record: &PipelineRecord) -> Vec<String> {
    record.fields().iter().map(field_text).collect()
}

/// Appends each record to `<dir>/<Kind>.dat`.
///
/// All eight files are opened in append mode up front and kept until
/// [`close`](OutputWriter::close).
pub struct KindFileWriter {
    dir: PathBuf,
    writers: HashMap<RecordKind, Writer<BufWriter<File>>>,
    records_written: u64,
}

impl KindFileWriter {
    /// Open (creating if needed) one file per record kind under `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> OutputResult<Self> {
        let dir = dir.as_ref();
        info!("Opening record files: dir={}", dir.display());

        std::fs::create_dir_all(dir)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory {}: {}", dir.display(), e)))?;

        let mut writers = HashMap::new();
        for kind in RecordKind::ALL {
            let path = dir.join(kind.file_name());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| OutputError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
            writers.insert(
                kind,
                line_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file)),
            );
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            writers,
            records_written: 0,
        })
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl RecordWriter for KindFileWriter {
    fn write_record(&mut self, record: &PipelineRecord) -> OutputResult<()> {
        let kind = record.kind();
        let writer = self
            .writers
            .get_mut(&kind)
            .ok_or_else(|| OutputError::IoError(format!("No file open for {}", kind)))?;

        writer
            .write_record(field_strings(record))
            .map_err(|e| OutputError::CsvError(format!("Failed to write {} record: {}", kind, e)))?;

        self.records_written += 1;

        if self.records_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!("Progress: {} records written", self.records_written);
        }

        Ok(())
    }
}

impl OutputWriter for KindFileWriter {
    fn flush(&mut self) -> OutputResult<()> {
        for writer in self.writers.values_mut() {
            writer
                .flush()
                .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))?;
        }
        Ok(())
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing record files: {} total records written", self.records_written);

        self.flush()?;

        for (kind, writer) in self.writers.drain() {
            let buf_writer = writer.into_inner().map_err(|e| {
                OutputError::IoError(format!("Failed to get inner writer for {}: {}", kind, e))
            })?;
            let file = buf_writer.into_inner().map_err(|e| {
                OutputError::IoError(format!("Failed to get file handle for {}: {}", kind, e))
            })?;
            file.sync_all()
                .map_err(|e| OutputError::IoError(format!("Failed to sync {}: {}", kind, e)))?;
        }

        info!(
            "Record files closed: {} records written to {}",
            self.records_written,
            self.dir.display()
        );
        Ok(())
    }
}

/// Writes `<Kind>|<fields>` lines to any writer, typically stdout.
pub struct ScreenWriter<W: Write> {
    writer: Writer<W>,
    records_written: u64,
}

impl<W: Write> ScreenWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self {
            writer: line_writer(inner),
            records_written: 0,
        }
    }

    /// Get number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl<W: Write> RecordWriter for ScreenWriter<W> {
    fn write_record(&mut self, record: &PipelineRecord) -> OutputResult<()> {
        let mut line = vec![record.kind().to_string()];
        line.extend(field_strings(record));
        self.writer
            .write_record(line)
            .map_err(|e| OutputError::CsvError(format!("Failed to write record: {}", e)))?;
        self.records_written += 1;
        Ok(())
    }
}

impl<W: Write> OutputWriter for ScreenWriter<W> {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()
    }
}
