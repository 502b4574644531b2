//! Record output writers
//!
//! Both writers produce the same pipe-delimited line for a record, the
//! record's [`fields`](crate::PipelineRecord::fields) in order:
//!
//! - [`lines::KindFileWriter`] appends to one `<Kind>.dat` file per kind
//! - [`lines::ScreenWriter`] prefixes each line with the kind and writes to
//!   any [`std::io::Write`]
//!
//! Lines are written unquoted, so `|`, CR and LF inside a text field are
//! replaced with a space.

use crate::{FieldValue, PipelineRecord};

pub mod lines;

pub use lines::{KindFileWriter, ScreenWriter};

/// Field separator of every flat-file line
pub const FIELD_DELIMITER: u8 = b'|';

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Line encoding error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing pipeline records
pub trait RecordWriter: OutputWriter {
    /// Write a single record
    fn write_record(&mut self, record: &PipelineRecord) -> OutputResult<()>;

    /// Write several records at once
    fn write_records(&mut self, records: &[PipelineRecord]) -> OutputResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }
}

/// Text of one column, safe to place between delimiters.
pub fn field_text(field: &FieldValue) -> String {
    match field {
        FieldValue::Text(text) => text.replace(
            |c: char| c == char::from(FIELD_DELIMITER) || c == '\r' || c == '\n',
            " ",
        ),
        other => other.to_string(),
    }
}

/// Render the pipe-delimited line of a record, without the kind prefix.
pub fn format_line(record: &PipelineRecord) -> String {
    record
        .fields()
        .iter()
        .map(field_text)
        .collect::<Vec<_>>()
        .join(&char::from(FIELD_DELIMITER).to_string())
}
