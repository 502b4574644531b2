//! ScreenOutput: records to a terminal or any writer

use async_trait::async_trait;
use std::io::Write;

use crate::output::{OutputWriter, RecordWriter, ScreenWriter};
use crate::pipeline::{Stage, StageError, StageScope};
use crate::PipelineRecord;

const NAME: &str = "screen-output";

/// Prints one `<Kind>|<fields>` line per record.
pub struct ScreenOutput {
    writer: Option<ScreenWriter<Box<dyn Write + Send>>>,
}

impl ScreenOutput {
    /// Print to `out`
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Some(ScreenWriter::new(out)),
        }
    }
}

#[async_trait]
impl Stage for ScreenOutput {
    type Input = PipelineRecord;
    type Outputs = ();

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, _capacity: usize) -> Self::Outputs {}

    async fn process(&mut self, record: PipelineRecord, _scope: &StageScope) -> Result<(), StageError> {
        let writer = self.writer.as_mut().ok_or(StageError::DownstreamClosed(NAME))?;
        writer.write_record(&record)?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), StageError> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }
}
