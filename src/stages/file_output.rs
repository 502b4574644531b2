//! FileOutput: records to `<Kind>.dat` files

use async_trait::async_trait;
use std::path::Path;

use crate::output::{KindFileWriter, OutputWriter, RecordWriter};
use crate::pipeline::{Stage, StageError, StageScope};
use crate::PipelineRecord;

const NAME: &str = "file-output";

/// Appends every record to its kind's file. Files are opened when the stage
/// is created so an unwritable directory fails before the pipeline starts.
pub struct FileOutput {
    writer: Option<KindFileWriter>,
}

impl FileOutput {
    /// Open the record files under `dir`
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, StageError> {
        Ok(Self {
            writer: Some(KindFileWriter::open(dir)?),
        })
    }
}

#[async_trait]
impl Stage for FileOutput {
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
