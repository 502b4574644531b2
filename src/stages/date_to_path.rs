//! DateToPath: date requests to day locations

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::DayLocation;
use crate::daterange::DateRange;
use crate::pipeline::{send_downstream, Stage, StageError, StageScope};
use crate::resolver::ResourceResolver;

const NAME: &str = "date-to-path";

/// A begin/end pair as typed by a user: `20170529`, `20170529`..`20170601`,
/// or a keyword such as `yesterday` in `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRequest {
    /// First date or keyword
    pub begin: String,
    /// Last date, inclusive
    pub end: Option<String>,
}

impl DateRequest {
    /// Request a range
    pub fn new(begin: impl Into<String>, end: Option<&str>) -> Self {
        Self {
            begin: begin.into(),
            end: end.map(str::to_string),
        }
    }

    /// Request a single day
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date.format(crate::daterange::DATE_FORMAT).to_string(), None)
    }
}

/// Expands each request into its dates and emits one [`DayLocation`] per
/// date, in increasing order. Malformed requests are logged and skipped.
pub struct DateToPath {
    resolver: Arc<ResourceResolver>,
    today: Option<NaiveDate>,
    output: Option<mpsc::Sender<DayLocation>>,
}

impl DateToPath {
    /// Stage resolving keywords against the current date
    pub fn new(resolver: Arc<ResourceResolver>) -> Self {
        Self {
            resolver,
            today: None,
            output: None,
        }
    }

    /// Resolve keywords against a fixed date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

#[async_trait]
impl Stage for DateToPath {
    type Input = DateRequest;
    type Outputs = mpsc::Receiver<DayLocation>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, capacity: usize) -> Self::Outputs {
        let (tx, rx) = mpsc::channel(capacity);
        self.output = Some(tx);
        rx
    }

    async fn process(&mut self, request: DateRequest, _scope: &StageScope) -> Result<(), StageError> {
        let output = self.output.as_ref().ok_or(StageError::DownstreamClosed(NAME))?;

        let end = request.end.as_deref();
        let range = match self.today {
            Some(today) => DateRange::resolve(&request.begin, end, today)?,
            None => DateRange::resolve_now(&request.begin, end)?,
        };
        debug!("Date request {:?}..{:?} covers {} day(s)", request.begin, request.end, range.len());

        for date in range {
            let location = self.resolver.locate_date(date)?;
            send_downstream(NAME, output, DayLocation { date, location }).await?;
        }
        Ok(())
    }
}
