//! `locate`: print where each day of a range lives

use chrono::{NaiveDate, Utc};
use clap::Parser;

use super::{CliError, RangeArgs};
use crate::config::IngestConfig;
use crate::daterange::DateRange;
use crate::resolver::ResourceResolver;

/// Arguments for `locate`
#[derive(Parser, Debug)]
pub struct LocateArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Also print each day's master scoreboard
    #[arg(long, default_value_t = false)]
    pub scoreboard: bool,
}

impl LocateArgs {
    /// Print one `<remote>\t<local>` line per location.
    pub fn execute(&self, config: &IngestConfig) -> Result<(), CliError> {
        for line in self.lines(config, Utc::now().date_naive())? {
            println!("{line}");
        }
        Ok(())
    }

    /// Lines `execute` prints, with keywords resolved against `today`.
    pub fn lines(&self, config: &IngestConfig, today: NaiveDate) -> Result<Vec<String>, CliError> {
        let resolver = ResourceResolver::new(&config.remote_root, &config.local_root)?;
        let range = DateRange::resolve(&self.range.begin, self.range.end.as_deref(), today)?;

        let mut lines = Vec::with_capacity(range.len());
        for date in range.iter() {
            let mut locations = vec![resolver.locate_date(*date)?];
            if self.scoreboard {
                locations.push(resolver.locate_scoreboard(*date)?);
            }
            lines.extend(
                locations
                    .into_iter()
                    .map(|l| format!("{}\t{}", l.remote, l.local.display())),
            );
        }
        Ok(lines)
    }
}
