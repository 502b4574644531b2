//! Concrete pipeline stages
//!
//! | Stage | Input | Outputs |
//! |-------|-------|---------|
//! | [`DateToPath`] | [`DateRequest`] | [`DayLocation`] |
//! | [`DayListing`] | [`DayLocation`] | [`GameId`](crate::resolver::GameId) |
//! | [`ScoreboardFile`] | [`DayLocation`] | [`PipelineRecord`](crate::PipelineRecord), [`GameId`](crate::resolver::GameId) |
//! | [`GameFileStage`] | [`GameId`](crate::resolver::GameId) | [`PipelineRecord`](crate::PipelineRecord) |
//! | [`FanOut`] | any `T: Clone` | N × `T` |
//! | [`FileOutput`], [`ScreenOutput`], [`DatabaseOutput`] | [`PipelineRecord`](crate::PipelineRecord) | none |
//! | [`TransferOutput`] | [`DayLocation`] or [`GameId`](crate::resolver::GameId) | none |

use chrono::NaiveDate;
use reqwest::Client;
use tokio::io::AsyncBufRead;
use url::Url;

use crate::pipeline::StageError;
use crate::resolver::Location;
use crate::transfer::http;

pub mod database_output;
pub mod date_to_path;
pub mod day_listing;
pub mod fan_out;
pub mod file_output;
pub mod game_file;
pub mod scoreboard_file;
pub mod screen_output;
pub mod transfer_output;

pub use database_output::DatabaseOutput;
pub use date_to_path::{DateRequest, DateToPath};
pub use day_listing::DayListing;
pub use fan_out::FanOut;
pub use file_output::FileOutput;
pub use game_file::GameFileStage;
pub use scoreboard_file::ScoreboardFile;
pub use screen_output::ScreenOutput;
pub use transfer_output::{Mirrored, TransferOutput};

/// One day's remote listing and its local mirror path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayLocation {
    /// Calendar day
    pub date: NaiveDate,
    /// Day directory location
    pub location: Location,
}

/// GET `url` and expose the body as a buffered reader.
pub(crate) async fn fetch(client: &Client, url: &Url) -> Result<impl AsyncBufRead + Unpin + Send, StageError> {
    let response = http::get(client, url).await?;
    Ok(http::body_reader(response))
}
