//! DayListing: day directory listings to game identifiers

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::debug;

use super::{fetch, DayLocation};
use crate::extract::listing::ListingReader;
use crate::pipeline::{send_downstream, Stage, StageError, StageScope};
use crate::resolver::GameId;

const NAME: &str = "day-listing";

/// Fetches each day's listing page and emits the game identifiers found in
/// it as they are tokenized. Days are fetched concurrently.
pub struct DayListing {
    client: Client,
    output: Option<mpsc::Sender<GameId>>,
}

impl DayListing {
    /// Stage using the injected client
    pub fn new(client: Client) -> Self {
        Self { client, output: None }
    }
}

#[async_trait]
impl Stage for DayListing {
    type Input = DayLocation;
    type Outputs = mpsc::Receiver<GameId>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, capacity: usize) -> Self::Outputs {
        let (tx, rx) = mpsc::channel(capacity);
        self.output = Some(tx);
        rx
    }

    async fn process(&mut self, day: DayLocation, scope: &StageScope) -> Result<(), StageError> {
        let output = self.output.clone().ok_or(StageError::DownstreamClosed(NAME))?;
        let client = self.client.clone();

        scope.spawn(async move {
            let url = day.location.remote;
            let mut listing = ListingReader::new(fetch(&client, &url).await?);

            let mut found = 0usize;
            while let Some(game) = listing.next_game_id().await? {
                found += 1;
                send_downstream(NAME, &output, game).await?;
            }
            debug!("Listing {} named {} game(s)", url, found);
            Ok(())
        });
        Ok(())
    }
}
