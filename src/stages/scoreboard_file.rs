//! ScoreboardFile: day scoreboards to records and game identifiers

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{fetch, DayLocation};
use crate::extract::scoreboard::ScoreboardReader;
use crate::pipeline::{send_downstream, Stage, StageError, StageScope};
use crate::resolver::{GameId, ResourceResolver};
use crate::PipelineRecord;

const NAME: &str = "scoreboard-file";

/// Fetches `master_scoreboard.xml` for each day and streams it: every game
/// is converted into records as soon as its element closes, and its game
/// identifier is emitted on the second output.
pub struct ScoreboardFile {
    client: Client,
    resolver: Arc<ResourceResolver>,
    records: Option<mpsc::Sender<PipelineRecord>>,
    games: Option<mpsc::Sender<GameId>>,
}

impl ScoreboardFile {
    /// Stage using the injected client and resolver
    pub fn new(client: Client, resolver: Arc<ResourceResolver>) -> Self {
        Self {
            client,
            resolver,
            records: None,
            games: None,
        }
    }
}

#[async_trait]
impl Stage for ScoreboardFile {
    type Input = DayLocation;
    type Outputs = (mpsc::Receiver<PipelineRecord>, mpsc::Receiver<GameId>);

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, capacity: usize) -> Self::Outputs {
        let (records_tx, records_rx) = mpsc::channel(capacity);
        let (games_tx, games_rx) = mpsc::channel(capacity);
        self.records = Some(records_tx);
        self.games = Some(games_tx);
        (records_rx, games_rx)
    }

    async fn process(&mut self, day: DayLocation, scope: &StageScope) -> Result<(), StageError> {
        let records = self.records.clone().ok_or(StageError::DownstreamClosed(NAME))?;
        let games = self.games.clone().ok_or(StageError::DownstreamClosed(NAME))?;
        let client = self.client.clone();
        let url = self.resolver.locate_scoreboard(day.date)?.remote;

        scope.spawn(async move {
            let mut scoreboard = ScoreboardReader::new(fetch(&client, &url).await?);
            let mut count = 0usize;

            loop {
                let game = match scoreboard.next_game().await {
                    Ok(Some(game)) => game,
                    Ok(None) => break,
                    Err(e) if e.is_recoverable() => {
                        warn!("Skipping game in {}: {}", url, e);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                count += 1;
                for record in game.records() {
                    send_downstream(NAME, &records, record).await?;
                }
                match game.game_id() {
                    Some(id) => send_downstream(NAME, &games, id).await?,
                    None => warn!("Game {} in {} has no usable game directory", game.game_pk, url),
                }
            }

            debug!("Scoreboard {} yielded {} game(s)", url, count);
            Ok(())
        });
        Ok(())
    }
}
