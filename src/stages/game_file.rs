//! GameFile: per-game `game.xml` to venue and team records

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::fetch;
use crate::extract::game::GameDocument;
use crate::pipeline::{send_downstream, Stage, StageError, StageScope};
use crate::resolver::{GameFile, GameId, ResourceResolver};
use crate::PipelineRecord;

const NAME: &str = "game-file";

/// Fetches each game's `game.xml` and emits its stadium and team records.
pub struct GameFileStage {
    client: Client,
    resolver: Arc<ResourceResolver>,
    output: Option<mpsc::Sender<PipelineRecord>>,
}

impl GameFileStage {
    /// Stage using the injected client and resolver
    pub fn new(client: Client, resolver: Arc<ResourceResolver>) -> Self {
        Self {
            client,
            resolver,
            output: None,
        }
    }
}

#[async_trait]
impl Stage for GameFileStage {
    type Input = GameId;
    type Outputs = mpsc::Receiver<PipelineRecord>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, capacity: usize) -> Self::Outputs {
        let (tx, rx) = mpsc::channel(capacity);
        self.output = Some(tx);
        rx
    }

    async fn process(&mut self, game: GameId, scope: &StageScope) -> Result<(), StageError> {
        let output = self.output.clone().ok_or(StageError::DownstreamClosed(NAME))?;
        let client = self.client.clone();
        let url = self.resolver.locate_game_file(&game, GameFile::Game)?.remote;

        scope.spawn(async move {
            let document = GameDocument::read(fetch(&client, &url).await?, game.date()).await?;
            for record in document.records() {
                send_downstream(NAME, &output, record).await?;
            }
            Ok(())
        });
        Ok(())
    }
}
