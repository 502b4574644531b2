//! TransferOutput: enqueue raw files for mirroring

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::DayLocation;
use crate::pipeline::{Stage, StageError, StageScope};
use crate::resolver::{GameFile, GameId, Location, ResolveError, ResourceResolver};
use crate::transfer::{TransferQueue, TransferRequest};

const NAME: &str = "transfer-output";

/// Something that maps onto a set of remote files to mirror.
pub trait Mirrored: Send + 'static {
    /// Every location to download for this item
    fn locations(&self, resolver: &ResourceResolver) -> Result<Vec<Location>, ResolveError>;
}

impl Mirrored for DayLocation {
    /// The day listing and its scoreboard
    fn locations(&self, resolver: &ResourceResolver) -> Result<Vec<Location>, ResolveError> {
        Ok(vec![self.location.clone(), resolver.locate_scoreboard(self.date)?])
    }
}

impl Mirrored for GameId {
    /// The complete per-game file set
    fn locations(&self, resolver: &ResourceResolver) -> Result<Vec<Location>, ResolveError> {
        GameFile::ALL
            .iter()
            .map(|file| resolver.locate_game_file(self, *file))
            .collect()
    }
}

/// Enqueues every location of each input on a shared [`TransferQueue`].
/// Enqueueing waits while the queue is full, which throttles the upstream
/// stages to the queue's politeness interval.
pub struct TransferOutput<T> {
    queue: Arc<TransferQueue>,
    resolver: Arc<ResourceResolver>,
    enqueued: u64,
    _item: PhantomData<fn(T)>,
}

impl<T> TransferOutput<T> {
    /// Stage feeding `queue`
    pub fn new(queue: Arc<TransferQueue>, resolver: Arc<ResourceResolver>) -> Self {
        Self {
            queue,
            resolver,
            enqueued: 0,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Mirrored> Stage for TransferOutput<T> {
    type Input = T;
    type Outputs = ();

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, _capacity: usize) -> Self::Outputs {}

    async fn process(&mut self, item: T, _scope: &StageScope) -> Result<(), StageError> {
        for location in item.locations(&self.resolver)? {
            self.queue.transfer(TransferRequest::from(location)).await?;
            self.enqueued += 1;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), StageError> {
        debug!("Transfer output enqueued {} file(s)", self.enqueued);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_day_and_game_locations() {
        let resolver = ResourceResolver::new("http://test.com/a/b/c", "/data").unwrap();
        let date = NaiveDate::from_ymd_opt(2017, 5, 29).unwrap();
        let day = DayLocation {
            date,
            location: resolver.locate_date(date).unwrap(),
        };

        let day_files = day.locations(&resolver).unwrap();
        assert_eq!(day_files.len(), 2);
        assert!(day_files[0].local.ends_with("year_2017/month_05/day_29/index.html"));
        assert!(day_files[1].remote.as_str().ends_with("day_29/master_scoreboard.xml"));

        let game = GameId::parse("gid_2017_05_29_anamlb_tormlb_1").unwrap();
        let game_files = game.locations(&resolver).unwrap();
        assert_eq!(game_files.len(), 5);
        assert!(game_files
            .iter()
            .any(|l| l.remote.as_str().ends_with("gid_2017_05_29_anamlb_tormlb_1/inning/inning_hit.xml")));
    }
}
