//! In-memory store for tests and dry runs

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{validated, ReconcileError, ReconcileOutcome, RecordStore};
use crate::{NaturalKey, PipelineRecord, ReconcilePolicy, RecordKind};

/// Map of the latest reconciled row per `(kind, natural key)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(RecordKind, NaturalKey), PipelineRecord>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored row for a key
    pub async fn get(&self, kind: RecordKind, key: &NaturalKey) -> Option<PipelineRecord> {
        self.rows.lock().await.get(&(kind, key.clone())).cloned()
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Number of stored rows of one kind
    pub async fn count(&self, kind: RecordKind) -> usize {
        self.rows.lock().await.keys().filter(|(k, _)| *k == kind).count()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn reconcile(&self, record: &PipelineRecord) -> Result<ReconcileOutcome, ReconcileError> {
        validated(record)?;

        let kind = record.kind();
        let mut rows = self.rows.lock().await;
        let Some(stored) = rows.get_mut(&(kind, record.natural_key())) else {
            rows.insert((kind, record.natural_key()), record.clone());
            return Ok(ReconcileOutcome::Inserted);
        };

        let policy = kind.policy();
        if !policy.should_replace(stored.effective_date(), record.effective_date()) {
            return Ok(ReconcileOutcome::Kept);
        }

        match policy {
            ReconcilePolicy::KeepLatest => *stored = record.clone(),
            ReconcilePolicy::KeepEarliest => set_effective_date(stored, record.effective_date()),
        }
        Ok(ReconcileOutcome::Updated)
    }
}

fn set_effective_date(record: &mut PipelineRecord, at: chrono::DateTime<chrono::Utc>) {
    match record {
        PipelineRecord::Venue(r) => r.effective_date = at,
        PipelineRecord::League(r) => r.effective_date = at,
        PipelineRecord::Division(r) => r.effective_date = at,
        PipelineRecord::Team(r) => r.effective_date = at,
        PipelineRecord::Standing(r) => r.effective_date = at,
        PipelineRecord::Game(r) => r.effective_date = at,
        PipelineRecord::GameStatus(r) => r.effective_date = at,
        PipelineRecord::InningScore(r) => r.effective_date = at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InningScoreRecord, TeamRecord};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 5, 29, hour, 0, 0).unwrap()
    }

    fn team(date: DateTime<Utc>, name: &str) -> PipelineRecord {
        PipelineRecord::Team(TeamRecord {
            effective_date: date,
            id: 141,
            name: name.to_string(),
            code: "tor".to_string(),
            city: "Toronto".to_string(),
            league_id: 103,
            division: "E".to_string(),
        })
    }

    fn inning(date: DateTime<Utc>, home_runs: u32) -> PipelineRecord {
        PipelineRecord::InningScore(InningScoreRecord {
            effective_date: date,
            game_id: 491105,
            inning: 1,
            away_team_runs: 0,
            home_team_runs: home_runs,
        })
    }

    #[tokio::test]
    async fn test_reference_kind_keeps_earliest() {
        let store = MemoryStore::new();
        assert_eq!(store.reconcile(&team(at(17), "Toronto")).await.unwrap(), ReconcileOutcome::Inserted);
        assert_eq!(store.reconcile(&team(at(23), "Blue Jays")).await.unwrap(), ReconcileOutcome::Kept);

        let stored = store.get(RecordKind::Team, &NaturalKey::Id(141)).await.unwrap();
        assert_eq!(stored.effective_date(), at(17));

        // an earlier sighting moves only the date
        assert_eq!(store.reconcile(&team(at(5), "Jays")).await.unwrap(), ReconcileOutcome::Updated);
        let PipelineRecord::Team(stored) = store.get(RecordKind::Team, &NaturalKey::Id(141)).await.unwrap() else {
            panic!("expected a team");
        };
        assert_eq!(stored.effective_date, at(5));
        assert_eq!(stored.name, "Toronto");
    }

    #[tokio::test]
    async fn test_fact_kind_keeps_latest() {
        let store = MemoryStore::new();
        store.reconcile(&inning(at(17), 0)).await.unwrap();
        assert_eq!(store.reconcile(&inning(at(23), 1)).await.unwrap(), ReconcileOutcome::Updated);
        assert_eq!(store.reconcile(&inning(at(20), 5)).await.unwrap(), ReconcileOutcome::Kept);

        let stored = store
            .get(RecordKind::InningScore, &NaturalKey::GameInning(491105, 1))
            .await
            .unwrap();
        assert_eq!(stored, inning(at(23), 1));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_tie_keeps_stored() {
        let store = MemoryStore::new();
        store.reconcile(&inning(at(17), 0)).await.unwrap();
        assert_eq!(store.reconcile(&inning(at(17), 3)).await.unwrap(), ReconcileOutcome::Kept);
    }

    #[tokio::test]
    async fn test_invalid_record_rejected() {
        let store = MemoryStore::new();
        let mut bad = inning(at(17), 0);
        if let PipelineRecord::InningScore(r) = &mut bad {
            r.inning = 0;
        }
        assert!(matches!(
            store.reconcile(&bad).await,
            Err(ReconcileError::Invalid { kind: RecordKind::InningScore, .. })
        ));
        assert!(store.is_empty().await);
    }
}
