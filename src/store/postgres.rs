//! Postgres store
//!
//! One table per record kind, keyed by the kind's natural key. Reconciliation
//! is a single conditional upsert per record, run inside a transaction:
//!
//! ```sql
//! INSERT INTO team AS t (...) VALUES (...)
//! ON CONFLICT (team_id) DO UPDATE SET effective_date = EXCLUDED.effective_date
//! WHERE t.effective_date > EXCLUDED.effective_date
//! RETURNING (xmax = 0) AS inserted
//! ```
//!
//! No returned row means the `WHERE` rejected the update and the stored row
//! was kept.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{validated, ReconcileError, ReconcileOutcome, RecordStore};
use crate::{FieldValue, PipelineRecord, ReconcilePolicy, RecordKind};

/// Default pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Table layout of one record kind. Columns are listed in
/// [`PipelineRecord::fields`] order.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Table name
    pub table: &'static str,
    /// `(column, SQL type)` pairs
    pub columns: &'static [(&'static str, &'static str)],
    /// Primary key columns
    pub key: &'static [&'static str],
}

const EFFECTIVE_DATE: (&str, &str) = ("effective_date", "TIMESTAMPTZ NOT NULL");

/// Table layout for a kind.
pub fn table_spec(kind: RecordKind) -> TableSpec {
    match kind {
        RecordKind::Venue => TableSpec {
            table: "venue",
            columns: &[
                EFFECTIVE_DATE,
                ("venue_id", "BIGINT NOT NULL"),
                ("name", "TEXT NOT NULL"),
                ("location", "TEXT NOT NULL"),
                ("channel", "TEXT NOT NULL"),
            ],
            key: &["venue_id"],
        },
        RecordKind::League => TableSpec {
            table: "league",
            columns: &[
                EFFECTIVE_DATE,
                ("league_id", "BIGINT NOT NULL"),
                ("name", "TEXT NOT NULL"),
                ("sport_code", "TEXT NOT NULL"),
            ],
            key: &["league_id"],
        },
        RecordKind::Division => TableSpec {
            table: "division",
            columns: &[
                EFFECTIVE_DATE,
                ("name", "TEXT NOT NULL"),
                ("code", "TEXT NOT NULL"),
            ],
            key: &["code"],
        },
        RecordKind::Team => TableSpec {
            table: "team",
            columns: &[
                EFFECTIVE_DATE,
                ("team_id", "BIGINT NOT NULL"),
                ("name", "TEXT NOT NULL"),
                ("code", "TEXT NOT NULL"),
                ("city", "TEXT NOT NULL"),
                ("league_id", "BIGINT NOT NULL"),
                ("division", "TEXT NOT NULL"),
            ],
            key: &["team_id"],
        },
        RecordKind::Standing => TableSpec {
            table: "standing",
            columns: &[
                EFFECTIVE_DATE,
                ("team_id", "BIGINT NOT NULL"),
                ("standing_date", "DATE NOT NULL"),
                ("wins", "BIGINT NOT NULL"),
                ("losses", "BIGINT NOT NULL"),
                ("games_played", "BIGINT NOT NULL"),
                ("games_back", "TEXT NOT NULL"),
                ("wildcard_games_back", "TEXT NOT NULL"),
            ],
            key: &["team_id", "standing_date"],
        },
        RecordKind::Game => TableSpec {
            table: "game",
            columns: &[
                EFFECTIVE_DATE,
                ("game_id", "BIGINT NOT NULL"),
                ("resume_date", "TEXT NOT NULL"),
                ("original_date", "TEXT NOT NULL"),
                ("game_type", "TEXT NOT NULL"),
                ("tiebreaker", "TEXT NOT NULL"),
                ("gameday", "TEXT NOT NULL"),
                ("double_header", "TEXT NOT NULL"),
                ("game_number", "BIGINT NOT NULL"),
                ("tbd_flag", "TEXT NOT NULL"),
                ("interleague", "TEXT NOT NULL"),
                ("scheduled_innings", "BIGINT NOT NULL"),
                ("description", "TEXT NOT NULL"),
                ("venue_id", "BIGINT NOT NULL"),
                ("away_team_id", "BIGINT NOT NULL"),
                ("home_team_id", "BIGINT NOT NULL"),
            ],
            key: &["game_id"],
        },
        RecordKind::GameStatus => TableSpec {
            table: "game_status",
            columns: &[
                EFFECTIVE_DATE,
                ("game_id", "BIGINT NOT NULL"),
                ("status", "TEXT NOT NULL"),
                ("ind", "TEXT NOT NULL"),
                ("reason", "TEXT NOT NULL"),
                ("current_inning", "BIGINT NOT NULL"),
                ("top_of_inning", "BOOLEAN NOT NULL"),
                ("balls", "BIGINT NOT NULL"),
                ("strikes", "BIGINT NOT NULL"),
                ("outs", "BIGINT NOT NULL"),
                ("inning_state", "TEXT NOT NULL"),
                ("note", "TEXT NOT NULL"),
                ("perfect_game", "BOOLEAN NOT NULL"),
                ("no_hitter", "BOOLEAN NOT NULL"),
                ("away_team_runs", "BIGINT NOT NULL"),
                ("home_team_runs", "BIGINT NOT NULL"),
                ("away_team_hits", "BIGINT NOT NULL"),
                ("home_team_hits", "BIGINT NOT NULL"),
                ("away_team_errors", "BIGINT NOT NULL"),
                ("home_team_errors", "BIGINT NOT NULL"),
                ("away_team_hr", "BIGINT NOT NULL"),
                ("home_team_hr", "BIGINT NOT NULL"),
                ("away_team_sb", "BIGINT NOT NULL"),
                ("home_team_sb", "BIGINT NOT NULL"),
                ("away_team_so", "BIGINT NOT NULL"),
                ("home_team_so", "BIGINT NOT NULL"),
            ],
            key: &["game_id"],
        },
        RecordKind::InningScore => TableSpec {
            table: "inning_score",
            columns: &[
                EFFECTIVE_DATE,
                ("game_id", "BIGINT NOT NULL"),
                ("inning", "BIGINT NOT NULL"),
                ("away_team_runs", "BIGINT NOT NULL"),
                ("home_team_runs", "BIGINT NOT NULL"),
            ],
            key: &["game_id", "inning"],
        },
    }
}

impl TableSpec {
    /// `CREATE TABLE IF NOT EXISTS` statement
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
            self.table,
            columns.join(", "),
            self.key.join(", ")
        )
    }

    /// Conditional upsert for `policy`
    pub fn upsert_sql(&self, policy: ReconcilePolicy) -> String {
        let names: Vec<&str> = self.columns.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("${}", i)).collect();

        let (assignments, comparison) = match policy {
            ReconcilePolicy::KeepLatest => (
                names
                    .iter()
                    .filter(|name| !self.key.contains(*name))
                    .map(|name| format!("{} = EXCLUDED.{}", name, name))
                    .collect::<Vec<_>>(),
                "<",
            ),
            ReconcilePolicy::KeepEarliest => (vec!["effective_date = EXCLUDED.effective_date".to_string()], ">"),
        };

        format!(
            "INSERT INTO {table} AS t ({columns}) VALUES ({values}) \
             ON CONFLICT ({key}) DO UPDATE SET {assignments} \
             WHERE t.effective_date {comparison} EXCLUDED.effective_date \
             RETURNING (xmax = 0) AS inserted",
            table = self.table,
            columns = names.join(", "),
            values = placeholders.join(", "),
            key = self.key.join(", "),
            assignments = assignments.join(", "),
            comparison = comparison,
        )
    }
}

/// Reconciling store backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    upserts: HashMap<RecordKind, String>,
}

impl PgStore {
    /// Connect a pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, ReconcileError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!("Connected to database: max_connections={}", max_connections);
        Ok(Self::with_pool(pool))
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        let upserts = RecordKind::ALL
            .iter()
            .map(|kind| (*kind, table_spec(*kind).upsert_sql(kind.policy())))
            .collect();
        Self { pool, upserts }
    }

    /// Create any missing tables.
    pub async fn ensure_tables(&self) -> Result<(), ReconcileError> {
        for kind in RecordKind::ALL {
            let spec = table_spec(kind);
            sqlx::query(&spec.create_sql()).execute(&self.pool).await?;
            debug!("Ensured table {}", spec.table);
        }
        Ok(())
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn reconcile(&self, record: &PipelineRecord) -> Result<ReconcileOutcome, ReconcileError> {
        validated(record)?;

        let kind = record.kind();
        let sql = match self.upserts.get(&kind) {
            Some(sql) => sql.as_str(),
            None => return Err(ReconcileError::Invalid { kind, reason: "no table for kind".to_string() }),
        };

        let mut query = sqlx::query(sql);
        for field in record.fields() {
            query = match field {
                FieldValue::Int(v) => query.bind(v),
                FieldValue::Text(v) => query.bind(v),
                FieldValue::Bool(v) => query.bind(v),
                FieldValue::Date(v) => query.bind(v),
                FieldValue::Time(v) => query.bind(v),
            };
        }

        let mut tx = self.pool.begin().await?;
        let row = query.fetch_optional(&mut *tx).await?;
        tx.commit().await?;

        Ok(match row {
            None => ReconcileOutcome::Kept,
            Some(row) if row.try_get::<bool, _>("inserted")? => ReconcileOutcome::Inserted,
            Some(_) => ReconcileOutcome::Updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::scoreboard::ScoreboardReader;

    #[tokio::test]
    async fn test_columns_match_fields() {
        let games = ScoreboardReader::new(crate::extract::SCOREBOARD_FIXTURE.as_bytes())
            .collect_games()
            .await
            .unwrap();
        let records: Vec<PipelineRecord> = games.iter().flat_map(|g| g.records()).collect();

        for kind in RecordKind::ALL {
            let record = records.iter().find(|r| r.kind() == kind).unwrap();
            let spec = table_spec(kind);
            assert_eq!(spec.columns.len(), record.fields().len(), "{}", kind);
            assert_eq!(spec.columns[0].0, "effective_date");
            for key in spec.key {
                assert!(spec.columns.iter().any(|(c, _)| c == key), "{} key {}", kind, key);
            }
        }
    }

    #[test]
    fn test_upsert_direction() {
        let team = table_spec(RecordKind::Team).upsert_sql(ReconcilePolicy::KeepEarliest);
        assert!(team.contains("ON CONFLICT (team_id)"));
        assert!(team.contains("SET effective_date = EXCLUDED.effective_date WHERE"));
        assert!(team.contains("t.effective_date > EXCLUDED.effective_date"));

        let inning = table_spec(RecordKind::InningScore).upsert_sql(ReconcilePolicy::KeepLatest);
        assert!(inning.contains("ON CONFLICT (game_id, inning)"));
        assert!(inning.contains("away_team_runs = EXCLUDED.away_team_runs"));
        assert!(!inning.contains("game_id = EXCLUDED.game_id"));
        assert!(inning.contains("t.effective_date < EXCLUDED.effective_date"));
        assert!(inning.contains("$5)"));
    }

    #[test]
    fn test_create_sql() {
        let sql = table_spec(RecordKind::Standing).create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS standing ("));
        assert!(sql.ends_with("PRIMARY KEY (team_id, standing_date))"));
    }
}
