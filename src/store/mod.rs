//! Reconciling record stores
//!
//! Every write goes through [`RecordStore::reconcile`]: insert when the key is
//! new, otherwise apply the kind's [`ReconcilePolicy`](crate::ReconcilePolicy)
//! to the stored and incoming effective dates. Reference kinds only ever move
//! their effective date backwards and keep their other columns; fact kinds
//! replace the whole row with the newer snapshot.

use async_trait::async_trait;

use crate::PipelineRecord;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// What a reconciliation did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileOutcome {
    /// Key was new
    Inserted,
    /// Stored row was replaced or its effective date moved
    Updated,
    /// Stored row won
    Kept,
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Record failed validation and was not written
    #[error("invalid {kind} record: {reason}")]
    Invalid {
        /// Record kind
        kind: crate::RecordKind,
        /// Validation message
        reason: String,
    },

    /// Database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Running counts of reconciliation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Rows inserted
    pub inserted: u64,
    /// Rows updated
    pub updated: u64,
    /// Rows kept unchanged
    pub kept: u64,
    /// Records dropped on error
    pub failed: u64,
}

impl ReconcileStats {
    /// Count one outcome
    pub fn record(&mut self, outcome: &Result<ReconcileOutcome, ReconcileError>) {
        match outcome {
            Ok(ReconcileOutcome::Inserted) => self.inserted += 1,
            Ok(ReconcileOutcome::Updated) => self.updated += 1,
            Ok(ReconcileOutcome::Kept) => self.kept += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// A store that merges records under the effective-date rule.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or merge one record. The conflict check and the conditional
    /// write are atomic with respect to other calls for the same key.
    async fn reconcile(&self, record: &PipelineRecord) -> Result<ReconcileOutcome, ReconcileError>;
}

pub(crate) fn validated(record: &PipelineRecord) -> Result<(), ReconcileError> {
    record.validate().map_err(|reason| ReconcileError::Invalid {
        kind: record.kind(),
        reason,
    })
}
