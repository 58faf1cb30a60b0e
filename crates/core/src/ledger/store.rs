use thiserror::Error;

use super::{ActionRecord, ActionStatus, ActionType, NewAction};
use crate::result::ErrorCategory;

/// Default number of records returned by a listing.
pub const DEFAULT_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt history record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

impl LedgerError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Io
    }
}

/// Filter for querying history
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub folder_id: Option<String>,
    pub action_type: Option<ActionType>,
    pub status: Option<ActionStatus>,
    pub limit: i64,
}

impl ActionFilter {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            ..Default::default()
        }
    }

    pub fn with_folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn with_action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = Some(action_type);
        self
    }

    pub fn with_status(mut self, status: ActionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

/// Storage for action records.
///
/// Appends are safe from concurrent tasks. Records are never deleted.
pub trait HistoryLedger: Send + Sync {
    /// Append a record, returning it with its assigned id and `COMPLETED` status.
    fn append(&self, action: &NewAction) -> Result<ActionRecord, LedgerError>;

    /// Records matching the filter, newest first.
    fn query(&self, filter: &ActionFilter) -> Result<Vec<ActionRecord>, LedgerError>;

    fn get(&self, id: i64) -> Result<Option<ActionRecord>, LedgerError>;

    /// Apply `COMPLETED -> REVERTED`. Returns `false` when the record was not
    /// in `COMPLETED` (or does not exist), in which case nothing changed.
    fn mark_reverted(&self, id: i64) -> Result<bool, LedgerError>;

    /// The newest `limit` records.
    fn list(&self, limit: i64) -> Result<Vec<ActionRecord>, LedgerError> {
        self.query(&ActionFilter::new().with_limit(limit))
    }
}
