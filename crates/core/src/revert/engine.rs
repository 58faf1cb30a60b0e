use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tracing::{info, warn};

use super::guard::RevertGuard;
use crate::ledger::{ActionRecord, ActionStatus, ActionType, HistoryLedger, LedgerError};
use crate::metrics;
use crate::mover::{relocate, MoverError};
use crate::result::ErrorCategory;

/// Reasons a revert can be refused or fail.
#[derive(Debug, Error)]
pub enum RevertError {
    #[error("Action {0} not found")]
    NotFound(i64),

    #[error("Action {0} has already been reverted")]
    AlreadyReverted(i64),

    #[error("Action {id} is a {action_type} action and cannot be reverted")]
    NotRevertible { id: i64, action_type: ActionType },

    #[error("File is no longer at its destination: {0}")]
    MissingAtDestination(PathBuf),

    #[error("A file already exists at the original location: {0}")]
    SourceOccupied(PathBuf),

    #[error("A revert of {0} is already in progress")]
    InProgress(PathBuf),

    #[error("Failed to move the file back: {0}")]
    Move(#[source] MoverError),

    #[error("Failed to create directory {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to reserve {path}")]
    ReservationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl RevertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) | Self::MissingAtDestination(_) => ErrorCategory::NotFound,
            Self::AlreadyReverted(_) | Self::NotRevertible { .. } => ErrorCategory::NonRevertible,
            Self::SourceOccupied(_) | Self::InProgress(_) => ErrorCategory::Conflict,
            Self::Move(_)
            | Self::DirectoryCreationFailed { .. }
            | Self::ReservationFailed { .. }
            | Self::Ledger(_) => ErrorCategory::Io,
        }
    }
}

/// Claims `path` with an empty placeholder so nothing can land there
/// between the occupancy check and the move back.
async fn reserve_source(path: &Path) -> Result<(), RevertError> {
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(RevertError::SourceOccupied(path.to_path_buf()))
        }
        Err(source) => Err(RevertError::ReservationFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Restores moved files to their original path.
pub struct RevertEngine {
    ledger: Arc<dyn HistoryLedger>,
    guard: RevertGuard,
    linger: Duration,
    buffer_size: usize,
}

impl RevertEngine {
    pub fn new(ledger: Arc<dyn HistoryLedger>, guard: RevertGuard) -> Self {
        Self {
            ledger,
            guard,
            linger: Duration::ZERO,
            buffer_size: 64 * 1024,
        }
    }

    /// Keep reverted paths guarded this long after the revert returns.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn guard(&self) -> &RevertGuard {
        &self.guard
    }

    /// Moves the file of action `id` back to its source path.
    ///
    /// Preconditions are checked in a fixed order and each failure has its
    /// own variant. Returns the updated record.
    pub async fn revert(&self, id: i64) -> Result<ActionRecord, RevertError> {
        let result = self.try_revert(id).await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) if e.category() == ErrorCategory::Io => "failed",
            Err(_) => "rejected",
        };
        metrics::REVERTS.with_label_values(&[label]).inc();
        result
    }

    async fn try_revert(&self, id: i64) -> Result<ActionRecord, RevertError> {
        let record = self.ledger.get(id)?.ok_or(RevertError::NotFound(id))?;

        if record.status == ActionStatus::Reverted {
            return Err(RevertError::AlreadyReverted(id));
        }
        if !record.action_type.is_revertible() {
            return Err(RevertError::NotRevertible {
                id,
                action_type: record.action_type,
            });
        }
        if !fs::try_exists(&record.destination_path)
            .await
            .unwrap_or(false)
        {
            return Err(RevertError::MissingAtDestination(
                record.destination_path.clone(),
            ));
        }
        if fs::try_exists(&record.source_path).await.unwrap_or(true) {
            return Err(RevertError::SourceOccupied(record.source_path.clone()));
        }

        let _claim = self
            .guard
            .try_enter(&record.source_path, self.linger)
            .ok_or_else(|| RevertError::InProgress(record.source_path.clone()))?;

        if let Some(parent) = record.source_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| RevertError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        reserve_source(&record.source_path).await?;

        if let Err(e) = relocate(
            &record.destination_path,
            &record.source_path,
            self.buffer_size,
        )
        .await
        {
            if let Err(cleanup) = fs::remove_file(&record.source_path).await {
                warn!(
                    "Failed to remove reservation {}: {}",
                    record.source_path.display(),
                    cleanup
                );
            }
            return Err(RevertError::Move(e));
        }

        if !self.ledger.mark_reverted(id)? {
            warn!("Action {} changed status while being reverted", id);
        }

        info!(
            "Reverted action {}: {} back to {}",
            id,
            record.destination_path.display(),
            record.source_path.display()
        );

        Ok(self.ledger.get(id)?.unwrap_or(ActionRecord {
            status: ActionStatus::Reverted,
            ..record
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{NewAction, SqliteHistoryLedger};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        source: PathBuf,
        destination: PathBuf,
        ledger: Arc<SqliteHistoryLedger>,
        engine: RevertEngine,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in").join("a.txt");
        let destination = temp.path().join("out").join("a.txt");
        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
        std::fs::write(&destination, "payload").unwrap();

        let ledger = Arc::new(SqliteHistoryLedger::in_memory().unwrap());
        let engine = RevertEngine::new(
            Arc::clone(&ledger) as Arc<dyn HistoryLedger>,
            RevertGuard::new(),
        );
        Fixture {
            _temp: temp,
            source,
            destination,
            ledger,
            engine,
        }
    }

    #[tokio::test]
    async fn test_revert_restores_file_and_status() {
        let f = fixture();
        let record = f
            .ledger
            .append(&NewAction::moved(None, &f.source, &f.destination))
            .unwrap();

        let reverted = f.engine.revert(record.id).await.unwrap();

        assert_eq!(reverted.status, ActionStatus::Reverted);
        assert!(!f.destination.exists());
        assert_eq!(std::fs::read_to_string(&f.source).unwrap(), "payload");
        assert!(f.engine.guard().is_empty());
    }

    #[tokio::test]
    async fn test_second_revert_is_rejected_without_side_effects() {
        let f = fixture();
        let record = f
            .ledger
            .append(&NewAction::moved(None, &f.source, &f.destination))
            .unwrap();
        f.engine.revert(record.id).await.unwrap();

        let err = f.engine.revert(record.id).await.unwrap_err();
        assert!(matches!(err, RevertError::AlreadyReverted(_)));
        assert_eq!(err.category(), ErrorCategory::NonRevertible);
        assert!(f.source.exists());
        assert!(!f.destination.exists());
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let f = fixture();
        let err = f.engine.revert(42).await.unwrap_err();
        assert!(matches!(err, RevertError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_duplicate_and_error_records_are_not_revertible() {
        let f = fixture();
        let dup = f
            .ledger
            .append(&NewAction::duplicate_deleted(None, &f.source, &f.destination))
            .unwrap();
        let failed = f
            .ledger
            .append(&NewAction::failed(None, &f.source, &f.destination, "boom"))
            .unwrap();

        for id in [dup.id, failed.id] {
            let err = f.engine.revert(id).await.unwrap_err();
            assert!(matches!(err, RevertError::NotRevertible { .. }));
        }
        assert!(f.destination.exists());
    }

    #[tokio::test]
    async fn test_missing_destination() {
        let f = fixture();
        std::fs::remove_file(&f.destination).unwrap();
        let record = f
            .ledger
            .append(&NewAction::moved(None, &f.source, &f.destination))
            .unwrap();

        let err = f.engine.revert(record.id).await.unwrap_err();
        assert!(matches!(err, RevertError::MissingAtDestination(_)));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_occupied_source_is_a_conflict() {
        let f = fixture();
        std::fs::create_dir_all(f.source.parent().unwrap()).unwrap();
        std::fs::write(&f.source, "newer").unwrap();
        let record = f
            .ledger
            .append(&NewAction::moved(None, &f.source, &f.destination))
            .unwrap();

        let err = f.engine.revert(record.id).await.unwrap_err();
        assert!(matches!(err, RevertError::SourceOccupied(_)));
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(std::fs::read_to_string(&f.source).unwrap(), "newer");
        assert!(f.destination.exists());
    }

    #[tokio::test]
    async fn test_guarded_path_is_in_progress() {
        let f = fixture();
        let record = f
            .ledger
            .append(&NewAction::moved(None, &f.source, &f.destination))
            .unwrap();
        let _held = f
            .engine
            .guard()
            .try_enter(&f.source, Duration::ZERO)
            .unwrap();

        let err = f.engine.revert(record.id).await.unwrap_err();
        assert!(matches!(err, RevertError::InProgress(_)));
        assert!(f.destination.exists());
    }

    #[tokio::test]
    async fn test_source_reservation_never_replaces_a_file() {
        let temp = TempDir::new().unwrap();
        let taken = temp.path().join("taken.txt");
        std::fs::write(&taken, "arrived first").unwrap();

        let err = reserve_source(&taken).await.unwrap_err();
        assert!(matches!(err, RevertError::SourceOccupied(_)));
        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "arrived first");

        let free = temp.path().join("free.txt");
        reserve_source(&free).await.unwrap();
        assert_eq!(std::fs::metadata(&free).unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_move_back_releases_source() {
        let f = fixture();
        // A directory cannot be renamed over the placeholder file.
        let not_a_file = f.destination.parent().unwrap().join("folder");
        std::fs::create_dir_all(&not_a_file).unwrap();
        let record = f
            .ledger
            .append(&NewAction::moved(None, &f.source, &not_a_file))
            .unwrap();

        let err = f.engine.revert(record.id).await.unwrap_err();
        assert!(matches!(err, RevertError::Move(_)));
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(!f.source.exists());
        assert!(not_a_file.is_dir());
        assert_eq!(
            f.ledger.get(record.id).unwrap().unwrap().status,
            ActionStatus::Completed
        );
    }
}
