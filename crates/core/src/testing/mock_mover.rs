//! Recording mover for testing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::mover::{FileMover, MoveOutcome};

/// A recorded move request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub source: PathBuf,
    pub destination_dir: PathBuf,
    pub folder_id: Option<String>,
}

/// [`FileMover`] double that records requests instead of touching the disk.
///
/// Every call reports [`MoveOutcome::Moved`] into `destination_dir` unless a
/// failure reason has been set.
///
/// # Example
///
/// ```rust,ignore
/// use dropsort_core::testing::RecordingMover;
///
/// let mover = Arc::new(RecordingMover::new());
/// let monitor = FolderMonitor::new(config, mover.clone(), RevertGuard::new());
///
/// // ... drop a file into the watched folder ...
///
/// assert_eq!(mover.calls().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingMover {
    calls: Arc<Mutex<Vec<RecordedMove>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl RecordingMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedMove> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make subsequent calls report a failure.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl FileMover for RecordingMover {
    async fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
        folder_id: Option<&str>,
    ) -> MoveOutcome {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedMove {
                source: source.to_path_buf(),
                destination_dir: destination_dir.to_path_buf(),
                folder_id: folder_id.map(String::from),
            });

        if let Some(reason) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return MoveOutcome::Failed { reason };
        }

        let destination = match source.file_name() {
            Some(name) => destination_dir.join(name),
            None => destination_dir.to_path_buf(),
        };
        MoveOutcome::Moved { destination }
    }
}
