//! The caller-facing surface of the sorter.
//!
//! [`SortingEngine`] wires the folder registry, history ledger, folder
//! monitor, mover and revert engine together. Operations that callers treat
//! as commands (`start_monitoring`, `stop_monitoring`, `revert_action`)
//! report through [`OperationResult`] rather than `Err`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{error, info, warn};

use crate::config::{Config, HistoryConfig};
use crate::folder::{FolderError, FolderStore, MonitoredFolder, NewFolder};
use crate::ledger::{ActionFilter, ActionRecord, HistoryLedger, LedgerError};
use crate::monitor::{FolderMonitor, MonitorConfig};
use crate::mover::{FileMover, FsMover, MoveOutcome, MoverConfig};
use crate::result::{ErrorCategory, OperationResult};
use crate::revert::{RevertEngine, RevertGuard};

pub struct SortingEngine {
    folders: Arc<dyn FolderStore>,
    ledger: Arc<dyn HistoryLedger>,
    mover: Arc<dyn FileMover>,
    monitor: FolderMonitor,
    reverter: RevertEngine,
    history: HistoryConfig,
}

impl SortingEngine {
    /// Builds an engine around an arbitrary mover.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        ledger: Arc<dyn HistoryLedger>,
        mover: Arc<dyn FileMover>,
        monitor_config: MonitorConfig,
        history: HistoryConfig,
    ) -> Self {
        let copy_buffer = MoverConfig::default().buffer_size;
        Self::assemble(folders, ledger, mover, monitor_config, history, copy_buffer)
    }

    /// Builds an engine with the filesystem mover, configured from `config`.
    pub fn from_config(
        config: &Config,
        folders: Arc<dyn FolderStore>,
        ledger: Arc<dyn HistoryLedger>,
    ) -> Self {
        let mover: Arc<dyn FileMover> =
            Arc::new(FsMover::new(config.mover.clone(), Arc::clone(&ledger)));
        Self::assemble(
            folders,
            ledger,
            mover,
            config.monitor.clone(),
            config.history.clone(),
            config.mover.buffer_size,
        )
    }

    fn assemble(
        folders: Arc<dyn FolderStore>,
        ledger: Arc<dyn HistoryLedger>,
        mover: Arc<dyn FileMover>,
        monitor_config: MonitorConfig,
        history: HistoryConfig,
        copy_buffer: usize,
    ) -> Self {
        // One guard shared by the reverter and every watch.
        let guard = RevertGuard::new();
        let reverter = RevertEngine::new(Arc::clone(&ledger), guard.clone())
            .with_linger(monitor_config.revert_guard_linger())
            .with_buffer_size(copy_buffer);
        let monitor = FolderMonitor::new(monitor_config, Arc::clone(&mover), guard);

        Self {
            folders,
            ledger,
            mover,
            monitor,
            reverter,
            history,
        }
    }

    pub fn monitor(&self) -> &FolderMonitor {
        &self.monitor
    }

    // =========================================================================
    // Folders
    // =========================================================================

    /// Validates and registers a folder. Monitoring starts off.
    pub async fn add_folder(&self, request: NewFolder) -> Result<MonitoredFolder, FolderError> {
        if request.name.trim().is_empty() {
            return Err(FolderError::Validation("name is required".into()));
        }
        if request.source.as_os_str().is_empty() {
            return Err(FolderError::Validation("source path is required".into()));
        }
        if request.destination.as_os_str().is_empty() {
            return Err(FolderError::Validation(
                "destination path is required".into(),
            ));
        }

        let source = match fs::canonicalize(&request.source).await {
            Ok(path) if path.is_dir() => path,
            Ok(_) => {
                return Err(FolderError::Validation(format!(
                    "source is not a directory: {}",
                    request.source.display()
                )))
            }
            Err(_) => {
                return Err(FolderError::Validation(format!(
                    "source directory does not exist: {}",
                    request.source.display()
                )))
            }
        };
        let destination = resolve_destination(&request.destination).await?;

        if source == destination {
            return Err(FolderError::Validation(
                "source and destination must differ".into(),
            ));
        }

        for existing in self.folders.list()? {
            if existing.source == source && existing.destination == destination {
                return Err(FolderError::Validation(format!(
                    "folder '{}' already files {} into {}",
                    existing.name,
                    source.display(),
                    destination.display()
                )));
            }
            if existing.source == destination && existing.destination == source {
                return Err(FolderError::Validation(format!(
                    "folder '{}' already files {} into {}; the reverse would move files back and forth",
                    existing.name,
                    destination.display(),
                    source.display()
                )));
            }
        }

        let folder = MonitoredFolder::from_request(NewFolder {
            source,
            destination,
            name: request.name.trim().to_string(),
            ..request
        });
        self.folders.insert(&folder)?;
        info!("Added folder {} ({})", folder.name, folder.id);
        Ok(folder)
    }

    pub fn list_folders(&self) -> Result<Vec<MonitoredFolder>, FolderError> {
        self.folders.list()
    }

    pub fn get_folder(&self, id: &str) -> Result<Option<MonitoredFolder>, FolderError> {
        self.folders.get(id)
    }

    /// Stops the folder's watch if any, then deletes it.
    ///
    /// History records keep their reference to the removed folder.
    pub async fn remove_folder(&self, id: &str) -> Result<MonitoredFolder, FolderError> {
        if self.monitor.is_watching(id).await {
            if let Err(e) = self.monitor.stop(id).await {
                warn!("Failed to stop watch for folder {} before removal: {}", id, e);
            }
        }
        let folder = self.folders.delete(id)?;
        info!("Removed folder {} ({})", folder.name, folder.id);
        Ok(folder)
    }

    // =========================================================================
    // Monitoring
    // =========================================================================

    pub async fn start_monitoring(&self, id: &str) -> OperationResult {
        let folder = match self.folders.get(id) {
            Ok(Some(folder)) => folder,
            Ok(None) => return not_found_folder(id),
            Err(e) => return OperationResult::failed(e.category(), e.to_string()),
        };

        if let Err(e) = self.monitor.start(&folder).await {
            warn!("Could not start monitoring {}: {}", folder.name, e);
            return OperationResult::failed(e.category(), e.to_string());
        }

        if let Err(e) = self.folders.set_monitoring(id, true) {
            error!("Failed to persist monitoring flag for {}: {}", id, e);
            if let Err(stop_err) = self.monitor.stop(id).await {
                warn!("Failed to roll back watch for {}: {}", id, stop_err);
            }
            return OperationResult::failed(e.category(), e.to_string());
        }

        OperationResult::ok(format!("Monitoring started for {}", folder.name))
    }

    /// Stops a folder's watch. The stored flag is turned off even when no
    /// watch was active.
    pub async fn stop_monitoring(&self, id: &str) -> OperationResult {
        let stopped = self.monitor.stop(id).await;

        match self.folders.set_monitoring(id, false) {
            Ok(()) => {}
            Err(FolderError::NotFound(_)) if stopped.is_err() => return not_found_folder(id),
            Err(e) => error!("Failed to clear monitoring flag for {}: {}", id, e),
        }

        match stopped {
            Ok(()) => OperationResult::ok(format!("Monitoring stopped for folder {id}")),
            Err(e) => OperationResult::failed(e.category(), e.to_string()),
        }
    }

    /// Restarts every folder stored with monitoring on.
    ///
    /// Folders that cannot be started have their flag turned off. Returns the
    /// number of watches started.
    pub async fn resume_monitoring(&self) -> Result<usize, FolderError> {
        let mut started = 0;
        for folder in self.folders.list()? {
            if !folder.monitoring {
                continue;
            }
            match self.monitor.start(&folder).await {
                Ok(()) => started += 1,
                Err(e) => {
                    warn!("Could not resume monitoring {}: {}", folder.name, e);
                    self.folders.set_monitoring(&folder.id, false)?;
                }
            }
        }
        if started > 0 {
            info!("Resumed monitoring for {} folders", started);
        }
        Ok(started)
    }

    /// Stops every watch. In-flight moves are left to finish.
    pub async fn shutdown(&self) {
        self.monitor.shutdown().await;
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub async fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
        folder_id: Option<&str>,
    ) -> MoveOutcome {
        self.mover.move_file(source, destination_dir, folder_id).await
    }

    /// Most recent records first; `None` means the configured default limit.
    pub fn list_actions(&self, limit: Option<i64>) -> Result<Vec<ActionRecord>, LedgerError> {
        self.ledger.list(self.history.clamp(limit))
    }

    pub fn query_actions(&self, filter: ActionFilter) -> Result<Vec<ActionRecord>, LedgerError> {
        let limit = self.history.clamp(Some(filter.limit));
        self.ledger.query(&filter.with_limit(limit))
    }

    pub fn get_action(&self, id: i64) -> Result<Option<ActionRecord>, LedgerError> {
        self.ledger.get(id)
    }

    pub async fn revert_action(&self, id: i64) -> OperationResult {
        match self.reverter.revert(id).await {
            Ok(record) => OperationResult::ok(format!(
                "Restored {}",
                record.source_path.display()
            )),
            Err(e) => {
                warn!("Revert of action {} refused: {}", id, e);
                OperationResult::failed(e.category(), e.to_string())
            }
        }
    }
}

async fn resolve_destination(destination: &Path) -> Result<PathBuf, FolderError> {
    if let Ok(canonical) = fs::canonicalize(destination).await {
        if !canonical.is_dir() {
            return Err(FolderError::Validation(format!(
                "destination is not a directory: {}",
                destination.display()
            )));
        }
        return Ok(canonical);
    }
    std::path::absolute(destination).map_err(|e| {
        FolderError::Validation(format!(
            "invalid destination {}: {}",
            destination.display(),
            e
        ))
    })
}

fn not_found_folder(id: &str) -> OperationResult {
    OperationResult::failed(ErrorCategory::NotFound, format!("Folder not found: {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::SqliteFolderStore;
    use crate::ledger::SqliteHistoryLedger;
    use crate::rule::Rule;
    use crate::testing::RecordingMover;
    use tempfile::TempDir;

    fn engine(max_watches: usize) -> SortingEngine {
        let monitor = MonitorConfig {
            max_watches,
            settle_delay_ms: 10,
            scan_existing: false,
            revert_guard_linger_ms: 0,
        };
        SortingEngine::new(
            Arc::new(SqliteFolderStore::in_memory().unwrap()),
            Arc::new(SqliteHistoryLedger::in_memory().unwrap()),
            Arc::new(RecordingMover::new()),
            monitor,
            HistoryConfig::default(),
        )
    }

    fn request(temp: &TempDir, name: &str) -> NewFolder {
        let source = temp.path().join(name).join("in");
        std::fs::create_dir_all(&source).unwrap();
        NewFolder {
            name: name.to_string(),
            source,
            destination: temp.path().join(name).join("out"),
            rule: Rule::extensions(".pdf").unwrap(),
            ignore: vec!["tmp".into()],
        }
    }

    #[tokio::test]
    async fn test_add_folder_canonicalizes_and_stores() {
        let temp = TempDir::new().unwrap();
        let engine = engine(5);

        let folder = engine.add_folder(request(&temp, "docs")).await.unwrap();
        assert!(folder.source.is_absolute());
        assert!(!folder.monitoring);
        assert_eq!(engine.list_folders().unwrap().len(), 1);
        assert_eq!(engine.get_folder(&folder.id).unwrap().unwrap(), folder);
    }

    #[tokio::test]
    async fn test_add_folder_validation() {
        let temp = TempDir::new().unwrap();
        let engine = engine(5);

        let mut missing = request(&temp, "a");
        missing.source = temp.path().join("nope");
        assert!(matches!(
            engine.add_folder(missing).await,
            Err(FolderError::Validation(_))
        ));

        let mut blank = request(&temp, "b");
        blank.name = "  ".into();
        assert!(engine.add_folder(blank).await.is_err());

        let mut same = request(&temp, "c");
        same.destination = same.source.clone();
        assert!(engine.add_folder(same).await.is_err());

        assert!(engine.list_folders().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_and_inverse_pairs_are_rejected() {
        let temp = TempDir::new().unwrap();
        let engine = engine(5);

        let first = request(&temp, "docs");
        std::fs::create_dir_all(&first.destination).unwrap();
        let folder = engine.add_folder(first.clone()).await.unwrap();

        let err = engine.add_folder(first).await.unwrap_err();
        assert!(err.to_string().contains("already"));

        let inverse = NewFolder {
            name: "back".into(),
            source: folder.destination.clone(),
            destination: folder.source.clone(),
            rule: Rule::extensions(".pdf").unwrap(),
            ignore: Vec::new(),
        };
        let err = engine.add_folder(inverse).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(engine.list_folders().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_and_stop_update_flag() {
        let temp = TempDir::new().unwrap();
        let engine = engine(5);
        let folder = engine.add_folder(request(&temp, "docs")).await.unwrap();

        let result = engine.start_monitoring(&folder.id).await;
        assert!(result.success, "{}", result.message);
        assert!(engine.get_folder(&folder.id).unwrap().unwrap().monitoring);

        let again = engine.start_monitoring(&folder.id).await;
        assert!(!again.success);
        assert_eq!(again.error, Some(ErrorCategory::Conflict));

        let result = engine.stop_monitoring(&folder.id).await;
        assert!(result.success);
        assert!(!engine.get_folder(&folder.id).unwrap().unwrap().monitoring);
    }

    #[tokio::test]
    async fn test_stop_without_watch_still_clears_flag() {
        let temp = TempDir::new().unwrap();
        let folders = Arc::new(SqliteFolderStore::in_memory().unwrap());
        let engine = SortingEngine::new(
            folders.clone(),
            Arc::new(SqliteHistoryLedger::in_memory().unwrap()),
            Arc::new(RecordingMover::new()),
            MonitorConfig::default(),
            HistoryConfig::default(),
        );
        let folder = engine.add_folder(request(&temp, "docs")).await.unwrap();
        folders.set_monitoring(&folder.id, true).unwrap();

        let result = engine.stop_monitoring(&folder.id).await;
        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorCategory::NotFound));
        assert!(!folders.get(&folder.id).unwrap().unwrap().monitoring);
    }

    #[tokio::test]
    async fn test_unknown_folder() {
        let engine = engine(5);
        let result = engine.start_monitoring("missing").await;
        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorCategory::NotFound));

        let result = engine.stop_monitoring("missing").await;
        assert_eq!(result.error, Some(ErrorCategory::NotFound));
    }

    #[tokio::test]
    async fn test_capacity_message() {
        let temp = TempDir::new().unwrap();
        let engine = engine(1);
        let a = engine.add_folder(request(&temp, "a")).await.unwrap();
        let b = engine.add_folder(request(&temp, "b")).await.unwrap();

        assert!(engine.start_monitoring(&a.id).await.success);
        let result = engine.start_monitoring(&b.id).await;
        assert!(!result.success);
        assert!(result.message.contains("Maximum"));
        assert!(!engine.get_folder(&b.id).unwrap().unwrap().monitoring);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_folder_stops_watch() {
        let temp = TempDir::new().unwrap();
        let engine = engine(5);
        let folder = engine.add_folder(request(&temp, "docs")).await.unwrap();
        engine.start_monitoring(&folder.id).await;

        engine.remove_folder(&folder.id).await.unwrap();
        assert!(!engine.monitor().is_watching(&folder.id).await);
        assert!(engine.get_folder(&folder.id).unwrap().is_none());
        assert!(matches!(
            engine.remove_folder(&folder.id).await,
            Err(FolderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resume_turns_off_unstartable_folders() {
        let temp = TempDir::new().unwrap();
        let folders = Arc::new(SqliteFolderStore::in_memory().unwrap());
        let engine = SortingEngine::new(
            folders.clone(),
            Arc::new(SqliteHistoryLedger::in_memory().unwrap()),
            Arc::new(RecordingMover::new()),
            MonitorConfig::default(),
            HistoryConfig::default(),
        );

        let alive = engine.add_folder(request(&temp, "alive")).await.unwrap();
        let gone = engine.add_folder(request(&temp, "gone")).await.unwrap();
        folders.set_monitoring(&alive.id, true).unwrap();
        folders.set_monitoring(&gone.id, true).unwrap();
        std::fs::remove_dir_all(&gone.source).unwrap();

        assert_eq!(engine.resume_monitoring().await.unwrap(), 1);
        assert!(engine.monitor().is_watching(&alive.id).await);
        assert!(!folders.get(&gone.id).unwrap().unwrap().monitoring);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_revert_unknown_action_is_not_found() {
        let engine = engine(5);
        let result = engine.revert_action(99).await;
        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorCategory::NotFound));
    }
}
