use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use notify::RecommendedWatcher;
use tokio::fs;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::MonitorConfig;
use super::error::MonitorError;
use super::events::{watch_folder, FolderEvent, FolderEvents};
use crate::folder::{IgnoreList, MonitoredFolder};
use crate::metrics;
use crate::mover::FileMover;
use crate::revert::RevertGuard;
use crate::rule::{matches, FileStats, Rule};

struct ActiveWatch {
    // Dropping the watcher ends the event stream.
    _watcher: RecommendedWatcher,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Everything a watch needs to process one appeared entry.
struct DispatchContext {
    folder_id: String,
    source: PathBuf,
    destination: PathBuf,
    rule: Rule,
    ignore: IgnoreList,
    settle_delay: Duration,
    guard: RevertGuard,
    mover: Arc<dyn FileMover>,
    in_flight: StdMutex<HashSet<PathBuf>>,
}

/// Owns every active folder watch.
///
/// At most `max_watches` folders are watched at once. Each watch runs a
/// dispatch task that turns "appeared" events into independent per-file
/// tasks, so a slow move never holds up other files or folders.
pub struct FolderMonitor {
    config: MonitorConfig,
    mover: Arc<dyn FileMover>,
    guard: RevertGuard,
    watches: Mutex<HashMap<String, ActiveWatch>>,
}

impl FolderMonitor {
    pub fn new(config: MonitorConfig, mover: Arc<dyn FileMover>, guard: RevertGuard) -> Self {
        Self {
            config,
            mover,
            guard,
            watches: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Starts watching `folder.source`.
    pub async fn start(&self, folder: &MonitoredFolder) -> Result<(), MonitorError> {
        let mut watches = self.watches.lock().await;

        if watches.contains_key(&folder.id) {
            return Err(MonitorError::AlreadyActive(folder.id.clone()));
        }
        if watches.len() >= self.config.max_watches {
            warn!(
                "Refusing to monitor {}: {} folders already active",
                folder.name,
                watches.len()
            );
            return Err(MonitorError::CapacityReached {
                max: self.config.max_watches,
            });
        }
        if !folder.source.is_dir() {
            return Err(MonitorError::SourceMissing(folder.source.clone()));
        }

        let (watcher, events) = watch_folder(&folder.source)?;
        let (stop_tx, stop_rx) = oneshot::channel();

        let context = Arc::new(DispatchContext {
            folder_id: folder.id.clone(),
            source: folder.source.clone(),
            destination: folder.destination.clone(),
            rule: folder.rule.clone(),
            ignore: folder.ignore.clone(),
            settle_delay: self.config.settle_delay(),
            guard: self.guard.clone(),
            mover: Arc::clone(&self.mover),
            in_flight: StdMutex::new(HashSet::new()),
        });
        let task = tokio::spawn(dispatch(
            context,
            events,
            stop_rx,
            self.config.scan_existing,
        ));

        watches.insert(
            folder.id.clone(),
            ActiveWatch {
                _watcher: watcher,
                stop_tx,
                task,
            },
        );
        metrics::ACTIVE_WATCHES.set(watches.len() as i64);

        info!(
            "Monitoring {} ({}) -> {} by {}",
            folder.name,
            folder.source.display(),
            folder.destination.display(),
            folder.rule
        );
        Ok(())
    }

    /// Stops the watch for `folder_id`.
    ///
    /// Files already being processed finish and record their outcome.
    pub async fn stop(&self, folder_id: &str) -> Result<(), MonitorError> {
        let watch = {
            let mut watches = self.watches.lock().await;
            let watch = watches.remove(folder_id);
            metrics::ACTIVE_WATCHES.set(watches.len() as i64);
            watch
        };

        let watch = watch.ok_or_else(|| MonitorError::NotActive(folder_id.to_string()))?;
        Self::close(folder_id, watch).await;
        info!("Stopped monitoring folder {}", folder_id);
        Ok(())
    }

    pub async fn is_watching(&self, folder_id: &str) -> bool {
        self.watches.lock().await.contains_key(folder_id)
    }

    pub async fn active_count(&self) -> usize {
        self.watches.lock().await.len()
    }

    /// Stops every watch.
    pub async fn shutdown(&self) {
        let drained: Vec<(String, ActiveWatch)> = {
            let mut watches = self.watches.lock().await;
            metrics::ACTIVE_WATCHES.set(0);
            watches.drain().collect()
        };

        let count = drained.len();
        for (folder_id, watch) in drained {
            Self::close(&folder_id, watch).await;
        }
        if count > 0 {
            info!("Stopped {} folder watches", count);
        }
    }

    async fn close(folder_id: &str, watch: ActiveWatch) {
        let ActiveWatch {
            _watcher: watcher,
            stop_tx,
            task,
        } = watch;
        drop(watcher);
        let _ = stop_tx.send(());
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                error!("Watch task for folder {} failed: {}", folder_id, e);
            }
        }
    }
}

async fn dispatch(
    context: Arc<DispatchContext>,
    mut events: FolderEvents,
    mut stop_rx: oneshot::Receiver<()>,
    scan_existing: bool,
) {
    if scan_existing {
        scan_existing_entries(&context).await;
    }

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            event = events.next() => match event {
                Some(FolderEvent::Appeared(path)) => spawn_entry(&context, path),
                Some(FolderEvent::Error(message)) => {
                    error!("Watch error for folder {}: {}", context.folder_id, message);
                }
                None => break,
            },
        }
    }

    debug!("Dispatch loop for folder {} ended", context.folder_id);
}

async fn scan_existing_entries(context: &Arc<DispatchContext>) {
    let mut entries = match fs::read_dir(&context.source).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(
                "Failed to scan {} for existing files: {}",
                context.source.display(),
                e
            );
            return;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => spawn_entry(context, entry.path()),
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read {}: {}", context.source.display(), e);
                break;
            }
        }
    }
}

fn spawn_entry(context: &Arc<DispatchContext>, path: PathBuf) {
    let relative = path.strip_prefix(&context.source).unwrap_or(&path);
    if context.ignore.excludes(relative) {
        debug!("Ignoring event for {}", path.display());
        return;
    }

    {
        let mut in_flight = context
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(path.clone()) {
            debug!("{} is already being processed", path.display());
            return;
        }
    }

    let context = Arc::clone(context);
    tokio::spawn(async move {
        process_entry(&context, &path).await;
        context
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&path);
    });
}

async fn process_entry(context: &DispatchContext, path: &Path) {
    if !context.settle_delay.is_zero() {
        tokio::time::sleep(context.settle_delay).await;
    }

    if context.guard.contains(path) {
        debug!("{} is being reverted, skipping", path.display());
        return;
    }

    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} vanished before it could be processed", path.display());
            return;
        }
        Err(e) => {
            error!("Failed to read metadata for {}: {}", path.display(), e);
            return;
        }
    };

    if !metadata.is_file() {
        debug!("{} is not a regular file, skipping", path.display());
        return;
    }

    if context.ignore.is_ignored(path) {
        debug!("{} matches an ignore pattern", path.display());
        return;
    }

    let stats = FileStats::from_metadata(&metadata);
    if !matches(path, &stats, &context.rule) {
        debug!(
            "{} does not match rule {}, leaving it",
            path.display(),
            context.rule
        );
        return;
    }

    context
        .mover
        .move_file(path, &context.destination, Some(&context.folder_id))
        .await;
}
