use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

/// Set of source paths currently being restored.
///
/// Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct RevertGuard {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl RevertGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `path` for the duration of the returned handle.
    ///
    /// Returns `None` if the path is already claimed. When the handle drops,
    /// the path is released after `linger` (immediately when zero or when no
    /// runtime is available).
    pub fn try_enter(&self, path: &Path, linger: Duration) -> Option<GuardedPath> {
        let mut paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
        if !paths.insert(path.to_path_buf()) {
            return None;
        }
        Some(GuardedPath {
            guard: self.clone(),
            path: path.to_path_buf(),
            linger,
        })
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, path: &Path) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        debug!("Released revert guard for {}", path.display());
    }
}

/// A claimed path. Dropping it releases the claim.
#[derive(Debug)]
pub struct GuardedPath {
    guard: RevertGuard,
    path: PathBuf,
    linger: Duration,
}

impl Drop for GuardedPath {
    fn drop(&mut self) {
        if self.linger.is_zero() {
            self.guard.release(&self.path);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let guard = self.guard.clone();
                let path = std::mem::take(&mut self.path);
                let linger = self.linger;
                handle.spawn(async move {
                    tokio::time::sleep(linger).await;
                    guard.release(&path);
                });
            }
            Err(_) => self.guard.release(&self.path),
        }
    }
}
