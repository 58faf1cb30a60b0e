//! Filesystem notifications for a single source directory.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::MonitorError;

/// Something happened in a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderEvent {
    /// An entry was created in, or moved into, the directory.
    Appeared(PathBuf),
    /// The watch backend reported an error.
    Error(String),
}

/// Stream of events for one watched directory.
///
/// Ends when the watcher that feeds it is dropped.
#[derive(Debug)]
pub struct FolderEvents {
    rx: mpsc::UnboundedReceiver<FolderEvent>,
}

impl Stream for FolderEvents {
    type Item = FolderEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Paths that an event reports as newly present.
fn appeared_paths(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) => event.paths,
        // Both carries [from, to]; only the target is new.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.into_iter().last().into_iter().collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => event.paths,
        _ => Vec::new(),
    }
}

/// Starts a flat (non-recursive) watch on `source`.
///
/// The returned watcher must be kept alive for events to flow.
pub fn watch_folder(source: &Path) -> Result<(RecommendedWatcher, FolderEvents), MonitorError> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for path in appeared_paths(event) {
                let _ = tx.send(FolderEvent::Appeared(path));
            }
        }
        Err(e) => {
            let _ = tx.send(FolderEvent::Error(e.to_string()));
        }
    })
    .map_err(|e| MonitorError::Watch {
        path: source.to_path_buf(),
        source: e,
    })?;

    watcher
        .watch(source, RecursiveMode::NonRecursive)
        .map_err(|e| MonitorError::Watch {
            path: source.to_path_buf(),
            source: e,
        })?;

    Ok((watcher, FolderEvents { rx }))
}
