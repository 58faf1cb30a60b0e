//! Per-folder filesystem watches.
//!
//! A [`FolderMonitor`] owns the set of active watches. For every entry that
//! appears in a watched source it waits for the file to settle, skips
//! directories, ignored names and paths currently being reverted, evaluates
//! the folder's rule and hands matches to the [`FileMover`](crate::mover::FileMover).

mod config;
mod error;
mod events;
mod manager;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use events::{watch_folder, FolderEvent, FolderEvents};
pub use manager::FolderMonitor;
