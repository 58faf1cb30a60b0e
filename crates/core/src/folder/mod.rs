//! Monitored folder definitions and their storage.

mod ignore;
mod sqlite;
mod store;
mod types;

pub use ignore::IgnoreList;
pub use sqlite::SqliteFolderStore;
pub use store::{FolderError, FolderStore};
pub use types::{MonitoredFolder, NewFolder};
