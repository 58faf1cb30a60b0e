use thiserror::Error;

use super::MonitoredFolder;
use crate::result::ErrorCategory;

#[derive(Debug, Error)]
pub enum FolderError {
    #[error("Folder not found: {0}")]
    NotFound(String),

    #[error("Invalid folder: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt folder {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

impl FolderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FolderError::NotFound(_) => ErrorCategory::NotFound,
            FolderError::Validation(_) => ErrorCategory::Validation,
            FolderError::Database(_) | FolderError::Corrupt { .. } => ErrorCategory::Io,
        }
    }
}

/// Storage for monitored folder definitions.
pub trait FolderStore: Send + Sync {
    fn insert(&self, folder: &MonitoredFolder) -> Result<(), FolderError>;

    fn get(&self, id: &str) -> Result<Option<MonitoredFolder>, FolderError>;

    /// All folders, in insertion order.
    fn list(&self) -> Result<Vec<MonitoredFolder>, FolderError>;

    fn set_monitoring(&self, id: &str, monitoring: bool) -> Result<(), FolderError>;

    /// Remove a folder, returning what was stored.
    fn delete(&self, id: &str) -> Result<MonitoredFolder, FolderError>;
}
