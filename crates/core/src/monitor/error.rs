use std::path::PathBuf;

use thiserror::Error;

use crate::result::ErrorCategory;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Maximum number of monitored folders ({max}) reached")]
    CapacityReached { max: usize },

    #[error("Folder {0} is already being monitored")]
    AlreadyActive(String),

    #[error("Folder {0} is not being monitored")]
    NotActive(String),

    #[error("Source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl MonitorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CapacityReached { .. } | Self::AlreadyActive(_) => ErrorCategory::Conflict,
            Self::NotActive(_) => ErrorCategory::NotFound,
            Self::SourceMissing(_) => ErrorCategory::Validation,
            Self::Watch { .. } => ErrorCategory::Io,
        }
    }
}
