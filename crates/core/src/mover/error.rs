//! Error types for the mover module.

use std::path::PathBuf;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::result::ErrorCategory;

/// Errors that can occur while moving a file.
#[derive(Debug, Error)]
pub enum MoverError {
    /// Source path has no file name component.
    #[error("Not a file path: {path}")]
    InvalidSource { path: PathBuf },

    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not reserve a destination name.
    #[error("Failed to reserve destination {path}")]
    ReservationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every suffix up to the configured maximum is taken.
    #[error("No free name for {file_name} in {directory} after {attempts} attempts")]
    CollisionLimit {
        directory: PathBuf,
        file_name: String,
        attempts: u32,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to calculate checksum.
    #[error("Failed to calculate checksum for {path}")]
    ChecksumCalculationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to delete a file (duplicate candidate or copied source).
    #[error("Failed to remove file: {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// History could not be written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MoverError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSource { .. } => ErrorCategory::Validation,
            Self::SourceNotFound { .. } => ErrorCategory::NotFound,
            Self::CollisionLimit { .. } => ErrorCategory::Conflict,
            _ => ErrorCategory::Io,
        }
    }

    /// Message recorded in history, including the underlying cause.
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}
