//! Trait definitions for the mover module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

/// What a single move attempt ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Moved under its own name.
    Moved { destination: PathBuf },
    /// Moved under a numbered name to avoid a collision.
    Renamed { destination: PathBuf },
    /// The destination directory is the file's own directory; nothing done.
    AlreadyInPlace { path: PathBuf },
    /// Identical to a file already at the destination; the source was deleted.
    DuplicateRemoved { existing: PathBuf },
    /// Nothing moved; an `ERROR` record was written.
    Failed { reason: String },
}

impl MoveOutcome {
    /// Where the file now lives, if it was relocated.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            MoveOutcome::Moved { destination } | MoveOutcome::Renamed { destination } => {
                Some(destination)
            }
            _ => None,
        }
    }
}

/// Something that can file a source file into a destination directory.
///
/// Implementations record their own history and never return an error: a
/// failed move is terminal for that file occurrence and reported as
/// [`MoveOutcome::Failed`].
#[async_trait]
pub trait FileMover: Send + Sync {
    async fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
        folder_id: Option<&str>,
    ) -> MoveOutcome;
}
