//! Byte-identical duplicate detection.

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use super::error::MoverError;
use crate::ledger::{HistoryLedger, NewAction};
use crate::metrics;

/// Streams `path` through SHA-256 and returns the hex digest.
///
/// Memory use is bounded by `buffer_size` regardless of file size.
pub async fn hash_file(path: &Path, buffer_size: usize) -> Result<String, MoverError> {
    let checksum_failed = |source| MoverError::ChecksumCalculationFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).await.map_err(checksum_failed)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let bytes_read = file.read(&mut buffer).await.map_err(checksum_failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Decides whether an arriving file duplicates one already at the destination.
pub struct DuplicateDetector {
    ledger: Arc<dyn HistoryLedger>,
    buffer_size: usize,
}

impl DuplicateDetector {
    pub fn new(ledger: Arc<dyn HistoryLedger>, buffer_size: usize) -> Self {
        Self {
            ledger,
            buffer_size,
        }
    }

    /// Returns `true` when `candidate` is byte-identical to `existing`.
    ///
    /// On `true` the candidate has been deleted and a `DELETE_DUPLICATE`
    /// record written. A missing file on either side is never a duplicate.
    pub async fn is_duplicate(
        &self,
        candidate: &Path,
        existing: &Path,
        folder_id: Option<&str>,
    ) -> Result<bool, MoverError> {
        let (candidate_meta, existing_meta) =
            tokio::join!(fs::metadata(candidate), fs::metadata(existing));

        let (candidate_meta, existing_meta) = match (candidate_meta, existing_meta) {
            (Ok(c), Ok(e)) => (c, e),
            _ => {
                warn!(
                    "One side of the duplicate check no longer exists: {} or {}",
                    candidate.display(),
                    existing.display()
                );
                return Ok(false);
            }
        };

        if !candidate_meta.is_file() || !existing_meta.is_file() {
            return Ok(false);
        }

        if candidate_meta.len() != existing_meta.len() {
            return Ok(false);
        }

        let (candidate_hash, existing_hash) = tokio::try_join!(
            hash_file(candidate, self.buffer_size),
            hash_file(existing, self.buffer_size)
        )?;

        if candidate_hash != existing_hash {
            return Ok(false);
        }

        info!(
            "Duplicate of {} found, removing {}",
            existing.display(),
            candidate.display()
        );
        fs::remove_file(candidate)
            .await
            .map_err(|source| MoverError::RemoveFailed {
                path: candidate.to_path_buf(),
                source,
            })?;
        metrics::DUPLICATES_REMOVED.inc();

        let action = NewAction::duplicate_deleted(folder_id, candidate, existing);
        if let Err(e) = self.ledger.append(&action) {
            tracing::error!(
                "Failed to record duplicate removal of {}: {}",
                candidate.display(),
                e
            );
        }

        Ok(true)
    }
}
