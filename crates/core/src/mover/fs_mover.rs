//! Filesystem-based mover implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};

use super::config::MoverConfig;
use super::dedup::DuplicateDetector;
use super::error::MoverError;
use super::traits::{FileMover, MoveOutcome};
use crate::ledger::{HistoryLedger, NewAction};
use crate::metrics;

/// Name used for the `n`th collision of `file_name`.
///
/// The suffix goes between the stem and the last extension, so
/// `archive.tar.gz` becomes `archive.tar (1).gz`. A leading dot does not start
/// an extension: `.bashrc` becomes `.bashrc (1)`.
pub fn collision_name(file_name: &str, n: u32) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            let (stem, ext) = file_name.split_at(idx);
            format!("{stem} ({n}){ext}")
        }
        _ => format!("{file_name} ({n})"),
    }
}

/// Moves `source` onto `target`, replacing whatever is there.
///
/// Uses a rename when both paths share a filesystem and falls back to a
/// streaming copy followed by removal of the source otherwise.
pub(crate) async fn relocate(
    source: &Path,
    target: &Path,
    buffer_size: usize,
) -> Result<(), MoverError> {
    match fs::rename(source, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            debug!(
                "Rename across filesystems, copying {} to {}",
                source.display(),
                target.display()
            );
            copy_file(source, target, buffer_size).await?;
            fs::remove_file(source)
                .await
                .map_err(|source_err| MoverError::RemoveFailed {
                    path: source.to_path_buf(),
                    source: source_err,
                })
        }
        Err(e) if e.kind() == ErrorKind::NotFound && !source.exists() => {
            Err(MoverError::SourceNotFound {
                path: source.to_path_buf(),
            })
        }
        Err(e) => Err(MoverError::move_failed(
            source.to_path_buf(),
            target.to_path_buf(),
            e,
        )),
    }
}

async fn copy_file(source: &Path, destination: &Path, buffer_size: usize) -> Result<u64, MoverError> {
    let copy_failed =
        |e| MoverError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e);

    let source_file = File::open(source).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            MoverError::SourceNotFound {
                path: source.to_path_buf(),
            }
        } else {
            MoverError::Io(e)
        }
    })?;
    let dest_file = File::create(destination).await.map_err(copy_failed)?;

    let mut reader = BufReader::with_capacity(buffer_size, source_file);
    let mut writer = BufWriter::with_capacity(buffer_size, dest_file);
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).await.map_err(copy_failed)?;
        if bytes_read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..bytes_read])
            .await
            .map_err(copy_failed)?;
        total_bytes += bytes_read as u64;
    }

    writer.flush().await.map_err(copy_failed)?;
    Ok(total_bytes)
}

/// Whether two paths resolve to the same existing file.
///
/// Symlinked directories are resolved, so `dir/a.txt` and `link-to-dir/a.txt`
/// are the same file.
async fn same_file(a: &Path, b: &Path) -> bool {
    match tokio::try_join!(fs::canonicalize(a), fs::canonicalize(b)) {
        Ok((a, b)) => a == b,
        Err(_) => false,
    }
}

/// Moves files on the local filesystem and records every outcome.
pub struct FsMover {
    config: MoverConfig,
    ledger: Arc<dyn HistoryLedger>,
    detector: DuplicateDetector,
}

impl FsMover {
    pub fn new(config: MoverConfig, ledger: Arc<dyn HistoryLedger>) -> Self {
        let detector = DuplicateDetector::new(Arc::clone(&ledger), config.buffer_size);
        Self {
            config,
            ledger,
            detector,
        }
    }

    /// Creates a mover with default configuration.
    pub fn with_defaults(ledger: Arc<dyn HistoryLedger>) -> Self {
        Self::new(MoverConfig::default(), ledger)
    }

    /// Atomically claims the first free name in `directory`.
    ///
    /// Returns the reserved path and the suffix number used (0 for the
    /// natural name). The reservation is an empty file the caller must
    /// either replace or remove.
    async fn reserve_destination(
        &self,
        directory: &Path,
        file_name: &str,
    ) -> Result<(PathBuf, u32), MoverError> {
        for n in 0..=self.config.max_collision_suffix {
            let candidate = if n == 0 {
                directory.join(file_name)
            } else {
                directory.join(collision_name(file_name, n))
            };

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => return Ok((candidate, n)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(MoverError::ReservationFailed {
                        path: candidate,
                        source: e,
                    })
                }
            }
        }

        Err(MoverError::CollisionLimit {
            directory: directory.to_path_buf(),
            file_name: file_name.to_string(),
            attempts: self.config.max_collision_suffix + 1,
        })
    }

    async fn try_move(
        &self,
        source: &Path,
        destination_dir: &Path,
        folder_id: Option<&str>,
    ) -> Result<MoveOutcome, MoverError> {
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| MoverError::InvalidSource {
                path: source.to_path_buf(),
            })?
            .to_string();

        match fs::metadata(source).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(MoverError::InvalidSource {
                    path: source.to_path_buf(),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MoverError::SourceNotFound {
                    path: source.to_path_buf(),
                })
            }
            Err(e) => return Err(MoverError::Io(e)),
        }

        fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| MoverError::DirectoryCreationFailed {
                path: destination_dir.to_path_buf(),
                source: e,
            })?;

        let natural = destination_dir.join(&file_name);
        if same_file(source, &natural).await {
            debug!("{} is already in {}", source.display(), destination_dir.display());
            return Ok(MoveOutcome::AlreadyInPlace {
                path: source.to_path_buf(),
            });
        }
        if fs::try_exists(&natural).await.unwrap_or(false)
            && self
                .detector
                .is_duplicate(source, &natural, folder_id)
                .await?
        {
            return Ok(MoveOutcome::DuplicateRemoved { existing: natural });
        }

        let (target, suffix) = self.reserve_destination(destination_dir, &file_name).await?;

        if let Err(e) = relocate(source, &target, self.config.buffer_size).await {
            if let Err(cleanup) = fs::remove_file(&target).await {
                warn!(
                    "Failed to remove reservation {}: {}",
                    target.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        if suffix == 0 {
            self.ledger
                .append(&NewAction::moved(folder_id, source, &target))?;
            metrics::FILES_MOVED.with_label_values(&["moved"]).inc();
            info!("Moved {} to {}", source.display(), target.display());
            Ok(MoveOutcome::Moved {
                destination: target,
            })
        } else {
            let renamed = target
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let details = format!("Renamed to {renamed} to avoid a name collision.");
            self.ledger.append(&NewAction::renamed_and_moved(
                folder_id, source, &target, details,
            ))?;
            metrics::FILES_MOVED.with_label_values(&["renamed"]).inc();
            info!(
                "Moved {} to {} (renamed to avoid a collision)",
                source.display(),
                target.display()
            );
            Ok(MoveOutcome::Renamed {
                destination: target,
            })
        }
    }
}

#[async_trait]
impl FileMover for FsMover {
    async fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
        folder_id: Option<&str>,
    ) -> MoveOutcome {
        let start = Instant::now();
        let result = self.try_move(source, destination_dir, folder_id).await;
        metrics::MOVE_DURATION.observe(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e.detailed_message();
                error!("Failed to move {}: {}", source.display(), reason);
                metrics::MOVE_FAILURES.inc();

                let action = NewAction::failed(folder_id, source, destination_dir, &reason);
                if let Err(ledger_err) = self.ledger.append(&action) {
                    error!(
                        "Failed to record move failure for {}: {}",
                        source.display(),
                        ledger_err
                    );
                }
                MoveOutcome::Failed { reason }
            }
        }
    }
}
