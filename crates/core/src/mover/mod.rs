//! Moving matched files into their destination.
//!
//! # Flow
//!
//! 1. Make sure the destination directory exists.
//! 2. If a file with the same name is already there, ask the
//!    [`DuplicateDetector`]; a byte-identical candidate is deleted and the
//!    move stops there.
//! 3. Reserve a free name (`name.ext`, `name (1).ext`, `name (2).ext`, ...)
//!    with an atomic create-if-absent, so concurrent arrivals of equally named
//!    files never land on the same path.
//! 4. Rename onto the reservation, falling back to copy + delete across
//!    filesystems.
//! 5. Append one history record (`MOVE`, `RENAME_AND_MOVE`, or `ERROR`).
//!
//! Failures never escape [`FileMover::move_file`]: they are logged and
//! recorded so the calling watch keeps running.

mod config;
mod dedup;
mod error;
mod fs_mover;
mod traits;

pub use config::MoverConfig;
pub use dedup::{hash_file, DuplicateDetector};
pub use error::MoverError;
pub use fs_mover::{collision_name, FsMover};
pub use traits::{FileMover, MoveOutcome};

pub(crate) use fs_mover::relocate;
