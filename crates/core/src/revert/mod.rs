//! Undoing recorded moves.
//!
//! A revert puts a moved file back at its original path. While that happens
//! the original path sits in the [`RevertGuard`] so the folder monitor does
//! not treat the returning file as a new arrival.

mod engine;
mod guard;

pub use engine::{RevertEngine, RevertError};
pub use guard::{GuardedPath, RevertGuard};
