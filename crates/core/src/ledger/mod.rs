//! Append-only history of file actions.
//!
//! Every move, rename-and-move, duplicate removal and failed move is written
//! here. The only mutation ever applied to a stored record is the
//! `COMPLETED -> REVERTED` status transition performed by the revert engine.

mod sqlite;
mod store;
mod types;

pub use sqlite::*;
pub use store::*;
pub use types::*;
