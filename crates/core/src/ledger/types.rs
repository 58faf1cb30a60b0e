use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Move,
    RenameAndMove,
    DeleteDuplicate,
    Error,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Move => "MOVE",
            ActionType::RenameAndMove => "RENAME_AND_MOVE",
            ActionType::DeleteDuplicate => "DELETE_DUPLICATE",
            ActionType::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MOVE" => Some(ActionType::Move),
            "RENAME_AND_MOVE" => Some(ActionType::RenameAndMove),
            "DELETE_DUPLICATE" => Some(ActionType::DeleteDuplicate),
            "ERROR" => Some(ActionType::Error),
            _ => None,
        }
    }

    /// Only relocations can be undone.
    pub fn is_revertible(&self) -> bool {
        matches!(self, ActionType::Move | ActionType::RenameAndMove)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Completed,
    Reverted,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Completed => "COMPLETED",
            ActionStatus::Reverted => "REVERTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COMPLETED" => Some(ActionStatus::Completed),
            "REVERTED" => Some(ActionStatus::Reverted),
            _ => None,
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: i64,
    /// Folder that produced the action. Not enforced: the folder may be gone.
    pub folder_id: Option<String>,
    pub action_type: ActionType,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub status: ActionStatus,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// An entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAction {
    pub folder_id: Option<String>,
    pub action_type: ActionType,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl NewAction {
    fn new(
        action_type: ActionType,
        folder_id: Option<&str>,
        source_path: impl Into<PathBuf>,
        destination_path: impl Into<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            folder_id: folder_id.map(String::from),
            action_type,
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn moved(
        folder_id: Option<&str>,
        source_path: impl Into<PathBuf>,
        destination_path: impl Into<PathBuf>,
    ) -> Self {
        Self::new(ActionType::Move, folder_id, source_path, destination_path, "")
    }

    pub fn renamed_and_moved(
        folder_id: Option<&str>,
        source_path: impl Into<PathBuf>,
        destination_path: impl Into<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(
            ActionType::RenameAndMove,
            folder_id,
            source_path,
            destination_path,
            details,
        )
    }

    pub fn duplicate_deleted(
        folder_id: Option<&str>,
        source_path: impl Into<PathBuf>,
        existing_path: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            ActionType::DeleteDuplicate,
            folder_id,
            source_path,
            existing_path,
            "Identical file already present at destination; source removed.",
        )
    }

    pub fn failed(
        folder_id: Option<&str>,
        source_path: impl Into<PathBuf>,
        destination_path: impl Into<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(
            ActionType::Error,
            folder_id,
            source_path,
            destination_path,
            details,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_names() {
        for t in [
            ActionType::Move,
            ActionType::RenameAndMove,
            ActionType::DeleteDuplicate,
            ActionType::Error,
        ] {
            assert_eq!(ActionType::parse(t.as_str()), Some(t));
            assert_eq!(
                serde_json::to_value(t).unwrap(),
                serde_json::Value::String(t.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_only_relocations_are_revertible() {
        assert!(ActionType::Move.is_revertible());
        assert!(ActionType::RenameAndMove.is_revertible());
        assert!(!ActionType::DeleteDuplicate.is_revertible());
        assert!(!ActionType::Error.is_revertible());
    }

    #[test]
    fn test_constructors_set_type() {
        let a = NewAction::duplicate_deleted(Some("f1"), "/in/a.pdf", "/out/a.pdf");
        assert_eq!(a.action_type, ActionType::DeleteDuplicate);
        assert_eq!(a.folder_id.as_deref(), Some("f1"));
        assert!(!a.details.is_empty());

        let b = NewAction::moved(None, "/in/b.pdf", "/out/b.pdf");
        assert_eq!(b.action_type, ActionType::Move);
        assert!(b.details.is_empty());
    }
}
