//! Caller-facing result objects.

use serde::{Deserialize, Serialize};

/// Failure category shared by every engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid input (paths, rules, duplicate folder definitions).
    Validation,
    /// The operation clashes with current state (watch active, cap reached, path occupied).
    Conflict,
    /// Unknown folder or action id.
    NotFound,
    /// Filesystem or storage failure.
    Io,
    /// The action cannot be reverted (wrong type or already reverted).
    NonRevertible,
}

/// Outcome of start/stop/revert as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCategory>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_missing_error() {
        let json = serde_json::to_value(OperationResult::ok("done")).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());

        let json =
            serde_json::to_value(OperationResult::failed(ErrorCategory::NotFound, "nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "not_found");
    }
}
