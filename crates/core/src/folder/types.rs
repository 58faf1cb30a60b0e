use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::IgnoreList;
use crate::rule::Rule;

/// A source directory whose new files are filed into a destination by one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredFolder {
    pub id: String,
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub rule: Rule,
    #[serde(default)]
    pub ignore: IgnoreList,
    /// Only changed by starting or stopping the folder's watch.
    #[serde(default)]
    pub monitoring: bool,
}

/// Request to register a folder.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFolder {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub rule: Rule,
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl MonitoredFolder {
    /// Build a folder with a fresh id, monitoring off.
    pub fn from_request(request: NewFolder) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name,
            source: request.source,
            destination: request.destination,
            rule: request.rule,
            ignore: IgnoreList::new(request.ignore),
            monitoring: false,
        }
    }
}
