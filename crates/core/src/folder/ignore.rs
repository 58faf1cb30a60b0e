use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// Patterns excluding files from a folder's processing.
///
/// Patterns are plain strings. Blank entries are dropped and the rest trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IgnoreList {
    patterns: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Watch-layer filter: some component of `path` equals a pattern.
    pub fn excludes(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                self.patterns.iter().any(|p| *p == name)
            }
            _ => false,
        })
    }

    /// File-level filter: the file name contains a pattern, or the parent
    /// directory ends with it (component-wise, so `tmp` and `build/tmp` work).
    pub fn is_ignored(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent();

        self.patterns.iter().any(|pattern| {
            file_name.contains(pattern.as_str())
                || parent
                    .map(|dir| dir.ends_with(Path::new(pattern)))
                    .unwrap_or(false)
        })
    }
}

impl From<Vec<String>> for IgnoreList {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<IgnoreList> for Vec<String> {
    fn from(list: IgnoreList) -> Self {
        list.patterns
    }
}
