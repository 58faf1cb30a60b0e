//! Testing utilities shared by unit and integration tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use dropsort_core::testing::{fixtures, RecordingMover};
//!
//! let temp = tempfile::TempDir::new()?;
//! let folder = fixtures::folder_fixture(temp.path(), "docs", "extension", ".pdf");
//! let mover = Arc::new(RecordingMover::new());
//! ```

mod mock_mover;

pub use fixtures::{folder_fixture, wait_until};
pub use mock_mover::{RecordedMove, RecordingMover};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::time::Duration;

    use crate::folder::{MonitoredFolder, NewFolder};
    use crate::rule::{Rule, RuleCriteria};

    /// Create `<root>/<name>/in` and `<root>/<name>/out` and a folder filing
    /// from one into the other with the given rule.
    ///
    /// Panics on invalid input; intended for tests only.
    pub fn folder_fixture(root: &Path, name: &str, criteria: &str, value: &str) -> MonitoredFolder {
        let base = root.join(name);
        let source = base.join("in");
        let destination = base.join("out");
        std::fs::create_dir_all(&source).expect("create source directory");
        let source = source.canonicalize().expect("canonicalize source");

        let criteria = RuleCriteria::parse(criteria).expect("known rule criteria");
        let rule = Rule::parse(criteria, value).expect("valid rule");

        MonitoredFolder::from_request(NewFolder {
            name: name.to_string(),
            source,
            destination,
            rule,
            ignore: Vec::new(),
        })
    }

    /// Polls `condition` every 20ms until it holds or `deadline` passes.
    pub async fn wait_until<F>(deadline: Duration, mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let poll = async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(deadline, poll).await.is_ok()
    }
}
