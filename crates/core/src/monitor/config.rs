//! Folder monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the folder monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum number of folders watched at the same time.
    /// Starting one more is rejected, not queued.
    #[serde(default = "default_max_watches")]
    pub max_watches: usize,

    /// Wait after an "appeared" event before the file is inspected (milliseconds).
    /// Gives writers a moment to finish creating the file.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Process files already present in the source when a watch starts.
    #[serde(default = "default_scan_existing")]
    pub scan_existing: bool,

    /// How long a reverted path stays guarded after the revert finishes (milliseconds).
    #[serde(default = "default_guard_linger")]
    pub revert_guard_linger_ms: u64,
}

fn default_max_watches() -> usize {
    5
}

fn default_settle_delay() -> u64 {
    250
}

fn default_scan_existing() -> bool {
    true
}

fn default_guard_linger() -> u64 {
    2000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_watches: default_max_watches(),
            settle_delay_ms: default_settle_delay(),
            scan_existing: default_scan_existing(),
            revert_guard_linger_ms: default_guard_linger(),
        }
    }
}

impl MonitorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn revert_guard_linger(&self) -> Duration {
        Duration::from_millis(self.revert_guard_linger_ms)
    }
}
