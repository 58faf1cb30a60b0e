//! Configuration for the mover.

use serde::{Deserialize, Serialize};

/// Configuration for the file system mover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoverConfig {
    /// Buffer size in bytes for hashing and cross-device copies.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Highest `(n)` suffix tried before the move is given up.
    #[serde(default = "default_max_collision_suffix")]
    pub max_collision_suffix: u32,
}

fn default_buffer_size() -> usize {
    64 * 1024
}

fn default_max_collision_suffix() -> u32 {
    10_000
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_collision_suffix: default_max_collision_suffix(),
        }
    }
}

impl MoverConfig {
    /// Sets the buffer size for hashing and copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the highest collision suffix.
    pub fn with_max_collision_suffix(mut self, max: u32) -> Self {
        self.max_collision_suffix = max;
        self
    }
}
