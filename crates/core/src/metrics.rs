//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Mover (moves by kind, duplicates, failures, duration)
//! - Revert engine (reverts by result)
//! - Folder monitor (active watches)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Mover Metrics
// =============================================================================

/// Files relocated, by kind.
pub static FILES_MOVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dropsort_files_moved_total", "Total files moved"),
        &["kind"], // "moved", "renamed"
    )
    .unwrap()
});

/// Arriving files deleted as byte-identical duplicates.
pub static DUPLICATES_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "dropsort_duplicates_removed_total",
        "Total duplicate files removed instead of moved",
    )
    .unwrap()
});

/// Moves that ended in an ERROR record.
pub static MOVE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("dropsort_move_failures_total", "Total failed moves").unwrap()
});

/// Duration of a single move, including duplicate detection.
pub static MOVE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "dropsort_move_duration_seconds",
            "Duration of a single file move",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .unwrap()
});

// =============================================================================
// Revert Metrics
// =============================================================================

/// Revert attempts by result.
pub static REVERTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dropsort_reverts_total", "Total revert attempts"),
        &["result"], // "success", "rejected", "failed"
    )
    .unwrap()
});

// =============================================================================
// Monitor Metrics
// =============================================================================

/// Folders currently being watched.
pub static ACTIVE_WATCHES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "dropsort_active_watches",
        "Number of folders currently being watched",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FILES_MOVED.clone()),
        Box::new(DUPLICATES_REMOVED.clone()),
        Box::new(MOVE_FAILURES.clone()),
        Box::new(MOVE_DURATION.clone()),
        Box::new(REVERTS.clone()),
        Box::new(ACTIVE_WATCHES.clone()),
    ]
}
