//! Progress Tracking
//!
//! Daily aggregation, performance classification, and the tracker service
//! that keeps one progress record per calendar day.

#![warn(missing_docs)]

pub mod aggregator;
pub mod classifier;
pub mod tracker;

pub use aggregator::aggregate;
pub use classifier::{
    classify, report, suggestions, PerformanceReport, PerformanceTier, Suggestion,
    CROWDED_DAY_BLOCKS, HIGH_SKIP_RATE,
};
pub use tracker::{BasicProgressTracker, ProgressTracker, TrackerError};
