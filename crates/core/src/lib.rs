//! Dayblocks core data models.
//!
//! This crate defines the time block entity, its status state machine,
//! the validation and conflict rules, and the per-day progress record.

#![warn(missing_docs)]

// Core identities
mod id;

// Time blocks
mod status;
mod time_block;
mod validation;

// Daily aggregation
mod daily_progress;

// Re-exports
pub use id::*;

pub use status::{determine_status, BlockStatus, TransitionError};
pub use time_block::{sort_for_display, BlockEdit, TimeBlock};
pub use validation::{
    find_conflicts, validate, ValidationError, MAX_CATEGORY_LEN, MAX_DURATION_MINUTES,
    MAX_NOTES_LEN, MAX_TITLE_LEN, MIN_DURATION_MINUTES,
};
pub use daily_progress::{
    check_day_rating, DailyProgress, DayStats, ProgressError, MAX_DAY_RATING, MIN_DAY_RATING,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
