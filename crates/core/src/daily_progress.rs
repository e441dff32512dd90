//! Daily progress model - aggregated statistics for one calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::ProgressId;
use crate::Time;

/// Lowest allowed day rating.
pub const MIN_DAY_RATING: u8 = 1;
/// Highest allowed day rating.
pub const MAX_DAY_RATING: u8 = 5;

/// Errors from the user-facing progress mutators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// Rating outside `MIN_DAY_RATING..=MAX_DAY_RATING`
    #[error("day rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Check a rating against `MIN_DAY_RATING..=MAX_DAY_RATING`. `None` always passes.
pub fn check_day_rating(rating: Option<u8>) -> Result<(), ProgressError> {
    match rating {
        Some(value) if !(MIN_DAY_RATING..=MAX_DAY_RATING).contains(&value) => {
            Err(ProgressError::InvalidRating(value))
        }
        _ => Ok(()),
    }
}

/// Computed statistics for a day's blocks.
///
/// Every field is recomputed from scratch on each aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    /// Blocks scheduled on the day
    pub total_blocks: usize,
    /// Blocks in `Completed`
    pub completed_blocks: usize,
    /// Blocks in `Skipped`
    pub skipped_blocks: usize,
    /// Blocks in `InProgress`
    pub in_progress_blocks: usize,
    /// Sum of block durations
    pub total_planned_minutes: i64,
    /// Minutes done, including live progress of active blocks
    pub completed_minutes: i64,
}

impl DayStats {
    /// Blocks not yet touched. Always derived, never stored.
    pub fn not_started_blocks(&self) -> usize {
        self.total_blocks
            .saturating_sub(self.completed_blocks)
            .saturating_sub(self.skipped_blocks)
            .saturating_sub(self.in_progress_blocks)
    }

    /// Share of blocks completed, in `[0, 1]`.
    pub fn completion_percentage(&self) -> f64 {
        ratio(self.completed_blocks as f64, self.total_blocks as f64)
    }

    /// Share of blocks completed or under way.
    pub fn success_rate(&self) -> f64 {
        ratio(
            (self.completed_blocks + self.in_progress_blocks) as f64,
            self.total_blocks as f64,
        )
    }

    /// Share of blocks skipped.
    pub fn skip_rate(&self) -> f64 {
        ratio(self.skipped_blocks as f64, self.total_blocks as f64)
    }

    /// Share of planned minutes done.
    pub fn time_completion_percentage(&self) -> f64 {
        ratio(self.completed_minutes as f64, self.total_planned_minutes as f64)
    }

    /// Every block reached a terminal state.
    pub fn is_day_complete(&self) -> bool {
        self.total_blocks > 0 && self.completed_blocks + self.skipped_blocks == self.total_blocks
    }

    /// Weighted score in `[0, 1]`.
    ///
    /// Completion share, plus up to 0.2 for not skipping, plus 0.1 for a
    /// finished day with no skips.
    pub fn performance_score(&self) -> f64 {
        let mut score = self.completion_percentage() + (1.0 - self.skip_rate()) * 0.2;
        if self.is_day_complete() && self.skipped_blocks == 0 {
            score += 0.1;
        }
        score.min(1.0)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// The persisted progress record for a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    /// Unique identifier
    pub id: ProgressId,

    /// Calendar day, unique per record
    pub date: NaiveDate,

    /// Aggregated statistics
    #[serde(flatten)]
    pub stats: DayStats,

    /// User rating of the day (1-5)
    pub day_rating: Option<u8>,

    /// User notes on the day
    pub day_notes: Option<String>,

    /// The user has opened the day summary
    pub summary_viewed: bool,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl DailyProgress {
    /// Create the first record for a day from freshly aggregated stats.
    pub fn from_stats(date: NaiveDate, stats: DayStats, at: Time) -> Self {
        Self {
            id: ProgressId::new(),
            date,
            stats,
            day_rating: None,
            day_notes: None,
            summary_viewed: false,
            created_at: at,
            updated_at: at,
        }
    }

    /// Replace every computed field.
    ///
    /// Rating, notes and the viewed flag are left as they are.
    pub fn apply_stats(&mut self, stats: DayStats, at: Time) {
        self.stats = stats;
        self.updated_at = at;
    }

    /// Set or clear the day rating.
    pub fn set_day_rating(&mut self, rating: Option<u8>, at: Time) -> Result<(), ProgressError> {
        check_day_rating(rating)?;
        self.day_rating = rating;
        self.updated_at = at;
        Ok(())
    }

    /// Set or clear the day notes. Blank notes clear the field.
    pub fn set_day_notes(&mut self, notes: Option<String>, at: Time) {
        self.day_notes = notes.filter(|n| !n.trim().is_empty());
        self.updated_at = at;
    }

    /// Record that the user has seen the summary.
    pub fn mark_summary_viewed(&mut self, at: Time) {
        self.summary_viewed = true;
        self.updated_at = at;
    }

    /// See [`DayStats::completion_percentage`].
    pub fn completion_percentage(&self) -> f64 {
        self.stats.completion_percentage()
    }

    /// See [`DayStats::performance_score`].
    pub fn performance_score(&self) -> f64 {
        self.stats.performance_score()
    }

    /// See [`DayStats::is_day_complete`].
    pub fn is_day_complete(&self) -> bool {
        self.stats.is_day_complete()
    }
}
