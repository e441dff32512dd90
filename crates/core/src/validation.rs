//! Field validation and schedule conflict rules for time blocks.

use crate::id::BlockId;
use crate::time_block::TimeBlock;

/// Maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum notes length, in characters.
pub const MAX_NOTES_LEN: usize = 500;
/// Maximum category length, in characters.
pub const MAX_CATEGORY_LEN: usize = 50;
/// Shortest allowed block.
pub const MIN_DURATION_MINUTES: i64 = 1;
/// Longest allowed block (one day).
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// A single violated invariant on a time block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty or whitespace
    #[error("title must not be empty")]
    EmptyTitle,

    /// Title exceeds [`MAX_TITLE_LEN`]
    #[error("title is {len} characters, the limit is 100")]
    TitleTooLong {
        /// Actual length
        len: usize,
    },

    /// `start_time` is not strictly before `end_time`
    #[error("start time must be before end time")]
    InvalidTimeRange,

    /// Duration outside `[MIN_DURATION_MINUTES, MAX_DURATION_MINUTES]`
    #[error("duration of {minutes} minutes is outside 1..=1440")]
    DurationOutOfRange {
        /// Actual duration
        minutes: i64,
    },

    /// Notes exceed [`MAX_NOTES_LEN`]
    #[error("notes are {len} characters, the limit is 500")]
    NotesTooLong {
        /// Actual length
        len: usize,
    },

    /// Category exceeds [`MAX_CATEGORY_LEN`]
    #[error("category is {len} characters, the limit is 50")]
    CategoryTooLong {
        /// Actual length
        len: usize,
    },
}

/// Collect every invariant the block violates.
pub fn validate(block: &TimeBlock) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let title_len = block.title.chars().count();
    if block.title.trim().is_empty() {
        errors.push(ValidationError::EmptyTitle);
    } else if title_len > MAX_TITLE_LEN {
        errors.push(ValidationError::TitleTooLong { len: title_len });
    }

    if block.start_time >= block.end_time {
        errors.push(ValidationError::InvalidTimeRange);
    }

    let minutes = block.duration_minutes();
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        errors.push(ValidationError::DurationOutOfRange { minutes });
    }

    if let Some(notes) = &block.notes {
        let len = notes.chars().count();
        if len > MAX_NOTES_LEN {
            errors.push(ValidationError::NotesTooLong { len });
        }
    }

    if let Some(category) = &block.category {
        let len = category.chars().count();
        if len > MAX_CATEGORY_LEN {
            errors.push(ValidationError::CategoryTooLong { len });
        }
    }

    errors
}

/// Every conflicting pair among `blocks`, each pair reported once.
pub fn find_conflicts(blocks: &[TimeBlock]) -> Vec<(BlockId, BlockId)> {
    let mut pairs = Vec::new();
    for (i, a) in blocks.iter().enumerate() {
        for b in &blocks[i + 1..] {
            if a.conflicts_with(b) {
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}
