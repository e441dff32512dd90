//! Daily progress aggregation.
//!
//! Reduces the blocks of one calendar day into [`DayStats`]. The result
//! depends on `now` through the live progress of in-progress blocks, so
//! callers that need reproducible output must pin `now`.

use chrono::NaiveDate;
use dayblocks_core::{BlockStatus, DayStats, TimeBlock, Time};

/// Aggregate the blocks scheduled on `date`.
///
/// Blocks from other days in `blocks` are ignored.
pub fn aggregate<'a, I>(date: NaiveDate, blocks: I, now: Time) -> DayStats
where
    I: IntoIterator<Item = &'a TimeBlock>,
{
    let mut stats = DayStats::default();

    for block in blocks.into_iter().filter(|b| b.scheduled_date() == date) {
        let duration = block.duration_minutes().max(0);
        stats.total_blocks += 1;
        stats.total_planned_minutes += duration;

        match block.status {
            BlockStatus::Completed => {
                stats.completed_blocks += 1;
                stats.completed_minutes += duration;
            }
            BlockStatus::Skipped => {
                stats.skipped_blocks += 1;
            }
            BlockStatus::InProgress => {
                stats.in_progress_blocks += 1;
                if block.is_currently_active(now) {
                    let partial = (block.current_progress(now) * duration as f64).floor() as i64;
                    stats.completed_minutes += partial.clamp(0, duration);
                }
            }
            BlockStatus::NotStarted => {}
        }
    }

    stats
}
