//! Time block model - a scheduled interval of the day with a lifecycle status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::BlockId;
use crate::status::{determine_status, BlockStatus, TransitionError};
use crate::validation::{self, ValidationError};
use crate::Time;

/// A user-authored block of time on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    /// Unique identifier
    pub id: BlockId,

    /// Short title (1..=100 characters)
    pub title: String,

    /// Start of the interval
    pub start_time: Time,

    /// End of the interval, strictly after `start_time`
    pub end_time: Time,

    /// Lifecycle status; only changed through the state machine
    pub status: BlockStatus,

    /// Free-form notes (≤ 500 characters)
    pub notes: Option<String>,

    /// Category label (≤ 50 characters)
    pub category: Option<String>,

    /// Icon name, cosmetic
    pub icon: Option<String>,

    /// Color identifier, cosmetic
    pub color_id: Option<String>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

/// Partial field edit for a block.
///
/// `None` leaves a field untouched. For optional fields the inner `Option`
/// is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockEdit {
    /// New title
    pub title: Option<String>,
    /// New start time
    pub start_time: Option<Time>,
    /// New end time
    pub end_time: Option<Time>,
    /// New notes
    pub notes: Option<Option<String>>,
    /// New category
    pub category: Option<Option<String>>,
    /// New icon
    pub icon: Option<Option<String>>,
    /// New color
    pub color_id: Option<Option<String>>,
}

impl BlockEdit {
    /// Whether the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.notes.is_none()
            && self.category.is_none()
            && self.icon.is_none()
            && self.color_id.is_none()
    }
}

impl TimeBlock {
    /// Create a new block in the `NotStarted` state.
    ///
    /// No validation happens here; call [`TimeBlock::validation_errors`]
    /// before persisting.
    pub fn new(title: impl Into<String>, start_time: Time, end_time: Time) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: BlockId::new(),
            title: title.into(),
            start_time,
            end_time,
            status: BlockStatus::NotStarted,
            notes: None,
            category: None,
            icon: None,
            color_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set color.
    pub fn with_color(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }

    /// Whole minutes between start and end.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Calendar day the block belongs to (UTC day of `start_time`).
    pub fn scheduled_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    // === Status ===

    /// Apply a status change if the state machine allows it.
    ///
    /// Illegal transitions are ignored and `false` is returned. Use
    /// [`TimeBlock::try_update_status`] to get the reason.
    pub fn update_status(&mut self, to: BlockStatus) -> bool {
        self.try_update_status(to, chrono::Utc::now()).is_ok()
    }

    /// Apply a status change, stamping `updated_at` with `at`.
    pub fn try_update_status(&mut self, to: BlockStatus, at: Time) -> Result<(), TransitionError> {
        self.status = self.status.transition_to(to)?;
        self.updated_at = at;
        Ok(())
    }

    /// Begin the block.
    pub fn start(&mut self) -> bool {
        self.update_status(BlockStatus::InProgress)
    }

    /// Mark the block as done.
    pub fn mark_completed(&mut self) -> bool {
        self.update_status(BlockStatus::Completed)
    }

    /// Mark the block as skipped.
    pub fn mark_skipped(&mut self) -> bool {
        self.update_status(BlockStatus::Skipped)
    }

    /// Move a `NotStarted` block to `InProgress` once its window opens.
    ///
    /// Returns true if the status changed.
    pub fn update_status_based_on_time(&mut self, now: Time) -> bool {
        let next = determine_status(self.start_time, self.end_time, self.status, now);
        if next == self.status {
            return false;
        }
        self.try_update_status(next, now).is_ok()
    }

    // === Time-derived properties ===

    /// Whether `now` falls inside `[start_time, end_time]`.
    pub fn is_currently_active(&self, now: Time) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    /// Elapsed fraction of the block in `[0, 1]`; zero outside the window.
    pub fn current_progress(&self, now: Time) -> f64 {
        if !self.is_currently_active(now) {
            return 0.0;
        }
        let total = (self.end_time - self.start_time).num_milliseconds() as f64;
        if total <= 0.0 {
            return 0.0;
        }
        let elapsed = (now - self.start_time).num_milliseconds() as f64;
        (elapsed / total).clamp(0.0, 1.0)
    }

    /// Minutes left in the block, or `None` outside the window.
    pub fn remaining_minutes(&self, now: Time) -> Option<i64> {
        if !self.is_currently_active(now) {
            return None;
        }
        Some((self.end_time - now).num_minutes().max(0))
    }

    // === Rules ===

    /// Whether the two blocks overlap on the same calendar day.
    ///
    /// A block never conflicts with itself (same id).
    pub fn conflicts_with(&self, other: &TimeBlock) -> bool {
        self.id != other.id
            && self.scheduled_date() == other.scheduled_date()
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }

    /// The subset of `others` that conflicts with this block.
    pub fn conflicts_in<'a>(&self, others: &'a [TimeBlock]) -> Vec<&'a TimeBlock> {
        others.iter().filter(|o| self.conflicts_with(o)).collect()
    }

    /// Every invariant this block currently violates.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        validation::validate(self)
    }

    /// Whether [`TimeBlock::validation_errors`] is empty.
    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Apply a field edit and stamp `updated_at`.
    ///
    /// The edit is applied as-is; validate afterwards.
    pub fn apply_edit(&mut self, edit: BlockEdit, at: Time) {
        if edit.is_empty() {
            return;
        }
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(start) = edit.start_time {
            self.start_time = start;
        }
        if let Some(end) = edit.end_time {
            self.end_time = end;
        }
        if let Some(notes) = edit.notes {
            self.notes = notes;
        }
        if let Some(category) = edit.category {
            self.category = category;
        }
        if let Some(icon) = edit.icon {
            self.icon = icon;
        }
        if let Some(color_id) = edit.color_id {
            self.color_id = color_id;
        }
        self.updated_at = at;
    }
}

/// Order blocks for a day view: by start time, then status priority
/// (active first), then title.
pub fn sort_for_display(blocks: &mut [TimeBlock]) {
    blocks.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| b.status.sort_priority().cmp(&a.status.sort_priority()))
            .then_with(|| a.title.cmp(&b.title))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(h: u32, m: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, 11, h, m, 0).unwrap()
    }

    fn block(start: Time, end: Time) -> TimeBlock {
        TimeBlock::new("Focus", start, end)
    }

    #[test]
    fn test_new_block_defaults() {
        let b = block(at(9, 0), at(9, 30));
        assert_eq!(b.status, BlockStatus::NotStarted);
        assert_eq!(b.duration_minutes(), 30);
        assert_eq!(b.scheduled_date(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert!(b.is_valid());
    }

    #[test]
    fn test_update_status_follows_state_machine() {
        let mut b = block(at(9, 0), at(9, 30));
        assert!(b.start());
        assert_eq!(b.status, BlockStatus::InProgress);
        assert!(b.mark_completed());
        assert_eq!(b.status, BlockStatus::Completed);

        // Terminal: every further change is a no-op.
        assert!(!b.mark_skipped());
        assert!(!b.start());
        assert_eq!(b.status, BlockStatus::Completed);
    }

    #[test]
    fn test_try_update_status_reports_invalid_transition() {
        let mut b = block(at(9, 0), at(9, 30));
        b.try_update_status(BlockStatus::Skipped, at(9, 5)).unwrap();
        assert_eq!(b.updated_at, at(9, 5));

        let err = b.try_update_status(BlockStatus::InProgress, at(9, 10)).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: BlockStatus::Skipped,
                to: BlockStatus::InProgress,
            }
        );
        assert_eq!(b.updated_at, at(9, 5));
    }

    #[test]
    fn test_update_status_based_on_time() {
        let mut b = block(at(9, 0), at(9, 30));
        assert!(!b.update_status_based_on_time(at(8, 59)));
        assert_eq!(b.status, BlockStatus::NotStarted);

        assert!(b.update_status_based_on_time(at(9, 15)));
        assert_eq!(b.status, BlockStatus::InProgress);
        assert_eq!(b.updated_at, at(9, 15));

        // Already in progress: nothing to do.
        assert!(!b.update_status_based_on_time(at(9, 20)));
    }

    #[test]
    fn test_time_based_update_leaves_terminal_alone() {
        let mut b = block(at(9, 0), at(9, 30));
        b.mark_skipped();
        assert!(!b.update_status_based_on_time(at(9, 15)));
        assert_eq!(b.status, BlockStatus::Skipped);
    }

    #[test]
    fn test_progress_and_remaining() {
        let b = block(at(9, 0), at(10, 0));
        assert_eq!(b.current_progress(at(8, 0)), 0.0);
        assert_eq!(b.remaining_minutes(at(8, 0)), None);

        assert!((b.current_progress(at(9, 15)) - 0.25).abs() < 1e-9);
        assert_eq!(b.remaining_minutes(at(9, 15)), Some(45));

        assert_eq!(b.current_progress(at(10, 0)), 1.0);
        assert_eq!(b.remaining_minutes(at(10, 0)), Some(0));

        assert_eq!(b.current_progress(at(10, 1)), 0.0);
    }

    #[test]
    fn test_conflicts_symmetric_and_irreflexive() {
        let a = block(at(9, 0), at(10, 0));
        let b = block(at(9, 30), at(10, 30));
        let c = block(at(10, 0), at(11, 0));

        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
        // Touching intervals do not overlap.
        assert!(!a.conflicts_with(&c));
        assert!(!c.conflicts_with(&a));
        assert!(!a.conflicts_with(&a));
        assert!(!a.conflicts_with(&a.clone()));
    }

    #[test]
    fn test_conflicts_require_same_calendar_day() {
        // 23:00-01:00 spills into the next day but belongs to the 11th.
        let late = block(at(23, 0), at(23, 0) + Duration::hours(2));
        let next_day_start = Utc.with_ymd_and_hms(2024, 3, 12, 0, 0, 0).unwrap();
        let early = block(next_day_start, next_day_start + Duration::minutes(30));

        assert!(!late.conflicts_with(&early));
        assert!(!early.conflicts_with(&late));
    }

    #[test]
    fn test_conflicts_in_filters() {
        let a = block(at(9, 0), at(10, 0));
        let others = vec![
            a.clone(),
            block(at(9, 45), at(10, 15)),
            block(at(12, 0), at(13, 0)),
        ];
        let hits = a.conflicts_in(&others);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, others[1].id);
    }

    #[test]
    fn test_apply_edit_bumps_updated_at() {
        let mut b = block(at(9, 0), at(9, 30)).with_notes("draft");
        b.apply_edit(
            BlockEdit {
                title: Some("Review".into()),
                end_time: Some(at(10, 0)),
                notes: Some(None),
                ..Default::default()
            },
            at(8, 0),
        );
        assert_eq!(b.title, "Review");
        assert_eq!(b.duration_minutes(), 60);
        assert_eq!(b.notes, None);
        assert_eq!(b.updated_at, at(8, 0));
        assert_eq!(b.status, BlockStatus::NotStarted);
    }

    #[test]
    fn test_empty_edit_is_noop() {
        let mut b = block(at(9, 0), at(9, 30));
        let before = b.updated_at;
        b.apply_edit(BlockEdit::default(), at(8, 0));
        assert_eq!(b.updated_at, before);
    }

    #[test]
    fn test_sort_for_display() {
        let mut done = block(at(9, 0), at(9, 30));
        done.title = "A".into();
        done.mark_completed();
        let mut active = block(at(9, 0), at(9, 30));
        active.title = "B".into();
        active.start();
        let later = block(at(8, 0), at(8, 30));

        let mut blocks = vec![done.clone(), later.clone(), active.clone()];
        sort_for_display(&mut blocks);
        let ids: Vec<_> = blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![later.id, active.id, done.id]);
    }
}
