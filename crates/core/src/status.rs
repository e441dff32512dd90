//! Block status state machine.

use serde::{Deserialize, Serialize};
use crate::Time;

/// Lifecycle status of a time block.
///
/// ```text
/// NotStarted ──> InProgress ──> Completed
///     │              │
///     ├──────────────┴────────> Skipped
///     └───────────────────────> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockStatus {
    /// Scheduled, not yet begun
    #[default]
    NotStarted,
    /// Currently being worked on
    InProgress,
    /// Finished (terminal)
    Completed,
    /// Deliberately passed over (terminal)
    Skipped,
}

/// Transition rejected by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The target state is not reachable from the current one
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: BlockStatus,
        /// Requested status
        to: BlockStatus,
    },
}

impl BlockStatus {
    /// All states, in declaration order.
    pub const ALL: [BlockStatus; 4] = [
        BlockStatus::NotStarted,
        BlockStatus::InProgress,
        BlockStatus::Completed,
        BlockStatus::Skipped,
    ];

    /// States reachable from this one in a single step.
    pub fn available_transitions(self) -> &'static [BlockStatus] {
        match self {
            Self::NotStarted => &[Self::InProgress, Self::Completed, Self::Skipped],
            Self::InProgress => &[Self::Completed, Self::Skipped],
            Self::Completed => &[],
            Self::Skipped => &[],
        }
    }

    /// Whether any transition out of this state exists.
    pub fn can_transition(self) -> bool {
        match self {
            Self::NotStarted | Self::InProgress => true,
            Self::Completed | Self::Skipped => false,
        }
    }

    /// Whether `to` is a legal next state.
    pub fn can_transition_to(self, to: BlockStatus) -> bool {
        self.can_transition() && self.available_transitions().contains(&to)
    }

    /// Validate a transition, returning the target state on success.
    pub fn transition_to(self, to: BlockStatus) -> Result<BlockStatus, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError::InvalidTransition { from: self, to })
        }
    }

    /// Completed and skipped blocks never change again.
    pub fn is_terminal(self) -> bool {
        !self.can_transition()
    }

    /// Ordering weight for list display, higher first.
    pub fn sort_priority(self) -> u8 {
        match self {
            Self::InProgress => 3,
            Self::NotStarted => 2,
            Self::Completed => 1,
            Self::Skipped => 0,
        }
    }

    /// Human readable label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Skipped => "Skipped",
        }
    }

    /// Stable machine name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "notStarted",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "notstarted" | "pending" => Ok(Self::NotStarted),
            "inprogress" | "active" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Time-based automatic status.
///
/// A `NotStarted` block whose window contains `now` becomes `InProgress`.
/// Every other input is returned unchanged; terminal states are never
/// assigned here.
pub fn determine_status(start: Time, end: Time, current: BlockStatus, now: Time) -> BlockStatus {
    match current {
        BlockStatus::NotStarted if start <= now && now <= end => BlockStatus::InProgress,
        BlockStatus::NotStarted
        | BlockStatus::InProgress
        | BlockStatus::Completed
        | BlockStatus::Skipped => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, 11, h, m, 0).unwrap()
    }

    #[test]
    fn test_transition_table() {
        use BlockStatus::*;
        assert_eq!(NotStarted.available_transitions(), &[InProgress, Completed, Skipped]);
        assert_eq!(InProgress.available_transitions(), &[Completed, Skipped]);
        assert!(Completed.available_transitions().is_empty());
        assert!(Skipped.available_transitions().is_empty());

        assert!(NotStarted.can_transition());
        assert!(InProgress.can_transition());
        assert!(!Completed.can_transition());
        assert!(!Skipped.can_transition());
    }

    #[test]
    fn test_can_transition_to() {
        use BlockStatus::*;
        assert!(NotStarted.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Skipped));
        assert!(!InProgress.can_transition_to(NotStarted));
        assert!(!InProgress.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Skipped));
        assert!(!Skipped.can_transition_to(InProgress));
    }

    #[test]
    fn test_transition_to_reports_error() {
        let err = BlockStatus::Completed
            .transition_to(BlockStatus::InProgress)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: BlockStatus::Completed,
                to: BlockStatus::InProgress,
            }
        );
        assert_eq!(err.to_string(), "invalid status transition: completed -> inProgress");
    }

    #[test]
    fn test_determine_status_inside_window() {
        let status = determine_status(at(9, 0), at(9, 30), BlockStatus::NotStarted, at(9, 15));
        assert_eq!(status, BlockStatus::InProgress);
    }

    #[test]
    fn test_determine_status_window_bounds_inclusive() {
        assert_eq!(
            determine_status(at(9, 0), at(9, 30), BlockStatus::NotStarted, at(9, 0)),
            BlockStatus::InProgress
        );
        assert_eq!(
            determine_status(at(9, 0), at(9, 30), BlockStatus::NotStarted, at(9, 30)),
            BlockStatus::InProgress
        );
        assert_eq!(
            determine_status(at(9, 0), at(9, 30), BlockStatus::NotStarted, at(9, 31)),
            BlockStatus::NotStarted
        );
    }

    #[test]
    fn test_determine_status_never_assigns_terminal() {
        let times = [at(8, 0), at(9, 0), at(9, 15), at(9, 30), at(11, 0)];
        for current in BlockStatus::ALL {
            for now in times {
                let next = determine_status(at(9, 0), at(9, 30), current, now);
                if current.is_terminal() {
                    assert_eq!(next, current);
                } else {
                    assert!(!next.is_terminal(), "{:?} at {} became {:?}", current, now, next);
                }
            }
        }
    }

    #[test]
    fn test_sort_priority_order() {
        use BlockStatus::*;
        assert!(InProgress.sort_priority() > NotStarted.sort_priority());
        assert!(NotStarted.sort_priority() > Completed.sort_priority());
        assert!(Completed.sort_priority() > Skipped.sort_priority());
    }

    #[test]
    fn test_parse_and_serde_names() {
        assert_eq!("in-progress".parse::<BlockStatus>().unwrap(), BlockStatus::InProgress);
        assert_eq!("Done".parse::<BlockStatus>().unwrap(), BlockStatus::Completed);
        assert!("later".parse::<BlockStatus>().is_err());

        let json = serde_json::to_string(&BlockStatus::NotStarted).unwrap();
        assert_eq!(json, "\"notStarted\"");
        for status in BlockStatus::ALL {
            assert_eq!(status.as_str().parse::<BlockStatus>().unwrap(), status);
        }
    }
}
