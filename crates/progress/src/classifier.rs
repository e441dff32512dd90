//! Performance classification and advisory copy.

use dayblocks_core::DayStats;
use serde::{Deserialize, Serialize};

/// Qualitative tier derived from a day's completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceTier {
    /// 90% and above
    Excellent,
    /// 70% to 90%
    Good,
    /// 50% to 70%
    Fair,
    /// 20% to 50%
    Poor,
    /// Below 20%, or nothing to measure
    None,
}

impl PerformanceTier {
    /// Headline for the tier.
    pub fn title(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent Day!",
            Self::Good => "Good Progress",
            Self::Fair => "Fair Effort",
            Self::Poor => "Room to Improve",
            Self::None => "Just Getting Started",
        }
    }

    /// Fixed advisory message for the tier.
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "You completed nearly everything you planned. Outstanding focus.",
            Self::Good => "You got through most of your plan. Keep the momentum going.",
            Self::Fair => "About half of the plan is done. Small adjustments can make a big difference.",
            Self::Poor => "Today was a struggle. Consider a lighter, more realistic schedule.",
            Self::None => "Every day is a new chance. Start with one small block.",
        }
    }

    /// Short symbol for compact displays.
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Excellent => "🌟",
            Self::Good => "👍",
            Self::Fair => "🙂",
            Self::Poor => "💪",
            Self::None => "🌱",
        }
    }

    /// Stable machine name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a completion percentage in `[0, 1]` to a tier.
pub fn classify(completion_percentage: f64) -> PerformanceTier {
    let p = completion_percentage;
    if p >= 0.9 {
        PerformanceTier::Excellent
    } else if p >= 0.7 {
        PerformanceTier::Good
    } else if p >= 0.5 {
        PerformanceTier::Fair
    } else if p >= 0.2 {
        PerformanceTier::Poor
    } else {
        PerformanceTier::None
    }
}

/// Rule-based advice for the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Suggestion {
    /// Many blocks were skipped
    ShorterBlocks,
    /// Low completion on a crowded day
    FewerBlocks,
    /// Blocks were left in progress
    RememberToComplete,
    /// Nothing specific to fix
    KeepGoing,
}

impl Suggestion {
    /// Advisory text.
    pub fn message(self) -> &'static str {
        match self {
            Self::ShorterBlocks => "You skipped quite a few blocks. Try scheduling shorter blocks.",
            Self::FewerBlocks => "Consider scheduling fewer blocks so the plan stays achievable.",
            Self::RememberToComplete => "Remember to mark blocks as completed when you finish them.",
            Self::KeepGoing => "Keep it up! Consistency builds great habits.",
        }
    }
}

/// Skip rate above which shorter blocks are suggested.
pub const HIGH_SKIP_RATE: f64 = 0.3;
/// Block count above which a low-completion day is "crowded".
pub const CROWDED_DAY_BLOCKS: usize = 6;

/// All matching suggestions for the day, in rule order.
///
/// Rules are independent; [`Suggestion::KeepGoing`] is returned only when
/// no other rule matches.
pub fn suggestions(stats: &DayStats) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if stats.skip_rate() > HIGH_SKIP_RATE {
        out.push(Suggestion::ShorterBlocks);
    }
    if stats.completion_percentage() < 0.5 && stats.total_blocks > CROWDED_DAY_BLOCKS {
        out.push(Suggestion::FewerBlocks);
    }
    if stats.in_progress_blocks > stats.completed_blocks && stats.is_day_complete() {
        out.push(Suggestion::RememberToComplete);
    }
    if out.is_empty() {
        out.push(Suggestion::KeepGoing);
    }

    out
}

/// Everything a summary view needs about a day's performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Tier from the completion percentage
    pub tier: PerformanceTier,
    /// Completion percentage in `[0, 1]`
    pub completion_percentage: f64,
    /// Weighted score in `[0, 1]`
    pub score: f64,
    /// Matching suggestions
    pub suggestions: Vec<Suggestion>,
}

/// Build the report for a day's stats.
pub fn report(stats: &DayStats) -> PerformanceReport {
    let completion_percentage = stats.completion_percentage();
    PerformanceReport {
        tier: classify(completion_percentage),
        completion_percentage,
        score: stats.performance_score(),
        suggestions: suggestions(stats),
    }
}
