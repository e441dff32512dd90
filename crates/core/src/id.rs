//! Unique identifiers for Dayblocks entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a TimeBlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Ulid);

impl BlockId {
    /// Generate a new BlockId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for BlockId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a DailyProgress record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressId(Ulid);

impl ProgressId {
    /// Generate a new ProgressId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ProgressId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProgressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
