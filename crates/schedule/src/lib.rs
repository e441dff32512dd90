//! Schedule Management
//!
//! Creating, editing and transitioning time blocks against a store, with
//! conflict checks and serialized status changes.

#![warn(missing_docs)]

pub mod error;
pub mod manager;

pub use error::{ScheduleError, Result};
pub use manager::{BasicScheduleManager, BlockSpec, ScheduleConfig, ScheduleManager};
