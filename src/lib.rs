//! calgrid - A calendar layout engine that resolves task conflicts
//!
//! calgrid analyzes date-ranged tasks for overlaps, categorizes the
//! resulting conflicts, ranks tasks by priority, and lays them out on a
//! 2-D calendar grid: stacked, positioned, split at month boundaries, and
//! reconciled by a conflict resolution pass.

pub mod domain;
pub mod layout;
pub mod storage;
pub mod cli;

pub use domain::{Task, TaskCategory, OverlapAnalysis, PriorityRanking, Severity};
pub use layout::{LayoutConfig, LayoutPipeline, ResolutionReport};
