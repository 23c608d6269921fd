//! Domain models for calgrid
//!
//! Contains the core analysis logic without any I/O concerns: tasks,
//! overlap detection, conflict categorization, priority ranking, and the
//! dependency graph.

mod task;
mod validation;
mod graph;
mod overlap;
mod conflict;
mod priority;

pub use task::{Task, TaskCategory};
pub use validation::{validate_tasks, IssueSeverity, ValidationIssue};
pub use graph::{DependencyGraph, GraphError};
pub use overlap::{
    ConflictInfo, OverlapAnalysis, OverlapDetector, OverlapGroup, OverlapType, Severity,
    TaskOverlap,
};
pub use conflict::{
    AssessmentLevel, CategorizedConflict, ConflictAnalysis, ConflictCategorizer, ConflictCategory,
    ConflictRule, Resolution, RuleCondition, UrgencyLevel,
};
pub use priority::{
    PriorityFactor, PriorityRanker, PriorityRanking, TaskPriority, VisualProminence, VisualStyle,
};
