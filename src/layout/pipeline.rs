//! End-to-end layout pipeline
//!
//! Runs every stage in order: validation, overlap detection, conflict
//! categorization, priority ranking, stacking, vertical refinement,
//! positioning, month boundary processing, and resolution. Each stage
//! consumes the previous stage's output by value or reference; nothing
//! is shared mutably across stages.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::{
    validate_tasks, ConflictAnalysis, ConflictCategorizer, OverlapAnalysis, OverlapDetector,
    PriorityRanker, PriorityRanking, Task, ValidationIssue,
};

use super::config::LayoutConfig;
use super::month_boundary::{MonthBoundaryEngine, MonthLayout};
use super::positioning::{PositionedLayout, PositioningEngine};
use super::resolution::{ConflictResolutionEngine, ResolutionReport};
use super::stacking::{SmartStackingEngine, StackingResult};
use super::vertical::{VerticalLayout, VerticalStackingEngine};

/// Output of every pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    /// Config and task validation issues; layout proceeds with the data
    /// as given, inverted ranges degrade to unit-duration bars
    pub issues: Vec<ValidationIssue>,

    /// Number of tasks laid out
    pub task_count: usize,

    pub overlaps: OverlapAnalysis,
    pub conflicts: ConflictAnalysis,
    pub ranking: PriorityRanking,
    pub stacking: StackingResult,
    pub vertical: VerticalLayout,
    pub positioned: PositionedLayout,
    pub months: MonthLayout,
    pub resolution: ResolutionReport,
}

impl LayoutReport {
    /// Returns true if any validation issue is an error
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == crate::domain::IssueSeverity::Error)
    }
}

/// Runs the full layout computation over a task set
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutPipeline;

impl LayoutPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Runs all stages and collects every intermediate result
    pub fn run(&self, tasks: &[Task], config: &LayoutConfig) -> LayoutReport {
        let mut config = config.clone();
        let mut issues = config.sanitize();

        issues.extend(validate_tasks(tasks));

        let detector = OverlapDetector::new()
            .with_precision(Duration::hours(config.overlap.precision_hours))
            .with_severity_cutoffs(
                config.overlap.high_severity_cutoff,
                config.overlap.medium_severity_cutoff,
            );
        let overlaps = detector.detect_overlaps(&tasks);
        let conflicts = ConflictCategorizer::new().categorize_conflicts(&overlaps, &tasks);

        let mut ranker = PriorityRanker::new();
        if let Some(start) = config.calendar_start {
            ranker = ranker.with_reference_date(start);
        }
        let ranking = ranker.rank_tasks(&tasks);

        let stacking = SmartStackingEngine::with_config(config.stacking.clone(), &config.grid)
            .stack_tasks(&overlaps, &ranking, &tasks);
        let vertical =
            VerticalStackingEngine::with_config(config.stacking.clone(), config.grid.clone())
                .stack_tasks_vertically(&stacking, &ranking, &tasks);

        let mut positioner =
            PositioningEngine::with_config(config.grid.clone(), config.positioning.clone());
        if let Some(start) = config.calendar_start {
            positioner = positioner.with_calendar_start(start);
        }
        let positioned = positioner.position_tasks(&vertical, &ranking, &tasks);

        let months = MonthBoundaryEngine::with_grid(config.grid.clone())
            .process_month_boundaries(&positioned, &tasks);

        let resolution =
            ConflictResolutionEngine::with_config(&config).resolve(&months, &ranking, &conflicts);

        LayoutReport {
            issues,
            task_count: tasks.len(),
            overlaps,
            conflicts,
            ranking,
            stacking,
            vertical,
            positioned,
            months,
            resolution,
        }
    }
}
