//! Conflict and overflow resolution
//!
//! The last layout stage. Detects four kinds of overflow against the
//! configured thresholds, runs an ordered list of repair actions per kind
//! until one succeeds, maps categorized conflicts to layout-level advice,
//! and picks an overall layout strategy from the task count.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{CategorizedConflict, ConflictAnalysis, ConflictCategory, PriorityRanking, UrgencyLevel, VisualProminence};

use super::config::{GridConfig, LayoutConfig, ResolutionConfig, StackingConfig};
use super::geometry::TaskBar;
use super::month_boundary::MonthLayout;

/// The four ways a layout can exceed its space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowKind {
    Vertical,
    Horizontal,
    Area,
    Density,
}

impl OverflowKind {
    pub fn label(&self) -> &'static str {
        match self {
            OverflowKind::Vertical => "vertical",
            OverflowKind::Horizontal => "horizontal",
            OverflowKind::Area => "area",
            OverflowKind::Density => "density",
        }
    }
}

/// A detected overflow with its measured fill level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowIssue {
    pub kind: OverflowKind,

    /// Measured fill level that crossed the threshold
    pub measure: f64,
    pub threshold: f64,
    pub description: String,
}

/// Repair actions, tried in order until one succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    CompressHeights,
    RestackCompact,
    CollapseMinimalTasks,
    IncreaseSpacingTolerance,
    TruncateLabels,
}

impl ResolutionAction {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionAction::CompressHeights => "compress heights",
            ResolutionAction::RestackCompact => "restack compact",
            ResolutionAction::CollapseMinimalTasks => "collapse minimal tasks",
            ResolutionAction::IncreaseSpacingTolerance => "increase spacing tolerance",
            ResolutionAction::TruncateLabels => "truncate labels",
        }
    }
}

/// Record of one attempted repair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedResolution {
    pub kind: OverflowKind,
    pub action: ResolutionAction,
    pub succeeded: bool,
    pub description: String,
}

/// Overall rendering strategy, chosen from the task count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Every task gets its own stacked bar
    Stack,
    /// Bars cascade with slight offsets
    Cascade,
    /// Low-prominence bars collapse to minimal height
    Collapse,
}

impl LayoutStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            LayoutStrategy::Stack => "stack",
            LayoutStrategy::Cascade => "cascade",
            LayoutStrategy::Collapse => "collapse",
        }
    }
}

/// Layout-level advice for one categorized conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictAdvice {
    pub task1_id: String,
    pub task2_id: String,
    pub category: ConflictCategory,
    pub urgency: UrgencyLevel,
    pub action: String,
}

/// Result of the resolution stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Bars after repair actions were applied
    pub bars: Vec<TaskBar>,

    pub strategy: Option<LayoutStrategy>,
    pub overflows: Vec<OverflowIssue>,
    pub applied: Vec<AppliedResolution>,
    pub conflict_advice: Vec<ConflictAdvice>,

    /// Always non-empty after `resolve`
    pub recommendations: Vec<String>,
}

impl ResolutionReport {
    /// Returns true if every detected overflow was repaired
    pub fn all_overflows_resolved(&self) -> bool {
        self.overflows.iter().all(|issue| {
            self.applied
                .iter()
                .any(|a| a.kind == issue.kind && a.succeeded)
        })
    }
}

type ConflictResolver = fn(&CategorizedConflict) -> String;

/// Detects overflow and produces repaired bars plus advice
#[derive(Debug, Clone)]
pub struct ConflictResolutionEngine {
    grid: GridConfig,
    stacking: StackingConfig,
    config: ResolutionConfig,

    /// Calendar window width in days; horizontal overflow needs a bound
    window_days: Option<i64>,

    resolvers: HashMap<ConflictCategory, ConflictResolver>,
}

impl Default for ConflictResolutionEngine {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            stacking: StackingConfig::default(),
            config: ResolutionConfig::default(),
            window_days: None,
            resolvers: default_resolvers(),
        }
    }
}

impl ConflictResolutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &LayoutConfig) -> Self {
        let window_days = match (config.calendar_start, config.calendar_end) {
            (Some(start), Some(end)) => Some((end - start).num_days() + 1),
            _ => None,
        };
        Self {
            grid: config.grid.clone(),
            stacking: config.stacking.clone(),
            config: config.resolution.clone(),
            window_days,
            resolvers: default_resolvers(),
        }
    }

    /// Registers a resolver for a conflict category, replacing any default
    pub fn set_resolver(&mut self, category: ConflictCategory, resolver: ConflictResolver) {
        self.resolvers.insert(category, resolver);
    }

    /// Runs overflow detection, repair, and conflict advice
    pub fn resolve(
        &self,
        layout: &MonthLayout,
        ranking: &PriorityRanking,
        analysis: &ConflictAnalysis,
    ) -> ResolutionReport {
        let mut bars = layout.bars.clone();
        let strategy = self.choose_strategy(ranking.priorities.len());

        let overflows = self.detect_overflows(&bars);
        let mut applied = Vec::new();

        for issue in &overflows {
            for action in strategies_for(issue.kind) {
                let succeeded = self.apply_action(action, issue.kind, &mut bars, ranking);
                applied.push(AppliedResolution {
                    kind: issue.kind,
                    action,
                    succeeded,
                    description: format!(
                        "{} overflow: {} {}",
                        issue.kind.label(),
                        action.label(),
                        if succeeded { "succeeded" } else { "was not enough" },
                    ),
                });
                if succeeded {
                    break;
                }
            }
        }

        let conflict_advice = self.advise(analysis);
        let recommendations =
            self.recommendations(strategy, &overflows, &applied, &conflict_advice, ranking);

        ResolutionReport {
            bars,
            strategy,
            overflows,
            applied,
            conflict_advice,
            recommendations,
        }
    }

    fn choose_strategy(&self, task_count: usize) -> Option<LayoutStrategy> {
        if task_count == 0 {
            return None;
        }
        Some(if task_count <= self.config.stack_strategy_max_tasks {
            LayoutStrategy::Stack
        } else if task_count <= self.config.cascade_strategy_max_tasks {
            LayoutStrategy::Cascade
        } else {
            LayoutStrategy::Collapse
        })
    }

    fn detect_overflows(&self, bars: &[TaskBar]) -> Vec<OverflowIssue> {
        let mut issues = Vec::new();
        if bars.is_empty() {
            return issues;
        }

        let vertical = self.vertical_fill(bars);
        if vertical > self.config.vertical_overflow_threshold {
            issues.push(OverflowIssue {
                kind: OverflowKind::Vertical,
                measure: vertical,
                threshold: self.config.vertical_overflow_threshold,
                description: format!("bars fill {:.0}% of the vertical space", vertical * 100.0),
            });
        }

        if let Some(horizontal) = self.horizontal_fill(bars) {
            if horizontal > self.config.horizontal_overflow_threshold {
                issues.push(OverflowIssue {
                    kind: OverflowKind::Horizontal,
                    measure: horizontal,
                    threshold: self.config.horizontal_overflow_threshold,
                    description: format!(
                        "bars fill {:.0}% of the calendar width",
                        horizontal * 100.0
                    ),
                });
            }
        }

        let area = self.area_fill(bars);
        if area > self.config.area_overflow_threshold {
            issues.push(OverflowIssue {
                kind: OverflowKind::Area,
                measure: area,
                threshold: self.config.area_overflow_threshold,
                description: format!("bars cover {:.0}% of the layout area", area * 100.0),
            });
        }

        let density = self.column_density(bars);
        if density > self.config.density_overflow_threshold {
            issues.push(OverflowIssue {
                kind: OverflowKind::Density,
                measure: density,
                threshold: self.config.density_overflow_threshold,
                description: format!(
                    "{:.0}% of day columns hold more than one bar",
                    density * 100.0
                ),
            });
        }

        issues
    }

    /// Highest bar bottom relative to the available height
    fn vertical_fill(&self, bars: &[TaskBar]) -> f64 {
        let max_bottom = bars.iter().map(|b| b.y + b.height).fold(0.0, f64::max);
        max_bottom / self.grid.available_height
    }

    /// Rightmost bar edge relative to the calendar window; `None` without
    /// a configured window, an unbounded canvas cannot overflow
    fn horizontal_fill(&self, bars: &[TaskBar]) -> Option<f64> {
        let days = self.window_days?;
        let width = days as f64 * self.grid.day_width;
        if width <= 0.0 {
            return None;
        }
        let max_x = bars.iter().map(|b| b.end_x).fold(0.0, f64::max);
        Some(max_x / width)
    }

    /// Total bar area over the bounding canvas area
    fn area_fill(&self, bars: &[TaskBar]) -> f64 {
        let width = match self.window_days {
            Some(days) => days as f64 * self.grid.day_width,
            None => bars.iter().map(|b| b.end_x).fold(0.0, f64::max),
        };
        let canvas = width * self.grid.available_height;
        if canvas <= 0.0 {
            return 0.0;
        }
        let used: f64 = bars.iter().map(|b| b.area()).sum();
        (used / canvas).min(1.0)
    }

    /// Fraction of occupied day columns holding more than one bar
    fn column_density(&self, bars: &[TaskBar]) -> f64 {
        let max_x = bars.iter().map(|b| b.end_x).fold(0.0, f64::max);
        let columns = (max_x / self.grid.day_width).ceil() as usize;
        if columns == 0 {
            return 0.0;
        }

        let mut counts = vec![0usize; columns];
        for bar in bars {
            let c0 = (bar.start_x / self.grid.day_width).floor().max(0.0) as usize;
            let c1 = ((bar.end_x / self.grid.day_width).ceil() as usize).min(columns);
            for count in counts.iter_mut().take(c1).skip(c0) {
                *count += 1;
            }
        }

        let occupied = counts.iter().filter(|c| **c > 0).count();
        if occupied == 0 {
            return 0.0;
        }
        let crowded = counts.iter().filter(|c| **c > 1).count();
        crowded as f64 / occupied as f64
    }

    fn apply_action(
        &self,
        action: ResolutionAction,
        kind: OverflowKind,
        bars: &mut [TaskBar],
        ranking: &PriorityRanking,
    ) -> bool {
        match action {
            ResolutionAction::CompressHeights => {
                let target = self.grid.available_height * self.config.vertical_overflow_threshold;
                let current = bars.iter().map(|b| b.y + b.height).fold(0.0, f64::max);
                if current <= target {
                    return true;
                }
                let scale = target / current;
                for bar in bars.iter_mut() {
                    bar.y *= scale;
                    bar.height = (bar.height * scale).max(self.stacking.min_height);
                }
            }
            ResolutionAction::RestackCompact => {
                // Re-pack each row from the top with minimal spacing
                let mut order: Vec<usize> = (0..bars.len()).collect();
                order.sort_by(|a, b| {
                    bars[*a]
                        .row
                        .cmp(&bars[*b].row)
                        .then(bars[*a].y.partial_cmp(&bars[*b].y).unwrap_or(std::cmp::Ordering::Equal))
                });
                let mut cursor: HashMap<usize, f64> = HashMap::new();
                for index in order {
                    let row = bars[index].row;
                    let y = cursor.entry(row).or_insert(0.0);
                    bars[index].y = *y;
                    *y += bars[index].height + self.stacking.vertical_spacing;
                }
            }
            ResolutionAction::CollapseMinimalTasks => {
                for bar in bars.iter_mut() {
                    let prominence = ranking
                        .for_task(&bar.task_id)
                        .map(|p| p.prominence)
                        .unwrap_or(VisualProminence::Minimal);
                    if prominence <= VisualProminence::Low {
                        bar.height = self.stacking.min_height;
                    }
                }
            }
            // Rendering-level tolerances, nothing to re-measure
            ResolutionAction::IncreaseSpacingTolerance | ResolutionAction::TruncateLabels => {
                return true;
            }
        }

        self.measure(kind, bars)
            .map(|m| m <= self.threshold(kind))
            .unwrap_or(true)
    }

    fn measure(&self, kind: OverflowKind, bars: &[TaskBar]) -> Option<f64> {
        match kind {
            OverflowKind::Vertical => Some(self.vertical_fill(bars)),
            OverflowKind::Horizontal => self.horizontal_fill(bars),
            OverflowKind::Area => Some(self.area_fill(bars)),
            OverflowKind::Density => Some(self.column_density(bars)),
        }
    }

    fn threshold(&self, kind: OverflowKind) -> f64 {
        match kind {
            OverflowKind::Vertical => self.config.vertical_overflow_threshold,
            OverflowKind::Horizontal => self.config.horizontal_overflow_threshold,
            OverflowKind::Area => self.config.area_overflow_threshold,
            OverflowKind::Density => self.config.density_overflow_threshold,
        }
    }

    /// Maps each conflict through the resolver table
    fn advise(&self, analysis: &ConflictAnalysis) -> Vec<ConflictAdvice> {
        analysis
            .conflicts
            .iter()
            .map(|conflict| {
                let resolver = self
                    .resolvers
                    .get(&conflict.category)
                    .copied()
                    .unwrap_or(default_advice);
                ConflictAdvice {
                    task1_id: conflict.overlap.task1_id.clone(),
                    task2_id: conflict.overlap.task2_id.clone(),
                    category: conflict.category,
                    urgency: conflict.urgency,
                    action: resolver(conflict),
                }
            })
            .collect()
    }

    fn recommendations(
        &self,
        strategy: Option<LayoutStrategy>,
        overflows: &[OverflowIssue],
        applied: &[AppliedResolution],
        advice: &[ConflictAdvice],
        ranking: &PriorityRanking,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if overflows.is_empty() && advice.is_empty() {
            recommendations
                .push("Layout is clean: no overflow or scheduling conflicts detected".to_string());
        }

        if let Some(strategy) = strategy {
            recommendations.push(format!(
                "Using the {} layout strategy for {} tasks",
                strategy.label(),
                ranking.priorities.len(),
            ));
        }

        for issue in overflows {
            let repaired = applied.iter().any(|a| a.kind == issue.kind && a.succeeded);
            if repaired {
                recommendations.push(format!("Repaired {} overflow", issue.kind.label()));
            } else {
                recommendations.push(format!(
                    "Could not fully repair {} overflow; consider a wider calendar window",
                    issue.kind.label()
                ));
            }
        }

        let urgent = advice
            .iter()
            .filter(|a| a.urgency == UrgencyLevel::Urgent)
            .count();
        if urgent > 0 {
            recommendations.push(format!(
                "{} conflict(s) need urgent attention before this schedule is workable",
                urgent
            ));
        }

        if recommendations.is_empty() {
            recommendations
                .push("Layout is clean: no overflow or scheduling conflicts detected".to_string());
        }

        recommendations
    }
}

/// Ordered repair actions per overflow kind, first success wins
fn strategies_for(kind: OverflowKind) -> Vec<ResolutionAction> {
    match kind {
        OverflowKind::Vertical => vec![
            ResolutionAction::CompressHeights,
            ResolutionAction::RestackCompact,
            ResolutionAction::CollapseMinimalTasks,
        ],
        OverflowKind::Horizontal => vec![
            ResolutionAction::IncreaseSpacingTolerance,
            ResolutionAction::TruncateLabels,
        ],
        OverflowKind::Area => vec![
            ResolutionAction::CompressHeights,
            ResolutionAction::CollapseMinimalTasks,
            ResolutionAction::TruncateLabels,
        ],
        OverflowKind::Density => vec![
            ResolutionAction::RestackCompact,
            ResolutionAction::IncreaseSpacingTolerance,
            ResolutionAction::CollapseMinimalTasks,
        ],
    }
}

fn default_resolvers() -> HashMap<ConflictCategory, ConflictResolver> {
    let mut map: HashMap<ConflictCategory, ConflictResolver> = HashMap::new();
    map.insert(ConflictCategory::ScheduleConflict, |c| {
        format!(
            "Reschedule '{}' or '{}' to clear the critical overlap",
            c.overlap.task1_id, c.overlap.task2_id
        )
    });
    map.insert(ConflictCategory::MilestoneConflict, |c| {
        format!(
            "Protect the milestone; move the other task away from '{}'",
            c.overlap.task1_id
        )
    });
    map.insert(ConflictCategory::AssigneeConflict, |_| {
        "Reassign one task or serialize the shared assignee's work".to_string()
    });
    map.insert(ConflictCategory::PriorityConflict, |_| {
        "Escalate: two high-priority tasks compete for the same window".to_string()
    });
    map.insert(ConflictCategory::TimelineConflict, |c| {
        format!(
            "Fold '{}' into '{}' as a subtask or adjust its dates",
            c.overlap.task2_id, c.overlap.task1_id
        )
    });
    map.insert(ConflictCategory::CategoryConflict, |_| {
        "Batch the related work or stagger the start dates".to_string()
    });
    map
}

fn default_advice(conflict: &CategorizedConflict) -> String {
    format!(
        "Review the schedule for '{}' and '{}'",
        conflict.overlap.task1_id, conflict.overlap.task2_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConflictCategorizer, OverlapDetector, PriorityRanker, Task};
    use crate::layout::month_boundary::MonthBoundaryEngine;
    use crate::layout::positioning::PositioningEngine;
    use crate::layout::stacking::SmartStackingEngine;
    use crate::layout::vertical::VerticalStackingEngine;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()
    }

    fn make_task(seq: u32, start: u32, end: u32) -> Task {
        Task::new(format!("task-{}", seq), format!("Task {}", seq), day(start), day(end))
    }

    fn run_pipeline(tasks: &[Task]) -> (MonthLayout, PriorityRanking, ConflictAnalysis) {
        let analysis = OverlapDetector::new().detect_overlaps(tasks);
        let conflicts = ConflictCategorizer::new().categorize_conflicts(&analysis, tasks);
        let ranking = PriorityRanker::new().with_reference_date(day(1)).rank_tasks(tasks);
        let stacking = SmartStackingEngine::new().stack_tasks(&analysis, &ranking, tasks);
        let vertical = VerticalStackingEngine::new().stack_tasks_vertically(&stacking, &ranking, tasks);
        let positioned = PositioningEngine::new()
            .with_calendar_start(day(1))
            .position_tasks(&vertical, &ranking, tasks);
        let month = MonthBoundaryEngine::new().process_month_boundaries(&positioned, tasks);
        (month, ranking, conflicts)
    }

    #[test]
    fn clean_layout_reports_positive_recommendation() {
        let tasks = vec![make_task(1, 1, 3), make_task(2, 10, 12)];
        let (month, ranking, conflicts) = run_pipeline(&tasks);

        let report = ConflictResolutionEngine::new().resolve(&month, &ranking, &conflicts);

        assert!(report.overflows.is_empty());
        assert!(!report.recommendations.is_empty());
        assert!(report.recommendations[0].contains("clean"));
    }

    #[test]
    fn strategy_follows_task_count() {
        let engine = ConflictResolutionEngine::new();
        assert_eq!(engine.choose_strategy(3), Some(LayoutStrategy::Stack));
        assert_eq!(engine.choose_strategy(5), Some(LayoutStrategy::Stack));
        assert_eq!(engine.choose_strategy(7), Some(LayoutStrategy::Cascade));
        assert_eq!(engine.choose_strategy(10), Some(LayoutStrategy::Cascade));
        assert_eq!(engine.choose_strategy(25), Some(LayoutStrategy::Collapse));
        assert_eq!(engine.choose_strategy(0), None);
    }

    #[test]
    fn vertical_overflow_is_detected_and_repaired() {
        let mut month = MonthLayout::default();
        for i in 0..10 {
            let mut bar = TaskBar::new(format!("task-{}", i), 0.0, 100.0);
            bar.y = i as f64 * 30.0;
            bar.height = 25.0;
            month.bars.push(bar);
        }
        let ranking = PriorityRanking::default();
        let conflicts = ConflictAnalysis::default();

        let report = ConflictResolutionEngine::new().resolve(&month, &ranking, &conflicts);

        assert!(report
            .overflows
            .iter()
            .any(|i| i.kind == OverflowKind::Vertical));
        assert!(report
            .applied
            .iter()
            .any(|a| a.action == ResolutionAction::CompressHeights && a.succeeded));

        let engine = ConflictResolutionEngine::new();
        assert!(engine.vertical_fill(&report.bars) <= 0.8 + 1e-9);
    }

    #[test]
    fn density_overflow_on_crowded_days() {
        let tasks: Vec<Task> = (0..6).map(|i| make_task(i, 5, 10)).collect();
        let (month, ranking, conflicts) = run_pipeline(&tasks);

        let report = ConflictResolutionEngine::new().resolve(&month, &ranking, &conflicts);
        assert!(report
            .overflows
            .iter()
            .any(|i| i.kind == OverflowKind::Density));
    }

    #[test]
    fn conflicts_get_category_specific_advice() {
        let mut a = make_task(1, 5, 10);
        a.is_milestone = true;
        let b = make_task(2, 5, 10);

        let tasks = vec![a, b];
        let (month, ranking, conflicts) = run_pipeline(&tasks);

        let report = ConflictResolutionEngine::new().resolve(&month, &ranking, &conflicts);
        assert_eq!(report.conflict_advice.len(), 1);
        let advice = &report.conflict_advice[0];
        assert_eq!(advice.category, ConflictCategory::ScheduleConflict);
        assert!(advice.action.contains("Reschedule"));
    }

    #[test]
    fn custom_resolver_replaces_the_default() {
        let tasks = vec![make_task(1, 5, 10), make_task(2, 5, 10)];
        let (month, ranking, conflicts) = run_pipeline(&tasks);

        let mut engine = ConflictResolutionEngine::new();
        engine.set_resolver(ConflictCategory::ScheduleConflict, |_| {
            "Split the work into day shifts".to_string()
        });

        let report = engine.resolve(&month, &ranking, &conflicts);
        assert!(report
            .conflict_advice
            .iter()
            .all(|a| a.action == "Split the work into day shifts"));
    }

    #[test]
    fn horizontal_overflow_needs_a_window() {
        let mut month = MonthLayout::default();
        let mut bar = TaskBar::new("task-1", 0.0, 5000.0);
        bar.height = 10.0;
        month.bars.push(bar);

        let ranking = PriorityRanking::default();
        let conflicts = ConflictAnalysis::default();

        // Unbounded canvas: no horizontal overflow possible
        let report = ConflictResolutionEngine::new().resolve(&month, &ranking, &conflicts);
        assert!(!report
            .overflows
            .iter()
            .any(|i| i.kind == OverflowKind::Horizontal));

        // A 31-day window at 20 units per day is 620 wide
        let mut config = LayoutConfig::default();
        config.calendar_start = Some(day(1));
        config.calendar_end = Some(day(31));
        let report = ConflictResolutionEngine::with_config(&config).resolve(&month, &ranking, &conflicts);
        assert!(report
            .overflows
            .iter()
            .any(|i| i.kind == OverflowKind::Horizontal));
    }

    #[test]
    fn recommendations_are_never_empty() {
        let report = ConflictResolutionEngine::new().resolve(
            &MonthLayout::default(),
            &PriorityRanking::default(),
            &ConflictAnalysis::default(),
        );
        assert!(!report.recommendations.is_empty());
    }
}
