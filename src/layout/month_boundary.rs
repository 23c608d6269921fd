//! Month boundary processing
//!
//! Bars whose tasks span a month edge are split into per-month segments.
//! The first segment is clipped at the boundary; each later segment is a
//! continuation carrying a generated id and a visual connection back to
//! its predecessor.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::Task;

use super::config::GridConfig;
use super::geometry::TaskBar;
use super::positioning::PositionedLayout;

/// A task's carry-over into the next month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContinuation {
    /// Generated id: `{task_id}_cont_{year}_{month}`
    pub continuation_id: String,

    pub task_id: String,
    pub from_year: i32,
    pub from_month: u32,
    pub to_year: i32,
    pub to_month: u32,
}

/// Connector drawn between two segments of a split task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConnection {
    pub task_id: String,

    /// Index of the earlier segment in the bar list
    pub from_segment: usize,

    /// Index of the continuation segment
    pub to_segment: usize,

    pub connector: String,
    pub label: String,
    pub emphasized: bool,
}

/// Continuation treatment chosen per task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRule {
    pub name: String,
    pub connector: String,
    pub label: String,
    pub emphasized: bool,
}

/// Quality metrics for boundary processing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryMetrics {
    /// Fraction of expected segment links that have a connection
    pub continuity_score: f64,

    /// Fraction of split tasks whose segments share height and color
    pub visual_consistency: f64,

    /// Fraction of segment joins that are flush on the X axis
    pub grid_continuity: f64,
}

/// Layout after month boundary processing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthLayout {
    pub bars: Vec<TaskBar>,
    pub continuations: Vec<TaskContinuation>,
    pub connections: Vec<VisualConnection>,
    pub metrics: BoundaryMetrics,
}

impl MonthLayout {
    /// Returns all segments of a task, in month order
    pub fn segments_for(&self, task_id: &str) -> Vec<&TaskBar> {
        self.bars.iter().filter(|b| b.task_id == task_id).collect()
    }
}

/// Splits bars at month boundaries and records continuations
#[derive(Debug, Clone)]
pub struct MonthBoundaryEngine {
    grid: GridConfig,
}

impl Default for MonthBoundaryEngine {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
        }
    }
}

impl MonthBoundaryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(grid: GridConfig) -> Self {
        Self { grid }
    }

    /// Splits every month-crossing bar into per-month segments
    pub fn process_month_boundaries(
        &self,
        layout: &PositionedLayout,
        tasks: &[Task],
    ) -> MonthLayout {
        let Some(calendar_start) = layout.calendar_start else {
            return MonthLayout::default();
        };
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut bars = Vec::new();
        let mut continuations = Vec::new();
        let mut connections = Vec::new();
        let mut split_task_count = 0usize;
        let mut expected_links = 0usize;

        for bar in &layout.bars {
            let Some(task) = by_id.get(bar.task_id.as_str()) else {
                bars.push(bar.clone());
                continue;
            };

            // Inverted ranges already degraded to unit-duration bars
            // upstream; there is no boundary to split at
            if task.end_date <= task.start_date || same_month(task.start_date, task.end_date) {
                bars.push(bar.clone());
                continue;
            }

            split_task_count += 1;
            let rule = rule_for(task);
            let segments = self.split(bar, task, calendar_start);
            expected_links += segments.len() - 1;

            let first_index = bars.len();
            for (i, segment) in segments.into_iter().enumerate() {
                if i > 0 {
                    let month_start = segment_month(task, i);
                    continuations.push(TaskContinuation {
                        continuation_id: format!(
                            "{}_cont_{}_{}",
                            task.id,
                            month_start.year(),
                            month_start.month()
                        ),
                        task_id: task.id.clone(),
                        from_year: prev_month(month_start).year(),
                        from_month: prev_month(month_start).month(),
                        to_year: month_start.year(),
                        to_month: month_start.month(),
                    });
                    connections.push(VisualConnection {
                        task_id: task.id.clone(),
                        from_segment: first_index + i - 1,
                        to_segment: first_index + i,
                        connector: rule.connector.clone(),
                        label: rule.label.clone(),
                        emphasized: rule.emphasized,
                    });
                }
                bars.push(segment);
            }
        }

        let metrics = compute_metrics(&bars, &connections, split_task_count, expected_links);

        MonthLayout {
            bars,
            continuations,
            connections,
            metrics,
        }
    }

    /// Cuts a bar into one segment per month the task touches
    fn split(&self, bar: &TaskBar, task: &Task, calendar_start: DateTime<Utc>) -> Vec<TaskBar> {
        let mut segments = Vec::new();
        let mut cursor = task.start_date;
        let mut index = 0;

        while !same_month(cursor, task.end_date) {
            let boundary = next_month_start(cursor);
            segments.push(self.segment(bar, calendar_start, cursor, boundary, index, false));
            cursor = boundary;
            index += 1;
        }

        // Final segment runs to the task end, inclusive of the end day
        let final_end = task.end_date + chrono::Duration::days(1);
        let mut last = self.segment(bar, calendar_start, cursor, final_end, index, true);
        last.month_boundary = false;
        segments.push(last);

        segments
    }

    fn segment(
        &self,
        bar: &TaskBar,
        calendar_start: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        index: usize,
        is_last: bool,
    ) -> TaskBar {
        let mut segment = bar.clone();
        segment.start_x = (from - calendar_start).num_days() as f64 * self.grid.day_width;
        segment.end_x = (to - calendar_start).num_days() as f64 * self.grid.day_width;
        segment.is_start = index == 0;
        segment.is_end = is_last;
        segment.is_continuation = index > 0;
        segment.month_boundary = true;
        segment.row = month_row(calendar_start, from);
        segment
    }
}

fn same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn next_month_start(date: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    first_of_month(year, month).unwrap_or(date)
}

/// Midnight UTC on the first of the month; `None` only for years outside
/// chrono's representable range
fn first_of_month(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

fn prev_month(month_start: DateTime<Utc>) -> DateTime<Utc> {
    month_start - chrono::Duration::days(1)
}

/// First day of the month the i-th segment of the task lives in
fn segment_month(task: &Task, index: usize) -> DateTime<Utc> {
    let mut cursor = first_of_month(task.start_date.year(), task.start_date.month())
        .unwrap_or(task.start_date);
    for _ in 0..index {
        cursor = next_month_start(cursor);
    }
    cursor
}

fn month_row(calendar_start: DateTime<Utc>, date: DateTime<Utc>) -> usize {
    let months = (date.year() - calendar_start.year()) * 12
        + (date.month() as i32 - calendar_start.month() as i32);
    months.max(0) as usize
}

/// Continuation treatment per task, first matching rule
fn rule_for(task: &Task) -> BoundaryRule {
    if task.is_milestone {
        return BoundaryRule {
            name: "Milestone Continuation".to_string(),
            connector: "double-arrow".to_string(),
            label: "Continues (milestone)".to_string(),
            emphasized: true,
        };
    }
    if task.priority >= 4 {
        return BoundaryRule {
            name: "High Priority Continuation".to_string(),
            connector: "thick-arrow".to_string(),
            label: "Continues (high priority)".to_string(),
            emphasized: true,
        };
    }
    BoundaryRule {
        name: "Default Continuation".to_string(),
        connector: "arrow".to_string(),
        label: "Continues".to_string(),
        emphasized: false,
    }
}

fn compute_metrics(
    bars: &[TaskBar],
    connections: &[VisualConnection],
    split_task_count: usize,
    expected_links: usize,
) -> BoundaryMetrics {
    if split_task_count == 0 {
        return BoundaryMetrics {
            continuity_score: 1.0,
            visual_consistency: 1.0,
            grid_continuity: 1.0,
        };
    }

    let continuity_score = if expected_links > 0 {
        (connections.len() as f64 / expected_links as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let mut consistent = 0usize;
    let mut flush = 0usize;
    for connection in connections {
        let from = &bars[connection.from_segment];
        let to = &bars[connection.to_segment];
        if (from.height - to.height).abs() < 1e-9 && from.color == to.color {
            consistent += 1;
        }
        if (from.end_x - to.start_x).abs() < 1e-9 {
            flush += 1;
        }
    }

    let links = connections.len().max(1) as f64;
    BoundaryMetrics {
        continuity_score,
        visual_consistency: consistent as f64 / links,
        grid_continuity: flush as f64 / links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriorityRanker;
    use crate::layout::positioning::PositioningEngine;
    use crate::layout::vertical::VerticalLayout;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn make_task(seq: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Task {
        Task::new(format!("task-{}", seq), format!("Task {}", seq), start, end)
    }

    fn process(tasks: &[Task]) -> MonthLayout {
        let ranking = PriorityRanker::new()
            .with_reference_date(date(2026, 1, 1))
            .rank_tasks(tasks);
        let positioned = PositioningEngine::new()
            .with_calendar_start(date(2026, 1, 1))
            .position_tasks(&VerticalLayout::default(), &ranking, tasks);
        MonthBoundaryEngine::new().process_month_boundaries(&positioned, tasks)
    }

    #[test]
    fn month_crossing_task_splits_into_two_segments() {
        // Jan 25 - Feb 5 splits at the February boundary
        let tasks = vec![make_task(1, date(2026, 1, 25), date(2026, 2, 5))];
        let layout = process(&tasks);

        let segments = layout.segments_for("task-1");
        assert_eq!(segments.len(), 2);

        let first = segments[0];
        assert!(first.is_start);
        assert!(!first.is_end);
        assert!(!first.is_continuation);
        assert!(first.month_boundary);

        let second = segments[1];
        assert!(!second.is_start);
        assert!(second.is_end);
        assert!(second.is_continuation);
    }

    #[test]
    fn segments_are_clipped_at_the_boundary() {
        let tasks = vec![make_task(1, date(2026, 1, 25), date(2026, 2, 5))];
        let layout = process(&tasks);

        let segments = layout.segments_for("task-1");
        // Jan 25 is 24 days in; the boundary is 31 days in
        assert_eq!(segments[0].start_x, 24.0 * 20.0);
        assert_eq!(segments[0].end_x, 31.0 * 20.0);
        assert_eq!(segments[1].start_x, 31.0 * 20.0);
        // Feb 5 inclusive ends 36 days in
        assert_eq!(segments[1].end_x, 36.0 * 20.0);
    }

    #[test]
    fn continuation_id_format() {
        let tasks = vec![make_task(1, date(2026, 1, 25), date(2026, 2, 5))];
        let layout = process(&tasks);

        assert_eq!(layout.continuations.len(), 1);
        let continuation = &layout.continuations[0];
        assert_eq!(continuation.continuation_id, "task-1_cont_2026_2");
        assert_eq!(continuation.from_month, 1);
        assert_eq!(continuation.to_month, 2);
    }

    #[test]
    fn connection_carries_continues_label() {
        let tasks = vec![make_task(1, date(2026, 1, 25), date(2026, 2, 5))];
        let layout = process(&tasks);

        assert_eq!(layout.connections.len(), 1);
        let connection = &layout.connections[0];
        assert_eq!(connection.label, "Continues");
        assert_eq!(connection.connector, "arrow");
        assert!(!connection.emphasized);
    }

    #[test]
    fn milestone_continuation_is_emphasized() {
        let mut task = make_task(1, date(2026, 1, 25), date(2026, 2, 5));
        task.is_milestone = true;

        let layout = process(&[task]);
        assert!(layout.connections[0].emphasized);
        assert!(layout.connections[0].label.contains("milestone"));
    }

    #[test]
    fn year_end_crossing_splits_correctly() {
        let tasks = vec![make_task(1, date(2026, 12, 28), date(2027, 1, 3))];
        let ranking = PriorityRanker::new()
            .with_reference_date(date(2026, 12, 1))
            .rank_tasks(&tasks);
        let positioned = PositioningEngine::new()
            .with_calendar_start(date(2026, 12, 1))
            .position_tasks(&VerticalLayout::default(), &ranking, &tasks);
        let layout = MonthBoundaryEngine::new().process_month_boundaries(&positioned, &tasks);

        let segments = layout.segments_for("task-1");
        assert_eq!(segments.len(), 2);
        assert_eq!(layout.continuations[0].continuation_id, "task-1_cont_2027_1");
    }

    #[test]
    fn three_month_span_yields_three_segments() {
        let tasks = vec![make_task(1, date(2026, 1, 20), date(2026, 3, 10))];
        let layout = process(&tasks);

        let segments = layout.segments_for("task-1");
        assert_eq!(segments.len(), 3);
        assert_eq!(layout.continuations.len(), 2);
        assert_eq!(layout.connections.len(), 2);
        assert_eq!(segments[1].row, 1);
        assert_eq!(segments[2].row, 2);
    }

    #[test]
    fn single_month_tasks_pass_through_untouched() {
        let tasks = vec![make_task(1, date(2026, 1, 5), date(2026, 1, 10))];
        let ranking = PriorityRanker::new()
            .with_reference_date(date(2026, 1, 1))
            .rank_tasks(&tasks);
        let positioned = PositioningEngine::new()
            .with_calendar_start(date(2026, 1, 1))
            .position_tasks(&VerticalLayout::default(), &ranking, &tasks);
        let layout = MonthBoundaryEngine::new().process_month_boundaries(&positioned, &tasks);

        assert_eq!(layout.bars.len(), 1);
        assert_eq!(layout.bars[0], positioned.bars[0]);
        assert_eq!(layout.metrics.continuity_score, 1.0);
    }

    #[test]
    fn inverted_range_across_months_passes_through() {
        // End before start, in an earlier month; the bar must survive
        // unsplit instead of chasing a boundary that never comes
        let tasks = vec![make_task(1, date(2026, 2, 5), date(2026, 1, 20))];
        let layout = process(&tasks);

        assert_eq!(layout.bars.len(), 1);
        assert!(layout.continuations.is_empty());
        assert!(!layout.bars[0].is_continuation);
    }

    #[test]
    fn metrics_are_perfect_for_clean_splits() {
        let tasks = vec![make_task(1, date(2026, 1, 25), date(2026, 2, 5))];
        let layout = process(&tasks);

        assert_eq!(layout.metrics.continuity_score, 1.0);
        assert_eq!(layout.metrics.visual_consistency, 1.0);
        assert_eq!(layout.metrics.grid_continuity, 1.0);
    }
}
