//! Overlap detection for date-ranged tasks
//!
//! Classifies pairwise intersections, derives a severity per overlap, and
//! groups transitively overlapping tasks. Groups feed the stacking engines;
//! individual overlaps feed conflict categorization.
//!
//! Intersections shorter than the precision threshold are ignored, which
//! also excludes adjacent ranges (touching boundaries, zero-length
//! intersection) from the reported overlaps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::task::Task;

/// How two task ranges intersect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapType {
    /// Both ranges are exactly equal
    Identical,
    /// One range strictly contains the other
    Nested,
    /// The intersection spans one task fully, extending on exactly one side
    Complete,
    /// Ranges intersect without either containing the other
    Partial,
}

impl OverlapType {
    pub fn label(&self) -> &'static str {
        match self {
            OverlapType::Identical => "identical",
            OverlapType::Nested => "nested",
            OverlapType::Complete => "complete",
            OverlapType::Partial => "partial",
        }
    }
}

/// Severity of an overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Human-readable explanation attached to an overlap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictInfo {
    pub reason: String,
    pub resolution_hint: String,
}

/// A detected overlap between two tasks
///
/// Reported once per unordered pair; `task1_id` is the task appearing
/// earlier in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOverlap {
    pub task1_id: String,
    pub task2_id: String,
    pub overlap_type: OverlapType,
    pub severity: Severity,
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,

    /// Inclusive count of calendar days in the intersection
    pub overlap_days: i64,

    /// Intersection duration relative to the shorter task, in [0, 1]
    pub overlap_percentage: f64,

    /// The higher of the two tasks' priorities
    pub priority: u8,

    pub conflict_info: ConflictInfo,
}

impl TaskOverlap {
    /// Returns true if the overlap involves the given task
    pub fn involves(&self, task_id: &str) -> bool {
        self.task1_id == task_id || self.task2_id == task_id
    }
}

/// A set of transitively overlapping tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapGroup {
    pub group_id: String,
    pub task_ids: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl OverlapGroup {
    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }
}

/// Result of overlap detection over a task set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapAnalysis {
    pub overlaps: Vec<TaskOverlap>,
    pub groups: Vec<OverlapGroup>,
    pub total_tasks: usize,
    pub severity_counts: HashMap<String, usize>,
}

impl OverlapAnalysis {
    /// Returns overlaps with the given severity
    pub fn overlaps_by_severity(&self, severity: Severity) -> Vec<&TaskOverlap> {
        self.overlaps.iter().filter(|o| o.severity == severity).collect()
    }

    /// Returns overlaps with the given type
    pub fn overlaps_by_type(&self, overlap_type: OverlapType) -> Vec<&TaskOverlap> {
        self.overlaps.iter().filter(|o| o.overlap_type == overlap_type).collect()
    }

    /// Returns true if any overlap is critical
    pub fn has_critical_overlaps(&self) -> bool {
        self.overlaps.iter().any(|o| o.severity == Severity::Critical)
    }

    /// Returns overlaps involving the given task
    pub fn overlaps_for_task(&self, task_id: &str) -> Vec<&TaskOverlap> {
        self.overlaps.iter().filter(|o| o.involves(task_id)).collect()
    }
}

/// Detects and classifies overlaps between date-ranged tasks
#[derive(Debug, Clone)]
pub struct OverlapDetector {
    /// Minimum intersection duration to report
    precision: Duration,

    /// Percentage cutoff for High severity
    high_cutoff: f64,

    /// Percentage cutoff for Medium severity
    medium_cutoff: f64,
}

impl Default for OverlapDetector {
    fn default() -> Self {
        Self {
            precision: Duration::hours(1),
            high_cutoff: 0.8,
            medium_cutoff: 0.5,
        }
    }
}

impl OverlapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the minimum intersection duration
    pub fn with_precision(mut self, precision: Duration) -> Self {
        self.precision = precision;
        self
    }

    /// Overrides the severity percentage cutoffs
    pub fn with_severity_cutoffs(mut self, high: f64, medium: f64) -> Self {
        self.high_cutoff = high;
        self.medium_cutoff = medium;
        self
    }

    /// Detects all overlaps in the task set
    ///
    /// Each unordered pair is reported at most once; classification is
    /// independent of task order.
    pub fn detect_overlaps(&self, tasks: &[Task]) -> OverlapAnalysis {
        let mut overlaps = Vec::new();

        for (i, task1) in tasks.iter().enumerate() {
            for task2 in tasks.iter().skip(i + 1) {
                if let Some(overlap) = self.analyze_pair(task1, task2) {
                    overlaps.push(overlap);
                }
            }
        }

        let groups = self.group_overlapping_tasks(tasks);

        let mut severity_counts: HashMap<String, usize> = HashMap::new();
        for overlap in &overlaps {
            *severity_counts.entry(overlap.severity.label().to_string()).or_default() += 1;
        }

        OverlapAnalysis {
            overlaps,
            groups,
            total_tasks: tasks.len(),
            severity_counts,
        }
    }

    /// Analyzes one pair of tasks, returning the overlap if it is reportable
    fn analyze_pair(&self, task1: &Task, task2: &Task) -> Option<TaskOverlap> {
        let (start, end) = task1.intersection(task2)?;
        let duration = end - start;

        // Adjacent ranges fall out here: a shared boundary gives a
        // zero-length intersection, below any positive precision.
        if duration < self.precision {
            return None;
        }

        let overlap_type = classify_overlap(task1, task2);
        let percentage = overlap_percentage(task1, task2, duration, overlap_type);
        let severity = self.severity_for(overlap_type, percentage);
        let conflict_info = conflict_info(task1, task2, overlap_type, severity);

        Some(TaskOverlap {
            task1_id: task1.id.clone(),
            task2_id: task2.id.clone(),
            overlap_type,
            severity,
            overlap_start: start,
            overlap_end: end,
            overlap_days: duration.num_hours() / 24 + 1,
            overlap_percentage: percentage,
            priority: task1.priority.max(task2.priority),
            conflict_info,
        })
    }

    fn severity_for(&self, overlap_type: OverlapType, percentage: f64) -> Severity {
        match overlap_type {
            OverlapType::Identical => Severity::Critical,
            OverlapType::Nested => Severity::High,
            _ => {
                if percentage >= self.high_cutoff {
                    Severity::High
                } else if percentage >= self.medium_cutoff {
                    Severity::Medium
                } else {
                    Severity::Low
                }
            }
        }
    }

    /// Groups transitively overlapping tasks with a sweep over start dates
    ///
    /// For intervals the sweep produces exactly the connected components of
    /// the overlap relation, with membership gated by the same precision
    /// threshold as the pairwise reports. Single-task groups are dropped.
    fn group_overlapping_tasks(&self, tasks: &[Task]) -> Vec<OverlapGroup> {
        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by_key(|t| t.start_date);

        let mut groups = Vec::new();
        let mut current: Vec<&Task> = Vec::new();
        let mut group_end: Option<DateTime<Utc>> = None;

        for task in sorted {
            match group_end {
                Some(end) if end - task.start_date >= self.precision => {
                    current.push(task);
                    group_end = Some(end.max(task.end_date));
                }
                _ => {
                    if current.len() > 1 {
                        groups.push(Self::finish_group(groups.len(), &current));
                    }
                    current = vec![task];
                    group_end = Some(task.end_date);
                }
            }
        }
        if current.len() > 1 {
            groups.push(Self::finish_group(groups.len(), &current));
        }

        groups
    }

    fn finish_group(index: usize, members: &[&Task]) -> OverlapGroup {
        let start = members.iter().map(|t| t.start_date).min().unwrap_or_default();
        let end = members.iter().map(|t| t.end_date).max().unwrap_or_default();
        OverlapGroup {
            group_id: format!("group_{}", index),
            task_ids: members.iter().map(|t| t.id.clone()).collect(),
            start_date: start,
            end_date: end,
        }
    }
}

/// Classifies an intersecting pair; precedence Identical > Nested > Complete > Partial
fn classify_overlap(task1: &Task, task2: &Task) -> OverlapType {
    if task1.start_date == task2.start_date && task1.end_date == task2.end_date {
        return OverlapType::Identical;
    }

    let strictly_contains = |a: &Task, b: &Task| {
        a.start_date < b.start_date && a.end_date > b.end_date
    };
    if strictly_contains(task1, task2) || strictly_contains(task2, task1) {
        return OverlapType::Nested;
    }

    // Containment with one shared boundary: the intersection covers the
    // shorter task fully, with extension on exactly one side.
    if task1.contains(task2) || task2.contains(task1) {
        return OverlapType::Complete;
    }

    OverlapType::Partial
}

/// Intersection duration relative to the shorter task, clamped to [0, 1]
fn overlap_percentage(
    task1: &Task,
    task2: &Task,
    overlap: Duration,
    overlap_type: OverlapType,
) -> f64 {
    if overlap_type == OverlapType::Identical {
        return 1.0;
    }

    let shorter = task1.duration().min(task2.duration());
    if shorter <= Duration::zero() {
        return 1.0;
    }

    let ratio = overlap.num_minutes() as f64 / shorter.num_minutes() as f64;
    ratio.clamp(0.0, 1.0)
}

fn conflict_info(
    task1: &Task,
    task2: &Task,
    overlap_type: OverlapType,
    severity: Severity,
) -> ConflictInfo {
    let (reason, hint) = match overlap_type {
        OverlapType::Identical => (
            format!("'{}' and '{}' occupy the same date range", task1.name, task2.name),
            "Merge the tasks or move one to a different date range".to_string(),
        ),
        OverlapType::Nested => (
            format!("'{}' is scheduled entirely within '{}'", shorter_of(task1, task2).name, longer_of(task1, task2).name),
            "Consider making the inner task a subtask or shifting it out".to_string(),
        ),
        OverlapType::Complete => (
            format!("'{}' is fully covered by '{}'", shorter_of(task1, task2).name, longer_of(task1, task2).name),
            "Shorten the covering task or reschedule the covered one".to_string(),
        ),
        OverlapType::Partial => (
            format!("'{}' and '{}' partially overlap", task1.name, task2.name),
            "Shift one task to reduce or eliminate the overlap".to_string(),
        ),
    };

    let reason = match severity {
        Severity::Critical => format!("CRITICAL: {}", reason),
        Severity::High => format!("HIGH: {}", reason),
        _ => reason,
    };

    ConflictInfo {
        reason,
        resolution_hint: hint,
    }
}

fn shorter_of<'a>(task1: &'a Task, task2: &'a Task) -> &'a Task {
    if task1.duration() <= task2.duration() {
        task1
    } else {
        task2
    }
}

fn longer_of<'a>(task1: &'a Task, task2: &'a Task) -> &'a Task {
    if task1.duration() > task2.duration() {
        task1
    } else {
        task2
    }
}
