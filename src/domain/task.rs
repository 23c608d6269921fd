//! Task domain model
//!
//! Tasks are date-ranged units of work placed on a calendar grid.
//! Date ranges are inclusive at both ends and carry UTC timestamps;
//! date-only input is parsed at midnight UTC.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Category of a task, used for importance weighting and grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Work,
    Personal,
    Health,
    Finance,
    Education,
    Travel,
    #[default]
    Other,
}

impl TaskCategory {
    /// Returns a display label for the category
    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Work => "work",
            TaskCategory::Personal => "personal",
            TaskCategory::Health => "health",
            TaskCategory::Finance => "finance",
            TaskCategory::Education => "education",
            TaskCategory::Travel => "travel",
            TaskCategory::Other => "other",
        }
    }

    /// Default importance weight, overridable via configuration
    pub fn default_importance(&self) -> f64 {
        match self {
            TaskCategory::Work => 1.0,
            TaskCategory::Health => 0.9,
            TaskCategory::Finance => 0.8,
            TaskCategory::Education => 0.7,
            TaskCategory::Travel => 0.6,
            TaskCategory::Personal => 0.5,
            TaskCategory::Other => 0.3,
        }
    }
}

/// A date-ranged task on the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier, unique within a task set
    pub id: String,

    /// Display name
    pub name: String,

    /// Longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Category for grouping and importance weighting
    #[serde(default)]
    pub category: TaskCategory,

    /// Inclusive range start
    pub start_date: DateTime<Utc>,

    /// Inclusive range end
    pub end_date: DateTime<Utc>,

    /// Priority from 1 (lowest) to 5 (highest)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Person responsible, if assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Milestones get elevated ranking and continuation emphasis
    #[serde(default)]
    pub is_milestone: bool,

    /// IDs of tasks this task depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

fn default_priority() -> u8 {
    3
}

impl Task {
    /// Creates a task with the given id, name, and date range
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: TaskCategory::default(),
            start_date,
            end_date,
            priority: default_priority(),
            assignee: None,
            is_milestone: false,
            depends_on: Vec::new(),
        }
    }

    /// Returns the span of the task as a duration
    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }

    /// Returns the inclusive day count of the task
    ///
    /// A task starting and ending on the same day spans one day. An
    /// inverted range also counts as one day, so validation failures
    /// still render as unit-duration bars.
    pub fn duration_days(&self) -> i64 {
        (self.duration().num_days() + 1).max(1)
    }

    /// Returns true if the two date ranges intersect (inclusive bounds)
    pub fn overlaps(&self, other: &Task) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// Returns true if this task's range fully contains the other's
    pub fn contains(&self, other: &Task) -> bool {
        self.start_date <= other.start_date && self.end_date >= other.end_date
    }

    /// Returns true if the ranges share a start or end boundary
    pub fn shares_boundary_with(&self, other: &Task) -> bool {
        self.start_date == other.start_date || self.end_date == other.end_date
    }

    /// Returns true if both tasks have the same non-empty assignee
    pub fn same_assignee(&self, other: &Task) -> bool {
        match (&self.assignee, &other.assignee) {
            (Some(a), Some(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }

    /// Returns the intersection of the two ranges, if any
    pub fn intersection(&self, other: &Task) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start_date.max(other.start_date);
        let end = self.end_date.min(other.end_date);
        if start <= end {
            Some((start, end))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()
    }

    fn make_task(seq: u32, start: u32, end: u32) -> Task {
        Task::new(format!("task-{}", seq), format!("Task {}", seq), day(start), day(end))
    }

    #[test]
    fn duration_days_is_inclusive() {
        let task = make_task(1, 5, 5);
        assert_eq!(task.duration_days(), 1);

        let task = make_task(2, 5, 10);
        assert_eq!(task.duration_days(), 6);
    }

    #[test]
    fn inverted_range_degrades_to_one_day() {
        let task = make_task(1, 10, 5);
        assert_eq!(task.duration_days(), 1);
    }

    #[test]
    fn overlaps_is_symmetric() {
        let a = make_task(1, 5, 10);
        let b = make_task(2, 8, 15);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = make_task(3, 20, 25);
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn touching_boundaries_overlap_on_the_shared_instant() {
        let a = make_task(1, 5, 10);
        let b = make_task(2, 10, 15);
        assert!(a.overlaps(&b));

        let (start, end) = a.intersection(&b).unwrap();
        assert_eq!(start, end);
    }

    #[test]
    fn contains_nested_range() {
        let outer = make_task(1, 1, 20);
        let inner = make_task(2, 5, 10);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        // A range contains itself
        assert!(outer.contains(&outer));
    }

    #[test]
    fn same_assignee_requires_both_set() {
        let mut a = make_task(1, 5, 10);
        let mut b = make_task(2, 8, 15);
        assert!(!a.same_assignee(&b));

        a.assignee = Some("alice".to_string());
        assert!(!a.same_assignee(&b));

        b.assignee = Some("alice".to_string());
        assert!(a.same_assignee(&b));

        b.assignee = Some("bob".to_string());
        assert!(!a.same_assignee(&b));
    }

    #[test]
    fn intersection_of_disjoint_ranges_is_none() {
        let a = make_task(1, 1, 5);
        let b = make_task(2, 10, 15);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn serde_round_trip() {
        let mut task = make_task(1, 5, 10);
        task.assignee = Some("alice".to_string());
        task.is_milestone = true;
        task.category = TaskCategory::Work;

        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task, parsed);
    }

    #[test]
    fn defaults_applied_on_deserialize() {
        let json = r#"{
            "id": "t-1",
            "name": "Minimal",
            "start_date": "2026-01-05T00:00:00Z",
            "end_date": "2026-01-10T00:00:00Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, 3);
        assert_eq!(task.category, TaskCategory::Other);
        assert!(!task.is_milestone);
        assert!(task.depends_on.is_empty());
    }
}
