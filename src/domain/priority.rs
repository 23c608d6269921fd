//! Priority ranking and visual prominence
//!
//! Ranks tasks by a weighted sum of factor scores and maps the result to a
//! visual prominence level with an attached style. Conflict pressure is the
//! heaviest factor, so tasks entangled in critical overlaps float to the
//! top of the ranking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::conflict::{AssessmentLevel, CategorizedConflict, ConflictAnalysis, ConflictCategory, ConflictCategorizer};
use super::graph::DependencyGraph;
use super::overlap::{OverlapDetector, Severity};
use super::task::Task;

/// Factor categories contributing to the priority score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityFactor {
    Conflict,
    Importance,
    Timeline,
    Resource,
    Dependency,
    Milestone,
    Assignee,
    Category,
    Deadline,
}

/// Visual prominence level derived from the priority score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualProminence {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl VisualProminence {
    pub fn label(&self) -> &'static str {
        match self {
            VisualProminence::Critical => "critical",
            VisualProminence::High => "high",
            VisualProminence::Medium => "medium",
            VisualProminence::Low => "low",
            VisualProminence::Minimal => "minimal",
        }
    }

    /// Height multiplier used by the vertical stacking engine
    pub fn height_multiplier(&self) -> f64 {
        match self {
            VisualProminence::Critical => 1.5,
            VisualProminence::High => 1.3,
            VisualProminence::Medium => 1.0,
            VisualProminence::Low => 0.8,
            VisualProminence::Minimal => 0.6,
        }
    }
}

/// Rendering hints attached to a ranked task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualStyle {
    pub border_color: String,
    pub fill_color: String,
    pub border_width: String,
    pub opacity: f64,
    pub z_index: i32,
    pub highlight: bool,
}

/// A task's calculated priority and prominence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPriority {
    pub task_id: String,

    /// Weighted factor sum; drives prominence buckets
    pub score: f64,

    /// Score scaled into [0, 1] for metric use
    pub normalized_score: f64,

    pub prominence: VisualProminence,
    pub factors: HashMap<PriorityFactor, f64>,

    /// 1-based rank after sorting, highest score first
    pub display_order: usize,

    pub style: VisualStyle,
    pub recommendations: Vec<String>,
}

/// Result of ranking a task set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityRanking {
    /// Sorted by score descending; ties keep input order
    pub priorities: Vec<TaskPriority>,

    pub prominence_summary: HashMap<String, usize>,
    pub recommendations: Vec<String>,
}

impl PriorityRanking {
    /// Returns the priority entry for a task, if ranked
    pub fn for_task(&self, task_id: &str) -> Option<&TaskPriority> {
        self.priorities.iter().find(|p| p.task_id == task_id)
    }

    /// Returns tasks at the given prominence level, in rank order
    pub fn by_prominence(&self, prominence: VisualProminence) -> Vec<&TaskPriority> {
        self.priorities.iter().filter(|p| p.prominence == prominence).collect()
    }

    /// Returns the top `n` ranked tasks
    pub fn top(&self, n: usize) -> &[TaskPriority] {
        &self.priorities[..n.min(self.priorities.len())]
    }
}

/// Score reference used to scale raw scores into [0, 1]
const NORMALIZATION_CEILING: f64 = 20.0;

/// Ranks tasks by weighted factor scores
#[derive(Debug, Clone)]
pub struct PriorityRanker {
    detector: OverlapDetector,
    categorizer: ConflictCategorizer,
    weights: Vec<(PriorityFactor, f64)>,
    category_importance: HashMap<String, f64>,
    reference_date: Option<DateTime<Utc>>,
}

impl Default for PriorityRanker {
    fn default() -> Self {
        Self {
            detector: OverlapDetector::new(),
            categorizer: ConflictCategorizer::new(),
            weights: default_weights(),
            category_importance: HashMap::new(),
            reference_date: None,
        }
    }
}

fn default_weights() -> Vec<(PriorityFactor, f64)> {
    vec![
        (PriorityFactor::Conflict, 0.25),
        (PriorityFactor::Importance, 0.20),
        (PriorityFactor::Timeline, 0.15),
        (PriorityFactor::Resource, 0.10),
        (PriorityFactor::Dependency, 0.10),
        (PriorityFactor::Milestone, 0.10),
        (PriorityFactor::Assignee, 0.05),
        (PriorityFactor::Category, 0.03),
        (PriorityFactor::Deadline, 0.02),
    ]
}

impl PriorityRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the "now" used by timeline factors; defaults to `Utc::now()`
    pub fn with_reference_date(mut self, date: DateTime<Utc>) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Overrides per-category importance weights (0 to 1)
    pub fn with_category_importance(mut self, map: HashMap<String, f64>) -> Self {
        self.category_importance = map;
        self
    }

    /// Ranks all tasks, highest priority first
    ///
    /// Runs overlap detection and conflict categorization internally so
    /// conflict pressure can feed the score.
    pub fn rank_tasks(&self, tasks: &[Task]) -> PriorityRanking {
        let overlap_analysis = self.detector.detect_overlaps(tasks);
        let conflict_analysis = self.categorizer.categorize_conflicts(&overlap_analysis, tasks);
        let graph = DependencyGraph::from_tasks(tasks).unwrap_or_default();
        let now = self.reference_date.unwrap_or_else(Utc::now);
        let workloads = assignee_workloads(tasks);

        let mut priorities: Vec<TaskPriority> = tasks
            .iter()
            .map(|task| {
                let conflicts = conflicts_for(&conflict_analysis, &task.id);
                self.score_task(task, &conflicts, &graph, &workloads, now)
            })
            .collect();

        // Stable sort keeps input order for equal scores
        priorities.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        for (i, priority) in priorities.iter_mut().enumerate() {
            priority.display_order = i + 1;
        }

        let mut prominence_summary: HashMap<String, usize> = HashMap::new();
        for priority in &priorities {
            *prominence_summary.entry(priority.prominence.label().to_string()).or_default() += 1;
        }

        let recommendations = ranking_recommendations(&priorities, &conflict_analysis);

        PriorityRanking {
            priorities,
            prominence_summary,
            recommendations,
        }
    }

    fn score_task(
        &self,
        task: &Task,
        conflicts: &[&CategorizedConflict],
        graph: &DependencyGraph,
        workloads: &HashMap<String, usize>,
        now: DateTime<Utc>,
    ) -> TaskPriority {
        let mut factors = HashMap::new();
        let mut score = 0.0;

        for (factor, weight) in &self.weights {
            let raw = match factor {
                PriorityFactor::Conflict => conflict_factor(task, conflicts),
                PriorityFactor::Importance => self.importance_factor(task),
                PriorityFactor::Timeline => timeline_factor(task, now),
                PriorityFactor::Resource => resource_factor(task, conflicts, workloads),
                PriorityFactor::Dependency => dependency_factor(task, conflicts, graph),
                PriorityFactor::Milestone => milestone_factor(task, now),
                PriorityFactor::Assignee => assignee_factor(task, workloads),
                PriorityFactor::Category => self.category_factor(task),
                PriorityFactor::Deadline => deadline_factor(task, now),
            };
            factors.insert(*factor, raw);
            score += raw * weight;
        }

        let prominence = prominence_for(score);

        TaskPriority {
            task_id: task.id.clone(),
            score,
            normalized_score: (score / NORMALIZATION_CEILING).clamp(0.0, 1.0),
            prominence,
            recommendations: task_recommendations(&factors),
            style: style_for(prominence),
            factors,
            display_order: 0,
        }
    }

    fn importance_factor(&self, task: &Task) -> f64 {
        let mut score = task.priority as f64 * 2.0;
        score += self.category_importance_of(task) * 8.0;
        if task.is_milestone {
            score += 10.0;
        }

        let days = task.duration_days();
        if days > 30 {
            score += 3.0;
        } else if days > 7 {
            score += 2.0;
        } else if days > 1 {
            score += 1.0;
        }

        score
    }

    fn category_factor(&self, task: &Task) -> f64 {
        self.category_importance_of(task) * 8.0
    }

    fn category_importance_of(&self, task: &Task) -> f64 {
        self.category_importance
            .get(task.category.label())
            .copied()
            .unwrap_or_else(|| task.category.default_importance())
    }
}

fn conflict_factor(task: &Task, conflicts: &[&CategorizedConflict]) -> f64 {
    let mut score = task.priority as f64 * 0.2;

    for conflict in conflicts {
        score += match conflict.overlap.severity {
            Severity::Critical => 10.0,
            Severity::High => 7.0,
            Severity::Medium => 4.0,
            Severity::Low => 2.0,
        };
        score += match conflict.impact {
            AssessmentLevel::High => 3.0,
            AssessmentLevel::Medium => 1.5,
            AssessmentLevel::Low => 0.0,
        };
        score += match conflict.risk {
            AssessmentLevel::High => 5.0,
            AssessmentLevel::Medium => 2.0,
            AssessmentLevel::Low => 0.5,
        };
    }

    score
}

fn timeline_factor(task: &Task, now: DateTime<Utc>) -> f64 {
    let mut score = 0.0;

    let days_until_start = (task.start_date - now).num_days();
    score += if days_until_start <= 0 {
        10.0
    } else if days_until_start <= 1 {
        8.0
    } else if days_until_start <= 3 {
        6.0
    } else if days_until_start <= 7 {
        4.0
    } else if days_until_start <= 14 {
        2.0
    } else {
        0.0
    };

    let days_until_end = (task.end_date - now).num_days();
    score += if days_until_end <= 0 {
        15.0
    } else if days_until_end <= 1 {
        12.0
    } else if days_until_end <= 3 {
        8.0
    } else if days_until_end <= 7 {
        5.0
    } else if days_until_end <= 14 {
        3.0
    } else {
        0.0
    };

    score
}

fn resource_factor(
    task: &Task,
    conflicts: &[&CategorizedConflict],
    workloads: &HashMap<String, usize>,
) -> f64 {
    let mut score = 0.0;

    if let Some(assignee) = &task.assignee {
        if let Some(workload) = workloads.get(assignee) {
            score += *workload as f64 * 0.5;
        }
    }

    for conflict in conflicts {
        if conflict.category == ConflictCategory::AssigneeConflict {
            score += 5.0;
        }
    }

    score
}

fn dependency_factor(task: &Task, conflicts: &[&CategorizedConflict], graph: &DependencyGraph) -> f64 {
    let mut score = task.depends_on.len() as f64;

    // Tasks that block others rank higher
    score += graph.fan_in(&task.id) as f64 * 3.0;

    for conflict in conflicts {
        if conflict.category == ConflictCategory::TimelineConflict {
            score += 2.0;
        }
    }

    score
}

fn milestone_factor(task: &Task, now: DateTime<Utc>) -> f64 {
    if !task.is_milestone {
        return 0.0;
    }

    let mut score = 15.0;
    if task.priority >= 4 {
        score += 5.0;
    }

    let days_until_end = (task.end_date - now).num_days();
    if days_until_end <= 7 {
        score += 10.0;
    } else if days_until_end <= 30 {
        score += 5.0;
    }

    score
}

fn assignee_factor(task: &Task, workloads: &HashMap<String, usize>) -> f64 {
    let Some(assignee) = &task.assignee else {
        return 0.0;
    };

    let mut score = 2.0;
    if let Some(workload) = workloads.get(assignee) {
        if (3..=6).contains(workload) {
            score += 3.0;
        } else if *workload > 6 {
            score += 1.0;
        }
    }
    score
}

fn deadline_factor(task: &Task, now: DateTime<Utc>) -> f64 {
    let days = (task.end_date - now).num_days();
    if days <= 0 {
        15.0
    } else if days <= 1 {
        12.0
    } else if days <= 3 {
        8.0
    } else if days <= 7 {
        5.0
    } else if days <= 14 {
        3.0
    } else if days <= 30 {
        1.0
    } else {
        0.0
    }
}

fn prominence_for(score: f64) -> VisualProminence {
    if score >= 15.0 {
        VisualProminence::Critical
    } else if score >= 10.0 {
        VisualProminence::High
    } else if score >= 6.0 {
        VisualProminence::Medium
    } else if score >= 3.0 {
        VisualProminence::Low
    } else {
        VisualProminence::Minimal
    }
}

fn style_for(prominence: VisualProminence) -> VisualStyle {
    match prominence {
        VisualProminence::Critical => VisualStyle {
            border_color: "red".to_string(),
            fill_color: "red!20".to_string(),
            border_width: "3pt".to_string(),
            opacity: 1.0,
            z_index: 10,
            highlight: true,
        },
        VisualProminence::High => VisualStyle {
            border_color: "orange".to_string(),
            fill_color: "orange!15".to_string(),
            border_width: "2pt".to_string(),
            opacity: 1.0,
            z_index: 8,
            highlight: true,
        },
        VisualProminence::Medium => VisualStyle {
            border_color: "yellow".to_string(),
            fill_color: "yellow!10".to_string(),
            border_width: "1.5pt".to_string(),
            opacity: 1.0,
            z_index: 6,
            highlight: true,
        },
        VisualProminence::Low => VisualStyle {
            border_color: "blue".to_string(),
            fill_color: "blue!5".to_string(),
            border_width: "1pt".to_string(),
            opacity: 1.0,
            z_index: 4,
            highlight: false,
        },
        VisualProminence::Minimal => VisualStyle {
            border_color: "gray".to_string(),
            fill_color: "gray!5".to_string(),
            border_width: "0.5pt".to_string(),
            opacity: 0.7,
            z_index: 2,
            highlight: false,
        },
    }
}

fn assignee_workloads(tasks: &[Task]) -> HashMap<String, usize> {
    let mut workloads = HashMap::new();
    for task in tasks {
        if let Some(assignee) = &task.assignee {
            *workloads.entry(assignee.clone()).or_default() += 1;
        }
    }
    workloads
}

fn conflicts_for<'a>(analysis: &'a ConflictAnalysis, task_id: &str) -> Vec<&'a CategorizedConflict> {
    analysis
        .conflicts
        .iter()
        .filter(|c| c.overlap.involves(task_id))
        .collect()
}

fn task_recommendations(factors: &HashMap<PriorityFactor, f64>) -> Vec<String> {
    let mut recommendations = Vec::new();
    let get = |f: PriorityFactor| factors.get(&f).copied().unwrap_or(0.0);

    if get(PriorityFactor::Conflict) > 5.0 {
        recommendations.push("High conflict impact - resolve conflicts first".to_string());
    }
    if get(PriorityFactor::Timeline) > 8.0 {
        recommendations.push("Urgent timeline - prioritize execution".to_string());
    }
    if get(PriorityFactor::Resource) > 3.0 {
        recommendations.push("Resource contention - consider reassignment".to_string());
    }
    if get(PriorityFactor::Dependency) > 5.0 {
        recommendations.push("Blocks other work - ensure prerequisites are met".to_string());
    }
    if get(PriorityFactor::Milestone) > 10.0 {
        recommendations.push("Milestone - protect the completion date".to_string());
    }

    recommendations
}

fn ranking_recommendations(
    priorities: &[TaskPriority],
    conflicts: &ConflictAnalysis,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let critical = priorities.iter().filter(|p| p.prominence == VisualProminence::Critical).count();
    if critical > 0 {
        recommendations.push(format!("{} critical tasks require immediate attention", critical));
    }

    let high = priorities.iter().filter(|p| p.prominence == VisualProminence::High).count();
    if high > 0 {
        recommendations.push(format!("{} high priority tasks need focus", high));
    }

    let critical_conflicts = conflicts.severity_counts.get("critical").copied().unwrap_or(0);
    if critical_conflicts > 0 {
        recommendations.push(format!("{} critical conflicts need resolution", critical_conflicts));
    }

    if !priorities.is_empty() && critical as f64 / priorities.len() as f64 > 0.3 {
        recommendations.push("High ratio of critical tasks - consider spreading the schedule".to_string());
    }

    recommendations
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

    fn ranker() -> PriorityRanker {
        PriorityRanker::new().with_reference_date(day(1))
    }

    #[test]
    fn milestones_outrank_ordinary_tasks() {
        let mut milestone = make_task(1, 5, 10);
        milestone.is_milestone = true;
        milestone.priority = 5;
        let plain = make_task(2, 20, 25);

        let ranking = ranker().rank_tasks(&[plain.clone(), milestone.clone()]);

        assert_eq!(ranking.priorities[0].task_id, "task-1");
        assert_eq!(ranking.priorities[0].display_order, 1);
        assert!(ranking.priorities[0].score > ranking.priorities[1].score);
    }

    #[test]
    fn conflict_pressure_raises_the_score() {
        let isolated = make_task(1, 1, 5);
        let crowded_a = make_task(2, 10, 15);
        let crowded_b = make_task(3, 10, 15);

        let ranking = ranker().rank_tasks(&[isolated, crowded_a, crowded_b]);

        let isolated_score = ranking.for_task("task-1").unwrap().score;
        let crowded_score = ranking.for_task("task-2").unwrap().score;
        assert!(crowded_score > isolated_score);
    }

    #[test]
    fn normalized_score_stays_in_unit_interval() {
        let tasks: Vec<Task> = (1..=10)
            .map(|i| {
                let mut t = make_task(i, 5, 10);
                t.is_milestone = i % 2 == 0;
                t.priority = 5;
                t
            })
            .collect();

        let ranking = ranker().rank_tasks(&tasks);
        for priority in &ranking.priorities {
            assert!(priority.normalized_score >= 0.0 && priority.normalized_score <= 1.0);
        }
    }

    #[test]
    fn equal_tasks_keep_input_order() {
        let tasks = vec![make_task(1, 20, 25), make_task(2, 20, 25), make_task(3, 20, 25)];
        let ranking = ranker().rank_tasks(&tasks);

        // All three are identical in shape; ties preserve input order
        let scores: Vec<f64> = ranking.priorities.iter().map(|p| p.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        let first_score = scores[0];
        if scores.iter().all(|s| (s - first_score).abs() < 1e-9) {
            let ids: Vec<&str> = ranking.priorities.iter().map(|p| p.task_id.as_str()).collect();
            assert_eq!(ids, vec!["task-1", "task-2", "task-3"]);
        }
    }

    #[test]
    fn prominence_buckets() {
        assert_eq!(prominence_for(16.0), VisualProminence::Critical);
        assert_eq!(prominence_for(12.0), VisualProminence::High);
        assert_eq!(prominence_for(7.0), VisualProminence::Medium);
        assert_eq!(prominence_for(4.0), VisualProminence::Low);
        assert_eq!(prominence_for(1.0), VisualProminence::Minimal);
    }

    #[test]
    fn dependency_fan_in_raises_priority() {
        let blocker = make_task(1, 20, 22);
        let mut dependent1 = make_task(2, 23, 25);
        let mut dependent2 = make_task(3, 26, 28);
        dependent1.depends_on.push("task-1".to_string());
        dependent2.depends_on.push("task-1".to_string());

        let ranking = ranker().rank_tasks(&[blocker, dependent1, dependent2]);

        let blocker_factor = ranking.for_task("task-1").unwrap().factors[&PriorityFactor::Dependency];
        assert_eq!(blocker_factor, 6.0);
    }

    #[test]
    fn critical_prominence_gets_emphatic_style() {
        let style = style_for(VisualProminence::Critical);
        assert_eq!(style.border_color, "red");
        assert!(style.highlight);
        assert_eq!(style.z_index, 10);

        let minimal = style_for(VisualProminence::Minimal);
        assert!(minimal.opacity < 1.0);
        assert!(minimal.z_index < style.z_index);
    }

    #[test]
    fn summary_counts_match_priorities() {
        let tasks = vec![make_task(1, 5, 10), make_task(2, 8, 15), make_task(3, 20, 25)];
        let ranking = ranker().rank_tasks(&tasks);

        let total: usize = ranking.prominence_summary.values().sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn empty_input_yields_empty_ranking() {
        let ranking = ranker().rank_tasks(&[]);
        assert!(ranking.priorities.is_empty());
        assert!(ranking.prominence_summary.is_empty());
    }
}
