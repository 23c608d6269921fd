//! Conflict categorization over detected overlaps
//!
//! A rule table maps each overlap to a conflict category. Rules are kept in
//! evaluation order (priority descending) and the first matching rule wins.
//! Custom rules are inserted at the front of the table and therefore win
//! over every default rule.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use super::overlap::{OverlapAnalysis, OverlapType, Severity, TaskOverlap};
use super::task::Task;

/// Category assigned to a conflict by the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictCategory {
    ScheduleConflict,
    MilestoneConflict,
    AssigneeConflict,
    PriorityConflict,
    TimelineConflict,
    CategoryConflict,
}

impl ConflictCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ConflictCategory::ScheduleConflict => "schedule",
            ConflictCategory::MilestoneConflict => "milestone",
            ConflictCategory::AssigneeConflict => "assignee",
            ConflictCategory::PriorityConflict => "priority",
            ConflictCategory::TimelineConflict => "timeline",
            ConflictCategory::CategoryConflict => "category",
        }
    }
}

/// Predicate a rule evaluates against an overlap and its two tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum RuleCondition {
    /// Overlap severity equals the given severity
    SeverityIs(Severity),
    /// Overlap type equals the given type
    OverlapTypeIs(OverlapType),
    /// At least one of the two tasks is a milestone
    AnyMilestone,
    /// Both tasks share a non-empty assignee
    SameAssignee,
    /// Both tasks have at least the given priority
    MinPriorityBoth(u8),
    /// Both tasks have the same category
    SameCategory,
    /// Overlap percentage is at least the given fraction
    MinPercentage(f64),
    /// Matches everything; the fallback rule
    Always,
}

impl RuleCondition {
    pub fn matches(&self, overlap: &TaskOverlap, task1: &Task, task2: &Task) -> bool {
        match self {
            RuleCondition::SeverityIs(severity) => overlap.severity == *severity,
            RuleCondition::OverlapTypeIs(overlap_type) => overlap.overlap_type == *overlap_type,
            RuleCondition::AnyMilestone => task1.is_milestone || task2.is_milestone,
            RuleCondition::SameAssignee => task1.same_assignee(task2),
            RuleCondition::MinPriorityBoth(min) => task1.priority >= *min && task2.priority >= *min,
            RuleCondition::SameCategory => task1.category == task2.category,
            RuleCondition::MinPercentage(min) => overlap.overlap_percentage >= *min,
            RuleCondition::Always => true,
        }
    }
}

/// One entry in the categorization rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRule {
    pub name: String,
    pub description: String,
    pub condition: RuleCondition,
    pub category: ConflictCategory,
    pub priority: i32,
}

/// Assessment levels shared by impact and risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentLevel {
    Low,
    Medium,
    High,
}

/// Urgency of resolving a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Urgent,
}

/// A suggested way to resolve a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub strategy: String,

    /// One-line summary of what the strategy does
    pub description: String,

    pub actions: Vec<String>,
    pub effort: AssessmentLevel,
    pub expected_impact: AssessmentLevel,

    /// Preference order among suggestions; higher is tried first
    pub priority: i32,
}

/// An overlap enriched with category and assessments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedConflict {
    pub overlap: TaskOverlap,
    pub rule_name: String,
    pub category: ConflictCategory,

    /// Finer-grained label from the overlap percentage
    pub sub_category: String,

    /// What caused the conflict, from the matched rule
    pub root_cause: String,

    pub impact: AssessmentLevel,
    pub risk: AssessmentLevel,
    pub urgency: UrgencyLevel,
    pub complexity: AssessmentLevel,

    pub resolution: Resolution,
    pub alternatives: Vec<Resolution>,
}

/// Result of categorizing all overlaps in an analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    pub conflicts: Vec<CategorizedConflict>,
    pub category_counts: HashMap<String, usize>,
    pub severity_counts: HashMap<String, usize>,

    /// Overall risk summary for the whole task set
    pub risk_assessment: String,

    /// Set-level advice; never empty after categorization, a clean set
    /// gets a positive message
    pub recommendations: Vec<String>,
}

impl ConflictAnalysis {
    /// Returns conflicts in the given category
    pub fn conflicts_by_category(&self, category: ConflictCategory) -> Vec<&CategorizedConflict> {
        self.conflicts.iter().filter(|c| c.category == category).collect()
    }

    /// Returns conflicts needing urgent attention
    pub fn urgent_conflicts(&self) -> Vec<&CategorizedConflict> {
        self.conflicts.iter().filter(|c| c.urgency == UrgencyLevel::Urgent).collect()
    }
}

/// Categorizes overlaps with an ordered, extensible rule table
#[derive(Debug, Clone)]
pub struct ConflictCategorizer {
    /// Evaluation order: custom rules first, then defaults priority-descending
    rules: VecDeque<ConflictRule>,

    /// Overlap day count above which a critical conflict counts as long
    long_overlap_days: i64,
}

impl Default for ConflictCategorizer {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            long_overlap_days: 3,
        }
    }
}

impl ConflictCategorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rule at the front of the table
    ///
    /// Front insertion means custom rules are always evaluated before the
    /// defaults, regardless of their priority value.
    pub fn add_custom_rule(&mut self, rule: ConflictRule) {
        self.rules.push_front(rule);
    }

    /// Returns the rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &ConflictRule> {
        self.rules.iter()
    }

    /// Categorizes every overlap in the analysis
    ///
    /// Overlaps whose tasks are missing from the task set are skipped.
    pub fn categorize_conflicts(
        &self,
        analysis: &OverlapAnalysis,
        tasks: &[Task],
    ) -> ConflictAnalysis {
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut conflicts = Vec::new();
        for overlap in &analysis.overlaps {
            let (Some(task1), Some(task2)) = (
                by_id.get(overlap.task1_id.as_str()),
                by_id.get(overlap.task2_id.as_str()),
            ) else {
                continue;
            };
            conflicts.push(self.categorize(overlap, task1, task2));
        }

        let mut category_counts: HashMap<String, usize> = HashMap::new();
        let mut severity_counts: HashMap<String, usize> = HashMap::new();
        for conflict in &conflicts {
            *category_counts.entry(conflict.category.label().to_string()).or_default() += 1;
            *severity_counts.entry(conflict.overlap.severity.label().to_string()).or_default() += 1;
        }

        let risk_assessment = assess_overall_risk(&conflicts);
        let recommendations = build_recommendations(&conflicts);

        ConflictAnalysis {
            conflicts,
            category_counts,
            severity_counts,
            risk_assessment,
            recommendations,
        }
    }

    /// Categorizes a single overlap; the first matching rule wins
    fn categorize(&self, overlap: &TaskOverlap, task1: &Task, task2: &Task) -> CategorizedConflict {
        let rule = self
            .rules
            .iter()
            .find(|r| r.condition.matches(overlap, task1, task2))
            .cloned()
            .unwrap_or_else(fallback_rule);

        let impact = self.assess_impact(overlap, task1, task2);
        let risk = assess_risk(overlap, task1, task2);
        let urgency = assess_urgency(overlap, task1, task2);
        let complexity = assess_complexity(overlap, task1, task2);
        let resolution = resolution_for(rule.category, task1, task2);
        let alternatives = alternative_resolutions();
        let root_cause = if rule.description.is_empty() {
            overlap.conflict_info.reason.clone()
        } else {
            rule.description.clone()
        };

        CategorizedConflict {
            overlap: overlap.clone(),
            rule_name: rule.name,
            category: rule.category,
            sub_category: sub_category(overlap.overlap_percentage),
            root_cause,
            impact,
            risk,
            urgency,
            complexity,
            resolution,
            alternatives,
        }
    }

    /// Impact is HIGH only for critical, long, personally-entangled conflicts
    fn assess_impact(&self, overlap: &TaskOverlap, task1: &Task, task2: &Task) -> AssessmentLevel {
        let entangled = task1.same_assignee(task2) || task1.is_milestone || task2.is_milestone;
        if overlap.severity == Severity::Critical
            && overlap.overlap_days > self.long_overlap_days
            && entangled
        {
            return AssessmentLevel::High;
        }

        if conflict_score(overlap, task1, task2) >= 6 {
            AssessmentLevel::Medium
        } else {
            AssessmentLevel::Low
        }
    }
}

/// Additive score shared by the risk and impact assessments
fn conflict_score(overlap: &TaskOverlap, task1: &Task, task2: &Task) -> i32 {
    let mut score = match overlap.severity {
        Severity::Critical => 5,
        Severity::High => 3,
        Severity::Medium => 2,
        Severity::Low => 1,
    };

    score += (task1.priority.max(task2.priority) / 2) as i32;

    if overlap.overlap_days > 7 {
        score += 2;
    } else if overlap.overlap_days > 3 {
        score += 1;
    }

    if task1.same_assignee(task2) {
        score += 3;
    }
    if task1.category == task2.category {
        score += 1;
    }
    if task1.is_milestone || task2.is_milestone {
        score += 2;
    }

    score
}

fn assess_risk(overlap: &TaskOverlap, task1: &Task, task2: &Task) -> AssessmentLevel {
    let score = conflict_score(overlap, task1, task2);
    if score >= 8 {
        AssessmentLevel::High
    } else if score >= 5 {
        AssessmentLevel::Medium
    } else {
        AssessmentLevel::Low
    }
}

fn assess_urgency(overlap: &TaskOverlap, task1: &Task, task2: &Task) -> UrgencyLevel {
    let mut score = match overlap.severity {
        Severity::Critical => 4,
        Severity::High => 2,
        Severity::Medium => 1,
        Severity::Low => 0,
    };

    if task1.is_milestone || task2.is_milestone {
        score += 2;
    }
    if task1.priority >= 4 || task2.priority >= 4 {
        score += 2;
    }
    if overlap.overlap_percentage >= 0.8 {
        score += 2;
    }

    if score >= 8 {
        UrgencyLevel::Urgent
    } else if score >= 5 {
        UrgencyLevel::High
    } else if score >= 3 {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

fn assess_complexity(overlap: &TaskOverlap, task1: &Task, task2: &Task) -> AssessmentLevel {
    let mut score = 0;
    if task1.same_assignee(task2) {
        score += 2;
    }
    if task1.is_milestone || task2.is_milestone {
        score += 2;
    }
    if matches!(overlap.overlap_type, OverlapType::Identical | OverlapType::Nested) {
        score += 2;
    }
    if task1.priority >= 4 && task2.priority >= 4 {
        score += 1;
    }
    if overlap.overlap_days > 7 {
        score += 1;
    }

    if score >= 6 {
        AssessmentLevel::High
    } else if score >= 3 {
        AssessmentLevel::Medium
    } else {
        AssessmentLevel::Low
    }
}

/// One-line risk summary over all categorized conflicts
fn assess_overall_risk(conflicts: &[CategorizedConflict]) -> String {
    if conflicts.is_empty() {
        return "No conflicts detected; schedule risk is low".to_string();
    }

    let high = conflicts.iter().filter(|c| c.risk == AssessmentLevel::High).count();
    let medium = conflicts.iter().filter(|c| c.risk == AssessmentLevel::Medium).count();

    if high > 0 {
        format!(
            "High risk: {} of {} conflict(s) carry a high risk of schedule slip",
            high,
            conflicts.len()
        )
    } else if medium > 0 {
        format!(
            "Moderate risk: {} of {} conflict(s) need monitoring",
            medium,
            conflicts.len()
        )
    } else {
        format!("Low risk: {} minor conflict(s) detected", conflicts.len())
    }
}

/// Set-level advice; a clean set gets a positive message
fn build_recommendations(conflicts: &[CategorizedConflict]) -> Vec<String> {
    if conflicts.is_empty() {
        return vec!["No conflicts found; the schedule is clean".to_string()];
    }

    let mut recommendations = Vec::new();

    let urgent = conflicts.iter().filter(|c| c.urgency == UrgencyLevel::Urgent).count();
    if urgent > 0 {
        recommendations.push(format!("Resolve the {} urgent conflict(s) first", urgent));
    }

    if conflicts.iter().any(|c| c.category == ConflictCategory::MilestoneConflict) {
        recommendations
            .push("Protect milestone dates; move the entangled tasks instead".to_string());
    }
    if conflicts.iter().any(|c| c.category == ConflictCategory::AssigneeConflict) {
        recommendations
            .push("Rebalance double-booked assignees or serialize their work".to_string());
    }

    recommendations.push(format!(
        "Apply the suggested resolution for each of the {} conflict(s)",
        conflicts.len()
    ));

    recommendations
}

fn sub_category(percentage: f64) -> String {
    if percentage >= 0.8 {
        "High Overlap".to_string()
    } else if percentage >= 0.5 {
        "Medium Overlap".to_string()
    } else {
        "Low Overlap".to_string()
    }
}

fn resolution_for(category: ConflictCategory, task1: &Task, task2: &Task) -> Resolution {
    match category {
        ConflictCategory::ScheduleConflict => Resolution {
            strategy: "Reschedule".to_string(),
            description: "Move the lower-priority task out of the contested range".to_string(),
            actions: vec![
                format!("Move '{}' to a free date range", lower_priority(task1, task2).name),
                "Re-check the calendar for new overlaps".to_string(),
            ],
            effort: AssessmentLevel::Medium,
            expected_impact: AssessmentLevel::High,
            priority: 3,
        },
        ConflictCategory::MilestoneConflict => Resolution {
            strategy: "Protect the milestone".to_string(),
            description: "Keep the milestone fixed and move everything else".to_string(),
            actions: vec![
                "Keep the milestone date fixed".to_string(),
                format!("Shift '{}' around the milestone", non_milestone(task1, task2).name),
            ],
            effort: AssessmentLevel::Medium,
            expected_impact: AssessmentLevel::High,
            priority: 3,
        },
        ConflictCategory::AssigneeConflict => Resolution {
            strategy: "Rebalance assignments".to_string(),
            description: "Spread the double-booked work across people or time".to_string(),
            actions: vec![
                "Reassign one task to another person".to_string(),
                "Or serialize the two tasks for the shared assignee".to_string(),
            ],
            effort: AssessmentLevel::High,
            expected_impact: AssessmentLevel::High,
            priority: 3,
        },
        ConflictCategory::PriorityConflict => Resolution {
            strategy: "Sequence by priority".to_string(),
            description: "Run the more important task first".to_string(),
            actions: vec![
                format!("Schedule '{}' first", higher_priority(task1, task2).name),
                format!("Delay '{}' until it completes", lower_priority(task1, task2).name),
            ],
            effort: AssessmentLevel::Low,
            expected_impact: AssessmentLevel::Medium,
            priority: 2,
        },
        ConflictCategory::TimelineConflict => Resolution {
            strategy: "Compress timelines".to_string(),
            description: "Shrink the overlap instead of moving whole tasks".to_string(),
            actions: vec![
                "Shorten the longer task where possible".to_string(),
                "Accept the remaining overlap if both must run".to_string(),
            ],
            effort: AssessmentLevel::Medium,
            expected_impact: AssessmentLevel::Medium,
            priority: 2,
        },
        ConflictCategory::CategoryConflict => Resolution {
            strategy: "Consolidate category work".to_string(),
            description: "Batch related tasks so they stop crowding the same days".to_string(),
            actions: vec![
                "Merge or batch same-category tasks".to_string(),
                "Spread the rest across the month".to_string(),
            ],
            effort: AssessmentLevel::Low,
            expected_impact: AssessmentLevel::Low,
            priority: 1,
        },
    }
}

fn alternative_resolutions() -> Vec<Resolution> {
    vec![
        Resolution {
            strategy: "Task Merging".to_string(),
            description: "Fold the two tasks into a single unit of work".to_string(),
            actions: vec!["Combine both tasks into one with a unified scope".to_string()],
            effort: AssessmentLevel::Medium,
            expected_impact: AssessmentLevel::Medium,
            priority: 2,
        },
        Resolution {
            strategy: "Timeline Extension".to_string(),
            description: "Widen the calendar window until both tasks fit".to_string(),
            actions: vec!["Extend the calendar window so both tasks fit serially".to_string()],
            effort: AssessmentLevel::Low,
            expected_impact: AssessmentLevel::Medium,
            priority: 1,
        },
        Resolution {
            strategy: "Resource Addition".to_string(),
            description: "Add capacity so the overlap stops being a conflict".to_string(),
            actions: vec!["Add an assignee so the tasks can truly run in parallel".to_string()],
            effort: AssessmentLevel::High,
            expected_impact: AssessmentLevel::High,
            priority: 3,
        },
    ]
}

fn higher_priority<'a>(task1: &'a Task, task2: &'a Task) -> &'a Task {
    if task1.priority >= task2.priority {
        task1
    } else {
        task2
    }
}

fn lower_priority<'a>(task1: &'a Task, task2: &'a Task) -> &'a Task {
    if task1.priority < task2.priority {
        task1
    } else {
        task2
    }
}

fn non_milestone<'a>(task1: &'a Task, task2: &'a Task) -> &'a Task {
    if task1.is_milestone {
        task2
    } else {
        task1
    }
}

fn fallback_rule() -> ConflictRule {
    ConflictRule {
        name: "Generic Schedule Conflict".to_string(),
        description: "Any overlap not matched by a more specific rule".to_string(),
        condition: RuleCondition::Always,
        category: ConflictCategory::ScheduleConflict,
        priority: 0,
    }
}

/// Default rule table, priority descending
fn default_rules() -> VecDeque<ConflictRule> {
    VecDeque::from(vec![
        ConflictRule {
            name: "Critical Time Overlap".to_string(),
            description: "Two tasks occupy the same date range".to_string(),
            condition: RuleCondition::SeverityIs(Severity::Critical),
            category: ConflictCategory::ScheduleConflict,
            priority: 100,
        },
        ConflictRule {
            name: "Milestone Conflict".to_string(),
            description: "A milestone is entangled in an overlap".to_string(),
            condition: RuleCondition::AnyMilestone,
            category: ConflictCategory::MilestoneConflict,
            priority: 90,
        },
        ConflictRule {
            name: "Same Assignee Overlap".to_string(),
            description: "One person is double-booked".to_string(),
            condition: RuleCondition::SameAssignee,
            category: ConflictCategory::AssigneeConflict,
            priority: 85,
        },
        ConflictRule {
            name: "High Priority Overlap".to_string(),
            description: "Two high-priority tasks compete for the same days".to_string(),
            condition: RuleCondition::MinPriorityBoth(4),
            category: ConflictCategory::PriorityConflict,
            priority: 80,
        },
        ConflictRule {
            name: "Nested Tasks".to_string(),
            description: "One task runs entirely inside another".to_string(),
            condition: RuleCondition::OverlapTypeIs(OverlapType::Nested),
            category: ConflictCategory::TimelineConflict,
            priority: 70,
        },
        ConflictRule {
            name: "Same Category Overlap".to_string(),
            description: "Same-category tasks crowd the same days".to_string(),
            condition: RuleCondition::SameCategory,
            category: ConflictCategory::CategoryConflict,
            priority: 60,
        },
        ConflictRule {
            name: "Partial Overlap".to_string(),
            description: "Tasks overlap for part of their duration".to_string(),
            condition: RuleCondition::MinPercentage(0.0),
            category: ConflictCategory::TimelineConflict,
            priority: 50,
        },
        fallback_rule(),
    ])
}
