//! Smart stacking of overlapping task groups
//!
//! Each overlap group becomes a stack and every ungrouped task becomes a
//! singleton stack: members are ordered by priority score, sized by the
//! first matching stacking rule, and placed top-down with uniform
//! spacing. Bounding boxes of placed members are checked against each
//! other; rules with collision avoidance push the new member below the
//! obstruction, others record the collision. Overflow is flagged when a
//! stack outgrows the configured share of the available height.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::{OverlapAnalysis, PriorityRanking, Task, VisualProminence};

use super::config::{GridConfig, StackingConfig};
use super::geometry::TaskBar;
use super::scoring;

/// Composition of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackType {
    /// Contains at least one critical-prominence task
    Critical,
    /// Contains a milestone but nothing critical
    Milestone,
    /// All members share one prominence level
    Uniform,
    /// Anything else
    Mixed,
}

/// Predicate a stacking rule evaluates per task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum StackingCondition {
    /// Task prominence is at least the given level
    MinProminence(VisualProminence),
    /// Task is a milestone
    Milestone,
    /// Task runs longer than the given day count
    LongerThanDays(i64),
    /// Task runs at most the given day count
    AtMostDays(i64),
    /// The stack has already used this fraction of the available height
    OverflowRisk(f64),
    /// Matches everything
    Always,
}

/// One entry in the stacking rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingRule {
    pub name: String,
    pub condition: StackingCondition,

    /// Multiplier applied to the base bar height
    pub height_multiplier: f64,

    /// Multiplier applied to the duration-derived bar width
    pub width_multiplier: f64,

    /// Draw order for bars sized by this rule; higher draws on top
    pub z_index: i32,

    /// When true, members are moved below an obstructing bar instead of
    /// registering a collision
    pub collision_avoidance: bool,

    /// Color the bar takes when this rule fires
    pub color: String,

    pub priority: i32,
}

/// A task placed inside a stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedTask {
    pub task_id: String,
    pub stack_index: usize,
    pub y: f64,
    pub height: f64,

    /// Bar width in layout units: duration times the rule's width
    /// multiplier
    pub width: f64,

    /// Draw order from the matched rule
    pub z_index: i32,

    pub prominence: VisualProminence,
    pub rule_name: String,
    pub color: String,
}

/// A stack built from one overlap group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStack {
    pub group_id: String,
    pub stack_type: StackType,
    pub tasks: Vec<StackedTask>,

    /// Sum of member heights plus inter-task spacing
    pub total_height: f64,

    /// Bounding-box collisions recorded among placed members
    pub collision_count: usize,

    pub overflowed: bool,
}

/// Quality metrics for a stacking result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackingMetrics {
    pub space_efficiency: f64,
    pub visual_quality: f64,
    pub collision_count: usize,
    pub overflow_count: usize,
}

/// Result of stacking all overlap groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackingResult {
    pub stacks: Vec<TaskStack>,
    pub metrics: StackingMetrics,
}

impl StackingResult {
    /// Returns the stack containing the given task, if any
    pub fn stack_for(&self, task_id: &str) -> Option<&TaskStack> {
        self.stacks.iter().find(|s| s.tasks.iter().any(|t| t.task_id == task_id))
    }
}

/// Stacks overlap groups with an ordered, extensible rule table
#[derive(Debug, Clone)]
pub struct SmartStackingEngine {
    config: StackingConfig,
    available_height: f64,
    day_width: f64,
    rules: VecDeque<StackingRule>,
}

impl Default for SmartStackingEngine {
    fn default() -> Self {
        let grid = GridConfig::default();
        Self {
            config: StackingConfig::default(),
            available_height: grid.available_height,
            day_width: grid.day_width,
            rules: default_rules(),
        }
    }
}

impl SmartStackingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StackingConfig, grid: &GridConfig) -> Self {
        Self {
            config,
            available_height: grid.available_height,
            day_width: grid.day_width,
            rules: default_rules(),
        }
    }

    /// Inserts a rule at the front of the table; custom rules win over
    /// every default rule
    pub fn add_custom_rule(&mut self, rule: StackingRule) {
        self.rules.push_front(rule);
    }

    /// Returns the rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &StackingRule> {
        self.rules.iter()
    }

    /// Builds stacks for every overlap group and a singleton stack for
    /// every ungrouped task
    pub fn stack_tasks(
        &self,
        analysis: &OverlapAnalysis,
        ranking: &PriorityRanking,
        tasks: &[Task],
    ) -> StackingResult {
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut stacks = Vec::new();
        let mut grouped: HashSet<&str> = HashSet::new();
        for group in &analysis.groups {
            grouped.extend(group.task_ids.iter().map(|id| id.as_str()));
            stacks.push(self.build_stack(group.group_id.clone(), &group.task_ids, ranking, &by_id));
        }

        for task in tasks {
            if !grouped.contains(task.id.as_str()) {
                let members = [task.id.clone()];
                stacks.push(self.build_stack(
                    format!("single_{}", task.id),
                    &members,
                    ranking,
                    &by_id,
                ));
            }
        }

        let metrics = self.compute_metrics(&stacks);
        StackingResult { stacks, metrics }
    }

    fn build_stack(
        &self,
        group_id: String,
        member_ids: &[String],
        ranking: &PriorityRanking,
        by_id: &HashMap<&str, &Task>,
    ) -> TaskStack {
        // Highest score on top
        let mut members: Vec<&str> = member_ids.iter().map(|s| s.as_str()).collect();
        members.sort_by(|a, b| {
            let score = |id: &str| ranking.for_task(id).map(|p| p.score).unwrap_or(0.0);
            score(b).partial_cmp(&score(a)).unwrap_or(std::cmp::Ordering::Equal)
        });

        // Member boxes share an x axis anchored at the earliest start
        let min_start = members
            .iter()
            .filter_map(|id| by_id.get(id).map(|t| t.start_date))
            .min();

        let overflow_limit = self.available_height * self.config.overflow_threshold;
        let mut stacked = Vec::new();
        let mut boxes: Vec<TaskBar> = Vec::with_capacity(members.len());
        let mut collision_count = 0;
        let mut y = 0.0;
        let mut overflowed = false;

        for (index, task_id) in members.iter().enumerate() {
            let prominence = ranking
                .for_task(task_id)
                .map(|p| p.prominence)
                .unwrap_or(VisualProminence::Minimal);
            let duration_days = by_id.get(task_id).map(|t| t.duration_days()).unwrap_or(1);
            let is_milestone = by_id.get(task_id).map(|t| t.is_milestone).unwrap_or(false);

            let used_fraction = if self.available_height > 0.0 {
                y / self.available_height
            } else {
                1.0
            };

            let rule = self
                .rules
                .iter()
                .find(|r| {
                    matches_rule(&r.condition, prominence, is_milestone, duration_days, used_fraction)
                })
                .cloned()
                .unwrap_or_else(default_rule);

            let height = (self.config.base_height * rule.height_multiplier)
                .clamp(self.config.min_height, self.config.max_height);
            let width = duration_days as f64 * self.day_width * rule.width_multiplier;

            let offset_days = match (min_start, by_id.get(task_id)) {
                (Some(min), Some(task)) => (task.start_date - min).num_days().max(0),
                _ => 0,
            };
            let start_x = offset_days as f64 * self.day_width;
            let mut bar = TaskBar::new(task_id.to_string(), start_x, start_x + width);
            bar.y = y;
            bar.height = height;

            let hits: Vec<&TaskBar> = boxes.iter().filter(|b| b.collides_with(&bar)).collect();
            if !hits.is_empty() {
                if rule.collision_avoidance {
                    y = hits.iter().map(|b| b.y + b.height).fold(y, f64::max);
                    bar.y = y;
                } else {
                    collision_count += hits.len();
                }
            }

            if y + height > overflow_limit {
                overflowed = true;
            }

            stacked.push(StackedTask {
                task_id: task_id.to_string(),
                stack_index: index,
                y,
                height,
                width,
                z_index: rule.z_index,
                prominence,
                rule_name: rule.name,
                color: rule.color,
            });

            boxes.push(bar);
            y += height + self.config.vertical_spacing;
        }

        let total_height = stacked.iter().map(|t| t.height).sum::<f64>()
            + self.config.vertical_spacing * stacked.len().saturating_sub(1) as f64;

        let stack_type = stack_type_of(&stacked, by_id);

        TaskStack {
            group_id,
            stack_type,
            tasks: stacked,
            total_height,
            collision_count,
            overflowed,
        }
    }

    fn compute_metrics(&self, stacks: &[TaskStack]) -> StackingMetrics {
        if stacks.is_empty() {
            return StackingMetrics {
                space_efficiency: 0.0,
                visual_quality: 1.0,
                collision_count: 0,
                overflow_count: 0,
            };
        }

        let used: f64 = stacks.iter().map(|s| s.total_height).sum();
        let available = self.available_height * stacks.len() as f64;
        let overflow_count = stacks.iter().filter(|s| s.overflowed).count();
        let overflow_rate = overflow_count as f64 / stacks.len() as f64;

        let collision_count: usize = stacks.iter().map(|s| s.collision_count).sum();
        let member_pairs: usize = stacks
            .iter()
            .map(|s| s.tasks.len() * s.tasks.len().saturating_sub(1) / 2)
            .sum();
        let collision_rate = if member_pairs > 0 {
            collision_count as f64 / member_pairs as f64
        } else {
            0.0
        };

        StackingMetrics {
            space_efficiency: scoring::space_efficiency(used, available),
            visual_quality: scoring::visual_quality(collision_rate, overflow_rate),
            collision_count,
            overflow_count,
        }
    }
}

fn matches_rule(
    condition: &StackingCondition,
    prominence: VisualProminence,
    is_milestone: bool,
    duration_days: i64,
    used_fraction: f64,
) -> bool {
    match condition {
        StackingCondition::MinProminence(min) => prominence >= *min,
        StackingCondition::Milestone => is_milestone,
        StackingCondition::LongerThanDays(days) => duration_days > *days,
        StackingCondition::AtMostDays(days) => duration_days <= *days,
        StackingCondition::OverflowRisk(fraction) => used_fraction >= *fraction,
        StackingCondition::Always => true,
    }
}

fn stack_type_of(tasks: &[StackedTask], by_id: &HashMap<&str, &Task>) -> StackType {
    if tasks.iter().any(|t| t.prominence == VisualProminence::Critical) {
        return StackType::Critical;
    }
    if tasks
        .iter()
        .any(|t| by_id.get(t.task_id.as_str()).map(|task| task.is_milestone).unwrap_or(false))
    {
        return StackType::Milestone;
    }
    let first = tasks.first().map(|t| t.prominence);
    if tasks.iter().all(|t| Some(t.prominence) == first) {
        StackType::Uniform
    } else {
        StackType::Mixed
    }
}

fn default_rule() -> StackingRule {
    StackingRule {
        name: "Default".to_string(),
        condition: StackingCondition::Always,
        height_multiplier: 1.0,
        width_multiplier: 1.0,
        z_index: 2,
        collision_avoidance: false,
        color: "gray".to_string(),
        priority: 0,
    }
}

/// Default rule table, priority descending
fn default_rules() -> VecDeque<StackingRule> {
    VecDeque::from(vec![
        StackingRule {
            name: "Critical Priority".to_string(),
            condition: StackingCondition::MinProminence(VisualProminence::Critical),
            height_multiplier: 1.5,
            width_multiplier: 1.0,
            z_index: 10,
            collision_avoidance: true,
            color: "red".to_string(),
            priority: 80,
        },
        StackingRule {
            name: "High Priority".to_string(),
            condition: StackingCondition::MinProminence(VisualProminence::High),
            height_multiplier: 1.3,
            width_multiplier: 0.9,
            z_index: 8,
            collision_avoidance: true,
            color: "orange".to_string(),
            priority: 70,
        },
        StackingRule {
            name: "Milestone".to_string(),
            condition: StackingCondition::Milestone,
            height_multiplier: 1.2,
            width_multiplier: 1.0,
            z_index: 9,
            collision_avoidance: true,
            color: "purple".to_string(),
            priority: 60,
        },
        StackingRule {
            name: "Long Duration".to_string(),
            condition: StackingCondition::LongerThanDays(7),
            height_multiplier: 1.1,
            width_multiplier: 1.0,
            z_index: 5,
            collision_avoidance: false,
            color: "teal".to_string(),
            priority: 50,
        },
        StackingRule {
            name: "Short Duration".to_string(),
            condition: StackingCondition::AtMostDays(1),
            height_multiplier: 0.7,
            width_multiplier: 0.8,
            z_index: 3,
            collision_avoidance: false,
            color: "lightgray".to_string(),
            priority: 40,
        },
        StackingRule {
            name: "Overflow Risk".to_string(),
            condition: StackingCondition::OverflowRisk(0.7),
            height_multiplier: 0.8,
            width_multiplier: 0.7,
            z_index: 4,
            collision_avoidance: true,
            color: "brown".to_string(),
            priority: 30,
        },
        default_rule(),
    ])
}
