//! Vertical stacking refinement
//!
//! Takes the stacks produced by the smart stacking pass and recomputes
//! heights from prominence and duration, picks an alignment mode per
//! stack, and compresses or spreads stacks to fit the available height.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{PriorityRanking, Task, VisualProminence};

use super::config::{GridConfig, StackingConfig};
use super::scoring;
use super::stacking::StackingResult;

/// How tasks are distributed within a stack's vertical space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    /// Pack tasks at the top; used when a critical task is present
    Top,
    /// Spread leftover space evenly between tasks
    Even,
    /// Give high-score tasks tighter placement near the top
    PriorityWeighted,
}

/// A task after vertical refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticallyStackedTask {
    pub task_id: String,
    pub y: f64,
    pub height: f64,

    /// Bar width in layout units, carried over from the stacking rule
    pub width: f64,

    /// Seeded from the strongest member rule and decreasing with stack
    /// depth, so upper bars draw over lower ones
    pub z_index: i32,

    pub prominence: VisualProminence,
}

/// A vertically refined stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalStack {
    pub group_id: String,
    pub alignment: AlignmentMode,
    pub tasks: Vec<VerticallyStackedTask>,
    pub total_height: f64,

    /// True when heights had to be scaled down to fit
    pub compressed: bool,
}

/// Metrics for a vertical layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerticalMetrics {
    pub space_utilization: f64,
    pub visual_balance: f64,
}

/// Result of the vertical stacking pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerticalLayout {
    pub stacks: Vec<VerticalStack>,
    pub metrics: VerticalMetrics,
}

impl VerticalLayout {
    /// Returns the refined entry for a task, if present
    pub fn task(&self, task_id: &str) -> Option<&VerticallyStackedTask> {
        self.stacks
            .iter()
            .flat_map(|s| s.tasks.iter())
            .find(|t| t.task_id == task_id)
    }
}

/// Recomputes stack geometry from prominence and duration
#[derive(Debug, Clone)]
pub struct VerticalStackingEngine {
    config: StackingConfig,
    grid: GridConfig,
}

impl Default for VerticalStackingEngine {
    fn default() -> Self {
        Self {
            config: StackingConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl VerticalStackingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StackingConfig, grid: GridConfig) -> Self {
        Self { config, grid }
    }

    /// Refines every stack of the stacking result
    pub fn stack_tasks_vertically(
        &self,
        stacking: &StackingResult,
        ranking: &PriorityRanking,
        tasks: &[Task],
    ) -> VerticalLayout {
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        let stacks: Vec<VerticalStack> = stacking
            .stacks
            .iter()
            .map(|stack| self.refine_stack(stack.group_id.clone(), stack, ranking, &by_id))
            .collect();

        let metrics = self.compute_metrics(&stacks);
        VerticalLayout { stacks, metrics }
    }

    fn refine_stack(
        &self,
        group_id: String,
        stack: &super::stacking::TaskStack,
        ranking: &PriorityRanking,
        by_id: &HashMap<&str, &Task>,
    ) -> VerticalStack {
        let mut refined: Vec<VerticallyStackedTask> = Vec::with_capacity(stack.tasks.len());
        let base_z = stack.tasks.iter().map(|m| m.z_index).max().unwrap_or(0);
        let mut y = 0.0;

        for (depth, member) in stack.tasks.iter().enumerate() {
            let task = by_id.get(member.task_id.as_str());
            let duration_days = task.map(|t| t.duration_days()).unwrap_or(1);

            let height = self.height_for(member.prominence, duration_days);

            refined.push(VerticallyStackedTask {
                task_id: member.task_id.clone(),
                y,
                height,
                width: member.width,
                z_index: base_z - depth as i32,
                prominence: member.prominence,
            });

            y += height + self.config.vertical_spacing;
        }

        let alignment = alignment_for(&refined);
        self.apply_alignment(&mut refined, alignment, ranking);

        let total_height = refined
            .last()
            .map(|t| t.y + t.height)
            .unwrap_or(0.0);

        let compressed = self.compress_if_needed(&mut refined);
        let total_height = if compressed {
            refined.last().map(|t| t.y + t.height).unwrap_or(0.0)
        } else {
            total_height
        };

        VerticalStack {
            group_id,
            alignment,
            tasks: refined,
            total_height,
            compressed,
        }
    }

    /// Height from base size, prominence, and duration bucket
    fn height_for(&self, prominence: VisualProminence, duration_days: i64) -> f64 {
        let duration_multiplier = if duration_days <= 1 {
            0.8
        } else if duration_days <= 7 {
            1.0
        } else {
            1.2
        };

        (self.config.base_height * prominence.height_multiplier() * duration_multiplier)
            .clamp(self.config.min_height, self.config.max_height)
    }

    fn apply_alignment(
        &self,
        tasks: &mut [VerticallyStackedTask],
        alignment: AlignmentMode,
        ranking: &PriorityRanking,
    ) {
        if tasks.is_empty() {
            return;
        }

        let used: f64 = tasks.iter().map(|t| t.height).sum::<f64>()
            + self.config.vertical_spacing * (tasks.len() - 1) as f64;
        let leftover = self.grid.available_height - used;
        if leftover <= 0.0 {
            return;
        }

        match alignment {
            AlignmentMode::Top => {}
            AlignmentMode::Even => {
                // Equal extra gap before each task and after the last
                let gap = leftover / (tasks.len() + 1) as f64;
                let mut y = gap;
                for task in tasks.iter_mut() {
                    task.y = y;
                    y += task.height + self.config.vertical_spacing + gap;
                }
            }
            AlignmentMode::PriorityWeighted => {
                // Lower-score tasks absorb more of the leftover space, so
                // high-score tasks stay packed near the top
                let scores: Vec<f64> = tasks
                    .iter()
                    .map(|t| {
                        ranking
                            .for_task(&t.task_id)
                            .map(|p| p.normalized_score)
                            .unwrap_or(0.0)
                    })
                    .collect();
                let inverse_total: f64 = scores.iter().map(|s| 1.0 - s).sum();
                let even_share = 1.0 / tasks.len() as f64;

                let mut y = 0.0;
                for (task, score) in tasks.iter_mut().zip(scores.iter()) {
                    task.y = y;
                    let share = if inverse_total > 0.0 {
                        (1.0 - score) / inverse_total
                    } else {
                        even_share
                    };
                    y += task.height + self.config.vertical_spacing + leftover * share;
                }
            }
        }
    }

    /// Scales heights down proportionally when a stack outgrows the
    /// available space; the minimum height is respected
    fn compress_if_needed(&self, tasks: &mut [VerticallyStackedTask]) -> bool {
        let total = tasks.last().map(|t| t.y + t.height).unwrap_or(0.0);
        if total <= self.grid.available_height || tasks.is_empty() {
            return false;
        }

        let scale = self.grid.available_height / total;
        let mut y = 0.0;
        for task in tasks.iter_mut() {
            task.height = (task.height * scale).max(self.config.min_height);
            task.y = y;
            y += task.height + self.config.vertical_spacing * scale;
        }
        true
    }

    fn compute_metrics(&self, stacks: &[VerticalStack]) -> VerticalMetrics {
        if stacks.is_empty() {
            return VerticalMetrics {
                space_utilization: 0.0,
                visual_balance: 1.0,
            };
        }

        let used: f64 = stacks.iter().map(|s| s.total_height).sum();
        let available = self.grid.available_height * stacks.len() as f64;

        let heights: Vec<f64> = stacks
            .iter()
            .flat_map(|s| s.tasks.iter().map(|t| t.height))
            .collect();

        VerticalMetrics {
            space_utilization: scoring::space_efficiency(used, available),
            visual_balance: scoring::visual_balance(&heights),
        }
    }
}

/// Alignment mode from the prominence mix of a stack
///
/// Singleton stacks stay packed at the top; spreading a lone bar over
/// the whole row would float it away from its row origin.
fn alignment_for(tasks: &[VerticallyStackedTask]) -> AlignmentMode {
    if tasks.len() <= 1 {
        return AlignmentMode::Top;
    }
    if tasks.iter().any(|t| t.prominence == VisualProminence::Critical) {
        return AlignmentMode::Top;
    }
    let first = tasks.first().map(|t| t.prominence);
    if tasks.iter().all(|t| Some(t.prominence) == first) {
        AlignmentMode::Even
    } else {
        AlignmentMode::PriorityWeighted
    }
}
