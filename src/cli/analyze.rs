//! The `overlaps` and `rank` commands

use std::path::Path;

use anyhow::Result;
use chrono::Duration;

use crate::domain::{OverlapDetector, PriorityRanker};
use crate::storage;

use super::output::Output;

/// Detects and prints task overlaps
pub fn overlaps(output: &Output, tasks_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let tasks = storage::load_tasks(tasks_path)?;
    let config = storage::load_config_or_default(config_path)?;

    let analysis = OverlapDetector::new()
        .with_precision(Duration::hours(config.overlap.precision_hours))
        .with_severity_cutoffs(
            config.overlap.high_severity_cutoff,
            config.overlap.medium_severity_cutoff,
        )
        .detect_overlaps(&tasks);

    output.verbose_ctx(
        "overlaps",
        &format!(
            "{} overlap(s) in {} group(s)",
            analysis.overlaps.len(),
            analysis.groups.len()
        ),
    );

    if output.is_json() {
        output.data(&analysis);
        return Ok(());
    }

    if analysis.overlaps.is_empty() {
        println!("No overlaps among {} task(s)", tasks.len());
        return Ok(());
    }

    println!("{:<16} {:<16} {:<10} {:<10} DAYS  PCT", "TASK", "TASK", "TYPE", "SEVERITY");
    println!("{}", "-".repeat(70));
    for overlap in &analysis.overlaps {
        println!(
            "{:<16} {:<16} {:<10} {:<10} {:<5} {:.0}%",
            overlap.task1_id,
            overlap.task2_id,
            overlap.overlap_type.label(),
            overlap.severity.label(),
            overlap.overlap_days,
            overlap.overlap_percentage * 100.0,
        );
    }

    println!();
    for group in &analysis.groups {
        println!("{}: {}", group.group_id, group.task_ids.join(", "));
    }

    Ok(())
}

/// Ranks tasks by priority and prints the ordering
pub fn rank(
    output: &Output,
    tasks_path: &Path,
    config_path: Option<&Path>,
    top: Option<usize>,
) -> Result<()> {
    let tasks = storage::load_tasks(tasks_path)?;
    let config = storage::load_config_or_default(config_path)?;

    let mut ranker = PriorityRanker::new();
    if let Some(start) = config.calendar_start {
        ranker = ranker.with_reference_date(start);
    }
    let ranking = ranker.rank_tasks(&tasks);

    let shown = top.unwrap_or(ranking.priorities.len());

    if output.is_json() {
        output.data(&ranking.top(shown));
        return Ok(());
    }

    println!("{:<5} {:<16} {:<8} {:<10} PROMINENCE", "RANK", "TASK", "SCORE", "NORM");
    println!("{}", "-".repeat(60));
    for priority in ranking.top(shown) {
        println!(
            "{:<5} {:<16} {:<8.2} {:<10.2} {}",
            priority.display_order,
            priority.task_id,
            priority.score,
            priority.normalized_score,
            priority.prominence.label(),
        );
    }

    if !ranking.recommendations.is_empty() {
        println!();
        for recommendation in &ranking.recommendations {
            println!("- {}", recommendation);
        }
    }

    Ok(())
}
