//! The `check` command

use std::path::Path;

use anyhow::Result;

use crate::domain::{validate_tasks, ConflictCategorizer, IssueSeverity, OverlapDetector};
use crate::storage;

use super::output::Output;

/// Validates a task file and reports conflicts
///
/// Returns an error when validation finds any `Error`-level issue so the
/// process exits non-zero.
pub fn run(output: &Output, tasks_path: &Path) -> Result<()> {
    let tasks = storage::load_tasks(tasks_path)?;
    let issues = validate_tasks(&tasks);

    let analysis = OverlapDetector::new().detect_overlaps(&tasks);
    let conflicts = ConflictCategorizer::new().categorize_conflicts(&analysis, &tasks);

    let error_count = issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::Error)
        .count();

    if output.is_json() {
        output.data(&serde_json::json!({
            "issues": issues,
            "conflicts": conflicts,
            "errors": error_count,
        }));
    } else {
        if issues.is_empty() {
            println!("{} task(s), no validation issues", tasks.len());
        } else {
            for issue in &issues {
                println!(
                    "{:<8} {:<16} {:<16} {}",
                    format!("{:?}", issue.severity).to_lowercase(),
                    issue.task_id,
                    issue.field,
                    issue.message,
                );
            }
        }

        if !conflicts.conflicts.is_empty() {
            println!();
            println!("{} conflict(s):", conflicts.conflicts.len());
            for conflict in &conflicts.conflicts {
                println!(
                    "  {} / {}: {} ({:?} urgency)",
                    conflict.overlap.task1_id,
                    conflict.overlap.task2_id,
                    conflict.category.label(),
                    conflict.urgency,
                );
            }
        }

        println!();
        println!("{}", conflicts.risk_assessment);
        for recommendation in &conflicts.recommendations {
            println!("- {}", recommendation);
        }
    }

    if error_count > 0 {
        anyhow::bail!("{} validation error(s) found", error_count);
    }

    Ok(())
}
