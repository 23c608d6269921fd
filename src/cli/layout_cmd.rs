//! The `layout` command

use std::path::Path;

use anyhow::Result;

use crate::layout::pipeline::LayoutReport;
use crate::layout::LayoutPipeline;
use crate::storage;

use super::output::Output;

pub fn run(output: &Output, tasks_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let tasks = storage::load_tasks(tasks_path)?;
    let config = storage::load_config_or_default(config_path)?;
    output.verbose_ctx("layout", &format!("Loaded {} task(s)", tasks.len()));

    let report = LayoutPipeline::new().run(&tasks, &config);

    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    print_summary(output, &report);
    Ok(())
}

fn print_summary(output: &Output, report: &LayoutReport) {
    output.success(&format!("Layout computed for {} task(s)", report.task_count));

    for issue in &report.issues {
        output.row(&[
            &format!("[{:?}]", issue.severity),
            &issue.task_id,
            &issue.field,
            &issue.message,
        ]);
    }

    output.blank();
    output.row(&[
        "overlaps",
        &report.overlaps.overlaps.len().to_string(),
        "groups",
        &report.overlaps.groups.len().to_string(),
    ]);
    output.row(&[
        "conflicts",
        &report.conflicts.conflicts.len().to_string(),
        "urgent",
        &report.conflicts.urgent_conflicts().len().to_string(),
    ]);
    output.row(&[
        "bars",
        &report.months.bars.len().to_string(),
        "continuations",
        &report.months.continuations.len().to_string(),
    ]);

    if let Some(strategy) = report.resolution.strategy {
        output.row(&["strategy", strategy.label()]);
    }

    output.blank();
    let metrics = &report.positioned.metrics;
    output.row(&[
        "alignment",
        &format!("{:.2}", metrics.alignment_score),
        "spacing",
        &format!("{:.2}", metrics.spacing_score),
    ]);
    output.row(&[
        "balance",
        &format!("{:.2}", metrics.visual_balance),
        "utilization",
        &format!("{:.2}", metrics.grid_utilization),
    ]);

    output.blank();
    for recommendation in &report.resolution.recommendations {
        output.row(&["-", recommendation]);
    }
}
