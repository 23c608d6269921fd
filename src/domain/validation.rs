//! Input validation for task sets
//!
//! Validation never aborts the pipeline: problems are collected as
//! severity-tagged issues and the engines degrade to neutral results.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::task::Task;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

impl IssueSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            IssueSeverity::Info => "info",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        }
    }
}

/// A single non-fatal problem found in the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,

    /// Task the issue refers to, empty for set-level issues
    pub task_id: String,

    /// Field the issue refers to, empty when not field-specific
    pub field: String,

    pub message: String,
}

impl ValidationIssue {
    pub fn error(task_id: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            task_id: task_id.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(task_id: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            task_id: task_id.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn info(task_id: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Info,
            task_id: task_id.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validates a task set, returning all issues found
///
/// Layout proceeds with the data as given; errors flag what callers
/// should fix, warnings and infos are advisory.
pub fn validate_tasks(tasks: &[Task]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for task in tasks {
        if task.id.is_empty() {
            issues.push(ValidationIssue::error(&task.id, "id", "task has an empty id"));
        } else if !seen.insert(task.id.as_str()) {
            issues.push(ValidationIssue::error(
                &task.id,
                "id",
                format!("duplicate task id '{}'", task.id),
            ));
        }

        if task.name.is_empty() {
            issues.push(ValidationIssue::warning(&task.id, "name", "task has an empty name"));
        }

        if task.end_date < task.start_date {
            issues.push(ValidationIssue::error(
                &task.id,
                "end_date",
                format!(
                    "end date {} is before start date {}",
                    task.end_date.format("%Y-%m-%d"),
                    task.start_date.format("%Y-%m-%d")
                ),
            ));
        }

        if task.priority < 1 || task.priority > 5 {
            issues.push(ValidationIssue::warning(
                &task.id,
                "priority",
                format!("priority {} is outside 1-5", task.priority),
            ));
        }

        for dep in &task.depends_on {
            if dep == &task.id {
                issues.push(ValidationIssue::error(
                    &task.id,
                    "depends_on",
                    "task depends on itself",
                ));
            } else if !ids.contains(dep.as_str()) {
                issues.push(ValidationIssue::warning(
                    &task.id,
                    "depends_on",
                    format!("unknown dependency '{}'", dep),
                ));
            }
        }
    }

    if tasks.is_empty() {
        issues.push(ValidationIssue::info("", "", "task set is empty"));
    }

    issues
}
