//! Task file loading
//!
//! Tasks arrive as JSON or YAML, picked by file extension. Both a bare
//! task array and a `{ "tasks": [...] }` wrapper parse.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Task;

#[derive(Debug, Error)]
pub enum TaskFileError {
    #[error("Unsupported task file extension: {0} (expected .json, .yaml, or .yml)")]
    UnsupportedExtension(String),

    #[error("Failed to parse task file: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskFile {
    List(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

impl TaskFile {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            TaskFile::List(tasks) => tasks,
            TaskFile::Wrapped { tasks } => tasks,
        }
    }
}

/// Loads tasks from a JSON or YAML file
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file: TaskFile = match extension.as_str() {
        "json" => serde_json::from_str(&content)
            .map_err(|e| TaskFileError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON tasks: {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| TaskFileError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse YAML tasks: {}", path.display()))?,
        other => return Err(TaskFileError::UnsupportedExtension(other.to_string()).into()),
    };

    Ok(file.into_tasks())
}

/// Writes tasks as pretty-printed JSON
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<()> {
    let content = serde_json::to_string_pretty(tasks).context("Failed to serialize tasks")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write task file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_task() -> Task {
        Task::new(
            "task-1",
            "Write report",
            Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        save_tasks(&path, &[sample_task()]).unwrap();
        let loaded = load_tasks(&path).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "task-1");
        assert_eq!(loaded[0].name, "Write report");
    }

    #[test]
    fn wrapped_json_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"{"tasks": [{"id": "t1", "name": "A", "start_date": "2026-01-05T00:00:00Z", "end_date": "2026-01-10T00:00:00Z"}]}"#,
        )
        .unwrap();

        let loaded = load_tasks(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "t1");
    }

    #[test]
    fn yaml_parses_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.yaml");
        fs::write(
            &path,
            r#"
- id: t1
  name: Planning
  start_date: 2026-01-05T00:00:00Z
  end_date: 2026-01-10T00:00:00Z
- id: t2
  name: Review
  category: work
  priority: 5
  is_milestone: true
  start_date: 2026-01-08T00:00:00Z
  end_date: 2026-01-08T00:00:00Z
"#,
        )
        .unwrap();

        let loaded = load_tasks(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].priority, 3); // default
        assert_eq!(loaded[1].priority, 5);
        assert!(loaded[1].is_milestone);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.txt");
        fs::write(&path, "[]").unwrap();

        let err = load_tasks(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();

        assert!(load_tasks(&path).is_err());
    }
}
