//! # Storage Layer
//!
//! File input and output for the layout engine.
//!
//! | Data | Format | Source |
//! |------|--------|--------|
//! | Tasks | JSON or YAML array | `--tasks <file>` |
//! | Config | TOML | `--config <file>` or `calgrid.toml` |
//!
//! Reports are written to stdout by the CLI layer; this module only
//! reads inputs.

mod config;
mod tasks;

pub use config::{find_config_file, load_config, load_config_or_default, ConfigError, CONFIG_FILE};
pub use tasks::{load_tasks, save_tasks, TaskFileError};
