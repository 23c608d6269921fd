//! Layout configuration
//!
//! Every tunable threshold of the layout engines lives here instead of in
//! the engine code. Bad values never abort a run: `sanitize()` swaps them
//! for defaults and reports each replacement as a validation issue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ValidationIssue;

/// Calendar grid geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of one calendar day, in layout units
    pub day_width: f64,

    /// Height of one calendar row
    pub day_height: f64,

    /// Vertical space available for stacked tasks within a row
    pub available_height: f64,

    /// Snap resolution for bar positions; 0 disables snapping
    pub snap_resolution: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            day_width: 20.0,
            day_height: 60.0,
            available_height: 200.0,
            snap_resolution: 1.0,
        }
    }
}

/// Overlap detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    /// Minimum intersection, in hours, to report an overlap
    pub precision_hours: i64,

    /// Overlap percentage at or above which severity is High
    pub high_severity_cutoff: f64,

    /// Overlap percentage at or above which severity is Medium
    pub medium_severity_cutoff: f64,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            precision_hours: 1,
            high_severity_cutoff: 0.8,
            medium_severity_cutoff: 0.5,
        }
    }
}

/// Stacking thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingConfig {
    /// Base task bar height before multipliers
    pub base_height: f64,

    /// Lower clamp for computed heights
    pub min_height: f64,

    /// Upper clamp for computed heights
    pub max_height: f64,

    /// Vertical gap between stacked bars
    pub vertical_spacing: f64,

    /// Fraction of available height beyond which a stack overflows
    pub overflow_threshold: f64,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            base_height: 20.0,
            min_height: 8.0,
            max_height: 40.0,
            vertical_spacing: 2.0,
            overflow_threshold: 0.8,
        }
    }
}

/// Positioning thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositioningConfig {
    /// Gap inserted below a bar when a collision is resolved
    pub collision_buffer: f64,

    /// Minimum acceptable distance between bars for the spacing score
    pub min_spacing: f64,

    /// Maximum useful distance between bars for the spacing score
    pub max_spacing: f64,
}

impl Default for PositioningConfig {
    fn default() -> Self {
        Self {
            collision_buffer: 2.0,
            min_spacing: 1.0,
            max_spacing: 30.0,
        }
    }
}

/// Overflow detection and layout strategy thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Vertical fill fraction that counts as overflow
    pub vertical_overflow_threshold: f64,

    /// Horizontal fill fraction that counts as overflow
    pub horizontal_overflow_threshold: f64,

    /// Area fill fraction that counts as overflow
    pub area_overflow_threshold: f64,

    /// Bars-per-cell density that counts as overflow
    pub density_overflow_threshold: f64,

    /// Task count at or below which the Stack layout strategy is chosen
    pub stack_strategy_max_tasks: usize,

    /// Task count at or below which the Cascade layout strategy is chosen
    pub cascade_strategy_max_tasks: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            vertical_overflow_threshold: 0.8,
            horizontal_overflow_threshold: 0.8,
            area_overflow_threshold: 0.9,
            density_overflow_threshold: 0.7,
            stack_strategy_max_tasks: 5,
            cascade_strategy_max_tasks: 10,
        }
    }
}

/// Full layout configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Calendar window start; tasks are positioned relative to this
    pub calendar_start: Option<DateTime<Utc>>,

    /// Calendar window end
    pub calendar_end: Option<DateTime<Utc>>,

    pub grid: GridConfig,
    pub overlap: OverlapConfig,
    pub stacking: StackingConfig,
    pub positioning: PositioningConfig,
    pub resolution: ResolutionConfig,
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces invalid values with defaults, reporting each replacement
    pub fn sanitize(&mut self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let defaults = LayoutConfig::default();

        let mut fix_dim = |value: &mut f64, default: f64, field: &str| {
            if !value.is_finite() || *value <= 0.0 {
                issues.push(ValidationIssue::warning(
                    "",
                    field,
                    format!("invalid value {}, using default {}", value, default),
                ));
                *value = default;
            }
        };

        fix_dim(&mut self.grid.day_width, defaults.grid.day_width, "grid.day_width");
        fix_dim(&mut self.grid.day_height, defaults.grid.day_height, "grid.day_height");
        fix_dim(
            &mut self.grid.available_height,
            defaults.grid.available_height,
            "grid.available_height",
        );
        fix_dim(&mut self.stacking.base_height, defaults.stacking.base_height, "stacking.base_height");
        fix_dim(&mut self.stacking.min_height, defaults.stacking.min_height, "stacking.min_height");
        fix_dim(&mut self.stacking.max_height, defaults.stacking.max_height, "stacking.max_height");

        // Snap resolution of zero is legal (disables snapping), negative is not
        if !self.grid.snap_resolution.is_finite() || self.grid.snap_resolution < 0.0 {
            issues.push(ValidationIssue::warning(
                "",
                "grid.snap_resolution",
                "negative snap resolution, using default",
            ));
            self.grid.snap_resolution = defaults.grid.snap_resolution;
        }

        if self.overlap.precision_hours < 0 {
            issues.push(ValidationIssue::warning(
                "",
                "overlap.precision_hours",
                "negative precision, using default",
            ));
            self.overlap.precision_hours = defaults.overlap.precision_hours;
        }

        let mut fix_fraction = |value: &mut f64, default: f64, field: &str| {
            if !value.is_finite() || *value <= 0.0 || *value > 1.0 {
                issues.push(ValidationIssue::warning(
                    "",
                    field,
                    format!("fraction {} outside (0, 1], using default {}", value, default),
                ));
                *value = default;
            }
        };

        fix_fraction(
            &mut self.overlap.high_severity_cutoff,
            defaults.overlap.high_severity_cutoff,
            "overlap.high_severity_cutoff",
        );
        fix_fraction(
            &mut self.overlap.medium_severity_cutoff,
            defaults.overlap.medium_severity_cutoff,
            "overlap.medium_severity_cutoff",
        );
        fix_fraction(
            &mut self.stacking.overflow_threshold,
            defaults.stacking.overflow_threshold,
            "stacking.overflow_threshold",
        );
        fix_fraction(
            &mut self.resolution.vertical_overflow_threshold,
            defaults.resolution.vertical_overflow_threshold,
            "resolution.vertical_overflow_threshold",
        );
        fix_fraction(
            &mut self.resolution.horizontal_overflow_threshold,
            defaults.resolution.horizontal_overflow_threshold,
            "resolution.horizontal_overflow_threshold",
        );
        fix_fraction(
            &mut self.resolution.area_overflow_threshold,
            defaults.resolution.area_overflow_threshold,
            "resolution.area_overflow_threshold",
        );
        fix_fraction(
            &mut self.resolution.density_overflow_threshold,
            defaults.resolution.density_overflow_threshold,
            "resolution.density_overflow_threshold",
        );

        if self.stacking.min_height > self.stacking.max_height {
            issues.push(ValidationIssue::warning(
                "",
                "stacking.min_height",
                "min_height exceeds max_height, using defaults",
            ));
            self.stacking.min_height = defaults.stacking.min_height;
            self.stacking.max_height = defaults.stacking.max_height;
        }

        if let (Some(start), Some(end)) = (self.calendar_start, self.calendar_end) {
            if end < start {
                issues.push(ValidationIssue::warning(
                    "",
                    "calendar_end",
                    "calendar window end precedes start, ignoring the window",
                ));
                self.calendar_start = None;
                self.calendar_end = None;
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_are_clean() {
        let mut config = LayoutConfig::default();
        assert!(config.sanitize().is_empty());
    }

    #[test]
    fn zero_dimensions_replaced_with_defaults() {
        let mut config = LayoutConfig::default();
        config.grid.day_width = 0.0;
        config.stacking.base_height = -5.0;

        let issues = config.sanitize();
        assert_eq!(issues.len(), 2);
        assert_eq!(config.grid.day_width, 20.0);
        assert_eq!(config.stacking.base_height, 20.0);
    }

    #[test]
    fn out_of_range_fractions_replaced() {
        let mut config = LayoutConfig::default();
        config.stacking.overflow_threshold = 1.5;
        config.resolution.density_overflow_threshold = 0.0;

        let issues = config.sanitize();
        assert_eq!(issues.len(), 2);
        assert_eq!(config.stacking.overflow_threshold, 0.8);
        assert_eq!(config.resolution.density_overflow_threshold, 0.7);
    }

    #[test]
    fn inverted_height_clamps_reset() {
        let mut config = LayoutConfig::default();
        config.stacking.min_height = 50.0;
        config.stacking.max_height = 10.0;

        config.sanitize();
        assert!(config.stacking.min_height <= config.stacking.max_height);
    }

    #[test]
    fn inverted_calendar_window_is_dropped() {
        let mut config = LayoutConfig::default();
        config.calendar_start = Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        config.calendar_end = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let issues = config.sanitize();
        assert_eq!(issues.len(), 1);
        assert!(config.calendar_start.is_none());
        assert!(config.calendar_end.is_none());
    }

    #[test]
    fn zero_snap_resolution_is_legal() {
        let mut config = LayoutConfig::default();
        config.grid.snap_resolution = 0.0;
        assert!(config.sanitize().is_empty());
    }

    #[test]
    fn parse_partial_toml() {
        let toml = r#"
[grid]
day_width = 30.0

[stacking]
overflow_threshold = 0.9
"#;
        let config: LayoutConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.grid.day_width, 30.0);
        assert_eq!(config.grid.day_height, 60.0);
        assert_eq!(config.stacking.overflow_threshold, 0.9);
    }
}
