//! Bar geometry on the calendar grid
//!
//! `TaskBar` is the positioned rectangle every layout stage refines. X runs
//! along calendar days, Y down through a row's stacking space.

use serde::{Deserialize, Serialize};

/// A positioned task bar on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBar {
    pub task_id: String,

    pub start_x: f64,
    pub end_x: f64,
    pub y: f64,
    pub height: f64,

    /// Row the bar belongs to (month row in a year view)
    pub row: usize,

    /// Position within its stack, 0 at the top
    pub stack_index: usize,

    pub color: String,
    pub opacity: f64,
    pub z_index: i32,

    /// True for the first segment of a task
    pub is_start: bool,

    /// True for the last segment of a task
    pub is_end: bool,

    /// True for a segment carried over from a previous month
    pub is_continuation: bool,

    /// True when the bar was clipped at a month boundary
    pub month_boundary: bool,
}

impl TaskBar {
    /// Creates a bar covering the given X range with neutral styling
    pub fn new(task_id: impl Into<String>, start_x: f64, end_x: f64) -> Self {
        Self {
            task_id: task_id.into(),
            start_x,
            end_x,
            y: 0.0,
            height: 0.0,
            row: 0,
            stack_index: 0,
            color: "gray".to_string(),
            opacity: 1.0,
            z_index: 1,
            is_start: true,
            is_end: true,
            is_continuation: false,
            month_boundary: false,
        }
    }

    pub fn width(&self) -> f64 {
        self.end_x - self.start_x
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height
    }

    /// Returns true if the two bars' rectangles intersect
    pub fn collides_with(&self, other: &TaskBar) -> bool {
        self.start_x < other.end_x
            && other.start_x < self.end_x
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Snaps X and Y to the given grid resolution; no-op for zero
    pub fn snap_to_grid(&mut self, resolution: f64) {
        if resolution <= 0.0 {
            return;
        }
        let snap = |v: f64| (v / resolution).round() * resolution;
        self.start_x = snap(self.start_x);
        self.end_x = snap(self.end_x);
        self.y = snap(self.y);
    }
}

/// Counts colliding bar pairs
pub fn count_collisions(bars: &[TaskBar]) -> usize {
    let mut count = 0;
    for (i, a) in bars.iter().enumerate() {
        for b in bars.iter().skip(i + 1) {
            if a.collides_with(b) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(id: &str, start_x: f64, end_x: f64, y: f64, height: f64) -> TaskBar {
        let mut b = TaskBar::new(id, start_x, end_x);
        b.y = y;
        b.height = height;
        b
    }

    #[test]
    fn width_and_area() {
        let b = bar("a", 10.0, 30.0, 0.0, 5.0);
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.area(), 100.0);
    }

    #[test]
    fn overlapping_rectangles_collide() {
        let a = bar("a", 0.0, 10.0, 0.0, 10.0);
        let b = bar("b", 5.0, 15.0, 5.0, 10.0);
        assert!(a.collides_with(&b));
        assert!(b.collides_with(&a));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = bar("a", 0.0, 10.0, 0.0, 10.0);
        let b = bar("b", 10.0, 20.0, 0.0, 10.0);
        assert!(!a.collides_with(&b));

        let c = bar("c", 0.0, 10.0, 10.0, 5.0);
        assert!(!a.collides_with(&c));
    }

    #[test]
    fn snapping_rounds_to_resolution() {
        let mut b = bar("a", 10.3, 19.8, 4.6, 5.0);
        b.snap_to_grid(1.0);
        assert_eq!(b.start_x, 10.0);
        assert_eq!(b.end_x, 20.0);
        assert_eq!(b.y, 5.0);
    }

    #[test]
    fn zero_resolution_disables_snapping() {
        let mut b = bar("a", 10.3, 19.8, 4.6, 5.0);
        b.snap_to_grid(0.0);
        assert_eq!(b.start_x, 10.3);
    }

    #[test]
    fn collision_count_over_a_set() {
        let bars = vec![
            bar("a", 0.0, 10.0, 0.0, 10.0),
            bar("b", 5.0, 15.0, 5.0, 10.0),
            bar("c", 100.0, 110.0, 0.0, 10.0),
        ];
        assert_eq!(count_collisions(&bars), 1);
    }
}
