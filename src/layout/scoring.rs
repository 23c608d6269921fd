//! Shared layout metric math
//!
//! All quality scores used by the engines live here so the formulas exist
//! exactly once. Every function returns a value in [0, 1].

use super::geometry::TaskBar;

/// Used space over available space, capped at 1
pub fn space_efficiency(used: f64, available: f64) -> f64 {
    if available <= 0.0 {
        return 0.0;
    }
    (used / available).clamp(0.0, 1.0)
}

/// Quality after subtracting collision and overflow pressure
pub fn visual_quality(collision_rate: f64, overflow_rate: f64) -> f64 {
    (1.0 - collision_rate - overflow_rate).clamp(0.0, 1.0)
}

/// Fraction of bar pairs that collide
pub fn collision_rate(bars: &[TaskBar]) -> f64 {
    let n = bars.len();
    if n < 2 {
        return 0.0;
    }
    let pairs = (n * (n - 1) / 2) as f64;
    super::geometry::count_collisions(bars) as f64 / pairs
}

/// Balance of a weight distribution: 1 when all weights are equal
///
/// Penalizes each weight's deviation from the mean by a tenth of its
/// relative size.
pub fn visual_balance(weights: &[f64]) -> f64 {
    if weights.is_empty() {
        return 1.0;
    }
    let avg = weights.iter().sum::<f64>() / weights.len() as f64;
    if avg <= 0.0 {
        return 1.0;
    }
    let deviation: f64 = weights.iter().map(|w| (w - avg).abs()).sum();
    (1.0 - deviation / avg * 0.1).clamp(0.0, 1.0)
}

/// How close the bars' weighted centroid sits to the area center
pub fn centroid_balance(bars: &[TaskBar], width: f64, height: f64) -> f64 {
    if bars.is_empty() || width <= 0.0 || height <= 0.0 {
        return 1.0;
    }

    let total_area: f64 = bars.iter().map(|b| b.area()).sum();
    if total_area <= 0.0 {
        return 1.0;
    }

    let cx = bars
        .iter()
        .map(|b| (b.start_x + b.end_x) / 2.0 * b.area())
        .sum::<f64>()
        / total_area;
    let cy = bars
        .iter()
        .map(|b| (b.y + b.height / 2.0) * b.area())
        .sum::<f64>()
        / total_area;

    let dx = cx - width / 2.0;
    let dy = cy - height / 2.0;
    let distance = (dx * dx + dy * dy).sqrt();
    let max_distance = ((width / 2.0).powi(2) + (height / 2.0).powi(2)).sqrt();

    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Fraction of pairwise bar distances inside the acceptable band
pub fn spacing_score(bars: &[TaskBar], min_spacing: f64, max_spacing: f64) -> f64 {
    let n = bars.len();
    if n < 2 {
        return 1.0;
    }

    let mut acceptable = 0usize;
    let mut pairs = 0usize;
    for (i, a) in bars.iter().enumerate() {
        for b in bars.iter().skip(i + 1) {
            pairs += 1;
            let gap = gap_between(a, b);
            if gap >= min_spacing && gap <= max_spacing {
                acceptable += 1;
            }
        }
    }

    acceptable as f64 / pairs as f64
}

/// Shortest axis-aligned gap between two bars; 0 when they touch or overlap
fn gap_between(a: &TaskBar, b: &TaskBar) -> f64 {
    let dx = (b.start_x - a.end_x).max(a.start_x - b.end_x).max(0.0);
    let dy = (b.y - (a.y + a.height)).max(a.y - (b.y + b.height)).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

/// Fraction of grid cells covered by at least one bar
pub fn grid_utilization(bars: &[TaskBar], width: f64, height: f64, cell: f64) -> f64 {
    if width <= 0.0 || height <= 0.0 || cell <= 0.0 {
        return 0.0;
    }

    let cols = (width / cell).ceil() as usize;
    let rows = (height / cell).ceil() as usize;
    if cols == 0 || rows == 0 {
        return 0.0;
    }

    let mut occupied = vec![false; cols * rows];
    for bar in bars {
        let c0 = ((bar.start_x / cell).floor().max(0.0)) as usize;
        let c1 = ((bar.end_x / cell).ceil() as usize).min(cols);
        let r0 = ((bar.y / cell).floor().max(0.0)) as usize;
        let r1 = (((bar.y + bar.height) / cell).ceil() as usize).min(rows);
        for r in r0..r1 {
            for c in c0..c1 {
                occupied[r * cols + c] = true;
            }
        }
    }

    let used = occupied.iter().filter(|o| **o).count();
    used as f64 / (cols * rows) as f64
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
    fn space_efficiency_caps_at_one() {
        assert_eq!(space_efficiency(50.0, 100.0), 0.5);
        assert_eq!(space_efficiency(150.0, 100.0), 1.0);
        assert_eq!(space_efficiency(10.0, 0.0), 0.0);
    }

    #[test]
    fn visual_quality_floors_at_zero() {
        assert_eq!(visual_quality(0.0, 0.0), 1.0);
        assert!((visual_quality(0.3, 0.2) - 0.5).abs() < 1e-9);
        assert_eq!(visual_quality(0.8, 0.5), 0.0);
    }

    #[test]
    fn equal_weights_are_perfectly_balanced() {
        assert_eq!(visual_balance(&[5.0, 5.0, 5.0]), 1.0);
        assert!(visual_balance(&[1.0, 9.0]) < 1.0);
        assert_eq!(visual_balance(&[]), 1.0);
    }

    #[test]
    fn centered_bar_scores_full_balance() {
        let bars = vec![bar("a", 40.0, 60.0, 45.0, 10.0)];
        let score = centroid_balance(&bars, 100.0, 100.0);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn corner_bar_scores_low_balance() {
        let bars = vec![bar("a", 0.0, 2.0, 0.0, 2.0)];
        let score = centroid_balance(&bars, 100.0, 100.0);
        assert!(score < 0.2);
    }

    #[test]
    fn spacing_score_counts_acceptable_pairs() {
        let bars = vec![
            bar("a", 0.0, 10.0, 0.0, 10.0),
            bar("b", 15.0, 25.0, 0.0, 10.0), // gap 5, acceptable
            bar("c", 200.0, 210.0, 0.0, 10.0), // far away from both
        ];
        let score = spacing_score(&bars, 1.0, 30.0);
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_bar_spacing_is_perfect() {
        let bars = vec![bar("a", 0.0, 10.0, 0.0, 10.0)];
        assert_eq!(spacing_score(&bars, 1.0, 30.0), 1.0);
    }

    #[test]
    fn grid_utilization_counts_covered_cells() {
        // One bar covering the left half of a 2x1-cell grid
        let bars = vec![bar("a", 0.0, 10.0, 0.0, 10.0)];
        let score = grid_utilization(&bars, 20.0, 10.0, 10.0);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn collision_rate_over_pairs() {
        let bars = vec![
            bar("a", 0.0, 10.0, 0.0, 10.0),
            bar("b", 5.0, 15.0, 5.0, 10.0),
            bar("c", 100.0, 110.0, 0.0, 10.0),
        ];
        assert!((collision_rate(&bars) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn all_scores_stay_in_unit_interval() {
        let bars = vec![
            bar("a", -5.0, 500.0, -2.0, 300.0),
            bar("b", 0.0, 1.0, 0.0, 1.0),
        ];
        for score in [
            collision_rate(&bars),
            centroid_balance(&bars, 100.0, 100.0),
            spacing_score(&bars, 1.0, 30.0),
            grid_utilization(&bars, 100.0, 100.0, 10.0),
        ] {
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }
}
