//! Deterministic initial placement.

use std::f64::consts::PI;

use crate::graph::Point;

const INITIAL_RADIUS: f64 = 10.0;

/// Position of the `i`-th node on the golden-angle (phyllotaxis) spiral.
///
/// Consecutive indices never coincide, so a freshly added graph has no
/// overlapping nodes and needs no random jitter on its first tick.
#[inline]
pub fn phyllotaxis(i: usize) -> Point {
    let angle = PI * (3.0 - 5.0_f64.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
    let theta = i as f64 * angle;
    Point::new(radius * theta.cos(), radius * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point() {
        let p = phyllotaxis(0);
        assert!((p.x - 10.0 * 0.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_points_are_distinct_and_spread() {
        let points: Vec<Point> = (0..500).map(phyllotaxis).collect();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                assert!(d > 1.0, "points too close: {a:?} {b:?}");
            }
        }
        let r = (points[499].x.powi(2) + points[499].y.powi(2)).sqrt();
        assert!((r - 10.0 * 499.5_f64.sqrt()).abs() < 1e-9);
    }
}
