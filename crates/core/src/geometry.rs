//! Page-space geometry and polyline simplification
//!
//! All stroke coordinates are stored in page space: origin at the top-left of
//! the page, X to the right, Y downward, units independent of the zoom level.
//! Coordinates are multiplied by the zoom scale only when rasterizing.

use serde::{Deserialize, Serialize};

/// Default simplification tolerance in page units.
pub const DEFAULT_SIMPLIFY_TOLERANCE: f32 = 1.0;

/// A point in page space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new page-space point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert a position on a rendered surface (pixels at `scale`) into page space
    pub fn from_surface(x_px: f32, y_px: f32, scale: f32) -> Self {
        Self {
            x: x_px / scale,
            y: y_px / scale,
        }
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f32 {
        self.distance_squared_to(other).sqrt()
    }

    /// Round both coordinates to `decimals` fractional digits
    ///
    /// A coordinate too large to scale is returned unchanged; at that
    /// magnitude it has no fractional digits left to drop.
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f32.powi(decimals as i32);
        Self {
            x: round_to(self.x, factor),
            y: round_to(self.y, factor),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned bounds of a point set in page space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Compute the bounds of a point set, or `None` when it is empty
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in iter {
            bounds.include(point);
        }
        Some(bounds)
    }

    /// Grow the bounds to contain `point`
    pub fn include(&mut self, point: &Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Expand every edge outward by `amount`
    pub fn padded(&self, amount: f32) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Reduce a sampled pointer path to a smaller polyline.
///
/// The first and last points are always kept. An interior point is kept only
/// when its squared distance from the last kept point is at least
/// `tolerance²`. Paths of two points or fewer are returned unchanged.
///
/// Only the persistence path simplifies; rendering and export use the
/// points exactly as captured.
pub fn simplify(points: &[Point], tolerance: f32) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let threshold = tolerance * tolerance;
    let last_index = points.len() - 1;

    let mut result = Vec::with_capacity(points.len());
    result.push(points[0]);
    let mut last_kept = points[0];

    for current in &points[1..last_index] {
        if current.distance_squared_to(&last_kept) >= threshold {
            result.push(*current);
            last_kept = *current;
        }
    }

    result.push(points[last_index]);
    result
}

fn round_to(value: f32, factor: f32) -> f32 {
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, step: f32) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32 * step, 0.0)).collect()
    }

    #[test]
    fn test_short_paths_unchanged() {
        let single = vec![Point::new(3.0, 4.0)];
        assert_eq!(simplify(&single, 1.0), single);

        let pair = vec![Point::new(0.0, 0.0), Point::new(0.1, 0.1)];
        assert_eq!(simplify(&pair, 1.0), pair);

        assert!(simplify(&[], 1.0).is_empty());
    }

    #[test]
    fn test_endpoints_always_kept() {
        let points = line(50, 0.2);
        let simplified = simplify(&points, 1.0);

        assert_eq!(simplified.first(), points.first());
        assert_eq!(simplified.last(), points.last());
        assert!(simplified.len() < points.len());
    }

    #[test]
    fn test_dense_samples_collapse() {
        // Every interior point is within tolerance of the start
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.2, 0.0),
            Point::new(0.4, 0.0),
            Point::new(0.6, 0.0),
            Point::new(0.8, 0.0),
        ];
        let simplified = simplify(&points, 1.0);
        assert_eq!(simplified, vec![Point::new(0.0, 0.0), Point::new(0.8, 0.0)]);
    }

    #[test]
    fn test_distance_measured_from_last_kept() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.6, 0.0),
            Point::new(1.2, 0.0), // 1.2 from the start, kept
            Point::new(1.8, 0.0), // 0.6 from last kept, dropped
            Point::new(2.4, 0.0), // 1.2 from last kept, kept
            Point::new(3.0, 0.0),
        ];
        let simplified = simplify(&points, 1.0);
        assert_eq!(
            simplified,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.2, 0.0),
                Point::new(2.4, 0.0),
                Point::new(3.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_exact_tolerance_is_kept() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.5, 0.0)];
        assert_eq!(simplify(&points, 1.0).len(), 3);
    }

    #[test]
    fn test_rounding() {
        let p = Point::new(12.345, -0.06).rounded(1);
        assert!((p.x - 12.3).abs() < 1e-4);
        assert!((p.y - -0.1).abs() < 1e-4);
    }

    #[test]
    fn test_rounding_keeps_huge_coordinates() {
        let p = Point::new(f32::MAX, 1.26).rounded(1);
        assert_eq!(p.x, f32::MAX);
        assert!((p.y - 1.3).abs() < 1e-6);

        let p = Point::new(-3.0e38, 0.0).rounded(2);
        assert!(p.is_finite());
        assert_eq!(p.x, -3.0e38);
    }

    #[test]
    fn test_from_surface_divides_by_scale() {
        let p = Point::from_surface(300.0, 150.0, 1.5);
        assert!((p.x - 200.0).abs() < 1e-4);
        assert!((p.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounds() {
        let points = vec![Point::new(10.0, 5.0), Point::new(-2.0, 8.0), Point::new(4.0, -1.0)];
        let bounds = Bounds::of_points(&points).unwrap();
        assert_eq!(bounds.min_x, -2.0);
        assert_eq!(bounds.min_y, -1.0);
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.max_y, 8.0);
        assert_eq!(bounds.padded(1.0).width(), 14.0);
        assert!(Bounds::of_points(&Vec::<Point>::new()).is_none());
    }
}
