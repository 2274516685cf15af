#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixel space.

use serde::{Deserialize, Serialize};

/// A point in layout coordinates (origin at top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle used for layout bounds and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Horizontal midpoint.
    #[inline]
    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// True when every component is finite and the size is strictly positive.
    #[must_use]
    pub fn is_valid_window(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Pointer position as fractions of the rectangle size.
    ///
    /// Returns `None` for empty rectangles.
    #[must_use]
    pub fn relative(&self, point: Point) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        Some((
            (point.x - self.x) / self.width,
            (point.y - self.y) / self.height,
        ))
    }

    /// Shrink the rectangle by `amount` on every side, never below zero size.
    #[must_use]
    pub fn inset(&self, amount: f64) -> Rect {
        let width = (self.width - amount * 2.0).max(0.0);
        let height = (self.height - amount * 2.0).max(0.0);
        Rect::new(self.x + amount, self.y + amount, width, height)
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect};
    use proptest::prelude::*;

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert!(rect.contains(Point::new(2.0, 3.0)));
        assert!(rect.contains(Point::new(5.9, 7.9)));
        assert!(!rect.contains(Point::new(6.0, 3.0)));
        assert!(!rect.contains(Point::new(2.0, 8.0)));
    }

    #[test]
    fn relative_position_is_fractional() {
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0);
        assert_eq!(rect.relative(Point::new(150.0, 175.0)), Some((0.25, 0.75)));
        assert_eq!(Rect::default().relative(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn intersection_overlaps_and_misses() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection_opt(&b), Some(Rect::new(2.0, 2.0, 2.0, 2.0)));
        let c = Rect::new(10.0, 10.0, 1.0, 1.0);
        assert_eq!(a.intersection_opt(&c), None);
    }

    #[test]
    fn inset_never_goes_negative() {
        let rect = Rect::new(0.0, 0.0, 10.0, 4.0);
        assert_eq!(rect.inset(3.0), Rect::new(3.0, 3.0, 4.0, 0.0));
    }

    #[test]
    fn rect_serializes_with_named_fields() {
        let value = serde_json::to_value(Rect::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0})
        );
    }

    fn grid_rect() -> impl Strategy<Value = Rect> {
        (0u16..200, 0u16..200, 1u16..100, 1u16..100).prop_map(|(x, y, w, h)| {
            Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h))
        })
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric_and_inside_both(a in grid_rect(), b in grid_rect()) {
            let ab = a.intersection_opt(&b);
            prop_assert_eq!(ab, b.intersection_opt(&a));
            if let Some(overlap) = ab {
                prop_assert!(a.contains(Point::new(overlap.x, overlap.y)));
                prop_assert!(b.contains(Point::new(overlap.x, overlap.y)));
                prop_assert!(overlap.right() <= a.right() && overlap.bottom() <= b.bottom());
            }
        }

        #[test]
        fn union_contains_both_centers(a in grid_rect(), b in grid_rect()) {
            let union = a.union(&b);
            prop_assert!(union.contains(a.center()));
            prop_assert!(union.contains(b.center()));
        }
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(5.0, 1.0, 1.0, 4.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 6.0, 5.0));
    }

    #[test]
    fn window_validity_rejects_nan_and_zero() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid_window());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_valid_window());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_valid_window());
    }
}
