// SPDX-License-Identifier: MPL-2.0
//! World-space geometry primitives shared by the culler and the gesture
//! recognizer.
//!
//! All comparisons happen in world (unscaled) coordinates; screen-space
//! quantities are divided by the zoom scale before they reach these
//! predicates, so effective screen-space padding is scale-invariant.

use serde::{Deserialize, Serialize};

/// A position in either screen or world space, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    #[must_use]
    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A displacement or velocity, in px or px/s depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// An axis-aligned rectangle with origin at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Squared distance from `point` to the nearest point of the rectangle.
    /// Zero when the point lies inside.
    #[must_use]
    pub fn distance_squared_to(&self, point: Point) -> f32 {
        let nearest = Point::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        );
        point.distance_squared(nearest)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Spatial extent of a cullable item, anchored at the item's origin.
///
/// Circles are anchored at their center; rects at their top-left corner;
/// points carry no extent at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    Point,
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Extent {
    /// Exact visibility test against a world-space rectangle.
    #[must_use]
    pub fn intersects_rect(&self, origin: Point, area: &Rect) -> bool {
        match *self {
            Extent::Point => area.contains(origin),
            Extent::Circle { radius } => area.distance_squared_to(origin) <= radius * radius,
            Extent::Rect { width, height } => {
                area.intersects(&Rect::new(origin.x, origin.y, width, height))
            }
        }
    }

    /// Conservative axis-aligned bounding box used for grid insertion.
    #[must_use]
    pub fn bounding_box(&self, origin: Point) -> Rect {
        match *self {
            Extent::Point => Rect::new(origin.x, origin.y, 0.0, 0.0),
            Extent::Circle { radius } => {
                Rect::new(origin.x - radius, origin.y - radius, 2.0 * radius, 2.0 * radius)
            }
            Extent::Rect { width, height } => Rect::new(origin.x, origin.y, width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_abs_diff_eq, assert_relative_eq, F32_EPSILON};

    #[test]
    fn distance_between_points() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_relative_eq!(a.distance(b), 5.0, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(a.distance_squared(b), 25.0);
    }

    #[test]
    fn midpoint_is_arithmetic_mean() {
        let mid = Point::new(0.0, 10.0).midpoint(Point::new(10.0, 20.0));
        assert_abs_diff_eq!(mid.x, 5.0);
        assert_abs_diff_eq!(mid.y, 15.0);
    }

    #[test]
    fn rect_contains_boundary_points() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(!rect.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn rect_intersection_detects_overlap_and_separation() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0))); // touching edge
        assert!(!a.intersects(&Rect::new(20.0, 20.0, 5.0, 5.0)));
    }

    #[test]
    fn expanded_grows_every_side() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0).expanded(5.0);
        assert_abs_diff_eq!(rect.x, 5.0);
        assert_abs_diff_eq!(rect.y, 5.0);
        assert_abs_diff_eq!(rect.width, 30.0);
        assert_abs_diff_eq!(rect.height, 30.0);
    }

    #[test]
    fn distance_squared_to_is_zero_inside() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_abs_diff_eq!(rect.distance_squared_to(Point::new(5.0, 5.0)), 0.0);
        assert_abs_diff_eq!(rect.distance_squared_to(Point::new(13.0, 14.0)), 25.0);
    }

    #[test]
    fn circle_extent_intersects_by_nearest_point() {
        let area = Rect::new(0.0, 0.0, 10.0, 10.0);
        let extent = Extent::Circle { radius: 5.0 };
        // Center 3px right of the area: inside the radius.
        assert!(extent.intersects_rect(Point::new(13.0, 5.0), &area));
        // Center 6px right of the area: outside the radius.
        assert!(!extent.intersects_rect(Point::new(16.0, 5.0), &area));
    }

    #[test]
    fn rect_extent_intersects_by_overlap() {
        let area = Rect::new(0.0, 0.0, 10.0, 10.0);
        let extent = Extent::Rect {
            width: 4.0,
            height: 4.0,
        };
        assert!(extent.intersects_rect(Point::new(8.0, 8.0), &area));
        assert!(!extent.intersects_rect(Point::new(11.0, 11.0), &area));
    }

    #[test]
    fn point_extent_requires_containment() {
        let area = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(Extent::Point.intersects_rect(Point::new(5.0, 5.0), &area));
        assert!(!Extent::Point.intersects_rect(Point::new(-0.1, 5.0), &area));
    }

    #[test]
    fn bounding_box_covers_each_shape() {
        let circle = Extent::Circle { radius: 3.0 }.bounding_box(Point::new(10.0, 10.0));
        assert_abs_diff_eq!(circle.x, 7.0);
        assert_abs_diff_eq!(circle.width, 6.0);

        let rect = Extent::Rect {
            width: 4.0,
            height: 2.0,
        }
        .bounding_box(Point::new(1.0, 1.0));
        assert_abs_diff_eq!(rect.right(), 5.0);
        assert_abs_diff_eq!(rect.bottom(), 3.0);
    }
}
