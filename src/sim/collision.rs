//! Collision detection primitives
//!
//! Broad phase is axis-aligned boxes and center distance; narrow phase is
//! either pixel masks (see [`super::mask`]) or segment crossing for walls.
//! Degenerate inputs never error: they fall out as "no hit".

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min, min + size)
    }

    /// Interiors intersect; boxes that merely touch do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Half-open containment, `min` inclusive
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn translated(&self, by: Vec2) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }
}

/// Twice the signed area of triangle `abc`.
///
/// Positive when `a → b → c` turns counter-clockwise in y-up axes (clockwise
/// on a y-down screen); zero when collinear.
#[inline]
pub fn ccw(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Whether `p`, already known to be collinear with `a` and `b`, lies within
/// the segment's extent
#[inline]
pub fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Segment `p1p2` intersects segment `p3p4`, touching and collinear overlap
/// included
pub fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    let d1 = ccw(p3, p4, p1);
    let d2 = ccw(p3, p4, p2);
    let d3 = ccw(p1, p2, p3);
    let d4 = ccw(p1, p2, p4);

    let straddles = |x: f32, y: f32| (x > 0.0 && y < 0.0) || (x < 0.0 && y > 0.0);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1 == 0.0 && on_segment(p3, p4, p1))
        || (d2 == 0.0 && on_segment(p3, p4, p2))
        || (d3 == 0.0 && on_segment(p1, p2, p3))
        || (d4 == 0.0 && on_segment(p1, p2, p4))
}

/// `p` lies inside triangle `abc` or on its edge, either winding
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let sides = [ccw(a, b, p), ccw(b, c, p), ccw(c, a, p)];
    let neg = sides.iter().any(|s| *s < 0.0);
    let pos = sides.iter().any(|s| *s > 0.0);
    !(neg && pos)
}

/// `p` lies inside the convex quad `q0 q1 q2 q3`, split along `q0 q2`
pub fn point_in_quad(p: Vec2, quad: &[Vec2; 4]) -> bool {
    let [q0, q1, q2, q3] = *quad;
    point_in_triangle(p, q0, q1, q2) || point_in_triangle(p, q0, q2, q3)
}

/// Cheap center gate run before any per-pixel test
#[inline]
pub fn within_distance(a: Vec2, b: Vec2, distance: f32) -> bool {
    a.distance_squared(b) < distance * distance
}

/// Broad-phase gated narrow phase.
///
/// `precise` receives `b.min - a.min` (where `b` sits in `a`'s local frame)
/// and is only called when the boxes overlap.
pub fn gated_overlap<F>(a: &Aabb, b: &Aabb, precise: F) -> bool
where
    F: FnOnce(Vec2) -> bool,
{
    a.overlaps(b) && precise(b.min - a.min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Aabb::from_center(Vec2::new(12.0, 5.0), Vec2::new(6.0, 6.0));
        let c = Aabb::from_min_size(Vec2::new(10.0, 0.0), Vec2::new(5.0, 5.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Touching edges only
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_aabb_normalizes_corners() {
        let a = Aabb::new(Vec2::new(5.0, 5.0), Vec2::ZERO);
        assert_eq!(a.min, Vec2::ZERO);
        assert_eq!(a.center(), Vec2::splat(2.5));
        assert!(a.contains(Vec2::ZERO));
        assert!(!a.contains(Vec2::splat(5.0)));
    }

    #[test]
    fn test_ccw_sign() {
        let a = Vec2::ZERO;
        let b = Vec2::new(1.0, 0.0);
        assert!(ccw(a, b, Vec2::new(0.0, 1.0)) > 0.0);
        assert!(ccw(a, b, Vec2::new(0.0, -1.0)) < 0.0);
        assert_eq!(ccw(a, b, Vec2::new(3.0, 0.0)), 0.0);
    }

    #[test]
    fn test_segments_cross() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, -100.0),
            Vec2::new(5.0, 100.0),
        ));
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(5.0, -100.0),
            Vec2::new(5.0, 100.0),
        ));
    }

    #[test]
    fn test_segments_touch_and_collinear() {
        // Endpoint touching the wall
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(5.0, -1.0),
            Vec2::new(5.0, 1.0),
        ));
        // Collinear overlap
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(8.0, 0.0),
        ));
        // Collinear but disjoint
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(8.0, 0.0),
        ));
    }

    #[test]
    fn test_point_segment_is_not_a_wall() {
        // A zero-length wall off the path never intersects
        let p = Vec2::new(3.0, 3.0);
        assert!(!segments_intersect(Vec2::ZERO, Vec2::new(10.0, 0.0), p, p));
    }

    #[test]
    fn test_point_in_triangle_either_winding() {
        let (a, b, c) = (Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0));
        for p in [Vec2::new(2.0, 2.0), Vec2::new(5.0, 0.0), a] {
            assert!(point_in_triangle(p, a, b, c));
            assert!(point_in_triangle(p, a, c, b));
        }
        assert!(!point_in_triangle(Vec2::new(6.0, 6.0), a, b, c));
        assert!(!point_in_triangle(Vec2::new(-1.0, 2.0), a, c, b));
    }

    #[test]
    fn test_point_in_trapezoid() {
        let quad = [
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(6.0, 10.0),
            Vec2::new(-6.0, 10.0),
        ];
        assert!(point_in_quad(Vec2::new(0.0, 5.0), &quad));
        // One point on each side of the splitting diagonal
        assert!(point_in_quad(Vec2::new(-5.0, 9.5), &quad));
        assert!(point_in_quad(Vec2::new(2.5, 4.0), &quad));
        assert!(!point_in_quad(Vec2::new(3.0, 1.0), &quad));
        assert!(!point_in_quad(Vec2::new(0.0, 11.0), &quad));
    }

    #[test]
    fn test_gate_skips_precise_check() {
        let calls = Cell::new(0);
        let a = Aabb::from_min_size(Vec2::ZERO, Vec2::splat(10.0));
        let far = Aabb::from_min_size(Vec2::splat(50.0), Vec2::splat(10.0));
        let near = Aabb::from_min_size(Vec2::splat(4.0), Vec2::splat(10.0));

        let hit = gated_overlap(&a, &far, |_| {
            calls.set(calls.get() + 1);
            true
        });
        assert!(!hit);
        assert_eq!(calls.get(), 0);

        let hit = gated_overlap(&a, &near, |offset| {
            calls.set(calls.get() + 1);
            offset == Vec2::splat(4.0)
        });
        assert!(hit);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_within_distance() {
        assert!(within_distance(Vec2::ZERO, Vec2::new(3.0, 4.0), 5.1));
        assert!(!within_distance(Vec2::ZERO, Vec2::new(3.0, 4.0), 5.0));
    }
}
