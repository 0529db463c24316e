//! Motion integration and bounce response
//!
//! Velocities are in px/tick; `integrate(1.0)` is the usual step and
//! `integrate(dt)` serves continuous-time callers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, ccw, segments_intersect};

const EPSILON_SQ: f32 = 1e-8;

/// Seek-with-inertia parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekParams {
    pub max_speed: f32,
    /// Divisor on the velocity error; larger converges slower
    pub inertia: f32,
}

/// Gravity parameters (positive gravity pulls toward +y, i.e. down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallParams {
    pub gravity: f32,
    pub terminal: f32,
}

/// Boundary bounce parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceParams {
    pub restitution: f32,
    /// Post-bounce speed below which `rebound` is imparted instead
    pub floor: f32,
    pub rebound: f32,
}

/// Position and velocity of a moving entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel }
    }

    /// Steer toward `target`. No change when already on it.
    pub fn seek(&mut self, target: Vec2, params: &SeekParams) {
        let to_target = target - self.pos;
        if to_target.length_squared() < EPSILON_SQ {
            return;
        }
        let desired = to_target.normalize() * params.max_speed;
        self.vel += (desired - self.vel) / params.inertia.max(1.0);
        self.vel = self.vel.clamp_length_max(params.max_speed);
    }

    /// Apply gravity and clamp to terminal fall speed
    pub fn fall(&mut self, params: &FallParams) {
        self.vel.y = (self.vel.y + params.gravity).min(params.terminal);
    }

    /// Keep the body inside `bounds`. On any side it ended up past, it is put
    /// back on the edge and sent inward whichever way it was moving.
    /// Returns true if a bounce happened.
    pub fn bounce_within(&mut self, bounds: &Aabb, params: &BounceParams) -> bool {
        let mut bounced = false;
        for axis in 0..2 {
            let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
            let outward = if self.pos[axis] > hi {
                self.pos[axis] = hi;
                1.0
            } else if self.pos[axis] < lo {
                self.pos[axis] = lo;
                -1.0
            } else {
                continue;
            };
            let mut speed = self.vel[axis].abs() * params.restitution;
            if speed < params.floor {
                speed = params.rebound;
            }
            self.vel[axis] = -outward * speed;
            bounced = true;
        }
        bounced
    }

    pub fn integrate(&mut self, scale: f32) {
        self.pos += self.vel * scale;
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Reflect `v` off the line through `a` and `b`.
///
/// The normal component is negated and scaled by `restitution`, the
/// tangential one scaled by `tangential`. `None` when `a == b`.
pub fn reflect_off_segment(
    v: Vec2,
    a: Vec2,
    b: Vec2,
    restitution: f32,
    tangential: f32,
) -> Option<Vec2> {
    let along = b - a;
    if along.length_squared() < EPSILON_SQ {
        return None;
    }
    let dir = along.normalize();
    let vt = dir * v.dot(dir);
    let vn = v - vt;
    Some(vt * tangential - vn * restitution)
}

/// Reflect `v` off a surface with normal `n` (any length). Unchanged when `n`
/// is zero.
pub fn reflect_off_normal(v: Vec2, n: Vec2, restitution: f32, tangential: f32) -> Vec2 {
    let n = n.normalize_or_zero();
    if n == Vec2::ZERO {
        return v;
    }
    let vn = n * v.dot(n);
    let vt = v - vn;
    vt * tangential - vn * restitution
}

/// A bounce segment, optionally one-sided
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub a: Vec2,
    pub b: Vec2,
    /// Sign of `ccw(a, b, p)` for points on the solid side; `None` is two-sided
    pub front: Option<f32>,
}

impl Wall {
    /// Two-sided wall
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b, front: None }
    }

    /// One-sided wall whose front is the side containing `point`. A point on
    /// the wall's line leaves it with no front at all.
    pub fn facing(a: Vec2, b: Vec2, point: Vec2) -> Self {
        let side = ccw(a, b, point);
        let front = if side > 0.0 {
            1.0
        } else if side < 0.0 {
            -1.0
        } else {
            0.0
        };
        Self {
            a,
            b,
            front: Some(front),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        (self.b - self.a).length_squared() < EPSILON_SQ
    }

    pub fn is_front(&self, point: Vec2) -> bool {
        match self.front {
            None => true,
            Some(sign) => ccw(self.a, self.b, point) * sign > 0.0,
        }
    }

    /// Unit normal pointing to the front (or left of `a → b` if two-sided)
    pub fn normal(&self) -> Option<Vec2> {
        if self.is_degenerate() {
            return None;
        }
        let n = (self.b - self.a).normalize().perp();
        match self.front {
            Some(sign) if sign < 0.0 => Some(-n),
            _ => Some(n),
        }
    }

    /// The move `prev → cur` hit this wall from its front
    pub fn crossed(&self, prev: Vec2, cur: Vec2) -> bool {
        !self.is_degenerate() && self.is_front(prev) && segments_intersect(prev, cur, self.a, self.b)
    }

    /// Reflected velocity for a body that was at `prev` before the hit.
    /// `None` for degenerate walls or hits from behind.
    pub fn reflect(&self, v: Vec2, prev: Vec2, restitution: f32, tangential: f32) -> Option<Vec2> {
        if !self.is_front(prev) {
            return None;
        }
        reflect_off_segment(v, self.a, self.b, restitution, tangential)
    }
}
