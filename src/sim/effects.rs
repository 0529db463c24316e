//! Short-lived visual effects
//!
//! Effects decay through a single monotonic property and never remove
//! themselves. [`EffectPool::update`] runs every effect, then sweeps the
//! expired ones in a separate pass.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::render::{Canvas, Rgba, lerp_color};

pub trait Effect {
    /// Advance one tick
    fn update(&mut self);
    /// Past its terminal threshold; the owner drops it on the next sweep
    fn expired(&self) -> bool;
    /// Draw relative to the camera `scroll`
    fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2);
}

impl Effect for Box<dyn Effect + Send> {
    fn update(&mut self) {
        (**self).update();
    }

    fn expired(&self) -> bool {
        (**self).expired()
    }

    fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2) {
        (**self).draw(canvas, scroll);
    }
}

/// Expanding ring, blending between two colors as it grows
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub center: Vec2,
    pub size: f32,
    pub target: f32,
    /// Growth per tick as a fraction of `target`
    pub step: f32,
    pub width: f32,
    pub from: Rgba,
    pub to: Rgba,
}

impl Ring {
    pub fn new(center: Vec2, target: f32, step: f32, color: Rgba) -> Self {
        Self {
            center,
            size: 0.0,
            target,
            step,
            width: 2.0,
            from: color,
            to: color,
        }
    }

    pub fn fading_to(mut self, to: Rgba) -> Self {
        self.to = to;
        self
    }

    /// Start already grown to `size`
    pub fn starting_at(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

impl Effect for Ring {
    fn update(&mut self) {
        self.size += self.target * self.step;
    }

    fn expired(&self) -> bool {
        self.size > self.target
    }

    fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2) {
        let t = if self.target > 0.0 { self.size / self.target } else { 1.0 };
        let color = lerp_color(self.from, self.to, t);
        canvas.circle(self.center - scroll, self.size, color, self.width);
    }
}

/// Shrinking, drifting trail dot
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Shrink per tick
    pub dissolve: f32,
    pub color: Rgba,
}

impl Effect for Dot {
    fn update(&mut self) {
        self.size -= self.dissolve;
        self.pos += self.vel;
    }

    fn expired(&self) -> bool {
        self.size <= 0.0
    }

    fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2) {
        canvas.circle(self.pos - scroll, self.size.max(0.0), self.color, 0.0);
    }
}

/// Fading exhaust square
#[derive(Debug, Clone, PartialEq)]
pub struct Puff {
    pub pos: Vec2,
    pub size: f32,
    pub alpha: f32,
    /// Alpha lost per tick
    pub fade: f32,
    pub color: Rgba,
}

impl Puff {
    pub fn new(pos: Vec2, size: f32, color: Rgba) -> Self {
        Self {
            pos,
            size,
            alpha: 255.0,
            fade: 2.0,
            color,
        }
    }
}

impl Effect for Puff {
    fn update(&mut self) {
        self.alpha -= self.fade;
    }

    fn expired(&self) -> bool {
        self.alpha <= 0.0
    }

    fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2) {
        let [r, g, b, _] = self.color;
        let half = Vec2::splat(self.size * 0.5);
        canvas.rect(
            self.pos - half - scroll,
            half * 2.0,
            [r, g, b, self.alpha.clamp(0.0, 255.0) as u8],
        );
    }
}

/// Radial debris from an explosion
#[derive(Debug, Clone, PartialEq)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: u32,
    pub lifetime: u32,
    pub color: Rgba,
}

impl Spark {
    const DRAG: f32 = 0.95;
}

impl Effect for Spark {
    fn update(&mut self) {
        self.pos += self.vel;
        self.vel *= Self::DRAG;
        self.age += 1;
    }

    fn expired(&self) -> bool {
        self.age >= self.lifetime
    }

    fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2) {
        let life = 1.0 - self.age as f32 / self.lifetime.max(1) as f32;
        let [r, g, b, a] = self.color;
        let color = [r, g, b, (a as f32 * life) as u8];
        canvas.line(self.pos - scroll, self.pos - self.vel * 2.0 - scroll, color, 2.0);
    }
}

/// Capped effect collection with owner-driven removal
#[derive(Debug, Clone)]
pub struct EffectPool<E> {
    items: Vec<E>,
    capacity: usize,
}

impl<E: Effect> EffectPool<E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Add an effect; refused once the pool is full
    pub fn spawn(&mut self, effect: E) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push(effect);
        true
    }

    /// Update all, then sweep expired
    pub fn update(&mut self) {
        for effect in &mut self.items {
            effect.update();
        }
        self.items.retain(|e| !e.expired());
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, scroll: Vec2) {
        for effect in &self.items {
            effect.draw(canvas, scroll);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.items.iter()
    }
}

/// Spawn up to `count` sparks flying out of `origin`. Returns how many fit.
pub fn burst(
    pool: &mut EffectPool<Spark>,
    origin: Vec2,
    count: usize,
    color: Rgba,
    rng: &mut impl Rng,
) -> usize {
    let mut spawned = 0;
    for _ in 0..count {
        let angle = rng.random_range(0.0..TAU);
        let speed = rng.random_range(2.0..6.0);
        let spark = Spark {
            pos: origin,
            vel: Vec2::from_angle(angle) * speed,
            age: 0,
            lifetime: rng.random_range(30..=60),
            color,
        };
        if !pool.spawn(spark) {
            break;
        }
        spawned += 1;
    }
    spawned
}

/// Decaying screen shake
#[derive(Debug, Clone, Default)]
pub struct Shake {
    remaining: u32,
    duration: u32,
    magnitude: f32,
    offset: Vec2,
}

impl Shake {
    pub fn start(&mut self, duration: u32, magnitude: f32) {
        self.remaining = duration;
        self.duration = duration;
        self.magnitude = magnitude;
    }

    /// Advance one tick and roll a new offset
    pub fn update(&mut self, rng: &mut impl Rng) -> Vec2 {
        if self.remaining == 0 {
            self.offset = Vec2::ZERO;
            return self.offset;
        }
        let strength = self.magnitude * self.remaining as f32 / self.duration as f32;
        self.remaining -= 1;
        self.offset = Vec2::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        ) * strength;
        self.offset
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }
}
