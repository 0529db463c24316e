//! Draw-call surface
//!
//! The core never decodes or rasterizes images. Sprites are opaque
//! [`FrameHandle`]s supplied by the asset layer, and every draw goes through a
//! [`Canvas`]. [`DrawList`] records the calls so tests and the headless binary
//! can inspect what a frame would render.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque id of a pre-decoded sprite frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u32);

/// 8-bit RGBA color
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];

/// Rendering backend seen by the simulation.
pub trait Canvas {
    /// Draw a sprite frame with its top-left corner at `at`
    fn blit(&mut self, frame: FrameHandle, at: Vec2);
    /// Circle outline (`width > 0`) or filled disc (`width == 0`)
    fn circle(&mut self, center: Vec2, radius: f32, color: Rgba, width: f32);
    fn line(&mut self, a: Vec2, b: Vec2, color: Rgba, width: f32);
    /// Filled rectangle
    fn rect(&mut self, min: Vec2, size: Vec2, color: Rgba);
    /// Circular arc outline. Angles in degrees, counter-clockwise from +x.
    fn arc(&mut self, center: Vec2, radius: f32, start: f32, sweep: f32, color: Rgba, width: f32);
    /// Filled convex polygon
    fn polygon(&mut self, points: &[Vec2], color: Rgba);
}

/// A single recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Blit { frame: FrameHandle, at: Vec2 },
    Circle { center: Vec2, radius: f32, color: Rgba, width: f32 },
    Line { a: Vec2, b: Vec2, color: Rgba, width: f32 },
    Rect { min: Vec2, size: Vec2, color: Rgba },
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        sweep: f32,
        color: Rgba,
        width: f32,
    },
    Polygon { points: Vec<Vec2>, color: Rgba },
}

/// Canvas that records calls in order.
#[derive(Debug, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of sprite blits recorded
    pub fn blit_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Blit { .. }))
            .count()
    }
}

impl Canvas for DrawList {
    fn blit(&mut self, frame: FrameHandle, at: Vec2) {
        self.commands.push(DrawCommand::Blit { frame, at });
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
            width,
        });
    }

    fn line(&mut self, a: Vec2, b: Vec2, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Line { a, b, color, width });
    }

    fn rect(&mut self, min: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Rect { min, size, color });
    }

    fn arc(&mut self, center: Vec2, radius: f32, start: f32, sweep: f32, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start,
            sweep,
            color,
            width,
        });
    }

    fn polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }
}

/// Linear blend between two colors, `t` clamped to `[0, 1]`
pub fn lerp_color(from: Rgba, to: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let a = from[i] as f32;
        let b = to[i] as f32;
        out[i] = (a + (b - a) * t).round() as u8;
    }
    out
}
