//! Pixel-accurate collision masks
//!
//! A [`CollisionMask`] is one bit per pixel derived from a frame's alpha
//! channel. Rotating a sprite changes its silhouette, so a mask is only valid
//! for the exact angle it was built at. [`MaskedSprite`] owns that rule: every
//! angle or source change drops the cached mask and the next [`MaskedSprite::mask`]
//! call rebuilds it.

use std::sync::Arc;

use glam::{IVec2, Vec2};

use super::collision::{Aabb, gated_overlap};

/// Alpha above this is solid
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 127;

/// Alpha channel of one decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` entries
    pub alpha: Vec<u8>,
}

impl AlphaFrame {
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Self {
        Self {
            width,
            height,
            alpha,
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![255; (width * height) as usize])
    }

    /// Rasterize a polygon (even-odd rule, sampled at pixel centers)
    pub fn polygon(width: u32, height: u32, points: &[Vec2]) -> Self {
        let mut alpha = vec![0; (width * height) as usize];
        if points.len() >= 3 {
            for y in 0..height {
                for x in 0..width {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    if point_in_polygon(p, points) {
                        alpha[(y * width + x) as usize] = 255;
                    }
                }
            }
        }
        Self::new(width, height, alpha)
    }
}

fn point_in_polygon(p: Vec2, points: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// One bit per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl CollisionMask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; (width * height) as usize],
        }
    }

    /// Solid wherever alpha exceeds `threshold`. Missing trailing alpha
    /// samples count as transparent.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8], threshold: u8) -> Self {
        let len = (width * height) as usize;
        let bits = (0..len)
            .map(|i| alpha.get(i).is_some_and(|&a| a > threshold))
            .collect();
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn from_frame(frame: &AlphaFrame, threshold: u8) -> Self {
        Self::from_alpha(frame.width, frame.height, &frame.alpha, threshold)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        if x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = solid;
        }
    }

    /// Number of solid pixels
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// First solid pixel shared with `other`, whose top-left sits at `offset`
    /// in this mask's coordinates. The point is in this mask's coordinates.
    pub fn overlap(&self, other: &CollisionMask, offset: IVec2) -> Option<IVec2> {
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.width as i32).min(self.width as i32);
        let y1 = (offset.y + other.height as i32).min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    pub fn overlaps(&self, other: &CollisionMask, offset: IVec2) -> bool {
        self.overlap(other, offset).is_some()
    }

    /// Any solid pixel in the half-open box `[min, max)`
    pub fn any_in(&self, min: IVec2, max: IVec2) -> bool {
        let x0 = min.x.max(0);
        let y0 = min.y.max(0);
        let x1 = max.x.min(self.width as i32);
        let y1 = max.y.min(self.height as i32);
        (y0..y1).any(|y| (x0..x1).any(|x| self.get(x, y)))
    }

    /// Copy rotated `degrees` counter-clockwise on screen about the center.
    /// The result grows to the rotated bounding box.
    pub fn rotated(&self, degrees: f32) -> CollisionMask {
        if degrees.rem_euclid(360.0) == 0.0 {
            return self.clone();
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        // Shave float noise so 90 degrees does not gain a pixel
        let new_w = ((w * cos).abs() + (h * sin).abs() - 1e-3).ceil().max(0.0) as u32;
        let new_h = ((w * sin).abs() + (h * cos).abs() - 1e-3).ceil().max(0.0) as u32;

        let src_center = Vec2::new(w, h) * 0.5;
        let dst_center = Vec2::new(new_w as f32, new_h as f32) * 0.5;
        let mut out = CollisionMask::empty(new_w, new_h);
        for y in 0..new_h {
            for x in 0..new_w {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - dst_center;
                // Inverse rotation back into the source frame
                let s = Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos) + src_center;
                if self.get(s.x.floor() as i32, s.y.floor() as i32) {
                    out.bits[(y * new_w + x) as usize] = true;
                }
            }
        }
        out
    }
}

/// A mask-bearing sprite whose collision mask follows its rotation
#[derive(Debug, Clone)]
pub struct MaskedSprite {
    source: Arc<AlphaFrame>,
    threshold: u8,
    base: CollisionMask,
    angle: f32,
    cached: Option<CollisionMask>,
    rebuilds: u32,
}

impl MaskedSprite {
    pub fn new(source: Arc<AlphaFrame>) -> Self {
        let base = CollisionMask::from_frame(&source, DEFAULT_ALPHA_THRESHOLD);
        Self {
            source,
            threshold: DEFAULT_ALPHA_THRESHOLD,
            base,
            angle: 0.0,
            cached: None,
            rebuilds: 0,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn source(&self) -> &Arc<AlphaFrame> {
        &self.source
    }

    /// Rotate; any change invalidates the mask
    pub fn set_angle(&mut self, degrees: f32) {
        if degrees != self.angle {
            self.angle = degrees;
            self.cached = None;
        }
    }

    /// Swap the frame; always invalidates the mask
    pub fn set_source(&mut self, source: Arc<AlphaFrame>) {
        self.base = CollisionMask::from_frame(&source, self.threshold);
        self.source = source;
        self.cached = None;
    }

    /// Mask for the current frame and angle, rebuilt if stale
    pub fn mask(&mut self) -> &CollisionMask {
        if self.cached.is_none() {
            self.rebuilds += 1;
        }
        let base = &self.base;
        let angle = self.angle;
        self.cached.get_or_insert_with(|| base.rotated(angle))
    }

    /// Cached mask without rebuilding; `None` when stale
    pub fn cached_mask(&self) -> Option<&CollisionMask> {
        self.cached.as_ref()
    }

    /// Top-left of the current mask for a sprite centered at `center`
    pub fn origin(&mut self, center: Vec2) -> Vec2 {
        center - self.mask().size() * 0.5
    }

    /// How many times the mask has been rebuilt
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }
}

fn mask_box(mask: &CollisionMask, origin: Vec2) -> Aabb {
    Aabb::from_min_size(origin, mask.size())
}

/// Pixel collision between two placed masks, box-gated
pub fn mask_collision(a: &CollisionMask, a_origin: Vec2, b: &CollisionMask, b_origin: Vec2) -> bool {
    gated_overlap(&mask_box(a, a_origin), &mask_box(b, b_origin), |offset| {
        a.overlaps(b, offset.round().as_ivec2())
    })
}

/// Solid rectangle against a placed mask, box-gated
pub fn rect_mask_collision(rect: &Aabb, mask: &CollisionMask, origin: Vec2) -> bool {
    gated_overlap(rect, &mask_box(mask, origin), |_| {
        let min = (rect.min - origin).floor().as_ivec2();
        let max = (rect.max - origin).ceil().as_ivec2();
        mask.any_in(min, max)
    })
}
