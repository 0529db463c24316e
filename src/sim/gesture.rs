//! Stroke gesture recognition
//!
//! Pure classification of a pointer stroke into one of five shapes using
//! bounding-box proportions and slopes between a few landmark samples. Checks
//! run in a fixed priority order and the first match wins.
//!
//! Screen coordinates grow downward, so a "V" has its apex at the largest y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Recognized shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    Horizontal,
    Vertical,
    V,
    InvertedV,
    Lightning,
}

impl Gesture {
    pub const ALL: [Gesture; 5] = [
        Gesture::Horizontal,
        Gesture::Vertical,
        Gesture::V,
        Gesture::InvertedV,
        Gesture::Lightning,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gesture::Horizontal => "horizontal",
            Gesture::Vertical => "vertical",
            Gesture::V => "v",
            Gesture::InvertedV => "inverted-v",
            Gesture::Lightning => "lightning",
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Recognizer thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Minimum long side of a straight line
    pub line_length: f32,
    /// Maximum short/long side ratio of a straight line
    pub line_aspect: f32,
    /// Both box sides must reach this for a V
    pub v_min_box: f32,
    pub v_slope: f32,
    /// One box side must reach this for a lightning bolt
    pub lightning_min_box: f32,
    pub lightning_slope: f32,
    /// Middle-segment slope below this counts as flat
    pub lightning_flat: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            line_length: 100.0,
            line_aspect: 0.2,
            v_min_box: 50.0,
            v_slope: 0.3,
            lightning_min_box: 50.0,
            lightning_slope: 0.4,
            lightning_flat: 0.4,
        }
    }
}

/// Classify with default thresholds
pub fn classify(points: &[Vec2]) -> Option<Gesture> {
    classify_with(points, &GestureThresholds::default())
}

pub fn classify_with(points: &[Vec2], t: &GestureThresholds) -> Option<Gesture> {
    if points.len() < 2 {
        return None;
    }
    let size = bounding_size(points);

    if size.x > t.line_length && size.y < t.line_aspect * size.x {
        return Some(Gesture::Horizontal);
    }
    if size.y > t.line_length && size.x < t.line_aspect * size.y {
        return Some(Gesture::Vertical);
    }
    if size.x >= t.v_min_box && size.y >= t.v_min_box {
        if is_v(points, t.v_slope, Apex::Lowest) {
            return Some(Gesture::V);
        }
        if is_v(points, t.v_slope, Apex::Highest) {
            return Some(Gesture::InvertedV);
        }
    }
    if is_lightning(points, size, t) {
        return Some(Gesture::Lightning);
    }
    None
}

fn bounding_size(points: &[Vec2]) -> Vec2 {
    let (min, max) = points
        .iter()
        .fold((Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });
    max - min
}

#[derive(Clone, Copy)]
enum Apex {
    /// Largest y (bottom of a V)
    Lowest,
    /// Smallest y (top of an inverted V)
    Highest,
}

/// Finite slope, `None` for a vertical run
fn slope(a: Vec2, b: Vec2) -> Option<f32> {
    let d = b - a;
    if d.x == 0.0 { None } else { Some(d.y / d.x) }
}

/// Slope that treats a vertical run as +/- infinity and a repeated point as flat
fn steep_slope(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    if d.x != 0.0 {
        d.y / d.x
    } else if d.y > 0.0 {
        f32::INFINITY
    } else if d.y < 0.0 {
        f32::NEG_INFINITY
    } else {
        0.0
    }
}

fn is_v(points: &[Vec2], threshold: f32, apex: Apex) -> bool {
    if points.len() < 3 {
        return false;
    }
    // First occurrence of the extreme y
    let mut apex_index = 0;
    for (i, p) in points.iter().enumerate() {
        let better = match apex {
            Apex::Lowest => p.y > points[apex_index].y,
            Apex::Highest => p.y < points[apex_index].y,
        };
        if better {
            apex_index = i;
        }
    }
    if apex_index == 0 || apex_index == points.len() - 1 {
        return false;
    }

    let first = points[0];
    let tip = points[apex_index];
    let last = points[points.len() - 1];
    let (Some(s1), Some(s2)) = (slope(first, tip), slope(tip, last)) else {
        return false;
    };

    // Drawn left-to-right the slopes are (+, -) for a V; right-to-left swaps them
    let (down, up) = match apex {
        Apex::Lowest => (s1, s2),
        Apex::Highest => (s2, s1),
    };
    (down > threshold && up < -threshold) || (up > threshold && down < -threshold)
}

fn is_lightning(points: &[Vec2], size: Vec2, t: &GestureThresholds) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    if size.x < t.lightning_min_box && size.y < t.lightning_min_box {
        return false;
    }
    let p1 = points[0];
    let p2 = points[n / 3];
    let p3 = points[2 * n / 3];
    let p4 = points[n - 1];
    let s1 = steep_slope(p1, p2);
    let s2 = steep_slope(p2, p3);
    let s3 = steep_slope(p3, p4);

    let k = t.lightning_slope;
    let flat = s2.abs() < t.lightning_flat;
    let rising = s1 > k && s3 > k && (flat || s2 < -k);
    let falling = s1 < -k && s3 < -k && (flat || s2 > k);
    rising || falling
}

/// Points captured during one pointer-down
#[derive(Debug, Clone, Default)]
pub struct Stroke {
    points: Vec<Vec2>,
    min_spacing: f32,
}

impl Stroke {
    /// `min_spacing` drops samples that barely moved
    pub fn new(min_spacing: f32) -> Self {
        Self {
            points: Vec::new(),
            min_spacing,
        }
    }

    /// Append a sample; returns false if it was too close to the last one
    pub fn push(&mut self, point: Vec2) -> bool {
        if let Some(last) = self.points.last() {
            if last.distance(point) < self.min_spacing {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn classify(&self, thresholds: &GestureThresholds) -> Option<Gesture> {
        classify_with(&self.points, thresholds)
    }

    /// Hand the points over and start empty
    pub fn take(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f32, f32)]) -> Vec<Vec2> {
        raw.iter().map(|&(x, y)| Vec2::new(x, y)).collect()
    }

    #[test]
    fn test_single_and_coincident_points() {
        assert_eq!(classify(&[]), None);
        assert_eq!(classify(&pts(&[(5.0, 5.0)])), None);
        assert_eq!(classify(&pts(&[(5.0, 5.0), (5.0, 5.0)])), None);
    }

    #[test]
    fn test_horizontal() {
        let stroke = pts(&[(0.0, 100.0), (50.0, 102.0), (100.0, 98.0), (150.0, 101.0)]);
        assert_eq!(classify(&stroke), Some(Gesture::Horizontal));
    }

    #[test]
    fn test_vertical() {
        let stroke = pts(&[(10.0, 0.0), (12.0, 60.0), (9.0, 130.0)]);
        assert_eq!(classify(&stroke), Some(Gesture::Vertical));
    }

    #[test]
    fn test_short_line_is_nothing() {
        let stroke = pts(&[(0.0, 0.0), (100.0, 0.0)]);
        assert_eq!(classify(&stroke), None);
    }

    #[test]
    fn test_v_both_directions() {
        let v = pts(&[(0.0, 0.0), (30.0, 40.0), (60.0, 80.0), (90.0, 40.0), (120.0, 0.0)]);
        assert_eq!(classify(&v), Some(Gesture::V));
        let reversed: Vec<Vec2> = v.iter().rev().copied().collect();
        assert_eq!(classify(&reversed), Some(Gesture::V));
    }

    #[test]
    fn test_inverted_v() {
        let stroke = pts(&[(0.0, 80.0), (30.0, 40.0), (60.0, 0.0), (90.0, 40.0), (120.0, 80.0)]);
        assert_eq!(classify(&stroke), Some(Gesture::InvertedV));
    }

    #[test]
    fn test_v_apex_at_end_rejected() {
        // Monotonic diagonal: apex is the last sample
        let stroke = pts(&[(0.0, 0.0), (40.0, 40.0), (80.0, 80.0)]);
        assert_eq!(classify(&stroke), None);
    }

    #[test]
    fn test_v_vertical_arm_rejected() {
        let stroke = pts(&[(0.0, 0.0), (0.0, 80.0), (60.0, 0.0)]);
        assert_eq!(classify(&stroke), None);
    }

    #[test]
    fn test_lightning_flat_middle() {
        // Diagonal, flat, diagonal (all going down-right)
        let stroke = pts(&[
            (0.0, 0.0),
            (20.0, 20.0),
            (40.0, 40.0),
            (60.0, 40.0),
            (80.0, 40.0),
            (100.0, 40.0),
            (120.0, 60.0),
            (140.0, 80.0),
            (160.0, 100.0),
        ]);
        assert_eq!(classify(&stroke), Some(Gesture::Lightning));
    }

    #[test]
    fn test_lightning_zigzag() {
        // Down-left, down-right, down-left
        let stroke = pts(&[(100.0, 0.0), (60.0, 40.0), (30.0, 70.0), (100.0, 60.0), (60.0, 100.0), (30.0, 130.0)]);
        // n = 6: landmarks 0, 2, 4, 5
        assert_eq!(classify(&stroke), Some(Gesture::Lightning));
    }

    #[test]
    fn test_tiny_scribble_is_nothing() {
        let stroke = pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 10.0), (30.0, 20.0)]);
        assert_eq!(classify(&stroke), None);
    }

    #[test]
    fn test_stroke_spacing() {
        let mut stroke = Stroke::new(5.0);
        assert!(stroke.push(Vec2::ZERO));
        assert!(!stroke.push(Vec2::new(1.0, 1.0)));
        assert!(stroke.push(Vec2::new(10.0, 0.0)));
        assert_eq!(stroke.len(), 2);
        let taken = stroke.take();
        assert_eq!(taken.len(), 2);
        assert!(stroke.is_empty());
    }

    #[test]
    fn test_tuned_thresholds() {
        let stroke = pts(&[(0.0, 0.0), (100.0, 0.0)]);
        let loose = GestureThresholds {
            line_length: 50.0,
            ..GestureThresholds::default()
        };
        assert_eq!(classify_with(&stroke, &loose), Some(Gesture::Horizontal));
    }
}
