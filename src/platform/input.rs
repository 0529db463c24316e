//! Normalized pointer input
//!
//! Hosts translate their toolkit's events into [`InputEvent`]. The
//! [`PointerTracker`] counts how long the pointer has been down or up in
//! simulation ticks, which is what tap detection and hold-to-quit need.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{HOLD_TO_QUIT_FRAMES, TAP_MAX_FRAMES, TAP_MIN_IDLE_FRAMES};

/// Toolkit-independent input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
    Quit,
}

/// A completed press
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    /// Where the pointer went down
    pub from: Vec2,
    /// Where it came up
    pub to: Vec2,
    pub held_frames: u32,
    /// Short press after a real pause
    pub tap: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    down: bool,
    position: Vec2,
    press_at: Vec2,
    held_frames: u32,
    up_frames: u32,
    idle_before_press: u32,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any press in progress. Screens call this on entry so a press
    /// that started on the previous screen cannot register as a tap.
    pub fn reset(&mut self) {
        *self = Self {
            position: self.position,
            ..Self::default()
        };
    }

    /// Apply one event. Returns the finished press on pointer-up.
    pub fn handle(&mut self, event: &InputEvent) -> Option<Release> {
        match *event {
            InputEvent::PointerDown(at) => {
                self.position = at;
                if !self.down {
                    self.down = true;
                    self.press_at = at;
                    self.idle_before_press = self.up_frames;
                    self.held_frames = 0;
                }
                None
            }
            InputEvent::PointerMove(at) => {
                self.position = at;
                None
            }
            InputEvent::PointerUp(at) => {
                self.position = at;
                if !self.down {
                    return None;
                }
                self.down = false;
                self.up_frames = 0;
                let tap = self.held_frames < TAP_MAX_FRAMES
                    && self.idle_before_press > TAP_MIN_IDLE_FRAMES;
                Some(Release {
                    from: self.press_at,
                    to: at,
                    held_frames: self.held_frames,
                    tap,
                })
            }
            InputEvent::Quit => None,
        }
    }

    /// Count one simulation tick
    pub fn tick(&mut self) {
        if self.down {
            self.held_frames = self.held_frames.saturating_add(1);
        } else {
            self.up_frames = self.up_frames.saturating_add(1);
        }
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn held_frames(&self) -> u32 {
        if self.down { self.held_frames } else { 0 }
    }

    /// Hold-to-quit progress in `[0, 1]`
    pub fn hold_progress(&self) -> f32 {
        (self.held_frames() as f32 / HOLD_TO_QUIT_FRAMES as f32).min(1.0)
    }

    pub fn held_for_quit(&self) -> bool {
        self.held_frames() >= HOLD_TO_QUIT_FRAMES
    }
}
