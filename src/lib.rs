//! PlayCore - fixed-timestep core for a suite of 2D arcade mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (animation, motion, collision, gestures, effects)
//! - `screen`: Per-game screen state machines (menu → playing → gameover)
//! - `platform`: Frame clock and normalized pointer input
//! - `persistence`: Best-score storage
//! - `settings`: Data-driven tuning
//! - `render`: Backend-agnostic draw commands

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod screen;
pub mod settings;
pub mod sim;

pub use error::{AnimError, ConfigError, PersistenceError, SimError};
pub use highscores::HighScore;
pub use settings::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target tick rate
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest real frame delta accepted (seconds)
    pub const MAX_FRAME_TIME: f32 = 0.1;

    /// Ticks between animation frames when a clip does not say
    pub const DEFAULT_FRAME_DELAY: u32 = 5;

    /// A press shorter than this is a tap
    pub const TAP_MAX_FRAMES: u32 = 60;
    /// Pointer must have been up this long before a press counts as a tap
    pub const TAP_MIN_IDLE_FRAMES: u32 = 10;
    /// Holding the pointer this long on the menu quits
    pub const HOLD_TO_QUIT_FRAMES: u32 = 240;
    /// Hold progress before the quit ring appears
    pub const HOLD_RING_DELAY: f32 = 0.25;
    /// Quit ring size, relative to `REFERENCE_HEIGHT`
    pub const HOLD_RING_RADIUS: f32 = REFERENCE_HEIGHT / 60.0;
    pub const HOLD_RING_WIDTH: f32 = REFERENCE_HEIGHT / 200.0;

    /// Screen height the default tuning is authored against
    pub const REFERENCE_HEIGHT: f32 = 1280.0;

    /// Entity caps enforced by spawn logic
    pub const MAX_WALLS: usize = 256;
    pub const MAX_ASTEROIDS: usize = 20;
    pub const MAX_EFFECTS: usize = 512;
    pub const MAX_GHOSTS: usize = 12;
}

/// Wrap an angle in degrees to [-180, 180)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Unit vector for a heading in degrees (0 = +x, counter-clockwise on screen)
#[inline]
pub fn heading_vector(degrees: f32) -> Vec2 {
    let r = degrees.to_radians();
    Vec2::new(r.cos(), -r.sin())
}

/// Heading in degrees of a screen-space direction (y grows downward)
#[inline]
pub fn heading_of(dir: Vec2) -> f32 {
    (-dir.y).atan2(dir.x).to_degrees()
}
