//! Platform abstraction layer
//!
//! Handles the host-facing edges of the core:
//! - Time/ticks (fixed-step accumulator and the frame-rate cap)
//! - Input events normalized from whatever windowing toolkit is in use

pub mod input;
pub mod time;

pub use input::{InputEvent, PointerTracker, Release};
pub use time::{FixedStep, FrameClock, FrameTick};
