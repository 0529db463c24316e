//! Frame driver
//!
//! [`FixedStep`] turns variable real frame times into a whole number of fixed
//! simulation ticks. [`FrameClock`] caps the loop at a target rate by sleeping,
//! which is the only place the core ever blocks.

use std::time::{Duration, Instant};

use crate::consts::{MAX_FRAME_TIME, MAX_SUBSTEPS};

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FixedStep {
    pub step: f32,
    pub accumulator: f32,
    pub max_substeps: u32,
}

impl FixedStep {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
            max_substeps: MAX_SUBSTEPS,
        }
    }

    /// Feed a real frame delta; returns how many ticks to simulate.
    ///
    /// Deltas above [`MAX_FRAME_TIME`] are clamped, and time left over after
    /// `max_substeps` ticks is dropped so a slow frame cannot snowball.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if self.step <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_TIME);

        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_substeps {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if ticks == self.max_substeps && self.accumulator >= self.step {
            log::debug!(
                "Dropping {:.3}s of simulation backlog",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        ticks
    }
}

/// One frame boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Real seconds since the previous tick, clamped to [`MAX_FRAME_TIME`]
    pub dt: f32,
    /// Monotonic frame counter, starting at 1
    pub frame: u64,
}

/// Sleeping frame limiter
#[derive(Debug)]
pub struct FrameClock {
    period: Duration,
    last: Instant,
    next: Instant,
    frame: u64,
}

impl FrameClock {
    pub fn new(hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(hz.max(1)));
        let now = Instant::now();
        Self {
            period,
            last: now,
            next: now + period,
            frame: 0,
        }
    }

    /// Block until the next frame boundary, then report it.
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        }
        let now = Instant::now();
        // Re-anchor after a long stall instead of bursting to catch up
        self.next = if now > self.next + self.period {
            now + self.period
        } else {
            self.next + self.period
        };

        let dt = now.duration_since(self.last).as_secs_f32().min(MAX_FRAME_TIME);
        self.last = now;
        self.frame += 1;
        FrameTick {
            dt,
            frame: self.frame,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
