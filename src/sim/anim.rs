//! Sprite-sheet animation state machine
//!
//! An [`AnimationSet`] is the immutable, per-class table of clips. Every
//! entity of that class holds an [`Animator`] pointing at the shared set via
//! `Arc`, plus its own state, frame index and finished flag.
//!
//! Frames advance on a global tick counter: a clip with delay `d` steps one
//! frame whenever `frame_counter % d == 0`. What happens past the last frame
//! is the clip's [`Playback`] policy.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use glam::Vec2;

use crate::consts::DEFAULT_FRAME_DELAY;
use crate::error::AnimError;
use crate::render::{Canvas, FrameHandle};

/// Anything usable as an animation state key
pub trait AnimState: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T: Copy + Eq + Hash + Debug + Send + Sync + 'static> AnimState for T {}

/// Overflow behavior of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback<S> {
    /// Wrap to the first frame
    Loop,
    /// One-shot, then switch to the given state at frame 0
    Then(S),
    /// One-shot, clamp on the last frame and raise `finished`
    Hold,
}

#[derive(Debug, Clone)]
pub struct AnimClip<S> {
    pub frames: Vec<FrameHandle>,
    /// Ticks per frame, always > 0 once built
    pub delay: u32,
    /// Draw offset added after the set's anchor
    pub offset: Vec2,
    pub policy: Playback<S>,
}

impl<S> AnimClip<S> {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Ticks for one full pass through the clip
    pub fn cycle_ticks(&self) -> u64 {
        u64::from(self.delay) * self.frames.len() as u64
    }
}

/// Clip description handed to the builder
#[derive(Debug, Clone)]
pub struct ClipDef<S> {
    frames: Vec<FrameHandle>,
    delay: Option<u32>,
    offset: Vec2,
    policy: Playback<S>,
}

impl<S> ClipDef<S> {
    /// Looping clip with the set's default delay and no offset
    pub fn new(frames: Vec<FrameHandle>) -> Self {
        Self {
            frames,
            delay: None,
            offset: Vec2::ZERO,
            policy: Playback::Loop,
        }
    }

    pub fn delay(mut self, delay: u32) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn then(mut self, next: S) -> Self {
        self.policy = Playback::Then(next);
        self
    }

    pub fn hold(mut self) -> Self {
        self.policy = Playback::Hold;
        self
    }
}

/// Consecutive frame handles starting at `first`
pub fn frame_run(first: u32, count: u32) -> Vec<FrameHandle> {
    (first..first + count).map(FrameHandle).collect()
}

/// Shared, read-only clip table for one entity class
#[derive(Debug)]
pub struct AnimationSet<S: AnimState> {
    clips: HashMap<S, AnimClip<S>>,
    anchor: Vec2,
    fallback: S,
}

impl<S: AnimState> AnimationSet<S> {
    /// Start a set. `anchor` is subtracted from the entity position when
    /// drawing (usually half the base frame size); `fallback` is used for
    /// states requested at runtime that have no clip.
    pub fn builder(anchor: Vec2, fallback: S) -> AnimationSetBuilder<S> {
        AnimationSetBuilder {
            anchor,
            fallback,
            default_delay: DEFAULT_FRAME_DELAY,
            clips: Vec::new(),
        }
    }

    pub fn clip(&self, state: S) -> Option<&AnimClip<S>> {
        self.clips.get(&state)
    }

    pub fn contains(&self, state: S) -> bool {
        self.clips.contains_key(&state)
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn fallback(&self) -> S {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

pub struct AnimationSetBuilder<S: AnimState> {
    anchor: Vec2,
    fallback: S,
    default_delay: u32,
    clips: Vec<(S, ClipDef<S>)>,
}

impl<S: AnimState> AnimationSetBuilder<S> {
    /// Delay for clips that do not set one
    pub fn default_delay(mut self, delay: u32) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn state(mut self, state: S, clip: ClipDef<S>) -> Self {
        self.clips.push((state, clip));
        self
    }

    /// Validate and freeze the table.
    ///
    /// Fails on a missing `required` state or fallback, an empty clip, a zero
    /// delay, or a `Then` target that has no clip.
    pub fn build(self, required: &[S]) -> Result<AnimationSet<S>, AnimError> {
        let mut clips = HashMap::with_capacity(self.clips.len());
        for (state, def) in self.clips {
            if def.frames.is_empty() {
                return Err(AnimError::EmptyClip(format!("{state:?}")));
            }
            let delay = def.delay.unwrap_or(self.default_delay);
            if delay == 0 {
                return Err(AnimError::ZeroDelay(format!("{state:?}")));
            }
            clips.insert(
                state,
                AnimClip {
                    frames: def.frames,
                    delay,
                    offset: def.offset,
                    policy: def.policy,
                },
            );
        }

        for state in required.iter().chain(std::iter::once(&self.fallback)) {
            if !clips.contains_key(state) {
                return Err(AnimError::MissingState(format!("{state:?}")));
            }
        }
        for (state, clip) in &clips {
            if let Playback::Then(next) = clip.policy {
                if !clips.contains_key(&next) {
                    return Err(AnimError::DanglingReturn {
                        from: format!("{state:?}"),
                        to: format!("{next:?}"),
                    });
                }
            }
        }

        Ok(AnimationSet {
            clips,
            anchor: self.anchor,
            fallback: self.fallback,
        })
    }
}

/// Result of one [`Animator::advance`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimStep<S> {
    /// Not a frame boundary for this clip, or already finished
    Held,
    Advanced,
    /// Looping clip went back to frame 0
    Wrapped,
    /// One-shot clip ended and switched state
    Returned { from: S, to: S },
    /// Terminal clip reached its last frame
    Finished,
}

/// Per-entity animation cursor
#[derive(Debug, Clone)]
pub struct Animator<S: AnimState> {
    set: Arc<AnimationSet<S>>,
    state: S,
    frame: usize,
    finished: bool,
}

impl<S: AnimState> Animator<S> {
    /// Start in the set's fallback state
    pub fn new(set: Arc<AnimationSet<S>>) -> Self {
        let state = set.fallback;
        Self {
            set,
            state,
            frame: 0,
            finished: false,
        }
    }

    pub fn with_state(set: Arc<AnimationSet<S>>, state: S) -> Self {
        let mut animator = Self::new(set);
        animator.set_state(state);
        animator
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn set(&self) -> &Arc<AnimationSet<S>> {
        &self.set
    }

    /// Enter `state` at its first frame
    pub fn set_state(&mut self, state: S) {
        self.set_state_at(state, 0);
    }

    /// Enter `state` at `frame` (clamped to the clip)
    pub fn set_state_at(&mut self, state: S, frame: usize) {
        self.state = self.resolve(state);
        self.frame = frame.min(self.clip().len().saturating_sub(1));
        self.finished = false;
    }

    fn resolve(&self, state: S) -> S {
        if self.set.contains(state) {
            state
        } else {
            log::warn!(
                "No clip for animation state {state:?}, using {:?}",
                self.set.fallback
            );
            self.set.fallback
        }
    }

    fn clip(&self) -> &AnimClip<S> {
        // State is always resolved against the set, and the fallback is
        // validated at build time.
        &self.set.clips[&self.state]
    }

    /// Step on the global frame counter
    pub fn advance(&mut self, frame_counter: u64) -> AnimStep<S> {
        if self.finished {
            return AnimStep::Held;
        }
        let (delay, len, policy) = {
            let clip = self.clip();
            (clip.delay, clip.len(), clip.policy)
        };
        if frame_counter % u64::from(delay) != 0 {
            return AnimStep::Held;
        }

        self.frame += 1;
        if self.frame < len {
            return AnimStep::Advanced;
        }
        match policy {
            Playback::Loop => {
                self.frame = 0;
                AnimStep::Wrapped
            }
            Playback::Then(next) => {
                let from = self.state;
                self.state = next;
                self.frame = 0;
                AnimStep::Returned { from, to: next }
            }
            Playback::Hold => {
                self.frame = len - 1;
                self.finished = true;
                AnimStep::Finished
            }
        }
    }

    pub fn current_frame(&self) -> FrameHandle {
        let clip = self.clip();
        clip.frames[self.frame.min(clip.len() - 1)]
    }

    /// Top-left draw position for an entity at `pos`
    pub fn draw_origin(&self, pos: Vec2) -> Vec2 {
        pos - self.set.anchor + self.clip().offset
    }

    /// One blit; never touches animation state
    pub fn draw(&self, pos: Vec2, canvas: &mut dyn Canvas) {
        canvas.blit(self.current_frame(), self.draw_origin(pos));
    }
}
