//! Shared entity state
//!
//! Building blocks every game's state is made of: seeded RNG, stable entity
//! ids, animated actors with a liveness flag, and the per-enemy spell
//! sequence.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::anim::{AnimState, Animator, AnimStep};
use super::gesture::Gesture;
use super::motion::Body;
use crate::error::SimError;
use crate::render::Canvas;

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Independent stream for the same seed
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        Self { seed, stream }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// Stable entity id, allocated in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocate a new entity ID
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// An animated, moving entity owned by a screen
#[derive(Debug, Clone)]
pub struct Actor<S: AnimState> {
    pub id: EntityId,
    pub body: Body,
    pub anim: Animator<S>,
    /// Cleared to mark for removal; the owner sweeps
    pub alive: bool,
}

impl<S: AnimState> Actor<S> {
    pub fn new(id: EntityId, pos: Vec2, anim: Animator<S>) -> Self {
        Self {
            id,
            body: Body::new(pos, Vec2::ZERO),
            anim,
            alive: true,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn animate(&mut self, frame_counter: u64) -> AnimStep<S> {
        self.anim.advance(frame_counter)
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        self.anim.draw(self.body.pos, canvas);
    }
}

/// Outcome of casting one gesture at a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellHit {
    /// Wrong symbol, or the sequence was already complete
    Miss,
    /// Correct symbol, more remain
    Hit,
    /// Correct final symbol
    Defeated,
}

/// Ordered symbols an enemy must be hit with, left to right
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSequence {
    spells: Vec<Gesture>,
    matched: usize,
}

impl SpellSequence {
    /// An enemy with nothing to cast at it could never be defeated
    pub fn new(spells: Vec<Gesture>) -> Result<Self, SimError> {
        if spells.is_empty() {
            return Err(SimError::Invariant(
                "spell sequence must not be empty".to_string(),
            ));
        }
        Ok(Self { spells, matched: 0 })
    }

    /// `len` random symbols (at least one)
    pub fn random(rng: &mut impl Rng, len: usize) -> Self {
        let spells = (0..len.max(1))
            .map(|_| Gesture::ALL[rng.random_range(0..Gesture::ALL.len())])
            .collect();
        Self { spells, matched: 0 }
    }

    pub fn spells(&self) -> &[Gesture] {
        &self.spells
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn remaining(&self) -> &[Gesture] {
        &self.spells[self.matched..]
    }

    /// Symbol that has to come next
    pub fn next(&self) -> Option<Gesture> {
        self.spells.get(self.matched).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.matched >= self.spells.len()
    }

    /// Match `gesture` against the next symbol
    pub fn apply(&mut self, gesture: Gesture) -> SpellHit {
        match self.next() {
            Some(expected) if expected == gesture => self.step(),
            _ => SpellHit::Miss,
        }
    }

    /// Skip the next symbol regardless of what it is
    pub fn force_advance(&mut self) -> SpellHit {
        if self.is_complete() {
            SpellHit::Miss
        } else {
            self.step()
        }
    }

    fn step(&mut self) -> SpellHit {
        self.matched += 1;
        if self.is_complete() {
            SpellHit::Defeated
        } else {
            SpellHit::Hit
        }
    }
}
