//! Deterministic simulation module
//!
//! All gameplay mechanics live here. This module must be pure and deterministic:
//! - Fixed timestep only (callers pass a tick counter, never wall time)
//! - Seeded RNG only
//! - No platform dependencies; drawing goes through [`crate::render::Canvas`]

pub mod anim;
pub mod collision;
pub mod effects;
pub mod gesture;
pub mod mask;
pub mod motion;
pub mod parallel;
pub mod state;

pub use anim::{AnimClip, AnimState, AnimStep, AnimationSet, Animator, ClipDef, Playback};
pub use collision::{
    Aabb, ccw, gated_overlap, on_segment, point_in_quad, point_in_triangle, segments_intersect,
    within_distance,
};
pub use effects::{Dot, Effect, EffectPool, Puff, Ring, Shake, Spark, burst};
pub use gesture::{Gesture, GestureThresholds, Stroke, classify, classify_with};
pub use mask::{AlphaFrame, CollisionMask, MaskedSprite, mask_collision, rect_mask_collision};
pub use motion::{
    Body, BounceParams, FallParams, SeekParams, Wall, reflect_off_normal, reflect_off_segment,
};
pub use parallel::{Executor, Scoped, Sequential, UpdateExecutor};
pub use state::{Actor, EntityId, IdAllocator, RngState, SpellHit, SpellSequence};
