//! Gesture spell game
//!
//! A caster stands in the middle of the screen while ghosts walk in from the
//! edges in waves. Every ghost wears a short row of symbols; drawing the
//! leftmost one knocks it off, and a ghost with none left dies. A ghost that
//! reaches the caster costs one heart.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Game, PlayOutcome, ScreenPhase};
use crate::consts::{MAX_EFFECTS, MAX_GHOSTS, REFERENCE_HEIGHT};
use crate::error::{AnimError, SimError};
use crate::platform::{InputEvent, PointerTracker, Release};
use crate::render::{Canvas, FrameHandle, Rgba, WHITE};
use crate::settings::{SpellTuning, Tuning};
use crate::sim::anim::{AnimStep, AnimationSet, Animator, ClipDef, frame_run};
use crate::sim::effects::{EffectPool, Spark, burst};
use crate::sim::gesture::{Gesture, GestureThresholds, Stroke};
use crate::sim::state::{Actor, EntityId, IdAllocator, RngState, SpellHit, SpellSequence};

/// Caster animation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatState {
    Waiting,
    /// Pointer is down, stroke in progress
    Spelling,
    Cast(Gesture),
    Attacked,
}

/// Ghost animation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GhostState {
    Moving,
    /// Took a symbol, keeps walking
    Attacked,
    /// Reached the caster; dies when the clip ends
    Attack,
    Die,
}

const CAT_FRAME_DELAY: u32 = 6;
/// Frame a ghost's death clip starts from when it was not killed by a spell
const DIE_SKIP_FRAMES: usize = 3;
const MAX_SPELL_LEN: u32 = 10;
const DEFEAT_SPARKS: usize = 12;

/// Stroke color hinting at what is being drawn
pub fn gesture_color(gesture: Option<Gesture>) -> Rgba {
    match gesture {
        Some(Gesture::Horizontal) => [231, 51, 37, 255],
        Some(Gesture::Vertical) => [44, 98, 204, 255],
        Some(Gesture::V) => [253, 245, 94, 255],
        Some(Gesture::InvertedV) => [117, 250, 79, 255],
        Some(Gesture::Lightning) => [247, 203, 71, 255],
        None => WHITE,
    }
}

/// Hands out consecutive frame handles
struct FrameCounter(u32);

impl FrameCounter {
    fn run(&mut self, count: u32) -> Vec<FrameHandle> {
        let frames = frame_run(self.0, count);
        self.0 += count;
        frames
    }

    fn one(&mut self) -> FrameHandle {
        self.0 += 1;
        FrameHandle(self.0 - 1)
    }
}

/// Play a run forward then backward
fn ping_pong(mut frames: Vec<FrameHandle>) -> Vec<FrameHandle> {
    let back: Vec<FrameHandle> = frames.iter().rev().copied().collect();
    frames.extend(back);
    frames
}

/// Shared animation sets and HUD frames for the spell game
#[derive(Debug, Clone)]
pub struct SpellAssets {
    pub cat: Arc<AnimationSet<CatState>>,
    pub ghost: Arc<AnimationSet<GhostState>>,
    /// One symbol frame per gesture, in [`Gesture::ALL`] order
    pub symbols: [FrameHandle; 5],
    pub heart_full: FrameHandle,
    pub heart_empty: FrameHandle,
}

impl SpellAssets {
    /// Frames numbered in the order the asset loader registers them.
    /// `sprite` is the on-screen sprite width.
    pub fn numbered(sprite: f32, ghost_delay: u32) -> Result<Self, AnimError> {
        let mut next = FrameCounter(0);

        let mut cat = AnimationSet::builder(Vec2::splat(sprite * 0.5), CatState::Waiting)
            .default_delay(CAT_FRAME_DELAY)
            .state(CatState::Waiting, ClipDef::new(ping_pong(next.run(12))))
            .state(
                CatState::Spelling,
                ClipDef::new(ping_pong(next.run(6))).offset(Vec2::new(0.0, -0.05) * sprite),
            );
        let casts = [
            (Gesture::Horizontal, 5, Vec2::new(-0.2, -0.35)),
            (Gesture::Vertical, 5, Vec2::new(0.0, -0.35)),
            (Gesture::V, 6, Vec2::new(-0.1, -0.425)),
            (Gesture::InvertedV, 6, Vec2::new(-0.15, -0.425)),
            (Gesture::Lightning, 6, Vec2::new(-0.25, -0.425)),
        ];
        for (gesture, count, offset) in casts {
            cat = cat.state(
                CatState::Cast(gesture),
                ClipDef::new(next.run(count))
                    .offset(offset * sprite)
                    .then(CatState::Waiting),
            );
        }
        let mut cat_required = vec![CatState::Waiting, CatState::Spelling, CatState::Attacked];
        cat_required.extend(Gesture::ALL.map(CatState::Cast));
        let cat = cat
            .state(
                CatState::Attacked,
                ClipDef::new(next.run(4)).then(CatState::Waiting),
            )
            .build(&cat_required)?;

        let ghost = AnimationSet::builder(Vec2::splat(sprite * 0.5), GhostState::Moving)
            .default_delay(ghost_delay)
            .state(GhostState::Moving, ClipDef::new(next.run(1)))
            .state(
                GhostState::Attacked,
                ClipDef::new(next.run(4))
                    .offset(Vec2::new(0.0, -0.05) * sprite)
                    .then(GhostState::Moving),
            )
            .state(
                GhostState::Die,
                ClipDef::new(next.run(7))
                    .offset(Vec2::new(0.0, -0.35) * sprite)
                    .hold(),
            )
            .state(
                GhostState::Attack,
                ClipDef::new(next.run(5)).then(GhostState::Die),
            )
            .build(&[
                GhostState::Moving,
                GhostState::Attacked,
                GhostState::Attack,
                GhostState::Die,
            ])?;

        let symbols = [next.one(), next.one(), next.one(), next.one(), next.one()];
        Ok(Self {
            cat: Arc::new(cat),
            ghost: Arc::new(ghost),
            symbols,
            heart_full: next.one(),
            heart_empty: next.one(),
        })
    }

    pub fn symbol(&self, gesture: Gesture) -> FrameHandle {
        let index = Gesture::ALL.iter().position(|g| *g == gesture).unwrap_or(0);
        self.symbols[index]
    }
}

/// A walking enemy and the symbols still protecting it
#[derive(Debug, Clone)]
pub struct Ghost {
    pub actor: Actor<GhostState>,
    pub spells: SpellSequence,
    /// Walk speed in px/s
    pub speed: f32,
}

impl Ghost {
    pub fn state(&self) -> GhostState {
        self.actor.anim.state()
    }

    /// Still walking, so it can be hit and can reach the caster
    pub fn is_threat(&self) -> bool {
        matches!(self.state(), GhostState::Moving | GhostState::Attacked)
    }

    /// Death clip is on its last frame
    fn dissolved(&self) -> bool {
        if self.state() != GhostState::Die {
            return false;
        }
        let last = self
            .actor
            .anim
            .set()
            .clip(GhostState::Die)
            .map_or(0, |clip| clip.len().saturating_sub(1));
        self.actor.anim.frame() >= last
    }
}

#[derive(Debug)]
pub struct SpellGame {
    size: Vec2,
    tuning: SpellTuning,
    thresholds: GestureThresholds,
    dt: f32,
    assets: SpellAssets,
    seed: RngState,
    rng: Pcg32,
    ids: IdAllocator,
    player: Vec2,
    cat: Animator<CatState>,
    hp: u32,
    ghosts: Vec<Ghost>,
    stroke: Stroke,
    drawing: bool,
    preview: Option<Gesture>,
    wave: u32,
    earned: u64,
    shown: u64,
    defeat_wait: Option<u32>,
    sparks: EffectPool<Spark>,
}

impl SpellGame {
    pub fn new(size: Vec2, tuning: &Tuning, seed: u64) -> Result<Self, AnimError> {
        let assets = SpellAssets::numbered(size.x * 0.1, tuning.default_frame_delay)?;
        let seed = RngState::new(seed);
        let mut game = Self {
            size,
            tuning: tuning.spell.clone(),
            thresholds: tuning.gesture,
            dt: tuning.sim_dt(),
            cat: Animator::new(assets.cat.clone()),
            assets,
            seed,
            rng: seed.to_rng(),
            ids: IdAllocator::default(),
            player: size * 0.5,
            hp: tuning.spell.player_hp,
            ghosts: Vec::new(),
            stroke: Stroke::new(tuning.spell.stroke_spacing * size.y),
            drawing: false,
            preview: None,
            wave: 0,
            earned: 0,
            shown: 0,
            defeat_wait: None,
            sparks: EffectPool::new(MAX_EFFECTS),
        };
        game.reset();
        Ok(game)
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Points actually earned
    pub fn earned(&self) -> u64 {
        self.earned
    }

    /// HUD score, counting up toward [`Self::earned`]
    pub fn shown_score(&self) -> u64 {
        self.shown
    }

    pub fn cat_state(&self) -> CatState {
        self.cat.state()
    }

    /// Classification of the stroke in progress
    pub fn preview(&self) -> Option<Gesture> {
        self.preview
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    /// Ticks left before GAMEOVER once hearts ran out
    pub fn defeat_wait(&self) -> Option<u32> {
        self.defeat_wait
    }

    /// Add a ghost carrying `spells`. Its speed follows the sequence length.
    pub fn spawn_ghost(&mut self, pos: Vec2, spells: SpellSequence) -> Result<EntityId, SimError> {
        if self.ghosts.len() >= MAX_GHOSTS {
            return Err(SimError::Invariant(format!(
                "ghost cap of {MAX_GHOSTS} exceeded"
            )));
        }
        let t = &self.tuning;
        let speed = (t.ghost_base_speed + (3.0 - spells.len() as f32) * t.ghost_speed_per_symbol)
            .max(t.ghost_min_speed)
            .min(t.ghost_max_speed);
        let id = self.ids.next_id();
        self.ghosts.push(Ghost {
            actor: Actor::new(id, pos, Animator::new(self.assets.ghost.clone())),
            spells,
            speed,
        });
        Ok(id)
    }

    /// Cast `gesture` at every living ghost, in spawn order.
    ///
    /// A matching Lightning also strips one symbol off every other living
    /// ghost and ends the cast.
    pub fn cast(&mut self, gesture: Gesture) -> Vec<(EntityId, SpellHit)> {
        log::debug!("Cast {gesture}");
        self.cat.set_state(CatState::Cast(gesture));
        let mut hits = Vec::new();
        for i in 0..self.ghosts.len() {
            if !self.ghosts[i].is_threat() {
                continue;
            }
            let hit = self.ghosts[i].spells.apply(gesture);
            if hit == SpellHit::Miss {
                continue;
            }
            self.strike(i, hit, &mut hits);
            if gesture == Gesture::Lightning {
                for j in 0..self.ghosts.len() {
                    if j != i && self.ghosts[j].is_threat() {
                        let chained = self.ghosts[j].spells.force_advance();
                        self.strike(j, chained, &mut hits);
                    }
                }
                break;
            }
        }
        hits
    }

    fn strike(&mut self, index: usize, hit: SpellHit, hits: &mut Vec<(EntityId, SpellHit)>) {
        let ghost = &mut self.ghosts[index];
        match hit {
            SpellHit::Miss => return,
            SpellHit::Hit => ghost.actor.anim.set_state(GhostState::Attacked),
            SpellHit::Defeated => {
                ghost.actor.anim.set_state(GhostState::Die);
                self.earned += self.tuning.points_per_ghost;
                let color = gesture_color(ghost.spells.spells().last().copied());
                burst(
                    &mut self.sparks,
                    ghost.actor.pos(),
                    DEFEAT_SPARKS,
                    color,
                    &mut self.rng,
                );
            }
        }
        hits.push((ghost.actor.id, hit));
    }

    fn spawn_wave(&mut self) -> Result<(), SimError> {
        let count = (self.wave / 3 + 1).min(MAX_GHOSTS as u32);
        let max_len = (self.wave / 5 + 1).min(MAX_SPELL_LEN);
        for _ in 0..count {
            let len = self.rng.random_range(1..=max_len) as usize;
            let pos = self.edge_position();
            let spells = SpellSequence::random(&mut self.rng, len);
            self.spawn_ghost(pos, spells)?;
        }
        log::info!("Wave {}: {count} ghosts, up to {max_len} symbols", self.wave);
        Ok(())
    }

    /// Spawn point on a screen edge; later waves only come from below and
    /// the sides
    fn edge_position(&mut self) -> Vec2 {
        let (w, h) = (self.size.x, self.size.y);
        let stage = self.wave / 10;
        let rng = &mut self.rng;
        let side = if stage == 0 {
            rng.random_range(0..4)
        } else {
            rng.random_range(1..4)
        };
        let low = if stage == 1 { h / 2.0 } else { h / 3.0 };
        match side {
            0 => Vec2::new(rng.random_range(w / 3.0..=w * 2.0 / 3.0), 0.0),
            1 => Vec2::new(rng.random_range(0.0..=w), h),
            2 => Vec2::new(0.0, rng.random_range(low..=h)),
            _ => Vec2::new(w, rng.random_range(low..=h)),
        }
    }

    fn update_ghosts(&mut self, frame: u64) {
        let target = self.player;
        let dt = self.dt;
        for ghost in &mut self.ghosts {
            if ghost.is_threat() {
                let to_player = target - ghost.actor.body.pos;
                ghost.actor.body.pos += to_player.normalize_or_zero() * ghost.speed * dt;
            }
            if let AnimStep::Returned {
                from: GhostState::Attack,
                to: GhostState::Die,
            } = ghost.actor.animate(frame)
            {
                ghost.actor.anim.set_state_at(GhostState::Die, DIE_SKIP_FRAMES);
            }
            if ghost.dissolved() {
                ghost.actor.alive = false;
            }
        }
        self.ghosts.retain(|g| g.actor.alive);
    }

    /// First ghost within reach attacks. At most one per tick.
    fn check_reach(&mut self) {
        let reach = self.tuning.ghost_reach * self.size.x / REFERENCE_HEIGHT;
        let player = self.player;
        if let Some(ghost) = self
            .ghosts
            .iter_mut()
            .find(|g| g.is_threat() && g.actor.pos().distance(player) < reach)
        {
            ghost.actor.anim.set_state(GhostState::Attack);
            self.hp = self.hp.saturating_sub(1);
            self.cat.set_state(CatState::Attacked);
            log::debug!("Ghost {:?} reached the caster, {} hp left", ghost.actor.id, self.hp);
        }
    }

    fn draw_stroke(&self, canvas: &mut dyn Canvas) {
        let points = self.stroke.points();
        let color = gesture_color(self.preview);
        for pair in points.windows(2) {
            canvas.line(pair[0], pair[1], color, 22.0);
        }
        for &point in points {
            canvas.circle(point, 10.0, color, 0.0);
        }
        if let Some(&last) = points.last() {
            canvas.circle(last, 15.0, WHITE, 0.0);
        }
    }

    fn draw_symbols(&self, ghost: &Ghost, canvas: &mut dyn Canvas) {
        let sprite = self.size.x * 0.1;
        let spacing = self.size.x * 0.02;
        let remaining = ghost.spells.remaining();
        let start = -(remaining.len() as f32) / 2.0;
        let y = ghost.actor.pos().y - sprite * 0.7;
        for (i, &gesture) in remaining.iter().enumerate() {
            let x = ghost.actor.pos().x + (start + i as f32) * spacing;
            canvas.blit(self.assets.symbol(gesture), Vec2::new(x, y));
        }
    }

    fn draw_hearts(&self, canvas: &mut dyn Canvas) {
        let w = self.size.x;
        for i in 0..self.tuning.player_hp {
            let frame = if i < self.hp {
                self.assets.heart_full
            } else {
                self.assets.heart_empty
            };
            canvas.blit(frame, Vec2::new(w / 40.0 + i as f32 * w / 20.0, w / 40.0));
        }
    }
}

impl Game for SpellGame {
    fn name(&self) -> &'static str {
        "spell"
    }

    fn reset(&mut self) {
        self.rng = self.seed.to_rng();
        self.ids = IdAllocator::default();
        self.cat.set_state(CatState::Waiting);
        self.hp = self.tuning.player_hp;
        self.ghosts.clear();
        self.stroke.clear();
        self.drawing = false;
        self.preview = None;
        self.wave = 0;
        self.earned = 0;
        self.shown = 0;
        self.defeat_wait = None;
        self.sparks.clear();
    }

    fn on_pointer(&mut self, event: &InputEvent, _release: Option<&Release>) {
        if self.defeat_wait.is_some() {
            return;
        }
        match *event {
            InputEvent::PointerDown(at) => {
                self.drawing = true;
                self.stroke.clear();
                self.stroke.push(at);
                self.preview = None;
                self.cat.set_state(CatState::Spelling);
            }
            InputEvent::PointerMove(at) => {
                if self.drawing && self.stroke.push(at) {
                    self.preview = self.stroke.classify(&self.thresholds);
                }
            }
            InputEvent::PointerUp(at) => {
                if !self.drawing {
                    return;
                }
                self.drawing = false;
                self.stroke.push(at);
                match self.stroke.classify(&self.thresholds) {
                    Some(gesture) => {
                        self.cast(gesture);
                    }
                    None => self.cat.set_state(CatState::Waiting),
                }
                self.stroke.clear();
                self.preview = None;
            }
            InputEvent::Quit => {}
        }
    }

    fn update_menu(&mut self, frame: u64) {
        self.cat.advance(frame);
    }

    fn update_playing(
        &mut self,
        frame: u64,
        _pointer: &PointerTracker,
    ) -> Result<PlayOutcome, SimError> {
        if self.hp == 0 {
            let half = self.tuning.defeat_wait_ticks / 2;
            let wait = self.defeat_wait.get_or_insert(self.tuning.defeat_wait_ticks);
            if *wait == half {
                for ghost in &mut self.ghosts {
                    ghost.actor.anim.set_state_at(GhostState::Die, DIE_SKIP_FRAMES);
                }
            }
            *wait = wait.saturating_sub(1);
            if *wait == 0 {
                return Ok(PlayOutcome::Over);
            }
        }

        self.update_ghosts(frame);
        self.cat.advance(frame);

        if self.defeat_wait.is_none() {
            self.check_reach();
            if self.ghosts.is_empty() {
                self.wave += 1;
                self.spawn_wave()?;
            }
        }

        self.sparks.update();
        self.shown = (self.shown + 1).min(self.earned);
        Ok(PlayOutcome::Continue)
    }

    fn update_game_over(&mut self, frame: u64) {
        self.cat.advance(frame);
        self.sparks.update();
    }

    fn on_game_over(&mut self) {
        self.drawing = false;
        self.stroke.clear();
        self.preview = None;
    }

    fn score(&self) -> u64 {
        self.earned
    }

    fn draw(&self, phase: ScreenPhase, canvas: &mut dyn Canvas) {
        self.cat.draw(self.player, canvas);
        if phase == ScreenPhase::Menu {
            return;
        }
        for ghost in &self.ghosts {
            ghost.actor.draw(canvas);
        }
        for ghost in self.ghosts.iter().filter(|g| g.is_threat()) {
            self.draw_symbols(ghost, canvas);
        }
        self.sparks.draw(canvas, Vec2::ZERO);
        self.draw_stroke(canvas);
        self.draw_hearts(canvas);
    }
}
