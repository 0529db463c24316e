//! Beam-dodging minefield
//!
//! A trapezoid beam sweeps around the screen center. The pointer keeps the
//! light alive by staying inside it and drains it by straying out; mines
//! dropped in the quarter opposite the pointer either end the run or pay out
//! when touched. Points trickle in faster the farther the pointer sits from
//! the center.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Game, PlayOutcome, ScreenPhase};
use crate::consts::{MAX_EFFECTS, REFERENCE_HEIGHT};
use crate::error::SimError;
use crate::platform::{InputEvent, PointerTracker, Release};
use crate::render::{Canvas, Rgba, WHITE};
use crate::settings::{DodgerTuning, Tuning};
use crate::sim::collision::{point_in_quad, point_in_triangle};
use crate::sim::effects::{EffectPool, Ring, Shake};
use crate::sim::state::RngState;

const DARK_BLUE: Rgba = [10, 17, 30, 255];
const RED: Rgba = [190, 40, 100, 255];
const BLUE: Rgba = [90, 210, 255, 255];

pub const LIFE_MAX: u8 = 255;
pub const LIFE_MIN: u8 = 75;
/// The run ends once the light fades to this
pub const LIFE_OUT: u8 = 135;

/// Beam turn rate on the menu before it spins down
const MENU_SPIN: f32 = 5.0;
const MENU_SPIN_DECAY: f32 = 1.028;
const MENU_STOP_SPEED: f32 = 0.13;
/// Passive scoring speeds up one step per band of pointer distance
const SCORE_BAND: f32 = 60.0;
const SCORE_MINE_DIVISOR: f32 = 30.0;
const SCORE_MINE_BASE: u64 = 2;
/// Mine grid cell edge at the reference height
const GRID_CELL: f32 = 40.0;
const MINE_JITTER: i32 = 4;

/// Rotating trapezoid anchored on the screen center
#[derive(Debug, Clone)]
pub struct Light {
    center: Vec2,
    /// Unrotated corners relative to the center
    outline: [Vec2; 4],
    points: [Vec2; 4],
    radius: f32,
    /// Degrees
    angle: f32,
    speed: f32,
    direction: f32,
    life: u8,
}

impl Light {
    /// Beam `radius` wide at the center, edges leaning out by `spread`
    /// degrees, long enough to reach every corner of `size`
    pub fn new(size: Vec2, radius: f32, spread: f32, speed: f32) -> Self {
        let len = size.max_element();
        let lean = spread.to_radians().sin() * len;
        let outline = [
            Vec2::new(-radius, 0.0),
            Vec2::new(radius, 0.0),
            Vec2::new(lean + radius, len),
            Vec2::new(-lean - radius, len),
        ];
        let mut light = Self {
            center: size * 0.5,
            outline,
            points: outline,
            radius,
            angle: 0.0,
            speed,
            direction: 1.0,
            life: LIFE_MAX,
        };
        light.place();
        light
    }

    fn place(&mut self) {
        let rotation = Vec2::from_angle(self.angle.to_radians());
        for (point, corner) in self.points.iter_mut().zip(self.outline) {
            *point = rotation.rotate(corner) + self.center;
        }
    }

    /// Advance the sweep one tick, reversing first if `flip`
    pub fn turn(&mut self, flip: bool) {
        if flip {
            self.direction = -self.direction;
        }
        self.angle = (self.angle + self.speed * self.direction).rem_euclid(360.0);
        self.place();
    }

    /// Turn rate for a pointer `distance` px from the center
    pub fn set_speed(&mut self, distance: f32, score: u64, tuning: &DodgerTuning) {
        self.speed = if score <= tuning.fast_score {
            tuning.base_speed + distance * tuning.speed_per_px
        } else {
            tuning.fast_base_speed + distance * tuning.fast_speed_per_px
        };
    }

    pub fn contains(&self, p: Vec2) -> bool {
        point_in_quad(p, &self.points)
    }

    /// Brighten while `pointer` is in the beam, dim while it is out. The
    /// disc around the center counts as neither.
    pub fn track(&mut self, pointer: Vec2) {
        if pointer.distance(self.center) < self.radius {
            return;
        }
        if self.contains(pointer) {
            if self.life < LIFE_MAX {
                self.life += 1;
            }
        } else if self.life > LIFE_MIN {
            self.life -= 1;
        }
    }

    pub fn is_out(&self) -> bool {
        self.life <= LIFE_OUT
    }

    pub fn life(&self) -> u8 {
        self.life
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn draw(&self, canvas: &mut dyn Canvas, offset: Vec2) {
        let color = [self.life, self.life, self.life, 255];
        let points = self.points.map(|p| p - offset);
        canvas.polygon(&points, color);
        canvas.circle(self.center - offset, self.radius, color, 0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineKind {
    /// Touching it ends the run
    Trap,
    /// Touching it pays out and removes it
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mine {
    pub pos: Vec2,
    pub size: f32,
    pub kind: MineKind,
}

impl Mine {
    pub fn touched(&self, pointer: Vec2) -> bool {
        pointer.distance(self.pos) <= self.size
    }
}

/// The four triangles meeting at the screen center: top, right, bottom, left
fn quarters(size: Vec2) -> [[Vec2; 3]; 4] {
    let (w, h) = (size.x, size.y);
    let c = size * 0.5;
    [
        [Vec2::ZERO, Vec2::new(w, 0.0), c],
        [Vec2::new(w, 0.0), Vec2::new(w, h), c],
        [c, Vec2::new(w, h), Vec2::new(0.0, h)],
        [Vec2::ZERO, c, Vec2::new(0.0, h)],
    ]
}

/// First quarter containing `p`, if it is on screen
fn quarter_of(size: Vec2, p: Vec2) -> Option<usize> {
    quarters(size)
        .iter()
        .position(|[a, b, c]| point_in_triangle(p, *a, *b, *c))
}

/// Top-left corners of the grid cells, grouped by the quarter holding each
/// cell's center
fn divide_screen(size: Vec2, cell: f32) -> [Vec<Vec2>; 4] {
    let cols = (size.x / cell).floor().max(1.0) as u32;
    let rows = (size.y / cell).floor().max(1.0) as u32;
    let cell = Vec2::new(size.x / cols as f32, size.y / rows as f32);
    let mut cells: [Vec<Vec2>; 4] = Default::default();
    for row in 0..rows {
        for col in 0..cols {
            let corner = Vec2::new(col as f32, row as f32) * cell;
            if let Some(q) = quarter_of(size, corner + cell * 0.5) {
                cells[q].push(corner);
            }
        }
    }
    cells
}

#[derive(Debug)]
pub struct Dodger {
    size: Vec2,
    tuning: DodgerTuning,
    tick_rate: u32,
    adj: f32,
    seed: RngState,
    rng: Pcg32,
    light: Light,
    mines: Vec<Mine>,
    /// Free mine cells per quarter
    cells: [Vec<Vec2>; 4],
    score: u64,
    lay_timer: u32,
    score_timer: u32,
    presses: EffectPool<Ring>,
    shake: Shake,
}

impl Dodger {
    pub fn new(size: Vec2, tuning: &Tuning, seed: u64) -> Self {
        let seed = RngState::new(seed);
        let adj = size.y / REFERENCE_HEIGHT;
        let dodger = tuning.dodger.clone();
        let light = Light::new(size, dodger.beam_radius * adj, dodger.beam_spread, MENU_SPIN);
        let mut game = Self {
            size,
            tuning: dodger,
            tick_rate: tuning.tick_rate,
            adj,
            seed,
            rng: seed.to_rng(),
            light,
            mines: Vec::new(),
            cells: Default::default(),
            score: 0,
            lay_timer: 0,
            score_timer: 0,
            presses: EffectPool::new(MAX_EFFECTS),
            shake: Shake::default(),
        };
        game.reset();
        game
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn mines(&self) -> &[Mine] {
        &self.mines
    }

    pub fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Drop a mine at a fixed spot
    pub fn place_mine(&mut self, kind: MineKind, pos: Vec2) {
        self.mines.push(Mine {
            pos,
            size: self.tuning.mine_size * self.adj,
            kind,
        });
    }

    /// Drop a trap, sometimes with a score mine and a second trap, in the
    /// quarter opposite `pointer`. Each mine takes a free cell; a full
    /// quarter gets no more.
    fn lay_mines(&mut self, pointer: Vec2) {
        let quarter = match quarter_of(self.size, pointer) {
            Some(q) => (q + 2) % 4,
            None => self.rng.random_range(0..4),
        };
        let kinds: &[MineKind] = if self.rng.random::<f32>() <= self.tuning.bonus_chance {
            &[MineKind::Trap, MineKind::Score, MineKind::Trap]
        } else {
            &[MineKind::Trap]
        };
        for &kind in kinds {
            let free = &mut self.cells[quarter];
            if free.is_empty() {
                log::debug!("Quarter {quarter} is full");
                break;
            }
            let pick = self.rng.random_range(0..free.len());
            let cell = free.swap_remove(pick);
            let jitter = Vec2::new(
                self.rng.random_range(-MINE_JITTER..=MINE_JITTER) as f32,
                self.rng.random_range(-MINE_JITTER..=MINE_JITTER) as f32,
            );
            self.place_mine(kind, cell - jitter);
        }
        log::debug!("Laid {} mine(s) in quarter {quarter}", kinds.len());
    }

    fn lay_interval(&self) -> u32 {
        if self.score > self.tuning.fast_lay_score {
            self.tuning.fast_lay_interval
        } else {
            self.tuning.lay_interval
        }
    }

    /// Pay out and remove every score mine under the pointer
    fn collect_score_mines(&mut self, pointer: Vec2, distance: f32) {
        let before = self.mines.len();
        self.mines
            .retain(|m| !(m.kind == MineKind::Score && m.touched(pointer)));
        let taken = (before - self.mines.len()) as u64;
        let payout = (distance / SCORE_MINE_DIVISOR) as u64 + SCORE_MINE_BASE;
        self.score += taken * payout;
    }

    /// One point per `tick_rate` ticks, sped up by distance bands; nothing
    /// while the pointer sits on the center disc
    fn passive_score(&mut self, distance: f32) {
        let band = ((distance / SCORE_BAND).floor() as u32).max(1);
        if self.score_timer * band >= self.tick_rate {
            if distance > self.light.radius {
                self.score += 1;
            }
            self.score_timer = 0;
        }
    }

    fn trap_touched(&self, pointer: Vec2) -> bool {
        self.mines
            .iter()
            .any(|m| m.kind == MineKind::Trap && m.touched(pointer))
    }
}

impl Game for Dodger {
    fn name(&self) -> &'static str {
        "dodger"
    }

    fn reset(&mut self) {
        self.rng = self.seed.to_rng();
        self.light = Light::new(
            self.size,
            self.tuning.beam_radius * self.adj,
            self.tuning.beam_spread,
            MENU_SPIN,
        );
        self.mines.clear();
        self.cells = divide_screen(self.size, GRID_CELL * self.adj);
        self.score = 0;
        self.lay_timer = 0;
        self.score_timer = 0;
        self.presses.clear();
        self.shake = Shake::default();
    }

    fn on_pointer(&mut self, event: &InputEvent, _release: Option<&Release>) {
        if let InputEvent::PointerDown(at) = *event {
            let h = self.size.y;
            self.presses.spawn(
                Ring::new(at, h / 15.0, 0.1, DARK_BLUE)
                    .fading_to(WHITE)
                    .starting_at(1.0)
                    .with_width(h / 200.0),
            );
        }
    }

    fn update_menu(&mut self, _frame: u64) {
        self.light.turn(false);
        self.light.speed /= MENU_SPIN_DECAY;
        if self.light.speed <= MENU_STOP_SPEED {
            self.light.speed = 0.0;
        }
        self.presses.update();
    }

    fn update_playing(
        &mut self,
        _frame: u64,
        pointer: &PointerTracker,
    ) -> Result<PlayOutcome, SimError> {
        let at = pointer.position();
        if !at.is_finite() {
            return Err(SimError::Invariant(format!("pointer off the number line at {at}")));
        }
        let distance = at.distance(self.center());

        self.lay_timer += 1;
        self.score_timer += 1;

        self.light.set_speed(distance, self.score, &self.tuning);
        let flip = self.rng.random::<f32>() < self.tuning.flip_chance / self.tick_rate as f32;
        self.light.turn(flip);
        self.light.track(at);

        self.collect_score_mines(at, distance);
        if self.lay_timer >= self.lay_interval() {
            self.lay_mines(at);
            self.lay_timer = 0;
        }
        self.passive_score(distance);
        self.presses.update();

        if self.light.is_out() || self.trap_touched(at) {
            return Ok(PlayOutcome::Over);
        }
        Ok(PlayOutcome::Continue)
    }

    fn on_game_over(&mut self) {
        self.shake.start((125.0 * self.adj) as u32, 12.5 * self.adj);
        log::info!(
            "Dodger run over at score {} (light {})",
            self.score,
            self.light.life
        );
    }

    fn update_game_over(&mut self, _frame: u64) {
        self.shake.update(&mut self.rng);
        self.presses.update();
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn draw(&self, phase: ScreenPhase, canvas: &mut dyn Canvas) {
        let offset = self.shake.offset();
        self.light.draw(canvas, offset);
        if phase != ScreenPhase::Menu {
            for mine in &self.mines {
                let color = match mine.kind {
                    MineKind::Trap => RED,
                    MineKind::Score => BLUE,
                };
                canvas.circle(mine.pos - offset, mine.size * 0.5, color, 0.0);
            }
        }
        self.presses.draw(canvas, Vec2::ZERO);
    }
}
