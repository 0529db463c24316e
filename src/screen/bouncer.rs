//! Line-drawing bouncer
//!
//! A ball falls under gravity. Every release of the pointer draws a wall from
//! the previous anchor to the release point, and landing on a wall from above
//! kicks the ball back up. The camera only ever scrolls upward; the ball
//! leaving the screen ends the run.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Game, PlayOutcome, ScreenPhase};
use crate::consts::{MAX_EFFECTS, MAX_WALLS, REFERENCE_HEIGHT};
use crate::error::SimError;
use crate::platform::{InputEvent, PointerTracker, Release};
use crate::render::{Canvas, Rgba, WHITE};
use crate::settings::{BouncerTuning, Tuning};
use crate::sim::effects::{Dot, EffectPool, Ring, Shake, Spark, burst};
use crate::sim::motion::{Body, FallParams, Wall};
use crate::sim::state::RngState;

const BLUE: Rgba = [70, 140, 255, 255];
const DARK_BLUE: Rgba = [10, 17, 30, 255];
const RED: Rgba = [235, 60, 70, 255];
const GRAY: Rgba = [60, 66, 80, 255];

const TRAIL_LEN: usize = 50;
/// Walls whose top is this many screens below the camera are dropped
const PRUNE_SCREENS: f32 = 2.0;
const DEATH_RING_STEP: f32 = 0.015;
const SETTLE_RATE: f32 = 0.03;

/// Wall whose solid side faces up. Vertical walls end up with no solid side.
fn upward_wall(a: Vec2, b: Vec2) -> Wall {
    let mid = (a + b) * 0.5;
    Wall::facing(a, b, mid - Vec2::Y)
}

/// A vertical beam that charges, then shoves the ball sideways
#[derive(Debug, Clone, PartialEq)]
pub struct Laser {
    pub left: f32,
    pub right: f32,
    pub age: u32,
}

impl Laser {
    pub const CHARGE_TICKS: u32 = 180;
    pub const PUSH_END: u32 = 200;
    pub const LIFETIME: u32 = 240;

    /// Beam `width` wide starting at `left`, kept on screen
    pub fn new(left: f32, width: f32, screen_width: f32) -> Self {
        let right = (left + width).min(screen_width);
        Self {
            left: (right - width).max(0.0),
            right,
            age: 0,
        }
    }

    pub fn center(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    pub fn charging(&self) -> bool {
        self.age < Self::CHARGE_TICKS
    }

    pub fn firing(&self) -> bool {
        (Self::CHARGE_TICKS..=Self::PUSH_END).contains(&self.age)
    }

    pub fn expired(&self) -> bool {
        self.age >= Self::LIFETIME
    }

    /// Horizontal kick for a ball at `x`, away from the beam center
    pub fn push(&self, x: f32, strength: f32) -> f32 {
        if !self.firing() || x <= self.left || x >= self.right {
            0.0
        } else if x < self.center() {
            -strength
        } else {
            strength
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas, height: f32, adj: f32, offset_x: f32) {
        let width = (height / 320.0).max(1.0);
        let top = |x: f32| Vec2::new(x - offset_x, 0.0);
        let bottom = |x: f32| Vec2::new(x - offset_x, height);
        if self.charging() {
            canvas.line(top(self.left), bottom(self.left), RED, width);
            canvas.line(top(self.right), bottom(self.right), RED, width);
        }
        // Converging charge lines, one every 10 ticks
        let half = (self.right - self.left) * 0.5;
        let newest = self.age.min(Self::CHARGE_TICKS - 1);
        for born in (0..=newest).step_by(10) {
            let age = (self.age - born) as f32;
            let inset = age * 3.0 * adj;
            let fade = 1.0 - age * 0.03;
            if inset > half || fade <= 0.0 {
                continue;
            }
            let color = crate::render::lerp_color(DARK_BLUE, RED, fade);
            canvas.line(top(self.left + inset), bottom(self.left + inset), color, width);
            canvas.line(top(self.right - inset), bottom(self.right - inset), color, width);
        }
    }
}

#[derive(Debug)]
pub struct Bouncer {
    size: Vec2,
    tuning: BouncerTuning,
    /// Screen height relative to the reference height
    adj: f32,
    seed: RngState,
    rng: Pcg32,
    ball: Body,
    radius: f32,
    walls: Vec<Wall>,
    /// World point the next wall starts from
    anchor: Vec2,
    /// Pointer in screen space
    aim: Vec2,
    scroll: Vec2,
    last_platform: f32,
    score: u64,
    trail: VecDeque<Vec2>,
    lasers: Vec<Laser>,
    dots: EffectPool<Dot>,
    presses: EffectPool<Ring>,
    death_rings: EffectPool<Ring>,
    sparks: EffectPool<Spark>,
    shake: Shake,
    settle_to: f32,
}

impl Bouncer {
    pub fn new(size: Vec2, tuning: &Tuning, seed: u64) -> Self {
        let seed = RngState::new(seed);
        let mut game = Self {
            size,
            tuning: tuning.bouncer.clone(),
            adj: size.y / REFERENCE_HEIGHT,
            seed,
            rng: seed.to_rng(),
            ball: Body::default(),
            radius: size.y / 80.0,
            walls: Vec::new(),
            anchor: Vec2::ZERO,
            aim: Vec2::ZERO,
            scroll: Vec2::ZERO,
            last_platform: 0.0,
            score: 0,
            trail: VecDeque::with_capacity(TRAIL_LEN),
            lasers: Vec::new(),
            dots: EffectPool::new(MAX_EFFECTS),
            presses: EffectPool::new(MAX_EFFECTS),
            death_rings: EffectPool::new(8),
            sparks: EffectPool::new(MAX_EFFECTS),
            shake: Shake::default(),
            settle_to: 0.0,
        };
        game.reset();
        game
    }

    pub fn ball(&self) -> &Body {
        &self.ball
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn lasers(&self) -> &[Laser] {
        &self.lasers
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Draw a wall from the anchor to a screen-space point, which becomes
    /// the new anchor
    pub fn add_wall(&mut self, screen_point: Vec2) {
        let point = screen_point + Vec2::new(0.0, self.scroll.y);
        self.push_wall(upward_wall(self.anchor, point));
        self.anchor = point;
    }

    /// Add a wall, dropping the oldest ones past the cap
    fn push_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
        if self.walls.len() > MAX_WALLS {
            let excess = self.walls.len() - MAX_WALLS;
            self.walls.drain(..excess);
        }
    }

    /// Start a laser at `left` (screen x)
    pub fn spawn_laser(&mut self, left: f32) {
        self.lasers.push(Laser::new(left, self.size.x / 6.0, self.size.x));
    }

    fn spawn_platform(&mut self) {
        let (w, h) = (self.size.x, self.size.y);
        let base = Vec2::new(
            self.rng.random_range(0.0..=w),
            self.scroll.y - h / 10.0,
        );
        let tip = base
            + Vec2::new(
                (self.rng.random::<f32>() - 0.5) * w * 2.0 / 3.0,
                (self.rng.random::<f32>() - 0.5) * h / 5.0,
            );
        self.push_wall(upward_wall(base, tip));
        log::debug!("Platform at {base} -> {tip}");
    }

    fn maybe_spawn_laser(&mut self) {
        if self.score <= self.tuning.laser_score {
            return;
        }
        let odds = 150.0 * (1.0 + self.lasers.len() as f32 * 2.0) * (1.0 - 1.0 / self.score as f32);
        let odds = (odds as u32).max(1);
        if self.rng.random_range(1..=odds) == 1 {
            let left = self.rng.random::<f32>() * self.size.x;
            self.spawn_laser(left);
            log::debug!("Laser at x={left}");
        }
    }

    fn update_lasers(&mut self) {
        let rows = 25;
        for laser in &mut self.lasers {
            if laser.age == Laser::CHARGE_TICKS {
                for row in 0..rows {
                    let y = self.scroll.y + self.size.y * row as f32 / rows as f32;
                    for x in [laser.left, laser.right] {
                        burst(&mut self.sparks, Vec2::new(x, y), 2, RED, &mut self.rng);
                    }
                }
            }
            laser.age += 1;
        }
        self.lasers.retain(|l| !l.expired());
    }

    /// First wall crossed from its solid side bounces the ball
    fn collide(&mut self, prev: Vec2) {
        let t = &self.tuning;
        let Some(wall) = self.walls.iter().find(|w| w.crossed(prev, self.ball.pos)) else {
            return;
        };
        if let Some(reflected) = wall.reflect(self.ball.vel, prev, t.restitution, t.tangential) {
            self.ball.pos = prev;
            self.ball.vel = Vec2::new(reflected.x, -t.rebound * self.adj);
        }
    }

    fn push_lasers(&mut self) {
        let strength = self.tuning.laser_push * self.adj;
        let x = self.ball.pos.x;
        self.ball.vel.x += self.lasers.iter().map(|l| l.push(x, strength)).sum::<f32>();
    }

    fn emit_trail(&mut self) {
        let jitter = Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>()) - 0.5;
        let drift = Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>()) - 0.5;
        self.dots.spawn(Dot {
            pos: self.ball.pos + jitter * self.radius,
            vel: (-self.ball.vel * 0.5 + drift) * self.adj,
            size: self.radius,
            dissolve: self.radius * 0.05,
            color: BLUE,
        });
    }

    fn prune_walls(&mut self) {
        let limit = self.scroll.y + self.size.y * PRUNE_SCREENS;
        self.walls.retain(|w| w.a.y.min(w.b.y) < limit);
    }

    fn out_of_bounds(&self) -> bool {
        let pos = self.ball.pos;
        pos.y - self.scroll.y > self.size.y || pos.x < 0.0 || pos.x > self.size.x
    }

    fn view_offset(&self) -> Vec2 {
        self.scroll + self.shake.offset()
    }
}

impl Game for Bouncer {
    fn name(&self) -> &'static str {
        "bouncer"
    }

    fn reset(&mut self) {
        let (w, h) = (self.size.x, self.size.y);
        let ground = h - h / 400.0;
        self.rng = self.seed.to_rng();
        self.ball = Body::new(self.size * 0.5, Vec2::ZERO);
        self.walls = vec![
            upward_wall(Vec2::new(0.0, ground), Vec2::new(w, ground)),
            upward_wall(Vec2::new(w / 2.0, ground), Vec2::new(w / 2.0, ground)),
        ];
        self.anchor = Vec2::new(w / 2.0, ground);
        self.aim = self.anchor;
        self.scroll = Vec2::ZERO;
        self.last_platform = 0.0;
        self.score = 0;
        self.trail.clear();
        self.lasers.clear();
        self.dots.clear();
        self.presses.clear();
        self.death_rings.clear();
        self.sparks.clear();
        self.shake = Shake::default();
        self.settle_to = 0.0;
    }

    fn on_pointer(&mut self, event: &InputEvent, release: Option<&Release>) {
        match *event {
            InputEvent::PointerDown(at) => {
                self.aim = at;
                let h = self.size.y;
                self.presses.spawn(
                    Ring::new(at, h / 15.0, 0.1, DARK_BLUE)
                        .fading_to(WHITE)
                        .starting_at(1.0)
                        .with_width(h / 200.0),
                );
            }
            InputEvent::PointerMove(at) => self.aim = at,
            InputEvent::PointerUp(at) => {
                self.aim = at;
                if release.is_some() {
                    self.add_wall(at);
                }
            }
            InputEvent::Quit => {}
        }
    }

    fn update_menu(&mut self, _frame: u64) {
        self.presses.update();
    }

    fn update_playing(
        &mut self,
        _frame: u64,
        _pointer: &PointerTracker,
    ) -> Result<PlayOutcome, SimError> {
        let h = self.size.y;
        let spacing = h * self.tuning.platform_spacing;
        if -self.scroll.y - self.last_platform > spacing {
            if self.rng.random_range(1..=3) <= self.tuning.platform_odds {
                self.spawn_platform();
            }
            self.last_platform += spacing;
        }

        let prev = self.ball.pos;
        self.trail.push_back(prev);
        if self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }
        self.ball.fall(&FallParams {
            gravity: self.tuning.gravity * self.adj,
            terminal: self.tuning.terminal_fall * self.adj,
        });
        self.ball.integrate(1.0);
        self.collide(prev);
        self.push_lasers();

        if !self.ball.pos.is_finite() {
            return Err(SimError::Invariant(format!(
                "ball left the number line at {}",
                self.ball.pos
            )));
        }

        self.scroll.y = self.scroll.y.min(self.ball.pos.y - h / 2.0);
        self.score = (-self.scroll.y * self.adj).max(0.0) as u64;

        self.maybe_spawn_laser();
        self.update_lasers();

        self.emit_trail();
        self.dots.update();
        self.presses.update();
        self.sparks.update();
        self.prune_walls();

        if self.out_of_bounds() {
            return Ok(PlayOutcome::Over);
        }
        Ok(PlayOutcome::Continue)
    }

    fn on_game_over(&mut self) {
        let h = self.size.y;
        let center = self.ball.pos;
        let width = h / 50.0;
        let rings = [
            (h / 2.0, h * 3.0, RED, RED),
            (h / 4.0, h * 3.0, RED, RED),
            (h / 4.0, h * 2.0, RED, DARK_BLUE),
            (h / 16.0, h * 2.0, RED, DARK_BLUE),
            (h / 16.0, h, RED, DARK_BLUE),
        ];
        for (start, target, from, to) in rings {
            self.death_rings.spawn(
                Ring::new(center, target, DEATH_RING_STEP, from)
                    .fading_to(to)
                    .starting_at(start)
                    .with_width(width),
            );
        }
        self.dots.clear();
        self.shake.start((125.0 * self.adj) as u32, 12.5 * self.adj);
        self.settle_to = (self.scroll.y + 1000.0).min(0.0);
        log::info!("Bouncer run over at score {}", self.score);
    }

    fn update_game_over(&mut self, _frame: u64) {
        self.shake.update(&mut self.rng);
        let settle = (self.settle_to - self.scroll.y) * SETTLE_RATE;
        if settle >= 0.1 {
            self.scroll.y += settle;
        }
        self.death_rings.update();
        self.presses.update();
        self.sparks.update();
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn draw(&self, phase: ScreenPhase, canvas: &mut dyn Canvas) {
        let offset = self.view_offset();
        let line_width = self.size.y / 160.0;
        for wall in &self.walls {
            canvas.line(wall.a - offset, wall.b - offset, GRAY, line_width);
        }

        match phase {
            ScreenPhase::Playing => {
                canvas.line(self.anchor - offset, self.aim, BLUE, line_width * 0.5);
                for (a, b) in self.trail.iter().zip(self.trail.iter().skip(1)) {
                    canvas.line(*a - offset, *b - offset, BLUE, (line_width * 0.25).max(1.0));
                }
                self.dots.draw(canvas, offset);
                canvas.circle(self.ball.pos - offset, self.radius, BLUE, 0.0);
                for laser in &self.lasers {
                    laser.draw(canvas, self.size.y, self.adj, offset.x);
                }
                self.sparks.draw(canvas, offset);
            }
            ScreenPhase::GameOver => {
                self.death_rings.draw(canvas, offset);
                self.sparks.draw(canvas, offset);
            }
            _ => canvas.circle(self.ball.pos - offset, self.radius, BLUE, 0.0),
        }
        self.presses.draw(canvas, Vec2::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, DrawList};

    const SIZE: Vec2 = Vec2::new(720.0, 1280.0);

    fn game() -> Bouncer {
        Bouncer::new(SIZE, &Tuning::default(), 3)
    }

    fn tick(game: &mut Bouncer) -> PlayOutcome {
        game.update_playing(0, &PointerTracker::new()).unwrap()
    }

    /// Tick until the ball starts moving up; returns the tick count
    fn until_bounce(game: &mut Bouncer, limit: u32) -> Option<u32> {
        (1..=limit).find(|_| {
            tick(game);
            game.ball().vel.y < 0.0
        })
    }

    fn release(at: Vec2) -> (InputEvent, Release) {
        (
            InputEvent::PointerUp(at),
            Release {
                from: at,
                to: at,
                held_frames: 1,
                tap: true,
            },
        )
    }

    #[test]
    fn test_initial_layout() {
        let game = game();
        assert_eq!(game.ball().pos, SIZE * 0.5);
        assert_eq!(game.walls().len(), 2);
        assert!(game.walls()[1].is_degenerate());
        assert!((game.anchor() - Vec2::new(360.0, 1276.8)).length() < 1e-3);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_floor_bounce() {
        let mut game = game();
        assert!(until_bounce(&mut game, 200).is_some());
        assert_eq!(game.ball().vel.y, -11.0);
        assert!(game.ball().pos.y < 1276.8);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_falls_with_terminal_speed() {
        let mut game = game();
        for _ in 0..60 {
            tick(&mut game);
        }
        assert_eq!(game.ball().vel.y, 8.0);
    }

    #[test]
    fn test_drawn_wall_catches_ball() {
        let mut game = game();
        for at in [Vec2::new(0.0, 900.0), Vec2::new(720.0, 900.0)] {
            let (event, rel) = release(at);
            game.on_pointer(&event, Some(&rel));
        }
        assert_eq!(game.walls().len(), 4);
        assert_eq!(game.anchor(), Vec2::new(720.0, 900.0));
        assert!(until_bounce(&mut game, 200).is_some());
        assert!(game.ball().pos.y < 900.0);
    }

    #[test]
    fn test_wall_is_one_sided() {
        let mut game = game();
        game.walls.push(upward_wall(Vec2::new(0.0, 900.0), Vec2::new(720.0, 900.0)));
        game.ball = Body::new(Vec2::new(360.0, 1000.0), Vec2::new(0.0, -11.0));
        for _ in 0..30 {
            tick(&mut game);
        }
        // Passed straight up through the wall
        assert!(game.ball().pos.y < 900.0);
        assert!(game.ball().vel.y > -11.0);
    }

    #[test]
    fn test_move_without_release_draws_nothing() {
        let mut game = game();
        game.on_pointer(&InputEvent::PointerMove(Vec2::new(10.0, 10.0)), None);
        game.on_pointer(&InputEvent::PointerUp(Vec2::new(10.0, 10.0)), None);
        assert_eq!(game.walls().len(), 2);
    }

    #[test]
    fn test_press_spawns_ring() {
        let mut game = game();
        game.on_pointer(&InputEvent::PointerDown(Vec2::new(10.0, 10.0)), None);
        assert_eq!(game.presses.len(), 1);
        for _ in 0..12 {
            tick(&mut game);
        }
        assert!(game.presses.is_empty());
    }

    #[test]
    fn test_camera_follows_ball_up() {
        let mut game = game();
        game.ball = Body::new(Vec2::new(360.0, 100.0), Vec2::ZERO);
        assert_eq!(tick(&mut game), PlayOutcome::Continue);
        assert!((game.scroll().y + 539.85).abs() < 1e-3);
        assert_eq!(game.score(), 539);

        // Camera never scrolls back down
        game.ball.pos.y = 500.0;
        tick(&mut game);
        assert!((game.scroll().y + 539.85).abs() < 1e-3);
    }

    #[test]
    fn test_platform_schedule() {
        let mut game = game();
        game.ball = Body::new(Vec2::new(360.0, 100.0), Vec2::ZERO);
        for _ in 0..4 {
            tick(&mut game);
        }
        let spacing = SIZE.y / 7.0;
        assert!((game.last_platform - 2.0 * spacing).abs() < 1e-3);
    }

    #[test]
    fn test_leaving_screen_ends_run() {
        let mut game = game();
        game.ball.pos.x = -5.0;
        assert_eq!(tick(&mut game), PlayOutcome::Over);

        let mut game = Bouncer::new(SIZE, &Tuning::default(), 3);
        game.walls.clear();
        let outcome = (0..300).map(|_| tick(&mut game)).find(|o| *o == PlayOutcome::Over);
        assert_eq!(outcome, Some(PlayOutcome::Over));
    }

    #[test]
    fn test_game_over_effects() {
        let mut game = game();
        game.on_game_over();
        assert_eq!(game.death_rings.len(), 5);
        assert!(game.shake.is_active());
        for _ in 0..200 {
            game.update_game_over(0);
        }
        assert!(game.death_rings.is_empty());
        assert!(!game.shake.is_active());
    }

    #[test]
    fn test_laser_push_window() {
        let mut laser = Laser::new(100.0, 120.0, 720.0);
        assert_eq!(laser.center(), 160.0);
        assert_eq!(laser.push(120.0, 8.0), 0.0);
        laser.age = Laser::CHARGE_TICKS;
        assert_eq!(laser.push(120.0, 8.0), -8.0);
        assert_eq!(laser.push(200.0, 8.0), 8.0);
        assert_eq!(laser.push(300.0, 8.0), 0.0);
        laser.age = Laser::PUSH_END + 1;
        assert_eq!(laser.push(120.0, 8.0), 0.0);
    }

    #[test]
    fn test_laser_stays_on_screen() {
        let laser = Laser::new(700.0, 120.0, 720.0);
        assert_eq!(laser.right, 720.0);
        assert_eq!(laser.left, 600.0);
    }

    #[test]
    fn test_firing_laser_pushes_ball() {
        let mut game = game();
        game.spawn_laser(350.0);
        game.lasers[0].age = Laser::CHARGE_TICKS;
        tick(&mut game);
        assert_eq!(game.ball().vel.x, -8.0);
        assert!(!game.sparks.is_empty());
    }

    #[test]
    fn test_lasers_expire() {
        let mut game = game();
        game.spawn_laser(0.0);
        game.lasers[0].age = Laser::LIFETIME - 1;
        tick(&mut game);
        assert!(game.lasers().is_empty());
    }

    #[test]
    fn test_wall_cap() {
        let mut game = game();
        for i in 0..(MAX_WALLS + 40) {
            game.add_wall(Vec2::new((i % 700) as f32, 600.0));
        }
        assert_eq!(game.walls().len(), MAX_WALLS);
    }

    #[test]
    fn test_platforms_respect_wall_cap() {
        let mut game = game();
        for i in 0..MAX_WALLS {
            game.add_wall(Vec2::new((i % 700) as f32, 600.0));
        }
        let newest = *game.walls().last().unwrap();
        game.spawn_platform();
        game.spawn_platform();
        assert_eq!(game.walls().len(), MAX_WALLS);
        // Oldest walls make room; the drawn ones survive behind the platforms
        assert_eq!(game.walls()[MAX_WALLS - 3], newest);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut game = game();
        game.add_wall(Vec2::new(10.0, 10.0));
        game.spawn_laser(0.0);
        for _ in 0..10 {
            tick(&mut game);
        }
        game.reset();
        assert_eq!(game.walls().len(), 2);
        assert!(game.lasers().is_empty());
        assert_eq!(game.ball().pos, SIZE * 0.5);
        assert_eq!(game.scroll(), Vec2::ZERO);
    }

    #[test]
    fn test_draw_playing() {
        let mut game = game();
        tick(&mut game);
        let mut list = DrawList::new();
        game.draw(ScreenPhase::Playing, &mut list);
        let circles = list
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count();
        // Ball plus one trail dot
        assert_eq!(circles, 2);
        assert_eq!(list.blit_count(), 0);
    }
}
