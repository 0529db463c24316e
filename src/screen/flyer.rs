//! Pointer-chasing flyer
//!
//! The ship steers toward the pointer with inertia and climbs through a field
//! of spinning asteroids. Altitude is the score. World coordinates put the
//! launch pad at the origin; the camera keeps the ship near screen center.

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Game, PlayOutcome, ScreenPhase};
use crate::consts::{MAX_ASTEROIDS, MAX_EFFECTS};
use crate::error::SimError;
use crate::platform::{InputEvent, PointerTracker, Release};
use crate::render::{Canvas, Rgba, WHITE};
use crate::settings::{FlyerTuning, Tuning};
use crate::sim::collision::{Aabb, within_distance};
use crate::sim::effects::{EffectPool, Puff, Spark, burst};
use crate::sim::mask::{AlphaFrame, MaskedSprite, rect_mask_collision};
use crate::sim::motion::{Body, BounceParams, SeekParams, reflect_off_normal};
use crate::sim::parallel::{Executor, UpdateExecutor};
use crate::sim::state::RngState;
use crate::{heading_of, heading_vector, wrap_degrees};

const GROUND: Rgba = [66, 62, 79, 255];
const ROCK: Rgba = [235, 235, 245, 255];
const EMBER: Rgba = [255, 170, 90, 255];

/// Pre-rasterized asteroid outlines shared by every spawn
const SHAPE_COUNT: usize = 8;
const SHAPE_SIZES: std::ops::RangeInclusive<u32> = 200..=250;

const SPAWN_DISTANCE: f32 = 700.0;
const SPAWN_JITTER: f32 = 100.0;
const SPAWN_MARGIN: f32 = 100.0;
const CULL_BEHIND: f32 = 900.0;
const CULL_RADIUS: f32 = 1500.0;

const TRAIL_LEN: usize = 45;
const EXHAUST_EVERY: u64 = 3;
const LERP_RAMP: f32 = 0.0005;
const LERP_MAX: f32 = 0.1;
/// Ticks after a hit during which further contact only bounces
const HIT_GRACE: u32 = 30;

/// A convex outline and its rasterized alpha
#[derive(Debug)]
pub struct AsteroidShape {
    /// Vertices relative to the frame center
    pub points: Vec<Vec2>,
    pub frame: Arc<AlphaFrame>,
}

impl AsteroidShape {
    /// Random convex-ish polygon of 5 to 9 vertices inside a `size` square
    pub fn random(size: u32, rng: &mut impl Rng) -> Self {
        let half = size as f32 * 0.5;
        let radius = rng.random_range(size as f32 / 3.0..=half);
        let mut angles: Vec<f32> = (0..rng.random_range(5..=9))
            .map(|_| rng.random_range(0.0..TAU))
            .collect();
        angles.sort_by(f32::total_cmp);
        let points: Vec<Vec2> = angles.iter().map(|a| Vec2::from_angle(*a) * radius).collect();
        let raster: Vec<Vec2> = points.iter().map(|p| *p + Vec2::splat(half)).collect();
        Self {
            frame: Arc::new(AlphaFrame::polygon(size, size, &raster)),
            points,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub body: Body,
    /// Degrees per tick, counter-clockwise on screen
    pub spin: f32,
    pub sprite: MaskedSprite,
    shape: Arc<AsteroidShape>,
    /// Close enough to the ship that its mask will be needed this tick
    armed: bool,
}

impl Asteroid {
    pub fn new(pos: Vec2, vel: Vec2, spin: f32, shape: Arc<AsteroidShape>) -> Self {
        Self {
            body: Body::new(pos, vel),
            spin,
            sprite: MaskedSprite::new(shape.frame.clone()),
            shape,
            armed: false,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    /// Drift and spin. Armed asteroids also rebuild their rotated mask here so
    /// the work lands on the executor.
    pub fn update(&mut self) {
        self.body.integrate(1.0);
        self.sprite.set_angle((self.sprite.angle() + self.spin).rem_euclid(360.0));
        if self.armed {
            self.sprite.mask();
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas, view: Vec2) {
        let (sin, cos) = self.sprite.angle().to_radians().sin_cos();
        let center = self.body.pos - view;
        let rotate = |p: Vec2| Vec2::new(p.x * cos + p.y * sin, -p.x * sin + p.y * cos) + center;
        let points = &self.shape.points;
        for (i, p) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            canvas.line(rotate(*p), rotate(next), ROCK, 1.0);
        }
    }
}

#[derive(Debug)]
pub struct Flyer {
    size: Vec2,
    tuning: FlyerTuning,
    seed: RngState,
    rng: Pcg32,
    executor: Executor,
    shapes: Vec<Arc<AsteroidShape>>,
    ship: Body,
    ship_size: f32,
    /// Heading in degrees, 90 is straight up
    heading: f32,
    inertia: f32,
    hull: u32,
    since_hit: u32,
    ground: f32,
    /// Pointer in screen space
    aim: Vec2,
    scroll: Vec2,
    lerp: f32,
    asteroids: Vec<Asteroid>,
    spawn_timer: u32,
    ticks: u64,
    score: u64,
    trail: VecDeque<Vec2>,
    puffs: EffectPool<Puff>,
    sparks: EffectPool<Spark>,
}

impl Flyer {
    pub fn new(size: Vec2, tuning: &Tuning, seed: u64) -> Self {
        let seed = RngState::new(seed);
        // Separate stream so the shape set does not shift gameplay rolls
        let mut shape_rng = RngState::with_stream(seed.seed, 1).to_rng();
        let shapes = (0..SHAPE_COUNT)
            .map(|_| {
                let size = shape_rng.random_range(SHAPE_SIZES);
                Arc::new(AsteroidShape::random(size, &mut shape_rng))
            })
            .collect();
        let ship_size = (size.y / 30.0).floor();
        let mut game = Self {
            size,
            tuning: tuning.flyer.clone(),
            seed,
            rng: seed.to_rng(),
            executor: Executor::default(),
            shapes,
            ship: Body::default(),
            ship_size,
            heading: 90.0,
            inertia: tuning.flyer.inertia,
            hull: tuning.flyer.hull,
            since_hit: HIT_GRACE,
            ground: ship_size / 2.0,
            aim: Vec2::ZERO,
            scroll: Vec2::ZERO,
            lerp: 0.0,
            asteroids: Vec::new(),
            spawn_timer: 0,
            ticks: 0,
            score: 0,
            trail: VecDeque::with_capacity(TRAIL_LEN),
            puffs: EffectPool::new(MAX_EFFECTS),
            sparks: EffectPool::new(MAX_EFFECTS),
        };
        game.reset();
        game
    }

    /// Run asteroid updates on `executor`
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn ship(&self) -> &Body {
        &self.ship
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn hull(&self) -> u32 {
        self.hull
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Screen position of the world origin relative to the camera
    fn screen_offset(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Camera translation for drawing world-space things
    fn view(&self) -> Vec2 {
        self.scroll - self.screen_offset()
    }

    /// The pointer, in world space
    pub fn target(&self) -> Vec2 {
        self.aim + self.view()
    }

    pub fn ship_rect(&self) -> Aabb {
        Aabb::from_center(self.ship.pos, Vec2::splat(self.ship_size))
    }

    /// Place an asteroid directly; spawning normally goes through the timer
    pub fn spawn_asteroid_at(&mut self, pos: Vec2, vel: Vec2, spin: f32) {
        let shape = self.shapes[self.rng.random_range(0..self.shapes.len())].clone();
        self.asteroids.push(Asteroid::new(pos, vel, spin, shape));
    }

    fn spawn_point(&mut self) -> Vec2 {
        let ship = self.ship.pos;
        let speed = self.ship.speed();
        if speed > f32::EPSILON {
            let jitter = Vec2::new(
                self.rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER),
                self.rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER),
            );
            return ship + self.ship.vel / speed * SPAWN_DISTANCE + jitter;
        }

        let half = self.size * 0.5 + SPAWN_MARGIN;
        match self.rng.random_range(0..4) {
            0 => Vec2::new(
                self.rng.random_range(ship.x - half.x..=ship.x + half.x),
                ship.y - self.size.y - SPAWN_MARGIN,
            ),
            1 => Vec2::new(
                self.rng.random_range(ship.x - half.x..=ship.x + half.x),
                ship.y + self.size.y + SPAWN_MARGIN,
            ),
            2 => Vec2::new(
                ship.x - half.x,
                self.rng.random_range(ship.y - half.y..=ship.y + half.y),
            ),
            _ => Vec2::new(
                ship.x + half.x,
                self.rng.random_range(ship.y - half.y..=ship.y + half.y),
            ),
        }
    }

    fn spawn_asteroid(&mut self) {
        let pos = self.spawn_point();
        let vel = Vec2::new(
            self.rng.random_range(-2.0..=2.0),
            self.rng.random_range(-5.0..=-1.0),
        );
        let spin = self.rng.random_range(-1.0..=1.0);
        self.spawn_asteroid_at(pos, vel, spin);
        log::debug!("Asteroid at {pos}, {} live", self.asteroids.len());
    }

    fn steer(&mut self) {
        let t = &self.tuning;
        let target = self.target();
        let to_target = target - self.ship.pos;
        if to_target.length_squared() > 0.0 {
            let diff = wrap_degrees(heading_of(to_target) - self.heading);
            if diff.abs() < 1.0 {
                self.heading = heading_of(to_target);
            } else {
                self.heading = wrap_degrees(self.heading + diff / t.turn_divisor);
            }
        }
        self.ship.seek(target, &SeekParams {
            max_speed: t.max_speed,
            inertia: self.inertia,
        });
        self.ship.integrate(1.0);
    }

    /// Everything above the ground is open sky
    fn airspace(&self) -> Aabb {
        Aabb::new(
            Vec2::splat(f32::NEG_INFINITY),
            Vec2::new(f32::INFINITY, self.ground),
        )
    }

    fn bounce_off_ground(&mut self) -> bool {
        let t = &self.tuning;
        let params = BounceParams {
            restitution: t.ground_restitution,
            floor: t.max_speed / 10.0,
            rebound: t.max_speed / 5.0,
        };
        let airspace = self.airspace();
        self.ship.bounce_within(&airspace, &params)
    }

    fn follow_camera(&mut self) {
        self.lerp = (self.lerp + LERP_RAMP).min(LERP_MAX);
        let target = self.ship.pos + self.ship.vel * 20.0;
        self.scroll += (target - self.scroll) * self.lerp;
    }

    fn update_asteroids(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer >= self.tuning.spawn_interval {
            if self.asteroids.len() < MAX_ASTEROIDS {
                self.spawn_asteroid();
            }
            self.spawn_timer = 0;
        }

        let ship = self.ship.pos;
        let gate = self.size.y / 2.0;
        for asteroid in &mut self.asteroids {
            asteroid.armed = within_distance(asteroid.pos(), ship, gate);
        }
        self.executor.update_all(&mut self.asteroids, Asteroid::update);

        self.asteroids.retain(|a| {
            a.pos().y > ship.y - CULL_BEHIND && within_distance(a.pos(), ship, CULL_RADIUS)
        });
    }

    /// Resolve contact with every touching asteroid. Returns the hull damage.
    fn collide(&mut self) -> u32 {
        let rect = self.ship_rect();
        let gate = self.size.y / 2.0;
        let mut hits = 0;
        for asteroid in &mut self.asteroids {
            if !within_distance(asteroid.pos(), self.ship.pos, gate) {
                continue;
            }
            let origin = asteroid.sprite.origin(asteroid.body.pos);
            if !rect_mask_collision(&rect, asteroid.sprite.mask(), origin) {
                continue;
            }
            let normal = self.ship.pos - asteroid.body.pos;
            let t = &self.tuning;
            self.ship.vel = reflect_off_normal(self.ship.vel, normal, t.restitution, t.tangential);
            self.ship.pos += normal.normalize_or_zero() * t.push_out;
            self.inertia = t.hit_inertia;
            hits += 1;
        }
        if hits == 0 {
            return 0;
        }
        burst(&mut self.sparks, self.ship.pos, 8, EMBER, &mut self.rng);
        if self.since_hit < HIT_GRACE {
            return 0;
        }
        self.since_hit = 0;
        1
    }

    fn emit_exhaust(&mut self) {
        if self.ticks % EXHAUST_EVERY != 0 {
            return;
        }
        let spread = self.size.y / 80.0;
        let jitter = Vec2::new(
            self.rng.random_range(-spread..=spread),
            self.rng.random_range(-spread..=spread),
        );
        let size = self.rng.random_range(self.size.y / 180.0..=self.size.y / 60.0);
        self.puffs.spawn(Puff {
            alpha: 100.0,
            ..Puff::new(self.ship.pos + jitter, size, WHITE)
        });
        self.trail.push_back(self.ship.pos);
        if self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }
    }

    fn draw_ship(&self, canvas: &mut dyn Canvas, view: Vec2) {
        let nose = heading_vector(self.heading);
        let side = nose.perp();
        let center = self.ship.pos - view;
        let half = self.ship_size * 0.5;
        let tip = center + nose * half;
        let left = center - nose * half + side * half * 0.6;
        let right = center - nose * half - side * half * 0.6;
        let width = (self.size.y / 640.0).max(1.0);
        canvas.line(tip, left, WHITE, width);
        canvas.line(left, right, WHITE, width);
        canvas.line(right, tip, WHITE, width);
    }

    /// Dashed altitude marker at the next round hundred
    fn draw_marker(&self, canvas: &mut dyn Canvas, view: Vec2) {
        let mark = ((self.score as f32 / 100.0).round() * 100.0).max(100.0);
        let y = -mark * self.tuning.score_divisor - view.y;
        canvas.line(Vec2::new(0.0, y), Vec2::new(self.size.x, y), WHITE, 1.0);
    }
}

impl Game for Flyer {
    fn name(&self) -> &'static str {
        "flyer"
    }

    fn reset(&mut self) {
        self.rng = self.seed.to_rng();
        self.ship = Body::default();
        self.heading = 90.0;
        self.inertia = self.tuning.inertia;
        self.hull = self.tuning.hull;
        self.since_hit = HIT_GRACE;
        self.aim = Vec2::new(self.size.x * 0.5, self.size.y * 0.25);
        self.scroll = Vec2::new(0.0, -self.size.y / 10.0);
        self.lerp = 0.0;
        self.asteroids.clear();
        self.spawn_timer = 0;
        self.ticks = 0;
        self.score = 0;
        self.trail.clear();
        self.puffs.clear();
        self.sparks.clear();
    }

    fn intro_ticks(&self) -> u32 {
        60
    }

    /// Launch is a swipe up of at least a fifth of the screen
    fn accepts_start(&self, release: &Release) -> bool {
        release.from.y - release.to.y >= self.size.y / 5.0
    }

    fn on_pointer(&mut self, event: &InputEvent, _release: Option<&Release>) {
        match *event {
            InputEvent::PointerDown(at) | InputEvent::PointerMove(at) | InputEvent::PointerUp(at) => {
                self.aim = at;
            }
            InputEvent::Quit => {}
        }
    }

    /// Liftoff: climb straight up off the pad
    fn update_starting(&mut self, _frame: u64, _remaining: u32) {
        let climb = self.ship.pos - Vec2::new(0.0, self.size.y / 4.0);
        self.ship.seek(climb, &SeekParams {
            max_speed: self.tuning.max_speed,
            inertia: self.tuning.inertia / 10.0,
        });
        self.ship.integrate(1.0);
        self.follow_camera();
        self.puffs.update();
    }

    fn update_playing(
        &mut self,
        _frame: u64,
        _pointer: &PointerTracker,
    ) -> Result<PlayOutcome, SimError> {
        self.since_hit = self.since_hit.saturating_add(1);
        self.inertia = (self.inertia - 2.0).max(self.tuning.inertia);

        self.update_asteroids();
        self.steer();
        self.bounce_off_ground();
        if !self.ship.pos.is_finite() || !self.ship.vel.is_finite() {
            return Err(SimError::Invariant(format!(
                "ship state not finite: pos {} vel {}",
                self.ship.pos, self.ship.vel
            )));
        }
        self.follow_camera();

        let damage = self.collide();
        self.hull = self.hull.saturating_sub(damage);

        self.emit_exhaust();
        self.puffs.update();
        self.sparks.update();
        self.score = (-self.ship.pos.y / self.tuning.score_divisor).max(0.0) as u64;
        self.ticks += 1;

        if self.hull == 0 {
            return Ok(PlayOutcome::Over);
        }
        Ok(PlayOutcome::Continue)
    }

    fn on_game_over(&mut self) {
        burst(&mut self.sparks, self.ship.pos, 32, EMBER, &mut self.rng);
        log::info!("Flyer down at altitude {}", self.score);
    }

    fn update_game_over(&mut self, _frame: u64) {
        for asteroid in &mut self.asteroids {
            asteroid.update();
        }
        self.puffs.update();
        self.sparks.update();
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn draw(&self, phase: ScreenPhase, canvas: &mut dyn Canvas) {
        let view = self.view();
        let ground_top = self.ground - view.y;
        if ground_top < self.size.y {
            canvas.rect(Vec2::new(0.0, ground_top), self.size, GROUND);
        }
        if phase != ScreenPhase::Menu {
            for asteroid in &self.asteroids {
                asteroid.draw(canvas, view);
            }
            for (a, b) in self.trail.iter().zip(self.trail.iter().skip(1)) {
                canvas.line(*a - view, *b - view, [255, 255, 255, 50], 1.0);
            }
            self.puffs.draw(canvas, view);
            self.draw_marker(canvas, view);
            self.sparks.draw(canvas, view);
        }
        if phase != ScreenPhase::GameOver {
            self.draw_ship(canvas, view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, DrawList};
    use crate::sim::parallel::Scoped;

    const SIZE: Vec2 = Vec2::new(720.0, 1280.0);

    fn game() -> Flyer {
        Flyer::new(SIZE, &Tuning::default(), 9)
    }

    /// No timed spawns
    fn quiet() -> Flyer {
        let mut tuning = Tuning::default();
        tuning.flyer.spawn_interval = u32::MAX;
        Flyer::new(SIZE, &tuning, 9)
    }

    /// Solid square with a known outline
    fn block(size: u32) -> Arc<AsteroidShape> {
        let h = size as f32 / 2.0;
        Arc::new(AsteroidShape {
            points: vec![
                Vec2::new(-h, -h),
                Vec2::new(h, -h),
                Vec2::new(h, h),
                Vec2::new(-h, h),
            ],
            frame: Arc::new(AlphaFrame::filled(size, size)),
        })
    }

    fn place_block(game: &mut Flyer, pos: Vec2) {
        game.asteroids.push(Asteroid::new(pos, Vec2::ZERO, 0.0, block(100)));
    }

    fn tick(game: &mut Flyer) -> PlayOutcome {
        game.update_playing(0, &PointerTracker::new()).unwrap()
    }

    /// Aim at a world point given the current camera
    fn aim_world(game: &mut Flyer, world: Vec2) {
        let screen = world - game.view();
        game.on_pointer(&InputEvent::PointerMove(screen), None);
    }

    fn swipe(from: Vec2, to: Vec2) -> Release {
        Release {
            from,
            to,
            held_frames: 20,
            tap: true,
        }
    }

    #[test]
    fn test_shapes_are_convex_outlines() {
        let game = game();
        assert_eq!(game.shapes.len(), SHAPE_COUNT);
        for shape in &game.shapes {
            assert!((5..=9).contains(&shape.points.len()));
            assert!(SHAPE_SIZES.contains(&shape.frame.width));
            let solid = shape.frame.alpha.iter().filter(|a| **a > 0).count();
            assert!(solid > 0);
        }
    }

    #[test]
    fn test_start_needs_swipe_up() {
        let game = game();
        let at = Vec2::new(360.0, 900.0);
        assert!(!game.accepts_start(&swipe(at, at)));
        assert!(!game.accepts_start(&swipe(at, at - Vec2::new(0.0, 200.0))));
        assert!(game.accepts_start(&swipe(at, at - Vec2::new(0.0, 256.0))));
        assert!(!game.accepts_start(&swipe(at, at + Vec2::new(0.0, 400.0))));
    }

    #[test]
    fn test_ship_seeks_pointer() {
        let mut game = quiet();
        aim_world(&mut game, Vec2::new(0.0, -500.0));
        tick(&mut game);
        // (0, -10) / 100 inertia
        assert!((game.ship().vel - Vec2::new(0.0, -0.1)).length() < 1e-4);
        for _ in 0..200 {
            aim_world(&mut game, Vec2::new(0.0, -5000.0));
            tick(&mut game);
        }
        assert!(game.ship().speed() <= 10.0 + 1e-3);
        assert!(game.ship().pos.y < -100.0);
        assert!(game.score() > 0);
    }

    #[test]
    fn test_heading_eases_toward_target() {
        let mut game = game();
        aim_world(&mut game, Vec2::new(500.0, 0.0));
        tick(&mut game);
        // From 90 toward ~0: a twentieth of the gap
        assert!(game.heading() < 90.0 && game.heading() > 80.0);
    }

    #[test]
    fn test_ground_bounce_is_upward() {
        let mut game = game();
        game.ship = Body::new(Vec2::new(0.0, game.ground - 1.0), Vec2::new(0.0, 9.0));
        aim_world(&mut game, Vec2::new(0.0, 5000.0));
        tick(&mut game);
        assert_eq!(game.ship().pos.y, game.ground);
        assert!(game.ship().vel.y < 0.0);

        // Too slow to leave the ground: kicked up at a fifth of max speed
        game.ship = Body::new(Vec2::new(0.0, game.ground), Vec2::new(0.0, 0.5));
        assert!(!game.bounce_off_ground());
        assert_eq!(game.ship().vel.y, 0.5);
        game.ship.pos.y = game.ground + 1.0;
        assert!(game.bounce_off_ground());
        assert_eq!(game.ship().vel.y, -2.0);

        // Sunk into the ground while climbing: lifted out, never pulled down
        game.ship = Body::new(Vec2::new(40.0, game.ground + 3.0), Vec2::new(1.0, -6.0));
        assert!(game.bounce_off_ground());
        assert_eq!(game.ship().pos, Vec2::new(40.0, game.ground));
        assert_eq!(game.ship().vel, Vec2::new(1.0, -4.0));
    }

    #[test]
    fn test_spawn_timer() {
        let mut game = game();
        aim_world(&mut game, Vec2::new(0.0, -100_000.0));
        for _ in 0..29 {
            tick(&mut game);
        }
        assert!(game.asteroids().is_empty());
        tick(&mut game);
        assert_eq!(game.asteroids().len(), 1);
        assert_eq!(game.spawn_timer, 0);
    }

    #[test]
    fn test_spawn_cap() {
        let mut game = game();
        // Hold the ship still on the pad
        aim_world(&mut game, Vec2::ZERO);
        for i in 0..MAX_ASTEROIDS {
            place_block(&mut game, Vec2::new(i as f32 * 50.0 - 500.0, -600.0));
        }
        game.spawn_timer = game.tuning.spawn_interval - 1;
        tick(&mut game);
        assert_eq!(game.asteroids().len(), MAX_ASTEROIDS);
        assert_eq!(game.spawn_timer, 0);
    }

    #[test]
    fn test_spawn_ahead_of_motion() {
        let mut game = game();
        game.ship = Body::new(Vec2::ZERO, Vec2::new(0.0, -10.0));
        let p = game.spawn_point();
        assert!((p.x).abs() <= SPAWN_JITTER);
        assert!((p.y + SPAWN_DISTANCE).abs() <= SPAWN_JITTER);

        game.ship = Body::default();
        let p = game.spawn_point();
        let outside_x = p.x.abs() >= SIZE.x / 2.0 + SPAWN_MARGIN - 1e-3;
        let outside_y = p.y.abs() >= SIZE.y + SPAWN_MARGIN - 1e-3;
        assert!(outside_x || outside_y);
    }

    #[test]
    fn test_far_asteroids_culled() {
        let mut game = game();
        game.spawn_asteroid_at(Vec2::new(0.0, 2000.0), Vec2::ZERO, 0.0);
        game.spawn_asteroid_at(Vec2::new(1600.0, -100.0), Vec2::ZERO, 0.0);
        game.spawn_asteroid_at(Vec2::new(0.0, -400.0), Vec2::ZERO, 0.0);
        tick(&mut game);
        assert_eq!(game.asteroids().len(), 1);
        assert_eq!(game.asteroids()[0].pos(), Vec2::new(0.0, -400.0));
    }

    #[test]
    fn test_asteroid_spin_invalidates_mask() {
        let mut game = game();
        game.spawn_asteroid_at(Vec2::new(0.0, -300.0), Vec2::ZERO, 1.0);
        tick(&mut game);
        let asteroid = &game.asteroids()[0];
        assert_eq!(asteroid.sprite.angle(), 1.0);
        // Armed near the ship, so the rotated mask was built during the update
        assert!(asteroid.sprite.cached_mask().is_some());
        assert_eq!(asteroid.sprite.rebuilds(), 1);
    }

    #[test]
    fn test_hit_bounces_and_costs_hull() {
        let mut game = game();
        game.ship = Body::new(Vec2::new(0.0, -400.0), Vec2::new(0.0, -10.0));
        place_block(&mut game, Vec2::new(0.0, -420.0));
        let damage = game.collide();
        assert_eq!(damage, 1);
        // Normal points down at the ship: vy flips and halves
        assert!((game.ship().vel - Vec2::new(0.0, 5.0)).length() < 1e-4);
        assert_eq!(game.ship().pos, Vec2::new(0.0, -390.0));
        assert_eq!(game.inertia(), 400.0);
        assert!(!game.sparks.is_empty());

        // Still touching next tick: bounces again but grace holds the hull
        assert_eq!(game.collide(), 0);
    }

    #[test]
    fn test_inertia_recovers() {
        let mut game = quiet();
        game.inertia = 400.0;
        tick(&mut game);
        assert_eq!(game.inertia(), 398.0);
        for _ in 0..200 {
            tick(&mut game);
        }
        assert_eq!(game.inertia(), 100.0);
    }

    #[test]
    fn test_hull_loss_ends_run() {
        let mut game = game();
        game.hull = 1;
        aim_world(&mut game, Vec2::new(0.0, -400.0));
        game.ship = Body::new(Vec2::new(0.0, -400.0), Vec2::ZERO);
        place_block(&mut game, Vec2::new(0.0, -400.0));
        assert_eq!(tick(&mut game), PlayOutcome::Over);
        assert_eq!(game.hull(), 0);
    }

    #[test]
    fn test_scoped_executor_matches_sequential() {
        let mut seq = quiet();
        let mut par = quiet().with_executor(Executor::Scoped(Scoped::new(4)));
        for g in [&mut seq, &mut par] {
            for i in 0..12 {
                g.spawn_asteroid_at(Vec2::new(i as f32 * 40.0 - 240.0, -800.0), Vec2::new(0.5, -1.0), 0.5);
            }
        }
        for _ in 0..20 {
            tick(&mut seq);
            tick(&mut par);
        }
        let a: Vec<_> = seq.asteroids().iter().map(|a| (a.pos(), a.sprite.angle())).collect();
        let b: Vec<_> = par.asteroids().iter().map(|a| (a.pos(), a.sprite.angle())).collect();
        assert_eq!(a, b);
        assert_eq!(seq.ship(), par.ship());
    }

    #[test]
    fn test_liftoff_climbs() {
        let mut game = game();
        for remaining in (0..60).rev() {
            game.update_starting(0, remaining);
        }
        assert!(game.ship().pos.y < 0.0);
        assert!(game.ship().vel.y < 0.0);
    }

    #[test]
    fn test_reset_restores_launch_pad() {
        let mut game = quiet();
        for _ in 0..50 {
            tick(&mut game);
        }
        game.hull = 1;
        game.reset();
        assert_eq!(game.ship(), &Body::default());
        assert_eq!(game.hull(), 3);
        assert!(game.asteroids().is_empty());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_draw_menu_and_playing() {
        let mut game = game();
        let mut list = DrawList::new();
        game.draw(ScreenPhase::Menu, &mut list);
        // Ground plus the three ship edges
        assert_eq!(list.len(), 4);
        assert!(matches!(list.commands[0], DrawCommand::Rect { .. }));

        game.spawn_asteroid_at(Vec2::new(0.0, -300.0), Vec2::ZERO, 0.0);
        tick(&mut game);
        list.clear();
        game.draw(ScreenPhase::Playing, &mut list);
        let edges = game.asteroids()[0].shape.points.len();
        // Ground, asteroid edges, one puff, marker, ship
        assert_eq!(list.len(), 1 + edges + 1 + 1 + 3);
    }
}
