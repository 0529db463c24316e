//! Screen state machine
//!
//! Every game runs inside the same MENU → (STARTING) → PLAYING → GAMEOVER
//! cycle. [`Screen`] owns the phase, the pointer bookkeeping and the best-score
//! ratchet; the game itself only implements [`Game`].

pub mod bouncer;
pub mod dodger;
pub mod flyer;
pub mod spell;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::{HOLD_RING_DELAY, HOLD_RING_RADIUS, HOLD_RING_WIDTH};
use crate::error::{PersistenceError, SimError};
use crate::highscores::HighScore;
use crate::persistence::ScoreStore;
use crate::platform::{FixedStep, FrameClock, InputEvent, PointerTracker, Release};
use crate::render::{Canvas, WHITE};

pub use bouncer::Bouncer;
pub use dodger::Dodger;
pub use flyer::Flyer;
pub use spell::SpellGame;

/// Screen phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenPhase {
    /// Idle demo, waiting for a start tap
    Menu,
    /// Non-interactive intro
    Starting,
    Playing,
    /// Simulation frozen, final score shown
    GameOver,
    /// Quit requested; the session loop stops
    Exiting,
}

/// Result of one PLAYING tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Continue,
    Over,
}

/// One mini-game, driven by a [`Screen`]
pub trait Game {
    fn name(&self) -> &'static str;

    /// Restore all per-session state (entities, score, timers)
    fn reset(&mut self);

    /// Length of the STARTING phase; 0 skips it
    fn intro_ticks(&self) -> u32 {
        0
    }

    /// Whether a release on the menu starts a session
    fn accepts_start(&self, release: &Release) -> bool {
        release.tap
    }

    /// Raw pointer event during PLAYING, with the finished press on pointer-up
    fn on_pointer(&mut self, event: &InputEvent, release: Option<&Release>);

    fn update_menu(&mut self, _frame: u64) {}

    fn update_starting(&mut self, _frame: u64, _remaining: u32) {}

    fn update_playing(
        &mut self,
        frame: u64,
        pointer: &PointerTracker,
    ) -> Result<PlayOutcome, SimError>;

    fn update_game_over(&mut self, _frame: u64) {}

    /// Called once on entering GAMEOVER, after the score is frozen
    fn on_game_over(&mut self) {}

    fn score(&self) -> u64;

    fn draw(&self, phase: ScreenPhase, canvas: &mut dyn Canvas);
}

/// Phase machine around one game and its score store
#[derive(Debug)]
pub struct Screen<G: Game, S: ScoreStore> {
    game: G,
    high: HighScore<S>,
    phase: ScreenPhase,
    pointer: PointerTracker,
    events: VecDeque<InputEvent>,
    intro_left: u32,
    final_score: Option<u64>,
}

impl<G: Game, S: ScoreStore> Screen<G, S> {
    /// Build the screen, reading the stored best score first
    pub fn new(mut game: G, store: S) -> Result<Self, PersistenceError> {
        let high = HighScore::load(store)?;
        game.reset();
        Ok(Self {
            game,
            high,
            phase: ScreenPhase::Menu,
            pointer: PointerTracker::new(),
            events: VecDeque::new(),
            intro_left: 0,
            final_score: None,
        })
    }

    /// Queue an event for the next tick
    pub fn handle(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Run one simulation tick
    pub fn tick(&mut self, frame: u64) -> ScreenPhase {
        if self.phase == ScreenPhase::Exiting {
            return self.phase;
        }

        while let Some(event) = self.events.pop_front() {
            if event == InputEvent::Quit {
                self.events.clear();
                self.enter(ScreenPhase::Exiting);
                return self.phase;
            }
            let release = self.pointer.handle(&event);
            match self.phase {
                ScreenPhase::Menu => {
                    if release.is_some_and(|r| self.game.accepts_start(&r)) {
                        let next = if self.game.intro_ticks() > 0 {
                            ScreenPhase::Starting
                        } else {
                            ScreenPhase::Playing
                        };
                        self.enter(next);
                    }
                }
                ScreenPhase::Playing => self.game.on_pointer(&event, release.as_ref()),
                ScreenPhase::GameOver => {
                    if release.is_some_and(|r| r.tap) {
                        self.enter(ScreenPhase::Menu);
                    }
                }
                ScreenPhase::Starting | ScreenPhase::Exiting => {}
            }
        }

        self.pointer.tick();

        match self.phase {
            ScreenPhase::Menu => {
                if self.pointer.held_for_quit() {
                    self.enter(ScreenPhase::Exiting);
                } else {
                    self.game.update_menu(frame);
                }
            }
            ScreenPhase::Starting => {
                self.intro_left = self.intro_left.saturating_sub(1);
                self.game.update_starting(frame, self.intro_left);
                if self.intro_left == 0 {
                    self.enter(ScreenPhase::Playing);
                }
            }
            ScreenPhase::Playing => match self.game.update_playing(frame, &self.pointer) {
                Ok(PlayOutcome::Continue) => {}
                Ok(PlayOutcome::Over) => self.enter(ScreenPhase::GameOver),
                Err(e) => {
                    log::error!("{}: simulation error, ending session: {e}", self.game.name());
                    self.enter(ScreenPhase::GameOver);
                }
            },
            ScreenPhase::GameOver => self.game.update_game_over(frame),
            ScreenPhase::Exiting => {}
        }

        self.phase
    }

    fn enter(&mut self, next: ScreenPhase) {
        log::info!("{}: {:?} -> {:?}", self.game.name(), self.phase, next);
        self.phase = next;
        self.pointer.reset();
        match next {
            ScreenPhase::Menu => {
                self.final_score = None;
                self.game.reset();
            }
            ScreenPhase::Starting => self.intro_left = self.game.intro_ticks(),
            ScreenPhase::GameOver => {
                let score = self.game.score();
                self.final_score = Some(score);
                self.game.on_game_over();
                if let Err(e) = self.high.submit(score) {
                    log::error!("{}: failed to save best score {score}: {e}", self.game.name());
                }
            }
            ScreenPhase::Playing | ScreenPhase::Exiting => {}
        }
    }

    pub fn phase(&self) -> ScreenPhase {
        self.phase
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn high_score(&self) -> &HighScore<S> {
        &self.high
    }

    /// Score frozen on entering GAMEOVER
    pub fn final_score(&self) -> Option<u64> {
        self.final_score
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        self.game.draw(self.phase, canvas);
        if self.phase == ScreenPhase::Menu {
            self.draw_hold_ring(canvas);
        }
    }

    /// Ring around the pointer that closes as a hold nears quitting
    fn draw_hold_ring(&self, canvas: &mut dyn Canvas) {
        let progress = self.pointer.hold_progress();
        if progress <= HOLD_RING_DELAY {
            return;
        }
        let full = 1.0 - HOLD_RING_DELAY;
        let sweep = ((progress - HOLD_RING_DELAY) / full * 360.0).min(360.0);
        canvas.arc(
            self.pointer.position(),
            HOLD_RING_RADIUS,
            90.0,
            sweep,
            WHITE,
            HOLD_RING_WIDTH,
        );
    }
}

/// How a [`Session`] paces ticks
#[derive(Debug)]
pub enum Pacing {
    /// Sleep to the tick rate and run as many fixed steps as real time allows
    Realtime { clock: FrameClock, step: FixedStep },
    /// One tick per loop iteration, no sleeping
    Headless,
}

/// Run loop around a [`Screen`]
#[derive(Debug)]
pub struct Session {
    pacing: Pacing,
    frame: u64,
}

impl Session {
    pub fn realtime(hz: u32) -> Self {
        let clock = FrameClock::new(hz);
        let step = FixedStep::new(clock.period().as_secs_f32());
        Self {
            pacing: Pacing::Realtime { clock, step },
            frame: 0,
        }
    }

    pub fn headless() -> Self {
        Self {
            pacing: Pacing::Headless,
            frame: 0,
        }
    }

    /// Simulation ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Tick `screen` until it exits or `max_ticks` ticks ran.
    ///
    /// `input` is asked for events before every tick; `on_frame` sees the
    /// screen once per rendered frame. Returns the number of ticks run.
    pub fn run<G, S, I, F>(
        &mut self,
        screen: &mut Screen<G, S>,
        mut input: I,
        mut on_frame: F,
        max_ticks: u64,
    ) -> u64
    where
        G: Game,
        S: ScoreStore,
        I: FnMut(u64) -> Vec<InputEvent>,
        F: FnMut(&Screen<G, S>),
    {
        let start = self.frame;
        while self.frame - start < max_ticks {
            let steps = match &mut self.pacing {
                Pacing::Realtime { clock, step } => step.advance(clock.tick().dt),
                Pacing::Headless => 1,
            };
            for _ in 0..steps {
                for event in input(self.frame) {
                    screen.handle(event);
                }
                let phase = screen.tick(self.frame);
                self.frame += 1;
                if phase == ScreenPhase::Exiting {
                    on_frame(screen);
                    return self.frame - start;
                }
                if self.frame - start >= max_ticks {
                    break;
                }
            }
            on_frame(screen);
        }
        self.frame - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryScoreStore;
    use glam::Vec2;

    /// Minimal game: PLAYING ends after `lifetime` ticks with a fixed score
    #[derive(Debug, Default)]
    struct Stub {
        ticks: u32,
        lifetime: u32,
        score: u64,
        resets: u32,
        intro: u32,
        fail: bool,
        pointer_events: u32,
    }

    impl Game for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn reset(&mut self) {
            self.ticks = 0;
            self.resets += 1;
        }

        fn intro_ticks(&self) -> u32 {
            self.intro
        }

        fn on_pointer(&mut self, _event: &InputEvent, _release: Option<&Release>) {
            self.pointer_events += 1;
        }

        fn update_playing(
            &mut self,
            _frame: u64,
            _pointer: &PointerTracker,
        ) -> Result<PlayOutcome, SimError> {
            if self.fail {
                return Err(SimError::Invariant("broken".into()));
            }
            self.ticks += 1;
            if self.ticks >= self.lifetime {
                Ok(PlayOutcome::Over)
            } else {
                Ok(PlayOutcome::Continue)
            }
        }

        fn score(&self) -> u64 {
            self.score
        }

        fn draw(&self, _phase: ScreenPhase, _canvas: &mut dyn Canvas) {}
    }

    fn idle(screen: &mut Screen<Stub, MemoryScoreStore>, ticks: u64, frame: &mut u64) {
        for _ in 0..ticks {
            screen.tick(*frame);
            *frame += 1;
        }
    }

    fn tap(screen: &mut Screen<Stub, MemoryScoreStore>, frame: &mut u64) {
        screen.handle(InputEvent::PointerDown(Vec2::ZERO));
        screen.tick(*frame);
        *frame += 1;
        screen.handle(InputEvent::PointerUp(Vec2::ZERO));
        screen.tick(*frame);
        *frame += 1;
    }

    #[test]
    fn test_full_cycle() {
        let game = Stub {
            lifetime: 5,
            score: 42,
            ..Default::default()
        };
        let mut screen = Screen::new(game, MemoryScoreStore::new(10)).unwrap();
        let mut frame = 0;
        assert_eq!(screen.phase(), ScreenPhase::Menu);
        assert_eq!(screen.game().resets, 1);

        idle(&mut screen, 20, &mut frame);
        tap(&mut screen, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Playing);

        idle(&mut screen, 10, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::GameOver);
        assert_eq!(screen.final_score(), Some(42));
        assert_eq!(screen.high_score().best(), 42);
        assert_eq!(screen.high_score().store().writes(), 1);

        // GAMEOVER never leaves on its own
        idle(&mut screen, 100, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::GameOver);
        assert_eq!(screen.high_score().store().writes(), 1);

        tap(&mut screen, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Menu);
        assert_eq!(screen.game().resets, 2);
        assert_eq!(screen.final_score(), None);
    }

    #[test]
    fn test_quick_press_after_transition_is_not_a_tap() {
        let mut screen = Screen::new(Stub::default(), MemoryScoreStore::new(0)).unwrap();
        let mut frame = 0;
        // Pointer has not been up long enough yet
        tap(&mut screen, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Menu);
    }

    #[test]
    fn test_intro_phase() {
        let game = Stub {
            intro: 3,
            lifetime: 100,
            ..Default::default()
        };
        let mut screen = Screen::new(game, MemoryScoreStore::new(0)).unwrap();
        let mut frame = 0;
        idle(&mut screen, 20, &mut frame);
        tap(&mut screen, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Starting);
        idle(&mut screen, 3, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Playing);
    }

    #[test]
    fn test_hold_on_menu_exits() {
        let mut screen = Screen::new(Stub::default(), MemoryScoreStore::new(0)).unwrap();
        let mut frame = 0;
        screen.handle(InputEvent::PointerDown(Vec2::ZERO));
        idle(&mut screen, 239, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Menu);
        idle(&mut screen, 1, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::Exiting);
    }

    #[test]
    fn test_hold_ring_tracks_progress() {
        use crate::render::{DrawCommand, DrawList};

        let mut screen = Screen::new(Stub::default(), MemoryScoreStore::new(0)).unwrap();
        let mut frame = 0;
        let at = Vec2::new(30.0, 40.0);
        screen.handle(InputEvent::PointerMove(at));
        screen.handle(InputEvent::PointerDown(at));
        idle(&mut screen, 60, &mut frame);
        let mut list = DrawList::new();
        screen.draw(&mut list);
        assert!(list.is_empty());

        // Halfway to quitting: a third of the ring past the delay
        idle(&mut screen, 60, &mut frame);
        screen.draw(&mut list);
        assert_eq!(list.len(), 1);
        match &list.commands[0] {
            DrawCommand::Arc { center, sweep, .. } => {
                assert_eq!(*center, at);
                assert!((sweep - 120.0).abs() < 1e-3);
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn test_sim_error_forces_game_over() {
        let game = Stub {
            fail: true,
            score: 7,
            ..Default::default()
        };
        let mut screen = Screen::new(game, MemoryScoreStore::new(0)).unwrap();
        let mut frame = 0;
        idle(&mut screen, 20, &mut frame);
        tap(&mut screen, &mut frame);
        idle(&mut screen, 1, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::GameOver);
        assert_eq!(screen.final_score(), Some(7));
    }

    #[test]
    fn test_lower_score_not_written() {
        let game = Stub {
            lifetime: 1,
            score: 3,
            ..Default::default()
        };
        let mut screen = Screen::new(game, MemoryScoreStore::new(50)).unwrap();
        let mut frame = 0;
        idle(&mut screen, 20, &mut frame);
        tap(&mut screen, &mut frame);
        idle(&mut screen, 1, &mut frame);
        assert_eq!(screen.phase(), ScreenPhase::GameOver);
        assert_eq!(screen.high_score().best(), 50);
        assert_eq!(screen.high_score().store().writes(), 0);
    }

    #[test]
    fn test_pointer_events_reach_game_only_while_playing() {
        let game = Stub {
            lifetime: 1000,
            ..Default::default()
        };
        let mut screen = Screen::new(game, MemoryScoreStore::new(0)).unwrap();
        let mut frame = 0;
        screen.handle(InputEvent::PointerMove(Vec2::ONE));
        idle(&mut screen, 20, &mut frame);
        assert_eq!(screen.game().pointer_events, 0);
        tap(&mut screen, &mut frame);
        screen.handle(InputEvent::PointerMove(Vec2::ONE));
        idle(&mut screen, 1, &mut frame);
        assert_eq!(screen.game().pointer_events, 1);
    }

    #[test]
    fn test_quit_from_any_phase() {
        let mut screen = Screen::new(Stub::default(), MemoryScoreStore::new(0)).unwrap();
        screen.handle(InputEvent::Quit);
        assert_eq!(screen.tick(0), ScreenPhase::Exiting);
        assert_eq!(screen.tick(1), ScreenPhase::Exiting);
    }

    #[test]
    fn test_headless_session_stops_on_exit() {
        let mut screen = Screen::new(Stub::default(), MemoryScoreStore::new(0)).unwrap();
        let mut session = Session::headless();
        let mut frames = 0;
        let ran = session.run(
            &mut screen,
            |frame| if frame == 5 { vec![InputEvent::Quit] } else { Vec::new() },
            |_| frames += 1,
            100,
        );
        assert_eq!(ran, 6);
        assert_eq!(frames, 6);
        assert_eq!(screen.phase(), ScreenPhase::Exiting);
    }

    #[test]
    fn test_headless_session_tick_limit() {
        let mut screen = Screen::new(Stub::default(), MemoryScoreStore::new(0)).unwrap();
        let mut session = Session::headless();
        assert_eq!(session.run(&mut screen, |_| Vec::new(), |_| {}, 30), 30);
        assert_eq!(session.frame(), 30);
    }
}
