//! PlayCore headless runner
//!
//! Plays one game in attract mode against a recording canvas:
//!
//! ```text
//! playcore [spell|bouncer|flyer|dodger] [ticks] [tuning.json]
//! ```
//!
//! A scripted pointer swipes up and across the screen on a fixed cycle, which
//! starts runs, plays them, and dismisses the game-over screen. Set
//! `RUST_LOG=info` to watch phase transitions.

use std::error::Error;
use std::path::PathBuf;

use glam::Vec2;
use playcore::persistence::FileScoreStore;
use playcore::platform::InputEvent;
use playcore::render::DrawList;
use playcore::screen::{Bouncer, Dodger, Flyer, Game, Screen, ScreenPhase, Session, SpellGame};
use playcore::Tuning;

const SCREEN: Vec2 = Vec2::new(720.0, 1280.0);
const DEFAULT_TICKS: u64 = 3600;
/// Ticks between the start of two scripted strokes
const STROKE_CYCLE: u64 = 90;
const STROKE_TICKS: u64 = 12;

/// Scripted pointer for one tick: alternating upward and sideways swipes
fn attract_input(frame: u64) -> Vec<InputEvent> {
    let cycle = frame / STROKE_CYCLE;
    let t = frame % STROKE_CYCLE;
    let (from, to) = if cycle % 2 == 0 {
        (Vec2::new(0.5, 0.8), Vec2::new(0.5, 0.45))
    } else {
        (Vec2::new(0.15, 0.7), Vec2::new(0.85, 0.7))
    };
    let at = |f: f32| (from + (to - from) * f) * SCREEN;
    match t {
        0 => vec![InputEvent::PointerDown(at(0.0))],
        t if t < STROKE_TICKS => vec![InputEvent::PointerMove(at(t as f32 / STROKE_TICKS as f32))],
        t if t == STROKE_TICKS => vec![InputEvent::PointerUp(at(1.0))],
        _ => Vec::new(),
    }
}

fn run<G: Game>(game: G, ticks: u64) -> Result<(), Box<dyn Error>> {
    let name = game.name();
    let path = std::env::temp_dir().join(format!("playcore-{name}.score"));
    let store = FileScoreStore::create_if_missing(&path)?;
    let mut screen = Screen::new(game, store)?;
    log::info!("Best {name} score {} ({})", screen.high_score().best(), path.display());

    let mut canvas = DrawList::new();
    let mut frames = 0u64;
    let mut draw_calls = 0usize;
    let mut runs = 0u32;
    let mut last_phase = screen.phase();

    let mut session = Session::headless();
    let ran = session.run(
        &mut screen,
        attract_input,
        |screen| {
            canvas.clear();
            screen.draw(&mut canvas);
            frames += 1;
            draw_calls += canvas.len();
            let phase = screen.phase();
            if phase != last_phase {
                if phase == ScreenPhase::GameOver {
                    runs += 1;
                    log::info!(
                        "Run {runs} over: score {}, {} draw calls this frame",
                        screen.final_score().unwrap_or_default(),
                        canvas.len()
                    );
                }
                last_phase = phase;
            }
            if frames % 600 == 0 {
                log::debug!("Frame {frames}: {:?}, {} draw calls", phase, canvas.len());
            }
        },
        ticks,
    );

    log::info!(
        "{name}: {ran} ticks, {runs} runs, best {}, {:.1} draw calls per frame",
        screen.high_score().best(),
        draw_calls as f64 / frames.max(1) as f64
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let game = args.next().unwrap_or_else(|| "spell".to_string());
    let ticks = match args.next() {
        Some(raw) => raw.parse()?,
        None => DEFAULT_TICKS,
    };
    let tuning = match args.next() {
        Some(path) => Tuning::load(PathBuf::from(path))?,
        None => Tuning::default(),
    };
    let seed = rand::random::<u64>();
    log::info!("PlayCore starting {game} for {ticks} ticks (seed {seed})");

    match game.as_str() {
        "spell" => run(SpellGame::new(SCREEN, &tuning, seed)?, ticks),
        "bouncer" => run(Bouncer::new(SCREEN, &tuning, seed), ticks),
        "flyer" => run(Flyer::new(SCREEN, &tuning, seed), ticks),
        "dodger" => run(Dodger::new(SCREEN, &tuning, seed), ticks),
        other => Err(format!(
            "unknown game {other:?}, expected spell, bouncer, flyer or dodger"
        )
        .into()),
    }
}
