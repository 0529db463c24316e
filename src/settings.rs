//! Game tuning
//!
//! Every constant that shapes gameplay feel lives here so it can be tweaked
//! from a JSON file without recompiling. Defaults are the shipped feel of the
//! games; they are tuned by hand, not derived from a physical model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FRAME_DELAY, SIM_HZ};
use crate::error::ConfigError;
use crate::sim::gesture::GestureThresholds;

/// Spell (gesture) game tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellTuning {
    /// Player hit points at the start of a run
    pub player_hp: u32,
    /// Ghost reach at 1280 px screen width
    pub ghost_reach: f32,
    /// Ghost walk speed (px/s) for a three-symbol ghost
    pub ghost_base_speed: f32,
    /// Speed change per symbol fewer than three
    pub ghost_speed_per_symbol: f32,
    pub ghost_min_speed: f32,
    pub ghost_max_speed: f32,
    pub points_per_ghost: u64,
    /// Ticks between HP reaching zero and GAMEOVER
    pub defeat_wait_ticks: u32,
    /// Minimum stroke sample spacing as a fraction of screen height
    pub stroke_spacing: f32,
}

impl Default for SpellTuning {
    fn default() -> Self {
        Self {
            player_hp: 5,
            ghost_reach: 50.0,
            ghost_base_speed: 50.0,
            ghost_speed_per_symbol: 5.0,
            ghost_min_speed: 40.0,
            ghost_max_speed: 80.0,
            points_per_ghost: 10,
            defeat_wait_ticks: 60,
            stroke_spacing: 0.01,
        }
    }
}

/// Line-drawing bouncer tuning (units are px/tick at 1280 px height)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BouncerTuning {
    pub gravity: f32,
    pub terminal_fall: f32,
    /// Upward speed imparted by every wall bounce
    pub rebound: f32,
    /// Normal restitution of a wall bounce
    pub restitution: f32,
    /// Tangential retention of a wall bounce
    pub tangential: f32,
    /// Vertical gap between random platforms, as a fraction of screen height
    pub platform_spacing: f32,
    /// Chance (out of 3) a platform slot actually spawns one
    pub platform_odds: u32,
    /// Score after which lasers start appearing
    pub laser_score: u64,
    /// Sideways kick applied by an active laser
    pub laser_push: f32,
}

impl Default for BouncerTuning {
    fn default() -> Self {
        Self {
            gravity: 0.15,
            terminal_fall: 8.0,
            rebound: 11.0,
            restitution: 1.0,
            tangential: 1.0,
            platform_spacing: 1.0 / 7.0,
            platform_odds: 2,
            laser_score: 300,
            laser_push: 8.0,
        }
    }
}

/// Pointer-chasing flyer tuning (units are px/tick)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyerTuning {
    pub max_speed: f32,
    /// Velocity damping divisor while cruising
    pub inertia: f32,
    /// Damping divisor right after an asteroid hit
    pub hit_inertia: f32,
    /// Heading damping divisor
    pub turn_divisor: f32,
    pub restitution: f32,
    pub tangential: f32,
    /// Distance the ship is pushed out of an asteroid
    pub push_out: f32,
    pub ground_restitution: f32,
    pub hull: u32,
    /// Ticks between asteroid spawns
    pub spawn_interval: u32,
    /// Altitude units per score point
    pub score_divisor: f32,
}

impl Default for FlyerTuning {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            inertia: 100.0,
            hit_inertia: 400.0,
            turn_divisor: 20.0,
            restitution: 0.5,
            tangential: 0.5,
            push_out: 10.0,
            ground_restitution: 2.0 / 3.0,
            hull: 3,
            spawn_interval: 30,
            score_divisor: 30.0,
        }
    }
}

/// Beam-dodging minefield tuning (lengths are px at 1280 px height)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DodgerTuning {
    /// Beam turn rate (degrees/tick) with the pointer on the center
    pub base_speed: f32,
    /// Extra turn rate per px between pointer and center
    pub speed_per_px: f32,
    /// Score after which the fast rates apply
    pub fast_score: u64,
    pub fast_base_speed: f32,
    pub fast_speed_per_px: f32,
    /// Chance per second that the beam reverses
    pub flip_chance: f32,
    /// Half width of the beam at the center, also the dead-zone radius
    pub beam_radius: f32,
    /// Outward lean of each beam edge, degrees
    pub beam_spread: f32,
    /// Touch radius of a mine
    pub mine_size: f32,
    /// Ticks between mine drops
    pub lay_interval: u32,
    pub fast_lay_interval: u32,
    /// Score after which mines drop on the fast interval
    pub fast_lay_score: u64,
    /// Chance a drop also carries a score mine and a second trap
    pub bonus_chance: f32,
}

impl Default for DodgerTuning {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            speed_per_px: 1.0 / 1000.0,
            fast_score: 200,
            fast_base_speed: 1.2,
            fast_speed_per_px: 1.0 / 800.0,
            flip_chance: 0.2,
            beam_radius: 50.0,
            beam_spread: 30.0,
            mine_size: 30.0,
            lay_interval: 300,
            fast_lay_interval: 240,
            fast_lay_score: 10,
            bonus_chance: 0.1,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Animation delay used by clips that do not specify one
    pub default_frame_delay: u32,
    pub gesture: GestureThresholds,
    pub spell: SpellTuning,
    pub bouncer: BouncerTuning,
    pub flyer: FlyerTuning,
    pub dodger: DodgerTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tick_rate: SIM_HZ,
            default_frame_delay: DEFAULT_FRAME_DELAY,
            gesture: GestureThresholds::default(),
            spell: SpellTuning::default(),
            bouncer: BouncerTuning::default(),
            flyer: FlyerTuning::default(),
            dodger: DodgerTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from disk; a missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No tuning file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Write tuning as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values that would divide by zero or make bounces gain energy
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be positive".into()));
        }
        if self.default_frame_delay == 0 {
            return Err(ConfigError::Invalid(
                "default_frame_delay must be positive".into(),
            ));
        }
        if self.flyer.inertia < 1.0 || self.flyer.hit_inertia < 1.0 {
            return Err(ConfigError::Invalid("flyer inertia must be >= 1".into()));
        }
        if self.flyer.turn_divisor < 1.0 {
            return Err(ConfigError::Invalid("flyer turn_divisor must be >= 1".into()));
        }
        let unit = 0.0..=1.0;
        for (name, value) in [
            ("bouncer.restitution", self.bouncer.restitution),
            ("bouncer.tangential", self.bouncer.tangential),
            ("flyer.restitution", self.flyer.restitution),
            ("flyer.tangential", self.flyer.tangential),
            ("flyer.ground_restitution", self.flyer.ground_restitution),
            ("dodger.bonus_chance", self.dodger.bonus_chance),
            ("dodger.flip_chance", self.dodger.flip_chance),
        ] {
            if !unit.contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1]")));
            }
        }
        if self.dodger.lay_interval == 0 || self.dodger.fast_lay_interval == 0 {
            return Err(ConfigError::Invalid(
                "dodger lay intervals must be positive".into(),
            ));
        }
        if self.bouncer.platform_odds > 3 {
            return Err(ConfigError::Invalid(
                "bouncer.platform_odds is out of 3".into(),
            ));
        }
        Ok(())
    }

    /// Fixed timestep in seconds
    pub fn sim_dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let tuning = Tuning::from_json(r#"{"flyer":{"max_speed":12.0}}"#).unwrap();
        assert_eq!(tuning.flyer.max_speed, 12.0);
        assert_eq!(tuning.flyer.inertia, FlyerTuning::default().inertia);
        assert_eq!(tuning.tick_rate, SIM_HZ);
    }

    #[test]
    fn rejects_energy_gaining_bounce() {
        let err = Tuning::from_json(r#"{"flyer":{"restitution":1.5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_lay_interval() {
        let err = Tuning::from_json(r#"{"dodger":{"fast_lay_interval":0}}"#).unwrap_err();
        assert!(err.to_string().contains("lay intervals"));
        let err = Tuning::from_json(r#"{"dodger":{"bonus_chance":2.0}}"#).unwrap_err();
        assert!(err.to_string().contains("dodger.bonus_chance"));
    }

    #[test]
    fn rejects_zero_delay() {
        let err = Tuning::from_json(r#"{"default_frame_delay":0}"#).unwrap_err();
        assert!(err.to_string().contains("default_frame_delay"));
    }

    #[test]
    fn missing_file_is_default() {
        let tuning = Tuning::load("/definitely/not/here/tuning.json").unwrap();
        assert_eq!(tuning.tick_rate, SIM_HZ);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("playcore-tuning-{}.json", std::process::id()));
        let mut tuning = Tuning::default();
        tuning.spell.player_hp = 7;
        tuning.save(&path).unwrap();
        let loaded = Tuning::load(&path).unwrap();
        assert_eq!(loaded.spell.player_hp, 7);
        let _ = std::fs::remove_file(&path);
    }
}
