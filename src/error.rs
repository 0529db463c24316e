//! Typed errors for the core
//!
//! Geometry never errors: degenerate inputs short-circuit to neutral results.
//! What remains are configuration, animation-table and persistence failures.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the persisted best score.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("score file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("score file {path} is corrupt: {content:?}")]
    Corrupt { path: PathBuf, content: String },
}

/// Animation tables are validated when built, so these surface at load time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimError {
    #[error("animation state {0} is required but has no clip")]
    MissingState(String),

    #[error("animation state {0} has no frames")]
    EmptyClip(String),

    #[error("animation state {0} has a zero frame delay")]
    ZeroDelay(String),

    #[error("animation state {from} returns to {to}, which has no clip")]
    DanglingReturn { from: String, to: String },
}

/// Tuning file problems.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// The only error a game's PLAYING update may return. The screen reacts by
/// forcing GAMEOVER with the score frozen.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Animation(#[from] AnimError),

    #[error("simulation invariant violated: {0}")]
    Invariant(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AnimError::DanglingReturn {
            from: "Cast".to_string(),
            to: "Idle".to_string(),
        };
        assert!(err.to_string().contains("Cast"));
        assert!(err.to_string().contains("Idle"));

        let sim: SimError = AnimError::ZeroDelay("Walk".into()).into();
        assert!(sim.to_string().contains("Walk"));
    }

    #[test]
    fn config_error_from_json() {
        let bad = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ConfigError = bad.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
