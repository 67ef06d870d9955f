//! Centralized error types for the simulation core.
//!
//! Almost every anomaly inside a running level is absorbed as a no-op (stale handles,
//! repeated transitions, empty ammunition). The errors here are the remaining faults
//! that must surface at the orchestrator boundary.

/// Main error type for the simulation.
///
/// This is the primary error type that should be used in public APIs.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Level error: {0}")]
    Level(#[from] LevelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("System error: {0}")]
    System(String),
}

/// Errors raised when selecting or driving a level.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LevelError {
    #[error("Unknown level id: {0}")]
    UnknownLevel(u8),

    #[error("Level {requested} is locked (unlocked up to {unlocked})")]
    Locked { requested: u8, unlocked: u8 },

    #[error("No level is currently running")]
    NotStarted,
}

/// Errors produced while validating a level configuration.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Level {level}: {kind} spawn delay must be positive")]
    ZeroSpawnDelay { level: u8, kind: &'static str },

    #[error("Level {level}: frozen gifts require a star supply to thaw them")]
    FreezeWithoutAmmo { level: u8 },

    #[error("Level {level}: hazards require at least one life")]
    HazardsWithoutLives { level: u8 },

    #[error("Level {level}: a level without a target must end through hazards")]
    EnduranceWithoutHazards { level: u8 },

    #[error("Level {level}: wind range is inverted ({min} > {max})")]
    InvertedWind { level: u8, min: f32, max: f32 },

    #[error("Level {level}: wind interval {interval_ms}ms must exceed the re-roll jitter")]
    WindIntervalTooShort { level: u8, interval_ms: f64 },

    #[error("Level {level}: projectile interactions require a star supply")]
    ProjectileWithoutAmmo { level: u8 },
}

/// Errors from the progress key-value store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for simulation operations.
pub type GameResult<T> = Result<T, GameError>;
