//! Level configuration table.
//!
//! Every level is the same state machine fed with a different [`LevelConfig`];
//! adding a level is a data change in [`LevelCatalog::standard`].

use bitflags::bitflags;
use tracing::debug;

use crate::constants::WIND_REROLL_JITTER_MS;
use crate::error::{ConfigError, LevelError};

/// Id reported by progress storage once the final level has been completed.
pub const ALL_LEVELS_UNLOCKED: u8 = 8;

/// A periodic spawner: one entity every `delay_ms`, moving left at `speed`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stream {
    pub delay_ms: f64,
    pub speed: f32,
}

impl Stream {
    pub const fn new(delay_ms: f64, speed: f32) -> Self {
        Self { delay_ms, speed }
    }
}

/// How a level supplies its gifts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GiftSupply {
    /// `target` motionless gifts placed once when the level starts.
    Scatter,
    /// Gifts stream in from the right edge.
    Stream(Stream),
}

/// Randomized velocity re-roll parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wind {
    pub y_min: f32,
    pub y_max: f32,
    pub x_jitter: f32,
    pub change_interval_ms: f64,
}

/// Star pickups and the projectile they arm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Armory {
    pub stars: Stream,
    pub shot_speed: f32,
}

/// Thrown hazards aimed at the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardSpec {
    pub stream: Stream,
    /// Maximum deviation from a perfect aim, in radians.
    pub angle_jitter: f32,
    /// Maximum deviation from the base speed, in units per second.
    pub speed_jitter: f32,
    pub hit_cooldown_ms: f64,
    pub wind: Option<Wind>,
}

bitflags! {
    /// Optional interaction rules of a level.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Mechanics: u8 {
        /// Gifts spawn encased in ice and must be thawed by a projectile first.
        const FROZEN_GIFTS = 1 << 0;
        /// A projectile touching a hazard destroys both.
        const SHOT_BREAKS_HAZARDS = 1 << 1;
        /// The run is recorded as an endurance result when it ends.
        const RECORDS_BONUS = 1 << 2;
    }
}

/// Immutable description of one level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelConfig {
    pub id: u8,
    /// Gifts needed to complete the level; `None` for the endurance level.
    pub target: Option<u32>,
    pub max_lives: u32,
    pub gifts: GiftSupply,
    pub gift_wind: Option<Wind>,
    pub armory: Option<Armory>,
    /// Heart pickups travel at the star pickup speed of their level.
    pub hearts: Option<Stream>,
    pub hazards: Option<HazardSpec>,
    pub mechanics: Mechanics,
}

impl LevelConfig {
    pub fn has_ammo(&self) -> bool {
        self.armory.is_some()
    }

    pub fn is_endurance(&self) -> bool {
        self.target.is_none()
    }

    pub fn freezes_gifts(&self) -> bool {
        self.mechanics.contains(Mechanics::FROZEN_GIFTS)
    }

    pub fn hit_cooldown_ms(&self) -> Option<f64> {
        self.hazards.map(|hazards| hazards.hit_cooldown_ms)
    }

    /// Checks the configuration for combinations the simulation cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.id;
        let mut streams: Vec<(&'static str, Stream)> = Vec::with_capacity(4);
        if let GiftSupply::Stream(stream) = self.gifts {
            streams.push(("gift", stream));
        }
        if let Some(armory) = self.armory {
            streams.push(("star", armory.stars));
        }
        if let Some(hearts) = self.hearts {
            streams.push(("heart", hearts));
        }
        if let Some(hazards) = self.hazards {
            streams.push(("hazard", hazards.stream));
        }
        if let Some((kind, _)) = streams.iter().find(|(_, stream)| stream.delay_ms <= 0.0) {
            return Err(ConfigError::ZeroSpawnDelay { level, kind });
        }

        if self.freezes_gifts() && self.armory.is_none() {
            return Err(ConfigError::FreezeWithoutAmmo { level });
        }
        if self.mechanics.contains(Mechanics::SHOT_BREAKS_HAZARDS) && self.armory.is_none() {
            return Err(ConfigError::ProjectileWithoutAmmo { level });
        }
        if self.hazards.is_some() && self.max_lives == 0 {
            return Err(ConfigError::HazardsWithoutLives { level });
        }
        if self.is_endurance() && self.hazards.is_none() {
            return Err(ConfigError::EnduranceWithoutHazards { level });
        }

        let winds = self.gift_wind.into_iter().chain(self.hazards.and_then(|hazards| hazards.wind));
        for wind in winds {
            if wind.y_min > wind.y_max {
                return Err(ConfigError::InvertedWind {
                    level,
                    min: wind.y_min,
                    max: wind.y_max,
                });
            }
            if wind.change_interval_ms <= WIND_REROLL_JITTER_MS {
                return Err(ConfigError::WindIntervalTooShort {
                    level,
                    interval_ms: wind.change_interval_ms,
                });
            }
        }

        Ok(())
    }
}

/// Maps level ids to their configuration.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<LevelConfig>,
}

impl LevelCatalog {
    /// Builds a catalog from arbitrary configurations, validating each one.
    ///
    /// Levels are kept sorted by id; the progression order follows the ids.
    pub fn from_configs(mut levels: Vec<LevelConfig>) -> Result<Self, ConfigError> {
        for level in &levels {
            level.validate()?;
        }
        levels.sort_by_key(|level| level.id);
        debug!(levels = levels.len(), "Level catalog built");
        Ok(Self { levels })
    }

    /// The seven shipped levels.
    pub fn standard() -> Self {
        Self {
            levels: standard_levels().to_vec(),
        }
    }

    /// Looks up a level, failing loudly for ids outside the catalog.
    pub fn get(&self, id: u8) -> Result<&LevelConfig, LevelError> {
        self.levels
            .iter()
            .find(|level| level.id == id)
            .ok_or(LevelError::UnknownLevel(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.levels.iter().map(|level| level.id)
    }

    /// The level following `id`, if any.
    pub fn next_after(&self, id: u8) -> Option<u8> {
        self.ids().find(|&next| next > id)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

const fn standard_levels() -> [LevelConfig; 7] {
    [
        LevelConfig {
            id: 1,
            target: Some(10),
            max_lives: 0,
            gifts: GiftSupply::Scatter,
            gift_wind: None,
            armory: None,
            hearts: None,
            hazards: None,
            mechanics: Mechanics::empty(),
        },
        LevelConfig {
            id: 2,
            target: Some(15),
            max_lives: 0,
            gifts: GiftSupply::Stream(Stream::new(700.0, 220.0)),
            gift_wind: None,
            armory: None,
            hearts: None,
            hazards: None,
            mechanics: Mechanics::empty(),
        },
        LevelConfig {
            id: 3,
            target: Some(15),
            max_lives: 0,
            gifts: GiftSupply::Stream(Stream::new(1200.0, 280.0)),
            gift_wind: Some(Wind {
                y_min: -140.0,
                y_max: 140.0,
                x_jitter: 90.0,
                change_interval_ms: 280.0,
            }),
            armory: None,
            hearts: None,
            hazards: None,
            mechanics: Mechanics::empty(),
        },
        LevelConfig {
            id: 4,
            target: Some(20),
            max_lives: 3,
            gifts: GiftSupply::Stream(Stream::new(620.0, 220.0)),
            gift_wind: None,
            armory: None,
            hearts: None,
            hazards: Some(HazardSpec {
                stream: Stream::new(520.0, 260.0),
                angle_jitter: 0.35,
                speed_jitter: 40.0,
                hit_cooldown_ms: 450.0,
                wind: None,
            }),
            mechanics: Mechanics::empty(),
        },
        LevelConfig {
            id: 5,
            target: Some(20),
            max_lives: 0,
            gifts: GiftSupply::Stream(Stream::new(640.0, 210.0)),
            gift_wind: None,
            armory: Some(Armory {
                stars: Stream::new(820.0, 190.0),
                shot_speed: 380.0,
            }),
            hearts: None,
            hazards: None,
            mechanics: Mechanics::FROZEN_GIFTS,
        },
        LevelConfig {
            id: 6,
            target: Some(25),
            max_lives: 3,
            gifts: GiftSupply::Stream(Stream::new(560.0, 240.0)),
            gift_wind: None,
            armory: Some(Armory {
                stars: Stream::new(780.0, 200.0),
                shot_speed: 420.0,
            }),
            hearts: None,
            hazards: Some(HazardSpec {
                stream: Stream::new(460.0, 280.0),
                angle_jitter: 0.55,
                speed_jitter: 60.0,
                hit_cooldown_ms: 380.0,
                wind: Some(Wind {
                    y_min: -220.0,
                    y_max: 220.0,
                    x_jitter: 120.0,
                    change_interval_ms: 240.0,
                }),
            }),
            mechanics: Mechanics::FROZEN_GIFTS.union(Mechanics::SHOT_BREAKS_HAZARDS),
        },
        LevelConfig {
            id: 7,
            target: None,
            max_lives: 3,
            gifts: GiftSupply::Stream(Stream::new(520.0, 250.0)),
            gift_wind: None,
            armory: Some(Armory {
                stars: Stream::new(820.0, 210.0),
                shot_speed: 440.0,
            }),
            hearts: Some(Stream::new(1640.0, 210.0)),
            hazards: Some(HazardSpec {
                stream: Stream::new(430.0, 300.0),
                angle_jitter: 0.6,
                speed_jitter: 60.0,
                hit_cooldown_ms: 360.0,
                wind: Some(Wind {
                    y_min: -240.0,
                    y_max: 240.0,
                    x_jitter: 140.0,
                    change_interval_ms: 220.0,
                }),
            }),
            mechanics: Mechanics::FROZEN_GIFTS
                .union(Mechanics::SHOT_BREAKS_HAZARDS)
                .union(Mechanics::RECORDS_BONUS),
        },
    ]
}
