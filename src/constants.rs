//! This module contains all the tuning constants used by the simulation.

use std::time::Duration;

use glam::Vec2;

/// Frame period used by the headless runner.
pub const LOOP_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / 60.0) as u64);

/// Longest frame a level will simulate in one step, in milliseconds.
pub const MAX_FRAME_MS: f64 = 1000.0;

/// Most times a single spawn timer may fire within one frame.
pub const MAX_TIMER_CATCH_UP: u32 = 4;

/// The default viewport size, in world units.
pub const VIEWPORT_SIZE: Vec2 = Vec2::new(960.0, 540.0);

/// Inset of the physics world bounds from every viewport edge.
pub const WORLD_INSET: f32 = 32.0;

/// Inset of the static collectible field (the scattered level) from every viewport edge.
pub const FIELD_INSET: f32 = 64.0;
/// The scattered field never shrinks below this size on either axis.
pub const FIELD_MIN_SIZE: f32 = 120.0;

/// Spawned entities appear this far to the right of the world bounds.
pub const SPAWN_OFFSET_X: f32 = 24.0;
/// Vertical spawn positions keep this distance from the top and bottom bounds.
pub const SPAWN_MARGIN_Y: f32 = 40.0;

/// Entities are culled once they are this far outside the world bounds.
pub const CULL_MARGIN: f32 = 40.0;

/// Wind-driven entities bounce this far inside the top and bottom bounds.
pub const WIND_CLAMP_MARGIN: f32 = 20.0;
/// Each wind re-roll is offset by up to this many milliseconds in either direction.
pub const WIND_REROLL_JITTER_MS: f64 = 80.0;

/// Star ammunition never exceeds this count.
pub const STAR_AMMO_CAP: u8 = 5;

/// Number of gift appearance variants the renderer can choose between.
pub const GIFT_VARIANTS: u8 = 7;

pub mod player {
    /// Collision radius of the player.
    pub const RADIUS: f32 = 14.0;
    /// Movement speed of the player, in units per second.
    pub const SPEED: f32 = 240.0;
    /// The player is kept this far inside the world bounds.
    pub const BOUNDS_INSET: f32 = 16.0;
}

/// Collision radii for every spawned entity kind.
pub mod collider {
    pub const GIFT: f32 = 18.0;
    pub const HAZARD: f32 = 12.0;
    pub const STAR_PICKUP: f32 = 14.0;
    pub const HEART_PICKUP: f32 = 14.0;
    pub const STAR_PROJECTILE: f32 = 10.0;
}

/// Feedback signal durations reported alongside events.
pub mod feedback {
    /// Length of the camera flash after a non-fatal hazard hit.
    pub const HIT_FLASH_MS: u32 = 120;
}
