use std::cell::Cell;

use glam::Vec2;

use crate::constants::player::{BOUNDS_INSET, RADIUS, SPEED};
use crate::host::PlayerHandle;
use crate::systems::components::Bounds;

/// The player avatar, owned by the orchestrator and shared read-only with levels.
#[derive(Debug)]
pub struct Player {
    position: Cell<Vec2>,
    radius: f32,
    speed: f32,
}

impl Player {
    pub fn new(position: Vec2) -> Self {
        Self {
            position: Cell::new(position),
            radius: RADIUS,
            speed: SPEED,
        }
    }

    pub fn place(&self, position: Vec2) {
        self.position.set(position);
    }

    /// Moves along `direction` for `seconds`, staying inside `bounds`.
    ///
    /// The direction is normalized, so diagonal input is not faster.
    pub fn step(&self, direction: Vec2, seconds: f32, bounds: &Bounds) {
        let moved = self.position.get() + direction.normalize_or_zero() * self.speed * seconds;
        self.position.set(bounds.inset(BOUNDS_INSET).clamp(moved));
    }
}

impl PlayerHandle for Player {
    fn position(&self) -> Vec2 {
        self.position.get()
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}
