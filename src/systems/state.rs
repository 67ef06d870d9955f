use bevy_ecs::{
    entity::Entity,
    query::With,
    resource::Resource,
    system::{Commands, Query, Res, ResMut},
};
use strum_macros::IntoStaticStr;
use tracing::{debug, info};

use crate::systems::components::LevelEntity;
use crate::systems::spawn::SpawnSchedule;

/// The lifecycle stage of a level.
///
/// `Completed` and `GameOver` are terminal for gameplay; `TornDown` is reached only
/// through an explicit destroy.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum LevelPhase {
    #[default]
    Idle,
    Active,
    Completed,
    GameOver,
    TornDown,
}

impl LevelPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, LevelPhase::Active)
    }

    /// Whether the run has ended through gameplay.
    pub fn is_finished(&self) -> bool {
        matches!(self, LevelPhase::Completed | LevelPhase::GameOver)
    }

    /// Moves from `Active` into a finishing phase.
    ///
    /// Returns `false` without changing anything if the level is no longer active, so
    /// a second completion or game over within the same run is ignored.
    pub fn finish(&mut self, outcome: LevelPhase) -> bool {
        debug_assert!(matches!(outcome, LevelPhase::Completed | LevelPhase::GameOver));
        if !self.is_active() {
            return false;
        }
        *self = outcome;
        true
    }
}

/// Mutable counters of the running level.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct RunState {
    pub score: u32,
    pub lives: u32,
    pub star_ammo: u8,
    /// Level clock time of the last life-losing hit.
    pub last_hit_at: Option<f64>,
}

impl RunState {
    pub fn fresh(lives: u32) -> Self {
        Self {
            lives,
            ..Self::default()
        }
    }

    /// Whether a hit at `now_ms` falls inside the cooldown window of the previous one.
    pub fn in_hit_cooldown(&self, now_ms: f64, cooldown_ms: f64) -> bool {
        self.last_hit_at.is_some_and(|last| now_ms - last < cooldown_ms)
    }
}

/// Despawns every level-owned entity and cancels all spawn timers.
pub fn clear_level_system(
    mut commands: Commands,
    entities: Query<Entity, With<LevelEntity>>,
    mut schedule: ResMut<SpawnSchedule>,
) {
    schedule.cancel();
    let mut removed = 0usize;
    for entity in entities.iter() {
        commands.entity(entity).despawn();
        removed += 1;
    }
    if removed > 0 {
        debug!(removed, "Level entities cleared");
    }
}

/// Run condition: the level just finished and still holds entities or timers.
pub fn needs_teardown(phase: Res<LevelPhase>, schedule: Res<SpawnSchedule>, entities: Query<(), With<LevelEntity>>) -> bool {
    phase.is_finished() && (!schedule.is_empty() || !entities.is_empty())
}

pub fn finish_teardown_system(phase: Res<LevelPhase>) {
    let phase: &'static str = (*phase).into();
    info!(phase, "Level run ended, entities and timers torn down");
}
