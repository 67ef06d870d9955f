use bevy_ecs::entity::Entity;
use bevy_ecs::system::{Commands, Query, Res};
use tracing::trace;

use crate::constants::CULL_MARGIN;
use crate::systems::components::{EntityKind, Frozen, PlayBounds, Position};

/// Whether an entity of `kind` at `position` has left the play area for good.
///
/// Gifts and pickups only travel left, so they are culled past the left edge alone;
/// hazards and projectiles are culled past any edge.
pub fn is_out_of_play(kind: EntityKind, position: &Position, bounds: &PlayBounds) -> bool {
    if kind.drifts_left() {
        position.0.x < bounds.world.left() - CULL_MARGIN
    } else {
        !bounds.world.contains_with_margin(position.0, CULL_MARGIN)
    }
}

pub fn cull_system(
    mut commands: Commands,
    bounds: Res<PlayBounds>,
    entities: Query<(Entity, &EntityKind, &Position, Option<&Frozen>)>,
) {
    for (entity, kind, position, frozen) in entities.iter() {
        if !is_out_of_play(*kind, position, &bounds) {
            continue;
        }
        trace!(?entity, ?kind, position = ?position.0, "Culled");
        if let Some(frozen) = frozen {
            commands.entity(frozen.overlay).try_despawn();
        }
        commands.entity(entity).despawn();
    }
}
