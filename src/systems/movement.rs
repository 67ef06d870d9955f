use bevy_ecs::entity::Entity;
use bevy_ecs::query::{With, Without};
use bevy_ecs::system::{Commands, Query, Res};
use tracing::trace;

use crate::systems::components::{DeltaTime, Frozen, IceOverlay, Position, Velocity};

/// Integrates every moving entity's position by its velocity.
pub fn movement_system(delta_time: Res<DeltaTime>, mut movers: Query<(&mut Position, &Velocity)>) {
    for (mut position, velocity) in movers.iter_mut() {
        position.0 += velocity.0 * delta_time.seconds;
    }
}

/// Keeps ice overlays on top of their gifts.
///
/// An overlay whose gift is gone, or whose gift no longer points back at it, is
/// removed so no overlay outlives its gift.
pub fn overlay_follow_system(
    mut commands: Commands,
    gifts: Query<(&Position, &Frozen), Without<IceOverlay>>,
    mut overlays: Query<(Entity, &IceOverlay, &mut Position), With<IceOverlay>>,
) {
    for (overlay_entity, overlay, mut position) in overlays.iter_mut() {
        match gifts.get(overlay.gift) {
            Ok((gift_position, frozen)) if frozen.overlay == overlay_entity => {
                position.0 = gift_position.0;
            }
            _ => {
                trace!(overlay = ?overlay_entity, gift = ?overlay.gift, "Removing orphaned ice overlay");
                commands.entity(overlay_entity).despawn();
            }
        }
    }
}
