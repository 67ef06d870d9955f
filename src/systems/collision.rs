use bevy_ecs::entity::Entity;
use bevy_ecs::event::EventWriter;
use bevy_ecs::system::{Query, Res};
use smallvec::SmallVec;

use crate::catalog::Mechanics;
use crate::events::{Overlap, OverlapRule};
use crate::systems::components::{ActiveLevel, Collider, EntityKind, PlayerSnapshot, Position};

/// The rule a player overlap with `kind` falls under, if any.
pub fn player_rule(kind: EntityKind) -> Option<OverlapRule> {
    match kind {
        EntityKind::StarPickup | EntityKind::HeartPickup => Some(OverlapRule::PlayerPickup),
        EntityKind::Gift => Some(OverlapRule::PlayerGift),
        EntityKind::Hazard => Some(OverlapRule::PlayerHazard),
        EntityKind::StarProjectile => None,
    }
}

/// The rule a projectile overlap with `kind` falls under, given the level's mechanics.
pub fn projectile_rule(kind: EntityKind, mechanics: Mechanics) -> Option<OverlapRule> {
    match kind {
        EntityKind::Gift => Some(OverlapRule::ProjectileGift),
        EntityKind::Hazard if mechanics.contains(Mechanics::SHOT_BREAKS_HAZARDS) => Some(OverlapRule::ProjectileHazard),
        _ => None,
    }
}

/// Detects this frame's overlaps and reports them in resolution priority order.
///
/// Pickups come before gifts, gifts before hazards, and projectile interactions last,
/// so a completing gift is never suppressed by a fatal hit in the same frame.
pub fn overlap_system(
    player: Res<PlayerSnapshot>,
    level: Res<ActiveLevel>,
    entities: Query<(Entity, &EntityKind, &Position, &Collider)>,
    mut overlaps: EventWriter<Overlap>,
) {
    let mut found: SmallVec<[Overlap; 8]> = SmallVec::new();
    let mechanics = level.0.mechanics;

    let player_collider = Collider { radius: player.radius };
    for (entity, kind, position, collider) in entities.iter() {
        let Some(rule) = player_rule(*kind) else {
            continue;
        };
        if player_collider.overlaps(player.position, collider.radius, position.0) {
            found.push(Overlap {
                rule,
                target: entity,
                projectile: None,
            });
        }
    }

    for (projectile, kind, projectile_position, projectile_collider) in entities.iter() {
        if *kind != EntityKind::StarProjectile {
            continue;
        }
        for (entity, kind, position, collider) in entities.iter() {
            let Some(rule) = projectile_rule(*kind, mechanics) else {
                continue;
            };
            if projectile_collider.overlaps(projectile_position.0, collider.radius, position.0) {
                found.push(Overlap {
                    rule,
                    target: entity,
                    projectile: Some(projectile),
                });
            }
        }
    }

    // Stable, so detection order is kept within a rule.
    found.sort_by_key(|overlap| overlap.rule);
    overlaps.write_batch(found);
}
