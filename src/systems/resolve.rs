//! Overlap resolution.
//!
//! Each resolver handles one group of [`OverlapRule`]s. They are chained in priority
//! order with command flushes in between, so an entity consumed by an earlier
//! resolver is already gone for the later ones. Within a resolver, entities consumed
//! earlier in the same frame are tracked explicitly because overlap detection ran
//! before any of them was removed.

use bevy_ecs::entity::Entity;
use bevy_ecs::event::{EventReader, EventWriter};
use bevy_ecs::system::{Commands, NonSend, Query, Res, ResMut};
use smallvec::SmallVec;
use tracing::{debug, info, trace};

use crate::constants::{feedback::HIT_FLASH_MS, STAR_AMMO_CAP};
use crate::events::{FeedbackCue, LevelEvent, Overlap, OverlapRule};
use crate::host::HostLink;
use crate::systems::components::{ActiveLevel, EntityKind, Frozen, LevelClock};
use crate::systems::state::{LevelPhase, RunState};

type Consumed = SmallVec<[Entity; 8]>;

/// Records `entity` as consumed, returning `false` if it already was this frame.
fn consume(consumed: &mut Consumed, entity: Entity) -> bool {
    if consumed.contains(&entity) {
        return false;
    }
    consumed.push(entity);
    true
}

/// Player × star and heart pickups.
pub fn pickup_system(
    mut commands: Commands,
    mut overlaps: EventReader<Overlap>,
    kinds: Query<&EntityKind>,
    level: Res<ActiveLevel>,
    phase: Res<LevelPhase>,
    mut run: ResMut<RunState>,
    host: NonSend<HostLink>,
    mut events: EventWriter<LevelEvent>,
) {
    let mut consumed = Consumed::new();
    for overlap in overlaps.read().filter(|overlap| overlap.rule == OverlapRule::PlayerPickup) {
        if !phase.is_active() {
            break;
        }
        let Ok(kind) = kinds.get(overlap.target) else {
            trace!(target = ?overlap.target, "Stale pickup overlap ignored");
            continue;
        };
        if !kind.is_pickup() || !consume(&mut consumed, overlap.target) {
            continue;
        }
        commands.entity(overlap.target).despawn();

        match kind {
            EntityKind::StarPickup => {
                run.star_ammo = (run.star_ammo + 1).min(STAR_AMMO_CAP);
                debug!(stars = run.star_ammo, "Star picked up");
                events.write(LevelEvent::StarsUpdated { stars: run.star_ammo });
                events.write(FeedbackCue::StarPicked.into());
            }
            EntityKind::HeartPickup => {
                run.lives = host.add_life(1, level.0.max_lives);
                debug!(lives = run.lives, "Heart picked up");
                events.write(LevelEvent::LivesUpdated { lives: run.lives });
                events.write(FeedbackCue::HeartPicked.into());
            }
            _ => {}
        }
    }
}

/// Player × gift: collection, and completion once the target is reached.
pub fn gift_system(
    mut commands: Commands,
    mut overlaps: EventReader<Overlap>,
    gifts: Query<(&EntityKind, Option<&Frozen>)>,
    level: Res<ActiveLevel>,
    mut phase: ResMut<LevelPhase>,
    mut run: ResMut<RunState>,
    host: NonSend<HostLink>,
    mut events: EventWriter<LevelEvent>,
) {
    let mut consumed = Consumed::new();
    for overlap in overlaps.read().filter(|overlap| overlap.rule == OverlapRule::PlayerGift) {
        if !phase.is_active() {
            break;
        }
        let Ok((kind, frozen)) = gifts.get(overlap.target) else {
            trace!(target = ?overlap.target, "Stale gift overlap ignored");
            continue;
        };
        // Frozen gifts stay put until a projectile thaws them.
        if *kind != EntityKind::Gift || frozen.is_some() || !consume(&mut consumed, overlap.target) {
            continue;
        }
        commands.entity(overlap.target).despawn();

        run.score = host.add_score(1);
        debug!(score = run.score, "Gift collected");
        events.write(LevelEvent::ScoreUpdated { current: run.score });

        let reached = level.0.target.is_some_and(|target| run.score >= target);
        if reached && phase.finish(LevelPhase::Completed) {
            info!(level = level.0.id, score = run.score, "Level completed");
            events.write(LevelEvent::LevelCompleted { level: level.0.id });
        }
    }
}

/// Player × hazard: life loss, debounced by the level's hit cooldown.
pub fn hazard_system(
    mut commands: Commands,
    mut overlaps: EventReader<Overlap>,
    kinds: Query<&EntityKind>,
    level: Res<ActiveLevel>,
    clock: Res<LevelClock>,
    mut phase: ResMut<LevelPhase>,
    mut run: ResMut<RunState>,
    host: NonSend<HostLink>,
    mut events: EventWriter<LevelEvent>,
) {
    let Some(cooldown) = level.0.hit_cooldown_ms() else {
        return;
    };
    let now = clock.now_ms;
    let mut consumed = Consumed::new();
    for overlap in overlaps.read().filter(|overlap| overlap.rule == OverlapRule::PlayerHazard) {
        if !phase.is_active() {
            break;
        }
        if kinds.get(overlap.target).ok() != Some(&EntityKind::Hazard) || !consume(&mut consumed, overlap.target) {
            continue;
        }
        commands.entity(overlap.target).despawn();

        if run.in_hit_cooldown(now, cooldown) {
            trace!(hazard = ?overlap.target, now, "Hazard absorbed during hit cooldown");
            continue;
        }
        run.last_hit_at = Some(now);
        run.lives = host.lose_life();
        debug!(lives = run.lives, now, "Player hit");
        events.write(LevelEvent::LivesUpdated { lives: run.lives });

        if run.lives == 0 {
            if phase.finish(LevelPhase::GameOver) {
                info!(level = level.0.id, score = run.score, elapsed_ms = now, "Game over");
                events.write(LevelEvent::GameOver);
            }
        } else {
            events.write(FeedbackCue::HazardHit { flash_ms: HIT_FLASH_MS }.into());
        }
    }
}

/// Projectile × gift thaws, projectile × hazard destroys both.
///
/// A projectile is spent on the first gift or hazard it touches, frozen or not.
pub fn projectile_system(
    mut commands: Commands,
    mut overlaps: EventReader<Overlap>,
    targets: Query<(&EntityKind, Option<&Frozen>)>,
    phase: Res<LevelPhase>,
    mut events: EventWriter<LevelEvent>,
) {
    let mut consumed = Consumed::new();
    let mut thawed = Consumed::new();
    for overlap in overlaps.read() {
        let Some(projectile) = overlap.projectile else {
            continue;
        };
        if !phase.is_active() {
            break;
        }
        if targets.get(projectile).ok().map(|(kind, _)| *kind) != Some(EntityKind::StarProjectile) {
            continue;
        }
        let Ok((kind, frozen)) = targets.get(overlap.target) else {
            trace!(target = ?overlap.target, "Stale projectile overlap ignored");
            continue;
        };
        if consumed.contains(&projectile) || consumed.contains(&overlap.target) {
            continue;
        }

        match (overlap.rule, kind) {
            (OverlapRule::ProjectileGift, EntityKind::Gift) => {
                consume(&mut consumed, projectile);
                commands.entity(projectile).despawn();
                // Thawing an already thawed gift is a no-op.
                if let Some(frozen) = frozen.filter(|_| consume(&mut thawed, overlap.target)) {
                    commands.entity(overlap.target).remove::<Frozen>();
                    commands.entity(frozen.overlay).try_despawn();
                    debug!(gift = ?overlap.target, "Gift thawed");
                    events.write(FeedbackCue::IceBroken.into());
                }
            }
            (OverlapRule::ProjectileHazard, EntityKind::Hazard) => {
                consume(&mut consumed, projectile);
                consume(&mut consumed, overlap.target);
                commands.entity(projectile).despawn();
                commands.entity(overlap.target).despawn();
                debug!(hazard = ?overlap.target, "Hazard shot down");
            }
            _ => {}
        }
    }
}
