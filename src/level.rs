//! The level state machine.

use bevy_ecs::entity::Entity;
use bevy_ecs::event::{EventRegistry, Events};
use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, SystemSet};
use bevy_ecs::system::{Res, RunSystemOnce};
use bevy_ecs::world::World;
use glam::Vec2;
use strum::IntoEnumIterator;
use tracing::{debug, info, trace, warn};

use crate::catalog::LevelConfig;
use crate::error::{GameError, GameResult};
use crate::events::{EventSink, LevelEvent, Overlap};
use crate::host::{HostLink, SharedHost, SharedPlayer};
use crate::systems::{
    clear_level_system, cull_system, finish_teardown_system, gift_system, hazard_system, movement_system, needs_teardown,
    overlap_system, overlay_follow_system, pickup_system, prime_spawners_system, projectile_system, shoot_system,
    spawn_timer_system, wind_clamp_system, wind_system, ActiveLevel, DeltaTime, EntityKind, Frozen, GiftVariant, IceOverlay,
    LevelClock, LevelPhase, LevelRng, PlayBounds, PlayerSnapshot, Position, RunState, ShootRequest, SpawnSchedule,
};

/// Per-frame stages of a level, run in declaration order.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
enum LevelSet {
    /// Timers fire and the shoot request is honored
    Spawn,
    /// Wind, integration, clamping and overlay tracking
    Motion,
    Cull,
    Detect,
    /// Overlap resolution in priority order
    Resolve,
    /// Removal of everything once the run has finished
    Teardown,
}

fn level_active(phase: Res<LevelPhase>) -> bool {
    phase.is_active()
}

/// Everything a level needs from its orchestrator.
pub struct LevelContext {
    pub player: SharedPlayer,
    pub host: SharedHost,
    pub sink: Box<dyn EventSink>,
    pub viewport: Vec2,
    /// Fixed seed for reproducible runs; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

/// A read-only view of one live entity, for renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    pub entity: Entity,
    pub kind: EntityKind,
    pub position: Vec2,
    pub frozen: bool,
    pub variant: Option<u8>,
}

/// One running level, built on a private ECS world.
///
/// The world holds the level's entities and its run state as resources, while the
/// schedule defines the per-frame order of spawning, motion, culling, overlap
/// detection, resolution and teardown. Events raised by the systems are forwarded
/// to the level's [`EventSink`] at the end of every call that can produce them.
pub struct Level {
    pub world: World,
    pub schedule: Schedule,
    config: LevelConfig,
    player: SharedPlayer,
    host: SharedHost,
    sink: Box<dyn EventSink>,
}

impl Level {
    /// Builds an idle level. Nothing spawns until [`Level::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Config` when the configuration fails validation.
    pub fn new(config: LevelConfig, context: LevelContext) -> GameResult<Level> {
        config.validate()?;
        let LevelContext {
            player,
            host,
            sink,
            viewport,
            seed,
        } = context;

        let mut world = World::default();
        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);

        EventRegistry::register_event::<Overlap>(&mut world);
        EventRegistry::register_event::<LevelEvent>(&mut world);

        world.insert_resource(ActiveLevel(config));
        world.insert_resource(LevelPhase::Idle);
        world.insert_resource(RunState::default());
        world.insert_resource(LevelClock::default());
        world.insert_resource(DeltaTime::default());
        world.insert_resource(PlayBounds::from_viewport(viewport));
        world.insert_resource(PlayerSnapshot {
            position: player.position(),
            radius: player.radius(),
        });
        world.insert_resource(ShootRequest::default());
        world.insert_resource(SpawnSchedule::default());
        world.insert_resource(match seed {
            Some(seed) => LevelRng::seeded(seed),
            None => LevelRng::from_entropy(),
        });
        world.insert_non_send_resource(HostLink(host.clone()));

        Self::configure_schedule(&mut schedule);

        debug!(level = config.id, ?seed, "Level built");
        Ok(Level {
            world,
            schedule,
            config,
            player,
            host,
            sink,
        })
    }

    fn configure_schedule(schedule: &mut Schedule) {
        schedule
            .add_systems((
                (spawn_timer_system, shoot_system).chain().in_set(LevelSet::Spawn),
                (wind_system, movement_system, wind_clamp_system, overlay_follow_system)
                    .chain()
                    .in_set(LevelSet::Motion),
                cull_system.in_set(LevelSet::Cull),
                overlap_system.in_set(LevelSet::Detect),
                (pickup_system, gift_system, hazard_system, projectile_system)
                    .chain()
                    .in_set(LevelSet::Resolve),
                (clear_level_system, finish_teardown_system)
                    .chain()
                    .run_if(needs_teardown)
                    .in_set(LevelSet::Teardown),
            ))
            .configure_sets(
                (
                    LevelSet::Spawn.run_if(level_active),
                    LevelSet::Motion.run_if(level_active),
                    LevelSet::Cull.run_if(level_active),
                    LevelSet::Detect.run_if(level_active),
                    LevelSet::Resolve.run_if(level_active),
                    LevelSet::Teardown,
                )
                    .chain(),
            );
    }

    /// Resets the run and starts every spawner, firing each of them once right away.
    ///
    /// Calling it again restarts the level from scratch.
    pub fn start(&mut self) -> GameResult<()> {
        self.clear()?;

        let lives = {
            let mut host = self.host.borrow_mut();
            host.reset(self.config.max_lives);
            host.lives()
        };
        self.world.insert_resource(RunState::fresh(lives));
        self.world.insert_resource(LevelClock::default());
        self.world.insert_resource(ShootRequest::default());
        self.world.insert_resource(SpawnSchedule::for_level(&self.config));
        self.world.insert_resource(LevelPhase::Active);
        self.world.resource_mut::<Events<Overlap>>().clear();
        self.sync_player();

        self.world
            .run_system_once(prime_spawners_system)
            .map_err(|err| GameError::System(format!("failed to prime spawners: {err:?}")))?;

        info!(level = self.config.id, lives, target = ?self.config.target, "Level started");
        self.report(LevelEvent::LevelStarted { level: self.config.id });
        if self.config.has_ammo() {
            self.report(LevelEvent::StarsUpdated { stars: 0 });
        }
        Ok(())
    }

    /// Advances the level by one frame of `delta_ms` milliseconds.
    ///
    /// Does nothing unless the level is active. Non-finite frame times are ignored and
    /// long frames are capped at [`crate::constants::MAX_FRAME_MS`].
    pub fn update(&mut self, delta_ms: f64) {
        if !self.phase().is_active() {
            trace!(phase = ?self.phase(), "Update skipped");
            return;
        }
        if !delta_ms.is_finite() {
            warn!(delta_ms, "Ignoring non-finite frame time");
            return;
        }
        let delta = DeltaTime::clamped(delta_ms);
        self.world.insert_resource(delta);
        self.world.resource_mut::<LevelClock>().now_ms += delta.millis;
        self.sync_player();

        self.schedule.run(&mut self.world);

        self.world.resource_mut::<Events<Overlap>>().update();
        self.flush_events();
    }

    /// Requests a single projectile on the next update.
    ///
    /// Requests made while ammo is zero, or on levels without stars, fire nothing.
    pub fn request_shoot(&mut self) {
        if self.config.has_ammo() && self.phase().is_active() {
            self.world.resource_mut::<ShootRequest>().0 = true;
        }
    }

    /// Recomputes the play bounds; live entities are left where they are.
    pub fn resize(&mut self, width: f32, height: f32) {
        let bounds = PlayBounds::from_viewport(Vec2::new(width, height));
        debug!(width, height, world = ?bounds.world, "Level bounds resized");
        self.world.insert_resource(bounds);
    }

    /// Cancels all timers and removes every entity. Safe to call from any state, any number of times.
    pub fn destroy(&mut self) {
        if self.phase() == LevelPhase::TornDown {
            return;
        }
        if let Err(err) = self.clear() {
            warn!(error = %err, "Level teardown failed to clear entities");
        }
        self.world.insert_resource(ShootRequest::default());
        self.world.insert_resource(LevelPhase::TornDown);
        self.world.resource_mut::<Events<Overlap>>().clear();
        self.flush_events();
        info!(level = self.config.id, "Level destroyed");
    }

    fn clear(&mut self) -> GameResult<()> {
        self.world
            .run_system_once(clear_level_system)
            .map_err(|err| GameError::System(format!("failed to clear level: {err:?}")))
    }

    fn sync_player(&mut self) {
        let snapshot = PlayerSnapshot {
            position: self.player.position(),
            radius: self.player.radius(),
        };
        self.world.insert_resource(snapshot);
    }

    fn report(&mut self, event: LevelEvent) {
        debug!(event = event.name(), ?event, "Level event");
        self.sink.emit(&event);
    }

    fn flush_events(&mut self) {
        let pending: Vec<LevelEvent> = self.world.resource_mut::<Events<LevelEvent>>().drain().collect();
        for event in pending {
            self.report(event);
        }
    }

    pub fn id(&self) -> u8 {
        self.config.id
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn phase(&self) -> LevelPhase {
        *self.world.resource::<LevelPhase>()
    }

    pub fn run_state(&self) -> RunState {
        *self.world.resource::<RunState>()
    }

    pub fn score(&self) -> u32 {
        self.run_state().score
    }

    pub fn lives(&self) -> u32 {
        self.run_state().lives
    }

    pub fn star_ammo(&self) -> u8 {
        self.run_state().star_ammo
    }

    /// Milliseconds of level clock elapsed since [`Level::start`].
    pub fn elapsed_ms(&self) -> f64 {
        self.world.resource::<LevelClock>().now_ms
    }

    pub fn bounds(&self) -> PlayBounds {
        *self.world.resource::<PlayBounds>()
    }

    /// Snapshot of every live entity; ice overlays are folded into their gift's `frozen` flag.
    pub fn entities(&mut self) -> Vec<EntityView> {
        let mut query = self
            .world
            .query::<(Entity, &EntityKind, &Position, Option<&Frozen>, Option<&GiftVariant>)>();
        query
            .iter(&self.world)
            .map(|(entity, kind, position, frozen, variant)| EntityView {
                entity,
                kind: *kind,
                position: position.0,
                frozen: frozen.is_some(),
                variant: variant.map(|variant| variant.0),
            })
            .collect()
    }

    pub fn count(&mut self, kind: EntityKind) -> usize {
        let mut query = self.world.query::<&EntityKind>();
        query.iter(&self.world).filter(|candidate| **candidate == kind).count()
    }

    /// Live entity count for every kind, in declaration order.
    pub fn census(&mut self) -> Vec<(EntityKind, usize)> {
        EntityKind::iter().map(|kind| (kind, self.count(kind))).collect()
    }

    pub fn overlay_count(&mut self) -> usize {
        let mut query = self.world.query::<&IceOverlay>();
        query.iter(&self.world).count()
    }
}
