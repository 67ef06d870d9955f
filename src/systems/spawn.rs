//! Periodic spawners and the per-kind entity factories.

use bevy_ecs::{
    entity::Entity,
    resource::Resource,
    system::{Commands, Res, ResMut, SystemParam},
};
use glam::Vec2;
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::catalog::{GiftSupply, HazardSpec, LevelConfig, Stream};
use crate::constants::{GIFT_VARIANTS, MAX_TIMER_CATCH_UP, SPAWN_MARGIN_Y, SPAWN_OFFSET_X};
use crate::systems::components::{
    ActiveLevel, DeltaTime, EntityKind, Frozen, GiftVariant, IceOverlay, LevelClock, LevelEntity, LevelRng, MoverBundle,
    OverlayBundle, PlayBounds, PlayerSnapshot, Position, WindDrift,
};
use crate::systems::state::LevelPhase;

/// Which factory a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnKind {
    Gift,
    Star,
    Heart,
    Hazard,
}

/// A repeating timer advanced by the level clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTimer {
    pub kind: SpawnKind,
    pub delay_ms: f64,
    pub elapsed_ms: f64,
}

impl SpawnTimer {
    pub fn new(kind: SpawnKind, delay_ms: f64) -> Self {
        Self {
            kind,
            delay_ms,
            elapsed_ms: 0.0,
        }
    }

    /// Advances the timer and returns how many times it fired.
    ///
    /// At most [`MAX_TIMER_CATCH_UP`] firings are reported per call; the backlog beyond
    /// that is dropped, keeping only the phase within the current period.
    pub fn advance(&mut self, millis: f64) -> u32 {
        if self.delay_ms <= 0.0 || !millis.is_finite() {
            return 0;
        }
        self.elapsed_ms += millis.max(0.0);
        let mut fired = 0;
        while self.elapsed_ms >= self.delay_ms && fired < MAX_TIMER_CATCH_UP {
            self.elapsed_ms -= self.delay_ms;
            fired += 1;
        }
        if self.elapsed_ms >= self.delay_ms {
            self.elapsed_ms %= self.delay_ms;
        }
        fired
    }
}

/// All spawn timers of the running level.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SpawnSchedule {
    timers: SmallVec<[SpawnTimer; 4]>,
}

impl SpawnSchedule {
    /// One timer per periodically spawned kind of the level.
    pub fn for_level(config: &LevelConfig) -> Self {
        let mut timers = SmallVec::new();
        if let GiftSupply::Stream(stream) = config.gifts {
            timers.push(SpawnTimer::new(SpawnKind::Gift, stream.delay_ms));
        }
        if let Some(armory) = config.armory {
            timers.push(SpawnTimer::new(SpawnKind::Star, armory.stars.delay_ms));
        }
        if let Some(hearts) = config.hearts {
            timers.push(SpawnTimer::new(SpawnKind::Heart, hearts.delay_ms));
        }
        if let Some(hazards) = config.hazards {
            timers.push(SpawnTimer::new(SpawnKind::Hazard, hazards.stream.delay_ms));
        }
        Self { timers }
    }

    pub fn timers(&self) -> &[SpawnTimer] {
        &self.timers
    }

    pub fn kinds(&self) -> impl Iterator<Item = SpawnKind> + '_ {
        self.timers.iter().map(|timer| timer.kind)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drops every timer; nothing fires afterwards until a new schedule is installed.
    pub fn cancel(&mut self) {
        self.timers.clear();
    }

    /// Advances all timers, returning the kinds to spawn in timer order.
    pub fn advance(&mut self, millis: f64) -> SmallVec<[SpawnKind; 4]> {
        let mut due = SmallVec::new();
        for timer in self.timers.iter_mut() {
            for _ in 0..timer.advance(millis) {
                due.push(timer.kind);
            }
        }
        due
    }
}

/// Entity factories for the running level.
///
/// Every factory is a no-op unless the level is active, so a level under shutdown
/// never resurrects entities.
#[derive(SystemParam)]
pub struct Spawner<'w, 's> {
    commands: Commands<'w, 's>,
    level: Res<'w, ActiveLevel>,
    phase: Res<'w, LevelPhase>,
    bounds: Res<'w, PlayBounds>,
    clock: Res<'w, LevelClock>,
    player: Res<'w, PlayerSnapshot>,
    rng: ResMut<'w, LevelRng>,
}

impl Spawner<'_, '_> {
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Projectile speed of the level, `None` when it has no star mechanic.
    pub fn shot_speed(&self) -> Option<f32> {
        self.level.0.armory.map(|armory| armory.shot_speed)
    }

    pub fn spawn(&mut self, kind: SpawnKind) -> Option<Entity> {
        if !self.is_active() {
            trace!(?kind, "Spawn ignored, level inactive");
            return None;
        }
        let config = self.level.0;
        let entity = match kind {
            SpawnKind::Gift => match config.gifts {
                GiftSupply::Stream(stream) => Some(self.stream_gift(stream)),
                GiftSupply::Scatter => None,
            },
            SpawnKind::Star => config
                .armory
                .map(|armory| self.pickup(EntityKind::StarPickup, armory.stars.speed)),
            SpawnKind::Heart => config.hearts.map(|hearts| self.pickup(EntityKind::HeartPickup, hearts.speed)),
            SpawnKind::Hazard => config.hazards.map(|spec| self.hazard(spec)),
        };
        if let Some(entity) = entity {
            debug!(?kind, ?entity, "Spawned");
        }
        entity
    }

    /// Places `count` motionless gifts inside the scatter field.
    pub fn scatter_field(&mut self, count: u32) -> Vec<Entity> {
        if !self.is_active() {
            return Vec::new();
        }
        let field = self.bounds.field;
        let spawned: Vec<Entity> = (0..count)
            .map(|_| {
                let position = Vec2::new(
                    self.rng.0.random_range(field.left()..=field.right()),
                    self.rng.0.random_range(field.top()..=field.bottom()),
                );
                self.gift(position, Vec2::ZERO)
            })
            .collect();
        debug!(count = spawned.len(), "Scattered gift field");
        spawned
    }

    /// A projectile leaving the player towards the right edge.
    pub fn projectile(&mut self, speed: f32) -> Option<Entity> {
        if !self.is_active() {
            return None;
        }
        let entity = self
            .commands
            .spawn(MoverBundle::new(
                EntityKind::StarProjectile,
                self.player.position,
                Vec2::new(speed, 0.0),
            ))
            .id();
        debug!(?entity, "Star projectile fired");
        Some(entity)
    }

    /// A point just beyond the right edge at a random height.
    fn entry_point(&mut self) -> Vec2 {
        let world = self.bounds.world;
        let low = world.top() + SPAWN_MARGIN_Y;
        let high = world.bottom() - SPAWN_MARGIN_Y;
        let y = if low < high {
            self.rng.0.random_range(low..=high)
        } else {
            world.center().y
        };
        Vec2::new(world.right() + SPAWN_OFFSET_X, y)
    }

    fn stream_gift(&mut self, stream: Stream) -> Entity {
        let position = self.entry_point();
        let gift = self.gift(position, Vec2::new(-stream.speed, 0.0));
        if let Some(wind) = self.level.0.gift_wind {
            self.commands.entity(gift).insert(WindDrift {
                wind,
                base_speed: stream.speed,
                next_change_at: None,
            });
        }
        gift
    }

    fn gift(&mut self, position: Vec2, velocity: Vec2) -> Entity {
        let variant = GiftVariant(self.rng.0.random_range(0..GIFT_VARIANTS));
        let gift = self
            .commands
            .spawn((MoverBundle::new(EntityKind::Gift, position, velocity), variant))
            .id();
        if self.level.0.freezes_gifts() {
            let overlay = self
                .commands
                .spawn(OverlayBundle {
                    overlay: IceOverlay { gift },
                    position: Position(position),
                    owner: LevelEntity,
                })
                .id();
            self.commands.entity(gift).insert(Frozen { overlay });
        }
        gift
    }

    fn pickup(&mut self, kind: EntityKind, speed: f32) -> Entity {
        let position = self.entry_point();
        self.commands
            .spawn(MoverBundle::new(kind, position, Vec2::new(-speed, 0.0)))
            .id()
    }

    fn hazard(&mut self, spec: HazardSpec) -> Entity {
        let position = self.entry_point();
        let aim = (self.player.position - position).to_angle();
        let angle = aim + jitter(&mut self.rng.0, spec.angle_jitter);
        let speed = spec.stream.speed + jitter(&mut self.rng.0, spec.speed_jitter);
        let hazard = self
            .commands
            .spawn(MoverBundle::new(EntityKind::Hazard, position, Vec2::from_angle(angle) * speed))
            .id();
        if let Some(wind) = spec.wind {
            self.commands.entity(hazard).insert(WindDrift {
                wind,
                base_speed: spec.stream.speed,
                next_change_at: Some(self.clock.now_ms + wind.change_interval_ms),
            });
        }
        hazard
    }
}

/// Uniform sample from `-amount..=amount`, zero when `amount` is not positive.
pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    if amount > 0.0 {
        rng.random_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Fires every spawner once at level start, and lays out the scattered field.
pub fn prime_spawners_system(schedule: Res<SpawnSchedule>, mut spawner: Spawner) {
    if let (GiftSupply::Scatter, Some(target)) = (spawner.level.0.gifts, spawner.level.0.target) {
        spawner.scatter_field(target);
    }
    for kind in schedule.kinds() {
        spawner.spawn(kind);
    }
}

/// Advances the spawn timers by the frame delta and spawns whatever is due.
pub fn spawn_timer_system(delta: Res<DeltaTime>, mut schedule: ResMut<SpawnSchedule>, mut spawner: Spawner) {
    if !spawner.is_active() {
        return;
    }
    for kind in schedule.advance(delta.millis) {
        spawner.spawn(kind);
    }
}
