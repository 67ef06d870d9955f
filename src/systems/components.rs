use bevy_ecs::{bundle::Bundle, component::Component, entity::Entity, resource::Resource};
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::catalog::{LevelConfig, Wind};
use crate::constants::{collider, FIELD_INSET, FIELD_MIN_SIZE, MAX_FRAME_MS, WORLD_INSET};

/// A tag component denoting the kind of a spawned entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum EntityKind {
    Gift,
    Hazard,
    StarPickup,
    HeartPickup,
    StarProjectile,
}

impl EntityKind {
    pub fn collider_radius(&self) -> f32 {
        match self {
            EntityKind::Gift => collider::GIFT,
            EntityKind::Hazard => collider::HAZARD,
            EntityKind::StarPickup => collider::STAR_PICKUP,
            EntityKind::HeartPickup => collider::HEART_PICKUP,
            EntityKind::StarProjectile => collider::STAR_PROJECTILE,
        }
    }

    pub fn is_pickup(&self) -> bool {
        matches!(self, EntityKind::StarPickup | EntityKind::HeartPickup)
    }

    /// Kinds that only ever drift leftwards and are culled past the left edge.
    pub fn drifts_left(&self) -> bool {
        matches!(self, EntityKind::Gift | EntityKind::StarPickup | EntityKind::HeartPickup)
    }
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec2);

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec2);

/// Circular collision shape.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f32,
}

impl Collider {
    /// Two circles overlap when their centers are closer than the sum of the radii.
    pub fn overlaps(&self, position: Vec2, other_radius: f32, other_position: Vec2) -> bool {
        let reach = self.radius + other_radius;
        position.distance_squared(other_position) < reach * reach
    }
}

/// A gift encased in ice. The player cannot collect it until it is thawed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frozen {
    pub overlay: Entity,
}

/// The visual ice block tracking a frozen gift.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IceOverlay {
    pub gift: Entity,
}

/// Periodic velocity re-roll state.
///
/// `next_change_at` of `None` means the first re-roll happens on the next frame.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WindDrift {
    pub wind: Wind,
    pub base_speed: f32,
    pub next_change_at: Option<f64>,
}

impl WindDrift {
    pub fn is_due(&self, now_ms: f64) -> bool {
        self.next_change_at.is_none_or(|at| now_ms >= at)
    }
}

/// Appearance index for the renderer, in `0..GIFT_VARIANTS`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiftVariant(pub u8);

/// Marks every entity owned by the running level, overlays included.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct LevelEntity;

#[derive(Bundle)]
pub struct MoverBundle {
    pub kind: EntityKind,
    pub position: Position,
    pub velocity: Velocity,
    pub collider: Collider,
    pub owner: LevelEntity,
}

impl MoverBundle {
    pub fn new(kind: EntityKind, position: Vec2, velocity: Vec2) -> Self {
        Self {
            kind,
            position: Position(position),
            velocity: Velocity(velocity),
            collider: Collider {
                radius: kind.collider_radius(),
            },
            owner: LevelEntity,
        }
    }
}

#[derive(Bundle)]
pub struct OverlayBundle {
    pub overlay: IceOverlay,
    pub position: Position,
    pub owner: LevelEntity,
}

/// Axis-aligned rectangle, y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    pub fn left(&self) -> f32 {
        self.min.x
    }

    pub fn right(&self) -> f32 {
        self.max.x
    }

    pub fn top(&self) -> f32 {
        self.min.y
    }

    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Shrinks every edge by `amount`, collapsing to the center if that would invert it.
    pub fn inset(&self, amount: f32) -> Bounds {
        let min = self.min + Vec2::splat(amount);
        let max = self.max - Vec2::splat(amount);
        let center = self.center();
        Bounds {
            min: min.min(center),
            max: max.max(center),
        }
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    pub fn contains_with_margin(&self, point: Vec2, margin: f32) -> bool {
        point.cmpge(self.min - Vec2::splat(margin)).all() && point.cmple(self.max + Vec2::splat(margin)).all()
    }
}

/// Playable areas derived from the viewport.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayBounds {
    /// The physics world: spawning, culling and wind clamping are relative to it.
    pub world: Bounds,
    /// Region for statically scattered gifts.
    pub field: Bounds,
}

impl PlayBounds {
    pub fn from_viewport(viewport: Vec2) -> Self {
        let world = Bounds::new(Vec2::splat(WORLD_INSET), (viewport - Vec2::splat(WORLD_INSET * 2.0)).max(Vec2::ZERO));
        let field_size = (viewport - Vec2::splat(FIELD_INSET * 2.0)).max(Vec2::splat(FIELD_MIN_SIZE));
        let field = Bounds::new(Vec2::splat(FIELD_INSET), field_size);
        Self { world, field }
    }
}

/// Frame delta, in both units the systems need.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct DeltaTime {
    pub seconds: f32,
    pub millis: f64,
}

impl DeltaTime {
    pub fn from_millis(millis: f64) -> Self {
        Self {
            seconds: (millis / 1000.0) as f32,
            millis,
        }
    }

    /// Frame time bounded to `0..=MAX_FRAME_MS`; anything non-finite is an empty frame.
    pub fn clamped(millis: f64) -> Self {
        let millis = if millis.is_finite() { millis.clamp(0.0, MAX_FRAME_MS) } else { 0.0 };
        Self::from_millis(millis)
    }
}

/// Monotonic level clock, in milliseconds since the level started.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelClock {
    pub now_ms: f64,
}

/// The configuration of the running level.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ActiveLevel(pub LevelConfig);

/// Copy of the shared player's collider, refreshed before every tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec2,
    pub radius: f32,
}

/// Latched shoot input; consumed by at most one projectile per tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShootRequest(pub bool);

impl ShootRequest {
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }
}

/// Randomness source for a single level run.
#[derive(Resource, Debug)]
pub struct LevelRng(pub SmallRng);

impl LevelRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(SmallRng::from_os_rng())
    }
}
