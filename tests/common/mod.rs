#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use bevy_ecs::{entity::Entity, event::Events, world::World};
use giftfall::{
    catalog::{GiftSupply, LevelCatalog, LevelConfig, Stream},
    constants::VIEWPORT_SIZE,
    events::{EventLog, LevelEvent, Overlap, OverlapRule},
    host::{HostLink, LevelHost, PlayerHandle, Scoreboard},
    level::{Level, LevelContext},
    player::Player,
    systems::{
        ActiveLevel, DeltaTime, EntityKind, Frozen, GiftVariant, IceOverlay, LevelClock, LevelEntity, LevelPhase, LevelRng,
        MoverBundle, OverlayBundle, PlayBounds, PlayerSnapshot, Position, RunState, ShootRequest, SpawnSchedule,
    },
};
use glam::Vec2;

pub const TEST_SEED: u64 = 0x5EED;

/// A level wired to a real player, scoreboard and event log.
pub struct Harness {
    pub level: Level,
    pub player: Rc<Player>,
    pub board: Rc<RefCell<Scoreboard>>,
    pub log: EventLog,
}

impl Harness {
    pub fn new(config: LevelConfig) -> Self {
        let player = Rc::new(Player::new(VIEWPORT_SIZE * 0.5));
        let board = Scoreboard::shared();
        let log = EventLog::new();
        let level = Level::new(
            config,
            LevelContext {
                player: player.clone(),
                host: board.clone(),
                sink: Box::new(log.clone()),
                viewport: VIEWPORT_SIZE,
                seed: Some(TEST_SEED),
            },
        )
        .expect("test level should build");
        Self {
            level,
            player,
            board,
            log,
        }
    }

    pub fn standard(id: u8) -> Self {
        Self::new(standard_config(id))
    }

    /// Starts the level and discards the start-up events.
    pub fn started(mut self) -> Self {
        self.level.start().expect("level should start");
        self.log.drain();
        self
    }

    pub fn player_position(&self) -> Vec2 {
        self.player.position()
    }

    /// Spawns an entity of `kind` directly into the level, at the player's position.
    pub fn spawn_on_player(&mut self, kind: EntityKind) -> Entity {
        let position = self.player_position();
        self.level
            .world
            .spawn(MoverBundle::new(kind, position, Vec2::ZERO))
            .id()
    }

    pub fn gifts(&mut self) -> Vec<giftfall::level::EntityView> {
        self.level
            .entities()
            .into_iter()
            .filter(|view| view.kind == EntityKind::Gift)
            .collect()
    }

    pub fn lives_reported(&self) -> Vec<u32> {
        self.log
            .snapshot()
            .into_iter()
            .filter_map(|event| match event {
                LevelEvent::LivesUpdated { lives } => Some(lives),
                _ => None,
            })
            .collect()
    }

    pub fn scores_reported(&self) -> Vec<u32> {
        self.log
            .snapshot()
            .into_iter()
            .filter_map(|event| match event {
                LevelEvent::ScoreUpdated { current } => Some(current),
                _ => None,
            })
            .collect()
    }

    pub fn stars_reported(&self) -> Vec<u8> {
        self.log
            .snapshot()
            .into_iter()
            .filter_map(|event| match event {
                LevelEvent::StarsUpdated { stars } => Some(stars),
                _ => None,
            })
            .collect()
    }
}

pub fn standard_config(id: u8) -> LevelConfig {
    *LevelCatalog::standard().get(id).expect("standard level exists")
}

/// Fires only at level start, and never moves.
fn parked(_: Stream) -> Stream {
    Stream::new(1.0e9, 0.0)
}

/// A standard level whose spawners only fire once at start and whose spawns never move.
///
/// Tests place the entities they need on the player themselves.
pub fn calm(mut config: LevelConfig) -> LevelConfig {
    if let GiftSupply::Stream(stream) = config.gifts {
        config.gifts = GiftSupply::Stream(parked(stream));
    }
    config.gift_wind = None;
    if let Some(armory) = config.armory.as_mut() {
        armory.stars = parked(armory.stars);
    }
    config.hearts = config.hearts.map(parked);
    if let Some(hazards) = config.hazards.as_mut() {
        hazards.stream = parked(hazards.stream);
        hazards.angle_jitter = 0.0;
        hazards.speed_jitter = 0.0;
        hazards.wind = None;
    }
    config
}

/// Creates a world with every resource the level systems need, in the active phase.
pub fn create_test_world(config: LevelConfig) -> (World, Rc<RefCell<Scoreboard>>) {
    let mut world = World::new();
    let board = Scoreboard::shared();
    board.borrow_mut().reset(config.max_lives);

    world.insert_resource(Events::<Overlap>::default());
    world.insert_resource(Events::<LevelEvent>::default());
    world.insert_resource(ActiveLevel(config));
    world.insert_resource(LevelPhase::Active);
    world.insert_resource(RunState::fresh(config.max_lives));
    world.insert_resource(LevelClock::default());
    world.insert_resource(DeltaTime::from_millis(1000.0 / 60.0));
    world.insert_resource(PlayBounds::from_viewport(VIEWPORT_SIZE));
    world.insert_resource(PlayerSnapshot {
        position: VIEWPORT_SIZE * 0.5,
        radius: 14.0,
    });
    world.insert_resource(ShootRequest::default());
    world.insert_resource(SpawnSchedule::for_level(&config));
    world.insert_resource(LevelRng::seeded(TEST_SEED));
    world.insert_non_send_resource(HostLink(board.clone()));

    (world, board)
}

pub fn spawn_test_entity(world: &mut World, kind: EntityKind, position: Vec2, velocity: Vec2) -> Entity {
    world.spawn(MoverBundle::new(kind, position, velocity)).id()
}

/// Spawns a gift, optionally frozen with its overlay. Returns `(gift, overlay)`.
pub fn spawn_test_gift(world: &mut World, position: Vec2, frozen: bool) -> (Entity, Option<Entity>) {
    let gift = world
        .spawn((MoverBundle::new(EntityKind::Gift, position, Vec2::ZERO), GiftVariant(0)))
        .id();
    if !frozen {
        return (gift, None);
    }
    let overlay = world
        .spawn(OverlayBundle {
            overlay: IceOverlay { gift },
            position: Position(position),
            owner: LevelEntity,
        })
        .id();
    world.entity_mut(gift).insert(Frozen { overlay });
    (gift, Some(overlay))
}

pub fn send_overlap(world: &mut World, rule: OverlapRule, target: Entity, projectile: Option<Entity>) {
    world.resource_mut::<Events<Overlap>>().send(Overlap {
        rule,
        target,
        projectile,
    });
}

pub fn drain_level_events(world: &mut World) -> Vec<LevelEvent> {
    world.resource_mut::<Events<LevelEvent>>().drain().collect()
}

pub fn count_kind(world: &mut World, kind: EntityKind) -> usize {
    world
        .query::<&EntityKind>()
        .iter(world)
        .filter(|candidate| **candidate == kind)
        .count()
}

pub fn count_overlays(world: &mut World) -> usize {
    world.query::<&IceOverlay>().iter(world).count()
}
