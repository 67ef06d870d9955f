use giftfall::catalog::LevelConfig;
use giftfall::constants::VIEWPORT_SIZE;
use giftfall::error::{ConfigError, GameError};
use giftfall::events::{EventLog, FeedbackCue, LevelEvent};
use giftfall::host::{LevelHost, Scoreboard};
use giftfall::level::{Level, LevelContext};
use giftfall::player::Player;
use giftfall::systems::{EntityKind, LevelPhase};
use glam::Vec2;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;
use std::rc::Rc;

mod common;

use common::Harness;

const FRAME_MS: f64 = 16.0;

fn build(config: LevelConfig) -> Result<Level, GameError> {
    Level::new(
        config,
        LevelContext {
            player: Rc::new(Player::new(VIEWPORT_SIZE * 0.5)),
            host: Scoreboard::shared(),
            sink: Box::new(EventLog::new()),
            viewport: VIEWPORT_SIZE,
            seed: Some(common::TEST_SEED),
        },
    )
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = common::standard_config(4);
    config.max_lives = 0;
    let result = build(config);
    assert!(matches!(
        result,
        Err(GameError::Config(ConfigError::HazardsWithoutLives { level: 4 }))
    ));
}

#[test]
fn test_nothing_happens_before_start() {
    let mut harness = Harness::standard(4);
    for _ in 0..100 {
        harness.level.update(FRAME_MS);
    }
    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::Idle);
    assert_that(&harness.level.entities().len()).is_equal_to(0);
    assert_that(&harness.log.is_empty()).is_true();
}

#[test]
fn test_census_counts_every_kind() {
    let mut harness = Harness::standard(7).started();
    assert_eq!(
        harness.level.census(),
        vec![
            (EntityKind::Gift, 1),
            (EntityKind::Hazard, 1),
            (EntityKind::StarPickup, 1),
            (EntityKind::HeartPickup, 1),
            (EntityKind::StarProjectile, 0),
        ]
    );
}

#[test]
fn test_start_reports_level_and_ammo() {
    let mut harness = Harness::standard(5);
    harness.level.start().expect("level should start");

    assert_eq!(
        harness.log.drain(),
        vec![LevelEvent::LevelStarted { level: 5 }, LevelEvent::StarsUpdated { stars: 0 }]
    );
    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::Active);

    let mut plain = Harness::standard(2);
    plain.level.start().expect("level should start");
    assert_eq!(plain.log.drain(), vec![LevelEvent::LevelStarted { level: 2 }]);
}

#[test]
fn test_scatter_level_completes_at_target() {
    let mut harness = Harness::standard(1).started();
    assert_that(&harness.gifts().len()).is_equal_to(10);

    for _ in 0..20 {
        let Some(gift) = harness.gifts().first().copied() else {
            break;
        };
        harness.player.place(gift.position);
        harness.level.update(FRAME_MS);
    }

    assert_eq!(harness.scores_reported(), (1..=10).collect::<Vec<u32>>());
    assert_that(&harness.log.count("level-completed")).is_equal_to(1);
    assert_that(&harness.log.snapshot().last().copied()).is_equal_to(Some(LevelEvent::LevelCompleted { level: 1 }));
    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::Completed);
    assert_that(&harness.board.borrow().score()).is_equal_to(10);
}

#[test]
fn test_stream_level_spawns_on_timers() {
    let mut harness = Harness::standard(2).started();
    assert_that(&harness.level.count(EntityKind::Gift)).is_equal_to(1);

    // 1400ms of frames: two more gifts, nothing culled yet.
    for _ in 0..100 {
        harness.level.update(14.0);
    }
    assert_that(&harness.level.count(EntityKind::Gift)).is_equal_to(3);
    assert_that(&harness.level.elapsed_ms()).is_equal_to(1400.0);
}

#[test]
fn test_hazards_end_the_game() {
    let mut harness = Harness::new(common::calm(common::standard_config(4))).started();

    for _ in 0..3 {
        harness.spawn_on_player(EntityKind::Hazard);
        harness.level.update(500.0);
    }

    assert_eq!(harness.lives_reported(), vec![2, 1, 0]);
    assert_that(&harness.log.count("game-over")).is_equal_to(1);
    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::GameOver);
    assert_that(&harness.level.entities().len()).is_equal_to(0);

    // Finished levels ignore further updates.
    harness.log.drain();
    harness.level.update(500.0);
    assert_that(&harness.log.is_empty()).is_true();
}

#[test]
fn test_hit_cooldown_window() {
    let mut harness = Harness::new(common::calm(common::standard_config(4))).started();

    harness.spawn_on_player(EntityKind::Hazard);
    harness.level.update(16.0);
    harness.spawn_on_player(EntityKind::Hazard);
    harness.level.update(100.0);
    harness.spawn_on_player(EntityKind::Hazard);
    harness.level.update(400.0);

    assert_that(&harness.level.elapsed_ms()).is_equal_to(516.0);
    assert_eq!(harness.lives_reported(), vec![2, 1]);
    assert_that(&harness.level.run_state().last_hit_at).is_equal_to(Some(516.0));
    // Only the hazard thrown at start is left.
    assert_that(&harness.level.count(EntityKind::Hazard)).is_equal_to(1);
}

#[test]
fn test_completion_wins_over_fatal_hit() {
    let mut config = common::calm(common::standard_config(4));
    config.target = Some(1);
    config.max_lives = 1;
    let mut harness = Harness::new(config).started();

    harness.spawn_on_player(EntityKind::Hazard);
    harness.spawn_on_player(EntityKind::Gift);
    harness.level.update(FRAME_MS);

    assert_eq!(
        harness.log.snapshot(),
        vec![LevelEvent::ScoreUpdated { current: 1 }, LevelEvent::LevelCompleted { level: 4 }]
    );
    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::Completed);
    assert_that(&harness.board.borrow().lives()).is_equal_to(1);
}

#[test]
fn test_star_ammo_and_shooting() {
    let mut harness = Harness::new(common::calm(common::standard_config(5))).started();

    // No ammo: nothing is fired.
    harness.level.request_shoot();
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.count(EntityKind::StarProjectile)).is_equal_to(0);
    assert_that(&harness.log.is_empty()).is_true();

    for _ in 0..6 {
        harness.spawn_on_player(EntityKind::StarPickup);
    }
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.star_ammo()).is_equal_to(5);
    assert_eq!(harness.stars_reported(), vec![1, 2, 3, 4, 5, 5]);

    harness.log.drain();
    harness.level.request_shoot();
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.star_ammo()).is_equal_to(4);
    assert_that(&harness.level.count(EntityKind::StarProjectile)).is_equal_to(1);
    assert_eq!(
        harness.log.drain(),
        vec![LevelEvent::StarsUpdated { stars: 4 }, LevelEvent::Cue(FeedbackCue::StarShot)]
    );

    // One request, one projectile.
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.count(EntityKind::StarProjectile)).is_equal_to(1);
}

#[test]
fn test_shooting_without_star_mechanic_is_ignored() {
    let mut harness = Harness::new(common::calm(common::standard_config(4))).started();
    harness.level.request_shoot();
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.count(EntityKind::StarProjectile)).is_equal_to(0);
}

#[test]
fn test_frozen_gift_must_be_thawed_before_collection() {
    let mut harness = Harness::new(common::calm(common::standard_config(5))).started();
    let origin = harness.player_position();
    let (gift, _) = common::spawn_test_gift(&mut harness.level.world, origin + Vec2::new(60.0, 0.0), true);

    harness.spawn_on_player(EntityKind::StarPickup);
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.star_ammo()).is_equal_to(1);

    // Touching the frozen gift does nothing.
    harness.player.place(origin + Vec2::new(60.0, 0.0));
    harness.level.update(FRAME_MS);
    assert_that(&harness.scores_reported().len()).is_equal_to(0);

    let ice_broken = LevelEvent::Cue(FeedbackCue::IceBroken);
    harness.player.place(origin);
    harness.level.request_shoot();
    for _ in 0..20 {
        harness.level.update(FRAME_MS);
        if harness.log.snapshot().contains(&ice_broken) {
            break;
        }
    }
    let thawed = harness
        .level
        .entities()
        .into_iter()
        .find(|view| view.entity == gift)
        .expect("gift survives the shot");
    assert_that(&thawed.frozen).is_false();
    assert_that(&harness.log.snapshot().contains(&ice_broken)).is_true();
    assert_that(&harness.level.count(EntityKind::StarProjectile)).is_equal_to(0);
    // The gift primed at start is still frozen.
    assert_that(&harness.level.overlay_count()).is_equal_to(1);

    harness.player.place(thawed.position);
    harness.level.update(FRAME_MS);
    assert_eq!(harness.scores_reported(), vec![1]);
}

#[test]
fn test_destroy_is_idempotent() {
    let mut harness = Harness::standard(7).started();
    harness.level.update(FRAME_MS);
    assert_that(&harness.level.entities().is_empty()).is_false();

    harness.level.destroy();
    harness.level.destroy();

    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::TornDown);
    assert_that(&harness.level.entities().len()).is_equal_to(0);
    assert_that(&harness.level.overlay_count()).is_equal_to(0);

    for _ in 0..200 {
        harness.level.update(FRAME_MS);
    }
    assert_that(&harness.level.entities().len()).is_equal_to(0);
}

#[test]
fn test_restart_resets_the_run() {
    let mut harness = Harness::new(common::calm(common::standard_config(4))).started();
    harness.spawn_on_player(EntityKind::Hazard);
    harness.level.update(FRAME_MS);
    assert_that(&harness.board.borrow().lives()).is_equal_to(2);

    harness.level.start().expect("level should restart");

    assert_that(&harness.level.phase()).is_equal_to(LevelPhase::Active);
    assert_that(&harness.board.borrow().lives()).is_equal_to(3);
    assert_that(&harness.level.lives()).is_equal_to(3);
    assert_that(&harness.level.elapsed_ms()).is_equal_to(0.0);
    assert_that(&harness.level.run_state().last_hit_at).is_none();
    assert_that(&harness.level.count(EntityKind::Hazard)).is_equal_to(1);
}

#[test]
fn test_resize_moves_spawn_edge() {
    let mut harness = Harness::standard(2).started();
    harness.level.resize(1280.0, 720.0);
    let bounds = harness.level.bounds();
    assert_that(&bounds.world.right()).is_equal_to(1280.0 - 32.0);

    for _ in 0..50 {
        harness.level.update(14.0);
    }
    let newest = harness
        .gifts()
        .into_iter()
        .map(|view| view.position.x)
        .fold(f32::MIN, f32::max);
    assert_that(&(newest > 960.0)).is_true();
}
