use bevy_ecs::system::{Query, Res, ResMut};
use glam::Vec2;
use rand::Rng;
use tracing::trace;

use crate::catalog::Wind;
use crate::constants::{WIND_CLAMP_MARGIN, WIND_REROLL_JITTER_MS};
use crate::systems::components::{LevelClock, LevelRng, PlayBounds, Position, Velocity, WindDrift};
use crate::systems::spawn::jitter;

/// Draws a fresh wind velocity and the time of the following re-roll.
///
/// The returned timestamp is always strictly after `now_ms` as long as the wind
/// interval exceeds [`WIND_REROLL_JITTER_MS`], which catalog validation enforces.
pub fn reroll<R: Rng + ?Sized>(wind: &Wind, base_speed: f32, now_ms: f64, rng: &mut R) -> (Vec2, f64) {
    let y = if wind.y_min < wind.y_max {
        rng.random_range(wind.y_min..=wind.y_max)
    } else {
        wind.y_min
    };
    let x = -(base_speed + jitter(rng, wind.x_jitter));
    let offset = rng.random_range(-WIND_REROLL_JITTER_MS..=WIND_REROLL_JITTER_MS);
    (Vec2::new(x, y), now_ms + wind.change_interval_ms + offset)
}

/// Keeps `position` between `top` and `bottom`, turning the vertical velocity back
/// into the play area when an edge is reached.
pub fn clamp_and_reflect(position: &mut Vec2, velocity: &mut Vec2, top: f32, bottom: f32) -> bool {
    if position.y < top {
        position.y = top;
        velocity.y = velocity.y.abs();
        true
    } else if position.y > bottom {
        position.y = bottom;
        velocity.y = -velocity.y.abs();
        true
    } else {
        false
    }
}

/// Re-rolls the velocity of every drifting entity whose change time has passed.
pub fn wind_system(clock: Res<LevelClock>, mut rng: ResMut<LevelRng>, mut drifting: Query<(&mut Velocity, &mut WindDrift)>) {
    let now = clock.now_ms;
    for (mut velocity, mut drift) in drifting.iter_mut() {
        if !drift.is_due(now) {
            continue;
        }
        let (next_velocity, next_change_at) = reroll(&drift.wind, drift.base_speed, now, &mut rng.0);
        velocity.0 = next_velocity;
        drift.next_change_at = Some(next_change_at);
        trace!(velocity = ?next_velocity, next_change_at, "Wind re-rolled");
    }
}

/// Bounces drifting entities off the top and bottom margins of the world.
pub fn wind_clamp_system(bounds: Res<PlayBounds>, mut drifting: Query<(&mut Position, &mut Velocity, &WindDrift)>) {
    let top = bounds.world.top() + WIND_CLAMP_MARGIN;
    let bottom = bounds.world.bottom() - WIND_CLAMP_MARGIN;
    if top > bottom {
        return;
    }
    for (mut position, mut velocity, _) in drifting.iter_mut() {
        clamp_and_reflect(&mut position.0, &mut velocity.0, top, bottom);
    }
}
