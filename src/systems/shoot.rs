use bevy_ecs::event::EventWriter;
use bevy_ecs::system::ResMut;
use tracing::trace;

use crate::events::{FeedbackCue, LevelEvent};
use crate::systems::components::ShootRequest;
use crate::systems::spawn::Spawner;
use crate::systems::state::RunState;

/// Turns a latched shoot request into one projectile, paying one star for it.
///
/// The ammo check, the decrement and the spawn happen in this one system, so no
/// projectile is ever created while ammo is zero.
pub fn shoot_system(
    mut request: ResMut<ShootRequest>,
    mut run: ResMut<RunState>,
    mut spawner: Spawner,
    mut events: EventWriter<LevelEvent>,
) {
    if !request.take() {
        return;
    }
    let Some(shot_speed) = spawner.shot_speed() else {
        return;
    };
    if run.star_ammo == 0 {
        trace!("Shoot requested without ammo");
        return;
    }
    if spawner.projectile(shot_speed).is_none() {
        return;
    }
    run.star_ammo -= 1;
    events.write(LevelEvent::StarsUpdated { stars: run.star_ammo });
    events.write(FeedbackCue::StarShot.into());
}
