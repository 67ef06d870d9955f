use std::cell::RefCell;
use std::rc::Rc;

use bevy_ecs::prelude::*;
use strum_macros::IntoStaticStr;

/// Presentation cues reported next to the gameplay events (sound, flashes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum FeedbackCue {
    StarPicked,
    HeartPicked,
    StarShot,
    IceBroken,
    /// A non-fatal hazard hit; the renderer flashes the camera for `flash_ms`.
    HazardHit { flash_ms: u32 },
}

/// Events a level reports to the outside world.
///
/// Delivery is fire-and-forget: they are queued during a tick and handed to the
/// level's [`EventSink`] once the tick has finished.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum LevelEvent {
    LevelStarted { level: u8 },
    ScoreUpdated { current: u32 },
    LivesUpdated { lives: u32 },
    StarsUpdated { stars: u8 },
    LevelCompleted { level: u8 },
    GameOver,
    Cue(FeedbackCue),
}

impl LevelEvent {
    /// The wire name of the event, e.g. `score-updated`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LevelEvent::LevelCompleted { .. } | LevelEvent::GameOver)
    }
}

impl From<FeedbackCue> for LevelEvent {
    fn from(cue: FeedbackCue) -> Self {
        LevelEvent::Cue(cue)
    }
}

/// Receiver of reported level events.
pub trait EventSink {
    fn emit(&mut self, event: &LevelEvent);
}

/// A cloneable, shared event recorder.
///
/// All clones append to the same buffer, so one handle can be given to a level
/// while another is kept to inspect or drain what was reported.
#[derive(Clone, Default, Debug)]
pub struct EventLog(Rc<RefCell<Vec<LevelEvent>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<LevelEvent> {
        self.0.borrow().clone()
    }

    pub fn drain(&self) -> Vec<LevelEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Number of recorded events with the given wire name.
    pub fn count(&self, name: &str) -> usize {
        self.0.borrow().iter().filter(|event| event.name() == name).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &LevelEvent) {
        self.0.borrow_mut().push(*event);
    }
}

/// The pairing that produced an [`Overlap`], in resolution priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, IntoStaticStr)]
pub enum OverlapRule {
    PlayerPickup,
    PlayerGift,
    PlayerHazard,
    ProjectileGift,
    ProjectileHazard,
}

/// A detected overlap for the current frame.
///
/// Player overlaps carry no `projectile`; the player is not an entity of the level.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
    pub rule: OverlapRule,
    pub target: Entity,
    pub projectile: Option<Entity>,
}
