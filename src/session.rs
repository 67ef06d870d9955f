//! The orchestrator: owns the player, the counters, progress and the active level.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use tracing::{debug, info};

use crate::catalog::{LevelCatalog, Mechanics, ALL_LEVELS_UNLOCKED};
use crate::constants::VIEWPORT_SIZE;
use crate::error::{GameResult, LevelError};
use crate::events::{EventLog, EventSink, LevelEvent};
use crate::host::{LevelHost, Scoreboard};
use crate::level::{Level, LevelContext};
use crate::player::Player;
use crate::progress::Progress;
use crate::systems::{DeltaTime, PlayBounds};

/// Input sampled by the host for one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SessionInput {
    /// Desired movement direction; normalized before use.
    pub direction: Vec2,
    /// Whether the shoot button is currently held.
    pub shoot: bool,
}

pub struct GameSession {
    catalog: LevelCatalog,
    progress: Progress,
    player: Rc<Player>,
    scoreboard: Rc<RefCell<Scoreboard>>,
    outbox: EventLog,
    presenter: Box<dyn EventSink>,
    level: Option<Level>,
    viewport: Vec2,
    seed: Option<u64>,
    runs: u64,
    shoot_held: bool,
    finished: bool,
}

impl GameSession {
    pub fn new(progress: Progress, presenter: Box<dyn EventSink>) -> Self {
        Self {
            catalog: LevelCatalog::standard(),
            progress,
            player: Rc::new(Player::new(VIEWPORT_SIZE * 0.5)),
            scoreboard: Scoreboard::shared(),
            outbox: EventLog::new(),
            presenter,
            level: None,
            viewport: VIEWPORT_SIZE,
            seed: None,
            runs: 0,
            shoot_held: false,
            finished: false,
        }
    }

    pub fn with_catalog(mut self, catalog: LevelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Makes every level run reproducible; each run derives its own seed from this one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Tears down the current level, if any, and starts level `id`.
    ///
    /// # Errors
    ///
    /// Fails with [`LevelError::UnknownLevel`] for ids outside the catalog and with
    /// [`LevelError::Locked`] for levels the player has not unlocked yet.
    pub fn start_level(&mut self, id: u8) -> GameResult<()> {
        let config = *self.catalog.get(id)?;
        if !self.progress.is_unlocked(id) {
            return Err(LevelError::Locked {
                requested: id,
                unlocked: self.progress.unlocked(),
            }
            .into());
        }

        self.end_level();
        self.player.place(self.viewport * 0.5);
        self.shoot_held = false;
        self.finished = false;

        let seed = self.seed.map(|seed| seed.wrapping_add(self.runs));
        self.runs += 1;
        let mut level = Level::new(
            config,
            LevelContext {
                player: self.player.clone(),
                host: self.scoreboard.clone(),
                sink: Box::new(self.outbox.clone()),
                viewport: self.viewport,
                seed,
            },
        )?;
        level.start()?;
        self.level = Some(level);
        info!(level = id, "Session started level");
        self.relay();
        Ok(())
    }

    /// Moves the player, forwards input and advances the active level by one frame.
    pub fn tick(&mut self, delta_ms: f64, input: SessionInput) -> GameResult<()> {
        let level = self.level.as_mut().ok_or(LevelError::NotStarted)?;

        let seconds = DeltaTime::clamped(delta_ms).seconds;
        self.player.step(input.direction, seconds, &level.bounds().world);

        // Holding the button fires once; it has to be released before the next shot.
        if input.shoot && !self.shoot_held {
            level.request_shoot();
        }
        self.shoot_held = input.shoot;

        level.update(delta_ms);
        self.relay();
        Ok(())
    }

    /// Destroys the active level, if any.
    pub fn end_level(&mut self) {
        if let Some(mut level) = self.level.take() {
            level.destroy();
            self.relay_from(level.id(), level.elapsed_ms());
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        if let Some(level) = self.level.as_mut() {
            level.resize(width, height);
        }
        let world = PlayBounds::from_viewport(self.viewport).world;
        self.player.step(Vec2::ZERO, 0.0, &world);
    }

    fn relay(&mut self) {
        let Some((id, elapsed_ms)) = self.level.as_ref().map(|level| (level.id(), level.elapsed_ms())) else {
            return;
        };
        self.relay_from(id, elapsed_ms);
    }

    /// Hands queued level events to the presenter and applies their progress effects.
    fn relay_from(&mut self, level_id: u8, elapsed_ms: f64) {
        for event in self.outbox.drain() {
            self.presenter.emit(&event);
            self.finished |= event.is_terminal();
            match event {
                LevelEvent::LevelCompleted { level } => {
                    let next = self.catalog.next_after(level).unwrap_or(ALL_LEVELS_UNLOCKED);
                    self.progress.unlock_level(next);
                }
                LevelEvent::GameOver => {
                    let records = self
                        .catalog
                        .get(level_id)
                        .is_ok_and(|config| config.mechanics.contains(Mechanics::RECORDS_BONUS));
                    if records {
                        let gifts = self.scoreboard.borrow().score();
                        let seconds = (elapsed_ms / 1000.0).floor() as u32;
                        let record = self.progress.record_bonus(gifts, seconds);
                        debug!(gifts, seconds, ?record, "Endurance run recorded");
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether the current run has reported its completion or game over.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.level.as_mut()
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn score(&self) -> u32 {
        self.scoreboard.borrow().score()
    }

    pub fn lives(&self) -> u32 {
        self.scoreboard.borrow().lives()
    }
}
