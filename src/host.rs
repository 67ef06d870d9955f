//! The narrow interfaces a level consumes from its orchestrator.
//!
//! A level never owns the player or the score/lives counters; it reads the player
//! through [`PlayerHandle`] and mutates counters only through [`LevelHost`].

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use tracing::trace;

/// Read-only view of the shared player.
pub trait PlayerHandle {
    fn position(&self) -> Vec2;
    fn radius(&self) -> f32;
}

/// Score and lives bookkeeping owned by the orchestrator.
pub trait LevelHost {
    /// Prepares the counters for a fresh level run.
    fn reset(&mut self, lives: u32);
    /// Adds to the score and returns the new total.
    fn add_score(&mut self, amount: u32) -> u32;
    /// Removes one life and returns the lives remaining.
    fn lose_life(&mut self) -> u32;
    /// Adds lives up to `cap` and returns the lives now held.
    fn add_life(&mut self, amount: u32, cap: u32) -> u32;
    fn lives(&self) -> u32;
    fn score(&self) -> u32;
}

pub type SharedPlayer = Rc<dyn PlayerHandle>;
pub type SharedHost = Rc<RefCell<dyn LevelHost>>;

/// Non-send world resource giving systems access to the host.
pub struct HostLink(pub SharedHost);

impl HostLink {
    pub fn add_score(&self, amount: u32) -> u32 {
        self.0.borrow_mut().add_score(amount)
    }

    pub fn lose_life(&self) -> u32 {
        self.0.borrow_mut().lose_life()
    }

    pub fn add_life(&self, amount: u32, cap: u32) -> u32 {
        self.0.borrow_mut().add_life(amount, cap)
    }
}

/// The default [`LevelHost`]: plain counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    score: u32,
    lives: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Scoreboard>> {
        Rc::new(RefCell::new(Self::new()))
    }
}

impl LevelHost for Scoreboard {
    fn reset(&mut self, lives: u32) {
        self.score = 0;
        self.lives = lives;
    }

    fn add_score(&mut self, amount: u32) -> u32 {
        self.score = self.score.saturating_add(amount);
        trace!(score = self.score, amount, "Score added");
        self.score
    }

    fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    fn add_life(&mut self, amount: u32, cap: u32) -> u32 {
        self.lives = self.lives.saturating_add(amount).min(cap);
        self.lives
    }

    fn lives(&self) -> u32 {
        self.lives
    }

    fn score(&self) -> u32 {
        self.score
    }
}
