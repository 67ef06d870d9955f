//! Simulation core of a side-scrolling gift collection game.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod events;
pub mod formatter;
pub mod host;
pub mod level;
pub mod player;
pub mod progress;
pub mod session;
pub mod systems;
