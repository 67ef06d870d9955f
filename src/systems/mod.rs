//! The Entity-Component-System (ECS) module.
//!
//! This module contains all the ECS-related logic of a level run: components,
//! resources, and the systems scheduled by [`crate::level::Level`].

pub mod collision;
pub mod components;
pub mod cull;
pub mod movement;
pub mod resolve;
pub mod shoot;
pub mod spawn;
pub mod state;
pub mod wind;

pub use self::collision::*;
pub use self::components::*;
pub use self::cull::*;
pub use self::movement::*;
pub use self::resolve::*;
pub use self::shoot::*;
pub use self::spawn::*;
pub use self::state::*;
pub use self::wind::*;
