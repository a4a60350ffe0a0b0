//! # Brainstem Sim
//!
//! A deterministic stand-in for a game server. [`SimWorld`] implements
//! [`WorldInterface`](brainstem_core::WorldInterface) over a flat world with
//! walking players, hostiles that chase and bite, blocks that can be
//! collected and items that are picked up on contact.
//!
//! Nothing moves until [`SimWorld::step`] is called. [`spawn_driver`] calls it
//! on an interval and forwards the resulting events to a brain runtime.

pub mod driver;
pub mod world;

pub use driver::spawn_driver;
pub use world::{GROUND_Y, SELF_ID, SimWorld};
