//! # Brainstem Core
//!
//! Domain types, collaborator traits, and error definitions for the Brainstem
//! decision engine. Every other crate in the workspace depends inward on this
//! one.
//!
//! ## Collaborators
//!
//! The engine never talks to a game server or a language model directly.
//! Both sit behind traits defined here:
//! - [`WorldInterface`] — snapshots of the world plus fire-and-forget commands
//! - [`DialogueProvider`] — `(prompt, context) -> text`, allowed to fail
//!
//! Implementations live elsewhere (`brainstem-sim`, `brainstem-providers`,
//! or a real protocol adapter), which keeps the planner testable with mocks.

pub mod dialogue;
pub mod entity;
pub mod error;
pub mod event;
pub mod geometry;
pub mod task;
pub mod world;

// Re-export key types at crate root for ergonomics
pub use dialogue::DialogueProvider;
pub use entity::{Block, EntityId, GameMode, ItemStack, ObservedEntity, RosterEntry, SelfState};
pub use error::{DialogueError, Error, Result, WorldError};
pub use event::{BrainEvent, EndReason, EventBus, WorldEvent};
pub use geometry::{BlockPos, Vec3};
pub use task::TaskKind;
pub use world::{BlockQuery, Control, EquipSlot, GoalHandle, Hand, NavGoal, WorldInterface};
