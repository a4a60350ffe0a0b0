//! The decision engine behind brainstem.
//!
//! The engine runs four independent cycles against a [`WorldInterface`]:
//!
//! 1. **Scan**: fold the world's snapshot into short-term memory
//! 2. **Decide**: keep, preempt or replace the active task by walking an
//!    ordered rule table
//! 3. **Social**: ask the dialogue provider for an ambient line
//! 4. **Gesture**: small idle movements that never set a goal
//!
//! [`Brain`] holds all state and is driven synchronously with explicit
//! instants, which keeps it deterministic under test. [`BrainRuntime`]
//! puts it on tokio.
//!
//! [`WorldInterface`]: brainstem_core::WorldInterface

pub mod brain;
pub mod combat;
pub mod commands;
mod gestures;
pub mod planner;
pub mod runtime;
pub mod task;
pub mod tasks;
pub mod timers;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod test_helpers;

pub use brain::Brain;
pub use commands::{CommandError, CommandRegistry};
pub use planner::{Plan, RULES};
pub use runtime::{BrainHandle, BrainRuntime, RuntimeError};
pub use task::{BrainState, DialoguePurpose, DialogueRequest, Effect, Task};
pub use timers::{TaskStep, TimerAction, TimerRegistry};
