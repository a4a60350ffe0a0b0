//! Event types flowing into and out of the brain.
//!
//! [`WorldEvent`]s are delivered by the world adapter. [`BrainEvent`]s are
//! published by the brain on an [`EventBus`] so observers (the CLI, tests)
//! can follow task transitions without coupling to the engine internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::entity::{Block, ObservedEntity, RosterEntry};
use crate::geometry::Vec3;
use crate::task::TaskKind;

/// Everything the world adapter reports to the brain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The agent entered the world (first spawn or respawn).
    Spawned,
    /// The agent itself took damage.
    SelfHurt,
    EntitySpawned { entity: ObservedEntity },
    EntityGone { entity: ObservedEntity },
    BlockUpdated {
        old: Option<Block>,
        new: Option<Block>,
    },
    PlayerJoined { entry: RosterEntry },
    PlayerUpdated { entry: RosterEntry },
    PlayerLeft { username: String },
    /// Someone picked up an item at `position`.
    PlayerCollected { collector: String, position: Vec3 },
    Chat { username: String, message: String },
    Whisper { username: String, message: String },
    HealthChanged { health: f32 },
    Died,
    Disconnected { reason: String },
}

/// Why a task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    PredicateFailed,
    TimedOut,
    Switching,
    Paused,
    Died,
    Completed,
    Failed,
    Shutdown,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PredicateFailed => "predicate failed",
            Self::TimedOut => "task timeout",
            Self::Switching => "switching",
            Self::Paused => "paused",
            Self::Died => "died",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Observable brain activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BrainEvent {
    /// A task became the active task and issued its commands.
    TaskEngaged {
        task_id: u64,
        kind: TaskKind,
        target: String,
        timestamp: DateTime<Utc>,
    },

    /// A task ran its cleanup.
    TaskEnded {
        task_id: u64,
        kind: TaskKind,
        reason: EndReason,
        timestamp: DateTime<Utc>,
    },

    /// Autonomy was suspended.
    Paused {
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// An ambient chat line was sent.
    Socialized {
        line: String,
        timestamp: DateTime<Utc>,
    },

    /// A chat command was handled.
    CommandHandled {
        name: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// The agent died and the brain reset.
    Died { timestamp: DateTime<Utc> },
}

/// A broadcast-based event bus for brain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<BrainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: BrainEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BrainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
