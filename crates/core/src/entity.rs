//! Typed snapshots of what the agent can observe.
//!
//! The world adapter validates raw protocol data into these variants at the
//! boundary; the planner never inspects loosely-typed entity objects.

use serde::{Deserialize, Serialize};

use crate::geometry::{BlockPos, Vec3};

/// Protocol-level entity identifier.
pub type EntityId = u64;

/// An entity currently rendered around the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservedEntity {
    Player {
        id: EntityId,
        username: String,
        position: Vec3,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        velocity: Option<Vec3>,
    },
    Hostile {
        id: EntityId,
        name: String,
        position: Vec3,
        /// Remaining health, when the server reports it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        health: Option<f32>,
    },
    Item {
        id: EntityId,
        kind: String,
        position: Vec3,
    },
    Other {
        id: EntityId,
        name: String,
        position: Vec3,
    },
}

impl ObservedEntity {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Player { id, .. }
            | Self::Hostile { id, .. }
            | Self::Item { id, .. }
            | Self::Other { id, .. } => *id,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Self::Player { position, .. }
            | Self::Hostile { position, .. }
            | Self::Item { position, .. }
            | Self::Other { position, .. } => *position,
        }
    }

    /// False only when the entity reports zero (or less) health.
    pub fn is_alive(&self) -> bool {
        match self {
            Self::Hostile { health: Some(h), .. } => *h > 0.0,
            _ => true,
        }
    }
}

/// A block snapshot returned by `block_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: String,
    pub position: BlockPos,
}

impl Block {
    pub fn new(kind: impl Into<String>, position: BlockPos) -> Self {
        Self {
            kind: kind.into(),
            position,
        }
    }
}

/// A stack in the agent's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(kind: impl Into<String>, count: u32) -> Self {
        Self {
            kind: kind.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// A connected player as listed by the server, rendered or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
    #[serde(default)]
    pub ping: u32,
    #[serde(default)]
    pub gamemode: GameMode,
    #[serde(default = "default_listed")]
    pub listed: bool,
    /// Present when the player's avatar is rendered locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityId>,
}

fn default_listed() -> bool {
    true
}

impl RosterEntry {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ping: 0,
            gamemode: GameMode::default(),
            listed: true,
            entity: None,
        }
    }
}

/// The agent's own body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfState {
    pub entity_id: EntityId,
    pub position: Vec3,
    /// Heading in radians.
    pub yaw: f64,
    pub health: f32,
}
