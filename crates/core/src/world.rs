//! World Interface trait — the engine's only window into the game.
//!
//! Snapshot accessors are synchronous and cheap. Commands are
//! fire-and-forget: the brain logs failures and moves on, it never retries
//! or propagates them. The one long-running operation, block collection, is
//! async and cancellable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::{Block, EntityId, ItemStack, ObservedEntity, RosterEntry, SelfState};
use crate::error::WorldError;
use crate::geometry::{BlockPos, Vec3};

/// Opaque identity of a navigation goal, used to check "is this still my goal".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoalHandle(pub u64);

/// A navigation request for the pathfinder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavGoal {
    /// Get within `range` of a fixed point. Cleared by the pathfinder on arrival.
    Near { target: Vec3, range: f64 },
    /// Keep within `range` of a moving entity until replaced.
    Follow { entity: EntityId, range: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    Hand,
    OffHand,
}

/// "Find blocks matching predicate within radius".
#[derive(Debug, Clone, PartialEq)]
pub struct BlockQuery {
    pub kinds: Vec<String>,
    pub max_distance: f64,
    pub count: usize,
}

impl BlockQuery {
    pub fn matches(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }
}

/// The game-side collaborator.
///
/// Implementations: a protocol adapter in production, `brainstem-sim` for
/// offline runs, recording mocks in tests.
#[async_trait]
pub trait WorldInterface: Send + Sync {
    /// The agent's own username, used to filter self-observations.
    fn username(&self) -> &str;

    /// The agent's body, `None` before spawn or while dead.
    fn self_state(&self) -> Option<SelfState>;

    /// Every entity currently rendered (excluding the agent itself).
    fn entities(&self) -> Vec<ObservedEntity>;

    fn entity(&self, id: EntityId) -> Option<ObservedEntity>;

    /// All connected players, rendered or not.
    fn roster(&self) -> Vec<RosterEntry>;

    fn block_at(&self, pos: BlockPos) -> Option<Block>;

    fn find_blocks(&self, query: &BlockQuery) -> Vec<BlockPos>;

    fn inventory(&self) -> Vec<ItemStack>;

    fn spawn_point(&self) -> Option<Vec3> {
        None
    }

    fn current_goal(&self) -> Option<GoalHandle>;

    fn set_goal(&self, goal: NavGoal) -> Result<GoalHandle, WorldError>;

    fn clear_goal(&self);

    fn look_at(&self, target: Vec3) -> Result<(), WorldError>;

    fn attack(&self, target: EntityId) -> Result<(), WorldError>;

    fn equip(&self, item: &str, slot: EquipSlot) -> Result<(), WorldError>;

    /// Stop using the held item (lower a raised shield, stop eating).
    fn deactivate_item(&self);

    fn set_control(&self, control: Control, active: bool);

    fn clear_controls(&self);

    fn swing_arm(&self, hand: Hand);

    fn chat(&self, text: &str) -> Result<(), WorldError>;

    fn whisper(&self, username: &str, text: &str) -> Result<(), WorldError>;

    /// Walk to and break the block, picking up the drop.
    async fn collect_block(&self, pos: BlockPos) -> Result<(), WorldError>;

    /// Abort an in-flight `collect_block`.
    fn cancel_collect(&self);
}
