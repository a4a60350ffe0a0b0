//! Recording world double for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use brainstem_config::BrainConfig;
use brainstem_core::{
    Block, BlockPos, BlockQuery, Control, EntityId, EquipSlot, EventBus, GoalHandle, Hand,
    ItemStack, NavGoal, ObservedEntity, RosterEntry, SelfState, Vec3, WorldError, WorldInterface,
};
use tokio::time::Instant;

use crate::brain::Brain;

pub const SELF_ID: EntityId = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum WorldCall {
    SetGoal(NavGoal),
    ClearGoal,
    LookAt(Vec3),
    Attack(EntityId),
    Equip(String, EquipSlot),
    DeactivateItem,
    SetControl(Control, bool),
    ClearControls,
    SwingArm,
    Chat(String),
    Whisper(String, String),
    CancelCollect,
}

#[derive(Default)]
pub struct MockState {
    pub self_state: Option<SelfState>,
    pub entities: Vec<ObservedEntity>,
    pub roster: Vec<RosterEntry>,
    pub blocks: HashMap<BlockPos, String>,
    pub inventory: Vec<ItemStack>,
    pub goal: Option<(GoalHandle, NavGoal)>,
    pub spawn_point: Option<Vec3>,
    pub calls: Vec<WorldCall>,
    next_goal: u64,
}

pub struct MockWorld {
    username: String,
    state: Mutex<MockState>,
}

impl MockWorld {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.into(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Alive with full health at `position`.
    pub fn standing_at(username: &str, position: Vec3) -> Self {
        let world = Self::new(username);
        world.state().self_state = Some(SelfState {
            entity_id: SELF_ID,
            position,
            yaw: 0.0,
            health: 20.0,
        });
        world
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_health(&self, health: f32) {
        if let Some(me) = self.state().self_state.as_mut() {
            me.health = health;
        }
    }

    pub fn add_entity(&self, entity: ObservedEntity) {
        self.state().entities.push(entity);
    }

    pub fn remove_entity(&self, id: EntityId) {
        self.state().entities.retain(|e| e.id() != id);
    }

    pub fn add_player(&self, id: EntityId, username: &str, position: Vec3) {
        self.add_entity(ObservedEntity::Player {
            id,
            username: username.into(),
            position,
            velocity: None,
        });
        let mut entry = RosterEntry::new(username);
        entry.entity = Some(id);
        self.state().roster.push(entry);
    }

    pub fn add_remote_player(&self, username: &str) {
        self.state().roster.push(RosterEntry::new(username));
    }

    pub fn add_hostile(&self, id: EntityId, name: &str, position: Vec3) {
        self.add_entity(ObservedEntity::Hostile {
            id,
            name: name.into(),
            position,
            health: Some(20.0),
        });
    }

    pub fn set_block(&self, position: BlockPos, kind: &str) {
        self.state().blocks.insert(position, kind.into());
    }

    pub fn give(&self, item: &str) {
        self.state().inventory.push(ItemStack::new(item, 1));
    }

    /// The pathfinder reached its target and dropped the goal.
    pub fn arrive(&self) {
        self.state().goal = None;
    }

    pub fn calls(&self) -> Vec<WorldCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn chat_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WorldCall::Chat(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn goal(&self) -> Option<NavGoal> {
        self.state().goal.map(|(_, g)| g)
    }

    fn record(&self, call: WorldCall) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl WorldInterface for MockWorld {
    fn username(&self) -> &str {
        &self.username
    }

    fn self_state(&self) -> Option<SelfState> {
        self.state().self_state
    }

    fn entities(&self) -> Vec<ObservedEntity> {
        self.state().entities.clone()
    }

    fn entity(&self, id: EntityId) -> Option<ObservedEntity> {
        self.state().entities.iter().find(|e| e.id() == id).cloned()
    }

    fn roster(&self) -> Vec<RosterEntry> {
        self.state().roster.clone()
    }

    fn block_at(&self, pos: BlockPos) -> Option<Block> {
        self.state()
            .blocks
            .get(&pos)
            .map(|kind| Block::new(kind.clone(), pos))
    }

    fn find_blocks(&self, query: &BlockQuery) -> Vec<BlockPos> {
        let state = self.state();
        let Some(me) = state.self_state.map(|s| s.position) else {
            return Vec::new();
        };
        let mut found: Vec<BlockPos> = state
            .blocks
            .iter()
            .filter(|(pos, kind)| {
                query.matches(kind) && pos.center().distance_to(&me) <= query.max_distance
            })
            .map(|(pos, _)| *pos)
            .collect();
        found.sort_by(|a, b| {
            a.center()
                .distance_squared(&me)
                .total_cmp(&b.center().distance_squared(&me))
        });
        found.truncate(query.count);
        found
    }

    fn inventory(&self) -> Vec<ItemStack> {
        self.state().inventory.clone()
    }

    fn spawn_point(&self) -> Option<Vec3> {
        self.state().spawn_point
    }

    fn current_goal(&self) -> Option<GoalHandle> {
        self.state().goal.map(|(h, _)| h)
    }

    fn set_goal(&self, goal: NavGoal) -> Result<GoalHandle, WorldError> {
        let mut state = self.state();
        state.next_goal += 1;
        let handle = GoalHandle(state.next_goal);
        state.goal = Some((handle, goal));
        state.calls.push(WorldCall::SetGoal(goal));
        Ok(handle)
    }

    fn clear_goal(&self) {
        let mut state = self.state();
        state.goal = None;
        state.calls.push(WorldCall::ClearGoal);
    }

    fn look_at(&self, target: Vec3) -> Result<(), WorldError> {
        self.record(WorldCall::LookAt(target));
        Ok(())
    }

    fn attack(&self, target: EntityId) -> Result<(), WorldError> {
        self.record(WorldCall::Attack(target));
        Ok(())
    }

    fn equip(&self, item: &str, slot: EquipSlot) -> Result<(), WorldError> {
        self.record(WorldCall::Equip(item.into(), slot));
        Ok(())
    }

    fn deactivate_item(&self) {
        self.record(WorldCall::DeactivateItem);
    }

    fn set_control(&self, control: Control, active: bool) {
        self.record(WorldCall::SetControl(control, active));
    }

    fn clear_controls(&self) {
        self.record(WorldCall::ClearControls);
    }

    fn swing_arm(&self, _hand: Hand) {
        self.record(WorldCall::SwingArm);
    }

    fn chat(&self, text: &str) -> Result<(), WorldError> {
        self.record(WorldCall::Chat(text.into()));
        Ok(())
    }

    fn whisper(&self, username: &str, text: &str) -> Result<(), WorldError> {
        self.record(WorldCall::Whisper(username.into(), text.into()));
        Ok(())
    }

    async fn collect_block(&self, _pos: BlockPos) -> Result<(), WorldError> {
        Ok(())
    }

    fn cancel_collect(&self) {
        self.record(WorldCall::CancelCollect);
    }
}

/// Config with idle behaviors switched off so planning is deterministic.
pub fn quiet_config() -> BrainConfig {
    let mut config = BrainConfig::default();
    config.idle.observation_chance = 0.0;
    config.idle.stroll_chance = 0.0;
    config
}

pub fn brain_with(world: &Arc<MockWorld>, config: BrainConfig, now: Instant) -> Brain {
    let world: Arc<dyn WorldInterface> = Arc::clone(world) as Arc<dyn WorldInterface>;
    Brain::with_seed(config, world, Arc::new(EventBus::default()), now, 7)
}
