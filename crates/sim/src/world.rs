//! A flat, seeded world with just enough physics to exercise the brain.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use brainstem_core::{
    Block, BlockPos, BlockQuery, Control, EntityId, EquipSlot, GoalHandle, Hand, ItemStack,
    NavGoal, ObservedEntity, RosterEntry, SelfState, Vec3, WorldError, WorldEvent,
    WorldInterface,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

pub const SELF_ID: EntityId = 1;
pub const GROUND_Y: f64 = 64.0;

const MAX_HEALTH: f32 = 20.0;
const RENDER_DISTANCE: f64 = 64.0;

const WALK_SPEED: f64 = 4.3;
const SPRINT_FACTOR: f64 = 1.3;
const PLAYER_SPEED: f64 = 1.4;
const PLAYER_HOME_RADIUS: f64 = 40.0;
const PLAYER_TURN_PER_SEC: f64 = 0.3;

const HOSTILE_SPEED: f64 = 2.0;
const HOSTILE_SIGHT: f64 = 16.0;
const HOSTILE_REACH: f64 = 1.5;
const HOSTILE_DAMAGE: f32 = 2.0;
const HOSTILE_ATTACK_MS: u64 = 1_000;
const HOSTILE_HEALTH: f32 = 20.0;
const HOSTILE_SPAWN_PER_SEC: f64 = 0.02;
const MAX_HOSTILES: usize = 3;

const ATTACK_REACH: f64 = 3.5;
const PICKUP_RANGE: f64 = 1.0;

const DEFAULT_COLLECT_DELAY: Duration = Duration::from_millis(1_500);

/// Damage dealt by the held item.
fn melee_damage(held: Option<&str>) -> f32 {
    match held {
        Some(item) if item.ends_with("_sword") => 6.0,
        Some(item) if item.ends_with("_axe") => 5.0,
        Some("trident") => 6.0,
        _ => 1.0,
    }
}

/// Step from `from` toward `to`, stopping `keep` short of it.
fn approach(from: Vec3, to: Vec3, distance: f64, keep: f64) -> Vec3 {
    let gap = from.distance_to(&to);
    if gap <= keep || gap == 0.0 {
        return from;
    }
    let travel = distance.min(gap - keep);
    let t = travel / gap;
    Vec3::new(
        from.x + (to.x - from.x) * t,
        from.y + (to.y - from.y) * t,
        from.z + (to.z - from.z) * t,
    )
}

fn heading(from: Vec3, to: Vec3) -> f64 {
    (to.z - from.z).atan2(to.x - from.x)
}

struct SimPlayer {
    id: EntityId,
    username: String,
    position: Vec3,
    heading: f64,
}

struct SimHostile {
    id: EntityId,
    name: String,
    position: Vec3,
    health: f32,
    last_attack_ms: u64,
}

struct SimItem {
    id: EntityId,
    kind: String,
    position: Vec3,
}

struct SimState {
    rng: StdRng,
    clock_ms: u64,
    me: Option<SelfState>,
    spawn: Vec3,
    inventory: Vec<ItemStack>,
    held: Option<String>,
    goal: Option<(GoalHandle, NavGoal)>,
    next_goal: u64,
    next_entity: EntityId,
    controls: HashSet<Control>,
    players: Vec<SimPlayer>,
    players_wander: bool,
    hostiles: Vec<SimHostile>,
    hostiles_spawn: bool,
    items: Vec<SimItem>,
    blocks: HashMap<BlockPos, String>,
    collect_generation: u64,
    outbox: Vec<WorldEvent>,
    said: Vec<String>,
}

impl SimState {
    fn new(seed: u64) -> Self {
        let spawn = Vec3::new(0.0, GROUND_Y, 0.0);
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock_ms: 0,
            me: Some(SelfState {
                entity_id: SELF_ID,
                position: spawn,
                yaw: 0.0,
                health: MAX_HEALTH,
            }),
            spawn,
            inventory: Vec::new(),
            held: None,
            goal: None,
            next_goal: 0,
            next_entity: 100,
            controls: HashSet::new(),
            players: Vec::new(),
            players_wander: false,
            hostiles: Vec::new(),
            hostiles_spawn: false,
            items: Vec::new(),
            blocks: HashMap::new(),
            collect_generation: 0,
            outbox: Vec::new(),
            said: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_entity += 1;
        self.next_entity
    }

    fn my_position(&self) -> Option<Vec3> {
        self.me.map(|me| me.position)
    }

    fn is_rendered(&self, position: &Vec3) -> bool {
        self.my_position()
            .is_none_or(|me| me.distance_to(position) <= RENDER_DISTANCE)
    }

    fn observe(&self) -> Vec<ObservedEntity> {
        let players = self.players.iter().map(|p| ObservedEntity::Player {
            id: p.id,
            username: p.username.clone(),
            position: p.position,
            velocity: None,
        });
        let hostiles = self.hostiles.iter().map(|h| ObservedEntity::Hostile {
            id: h.id,
            name: h.name.clone(),
            position: h.position,
            health: Some(h.health),
        });
        let items = self.items.iter().map(|i| ObservedEntity::Item {
            id: i.id,
            kind: i.kind.clone(),
            position: i.position,
        });
        players
            .chain(hostiles)
            .chain(items)
            .filter(|e| self.is_rendered(&e.position()))
            .collect()
    }

    fn entity_position(&self, id: EntityId) -> Option<Vec3> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.position)
            .or_else(|| self.hostiles.iter().find(|h| h.id == id).map(|h| h.position))
            .or_else(|| self.items.iter().find(|i| i.id == id).map(|i| i.position))
    }

    fn add_to_inventory(&mut self, kind: &str) {
        match self.inventory.iter_mut().find(|s| s.kind == kind) {
            Some(stack) => stack.count += 1,
            None => self.inventory.push(ItemStack::new(kind, 1)),
        }
    }

    fn install_goal(&mut self, goal: NavGoal) -> GoalHandle {
        self.next_goal += 1;
        let handle = GoalHandle(self.next_goal);
        self.goal = Some((handle, goal));
        handle
    }

    fn move_agent(&mut self, dt: f64) {
        let Some(mut me) = self.me else {
            return;
        };
        let target = match self.goal.map(|(_, goal)| goal) {
            Some(NavGoal::Near { target, range }) => Some((target, range, true)),
            Some(NavGoal::Follow { entity, range }) => match self.entity_position(entity) {
                Some(position) => Some((position, range, false)),
                None => {
                    debug!(entity, "Follow target vanished, dropping goal");
                    self.goal = None;
                    None
                }
            },
            None => None,
        };

        match target {
            Some((target, range, clear_on_arrival)) => {
                if me.position.distance_to(&target) > range {
                    let next = approach(me.position, target, WALK_SPEED * dt, 0.0);
                    if next != me.position {
                        me.yaw = heading(me.position, next);
                        me.position = next;
                    }
                }
                if clear_on_arrival && me.position.distance_to(&target) <= range {
                    self.goal = None;
                }
            }
            None => {
                let mut speed = 0.0;
                if self.controls.contains(&Control::Forward) {
                    speed = WALK_SPEED;
                    if self.controls.contains(&Control::Sprint) {
                        speed *= SPRINT_FACTOR;
                    }
                }
                if speed > 0.0 {
                    me.position = me.position.along_yaw(me.yaw, speed * dt, 0.0);
                }
                let strafe = match (
                    self.controls.contains(&Control::Left),
                    self.controls.contains(&Control::Right),
                ) {
                    (true, false) => Some(-std::f64::consts::FRAC_PI_2),
                    (false, true) => Some(std::f64::consts::FRAC_PI_2),
                    _ => None,
                };
                if let Some(turn) = strafe {
                    me.position = me.position.along_yaw(me.yaw + turn, WALK_SPEED * 0.5 * dt, 0.0);
                }
            }
        }
        self.me = Some(me);
    }

    fn pick_up_items(&mut self) {
        let Some(me) = self.my_position() else {
            return;
        };
        let (picked, kept): (Vec<SimItem>, Vec<SimItem>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| item.position.distance_to(&me) <= PICKUP_RANGE);
        self.items = kept;
        for item in picked {
            self.add_to_inventory(&item.kind);
            self.outbox.push(WorldEvent::EntityGone {
                entity: ObservedEntity::Item {
                    id: item.id,
                    kind: item.kind,
                    position: item.position,
                },
            });
        }
    }

    fn wander_players(&mut self, dt: f64) {
        if !self.players_wander {
            return;
        }
        let turn_chance = (PLAYER_TURN_PER_SEC * dt).clamp(0.0, 1.0);
        for player in &mut self.players {
            if player.position.horizontal_distance(&self.spawn) > PLAYER_HOME_RADIUS {
                player.heading = heading(player.position, self.spawn);
            } else if self.rng.random_bool(turn_chance) {
                player.heading = self.rng.random_range(0.0..TAU);
            }
            player.position = player.position.along_yaw(player.heading, PLAYER_SPEED * dt, 0.0);
        }
    }

    fn advance_hostiles(&mut self, dt: f64) {
        let Some(me) = self.me.as_mut() else {
            return;
        };
        let mut died = false;
        for hostile in &mut self.hostiles {
            let gap = hostile.position.distance_to(&me.position);
            if gap > HOSTILE_SIGHT {
                continue;
            }
            hostile.position = approach(hostile.position, me.position, HOSTILE_SPEED * dt, HOSTILE_REACH);
            let in_reach = hostile.position.distance_to(&me.position) <= HOSTILE_REACH;
            if in_reach && self.clock_ms.saturating_sub(hostile.last_attack_ms) >= HOSTILE_ATTACK_MS {
                hostile.last_attack_ms = self.clock_ms;
                me.health = (me.health - HOSTILE_DAMAGE).max(0.0);
                self.outbox.push(WorldEvent::SelfHurt);
                self.outbox.push(WorldEvent::HealthChanged { health: me.health });
                if me.health <= 0.0 {
                    died = true;
                    break;
                }
            }
        }
        if died {
            self.die_and_respawn();
        }
    }

    fn die_and_respawn(&mut self) {
        info!("Agent died in the simulation, respawning");
        self.outbox.push(WorldEvent::Died);
        self.goal = None;
        self.controls.clear();
        self.held = None;
        self.collect_generation += 1;
        self.me = Some(SelfState {
            entity_id: SELF_ID,
            position: self.spawn,
            yaw: 0.0,
            health: MAX_HEALTH,
        });
        self.outbox.push(WorldEvent::Spawned);
    }

    fn maybe_spawn_hostile(&mut self, dt: f64) {
        if !self.hostiles_spawn || self.hostiles.len() >= MAX_HOSTILES {
            return;
        }
        let Some(me) = self.my_position() else {
            return;
        };
        if !self.rng.random_bool((HOSTILE_SPAWN_PER_SEC * dt).clamp(0.0, 1.0)) {
            return;
        }
        let angle = self.rng.random_range(0.0..TAU);
        let distance = self.rng.random_range(14.0..20.0);
        let position = Vec3::new(me.x, GROUND_Y, me.z).along_yaw(angle, distance, 0.0);
        self.insert_hostile("Zombie", position);
    }

    fn insert_hostile(&mut self, name: &str, position: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.hostiles.push(SimHostile {
            id,
            name: name.into(),
            position,
            health: HOSTILE_HEALTH,
            last_attack_ms: 0,
        });
        self.outbox.push(WorldEvent::EntitySpawned {
            entity: ObservedEntity::Hostile {
                id,
                name: name.into(),
                position,
                health: Some(HOSTILE_HEALTH),
            },
        });
        id
    }
}

/// In-process world implementing [`WorldInterface`].
///
/// Time only moves when [`SimWorld::step`] is called, and all randomness
/// comes from the seed, so two worlds built the same way and stepped the
/// same way produce the same events.
pub struct SimWorld {
    username: String,
    collect_delay: Duration,
    state: Mutex<SimState>,
}

impl SimWorld {
    /// An empty flat world with the agent standing at the origin.
    pub fn new(username: impl Into<String>, seed: u64) -> Self {
        Self {
            username: username.into(),
            collect_delay: DEFAULT_COLLECT_DELAY,
            state: Mutex::new(SimState::new(seed)),
        }
    }

    /// A small populated scene: two wandering players nearby, one far away,
    /// a hostile, trees, ore and a dropped item.
    pub fn demo(username: impl Into<String>, seed: u64) -> Self {
        let world = Self::new(username, seed);
        world.give("stone_sword");
        world.spawn_player("alex", Vec3::new(9.0, GROUND_Y, 4.0));
        world.spawn_player("sam", Vec3::new(-12.0, GROUND_Y, 7.0));
        world.spawn_player("steve", Vec3::new(180.0, 70.0, -90.0));
        world.spawn_hostile("Zombie", Vec3::new(15.0, GROUND_Y, -10.0));
        world.drop_item("bread", Vec3::new(4.0, GROUND_Y, -3.0));
        for z in [6, 7, 8] {
            world.place_block(BlockPos::new(-6, 64, z), "oak_log");
        }
        world.place_block(BlockPos::new(5, 62, 12), "coal_ore");
        world.place_block(BlockPos::new(6, 61, 12), "iron_ore");
        world.place_block(BlockPos::new(-3, 64, -8), "crafting_table");
        {
            let mut state = world.state();
            state.players_wander = true;
            state.hostiles_spawn = true;
        }
        world
    }

    pub fn with_collect_delay(mut self, delay: Duration) -> Self {
        self.collect_delay = delay;
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Advance the world by `dt` and return what happened.
    pub fn step(&self, dt: Duration) -> Vec<WorldEvent> {
        let mut state = self.state();
        let seconds = dt.as_secs_f64();
        state.clock_ms += dt.as_millis() as u64;
        state.move_agent(seconds);
        state.pick_up_items();
        state.wander_players(seconds);
        state.advance_hostiles(seconds);
        state.maybe_spawn_hostile(seconds);
        std::mem::take(&mut state.outbox)
    }

    pub fn clock_ms(&self) -> u64 {
        self.state().clock_ms
    }

    // ── Scene setup ───────────────────────────────────────────────────

    pub fn spawn_player(&self, username: &str, position: Vec3) -> EntityId {
        let mut state = self.state();
        let id = state.allocate_id();
        let heading = state.rng.random_range(0.0..TAU);
        state.players.push(SimPlayer {
            id,
            username: username.into(),
            position,
            heading,
        });
        let rendered = state.is_rendered(&position);
        let mut entry = RosterEntry::new(username);
        entry.entity = rendered.then_some(id);
        state.outbox.push(WorldEvent::PlayerJoined { entry });
        if rendered {
            state.outbox.push(WorldEvent::EntitySpawned {
                entity: ObservedEntity::Player {
                    id,
                    username: username.into(),
                    position,
                    velocity: None,
                },
            });
        }
        id
    }

    pub fn remove_player(&self, username: &str) {
        let mut state = self.state();
        state.players.retain(|p| p.username != username);
        state.outbox.push(WorldEvent::PlayerLeft {
            username: username.into(),
        });
    }

    pub fn spawn_hostile(&self, name: &str, position: Vec3) -> EntityId {
        self.state().insert_hostile(name, position)
    }

    pub fn drop_item(&self, kind: &str, position: Vec3) -> EntityId {
        let mut state = self.state();
        let id = state.allocate_id();
        state.items.push(SimItem {
            id,
            kind: kind.into(),
            position,
        });
        state.outbox.push(WorldEvent::EntitySpawned {
            entity: ObservedEntity::Item {
                id,
                kind: kind.into(),
                position,
            },
        });
        id
    }

    pub fn place_block(&self, position: BlockPos, kind: &str) {
        let mut state = self.state();
        let old = state
            .blocks
            .insert(position, kind.into())
            .map(|previous| Block::new(previous, position));
        state.outbox.push(WorldEvent::BlockUpdated {
            old,
            new: Some(Block::new(kind, position)),
        });
    }

    pub fn give(&self, item: &str) {
        self.state().add_to_inventory(item);
    }

    pub fn set_health(&self, health: f32) {
        let mut state = self.state();
        if let Some(me) = state.me.as_mut() {
            me.health = health.clamp(0.0, MAX_HEALTH);
        }
        state.outbox.push(WorldEvent::HealthChanged { health });
    }

    /// A player types in public chat.
    pub fn player_says(&self, username: &str, message: &str) {
        self.state().outbox.push(WorldEvent::Chat {
            username: username.into(),
            message: message.into(),
        });
    }

    /// A player whispers to the agent.
    pub fn player_whispers(&self, username: &str, message: &str) {
        self.state().outbox.push(WorldEvent::Whisper {
            username: username.into(),
            message: message.into(),
        });
    }

    pub fn disconnect(&self, reason: &str) {
        self.state().outbox.push(WorldEvent::Disconnected {
            reason: reason.into(),
        });
    }

    // ── Inspection ────────────────────────────────────────────────────

    pub fn position(&self) -> Option<Vec3> {
        self.state().my_position()
    }

    pub fn health(&self) -> Option<f32> {
        self.state().me.map(|me| me.health)
    }

    pub fn inventory_count(&self, kind: &str) -> u32 {
        self.state()
            .inventory
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.count)
            .sum()
    }

    pub fn hostile_count(&self) -> usize {
        self.state().hostiles.len()
    }

    pub fn held_item(&self) -> Option<String> {
        self.state().held.clone()
    }

    pub fn active_controls(&self) -> Vec<Control> {
        self.state().controls.iter().copied().collect()
    }

    /// Every line the agent sent, whispers prefixed with `/msg <user>`.
    pub fn said(&self) -> Vec<String> {
        self.state().said.clone()
    }
}

#[async_trait]
impl WorldInterface for SimWorld {
    fn username(&self) -> &str {
        &self.username
    }

    fn self_state(&self) -> Option<SelfState> {
        self.state().me
    }

    fn entities(&self) -> Vec<ObservedEntity> {
        self.state().observe()
    }

    fn entity(&self, id: EntityId) -> Option<ObservedEntity> {
        self.state().observe().into_iter().find(|e| e.id() == id)
    }

    fn roster(&self) -> Vec<RosterEntry> {
        let state = self.state();
        state
            .players
            .iter()
            .map(|p| {
                let mut entry = RosterEntry::new(p.username.clone());
                entry.ping = 40;
                entry.entity = state.is_rendered(&p.position).then_some(p.id);
                entry
            })
            .collect()
    }

    fn block_at(&self, pos: BlockPos) -> Option<Block> {
        self.state()
            .blocks
            .get(&pos)
            .map(|kind| Block::new(kind.clone(), pos))
    }

    fn find_blocks(&self, query: &BlockQuery) -> Vec<BlockPos> {
        let state = self.state();
        let Some(me) = state.my_position() else {
            return Vec::new();
        };
        let mut found: Vec<(f64, BlockPos)> = state
            .blocks
            .iter()
            .filter(|(_, kind)| query.matches(kind))
            .map(|(pos, _)| (pos.center().distance_to(&me), *pos))
            .filter(|(distance, _)| *distance <= query.max_distance)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().take(query.count).map(|(_, pos)| pos).collect()
    }

    fn inventory(&self) -> Vec<ItemStack> {
        self.state().inventory.clone()
    }

    fn spawn_point(&self) -> Option<Vec3> {
        Some(self.state().spawn)
    }

    fn current_goal(&self) -> Option<GoalHandle> {
        self.state().goal.map(|(handle, _)| handle)
    }

    fn set_goal(&self, goal: NavGoal) -> Result<GoalHandle, WorldError> {
        let mut state = self.state();
        if state.me.is_none() {
            return Err(WorldError::NoPosition);
        }
        if let NavGoal::Follow { entity, .. } = goal {
            if state.entity_position(entity).is_none() {
                return Err(WorldError::command("set_goal", format!("unknown entity {entity}")));
            }
        }
        Ok(state.install_goal(goal))
    }

    fn clear_goal(&self) {
        self.state().goal = None;
    }

    fn look_at(&self, target: Vec3) -> Result<(), WorldError> {
        let mut state = self.state();
        let me = state.me.as_mut().ok_or(WorldError::NoPosition)?;
        me.yaw = heading(me.position, target);
        Ok(())
    }

    fn attack(&self, target: EntityId) -> Result<(), WorldError> {
        let mut state = self.state();
        let me = state.my_position().ok_or(WorldError::NoPosition)?;
        let damage = melee_damage(state.held.as_deref());
        let index = state
            .hostiles
            .iter()
            .position(|h| h.id == target)
            .ok_or_else(|| WorldError::command("attack", format!("no hostile {target}")))?;
        if state.hostiles[index].position.distance_to(&me) > ATTACK_REACH {
            return Err(WorldError::command("attack", "target out of reach"));
        }

        state.hostiles[index].health -= damage;
        if state.hostiles[index].health <= 0.0 {
            let dead = state.hostiles.remove(index);
            debug!(name = %dead.name, id = dead.id, "Hostile killed");
            state.outbox.push(WorldEvent::EntityGone {
                entity: ObservedEntity::Hostile {
                    id: dead.id,
                    name: dead.name,
                    position: dead.position,
                    health: Some(0.0),
                },
            });
        }
        Ok(())
    }

    fn equip(&self, item: &str, slot: EquipSlot) -> Result<(), WorldError> {
        let mut state = self.state();
        if !state.inventory.iter().any(|s| s.kind == item && s.count > 0) {
            return Err(WorldError::command("equip", format!("no {item} in inventory")));
        }
        if slot == EquipSlot::Hand {
            state.held = Some(item.into());
        }
        Ok(())
    }

    fn deactivate_item(&self) {}

    fn set_control(&self, control: Control, active: bool) {
        let mut state = self.state();
        if active {
            state.controls.insert(control);
        } else {
            state.controls.remove(&control);
        }
    }

    fn clear_controls(&self) {
        self.state().controls.clear();
    }

    fn swing_arm(&self, _hand: Hand) {}

    fn chat(&self, text: &str) -> Result<(), WorldError> {
        info!(username = %self.username, "<chat> {text}");
        self.state().said.push(text.into());
        Ok(())
    }

    fn whisper(&self, username: &str, text: &str) -> Result<(), WorldError> {
        info!(to = %username, "<whisper> {text}");
        self.state().said.push(format!("/msg {username} {text}"));
        Ok(())
    }

    async fn collect_block(&self, pos: BlockPos) -> Result<(), WorldError> {
        let generation = {
            let mut state = self.state();
            if state.me.is_none() {
                return Err(WorldError::NoPosition);
            }
            if !state.blocks.contains_key(&pos) {
                return Err(WorldError::CollectFailed {
                    position: pos.to_string(),
                    reason: "no block there".into(),
                });
            }
            state.collect_generation += 1;
            state.collect_generation
        };

        tokio::time::sleep(self.collect_delay).await;

        let mut state = self.state();
        if state.collect_generation != generation {
            return Err(WorldError::Cancelled);
        }
        let kind = state.blocks.remove(&pos).ok_or_else(|| WorldError::CollectFailed {
            position: pos.to_string(),
            reason: "block vanished".into(),
        })?;
        state.add_to_inventory(&kind);
        state.outbox.push(WorldEvent::BlockUpdated {
            old: Some(Block::new(kind, pos)),
            new: None,
        });
        Ok(())
    }

    fn cancel_collect(&self) {
        self.state().collect_generation += 1;
    }
}
