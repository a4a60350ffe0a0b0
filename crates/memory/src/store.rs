//! The decaying observation store.
//!
//! All mutation goes through `&mut self` on the brain's single owner task,
//! so no locking happens here. Every entry carries the [`Instant`] it was
//! last refreshed; [`WorldMemory::forget_stale`] drops whatever outlived its
//! TTL and is called before every scan and every planning cycle.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use brainstem_config::MemoryConfig;
use brainstem_core::{Block, BlockPos, EntityId, GameMode, ObservedEntity, RosterEntry, Vec3};
use serde::Serialize;
use tokio::time::Instant;

use crate::catalog::{ResourceCategory, classify_resource};
use crate::hints::{mentions_follow_request, parse_coordinates};

const MAX_RESOURCE_TARGETS: usize = 12;
const MAX_POIS: usize = 6;
/// POIs closer than this to a new one are replaced by it.
const POI_MERGE_DISTANCE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSighting {
    pub entity_id: EntityId,
    pub position: Vec3,
    pub velocity: Option<Vec3>,
    pub last_seen: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteHint {
    pub position: Vec3,
    /// The chat line the position came from.
    pub source: String,
    pub noted_at: Instant,
}

/// A player who is connected but whose avatar is not rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteContact {
    pub ping: u32,
    pub gamemode: GameMode,
    pub listed: bool,
    pub last_heard_at: Instant,
    pub hint: Option<RemoteHint>,
    pub last_seek_at: Option<Instant>,
    pub last_seek_target: Option<Vec3>,
}

impl RemoteContact {
    fn from_entry(entry: &RosterEntry, now: Instant) -> Self {
        Self {
            ping: entry.ping,
            gamemode: entry.gamemode,
            listed: entry.listed,
            last_heard_at: now,
            hint: None,
            last_seek_at: None,
            last_seek_target: None,
        }
    }

    fn refresh(&mut self, entry: &RosterEntry, now: Instant) {
        self.ping = entry.ping;
        self.gamemode = entry.gamemode;
        self.listed = entry.listed;
        self.last_heard_at = now;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostileSighting {
    pub name: String,
    pub position: Vec3,
    pub last_seen: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSighting {
    pub kind: String,
    pub position: Vec3,
    pub last_seen: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTarget {
    pub position: BlockPos,
    pub block_kind: String,
    pub category: ResourceCategory,
    pub priority: u8,
    pub noted_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub position: Vec3,
    pub description: String,
    pub noted_at: Instant,
}

/// Entry counts, for status output and debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemorySummary {
    pub players: usize,
    pub remote_players: usize,
    pub hostiles: usize,
    pub items: usize,
    pub resource_targets: usize,
    pub pois: usize,
}

/// Everything the agent currently remembers about its surroundings.
#[derive(Debug)]
pub struct WorldMemory {
    config: MemoryConfig,
    self_name: String,
    players: HashMap<String, PlayerSighting>,
    remote_players: HashMap<String, RemoteContact>,
    hostiles: HashMap<EntityId, HostileSighting>,
    items: HashMap<EntityId, ItemSighting>,
    resource_targets: Vec<ResourceTarget>,
    pois: VecDeque<PointOfInterest>,
}

fn expired(since: Instant, now: Instant, ttl_ms: u64) -> bool {
    now.saturating_duration_since(since) >= Duration::from_millis(ttl_ms)
}

impl WorldMemory {
    pub fn new(config: MemoryConfig, self_name: impl Into<String>) -> Self {
        Self {
            config,
            self_name: self_name.into(),
            players: HashMap::new(),
            remote_players: HashMap::new(),
            hostiles: HashMap::new(),
            items: HashMap::new(),
            resource_targets: Vec::new(),
            pois: VecDeque::new(),
        }
    }

    fn is_self(&self, username: &str) -> bool {
        username == self.self_name
    }

    // ── Players ───────────────────────────────────────────────────────

    /// Upsert a rendered player. Promotes the player out of the remote map.
    pub fn remember_player(
        &mut self,
        username: &str,
        entity_id: EntityId,
        position: Vec3,
        velocity: Option<Vec3>,
        now: Instant,
    ) {
        if self.is_self(username) {
            return;
        }
        self.promote_player(username);
        self.players.insert(
            username.to_string(),
            PlayerSighting {
                entity_id,
                position,
                velocity,
                last_seen: now,
            },
        );
    }

    /// Drop the remote contact for a player whose avatar is now rendered.
    pub fn promote_player(&mut self, username: &str) -> Option<RemoteContact> {
        let contact = self.remote_players.remove(username);
        if contact.is_some() {
            tracing::debug!(player = username, "Remote contact came into view");
        }
        contact
    }

    /// Move a player who left render range, but is still connected, to the
    /// remote map.
    pub fn demote_player(&mut self, entry: &RosterEntry, now: Instant) {
        if self.is_self(&entry.username) {
            return;
        }
        if self.players.remove(&entry.username).is_some() {
            tracing::debug!(player = %entry.username, "Player left render range");
        }
        self.note_roster(entry, now);
    }

    /// Refresh (or create) the remote contact for a connected player that
    /// is not rendered.
    pub fn note_roster(&mut self, entry: &RosterEntry, now: Instant) {
        if self.is_self(&entry.username) || self.players.contains_key(&entry.username) {
            return;
        }
        self.remote_players
            .entry(entry.username.clone())
            .and_modify(|c| c.refresh(entry, now))
            .or_insert_with(|| RemoteContact::from_entry(entry, now));
    }

    /// The player disconnected: forget them entirely.
    pub fn player_left(&mut self, username: &str) {
        self.players.remove(username);
        self.remote_players.remove(username);
    }

    pub fn player(&self, username: &str) -> Option<&PlayerSighting> {
        self.players.get(username)
    }

    pub fn players(&self) -> impl Iterator<Item = (&str, &PlayerSighting)> {
        self.players.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn nearest_player(&self, from: &Vec3) -> Option<(&str, &PlayerSighting)> {
        self.players()
            .min_by(|a, b| a.1.position.distance_squared(from).total_cmp(&b.1.position.distance_squared(from)))
    }

    /// The largest set of rendered players that all stand within `radius`
    /// of one member, if it has at least `min_size` members.
    pub fn visible_cluster(&self, radius: f64, min_size: usize) -> Option<Vec<(&str, &PlayerSighting)>> {
        let radius_sq = radius * radius;
        let mut best: Vec<(&str, &PlayerSighting)> = Vec::new();
        for (_, center) in self.players() {
            let mut members: Vec<(&str, &PlayerSighting)> = self
                .players()
                .filter(|(_, p)| p.position.distance_squared(&center.position) <= radius_sq)
                .collect();
            if members.len() > best.len() {
                members.sort_by(|a, b| a.0.cmp(b.0));
                best = members;
            }
        }
        (best.len() >= min_size.max(1)).then_some(best)
    }

    // ── Remote contacts ───────────────────────────────────────────────

    pub fn remote_contact(&self, username: &str) -> Option<&RemoteContact> {
        self.remote_players.get(username)
    }

    pub fn remote_contacts(&self) -> impl Iterator<Item = (&str, &RemoteContact)> {
        self.remote_players.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Attach a location hint to a remote contact. False if the player is
    /// not a known remote contact.
    pub fn set_remote_hint(&mut self, username: &str, position: Vec3, source: &str, now: Instant) -> bool {
        match self.remote_players.get_mut(username) {
            Some(contact) => {
                contact.hint = Some(RemoteHint {
                    position,
                    source: source.to_string(),
                    noted_at: now,
                });
                true
            }
            None => false,
        }
    }

    /// Record that a search for `username` was started toward `target`.
    pub fn mark_seek(&mut self, username: &str, target: Vec3, now: Instant) {
        if let Some(contact) = self.remote_players.get_mut(username) {
            contact.last_seek_at = Some(now);
            contact.last_seek_target = Some(target);
        }
    }

    // ── Chat ──────────────────────────────────────────────────────────

    /// Mine a chat line for locations. Coordinates become a POI and, for a
    /// remote contact, that contact's hint. "come here"/"follow" from a
    /// rendered player marks the player's position.
    ///
    /// Returns the parsed coordinates, if any.
    pub fn note_chat(&mut self, username: &str, message: &str, now: Instant) -> Option<Vec3> {
        if self.is_self(username) {
            return None;
        }

        let coords = parse_coordinates(message);
        if let Some(pos) = coords {
            if self.set_remote_hint(username, pos, message, now) {
                tracing::info!(player = username, position = %pos, "Noted location hint for remote player");
            }
            self.note_poi(pos, format!("{username} mentioned"), now);
        } else if mentions_follow_request(message) {
            if let Some(position) = self.players.get(username).map(|p| p.position) {
                self.note_poi(position, "chat request", now);
            }
        }
        coords
    }

    // ── Hostiles and items ────────────────────────────────────────────

    pub fn remember_hostile(&mut self, id: EntityId, name: &str, position: Vec3, now: Instant) {
        self.hostiles.insert(
            id,
            HostileSighting {
                name: name.to_string(),
                position,
                last_seen: now,
            },
        );
    }

    pub fn forget_hostile(&mut self, id: EntityId) {
        self.hostiles.remove(&id);
    }

    pub fn hostile(&self, id: EntityId) -> Option<&HostileSighting> {
        self.hostiles.get(&id)
    }

    pub fn has_hostiles(&self) -> bool {
        !self.hostiles.is_empty()
    }

    pub fn nearest_hostile(&self, from: &Vec3) -> Option<(EntityId, &HostileSighting)> {
        self.hostiles
            .iter()
            .map(|(id, h)| (*id, h))
            .min_by(|a, b| a.1.position.distance_squared(from).total_cmp(&b.1.position.distance_squared(from)))
    }

    /// Nearest hostile satisfying `accept`.
    pub fn nearest_hostile_matching<F>(&self, from: &Vec3, accept: F) -> Option<(EntityId, &HostileSighting)>
    where
        F: Fn(&HostileSighting) -> bool,
    {
        self.hostiles
            .iter()
            .filter(|(_, h)| accept(h))
            .map(|(id, h)| (*id, h))
            .min_by(|a, b| a.1.position.distance_squared(from).total_cmp(&b.1.position.distance_squared(from)))
    }

    pub fn remember_item(&mut self, id: EntityId, kind: &str, position: Vec3, now: Instant) {
        self.items.insert(
            id,
            ItemSighting {
                kind: kind.to_string(),
                position,
                last_seen: now,
            },
        );
    }

    pub fn forget_item(&mut self, id: EntityId) {
        self.items.remove(&id);
    }

    pub fn nearest_item(&self, from: &Vec3) -> Option<(EntityId, &ItemSighting)> {
        self.items
            .iter()
            .map(|(id, i)| (*id, i))
            .min_by(|a, b| a.1.position.distance_squared(from).total_cmp(&b.1.position.distance_squared(from)))
    }

    /// Fold one scan's worth of entities and roster into memory.
    ///
    /// Rendered players are refreshed (and promoted); connected players
    /// that are not rendered are demoted or refreshed as remote contacts.
    pub fn record_scan(&mut self, entities: &[ObservedEntity], roster: &[RosterEntry], now: Instant) {
        let mut rendered: HashSet<&str> = HashSet::new();

        for entity in entities {
            match entity {
                ObservedEntity::Player {
                    id,
                    username,
                    position,
                    velocity,
                } => {
                    rendered.insert(username.as_str());
                    self.remember_player(username, *id, *position, *velocity, now);
                }
                ObservedEntity::Hostile { id, name, position, .. } => {
                    if entity.is_alive() {
                        self.remember_hostile(*id, name, *position, now);
                    } else {
                        self.forget_hostile(*id);
                    }
                }
                ObservedEntity::Item { id, kind, position } => {
                    self.remember_item(*id, kind, *position, now);
                }
                ObservedEntity::Other { .. } => {}
            }
        }

        for entry in roster {
            if rendered.contains(entry.username.as_str()) {
                continue;
            }
            if self.players.contains_key(&entry.username) {
                self.demote_player(entry, now);
            } else {
                self.note_roster(entry, now);
            }
        }
    }

    // ── Resources ─────────────────────────────────────────────────────

    /// Add gatherable blocks found by a scan. Non-resource kinds are
    /// ignored; known positions are refreshed. The list is re-sorted by
    /// priority (desc) then distance from `from` (asc) and capped.
    pub fn record_resources<I>(&mut self, blocks: I, from: &Vec3, now: Instant)
    where
        I: IntoIterator<Item = Block>,
    {
        for block in blocks {
            let Some((category, priority)) = classify_resource(&block.kind) else {
                continue;
            };
            match self.resource_targets.iter_mut().find(|t| t.position == block.position) {
                Some(existing) => {
                    existing.noted_at = now;
                    existing.block_kind = block.kind;
                    existing.category = category;
                    existing.priority = priority;
                }
                None => self.resource_targets.push(ResourceTarget {
                    position: block.position,
                    block_kind: block.kind,
                    category,
                    priority,
                    noted_at: now,
                }),
            }
        }

        self.resource_targets.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then_with(|| {
                let da = a.position.center().distance_squared(from);
                let db = b.position.center().distance_squared(from);
                da.total_cmp(&db)
            })
        });
        self.resource_targets.truncate(MAX_RESOURCE_TARGETS);
    }

    /// Drop targets whose block no longer matches what was recorded.
    pub fn revalidate_resources<F>(&mut self, lookup: F)
    where
        F: Fn(BlockPos) -> Option<Block>,
    {
        self.resource_targets.retain(|target| {
            let valid = lookup(target.position).is_some_and(|b| b.kind == target.block_kind);
            if !valid {
                tracing::debug!(block = %target.block_kind, position = %target.position, "Resource target no longer valid");
            }
            valid
        });
    }

    pub fn remove_resource_target(&mut self, position: BlockPos) -> bool {
        let before = self.resource_targets.len();
        self.resource_targets.retain(|t| t.position != position);
        self.resource_targets.len() < before
    }

    pub fn resource_targets(&self) -> &[ResourceTarget] {
        &self.resource_targets
    }

    /// Highest-ranked target in an allowed category.
    pub fn best_resource(&self, allow_ore: bool, allow_wood: bool) -> Option<&ResourceTarget> {
        self.resource_targets.iter().find(|t| match t.category {
            ResourceCategory::Ore => allow_ore,
            ResourceCategory::Wood => allow_wood,
        })
    }

    // ── Points of interest ────────────────────────────────────────────

    pub fn note_poi(&mut self, position: Vec3, description: impl Into<String>, now: Instant) {
        self.pois
            .retain(|p| p.position.distance_to(&position) > POI_MERGE_DISTANCE);
        self.pois.push_front(PointOfInterest {
            position,
            description: description.into(),
            noted_at: now,
        });
        self.pois.truncate(MAX_POIS);
    }

    /// Most recently noted POI.
    pub fn latest_poi(&self) -> Option<&PointOfInterest> {
        self.pois.front()
    }

    /// Remove the POI at `position`, returning it.
    pub fn take_poi(&mut self, position: &Vec3) -> Option<PointOfInterest> {
        let index = self.pois.iter().position(|p| p.position == *position)?;
        self.pois.remove(index)
    }

    pub fn pois(&self) -> impl Iterator<Item = &PointOfInterest> {
        self.pois.iter()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    /// Purge everything older than its TTL. Remote hints decay separately
    /// from their contact.
    pub fn forget_stale(&mut self, now: Instant) {
        let c = &self.config;
        self.players
            .retain(|_, p| !expired(p.last_seen, now, c.player_forget_ms));
        self.remote_players
            .retain(|_, r| !expired(r.last_heard_at, now, c.remote_player_forget_ms));
        for contact in self.remote_players.values_mut() {
            if contact
                .hint
                .as_ref()
                .is_some_and(|h| expired(h.noted_at, now, c.remote_hint_forget_ms))
            {
                contact.hint = None;
            }
        }
        self.hostiles
            .retain(|_, h| !expired(h.last_seen, now, c.hostile_forget_ms));
        self.items
            .retain(|_, i| !expired(i.last_seen, now, c.item_forget_ms));
        self.resource_targets
            .retain(|t| !expired(t.noted_at, now, c.resource_forget_ms));
        self.pois
            .retain(|p| !expired(p.noted_at, now, c.poi_forget_ms));
    }

    /// Forget the things that die with the agent: hostiles, items and
    /// resource targets. Players and POIs survive.
    pub fn clear_transient(&mut self) {
        self.hostiles.clear();
        self.items.clear();
        self.resource_targets.clear();
    }

    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            players: self.players.len(),
            remote_players: self.remote_players.len(),
            hostiles: self.hostiles.len(),
            items: self.items.len(),
            resource_targets: self.resource_targets.len(),
            pois: self.pois.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> WorldMemory {
        WorldMemory::new(MemoryConfig::default(), "Jarvis")
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn self_is_never_remembered() {
        let mut mem = memory();
        let now = Instant::now();
        mem.remember_player("Jarvis", 1, Vec3::default(), None, now);
        mem.note_roster(&RosterEntry::new("Jarvis"), now);
        assert_eq!(mem.summary(), MemorySummary::default());
    }

    #[test]
    fn unrefreshed_entries_expire_after_ttl() {
        let mut mem = memory();
        let t0 = Instant::now();
        mem.remember_hostile(7, "Zombie", Vec3::new(1.0, 64.0, 1.0), t0);
        mem.remember_item(8, "apple", Vec3::new(2.0, 64.0, 2.0), t0);
        mem.remember_player("alice", 9, Vec3::new(3.0, 64.0, 3.0), None, t0);

        mem.forget_stale(t0 + secs(11));
        assert_eq!(mem.summary().items, 1);

        mem.forget_stale(t0 + secs(12) + Duration::from_millis(1));
        assert_eq!(mem.summary().items, 0);
        assert_eq!(mem.summary().hostiles, 1);

        mem.forget_stale(t0 + secs(20));
        assert_eq!(mem.summary().hostiles, 0);
        assert!(mem.player("alice").is_some());

        mem.forget_stale(t0 + secs(90));
        assert!(mem.player("alice").is_none());
    }

    #[test]
    fn refreshed_entry_survives() {
        let mut mem = memory();
        let t0 = Instant::now();
        mem.remember_hostile(7, "Zombie", Vec3::default(), t0);
        mem.remember_hostile(7, "Zombie", Vec3::default(), t0 + secs(15));
        mem.forget_stale(t0 + secs(25));
        assert!(mem.hostile(7).is_some());
    }

    #[test]
    fn nearest_picks_closest() {
        let mut mem = memory();
        let now = Instant::now();
        mem.remember_hostile(1, "Zombie", Vec3::new(10.0, 0.0, 0.0), now);
        mem.remember_hostile(2, "Spider", Vec3::new(3.0, 0.0, 0.0), now);
        let (id, h) = mem.nearest_hostile(&Vec3::default()).unwrap();
        assert_eq!(id, 2);
        assert_eq!(h.name, "Spider");
        assert!(mem.nearest_item(&Vec3::default()).is_none());
    }

    #[test]
    fn scan_promotes_and_demotes() {
        let mut mem = memory();
        let t0 = Instant::now();
        let bob = RosterEntry::new("bob");

        mem.record_scan(&[], &[bob.clone()], t0);
        assert!(mem.remote_contact("bob").is_some());

        let visible = ObservedEntity::Player {
            id: 4,
            username: "bob".into(),
            position: Vec3::new(5.0, 64.0, 5.0),
            velocity: None,
        };
        mem.record_scan(&[visible], &[bob.clone()], t0 + secs(2));
        assert!(mem.remote_contact("bob").is_none());
        assert!(mem.player("bob").is_some());

        mem.record_scan(&[], &[bob], t0 + secs(4));
        assert!(mem.player("bob").is_none());
        assert!(mem.remote_contact("bob").is_some());

        mem.player_left("bob");
        assert_eq!(mem.summary(), MemorySummary::default());
    }

    #[test]
    fn dead_hostile_is_forgotten_on_scan() {
        let mut mem = memory();
        let now = Instant::now();
        mem.remember_hostile(3, "Zombie", Vec3::default(), now);
        let corpse = ObservedEntity::Hostile {
            id: 3,
            name: "Zombie".into(),
            position: Vec3::default(),
            health: Some(0.0),
        };
        mem.record_scan(&[corpse], &[], now);
        assert!(!mem.has_hostiles());
    }

    #[test]
    fn remote_hint_decays_before_contact() {
        let mut mem = memory();
        let t0 = Instant::now();
        mem.note_roster(&RosterEntry::new("carol"), t0);
        assert!(mem.set_remote_hint("carol", Vec3::new(1.0, 2.0, 3.0), "1 2 3", t0));
        assert!(!mem.set_remote_hint("nobody", Vec3::default(), "", t0));

        mem.forget_stale(t0 + secs(121));
        let contact = mem.remote_contact("carol").unwrap();
        assert!(contact.hint.is_none());

        mem.forget_stale(t0 + secs(301));
        assert!(mem.remote_contact("carol").is_none());
    }

    #[test]
    fn chat_coordinates_from_remote_contact_set_hint_and_poi() {
        let mut mem = memory();
        let now = Instant::now();
        mem.note_roster(&RosterEntry::new("dave"), now);

        let parsed = mem.note_chat("dave", "meet me at x: 120 y: 70 z: -45", now);
        let target = Vec3::new(120.0, 70.0, -45.0);
        assert_eq!(parsed, Some(target));

        let hint = mem.remote_contact("dave").and_then(|c| c.hint.clone()).unwrap();
        assert_eq!(hint.position, target);
        assert_eq!(mem.latest_poi().unwrap().position, target);
    }

    #[test]
    fn follow_request_marks_player_position() {
        let mut mem = memory();
        let now = Instant::now();
        let pos = Vec3::new(8.0, 64.0, -2.0);
        mem.remember_player("erin", 2, pos, None, now);
        assert!(mem.note_chat("erin", "come here please", now).is_none());
        let poi = mem.latest_poi().unwrap();
        assert_eq!(poi.position, pos);
        assert_eq!(poi.description, "chat request");
    }

    #[test]
    fn resources_sorted_deduplicated_and_capped() {
        let mut mem = memory();
        let now = Instant::now();
        let origin = Vec3::default();

        let mut blocks: Vec<Block> = (0..20)
            .map(|i| Block::new("oak_log", BlockPos::new(i, 64, 0)))
            .collect();
        blocks.push(Block::new("iron_ore", BlockPos::new(30, 10, 0)));
        blocks.push(Block::new("stone", BlockPos::new(1, 1, 1)));
        mem.record_resources(blocks, &origin, now);
        mem.record_resources([Block::new("oak_log", BlockPos::new(0, 64, 0))], &origin, now);

        let targets = mem.resource_targets();
        assert_eq!(targets.len(), 12);
        assert_eq!(targets[0].block_kind, "iron_ore");
        assert_eq!(targets[1].position, BlockPos::new(0, 64, 0));
        assert_eq!(targets[2].position, BlockPos::new(1, 64, 0));
        assert!(targets.iter().all(|t| t.block_kind != "stone"));

        assert_eq!(mem.best_resource(false, true).unwrap().block_kind, "oak_log");
        assert!(mem.best_resource(false, false).is_none());
    }

    #[test]
    fn revalidation_drops_changed_blocks() {
        let mut mem = memory();
        let now = Instant::now();
        let kept = BlockPos::new(1, 12, 1);
        let mined = BlockPos::new(2, 12, 2);
        mem.record_resources(
            [Block::new("coal_ore", kept), Block::new("coal_ore", mined)],
            &Vec3::default(),
            now,
        );
        mem.revalidate_resources(|pos| {
            if pos == kept {
                Some(Block::new("coal_ore", pos))
            } else {
                Some(Block::new("air", pos))
            }
        });
        assert_eq!(mem.resource_targets().len(), 1);
        assert!(mem.remove_resource_target(kept));
        assert!(!mem.remove_resource_target(kept));
    }

    #[test]
    fn pois_most_recent_first_and_capped() {
        let mut mem = memory();
        let now = Instant::now();
        for i in 0..8 {
            mem.note_poi(Vec3::new(i as f64 * 10.0, 64.0, 0.0), format!("poi {i}"), now);
        }
        assert_eq!(mem.pois().count(), 6);
        assert_eq!(mem.latest_poi().unwrap().description, "poi 7");

        mem.note_poi(Vec3::new(70.5, 64.0, 0.0), "again", now);
        assert_eq!(mem.pois().count(), 6);
        assert_eq!(mem.latest_poi().unwrap().description, "again");

        let taken = mem.take_poi(&Vec3::new(70.5, 64.0, 0.0)).unwrap();
        assert_eq!(taken.description, "again");
        assert_eq!(mem.latest_poi().unwrap().description, "poi 6");
    }

    #[test]
    fn cluster_requires_min_size() {
        let mut mem = memory();
        let now = Instant::now();
        mem.remember_player("a", 1, Vec3::new(0.0, 64.0, 0.0), None, now);
        mem.remember_player("b", 2, Vec3::new(4.0, 64.0, 0.0), None, now);
        assert!(mem.visible_cluster(10.0, 3).is_none());

        mem.remember_player("c", 3, Vec3::new(0.0, 64.0, 6.0), None, now);
        mem.remember_player("far", 4, Vec3::new(100.0, 64.0, 0.0), None, now);
        let cluster = mem.visible_cluster(10.0, 3).unwrap();
        let names: Vec<&str> = cluster.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn clear_transient_keeps_players_and_pois() {
        let mut mem = memory();
        let now = Instant::now();
        mem.remember_hostile(1, "Zombie", Vec3::default(), now);
        mem.remember_item(2, "apple", Vec3::default(), now);
        mem.record_resources([Block::new("coal_ore", BlockPos::new(0, 0, 0))], &Vec3::default(), now);
        mem.remember_player("a", 3, Vec3::default(), None, now);
        mem.note_poi(Vec3::default(), "chest", now);

        mem.clear_transient();
        let s = mem.summary();
        assert_eq!((s.hostiles, s.items, s.resource_targets), (0, 0, 0));
        assert_eq!((s.players, s.pois), (1, 1));
    }
}
