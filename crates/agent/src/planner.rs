//! Task arbitration as an ordered rule table. The first rule that yields a
//! [`Plan`] wins; the last rule always yields one while the agent has a
//! body.

use std::f64::consts::TAU;
use std::time::Duration;

use brainstem_config::BrainConfig;
use brainstem_core::{BlockPos, EntityId, SelfState, TaskKind, Vec3, WorldInterface};
use brainstem_memory::{ResourceCategory, WorldMemory};
use rand::Rng;
use rand::rngs::StdRng;
use tokio::time::Instant;

use crate::combat::best_weapon;
use crate::task::{BrainState, random_duration};

const OBSERVE_FLOOR_MS: u64 = 2_500;
const STROLL_FLOOR_MS: u64 = 3_000;

/// A chosen behavior with its target resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Combat {
        target: EntityId,
        name: String,
    },
    Evade {
        threat: Option<String>,
        destination: Vec3,
    },
    CollectItem {
        id: EntityId,
        kind: String,
        position: Vec3,
    },
    Harvest {
        position: BlockPos,
        block_kind: String,
        category: ResourceCategory,
    },
    Investigate {
        position: Vec3,
        description: String,
        noted_at: Instant,
    },
    GroupFollow {
        members: Vec<String>,
        anchor: Option<String>,
    },
    Follow {
        username: String,
        entity: EntityId,
    },
    SeekRemote {
        username: String,
        destination: Vec3,
        hinted: bool,
    },
    Observe {
        duration_ms: u64,
    },
    Stroll {
        duration_ms: u64,
    },
    Explore {
        destination: Vec3,
    },
}

impl Plan {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Combat { .. } => TaskKind::Combat,
            Self::Evade { .. } => TaskKind::Evade,
            Self::CollectItem { .. } => TaskKind::CollectItem,
            Self::Harvest {
                category: ResourceCategory::Ore,
                ..
            } => TaskKind::MineResource,
            Self::Harvest {
                category: ResourceCategory::Wood,
                ..
            } => TaskKind::HarvestWood,
            Self::Investigate { .. } => TaskKind::InvestigatePoi,
            Self::GroupFollow { .. } => TaskKind::GroupFollow,
            Self::Follow { .. } => TaskKind::FollowPlayer,
            Self::SeekRemote { .. } => TaskKind::SeekRemotePlayer,
            Self::Observe { .. } => TaskKind::Observe,
            Self::Stroll { .. } => TaskKind::Stroll,
            Self::Explore { .. } => TaskKind::Explore,
        }
    }
}

/// Inputs to one planning pass.
pub struct PlanContext<'a> {
    pub now: Instant,
    pub me: SelfState,
    pub world: &'a dyn WorldInterface,
    pub memory: &'a WorldMemory,
    pub config: &'a BrainConfig,
    pub state: &'a BrainState,
    pub rng: &'a mut StdRng,
}

pub struct Rule {
    pub name: &'static str,
    pub select: fn(&mut PlanContext<'_>) -> Option<Plan>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "threat",
        select: threat_response,
    },
    Rule {
        name: "item",
        select: item_pickup,
    },
    Rule {
        name: "resource",
        select: resource_gathering,
    },
    Rule {
        name: "poi",
        select: point_of_interest,
    },
    Rule {
        name: "group",
        select: group_following,
    },
    Rule {
        name: "follow",
        select: player_following,
    },
    Rule {
        name: "seek",
        select: remote_seeking,
    },
    Rule {
        name: "idle",
        select: idle,
    },
    Rule {
        name: "explore",
        select: explore,
    },
];

/// Evaluate the table, returning the winning rule's name and plan.
pub fn plan(ctx: &mut PlanContext<'_>) -> Option<(&'static str, Plan)> {
    RULES
        .iter()
        .find_map(|rule| (rule.select)(ctx).map(|plan| (rule.name, plan)))
}

fn elapsed_at_least(since: Option<Instant>, now: Instant, ms: u64) -> bool {
    since.is_none_or(|t| now.saturating_duration_since(t) >= Duration::from_millis(ms))
}

/// Fight when able, flee when not.
pub fn threat_response(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let me = ctx.me;
    let combat = &ctx.config.combat;

    if combat.enabled
        && me.health > combat.engage_min_health
        && ctx.state.combat_ready(ctx.now)
        && best_weapon(&ctx.world.inventory()).is_some()
    {
        let target = ctx
            .memory
            .nearest_hostile_matching(&me.position, |h| {
                !combat.excluded_mobs.iter().any(|m| m.eq_ignore_ascii_case(&h.name))
                    && h.position.distance_to(&me.position) <= combat.engage_range
            });
        if let Some((id, hostile)) = target {
            return Some(Plan::Combat {
                target: id,
                name: hostile.name.clone(),
            });
        }
    }

    let nearest = ctx.memory.nearest_hostile(&me.position);
    let threat_close = nearest
        .is_some_and(|(_, h)| h.position.distance_to(&me.position) < ctx.config.threat_radius);
    let recently_hurt = ctx.state.damaged_within(ctx.now, ctx.config.danger_cooldown_ms);
    let weak = me.health < ctx.config.low_health_threshold && ctx.memory.has_hostiles();

    if !(threat_close || recently_hurt || weak) {
        return None;
    }

    let destination = match nearest {
        Some((_, h)) => escape_point(&me.position, &h.position, ctx.config.evade_distance),
        None => jitter(ctx.rng, &me.position, ctx.config.wander_radius),
    };
    Some(Plan::Evade {
        threat: nearest.map(|(_, h)| h.name.clone()),
        destination,
    })
}

fn item_pickup(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    if !ctx.config.allow_collect {
        return None;
    }
    let (id, item) = ctx.memory.nearest_item(&ctx.me.position)?;
    (item.position.distance_to(&ctx.me.position) < ctx.config.item_pickup_radius).then(|| {
        Plan::CollectItem {
            id,
            kind: item.kind.clone(),
            position: item.position,
        }
    })
}

fn resource_gathering(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let target = ctx
        .memory
        .best_resource(ctx.config.allow_mining, ctx.config.allow_wood)?;
    Some(Plan::Harvest {
        position: target.position,
        block_kind: target.block_kind.clone(),
        category: target.category,
    })
}

fn point_of_interest(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let poi = ctx.memory.latest_poi()?;
    Some(Plan::Investigate {
        position: poi.position,
        description: poi.description.clone(),
        noted_at: poi.noted_at,
    })
}

fn group_following(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let group = &ctx.config.group;
    if !group.enabled {
        return None;
    }
    let cluster = ctx.memory.visible_cluster(group.radius, group.min_size)?;
    let centroid = Vec3::centroid(cluster.iter().map(|(_, p)| &p.position))?;
    let distance = centroid.distance_to(&ctx.me.position);
    if distance <= group.follow_distance || distance > group.leash_distance {
        return None;
    }
    let members: Vec<String> = cluster.iter().map(|(name, _)| (*name).to_string()).collect();
    let anchor = group
        .anchor
        .as_ref()
        .filter(|a| members.iter().any(|m| m == *a))
        .cloned();
    Some(Plan::GroupFollow { members, anchor })
}

fn player_following(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let (username, player) = ctx.memory.nearest_player(&ctx.me.position)?;
    let distance = player.position.distance_to(&ctx.me.position);
    (distance > ctx.config.follow_distance && distance < ctx.config.follow_max_distance).then(|| {
        Plan::Follow {
            username: username.to_string(),
            entity: player.entity_id,
        }
    })
}

/// Search for a player that is connected but out of render range.
fn remote_seeking(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let seek = &ctx.config.seek;
    if !seek.enabled {
        return None;
    }
    let me = ctx.me.position;
    let someone_close = ctx
        .memory
        .nearest_player(&me)
        .is_some_and(|(_, p)| p.position.distance_to(&me) <= ctx.config.follow_max_distance);
    if someone_close {
        return None;
    }

    let now = ctx.now;
    let cooled_down = |last: Option<Instant>| elapsed_at_least(last, now, seek.cooldown_ms);

    let hinted = ctx
        .memory
        .remote_contacts()
        .filter_map(|(name, c)| c.hint.as_ref().map(|h| (name, c, h)))
        .filter(|(_, c, h)| c.last_seek_target != Some(h.position) || cooled_down(c.last_seek_at))
        .max_by(|a, b| a.2.noted_at.cmp(&b.2.noted_at).then_with(|| b.0.cmp(a.0)));
    if let Some((name, _, hint)) = hinted {
        return Some(Plan::SeekRemote {
            username: name.to_string(),
            destination: hint.position,
            hinted: true,
        });
    }

    let (name, _) = ctx
        .memory
        .remote_contacts()
        .filter(|(_, c)| cooled_down(c.last_seek_at))
        .min_by(|a, b| a.0.cmp(b.0))?;

    let angle = username_angle(name);
    let radius = if seek.max_radius > seek.min_radius {
        ctx.rng.random_range(seek.min_radius..=seek.max_radius)
    } else {
        seek.min_radius
    };
    Some(Plan::SeekRemote {
        username: name.to_string(),
        destination: me.along_yaw(angle, radius, 0.0).floored(),
        hinted: false,
    })
}

fn idle(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    let idle = &ctx.config.idle;
    let me = ctx.me.position;
    let player_nearby = ctx
        .memory
        .nearest_player(&me)
        .is_some_and(|(_, p)| p.position.distance_to(&me) <= ctx.config.follow_max_distance);
    let factor = if player_nearby { 0.5 } else { 1.0 };

    if !ctx.memory.has_hostiles()
        && elapsed_at_least(ctx.state.last_observation, ctx.now, idle.observation_cooldown_ms)
        && roll(ctx.rng, idle.observation_chance * factor)
    {
        let r = idle.observation_duration;
        return Some(Plan::Observe {
            duration_ms: random_duration(ctx.rng, r.min_ms, r.max_ms, OBSERVE_FLOOR_MS),
        });
    }

    if elapsed_at_least(ctx.state.last_stroll, ctx.now, idle.stroll_cooldown_ms)
        && roll(ctx.rng, idle.stroll_chance * factor)
    {
        let r = idle.stroll_duration;
        return Some(Plan::Stroll {
            duration_ms: random_duration(ctx.rng, r.min_ms, r.max_ms, STROLL_FLOOR_MS),
        });
    }

    None
}

fn explore(ctx: &mut PlanContext<'_>) -> Option<Plan> {
    Some(Plan::Explore {
        destination: jitter(ctx.rng, &ctx.me.position, ctx.config.wander_radius),
    })
}

fn roll(rng: &mut StdRng, chance: f64) -> bool {
    chance > 0.0 && rng.random_bool(chance.clamp(0.0, 1.0))
}

/// `distance` blocks from `me`, straight away from `threat` on the
/// horizontal plane.
pub fn escape_point(me: &Vec3, threat: &Vec3, distance: f64) -> Vec3 {
    let dx = me.x - threat.x;
    let dz = me.z - threat.z;
    let norm = (dx * dx + dz * dz).sqrt();
    let norm = if norm > f64::EPSILON { norm } else { 1.0 };
    me.offset((dx / norm * distance).floor(), 0.0, (dz / norm * distance).floor())
}

/// A random block-aligned offset within `radius` on x and z.
pub fn jitter(rng: &mut StdRng, origin: &Vec3, radius: f64) -> Vec3 {
    let radius = radius.max(1.0);
    let dx = rng.random_range(-radius..radius).floor();
    let dz = rng.random_range(-radius..radius).floor();
    origin.offset(dx, 0.0, dz)
}

/// Stable heading for a username (FNV-1a), in `[0, 2π)`.
pub fn username_angle(username: &str) -> f64 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in username.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    f64::from(hash) / (f64::from(u32::MAX) + 1.0) * TAU
}
