//! Staying close to other players: one player, a group, or a player
//! known only from the roster.

use brainstem_core::{EndReason, EntityId, GoalHandle, NavGoal, TaskKind, Vec3};
use brainstem_memory::WorldMemory;
use tracing::{debug, info};

use crate::task::{Task, TaskContext, TaskView};
use crate::timers::TaskStep;

pub struct FollowPlayerTask {
    username: String,
    entity: EntityId,
    goal: Option<GoalHandle>,
}

impl FollowPlayerTask {
    pub fn new(username: impl Into<String>, entity: EntityId) -> Self {
        Self {
            username: username.into(),
            entity,
            goal: None,
        }
    }
}

impl Task for FollowPlayerTask {
    fn kind(&self) -> TaskKind {
        TaskKind::FollowPlayer
    }

    fn describe(&self) -> String {
        self.username.clone()
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.goal = ctx.set_goal(NavGoal::Follow {
            entity: self.entity,
            range: ctx.config.follow_distance,
        });
        info!(player = %self.username, "Following");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        let (Some(player), Some(me)) = (view.memory.player(&self.username), view.self_position())
        else {
            return false;
        };
        player.position.distance_to(&me) <= view.config.follow_max_distance
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
    }
}

/// Hang around a cluster of players, preferring to trail the configured
/// anchor when that player is part of it.
pub struct GroupFollowTask {
    members: Vec<String>,
    anchor: Option<String>,
    goal: Option<GoalHandle>,
}

impl GroupFollowTask {
    pub fn new(members: Vec<String>, anchor: Option<String>) -> Self {
        Self {
            members,
            anchor,
            goal: None,
        }
    }

    fn centroid(&self, memory: &WorldMemory) -> Option<Vec3> {
        Vec3::centroid(
            self.members
                .iter()
                .filter_map(|name| memory.player(name))
                .map(|p| &p.position),
        )
    }

    fn set_group_goal(&mut self, ctx: &mut TaskContext<'_>) {
        let range = ctx.config.group.follow_distance;
        let anchor = self
            .anchor
            .as_deref()
            .and_then(|name| ctx.memory.player(name))
            .map(|p| p.entity_id);
        let goal = match anchor {
            Some(entity) => NavGoal::Follow { entity, range },
            None => match self.centroid(ctx.memory) {
                Some(target) => NavGoal::Near { target, range },
                None => return,
            },
        };
        ctx.release_goal(self.goal.take());
        self.goal = ctx.set_goal(goal);
    }
}

impl Task for GroupFollowTask {
    fn kind(&self) -> TaskKind {
        TaskKind::GroupFollow
    }

    fn describe(&self) -> String {
        match &self.anchor {
            Some(anchor) => format!("{} players around {anchor}", self.members.len()),
            None => format!("{} players", self.members.len()),
        }
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.set_group_goal(ctx);
        ctx.schedule_step(ctx.config.group.refresh_ms, TaskStep::GroupRefresh);
        info!(members = ?self.members, "Following group");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        let group = &view.config.group;
        let Some(me) = view.self_position() else {
            return false;
        };
        let Some(cluster) = view.memory.visible_cluster(group.radius, group.min_size) else {
            return false;
        };
        Vec3::centroid(cluster.iter().map(|(_, p)| &p.position))
            .is_some_and(|centroid| centroid.distance_to(&me) <= group.leash_distance)
    }

    fn on_timer(&mut self, step: TaskStep, ctx: &mut TaskContext<'_>) {
        if step != TaskStep::GroupRefresh {
            return;
        }
        let group = &ctx.config.group;
        if let Some(cluster) = ctx.memory.visible_cluster(group.radius, group.min_size) {
            self.members = cluster.iter().map(|(name, _)| (*name).to_string()).collect();
        }
        self.set_group_goal(ctx);
        ctx.schedule_step(ctx.config.group.refresh_ms, TaskStep::GroupRefresh);
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
    }
}

/// Head toward where a connected but unrendered player might be.
pub struct SeekRemoteTask {
    username: String,
    destination: Vec3,
    hinted: bool,
    goal: Option<GoalHandle>,
}

impl SeekRemoteTask {
    pub fn new(username: impl Into<String>, destination: Vec3, hinted: bool) -> Self {
        Self {
            username: username.into(),
            destination,
            hinted,
            goal: None,
        }
    }
}

impl Task for SeekRemoteTask {
    fn kind(&self) -> TaskKind {
        TaskKind::SeekRemotePlayer
    }

    fn describe(&self) -> String {
        format!("{} near {}", self.username, self.destination)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.goal = ctx.set_goal(NavGoal::Near {
            target: self.destination,
            range: ctx.config.follow_distance,
        });
        ctx.memory
            .mark_seek(&self.username, self.destination, ctx.now);
        if self.hinted {
            info!(player = %self.username, destination = %self.destination, "Seeking player at hinted location");
        } else {
            debug!(player = %self.username, destination = %self.destination, "Searching for player");
        }
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        let Some(me) = view.self_position() else {
            return false;
        };
        let someone_visible = view
            .memory
            .nearest_player(&me)
            .is_some_and(|(_, p)| p.position.distance_to(&me) <= view.config.follow_max_distance);
        view.owns_goal(self.goal)
            && view.memory.remote_contact(&self.username).is_some()
            && !someone_visible
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
    }
}
