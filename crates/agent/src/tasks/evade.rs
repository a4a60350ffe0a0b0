use brainstem_core::{EndReason, GoalHandle, NavGoal, TaskKind, Vec3};
use tracing::warn;

use crate::task::{Task, TaskContext, TaskView};

/// Run to a point away from the nearest threat.
pub struct EvadeTask {
    threat: Option<String>,
    destination: Vec3,
    goal: Option<GoalHandle>,
}

impl EvadeTask {
    pub fn new(threat: Option<String>, destination: Vec3) -> Self {
        Self {
            threat,
            destination,
            goal: None,
        }
    }
}

impl Task for EvadeTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Evade
    }

    fn describe(&self) -> String {
        match &self.threat {
            Some(name) => format!("away from {name} to {}", self.destination),
            None => format!("to {}", self.destination),
        }
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.goal = ctx.set_goal(NavGoal::Near {
            target: self.destination,
            range: ctx.config.follow_distance,
        });
        warn!(
            threat = self.threat.as_deref().unwrap_or("unknown"),
            destination = %self.destination,
            "Evading threat"
        );
    }

    /// Keep running while damage is recent, or while a hostile is still
    /// close and the escape route is still being walked.
    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        if view.state.damaged_within(view.now, view.config.danger_cooldown_ms) {
            return true;
        }
        let Some(me) = view.self_position() else {
            return false;
        };
        let threat_close = view
            .memory
            .nearest_hostile(&me)
            .is_some_and(|(_, h)| h.position.distance_to(&me) < view.config.threat_radius);
        threat_close && view.owns_goal(self.goal)
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
    }
}
