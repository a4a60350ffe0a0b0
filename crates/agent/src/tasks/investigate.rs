use std::time::Duration;

use brainstem_core::{EndReason, GoalHandle, NavGoal, TaskKind, Vec3};
use tokio::time::Instant;
use tracing::info;

use crate::task::{Task, TaskContext, TaskView};

/// Walk over to a remembered point of interest. The POI is consumed when
/// the task ends, whatever the reason.
pub struct InvestigateTask {
    position: Vec3,
    description: String,
    noted_at: Instant,
    goal: Option<GoalHandle>,
}

impl InvestigateTask {
    pub fn new(position: Vec3, description: impl Into<String>, noted_at: Instant) -> Self {
        Self {
            position,
            description: description.into(),
            noted_at,
            goal: None,
        }
    }
}

impl Task for InvestigateTask {
    fn kind(&self) -> TaskKind {
        TaskKind::InvestigatePoi
    }

    fn describe(&self) -> String {
        format!("{} at {}", self.description, self.position)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.goal = ctx.set_goal(NavGoal::Near {
            target: self.position,
            range: ctx.config.follow_distance,
        });
        info!(poi = %self.description, position = %self.position, "Investigating point of interest");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        let age = view.now.saturating_duration_since(self.noted_at);
        age < Duration::from_millis(view.config.memory.poi_forget_ms) && view.owns_goal(self.goal)
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
        ctx.memory.take_poi(&self.position);
    }
}
