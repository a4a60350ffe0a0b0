use brainstem_core::{EndReason, GoalHandle, NavGoal, TaskKind, Vec3};
use tracing::debug;

use crate::task::{Task, TaskContext, TaskView};

/// Wander to a random nearby point.
pub struct ExploreTask {
    destination: Vec3,
    goal: Option<GoalHandle>,
}

impl ExploreTask {
    pub fn new(destination: Vec3) -> Self {
        Self {
            destination,
            goal: None,
        }
    }
}

impl Task for ExploreTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Explore
    }

    fn describe(&self) -> String {
        self.destination.to_string()
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.goal = ctx.set_goal(NavGoal::Near {
            target: self.destination,
            range: ctx.config.follow_distance,
        });
        debug!(destination = %self.destination, "Exploring");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        view.owns_goal(self.goal)
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
    }
}
