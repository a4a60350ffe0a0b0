//! Picking things up: dropped items, ore and logs.

use brainstem_core::{BlockPos, EndReason, EntityId, GoalHandle, NavGoal, TaskKind, Vec3};
use brainstem_memory::ResourceCategory;
use tracing::{debug, info};

use crate::task::{Effect, Task, TaskContext, TaskView};

/// Walk onto a dropped item entity.
pub struct CollectItemTask {
    id: EntityId,
    kind: String,
    position: Vec3,
    goal: Option<GoalHandle>,
}

impl CollectItemTask {
    pub fn new(id: EntityId, kind: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            goal: None,
        }
    }
}

impl Task for CollectItemTask {
    fn kind(&self) -> TaskKind {
        TaskKind::CollectItem
    }

    fn describe(&self) -> String {
        format!("{} at {}", self.kind, self.position)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.goal = ctx.set_goal(NavGoal::Near {
            target: self.position,
            range: 1.0,
        });
        debug!(item = %self.kind, id = self.id, "Collecting item");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        view.world.entity(self.id).is_some()
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.release_goal(self.goal.take());
        if ctx.world.entity(self.id).is_none() {
            ctx.memory.forget_item(self.id);
        }
    }
}

/// Break a remembered ore or log block. The work happens in the world's
/// `collect_block` future; the brain ends this task when that future
/// reports back, or when the task times out.
pub struct HarvestTask {
    position: BlockPos,
    block_kind: String,
    category: ResourceCategory,
}

impl HarvestTask {
    pub fn new(position: BlockPos, block_kind: impl Into<String>, category: ResourceCategory) -> Self {
        Self {
            position,
            block_kind: block_kind.into(),
            category,
        }
    }

    fn in_flight(&self, task_id: u64, async_task: Option<u64>) -> bool {
        async_task == Some(task_id)
    }
}

impl Task for HarvestTask {
    fn kind(&self) -> TaskKind {
        match self.category {
            ResourceCategory::Ore => TaskKind::MineResource,
            ResourceCategory::Wood => TaskKind::HarvestWood,
        }
    }

    fn describe(&self) -> String {
        format!("{} at {}", self.block_kind, self.position)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        ctx.state.async_task = Some(ctx.task_id);
        ctx.effects.push(Effect::Collect {
            ticket: ctx.task_id,
            position: self.position,
        });
        info!(block = %self.block_kind, position = %self.position, "Harvesting");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        self.in_flight(view.task_id, view.state.async_task)
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, reason: EndReason) {
        if self.in_flight(ctx.task_id, ctx.state.async_task) {
            ctx.state.async_task = None;
            ctx.world.cancel_collect();
            ctx.effects.push(Effect::CancelCollect {
                ticket: ctx.task_id,
            });
        }
        if matches!(reason, EndReason::Completed | EndReason::Failed) {
            ctx.memory.remove_resource_target(self.position);
        }
    }

    fn is_async(&self) -> bool {
        true
    }
}
