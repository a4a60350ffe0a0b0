//! The task catalog. [`build`] turns a planner decision into a runnable task.

mod evade;
mod explore;
mod follow;
mod gather;
mod idle;
mod investigate;

pub use evade::EvadeTask;
pub use explore::ExploreTask;
pub use follow::{FollowPlayerTask, GroupFollowTask, SeekRemoteTask};
pub use gather::{CollectItemTask, HarvestTask};
pub use idle::{ObserveTask, StrollTask};
pub use investigate::InvestigateTask;

use crate::combat::CombatTask;
use crate::planner::Plan;
use crate::task::Task;

pub fn build(plan: Plan) -> Box<dyn Task> {
    match plan {
        Plan::Combat { target, name } => Box::new(CombatTask::new(target, name)),
        Plan::Evade {
            threat,
            destination,
        } => Box::new(EvadeTask::new(threat, destination)),
        Plan::CollectItem { id, kind, position } => {
            Box::new(CollectItemTask::new(id, kind, position))
        }
        Plan::Harvest {
            position,
            block_kind,
            category,
        } => Box::new(HarvestTask::new(position, block_kind, category)),
        Plan::Investigate {
            position,
            description,
            noted_at,
        } => Box::new(InvestigateTask::new(position, description, noted_at)),
        Plan::GroupFollow { members, anchor } => Box::new(GroupFollowTask::new(members, anchor)),
        Plan::Follow { username, entity } => Box::new(FollowPlayerTask::new(username, entity)),
        Plan::SeekRemote {
            username,
            destination,
            hinted,
        } => Box::new(SeekRemoteTask::new(username, destination, hinted)),
        Plan::Observe { duration_ms } => Box::new(ObserveTask::new(duration_ms)),
        Plan::Stroll { duration_ms } => Box::new(StrollTask::new(duration_ms)),
        Plan::Explore { destination } => Box::new(ExploreTask::new(destination)),
    }
}
