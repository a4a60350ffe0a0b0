//! Task kinds shared between the engine and its observers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every behavior in the task catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Evade,
    Combat,
    CollectItem,
    MineResource,
    HarvestWood,
    InvestigatePoi,
    FollowPlayer,
    GroupFollow,
    SeekRemotePlayer,
    Observe,
    Stroll,
    Socialize,
    Explore,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evade => "evade",
            Self::Combat => "combat",
            Self::CollectItem => "collect_item",
            Self::MineResource => "mine_resource",
            Self::HarvestWood => "harvest_wood",
            Self::InvestigatePoi => "investigate_poi",
            Self::FollowPlayer => "follow_player",
            Self::GroupFollow => "group_follow",
            Self::SeekRemotePlayer => "seek_remote_player",
            Self::Observe => "observe",
            Self::Stroll => "stroll",
            Self::Socialize => "socialize",
            Self::Explore => "explore",
        }
    }

    /// Tasks during which idle gestures stay quiet.
    pub fn suppresses_gestures(&self) -> bool {
        matches!(self, Self::Evade | Self::Combat)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
