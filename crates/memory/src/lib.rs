//! Short-term world memory for brainstem.
//!
//! Everything the agent has seen recently, each entry stamped with the
//! instant it was last observed and purged once its time-to-live elapses.
//! Nothing here survives a respawn.

pub mod catalog;
pub mod hints;
pub mod store;

pub use catalog::{ResourceCategory, classify_resource, is_interesting_block, resource_kinds};
pub use hints::{mentions_follow_request, parse_coordinates};
pub use store::{
    HostileSighting, ItemSighting, MemorySummary, PlayerSighting, PointOfInterest, RemoteContact,
    RemoteHint, ResourceTarget, WorldMemory,
};
