//! Block kinds the agent cares about.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Ore,
    Wood,
}

/// Ores by value. Deepslate variants share their base priority.
const ORES: &[(&str, u8)] = &[
    ("ancient_debris", 10),
    ("diamond_ore", 9),
    ("emerald_ore", 8),
    ("gold_ore", 6),
    ("iron_ore", 5),
    ("redstone_ore", 4),
    ("lapis_ore", 4),
    ("copper_ore", 3),
    ("coal_ore", 2),
];

const LOGS: &[&str] = &[
    "oak_log",
    "birch_log",
    "spruce_log",
    "jungle_log",
    "acacia_log",
    "dark_oak_log",
    "mangrove_log",
    "cherry_log",
];

/// Every ore sits above every log.
const WOOD_PRIORITY: u8 = 1;

const INTERESTING: &[&str] = &[
    "crafting_table",
    "furnace",
    "blast_furnace",
    "chest",
    "barrel",
    "ender_chest",
    "smithing_table",
    "anvil",
    "enchanting_table",
];

/// Category and priority of a gatherable block, `None` for anything else.
pub fn classify_resource(kind: &str) -> Option<(ResourceCategory, u8)> {
    let base = kind.strip_prefix("deepslate_").unwrap_or(kind);
    if let Some((_, priority)) = ORES.iter().find(|(name, _)| *name == base) {
        return Some((ResourceCategory::Ore, *priority));
    }
    if LOGS.contains(&kind) {
        return Some((ResourceCategory::Wood, WOOD_PRIORITY));
    }
    None
}

/// Block kinds worth a look when they appear nearby.
pub fn is_interesting_block(kind: &str) -> bool {
    INTERESTING.contains(&kind)
}

/// Kinds to pass to a block search, filtered by what gathering is allowed.
pub fn resource_kinds(include_ore: bool, include_wood: bool) -> Vec<String> {
    let mut kinds = Vec::new();
    if include_ore {
        for (name, _) in ORES {
            kinds.push((*name).to_string());
            if *name != "ancient_debris" {
                kinds.push(format!("deepslate_{name}"));
            }
        }
    }
    if include_wood {
        kinds.extend(LOGS.iter().map(|s| (*s).to_string()));
    }
    kinds
}
