//! `!`-prefixed chat commands: manual overrides typed by players.

use std::collections::BTreeMap;

use brainstem_config::BrainConfig;
use brainstem_core::{BlockQuery, NavGoal, ObservedEntity, Vec3, WorldError};
use thiserror::Error;

use crate::brain::BrainCore;
use crate::task::{DialoguePurpose, DialogueRequest, Effect};

const MINE_SEARCH_RADIUS: f64 = 64.0;
const PLAYER_EYE_HEIGHT: f64 = 1.6;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// Shown to the player verbatim.
    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    World(#[from] WorldError),
}

type Handler =
    fn(&CommandRegistry, &mut BrainCore, &[&str]) -> Result<Option<String>, CommandError>;

pub struct CommandSpec {
    pub description: &'static str,
    pub usage: &'static str,
    handler: Handler,
}

/// Name → command table.
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    pub fn new(config: &BrainConfig) -> Self {
        let mut registry = Self {
            commands: BTreeMap::new(),
        };
        registry.register("help", "List available commands", "!help", help);
        registry.register(
            "goto",
            "Pathfind to coordinates or home",
            "!goto <x> <y> <z>|home",
            goto,
        );
        if config.allow_mining {
            registry.register(
                "mine",
                "Mine the nearest block of a given type",
                "!mine <block name>",
                mine,
            );
        }
        registry.register("look", "Look at the nearest player", "!look", look);
        registry.register("ai", "Ask the integrated AI for help", "!ai <question>", ask_ai);
        registry.register("stop", "Stop moving and drop any manual job", "!stop", stop);
        registry
    }

    fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: Handler,
    ) {
        self.commands.insert(
            name,
            CommandSpec {
                description,
                usage,
                handler,
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    pub(crate) fn execute(
        &self,
        name: &str,
        core: &mut BrainCore,
        args: &[&str],
    ) -> Result<Option<String>, CommandError> {
        let spec = self
            .commands
            .get(name)
            .ok_or_else(|| CommandError::Failed(format!("Unknown command {name}")))?;
        (spec.handler)(self, core, args)
    }
}

fn help(
    registry: &CommandRegistry,
    _core: &mut BrainCore,
    _args: &[&str],
) -> Result<Option<String>, CommandError> {
    let lines: Vec<String> = registry
        .commands
        .iter()
        .map(|(name, spec)| format!("{name} - {}", spec.description))
        .collect();
    Ok(Some(lines.join("\n")))
}

fn parse_target(core: &BrainCore, args: &[&str]) -> Result<Vec3, CommandError> {
    match args {
        [x, y, z] => {
            let parse = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
            match (parse(x), parse(y), parse(z)) {
                (Some(x), Some(y), Some(z)) => Ok(Vec3::new(x, y, z)),
                _ => Err(CommandError::Failed("Coordinates must be numbers".into())),
            }
        }
        ["home"] => core
            .world
            .spawn_point()
            .ok_or_else(|| CommandError::Failed("Spawn point unknown".into())),
        _ => Err(CommandError::Usage("!goto <x> <y> <z> or !goto home")),
    }
}

fn goto(
    _registry: &CommandRegistry,
    core: &mut BrainCore,
    args: &[&str],
) -> Result<Option<String>, CommandError> {
    let target = parse_target(core, args)?;
    let range = 1.0;
    core.world.set_goal(NavGoal::Near { target, range })?;
    Ok(Some(format!(
        "Navigating to {}, {}, {} (within {range} blocks)",
        target.x, target.y, target.z
    )))
}

fn mine(
    _registry: &CommandRegistry,
    core: &mut BrainCore,
    args: &[&str],
) -> Result<Option<String>, CommandError> {
    let block = args.join(" ");
    if block.is_empty() {
        return Err(CommandError::Usage("!mine <block name>"));
    }
    let query = BlockQuery {
        kinds: vec![block.clone()],
        max_distance: MINE_SEARCH_RADIUS,
        count: 1,
    };
    let position = core
        .world
        .find_blocks(&query)
        .into_iter()
        .next()
        .ok_or_else(|| CommandError::Failed(format!("Could not find block {block} nearby")))?;

    core.cancel_command_collect();
    let ticket = core.next_id();
    core.pending_command_collect = Some((ticket, block.clone()));
    core.effects.push(Effect::Collect { ticket, position });
    Ok(Some(format!("Mining {block} at {position}")))
}

fn look(
    _registry: &CommandRegistry,
    core: &mut BrainCore,
    _args: &[&str],
) -> Result<Option<String>, CommandError> {
    let me = core
        .world
        .self_state()
        .map(|s| s.position)
        .ok_or(WorldError::NoPosition)?;
    let player = core
        .world
        .entities()
        .into_iter()
        .filter_map(|e| match e {
            ObservedEntity::Player {
                username, position, ..
            } => Some((username, position)),
            _ => None,
        })
        .min_by(|a, b| a.1.distance_squared(&me).total_cmp(&b.1.distance_squared(&me)));
    let (username, position) =
        player.ok_or_else(|| CommandError::Failed("No players nearby".into()))?;
    core.world.look_at(position.offset(0.0, PLAYER_EYE_HEIGHT, 0.0))?;
    Ok(Some(format!("Looking at {username}")))
}

fn ask_ai(
    _registry: &CommandRegistry,
    core: &mut BrainCore,
    args: &[&str],
) -> Result<Option<String>, CommandError> {
    let prompt = args.join(" ");
    if prompt.is_empty() {
        return Err(CommandError::Usage("!ai <question>"));
    }
    let context = core.position_context();
    let id = core.next_id();
    core.effects.push(Effect::Dialogue(DialogueRequest {
        id,
        purpose: DialoguePurpose::Command,
        prompt,
        context,
    }));
    Ok(None)
}

fn stop(
    _registry: &CommandRegistry,
    core: &mut BrainCore,
    _args: &[&str],
) -> Result<Option<String>, CommandError> {
    core.world.clear_goal();
    core.world.clear_controls();
    core.cancel_command_collect();
    Ok(Some("Stopping.".into()))
}
