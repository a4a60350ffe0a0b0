//! The contract every behavior implements, and the state it may touch.

use std::time::Duration;

use brainstem_config::BrainConfig;
use brainstem_core::{BlockPos, EndReason, GoalHandle, NavGoal, TaskKind, Vec3, WorldInterface};
use brainstem_memory::WorldMemory;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::debug;

use crate::timers::{TaskStep, TimerAction, TimerId, TimerRegistry};

/// Mutable brain-wide flags shared by the planner and tasks.
#[derive(Debug, Clone)]
pub struct BrainState {
    pub paused_until: Instant,
    /// Id of the task whose external collect future is in flight.
    pub async_task: Option<u64>,
    pub combat_cooldown_until: Option<Instant>,
    pub last_damage_at: Option<Instant>,
    pub last_ambient_chat: Option<Instant>,
    pub last_observation: Option<Instant>,
    pub last_stroll: Option<Instant>,
}

impl BrainState {
    pub fn new(now: Instant) -> Self {
        Self {
            paused_until: now,
            async_task: None,
            combat_cooldown_until: None,
            last_damage_at: None,
            last_ambient_chat: None,
            last_observation: None,
            last_stroll: None,
        }
    }

    pub fn is_paused(&self, now: Instant) -> bool {
        now < self.paused_until
    }

    pub fn combat_ready(&self, now: Instant) -> bool {
        self.combat_cooldown_until.is_none_or(|until| now >= until)
    }

    pub fn damaged_within(&self, now: Instant, window_ms: u64) -> bool {
        self.last_damage_at
            .is_some_and(|at| now.saturating_duration_since(at) < Duration::from_millis(window_ms))
    }
}

/// What a [`DialogueRequest`]'s answer is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialoguePurpose {
    /// An unprompted chat line.
    Ambient,
    /// A whispered reply.
    Whisper { username: String },
    /// The answer to `!ai`.
    Command,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogueRequest {
    pub id: u64,
    pub purpose: DialoguePurpose,
    pub prompt: String,
    pub context: String,
}

/// Work the brain cannot do synchronously. The runtime performs it and
/// reports back through `Brain::finish_collect` / `Brain::finish_dialogue`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start collecting the block; the ticket tags the completion.
    Collect { ticket: u64, position: BlockPos },
    /// Abort the collect future started under `ticket`.
    CancelCollect { ticket: u64 },
    Dialogue(DialogueRequest),
    /// Something worth remembering for later dialogue.
    DialogueNote(String),
}

/// Everything a task may read or change while engaging, stepping or
/// cleaning up.
pub struct TaskContext<'a> {
    pub now: Instant,
    pub task_id: u64,
    pub world: &'a dyn WorldInterface,
    pub memory: &'a mut WorldMemory,
    pub timers: &'a mut TimerRegistry,
    pub config: &'a BrainConfig,
    pub state: &'a mut BrainState,
    pub rng: &'a mut StdRng,
    pub effects: &'a mut Vec<Effect>,
}

impl TaskContext<'_> {
    /// Schedule a step of this task's own loop.
    pub fn schedule_step(&mut self, delay_ms: u64, step: TaskStep) -> TimerId {
        self.schedule(delay_ms, TimerAction::TaskStep(step))
    }

    /// Schedule an action owned by this task.
    pub fn schedule(&mut self, delay_ms: u64, action: TimerAction) -> TimerId {
        self.timers.schedule(
            self.now,
            Duration::from_millis(delay_ms),
            Some(self.task_id),
            action,
        )
    }

    /// Set a navigation goal, logging (not propagating) failure.
    pub fn set_goal(&mut self, goal: NavGoal) -> Option<GoalHandle> {
        match self.world.set_goal(goal) {
            Ok(handle) => Some(handle),
            Err(e) => {
                debug!(error = %e, "Failed to set goal");
                None
            }
        }
    }

    /// Clear the goal only if it is still the one this task set.
    pub fn release_goal(&self, mine: Option<GoalHandle>) {
        if mine.is_some() && self.world.current_goal() == mine {
            self.world.clear_goal();
        }
    }

    pub fn look_at(&self, target: Vec3) {
        if let Err(e) = self.world.look_at(target) {
            debug!(error = %e, "look_at failed");
        }
    }

    pub fn self_position(&self) -> Option<Vec3> {
        self.world.self_state().map(|s| s.position)
    }
}

/// Read-only view for continuation predicates.
pub struct TaskView<'a> {
    pub now: Instant,
    pub task_id: u64,
    pub world: &'a dyn WorldInterface,
    pub memory: &'a WorldMemory,
    pub config: &'a BrainConfig,
    pub state: &'a BrainState,
}

impl TaskView<'_> {
    pub fn owns_goal(&self, mine: Option<GoalHandle>) -> bool {
        mine.is_some() && self.world.current_goal() == mine
    }

    pub fn self_position(&self) -> Option<Vec3> {
        self.world.self_state().map(|s| s.position)
    }
}

/// A behavior the brain can run. At most one is active at a time.
///
/// `engage` runs once per activation. `should_continue` must be cheap and
/// side-effect free. `cleanup` runs exactly once when the task ends for any
/// reason, even after a partial engage; it must leave no goal, control
/// state or timer of its own behind.
pub trait Task: Send {
    fn kind(&self) -> TaskKind;

    /// Short human-readable target, for logs and events.
    fn describe(&self) -> String;

    fn engage(&mut self, ctx: &mut TaskContext<'_>);

    fn should_continue(&self, view: &TaskView<'_>) -> bool;

    fn on_timer(&mut self, _step: TaskStep, _ctx: &mut TaskContext<'_>) {}

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, reason: EndReason);

    /// Completed by an external future rather than by its predicate.
    fn is_async(&self) -> bool {
        false
    }
}

/// Uniform random duration in `[min, max]` with a floor.
pub(crate) fn random_duration(rng: &mut StdRng, min_ms: u64, max_ms: u64, floor_ms: u64) -> u64 {
    use rand::Rng;
    let value = if max_ms > min_ms {
        rng.random_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    value.max(floor_ms)
}
