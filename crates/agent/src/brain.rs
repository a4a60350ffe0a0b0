//! The decision engine.
//!
//! [`Brain`] is a synchronous state machine: every entry point takes the
//! current instant and returns once its work is done. Anything that would
//! block (collecting a block, asking the dialogue provider) is queued as an
//! [`Effect`] for the runtime to perform, and reported back through
//! [`Brain::finish_collect`] or [`Brain::finish_dialogue`].

use std::sync::Arc;
use std::time::Duration;

use brainstem_config::BrainConfig;
use brainstem_core::{
    Block, BlockQuery, BrainEvent, DialogueError, EndReason, EventBus, ObservedEntity, SelfState,
    TaskKind, WorldError, WorldEvent, WorldInterface,
};
use brainstem_memory::{WorldMemory, is_interesting_block, resource_kinds};
use brainstem_providers::canned_line;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::commands::CommandRegistry;
use crate::gestures::{self, GestureContext};
use crate::planner::{self, Plan, PlanContext};
use crate::task::{
    BrainState, DialoguePurpose, DialogueRequest, Effect, Task, TaskContext, TaskView,
    random_duration,
};
use crate::tasks;
use crate::timers::{TimerAction, TimerRegistry};

const AMBIENT_PROMPT: &str =
    "Say a short friendly message that sounds like a Minecraft player doing their own thing.";
const NO_AI_RESPONSE: &str = "AI did not provide a response.";
const LOW_HEALTH_WARNING: f32 = 10.0;

/// Everything except the active task and the command table, so a task can
/// borrow the rest mutably while it runs.
pub(crate) struct BrainCore {
    pub(crate) config: BrainConfig,
    pub(crate) world: Arc<dyn WorldInterface>,
    pub(crate) memory: WorldMemory,
    pub(crate) timers: TimerRegistry,
    pub(crate) state: BrainState,
    pub(crate) rng: StdRng,
    pub(crate) effects: Vec<Effect>,
    pub(crate) events: Arc<EventBus>,
    /// Ticket and block kind of a `!mine` in flight.
    pub(crate) pending_command_collect: Option<(u64, String)>,
    next_id: u64,
}

impl BrainCore {
    /// Ids for tasks, collect tickets and dialogue requests share one
    /// sequence so a ticket can never be mistaken for another.
    pub(crate) fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn task_ctx(&mut self, now: Instant, task_id: u64) -> TaskContext<'_> {
        TaskContext {
            now,
            task_id,
            world: self.world.as_ref(),
            memory: &mut self.memory,
            timers: &mut self.timers,
            config: &self.config,
            state: &mut self.state,
            rng: &mut self.rng,
            effects: &mut self.effects,
        }
    }

    fn view(&self, now: Instant, task_id: u64) -> TaskView<'_> {
        TaskView {
            now,
            task_id,
            world: self.world.as_ref(),
            memory: &self.memory,
            config: &self.config,
            state: &self.state,
        }
    }

    fn plan_ctx(&mut self, now: Instant, me: SelfState) -> PlanContext<'_> {
        PlanContext {
            now,
            me,
            world: self.world.as_ref(),
            memory: &self.memory,
            config: &self.config,
            state: &self.state,
            rng: &mut self.rng,
        }
    }

    pub(crate) fn say(&self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if let Err(e) = self.world.chat(line) {
                warn!(error = %e, "Failed to send chat");
            }
        }
    }

    pub(crate) fn position_context(&self) -> String {
        match self.world.self_state() {
            Some(me) => format!("Bot position: {}", me.position),
            None => "Bot position: unknown".into(),
        }
    }

    pub(crate) fn cancel_command_collect(&mut self) {
        if let Some((ticket, block)) = self.pending_command_collect.take() {
            debug!(ticket, block = %block, "Cancelling manual collect");
            self.world.cancel_collect();
            self.effects.push(Effect::CancelCollect { ticket });
        }
    }

    fn publish(&self, event: BrainEvent) {
        self.events.publish(event);
    }
}

struct ActiveTask {
    id: u64,
    started_at: Instant,
    task: Box<dyn Task>,
}

enum Verdict {
    Keep { preemptible: bool },
    End(EndReason),
}

pub struct Brain {
    core: BrainCore,
    current: Option<ActiveTask>,
    commands: CommandRegistry,
    stopped: bool,
}

impl Brain {
    pub fn new(
        config: BrainConfig,
        world: Arc<dyn WorldInterface>,
        events: Arc<EventBus>,
        now: Instant,
    ) -> Self {
        Self::with_rng(config, world, events, now, StdRng::from_os_rng())
    }

    /// Deterministic variant for simulations and tests.
    pub fn with_seed(
        config: BrainConfig,
        world: Arc<dyn WorldInterface>,
        events: Arc<EventBus>,
        now: Instant,
        seed: u64,
    ) -> Self {
        Self::with_rng(config, world, events, now, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: BrainConfig,
        world: Arc<dyn WorldInterface>,
        events: Arc<EventBus>,
        now: Instant,
        rng: StdRng,
    ) -> Self {
        let memory = WorldMemory::new(config.memory.clone(), world.username());
        let commands = CommandRegistry::new(&config);
        Self {
            core: BrainCore {
                config,
                world,
                memory,
                timers: TimerRegistry::new(),
                state: BrainState::new(now),
                rng,
                effects: Vec::new(),
                events,
                pending_command_collect: None,
                next_id: 0,
            },
            current: None,
            commands,
            stopped: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn config(&self) -> &BrainConfig {
        &self.core.config
    }

    pub fn world(&self) -> Arc<dyn WorldInterface> {
        Arc::clone(&self.core.world)
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.core.events)
    }

    pub fn memory(&self) -> &WorldMemory {
        &self.core.memory
    }

    pub fn state(&self) -> &BrainState {
        &self.core.state
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Id and kind of the active task.
    pub fn current_task(&self) -> Option<(u64, TaskKind)> {
        self.current.as_ref().map(|a| (a.id, a.task.kind()))
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.core.effects)
    }

    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.core.timers.next_deadline()
    }

    pub fn is_shut_down(&self) -> bool {
        self.stopped
    }

    pub fn pending_timers(&self) -> usize {
        self.core.timers.len()
    }

    // ── Periodic cycles ───────────────────────────────────────────────

    /// Refresh memory from the world's current snapshot.
    pub fn scan(&mut self, now: Instant) {
        let Some(me) = self.core.world.self_state() else {
            return;
        };
        self.core.memory.forget_stale(now);
        let world = Arc::clone(&self.core.world);
        self.core
            .memory
            .record_scan(&world.entities(), &world.roster(), now);

        let config = &self.core.config;
        if !(config.allow_mining || config.allow_wood) {
            return;
        }
        let query = BlockQuery {
            kinds: resource_kinds(config.allow_mining, config.allow_wood),
            max_distance: config.resource_scan_radius,
            count: config.resource_scan_count,
        };
        let blocks: Vec<Block> = world
            .find_blocks(&query)
            .into_iter()
            .filter_map(|pos| world.block_at(pos))
            .collect();
        self.core.memory.record_resources(blocks, &me.position, now);
    }

    /// One planning tick.
    pub fn decide(&mut self, now: Instant) {
        if !self.core.config.enabled || self.core.state.is_paused(now) {
            return;
        }
        if let Some(ticket) = self.core.state.async_task {
            trace!(ticket, "Collect in flight, skipping plan");
            return;
        }
        let Some(me) = self.core.world.self_state() else {
            return;
        };

        let world = Arc::clone(&self.core.world);
        self.core
            .memory
            .revalidate_resources(|pos| world.block_at(pos));

        let verdict = self.current.as_ref().map(|active| {
            let timeout = Duration::from_millis(self.core.config.task_timeout_ms);
            if now.saturating_duration_since(active.started_at) >= timeout {
                Verdict::End(EndReason::TimedOut)
            } else if !active.task.should_continue(&self.core.view(now, active.id)) {
                Verdict::End(EndReason::PredicateFailed)
            } else {
                Verdict::Keep {
                    preemptible: !matches!(active.task.kind(), TaskKind::Combat | TaskKind::Evade),
                }
            }
        });

        match verdict {
            Some(Verdict::Keep { preemptible }) => {
                if preemptible {
                    if let Some(plan) = planner::threat_response(&mut self.core.plan_ctx(now, me)) {
                        self.start(now, "threat", plan);
                    }
                }
                return;
            }
            Some(Verdict::End(reason)) => {
                if reason == EndReason::TimedOut {
                    warn!("Task exceeded its time budget");
                }
                self.end_current(now, reason);
            }
            None => {}
        }

        if let Some((rule, plan)) = planner::plan(&mut self.core.plan_ctx(now, me)) {
            self.start(now, rule, plan);
        }
    }

    /// Fire every timer that came due.
    pub fn run_due_timers(&mut self, now: Instant) {
        for due in self.core.timers.pop_due(now) {
            match due.action {
                TimerAction::ReleaseControl(control) => {
                    self.core.world.set_control(control, false);
                }
                TimerAction::TaskStep(step) => {
                    let Some(active) = self.current.as_mut() else {
                        continue;
                    };
                    if due.bucket == Some(active.id) {
                        active
                            .task
                            .on_timer(step, &mut self.core.task_ctx(now, active.id));
                    }
                }
                TimerAction::Chat(line) => {
                    if self.core.state.is_paused(now) {
                        debug!("Dropping ambient line while paused");
                        continue;
                    }
                    self.core.say(&line);
                    self.core.publish(BrainEvent::Socialized {
                        line,
                        timestamp: Utc::now(),
                    });
                }
            }
        }
    }

    /// Ambient-social tick: ask for a line to say.
    pub fn social(&mut self, now: Instant) {
        if !self.core.config.enabled || self.core.state.is_paused(now) {
            return;
        }
        let Some(me) = self.core.world.self_state() else {
            return;
        };

        let mut context = Vec::new();
        if let Some((name, player)) = self.core.memory.nearest_player(&me.position) {
            context.push(format!("Nearest player {name} at {}", player.position));
        }
        if let Some(active) = &self.current {
            context.push(format!("Current task {}", active.task.kind()));
        }

        let id = self.core.next_id();
        self.core.effects.push(Effect::Dialogue(DialogueRequest {
            id,
            purpose: DialoguePurpose::Ambient,
            prompt: AMBIENT_PROMPT.into(),
            context: context.join(". "),
        }));
        self.core.state.last_ambient_chat = Some(now);
    }

    /// Idle-gesture tick.
    pub fn gesture(&mut self, now: Instant) {
        let core = &mut self.core;
        if !core.config.enabled || core.state.is_paused(now) || core.state.async_task.is_some() {
            return;
        }
        let current = self.current.as_ref().map(|a| a.task.kind());
        if current.is_some_and(|k| k.suppresses_gestures()) {
            return;
        }
        let done = gestures::perform(&mut GestureContext {
            now,
            world: core.world.as_ref(),
            memory: &core.memory,
            config: &core.config.idle,
            timers: &mut core.timers,
            rng: &mut core.rng,
            current,
        });
        if !done.is_empty() {
            debug!(gestures = ?done, "Idle gestures");
        }
    }

    // ── External signals ──────────────────────────────────────────────

    /// Suspend autonomy for `duration_ms`. The pause is only ever extended.
    pub fn pause(&mut self, now: Instant, duration_ms: u64) {
        let until = now + Duration::from_millis(duration_ms);
        if until > self.core.state.paused_until {
            self.core.state.paused_until = until;
        }
        self.end_current(now, EndReason::Paused);
        debug!(duration_ms, "Autonomy paused");
        self.core.publish(BrainEvent::Paused {
            duration_ms,
            timestamp: Utc::now(),
        });
    }

    /// A player took manual control. Defaults to `manual_pause_ms`.
    pub fn notify_manual_activity(&mut self, now: Instant, duration_ms: Option<u64>) {
        let duration_ms = duration_ms.unwrap_or(self.core.config.manual_pause_ms);
        self.pause(now, duration_ms);
    }

    /// Stop everything. Called on disconnect.
    pub fn shutdown(&mut self, now: Instant) {
        self.end_current(now, EndReason::Shutdown);
        self.core.cancel_command_collect();
        self.core.timers.clear();
        self.core.world.clear_controls();
        self.stopped = true;
        info!("Brain shut down");
    }

    /// Completion of a `collect_block` started by an [`Effect::Collect`].
    pub fn finish_collect(&mut self, ticket: u64, result: Result<(), WorldError>, now: Instant) {
        let is_current = self.core.state.async_task == Some(ticket)
            && self.current.as_ref().is_some_and(|a| a.id == ticket);
        if is_current {
            self.core.state.async_task = None;
            let reason = match &result {
                Ok(()) => EndReason::Completed,
                Err(e) => {
                    warn!(error = %e, "Collection failed");
                    EndReason::Failed
                }
            };
            self.end_current(now, reason);
            return;
        }

        if let Some((pending, block)) = self.core.pending_command_collect.take() {
            if pending == ticket {
                match result {
                    Ok(()) => self.core.say(&format!("Finished mining {block}")),
                    Err(e) => self.core.say(&format!("Could not mine {block}: {e}")),
                }
                return;
            }
            self.core.pending_command_collect = Some((pending, block));
        }

        debug!(ticket, "Ignoring stale collect result");
    }

    /// Completion of an [`Effect::Dialogue`] request.
    pub fn finish_dialogue(
        &mut self,
        request: DialogueRequest,
        result: Result<String, DialogueError>,
        now: Instant,
    ) {
        if let Err(e) = &result {
            debug!(error = %e, purpose = ?request.purpose, "Dialogue provider failed");
        }
        let text = result.ok().filter(|t| !t.trim().is_empty());

        match request.purpose {
            DialoguePurpose::Ambient => {
                let line = text.unwrap_or_else(|| canned_line(&mut self.core.rng).to_string());
                let delay = &self.core.config.chat_delay;
                let delay_ms = random_duration(&mut self.core.rng, delay.min_ms, delay.max_ms, 0);
                self.core.timers.schedule(
                    now,
                    Duration::from_millis(delay_ms),
                    None,
                    TimerAction::Chat(line),
                );
            }
            DialoguePurpose::Whisper { username } => {
                let reply = text.unwrap_or_else(|| canned_line(&mut self.core.rng).to_string());
                if let Err(e) = self.core.world.whisper(&username, &reply) {
                    warn!(error = %e, player = %username, "Failed to whisper");
                }
            }
            DialoguePurpose::Command => {
                let reply = text.unwrap_or_else(|| NO_AI_RESPONSE.to_string());
                self.core.say(&reply);
            }
        }
    }

    // ── World events ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: WorldEvent, now: Instant) {
        match event {
            WorldEvent::Spawned => {
                info!("Spawned");
                self.core.memory =
                    WorldMemory::new(self.core.config.memory.clone(), self.core.world.username());
                self.pause(now, self.core.config.idle_pause_ms);
                self.note("Bot spawned in the world.".into());
            }
            WorldEvent::SelfHurt => {
                self.core.state.last_damage_at = Some(now);
                if let Some(me) = self.core.world.self_state() {
                    warn!(health = me.health, "Took damage");
                }
            }
            WorldEvent::EntitySpawned { entity } => self.remember_entity(entity, now),
            WorldEvent::EntityGone { entity } => match entity {
                ObservedEntity::Hostile { id, .. } => self.core.memory.forget_hostile(id),
                ObservedEntity::Item { id, .. } => self.core.memory.forget_item(id),
                _ => {}
            },
            WorldEvent::BlockUpdated { old, new } => self.block_updated(old, new, now),
            WorldEvent::PlayerJoined { entry } | WorldEvent::PlayerUpdated { entry } => {
                self.core.memory.note_roster(&entry, now);
            }
            WorldEvent::PlayerLeft { username } => self.core.memory.player_left(&username),
            WorldEvent::PlayerCollected {
                collector,
                position,
            } => {
                if collector != self.core.world.username() {
                    self.core.memory.note_poi(position, "collection", now);
                }
            }
            WorldEvent::Chat { username, message } => self.on_chat(username, message, now),
            WorldEvent::Whisper { username, message } => self.on_whisper(username, message, now),
            WorldEvent::HealthChanged { health } => {
                if health < LOW_HEALTH_WARNING {
                    warn!(health, "Low health");
                }
            }
            WorldEvent::Died => self.on_death(now),
            WorldEvent::Disconnected { reason } => {
                warn!(reason = %reason, "Disconnected");
                self.shutdown(now);
            }
        }
    }

    fn note(&mut self, text: String) {
        self.core.effects.push(Effect::DialogueNote(text));
    }

    fn remember_entity(&mut self, entity: ObservedEntity, now: Instant) {
        let memory = &mut self.core.memory;
        match entity {
            ObservedEntity::Player {
                id,
                username,
                position,
                velocity,
            } => memory.remember_player(&username, id, position, velocity, now),
            ObservedEntity::Hostile {
                id, name, position, ..
            } => memory.remember_hostile(id, &name, position, now),
            ObservedEntity::Item { id, kind, position } => {
                memory.remember_item(id, &kind, position, now)
            }
            ObservedEntity::Other { .. } => {}
        }
    }

    fn block_updated(&mut self, old: Option<Block>, new: Option<Block>, now: Instant) {
        let Some(position) = new.as_ref().or(old.as_ref()).map(|b| b.position) else {
            return;
        };
        if let Some(block) = new.as_ref().filter(|b| is_interesting_block(&b.kind)) {
            self.core
                .memory
                .note_poi(position.center(), block.kind.clone(), now);
        }
        let changed = self
            .core
            .memory
            .resource_targets()
            .iter()
            .any(|t| t.position == position && new.as_ref().is_none_or(|b| b.kind != t.block_kind));
        if changed {
            self.core.memory.remove_resource_target(position);
        }
    }

    fn on_chat(&mut self, username: String, message: String, now: Instant) {
        let me = self.core.world.username().to_string();
        if username == me {
            return;
        }
        info!(player = %username, "<{username}> {message}");

        let is_command = message.starts_with('!');
        if !is_command {
            self.note(format!("{username}: {message}"));
        }
        self.core.memory.note_chat(&username, &message, now);

        if message.to_lowercase().contains(&me.to_lowercase()) {
            self.pause(now, self.core.config.idle_pause_ms);
        }
        if is_command {
            self.execute_command(&username, &message, now);
        }
    }

    fn on_whisper(&mut self, username: String, message: String, now: Instant) {
        if username == self.core.world.username() {
            return;
        }
        info!(player = %username, "Whisper received");
        self.pause(now, self.core.config.idle_pause_ms);
        self.note(format!("whisper from {username}: {message}"));
        let context = self.core.position_context();
        let id = self.core.next_id();
        self.core.effects.push(Effect::Dialogue(DialogueRequest {
            id,
            purpose: DialoguePurpose::Whisper { username },
            prompt: message,
            context,
        }));
    }

    fn execute_command(&mut self, username: &str, message: &str, now: Instant) {
        let mut parts = message.trim_start_matches('!').split_whitespace();
        let Some(name) = parts.next() else {
            return;
        };
        let args: Vec<&str> = parts.collect();

        if !self.commands.contains(name) {
            self.core
                .say(&format!("Unknown command {name}. Try !help"));
            self.core.publish(BrainEvent::CommandHandled {
                name: name.to_string(),
                success: false,
                timestamp: Utc::now(),
            });
            return;
        }

        self.notify_manual_activity(now, None);
        let result = self.commands.execute(name, &mut self.core, &args);
        let success = match result {
            Ok(reply) => {
                info!(player = username, command = name, "Command handled");
                if let Some(reply) = reply {
                    self.core.say(&reply);
                }
                true
            }
            Err(e) => {
                warn!(player = username, command = name, error = %e, "Command failed");
                self.core.say(&e.to_string());
                false
            }
        };
        self.core.publish(BrainEvent::CommandHandled {
            name: name.to_string(),
            success,
            timestamp: Utc::now(),
        });
    }

    fn on_death(&mut self, now: Instant) {
        warn!("Died");
        self.end_current(now, EndReason::Died);
        self.core.cancel_command_collect();
        self.core.timers.clear();
        self.core.memory.clear_transient();
        self.core.world.clear_controls();

        let paused_until = self.core.state.paused_until;
        self.core.state = BrainState::new(now);
        self.core.state.paused_until = paused_until;

        self.pause(now, self.core.config.death_pause_ms);
        self.core.publish(BrainEvent::Died {
            timestamp: Utc::now(),
        });
    }

    // ── Task lifecycle ────────────────────────────────────────────────

    fn start(&mut self, now: Instant, rule: &str, plan: Plan) {
        self.end_current(now, EndReason::Switching);

        let id = self.core.next_id();
        let mut task = tasks::build(plan);
        let kind = task.kind();
        let target = task.describe();
        info!(task = %kind, target = %target, rule, "Starting task");
        task.engage(&mut self.core.task_ctx(now, id));

        self.core.publish(BrainEvent::TaskEngaged {
            task_id: id,
            kind,
            target,
            timestamp: Utc::now(),
        });
        self.current = Some(ActiveTask {
            id,
            started_at: now,
            task,
        });
    }

    fn end_current(&mut self, now: Instant, reason: EndReason) {
        let Some(mut active) = self.current.take() else {
            return;
        };
        let kind = active.task.kind();
        self.core.timers.cancel_bucket(active.id);
        active
            .task
            .cleanup(&mut self.core.task_ctx(now, active.id), reason);
        self.core.timers.cancel_bucket(active.id);
        if self.core.state.async_task == Some(active.id) {
            self.core.state.async_task = None;
        }
        info!(task = %kind, reason = reason.as_str(), "Task ended");

        self.core.publish(BrainEvent::TaskEnded {
            task_id: active.id,
            kind,
            reason,
            timestamp: Utc::now(),
        });
    }
}
