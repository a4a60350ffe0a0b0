//! Drives a [`Brain`] on the tokio runtime.
//!
//! One task owns the brain. It multiplexes the four periodic cycles, the
//! brain's own timers, world events, external commands and the results of
//! the futures it spawned for [`Effect`]s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brainstem_core::{
    BlockPos, BrainEvent, DialogueError, DialogueProvider, EventBus, WorldError, WorldEvent,
    WorldInterface,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until, timeout};
use tracing::{debug, info};

use crate::brain::Brain;
use crate::task::{DialogueRequest, Effect};

const IDLE_WAKEUP: Duration = Duration::from_secs(3_600);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Brain runtime has stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrainCommand {
    Pause(u64),
    ManualActivity(Option<u64>),
    Shutdown,
}

/// Cheap, cloneable control surface for a running brain.
#[derive(Clone)]
pub struct BrainHandle {
    commands: mpsc::Sender<BrainCommand>,
    events: Arc<EventBus>,
}

impl BrainHandle {
    pub async fn pause(&self, duration_ms: u64) -> Result<(), RuntimeError> {
        self.send(BrainCommand::Pause(duration_ms)).await
    }

    pub async fn notify_manual_activity(&self, duration_ms: Option<u64>) -> Result<(), RuntimeError> {
        self.send(BrainCommand::ManualActivity(duration_ms)).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(BrainCommand::Shutdown).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BrainEvent>> {
        self.events.subscribe()
    }

    async fn send(&self, command: BrainCommand) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }
}

enum Completion {
    Collect {
        ticket: u64,
        result: Result<(), WorldError>,
    },
    Dialogue {
        request: DialogueRequest,
        result: Result<String, DialogueError>,
    },
}

pub struct BrainRuntime {
    brain: Brain,
    world: Arc<dyn WorldInterface>,
    dialogue: Arc<dyn DialogueProvider>,
    dialogue_timeout: Duration,
    events: Arc<EventBus>,
    world_events: mpsc::Receiver<WorldEvent>,
}

impl BrainRuntime {
    pub fn new(
        brain: Brain,
        dialogue: Arc<dyn DialogueProvider>,
        world_events: mpsc::Receiver<WorldEvent>,
    ) -> Self {
        Self {
            world: brain.world(),
            events: brain.events(),
            brain,
            dialogue,
            dialogue_timeout: Duration::from_millis(10_000),
            world_events,
        }
    }

    pub fn with_dialogue_timeout(mut self, timeout_ms: u64) -> Self {
        self.dialogue_timeout = Duration::from_millis(timeout_ms);
        self
    }

    /// Start the loop. The join handle yields the brain back after shutdown
    /// so callers can inspect what it remembered.
    pub fn spawn(self) -> (BrainHandle, JoinHandle<Brain>) {
        let (tx, rx) = mpsc::channel(32);
        let handle = BrainHandle {
            commands: tx,
            events: Arc::clone(&self.events),
        };
        let join = tokio::spawn(self.run(rx));
        (handle, join)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<BrainCommand>) -> Brain {
        let config = self.brain.config().clone();
        let start = Instant::now();
        let every = |ms: u64| {
            let period = Duration::from_millis(ms);
            let mut tick = interval_at(start + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tick
        };
        let mut scan = every(config.scan_interval_ms);
        let mut decide = every(config.decision_interval_ms);
        let mut social = every(config.social_interval_ms);
        let mut gesture = every(config.idle.gesture_interval_ms);

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut collects: HashMap<u64, AbortHandle> = HashMap::new();

        info!("Brain runtime started");
        self.brain.scan(start);

        loop {
            let wake = self
                .brain
                .next_timer_deadline()
                .unwrap_or_else(|| Instant::now() + IDLE_WAKEUP);

            tokio::select! {
                _ = scan.tick() => self.brain.scan(Instant::now()),
                _ = decide.tick() => self.brain.decide(Instant::now()),
                _ = social.tick() => self.brain.social(Instant::now()),
                _ = gesture.tick() => self.brain.gesture(Instant::now()),
                _ = sleep_until(wake) => self.brain.run_due_timers(Instant::now()),
                event = self.world_events.recv() => match event {
                    Some(event) => self.brain.handle_event(event, Instant::now()),
                    None => self.brain.shutdown(Instant::now()),
                },
                command = commands.recv() => match command {
                    Some(BrainCommand::Pause(ms)) => self.brain.pause(Instant::now(), ms),
                    Some(BrainCommand::ManualActivity(ms)) => {
                        self.brain.notify_manual_activity(Instant::now(), ms)
                    }
                    Some(BrainCommand::Shutdown) | None => self.brain.shutdown(Instant::now()),
                },
                Some(done) = done_rx.recv() => match done {
                    Completion::Collect { ticket, result } => {
                        collects.remove(&ticket);
                        self.brain.finish_collect(ticket, result, Instant::now());
                    }
                    Completion::Dialogue { request, result } => {
                        self.brain.finish_dialogue(request, result, Instant::now());
                    }
                },
            }

            for effect in self.brain.drain_effects() {
                self.dispatch(effect, &done_tx, &mut collects);
            }

            if self.brain.is_shut_down() {
                for (_, handle) in collects.drain() {
                    handle.abort();
                }
                info!("Brain runtime stopped");
                return self.brain;
            }
        }
    }

    fn dispatch(
        &self,
        effect: Effect,
        done: &mpsc::UnboundedSender<Completion>,
        collects: &mut HashMap<u64, AbortHandle>,
    ) {
        match effect {
            Effect::Collect { ticket, position } => {
                let handle = self.spawn_collect(ticket, position, done.clone());
                collects.insert(ticket, handle);
            }
            Effect::CancelCollect { ticket } => {
                if let Some(handle) = collects.remove(&ticket) {
                    debug!(ticket, "Aborting collect");
                    handle.abort();
                }
            }
            Effect::Dialogue(request) => {
                let dialogue = Arc::clone(&self.dialogue);
                let limit = self.dialogue_timeout;
                let done = done.clone();
                tokio::spawn(async move {
                    let reply = dialogue.chat(&request.prompt, &request.context);
                    let result = match timeout(limit, reply).await {
                        Ok(result) => result,
                        Err(_) => Err(DialogueError::Timeout(limit.as_millis() as u64)),
                    };
                    let _ = done.send(Completion::Dialogue { request, result });
                });
            }
            Effect::DialogueNote(note) => self.dialogue.observe(&note),
        }
    }

    fn spawn_collect(
        &self,
        ticket: u64,
        position: BlockPos,
        done: mpsc::UnboundedSender<Completion>,
    ) -> AbortHandle {
        let world = Arc::clone(&self.world);
        tokio::spawn(async move {
            let result = world.collect_block(position).await;
            let _ = done.send(Completion::Collect { ticket, result });
        })
        .abort_handle()
    }
}
