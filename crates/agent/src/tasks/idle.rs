//! Idle behaviors that make the agent look alive between real work.

use std::f64::consts::FRAC_PI_2;
use std::time::Duration;

use brainstem_core::{Control, EndReason, Hand, TaskKind};
use rand::Rng;
use tokio::time::Instant;
use tracing::debug;

use crate::task::{Task, TaskContext, TaskView, random_duration};
use crate::timers::{TaskStep, TimerAction};

const EYE_HEIGHT: f64 = 1.6;

fn within(started_at: Option<Instant>, now: Instant, duration_ms: u64) -> bool {
    started_at
        .is_some_and(|start| now.saturating_duration_since(start) < Duration::from_millis(duration_ms))
}

/// Stand still and glance around.
pub struct ObserveTask {
    duration_ms: u64,
    started_at: Option<Instant>,
}

impl ObserveTask {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            started_at: None,
        }
    }

    fn glance(&self, ctx: &mut TaskContext<'_>) {
        let Some(me) = ctx.world.self_state() else {
            return;
        };
        let yaw = me.yaw + ctx.rng.random_range(-FRAC_PI_2..FRAC_PI_2);
        let distance = ctx.rng.random_range(3.0..7.0);
        let height = EYE_HEIGHT + ctx.rng.random_range(-0.2..0.2);
        ctx.look_at(me.position.along_yaw(yaw, distance, height));
        if ctx.rng.random_bool(0.3) {
            ctx.world.swing_arm(Hand::Right);
        }
    }

    fn schedule_glance(&self, ctx: &mut TaskContext<'_>) {
        let delay = random_duration(ctx.rng, 600, 1_500, 0);
        ctx.schedule_step(delay, TaskStep::ObserveLook);
    }
}

impl Task for ObserveTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Observe
    }

    fn describe(&self) -> String {
        format!("{}ms", self.duration_ms)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.started_at = Some(ctx.now);
        ctx.state.last_observation = Some(ctx.now);
        ctx.world.clear_goal();
        ctx.world.clear_controls();
        self.glance(ctx);
        self.schedule_glance(ctx);
        debug!(duration_ms = self.duration_ms, "Observing surroundings");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        within(self.started_at, view.now, self.duration_ms)
    }

    fn on_timer(&mut self, step: TaskStep, ctx: &mut TaskContext<'_>) {
        if step == TaskStep::ObserveLook && within(self.started_at, ctx.now, self.duration_ms) {
            self.glance(ctx);
            self.schedule_glance(ctx);
        }
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.world.clear_controls();
    }
}

/// Walk forward aimlessly with the odd jump, strafe or sprint.
pub struct StrollTask {
    duration_ms: u64,
    started_at: Option<Instant>,
}

impl StrollTask {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            started_at: None,
        }
    }

    /// Press a key now and release it after a random hold.
    fn tap(ctx: &mut TaskContext<'_>, control: Control, hold_min_ms: u64, hold_max_ms: u64) {
        ctx.world.set_control(control, true);
        let hold = random_duration(ctx.rng, hold_min_ms, hold_max_ms, 0);
        ctx.schedule(hold, TimerAction::ReleaseControl(control));
    }

    fn pump(&self, ctx: &mut TaskContext<'_>) {
        if let Some(me) = ctx.world.self_state() {
            let yaw = me.yaw + ctx.rng.random_range(-0.45..0.45);
            ctx.look_at(me.position.along_yaw(yaw, 4.0, EYE_HEIGHT));
        }
        if ctx.rng.random_bool(0.35) {
            ctx.world.swing_arm(Hand::Right);
        }
        if ctx.rng.random_bool(0.25) {
            Self::tap(ctx, Control::Jump, 180, 400);
        }
        if ctx.rng.random_bool(0.2) {
            let side = if ctx.rng.random_bool(0.5) {
                Control::Left
            } else {
                Control::Right
            };
            Self::tap(ctx, side, 320, 580);
        }
        if ctx.rng.random_bool(0.1) {
            Self::tap(ctx, Control::Sprint, 900, 1_800);
        }

        let next = random_duration(ctx.rng, 450, 1_200, 0);
        ctx.schedule_step(next, TaskStep::StrollPump);
    }
}

impl Task for StrollTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Stroll
    }

    fn describe(&self) -> String {
        format!("{}ms", self.duration_ms)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        self.started_at = Some(ctx.now);
        ctx.state.last_stroll = Some(ctx.now);
        ctx.world.clear_goal();
        ctx.world.clear_controls();
        ctx.world.set_control(Control::Forward, true);
        self.pump(ctx);
        ctx.schedule_step(self.duration_ms + 100, TaskStep::StrollFinish);
        debug!(duration_ms = self.duration_ms, "Strolling");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        within(self.started_at, view.now, self.duration_ms)
    }

    fn on_timer(&mut self, step: TaskStep, ctx: &mut TaskContext<'_>) {
        match step {
            TaskStep::StrollPump if within(self.started_at, ctx.now, self.duration_ms) => {
                self.pump(ctx)
            }
            TaskStep::StrollFinish => ctx.world.clear_controls(),
            _ => {}
        }
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, _reason: EndReason) {
        ctx.world.clear_controls();
    }
}
