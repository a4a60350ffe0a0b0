//! Small idle gestures layered on top of whatever the agent is doing:
//! glances, arm swings, the odd hop or sidestep. They never set a goal.

use std::time::Duration;

use brainstem_config::IdleConfig;
use brainstem_core::{Control, Hand, TaskKind, Vec3, WorldInterface};
use brainstem_memory::WorldMemory;
use rand::Rng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::debug;

use crate::task::random_duration;
use crate::timers::{TimerAction, TimerRegistry};

const EYE_HEIGHT: f64 = 1.6;

pub(crate) struct GestureContext<'a> {
    pub now: Instant,
    pub world: &'a dyn WorldInterface,
    pub memory: &'a WorldMemory,
    pub config: &'a IdleConfig,
    pub timers: &'a mut TimerRegistry,
    pub rng: &'a mut StdRng,
    pub current: Option<TaskKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gesture {
    LookAtPlayer,
    LookAround,
    Strafe,
    Jump,
    Swing,
    Sneak,
}

impl GestureContext<'_> {
    fn hold(&mut self, control: Control, min_ms: u64, max_ms: u64) {
        self.world.set_control(control, true);
        let delay = random_duration(self.rng, min_ms, max_ms, 0);
        self.timers.schedule(
            self.now,
            Duration::from_millis(delay),
            None,
            TimerAction::ReleaseControl(control),
        );
    }

    fn look(&self, target: Vec3) {
        if let Err(e) = self.world.look_at(target) {
            debug!(error = %e, "gesture look failed");
        }
    }
}

/// Roll the gesture dice once. Returns what was performed.
pub(crate) fn perform(ctx: &mut GestureContext<'_>) -> Vec<Gesture> {
    let mut done = Vec::new();
    let Some(me) = ctx.world.self_state() else {
        return done;
    };

    let nearby_player = ctx
        .memory
        .nearest_player(&me.position)
        .map(|(_, p)| p.position)
        .filter(|p| p.distance_to(&me.position) <= ctx.config.look_at_player_range);

    match nearby_player {
        Some(player) if ctx.rng.random_bool(0.7) => {
            ctx.look(player.offset(0.0, EYE_HEIGHT, 0.0));
            done.push(Gesture::LookAtPlayer);
            if ctx.rng.random_bool(0.35) {
                ctx.world.swing_arm(Hand::Right);
                done.push(Gesture::Swing);
            }
        }
        _ => {
            if ctx.rng.random_bool(0.45) {
                let yaw = me.yaw + ctx.rng.random_range(-0.6..0.6);
                let distance = ctx.rng.random_range(3.0..7.0);
                let height = EYE_HEIGHT + ctx.rng.random_range(-0.15..0.15);
                ctx.look(me.position.along_yaw(yaw, distance, height));
                done.push(Gesture::LookAround);
            }
        }
    }

    let idle_body = matches!(ctx.current, Some(TaskKind::Observe | TaskKind::Stroll));
    let may_move =
        ctx.world.current_goal().is_none() || idle_body || ctx.rng.random_bool(0.1);
    if may_move {
        if ctx.rng.random_bool(0.14) {
            let side = if ctx.rng.random_bool(0.5) {
                Control::Left
            } else {
                Control::Right
            };
            ctx.hold(side, 260, 520);
            done.push(Gesture::Strafe);
        }
        if ctx.rng.random_bool(0.18) {
            ctx.hold(Control::Jump, 180, 420);
            done.push(Gesture::Jump);
        }
    }

    if !done.contains(&Gesture::Swing) && ctx.rng.random_bool(0.08) {
        ctx.world.swing_arm(Hand::Right);
        done.push(Gesture::Swing);
    }

    if ctx.rng.random_bool(0.05) {
        ctx.hold(Control::Sneak, 600, 1_800);
        done.push(Gesture::Sneak);
    }

    done
}
