//! Melee combat: `Engaging → Attacking → Disengaged`.
//!
//! Two bucketed loops drive the fight: a look loop keeps the head on the
//! target, a swing loop attacks whenever the target is in melee range.

use brainstem_core::{
    Control, EndReason, EntityId, EquipSlot, GoalHandle, ItemStack, NavGoal, TaskKind, Vec3,
};
use rand::Rng;
use tracing::{debug, info};

use crate::task::{Task, TaskContext, TaskView};
use crate::timers::{TaskStep, TimerAction};

/// Melee weapons by preference.
const WEAPONS: &[(&str, u8)] = &[
    ("netherite_sword", 10),
    ("diamond_sword", 9),
    ("netherite_axe", 8),
    ("iron_sword", 7),
    ("diamond_axe", 7),
    ("iron_axe", 6),
    ("stone_sword", 5),
    ("golden_sword", 4),
    ("stone_axe", 4),
    ("wooden_sword", 3),
    ("golden_axe", 2),
    ("wooden_axe", 2),
    ("trident", 6),
];

const SHIELD: &str = "shield";

const EYE_HEIGHT: f64 = 1.6;
const JUMP_HOLD_MS: u64 = 200;

/// Best melee weapon carried, if any.
pub fn best_weapon(inventory: &[ItemStack]) -> Option<&str> {
    inventory
        .iter()
        .filter(|stack| stack.count > 0)
        .filter_map(|stack| {
            WEAPONS
                .iter()
                .find(|(name, _)| *name == stack.kind)
                .map(|(name, rank)| (*name, *rank))
        })
        .max_by_key(|(_, rank)| *rank)
        .map(|(name, _)| name)
}

pub fn has_shield(inventory: &[ItemStack]) -> bool {
    inventory.iter().any(|s| s.kind == SHIELD && s.count > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    Engaging,
    Attacking,
    Disengaged,
}

pub struct CombatTask {
    target: EntityId,
    name: String,
    phase: CombatPhase,
    goal: Option<GoalHandle>,
}

impl CombatTask {
    pub fn new(target: EntityId, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
            phase: CombatPhase::Engaging,
            goal: None,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    fn target_position(&self, ctx: &TaskContext<'_>) -> Option<Vec3> {
        ctx.world.entity(self.target).map(|e| e.position())
    }

    fn look_step(&mut self, ctx: &mut TaskContext<'_>) {
        if let Some(pos) = self.target_position(ctx) {
            ctx.look_at(pos.offset(0.0, EYE_HEIGHT, 0.0));
        }
        ctx.schedule_step(ctx.config.combat.look_interval_ms, TaskStep::CombatLook);
    }

    fn swing_step(&mut self, ctx: &mut TaskContext<'_>) {
        let config = ctx.config;
        let combat = &config.combat;
        let in_range = match (ctx.self_position(), self.target_position(ctx)) {
            (Some(me), Some(target)) => me.distance_to(&target) <= combat.melee_range,
            _ => false,
        };

        if in_range {
            if self.phase == CombatPhase::Engaging {
                debug!(target = %self.name, "In melee range");
            }
            self.phase = CombatPhase::Attacking;
            if let Err(e) = ctx.world.attack(self.target) {
                debug!(error = %e, "attack failed");
            }
            if ctx.rng.random_bool(combat.jump_chance.clamp(0.0, 1.0)) {
                ctx.world.set_control(Control::Jump, true);
                ctx.schedule(JUMP_HOLD_MS, TimerAction::ReleaseControl(Control::Jump));
            }
        } else {
            self.phase = CombatPhase::Engaging;
        }

        ctx.schedule_step(combat.swing_interval_ms, TaskStep::CombatSwing);
    }
}

impl Task for CombatTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Combat
    }

    fn describe(&self) -> String {
        format!("{} #{}", self.name, self.target)
    }

    fn engage(&mut self, ctx: &mut TaskContext<'_>) {
        let inventory = ctx.world.inventory();
        if let Some(weapon) = best_weapon(&inventory) {
            if let Err(e) = ctx.world.equip(weapon, EquipSlot::Hand) {
                debug!(error = %e, weapon, "Failed to equip weapon");
            }
        }
        if has_shield(&inventory) {
            if let Err(e) = ctx.world.equip(SHIELD, EquipSlot::OffHand) {
                debug!(error = %e, "Failed to equip shield");
            }
        }

        let range = (ctx.config.combat.melee_range - 1.0).max(1.0);
        self.goal = ctx.set_goal(NavGoal::Follow {
            entity: self.target,
            range,
        });
        self.phase = CombatPhase::Engaging;

        ctx.schedule_step(ctx.config.combat.look_interval_ms, TaskStep::CombatLook);
        ctx.schedule_step(ctx.config.combat.swing_interval_ms, TaskStep::CombatSwing);
        info!(target = %self.name, id = self.target, "Engaging hostile");
    }

    fn should_continue(&self, view: &TaskView<'_>) -> bool {
        let Some(me) = view.world.self_state() else {
            return false;
        };
        let Some(target) = view.world.entity(self.target) else {
            return false;
        };
        target.is_alive()
            && me.position.distance_to(&target.position()) <= view.config.combat.max_chase_distance
            && me.health > view.config.combat.disengage_health
    }

    fn on_timer(&mut self, step: TaskStep, ctx: &mut TaskContext<'_>) {
        if self.phase == CombatPhase::Disengaged {
            return;
        }
        match step {
            TaskStep::CombatLook => self.look_step(ctx),
            TaskStep::CombatSwing => self.swing_step(ctx),
            _ => {}
        }
    }

    fn cleanup(&mut self, ctx: &mut TaskContext<'_>, reason: EndReason) {
        if self.phase == CombatPhase::Disengaged {
            return;
        }
        self.phase = CombatPhase::Disengaged;
        ctx.release_goal(self.goal.take());
        ctx.world.deactivate_item();
        ctx.world.clear_controls();
        ctx.state.combat_cooldown_until =
            Some(ctx.now + std::time::Duration::from_millis(ctx.config.combat.cooldown_ms));
        ctx.memory.forget_hostile(self.target);
        info!(target = %self.name, reason = reason.as_str(), "Disengaged");
    }
}
