//! End-to-end behavior of [`Brain`] against a recording world.

use std::f64::consts::{PI, TAU};
use std::sync::Arc;
use std::time::Duration;

use brainstem_core::{
    Block, BlockPos, BrainEvent, Control, DialogueError, EndReason, EquipSlot, NavGoal, ObservedEntity,
    RosterEntry, TaskKind, Vec3, WorldError, WorldEvent,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::brain::Brain;
use crate::planner::username_angle;
use crate::task::{DialoguePurpose, Effect};
use crate::test_helpers::{MockWorld, WorldCall, brain_with, quiet_config};

fn origin() -> Vec3 {
    Vec3::new(0.0, 64.0, 0.0)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn setup() -> (Arc<MockWorld>, Brain, Instant) {
    let world = Arc::new(MockWorld::standing_at("Jarvis", origin()));
    let now = Instant::now();
    let brain = brain_with(&world, quiet_config(), now);
    (world, brain, now)
}

fn drain(rx: &mut broadcast::Receiver<Arc<BrainEvent>>) -> Vec<Arc<BrainEvent>> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn ended_with(events: &[Arc<BrainEvent>], wanted: EndReason) -> bool {
    events
        .iter()
        .any(|e| matches!(e.as_ref(), BrainEvent::TaskEnded { reason, .. } if *reason == wanted))
}

fn kind(brain: &Brain) -> Option<TaskKind> {
    brain.current_task().map(|(_, k)| k)
}

fn chat(brain: &mut Brain, who: &str, message: &str, now: Instant) {
    brain.handle_event(
        WorldEvent::Chat {
            username: who.into(),
            message: message.into(),
        },
        now,
    );
}

// ── Planning ──────────────────────────────────────────────────────────

#[test]
fn armed_agent_fights_nearby_hostile_before_anything_else() {
    let (world, mut brain, t0) = setup();
    world.give("iron_sword");
    world.add_hostile(50, "Zombie", Vec3::new(3.0, 64.0, 0.0));
    world.add_entity(ObservedEntity::Item {
        id: 60,
        kind: "bread".into(),
        position: Vec3::new(2.0, 64.0, 0.0),
    });
    world.add_player(70, "bob", Vec3::new(6.0, 64.0, 0.0));

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Combat));
    assert!(world.calls().contains(&WorldCall::Equip("iron_sword".into(), EquipSlot::Hand)));
}

#[test]
fn weak_unarmed_agent_runs_from_hostile() {
    let (world, mut brain, t0) = setup();
    world.set_health(8.0);
    world.add_hostile(50, "Zombie", Vec3::new(5.0, 64.0, 0.0));

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Evade));
    assert_eq!(
        world.goal(),
        Some(NavGoal::Near {
            target: Vec3::new(-8.0, 64.0, 0.0),
            range: 3.0,
        })
    );
}

#[test]
fn distant_player_is_not_followed() {
    let (world, mut brain, t0) = setup();
    world.add_player(70, "bob", Vec3::new(25.0, 64.0, 0.0));

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Explore));
}

#[test]
fn player_in_band_is_followed() {
    let (world, mut brain, t0) = setup();
    world.add_player(70, "bob", Vec3::new(10.0, 64.0, 0.0));

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::FollowPlayer));
    assert_eq!(
        world.goal(),
        Some(NavGoal::Follow {
            entity: 70,
            range: 3.0
        })
    );
}

#[test]
fn nothing_happens_without_a_body() {
    let world = Arc::new(MockWorld::new("Jarvis"));
    let t0 = Instant::now();
    let mut brain = brain_with(&world, quiet_config(), t0);

    brain.scan(t0);
    brain.decide(t0);
    brain.social(t0);
    brain.gesture(t0);

    assert!(brain.current_task().is_none());
    assert!(brain.drain_effects().is_empty());
    assert!(world.calls().is_empty());
}

#[test]
fn chat_hint_leads_to_seeking_the_remote_player() {
    let (world, mut brain, t0) = setup();
    world.add_remote_player("steve");
    brain.scan(t0);

    chat(&mut brain, "steve", "I'm at 120 70 -45", t0);
    let hint = Vec3::new(120.0, 70.0, -45.0);
    let contact = brain.memory().remote_contact("steve").expect("remote contact");
    assert_eq!(contact.hint.as_ref().map(|h| h.position), Some(hint));
    assert!(brain.memory().pois().any(|p| p.position == hint));

    brain.decide(t0);
    assert_eq!(kind(&brain), Some(TaskKind::InvestigatePoi));

    world.arrive();
    brain.decide(t0 + secs(6));

    assert!(brain.memory().pois().all(|p| p.position != hint));
    assert_eq!(kind(&brain), Some(TaskKind::SeekRemotePlayer));
    assert_eq!(
        world.goal(),
        Some(NavGoal::Near {
            target: hint,
            range: 3.0
        })
    );
}

// ── Task lifecycle ────────────────────────────────────────────────────

#[test]
fn switching_cleans_up_the_old_task_before_engaging_the_new_one() {
    let (world, mut brain, t0) = setup();
    let mut events = brain.events().subscribe();
    brain.decide(t0);
    assert_eq!(kind(&brain), Some(TaskKind::Explore));

    world.give("diamond_sword");
    world.add_hostile(50, "Skeleton", Vec3::new(3.0, 64.0, 0.0));
    brain.scan(t0 + secs(2));
    drain(&mut events);
    world.clear_calls();

    brain.decide(t0 + secs(6));
    assert_eq!(kind(&brain), Some(TaskKind::Combat));

    let calls = world.calls();
    let cleared = calls.iter().position(|c| *c == WorldCall::ClearGoal);
    let equipped = calls
        .iter()
        .position(|c| matches!(c, WorldCall::Equip(_, EquipSlot::Hand)));
    assert!(cleared.is_some() && equipped.is_some());
    assert!(cleared < equipped);

    let events = drain(&mut events);
    let ended = events
        .iter()
        .position(|e| matches!(e.as_ref(), BrainEvent::TaskEnded { reason: EndReason::Switching, .. }));
    let engaged = events
        .iter()
        .position(|e| matches!(e.as_ref(), BrainEvent::TaskEngaged { kind: TaskKind::Combat, .. }));
    assert!(ended.is_some() && engaged.is_some());
    assert!(ended < engaged);
}

#[test]
fn a_task_never_outlives_the_timeout() {
    let (_world, mut brain, t0) = setup();
    let mut events = brain.events().subscribe();
    brain.decide(t0);
    let (first, _) = brain.current_task().expect("explore");

    brain.decide(t0 + secs(59));
    assert_eq!(brain.current_task().map(|(id, _)| id), Some(first));

    brain.decide(t0 + secs(60));
    assert!(ended_with(&drain(&mut events), EndReason::TimedOut));
    assert_ne!(brain.current_task().map(|(id, _)| id), Some(first));
}

#[test]
fn pause_is_monotonic_and_blocks_planning() {
    let (_world, mut brain, t0) = setup();
    let mut events = brain.events().subscribe();
    brain.decide(t0);
    assert!(brain.current_task().is_some());

    brain.pause(t0, 20_000);
    brain.pause(t0, 5_000);
    assert_eq!(brain.state().paused_until, t0 + secs(20));
    assert!(brain.current_task().is_none());
    assert!(ended_with(&drain(&mut events), EndReason::Paused));

    brain.decide(t0 + secs(10));
    assert!(brain.current_task().is_none());

    brain.decide(t0 + secs(20));
    assert!(brain.current_task().is_some());
}

#[test]
fn combat_loops_look_and_swing_on_timers() {
    let (world, mut brain, t0) = setup();
    world.give("stone_sword");
    world.add_hostile(50, "Zombie", Vec3::new(3.0, 64.0, 0.0));
    brain.scan(t0);
    brain.decide(t0);
    world.clear_calls();

    brain.run_due_timers(t0 + Duration::from_millis(700));

    let calls = world.calls();
    assert!(calls.iter().any(|c| matches!(c, WorldCall::LookAt(_))));
    assert!(calls.contains(&WorldCall::Attack(50)));
}

#[test]
fn combat_ends_when_the_target_is_gone() {
    let (world, mut brain, t0) = setup();
    world.give("stone_sword");
    world.add_hostile(50, "Zombie", Vec3::new(3.0, 64.0, 0.0));
    brain.scan(t0);
    brain.decide(t0);
    let mut events = brain.events().subscribe();

    world.remove_entity(50);
    brain.decide(t0 + secs(6));

    assert!(ended_with(&drain(&mut events), EndReason::PredicateFailed));
    assert!(brain.memory().hostile(50).is_none());
    assert!(!brain.state().combat_ready(t0 + secs(7)));
    assert_ne!(kind(&brain), Some(TaskKind::Combat));
}

#[test]
fn stale_sightings_expire_while_paused() {
    let (world, mut brain, t0) = setup();
    world.add_hostile(50, "Zombie", Vec3::new(30.0, 64.0, 0.0));
    world.add_entity(ObservedEntity::Item {
        id: 60,
        kind: "bread".into(),
        position: Vec3::new(2.0, 64.0, 0.0),
    });
    brain.scan(t0);
    assert!(brain.memory().hostile(50).is_some());

    world.remove_entity(50);
    world.remove_entity(60);
    brain.pause(t0, 120_000);
    for tick in 1..=30 {
        brain.scan(t0 + secs(tick * 2));
    }

    let summary = brain.memory().summary();
    assert_eq!((summary.hostiles, summary.items), (0, 0));
}

#[test]
fn disabled_brain_still_sweeps_memory() {
    let world = Arc::new(MockWorld::standing_at("Jarvis", origin()));
    let t0 = Instant::now();
    let mut config = quiet_config();
    config.enabled = false;
    let mut brain = brain_with(&world, config, t0);
    world.add_hostile(50, "Zombie", Vec3::new(30.0, 64.0, 0.0));
    brain.scan(t0);
    world.remove_entity(50);

    brain.decide(t0 + secs(30));
    brain.scan(t0 + secs(30));

    assert!(brain.memory().hostile(50).is_none());
    assert!(brain.current_task().is_none());
}

// ── Groups and remote players ─────────────────────────────────────────

fn add_group(world: &MockWorld, x: f64) {
    world.add_player(70, "alice", Vec3::new(x, 64.0, 0.0));
    world.add_player(71, "bob", Vec3::new(x + 2.0, 64.0, 2.0));
    world.add_player(72, "carol", Vec3::new(x + 2.0, 64.0, -2.0));
}

#[test]
fn cluster_wins_over_following_one_player() {
    let (world, mut brain, t0) = setup();
    add_group(&world, 12.0);

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::GroupFollow));
    match world.goal() {
        Some(NavGoal::Near { target, range }) => {
            let centroid = Vec3::new(40.0 / 3.0, 64.0, 0.0);
            assert!(target.distance_to(&centroid) < 1e-9);
            assert_eq!(range, 5.0);
        }
        other => panic!("expected a goal near the centroid, got {other:?}"),
    }
}

#[test]
fn group_anchor_is_followed_when_present() {
    let world = Arc::new(MockWorld::standing_at("Jarvis", origin()));
    let t0 = Instant::now();
    let mut config = quiet_config();
    config.group.anchor = Some("carol".into());
    let mut brain = brain_with(&world, config, t0);
    add_group(&world, 12.0);

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::GroupFollow));
    assert_eq!(
        world.goal(),
        Some(NavGoal::Follow {
            entity: 72,
            range: 5.0
        })
    );
}

#[test]
fn group_beyond_the_leash_is_ignored() {
    let (world, mut brain, t0) = setup();
    add_group(&world, 50.0);

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Explore));
}

#[test]
fn unhinted_search_heads_along_the_username_bearing() {
    let (world, mut brain, t0) = setup();
    world.add_remote_player("steve");
    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::SeekRemotePlayer));
    let Some(NavGoal::Near { target, .. }) = world.goal() else {
        panic!("expected a search goal");
    };
    let (dx, dz) = (target.x, target.z);
    let radius = (dx * dx + dz * dz).sqrt();
    assert!((46.0..=98.0).contains(&radius), "radius {radius}");
    let bearing = dz.atan2(dx);
    let expected = username_angle("steve");
    let off = ((bearing - expected + PI).rem_euclid(TAU) - PI).abs();
    assert!(off < 0.05, "bearing {bearing} vs {expected}");
    assert_eq!(target.y, 64.0);
}

#[test]
fn unlisted_contact_is_still_searched_for() {
    let (world, mut brain, t0) = setup();
    let mut entry = RosterEntry::new("ghost");
    entry.listed = false;
    world.state().roster.push(entry);
    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::SeekRemotePlayer));
    assert!(brain.memory().remote_contact("ghost").is_some_and(|c| c.last_seek_at == Some(t0)));
}

#[test]
fn remote_contact_is_not_searched_again_before_cooldown() {
    let (world, mut brain, t0) = setup();
    world.add_remote_player("steve");
    brain.scan(t0);
    brain.decide(t0);
    assert_eq!(kind(&brain), Some(TaskKind::SeekRemotePlayer));

    world.arrive();
    brain.decide(t0 + secs(6));
    assert_eq!(kind(&brain), Some(TaskKind::Explore));

    world.arrive();
    brain.decide(t0 + secs(46));
    assert_eq!(kind(&brain), Some(TaskKind::SeekRemotePlayer));
}

// ── Idle behaviors ────────────────────────────────────────────────────

fn idle_brain(observe: f64, stroll: f64) -> (Arc<MockWorld>, Brain, Instant) {
    let world = Arc::new(MockWorld::standing_at("Jarvis", origin()));
    let t0 = Instant::now();
    let mut config = quiet_config();
    config.idle.observation_chance = observe;
    config.idle.stroll_chance = stroll;
    let brain = brain_with(&world, config, t0);
    (world, brain, t0)
}

#[test]
fn observe_stands_still_and_glances_on_timers() {
    let (world, mut brain, t0) = idle_brain(1.0, 0.0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Observe));
    let calls = world.calls();
    assert!(calls.contains(&WorldCall::ClearGoal));
    assert!(calls.contains(&WorldCall::ClearControls));
    assert!(world.goal().is_none());

    world.clear_calls();
    brain.run_due_timers(t0 + Duration::from_millis(1_500));
    assert!(world.calls().iter().any(|c| matches!(c, WorldCall::LookAt(_))));

    world.clear_calls();
    brain.decide(t0 + secs(10));
    assert_ne!(kind(&brain), Some(TaskKind::Observe));
    assert!(world.calls().contains(&WorldCall::ClearControls));
}

#[test]
fn observe_is_skipped_while_hostiles_are_remembered() {
    let (world, mut brain, t0) = idle_brain(1.0, 0.0);
    world.add_hostile(50, "Zombie", Vec3::new(40.0, 64.0, 0.0));
    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Explore));
}

#[test]
fn stroll_walks_and_releases_every_key() {
    let (world, mut brain, t0) = idle_brain(0.0, 1.0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Stroll));
    let calls = world.calls();
    assert!(calls.contains(&WorldCall::ClearGoal));
    assert!(calls.contains(&WorldCall::SetControl(Control::Forward, true)));

    world.clear_calls();
    brain.run_due_timers(t0 + Duration::from_millis(1_200));
    assert!(world.calls().iter().any(|c| matches!(c, WorldCall::LookAt(_))));

    world.clear_calls();
    brain.run_due_timers(t0 + secs(10));
    assert!(world.calls().contains(&WorldCall::ClearControls));
    assert_eq!(kind(&brain), Some(TaskKind::Stroll));

    world.clear_calls();
    brain.decide(t0 + secs(10));
    assert!(world.calls().contains(&WorldCall::ClearControls));
    assert_eq!(kind(&brain), Some(TaskKind::Explore));
}

// ── Combat rules ──────────────────────────────────────────────────────

#[test]
fn excluded_mob_is_avoided_not_fought() {
    let (world, mut brain, t0) = setup();
    world.give("diamond_sword");
    world.add_hostile(50, "Creeper", Vec3::new(3.0, 64.0, 0.0));

    brain.scan(t0);
    brain.decide(t0);

    assert_eq!(kind(&brain), Some(TaskKind::Evade));
    assert!(!world.calls().contains(&WorldCall::Attack(50)));
}

#[test]
fn fight_breaks_off_at_disengage_health() {
    let (world, mut brain, t0) = setup();
    world.give("stone_sword");
    world.add_hostile(50, "Zombie", Vec3::new(3.0, 64.0, 0.0));
    brain.scan(t0);
    brain.decide(t0);
    assert_eq!(kind(&brain), Some(TaskKind::Combat));
    let mut events = brain.events().subscribe();

    world.set_health(5.0);
    brain.decide(t0 + secs(6));

    assert!(ended_with(&drain(&mut events), EndReason::PredicateFailed));
    assert_ne!(kind(&brain), Some(TaskKind::Combat));
    assert!(world.calls().contains(&WorldCall::DeactivateItem));
    assert!(!brain.state().combat_ready(t0 + secs(6)));
}

#[test]
fn cooldown_blocks_a_second_fight() {
    let (world, mut brain, t0) = setup();
    world.give("stone_sword");
    world.add_hostile(50, "Zombie", Vec3::new(3.0, 64.0, 0.0));
    brain.scan(t0);
    brain.decide(t0);
    assert_eq!(kind(&brain), Some(TaskKind::Combat));

    world.remove_entity(50);
    world.add_hostile(51, "Zombie", Vec3::new(0.0, 64.0, 3.0));
    brain.scan(t0 + secs(4));
    brain.decide(t0 + secs(6));
    assert_eq!(kind(&brain), Some(TaskKind::Evade));

    brain.scan(t0 + secs(14));
    world.arrive();
    brain.decide(t0 + secs(15));
    assert_eq!(kind(&brain), Some(TaskKind::Combat));
    assert_eq!(brain.memory().hostile(51).map(|h| h.name.as_str()), Some("Zombie"));
}

// ── Resource collection ───────────────────────────────────────────────

#[test]
fn completed_harvest_forgets_its_target() {
    let (world, mut brain, t0) = setup();
    let ore = BlockPos::new(4, 64, 0);
    world.set_block(ore, "iron_ore");
    let mut events = brain.events().subscribe();

    brain.scan(t0);
    brain.decide(t0);
    let (ticket, task) = brain.current_task().expect("harvest");
    assert_eq!(task, TaskKind::MineResource);
    assert_eq!(
        brain.drain_effects(),
        vec![Effect::Collect {
            ticket,
            position: ore
        }]
    );
    assert_eq!(brain.state().async_task, Some(ticket));

    // planning stays out of the way while the collect runs
    brain.decide(t0 + secs(6));
    assert_eq!(brain.current_task(), Some((ticket, TaskKind::MineResource)));

    brain.finish_collect(ticket, Ok(()), t0 + secs(8));
    assert!(brain.current_task().is_none());
    assert!(brain.state().async_task.is_none());
    assert!(brain.memory().resource_targets().is_empty());
    assert!(ended_with(&drain(&mut events), EndReason::Completed));
}

#[test]
fn failed_harvest_ends_as_failed() {
    let (world, mut brain, t0) = setup();
    world.set_block(BlockPos::new(4, 64, 0), "coal_ore");
    let mut events = brain.events().subscribe();
    brain.scan(t0);
    brain.decide(t0);
    let (ticket, _) = brain.current_task().expect("harvest");

    brain.finish_collect(ticket, Err(WorldError::Cancelled), t0 + secs(1));

    assert!(ended_with(&drain(&mut events), EndReason::Failed));
    assert!(brain.memory().resource_targets().is_empty());
}

#[test]
fn harvest_holds_the_slot_against_a_nearby_hostile() {
    let (world, mut brain, t0) = setup();
    world.set_block(BlockPos::new(4, 64, 0), "oak_log");
    brain.scan(t0);
    brain.decide(t0);
    let (ticket, task) = brain.current_task().expect("harvest");
    assert_eq!(task, TaskKind::HarvestWood);
    brain.drain_effects();

    world.set_health(8.0);
    world.add_hostile(50, "Zombie", Vec3::new(-4.0, 64.0, 0.0));
    brain.scan(t0 + secs(2));
    brain.decide(t0 + secs(6));

    assert_eq!(brain.current_task(), Some((ticket, TaskKind::HarvestWood)));
    assert_eq!(brain.state().async_task, Some(ticket));
    assert!(!world.calls().contains(&WorldCall::CancelCollect));
    assert!(brain.drain_effects().is_empty());
}

#[test]
fn harvest_outlasts_the_task_timeout() {
    let (world, mut brain, t0) = setup();
    world.set_block(BlockPos::new(4, 64, 0), "coal_ore");
    let mut events = brain.events().subscribe();
    brain.scan(t0);
    brain.decide(t0);
    let (ticket, _) = brain.current_task().expect("harvest");
    brain.drain_effects();

    brain.decide(t0 + secs(61));

    assert_eq!(brain.current_task(), Some((ticket, TaskKind::MineResource)));
    assert!(brain.drain_effects().is_empty());
    assert!(!ended_with(&drain(&mut events), EndReason::TimedOut));

    world.state().blocks.clear();
    brain.finish_collect(ticket, Ok(()), t0 + secs(62));
    assert!(ended_with(&drain(&mut events), EndReason::Completed));
    assert!(brain.memory().resource_targets().is_empty());

    brain.decide(t0 + secs(63));
    assert_eq!(kind(&brain), Some(TaskKind::Explore));
}

#[test]
fn late_collect_result_is_ignored() {
    let (world, mut brain, t0) = setup();
    world.set_block(BlockPos::new(4, 64, 0), "coal_ore");
    brain.scan(t0);
    brain.decide(t0);
    let (ticket, _) = brain.current_task().expect("harvest");

    brain.pause(t0 + secs(1), 5_000);
    world.clear_calls();
    brain.finish_collect(ticket, Ok(()), t0 + secs(2));

    assert!(world.calls().is_empty());
    assert!(brain.current_task().is_none());
}

// ── Commands ──────────────────────────────────────────────────────────

#[test]
fn goto_command_sets_goal_and_pauses_autonomy() {
    let (world, mut brain, t0) = setup();
    let mut events = brain.events().subscribe();
    chat(&mut brain, "bob", "!goto 10 64 -5", t0);

    assert_eq!(
        world.goal(),
        Some(NavGoal::Near {
            target: Vec3::new(10.0, 64.0, -5.0),
            range: 1.0
        })
    );
    assert_eq!(
        world.chat_lines(),
        vec!["Navigating to 10, 64, -5 (within 1 blocks)".to_string()]
    );
    assert!(brain.state().is_paused(t0 + secs(19)));
    assert!(drain(&mut events).iter().any(|e| matches!(
        e.as_ref(),
        BrainEvent::CommandHandled { success: true, .. }
    )));
}

#[test]
fn goto_home_without_spawn_point_reports_error() {
    let (world, mut brain, t0) = setup();
    chat(&mut brain, "bob", "!goto home", t0);
    assert_eq!(world.chat_lines(), vec!["Spawn point unknown".to_string()]);

    world.state().spawn_point = Some(Vec3::new(5.0, 70.0, 5.0));
    chat(&mut brain, "bob", "!goto home", t0);
    assert_eq!(
        world.goal(),
        Some(NavGoal::Near {
            target: Vec3::new(5.0, 70.0, 5.0),
            range: 1.0
        })
    );
}

#[test]
fn unknown_command_points_at_help() {
    let (world, mut brain, t0) = setup();
    chat(&mut brain, "bob", "!dance", t0);

    assert_eq!(
        world.chat_lines(),
        vec!["Unknown command dance. Try !help".to_string()]
    );
    assert!(!brain.state().is_paused(t0));
}

#[test]
fn help_lists_every_command() {
    let (world, mut brain, t0) = setup();
    chat(&mut brain, "bob", "!help", t0);

    let lines = world.chat_lines();
    for name in brain.commands().names() {
        assert!(lines.iter().any(|l| l.starts_with(&format!("{name} - "))));
    }
}

#[test]
fn mine_command_reports_when_done() {
    let (world, mut brain, t0) = setup();
    world.set_block(BlockPos::new(2, 63, 2), "iron_ore");
    chat(&mut brain, "bob", "!mine iron_ore", t0);

    let ticket = brain
        .drain_effects()
        .into_iter()
        .find_map(|e| match e {
            Effect::Collect { ticket, position } => {
                assert_eq!(position, BlockPos::new(2, 63, 2));
                Some(ticket)
            }
            _ => None,
        })
        .expect("collect effect");

    brain.finish_collect(ticket, Ok(()), t0 + secs(3));
    assert!(world.chat_lines().contains(&"Finished mining iron_ore".to_string()));
}

#[test]
fn ai_command_falls_back_when_the_provider_fails() {
    let (world, mut brain, t0) = setup();
    chat(&mut brain, "bob", "!ai where is the village", t0);

    let request = brain
        .drain_effects()
        .into_iter()
        .find_map(|e| match e {
            Effect::Dialogue(request) => Some(request),
            _ => None,
        })
        .expect("dialogue request");
    assert_eq!(request.purpose, DialoguePurpose::Command);
    assert_eq!(request.prompt, "where is the village");
    assert!(request.context.starts_with("Bot position:"));

    brain.finish_dialogue(request, Err(DialogueError::Timeout(10_000)), t0);
    assert_eq!(
        world.chat_lines(),
        vec!["AI did not provide a response.".to_string()]
    );
}

#[test]
fn stop_command_drops_goal_and_controls() {
    let (world, mut brain, t0) = setup();
    chat(&mut brain, "bob", "!goto 1 2 3", t0);
    world.clear_calls();

    chat(&mut brain, "bob", "!stop", t0);

    assert!(world.goal().is_none());
    assert!(world.calls().contains(&WorldCall::ClearControls));
}

// ── Chat, dialogue and world events ───────────────────────────────────

#[test]
fn being_addressed_pauses_autonomy() {
    let (_world, mut brain, t0) = setup();
    let mut events = brain.events().subscribe();
    chat(&mut brain, "bob", "hey jarvis, nice house", t0);

    assert!(brain.state().is_paused(t0 + secs(14)));
    assert!(
        brain
            .drain_effects()
            .contains(&Effect::DialogueNote("bob: hey jarvis, nice house".into()))
    );
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e.as_ref(), BrainEvent::Paused { duration_ms: 15_000, .. }))
    );
}

#[test]
fn own_chat_is_ignored() {
    let (world, mut brain, t0) = setup();
    chat(&mut brain, "Jarvis", "!help", t0);
    assert!(world.chat_lines().is_empty());
    assert!(brain.drain_effects().is_empty());
}

#[test]
fn ambient_line_goes_out_after_a_delay() {
    let (world, mut brain, t0) = setup();
    brain.social(t0);

    let request = match brain.drain_effects().pop() {
        Some(Effect::Dialogue(request)) => request,
        other => panic!("expected dialogue request, got {other:?}"),
    };
    assert_eq!(request.purpose, DialoguePurpose::Ambient);
    assert_eq!(brain.state().last_ambient_chat, Some(t0));

    brain.finish_dialogue(request, Ok("nice day for mining".into()), t0);
    brain.run_due_timers(t0 + Duration::from_millis(500));
    assert!(world.chat_lines().is_empty());

    brain.run_due_timers(t0 + Duration::from_millis(2_400));
    assert_eq!(world.chat_lines(), vec!["nice day for mining".to_string()]);
}

#[test]
fn ambient_failure_uses_a_canned_line() {
    let (world, mut brain, t0) = setup();
    brain.social(t0);
    let Some(Effect::Dialogue(request)) = brain.drain_effects().pop() else {
        panic!("expected dialogue request");
    };

    brain.finish_dialogue(request, Err(DialogueError::Empty), t0);
    brain.run_due_timers(t0 + secs(3));

    let lines = world.chat_lines();
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].is_empty());
}

#[test]
fn social_tick_is_silent_while_paused() {
    let (_world, mut brain, t0) = setup();
    brain.pause(t0, 10_000);
    brain.social(t0 + secs(1));
    assert!(brain.drain_effects().is_empty());
}

#[test]
fn whisper_gets_a_private_reply() {
    let (world, mut brain, t0) = setup();
    brain.handle_event(
        WorldEvent::Whisper {
            username: "bob".into(),
            message: "psst".into(),
        },
        t0,
    );
    assert!(brain.state().is_paused(t0 + secs(1)));

    let request = brain
        .drain_effects()
        .into_iter()
        .find_map(|e| match e {
            Effect::Dialogue(request) => Some(request),
            _ => None,
        })
        .expect("dialogue request");
    brain.finish_dialogue(request, Ok("hello there".into()), t0);

    assert!(
        world
            .calls()
            .contains(&WorldCall::Whisper("bob".into(), "hello there".into()))
    );
}

#[test]
fn death_resets_the_brain() {
    let (world, mut brain, t0) = setup();
    world.set_block(BlockPos::new(4, 64, 0), "iron_ore");
    brain.scan(t0);
    brain.decide(t0);
    brain.drain_effects();
    let mut events = brain.events().subscribe();

    brain.handle_event(WorldEvent::Died, t0 + secs(1));

    assert!(brain.current_task().is_none());
    assert!(brain.state().async_task.is_none());
    assert_eq!(brain.pending_timers(), 0);
    assert!(brain.memory().resource_targets().is_empty());
    assert!(brain.state().is_paused(t0 + secs(5)));
    assert!(!brain.state().is_paused(t0 + secs(6)));
    assert!(
        brain
            .drain_effects()
            .iter()
            .any(|e| matches!(e, Effect::CancelCollect { .. }))
    );
    let events = drain(&mut events);
    assert!(ended_with(&events, EndReason::Died));
    assert!(events.iter().any(|e| matches!(e.as_ref(), BrainEvent::Died { .. })));
}

#[test]
fn spawn_pauses_and_notes_the_event() {
    let (_world, mut brain, t0) = setup();
    brain.handle_event(WorldEvent::Spawned, t0);

    assert!(brain.state().is_paused(t0 + secs(14)));
    assert!(
        brain
            .drain_effects()
            .contains(&Effect::DialogueNote("Bot spawned in the world.".into()))
    );
}

#[test]
fn interesting_block_becomes_a_poi() {
    let (_world, mut brain, t0) = setup();
    brain.handle_event(
        WorldEvent::BlockUpdated {
            old: None,
            new: Some(Block::new("chest", BlockPos::new(3, 64, 3))),
        },
        t0,
    );
    let poi = brain.memory().latest_poi().expect("poi");
    assert_eq!(poi.position, BlockPos::new(3, 64, 3).center());
}

#[test]
fn roster_events_track_remote_players() {
    let (_world, mut brain, t0) = setup();
    brain.handle_event(
        WorldEvent::PlayerJoined {
            entry: RosterEntry::new("alex"),
        },
        t0,
    );
    assert!(brain.memory().remote_contact("alex").is_some());

    brain.handle_event(
        WorldEvent::PlayerLeft {
            username: "alex".into(),
        },
        t0,
    );
    assert!(brain.memory().remote_contact("alex").is_none());
}

#[test]
fn disconnect_shuts_down() {
    let (world, mut brain, t0) = setup();
    brain.decide(t0);
    brain.handle_event(
        WorldEvent::Disconnected {
            reason: "kicked".into(),
        },
        t0,
    );
    assert!(brain.is_shut_down());
    assert!(brain.current_task().is_none());
    assert!(world.calls().contains(&WorldCall::ClearControls));
}

// ── Gestures ──────────────────────────────────────────────────────────

#[test]
fn gestures_stay_quiet_during_combat() {
    let (world, mut brain, t0) = setup();
    world.give("iron_sword");
    world.add_hostile(50, "Zombie", Vec3::new(3.0, 64.0, 0.0));
    brain.scan(t0);
    brain.decide(t0);
    world.clear_calls();

    for i in 0..20 {
        brain.gesture(t0 + Duration::from_millis(i));
    }
    assert!(world.calls().is_empty());
}

#[test]
fn gestures_never_touch_the_goal() {
    let (world, mut brain, t0) = setup();
    world.add_player(70, "bob", Vec3::new(4.0, 64.0, 0.0));
    brain.scan(t0);

    for i in 0..50 {
        brain.gesture(t0 + Duration::from_millis(i * 10));
    }
    let calls = world.calls();
    assert!(!calls.is_empty());
    assert!(
        !calls
            .iter()
            .any(|c| matches!(c, WorldCall::SetGoal(_) | WorldCall::ClearGoal))
    );
}
