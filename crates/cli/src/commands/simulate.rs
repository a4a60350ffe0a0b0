//! `brainstem simulate` — Run the brain against the simulated world.

use std::sync::Arc;
use std::time::Duration;

use brainstem_agent::{Brain, BrainRuntime};
use brainstem_config::AppConfig;
use brainstem_core::{BrainEvent, EventBus, WorldInterface};
use brainstem_providers::build_provider;
use brainstem_sim::{SimWorld, spawn_driver};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{info, warn};

const TICK: Duration = Duration::from_millis(100);

/// Chat the demo players send, as (wall seconds, username, message).
const SCRIPT: &[(u64, &str, &str)] = &[
    (15, "alex", "hey {name}, nice day for it"),
    (30, "steve", "I'm at 180 70 -90 if anyone wants to come by"),
    (45, "sam", "!look"),
    (70, "alex", "!goto home"),
];

fn describe(event: &BrainEvent) -> String {
    match event {
        BrainEvent::TaskEngaged {
            task_id,
            kind,
            target,
            ..
        } => format!("▶ #{task_id} {kind} → {target}"),
        BrainEvent::TaskEnded {
            task_id,
            kind,
            reason,
            ..
        } => format!("■ #{task_id} {kind} ({})", reason.as_str()),
        BrainEvent::Paused { duration_ms, .. } => format!("⏸ paused for {duration_ms}ms"),
        BrainEvent::Socialized { line, .. } => format!("💬 {line}"),
        BrainEvent::CommandHandled { name, success, .. } => {
            format!("⌨ !{name} {}", if *success { "ok" } else { "rejected" })
        }
        BrainEvent::Died { .. } => "☠ died".into(),
    }
}

pub async fn run(seconds: u64, seed: u64, speed: f64) -> Result<(), Box<dyn std::error::Error>> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err("--speed must be a positive number".into());
    }
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let username = config.agent.username.clone();

    println!("🧠 Brainstem Simulation");
    println!("   Agent:    {username}");
    println!("   Seed:     {seed}");
    println!("   Duration: {seconds}s at {speed}x world speed\n");

    let world = Arc::new(SimWorld::demo(username.clone(), seed));
    let bus = Arc::new(EventBus::default());
    let mut events = bus.subscribe();
    let as_world: Arc<dyn WorldInterface> = Arc::clone(&world) as Arc<dyn WorldInterface>;
    let brain = Brain::with_seed(config.brain.clone(), as_world, bus, Instant::now(), seed);

    let (tx, rx) = mpsc::channel(256);
    let driver = spawn_driver(Arc::clone(&world), TICK, speed, tx);
    let (handle, join) = BrainRuntime::new(brain, build_provider(&config.dialogue), rx)
        .with_dialogue_timeout(config.dialogue.timeout_ms)
        .spawn();

    let script = {
        let world = Arc::clone(&world);
        tokio::spawn(async move {
            let start = Instant::now();
            for (at, who, message) in SCRIPT {
                tokio::time::sleep_until(start + Duration::from_secs(*at)).await;
                world.player_says(who, &message.replace("{name}", &username));
            }
        })
    };

    let started = Instant::now();
    let deadline = started + Duration::from_secs(seconds);
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    println!("[{elapsed:>7.1}s] {}", describe(&event));
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Event printer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    script.abort();
    handle.shutdown().await?;
    let brain = join.await?;
    driver.abort();

    let summary = brain.memory().summary();
    println!("\n📊 Summary");
    if let Some(pos) = world.position() {
        println!("   Position:   {pos}");
    }
    if let Some(health) = world.health() {
        println!("   Health:     {health}");
    }
    println!("   Hostiles:   {} alive", world.hostile_count());
    println!(
        "   Remembered: {} players, {} remote, {} hostiles, {} items, {} resources, {} POIs",
        summary.players,
        summary.remote_players,
        summary.hostiles,
        summary.items,
        summary.resource_targets,
        summary.pois,
    );
    let said = world.said();
    println!("   Chat lines: {}", said.len());
    for line in said.iter().rev().take(5).rev() {
        println!("     > {line}");
    }

    Ok(())
}
