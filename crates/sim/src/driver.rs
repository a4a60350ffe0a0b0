//! Background task that advances a [`SimWorld`] and feeds its events to a brain.

use std::sync::Arc;
use std::time::Duration;

use brainstem_core::WorldEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::world::SimWorld;

/// Step `world` every `tick` of wall time, advancing it by `tick * speed`.
///
/// The task ends when the receiving side of `events` is dropped.
pub fn spawn_driver(
    world: Arc<SimWorld>,
    tick: Duration,
    speed: f64,
    events: mpsc::Sender<WorldEvent>,
) -> JoinHandle<()> {
    let world_dt = tick.mul_f64(speed.max(0.0));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            for event in world.step(world_dt) {
                if events.send(event).await.is_err() {
                    debug!("World event receiver closed, stopping simulation");
                    return;
                }
            }
            if events.is_closed() {
                return;
            }
        }
    })
}
