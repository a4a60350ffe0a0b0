//! Bookkeeping for every delayed action the brain schedules.
//!
//! Timers are plain data: the runtime sleeps until [`TimerRegistry::next_deadline`]
//! and then asks for [`TimerRegistry::pop_due`]. A timer may belong to a
//! bucket (the owning task's id) so a task switch, pause, death or shutdown
//! can drop every pending step of that task in one call.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use brainstem_core::Control;
use tokio::time::Instant;

pub type TimerId = u64;
pub type BucketId = u64;

/// A step in one of a task's internal loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    CombatLook,
    CombatSwing,
    ObserveLook,
    StrollPump,
    StrollFinish,
    GroupRefresh,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    /// Let go of a movement key pressed earlier.
    ReleaseControl(Control),
    /// Advance the owning task.
    TaskStep(TaskStep),
    /// Send a chat line that was held back to look human.
    Chat(String),
}

#[derive(Debug, Clone)]
struct Timer {
    deadline: Instant,
    bucket: Option<BucketId>,
    action: TimerAction,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTimer {
    pub id: TimerId,
    pub bucket: Option<BucketId>,
    pub action: TimerAction,
}

#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: HashMap<TimerId, Timer>,
    buckets: HashMap<BucketId, HashSet<TimerId>>,
    next_id: TimerId,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        bucket: Option<BucketId>,
        action: TimerAction,
    ) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        self.timers.insert(
            id,
            Timer {
                deadline: now + delay,
                bucket,
                action,
            },
        );
        if let Some(bucket) = bucket {
            self.buckets.entry(bucket).or_default().insert(id);
        }
        id
    }

    /// Cancel one timer. False if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some(timer) => {
                self.detach(id, timer.bucket);
                true
            }
            None => false,
        }
    }

    /// Cancel every timer in a bucket, returning how many were pending.
    pub fn cancel_bucket(&mut self, bucket: BucketId) -> usize {
        let Some(ids) = self.buckets.remove(&bucket) else {
            return 0;
        };
        ids.iter().filter(|id| self.timers.remove(*id).is_some()).count()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
        self.buckets.clear();
    }

    /// Remove and return every timer whose deadline has passed, oldest
    /// deadline first (ties in scheduling order).
    pub fn pop_due(&mut self, now: Instant) -> Vec<DueTimer> {
        let mut due: Vec<(Instant, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(id, t)| (t.deadline, *id))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| {
                let timer = self.timers.remove(&id)?;
                self.detach(id, timer.bucket);
                Some(DueTimer {
                    id,
                    bucket: timer.bucket,
                    action: timer.action,
                })
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn bucket_len(&self, bucket: BucketId) -> usize {
        self.buckets.get(&bucket).map_or(0, HashSet::len)
    }

    fn detach(&mut self, id: TimerId, bucket: Option<BucketId>) {
        let Some(bucket) = bucket else { return };
        if let Some(ids) = self.buckets.get_mut(&bucket) {
            ids.remove(&id);
            if ids.is_empty() {
                self.buckets.remove(&bucket);
            }
        }
    }
}
