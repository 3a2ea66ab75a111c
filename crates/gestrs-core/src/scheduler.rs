// Gestrs Frame Scheduler
// Display-refresh-synchronized task queues, one emission per key per tick

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use parking_lot::Mutex;

use crate::feature::FeatureKey;

/// One queued zero-argument emission.
pub type FrameTask = Box<dyn FnOnce() + Send + 'static>;

/// The platform's frame clock. `resume` starts vsync ticks arriving,
/// `suspend` stops them; both must tolerate redundant calls.
pub trait TickSource: Send + Sync {
    fn resume(&self);
    fn suspend(&self);
}

/// Tick source driven by hand, for tests and offline replay.
#[derive(Debug, Default)]
pub struct ManualTickSource {
    running: AtomicBool,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl TickSource for ManualTickSource {
    fn resume(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    fn suspend(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Frame-paced emission queues keyed per feature.
///
/// On every tick, exactly one pending task per non-empty key runs, in key
/// insertion order. When a tick drains the last task, the tick source is
/// suspended until new work is scheduled. Scheduling replaces a key's
/// whole queue: a fresh sequence supersedes one in flight.
///
/// The tick and schedule entry points may run on different execution
/// contexts; the pending-task map is guarded by a mutex, and tasks run
/// outside the lock.
pub struct FrameScheduler {
    queues: Mutex<IndexMap<FeatureKey, VecDeque<FrameTask>>>,
    source: Arc<dyn TickSource>,
}

impl FrameScheduler {
    pub fn new(source: Arc<dyn TickSource>) -> Self {
        Self {
            queues: Mutex::new(IndexMap::new()),
            source,
        }
    }

    /// Replace the pending sequence for `key` and wake the tick source.
    pub fn schedule(&self, key: FeatureKey, tasks: Vec<FrameTask>) {
        let mut queues = self.queues.lock();
        debug!("schedule {} task(s) for {}", tasks.len(), key);
        queues.insert(key, tasks.into());
        let any_pending = queues.values().any(|q| !q.is_empty());
        drop(queues);
        if any_pending {
            self.source.resume();
        }
    }

    /// Drop any pending sequence for `key` without running it.
    pub fn clear(&self, key: FeatureKey) {
        self.queues.lock().shift_remove(&key);
    }

    /// One vsync tick: pop and run one task per non-empty key. Suspends
    /// the tick source when nothing remains afterwards.
    pub fn tick(&self) {
        let mut due: Vec<FrameTask> = Vec::new();
        {
            let mut queues = self.queues.lock();
            for queue in queues.values_mut() {
                if let Some(task) = queue.pop_front() {
                    due.push(task);
                }
            }
            queues.retain(|_, q| !q.is_empty());
        }
        for task in due {
            task();
        }
        // A task may have scheduled fresh work; only suspend when the map
        // is still drained afterwards.
        if self.queues.lock().is_empty() {
            self.source.suspend();
        }
    }

    /// Number of tasks still queued for `key`.
    pub fn pending(&self, key: FeatureKey) -> usize {
        self.queues.lock().get(&key).map_or(0, VecDeque::len)
    }

    pub fn is_idle(&self) -> bool {
        self.queues.lock().values().all(VecDeque::is_empty)
    }
}
