// SPDX-License-Identifier: Apache-2.0

//! Minimal, synchronous fakes for [`crate::TaskExecutor`] and
//! [`crate::TimerManager`], used by this workspace's own tests and
//! available to downstream crates that want to unit-test their use of the
//! traits without a real runtime.

use crate::{Job, TaskExecutor, TickCount, TimerHandleOps, TimerManager, UniqueTimer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A [`TaskExecutor`] that runs `execute_now` immediately and queues
/// deferred jobs up to a fixed capacity, for tests to drain explicitly with
/// [`FakeTaskExecutor::run_deferred`].
pub struct FakeTaskExecutor {
    deferred: Mutex<VecDeque<Job>>,
    capacity: usize,
    executed_now_count: AtomicUsize,
    rejected_defers: AtomicUsize,
}

impl FakeTaskExecutor {
    /// Creates a fake executor that accepts at most `capacity` outstanding
    /// deferred jobs before `defer` starts returning `false`.
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            deferred: Mutex::new(VecDeque::new()),
            capacity,
            executed_now_count: AtomicUsize::new(0),
            rejected_defers: AtomicUsize::new(0),
        })
    }

    /// Runs every currently-queued deferred job, in FIFO order.
    pub fn run_deferred(&self) {
        let jobs: Vec<Job> = self.deferred.lock().drain(..).collect();
        for job in jobs {
            job();
        }
    }

    /// Number of jobs currently queued for deferred execution.
    pub fn deferred_len(&self) -> usize {
        self.deferred.lock().len()
    }

    /// Number of `execute_now` calls observed so far.
    pub fn executed_now_count(&self) -> usize {
        self.executed_now_count.load(Ordering::Relaxed)
    }

    /// Number of `defer` calls that were rejected because the queue was at
    /// capacity.
    pub fn rejected_defers(&self) -> usize {
        self.rejected_defers.load(Ordering::Relaxed)
    }
}

impl TaskExecutor for FakeTaskExecutor {
    fn execute_now(&self, f: Job) {
        let _ = self.executed_now_count.fetch_add(1, Ordering::Relaxed);
        f();
    }

    fn defer(&self, f: Job) -> bool {
        let mut q = self.deferred.lock();
        if q.len() >= self.capacity {
            let _ = self.rejected_defers.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        q.push_back(f);
        true
    }
}

struct TimerEntry {
    period_ticks: u64,
    callback: Option<Box<dyn FnMut() + Send>>,
    armed: bool,
    next_fire: TickCount,
}

/// A synchronous, one-shot-per-arm timer manager: [`UniqueTimer::run`] arms
/// the timer for `period` ticks out; firing calls the callback via the
/// bound executor's `execute_now` and disarms until the next `run`.
///
/// One tick is treated as one millisecond, per the timer facility's
/// external-interface contract; sub-millisecond periods round up to one
/// tick.
pub struct FakeTimerManager {
    now: Arc<AtomicU64>,
    timers: Mutex<Vec<Arc<Mutex<TimerEntry>>>>,
}

impl FakeTimerManager {
    /// Creates a manager starting at tick 0.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Arc::new(AtomicU64::new(0)),
            timers: Mutex::new(Vec::new()),
        })
    }
}

impl TimerManager for FakeTimerManager {
    fn tick(&self) {
        let now = self.now.fetch_add(1, Ordering::AcqRel) + 1;
        let timers = self.timers.lock().clone();
        for entry in timers {
            let mut e = entry.lock();
            if e.armed && e.next_fire <= now {
                e.armed = false;
                if let Some(cb) = e.callback.as_mut() {
                    cb();
                }
            }
        }
    }

    fn now(&self) -> TickCount {
        self.now.load(Ordering::Acquire)
    }

    fn create_timer(&self, exec: Arc<dyn TaskExecutor>) -> UniqueTimer {
        let entry = Arc::new(Mutex::new(TimerEntry {
            period_ticks: 0,
            callback: None,
            armed: false,
            next_fire: 0,
        }));
        self.timers.lock().push(Arc::clone(&entry));
        UniqueTimer::new(Box::new(FakeTimerHandle {
            entry,
            now: Arc::clone(&self.now),
            exec,
        }))
    }
}

struct FakeTimerHandle {
    entry: Arc<Mutex<TimerEntry>>,
    now: Arc<AtomicU64>,
    exec: Arc<dyn TaskExecutor>,
}

impl TimerHandleOps for FakeTimerHandle {
    fn run(&self) {
        let mut e = self.entry.lock();
        let now = self.now.load(Ordering::Acquire);
        e.next_fire = now + e.period_ticks.max(1);
        e.armed = true;
    }

    fn stop(&self) {
        self.entry.lock().armed = false;
    }

    fn set(&self, period: Duration, callback: Box<dyn FnMut() + Send>) {
        let mut e = self.entry.lock();
        e.period_ticks = period.as_millis().max(1) as u64;
        e.callback = Some(callback);
        let _ = &self.exec;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_now_runs_synchronously() {
        let exec = FakeTaskExecutor::new(4);
        let flag = Arc::new(AtomicUsize::new(0));
        let flag2 = Arc::clone(&flag);
        exec.execute_now(Box::new(move || {
            let _ = flag2.fetch_add(1, Ordering::Relaxed);
        }));
        assert_eq!(flag.load(Ordering::Relaxed), 1);
        assert_eq!(exec.executed_now_count(), 1);
    }

    #[test]
    fn defer_rejects_past_capacity() {
        let exec = FakeTaskExecutor::new(1);
        assert!(exec.defer(Box::new(|| {})));
        assert!(!exec.defer(Box::new(|| {})));
        assert_eq!(exec.rejected_defers(), 1);
        exec.run_deferred();
        assert_eq!(exec.deferred_len(), 0);
    }

    #[test]
    fn timer_fires_once_per_run() {
        let exec = FakeTaskExecutor::new(4);
        let mgr = FakeTimerManager::new();
        let timer = mgr.create_timer(Arc::clone(&exec) as Arc<dyn TaskExecutor>);
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        timer.set(Duration::from_millis(3), move || {
            let _ = fired2.fetch_add(1, Ordering::Relaxed);
        });
        timer.run();

        for _ in 0..2 {
            mgr.tick();
        }
        assert_eq!(fired.load(Ordering::Relaxed), 0);
        mgr.tick();
        assert_eq!(fired.load(Ordering::Relaxed), 1);

        // Does not re-fire without another `run`.
        mgr.tick();
        mgr.tick();
        mgr.tick();
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn stop_prevents_pending_fire() {
        let exec = FakeTaskExecutor::new(4);
        let mgr = FakeTimerManager::new();
        let timer = mgr.create_timer(exec as Arc<dyn TaskExecutor>);
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        timer.set(Duration::from_millis(2), move || {
            let _ = fired2.fetch_add(1, Ordering::Relaxed);
        });
        timer.run();
        timer.stop();
        mgr.tick();
        mgr.tick();
        mgr.tick();
        assert_eq!(fired.load(Ordering::Relaxed), 0);
    }
}
