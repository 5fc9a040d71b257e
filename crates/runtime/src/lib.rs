// SPDX-License-Identifier: Apache-2.0

//! Executor and timer facilities consumed (never implemented) by the DU
//! core. A real deployment wires these to whatever thread-per-core runtime
//! and timer wheel it already has; this crate only defines the contract the
//! core's components assume, plus synchronous fakes for tests.
//!
//! No concrete executor or timer wheel ships here — out of scope, per the
//! core's external-collaborator boundary.

pub mod testing;

use std::time::Duration;

/// A unit of work handed to a [`TaskExecutor`]. Executors never inspect the
/// closure; they only run it, once, on their own thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An abstract single-threaded place to run work "now" or "later".
///
/// `defer` never blocks: if the executor's queue is full it returns `false`
/// and the caller is responsible for retrying the work (typically by
/// folding it into an atomic accumulator, per the core's transient-error
/// policy).
pub trait TaskExecutor: Send + Sync {
    /// Runs `f` on this executor's thread, synchronously with respect to the
    /// executor's own queue (but not necessarily with respect to the
    /// caller).
    fn execute_now(&self, f: Job);

    /// Attempts to enqueue `f` for later execution. Returns `false` without
    /// running `f` if the executor cannot accept more deferred work right
    /// now.
    #[must_use]
    fn defer(&self, f: Job) -> bool;
}

/// Monotonic tick count maintained by a [`TimerManager`]; one tick is
/// defined to equal one millisecond by the core's external-interface
/// contract.
pub type TickCount = u64;

/// The timer facility the core drives from its deferred tick dispatch.
pub trait TimerManager: Send + Sync {
    /// Advances the timer wheel by one tick, firing any timer due at the new
    /// tick count.
    fn tick(&self);

    /// Current tick count.
    fn now(&self) -> TickCount;

    /// Allocates a new, initially-stopped timer bound to `exec` (its
    /// callback runs via `exec.execute_now`).
    fn create_timer(&self, exec: std::sync::Arc<dyn TaskExecutor>) -> UniqueTimer;
}

/// Operations a concrete timer-wheel implementation provides for one
/// allocated timer. Implemented by whatever [`TimerManager`] created the
/// [`UniqueTimer`]; the core only ever sees the [`UniqueTimer`] facade.
pub trait TimerHandleOps: Send {
    /// (Re-)arms the timer using whichever period was last passed to `set`.
    fn run(&self);

    /// Disarms the timer. A stopped timer whose period fires again only
    /// after a subsequent `run`.
    fn stop(&self);

    /// Sets (or replaces) the timer's period and callback. Does not arm the
    /// timer; call `run` to do so.
    fn set(&self, period: Duration, callback: Box<dyn FnMut() + Send>);
}

/// A single-owner handle to one timer allocated from a [`TimerManager`].
///
/// Mirrors the shape of a recurring per-owner timer (one per aggregator,
/// conceptually one per cell for the time controller's tick dispatch): a
/// thin facade over whatever timer-wheel entry the concrete manager
/// maintains internally.
pub struct UniqueTimer {
    inner: Box<dyn TimerHandleOps>,
}

impl UniqueTimer {
    /// Wraps a concrete timer-wheel handle. Called by [`TimerManager`]
    /// implementations, not by core logic.
    pub fn new(inner: Box<dyn TimerHandleOps>) -> Self {
        Self { inner }
    }

    /// Arms the timer.
    pub fn run(&self) {
        self.inner.run();
    }

    /// Disarms the timer.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Sets the timer's period and callback without arming it.
    pub fn set(&self, period: Duration, callback: impl FnMut() + Send + 'static) {
        self.inner.set(period, Box::new(callback));
    }
}
