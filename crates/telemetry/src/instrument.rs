// SPDX-License-Identifier: Apache-2.0

//! Per-field instrument types embedded in a crate's metric-set struct.
//!
//! These are plain owned values, not atomics: a metric set belongs to
//! exactly one executor (the same single-threaded-per-component rule the
//! rest of the core follows), so there is never a concurrent writer to
//! race against. A consumer reading metrics across executors does so
//! through a [`crate::metrics::MetricSet::snapshot`] taken at a controlled
//! point, never through a live reference.

/// A monotonically-increasing count, such as `ticks_emitted` or
/// `reports_received`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Counter<T = u64> {
    value: T,
}

impl Counter<u64> {
    /// Adds `delta` to the counter.
    pub fn add(&mut self, delta: u64) {
        self.value = self.value.saturating_add(delta);
    }

    /// Increments the counter by one.
    pub fn incr(&mut self) {
        self.add(1);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value
    }
}

impl Counter<f64> {
    /// Adds `delta` to the counter.
    pub fn add(&mut self, delta: f64) {
        self.value += delta;
    }

    /// Current value.
    pub fn get(&self) -> f64 {
        self.value
    }
}

/// A point-in-time value that can go up or down, such as `active_cells` or
/// `sessions_active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Gauge<T = u64> {
    value: T,
}

impl<T: Copy> Gauge<T> {
    /// Overwrites the gauge's current value.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value
    }
}

impl Gauge<u64> {
    /// Increments the gauge by one, saturating at `u64::MAX`.
    pub fn incr(&mut self) {
        self.value = self.value.saturating_add(1);
    }

    /// Decrements the gauge by one, saturating at zero.
    pub fn decr(&mut self) {
        self.value = self.value.saturating_sub(1);
    }
}
