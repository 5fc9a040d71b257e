// SPDX-License-Identifier: Apache-2.0

//! A named bundle of instruments, owned by the component that updates it.

/// Wraps a plain struct of [`crate::instrument::Counter`]/[`crate::instrument::Gauge`]
/// fields with the name under which it should be reported, and a
/// `snapshot()` that serializes the current values.
///
/// `T` carries no behavior of its own beyond `Default` (for registration)
/// and `Serialize` (for the snapshot); a crate defines its own metric-set
/// struct and registers one `MetricSet<ThatStruct>` per component instance,
/// the same shape `pipeline_metrics.rs` uses for `PipelineMetrics` and
/// `TokioRuntimeMetrics`.
#[derive(Debug, Clone)]
pub struct MetricSet<T> {
    name: &'static str,
    inner: T,
}

impl<T: Default> MetricSet<T> {
    /// Registers a new, zeroed metric set under `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: T::default(),
        }
    }
}

impl<T> MetricSet<T> {
    /// The name this set is reported under.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: serde::Serialize> MetricSet<T> {
    /// Serializes the current instrument values to a `serde_json::Value`,
    /// tagged with this set's name.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            name: self.name,
            values: serde_json::to_value(&self.inner)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl<T> std::ops::Deref for MetricSet<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> std::ops::DerefMut for MetricSet<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

/// A point-in-time, serializable view of a [`MetricSet`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Name of the metric set this snapshot was taken from.
    pub name: &'static str,
    /// Current instrument values, keyed by field name.
    pub values: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Counter, Gauge};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, Clone, serde::Serialize)]
    struct SampleMetrics {
        widgets_emitted: Counter<u64>,
        widgets_active: Gauge<u64>,
    }

    #[test]
    fn snapshot_reflects_current_values() {
        let mut set: MetricSet<SampleMetrics> = MetricSet::new("sample.metrics");
        set.widgets_emitted.add(3);
        set.widgets_active.set(2);

        let snap = set.snapshot();
        assert_eq!(snap.name, "sample.metrics");
        assert_eq!(snap.values["widgets_emitted"], 3);
        assert_eq!(snap.values["widgets_active"], 2);
    }

    #[test]
    fn deref_mut_allows_field_access() {
        let mut set: MetricSet<SampleMetrics> = MetricSet::new("sample.metrics");
        set.widgets_emitted.incr();
        assert_eq!(set.widgets_emitted.get(), 1);
    }
}
