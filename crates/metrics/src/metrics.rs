// SPDX-License-Identifier: Apache-2.0

//! Metric set reported by [`crate::aggregator::MetricAggregator`].

use du_telemetry::{Counter, Gauge};

/// Per-process metric-aggregator metrics.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct DuMetricsMetrics {
    /// Reports successfully committed to a cell's SPSC ring.
    pub reports_received: Counter<u64>,
    /// Reports dropped at the producer side because the ring was full.
    pub reports_dropped_full_channel: Counter<u64>,
    /// Reports popped and discarded because they fell outside the current
    /// or next aggregation window.
    pub reports_discarded_stale: Counter<u64>,
    /// Aggregated reports emitted to the downstream sink.
    pub aggregates_emitted: Counter<u64>,
    /// Current number of active cells.
    pub active_cells: Gauge<u64>,
}
