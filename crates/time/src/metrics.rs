// SPDX-License-Identifier: Apache-2.0

//! Metric set reported by [`crate::CellTimeController`].

use du_telemetry::{Counter, Gauge};

/// Per-process time-controller metrics.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct DuTimeMetrics {
    /// Total ticks dispatched to the timer facility since start.
    pub ticks_emitted: Counter<u64>,
    /// Ticks that were discarded because a subframe jump reached or
    /// exceeded `MAX_SKIPPED`, rather than deferred and retried.
    pub ticks_skipped_and_dropped: Counter<u64>,
    /// Number of times the master clock was reset to uninitialized after
    /// the last active cell deactivated.
    pub master_clock_resets: Counter<u64>,
    /// Current number of active cells.
    pub active_cells: Gauge<u64>,
}
