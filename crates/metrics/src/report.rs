// SPDX-License-Identifier: Apache-2.0

//! Per-cell MAC-DL and scheduler report payloads, the combined per-window
//! aggregate, and the recyclable slot type the SPSC channel hands between
//! producer and consumer.

use du_channel::Recyclable;
use du_time::slot_point::SlotPoint;
use smallvec::SmallVec;
use std::time::Duration;

/// Inline capacity for the per-window, per-cell report vectors: most
/// deployments activate a handful of cells per DU, so a window's combined
/// report rarely spills to the heap.
const NOF_CELLS_INLINE: usize = 8;

/// RNTI identifying a UE within a cell. Kept as a plain `u16` rather than a
/// newtype: the core never interprets its bits, only carries it through.
pub type Rnti = u16;

/// Min/average/max distribution over a window, used for wall-clock, user,
/// and system CPU time spent processing a cell's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LatencyStats {
    /// Smallest observed sample in the window.
    pub min: Duration,
    /// Mean of all observed samples in the window.
    pub avg: Duration,
    /// Largest observed sample in the window.
    pub max: Duration,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            min: Duration::ZERO,
            avg: Duration::ZERO,
            max: Duration::ZERO,
        }
    }
}

/// Per-UE scheduler counters carried in a [`SchedulerCellMetrics`] report,
/// trimmed to the fields the core's aggregation and alignment logic need to
/// carry through untouched.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct UeMetrics {
    /// The UE this entry reports on.
    pub rnti: Rnti,
    /// DL throughput observed in the window, bytes.
    pub dl_bytes: u64,
    /// UL throughput observed in the window, bytes.
    pub ul_bytes: u64,
    /// Average DL CQI reported by the UE in the window, if any was
    /// received.
    pub dl_cqi: Option<u8>,
}

/// The kind of per-UE lifecycle event carried in a [`SchedulerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UeEventType {
    /// A UE was added to the scheduler's UE pool.
    UeAdd,
    /// A UE's configuration was reconfigured.
    UeReconf,
    /// A UE was removed from the scheduler's UE pool.
    UeRem,
}

/// A single scheduler lifecycle event, timestamped to the slot it occurred
/// in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerEvent {
    /// The UE the event concerns.
    pub rnti: Rnti,
    /// Raw bounded slot count the event was recorded at (the numerology is
    /// implied by the owning report's `slot`).
    pub slot: u32,
    /// The kind of event.
    pub event_type: UeEventType,
}

/// One cell's scheduler report for an aggregation window: the window's
/// start slot, how many slots it spans, per-UE counters, and lifecycle
/// events observed during the window.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SchedulerCellMetrics {
    /// First slot of the window this report covers.
    pub slot: SlotPoint,
    /// Number of slots the window spans. Strictly less than the
    /// configured period for a late-joining cell's first window.
    pub nof_slots: u32,
    /// Per-UE counters accumulated during the window.
    pub ue_metrics: Vec<UeMetrics>,
    /// Scheduler lifecycle events observed during the window.
    pub events: Vec<SchedulerEvent>,
}

impl SchedulerCellMetrics {
    fn placeholder_slot() -> SlotPoint {
        use du_time::slot_point::SubcarrierSpacing;
        SlotPoint::new(SubcarrierSpacing::new(1).expect("1 is a valid SCS"), 0)
    }
}

impl Default for SchedulerCellMetrics {
    fn default() -> Self {
        Self {
            slot: Self::placeholder_slot(),
            nof_slots: 0,
            ue_metrics: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// One cell's MAC-DL report for an aggregation window: timing distributions
/// and context-switch counters collected while processing the window's
/// slots, plus whether the cell deactivated during it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MacDlCellMetricReport {
    /// First slot of the window this report covers.
    pub start_slot: SlotPoint,
    /// Number of slots the window spans.
    pub nof_slots: u32,
    /// Nominal duration of one slot at the cell's numerology.
    pub slot_duration: Duration,
    /// Wall-clock latency distribution of the cell's slot-indication
    /// handler during the window.
    pub wall_clock_latency: LatencyStats,
    /// User CPU time distribution.
    pub user_latency: LatencyStats,
    /// System CPU time distribution.
    pub system_latency: LatencyStats,
    /// Voluntary context switches observed during the window.
    pub count_voluntary_context_switches: u64,
    /// Involuntary context switches observed during the window.
    pub count_involuntary_context_switches: u64,
    /// True if this report is the cell's final (possibly partial) report
    /// before deactivation.
    pub cell_deactivated: bool,
}

impl Default for MacDlCellMetricReport {
    fn default() -> Self {
        Self {
            start_slot: SchedulerCellMetrics::placeholder_slot(),
            nof_slots: 0,
            slot_duration: Duration::ZERO,
            wall_clock_latency: LatencyStats::default(),
            user_latency: LatencyStats::default(),
            system_latency: LatencyStats::default(),
            count_voluntary_context_switches: 0,
            count_involuntary_context_switches: 0,
            cell_deactivated: false,
        }
    }
}

/// A complete aggregation-window report: every still-active cell's MAC-DL
/// and scheduler reports, all pertaining to the same `[T0, T0 + period)`
/// window.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct AggregatedMetricReport {
    /// One entry per cell that contributed a MAC-DL report to the window.
    pub mac_cells: SmallVec<[MacDlCellMetricReport; NOF_CELLS_INLINE]>,
    /// One entry per cell that contributed a scheduler report to the
    /// window.
    pub sched_cells: SmallVec<[SchedulerCellMetrics; NOF_CELLS_INLINE]>,
}

/// The recyclable payload stored in each cell's SPSC ring slot: the
/// scheduler's half filled in first, the MAC's half filled in second, the
/// two published to the consumer together by a single ring commit.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FullCellReport {
    /// The scheduler's portion of the report, always present once
    /// committed.
    pub sched: SchedulerCellMetrics,
    /// The MAC's portion, filled in after the scheduler's.
    pub mac: Option<MacDlCellMetricReport>,
}

impl Recyclable for FullCellReport {
    fn recycle(&mut self) {
        // Clear, don't free: steady-state operation keeps the `Vec`
        // allocations alive across reuse.
        self.sched.ue_metrics.clear();
        self.sched.events.clear();
        self.mac = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycle_clears_vectors_but_not_capacity() {
        let mut report = FullCellReport {
            sched: SchedulerCellMetrics {
                ue_metrics: vec![UeMetrics::default(); 4],
                events: vec![SchedulerEvent {
                    rnti: 1,
                    slot: 0,
                    event_type: UeEventType::UeAdd,
                }],
                ..SchedulerCellMetrics::default()
            },
            mac: Some(MacDlCellMetricReport::default()),
        };
        let ue_cap_before = report.sched.ue_metrics.capacity();

        report.recycle();

        assert!(report.sched.ue_metrics.is_empty());
        assert!(report.sched.events.is_empty());
        assert!(report.mac.is_none());
        assert_eq!(report.sched.ue_metrics.capacity(), ue_cap_before);
    }
}
