// SPDX-License-Identifier: Apache-2.0

//! Merges N independent cell slot streams into one monotonic extended
//! clock and dispatches `tick()` into a shared timer wheel exactly once
//! per subframe boundary, regardless of how many cells observe it.

use crate::error::TimeError;
use crate::metrics::DuTimeMetrics;
use crate::slot_point::SlotPoint;
use crate::slot_point_extended::SlotPointExtended;
use du_runtime::{TaskExecutor, TimerManager};
use du_telemetry::MetricSet;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;

/// Subframe jumps at or beyond this count are treated as a clock glitch and
/// suppressed rather than caught up.
const MAX_SKIPPED: i64 = 128;

/// Sentinel for "no cell has initialized the master clock yet". Distinct
/// from every value `(sl_tx - 1).count()` can legitimately produce (which
/// includes small negative numbers, e.g. `-1` itself for a cell whose first
/// slot indication is slot 0) so a freshly-initialized master can never be
/// mistaken for an uninitialized one.
const UNINITIALIZED_MASTER: i32 = i32::MIN;

#[derive(Debug, Default, Clone, Copy)]
struct CellContext {
    active: bool,
    last_counter: Option<SlotPointExtended>,
}

/// Computes a newly-activating cell's initial extended counter by aligning
/// it to the current master clock, choosing whichever hyper-SFN makes the
/// signed distance to the master smallest (the "closest-by-half-HFN" rule).
fn get_init_slot_tx_ext(sl_tx: SlotPoint, master_cell_clock: i32) -> SlotPointExtended {
    let max_slot_diff = (sl_tx.nof_slots_per_hyper_system_frame() / 2) as i64;
    let master_sl = SlotPointExtended::from_raw_count(sl_tx.scs(), master_cell_clock);
    let mut curr_count = SlotPointExtended::new(sl_tx, master_sl.hyper_sfn());
    let diff = curr_count - master_sl;
    if diff < -max_slot_diff {
        curr_count += sl_tx.nof_slots_per_hyper_system_frame();
    } else if diff > max_slot_diff {
        curr_count -= sl_tx.nof_slots_per_hyper_system_frame();
    }
    curr_count
}

/// Gathers per-cell slot indications, tracks hyper-SFN rollover per cell,
/// and ticks a shared [`TimerManager`] once per subframe boundary via a
/// single `master_count` CAS race rather than a per-cell responsibility
/// list.
pub struct CellTimeController {
    timers: Arc<dyn TimerManager>,
    tick_exec: Arc<dyn TaskExecutor>,
    cells: Vec<Mutex<CellContext>>,
    master_count: AtomicI32,
    missed_slots: AtomicI32,
    nof_active_cells: AtomicU32,
    metrics: Mutex<MetricSet<DuTimeMetrics>>,
}

impl CellTimeController {
    /// Creates a controller bounded to `cfg.max_nof_du_cells` simultaneously
    /// active cells, driving `timers` via deferred work submitted to
    /// `tick_exec`. Does not re-validate `cfg`; callers should already have
    /// run [`du_config::TimeControllerConfig::validate`] as part of loading
    /// the static configuration.
    pub fn new(cfg: &du_config::TimeControllerConfig, timers: Arc<dyn TimerManager>, tick_exec: Arc<dyn TaskExecutor>) -> Arc<Self> {
        Arc::new(Self {
            timers,
            tick_exec,
            cells: (0..cfg.max_nof_du_cells).map(|_| Mutex::new(CellContext::default())).collect(),
            master_count: AtomicI32::new(UNINITIALIZED_MASTER),
            missed_slots: AtomicI32::new(0),
            nof_active_cells: AtomicU32::new(0),
            metrics: Mutex::new(MetricSet::new("du_time.metrics")),
        })
    }

    /// Returns an RAII handle for `cell_index`; dropping it deactivates the
    /// cell if still active.
    pub fn add_cell(self: &Arc<Self>, cell_index: usize) -> Result<CellTimerSource, TimeError> {
        if cell_index >= self.cells.len() {
            return Err(TimeError::CellIndexOutOfRange {
                cell_index,
                max_nof_du_cells: self.cells.len(),
            });
        }
        Ok(CellTimerSource {
            controller: Arc::clone(self),
            cell_index,
        })
    }

    /// Current metric values.
    pub fn metrics_snapshot(&self) -> du_telemetry::MetricsSnapshot {
        self.metrics.lock().snapshot()
    }

    fn handle_cell_activation(&self, cell_index: usize, sl_tx: SlotPoint) {
        let mut cell = self.cells[cell_index].lock();
        if cell.active {
            return;
        }
        cell.active = true;
        let _ = self.nof_active_cells.fetch_add(1, Ordering::AcqRel);
        self.metrics.lock().active_cells.incr();

        let cur_master = self.master_count.load(Ordering::Relaxed);
        if cur_master == UNINITIALIZED_MASTER {
            let last_counter = SlotPointExtended::new(sl_tx, 0);
            let master_count_val = (last_counter - 1).count();
            match self.master_count.compare_exchange(cur_master, master_count_val, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => cell.last_counter = Some(last_counter),
                Err(observed) => {
                    debug_assert_ne!(observed, UNINITIALIZED_MASTER, "CAS loss implies a real master value was stored");
                    cell.last_counter = Some(get_init_slot_tx_ext(sl_tx, observed));
                }
            }
        } else {
            cell.last_counter = Some(get_init_slot_tx_ext(sl_tx, cur_master));
        }
    }

    fn handle_cell_deactivation(&self, cell_index: usize) {
        let mut cell = self.cells[cell_index].lock();
        if !cell.active {
            return;
        }
        cell.active = false;
        drop(cell);
        self.metrics.lock().active_cells.decr();

        let mut master_cell_clock = self.master_count.load(Ordering::Relaxed);
        let mut nof_active = self.nof_active_cells.fetch_sub(1, Ordering::Release) - 1;

        while nof_active == 0 && master_cell_clock != UNINITIALIZED_MASTER {
            match self.master_count.compare_exchange(master_cell_clock, UNINITIALIZED_MASTER, Ordering::Release, Ordering::Relaxed) {
                Ok(_) => {
                    self.metrics.lock().master_clock_resets.incr();
                    break;
                }
                Err(observed) => {
                    master_cell_clock = observed;
                    nof_active = self.nof_active_cells.load(Ordering::Acquire);
                }
            }
        }

        if nof_active == 0 {
            tracing::info!(cell_index, "all cells deactivated; clock reset pending reactivation");
        }
    }

    fn handle_slot_ind(&self, cell_index: usize, sl_tx: SlotPoint) -> SlotPointExtended {
        let was_active = self.cells[cell_index].lock().active;
        if !was_active {
            self.handle_cell_activation(cell_index, sl_tx);
        }

        let cell_sl_counter = {
            let mut cell = self.cells[cell_index].lock();
            if was_active {
                let existing = cell.last_counter.expect("active cell always has a last_counter");
                let mut sl_tx_ext = SlotPointExtended::new(sl_tx, existing.hyper_sfn());
                if sl_tx_ext < existing {
                    // SFN rollover detected.
                    sl_tx_ext += sl_tx.nof_slots_per_hyper_system_frame();
                }
                cell.last_counter = Some(sl_tx_ext);
            }
            cell.last_counter.expect("activation path sets this above")
        };

        if cell_sl_counter.subframe_slot_index() != 0 {
            return cell_sl_counter;
        }

        let mut master_cpy = self.master_count.load(Ordering::Relaxed);
        let master_sl = loop {
            let master_sl = SlotPointExtended::from_raw_count(sl_tx.scs(), master_cpy);
            if cell_sl_counter <= master_sl {
                break master_sl;
            }
            match self.master_count.compare_exchange_weak(master_cpy, cell_sl_counter.count(), Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => break master_sl,
                Err(observed) => master_cpy = observed,
            }
        };
        // `cell_sl_counter - master_sl` is a slot-unit distance; both
        // operands sit on a subframe boundary (checked above), so it is
        // always an exact multiple of `slots_per_subframe` except for the
        // very first boundary after master-clock bootstrap, where the
        // master is seeded one slot (not one subframe) behind. Dividing
        // converts to the subframe/tick unit `timers.tick()` expects.
        let nof_skipped = (cell_sl_counter - master_sl) / sl_tx.scs().slots_per_subframe() as i64;

        if nof_skipped <= 0 {
            return cell_sl_counter;
        }

        if nof_skipped >= MAX_SKIPPED {
            tracing::warn!(cell_index, nof_skipped, "unexpected jump in slot indications");
            self.metrics.lock().ticks_skipped_and_dropped.add(nof_skipped as u64);
            return cell_sl_counter;
        }

        let nof_skipped = nof_skipped + self.missed_slots.swap(0, Ordering::Relaxed) as i64;

        let timers = Arc::clone(&self.timers);
        let accepted = self.tick_exec.defer(Box::new(move || {
            for _ in 0..nof_skipped {
                timers.tick();
            }
        }));

        if accepted {
            self.metrics.lock().ticks_emitted.add(nof_skipped as u64);
        } else {
            self.missed_slots.store(nof_skipped as i32, Ordering::Relaxed);
        }

        cell_sl_counter
    }
}

/// A single cell's handle onto the shared [`CellTimeController`]. Dropping
/// it deactivates the cell if it was still active, mirroring the
/// originating system's RAII cell-timer-source lifetime.
pub struct CellTimerSource {
    controller: Arc<CellTimeController>,
    cell_index: usize,
}

impl CellTimerSource {
    /// Feeds one slot indication for this cell, returning its extended
    /// slot point. Drives activation on the first call.
    pub fn on_slot_indication(&self, sl_tx: SlotPoint) -> SlotPointExtended {
        self.controller.handle_slot_ind(self.cell_index, sl_tx)
    }

    /// Explicitly deactivates the cell ahead of dropping the handle.
    pub fn on_cell_deactivation(&self) {
        self.controller.handle_cell_deactivation(self.cell_index);
    }

    /// The cell's last-known extended slot point, as last advanced by
    /// [`Self::on_slot_indication`]. `None` if the cell has not yet
    /// received a slot indication since activation.
    pub fn now(&self) -> Option<SlotPointExtended> {
        self.controller.cells[self.cell_index].lock().last_counter
    }
}

impl Drop for CellTimerSource {
    fn drop(&mut self) {
        let active = self.controller.cells[self.cell_index].lock().active;
        if active {
            self.controller.handle_cell_deactivation(self.cell_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot_point::SubcarrierSpacing;
    use du_runtime::testing::{FakeTaskExecutor, FakeTimerManager};
    use pretty_assertions::assert_eq;

    fn scs30() -> SubcarrierSpacing {
        SubcarrierSpacing::new(2).unwrap()
    }

    fn cfg(max_nof_du_cells: usize) -> du_config::TimeControllerConfig {
        du_config::TimeControllerConfig { max_nof_du_cells }
    }

    #[test]
    fn single_cell_tick_advances_by_subframe_count() {
        let exec = FakeTaskExecutor::new(64);
        let timers = FakeTimerManager::new();
        let controller = CellTimeController::new(&cfg(4), Arc::clone(&timers) as Arc<dyn TimerManager>, Arc::clone(&exec) as Arc<dyn TaskExecutor>);
        let cell = controller.add_cell(0).unwrap();

        for i in 0..40u32 {
            cell.on_slot_indication(SlotPoint::new(scs30(), i));
        }
        exec.run_deferred();

        assert_eq!(timers.now(), 19);
    }

    #[test]
    fn two_cells_aligned_ticks_do_not_duplicate() {
        let exec = FakeTaskExecutor::new(64);
        let timers = FakeTimerManager::new();
        let controller = CellTimeController::new(&cfg(4), Arc::clone(&timers) as Arc<dyn TimerManager>, Arc::clone(&exec) as Arc<dyn TaskExecutor>);
        let cell0 = controller.add_cell(0).unwrap();
        let cell1 = controller.add_cell(1).unwrap();

        for i in 0..40u32 {
            cell0.on_slot_indication(SlotPoint::new(scs30(), i));
            cell1.on_slot_indication(SlotPoint::new(scs30(), i));
            exec.run_deferred();
        }

        assert_eq!(timers.now(), 19);
    }

    #[test]
    fn rejects_out_of_range_cell_index() {
        let exec = FakeTaskExecutor::new(4);
        let timers = FakeTimerManager::new();
        let controller = CellTimeController::new(&cfg(2), timers as Arc<dyn TimerManager>, exec as Arc<dyn TaskExecutor>);
        assert_eq!(
            controller.add_cell(2).unwrap_err(),
            TimeError::CellIndexOutOfRange {
                cell_index: 2,
                max_nof_du_cells: 2,
            }
        );
    }

    #[test]
    fn deactivation_resets_master_clock_when_last_cell_leaves() {
        let exec = FakeTaskExecutor::new(64);
        let timers = FakeTimerManager::new();
        let controller = CellTimeController::new(&cfg(2), Arc::clone(&timers) as Arc<dyn TimerManager>, Arc::clone(&exec) as Arc<dyn TaskExecutor>);
        let cell = controller.add_cell(0).unwrap();
        cell.on_slot_indication(SlotPoint::new(scs30(), 0));
        drop(cell);

        let snap = controller.metrics_snapshot();
        assert_eq!(snap.values["master_clock_resets"], 1);
        assert_eq!(snap.values["active_cells"], 0);
    }

    #[test]
    fn reactivation_after_full_reset_realigns_from_scratch() {
        let exec = FakeTaskExecutor::new(64);
        let timers = FakeTimerManager::new();
        let controller = CellTimeController::new(&cfg(2), Arc::clone(&timers) as Arc<dyn TimerManager>, Arc::clone(&exec) as Arc<dyn TaskExecutor>);
        {
            let cell = controller.add_cell(0).unwrap();
            for i in 0..4u32 {
                cell.on_slot_indication(SlotPoint::new(scs30(), i));
            }
        }
        exec.run_deferred();
        let ticks_before = timers.now();

        let cell = controller.add_cell(0).unwrap();
        for i in 0..4u32 {
            cell.on_slot_indication(SlotPoint::new(scs30(), i));
        }
        exec.run_deferred();

        assert!(timers.now() >= ticks_before);
    }
}
