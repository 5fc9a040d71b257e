// SPDX-License-Identifier: Apache-2.0

//! Per-cell SPSC report collection plus windowed, cross-cell aggregation on
//! a single control executor.
//!
//! Each cell gets a [`SchedReportSink`]/[`MacReportSink`] pair backed by one
//! SPSC report channel. The scheduler fills its half of a report
//! first, the MAC fills its half second and commits the slot; the control
//! executor drains every cell's ring in round-robin order, aligns each
//! report's start slot to the current aggregation window, and emits the
//! combined [`crate::report::AggregatedMetricReport`] once a window closes.

use crate::clock::CellClockSource;
use crate::error::MetricsError;
use crate::metrics::DuMetricsMetrics;
use crate::report::{AggregatedMetricReport, FullCellReport, MacDlCellMetricReport};
use du_channel::ring::{channel, ReportConsumer, ReportProducer, SlotHandle};
use du_config::MetricAggregatorConfig;
use du_runtime::{TaskExecutor, TimerManager, UniqueTimer};
use du_telemetry::MetricSet;
use du_time::{SlotPoint, SlotPointExtended, SubcarrierSpacing};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

/// Rebase `sl_tx` onto `last`'s hyper-SFN, detecting a rollover the way
/// [`du_time::CellTimeController`] does for its own per-slot bookkeeping.
/// The aggregator tracks this independently of the time controller because
/// a cell's metric handler only ever sees bounded `SlotPoint`s crossing the
/// channel, never the controller's internal extended state.
fn rebase(sl_tx: SlotPoint, last: SlotPointExtended) -> SlotPointExtended {
    let mut ext = SlotPointExtended::new(sl_tx, last.hyper_sfn());
    if ext < last {
        ext += sl_tx.nof_slots_per_hyper_system_frame();
    }
    ext
}

/// Projects an extended slot point back to its bounded `SlotPoint`,
/// discarding the hyper-SFN.
fn bounded_of(ext: SlotPointExtended) -> SlotPoint {
    let period = ext.scs().nof_slots_per_hyper_system_frame() as i64;
    let raw = ext.raw_extended_count().rem_euclid(period) as u32;
    SlotPoint::new(ext.scs(), raw)
}

/// Aligns a report's bounded start slot to the hyper-SFN of `reference`,
/// picking whichever of the two candidate hyper-SFNs (the reference's, or
/// one period off it) puts the result closest to `reference`.
fn align_to_reference(sl: SlotPoint, reference: SlotPointExtended) -> SlotPointExtended {
    let period = sl.nof_slots_per_hyper_system_frame();
    let mut candidate = SlotPointExtended::new(sl, reference.hyper_sfn());
    let diff = candidate - reference;
    if diff.unsigned_abs() as i64 >= (period / 2) as i64 {
        if candidate < reference {
            candidate += period;
        } else {
            candidate -= period;
        }
    }
    candidate
}

/// Sink the aggregator delivers completed aggregation windows to.
pub trait MacMetricsNotifier: Send + Sync {
    /// Called once per aggregation window that produced at least one
    /// report, with every still-reporting cell's contribution.
    fn on_new_metrics_report(&self, report: &AggregatedMetricReport);
}

struct CellProducerState {
    last_sl_tx: Option<SlotPointExtended>,
    next_report_slot_tx: Option<SlotPointExtended>,
    open_slot: Option<SlotHandle>,
}

impl Default for CellProducerState {
    fn default() -> Self {
        Self {
            last_sl_tx: None,
            next_report_slot_tx: None,
            open_slot: None,
        }
    }
}

struct CellMetricHandler {
    cell_index: usize,
    scs: SubcarrierSpacing,
    period_slots: u32,
    time_source: Box<dyn CellClockSource>,
    producer: Mutex<ReportProducer<FullCellReport>>,
    state: Mutex<CellProducerState>,
    ctrl_exec: Arc<dyn TaskExecutor>,
    aggregator: Weak<MetricAggregator>,
}

/// Handle the scheduler side uses to fill in its half of each window's
/// report.
#[derive(Clone)]
pub struct SchedReportSink {
    cell: Arc<CellMetricHandler>,
}

/// An open, not-yet-committed report slot, returned by
/// [`SchedReportSink::get_builder`].
pub struct SchedReportBuilder {
    cell: Arc<CellMetricHandler>,
    slot: SlotHandle,
}

impl SchedReportBuilder {
    /// Mutates the scheduler's half of the open report.
    pub fn with_sched_mut<R>(&self, f: impl FnOnce(&mut crate::report::SchedulerCellMetrics) -> R) -> R {
        let producer = self.cell.producer.lock();
        f(&mut producer.slot_mut(self.slot).sched)
    }
}

impl SchedReportSink {
    /// Returns the currently-open builder for this cell, reserving a new
    /// ring slot if none is open yet. Returns `None` if the ring is full.
    pub fn get_builder(&self) -> Option<SchedReportBuilder> {
        let mut state = self.cell.state.lock();
        if let Some(slot) = state.open_slot {
            return Some(SchedReportBuilder {
                cell: Arc::clone(&self.cell),
                slot,
            });
        }
        let mut producer = self.cell.producer.lock();
        match producer.reserve() {
            Ok(slot) => {
                state.open_slot = Some(slot);
                drop(producer);
                Some(SchedReportBuilder {
                    cell: Arc::clone(&self.cell),
                    slot,
                })
            }
            Err(_) => {
                tracing::warn!(cell_index = self.cell.cell_index, "report channel full; dropping scheduler report");
                if let Some(agg) = self.cell.aggregator.upgrade() {
                    agg.metrics.lock().reports_dropped_full_channel.incr();
                }
                None
            }
        }
    }

    /// Hands the currently-open builder off to the MAC phase. A no-op:
    /// both phases address the same underlying ring slot via
    /// [`CellProducerState::open_slot`], so there is nothing to flip here
    /// beyond consuming the builder.
    pub fn commit(&self, builder: SchedReportBuilder) {
        let _ = builder;
    }

    /// True if this cell's current slot has reached its next report
    /// boundary, without mutating the cell's tracked slot position.
    pub fn is_sched_report_required(&self, sl_tx: SlotPoint) -> bool {
        let state = self.cell.state.lock();
        let Some(last) = state.last_sl_tx else {
            return false;
        };
        let new_last = rebase(sl_tx, last);
        state.next_report_slot_tx.is_some_and(|next| new_last >= next)
    }
}

/// Handle the MAC side uses to fill in its half of each window's report and
/// drive cell activation/deactivation bookkeeping.
#[derive(Clone)]
pub struct MacReportSink {
    cell: Arc<CellMetricHandler>,
}

impl MacReportSink {
    /// True if the cell's tracked slot position has reached its next report
    /// boundary *and* the scheduler side has already opened a builder for
    /// it. Mutates the cell's tracked slot position as a side effect,
    /// folding rollover detection into this same per-slot check.
    pub fn is_report_required(&self, sl_tx: SlotPoint) -> bool {
        let mut state = self.cell.state.lock();
        let Some(last) = state.last_sl_tx else {
            return false;
        };
        let new_last = rebase(sl_tx, last);
        state.last_sl_tx = Some(new_last);
        state.open_slot.is_some() && state.next_report_slot_tx.is_some_and(|next| new_last >= next)
    }

    /// Signals that the cell has become active, computing its first
    /// reporting boundary from the clock source's current slot.
    pub fn on_cell_activation(&self) {
        let Some(now) = self.cell.time_source.now() else {
            tracing::warn!(cell_index = self.cell.cell_index, "cell activated with no prior slot indication; deferring");
            return;
        };
        let slot_mod = now.raw_extended_count().rem_euclid(self.cell.period_slots as i64) as u32;
        let mut next_report_slot_tx = now;
        next_report_slot_tx += self.cell.period_slots - slot_mod;

        {
            let mut state = self.cell.state.lock();
            state.last_sl_tx = Some(now);
            state.next_report_slot_tx = Some(next_report_slot_tx);
        }

        let Some(aggregator) = self.cell.aggregator.upgrade() else {
            return;
        };
        let cell_index = self.cell.cell_index;
        self.cell.ctrl_exec.execute_now(Box::new(move || {
            aggregator.handle_cell_activation(cell_index, next_report_slot_tx);
        }));
    }

    /// Signals that the cell is deactivating, handing over its last
    /// (possibly partial) report.
    pub fn on_cell_deactivation(&self, last_report: MacDlCellMetricReport) {
        {
            let mut state = self.cell.state.lock();
            state.last_sl_tx = None;
            state.next_report_slot_tx = None;
        }

        let Some(aggregator) = self.cell.aggregator.upgrade() else {
            return;
        };
        let cell_index = self.cell.cell_index;
        self.cell.ctrl_exec.execute_now(Box::new(move || {
            aggregator.handle_cell_deactivation(cell_index, last_report);
        }));
    }

    /// Fills in the MAC half of the currently-open report and commits the
    /// ring slot, making it visible to the aggregator's control executor.
    ///
    /// # Panics
    /// Panics if called without a builder currently open for this cell
    /// (i.e. without a preceding [`SchedReportSink::get_builder`] /
    /// [`SchedReportSink::commit`] pair).
    pub fn on_cell_metric_report(&self, report: MacDlCellMetricReport) {
        let slot = {
            let mut state = self.cell.state.lock();
            let slot = state.open_slot.take().expect("on_cell_metric_report called without an open builder");
            state.next_report_slot_tx = state.next_report_slot_tx.map(|mut next| {
                next += self.cell.period_slots;
                next
            });
            slot
        };

        {
            let mut producer = self.cell.producer.lock();
            producer.slot_mut(slot).mac = Some(report);
            producer.commit(slot);
        }

        let Some(aggregator) = self.cell.aggregator.upgrade() else {
            return;
        };
        aggregator.note_report_committed();
    }
}

struct CellEntry {
    handler: Arc<CellMetricHandler>,
    consumer: ReportConsumer<FullCellReport>,
    active: bool,
}

struct Inner {
    cells: Vec<Option<CellEntry>>,
    next_report_start_slot: Option<SlotPointExtended>,
    nof_active_cells: u32,
    next_report: AggregatedMetricReport,
}

/// The aggregator's public handle: wires newly-added cells to the shared
/// ring-based report channel, collects per-window reports, and dispatches
/// complete windows to a [`MacMetricsNotifier`].
pub struct MetricAggregator {
    cfg: MetricAggregatorConfig,
    max_nof_du_cells: usize,
    ctrl_exec: Arc<dyn TaskExecutor>,
    mac_notifier: Arc<dyn MacMetricsNotifier>,
    inner: Mutex<Inner>,
    report_count: AtomicU32,
    aggr_timer: Mutex<Option<UniqueTimer>>,
    metrics: Mutex<MetricSet<DuMetricsMetrics>>,
}

/// The pair of report sinks and the window period handed back from
/// [`MetricAggregator::add_cell`].
pub struct CellMetricReportConfig {
    /// Duration of one aggregation window, echoed back for convenience.
    pub period: std::time::Duration,
    /// The scheduler's half of the per-cell report channel.
    pub sched_notifier: SchedReportSink,
    /// The MAC's half of the per-cell report channel.
    pub mac_notifier: MacReportSink,
}

impl MetricAggregator {
    /// Creates an aggregator bounded to `max_nof_du_cells` simultaneously
    /// registered cells, dispatching complete windows to `mac_notifier`.
    pub fn new(
        cfg: MetricAggregatorConfig,
        max_nof_du_cells: usize,
        ctrl_exec: Arc<dyn TaskExecutor>,
        timers: Arc<dyn TimerManager>,
        mac_notifier: Arc<dyn MacMetricsNotifier>,
    ) -> Arc<Self> {
        let this = Arc::new(Self {
            cfg,
            max_nof_du_cells,
            ctrl_exec: Arc::clone(&ctrl_exec),
            mac_notifier,
            inner: Mutex::new(Inner {
                cells: (0..max_nof_du_cells).map(|_| None).collect(),
                next_report_start_slot: None,
                nof_active_cells: 0,
                next_report: AggregatedMetricReport::default(),
            }),
            report_count: AtomicU32::new(0),
            aggr_timer: Mutex::new(None),
            metrics: Mutex::new(MetricSet::new("du_metrics.metrics")),
        });

        let timer = timers.create_timer(Arc::clone(&ctrl_exec));
        let weak = Arc::downgrade(&this);
        timer.set(cfg.aggregation_timeout, move || {
            if let Some(aggregator) = weak.upgrade() {
                aggregator.handle_pending_reports();
            }
        });
        *this.aggr_timer.lock() = Some(timer);

        this
    }

    /// Current metric values.
    pub fn metrics_snapshot(&self) -> du_telemetry::MetricsSnapshot {
        self.metrics.lock().snapshot()
    }

    /// Registers `cell_index`, wiring it to a fresh SPSC ring of the
    /// configured capacity and to `clock` for reading its current slot.
    pub fn add_cell(
        self: &Arc<Self>,
        cell_index: usize,
        scs: SubcarrierSpacing,
        clock: impl CellClockSource + 'static,
    ) -> Result<CellMetricReportConfig, MetricsError> {
        if cell_index >= self.max_nof_du_cells {
            return Err(MetricsError::CellIndexOutOfRange {
                cell_index,
                max_nof_du_cells: self.max_nof_du_cells,
            });
        }

        let mut inner = self.inner.lock();
        if inner.cells[cell_index].is_some() {
            return Err(MetricsError::DuplicateCell { cell_index });
        }

        let period_slots = scs.slots_per_subframe() * self.cfg.report_period.as_millis() as u32;
        let (producer, consumer) = channel::<FullCellReport>(self.cfg.cell_channel_capacity);

        let handler = Arc::new(CellMetricHandler {
            cell_index,
            scs,
            period_slots,
            time_source: Box::new(clock),
            producer: Mutex::new(producer),
            state: Mutex::new(CellProducerState::default()),
            ctrl_exec: Arc::clone(&self.ctrl_exec),
            aggregator: Arc::downgrade(self),
        });

        inner.cells[cell_index] = Some(CellEntry {
            handler: Arc::clone(&handler),
            consumer,
            active: false,
        });

        Ok(CellMetricReportConfig {
            period: self.cfg.report_period,
            sched_notifier: SchedReportSink { cell: Arc::clone(&handler) },
            mac_notifier: MacReportSink { cell: handler },
        })
    }

    /// Removes `cell_index`'s registration outright, whether or not it was
    /// currently active.
    pub fn rem_cell(&self, cell_index: usize) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.cells.get_mut(cell_index) {
            *entry = None;
        }
    }

    fn note_report_committed(&self) {
        self.metrics.lock().reports_received.incr();
        if self.report_count.fetch_add(1, Ordering::AcqRel) == 0 {
            let timer_guard = self.aggr_timer.lock();
            if let Some(timer) = timer_guard.as_ref() {
                timer.run();
            }
        }
    }

    fn handle_cell_activation(&self, cell_index: usize, report_sl_tx: SlotPointExtended) {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.cells[cell_index].as_mut() else {
            return;
        };
        if entry.active {
            return;
        }
        entry.active = true;
        let period_slots = entry.handler.period_slots;

        if inner.next_report_start_slot.is_none() {
            let mut start = report_sl_tx;
            start -= period_slots;
            inner.next_report_start_slot = Some(start);
        }
        inner.nof_active_cells += 1;
        self.metrics.lock().active_cells.incr();
        tracing::info!(cell_index, "cell registered for metric aggregation");
    }

    fn handle_cell_deactivation(&self, cell_index: usize, last_report: MacDlCellMetricReport) {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.cells[cell_index].as_mut() else {
            return;
        };
        if !entry.active {
            return;
        }
        let scs = entry.handler.scs;
        let period_slots = entry.handler.period_slots;

        let report_pushed = Self::push_last_report_if_in_window(&mut inner, scs, period_slots, &last_report);

        let entry = inner.cells[cell_index].as_mut().expect("checked above");
        entry.active = false;
        inner.nof_active_cells -= 1;
        self.metrics.lock().active_cells.decr();
        tracing::info!(cell_index, "cell deregistered from metric aggregation");

        if inner.nof_active_cells == 0 {
            let timer_guard = self.aggr_timer.lock();
            if let Some(timer) = timer_guard.as_ref() {
                timer.stop();
            }
            drop(timer_guard);
            self.handle_pending_reports_locked(&mut inner);
            if !report_pushed {
                Self::push_last_report_if_in_window(&mut inner, scs, period_slots, &last_report);
            }
            self.try_send_new_report_locked(&mut inner);
            inner.next_report_start_slot = None;
        }
    }

    fn push_last_report_if_in_window(inner: &mut Inner, scs: SubcarrierSpacing, period_slots: u32, last_report: &MacDlCellMetricReport) -> bool {
        let Some(next_start) = inner.next_report_start_slot else {
            return false;
        };
        let next_start_sl = bounded_of(next_start);
        let window_end = SlotPoint::new(scs, next_start_sl.count() + period_slots);
        if last_report.start_slot >= next_start_sl && last_report.start_slot < window_end {
            inner.next_report.mac_cells.push(last_report.clone());
            true
        } else {
            false
        }
    }

    fn pop_report_locked(&self, inner: &mut Inner, cell_idx: usize) -> bool {
        let Some(entry) = inner.cells[cell_idx].as_mut() else {
            return false;
        };
        let Ok(head) = entry.consumer.peek() else {
            return false;
        };
        let Some(next_start) = inner.next_report_start_slot else {
            tracing::warn!(cell_index = cell_idx, "discarding report: no cell is active to anchor the aggregation window");
            return false;
        };

        let period_slots = entry.handler.period_slots;
        let start = align_to_reference(head.sched.slot, next_start);
        let mut window_end = next_start;
        window_end += period_slots;

        if start >= next_start && start < window_end {
            if let Some(mac) = &head.mac {
                inner.next_report.mac_cells.push(mac.clone());
            }
            inner.next_report.sched_cells.push(head.sched.clone());
            let _ = entry.consumer.pop();
            return true;
        }

        if start >= window_end {
            // Belongs to a later window; leave it queued.
            return false;
        }

        tracing::warn!(cell_index = cell_idx, "discarding stale report older than the current aggregation window");
        let _ = entry.consumer.pop();
        self.metrics.lock().reports_discarded_stale.incr();
        true
    }

    fn handle_pending_reports_locked(&self, inner: &mut Inner) {
        let mut nof_reports = self.report_count.load(Ordering::Acquire);
        while nof_reports > 0 {
            let mut pop_count = 0u32;
            let ncells = inner.cells.len();
            'cells: for idx in 0..ncells {
                while self.pop_report_locked(inner, idx) {
                    pop_count += 1;
                    if pop_count == nof_reports {
                        break 'cells;
                    }
                }
            }
            if pop_count != nof_reports {
                tracing::warn!(nof_reports, pop_count, "not every pending report was drained in one round-robin pass");
                pop_count = nof_reports;
            }
            nof_reports = self.report_count.fetch_sub(pop_count, Ordering::AcqRel) - pop_count;
            self.try_send_new_report_locked(inner);
        }
    }

    fn handle_pending_reports(&self) {
        let mut inner = self.inner.lock();
        self.handle_pending_reports_locked(&mut inner);
    }

    fn try_send_new_report_locked(&self, inner: &mut Inner) {
        if inner.next_report.mac_cells.is_empty() && inner.next_report.sched_cells.is_empty() {
            return;
        }

        self.mac_notifier.on_new_metrics_report(&inner.next_report);
        self.metrics.lock().aggregates_emitted.incr();

        if let Some(mut next_start) = inner.next_report_start_slot {
            let scs = inner
                .next_report
                .mac_cells
                .first()
                .map(|c| c.start_slot.scs())
                .or_else(|| inner.next_report.sched_cells.first().map(|c| c.slot.scs()));
            if let Some(scs) = scs {
                let period_slots = scs.slots_per_subframe() * self.cfg.report_period.as_millis() as u32;
                next_start += period_slots;
                inner.next_report_start_slot = Some(next_start);
            }
        }

        inner.next_report.mac_cells.clear();
        inner.next_report.sched_cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::FakeCellClock;
    use crate::report::UeMetrics;
    use du_runtime::testing::{FakeTaskExecutor, FakeTimerManager};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn scs30() -> SubcarrierSpacing {
        SubcarrierSpacing::new(2).unwrap()
    }

    fn cfg(period_ms: u64, capacity: usize) -> MetricAggregatorConfig {
        MetricAggregatorConfig {
            report_period: Duration::from_millis(period_ms),
            aggregation_timeout: Duration::from_millis(1),
            cell_channel_capacity: capacity,
        }
    }

    #[derive(Default)]
    struct CollectingNotifier {
        reports: StdMutex<Vec<AggregatedMetricReport>>,
    }

    impl MacMetricsNotifier for CollectingNotifier {
        fn on_new_metrics_report(&self, report: &AggregatedMetricReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    struct ClockHandle(Arc<FakeCellClock>);
    impl CellClockSource for ClockHandle {
        fn now(&self) -> Option<SlotPointExtended> {
            self.0.now()
        }
    }

    fn make_aggregator(period_ms: u64, capacity: usize) -> (Arc<MetricAggregator>, Arc<FakeTaskExecutor>, Arc<CollectingNotifier>) {
        let exec = FakeTaskExecutor::new(64);
        let timers = FakeTimerManager::new();
        let notifier = Arc::new(CollectingNotifier::default());
        let agg = MetricAggregator::new(
            cfg(period_ms, capacity),
            4,
            Arc::clone(&exec) as Arc<dyn TaskExecutor>,
            timers as Arc<dyn TimerManager>,
            Arc::clone(&notifier) as Arc<dyn MacMetricsNotifier>,
        );
        (agg, exec, notifier)
    }

    fn add_activated_cell(agg: &Arc<MetricAggregator>, exec: &FakeTaskExecutor, cell_index: usize) -> (CellMetricReportConfig, Arc<FakeCellClock>) {
        let clock = Arc::new(FakeCellClock::new());
        clock.set(SlotPointExtended::new(SlotPoint::new(scs30(), 0), 0));
        let cell_cfg = agg.add_cell(cell_index, scs30(), ClockHandle(Arc::clone(&clock))).unwrap();
        cell_cfg.mac_notifier.on_cell_activation();
        exec.run_deferred();
        (cell_cfg, clock)
    }

    fn fill_and_commit(cell_cfg: &CellMetricReportConfig, slot: SlotPoint, rnti: u16) {
        let builder = cell_cfg.sched_notifier.get_builder().expect("ring has room");
        builder.with_sched_mut(|sched| {
            sched.slot = slot;
            sched.nof_slots = 1;
            sched.ue_metrics.push(UeMetrics {
                rnti,
                dl_bytes: 100,
                ..Default::default()
            });
        });
        cell_cfg.sched_notifier.commit(builder);
        cell_cfg.mac_notifier.on_cell_metric_report(MacDlCellMetricReport {
            start_slot: slot,
            nof_slots: 1,
            ..Default::default()
        });
    }

    fn fill_and_commit_slots(cell_cfg: &CellMetricReportConfig, start_slot: SlotPoint, nof_slots: u32, rnti: u16) {
        let builder = cell_cfg.sched_notifier.get_builder().expect("ring has room");
        builder.with_sched_mut(|sched| {
            sched.slot = start_slot;
            sched.nof_slots = nof_slots;
            sched.ue_metrics.push(UeMetrics {
                rnti,
                dl_bytes: 100,
                ..Default::default()
            });
        });
        cell_cfg.sched_notifier.commit(builder);
        cell_cfg.mac_notifier.on_cell_metric_report(MacDlCellMetricReport {
            start_slot,
            nof_slots,
            ..Default::default()
        });
    }

    fn add_activated_cell_at(agg: &Arc<MetricAggregator>, exec: &FakeTaskExecutor, cell_index: usize, start: SlotPointExtended) -> (CellMetricReportConfig, Arc<FakeCellClock>) {
        let clock = Arc::new(FakeCellClock::new());
        clock.set(start);
        let cell_cfg = agg.add_cell(cell_index, scs30(), ClockHandle(Arc::clone(&clock))).unwrap();
        cell_cfg.mac_notifier.on_cell_activation();
        exec.run_deferred();
        (cell_cfg, clock)
    }

    #[test]
    fn staggered_creation_yields_one_aggregate_with_partial_first_window() {
        // period_slots = 2 slots/subframe * 10ms = 20.
        let (agg, exec, notifier) = make_aggregator(10, 8);
        let k = 5u32;

        let (cell0_cfg, _clock0) = add_activated_cell(&agg, &exec, 0);
        let (cell1_cfg, _clock1) = add_activated_cell_at(&agg, &exec, 1, SlotPointExtended::new(SlotPoint::new(scs30(), k), 0));

        fill_and_commit_slots(&cell0_cfg, SlotPoint::new(scs30(), 0), 20, 1);
        fill_and_commit_slots(&cell1_cfg, SlotPoint::new(scs30(), k), 20 - k, 2);
        agg.handle_pending_reports();

        let reports = notifier.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].sched_cells.len(), 2);
        assert_eq!(reports[0].sched_cells[0].nof_slots, 20);
        assert_eq!(reports[0].sched_cells[1].nof_slots, 20 - k);
    }

    #[test]
    fn late_cell_removal_still_contributes_its_partial_report_to_the_window() {
        let (agg, exec, notifier) = make_aggregator(10, 8);
        let k = 5u32;

        let (cell0_cfg, _clock0) = add_activated_cell(&agg, &exec, 0);
        let (cell1_cfg, _clock1) = add_activated_cell(&agg, &exec, 1);

        cell0_cfg.mac_notifier.on_cell_deactivation(MacDlCellMetricReport {
            start_slot: SlotPoint::new(scs30(), 0),
            nof_slots: k,
            cell_deactivated: true,
            ..Default::default()
        });
        exec.run_deferred();

        fill_and_commit_slots(&cell1_cfg, SlotPoint::new(scs30(), 0), 20, 2);
        agg.handle_pending_reports();

        let reports = notifier.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].mac_cells.len(), 2);
        assert_eq!(reports[0].mac_cells[0].nof_slots, k);
        assert_eq!(reports[0].mac_cells[1].nof_slots, 20);
    }

    #[test]
    fn single_cell_emits_one_aggregate_per_window() {
        let (agg, exec, notifier) = make_aggregator(10, 8);
        let (cell_cfg, _clock) = add_activated_cell(&agg, &exec, 0);

        fill_and_commit(&cell_cfg, SlotPoint::new(scs30(), 0), 1);
        agg.handle_pending_reports();

        let reports = notifier.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].sched_cells.len(), 1);
        assert_eq!(reports[0].sched_cells[0].ue_metrics[0].rnti, 1);
    }

    #[test]
    fn full_channel_drops_report_and_is_counted() {
        let (agg, exec, _notifier) = make_aggregator(10, 1);
        let (cell_cfg, _clock) = add_activated_cell(&agg, &exec, 0);

        fill_and_commit(&cell_cfg, SlotPoint::new(scs30(), 0), 1);
        assert!(cell_cfg.sched_notifier.get_builder().is_none());

        let snap = agg.metrics_snapshot();
        assert_eq!(snap.values["reports_dropped_full_channel"], 1);
    }

    #[test]
    fn deactivation_pushes_final_report_when_in_window() {
        let (agg, exec, notifier) = make_aggregator(10, 8);
        let (cell_cfg, _clock) = add_activated_cell(&agg, &exec, 0);

        let final_report = MacDlCellMetricReport {
            start_slot: SlotPoint::new(scs30(), 0),
            nof_slots: 1,
            cell_deactivated: true,
            ..Default::default()
        };
        cell_cfg.mac_notifier.on_cell_deactivation(final_report.clone());
        exec.run_deferred();

        let reports = notifier.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].mac_cells.as_slice(), [final_report]);

        let snap = agg.metrics_snapshot();
        assert_eq!(snap.values["active_cells"], 0);
    }

    #[test]
    fn duplicate_add_cell_is_rejected() {
        let (agg, exec, _notifier) = make_aggregator(10, 8);
        let (_cell_cfg, _clock) = add_activated_cell(&agg, &exec, 0);
        let other_clock = Arc::new(FakeCellClock::new());
        assert_eq!(
            agg.add_cell(0, scs30(), ClockHandle(other_clock)).unwrap_err(),
            MetricsError::DuplicateCell { cell_index: 0 }
        );
    }

    #[test]
    fn out_of_range_cell_index_is_rejected() {
        let (agg, _exec, _notifier) = make_aggregator(10, 8);
        let clock = Arc::new(FakeCellClock::new());
        assert_eq!(
            agg.add_cell(99, scs30(), ClockHandle(clock)).unwrap_err(),
            MetricsError::CellIndexOutOfRange {
                cell_index: 99,
                max_nof_du_cells: 4,
            }
        );
    }
}
