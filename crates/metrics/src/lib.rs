// SPDX-License-Identifier: Apache-2.0

//! Lock-light per-cell SPSC metric report channel plus a windowed
//! cross-cell aggregator ([`aggregator::MetricAggregator`]). A cell's
//! scheduler and MAC halves fill one [`report::FullCellReport`] per slot
//! window and hand it to a single control executor, which aligns every
//! cell's report to a shared `[T0, T0 + period)` window and emits the
//! combined result to a [`aggregator::MacMetricsNotifier`].

pub mod aggregator;
pub mod clock;
pub mod error;
pub mod metrics;
pub mod report;

pub use aggregator::{CellMetricReportConfig, MacMetricsNotifier, MacReportSink, MetricAggregator, SchedReportBuilder, SchedReportSink};
pub use clock::CellClockSource;
pub use error::MetricsError;
pub use metrics::DuMetricsMetrics;
pub use report::{AggregatedMetricReport, FullCellReport, LatencyStats, MacDlCellMetricReport, Rnti, SchedulerCellMetrics, SchedulerEvent, UeEventType, UeMetrics};
