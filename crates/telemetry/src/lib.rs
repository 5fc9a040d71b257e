// SPDX-License-Identifier: Apache-2.0

//! In-process instrument types ([`instrument::Counter`], [`instrument::Gauge`])
//! and a named metric-set registry ([`metrics::MetricSet`]) shared by every
//! component crate. No exporter lives here: turning a snapshot into OTLP,
//! Prometheus text, or a log line is an external-collaborator concern this
//! workspace does not implement.

pub mod instrument;
pub mod metrics;

pub use instrument::{Counter, Gauge};
pub use metrics::{MetricSet, MetricsSnapshot};
