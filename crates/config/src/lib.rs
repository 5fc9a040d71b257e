// SPDX-License-Identifier: Apache-2.0

//! Typed, validated static configuration for the DU concurrency core:
//! [`settings::TimeControllerConfig`], [`settings::MetricAggregatorConfig`],
//! and [`settings::UpResourceManagerConfig`], tied together by
//! [`settings::DuConfig`]. Every section is plain `serde` data; validity
//! beyond what the type system expresses (nonzero bounds, whole-millisecond
//! periods, power-of-two channel capacities, a well-formed QoS catalog) is
//! checked explicitly by each section's `validate()` rather than during
//! deserialization, so a caller can inspect a rejected document before
//! deciding what to do about it.

pub mod error;
pub mod qos;
pub mod settings;

pub use error::ConfigError;
pub use qos::{FiveQi, FiveQiTemplate, PdcpConfigTemplate, QosCatalog, RlcMode};
pub use settings::{DuConfig, MetricAggregatorConfig, TimeControllerConfig, UpResourceManagerConfig};
