// SPDX-License-Identifier: Apache-2.0

//! Top-level static configuration sections for the time controller, metric
//! aggregator, and UP resource manager.

use crate::error::ConfigError;
use crate::qos::QosCatalog;
use std::time::Duration;

/// Static configuration for the UP resource manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpResourceManagerConfig {
    /// Upper bound on DRB IDs allocated to a single UE.
    pub max_nof_drbs_per_ue: u8,
    /// 5QI → {PDCP, SDAP} template table.
    pub qos_catalog: QosCatalog,
}

impl UpResourceManagerConfig {
    /// Validates the section: nonzero DRB bound, a well-formed QoS catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nof_drbs_per_ue == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "max_nof_drbs_per_ue",
            });
        }
        self.qos_catalog.validate()
    }
}

/// Static configuration for the cell time controller.
///
/// `max_nof_du_cells` bounds a fixed-capacity cell array; kept as a
/// validated runtime constant here rather than a const generic (see
/// DESIGN.md's Open Question on const-generic cell counts).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct TimeControllerConfig {
    /// Maximum number of simultaneously active cells this process supports.
    pub max_nof_du_cells: usize,
}

impl TimeControllerConfig {
    /// Validates the section: a nonzero cell bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nof_du_cells == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "max_nof_du_cells",
            });
        }
        Ok(())
    }
}

/// Static configuration for the metric aggregator.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MetricAggregatorConfig {
    /// Duration of one aggregation window.
    #[serde(with = "humantime_serde")]
    pub report_period: Duration,
    /// How long the aggregator waits, after the first report of a window
    /// arrives, before emitting the aggregate regardless of stragglers.
    #[serde(with = "humantime_serde")]
    pub aggregation_timeout: Duration,
    /// Capacity of each cell's SPSC report ring; must be a power of two.
    pub cell_channel_capacity: usize,
}

impl MetricAggregatorConfig {
    /// Validates the section: whole-millisecond durations (the timer
    /// facility ticks in whole milliseconds), nonzero timeout, and a
    /// power-of-two channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let millis = self.report_period.as_millis();
        let nanos_remainder = self.report_period.subsec_nanos() % 1_000_000;
        if nanos_remainder != 0 {
            return Err(ConfigError::NonWholeSubframePeriod {
                millis,
                remainder: (nanos_remainder / 1000) as u128,
            });
        }
        if self.report_period.is_zero() {
            return Err(ConfigError::ZeroCapacity {
                field: "report_period",
            });
        }
        if self.aggregation_timeout.is_zero() {
            return Err(ConfigError::ZeroCapacity {
                field: "aggregation_timeout",
            });
        }
        if self.cell_channel_capacity == 0 || !self.cell_channel_capacity.is_power_of_two() {
            return Err(ConfigError::ChannelCapacityNotPowerOfTwo {
                capacity: self.cell_channel_capacity,
            });
        }
        Ok(())
    }
}

/// The full static configuration document for the DU concurrency core.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DuConfig {
    /// Time controller settings.
    pub time_controller: TimeControllerConfig,
    /// Metric aggregator settings.
    pub metric_aggregator: MetricAggregatorConfig,
    /// UP resource manager settings.
    pub up_resource_manager: UpResourceManagerConfig,
}

impl DuConfig {
    /// Parses a YAML document into a `DuConfig`. Does not validate; call
    /// [`Self::validate`] afterwards.
    pub fn from_yaml(doc: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(doc)
    }

    /// Parses a JSON document into a `DuConfig`. Does not validate; call
    /// [`Self::validate`] afterwards.
    pub fn from_json(doc: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(doc)
    }

    /// Validates every section, logging each rejection at `warn` before
    /// returning the first error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = self.time_controller.validate() {
            tracing::warn!(error = %e, "invalid time_controller config");
            return Err(e);
        }
        if let Err(e) = self.metric_aggregator.validate() {
            tracing::warn!(error = %e, "invalid metric_aggregator config");
            return Err(e);
        }
        if let Err(e) = self.up_resource_manager.validate() {
            tracing::warn!(error = %e, "invalid up_resource_manager config");
            return Err(e);
        }
        Ok(())
    }
}
