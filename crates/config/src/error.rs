// SPDX-License-Identifier: Apache-2.0

//! Validation errors for the static configuration model.

/// Errors surfaced by [`crate::DuConfig::validate`] and the individual
/// section `validate()` methods it calls.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The QoS catalog has no entries; every DRB needs a 5QI template.
    #[error("QoS catalog must not be empty")]
    EmptyQosCatalog,

    /// The same 5QI appears more than once in the catalog document.
    #[error("duplicate 5QI {five_qi} in QoS catalog")]
    DuplicateFiveQi {
        /// The repeated 5QI value.
        five_qi: u16,
    },

    /// A capacity or bound field was configured as zero.
    #[error("{field} must be greater than zero")]
    ZeroCapacity {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The report period is not a whole number of one-millisecond ticks.
    #[error("report_period must be a whole number of milliseconds, got {millis}ms (remainder {remainder}us)")]
    NonWholeSubframePeriod {
        /// The configured period in milliseconds.
        millis: u128,
        /// The non-zero sub-millisecond remainder, in microseconds, that
        /// makes it invalid.
        remainder: u128,
    },

    /// The SPSC ring capacity is not a power of two, which the ring
    /// implementation requires to use a cheap index mask.
    #[error("cell_channel_capacity {capacity} is not a power of two")]
    ChannelCapacityNotPowerOfTwo {
        /// The configured capacity.
        capacity: usize,
    },
}
