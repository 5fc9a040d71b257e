// SPDX-License-Identifier: Apache-2.0

//! Errors for the metric aggregator.

/// Errors surfaced by [`crate::aggregator::MetricAggregator::add_cell`].
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum MetricsError {
    /// `cell_index` is not less than the aggregator's configured
    /// `max_nof_du_cells`.
    #[error("cell index {cell_index} is out of range (max_nof_du_cells = {max_nof_du_cells})")]
    CellIndexOutOfRange {
        /// The offending index.
        cell_index: usize,
        /// The configured bound it exceeded.
        max_nof_du_cells: usize,
    },

    /// `add_cell` was called twice for the same `cell_index` without an
    /// intervening `rem_cell`.
    #[error("cell index {cell_index} already has an active metric handler")]
    DuplicateCell {
        /// The offending index.
        cell_index: usize,
    },
}
