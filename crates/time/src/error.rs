// SPDX-License-Identifier: Apache-2.0

//! Errors for the cell time controller.

/// Errors surfaced by [`crate::CellTimeController::add_cell`].
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum TimeError {
    /// `cell_index` is not less than the controller's configured
    /// `max_nof_du_cells`.
    #[error("cell index {cell_index} is out of range (max_nof_du_cells = {max_nof_du_cells})")]
    CellIndexOutOfRange {
        /// The offending index.
        cell_index: usize,
        /// The configured bound it exceeded.
        max_nof_du_cells: usize,
    },
}
