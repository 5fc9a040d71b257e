// SPDX-License-Identifier: Apache-2.0

//! The time source a cell's metric handler reads to determine its current
//! extended slot point, decoupling the aggregator from a concrete
//! [`du_time::CellTimeController`] so it can be driven by a test double.

use du_time::SlotPointExtended;

/// A cell's view of the shared extended clock, as produced by
/// [`du_time::CellTimerSource`].
pub trait CellClockSource: Send + Sync {
    /// The cell's last-known extended slot point, or `None` if it has not
    /// yet received a slot indication since activation.
    fn now(&self) -> Option<SlotPointExtended>;
}

impl CellClockSource for du_time::CellTimerSource {
    fn now(&self) -> Option<SlotPointExtended> {
        du_time::CellTimerSource::now(self)
    }
}
