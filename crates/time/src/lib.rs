// SPDX-License-Identifier: Apache-2.0

//! Multi-cell hyper-frame-aware slot clock ([`controller::CellTimeController`])
//! built on bounded [`slot_point::SlotPoint`]s and monotonic
//! [`slot_point_extended::SlotPointExtended`]s. Converts N independent
//! per-cell slot-indication streams into one process-wide extended time
//! base and dispatches `tick()` into a shared [`du_runtime::TimerManager`]
//! exactly once per subframe boundary, regardless of how many cells
//! observe it.

pub mod controller;
pub mod error;
pub mod metrics;
pub mod slot_point;
pub mod slot_point_extended;

pub use controller::{CellTimeController, CellTimerSource};
pub use error::TimeError;
pub use metrics::DuTimeMetrics;
pub use slot_point::{SlotPoint, SubcarrierSpacing};
pub use slot_point_extended::SlotPointExtended;
