// SPDX-License-Identifier: Apache-2.0

//! Metric set reported by [`crate::manager::UpResourceManager`].

use du_telemetry::{Counter, Gauge};

/// Per-UE-manager-instance UP resource metrics.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct DuUpMetrics {
    /// Current number of active PDU sessions.
    pub sessions_active: Gauge<u64>,
    /// Current number of active DRBs.
    pub drbs_active: Gauge<u64>,
    /// Setup requests rejected by `validate_setup_request`.
    pub setup_rejected: Counter<u64>,
    /// Modify requests rejected by `validate_modify_request`.
    pub modify_rejected: Counter<u64>,
    /// Release requests rejected by `validate_release_request`.
    pub release_rejected: Counter<u64>,
}
