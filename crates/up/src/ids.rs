// SPDX-License-Identifier: Apache-2.0

//! UE-scoped identifiers: PDU session, DRB, and QoS flow IDs, plus S-NSSAI.
//!
//! All three ID types are UE-local and re-used across UEs; nothing in this
//! crate interprets their bit patterns beyond ordering and equality, so they
//! are kept as thin `u8` newtypes rather than exhaustive enums.

use std::fmt;

/// Identifies one PDU session within a UE's UP context. Assigned upstream
/// by the core network; this crate only carries it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct PduSessionId(pub u8);

impl fmt::Display for PduSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "psi={}", self.0)
    }
}

/// Identifies one DRB within a UE's UP context. Drawn from
/// `{1..=max_nof_drbs_per_ue}` by [`crate::manager::UpResourceManager`]'s
/// allocation rule; never assigned by the request side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DrbId(pub u8);

impl DrbId {
    /// The first DRB ID the allocation rule ever tries.
    pub const FIRST: DrbId = DrbId(1);

    /// The next candidate ID in the allocation scan order.
    pub fn next(self) -> DrbId {
        DrbId(self.0 + 1)
    }
}

impl fmt::Display for DrbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drb-{}", self.0)
    }
}

/// Identifies one QoS flow within a PDU session. Assigned upstream by the
/// core network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct QosFlowId(pub u8);

impl fmt::Display for QosFlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qfi={}", self.0)
    }
}

/// Single Network Slice Selection Assistance Information: a slice/service
/// type plus an optional slice differentiator, copied verbatim from the
/// PDU-session request into the session's allocated DRBs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Snssai {
    /// Slice/Service Type.
    pub sst: u8,
    /// Slice Differentiator, if the slice uses one.
    pub sd: Option<[u8; 3]>,
}
