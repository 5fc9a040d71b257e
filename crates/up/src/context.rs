// SPDX-License-Identifier: Apache-2.0

//! The authoritative, owned UP state for one UE: PDU sessions, their DRBs,
//! and the two derived lookup indices the manager keeps consistent with
//! them on every mutation.

use crate::ids::{DrbId, PduSessionId, QosFlowId, Snssai};
use du_config::qos::{FiveQi, PdcpConfigTemplate, RlcMode};
use std::collections::BTreeMap;

/// A 5QI as requested by a QoS flow: either a standard value (a direct
/// table index) or a dynamic value, which additionally requires a fallback
/// standard 5QI to size PDCP/SDAP behavior against ("dynamic 5QI without
/// a fallback" resolves to nothing usable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FiveQiValue {
    /// A standard 5QI: a direct index into the static QoS catalog.
    Standard(FiveQi),
    /// A dynamically-negotiated 5QI, falling back to a standard one for
    /// template derivation when present.
    Dynamic {
        /// The standard 5QI to derive PDCP/SDAP config from, if supplied.
        fallback: Option<FiveQi>,
    },
}

impl FiveQiValue {
    /// The standard 5QI this value resolves to for template lookup, or
    /// `None` if it is dynamic with no fallback.
    pub fn resolved(self) -> Option<FiveQi> {
        match self {
            FiveQiValue::Standard(q) => Some(q),
            FiveQiValue::Dynamic { fallback } => fallback,
        }
    }
}

/// QoS parameters carried by a single QoS flow (and, since flows map 1:1 to
/// DRBs in this manager, reused verbatim as the owning DRB's QoS params).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QosFlowLevelQosParams {
    /// The requested 5QI.
    pub five_qi: FiveQiValue,
}

/// One QoS flow mapped onto a DRB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QosFlowContext {
    /// This flow's identifier.
    pub qfi: QosFlowId,
    /// QoS parameters negotiated for this flow.
    pub qos_params: QosFlowLevelQosParams,
}

/// Uplink F1-U transport address for a DRB's tunnel endpoint. Allocated by
/// the CU-UP once the config update has been realized over E1AP; empty at
/// the point this crate produces a [`crate::update::UpConfigUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UlUpTnlInfo {
    /// GTP-U tunnel endpoint identifier.
    pub teid: u32,
    /// Transport-layer address the tunnel endpoint is reachable on.
    pub transport_addr: std::net::IpAddr,
}

/// SDAP configuration derived for one DRB: whether it is the UE's default
/// DRB, whether DL/UL SDAP headers are present, and which QoS flows it
/// carries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SdapConfig {
    /// The PDU session this DRB belongs to.
    pub pdu_session_id: PduSessionId,
    /// True iff this is the UE's default DRB.
    pub default_drb: bool,
    /// Whether a DL SDAP header is present on this DRB.
    pub dl_header_present: bool,
    /// Whether a UL SDAP header is present on this DRB.
    pub ul_header_present: bool,
    /// QoS flows mapped onto this DRB via SDAP.
    pub mapped_qos_flows: Vec<QosFlowId>,
}

/// One DRB: its QoS, RLC/PDCP/SDAP configuration, and the QoS flows it
/// carries (always exactly one, since this manager maps flows to DRBs 1:1).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrbContext {
    /// This DRB's identifier, unique within the UE.
    pub drb_id: DrbId,
    /// The PDU session this DRB belongs to.
    pub pdu_session_id: PduSessionId,
    /// S-NSSAI copied from the owning PDU session's request.
    pub s_nssai: Snssai,
    /// True iff this is the UE's default DRB (the first one ever created).
    pub default_drb: bool,
    /// RLC mode: AM if the 5QI's PDCP template calls for it, UM
    /// bidirectional otherwise.
    pub rlc_mode: RlcMode,
    /// DRB-level QoS parameters (identical to the sole flow's, under 1:1
    /// flow-to-DRB mapping).
    pub qos_params: QosFlowLevelQosParams,
    /// QoS flows mapped onto this DRB, keyed by flow ID.
    pub qos_flows: BTreeMap<QosFlowId, QosFlowContext>,
    /// Uplink tunnel endpoints, populated by the CU-UP after the update is
    /// realized; empty in every update this crate produces.
    pub ul_up_tnl_info: Vec<UlUpTnlInfo>,
    /// PDCP configuration derived from the 5QI template.
    pub pdcp_cfg: PdcpConfigTemplate,
    /// SDAP configuration derived from this DRB's own fields.
    pub sdap_cfg: SdapConfig,
}

/// One PDU session: its DRBs, keyed by DRB ID.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PduSessionContext {
    /// This session's identifier.
    pub id: PduSessionId,
    /// DRBs belonging to this session.
    pub drbs: BTreeMap<DrbId, DrbContext>,
}

impl PduSessionContext {
    /// Creates an empty session context for `id`.
    pub fn new(id: PduSessionId) -> Self {
        Self {
            id,
            drbs: BTreeMap::new(),
        }
    }
}

/// The authoritative UP state for one UE: every active PDU session plus the
/// two derived indices (`drb_id -> pdu_session_id`, `qos_flow_id -> drb_id`)
/// that [`crate::manager::UpResourceManager::apply_config_update`] keeps
/// consistent with the session map on every mutation, and a third index
/// (`5QI -> drb_id`, kept for introspection, see DESIGN.md) that no
/// allocation decision depends on.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UeUpContext {
    /// Every active PDU session, keyed by session ID.
    pub pdu_sessions: BTreeMap<PduSessionId, PduSessionContext>,
    /// DRB ID -> owning PDU session ID.
    pub drb_map: BTreeMap<DrbId, PduSessionId>,
    /// QoS flow ID -> owning DRB ID.
    pub qos_flow_map: BTreeMap<QosFlowId, DrbId>,
    /// 5QI -> a representative DRB using it (last one wins on collision;
    /// used only for introspection, never for allocation decisions).
    pub five_qi_map: BTreeMap<FiveQi, DrbId>,
}

impl UeUpContext {
    /// True iff the UE currently has no PDU sessions (used to decide
    /// `initial_context_creation` on a setup request).
    pub fn is_empty(&self) -> bool {
        self.pdu_sessions.is_empty()
    }

    /// Total DRBs across every PDU session, via the flat index rather than
    /// summing per-session maps.
    pub fn nof_drbs(&self) -> usize {
        self.drb_map.len()
    }
}
