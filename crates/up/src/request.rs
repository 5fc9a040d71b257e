// SPDX-License-Identifier: Apache-2.0

//! Plain-value request objects the UP resource manager validates and diffs
//! against. These are decoded upstream from NGAP/E1AP; this crate has no
//! knowledge of ASN.1 and never constructs them from wire bytes itself.

use crate::context::QosFlowLevelQosParams;
use crate::ids::{PduSessionId, QosFlowId, Snssai};

/// One QoS flow requested as part of a PDU session setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosFlowSetupRequestItem {
    /// The flow being requested.
    pub qfi: QosFlowId,
    /// QoS parameters requested for the flow.
    pub qos_params: QosFlowLevelQosParams,
}

/// One PDU session within a setup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduSessionSetupItem {
    /// The session being requested.
    pub pdu_session_id: PduSessionId,
    /// S-NSSAI for the session.
    pub s_nssai: Snssai,
    /// QoS flows requested for the session, in request order.
    pub qos_flows: Vec<QosFlowSetupRequestItem>,
}

/// A PDU Session Resource Setup Request: zero or more sessions to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PduSessionResourceSetupRequest {
    /// Sessions requested, in request order.
    pub items: Vec<PduSessionSetupItem>,
}

/// A QoS flow to add (if new) or modify (if already mapped to a DRB) within
/// a PDU session modify request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosFlowAddOrModifyItem {
    /// The flow being added or modified.
    pub qfi: QosFlowId,
    /// The new QoS parameters for the flow.
    pub qos_params: QosFlowLevelQosParams,
}

/// A QoS flow to release within a PDU session modify request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosFlowToRelease {
    /// The flow being released.
    pub qfi: QosFlowId,
}

/// One PDU session's changes within a modify request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PduSessionModifyItem {
    /// The session being modified; must already exist.
    pub pdu_session_id: PduSessionId,
    /// Flows to add (new `qfi`) or modify (existing `qfi`).
    pub qos_flows_to_add_or_modify: Vec<QosFlowAddOrModifyItem>,
    /// Flows to release.
    pub qos_flows_to_release: Vec<QosFlowToRelease>,
}

/// A PDU Session Resource Modify Request: zero or more sessions to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PduSessionResourceModifyRequest {
    /// Sessions to modify, in request order.
    pub items: Vec<PduSessionModifyItem>,
}

/// A PDU Session Resource Release Command: the sessions to tear down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PduSessionResourceReleaseCommand {
    /// Sessions to release, in request order.
    pub pdu_session_ids: Vec<PduSessionId>,
}
