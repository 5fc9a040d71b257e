// SPDX-License-Identifier: Apache-2.0

//! The single source of truth for a UE's user-plane configuration:
//! validates incoming setup/modify/release requests, produces an immutable
//! diff against the live context, and commits a downstream-confirmed
//! result. Driven by whichever executor runs CU-CP control-plane
//! procedures, serialized behind that executor, so no internal locking is
//! needed.

use crate::context::{
    DrbContext, FiveQiValue, PduSessionContext, QosFlowContext, QosFlowLevelQosParams, SdapConfig, UeUpContext,
};
use crate::error::UpError;
use crate::ids::{DrbId, PduSessionId, QosFlowId, Snssai};
use crate::metrics::DuUpMetrics;
use crate::request::{
    PduSessionResourceModifyRequest, PduSessionResourceReleaseCommand, PduSessionResourceSetupRequest,
    PduSessionSetupItem, QosFlowAddOrModifyItem, QosFlowSetupRequestItem,
};
use crate::update::{PduSessionContextUpdate, UpConfigUpdate, UpConfigUpdateResult};
use du_config::qos::FiveQiTemplate;
use du_config::settings::UpResourceManagerConfig;
use du_telemetry::MetricSet;
use std::collections::{BTreeMap, HashMap};

/// Stateful per-UE planner: validate, diff, and commit PDU-session / QoS
/// flow / DRB configuration updates.
pub struct UpResourceManager {
    max_nof_drbs_per_ue: u8,
    qos_catalog: HashMap<u16, FiveQiTemplate>,
    context: UeUpContext,
    metrics: MetricSet<DuUpMetrics>,
}

impl UpResourceManager {
    /// Creates a manager with empty UE state, bound to `cfg`'s capacity and
    /// QoS catalog. Does not re-validate `cfg`; callers should already have
    /// run [`UpResourceManagerConfig::validate`] as part of loading the
    /// static configuration.
    pub fn new(cfg: &UpResourceManagerConfig) -> Self {
        Self {
            max_nof_drbs_per_ue: cfg.max_nof_drbs_per_ue,
            qos_catalog: cfg.qos_catalog.as_map(),
            context: UeUpContext::default(),
            metrics: MetricSet::new("du_up.metrics"),
        }
    }

    /// Current metric values.
    pub fn metrics_snapshot(&self) -> du_telemetry::MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn five_qi_template(&self, five_qi: FiveQiValue) -> Option<&FiveQiTemplate> {
        let resolved = five_qi.resolved()?;
        self.qos_catalog.get(&resolved)
    }

    // ---- setup -------------------------------------------------------

    /// Setup validation: reject an empty list, a duplicate session ID
    /// already live, or any QoS flow whose 5QI can't be resolved against
    /// the catalog (including a dynamic 5QI with no fallback).
    pub fn validate_setup_request(&mut self, req: &PduSessionResourceSetupRequest) -> bool {
        if req.items.is_empty() {
            tracing::warn!("received empty PDU session setup request");
            self.metrics.setup_rejected.incr();
            return false;
        }
        for session in &req.items {
            if self.context.pdu_sessions.contains_key(&session.pdu_session_id) {
                tracing::info!(pdu_session_id = %session.pdu_session_id, "PDU session already exists");
                self.metrics.setup_rejected.incr();
                return false;
            }
            for flow in &session.qos_flows {
                if self.five_qi_template(flow.qos_params.five_qi).is_none() {
                    tracing::warn!(qfi = %flow.qfi, "configuration for requested 5QI can't be derived");
                    self.metrics.setup_rejected.incr();
                    return false;
                }
            }
        }
        true
    }

    fn allocate_drb_id(&self, scratch: &PduSessionContextUpdate, update: &UpConfigUpdate) -> Option<DrbId> {
        for candidate in 1..=self.max_nof_drbs_per_ue {
            let drb_id = DrbId(candidate);
            let taken_live = self.context.drb_map.contains_key(&drb_id);
            let taken_pending = update
                .pdu_sessions_to_setup_list
                .values()
                .chain(update.pdu_sessions_to_modify_list.values())
                .any(|s| s.drb_to_add.contains_key(&drb_id) || s.drb_to_modify.contains_key(&drb_id));
            let taken_scratch = scratch.drb_to_add.contains_key(&drb_id) || scratch.drb_to_modify.contains_key(&drb_id);
            if !taken_live && !taken_pending && !taken_scratch {
                return Some(drb_id);
            }
        }
        None
    }

    fn build_new_drb_context(
        &self,
        drb_id: DrbId,
        pdu_session_id: PduSessionId,
        s_nssai: Snssai,
        default_drb: bool,
        qfi: QosFlowId,
        qos_params: QosFlowLevelQosParams,
        template: &FiveQiTemplate,
    ) -> DrbContext {
        let mut qos_flows = BTreeMap::new();
        qos_flows.insert(qfi, QosFlowContext { qfi, qos_params });
        let header_present = !template.sdap_default_drb_only || default_drb;
        DrbContext {
            drb_id,
            pdu_session_id,
            s_nssai,
            default_drb,
            rlc_mode: template.pdcp.rlc_mode,
            qos_params,
            qos_flows,
            ul_up_tnl_info: Vec::new(),
            pdcp_cfg: template.pdcp,
            sdap_cfg: SdapConfig {
                pdu_session_id,
                default_drb,
                dl_header_present: header_present,
                ul_header_present: header_present,
                mapped_qos_flows: vec![qfi],
            },
        }
    }

    fn allocate_setup_flow(
        &self,
        scratch: &PduSessionContextUpdate,
        update: &UpConfigUpdate,
        session: &PduSessionSetupItem,
        flow: &QosFlowSetupRequestItem,
        default_drb_claimed: &mut bool,
    ) -> Option<(DrbId, DrbContext)> {
        let template = self.five_qi_template(flow.qos_params.five_qi)?;
        let drb_id = self.allocate_drb_id(scratch, update)?;
        let default_drb = !*default_drb_claimed;
        let ctx = self.build_new_drb_context(
            drb_id,
            session.pdu_session_id,
            session.s_nssai,
            default_drb,
            flow.qfi,
            flow.qos_params,
            template,
        );
        if default_drb {
            *default_drb_claimed = true;
        }
        Some((drb_id, ctx))
    }

    /// Setup diff: for each requested session, allocate a DRB per QoS
    /// flow (dropping flows that can't be allocated, dropping the whole
    /// session silently if none of its flows could be); exactly the first
    /// DRB allocated — across the live context and this call together — is
    /// marked `default_drb`.
    pub fn calculate_setup_update(&self, req: &PduSessionResourceSetupRequest) -> UpConfigUpdate {
        let mut update = UpConfigUpdate {
            initial_context_creation: self.context.is_empty(),
            ..UpConfigUpdate::new()
        };
        let mut default_drb_claimed = !self.context.drb_map.is_empty();

        for session in &req.items {
            let mut scratch = PduSessionContextUpdate::new(session.pdu_session_id);
            for flow in &session.qos_flows {
                match self.allocate_setup_flow(&scratch, &update, session, flow, &mut default_drb_claimed) {
                    Some((drb_id, ctx)) => {
                        scratch.drb_to_add.insert(drb_id, ctx);
                    }
                    None => {
                        tracing::warn!(
                            pdu_session_id = %session.pdu_session_id,
                            qfi = %flow.qfi,
                            "couldn't allocate a DRB for QoS flow"
                        );
                    }
                }
            }
            if scratch.drb_to_add.is_empty() {
                tracing::debug!(pdu_session_id = %session.pdu_session_id, "session dropped: no DRB could be allocated");
                continue;
            }
            update.pdu_sessions_to_setup_list.insert(scratch.id, scratch);
        }

        update
    }

    // ---- modify --------------------------------------------------------

    /// Modify validation (see DESIGN.md for the disambiguation this
    /// follows): reject an empty list; a session that doesn't exist;
    /// an add/modify flow whose 5QI can't be resolved; a release flow that
    /// doesn't exist; or a release list that would remove every QoS flow
    /// currently mapped anywhere in the UE's context.
    pub fn validate_modify_request(&mut self, req: &PduSessionResourceModifyRequest) -> bool {
        if req.items.is_empty() {
            tracing::warn!("received empty PDU session modify request");
            self.metrics.modify_rejected.incr();
            return false;
        }
        for item in &req.items {
            if !self.context.pdu_sessions.contains_key(&item.pdu_session_id) {
                tracing::warn!(pdu_session_id = %item.pdu_session_id, "can't modify: session doesn't exist");
                self.metrics.modify_rejected.incr();
                return false;
            }
            for flow in &item.qos_flows_to_add_or_modify {
                if self.five_qi_template(flow.qos_params.five_qi).is_none() {
                    tracing::warn!(qfi = %flow.qfi, "QoS flow configuration can't be derived");
                    self.metrics.modify_rejected.incr();
                    return false;
                }
            }
            for flow in &item.qos_flows_to_release {
                if !self.context.qos_flow_map.contains_key(&flow.qfi) {
                    tracing::warn!(qfi = %flow.qfi, "QoS flow to release doesn't exist");
                    self.metrics.modify_rejected.incr();
                    return false;
                }
            }
            if item.qos_flows_to_release.len() >= self.context.qos_flow_map.len() {
                tracing::warn!(
                    pdu_session_id = %item.pdu_session_id,
                    "modification would remove every existing QoS flow"
                );
                self.metrics.modify_rejected.incr();
                return false;
            }
        }
        true
    }

    fn modify_existing_flow(&self, session_id: PduSessionId, drb_id: DrbId, flow: &QosFlowAddOrModifyItem) -> Option<DrbContext> {
        let template = self.five_qi_template(flow.qos_params.five_qi)?;
        let existing = self.context.pdu_sessions.get(&session_id)?.drbs.get(&drb_id)?;
        let mut qos_flows = BTreeMap::new();
        qos_flows.insert(flow.qfi, QosFlowContext { qfi: flow.qfi, qos_params: flow.qos_params });
        let header_present = !template.sdap_default_drb_only || existing.default_drb;
        Some(DrbContext {
            drb_id,
            pdu_session_id: session_id,
            s_nssai: existing.s_nssai,
            default_drb: existing.default_drb,
            rlc_mode: template.pdcp.rlc_mode,
            qos_params: flow.qos_params,
            qos_flows,
            ul_up_tnl_info: existing.ul_up_tnl_info.clone(),
            pdcp_cfg: template.pdcp,
            sdap_cfg: SdapConfig {
                pdu_session_id: session_id,
                default_drb: existing.default_drb,
                dl_header_present: header_present,
                ul_header_present: header_present,
                mapped_qos_flows: vec![flow.qfi],
            },
        })
    }

    fn allocate_modify_flow(
        &self,
        scratch: &PduSessionContextUpdate,
        update: &UpConfigUpdate,
        session_id: PduSessionId,
        flow: &QosFlowAddOrModifyItem,
    ) -> Option<(DrbId, DrbContext)> {
        let template = self.five_qi_template(flow.qos_params.five_qi)?;
        let drb_id = self.allocate_drb_id(scratch, update)?;
        // A session only exists once it has at least one DRB, so a modify
        // target always has a non-empty `drb_map`: a flow added here is
        // never the UE's default DRB.
        let s_nssai = self
            .context
            .pdu_sessions
            .get(&session_id)
            .and_then(|s| s.drbs.values().next())
            .map(|d| d.s_nssai)
            .unwrap_or_default();
        let ctx = self.build_new_drb_context(drb_id, session_id, s_nssai, false, flow.qfi, flow.qos_params, template);
        Some((drb_id, ctx))
    }

    /// Modify diff: an already-mapped flow is modified in place on its
    /// existing DRB; a new flow is allocated a fresh DRB via the same
    /// allocation rule setup uses; a released flow that was the sole flow
    /// on its DRB marks that DRB for removal.
    pub fn calculate_modify_update(&self, req: &PduSessionResourceModifyRequest) -> UpConfigUpdate {
        let mut update = UpConfigUpdate {
            initial_context_creation: false,
            ..UpConfigUpdate::new()
        };

        for item in &req.items {
            let mut scratch = PduSessionContextUpdate::new(item.pdu_session_id);

            for flow in &item.qos_flows_to_add_or_modify {
                if let Some(&drb_id) = self.context.qos_flow_map.get(&flow.qfi) {
                    match self.modify_existing_flow(item.pdu_session_id, drb_id, flow) {
                        Some(ctx) => {
                            scratch.drb_to_modify.insert(drb_id, ctx);
                        }
                        None => {
                            tracing::warn!(qfi = %flow.qfi, "couldn't modify QoS flow");
                            update.pdu_sessions_failed_to_modify_list.push(item.pdu_session_id);
                        }
                    }
                } else {
                    match self.allocate_modify_flow(&scratch, &update, item.pdu_session_id, flow) {
                        Some((drb_id, ctx)) => {
                            scratch.drb_to_add.insert(drb_id, ctx);
                        }
                        None => {
                            tracing::warn!(qfi = %flow.qfi, "couldn't allocate QoS flow");
                            update.pdu_sessions_failed_to_modify_list.push(item.pdu_session_id);
                        }
                    }
                }
            }

            for release in &item.qos_flows_to_release {
                let Some(&drb_id) = self.context.qos_flow_map.get(&release.qfi) else {
                    continue;
                };
                let Some(session) = self.context.pdu_sessions.get(&item.pdu_session_id) else {
                    continue;
                };
                let Some(drb) = session.drbs.get(&drb_id) else {
                    continue;
                };
                if drb.qos_flows.len() == 1 {
                    tracing::debug!(drb_id = %drb_id, "releasing DRB: sole flow removed");
                    scratch.drb_to_remove.push(drb_id);
                }
            }

            update.pdu_sessions_to_modify_list.insert(scratch.id, scratch);
        }

        update
    }

    // ---- release ---------------------------------------------------------

    /// Release validation: reject an empty list or a session that
    /// doesn't exist.
    pub fn validate_release_request(&mut self, req: &PduSessionResourceReleaseCommand) -> bool {
        if req.pdu_session_ids.is_empty() {
            tracing::warn!("received empty PDU session release command");
            self.metrics.release_rejected.incr();
            return false;
        }
        for &id in &req.pdu_session_ids {
            if !self.context.pdu_sessions.contains_key(&id) {
                tracing::warn!(pdu_session_id = %id, "can't release: session doesn't exist");
                self.metrics.release_rejected.incr();
                return false;
            }
        }
        true
    }

    /// Release diff: every DRB of every session to release is added to
    /// `drb_to_remove_list`; every session is added to
    /// `pdu_sessions_to_remove_list`.
    pub fn calculate_release_update(&self, req: &PduSessionResourceReleaseCommand) -> UpConfigUpdate {
        let mut update = UpConfigUpdate::new();
        for &id in &req.pdu_session_ids {
            if let Some(session) = self.context.pdu_sessions.get(&id) {
                for &drb_id in session.drbs.keys() {
                    update.drb_to_remove_list.push(drb_id);
                }
            }
            update.pdu_sessions_to_remove_list.push(id);
        }
        update
    }

    // ---- apply -------------------------------------------------------

    /// Commits a downstream-confirmed result: additive for new sessions,
    /// in-place for modified DRBs, removal for released ones. Keeps
    /// `drb_map`/`qos_flow_map`/`five_qi_map` consistent with
    /// `pdu_sessions` at every step. Idempotent: applying
    /// the same result twice leaves the context unchanged the second time.
    pub fn apply_config_update(&mut self, result: &UpConfigUpdateResult) -> bool {
        for session_update in &result.pdu_sessions_added_list {
            let mut new_ctx = PduSessionContext::new(session_update.id);
            for (&drb_id, drb) in &session_update.drb_to_add {
                self.install_drb(drb_id, session_update.id, drb);
                new_ctx.drbs.insert(drb_id, drb.clone());
            }
            self.context.pdu_sessions.insert(new_ctx.id, new_ctx);
        }

        for session_update in &result.pdu_sessions_modified_list {
            for (&drb_id, drb) in &session_update.drb_to_add {
                self.install_drb(drb_id, session_update.id, drb);
                self.context
                    .pdu_sessions
                    .entry(session_update.id)
                    .or_insert_with(|| PduSessionContext::new(session_update.id))
                    .drbs
                    .insert(drb_id, drb.clone());
            }
            for (&drb_id, drb) in &session_update.drb_to_modify {
                self.context.qos_flow_map.retain(|_, v| *v != drb_id);
                for &qfi in drb.qos_flows.keys() {
                    self.context.qos_flow_map.insert(qfi, drb_id);
                }
                if let Some(session) = self.context.pdu_sessions.get_mut(&session_update.id) {
                    session.drbs.insert(drb_id, drb.clone());
                }
            }
            for &drb_id in &session_update.drb_to_remove {
                self.remove_drb(session_update.id, drb_id);
            }
        }

        for &session_id in &result.pdu_sessions_removed_list {
            if let Some(session) = self.context.pdu_sessions.remove(&session_id) {
                for &drb_id in session.drbs.keys() {
                    self.context.drb_map.remove(&drb_id);
                    self.context.qos_flow_map.retain(|_, v| *v != drb_id);
                    self.context.five_qi_map.retain(|_, v| *v != drb_id);
                }
            }
        }

        self.metrics.sessions_active.set(self.context.pdu_sessions.len() as u64);
        self.metrics.drbs_active.set(self.context.drb_map.len() as u64);
        true
    }

    fn install_drb(&mut self, drb_id: DrbId, session_id: PduSessionId, drb: &DrbContext) {
        self.context.drb_map.insert(drb_id, session_id);
        if let Some(five_qi) = drb.qos_params.five_qi.resolved() {
            self.context.five_qi_map.insert(five_qi, drb_id);
        }
        for &qfi in drb.qos_flows.keys() {
            self.context.qos_flow_map.insert(qfi, drb_id);
        }
    }

    fn remove_drb(&mut self, session_id: PduSessionId, drb_id: DrbId) {
        if let Some(session) = self.context.pdu_sessions.get_mut(&session_id) {
            session.drbs.remove(&drb_id);
        }
        self.context.drb_map.remove(&drb_id);
        self.context.qos_flow_map.retain(|_, v| *v != drb_id);
        self.context.five_qi_map.retain(|_, v| *v != drb_id);
    }

    // ---- accessors -----------------------------------------------------

    /// Looks up a PDU session's current context.
    pub fn get_pdu_session_context(&self, id: PduSessionId) -> Result<&PduSessionContext, UpError> {
        self.context.pdu_sessions.get(&id).ok_or(UpError::PduSessionNotFound(id))
    }

    /// Looks up a DRB's current context.
    pub fn get_drb_context(&self, drb_id: DrbId) -> Result<&DrbContext, UpError> {
        let session_id = *self.context.drb_map.get(&drb_id).ok_or(UpError::DrbNotFound(drb_id))?;
        self.context
            .pdu_sessions
            .get(&session_id)
            .and_then(|s| s.drbs.get(&drb_id))
            .ok_or(UpError::DrbNotFound(drb_id))
    }

    /// True iff `id` is currently an active PDU session.
    pub fn has_pdu_session(&self, id: PduSessionId) -> bool {
        self.context.pdu_sessions.contains_key(&id)
    }

    /// Total DRBs currently active across all of the UE's PDU sessions.
    pub fn get_nof_drbs(&self) -> usize {
        self.context.drb_map.len()
    }

    /// Number of currently active PDU sessions.
    pub fn get_nof_pdu_sessions(&self) -> usize {
        self.context.pdu_sessions.len()
    }

    /// Every currently active PDU session ID.
    pub fn get_pdu_sessions(&self) -> Vec<PduSessionId> {
        self.context.pdu_sessions.keys().copied().collect()
    }

    /// Every currently active DRB ID.
    pub fn get_drbs(&self) -> Vec<DrbId> {
        self.context.drb_map.keys().copied().collect()
    }

    /// Number of QoS flows mapped within a single PDU session.
    pub fn get_nof_qos_flows(&self, id: PduSessionId) -> usize {
        self.context
            .pdu_sessions
            .get(&id)
            .map(|s| s.drbs.values().map(|d| d.qos_flows.len()).sum())
            .unwrap_or(0)
    }

    /// Total QoS flows mapped across every PDU session.
    pub fn get_total_nof_qos_flows(&self) -> usize {
        self.context.qos_flow_map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QosFlowLevelQosParams;
    use du_config::qos::{PdcpConfigTemplate, QosCatalog, RlcMode};
    use pretty_assertions::assert_eq;

    fn cfg(max_nof_drbs_per_ue: u8) -> UpResourceManagerConfig {
        UpResourceManagerConfig {
            max_nof_drbs_per_ue,
            qos_catalog: QosCatalog::new(vec![
                FiveQiTemplate {
                    five_qi: 9,
                    pdcp: PdcpConfigTemplate { rlc_mode: RlcMode::UmBidir },
                    sdap_default_drb_only: false,
                },
                FiveQiTemplate {
                    five_qi: 5,
                    pdcp: PdcpConfigTemplate { rlc_mode: RlcMode::Am },
                    sdap_default_drb_only: false,
                },
            ]),
        }
    }

    fn setup_request(sessions: &[(u8, &[u8])]) -> PduSessionResourceSetupRequest {
        PduSessionResourceSetupRequest {
            items: sessions
                .iter()
                .map(|&(psi, qfis)| PduSessionSetupItem {
                    pdu_session_id: PduSessionId(psi),
                    s_nssai: Snssai { sst: 1, sd: None },
                    qos_flows: qfis
                        .iter()
                        .map(|&qfi| QosFlowSetupRequestItem {
                            qfi: QosFlowId(qfi),
                            qos_params: QosFlowLevelQosParams { five_qi: FiveQiValue::Standard(9) },
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn accept(mgr: &mut UpResourceManager, update: UpConfigUpdate) {
        let result = UpConfigUpdateResult {
            pdu_sessions_added_list: update.pdu_sessions_to_setup_list.into_values().collect(),
            pdu_sessions_modified_list: update.pdu_sessions_to_modify_list.into_values().collect(),
            pdu_sessions_removed_list: update.pdu_sessions_to_remove_list,
        };
        assert!(mgr.apply_config_update(&result));
    }

    #[test]
    fn two_sessions_one_drb_each_first_is_default() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        let req = setup_request(&[(1, &[1]), (2, &[1])]);
        assert!(mgr.validate_setup_request(&req));
        let update = mgr.calculate_setup_update(&req);

        assert_eq!(update.pdu_sessions_to_setup_list.len(), 2);
        let s1 = &update.pdu_sessions_to_setup_list[&PduSessionId(1)];
        let s2 = &update.pdu_sessions_to_setup_list[&PduSessionId(2)];
        assert!(s1.drb_to_add[&DrbId(1)].default_drb);
        assert!(!s2.drb_to_add[&DrbId(2)].default_drb);

        accept(&mut mgr, update);
        assert_eq!(mgr.get_nof_drbs(), 2);
        assert_eq!(mgr.get_nof_pdu_sessions(), 2);
        assert_eq!(mgr.get_pdu_sessions(), vec![PduSessionId(1), PduSessionId(2)]);
    }

    #[test]
    fn drb_exhaustion_drops_failing_session_only() {
        let mut mgr = UpResourceManager::new(&cfg(2));
        let first = setup_request(&[(1, &[1]), (2, &[1])]);
        assert!(mgr.validate_setup_request(&first));
        accept(&mut mgr, mgr.calculate_setup_update(&first));
        assert_eq!(mgr.get_nof_drbs(), 2);

        let second = setup_request(&[(3, &[1])]);
        assert!(mgr.validate_setup_request(&second));
        let update = mgr.calculate_setup_update(&second);
        assert!(!update.pdu_sessions_to_setup_list.contains_key(&PduSessionId(3)));
    }

    #[test]
    fn setup_validation_rejects_empty_and_duplicate_and_bad_5qi() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        assert!(!mgr.validate_setup_request(&PduSessionResourceSetupRequest::default()));

        let bad_5qi = PduSessionResourceSetupRequest {
            items: vec![PduSessionSetupItem {
                pdu_session_id: PduSessionId(1),
                s_nssai: Snssai::default(),
                qos_flows: vec![QosFlowSetupRequestItem {
                    qfi: QosFlowId(1),
                    qos_params: QosFlowLevelQosParams { five_qi: FiveQiValue::Standard(200) },
                }],
            }],
        };
        assert!(!mgr.validate_setup_request(&bad_5qi));

        let dynamic_no_fallback = PduSessionResourceSetupRequest {
            items: vec![PduSessionSetupItem {
                pdu_session_id: PduSessionId(1),
                s_nssai: Snssai::default(),
                qos_flows: vec![QosFlowSetupRequestItem {
                    qfi: QosFlowId(1),
                    qos_params: QosFlowLevelQosParams { five_qi: FiveQiValue::Dynamic { fallback: None } },
                }],
            }],
        };
        assert!(!mgr.validate_setup_request(&dynamic_no_fallback));

        let good = setup_request(&[(1, &[1])]);
        assert!(mgr.validate_setup_request(&good));
        accept(&mut mgr, mgr.calculate_setup_update(&good));

        let duplicate = setup_request(&[(1, &[2])]);
        assert!(!mgr.validate_setup_request(&duplicate));
    }

    #[test]
    fn modify_adds_flow_to_fresh_drb() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        let setup = setup_request(&[(1, &[1])]);
        accept(&mut mgr, mgr.calculate_setup_update(&setup));

        let modify = PduSessionResourceModifyRequest {
            items: vec![crate::request::PduSessionModifyItem {
                pdu_session_id: PduSessionId(1),
                qos_flows_to_add_or_modify: vec![QosFlowAddOrModifyItem {
                    qfi: QosFlowId(2),
                    qos_params: QosFlowLevelQosParams { five_qi: FiveQiValue::Standard(5) },
                }],
                qos_flows_to_release: vec![],
            }],
        };
        assert!(mgr.validate_modify_request(&modify));
        let update = mgr.calculate_modify_update(&modify);
        let scratch = &update.pdu_sessions_to_modify_list[&PduSessionId(1)];
        assert_eq!(scratch.drb_to_add.len(), 1);
        assert!(!scratch.drb_to_add.values().next().unwrap().default_drb);

        accept(&mut mgr, update);
        assert_eq!(mgr.get_nof_drbs(), 2);
        assert_eq!(mgr.get_total_nof_qos_flows(), 2);
    }

    #[test]
    fn modify_releasing_sole_flow_removes_drb() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        let setup = setup_request(&[(1, &[1, 2])]);
        accept(&mut mgr, mgr.calculate_setup_update(&setup));
        assert_eq!(mgr.get_nof_drbs(), 2);

        let modify = PduSessionResourceModifyRequest {
            items: vec![crate::request::PduSessionModifyItem {
                pdu_session_id: PduSessionId(1),
                qos_flows_to_add_or_modify: vec![],
                qos_flows_to_release: vec![crate::request::QosFlowToRelease { qfi: QosFlowId(1) }],
            }],
        };
        assert!(mgr.validate_modify_request(&modify));
        let update = mgr.calculate_modify_update(&modify);
        let scratch = &update.pdu_sessions_to_modify_list[&PduSessionId(1)];
        assert_eq!(scratch.drb_to_remove.len(), 1);

        accept(&mut mgr, update);
        assert_eq!(mgr.get_nof_drbs(), 1);
        assert_eq!(mgr.get_total_nof_qos_flows(), 1);
    }

    #[test]
    fn modify_rejects_removing_every_flow() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        let setup = setup_request(&[(1, &[1])]);
        accept(&mut mgr, mgr.calculate_setup_update(&setup));

        let modify = PduSessionResourceModifyRequest {
            items: vec![crate::request::PduSessionModifyItem {
                pdu_session_id: PduSessionId(1),
                qos_flows_to_add_or_modify: vec![],
                qos_flows_to_release: vec![crate::request::QosFlowToRelease { qfi: QosFlowId(1) }],
            }],
        };
        assert!(!mgr.validate_modify_request(&modify));
    }

    #[test]
    fn release_removes_session_and_its_drbs() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        let setup = setup_request(&[(1, &[1]), (2, &[1])]);
        accept(&mut mgr, mgr.calculate_setup_update(&setup));
        assert_eq!(mgr.get_nof_drbs(), 2);

        let release = PduSessionResourceReleaseCommand { pdu_session_ids: vec![PduSessionId(1)] };
        assert!(mgr.validate_release_request(&release));
        let update = mgr.calculate_release_update(&release);
        assert_eq!(update.drb_to_remove_list, vec![DrbId(1)]);

        let result = UpConfigUpdateResult {
            pdu_sessions_added_list: vec![],
            pdu_sessions_modified_list: vec![],
            pdu_sessions_removed_list: update.pdu_sessions_to_remove_list,
        };
        assert!(mgr.apply_config_update(&result));

        assert!(!mgr.has_pdu_session(PduSessionId(1)));
        assert!(mgr.has_pdu_session(PduSessionId(2)));
        assert_eq!(mgr.get_nof_drbs(), 1);
        assert!(mgr.get_drb_context(DrbId(1)).is_err());
    }

    #[test]
    fn release_validation_rejects_unknown_session() {
        let mut mgr = UpResourceManager::new(&cfg(8));
        let release = PduSessionResourceReleaseCommand { pdu_session_ids: vec![PduSessionId(9)] };
        assert!(!mgr.validate_release_request(&release));
    }

    #[test]
    fn drb_allocation_is_deterministic() {
        let mgr1 = UpResourceManager::new(&cfg(8));
        let mgr2 = UpResourceManager::new(&cfg(8));
        let req = setup_request(&[(1, &[1, 2, 3])]);
        let u1 = mgr1.calculate_setup_update(&req);
        let u2 = mgr2.calculate_setup_update(&req);
        let ids1: Vec<_> = u1.pdu_sessions_to_setup_list[&PduSessionId(1)].drb_to_add.keys().copied().collect();
        let ids2: Vec<_> = u2.pdu_sessions_to_setup_list[&PduSessionId(1)].drb_to_add.keys().copied().collect();
        assert_eq!(ids1, ids2);
        assert_eq!(ids1, vec![DrbId(1), DrbId(2), DrbId(3)]);
    }
}
