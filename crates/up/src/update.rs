// SPDX-License-Identifier: Apache-2.0

//! The immutable diff types produced by
//! [`crate::manager::UpResourceManager`]'s `calculate_*_update` methods, and
//! the result type downstream hands back to
//! [`crate::manager::UpResourceManager::apply_config_update`] once E1AP/F1AP
//! have realized it.

use crate::context::DrbContext;
use crate::ids::{DrbId, PduSessionId};
use std::collections::BTreeMap;

/// One PDU session's scratch update: DRBs being added or modified as part
/// of this session, and DRBs of this session being removed.
///
/// `drb_to_modify` sits alongside `drb_to_add`/`drb_to_remove` as the
/// natural home for "mark the DRB as to-modify with the new QoS".
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PduSessionContextUpdate {
    /// The session this update applies to.
    pub id: PduSessionId,
    /// DRBs to add to this session.
    pub drb_to_add: BTreeMap<DrbId, DrbContext>,
    /// DRBs of this session to modify in place.
    pub drb_to_modify: BTreeMap<DrbId, DrbContext>,
    /// DRBs of this session to remove.
    pub drb_to_remove: Vec<DrbId>,
}

impl PduSessionContextUpdate {
    /// Creates an empty scratch update for `id`.
    pub fn new(id: PduSessionId) -> Self {
        Self {
            id,
            drb_to_add: BTreeMap::new(),
            drb_to_modify: BTreeMap::new(),
            drb_to_remove: Vec::new(),
        }
    }
}

/// An immutable delta produced by a `calculate_*_update` call: what should
/// be set up, modified, or removed to realize a request against the
/// current context.
/// Downstream (E1AP/F1AP/RRC) drives this to completion and hands back a
/// [`UpConfigUpdateResult`] for [`crate::manager::UpResourceManager::apply_config_update`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct UpConfigUpdate {
    /// True iff the UE had zero PDU sessions before this update (a setup
    /// request establishing the UE's very first session).
    pub initial_context_creation: bool,
    /// Sessions to create, keyed by session ID.
    pub pdu_sessions_to_setup_list: BTreeMap<PduSessionId, PduSessionContextUpdate>,
    /// Sessions with in-place changes, keyed by session ID.
    pub pdu_sessions_to_modify_list: BTreeMap<PduSessionId, PduSessionContextUpdate>,
    /// Sessions to tear down entirely.
    pub pdu_sessions_to_remove_list: Vec<PduSessionId>,
    /// Sessions whose modify request could not be satisfied in full.
    pub pdu_sessions_failed_to_modify_list: Vec<PduSessionId>,
    /// DRBs to remove, flattened across every affected session (redundant
    /// with the removal lists above but kept as its own field since
    /// downstream F1AP/E1AP signaling addresses DRBs directly).
    pub drb_to_remove_list: Vec<DrbId>,
}

impl UpConfigUpdate {
    /// Creates an empty update. `initial_context_creation` defaults to
    /// `false`; callers building a setup update should set it explicitly
    /// from the pre-update context.
    pub fn new() -> Self {
        Self::default()
    }
}

/// The downstream-confirmed result of realizing a [`UpConfigUpdate`]: which
/// parts actually succeeded and should be committed to the authoritative
/// context via `apply_config_update`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct UpConfigUpdateResult {
    /// Sessions that were successfully added.
    pub pdu_sessions_added_list: Vec<PduSessionContextUpdate>,
    /// Sessions that were successfully modified.
    pub pdu_sessions_modified_list: Vec<PduSessionContextUpdate>,
    /// Sessions that were successfully removed.
    pub pdu_sessions_removed_list: Vec<PduSessionId>,
}
