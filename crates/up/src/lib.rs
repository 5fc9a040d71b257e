// SPDX-License-Identifier: Apache-2.0

//! Per-UE user-plane resource planning: validates PDU-session setup/modify/
//! release requests against the UE's live context, produces an immutable
//! diff ([`update::UpConfigUpdate`]), and commits a downstream-confirmed
//! [`update::UpConfigUpdateResult`] via [`manager::UpResourceManager`].

pub mod context;
pub mod error;
pub mod ids;
pub mod manager;
pub mod metrics;
pub mod request;
pub mod update;

pub use context::{
    DrbContext, FiveQiValue, PduSessionContext, QosFlowContext, QosFlowLevelQosParams, SdapConfig, UeUpContext,
    UlUpTnlInfo,
};
pub use error::UpError;
pub use ids::{DrbId, PduSessionId, QosFlowId, Snssai};
pub use manager::UpResourceManager;
pub use metrics::DuUpMetrics;
pub use request::{
    PduSessionModifyItem, PduSessionResourceModifyRequest, PduSessionResourceReleaseCommand,
    PduSessionResourceSetupRequest, PduSessionSetupItem, QosFlowAddOrModifyItem, QosFlowSetupRequestItem,
    QosFlowToRelease,
};
pub use update::{PduSessionContextUpdate, UpConfigUpdate, UpConfigUpdateResult};
