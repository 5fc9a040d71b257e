// SPDX-License-Identifier: Apache-2.0

//! Errors for the UP resource manager's read accessors.
//!
//! `validate_*_request`/`calculate_*_update` stay predicate/value-returning:
//! validation surfaces as a boolean, not a `Result`, since invalid input is
//! a configurational rejection the caller is expected to have already ruled
//! out by calling the matching `validate_*_request` first. Only the read
//! accessors are given a typed error here instead of panicking on a
//! missing ID.

use crate::ids::{DrbId, PduSessionId};

/// Errors surfaced by [`crate::manager::UpResourceManager`]'s read
/// accessors when asked about an identifier that is not currently live.
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum UpError {
    /// No PDU session with this ID is currently active for the UE.
    #[error("PDU session {0} not allocated")]
    PduSessionNotFound(PduSessionId),

    /// No DRB with this ID is currently active for the UE.
    #[error("DRB {0} not allocated")]
    DrbNotFound(DrbId),
}
