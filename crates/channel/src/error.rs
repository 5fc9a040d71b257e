// SPDX-License-Identifier: Apache-2.0

//! Errors for the report channel.
//!
//! Important note: avoid `!Send` data types in these errors so they can be
//! logged from either the producer's cell executor or the consumer's
//! control executor.

/// Errors that can occur reserving or committing a slot from the producer
/// side. Both are transient by the concurrency model's error taxonomy: the
/// caller accumulates and retries, it never propagates further.
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SendError {
    /// The ring is full; the consumer has not caught up.
    #[error("report channel is full")]
    Full,
}

/// Errors that can occur popping or peeking from the consumer side.
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum RecvError {
    /// There is no committed slot to read.
    #[error("report channel is empty")]
    Empty,
}
