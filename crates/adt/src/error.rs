// SPDX-License-Identifier: Apache-2.0

//! Errors for the bounded bitset and byte buffer ADTs.
//!
//! Important note: avoid `!Send` data types here so these errors can be
//! emitted from both cell-executor and control-executor contexts.

/// Errors returned by [`crate::bitset::BoundedBitset`] operations.
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum BitsetError {
    /// The requested size exceeds the bitset's word-backed capacity.
    #[error("requested size {requested} exceeds capacity {capacity}")]
    CapacityExceeded {
        /// Size that was requested.
        requested: usize,
        /// Maximum bit capacity backed by the word array.
        capacity: usize,
    },

    /// A bit position fell outside the current (not maximum) size.
    #[error("bit position {pos} is outside the current size {size}")]
    OutOfRange {
        /// Position that was addressed.
        pos: usize,
        /// Current size of the bitset.
        size: usize,
    },
}

/// Errors returned when a byte buffer operation cannot complete without
/// violating the segment-pool's allocation contract.
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ByteBufferError {
    /// The segment pool is exhausted and `malloc_fallback` is disabled.
    #[error("segment pool exhausted and malloc fallback is disabled")]
    PoolExhausted,

    /// The requested range does not fit within the buffer's length.
    #[error("range [{begin}, {end}) is out of bounds for a buffer of length {length}")]
    RangeOutOfBounds {
        /// Half-open range start.
        begin: usize,
        /// Half-open range end.
        end: usize,
        /// Total buffer length.
        length: usize,
    },
}
