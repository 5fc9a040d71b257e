// SPDX-License-Identifier: Apache-2.0

//! Invariant-preserving abstract data types shared across the DU core:
//! bounded, word-packed bitsets ([`bitset`]) and pooled, segmented byte
//! buffers ([`byte_buffer`]). Every other crate in the workspace treats
//! these as a pure library with no knowledge of cells, slots, or sessions.

pub mod bitset;
pub mod byte_buffer;
pub mod error;

pub use bitset::{BitOrder, BoundedBitset, Lsb0, Msb0};
pub use byte_buffer::{ByteBuffer, ByteBufferSlice, SegmentPool};
pub use error::{BitsetError, ByteBufferError};
