// SPDX-License-Identifier: Apache-2.0

//! A shared-ownership, segmented byte buffer backed by a bounded pool.
//!
//! The buffer is not contiguous in memory: it is an ordered list of pooled
//! segments, each with head/tail room so that prepending a header or
//! appending a trailer rarely needs a fresh allocation. [`ByteBuffer::copy`]
//! is a shallow, reference-counted clone (mutations through either handle are
//! visible to both); [`ByteBuffer::deep_copy`] produces a fully independent
//! buffer.
//!
//! Segments come from a [`SegmentPool`] with a fixed segment count. Once the
//! pool is exhausted, allocation either falls back to an unpooled heap
//! segment (`malloc_fallback = true`) or fails with
//! [`ByteBufferError::PoolExhausted`].

use crate::error::ByteBufferError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Headroom reserved in the first segment of a freshly created buffer, to
/// make room for a layer header prepended after the fact without a copy.
pub const DEFAULT_FIRST_SEGMENT_HEADROOM: usize = 16;

/// Default payload capacity of a pooled segment.
pub const DEFAULT_SEGMENT_SIZE: usize = 2048;

/// A bounded pool of fixed-size segments shared by every buffer created from
/// it via [`ByteBuffer::new_in`].
pub struct SegmentPool {
    segment_size: usize,
    max_segments: usize,
    in_use: AtomicUsize,
    malloc_fallback: bool,
}

impl SegmentPool {
    /// Creates a pool with `max_segments` slots of `segment_size` bytes each.
    /// If `malloc_fallback` is set, allocation past `max_segments` succeeds
    /// with an unpooled segment instead of failing.
    pub fn new(max_segments: usize, segment_size: usize, malloc_fallback: bool) -> Arc<Self> {
        Arc::new(Self {
            segment_size,
            max_segments,
            in_use: AtomicUsize::new(0),
            malloc_fallback,
        })
    }

    /// A pool sized with [`DEFAULT_SEGMENT_SIZE`] segments.
    pub fn with_capacity(max_segments: usize, malloc_fallback: bool) -> Arc<Self> {
        Self::new(max_segments, DEFAULT_SEGMENT_SIZE, malloc_fallback)
    }

    /// Number of segments currently checked out of the pool (excludes
    /// fallback-allocated segments).
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    fn acquire(self: &Arc<Self>, headroom: usize) -> Result<Segment, ByteBufferError> {
        let size = self.segment_size.max(headroom + 1);
        loop {
            let cur = self.in_use.load(Ordering::Relaxed);
            if cur < self.max_segments {
                if self
                    .in_use
                    .compare_exchange_weak(cur, cur + 1, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
                {
                    return Ok(Segment::new(size, headroom, Some(Arc::clone(self))));
                }
                continue;
            }
            if self.malloc_fallback {
                tracing::debug!(max_segments = self.max_segments, "segment pool exhausted, falling back to heap segment");
                return Ok(Segment::new(size, headroom, None));
            }
            return Err(ByteBufferError::PoolExhausted);
        }
    }
}

/// A single pooled (or fallback-allocated) memory block with head- and
/// tail-room around its occupied byte range.
struct Segment {
    data: Vec<u8>,
    head: usize,
    tail: usize,
    pool: Option<Arc<SegmentPool>>,
}

impl Segment {
    fn new(capacity: usize, headroom: usize, pool: Option<Arc<SegmentPool>>) -> Self {
        Self {
            data: vec![0u8; capacity],
            head: headroom.min(capacity),
            tail: headroom.min(capacity),
            pool,
        }
    }

    fn len(&self) -> usize {
        self.tail - self.head
    }

    fn as_slice(&self) -> &[u8] {
        &self.data[self.head..self.tail]
    }

    fn headroom(&self) -> usize {
        self.head
    }

    fn tailroom(&self) -> usize {
        self.data.len() - self.tail
    }

    fn append_byte(&mut self, byte: u8) -> bool {
        if self.tailroom() == 0 {
            return false;
        }
        self.data[self.tail] = byte;
        self.tail += 1;
        true
    }

    fn append_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.tailroom());
        self.data[self.tail..self.tail + n].copy_from_slice(&bytes[..n]);
        self.tail += n;
        n
    }

    fn prepend_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.headroom());
        let start = self.head - n;
        self.data[start..self.head].copy_from_slice(&bytes[bytes.len() - n..]);
        self.head = start;
        n
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        if let Some(pool) = &self.pool {
            pool.in_use.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

struct ControlBlock {
    segments: VecDeque<Segment>,
    pool: Arc<SegmentPool>,
    len: usize,
}

/// A byte sequence represented as a linked list of pooled segments, with
/// reference-counted shared ownership across cheap [`ByteBuffer::copy`]s.
#[derive(Clone)]
pub struct ByteBuffer {
    inner: Rc<RefCell<ControlBlock>>,
}

impl ByteBuffer {
    /// Creates an empty buffer drawing segments from `pool`.
    pub fn new_in(pool: Arc<SegmentPool>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ControlBlock {
                segments: VecDeque::new(),
                pool,
                len: 0,
            })),
        }
    }

    /// Creates an empty buffer backed by a fresh, private pool of `nof_segments`
    /// default-sized segments.
    pub fn new(nof_segments: usize) -> Self {
        Self::new_in(SegmentPool::with_capacity(nof_segments, true))
    }

    /// Creates a buffer whose content is a copy of `bytes`.
    pub fn from_bytes(pool: Arc<SegmentPool>, bytes: &[u8]) -> Result<Self, ByteBufferError> {
        let mut buf = Self::new_in(pool);
        buf.append(bytes)?;
        Ok(buf)
    }

    /// Total number of bytes held across all segments.
    pub fn len(&self) -> usize {
        self.inner.borrow().len
    }

    /// True if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the buffer's content lives in a single segment.
    pub fn is_contiguous(&self) -> bool {
        self.inner.borrow().segments.len() <= 1
    }

    /// Appends `bytes`, allocating new segments from the pool as needed.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ByteBufferError> {
        let mut remaining = bytes;
        let mut inner = self.inner.borrow_mut();
        while !remaining.is_empty() {
            if inner.segments.back().map(Segment::tailroom).unwrap_or(0) == 0 {
                let pool = Arc::clone(&inner.pool);
                let seg = pool.acquire(DEFAULT_FIRST_SEGMENT_HEADROOM)?;
                inner.segments.push_back(seg);
            }
            let seg = inner.segments.back_mut().expect("just pushed a segment");
            let n = seg.append_bytes(remaining);
            inner.len += n;
            remaining = &remaining[n..];
        }
        Ok(())
    }

    /// Prepends `bytes`, using headroom on the first segment when available
    /// and allocating a new leading segment otherwise.
    pub fn prepend(&mut self, bytes: &[u8]) -> Result<(), ByteBufferError> {
        let mut remaining_end = bytes.len();
        let mut inner = self.inner.borrow_mut();
        while remaining_end > 0 {
            let need_new_front = inner
                .segments
                .front()
                .map(Segment::headroom)
                .unwrap_or(0)
                == 0;
            if need_new_front {
                let pool = Arc::clone(&inner.pool);
                let seg = pool.acquire(DEFAULT_FIRST_SEGMENT_HEADROOM)?;
                inner.segments.push_front(seg);
            }
            let seg = inner.segments.front_mut().expect("just pushed a segment");
            let n = seg.prepend_bytes(&bytes[..remaining_end]);
            inner.len += n;
            remaining_end -= n;
        }
        Ok(())
    }

    /// Removes `nof_bytes` from the front of the buffer, dropping segments
    /// that become fully consumed.
    pub fn trim_head(&mut self, nof_bytes: usize) -> Result<(), ByteBufferError> {
        let mut inner = self.inner.borrow_mut();
        if nof_bytes > inner.len {
            return Err(ByteBufferError::RangeOutOfBounds {
                begin: 0,
                end: nof_bytes,
                length: inner.len,
            });
        }
        let mut remaining = nof_bytes;
        while remaining > 0 {
            let front_len = inner.segments.front().map(Segment::len).unwrap_or(0);
            if front_len <= remaining {
                remaining -= front_len;
                inner.segments.pop_front();
            } else {
                let seg = inner.segments.front_mut().expect("front_len > remaining >= 0");
                seg.head += remaining;
                remaining = 0;
            }
        }
        inner.len -= nof_bytes;
        Ok(())
    }

    /// Removes `nof_bytes` from the back of the buffer, dropping segments
    /// that become fully consumed.
    pub fn trim_tail(&mut self, nof_bytes: usize) -> Result<(), ByteBufferError> {
        let mut inner = self.inner.borrow_mut();
        if nof_bytes > inner.len {
            return Err(ByteBufferError::RangeOutOfBounds {
                begin: 0,
                end: nof_bytes,
                length: inner.len,
            });
        }
        let mut remaining = nof_bytes;
        while remaining > 0 {
            let back_len = inner.segments.back().map(Segment::len).unwrap_or(0);
            if back_len <= remaining {
                remaining -= back_len;
                inner.segments.pop_back();
            } else {
                let seg = inner.segments.back_mut().expect("back_len > remaining >= 0");
                seg.tail -= remaining;
                remaining = 0;
            }
        }
        inner.len -= nof_bytes;
        Ok(())
    }

    /// Grows or shrinks the buffer to `new_len`. Growth appends zeroed
    /// bytes; this does not carry any meaning beyond reserving space, and
    /// callers should treat the content of newly grown bytes as unspecified.
    pub fn resize(&mut self, new_len: usize) -> Result<(), ByteBufferError> {
        let cur = self.len();
        match new_len.cmp(&cur) {
            std::cmp::Ordering::Greater => {
                let zeros = vec![0u8; new_len - cur];
                self.append(&zeros)
            }
            std::cmp::Ordering::Less => self.trim_tail(cur - new_len),
            std::cmp::Ordering::Equal => Ok(()),
        }
    }

    /// Copies every segment's bytes into one fresh segment, reducing the
    /// buffer to at most one segment. No-op if already contiguous.
    pub fn linearize(&mut self) -> Result<(), ByteBufferError> {
        if self.is_contiguous() {
            return Ok(());
        }
        let flat = self.to_vec();
        let pool = Arc::clone(&self.inner.borrow().pool);
        let mut fresh = Self::new_in(pool);
        fresh.append(&flat)?;
        // `fresh` was just created above, so this Rc is uniquely owned.
        let fresh_cb = Rc::try_unwrap(fresh.inner)
            .unwrap_or_else(|_| unreachable!("freshly created buffer has a single owner"))
            .into_inner();
        *self.inner.borrow_mut() = fresh_cb;
        Ok(())
    }

    /// Shallow copy: the returned buffer shares this buffer's segments.
    /// Mutating one is visible through the other.
    pub fn copy(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Deep (byte-wise) copy into an independent buffer drawn from the same
    /// pool as `self`.
    pub fn deep_copy(&self) -> Result<Self, ByteBufferError> {
        let pool = Arc::clone(&self.inner.borrow().pool);
        let mut out = Self::new_in(pool);
        let inner = self.inner.borrow();
        for seg in &inner.segments {
            out.append(seg.as_slice())?;
        }
        Ok(out)
    }

    /// Copies every byte into a contiguous `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        let inner = self.inner.borrow();
        let mut out = Vec::with_capacity(inner.len);
        for seg in &inner.segments {
            out.extend_from_slice(seg.as_slice());
        }
        out
    }

    /// Number of segments backing the buffer.
    pub fn nof_segments(&self) -> usize {
        self.inner.borrow().segments.len()
    }

    /// Returns a half-open `[begin, end)` view sharing this buffer's
    /// segments. The slice holds its own strong reference to the control
    /// block, so its bytes stay readable even after every [`ByteBuffer`]
    /// handle pointing at the same segments has been dropped.
    pub fn slice(&self, begin: usize, end: usize) -> Result<ByteBufferSlice, ByteBufferError> {
        let len = self.len();
        if end < begin || end > len {
            return Err(ByteBufferError::RangeOutOfBounds { begin, end, length: len });
        }
        Ok(ByteBufferSlice {
            inner: Rc::clone(&self.inner),
            begin,
            end,
        })
    }
}

/// A half-open `[begin, end)` byte range into a [`ByteBuffer`]'s segments,
/// plus a strong reference to the owning control block. Keeps those
/// segments alive independent of the [`ByteBuffer`] handle that created it.
#[derive(Clone)]
pub struct ByteBufferSlice {
    inner: Rc<RefCell<ControlBlock>>,
    begin: usize,
    end: usize,
}

impl ByteBufferSlice {
    /// Number of bytes covered by this slice.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// True if the slice covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Copies the slice's bytes into a contiguous `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        let inner = self.inner.borrow();
        let mut out = Vec::with_capacity(self.len());
        let mut pos = 0usize;
        for seg in &inner.segments {
            let seg_start = pos;
            let seg_end = pos + seg.len();
            pos = seg_end;
            if seg_end <= self.begin || seg_start >= self.end {
                continue;
            }
            let lo = self.begin.saturating_sub(seg_start);
            let hi = (self.end - seg_start).min(seg.len());
            out.extend_from_slice(&seg.as_slice()[lo..hi]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool() -> Arc<SegmentPool> {
        SegmentPool::new(4, 8, false)
    }

    #[test]
    fn append_spans_multiple_segments() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
        assert_eq!(buf.len(), 10);
        assert!(!buf.is_contiguous());
        assert_eq!(buf.to_vec(), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn prepend_uses_headroom_then_new_segment() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[3, 4]).unwrap();
        buf.prepend(&[1, 2]).unwrap();
        assert_eq!(buf.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn trim_head_and_tail_drop_segments() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&(0u8..20).collect::<Vec<_>>()).unwrap();
        buf.trim_head(9).unwrap();
        buf.trim_tail(5).unwrap();
        assert_eq!(buf.to_vec(), (9u8..15).collect::<Vec<_>>());
    }

    #[test]
    fn trim_beyond_length_errors() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[1, 2, 3]).unwrap();
        assert!(buf.trim_head(4).is_err());
    }

    #[test]
    fn shallow_copy_shares_mutations() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[1, 2, 3]).unwrap();
        let shared = buf.copy();
        buf.append(&[4, 5]).unwrap();
        assert_eq!(shared.to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[1, 2, 3]).unwrap();
        let deep = buf.deep_copy().unwrap();
        buf.append(&[4, 5]).unwrap();
        assert_eq!(deep.to_vec(), vec![1, 2, 3]);
        assert_eq!(buf.to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn linearize_collapses_to_one_segment() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&(0u8..20).collect::<Vec<_>>()).unwrap();
        assert!(!buf.is_contiguous());
        buf.linearize().unwrap();
        assert!(buf.is_contiguous());
        assert_eq!(buf.to_vec(), (0u8..20).collect::<Vec<_>>());
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[1, 2, 3]).unwrap();
        buf.resize(6).unwrap();
        assert_eq!(buf.len(), 6);
        buf.resize(2).unwrap();
        assert_eq!(buf.to_vec(), vec![1, 2]);
    }

    #[test]
    fn pool_exhaustion_without_fallback_errors() {
        let pool = SegmentPool::new(1, 4, false);
        let mut buf = ByteBuffer::new_in(Arc::clone(&pool));
        buf.append(&[1, 2, 3]).unwrap();
        // Segment is full (after headroom); next append needs a second segment.
        let err = buf.append(&[4, 5, 6, 7, 8]).unwrap_err();
        assert_eq!(err, ByteBufferError::PoolExhausted);
    }

    #[test]
    fn pool_exhaustion_with_fallback_succeeds() {
        let pool = SegmentPool::new(1, 4, true);
        let mut buf = ByteBuffer::new_in(pool);
        buf.append(&(0u8..20).collect::<Vec<_>>()).unwrap();
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn slice_spans_multiple_segments() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&(0u8..20).collect::<Vec<_>>()).unwrap();
        assert!(!buf.is_contiguous());
        let slice = buf.slice(5, 15).unwrap();
        assert_eq!(slice.len(), 10);
        assert_eq!(slice.to_vec(), (5u8..15).collect::<Vec<_>>());
    }

    #[test]
    fn slice_outlives_the_originating_buffer() {
        let buf = {
            let mut buf = ByteBuffer::new_in(small_pool());
            buf.append(&[1, 2, 3, 4, 5]).unwrap();
            buf
        };
        let slice = buf.slice(1, 4).unwrap();
        drop(buf);
        assert_eq!(slice.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn slice_out_of_range_errors() {
        let mut buf = ByteBuffer::new_in(small_pool());
        buf.append(&[1, 2, 3]).unwrap();
        assert!(buf.slice(1, 5).is_err());
    }
}
