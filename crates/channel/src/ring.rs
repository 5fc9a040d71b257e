// SPDX-License-Identifier: Apache-2.0

//! A lock-free, single-producer single-consumer ring of recyclable slots.
//!
//! The producer reserves a slot (receiving a [`SlotHandle`]), fills it
//! in-place across one or more calls, then [`ReportProducer::commit`]s it.
//! Committing is what makes the slot visible to the consumer; a reserved but
//! uncommitted slot is invisible, which is what lets a two-phase producer
//! (e.g. scheduler fills first, MAC fills second) hold a handle open across
//! calls without exposing a half-filled report.
//!
//! The consumer [`ReportConsumer::peek`]s the oldest committed slot and
//! [`ReportConsumer::pop`]s it when done; popping recycles the slot's
//! payload in place (via [`Recyclable::recycle`]) rather than dropping and
//! reallocating it, so steady-state operation performs zero allocations
//! after the ring is built.
//!
//! Only `report_count`-style cross-channel bookkeeping lives outside this
//! module: a ring here only knows about its own slots.

use crate::error::{RecvError, SendError};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A payload type whose interior buffers should be cleared, not freed, on
/// recycle. Implemented for report payloads carrying `Vec`s of UE metrics
/// or events.
pub trait Recyclable {
    /// Clears the payload's contents while retaining allocated capacity.
    fn recycle(&mut self);
}

struct Shared<T> {
    slots: Box<[UnsafeCell<T>]>,
    mask: usize,
    /// Index of the next slot the consumer may read. Written by the
    /// consumer, read by the producer to compute free space.
    read_idx: AtomicUsize,
    /// Index of the next slot the producer may commit. Written by the
    /// producer (release), read by the consumer (acquire).
    write_idx: AtomicUsize,
}

// SAFETY: access to `slots` is mediated by the SPSC protocol: the producer
// only ever touches indices in `[read_idx, read_idx + capacity)` ahead of
// `write_idx`, the consumer only touches indices behind `write_idx`. The two
// never overlap the same slot concurrently.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

/// Opaque handle to a reserved-but-not-yet-committed slot.
#[derive(Clone, Copy, Debug)]
pub struct SlotHandle {
    index: usize,
}

/// The producer side of a report ring. Not `Clone`: there is exactly one
/// producer, matching the single-producer contract.
pub struct ReportProducer<T> {
    shared: Arc<Shared<T>>,
    next_write: usize,
}

/// The consumer side of a report ring. Not `Clone`: there is exactly one
/// consumer, matching the single-consumer contract.
pub struct ReportConsumer<T> {
    shared: Arc<Shared<T>>,
    next_read: usize,
}

/// Builds a ring with the given power-of-two `capacity`, default-initializing
/// every slot up front so steady-state operation never allocates.
///
/// # Panics
/// Panics if `capacity` is zero or not a power of two.
pub fn channel<T: Default>(capacity: usize) -> (ReportProducer<T>, ReportConsumer<T>) {
    assert!(capacity > 0 && capacity.is_power_of_two(), "ring capacity must be a nonzero power of two, got {capacity}");
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || UnsafeCell::new(T::default()));
    let shared = Arc::new(Shared {
        slots: slots.into_boxed_slice(),
        mask: capacity - 1,
        read_idx: AtomicUsize::new(0),
        write_idx: AtomicUsize::new(0),
    });
    (
        ReportProducer {
            shared: Arc::clone(&shared),
            next_write: 0,
        },
        ReportConsumer {
            shared,
            next_read: 0,
        },
    )
}

impl<T> ReportProducer<T> {
    /// Capacity of the ring.
    pub fn capacity(&self) -> usize {
        self.shared.mask + 1
    }

    /// Number of committed-but-unpopped slots, as last observed. May be
    /// stale by the time the caller acts on it; only the producer's own
    /// `reserve` needs an up-to-date read, and that re-reads atomically.
    pub fn len_hint(&self) -> usize {
        self.next_write - self.shared.read_idx.load(Ordering::Acquire)
    }

    /// Reserves the next slot for writing. Returns [`SendError::Full`] if the
    /// consumer has not yet caught up.
    pub fn reserve(&mut self) -> Result<SlotHandle, SendError> {
        let read = self.shared.read_idx.load(Ordering::Acquire);
        if self.next_write - read >= self.capacity() {
            return Err(SendError::Full);
        }
        Ok(SlotHandle {
            index: self.next_write,
        })
    }

    /// Mutable access to a reserved slot's payload. The handle must have
    /// been returned by [`Self::reserve`] and not yet committed.
    pub fn slot_mut<'a>(&'a self, handle: SlotHandle) -> &'a mut T {
        debug_assert_eq!(handle.index, self.next_write, "slot handles must be committed before a new one is reserved");
        let slot = &self.shared.slots[handle.index & self.shared.mask];
        // SAFETY: single-producer contract guarantees no other writer holds
        // this slot; the consumer cannot reach it until `write_idx` advances.
        unsafe { &mut *slot.get() }
    }

    /// Publishes the slot, making it visible to the consumer.
    pub fn commit(&mut self, handle: SlotHandle) {
        debug_assert_eq!(handle.index, self.next_write);
        self.next_write += 1;
        self.shared.write_idx.store(self.next_write, Ordering::Release);
    }
}

impl<T: Recyclable> ReportConsumer<T> {
    /// True if there is no committed slot to read.
    pub fn is_empty(&self) -> bool {
        self.next_read >= self.shared.write_idx.load(Ordering::Acquire)
    }

    /// Number of committed, unpopped slots currently visible.
    pub fn len(&self) -> usize {
        self.shared.write_idx.load(Ordering::Acquire) - self.next_read
    }

    /// Borrows the oldest committed slot without consuming it.
    pub fn peek(&self) -> Result<&T, RecvError> {
        if self.is_empty() {
            return Err(RecvError::Empty);
        }
        let slot = &self.shared.slots[self.next_read & self.shared.mask];
        // SAFETY: `write_idx` has advanced past `next_read`, so the producer
        // will not touch this slot again until the consumer advances
        // `read_idx` past it.
        Ok(unsafe { &*slot.get() })
    }

    /// Consumes the oldest committed slot, recycling its payload in place.
    pub fn pop(&mut self) -> Result<(), RecvError> {
        if self.is_empty() {
            return Err(RecvError::Empty);
        }
        let slot = &self.shared.slots[self.next_read & self.shared.mask];
        // SAFETY: see `peek`.
        unsafe { (*slot.get()).recycle() };
        self.next_read += 1;
        self.shared.read_idx.store(self.next_read, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Payload {
        value: u32,
        events: Vec<u32>,
    }

    impl Recyclable for Payload {
        fn recycle(&mut self) {
            self.value = 0;
            self.events.clear();
        }
    }

    #[test]
    fn reserve_fill_commit_then_peek_and_pop() {
        let (mut tx, mut rx) = channel::<Payload>(4);
        let handle = tx.reserve().unwrap();
        tx.slot_mut(handle).value = 42;
        tx.slot_mut(handle).events.push(7);
        tx.commit(handle);

        assert_eq!(rx.len(), 1);
        assert_eq!(rx.peek().unwrap().value, 42);
        rx.pop().unwrap();
        assert!(rx.is_empty());
    }

    #[test]
    fn full_ring_rejects_reserve() {
        let (mut tx, _rx) = channel::<Payload>(2);
        for _ in 0..2 {
            let h = tx.reserve().unwrap();
            tx.commit(h);
        }
        assert_eq!(tx.reserve().unwrap_err(), SendError::Full);
    }

    #[test]
    fn pop_recycles_without_freeing_capacity() {
        let (mut tx, mut rx) = channel::<Payload>(2);
        let h = tx.reserve().unwrap();
        tx.slot_mut(h).events.extend([1, 2, 3]);
        tx.commit(h);
        let cap_before = rx.peek().unwrap().events.capacity();
        rx.pop().unwrap();

        let h2 = tx.reserve().unwrap();
        let slot = tx.slot_mut(h2);
        assert_eq!(slot.events.len(), 0);
        assert!(slot.events.capacity() >= cap_before || cap_before == 0);
    }

    #[test]
    fn two_phase_builder_across_calls() {
        // Models scheduler-then-MAC fill of the same reserved slot.
        let (mut tx, mut rx) = channel::<Payload>(4);
        let handle = tx.reserve().unwrap();
        tx.slot_mut(handle).events.push(1); // scheduler phase
        // ... time passes, MAC phase runs later ...
        tx.slot_mut(handle).value = 9; // MAC phase
        tx.commit(handle);

        let head = rx.peek().unwrap();
        assert_eq!(head.value, 9);
        assert_eq!(head.events, vec![1]);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two_capacity() {
        let _ = channel::<Payload>(3);
    }
}
