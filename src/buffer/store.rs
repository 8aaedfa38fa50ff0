//! Circular slot store backing the agent buffer
//!
//! A fixed-capacity ring of optional owned payloads. One slot is always
//! kept empty so a full buffer and an empty buffer remain
//! distinguishable; `message_count` is tracked explicitly and is the
//! authoritative occupancy. All calls assume the caller already holds
//! the buffer lock.

use crate::buffer::error::{BufferError, BufferResult};

#[derive(Debug)]
pub(crate) struct BufferStore {
    slots: Vec<Option<Vec<u8>>>,
    /// Next write position
    head: usize,
    /// Next read position
    tail: usize,
    message_count: usize,
}

impl BufferStore {
    /// Allocate a store with the given total capacity (usable slots are
    /// `capacity - 1`)
    pub(crate) fn new(capacity: usize) -> BufferResult<Self> {
        if capacity < 2 {
            return Err(BufferError::InvalidCapacity {
                requested: capacity,
            });
        }
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            head: 0,
            tail: 0,
            message_count: 0,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn usable(&self) -> usize {
        self.slots.len() - 1
    }

    pub(crate) fn len(&self) -> usize {
        self.message_count
    }

    pub(crate) fn is_full(&self) -> bool {
        self.message_count == self.usable()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    /// Store one payload at the head slot
    ///
    /// Must not be called on a full store; the producer path checks
    /// admission first.
    pub(crate) fn enqueue(&mut self, payload: Vec<u8>) {
        debug_assert!(!self.is_full(), "enqueue on a full store");
        let capacity = self.slots.len();
        self.slots[self.head] = Some(payload);
        self.head = (self.head + 1) % capacity;
        self.message_count += 1;
    }

    /// Take ownership of the payload at the tail slot
    ///
    /// Returns None when the store is empty. A populated count with an
    /// empty tail slot is an invariant breach; the indices still advance
    /// so the dispatcher can log and skip it.
    pub(crate) fn dequeue(&mut self) -> Option<Vec<u8>> {
        if self.message_count == 0 {
            return None;
        }
        let payload = self.slots[self.tail].take();
        let capacity = self.slots.len();
        self.tail = (self.tail + 1) % capacity;
        self.message_count -= 1;
        payload
    }

    /// Grow the backing array to `new_capacity`
    ///
    /// The occupied region is linearised to start at slot 0 while
    /// copying, so new slots always land at the chronological end even
    /// when the region wraps past the physical end of the old array.
    /// On failure the store keeps operating at its prior capacity.
    pub(crate) fn grow(&mut self, new_capacity: usize, max_capacity: usize) -> BufferResult<()> {
        if new_capacity == 0 || new_capacity > max_capacity {
            return Err(BufferError::InvalidCapacity {
                requested: new_capacity,
            });
        }
        let old_capacity = self.slots.len();
        if new_capacity <= old_capacity {
            return Err(BufferError::InvalidCapacity {
                requested: new_capacity,
            });
        }

        let mut new_slots: Vec<Option<Vec<u8>>> = Vec::new();
        new_slots.resize_with(new_capacity, || None);
        for offset in 0..self.message_count {
            new_slots[offset] = self.slots[(self.tail + offset) % old_capacity].take();
        }

        self.slots = new_slots;
        self.tail = 0;
        self.head = self.message_count;
        log::debug!(
            "Buffer store resized from {} to {} slots.",
            old_capacity,
            new_capacity
        );
        Ok(())
    }
}
