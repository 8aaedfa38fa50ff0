//! Type definitions for the buffer system
//!
//! Counter and snapshot structures used for agent status reporting.

use crate::buffer::flow::FlowState;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide delivery counters for one buffer instance
///
/// Updated lock-free from both the producer and dispatcher sides;
/// `snapshot` gives a consistent-enough view for status reporting.
#[derive(Debug, Default)]
pub struct AgentCounters {
    messages_seen: AtomicU64,
    messages_admitted: AtomicU64,
    messages_dropped: AtomicU64,
    messages_forwarded: AtomicU64,
    notices_sent: AtomicU64,
}

impl AgentCounters {
    pub(crate) fn record_seen(&self) {
        self.messages_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admitted(&self) {
        self.messages_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self) {
        self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notice(&self) {
        self.notices_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            messages_seen: self.messages_seen.load(Ordering::Relaxed),
            messages_admitted: self.messages_admitted.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
            notices_sent: self.notices_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the delivery counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Admission attempts, successful or not
    pub messages_seen: u64,
    /// Messages stored in the buffer
    pub messages_admitted: u64,
    /// Messages rejected because the buffer was full
    pub messages_dropped: u64,
    /// Messages handed to the transport by the dispatcher
    pub messages_forwarded: u64,
    /// Status notifications handed to the transport
    pub notices_sent: u64,
}

/// Point-in-time view of buffer occupancy and flow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Number of messages currently stored
    pub message_count: usize,
    /// Allocated slot-array capacity
    pub capacity: usize,
    /// Usable slots (capacity minus the reserved empty slot)
    pub usable: usize,
    /// Current flow state
    pub state: FlowState,
}
