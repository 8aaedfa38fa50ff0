//! AgentBuffer - lifecycle control and producer API
//!
//! Owns all shared buffer state behind a single mutex: the circular slot
//! store, the flow monitor with its pending notification flags, and the
//! active configuration. Producers call [`AgentBuffer::append`] from any
//! number of threads or tasks; the dispatch loop drains through
//! `dispatch_next`. Critical sections are O(1) and the lock is never
//! held across an await point.

use crate::buffer::config::BufferConfig;
use crate::buffer::error::{BufferError, BufferResult};
use crate::buffer::flow::{FlowMonitor, FlowState};
use crate::buffer::status::StatusKind;
use crate::buffer::store::BufferStore;
use crate::buffer::types::{AgentCounters, BufferStats, CounterSnapshot};
use crate::core::sync::handle_mutex_poison;
use crate::core::time::{SystemTimeProvider, TimeProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

/// Everything the buffer lock protects
struct BufferInner {
    store: BufferStore,
    flow: FlowMonitor,
    config: BufferConfig,
}

impl BufferInner {
    /// Opportunistic growth, attempted on admission while the buffer is
    /// warning or about to warn
    ///
    /// Doubles the capacity, clamped to the configured bounds. Failure is
    /// logged and leaves the old capacity in place; a buffer pinned at
    /// maximum capacity and full is logged as terminal for new admissions
    /// until drainage frees space.
    fn maybe_grow(&mut self) {
        let count = self.store.len();
        let capacity = self.store.capacity();
        let nearing = self.flow.state() == FlowState::Warning
            || (self.flow.state() == FlowState::Normal && self.flow.is_warn(count, capacity));
        if !nearing {
            return;
        }

        let target = (capacity * 2)
            .max(self.config.min_capacity)
            .min(self.config.max_capacity);

        if target > capacity {
            log::info!(
                "Agent buffer nearing capacity ({}/{}). Attempting to resize to {}.",
                count,
                capacity,
                target
            );
            match self.store.grow(target, self.config.max_capacity) {
                Ok(()) => log::info!(
                    "Agent buffer successfully resized to {} (message count: {}).",
                    self.store.capacity(),
                    count
                ),
                Err(err) => log::warn!(
                    "Failed to dynamically resize agent buffer to {}: {}. Messages might be dropped.",
                    target,
                    err
                ),
            }
        } else if capacity >= self.config.max_capacity && self.store.is_full() {
            log::warn!(
                "Agent buffer is at its maximum capacity ({}) and full. Incoming messages will be dropped.",
                self.config.max_capacity
            );
        }
    }
}

/// One unit of work handed to the dispatch loop
///
/// Carries the dequeued payload together with the notifications drained
/// in the same critical section and the tunables needed to render and
/// pace them, so the dispatcher never re-acquires the lock mid-cycle.
pub(crate) struct DispatchItem {
    pub(crate) payload: Option<Vec<u8>>,
    pub(crate) notices: Vec<StatusKind>,
    pub(crate) warn_level: u32,
    pub(crate) normal_level: u32,
    pub(crate) pacing: Duration,
}

/// Anti-flood message buffer between the event producers and the
/// rate-limited dispatcher
///
/// A bounded, dynamically-growable circular queue with admission
/// control: a full buffer rejects new messages immediately instead of
/// blocking the producer. Occupancy is classified by a four-level flow
/// state machine (Normal/Warning/Full/Flood) whose edge notifications
/// are forwarded to the manager by the dispatch loop.
///
/// # Thread Safety
///
/// Fully thread-safe; share it across producers and the dispatcher as
/// `Arc<AgentBuffer>`. All shared state lives behind one mutex with O(1)
/// critical sections.
pub struct AgentBuffer {
    inner: Mutex<Option<BufferInner>>,
    /// Wakes the dispatch loop after every successful admission
    notify: Notify,
    counters: AgentCounters,
    time: Arc<dyn TimeProvider>,
    /// Set while a dispatch loop is bound to this buffer; destroy()
    /// refuses to tear the buffer down underneath it
    dispatcher_active: AtomicBool,
}

impl AgentBuffer {
    /// Create a buffer from validated configuration
    ///
    /// An invalid configuration or failed store allocation leaves the
    /// agent without a usable buffer; callers treat the error as fatal.
    pub fn new(config: BufferConfig) -> BufferResult<Arc<Self>> {
        Self::build(config, Arc::new(SystemTimeProvider))
    }

    #[cfg(test)]
    pub(crate) fn with_time_provider(
        config: BufferConfig,
        time: Arc<dyn TimeProvider>,
    ) -> BufferResult<Arc<Self>> {
        Self::build(config, time)
    }

    fn build(config: BufferConfig, time: Arc<dyn TimeProvider>) -> BufferResult<Arc<Self>> {
        config.validate()?;
        let inner = Self::make_inner(config)?;
        log::debug!(
            "Agent buffer created with capacity: {} (usable: {}).",
            inner.store.capacity(),
            inner.store.usable()
        );
        Ok(Arc::new(Self {
            inner: Mutex::new(Some(inner)),
            notify: Notify::new(),
            counters: AgentCounters::default(),
            time,
            dispatcher_active: AtomicBool::new(false),
        }))
    }

    fn make_inner(config: BufferConfig) -> BufferResult<BufferInner> {
        let store = BufferStore::new(config.capacity())?;
        if config.tolerance_secs == 0 {
            log::warn!("Tolerance time is zero; a full buffer escalates to flooded immediately.");
        }
        let flow = FlowMonitor::new(config.warn_level, config.normal_level, config.tolerance());
        Ok(BufferInner {
            store,
            flow,
            config,
        })
    }

    fn lock(&self) -> BufferResult<MutexGuard<'_, Option<BufferInner>>> {
        handle_mutex_poison(self.inner.lock(), |message| BufferError::Poisoned {
            message,
        })
    }

    /// Admit one message
    ///
    /// Takes a copy of the caller's bytes. A full buffer rejects the
    /// message with [`BufferError::BufferFull`]; that is the designed
    /// backpressure signal, not a fault, and nothing is stored. Every
    /// attempt, admitted or not, runs the producer-side flow transition
    /// so a sustained overload still escalates Full to Flood.
    pub fn append(&self, msg: &[u8]) -> BufferResult<()> {
        let mut guard = self.lock()?;
        let inner = guard.as_mut().ok_or(BufferError::NotInitialized)?;

        inner.maybe_grow();
        self.counters.record_seen();

        if inner.store.is_full() {
            let count = inner.store.len();
            let capacity = inner.store.capacity();
            let usable = inner.store.usable();
            inner.flow.on_admission(count, capacity, self.time.now());
            self.counters.record_dropped();
            drop(guard);
            log::trace!(
                "Unable to store new packet: buffer is full (count: {}, capacity: {}).",
                count,
                capacity
            );
            return Err(BufferError::BufferFull { usable });
        }

        inner.store.enqueue(msg.to_vec());
        inner
            .flow
            .on_admission(inner.store.len(), inner.store.capacity(), self.time.now());
        self.counters.record_admitted();
        drop(guard);

        self.notify.notify_one();
        Ok(())
    }

    /// Dequeue one payload and drain pending notifications in a single
    /// critical section
    ///
    /// Returns `Ok(None)` when the buffer is empty so the dispatcher can
    /// park on the wake signal. The drain-side flow transition runs
    /// against the post-dequeue occupancy.
    pub(crate) fn dispatch_next(&self) -> BufferResult<Option<DispatchItem>> {
        let mut guard = self.lock()?;
        let inner = guard.as_mut().ok_or(BufferError::NotInitialized)?;

        if inner.store.is_empty() {
            return Ok(None);
        }

        let payload = inner.store.dequeue();
        inner
            .flow
            .on_drain(inner.store.len(), inner.store.capacity());
        let notices = inner.flow.take_pending();

        Ok(Some(DispatchItem {
            payload,
            notices,
            warn_level: inner.config.warn_level,
            normal_level: inner.config.normal_level,
            pacing: inner.config.pacing_interval(),
        }))
    }

    /// Whether every usable slot is occupied
    pub fn is_full(&self) -> bool {
        self.lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|inner| inner.store.is_full()))
            .unwrap_or(false)
    }

    /// Whether no message is stored (an inactive buffer reads as empty)
    pub fn is_empty(&self) -> bool {
        self.lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|inner| inner.store.is_empty()))
            .unwrap_or(true)
    }

    /// Current message count, or `None` once the buffer is destroyed
    pub fn len(&self) -> Option<usize> {
        self.lock().ok()?.as_ref().map(|inner| inner.store.len())
    }

    /// Occupancy and flow-state snapshot, or `None` once destroyed
    pub fn stats(&self) -> Option<BufferStats> {
        let guard = self.lock().ok()?;
        guard.as_ref().map(|inner| BufferStats {
            message_count: inner.store.len(),
            capacity: inner.store.capacity(),
            usable: inner.store.usable(),
            state: inner.flow.state(),
        })
    }

    /// Point-in-time copy of the delivery counters
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Rebuild the buffer with new tunables
    ///
    /// Drops every stored payload, resets indices, flow state and
    /// notification flags, then re-reads the configuration. Used on
    /// manager reconnect; safe to call while the dispatcher runs since
    /// the swap happens under the buffer lock.
    pub fn reinitialize(&self, config: BufferConfig) -> BufferResult<()> {
        config.validate()?;
        let inner = Self::make_inner(config)?;
        let mut guard = self.lock()?;
        log::debug!(
            "Agent buffer re-initialised with capacity: {} (usable: {}).",
            inner.store.capacity(),
            inner.store.usable()
        );
        *guard = Some(inner);
        Ok(())
    }

    /// Tear the buffer down, releasing every stored payload
    ///
    /// Idempotent. Refused with [`BufferError::DispatcherActive`] while a
    /// dispatch loop is still bound to this buffer; shut the dispatcher
    /// down first. Afterwards [`AgentBuffer::len`] reports `None` and
    /// admissions fail with [`BufferError::NotInitialized`].
    pub fn destroy(&self) -> BufferResult<()> {
        if self.dispatcher_active.load(Ordering::Acquire) {
            return Err(BufferError::DispatcherActive);
        }
        let mut guard = self.lock()?;
        if guard.take().is_some() {
            log::debug!("Agent buffer destroyed and all stored messages released.");
        }
        Ok(())
    }

    pub(crate) fn notifier(&self) -> &Notify {
        &self.notify
    }

    pub(crate) fn clock(&self) -> &dyn TimeProvider {
        self.time.as_ref()
    }

    pub(crate) fn set_dispatcher_active(&self, active: bool) {
        self.dispatcher_active.store(active, Ordering::Release);
    }

    pub(crate) fn record_forwarded(&self) {
        self.counters.record_forwarded();
    }

    pub(crate) fn record_notice(&self) {
        self.counters.record_notice();
    }
}
