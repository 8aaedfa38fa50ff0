//! Flow state machine with hysteresis and flood tolerance
//!
//! Classifies buffer occupancy into Normal, Warning, Full or Flood and
//! tracks edge-triggered notification flags. The producer side promotes
//! and demotes; the drain side only ever demotes. Hysteresis between
//! `warn_level` and `normal_level` prevents flapping near the threshold,
//! and the tolerance window separates a transient burst (Full) from a
//! sustained overload (Flood).

use crate::buffer::status::StatusKind;
use std::time::{Duration, Instant};

/// Buffer health summarised for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Normal,
    Warning,
    Full,
    Flood,
}

/// One-shot notification flags, each meaning "an edge into this state
/// has occurred and has not yet been reported"
#[derive(Debug, Default, Clone, Copy)]
struct PendingNotices {
    warn: bool,
    full: bool,
    flood: bool,
    normal: bool,
}

#[derive(Debug)]
pub(crate) struct FlowMonitor {
    state: FlowState,
    pending: PendingNotices,
    /// Set while in Full (and carried into Flood); cleared by any edge
    /// that leaves the full condition behind
    full_since: Option<Instant>,
    warn_level: u32,
    normal_level: u32,
    tolerance: Duration,
}

impl FlowMonitor {
    pub(crate) fn new(warn_level: u32, normal_level: u32, tolerance: Duration) -> Self {
        Self {
            state: FlowState::Normal,
            pending: PendingNotices::default(),
            full_since: None,
            warn_level,
            normal_level,
            tolerance,
        }
    }

    pub(crate) fn state(&self) -> FlowState {
        self.state
    }

    fn is_full(count: usize, capacity: usize) -> bool {
        count == capacity - 1
    }

    fn ratio(count: usize, capacity: usize) -> u32 {
        (count * 100 / (capacity - 1)) as u32
    }

    /// Occupancy at or above the warning threshold
    pub(crate) fn is_warn(&self, count: usize, capacity: usize) -> bool {
        if capacity <= 1 {
            return false;
        }
        Self::ratio(count, capacity) >= self.warn_level
    }

    fn is_nowarn(&self, count: usize, capacity: usize) -> bool {
        if capacity <= 1 {
            return true;
        }
        Self::ratio(count, capacity) < self.warn_level
    }

    fn is_normal(&self, count: usize, capacity: usize) -> bool {
        if capacity <= 1 {
            return true;
        }
        Self::ratio(count, capacity) <= self.normal_level
    }

    /// Producer-side transition, run on every admission attempt
    ///
    /// Admitted messages pass the post-enqueue occupancy; rejected ones
    /// pass the unchanged occupancy, which keeps the Full-to-Flood
    /// escalation progressing while producers hammer a full buffer.
    pub(crate) fn on_admission(&mut self, count: usize, capacity: usize, now: Instant) {
        match self.state {
            FlowState::Normal => {
                if Self::is_full(count, capacity) {
                    self.state = FlowState::Full;
                    self.pending.full = true;
                    self.full_since = Some(now);
                } else if self.is_warn(count, capacity) {
                    self.state = FlowState::Warning;
                    self.pending.warn = true;
                }
            }
            FlowState::Warning => {
                if Self::is_full(count, capacity) {
                    self.state = FlowState::Full;
                    self.pending.full = true;
                    self.full_since = Some(now);
                } else if self.is_normal(count, capacity) {
                    self.state = FlowState::Normal;
                    self.pending.warn = false;
                    self.pending.normal = true;
                }
            }
            FlowState::Full => {
                let flooded = self
                    .full_since
                    .map_or(false, |since| now.duration_since(since) >= self.tolerance);
                if flooded {
                    self.state = FlowState::Flood;
                    self.pending.flood = true;
                } else if self.is_normal(count, capacity) {
                    self.state = FlowState::Normal;
                    self.pending.full = false;
                    self.pending.normal = true;
                    self.full_since = None;
                } else if self.is_nowarn(count, capacity) && !Self::is_full(count, capacity) {
                    self.state = FlowState::Warning;
                    self.pending.full = false;
                    self.pending.warn = true;
                    self.full_since = None;
                }
            }
            FlowState::Flood => {
                if self.is_normal(count, capacity) {
                    self.state = FlowState::Normal;
                    self.pending.flood = false;
                    self.pending.full = false;
                    self.pending.normal = true;
                    self.full_since = None;
                } else if self.is_nowarn(count, capacity) && !Self::is_full(count, capacity) {
                    self.state = FlowState::Warning;
                    self.pending.flood = false;
                    self.pending.full = false;
                    self.pending.warn = true;
                    self.full_since = None;
                }
            }
        }
    }

    /// Drain-side transition, run against the post-dequeue occupancy
    ///
    /// Mirrors only the downward edges; drainage never promotes.
    pub(crate) fn on_drain(&mut self, count: usize, capacity: usize) {
        match self.state {
            FlowState::Normal => {}
            FlowState::Warning => {
                if self.is_normal(count, capacity) {
                    self.state = FlowState::Normal;
                    self.pending.warn = false;
                    self.pending.normal = true;
                }
            }
            FlowState::Full => {
                if self.is_normal(count, capacity) {
                    self.state = FlowState::Normal;
                    self.pending.full = false;
                    self.pending.warn = false;
                    self.pending.normal = true;
                    self.full_since = None;
                } else if self.is_nowarn(count, capacity) {
                    self.state = FlowState::Warning;
                    self.pending.full = false;
                    self.pending.warn = true;
                    self.full_since = None;
                }
            }
            FlowState::Flood => {
                if self.is_normal(count, capacity) {
                    self.state = FlowState::Normal;
                    self.pending.flood = false;
                    self.pending.full = false;
                    self.pending.warn = false;
                    self.pending.normal = true;
                    self.full_since = None;
                } else if self.is_nowarn(count, capacity) {
                    self.state = FlowState::Warning;
                    self.pending.flood = false;
                    self.pending.full = false;
                    self.pending.warn = true;
                    self.full_since = None;
                }
            }
        }
    }

    /// Drain all pending notifications in the fixed reporting order
    /// warn, full, flood, normal, clearing each as it is taken
    pub(crate) fn take_pending(&mut self) -> Vec<StatusKind> {
        let mut drained = Vec::new();
        if self.pending.warn {
            self.pending.warn = false;
            drained.push(StatusKind::Warn);
        }
        if self.pending.full {
            self.pending.full = false;
            drained.push(StatusKind::Full);
        }
        if self.pending.flood {
            self.pending.flood = false;
            drained.push(StatusKind::Flood);
        }
        if self.pending.normal {
            self.pending.normal = false;
            drained.push(StatusKind::Normal);
        }
        drained
    }
}
