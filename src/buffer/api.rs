//! Public API for the agent buffer
//!
//! This module provides the complete public API for the anti-flood
//! buffer subsystem. External modules should import from here rather
//! than directly from internal modules. See the module documentation
//! for usage examples and architecture details.

// Buffer lifecycle and producer API
pub use crate::buffer::manager::AgentBuffer;

// Consumer dispatch loop
pub use crate::buffer::dispatch::{Dispatcher, DispatcherHandle};

// Configuration
pub use crate::buffer::config::{BufferConfig, ConfigError};

// Error handling
pub use crate::buffer::error::{BufferError, BufferResult};

// Flow classification and manager-facing status messages
pub use crate::buffer::flow::FlowState;
pub use crate::buffer::status::{StatusKind, AGENT_SOURCE_LABEL, CONTROL_CHANNEL_TAG};

// Transport seam towards the manager
pub use crate::buffer::traits::{Transport, TransportError};

// Statistics and counters
pub use crate::buffer::types::{AgentCounters, BufferStats, CounterSnapshot};
