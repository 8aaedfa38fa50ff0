//! Anti-Flood Agent Buffer Component
//!
//! A bounded, dynamically-growable message buffer that decouples a
//! high-rate local event producer from a rate-limited dispatcher
//! forwarding events to a remote manager over an unreliable channel.
//!
//! # Overview
//!
//! Key behaviours:
//!
//! - **Admission control**: a full buffer rejects new messages
//!   immediately rather than blocking producers
//! - **Dynamic growth**: capacity doubles opportunistically near the
//!   warning threshold, bounded by configured minimum/maximum
//! - **Flow states**: occupancy is classified as Normal, Warning, Full
//!   or Flood with hysteresis and a flood-tolerance window
//! - **Health notifications**: state edges are reported to the manager
//!   as fixed-format control messages
//! - **Pacing**: outbound throughput is capped at a configured
//!   events-per-second rate, independent of the producer rate
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Producer A  │   │  Producer B  │   │  Producer C  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ append           │ append           │ append
//!        ▼                  ▼                  ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                    AgentBuffer                      │
//! │  ┌───────────────────────────────┐  ┌────────────┐  │
//! │  │ circular store  ┌─┬─┬─┬─┬─┬─┐ │  │FlowMonitor │  │
//! │  │ (one spare slot)│x│x│x│ │ │ │ │  │ N/W/F/FL   │  │
//! │  │                 └─┴─┴─┴─┴─┴─┘ │  │ + notices  │  │
//! │  └───────────────────────────────┘  └────────────┘  │
//! └──────────────────────────┬──────────────────────────┘
//!                            │ dequeue + drain notices
//!                            ▼
//!                     ┌─────────────┐   paced sends
//!                     │  Dispatcher │ ──────────────▶ manager
//!                     └─────────────┘   (Transport)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use antiflood::buffer::api::{AgentBuffer, BufferConfig, Dispatcher, Transport, TransportError};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct ManagerLink;
//!
//! #[async_trait]
//! impl Transport for ManagerLink {
//!     async fn send(&self, _message: &[u8]) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let buffer = AgentBuffer::new(BufferConfig::default())?;
//! let handle = Dispatcher::spawn(Arc::clone(&buffer), Arc::new(ManagerLink));
//!
//! buffer.append(b"1:location:event payload")?;
//!
//! handle.shutdown().await;
//! buffer.destroy()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
mod dispatch;
mod error;
mod flow;
mod manager;
mod status;
mod store;
mod traits;
mod types;

pub use config::{BufferConfig, ConfigError};
pub use dispatch::{Dispatcher, DispatcherHandle};
pub use error::{BufferError, BufferResult};
pub use flow::FlowState;
pub use manager::AgentBuffer;
pub use status::StatusKind;
pub use traits::{Transport, TransportError};
pub use types::{AgentCounters, BufferStats, CounterSnapshot};

#[cfg(test)]
mod tests;
