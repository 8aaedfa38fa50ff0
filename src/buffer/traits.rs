//! Traits for the buffer system
//!
//! The transport seam is the only extension point: the buffer neither
//! knows nor cares how bytes reach the manager.

use async_trait::async_trait;

/// Opaque transport failure
///
/// Delivery is fire-and-forget from the buffer's perspective; failures
/// are logged by the dispatcher and never propagated further.
#[derive(Debug, thiserror::Error)]
#[error("transport send failed: {0}")]
pub struct TransportError(pub String);

/// Delivery channel towards the manager
///
/// Implementations carry both ordinary event payloads and control-channel
/// status messages; the dispatcher does not distinguish between them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message to the manager
    async fn send(&self, message: &[u8]) -> Result<(), TransportError>;
}
