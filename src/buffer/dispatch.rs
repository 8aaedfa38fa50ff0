//! Dispatch loop - drains the buffer towards the manager
//!
//! A single dedicated task per buffer. Each cycle dequeues one payload,
//! reports any pending flow-state notifications, paces itself to the
//! configured event rate and forwards the payload over the transport.
//! The buffer lock is released before any transport I/O so a slow
//! network never stalls producers.

use crate::buffer::manager::{AgentBuffer, DispatchItem};
use crate::buffer::status::StatusKind;
use crate::buffer::traits::Transport;
use crate::core::shutdown::ShutdownCoordinator;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawns and runs the per-buffer dispatch loop
pub struct Dispatcher;

/// Control handle for a running dispatch loop
///
/// Dropping the handle leaves the loop running detached; call
/// [`DispatcherHandle::shutdown`] for an orderly stop. The buffer
/// refuses `destroy()` until the loop has exited.
pub struct DispatcherHandle {
    shutdown: ShutdownCoordinator,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Signal the dispatch loop to stop and wait for it to exit
    pub async fn shutdown(self) {
        self.shutdown.trigger_shutdown();
        if let Err(err) = self.task.await {
            log::error!("Buffer dispatcher task ended abnormally: {}", err);
        }
    }

    /// Whether the dispatch loop has already exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Dispatcher {
    /// Start the dispatch loop for `buffer`, forwarding over `transport`
    ///
    /// Exactly one dispatcher should run per buffer; the buffer tracks
    /// the binding so teardown can be sequenced against it.
    pub fn spawn(buffer: Arc<AgentBuffer>, transport: Arc<dyn Transport>) -> DispatcherHandle {
        let (shutdown, shutdown_rx) = ShutdownCoordinator::new();
        let stop_flag = Arc::clone(&shutdown.shutdown_requested);

        buffer.set_dispatcher_active(true);
        let task = tokio::spawn(async move {
            Self::run(Arc::clone(&buffer), transport, shutdown_rx, stop_flag).await;
            buffer.set_dispatcher_active(false);
        });

        DispatcherHandle { shutdown, task }
    }

    async fn run(
        buffer: Arc<AgentBuffer>,
        transport: Arc<dyn Transport>,
        mut shutdown_rx: broadcast::Receiver<()>,
        stop_flag: Arc<std::sync::atomic::AtomicBool>,
    ) {
        log::debug!("Buffer dispatcher started.");

        loop {
            let loop_start = buffer.clock().now();

            let item = match Self::next_item(&buffer, &mut shutdown_rx, &stop_flag).await {
                Some(item) => item,
                None => break,
            };

            // Pending notifications go out before the payload, in the
            // fixed order the flow monitor drained them
            for kind in &item.notices {
                Self::report_status(transport.as_ref(), &buffer, *kind, &item).await;
            }

            // Pace outbound throughput independent of the producer rate;
            // a cycle that already overran its slot skips the sleep
            let elapsed = buffer.clock().now().duration_since(loop_start);
            if elapsed < item.pacing {
                tokio::time::sleep(item.pacing - elapsed).await;
            }

            match item.payload {
                Some(payload) => {
                    if let Err(err) = transport.send(&payload).await {
                        log::debug!("Failed to forward buffered message: {}", err);
                    }
                    buffer.record_forwarded();
                }
                // Occupancy said non-empty but the slot held nothing;
                // skip the transport rather than crash
                None => log::debug!("Skipped forwarding an empty buffer slot."),
            }
        }

        log::debug!("Buffer dispatcher stopped.");
    }

    /// Wait until the buffer yields a message or shutdown is requested
    async fn next_item(
        buffer: &Arc<AgentBuffer>,
        shutdown_rx: &mut broadcast::Receiver<()>,
        stop_flag: &Arc<std::sync::atomic::AtomicBool>,
    ) -> Option<DispatchItem> {
        loop {
            if stop_flag.load(Ordering::Acquire) {
                return None;
            }
            match buffer.dispatch_next() {
                Ok(Some(item)) => return Some(item),
                Ok(None) => {
                    tokio::select! {
                        _ = buffer.notifier().notified() => {}
                        _ = shutdown_rx.recv() => return None,
                    }
                }
                Err(err) => {
                    log::error!("Buffer dispatcher cannot access the buffer: {}", err);
                    return None;
                }
            }
        }
    }

    async fn report_status(
        transport: &dyn Transport,
        buffer: &AgentBuffer,
        kind: StatusKind,
        item: &DispatchItem,
    ) {
        match kind {
            StatusKind::Warn => log::warn!(
                "Event buffer is at {}% of its capacity.",
                item.warn_level
            ),
            StatusKind::Full => {
                log::warn!("Event buffer is full. Incoming events are being dropped.")
            }
            StatusKind::Flood => {
                log::warn!("Event buffer is flooded. Incoming events are being dropped.")
            }
            StatusKind::Normal => log::info!(
                "Event buffer usage is back under {}%.",
                item.normal_level
            ),
        }

        let wire = kind.wire_message(item.warn_level, item.normal_level);
        if let Err(err) = transport.send(wire.as_bytes()).await {
            log::debug!("Failed to forward buffer status message: {}", err);
        }
        buffer.record_notice();
    }
}
