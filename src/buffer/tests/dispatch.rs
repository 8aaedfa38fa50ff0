//! Tests for the dispatch loop: ordering, wakeups, shutdown and pacing

#[cfg(test)]
mod tests {
    use crate::buffer::api::{
        AgentBuffer, BufferConfig, Dispatcher, Transport, TransportError,
    };
    use async_trait::async_trait;
    use serial_test::serial;
    use std::sync::{Arc, Mutex};
    use tokio::time::{timeout, Duration};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, message: &[u8]) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(message.to_vec());
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _message: &[u8]) -> Result<(), TransportError> {
            Err(TransportError("connection reset".to_string()))
        }
    }

    fn quiet_config() -> BufferConfig {
        // Large enough that no flow transitions fire, fast enough that
        // pacing never dominates the test runtime
        BufferConfig {
            buffer_length: 100,
            events_per_sec: 1000,
            ..Default::default()
        }
    }

    async fn wait_for_forwarded(buffer: &AgentBuffer, expected: u64) {
        timeout(Duration::from_secs(5), async {
            while buffer.counters().messages_forwarded < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("dispatcher did not forward the expected number of messages");
    }

    #[tokio::test]
    async fn test_dispatcher_forwards_in_admission_order() {
        let buffer = AgentBuffer::new(quiet_config()).unwrap();
        let transport = Arc::new(RecordingTransport::default());
        for k in 0..5 {
            buffer.append(format!("event {}", k).as_bytes()).unwrap();
        }

        let handle = Dispatcher::spawn(
            Arc::clone(&buffer),
            Arc::clone(&transport) as Arc<dyn Transport>,
        );
        wait_for_forwarded(&buffer, 5).await;
        handle.shutdown().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 5);
        for (k, message) in sent.iter().enumerate() {
            assert_eq!(message, &format!("event {}", k).into_bytes());
        }
        assert_eq!(buffer.len(), Some(0));
    }

    #[tokio::test]
    async fn test_dispatcher_wakes_for_messages_appended_while_idle() {
        let buffer = AgentBuffer::new(quiet_config()).unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let handle = Dispatcher::spawn(
            Arc::clone(&buffer),
            Arc::clone(&transport) as Arc<dyn Transport>,
        );

        // Let the dispatcher park on its empty-wait first
        tokio::time::sleep(Duration::from_millis(20)).await;
        buffer.append(b"late arrival").unwrap();

        wait_for_forwarded(&buffer, 1).await;
        handle.shutdown().await;

        assert_eq!(transport.sent(), vec![b"late arrival".to_vec()]);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_empty_wait() {
        let buffer = AgentBuffer::new(quiet_config()).unwrap();
        let handle = Dispatcher::spawn(Arc::clone(&buffer), Arc::new(RecordingTransport::default()));
        assert!(!handle.is_finished());

        timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("dispatcher did not leave its empty-wait on shutdown");
    }

    #[tokio::test]
    async fn test_transport_failure_is_logged_not_fatal() {
        let buffer = AgentBuffer::new(quiet_config()).unwrap();
        for k in 0..3 {
            buffer.append(format!("event {}", k).as_bytes()).unwrap();
        }

        let handle = Dispatcher::spawn(Arc::clone(&buffer), Arc::new(FailingTransport));
        // The loop keeps draining even though every send fails
        wait_for_forwarded(&buffer, 3).await;
        handle.shutdown().await;

        assert_eq!(buffer.len(), Some(0));
    }

    #[serial]
    #[tokio::test]
    async fn test_pacing_caps_outbound_rate() {
        let buffer = AgentBuffer::new(BufferConfig {
            buffer_length: 100,
            events_per_sec: 10, // 100ms per event
            ..Default::default()
        })
        .unwrap();
        let transport = Arc::new(RecordingTransport::default());
        for k in 0..3 {
            buffer.append(format!("event {}", k).as_bytes()).unwrap();
        }

        let started = std::time::Instant::now();
        let handle = Dispatcher::spawn(
            Arc::clone(&buffer),
            Arc::clone(&transport) as Arc<dyn Transport>,
        );
        wait_for_forwarded(&buffer, 3).await;
        handle.shutdown().await;

        // Three paced cycles cannot complete faster than two full
        // intervals plus the first one
        assert!(
            started.elapsed() >= Duration::from_millis(250),
            "dispatcher outran the configured rate: {:?}",
            started.elapsed()
        );
        assert_eq!(transport.sent().len(), 3);
    }
}
