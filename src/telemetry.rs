//! Telemetry bus (C6): the per-client registry that decouples a running
//! [`crate::simulator::Simulator`] task from whatever external transport
//! ultimately delivers frames (a WebSocket, an NDJSON writer, a test
//! harness). The bus owns a mapping `client_id -> (sink, run_flag)`;
//! per-client operations are serialized, but there is no cross-client
//! ordering guarantee and no single global lock.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::simulator::TelemetryFrame;

/// Errors raised at the telemetry boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryError {
    /// `client_id` did not match `^[A-Za-z0-9_-]{1,64}$`.
    #[error("client id '{0}' is invalid: must match ^[A-Za-z0-9_-]{{1,64}}$")]
    InvalidClientId(String),
    /// No client is currently connected under this id.
    #[error("no connected client with id '{0}'")]
    UnknownClient(String),
}

/// A validated client identifier.
///
/// The only way to obtain one is [`ClientId::parse`], so every `ClientId`
/// in the system is already known to satisfy the wire-format rule; the
/// simulator and bus never re-validate it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ClientId(String);

impl ClientId {
    /// Parse and validate a raw client id string.
    ///
    /// # Errors
    /// Returns [`TelemetryError::InvalidClientId`] if `raw` is empty, longer
    /// than 64 bytes, or contains a character outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, TelemetryError> {
        let is_valid = !raw.is_empty()
            && raw.len() <= 64
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if is_valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(TelemetryError::InvalidClientId(raw.to_string()))
        }
    }

    /// Borrow the validated id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination for frames leaving the telemetry bus.
///
/// Implemented by whatever carries frames to their final consumer: a
/// WebSocket writer in a real transport adapter, or an in-process channel
/// or NDJSON writer in a CLI binary / test.
pub trait FrameSink: Send + Sync {
    /// Deliver one frame. Errors are surfaced to the bus caller, never
    /// retried internally.
    fn send_frame(&self, frame: TelemetryFrame) -> Pin<Box<dyn Future<Output = Result<(), TelemetryError>> + Send>>;
}

/// A [`FrameSink`] that forwards frames over a bounded `tokio` channel.
pub struct ChannelSink {
    sender: tokio::sync::mpsc::Sender<TelemetryFrame>,
}

impl ChannelSink {
    /// Wrap an existing channel sender.
    #[must_use]
    pub fn new(sender: tokio::sync::mpsc::Sender<TelemetryFrame>) -> Self {
        Self { sender }
    }
}

impl FrameSink for ChannelSink {
    fn send_frame(&self, frame: TelemetryFrame) -> Pin<Box<dyn Future<Output = Result<(), TelemetryError>> + Send>> {
        let sender = self.sender.clone();
        Box::pin(async move {
            sender
                .send(frame)
                .await
                .map_err(|_| TelemetryError::UnknownClient("<channel closed>".to_string()))
        })
    }
}

struct ClientEntry {
    sink: Box<dyn FrameSink>,
    run_flag: Arc<AtomicBool>,
}

/// Sharded per-client registry connecting simulator tasks to their sinks.
#[derive(Default)]
pub struct TelemetryBus {
    clients: DashMap<ClientId, ClientEntry>,
}

impl TelemetryBus {
    /// Construct an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register `client_id`, replacing any prior connection under the same
    /// id.
    pub fn connect(&self, client_id: ClientId, sink: Box<dyn FrameSink>, run_flag: Arc<AtomicBool>) {
        tracing::debug!(client_id = %client_id, "client connected");
        self.clients.insert(client_id, ClientEntry { sink, run_flag });
    }

    /// Deliver `frame` to `client_id`'s sink.
    ///
    /// A client that isn't connected, or whose sink has disconnected
    /// underneath it (closed channel, dropped websocket), is not an error
    /// here: the frame is silently dropped, since there is no reasonable
    /// recovery for a telemetry consumer that already walked away.
    pub async fn send(&self, client_id: &ClientId, frame: TelemetryFrame) {
        let sink_future = {
            let Some(entry) = self.clients.get(client_id) else {
                tracing::debug!(client_id = %client_id, "dropping frame for unconnected client");
                return;
            };
            entry.sink.send_frame(frame)
        };
        if sink_future.await.is_err() {
            tracing::debug!(client_id = %client_id, "dropping frame for disconnected sink");
        }
    }

    /// Flip the cooperative stop flag for `client_id`.
    ///
    /// # Errors
    /// Returns [`TelemetryError::UnknownClient`] if no client is connected
    /// under this id.
    pub fn request_stop(&self, client_id: &ClientId) -> Result<(), TelemetryError> {
        let entry = self
            .clients
            .get(client_id)
            .ok_or_else(|| TelemetryError::UnknownClient(client_id.to_string()))?;
        entry.run_flag.store(false, Ordering::SeqCst);
        tracing::debug!(client_id = %client_id, "stop requested");
        Ok(())
    }

    /// Remove `client_id`'s registration.
    ///
    /// # Errors
    /// Returns [`TelemetryError::UnknownClient`] if no client is connected
    /// under this id.
    pub fn disconnect(&self, client_id: &ClientId) -> Result<(), TelemetryError> {
        self.clients
            .remove(client_id)
            .map(|_| tracing::debug!(client_id = %client_id, "client disconnected"))
            .ok_or_else(|| TelemetryError::UnknownClient(client_id.to_string()))
    }

    /// Number of currently connected clients.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::FrameStatus;

    fn sample_frame(cycle: u32) -> TelemetryFrame {
        TelemetryFrame {
            status: FrameStatus::Running,
            percentage: 0,
            cycle,
            atoms_lost: 0,
            n_vib: 0.0,
            fidelity: 1.0,
            decoder_backlog_ms: 0.0,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn parses_valid_client_ids() {
        assert!(ClientId::parse("abc_123-XYZ").is_ok());
        assert!(ClientId::parse("a").is_ok());
        assert!(ClientId::parse(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn rejects_invalid_client_ids() {
        assert!(ClientId::parse("").is_err());
        assert!(ClientId::parse(&"x".repeat(65)).is_err());
        assert!(ClientId::parse("has a space").is_err());
        assert!(ClientId::parse("semi;colon").is_err());
    }

    #[tokio::test]
    async fn send_reaches_connected_sink() {
        let bus = TelemetryBus::new();
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let id = ClientId::parse("client-a").unwrap();
        bus.connect(id.clone(), Box::new(ChannelSink::new(tx)), Arc::new(AtomicBool::new(true)));

        bus.send(&id, sample_frame(1)).await;
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.cycle, 1);
    }

    #[tokio::test]
    async fn send_to_unknown_client_is_silently_dropped() {
        let bus = TelemetryBus::new();
        let id = ClientId::parse("ghost").unwrap();
        bus.send(&id, sample_frame(1)).await;
        assert_eq!(bus.connected_count(), 0);
    }

    #[tokio::test]
    async fn send_to_disconnected_sink_is_silently_dropped() {
        let bus = TelemetryBus::new();
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let id = ClientId::parse("client-d").unwrap();
        bus.connect(id.clone(), Box::new(ChannelSink::new(tx)), Arc::new(AtomicBool::new(true)));
        drop(rx);

        bus.send(&id, sample_frame(1)).await;
    }

    #[test]
    fn request_stop_flips_shared_flag() {
        let bus = TelemetryBus::new();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let id = ClientId::parse("client-b").unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        bus.connect(id.clone(), Box::new(ChannelSink::new(tx)), flag.clone());

        bus.request_stop(&id).unwrap();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn disconnect_removes_client_and_is_idempotent_error() {
        let bus = TelemetryBus::new();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let id = ClientId::parse("client-c").unwrap();
        bus.connect(id.clone(), Box::new(ChannelSink::new(tx)), Arc::new(AtomicBool::new(true)));

        assert_eq!(bus.connected_count(), 1);
        bus.disconnect(&id).unwrap();
        assert_eq!(bus.connected_count(), 0);
        assert!(bus.disconnect(&id).is_err());
    }
}
