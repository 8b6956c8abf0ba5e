//! # Remote Notifier
//!
//! Client-side handle to the transport worker.
//!
//! ```text
//! connect() ──▶ Connecting ──▶ Connected ──▶ Disconnected
//!                    │                            ▲
//!                    └──── handshake failed ──────┘
//! ```
//!
//! There is no reconnect: once `Disconnected`, every `send` drops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender, TrySendError};
use meshrelay_shared::{PositionMessage, PositionSnapshot, REMOTE_URL};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{NotifierError, NotifierResult};
use crate::transport::{self, TransportCommand};

/// Default outbound queue depth (about one second at 15 Hz).
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Default inbound read timeout on the worker, in milliseconds.
pub const DEFAULT_READ_POLL_MS: u64 = 10;

/// Default bound on TCP connect, the upgrade handshake and each write, in
/// milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// WebSocket frame type used for outbound snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Binary frame carrying the UTF-8 JSON bytes.
    #[default]
    Binary,
    /// Text frame.
    Text,
}

/// Notifier configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Endpoint URL.
    pub url: String,
    /// Outbound frame type.
    pub frame: FrameKind,
    /// Outbound queue depth; full queue drops new snapshots.
    pub queue_depth: usize,
    /// Worker read timeout (ms). Bounds outbound latency and shutdown time.
    pub read_poll_ms: u64,
    /// Bound on TCP connect, the upgrade handshake and each socket write (ms).
    pub connect_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: REMOTE_URL.to_string(),
            frame: FrameKind::Binary,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            read_poll_ms: DEFAULT_READ_POLL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl RemoteConfig {
    /// Sets the endpoint URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the frame type.
    #[must_use]
    pub const fn with_frame(mut self, frame: FrameKind) -> Self {
        self.frame = frame;
        self
    }

    /// Sets the queue depth.
    #[must_use]
    pub const fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Sets the connect/handshake/write bound.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Worker read timeout.
    #[must_use]
    pub fn read_poll(&self) -> Duration {
        Duration::from_millis(self.read_poll_ms.max(1))
    }

    /// Connect, handshake and write bound.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }
}

// =============================================================================
// STATE & STATISTICS
// =============================================================================

/// Connection state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotifierState {
    /// Handshake in progress.
    #[default]
    Connecting,
    /// Socket open.
    Connected,
    /// Handshake failed, connection lost, or closed.
    Disconnected,
}

/// Notifier counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NotifierStats {
    /// Frames written to the socket.
    pub sent: u64,
    /// Payload bytes written.
    pub bytes_sent: u64,
    /// Snapshots dropped before reaching the worker.
    pub dropped: u64,
    /// Socket write failures.
    pub send_errors: u64,
    /// Inbound messages logged.
    pub received: u64,
}

/// State shared between the handle and the worker.
#[derive(Debug, Default)]
pub(crate) struct SharedStatus {
    state: RwLock<NotifierState>,
    sent: AtomicU64,
    bytes_sent: AtomicU64,
    dropped: AtomicU64,
    send_errors: AtomicU64,
    received: AtomicU64,
}

impl SharedStatus {
    pub(crate) fn state(&self) -> NotifierState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: NotifierState) {
        *self.state.write() = state;
    }

    pub(crate) fn record_sent(&self, bytes: usize) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> NotifierStats {
        NotifierStats {
            sent: self.sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// NOTIFIER TRAIT
// =============================================================================

/// Outbound sink for position snapshots.
pub trait Notifier {
    /// Pushes one snapshot without blocking on the wire.
    ///
    /// # Errors
    ///
    /// The snapshot was not accepted. Callers log and move on.
    fn notify(&mut self, snapshot: PositionSnapshot) -> NotifierResult<()>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, snapshot: PositionSnapshot) -> NotifierResult<()> {
        (**self).notify(snapshot)
    }
}

// =============================================================================
// REMOTE NOTIFIER
// =============================================================================

/// WebSocket notifier backed by a transport worker thread.
pub struct RemoteNotifier {
    /// Configuration used at connect time.
    config: RemoteConfig,
    /// Command channel; `None` once closed.
    commands: Option<Sender<TransportCommand>>,
    /// Worker thread; `None` once joined.
    worker: Option<JoinHandle<()>>,
    /// Shared state and counters.
    status: Arc<SharedStatus>,
}

impl RemoteNotifier {
    /// Spawns the transport worker, which opens the socket in the
    /// background. Returns immediately in `Connecting` state.
    ///
    /// # Errors
    ///
    /// Only if the worker thread cannot be spawned. A failed handshake is
    /// logged by the worker and leaves the notifier `Disconnected`.
    pub fn connect(config: RemoteConfig) -> NotifierResult<Self> {
        let (commands, inbox) = bounded(config.queue_depth.max(1));
        let status = Arc::new(SharedStatus::default());
        let worker = transport::spawn(config.clone(), inbox, Arc::clone(&status))
            .map_err(NotifierError::Spawn)?;

        Ok(Self {
            config,
            commands: Some(commands),
            worker: Some(worker),
            status,
        })
    }

    /// Serializes and enqueues one snapshot.
    ///
    /// # Errors
    ///
    /// `QueueFull` or `Disconnected` (snapshot dropped and counted),
    /// `Closed` after [`close`](Self::close), `Encode` on serializer failure.
    pub fn send(&self, snapshot: PositionSnapshot) -> NotifierResult<()> {
        let Some(commands) = self.commands.as_ref() else {
            return Err(NotifierError::Closed);
        };
        let payload = PositionMessage::new(snapshot).to_compact_json()?;

        match commands.try_send(TransportCommand::Send(payload)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.status.record_dropped();
                Err(NotifierError::QueueFull(self.config.queue_depth))
            }
            Err(TrySendError::Disconnected(_)) => {
                self.status.record_dropped();
                Err(NotifierError::Disconnected)
            }
        }
    }

    /// Stops the worker: queued snapshots are flushed, a close frame is
    /// sent, and the thread is joined. Idempotent.
    ///
    /// A worker still waiting on the handshake is detached instead of
    /// joined; it exits on its own once the connect timeout fires.
    pub fn close(&mut self) {
        let Some(commands) = self.commands.take() else {
            return;
        };
        // If the queue is full the drop below still ends the worker once
        // it drains.
        let _ = commands.try_send(TransportCommand::Shutdown);
        drop(commands);

        if let Some(worker) = self.worker.take() {
            if self.status.state() == NotifierState::Connecting {
                tracing::debug!("handshake with {} pending, detaching worker", self.config.url);
            } else if worker.join().is_err() {
                tracing::warn!("notifier transport worker panicked");
            }
        }
        self.status.set_state(NotifierState::Disconnected);
        tracing::info!("notifier for {} closed", self.config.url);
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> NotifierState {
        self.status.state()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_none()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> NotifierStats {
        self.status.snapshot()
    }

    /// Configuration used at connect time.
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Blocks until the handshake resolves or `timeout` elapses; returns
    /// the state at that point.
    pub fn wait_for_handshake(&self, timeout: Duration) -> NotifierState {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.state();
            if state != NotifierState::Connecting || Instant::now() >= deadline {
                return state;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Notifier for RemoteNotifier {
    fn notify(&mut self, snapshot: PositionSnapshot) -> NotifierResult<()> {
        self.send(snapshot)
    }
}

impl Drop for RemoteNotifier {
    fn drop(&mut self) {
        self.close();
    }
}
