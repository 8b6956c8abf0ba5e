//! Notifier error types.

use thiserror::Error;

/// Errors surfaced by the notifier. None of them are fatal to a cycle.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// The transport worker thread could not be started.
    #[error("failed to spawn transport worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The snapshot could not be serialized.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// The outbound queue is full; the message was dropped.
    #[error("outbound queue full ({0} messages), snapshot dropped")]
    QueueFull(usize),

    /// The connection is gone (or never came up); the message was dropped.
    #[error("remote endpoint not connected, snapshot dropped")]
    Disconnected,

    /// `close()` was already called.
    #[error("notifier closed")]
    Closed,
}

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;
