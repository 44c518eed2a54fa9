//! Error types for the client session.

use std::time::Duration;

use order_protocol::ProtocolError;
use thiserror::Error;

use crate::session::SessionState;

/// Every variant except `InvalidState` is fatal: the session moves to
/// [`SessionState::Failed`] and no further operation is accepted.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error on the underlying stream (reset, broken pipe, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before a full frame arrived.
    #[error("stream closed mid-frame: expected {expected} {stage} bytes, received {received}")]
    UnexpectedEof {
        stage: &'static str,
        expected: usize,
        received: usize,
    },

    /// Header or body failed to decode, or the version is wrong.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The operation is not allowed from the current state.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// No complete frame arrived within the configured receive deadline.
    #[error("no frame received within {0:?}")]
    Timeout(Duration),
}

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
