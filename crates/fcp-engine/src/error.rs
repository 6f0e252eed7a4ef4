//! Error types for the FCP engine.

use fcp_proto::CodecError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Engine errors.
///
/// Transport and framing failures are fatal to the connection they occurred
/// on; operator errors are synchronous results of the offending call and
/// never surface through a dialog's result handle.
#[derive(Debug, Error)]
pub enum Error {
    /// Framing or decode failure. Fatal: the connection cannot
    /// resynchronize afterwards.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Socket-level I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// `connect` was called on an already-connected connection.
    #[error("already connected, close first")]
    AlreadyConnected,

    /// An operation requiring a live socket was called while not connected.
    #[error("not connected")]
    NotConnected,
}

/// Why a connection's receive loop terminated.
#[derive(Debug, Clone)]
pub enum CloseReason {
    /// `close()` was called locally; a clean shutdown.
    Local,
    /// A transport or framing failure tore the connection down.
    Error(Arc<Error>),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "closed locally"),
            Self::Error(cause) => write!(f, "{cause}"),
        }
    }
}

/// Errors resolving a dialog's result handle.
#[derive(Debug, Error, Clone)]
pub enum DialogError {
    /// The connection closed before the dialog finished.
    #[error("connection closed: {0}")]
    ConnectionClosed(CloseReason),

    /// The dialog was abandoned before a result arrived.
    #[error("dialog abandoned")]
    Abandoned,
}
