//! Codec error types.

use thiserror::Error;

/// Errors raised while encoding or decoding FCP messages.
///
/// Every decode error is fatal to the connection it occurred on: once the
/// text framing or a payload boundary is lost there is no way to
/// resynchronize, so the connection must be torn down.
#[derive(Debug, Error)]
pub enum CodecError {
    /// I/O error from the underlying stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended between messages (the peer closed the connection).
    #[error("connection closed by peer")]
    Eof,

    /// The stream ended in the middle of a message or payload.
    #[error("stream ended mid-message")]
    UnexpectedEof,

    /// A field line without a `=` separator.
    #[error("malformed field line: {0:?}")]
    MalformedLine(String),

    /// A payload-bearing message without a parseable `DataLength` field.
    #[error("missing or invalid DataLength: {0:?}")]
    InvalidDataLength(String),
}
