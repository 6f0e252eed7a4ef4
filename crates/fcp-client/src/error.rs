//! Command-layer errors.

use fcp_engine::{DialogError, Error as EngineError};
use fcp_proto::messages::ProtocolError;
use thiserror::Error;

/// Errors surfaced by [`FcpClient`](crate::FcpClient) commands.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection or an operator error from the engine.
    #[error("connection error: {0}")]
    Engine(#[from] EngineError),

    /// The dialog resolved with a failure (connection closed, abandoned).
    #[error("operation did not complete: {0}")]
    Dialog(#[from] DialogError),

    /// The node terminated the connection because another client already
    /// registered the same name.
    #[error("client name {0:?} is already connected to the node")]
    DuplicateClientName(String),

    /// A well-formed refusal from the node that is terminal for the
    /// operation.
    #[error("node refused the request (code {code:?}): {description:?}")]
    Refused {
        /// The numeric protocol-error code, when parseable.
        code: Option<u32>,
        /// The node's description of the code.
        description: Option<String>,
    },

    /// `client_put` was executed without a data source.
    #[error("no data source was supplied for the insert")]
    MissingPutSource,

    /// Local file I/O, e.g. reading a fetched payload back out of its spool.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub(crate) fn refused(error: &ProtocolError) -> Self {
        Self::Refused {
            code: error.code(),
            description: error.code_description().map(str::to_string),
        }
    }
}
