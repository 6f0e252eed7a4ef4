//! Content fetching.

use crate::client::FcpClient;
use crate::error::ClientError;
use crate::identifier::RandomIdentifierGenerator;
use fcp_engine::{DialogHandler, Outbox};
use fcp_proto::messages::{AllData, GetFailed, ProtocolError, SimpleProgress};
use fcp_proto::{requests, Payload};
use std::io;
use std::sync::Arc;

/// Fetched content: the spooled payload plus its recorded MIME type.
#[derive(Debug, Clone)]
pub struct FcpData {
    content_type: Option<String>,
    payload: Arc<Payload>,
}

impl FcpData {
    /// The MIME type recorded in the data's metadata.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The payload length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Read the whole payload into memory.
    ///
    /// # Errors
    ///
    /// I/O failure reading a payload spooled to disk.
    pub fn bytes(&self) -> io::Result<Vec<u8>> {
        self.payload.bytes()
    }

    /// A fresh reader over the payload.
    ///
    /// # Errors
    ///
    /// I/O failure reopening a payload spooled to disk.
    pub fn reader(&self) -> io::Result<Box<dyn io::Read + Send>> {
        self.payload.reader()
    }
}

/// Builder for the `ClientGet` operation.
pub struct ClientGetCommand<'a> {
    client: &'a FcpClient,
    uri: String,
    progress_listener: Option<Box<dyn Fn(&SimpleProgress) + Send + 'static>>,
}

impl<'a> ClientGetCommand<'a> {
    pub(crate) fn new(client: &'a FcpClient, uri: String) -> Self {
        Self {
            client,
            uri,
            progress_listener: None,
        }
    }

    /// Observe block-level progress notifications while the fetch runs.
    #[must_use]
    pub fn on_progress<F>(mut self, listener: F) -> Self
    where
        F: Fn(&SimpleProgress) + Send + 'static,
    {
        self.progress_listener = Some(Box::new(listener));
        self
    }

    /// Run the fetch.
    ///
    /// Resolves to `None` when the node reports the data as unavailable
    /// (`GetFailed`) or refuses the request.
    ///
    /// # Errors
    ///
    /// Connection establishment failure or closure before a verdict.
    pub async fn execute(self) -> Result<Option<FcpData>, ClientError> {
        let identifier = RandomIdentifierGenerator::generate("client-get");
        let handler = GetHandler {
            identifier: identifier.clone(),
            progress_listener: self.progress_listener,
            outcome: None,
        };
        let outcome = self
            .client
            .run_dialog(handler, requests::client_get(&identifier, &self.uri))
            .await?;
        Ok(outcome)
    }
}

struct GetHandler {
    identifier: String,
    progress_listener: Option<Box<dyn Fn(&SimpleProgress) + Send + 'static>>,
    outcome: Option<Option<FcpData>>,
}

impl GetHandler {
    fn matches(&self, identifier: Option<&str>) -> bool {
        identifier == Some(self.identifier.as_str())
    }
}

impl DialogHandler for GetHandler {
    type Output = Option<FcpData>;

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn result(&mut self) -> Self::Output {
        self.outcome.take().flatten()
    }

    fn on_all_data(&mut self, message: &AllData, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        let payload = message
            .payload()
            .cloned()
            .unwrap_or_else(|| Arc::new(Payload::from_bytes(Vec::new())));
        self.outcome = Some(Some(FcpData {
            content_type: message.content_type().map(str::to_string),
            payload,
        }));
    }

    fn on_simple_progress(&mut self, message: &SimpleProgress, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        if let Some(listener) = &self.progress_listener {
            listener(message);
        }
    }

    fn on_get_failed(&mut self, message: &GetFailed, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        tracing::debug!(code = ?message.code(), "fetch failed");
        self.outcome = Some(None);
    }

    fn on_protocol_error(&mut self, message: &ProtocolError, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        tracing::debug!(code = ?message.code(), "fetch refused");
        self.outcome = Some(None);
    }
}
