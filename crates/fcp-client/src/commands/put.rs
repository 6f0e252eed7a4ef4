//! Content insertion, including the direct-disk-access handshake for disk
//! uploads.

use crate::client::FcpClient;
use crate::error::ClientError;
use crate::identifier::RandomIdentifierGenerator;
use fcp_engine::{DdaSession, DialogHandler, Outbox};
use fcp_proto::messages::{
    ProtocolError, PutFailed, PutSuccessful, SimpleProgress, TestDdaComplete, TestDdaReply,
    UriGenerated,
};
use fcp_proto::{requests, FcpMessage, DDA_REFUSAL_CODE};
use std::path::{Path, PathBuf};

/// Where the inserted content comes from.
#[derive(Debug, Clone)]
pub enum PutSource {
    /// Bytes sent in-band with the request.
    Direct(Vec<u8>),
    /// A file the node reads itself; requires direct-disk-access permission.
    Disk(PathBuf),
    /// A redirect to another URI.
    Redirect(String),
}

/// Builder for the `ClientPut` operation.
pub struct ClientPutCommand<'a> {
    client: &'a FcpClient,
    uri: String,
    source: Option<PutSource>,
    target_filename: Option<String>,
    key_listener: Option<Box<dyn Fn(&str) + Send + 'static>>,
    progress_listener: Option<Box<dyn Fn(&SimpleProgress) + Send + 'static>>,
}

impl<'a> ClientPutCommand<'a> {
    pub(crate) fn new(client: &'a FcpClient, uri: String) -> Self {
        Self {
            client,
            uri,
            source: None,
            target_filename: None,
            key_listener: None,
            progress_listener: None,
        }
    }

    /// Insert bytes supplied in-band.
    #[must_use]
    pub fn from_bytes(mut self, data: Vec<u8>) -> Self {
        self.source = Some(PutSource::Direct(data));
        self
    }

    /// Insert a file the node reads from its own filesystem. The node will
    /// typically demand the direct-disk-access handshake for the file's
    /// directory; the command runs it transparently and retries.
    #[must_use]
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(PutSource::Disk(path.into()));
        self
    }

    /// Insert a redirect pointing at `target`.
    #[must_use]
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.source = Some(PutSource::Redirect(target.into()));
        self
    }

    /// Record a filename in the key the data is inserted under.
    #[must_use]
    pub fn named(mut self, filename: impl Into<String>) -> Self {
        self.target_filename = Some(filename.into());
        self
    }

    /// Observe the generated URI as soon as the node announces it, before
    /// the insert completes.
    #[must_use]
    pub fn on_key_generated<F>(mut self, listener: F) -> Self
    where
        F: Fn(&str) + Send + 'static,
    {
        self.key_listener = Some(Box::new(listener));
        self
    }

    /// Observe block-level progress notifications while the insert runs.
    #[must_use]
    pub fn on_progress<F>(mut self, listener: F) -> Self
    where
        F: Fn(&SimpleProgress) + Send + 'static,
    {
        self.progress_listener = Some(Box::new(listener));
        self
    }

    /// Run the insert.
    ///
    /// Resolves to the final URI on success, or `None` when the node
    /// reports the insert as failed.
    ///
    /// # Errors
    ///
    /// A missing data source, connection establishment failure, a terminal
    /// refusal, or closure before a verdict.
    pub async fn execute(self) -> Result<Option<String>, ClientError> {
        let source = self.source.ok_or(ClientError::MissingPutSource)?;
        let identifier = RandomIdentifierGenerator::generate("client-put");
        let (mut message, dda_directory) = match source {
            PutSource::Direct(data) => {
                (requests::client_put_direct(&identifier, &self.uri, data), None)
            }
            PutSource::Disk(path) => {
                let directory = parent_directory(&path);
                let filename = path.to_string_lossy().into_owned();
                (
                    requests::client_put_disk(&identifier, &self.uri, &filename),
                    directory,
                )
            }
            PutSource::Redirect(target) => (
                requests::client_put_redirect(&identifier, &self.uri, &target),
                None,
            ),
        };
        if let Some(filename) = self.target_filename {
            message.set("TargetFilename", filename);
        }
        let handler = PutHandler {
            identifier,
            original: message.clone(),
            dda_directory,
            dda: None,
            key_listener: self.key_listener,
            progress_listener: self.progress_listener,
            outcome: None,
        };
        self.client.run_dialog(handler, message).await?
    }
}

fn parent_directory(path: &Path) -> Option<String> {
    path.parent().map(|dir| dir.to_string_lossy().into_owned())
}

struct PutHandler {
    identifier: String,
    /// The request as first sent, re-sent after a granted handshake.
    original: FcpMessage,
    /// Directory to probe on refusal code 25, for disk sources only.
    dda_directory: Option<String>,
    dda: Option<DdaSession>,
    key_listener: Option<Box<dyn Fn(&str) + Send + 'static>>,
    progress_listener: Option<Box<dyn Fn(&SimpleProgress) + Send + 'static>>,
    outcome: Option<Result<Option<String>, ClientError>>,
}

impl PutHandler {
    fn matches(&self, identifier: Option<&str>) -> bool {
        identifier == Some(self.identifier.as_str())
    }
}

impl DialogHandler for PutHandler {
    type Output = Result<Option<String>, ClientError>;

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn result(&mut self) -> Self::Output {
        self.outcome.take().unwrap_or(Ok(None))
    }

    fn on_protocol_error(&mut self, message: &ProtocolError, out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        // Code 25 on a disk upload starts the handshake; one probe per
        // operation, so a second refusal is terminal.
        if message.code() == Some(DDA_REFUSAL_CODE) && self.dda.is_none() {
            if let Some(directory) = self.dda_directory.clone() {
                tracing::debug!(%directory, "insert needs direct disk access, probing");
                let session = DdaSession::new(directory, true, false);
                out.send(session.request());
                self.dda = Some(session);
                return;
            }
        }
        self.outcome = Some(Err(ClientError::refused(message)));
    }

    fn on_test_dda_reply(&mut self, message: &TestDdaReply, out: &mut Outbox) {
        if let Some(session) = &self.dda {
            if let Some(response) = session.handle_reply(message) {
                out.send(response);
            }
        }
    }

    fn on_test_dda_complete(&mut self, message: &TestDdaComplete, out: &mut Outbox) {
        if let Some(session) = &mut self.dda {
            if session.handle_complete(message) {
                tracing::debug!(verdict = ?session.verdict(), "handshake complete, retrying insert");
                out.send(self.original.clone());
            }
        }
    }

    fn on_uri_generated(&mut self, message: &UriGenerated, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        if let (Some(listener), Some(uri)) = (&self.key_listener, message.uri()) {
            listener(uri);
        }
    }

    fn on_simple_progress(&mut self, message: &SimpleProgress, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        if let Some(listener) = &self.progress_listener {
            listener(message);
        }
    }

    fn on_put_successful(&mut self, message: &PutSuccessful, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        let uri = message
            .uri()
            .map(str::to_string)
            .or_else(|| self.original.get("URI").map(str::to_string));
        self.outcome = Some(Ok(uri));
    }

    fn on_put_failed(&mut self, message: &PutFailed, _out: &mut Outbox) {
        if !self.matches(message.identifier()) {
            return;
        }
        tracing::debug!(code = ?message.code(), "insert failed");
        self.outcome = Some(Ok(None));
    }
}
