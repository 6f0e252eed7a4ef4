//! The client facade and its lazily established connection.

use crate::commands::config::GetConfigCommand;
use crate::commands::get::ClientGetCommand;
use crate::commands::keypair::GenerateKeypairCommand;
use crate::commands::peers::{ListPeersCommand, RemovePeerCommand};
use crate::commands::put::ClientPutCommand;
use crate::error::ClientError;
use fcp_engine::{DialogHandler, FcpConnection, FcpDialog, Outbox};
use fcp_proto::messages::{CloseConnectionDuplicateClientName, NodeHello};
use fcp_proto::{requests, FcpMessage};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A high-level FCP client.
///
/// Holds the target endpoint and the client name, connects lazily on the
/// first command, performs the greeting, and shares the live connection
/// across commands. A connection the node has since closed is replaced on
/// the next command.
pub struct FcpClient {
    host: String,
    port: u16,
    client_name: String,
    connection: Mutex<Option<Arc<FcpConnection>>>,
}

impl FcpClient {
    /// Create a client for the node at `host:port`, registering under
    /// `client_name`. No connection is made until the first command runs.
    pub fn new(host: impl Into<String>, port: u16, client_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            client_name: client_name.into(),
            connection: Mutex::new(None),
        }
    }

    /// Generate a fresh SSK key pair.
    #[must_use]
    pub fn generate_keypair(&self) -> GenerateKeypairCommand<'_> {
        GenerateKeypairCommand::new(self)
    }

    /// Fetch the content behind a URI.
    #[must_use]
    pub fn client_get(&self, uri: impl Into<String>) -> ClientGetCommand<'_> {
        ClientGetCommand::new(self, uri.into())
    }

    /// Insert content under a URI.
    #[must_use]
    pub fn client_put(&self, uri: impl Into<String>) -> ClientPutCommand<'_> {
        ClientPutCommand::new(self, uri.into())
    }

    /// List the peers the node knows.
    #[must_use]
    pub fn list_peers(&self) -> ListPeersCommand<'_> {
        ListPeersCommand::new(self)
    }

    /// Remove a peer by its node identifier, name, or `host:port`.
    #[must_use]
    pub fn remove_peer(&self, node_identifier: impl Into<String>) -> RemovePeerCommand<'_> {
        RemovePeerCommand::new(self, node_identifier.into())
    }

    /// Read the node's configuration.
    #[must_use]
    pub fn get_config(&self) -> GetConfigCommand<'_> {
        GetConfigCommand::new(self)
    }

    /// Close the cached connection, if one is live. The next command
    /// reconnects.
    pub async fn close(&self) {
        if let Some(connection) = self.connection.lock().await.take() {
            connection.close().await;
        }
    }

    /// The live connection, established (with greeting) on first use.
    pub(crate) async fn connection(&self) -> Result<Arc<FcpConnection>, ClientError> {
        let mut cached = self.connection.lock().await;
        if let Some(connection) = cached.as_ref() {
            if !connection.is_closed().await {
                return Ok(connection.clone());
            }
            *cached = None;
        }
        let connection = Arc::new(FcpConnection::new(self.host.clone(), self.port));
        connection.connect().await?;
        let greeting = FcpDialog::new(connection.clone(), GreetingHandler::default());
        let handle = greeting
            .send(requests::client_hello(&self.client_name))
            .await?;
        if !handle.wait().await? {
            connection.close().await;
            return Err(ClientError::DuplicateClientName(self.client_name.clone()));
        }
        tracing::info!(host = %self.host, port = self.port, "greeting accepted");
        *cached = Some(connection.clone());
        Ok(connection)
    }

    /// Run one dialog to completion over the shared connection.
    pub(crate) async fn run_dialog<H: DialogHandler>(
        &self,
        handler: H,
        message: FcpMessage,
    ) -> Result<H::Output, ClientError> {
        let connection = self.connection().await?;
        let dialog = FcpDialog::new(connection, handler);
        let handle = dialog.send(message).await?;
        Ok(handle.wait().await?)
    }
}

/// Resolves the greeting: `true` on `NodeHello`, `false` when the node
/// rejects the client name.
#[derive(Default)]
struct GreetingHandler {
    accepted: Option<bool>,
}

impl DialogHandler for GreetingHandler {
    type Output = bool;

    fn is_finished(&self) -> bool {
        self.accepted.is_some()
    }

    fn result(&mut self) -> bool {
        self.accepted.take().unwrap_or(false)
    }

    fn on_node_hello(&mut self, _message: &NodeHello, _out: &mut Outbox) {
        self.accepted = Some(true);
    }

    fn on_close_connection_duplicate_client_name(
        &mut self,
        _message: &CloseConnectionDuplicateClientName,
        _out: &mut Outbox,
    ) {
        self.accepted = Some(false);
    }
}
