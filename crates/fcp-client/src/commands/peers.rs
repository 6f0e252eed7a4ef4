//! Peer management.

use crate::client::FcpClient;
use crate::error::ClientError;
use crate::identifier::RandomIdentifierGenerator;
use fcp_engine::{DialogError, DialogHandler, Outbox};
use fcp_proto::messages::{
    EndListPeers, Peer, PeerRemoved, ProtocolError, UnknownNodeIdentifier,
};
use fcp_proto::requests;

/// Builder for the `ListPeers` operation.
pub struct ListPeersCommand<'a> {
    client: &'a FcpClient,
    with_metadata: bool,
    with_volatile: bool,
}

impl<'a> ListPeersCommand<'a> {
    pub(crate) fn new(client: &'a FcpClient) -> Self {
        Self {
            client,
            with_metadata: false,
            with_volatile: false,
        }
    }

    /// Include each peer's metadata fields.
    #[must_use]
    pub fn include_metadata(mut self) -> Self {
        self.with_metadata = true;
        self
    }

    /// Include each peer's volatile statistics.
    #[must_use]
    pub fn include_volatile(mut self) -> Self {
        self.with_volatile = true;
        self
    }

    /// Run the listing.
    ///
    /// # Errors
    ///
    /// Connection establishment failure, a node refusal, or closure before
    /// the list ended.
    pub async fn execute(self) -> Result<Vec<Peer>, ClientError> {
        let identifier = RandomIdentifierGenerator::generate("list-peers");
        let handler = ListPeersHandler {
            identifier: identifier.clone(),
            peers: Vec::new(),
            outcome: None,
        };
        self.client
            .run_dialog(
                handler,
                requests::list_peers(&identifier, self.with_metadata, self.with_volatile),
            )
            .await?
    }
}

struct ListPeersHandler {
    identifier: String,
    peers: Vec<Peer>,
    outcome: Option<Result<Vec<Peer>, ClientError>>,
}

impl ListPeersHandler {
    fn matches(&self, identifier: Option<&str>) -> bool {
        identifier == Some(self.identifier.as_str())
    }
}

impl DialogHandler for ListPeersHandler {
    type Output = Result<Vec<Peer>, ClientError>;

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn result(&mut self) -> Self::Output {
        self.outcome
            .take()
            .unwrap_or(Err(ClientError::Dialog(DialogError::Abandoned)))
    }

    fn on_peer(&mut self, message: &Peer, _out: &mut Outbox) {
        if self.matches(message.identifier()) {
            self.peers.push(message.clone());
        }
    }

    fn on_end_list_peers(&mut self, message: &EndListPeers, _out: &mut Outbox) {
        if self.matches(message.identifier()) {
            self.outcome = Some(Ok(std::mem::take(&mut self.peers)));
        }
    }

    fn on_protocol_error(&mut self, message: &ProtocolError, _out: &mut Outbox) {
        if self.matches(message.identifier()) {
            self.outcome = Some(Err(ClientError::refused(message)));
        }
    }
}

/// Builder for the `RemovePeer` operation.
pub struct RemovePeerCommand<'a> {
    client: &'a FcpClient,
    node_identifier: String,
}

impl<'a> RemovePeerCommand<'a> {
    pub(crate) fn new(client: &'a FcpClient, node_identifier: String) -> Self {
        Self {
            client,
            node_identifier,
        }
    }

    /// Run the removal. Resolves to `false` when the node knows no such
    /// peer.
    ///
    /// # Errors
    ///
    /// Connection establishment failure, a node refusal, or closure before
    /// a verdict.
    pub async fn execute(self) -> Result<bool, ClientError> {
        let identifier = RandomIdentifierGenerator::generate("remove-peer");
        let handler = RemovePeerHandler {
            identifier: identifier.clone(),
            outcome: None,
        };
        self.client
            .run_dialog(
                handler,
                requests::remove_peer(&identifier, &self.node_identifier),
            )
            .await?
    }
}

struct RemovePeerHandler {
    identifier: String,
    outcome: Option<Result<bool, ClientError>>,
}

impl RemovePeerHandler {
    fn matches(&self, identifier: Option<&str>) -> bool {
        identifier == Some(self.identifier.as_str())
    }
}

impl DialogHandler for RemovePeerHandler {
    type Output = Result<bool, ClientError>;

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn result(&mut self) -> Self::Output {
        self.outcome
            .take()
            .unwrap_or(Err(ClientError::Dialog(DialogError::Abandoned)))
    }

    fn on_peer_removed(&mut self, message: &PeerRemoved, _out: &mut Outbox) {
        if self.matches(message.identifier()) {
            self.outcome = Some(Ok(true));
        }
    }

    fn on_unknown_node_identifier(
        &mut self,
        message: &UnknownNodeIdentifier,
        _out: &mut Outbox,
    ) {
        if self.matches(message.identifier()) {
            self.outcome = Some(Ok(false));
        }
    }

    fn on_protocol_error(&mut self, message: &ProtocolError, _out: &mut Outbox) {
        if self.matches(message.identifier()) {
            self.outcome = Some(Err(ClientError::refused(message)));
        }
    }
}
