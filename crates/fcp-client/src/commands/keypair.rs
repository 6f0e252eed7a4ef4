//! SSK key-pair generation.

use crate::client::FcpClient;
use crate::error::ClientError;
use crate::identifier::RandomIdentifierGenerator;
use fcp_engine::{DialogError, DialogHandler, Outbox};
use fcp_proto::messages::{ProtocolError, SskKeypair};
use fcp_proto::requests;

/// A generated SSK key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcpKeyPair {
    /// The private URI data is inserted under.
    pub insert_uri: String,
    /// The public URI data is fetched under.
    pub request_uri: String,
}

/// Builder for the `GenerateSSK` operation.
pub struct GenerateKeypairCommand<'a> {
    client: &'a FcpClient,
}

impl<'a> GenerateKeypairCommand<'a> {
    pub(crate) fn new(client: &'a FcpClient) -> Self {
        Self { client }
    }

    /// Run the operation.
    ///
    /// # Errors
    ///
    /// Connection establishment and greeting failures, a node refusal, or
    /// connection closure before the key pair arrived.
    pub async fn execute(self) -> Result<FcpKeyPair, ClientError> {
        let identifier = RandomIdentifierGenerator::generate("generate-ssk");
        let handler = KeypairHandler {
            identifier: identifier.clone(),
            outcome: None,
        };
        self.client
            .run_dialog(handler, requests::generate_ssk(&identifier))
            .await?
    }
}

struct KeypairHandler {
    identifier: String,
    outcome: Option<Result<FcpKeyPair, ClientError>>,
}

impl DialogHandler for KeypairHandler {
    type Output = Result<FcpKeyPair, ClientError>;

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn result(&mut self) -> Self::Output {
        self.outcome
            .take()
            .unwrap_or(Err(ClientError::Dialog(DialogError::Abandoned)))
    }

    fn on_ssk_keypair(&mut self, message: &SskKeypair, _out: &mut Outbox) {
        if message.identifier() != Some(self.identifier.as_str()) {
            return;
        }
        self.outcome = Some(Ok(FcpKeyPair {
            insert_uri: message.insert_uri().unwrap_or_default().to_string(),
            request_uri: message.request_uri().unwrap_or_default().to_string(),
        }));
    }

    fn on_protocol_error(&mut self, message: &ProtocolError, _out: &mut Outbox) {
        if message.identifier() != Some(self.identifier.as_str()) {
            return;
        }
        self.outcome = Some(Err(ClientError::refused(message)));
    }
}
