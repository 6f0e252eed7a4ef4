//! Node configuration access.

use crate::client::FcpClient;
use crate::error::ClientError;
use crate::identifier::RandomIdentifierGenerator;
use fcp_engine::{DialogError, DialogHandler, Outbox};
use fcp_proto::messages::{ConfigData, ProtocolError};
use fcp_proto::requests;

/// Builder for the `GetConfig` operation.
pub struct GetConfigCommand<'a> {
    client: &'a FcpClient,
    with_current: bool,
    with_defaults: bool,
    with_short_description: bool,
    with_expert_flag: bool,
}

impl<'a> GetConfigCommand<'a> {
    pub(crate) fn new(client: &'a FcpClient) -> Self {
        Self {
            client,
            with_current: false,
            with_defaults: false,
            with_short_description: false,
            with_expert_flag: false,
        }
    }

    /// Include the current values.
    #[must_use]
    pub fn with_current(mut self) -> Self {
        self.with_current = true;
        self
    }

    /// Include the default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.with_defaults = true;
        self
    }

    /// Include the short descriptions.
    #[must_use]
    pub fn with_short_descriptions(mut self) -> Self {
        self.with_short_description = true;
        self
    }

    /// Include each option's expert flag.
    #[must_use]
    pub fn with_expert_flags(mut self) -> Self {
        self.with_expert_flag = true;
        self
    }

    /// Run the query.
    ///
    /// # Errors
    ///
    /// Connection establishment failure, a node refusal, or closure before
    /// the configuration arrived.
    pub async fn execute(self) -> Result<ConfigData, ClientError> {
        let identifier = RandomIdentifierGenerator::generate("get-config");
        let mut message = requests::get_config(&identifier);
        if self.with_current {
            message.set("WithCurrent", "true");
        }
        if self.with_defaults {
            message.set("WithDefaults", "true");
        }
        if self.with_short_description {
            message.set("WithShortDescription", "true");
        }
        if self.with_expert_flag {
            message.set("WithExpertFlag", "true");
        }
        let handler = ConfigHandler {
            identifier: identifier.clone(),
            outcome: None,
        };
        self.client.run_dialog(handler, message).await?
    }
}

struct ConfigHandler {
    identifier: String,
    outcome: Option<Result<ConfigData, ClientError>>,
}

impl DialogHandler for ConfigHandler {
    type Output = Result<ConfigData, ClientError>;

    fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn result(&mut self) -> Self::Output {
        self.outcome
            .take()
            .unwrap_or(Err(ClientError::Dialog(DialogError::Abandoned)))
    }

    fn on_config_data(&mut self, message: &ConfigData, _out: &mut Outbox) {
        if message.identifier() == Some(self.identifier.as_str()) {
            self.outcome = Some(Ok(message.clone()));
        }
    }

    fn on_protocol_error(&mut self, message: &ProtocolError, _out: &mut Outbox) {
        if message.identifier() == Some(self.identifier.as_str()) {
            self.outcome = Some(Err(ClientError::refused(message)));
        }
    }
}
