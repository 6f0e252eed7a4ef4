//! Classification of incoming messages.

use crate::message::{FcpMessage, ReceivedMessage};
use crate::messages::{
    AllData, CloseConnectionDuplicateClientName, ConfigData, DataFound, EndListPeerNotes,
    EndListPeers, GetFailed, IdentifierCollision, NodeData, NodeHello, Peer, PeerNote,
    PeerRemoved, ProtocolError, PutFailed, PutFetchable, PutSuccessful, SimpleProgress,
    SskKeypair, TestDdaComplete, TestDdaReply, UnknownNodeIdentifier, UriGenerated,
};

/// A received message classified into one of the known kinds.
///
/// The classification is a single lookup on the message name; kinds this
/// client does not model land in [`Unrecognized`](FcpReply::Unrecognized)
/// with the raw message intact.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum FcpReply {
    NodeHello(NodeHello),
    CloseConnectionDuplicateClientName(CloseConnectionDuplicateClientName),
    SskKeypair(SskKeypair),
    ProtocolError(ProtocolError),
    IdentifierCollision(IdentifierCollision),
    UnknownNodeIdentifier(UnknownNodeIdentifier),
    Peer(Peer),
    EndListPeers(EndListPeers),
    PeerNote(PeerNote),
    EndListPeerNotes(EndListPeerNotes),
    PeerRemoved(PeerRemoved),
    NodeData(NodeData),
    ConfigData(ConfigData),
    TestDdaReply(TestDdaReply),
    TestDdaComplete(TestDdaComplete),
    UriGenerated(UriGenerated),
    DataFound(DataFound),
    AllData(AllData),
    GetFailed(GetFailed),
    PutFailed(PutFailed),
    PutSuccessful(PutSuccessful),
    PutFetchable(PutFetchable),
    SimpleProgress(SimpleProgress),
    Unrecognized(FcpMessage),
}

impl FcpReply {
    /// Classify a decoded message by its name.
    pub fn classify(received: ReceivedMessage) -> Self {
        let ReceivedMessage { message, payload } = received;
        match message.name() {
            "NodeHello" => Self::NodeHello(NodeHello::from_message(message)),
            "CloseConnectionDuplicateClientName" => Self::CloseConnectionDuplicateClientName(
                CloseConnectionDuplicateClientName::from_message(message),
            ),
            "SSKKeypair" => Self::SskKeypair(SskKeypair::from_message(message)),
            "ProtocolError" => Self::ProtocolError(ProtocolError::from_message(message)),
            "IdentifierCollision" => {
                Self::IdentifierCollision(IdentifierCollision::from_message(message))
            }
            "UnknownNodeIdentifier" => {
                Self::UnknownNodeIdentifier(UnknownNodeIdentifier::from_message(message))
            }
            "Peer" => Self::Peer(Peer::from_message(message)),
            "EndListPeers" => Self::EndListPeers(EndListPeers::from_message(message)),
            "PeerNote" => Self::PeerNote(PeerNote::from_message(message)),
            "EndListPeerNotes" => {
                Self::EndListPeerNotes(EndListPeerNotes::from_message(message))
            }
            "PeerRemoved" => Self::PeerRemoved(PeerRemoved::from_message(message)),
            "NodeData" => Self::NodeData(NodeData::from_message(message)),
            "ConfigData" => Self::ConfigData(ConfigData::from_message(message)),
            "TestDDAReply" => Self::TestDdaReply(TestDdaReply::from_message(message)),
            "TestDDAComplete" => Self::TestDdaComplete(TestDdaComplete::from_message(message)),
            "URIGenerated" => Self::UriGenerated(UriGenerated::from_message(message)),
            "DataFound" => Self::DataFound(DataFound::from_message(message)),
            "AllData" => Self::AllData(AllData::from_message(message, payload)),
            "GetFailed" => Self::GetFailed(GetFailed::from_message(message)),
            "PutFailed" => Self::PutFailed(PutFailed::from_message(message)),
            "PutSuccessful" => Self::PutSuccessful(PutSuccessful::from_message(message)),
            "PutFetchable" => Self::PutFetchable(PutFetchable::from_message(message)),
            "SimpleProgress" => Self::SimpleProgress(SimpleProgress::from_message(message)),
            _ => Self::Unrecognized(message),
        }
    }

    /// The wire name of the classified message.
    pub fn name(&self) -> &str {
        match self {
            Self::NodeHello(_) => "NodeHello",
            Self::CloseConnectionDuplicateClientName(_) => "CloseConnectionDuplicateClientName",
            Self::SskKeypair(_) => "SSKKeypair",
            Self::ProtocolError(_) => "ProtocolError",
            Self::IdentifierCollision(_) => "IdentifierCollision",
            Self::UnknownNodeIdentifier(_) => "UnknownNodeIdentifier",
            Self::Peer(_) => "Peer",
            Self::EndListPeers(_) => "EndListPeers",
            Self::PeerNote(_) => "PeerNote",
            Self::EndListPeerNotes(_) => "EndListPeerNotes",
            Self::PeerRemoved(_) => "PeerRemoved",
            Self::NodeData(_) => "NodeData",
            Self::ConfigData(_) => "ConfigData",
            Self::TestDdaReply(_) => "TestDDAReply",
            Self::TestDdaComplete(_) => "TestDDAComplete",
            Self::UriGenerated(_) => "URIGenerated",
            Self::DataFound(_) => "DataFound",
            Self::AllData(_) => "AllData",
            Self::GetFailed(_) => "GetFailed",
            Self::PutFailed(_) => "PutFailed",
            Self::PutSuccessful(_) => "PutSuccessful",
            Self::PutFetchable(_) => "PutFetchable",
            Self::SimpleProgress(_) => "SimpleProgress",
            Self::Unrecognized(message) => message.name(),
        }
    }
}
