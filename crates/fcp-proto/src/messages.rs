//! Typed views over incoming message kinds.
//!
//! Each kind is a thin, immutable view over the flat field map of an
//! [`FcpMessage`] - pure data, no behavior. Numeric and flag fields are
//! carried as strings on the wire; the accessors here parse them on demand.

use crate::message::FcpMessage;
use crate::payload::Payload;
use std::sync::Arc;

macro_rules! message_view {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            message: FcpMessage,
        }

        impl $name {
            /// Wrap a raw message. The caller is responsible for having
            /// checked the message name.
            pub fn from_message(message: FcpMessage) -> Self {
                Self { message }
            }

            /// Raw field access.
            pub fn get(&self, key: &str) -> Option<&str> {
                self.message.get(key)
            }

            /// The `Identifier` the node echoed, if any.
            pub fn identifier(&self) -> Option<&str> {
                self.message.identifier()
            }
        }
    };
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("true"))
}

message_view! {
    /// The node's greeting, answering `ClientHello`.
    NodeHello
}

impl NodeHello {
    /// The FCP version the node speaks.
    pub fn fcp_version(&self) -> Option<&str> {
        self.get("FCPVersion")
    }

    /// The node's software name.
    pub fn node(&self) -> Option<&str> {
        self.get("Node")
    }

    /// The connection identifier assigned by the node.
    pub fn connection_identifier(&self) -> Option<&str> {
        self.get("ConnectionIdentifier")
    }

    /// The node's build number.
    pub fn build(&self) -> Option<u32> {
        self.get("Build").and_then(|v| v.parse().ok())
    }
}

message_view! {
    /// The node is about to terminate this connection because another client
    /// already registered the same name.
    CloseConnectionDuplicateClientName
}

message_view! {
    /// A freshly generated SSK key pair.
    SskKeypair
}

impl SskKeypair {
    /// The private (insert) URI.
    pub fn insert_uri(&self) -> Option<&str> {
        self.get("InsertURI")
    }

    /// The public (request) URI.
    pub fn request_uri(&self) -> Option<&str> {
        self.get("RequestURI")
    }
}

message_view! {
    /// A well-formed refusal from the node, optionally naming the offending
    /// identifier. Code 25 means "complete the direct-disk-access handshake
    /// and retry".
    ProtocolError
}

impl ProtocolError {
    /// The numeric error code.
    pub fn code(&self) -> Option<u32> {
        self.get("Code").and_then(|v| v.parse().ok())
    }

    /// Human-readable description of the code.
    pub fn code_description(&self) -> Option<&str> {
        self.get("CodeDescription")
    }

    /// Additional details, if the node supplied any.
    pub fn extra_description(&self) -> Option<&str> {
        self.get("ExtraDescription")
    }

    /// Whether the node flagged the error as fatal.
    pub fn is_fatal(&self) -> bool {
        parse_bool(self.get("Fatal"))
    }
}

message_view! {
    /// A request reused an identifier that is still in flight.
    IdentifierCollision
}

message_view! {
    /// A peer-management operation referenced a non-existent peer.
    UnknownNodeIdentifier
}

impl UnknownNodeIdentifier {
    /// The identifier that did not match any peer.
    pub fn node_identifier(&self) -> Option<&str> {
        self.get("NodeIdentifier")
    }
}

message_view! {
    /// One peer record in a `ListPeers` reply.
    Peer
}

impl Peer {
    /// The peer's public identity.
    pub fn identity(&self) -> Option<&str> {
        self.get("identity")
    }

    /// The name the operator gave this peer.
    pub fn my_name(&self) -> Option<&str> {
        self.get("myName")
    }
}

message_view! {
    /// Marks the end of a peer list.
    EndListPeers
}

message_view! {
    /// One note attached to a peer.
    PeerNote
}

impl PeerNote {
    /// The peer the note belongs to.
    pub fn node_identifier(&self) -> Option<&str> {
        self.get("NodeIdentifier")
    }

    /// The note text as carried on the wire.
    pub fn note_text(&self) -> Option<&str> {
        self.get("NoteText")
    }

    /// The note type.
    pub fn peer_note_type(&self) -> Option<u32> {
        self.get("PeerNoteType").and_then(|v| v.parse().ok())
    }
}

message_view! {
    /// Marks the end of a peer-note list.
    EndListPeerNotes
}

message_view! {
    /// Confirms that a peer was removed.
    PeerRemoved
}

impl PeerRemoved {
    /// The removed peer's identifier.
    pub fn node_identifier(&self) -> Option<&str> {
        self.get("NodeIdentifier")
    }
}

message_view! {
    /// The node's own reference data.
    NodeData
}

message_view! {
    /// Node configuration, answering `GetConfig`.
    ConfigData
}

impl ConfigData {
    /// Look up a current configuration value.
    pub fn current(&self, key: &str) -> Option<&str> {
        let key = format!("current.{key}");
        self.message.get(&key)
    }

    /// All configuration fields in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.message.fields()
    }
}

message_view! {
    /// The node's challenge in the direct-disk-access handshake: a file to
    /// read and, optionally, a file and content to write.
    TestDdaReply
}

impl TestDdaReply {
    /// The directory the probe was for.
    pub fn directory(&self) -> Option<&str> {
        self.get("Directory")
    }

    /// The file whose first line must be read back to the node.
    pub fn read_filename(&self) -> Option<&str> {
        self.get("ReadFilename")
    }

    /// The file the supplied content must be written to.
    pub fn write_filename(&self) -> Option<&str> {
        self.get("WriteFilename")
    }

    /// The content to write to [`write_filename`](Self::write_filename).
    pub fn content_to_write(&self) -> Option<&str> {
        self.get("ContentToWrite")
    }
}

message_view! {
    /// The node's verdict closing the direct-disk-access handshake.
    TestDdaComplete
}

impl TestDdaComplete {
    /// The directory the verdict applies to.
    pub fn directory(&self) -> Option<&str> {
        self.get("Directory")
    }

    /// Whether reading from the directory was granted.
    pub fn read_directory_allowed(&self) -> bool {
        parse_bool(self.get("ReadDirectoryAllowed"))
    }

    /// Whether writing to the directory was granted.
    pub fn write_directory_allowed(&self) -> bool {
        parse_bool(self.get("WriteDirectoryAllowed"))
    }
}

message_view! {
    /// The URI an insert will be (or was) published under.
    UriGenerated
}

impl UriGenerated {
    /// The generated URI.
    pub fn uri(&self) -> Option<&str> {
        self.get("URI")
    }
}

message_view! {
    /// A fetch located the requested data; the payload follows in `AllData`.
    DataFound
}

impl DataFound {
    /// The length of the located data.
    pub fn data_length(&self) -> Option<u64> {
        self.message.data_length()
    }

    /// The MIME type recorded in the data's metadata.
    pub fn content_type(&self) -> Option<&str> {
        self.get("Metadata.ContentType")
    }
}

message_view! {
    /// A fetch failed.
    GetFailed
}

impl GetFailed {
    /// The failure code.
    pub fn code(&self) -> Option<u32> {
        self.get("Code").and_then(|v| v.parse().ok())
    }

    /// Short description of the failure code.
    pub fn short_code_description(&self) -> Option<&str> {
        self.get("ShortCodeDescription")
    }
}

message_view! {
    /// An insert failed.
    PutFailed
}

impl PutFailed {
    /// The failure code.
    pub fn code(&self) -> Option<u32> {
        self.get("Code").and_then(|v| v.parse().ok())
    }
}

message_view! {
    /// An insert completed.
    PutSuccessful
}

impl PutSuccessful {
    /// The URI the data was inserted under.
    pub fn uri(&self) -> Option<&str> {
        self.get("URI")
    }
}

message_view! {
    /// An insert has progressed far enough to be fetchable.
    PutFetchable
}

impl PutFetchable {
    /// The URI the data is fetchable under.
    pub fn uri(&self) -> Option<&str> {
        self.get("URI")
    }
}

message_view! {
    /// Progress notification for a running request.
    SimpleProgress
}

impl SimpleProgress {
    fn number(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Total number of blocks.
    pub fn total(&self) -> Option<u64> {
        self.number("Total")
    }

    /// Blocks required for completion.
    pub fn required(&self) -> Option<u64> {
        self.number("Required")
    }

    /// Blocks fetched or inserted so far.
    pub fn succeeded(&self) -> Option<u64> {
        self.number("Succeeded")
    }

    /// Blocks that failed so far.
    pub fn failed(&self) -> Option<u64> {
        self.number("Failed")
    }

    /// Blocks that failed fatally.
    pub fn fatally_failed(&self) -> Option<u64> {
        self.number("FatallyFailed")
    }

    /// Whether the total is final.
    pub fn finalized_total(&self) -> bool {
        parse_bool(self.get("FinalizedTotal"))
    }
}

/// The payload-bearing completion of a fetch.
///
/// Unlike the header-only views, `AllData` carries the spooled payload
/// alongside its fields.
#[derive(Debug, Clone)]
pub struct AllData {
    message: FcpMessage,
    payload: Option<Arc<Payload>>,
}

impl AllData {
    /// Wrap a raw message and its spooled payload.
    pub fn from_message(message: FcpMessage, payload: Option<Arc<Payload>>) -> Self {
        Self { message, payload }
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.message.get(key)
    }

    /// The `Identifier` the node echoed, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.message.identifier()
    }

    /// The declared payload length.
    pub fn data_length(&self) -> Option<u64> {
        self.message.data_length()
    }

    /// The MIME type recorded in the data's metadata.
    pub fn content_type(&self) -> Option<&str> {
        self.get("Metadata.ContentType")
    }

    /// The spooled payload.
    pub fn payload(&self) -> Option<&Arc<Payload>> {
        self.payload.as_ref()
    }
}
