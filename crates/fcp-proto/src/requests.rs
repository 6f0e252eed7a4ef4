//! Builders for outgoing request messages.
//!
//! Each builder fills in the fields every use of the request needs; callers
//! add optional fields with [`FcpMessage::field`] before sending.

use crate::message::FcpMessage;
use crate::DATA_LENGTH_FIELD;

/// The greeting that must open every connection.
pub fn client_hello(name: &str) -> FcpMessage {
    FcpMessage::new("ClientHello")
        .field("Name", name)
        .field("ExpectedVersion", "2.0")
}

/// Request a fresh SSK key pair.
pub fn generate_ssk(identifier: &str) -> FcpMessage {
    FcpMessage::new("GenerateSSK").field("Identifier", identifier)
}

/// Fetch the content behind a URI, returned directly as `AllData`.
pub fn client_get(identifier: &str, uri: &str) -> FcpMessage {
    FcpMessage::new("ClientGet")
        .field("Identifier", identifier)
        .field("ReturnType", "direct")
        .field("URI", uri)
}

/// Insert content supplied in-band.
pub fn client_put_direct(identifier: &str, uri: &str, data: Vec<u8>) -> FcpMessage {
    FcpMessage::new("ClientPut")
        .field("Identifier", identifier)
        .field("URI", uri)
        .field("UploadFrom", "direct")
        .field(DATA_LENGTH_FIELD, data.len().to_string())
        .payload(data)
}

/// Insert content from a file on the node's filesystem. Requires the
/// direct-disk-access handshake when the node refuses with code 25.
pub fn client_put_disk(identifier: &str, uri: &str, filename: &str) -> FcpMessage {
    FcpMessage::new("ClientPut")
        .field("Identifier", identifier)
        .field("URI", uri)
        .field("UploadFrom", "disk")
        .field("Filename", filename)
}

/// Insert a redirect to another URI.
pub fn client_put_redirect(identifier: &str, uri: &str, target: &str) -> FcpMessage {
    FcpMessage::new("ClientPut")
        .field("Identifier", identifier)
        .field("URI", uri)
        .field("UploadFrom", "redirect")
        .field("TargetURI", target)
}

/// List all peers the node knows.
pub fn list_peers(identifier: &str, with_metadata: bool, with_volatile: bool) -> FcpMessage {
    FcpMessage::new("ListPeers")
        .field("Identifier", identifier)
        .field("WithVolatile", bool_str(with_volatile))
        .field("WithMetadata", bool_str(with_metadata))
}

/// Show a single peer.
pub fn list_peer(identifier: &str, node_identifier: &str) -> FcpMessage {
    FcpMessage::new("ListPeer")
        .field("Identifier", identifier)
        .field("NodeIdentifier", node_identifier)
}

/// List the notes attached to a peer.
pub fn list_peer_notes(identifier: &str, node_identifier: &str) -> FcpMessage {
    FcpMessage::new("ListPeerNotes")
        .field("Identifier", identifier)
        .field("NodeIdentifier", node_identifier)
}

/// Add a peer from a node reference URL.
pub fn add_peer_from_url(identifier: &str, url: &str) -> FcpMessage {
    FcpMessage::new("AddPeer")
        .field("Identifier", identifier)
        .field("URL", url)
}

/// Add a peer from a node reference file readable by the node.
pub fn add_peer_from_file(identifier: &str, file: &str) -> FcpMessage {
    FcpMessage::new("AddPeer")
        .field("Identifier", identifier)
        .field("File", file)
}

/// Modify a peer's flags.
pub fn modify_peer(identifier: &str, node_identifier: &str) -> FcpMessage {
    FcpMessage::new("ModifyPeer")
        .field("Identifier", identifier)
        .field("NodeIdentifier", node_identifier)
}

/// Remove a peer.
pub fn remove_peer(identifier: &str, node_identifier: &str) -> FcpMessage {
    FcpMessage::new("RemovePeer")
        .field("Identifier", identifier)
        .field("NodeIdentifier", node_identifier)
}

/// Probe whether the client may access a directory on the node's
/// filesystem. Step one of the direct-disk-access handshake.
pub fn test_dda_request(directory: &str, want_read: bool, want_write: bool) -> FcpMessage {
    FcpMessage::new("TestDDARequest")
        .field("Directory", directory)
        .field("WantReadDirectory", bool_str(want_read))
        .field("WantWriteDirectory", bool_str(want_write))
}

/// Answer the node's direct-disk-access challenge with the content read
/// from the challenge file.
pub fn test_dda_response(directory: &str, read_content: &str) -> FcpMessage {
    FcpMessage::new("TestDDAResponse")
        .field("Directory", directory)
        .field("ReadContent", read_content)
}

/// Read the node's configuration.
pub fn get_config(identifier: &str) -> FcpMessage {
    FcpMessage::new("GetConfig").field("Identifier", identifier)
}

/// Subscribe to updates for requests on the global queue.
pub fn watch_global(enabled: bool) -> FcpMessage {
    FcpMessage::new("WatchGlobal").field("Enabled", bool_str(enabled))
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
