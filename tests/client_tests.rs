//! Command-layer integration tests: greeting, fetch/insert, the full
//! direct-disk-access sequence, peer management and configuration against
//! a scripted fake node.

use fcp_client::{ClientError, FcpClient};
use fcp_integration_tests::FakeFcpNode;
use fcp_proto::FcpMessage;
use std::time::Duration;

fn test_client(node: &FakeFcpNode) -> FcpClient {
    FcpClient::new("127.0.0.1", node.port(), "integration-test")
}

// ============================================================================
// Greeting
// ============================================================================

#[tokio::test]
async fn test_first_command_performs_greeting() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        let hello = peer.expect("ClientHello").await;
        assert_eq!(hello.message.get("Name"), Some("integration-test"));
        assert_eq!(hello.message.get("ExpectedVersion"), Some("2.0"));
        peer.write_message(&FcpMessage::new("NodeHello").field("FCPVersion", "2.0"))
            .await;

        let request = peer.expect("GenerateSSK").await;
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("SSKKeypair")
                .field("Identifier", identifier)
                .field("InsertURI", "SSK@priv")
                .field("RequestURI", "SSK@pub"),
        )
        .await;
        peer
    });

    let keypair = client.generate_keypair().execute().await.unwrap();
    assert_eq!(keypair.insert_uri, "SSK@priv");
    assert_eq!(keypair.request_uri, "SSK@pub");
    node_task.await.unwrap();
}

#[tokio::test]
async fn test_duplicate_client_name_fails_the_command() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.expect("ClientHello").await;
        peer.write_message(&FcpMessage::new("CloseConnectionDuplicateClientName"))
            .await;
        peer
    });

    let err = client.generate_keypair().execute().await.unwrap_err();
    assert!(matches!(err, ClientError::DuplicateClientName(name) if name == "integration-test"));
    node_task.await.unwrap();
}

/// A cached connection the node has since closed is replaced on the next
/// command: the client reconnects, greets again, and the command resolves
/// over the fresh socket.
#[tokio::test]
async fn test_command_after_node_close_reconnects() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;
        let request = peer.expect("GenerateSSK").await;
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("SSKKeypair")
                .field("Identifier", identifier)
                .field("InsertURI", "SSK@first")
                .field("RequestURI", "SSK@first-pub"),
        )
        .await;
        peer.shutdown().await;

        let mut replacement = node.accept().await;
        replacement.answer_hello().await;
        let request = replacement.expect("GenerateSSK").await;
        let identifier = request.message.identifier().expect("identifier").to_string();
        replacement
            .write_message(
                &FcpMessage::new("SSKKeypair")
                    .field("Identifier", identifier)
                    .field("InsertURI", "SSK@second")
                    .field("RequestURI", "SSK@second-pub"),
            )
            .await;
        replacement
    });

    let first = client.generate_keypair().execute().await.unwrap();
    assert_eq!(first.insert_uri, "SSK@first");

    // Let the receive loop observe the close before the next command runs.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = client.generate_keypair().execute().await.unwrap();
    assert_eq!(second.insert_uri, "SSK@second");
    node_task.await.unwrap();
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn test_fetch_returns_the_payload() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ClientGet").await;
        assert_eq!(request.message.get("URI"), Some("KSK@hello.txt"));
        assert_eq!(request.message.get("ReturnType"), Some("direct"));
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("AllData")
                .field("Identifier", identifier)
                .field("DataLength", "6")
                .field("Metadata.ContentType", "text/plain")
                .payload(b"Hello\n".to_vec()),
        )
        .await;
        peer
    });

    let data = client
        .client_get("KSK@hello.txt")
        .execute()
        .await
        .unwrap()
        .expect("data");
    assert_eq!(data.len(), 6);
    assert_eq!(data.bytes().unwrap(), b"Hello\n");
    assert_eq!(data.content_type(), Some("text/plain"));
    node_task.await.unwrap();
}

/// Two payload-bearing replies, the first under a foreign identifier: the
/// waiting fetch must resolve with the second payload only.
#[tokio::test]
async fn test_fetch_ignores_payload_for_foreign_identifier() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ClientGet").await;
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("AllData")
                .field("Identifier", "someone-elses-request")
                .field("DataLength", "11")
                .payload(b"Hello World".to_vec()),
        )
        .await;
        peer.write_message(
            &FcpMessage::new("AllData")
                .field("Identifier", identifier)
                .field("DataLength", "6")
                .payload(b"Hello\n".to_vec()),
        )
        .await;
        peer
    });

    let data = client
        .client_get("KSK@hello.txt")
        .execute()
        .await
        .unwrap()
        .expect("data");
    assert_eq!(data.len(), 6);
    assert_eq!(data.bytes().unwrap(), b"Hello\n");
    node_task.await.unwrap();
}

#[tokio::test]
async fn test_fetch_resolves_empty_on_get_failed() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ClientGet").await;
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("GetFailed")
                .field("Identifier", identifier)
                .field("Code", "13"),
        )
        .await;
        peer
    });

    let data = client.client_get("KSK@missing").execute().await.unwrap();
    assert!(data.is_none());
    node_task.await.unwrap();
}

// ============================================================================
// Inserting
// ============================================================================

#[tokio::test]
async fn test_direct_insert_sends_payload_in_band() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ClientPut").await;
        assert_eq!(request.message.get("UploadFrom"), Some("direct"));
        assert_eq!(request.message.get("DataLength"), Some("6"));
        assert_eq!(request.message.get("TargetFilename"), Some("hello.txt"));
        let payload = request.payload.expect("payload");
        assert_eq!(payload.bytes().unwrap(), b"Hello\n");
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("PutSuccessful")
                .field("Identifier", identifier)
                .field("URI", "KSK@hello.txt"),
        )
        .await;
        peer
    });

    let key = client
        .client_put("KSK@hello.txt")
        .from_bytes(b"Hello\n".to_vec())
        .named("hello.txt")
        .execute()
        .await
        .unwrap();
    assert_eq!(key.as_deref(), Some("KSK@hello.txt"));
    node_task.await.unwrap();
}

/// The full disk-upload sequence: refusal code 25, probe, challenge with a
/// real file read, verdict, transparent retry. Replies and completions for
/// another directory are interleaved and must be ignored.
#[tokio::test]
async fn test_disk_insert_runs_the_disk_access_handshake() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let dir = tempfile::tempdir().unwrap();
    let directory = dir.path().to_str().unwrap().to_string();
    let upload = dir.path().join("upload.dat");
    std::fs::write(&upload, b"file content").unwrap();
    let challenge = dir.path().join("challenge.txt");
    std::fs::write(&challenge, b"challenge-content\n").unwrap();

    let expected_directory = directory.clone();
    let challenge_path = challenge.to_str().unwrap().to_string();
    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ClientPut").await;
        assert_eq!(request.message.get("UploadFrom"), Some("disk"));
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("ProtocolError")
                .field("Identifier", identifier.clone())
                .field("Code", "25"),
        )
        .await;

        let probe = peer.expect("TestDDARequest").await;
        assert_eq!(
            probe.message.get("Directory"),
            Some(expected_directory.as_str())
        );
        assert_eq!(probe.message.get("WantReadDirectory"), Some("true"));
        assert_eq!(probe.message.get("WantWriteDirectory"), Some("false"));

        // A challenge for an unrelated directory must be ignored.
        peer.write_message(
            &FcpMessage::new("TestDDAReply")
                .field("Directory", "/some-other-directory")
                .field("ReadFilename", "/some-other-directory/nope.txt"),
        )
        .await;
        peer.write_message(
            &FcpMessage::new("TestDDAReply")
                .field("Directory", expected_directory.clone())
                .field("ReadFilename", challenge_path),
        )
        .await;

        let response = peer.expect("TestDDAResponse").await;
        assert_eq!(
            response.message.get("Directory"),
            Some(expected_directory.as_str())
        );
        assert_eq!(
            response.message.get("ReadContent"),
            Some("challenge-content")
        );

        // A verdict for an unrelated directory must not resume the insert.
        peer.write_message(
            &FcpMessage::new("TestDDAComplete")
                .field("Directory", "/some-other-directory")
                .field("ReadDirectoryAllowed", "true"),
        )
        .await;
        peer.write_message(
            &FcpMessage::new("TestDDAComplete")
                .field("Directory", expected_directory)
                .field("ReadDirectoryAllowed", "true")
                .field("WriteDirectoryAllowed", "false"),
        )
        .await;

        // Only the matching verdict triggers the retry.
        let retry = peer.expect("ClientPut").await;
        assert_eq!(retry.message.get("UploadFrom"), Some("disk"));
        assert_eq!(retry.message.identifier(), Some(identifier.as_str()));
        peer.write_message(
            &FcpMessage::new("PutSuccessful")
                .field("Identifier", identifier)
                .field("URI", "CHK@inserted"),
        )
        .await;
        peer
    });

    let key = client
        .client_put("CHK@")
        .from_file(&upload)
        .execute()
        .await
        .unwrap();
    assert_eq!(key.as_deref(), Some("CHK@inserted"));
    node_task.await.unwrap();
}

/// Any refusal code other than 25 is terminal: the operation fails at once
/// and no probe goes out.
#[tokio::test]
async fn test_non_handshake_refusal_is_terminal() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("upload.dat");
    std::fs::write(&upload, b"file content").unwrap();

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ClientPut").await;
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("ProtocolError")
                .field("Identifier", identifier)
                .field("Code", "1")
                .field("CodeDescription", "ClientHello must be first message"),
        )
        .await;

        // Nothing else may arrive; in particular no TestDDARequest.
        let silence =
            tokio::time::timeout(Duration::from_millis(200), peer.read_message()).await;
        assert!(silence.is_err(), "client sent an unexpected message");
        peer
    });

    let err = client
        .client_put("CHK@")
        .from_file(&upload)
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Refused { code: Some(1), .. }));
    node_task.await.unwrap();
}

// ============================================================================
// Peer management and configuration
// ============================================================================

#[tokio::test]
async fn test_list_peers_collects_until_end_marker() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("ListPeers").await;
        assert_eq!(request.message.get("WithMetadata"), Some("true"));
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("Peer")
                .field("Identifier", identifier.clone())
                .field("identity", "peer-one")
                .field("myName", "alpha"),
        )
        .await;
        // A peer record from someone else's listing must be ignored.
        peer.write_message(
            &FcpMessage::new("Peer")
                .field("Identifier", "foreign-listing")
                .field("identity", "peer-foreign"),
        )
        .await;
        peer.write_message(
            &FcpMessage::new("Peer")
                .field("Identifier", identifier.clone())
                .field("identity", "peer-two")
                .field("myName", "beta"),
        )
        .await;
        peer.write_message(&FcpMessage::new("EndListPeers").field("Identifier", identifier))
            .await;
        peer
    });

    let peers = client
        .list_peers()
        .include_metadata()
        .execute()
        .await
        .unwrap();
    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].identity(), Some("peer-one"));
    assert_eq!(peers[1].identity(), Some("peer-two"));
    node_task.await.unwrap();
}

#[tokio::test]
async fn test_remove_peer_reports_unknown_peer() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("RemovePeer").await;
        assert_eq!(request.message.get("NodeIdentifier"), Some("no-such-peer"));
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("UnknownNodeIdentifier")
                .field("Identifier", identifier)
                .field("NodeIdentifier", "no-such-peer"),
        )
        .await;
        peer
    });

    let removed = client.remove_peer("no-such-peer").execute().await.unwrap();
    assert!(!removed);
    node_task.await.unwrap();
}

#[tokio::test]
async fn test_get_config_returns_current_values() {
    let node = FakeFcpNode::bind().await;
    let client = test_client(&node);

    let node_task = tokio::spawn(async move {
        let mut peer = node.accept().await;
        peer.answer_hello().await;

        let request = peer.expect("GetConfig").await;
        assert_eq!(request.message.get("WithCurrent"), Some("true"));
        let identifier = request.message.identifier().expect("identifier").to_string();
        peer.write_message(
            &FcpMessage::new("ConfigData")
                .field("Identifier", identifier)
                .field("current.node.name", "TestNode"),
        )
        .await;
        peer
    });

    let config = client.get_config().with_current().execute().await.unwrap();
    assert_eq!(config.current("node.name"), Some("TestNode"));
    node_task.await.unwrap();
}
