//! Property-based tests for the wire codec.
//!
//! Uses proptest to verify framing invariants across large input spaces.

use fcp_proto::{codec, FcpMessage};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime")
        .block_on(future)
}

async fn decode(bytes: &[u8]) -> Result<fcp_proto::ReceivedMessage, fcp_proto::CodecError> {
    let mut reader = bytes;
    codec::read_message(&mut reader).await
}

/// A protocol keyword: never empty, never a terminator line.
fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,20}"
        .prop_filter("terminator keywords are not message names", |name| {
            name != "EndMessage" && name != "Data"
        })
}

/// Unique keys without `=`, printable values (which may contain `=`).
fn fields_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[A-Za-z][A-Za-z0-9.]{0,15}", "[ -~]{0,40}", 0..8)
}

proptest! {
    /// Header-only messages survive encode-then-decode with name and every
    /// field intact.
    #[test]
    fn header_round_trip(name in name_strategy(), fields in fields_strategy()) {
        let mut message = FcpMessage::new(name.clone());
        for (key, value) in &fields {
            message.set(key.clone(), value.clone());
        }
        let encoded = codec::encode(&message);

        let received = block_on(decode(&encoded)).expect("decode");
        prop_assert_eq!(received.message.name(), name.as_str());
        for (key, value) in &fields {
            prop_assert_eq!(received.message.get(key), Some(value.as_str()));
        }
        prop_assert!(received.payload.is_none());
    }

    /// A declared payload reads back byte for byte, and the stream position
    /// after it is exactly the next message boundary.
    #[test]
    fn payload_round_trip(
        name in name_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let message = FcpMessage::new(name)
            .field("DataLength", payload.len().to_string())
            .payload(payload.clone());

        let mut encoded = codec::encode(&message);
        encoded.extend_from_slice(b"EndListPeers\nEndMessage\n");

        block_on(async {
            let mut reader = &encoded[..];
            let first = codec::read_message(&mut reader).await.expect("decode payload");
            let spooled = first.payload.expect("payload");
            assert_eq!(spooled.len(), payload.len() as u64);
            assert_eq!(spooled.bytes().unwrap(), payload);

            let second = codec::read_message(&mut reader).await.expect("framing held");
            assert_eq!(second.message.name(), "EndListPeers");
        });
    }

    /// The identifier convention round-trips unchanged through the wire.
    #[test]
    fn identifier_round_trips(identifier in "[A-Za-z0-9-]{1,32}") {
        let message = FcpMessage::new("ClientGet").field("Identifier", identifier.clone());
        let received = block_on(decode(&codec::encode(&message))).expect("decode");
        prop_assert_eq!(received.message.identifier(), Some(identifier.as_str()));
    }

    /// Arbitrary bytes produce a message or a decode error, never a panic.
    #[test]
    fn decoder_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = block_on(decode(&bytes));
    }
}
