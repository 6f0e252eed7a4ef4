//! The FCP message record.

use crate::payload::Payload;
use crate::{DATA_LENGTH_FIELD, IDENTIFIER_FIELD};
use std::sync::Arc;

/// An FCP message: a name, an ordered list of `key=value` fields, and an
/// optional outgoing binary payload.
///
/// Field insertion order is preserved for wire fidelity and a key is unique
/// within a message. Messages are built with the chained [`field`] setters
/// and are not mutated after being handed to the codec.
///
/// [`field`]: FcpMessage::field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcpMessage {
    name: String,
    fields: Vec<(String, String)>,
    payload: Option<Vec<u8>>,
}

impl FcpMessage {
    /// Create a new message with the given protocol keyword as its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            payload: None,
        }
    }

    /// Add a field, replacing the value in place if the key already exists.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field on an existing message.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Attach an outgoing payload. The producer must also set
    /// [`DataLength`](crate::DATA_LENGTH_FIELD) to the payload's byte
    /// length; the codec does not verify the two agree.
    #[must_use]
    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = Some(data);
        self
    }

    /// The message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over the fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The attached outgoing payload, if any.
    pub fn payload_bytes(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// The client-chosen `Identifier` field, if present.
    pub fn identifier(&self) -> Option<&str> {
        self.get(IDENTIFIER_FIELD)
    }

    /// The declared `DataLength` field, parsed.
    pub fn data_length(&self) -> Option<u64> {
        self.get(DATA_LENGTH_FIELD).and_then(|v| v.parse().ok())
    }
}

/// A message decoded off the wire, with its payload (when the terminator was
/// `Data`) already drained from the stream and spooled.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// The decoded header.
    pub message: FcpMessage,
    /// The spooled payload for payload-bearing message kinds.
    pub payload: Option<Arc<Payload>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_preserve_insertion_order() {
        let message = FcpMessage::new("ClientGet")
            .field("URI", "KSK@foo.txt")
            .field("Identifier", "test-1")
            .field("ReturnType", "direct");
        let keys: Vec<&str> = message.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["URI", "Identifier", "ReturnType"]);
    }

    #[test]
    fn test_duplicate_key_replaces_in_place() {
        let message = FcpMessage::new("ClientPut")
            .field("Verbosity", "0")
            .field("URI", "KSK@foo.txt")
            .field("Verbosity", "1");
        assert_eq!(message.get("Verbosity"), Some("1"));
        let keys: Vec<&str> = message.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Verbosity", "URI"]);
    }

    #[test]
    fn test_identifier_accessor() {
        let message = FcpMessage::new("ClientGet").field("Identifier", "abc");
        assert_eq!(message.identifier(), Some("abc"));
        assert_eq!(FcpMessage::new("NodeHello").identifier(), None);
    }

    #[test]
    fn test_data_length_parses() {
        let message = FcpMessage::new("AllData").field("DataLength", "6");
        assert_eq!(message.data_length(), Some(6));
        let bad = FcpMessage::new("AllData").field("DataLength", "six");
        assert_eq!(bad.data_length(), None);
    }
}
