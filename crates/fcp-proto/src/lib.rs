//! # FCP wire format
//!
//! Framing and message types for FCP, the line-oriented control protocol
//! spoken by peer-to-peer storage nodes.
//!
//! This crate provides:
//! - [`FcpMessage`], the ordered name/field record every exchange is made of
//! - The text framing codec ([`codec`]), including the in-band binary
//!   payload exception
//! - [`Payload`], a spooled view of received payload bytes
//! - A typed catalogue of incoming message kinds ([`messages`]) and builders
//!   for outgoing requests ([`requests`])
//! - [`FcpReply`], the closed classification of incoming messages
//!
//! ## Wire format
//!
//! ```text
//! MessageName
//! Key=Value
//! OtherKey=OtherValue
//! EndMessage
//! ```
//!
//! A payload-bearing message ends with `Data` instead of `EndMessage`,
//! followed immediately by exactly `DataLength` raw bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod message;
pub mod messages;
pub mod payload;
pub mod reply;
pub mod requests;

mod error;

pub use error::CodecError;
pub use message::{FcpMessage, ReceivedMessage};
pub use payload::Payload;
pub use reply::FcpReply;

/// The default TCP port a node listens on for FCP.
pub const DEFAULT_PORT: u16 = 9481;

/// Terminator line for header-only messages.
pub const END_MESSAGE: &str = "EndMessage";

/// Terminator line introducing raw payload bytes.
pub const DATA: &str = "Data";

/// The field correlating a request with its replies.
pub const IDENTIFIER_FIELD: &str = "Identifier";

/// The field declaring a payload's byte length.
pub const DATA_LENGTH_FIELD: &str = "DataLength";

/// `ProtocolError` code meaning "complete the direct-disk-access handshake
/// and retry".
pub const DDA_REFUSAL_CODE: u32 = 25;
