//! # FCP protocol engine
//!
//! The client side of FCP's multiplexed message stream: one persistent TCP
//! connection, several logical operations in flight, replies correlated by
//! an opaque identifier the client chose.
//!
//! This crate provides:
//! - [`FcpConnection`] - owns the socket, runs the single receive loop, and
//!   fans every incoming message out to all registered observers
//! - [`FcpListener`] - the observer interface
//! - [`FcpDialog`] - the reply correlator turning the push stream into one
//!   result per logical operation
//! - [`DdaSession`] - the direct-disk-access permission handshake
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FcpDialog (× N)                        │
//! │  per-operation handler: typed hooks, completion predicate,   │
//! │  single-resolution result handle                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │                        FcpConnection                          │
//! │  one socket, one receive loop, observer fan-out in           │
//! │  registration order, serialized sends                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │                        fcp-proto codec                        │
//! │  text framing, in-band payload spooling                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod counters;
pub mod dda;
pub mod dialog;
pub mod listener;

mod error;

pub use connection::FcpConnection;
pub use counters::MessageCounters;
pub use dda::{DdaSession, DdaVerdict, FAILED_TO_READ};
pub use dialog::{DialogHandler, DialogHandle, FcpDialog, Outbox};
pub use error::{CloseReason, DialogError, Error};
pub use listener::FcpListener;
