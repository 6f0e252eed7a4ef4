//! High-level FCP command layer.
//!
//! [`FcpClient`] turns the dialog engine into typed operations: each command
//! is a fluent builder that assembles an outgoing message, wraps a dialog
//! around it, and resolves to a typed result. The client connects lazily on
//! first use, performs the `ClientHello`/`NodeHello` greeting, and shares the
//! live connection across all commands.
//!
//! # Example
//!
//! ```no_run
//! use fcp_client::FcpClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FcpClient::new("localhost", 9481, "my-app");
//!     let keypair = client.generate_keypair().execute().await?;
//!     println!("insert under {}", keypair.insert_uri);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod client;
mod commands;
mod error;
mod identifier;

pub use client::FcpClient;
pub use commands::config::GetConfigCommand;
pub use commands::get::{ClientGetCommand, FcpData};
pub use commands::keypair::{FcpKeyPair, GenerateKeypairCommand};
pub use commands::peers::{ListPeersCommand, RemovePeerCommand};
pub use commands::put::{ClientPutCommand, PutSource};
pub use error::ClientError;
pub use identifier::RandomIdentifierGenerator;

pub use fcp_engine;
pub use fcp_proto;
