//! Fluent command builders, one module per operation family.

pub mod config;
pub mod get;
pub mod keypair;
pub mod peers;
pub mod put;
