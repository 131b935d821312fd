//! slotledger-client: typed HTTP client for slotledger-server

pub mod client;
pub mod error;

pub use client::LedgerClient;
pub use error::{ClientError, Result};
