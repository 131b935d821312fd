//! slotledger: room-slot reservation ledger with a ring of reclamation tokens
//!
//! - [`ledger`]: ledger state machine (catalog, reservations, tokens, snapshots)
//! - [`server`]: axum HTTP server
//! - [`client`]: reqwest client

pub use slotledger_client as client;
pub use slotledger_core as ledger;
pub use slotledger_server as server;
