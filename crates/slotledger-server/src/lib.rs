//! slotledger-server: HTTP front-end for the reservation ledger
//!
//! Every request goes through one shared [`slotledger_core::Ledger`]; mutating
//! routes hold the write guard for their whole operation.

pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ErrorBody, ServerError};
pub use routes::create_router;
pub use server::{LedgerServer, ServerBuilder};
pub use state::{create_shared_state, LedgerStats, ServerState, SharedState};
