//! Server state: the single ledger every request goes through

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use slotledger_core::{Day, Ledger, RingPosition};

/// Ledger plus the process-wide handles routes need
pub struct ServerState {
    pub ledger: Ledger,
    /// Present when a Prometheus recorder is installed
    pub prometheus: Option<PrometheusHandle>,
}

impl ServerState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            today: self.ledger.today(),
            rooms: self.ledger.catalog().room_count(),
            reservations: self.ledger.reservations().len(),
            token_supply: self.ledger.token_supply(),
            token_start_index: self.ledger.token_start_index(),
        }
    }
}

/// Ledger statistics for monitoring
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LedgerStats {
    pub today: Day,
    pub rooms: usize,
    pub reservations: usize,
    pub token_supply: u128,
    pub token_start_index: RingPosition,
}

/// Shared server state type
///
/// Every mutation takes the write guard, which gives all ledger operations a
/// single global order.
pub type SharedState = Arc<tokio::sync::RwLock<ServerState>>;

/// Create shared state around a ledger
pub fn create_shared_state(ledger: Ledger) -> SharedState {
    Arc::new(tokio::sync::RwLock::new(ServerState::new(ledger)))
}
