//! Ledger server implementation

use std::net::SocketAddr;
use std::sync::Arc;

use slotledger_core::{Clock, Ledger, LedgerConfig, SystemClock};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{Result, ServerError};
use crate::metrics;
use crate::routes::create_router;
use crate::state::{create_shared_state, ServerState, SharedState};

/// HTTP front-end over one ledger
pub struct LedgerServer {
    state: SharedState,
    addr: SocketAddr,
}

impl LedgerServer {
    /// Create a server around an already-built ledger
    pub fn new(ledger: Ledger, addr: SocketAddr) -> Self {
        let state = create_shared_state(ledger);
        Self { state, addr }
    }

    /// Run the server
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        tracing::info!("Starting ledger server on {}", self.addr);

        let listener = TcpListener::bind(self.addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the server state for testing
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }
}

/// Builder for LedgerServer
pub struct ServerBuilder {
    config: LedgerConfig,
    addr: SocketAddr,
    clock: Arc<dyn Clock>,
    prometheus: bool,
}

impl ServerBuilder {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            addr: ([127, 0, 0, 1], 3000).into(),
            clock: Arc::new(SystemClock),
            prometheus: false,
        }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }

    /// Replace the wall clock (useful for testing)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Install the global Prometheus recorder and serve `/metrics`
    pub fn with_prometheus(mut self, enabled: bool) -> Self {
        self.prometheus = enabled;
        self
    }

    /// Open the ledger (restoring its snapshot if one exists) and build the server
    pub async fn build(self) -> Result<LedgerServer> {
        let ledger = Ledger::open(self.config, self.clock)?;

        // Gauges set before a recorder exists are dropped
        let handle = if self.prometheus {
            let handle = metrics::init_prometheus_recorder()
                .map_err(|e| ServerError::Internal(format!("Failed to install Prometheus recorder: {}", e)))?;
            Some(handle)
        } else {
            None
        };
        metrics::set_ring(ledger.token_start_index(), ledger.token_supply());

        let mut state = ServerState::new(ledger);
        if let Some(handle) = handle {
            state = state.with_prometheus(handle);
        }

        Ok(LedgerServer {
            state: Arc::new(RwLock::new(state)),
            addr: self.addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotledger_core::{day_start, HolderId, ManualClock};

    #[tokio::test]
    async fn test_builder_opens_ledger() {
        let config = LedgerConfig::new(HolderId::new([0x01; 20]));
        let server = ServerBuilder::new(config)
            .port(4100)
            .clock(Arc::new(ManualClock::at_day(100)))
            .build()
            .await
            .unwrap();

        assert_eq!(server.addr().port(), 4100);
        let state = server.state();
        let state = state.read().await;
        assert_eq!(state.ledger.today(), 100);
        assert!(state.prometheus.is_none());
    }

    // Only test in this crate that installs the global recorder
    #[tokio::test]
    async fn test_prometheus_reports_restored_ring() {
        let owner = HolderId::new([0x01; 20]);
        let alice = HolderId::new([0xa1; 20]);
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::new(owner)
            .with_max_advance_days(7)
            .with_snapshot_path(dir.path().join("ledger.json"));

        let clock = Arc::new(ManualClock::at_day(100));
        let mut ledger = Ledger::new(config.clone(), clock.clone()).unwrap();
        ledger.set_capacity(owner, 1, 4).unwrap();
        ledger.set_slot_enabled(owner, 1, 0, true).unwrap();
        ledger.set_slot_enabled(owner, 1, 1, true).unwrap();
        ledger.reserve(1, 0, day_start(101), alice).unwrap();
        ledger.reserve(1, 1, day_start(101), alice).unwrap();
        ledger.persist(owner).unwrap();

        let server = ServerBuilder::new(config)
            .with_prometheus(true)
            .clock(clock)
            .build()
            .await
            .unwrap();

        let state = server.state();
        let state = state.read().await;
        assert_eq!(state.ledger.token_supply(), 2);

        let rendered = state.prometheus.as_ref().unwrap().render();
        let gauge = |name: &str| -> f64 {
            rendered
                .lines()
                .find_map(|line| line.strip_prefix(name)?.strip_prefix(' '))
                .and_then(|value| value.trim().parse().ok())
                .unwrap()
        };
        assert_eq!(gauge("ledger_token_supply"), 2.0);
        assert_eq!(gauge("ledger_token_start_index"), 0.0);
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let result = ServerBuilder::new(LedgerConfig::default()).build().await;
        assert!(matches!(result, Err(ServerError::Ledger(_))));
    }
}
