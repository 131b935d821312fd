//! Prometheus metrics for the ledger server
//!
//! Labels are limited to route templates and outcomes; room ids and
//! holders never become label values.

use metrics::{counter, gauge, histogram};
use slotledger_core::RingPosition;
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_CLIENT_ERROR: &str = "client_error";
pub const OUTCOME_SERVER_ERROR: &str = "server_error";

pub fn outcome_for(status: u16) -> &'static str {
    match status {
        500..=599 => OUTCOME_SERVER_ERROR,
        400..=499 => OUTCOME_CLIENT_ERROR,
        _ => OUTCOME_OK,
    }
}

pub fn record_request(route: &str, outcome: &str, duration: Duration) {
    counter!("ledger_requests_total", "route" => route.to_string(), "outcome" => outcome.to_string()).increment(1);
    histogram!("ledger_request_duration_seconds", "route" => route.to_string(), "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());
}

pub fn set_ring(start_index: RingPosition, supply: u128) {
    gauge!("ledger_token_start_index").set(start_index as f64);
    gauge!("ledger_token_supply").set(supply as f64);
}

pub fn record_tokens_redeemed(amount: u128) {
    counter!("ledger_tokens_redeemed_total").increment(u64::try_from(amount).unwrap_or(u64::MAX));
}

pub fn record_reservation(action: &str) {
    counter!("ledger_reservations_total", "action" => action.to_string()).increment(1);
}

pub fn init_prometheus_recorder(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_for() {
        assert_eq!(outcome_for(200), OUTCOME_OK);
        assert_eq!(outcome_for(409), OUTCOME_CLIENT_ERROR);
        assert_eq!(outcome_for(503), OUTCOME_SERVER_ERROR);
    }
}
