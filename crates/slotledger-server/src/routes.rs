//! HTTP routes for the ledger server

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use slotledger_core::{
    Day, HolderId, LedgerEvent, ReclamationToken, RingPosition, RoomId, RoomView, SlotIndex,
};

use crate::error::{Result, ServerError};
use crate::metrics;
use crate::state::{LedgerStats, SharedState};

/// Health check response
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger: LedgerStats,
}

#[derive(Deserialize)]
pub struct RoomQuery {
    /// Defaults to the server's current time
    pub timestamp: Option<u64>,
}

/// Body of `/reserve` and `/cancel`
#[derive(Serialize, Deserialize)]
pub struct BookingRequest {
    pub room: RoomId,
    pub slot: SlotIndex,
    pub timestamp: u64,
    pub holder: HolderId,
}

#[derive(Serialize, Deserialize)]
pub struct ReserveResponse {
    pub day: Day,
    /// Ring position of the token minted for this booking
    pub position: RingPosition,
}

#[derive(Serialize, Deserialize)]
pub struct CancelResponse {
    pub day: Day,
}

#[derive(Serialize, Deserialize)]
pub struct RedeemRequest {
    pub amount: u128,
    pub payment: u128,
}

#[derive(Serialize, Deserialize)]
pub struct RedeemResponse {
    pub amount: u128,
    pub cost: u128,
    pub refund: u128,
    pub cleared: Vec<ReclamationToken>,
    pub start_index: RingPosition,
    pub supply: u128,
}

#[derive(Serialize, Deserialize)]
pub struct QuoteResponse {
    pub amount: u128,
    pub cost: u128,
}

#[derive(Serialize, Deserialize)]
pub struct EstimateResponse {
    pub budget: u128,
    pub count: u128,
}

#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub position: RingPosition,
    /// Packed word as `0x` hex; all zeros once reclaimed
    pub word: String,
    /// Decoded token while the position is live
    pub token: Option<ReclamationToken>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
}

#[derive(Serialize, Deserialize)]
pub struct CapacityRequest {
    pub caller: HolderId,
    pub capacity: u64,
}

#[derive(Serialize, Deserialize)]
pub struct SlotUpdateRequest {
    pub caller: HolderId,
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Display label, at most 16 bytes of UTF-8
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SnapshotRequest {
    pub caller: HolderId,
}

#[derive(Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub path: String,
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        ledger: state.stats(),
    })
}

/// Per-slot status of a room for one day
async fn get_room(
    State(state): State<SharedState>,
    Path(room): Path<RoomId>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<RoomView>> {
    let state = state.read().await;
    let timestamp = query.timestamp.unwrap_or_else(|| state.ledger.now());
    Ok(Json(state.ledger.query_room(room, timestamp)?))
}

async fn reserve(
    State(state): State<SharedState>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<ReserveResponse>> {
    let mut state = state.write().await;
    let day = state
        .ledger
        .reserve(req.room, req.slot, req.timestamp, req.holder)?;

    let ledger = &state.ledger;
    let position = ledger.token_start_index() + ledger.token_supply() - 1;
    metrics::record_reservation("reserve");
    metrics::set_ring(ledger.token_start_index(), ledger.token_supply());

    Ok(Json(ReserveResponse { day, position }))
}

async fn cancel(
    State(state): State<SharedState>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<CancelResponse>> {
    let mut state = state.write().await;
    let day = state
        .ledger
        .cancel(req.room, req.slot, req.timestamp, req.holder)?;
    metrics::record_reservation("cancel");
    Ok(Json(CancelResponse { day }))
}

async fn redeem(
    State(state): State<SharedState>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>> {
    let mut state = state.write().await;
    let redemption = state.ledger.redeem(req.amount, req.payment)?;

    metrics::record_tokens_redeemed(redemption.amount);
    metrics::set_ring(redemption.start_index, redemption.supply);

    Ok(Json(RedeemResponse {
        amount: redemption.amount,
        cost: redemption.cost,
        refund: redemption.refund,
        cleared: redemption.cleared,
        start_index: redemption.start_index,
        supply: redemption.supply,
    }))
}

async fn quote(
    State(state): State<SharedState>,
    Path(amount): Path<String>,
) -> Result<Json<QuoteResponse>> {
    let amount = parse_u128("amount", &amount)?;
    let state = state.read().await;
    let cost = state.ledger.quote_cost(amount)?;
    Ok(Json(QuoteResponse { amount, cost }))
}

async fn estimate(
    State(state): State<SharedState>,
    Path(budget): Path<String>,
) -> Result<Json<EstimateResponse>> {
    let budget = parse_u128("budget", &budget)?;
    let state = state.read().await;
    let count = state.ledger.estimate_optimal_amount(budget)?;
    Ok(Json(EstimateResponse { budget, count }))
}

async fn get_token(
    State(state): State<SharedState>,
    Path(position): Path<String>,
) -> Result<Json<TokenResponse>> {
    let position = parse_u128("position", &position)?;
    let state = state.read().await;
    let word = state.ledger.word_at(position);
    Ok(Json(TokenResponse {
        position,
        word: ReclamationToken::word_hex(&word),
        token: state.ledger.token_at(position),
    }))
}

async fn events(
    State(state): State<SharedState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<LedgerEvent>> {
    let state = state.read().await;
    Json(state.ledger.events_since(query.since))
}

async fn set_capacity(
    State(state): State<SharedState>,
    Path(room): Path<RoomId>,
    Json(req): Json<CapacityRequest>,
) -> Result<StatusCode> {
    let mut state = state.write().await;
    state.ledger.set_capacity(req.caller, room, req.capacity)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_slot(
    State(state): State<SharedState>,
    Path((room, slot)): Path<(RoomId, SlotIndex)>,
    Json(req): Json<SlotUpdateRequest>,
) -> Result<StatusCode> {
    let mut state = state.write().await;
    // Label first: it is the only part that can fail after authorization
    if let Some(label) = &req.label {
        state
            .ledger
            .set_slot_data(req.caller, room, slot, label.as_bytes())?;
    }
    if let Some(enabled) = req.enabled {
        state.ledger.set_slot_enabled(req.caller, room, slot, enabled)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn save_snapshot(
    State(state): State<SharedState>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<SnapshotResponse>> {
    let (path, snapshot) = {
        let state = state.read().await;
        state.ledger.prepare_persist(req.caller)?
    };

    // File IO runs without holding the ledger lock
    let target = path.clone();
    let supply = snapshot.supply;
    tokio::task::spawn_blocking(move || snapshot.save(&target))
        .await
        .map_err(|e| ServerError::Internal(format!("Snapshot task failed: {}", e)))??;
    tracing::info!(path = %path.display(), supply, "Snapshot saved");

    Ok(Json(SnapshotResponse {
        path: path.display().to_string(),
    }))
}

async fn render_metrics(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Record count and latency per route template
async fn track_metrics(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    let outcome = metrics::outcome_for(response.status().as_u16());
    metrics::record_request(&route, outcome, start.elapsed());
    response
}

fn parse_u128(field: &str, s: &str) -> Result<u128> {
    s.parse()
        .map_err(|_| ServerError::InvalidRequest(format!("Invalid {}: {}", field, s)))
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms/{room}", get(get_room))
        .route("/reserve", post(reserve))
        .route("/cancel", post(cancel))
        .route("/redeem", post(redeem))
        .route("/quote/{amount}", get(quote))
        .route("/estimate/{budget}", get(estimate))
        .route("/tokens/{position}", get(get_token))
        .route("/events", get(events))
        .route("/admin/rooms/{room}/capacity", post(set_capacity))
        .route("/admin/rooms/{room}/slots/{slot}", post(update_slot))
        .route("/admin/snapshot", post(save_snapshot))
        .route("/metrics", get(render_metrics))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use slotledger_core::{day_start, Ledger, LedgerConfig, ManualClock, SlotStatus};
    use tower::ServiceExt;

    use crate::error::ErrorBody;
    use crate::state::create_shared_state;

    const OWNER: &str = "0x0101010101010101010101010101010101010101";
    const ALICE: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";

    fn app() -> (Router, ManualClock) {
        let clock = ManualClock::at_day(100);
        let config = LedgerConfig::new(OWNER.parse().unwrap());
        let ledger = Ledger::new(config, Arc::new(clock.clone())).unwrap();
        (create_router(create_shared_state(ledger)), clock)
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = HttpRequest::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn setup_room(router: &Router) {
        let (status, _) = call(
            router,
            "POST",
            "/admin/rooms/1/capacity",
            Some(serde_json::json!({ "caller": OWNER, "capacity": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(
            router,
            "POST",
            "/admin/rooms/1/slots/0",
            Some(serde_json::json!({ "caller": OWNER, "enabled": true, "label": "Desk A" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_reserve_and_query() {
        let (router, _clock) = app();
        setup_room(&router).await;

        let ts = day_start(103);
        let (status, body) = call(
            &router,
            "POST",
            "/reserve",
            Some(serde_json::json!({ "room": 1, "slot": 0, "timestamp": ts, "holder": ALICE })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reserved: ReserveResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(reserved.day, 103);
        assert_eq!(reserved.position, 0);

        let (status, body) = call(&router, "GET", &format!("/rooms/1?timestamp={}", ts), None).await;
        assert_eq!(status, StatusCode::OK);
        let view: RoomView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.statuses[0], SlotStatus::Reserved);
        assert_eq!(&view.data[0].0[..6], b"Desk A");
    }

    #[tokio::test]
    async fn test_error_body() {
        let (router, _clock) = app();

        let (status, body) = call(&router, "GET", "/rooms/7?timestamp=1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "unknown_room");

        let (status, _) = call(
            &router,
            "POST",
            "/admin/rooms/1/capacity",
            Some(serde_json::json!({ "caller": ALICE, "capacity": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_quote_and_token_paths() {
        let (router, _clock) = app();

        let (status, body) = call(&router, "GET", "/quote/2", None).await;
        assert_eq!(status, StatusCode::OK);
        let quote: QuoteResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(quote.cost, 2 * slotledger_core::REFUND_UNIT_VALUE);

        let (status, _) = call(&router, "GET", "/quote/lots", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&router, "GET", "/tokens/0", None).await;
        assert_eq!(status, StatusCode::OK);
        let token: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert!(token.token.is_none());
        assert_eq!(token.word, format!("0x{}", "00".repeat(32)));
    }

    #[tokio::test]
    async fn test_snapshot_written_off_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::new(OWNER.parse().unwrap()).with_snapshot_path(path.clone());
        let ledger = Ledger::new(config, Arc::new(ManualClock::at_day(100))).unwrap();
        let state = create_shared_state(ledger);
        let router = create_router(state.clone());
        setup_room(&router).await;

        let (status, _) = call(
            &router,
            "POST",
            "/reserve",
            Some(serde_json::json!({ "room": 1, "slot": 0, "timestamp": day_start(101), "holder": ALICE })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&router, "POST", "/admin/snapshot", Some(serde_json::json!({ "caller": ALICE }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!path.exists());

        let (status, body) = call(&router, "POST", "/admin/snapshot", Some(serde_json::json!({ "caller": OWNER }))).await;
        assert_eq!(status, StatusCode::OK);
        let saved: SnapshotResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(saved.path, path.display().to_string());

        let snapshot = slotledger_core::LedgerSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.supply, 1);
        // The write lock is free once the handler returns
        let guard = state.try_write().unwrap();
        assert_eq!(guard.ledger.snapshot(), snapshot);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (router, _clock) = app();
        let (status, _) = call(&router, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_u128() {
        assert_eq!(parse_u128("amount", "340282366920938463463374607431768211455").unwrap(), u128::MAX);
        assert!(parse_u128("amount", "-1").is_err());
    }
}
