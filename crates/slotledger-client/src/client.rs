//! HTTP client for the ledger server

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use slotledger_core::{
    Day, HolderId, LedgerEvent, ReclamationToken, RingPosition, RoomId, RoomView, SlotIndex,
};

use crate::error::{ClientError, Result};

/// Ledger statistics from `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerStats {
    pub today: Day,
    pub rooms: usize,
    pub reservations: usize,
    pub token_supply: u128,
    pub token_start_index: RingPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger: LedgerStats,
}

#[derive(Serialize)]
struct BookingRequest {
    room: RoomId,
    slot: SlotIndex,
    timestamp: u64,
    holder: HolderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveResponse {
    pub day: Day,
    pub position: RingPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub day: Day,
}

#[derive(Serialize)]
struct RedeemRequest {
    amount: u128,
    payment: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub amount: u128,
    pub cost: u128,
    pub refund: u128,
    pub cleared: Vec<ReclamationToken>,
    pub start_index: RingPosition,
    pub supply: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub amount: u128,
    pub cost: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub budget: u128,
    pub count: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub position: RingPosition,
    pub word: String,
    pub token: Option<ReclamationToken>,
}

#[derive(Serialize)]
struct CapacityRequest {
    caller: HolderId,
    capacity: u64,
}

#[derive(Serialize)]
struct SlotUpdateRequest<'a> {
    caller: HolderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
}

#[derive(Serialize)]
struct SnapshotRequest {
    caller: HolderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub path: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Typed client, one method per server route
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: Client,
    server_url: String,
}

impl LedgerClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    /// Room status on the day containing `timestamp` (server time if `None`)
    pub async fn room(&self, room: RoomId, timestamp: Option<u64>) -> Result<RoomView> {
        match timestamp {
            Some(ts) => self.get(&format!("/rooms/{}?timestamp={}", room, ts)).await,
            None => self.get(&format!("/rooms/{}", room)).await,
        }
    }

    pub async fn reserve(
        &self,
        room: RoomId,
        slot: SlotIndex,
        timestamp: u64,
        holder: HolderId,
    ) -> Result<ReserveResponse> {
        let body = BookingRequest {
            room,
            slot,
            timestamp,
            holder,
        };
        self.post("/reserve", &body).await
    }

    pub async fn cancel(
        &self,
        room: RoomId,
        slot: SlotIndex,
        timestamp: u64,
        holder: HolderId,
    ) -> Result<CancelResponse> {
        let body = BookingRequest {
            room,
            slot,
            timestamp,
            holder,
        };
        self.post("/cancel", &body).await
    }

    pub async fn redeem(&self, amount: u128, payment: u128) -> Result<RedeemResponse> {
        self.post("/redeem", &RedeemRequest { amount, payment }).await
    }

    pub async fn quote(&self, amount: u128) -> Result<QuoteResponse> {
        self.get(&format!("/quote/{}", amount)).await
    }

    pub async fn estimate(&self, budget: u128) -> Result<EstimateResponse> {
        self.get(&format!("/estimate/{}", budget)).await
    }

    pub async fn token(&self, position: RingPosition) -> Result<TokenResponse> {
        self.get(&format!("/tokens/{}", position)).await
    }

    pub async fn events(&self, since: u64) -> Result<Vec<LedgerEvent>> {
        self.get(&format!("/events?since={}", since)).await
    }

    pub async fn set_capacity(&self, caller: HolderId, room: RoomId, capacity: u64) -> Result<()> {
        let url = format!("{}/admin/rooms/{}/capacity", self.server_url, room);
        let resp = self
            .http
            .post(&url)
            .json(&CapacityRequest { caller, capacity })
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn update_slot(
        &self,
        caller: HolderId,
        room: RoomId,
        slot: SlotIndex,
        enabled: Option<bool>,
        label: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}/admin/rooms/{}/slots/{}", self.server_url, room, slot);
        let body = SlotUpdateRequest {
            caller,
            enabled,
            label,
        };
        let resp = self.http.post(&url).json(&body).send().await?;
        check(resp).await.map(|_| ())
    }

    pub async fn save_snapshot(&self, caller: HolderId) -> Result<SnapshotResponse> {
        self.post("/admin/snapshot", &SnapshotRequest { caller }).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.server_url, path);
        tracing::debug!(url = %url, "GET");
        let resp = self.http.get(&url).send().await?;
        let bytes = check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.server_url, path);
        tracing::debug!(url = %url, "POST");
        let resp = self.http.post(&url).json(body).send().await?;
        let bytes = check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-success response into `ClientError::Server`
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.message),
        Err(_) => ("unknown".to_string(), text),
    };
    Err(ClientError::Server {
        status: status.as_u16(),
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = LedgerClient::new("http://localhost:3000/");
        assert_eq!(client.server_url(), "http://localhost:3000");
    }

    #[test]
    fn test_slot_update_skips_missing_fields() {
        let body = SlotUpdateRequest {
            caller: HolderId::new([0x01; 20]),
            enabled: Some(true),
            label: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["enabled"], true);
        assert!(json.get("label").is_none());
    }
}
