//! Persisted ledger state
//!
//! Everything except configuration and the clock: rooms, the reservation
//! book, the ring bounds and the live token words in ring order. Positions
//! outside the live range are zero by construction, so they are not stored.

use serde::{Deserialize, Serialize};

use crate::catalog::Slot;
use crate::constants::SLOT_COUNT;
use crate::{Day, HolderId, LedgerError, RingPosition, RoomId, SlotIndex};

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room: RoomId,
    pub capacity: u64,
    pub slots: [Slot; SLOT_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub room: RoomId,
    pub slot: SlotIndex,
    pub day: Day,
    pub holder: HolderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub rooms: Vec<RoomRecord>,
    pub reservations: Vec<ReservationRecord>,
    pub start_index: RingPosition,
    pub supply: u128,
    /// Live token words as `0x` hex, oldest first
    pub tokens: Vec<String>,
    pub next_event_seq: u64,
}

impl LedgerSnapshot {
    /// Structural checks that do not need a ledger
    pub fn validate(&self) -> crate::Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(LedgerError::InvalidSnapshot(format!(
                "unsupported version {}, expected {}",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.tokens.len() as u128 != self.supply {
            return Err(LedgerError::InvalidSnapshot(format!(
                "supply {} but {} token words",
                self.supply,
                self.tokens.len()
            )));
        }
        if let Some(record) = self.reservations.iter().find(|r| r.holder.is_zero()) {
            return Err(LedgerError::InvalidSnapshot(format!(
                "zero holder for room {} slot {} day {}",
                record.room, record.slot, record.day
            )));
        }
        Ok(())
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let snapshot: Self = serde_json::from_str(&content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Save a snapshot to a JSON file, replacing it atomically
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
