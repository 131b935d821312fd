//! Room catalog and the owner-gated admin facade
//!
//! The catalog is a plain data store. Reads are open to everyone; every write
//! goes through [`AdminFacade`], which checks the caller against the single
//! owner identity fixed at construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{SLOT_COUNT, SLOT_DATA_SIZE};
use crate::identity::hex_bytes;
use crate::{HolderId, LedgerError, Result, RoomId, SlotIndex};

/// One bookable unit of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slot {
    pub enabled: bool,
    /// Opaque display label, zero-padded
    #[serde(with = "hex_bytes")]
    pub data: [u8; SLOT_DATA_SIZE],
}

/// A room: non-zero capacity means it exists
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Room {
    pub capacity: u64,
    pub slots: [Slot; SLOT_COUNT],
}

impl Room {
    pub fn exists(&self) -> bool {
        self.capacity != 0
    }
}

/// Check a slot index against the fixed slot count
pub fn check_slot(slot: SlotIndex) -> Result<usize> {
    usize::try_from(slot)
        .ok()
        .filter(|index| *index < SLOT_COUNT)
        .ok_or(LedgerError::InvalidSlot {
            slot,
            max: SLOT_COUNT,
        })
}

/// Pad a label into a slot data blob
pub fn slot_data_from(label: &[u8]) -> Result<[u8; SLOT_DATA_SIZE]> {
    if label.len() > SLOT_DATA_SIZE {
        return Err(LedgerError::SlotDataTooLong {
            len: label.len(),
            max: SLOT_DATA_SIZE,
        });
    }
    let mut data = [0u8; SLOT_DATA_SIZE];
    data[..label.len()].copy_from_slice(label);
    Ok(data)
}

/// All known rooms, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomCatalog {
    rooms: BTreeMap<RoomId, Room>,
}

impl RoomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(&self, room: RoomId) -> Option<&Room> {
        self.rooms.get(&room)
    }

    pub fn room_exists(&self, room: RoomId) -> bool {
        self.rooms.get(&room).is_some_and(Room::exists)
    }

    /// The room, or `UnknownRoom` when absent or tombstoned
    pub fn existing_room(&self, room: RoomId) -> Result<&Room> {
        self.rooms
            .get(&room)
            .filter(|r| r.exists())
            .ok_or(LedgerError::UnknownRoom { room })
    }

    pub fn slot_enabled(&self, room: RoomId, slot: SlotIndex) -> bool {
        self.slot(room, slot).is_some_and(|s| s.enabled)
    }

    pub fn slot_data(&self, room: RoomId, slot: SlotIndex) -> [u8; SLOT_DATA_SIZE] {
        self.slot(room, slot).map(|s| s.data).unwrap_or_default()
    }

    fn slot(&self, room: RoomId, slot: SlotIndex) -> Option<&Slot> {
        let index = check_slot(slot).ok()?;
        self.rooms.get(&room).map(|r| &r.slots[index])
    }

    /// Number of rooms with non-zero capacity
    pub fn room_count(&self) -> usize {
        self.rooms.values().filter(|r| r.exists()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().map(|(id, room)| (*id, room))
    }

    pub(crate) fn insert(&mut self, room: RoomId, record: Room) {
        self.rooms.insert(room, record);
    }

    fn entry(&mut self, room: RoomId) -> &mut Room {
        self.rooms.entry(room).or_default()
    }
}

/// Single authorization-checked entry point for catalog writes
#[derive(Debug, Clone)]
pub struct AdminFacade {
    owner: HolderId,
}

impl AdminFacade {
    pub fn new(owner: HolderId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> HolderId {
        self.owner
    }

    pub fn authorize(&self, caller: HolderId) -> Result<()> {
        if caller.is_zero() || caller != self.owner {
            return Err(LedgerError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Set a room's capacity; zero tombstones it, non-zero creates or revives it
    pub fn set_capacity(
        &self,
        catalog: &mut RoomCatalog,
        caller: HolderId,
        room: RoomId,
        capacity: u64,
    ) -> Result<()> {
        self.authorize(caller)?;
        catalog.entry(room).capacity = capacity;
        tracing::info!(room, capacity, "Room capacity updated");
        Ok(())
    }

    pub fn set_slot_enabled(
        &self,
        catalog: &mut RoomCatalog,
        caller: HolderId,
        room: RoomId,
        slot: SlotIndex,
        enabled: bool,
    ) -> Result<()> {
        self.authorize(caller)?;
        let index = check_slot(slot)?;
        catalog.entry(room).slots[index].enabled = enabled;
        tracing::info!(room, slot, enabled, "Slot enabled flag updated");
        Ok(())
    }

    pub fn set_slot_data(
        &self,
        catalog: &mut RoomCatalog,
        caller: HolderId,
        room: RoomId,
        slot: SlotIndex,
        label: &[u8],
    ) -> Result<()> {
        self.authorize(caller)?;
        let index = check_slot(slot)?;
        let data = slot_data_from(label)?;
        catalog.entry(room).slots[index].data = data;
        tracing::debug!(room, slot, "Slot data updated");
        Ok(())
    }
}
