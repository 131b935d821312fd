//! Reservation state machine
//!
//! Holds the `(room, slot, day) -> holder` book. A missing entry is the zero
//! holder, i.e. unreserved. At most one holder exists per key: writes only
//! happen into an empty entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{check_slot, RoomCatalog};
use crate::clock::day_index;
use crate::constants::{SLOT_COUNT, SLOT_DATA_SIZE};
use crate::identity::hex_bytes;
use crate::{Day, HolderId, LedgerError, Result, RoomId, SlotIndex};

/// Capability to erase a reservation record, handed to the token ring
pub trait ClearReservation {
    fn clear_reservation(&mut self, room: RoomId, slot: SlotIndex, day: Day);
}

/// Per-slot status for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Disabled,
    Available,
    Reserved,
}

/// Snapshot of a room as seen on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub room: RoomId,
    pub day: Day,
    pub capacity: u64,
    pub statuses: [SlotStatus; SLOT_COUNT],
    pub data: [SlotData; SLOT_COUNT],
}

/// Slot label wrapper so views serialize as hex strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotData(#[serde(with = "hex_bytes")] pub [u8; SLOT_DATA_SIZE]);

/// Booking window bounds for a given today
fn window(today: Day, max_advance_days: u64) -> (Day, Day) {
    (today, today.saturating_add(max_advance_days))
}

#[derive(Debug, Clone, Default)]
pub struct ReservationEngine {
    book: BTreeMap<(RoomId, SlotIndex, Day), HolderId>,
    max_advance_days: u64,
}

impl ReservationEngine {
    pub fn new(max_advance_days: u64) -> Self {
        Self {
            book: BTreeMap::new(),
            max_advance_days,
        }
    }

    pub fn max_advance_days(&self) -> u64 {
        self.max_advance_days
    }

    /// Current holder, zero when unreserved
    pub fn holder(&self, room: RoomId, slot: SlotIndex, day: Day) -> HolderId {
        self.book
            .get(&(room, slot, day))
            .copied()
            .unwrap_or(HolderId::ZERO)
    }

    /// Number of live reservation records
    pub fn len(&self) -> usize {
        self.book.len()
    }

    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomId, SlotIndex, Day, HolderId)> + '_ {
        self.book
            .iter()
            .map(|((room, slot, day), holder)| (*room, *slot, *day, *holder))
    }

    pub(crate) fn insert(&mut self, room: RoomId, slot: SlotIndex, day: Day, holder: HolderId) {
        if !holder.is_zero() {
            self.book.insert((room, slot, day), holder);
        }
    }

    /// Validate room, slot and window; returns the target day
    fn locate(
        &self,
        catalog: &RoomCatalog,
        room: RoomId,
        slot: SlotIndex,
        timestamp: u64,
        today: Day,
    ) -> Result<Day> {
        catalog.existing_room(room)?;
        check_slot(slot)?;

        let day = day_index(timestamp);
        let (first, last) = window(today, self.max_advance_days);
        if day < first || day > last {
            return Err(LedgerError::OutOfWindow { day, first, last });
        }
        Ok(day)
    }

    /// Book `slot` of `room` for the day containing `timestamp`
    pub fn reserve(
        &mut self,
        catalog: &RoomCatalog,
        room: RoomId,
        slot: SlotIndex,
        timestamp: u64,
        holder: HolderId,
        today: Day,
    ) -> Result<Day> {
        if holder.is_zero() {
            return Err(LedgerError::ZeroHolder);
        }
        let day = self.locate(catalog, room, slot, timestamp, today)?;

        if !catalog.slot_enabled(room, slot) {
            return Err(LedgerError::SlotDisabled { room, slot });
        }
        if !self.holder(room, slot, day).is_zero() {
            return Err(LedgerError::AlreadyReserved { room, slot, day });
        }

        self.book.insert((room, slot, day), holder);
        tracing::info!(room, slot, day, holder = %holder, "Reservation made");
        Ok(day)
    }

    /// Release a booking held by `holder`
    pub fn cancel(
        &mut self,
        catalog: &RoomCatalog,
        room: RoomId,
        slot: SlotIndex,
        timestamp: u64,
        holder: HolderId,
        today: Day,
    ) -> Result<Day> {
        if holder.is_zero() {
            return Err(LedgerError::ZeroHolder);
        }
        let day = self.locate(catalog, room, slot, timestamp, today)?;

        if self.holder(room, slot, day) != holder {
            return Err(LedgerError::NotOwner {
                room,
                slot,
                day,
                caller: holder,
            });
        }

        self.book.remove(&(room, slot, day));
        tracing::info!(room, slot, day, "Reservation cleared");
        Ok(day)
    }

    /// Per-slot status and data of `room` on the day containing `timestamp`
    pub fn query_room(&self, catalog: &RoomCatalog, room: RoomId, timestamp: u64) -> Result<RoomView> {
        let record = catalog.existing_room(room)?;
        if timestamp == 0 {
            return Err(LedgerError::InvalidTime);
        }

        let day = day_index(timestamp);
        let mut statuses = [SlotStatus::Disabled; SLOT_COUNT];
        let mut data = [SlotData::default(); SLOT_COUNT];

        for (index, slot) in record.slots.iter().enumerate() {
            data[index] = SlotData(slot.data);
            statuses[index] = if !slot.enabled {
                SlotStatus::Disabled
            } else if self.holder(room, index as SlotIndex, day).is_zero() {
                SlotStatus::Available
            } else {
                SlotStatus::Reserved
            };
        }

        Ok(RoomView {
            room,
            day,
            capacity: record.capacity,
            statuses,
            data,
        })
    }
}

impl ClearReservation for ReservationEngine {
    fn clear_reservation(&mut self, room: RoomId, slot: SlotIndex, day: Day) {
        self.book.remove(&(room, slot, day));
    }
}
