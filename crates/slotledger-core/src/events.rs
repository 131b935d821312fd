//! Ledger notifications

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Day, HolderId, RingPosition, RoomId, SlotIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ReservationMade {
        room: RoomId,
        slot: SlotIndex,
        holder: HolderId,
        day: Day,
    },
    ReservationCleared {
        room: RoomId,
        slot: SlotIndex,
        day: Day,
    },
    TokensRedeemed {
        amount: u128,
        cost: u128,
        refund: u128,
        start_index: RingPosition,
    },
}

/// A notification stamped with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub seq: u64,
    pub kind: EventKind,
}

/// Notification log holding the most recent `capacity` events
///
/// Sequence numbers keep counting after old entries are dropped, so a reader
/// polling with `since` sees a gap rather than renumbered events.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<LedgerEvent>,
    next_seq: u64,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self::starting_at(0, capacity)
    }

    /// Start numbering at `next_seq`, e.g. after a restore
    pub fn starting_at(next_seq: u64, capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            next_seq,
            capacity,
        }
    }

    pub fn push(&mut self, kind: EventKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.capacity == 0 {
            return seq;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(LedgerEvent { seq, kind });
        seq
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained events with `seq >= since`
    pub fn since(&self, since: u64) -> Vec<LedgerEvent> {
        let start = self.events.partition_point(|e| e.seq < since);
        self.events.range(start..).cloned().collect()
    }

    /// Oldest retained sequence number
    pub fn first_seq(&self) -> Option<u64> {
        self.events.front().map(|e| e.seq)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
