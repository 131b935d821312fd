//! slotledger-core: reservation ledger and reclamation-token ring
//!
//! Rooms expose a fixed number of slots; a holder books one slot for one
//! calendar day inside the advance-booking window. Every successful booking
//! mints a reclamation token: a packed 32-byte word naming the exact
//! `(day, slot, room)` record it backs. Once that day has strictly elapsed the
//! record is dead weight, and redeeming the token clears it in exchange for a
//! flat per-token fee.
//!
//! ## Layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`clock`] | time source and the shared day derivation |
//! | [`catalog`] | rooms, slots and the owner-gated admin facade |
//! | [`reservation`] | per-(room, slot, day) booking state machine |
//! | [`token`] | packed token word codec |
//! | [`tokens`] | the token ring: mint, redeem, pricing |
//! | [`ledger`] | the facade tying the above together |
//!
//! ## Ordering
//!
//! Every operation on [`Ledger`] takes `&mut self` and either completes or
//! fails with no persisted change. Ring positions are global across rooms,
//! so callers that share a ledger must serialize access to it.

pub mod catalog;
pub mod clock;
mod config;
mod error;
mod events;
mod identity;
pub mod ledger;
pub mod reservation;
mod snapshot;
pub mod token;
pub mod tokens;

pub use catalog::{AdminFacade, Room, RoomCatalog, Slot};
pub use clock::{day_index, day_start, Clock, ManualClock, SystemClock, SECONDS_PER_DAY};
pub use config::{LedgerConfig, PROTOCOL_VERSION};
pub use error::LedgerError;
pub use events::{EventKind, EventLog, LedgerEvent};
pub use identity::HolderId;
pub use ledger::Ledger;
pub use reservation::{ClearReservation, ReservationEngine, RoomView, SlotData, SlotStatus};
pub use snapshot::{LedgerSnapshot, ReservationRecord, RoomRecord, SNAPSHOT_VERSION};
pub use token::{ReclamationToken, TokenWord, TOKEN_WORD_SIZE};
pub use tokens::{Redemption, TokenLedger, TokenPricing, REFUND_UNIT_VALUE};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Caller-chosen room identifier
pub type RoomId = u64;

/// Slot index within a room, always below [`constants::SLOT_COUNT`]
pub type SlotIndex = u64;

/// Day index: `timestamp / SECONDS_PER_DAY`
pub type Day = u64;

/// Position in the token ring
pub type RingPosition = u128;

/// Fixed sizes of the data model
pub mod constants {
    /// Slots per room
    pub const SLOT_COUNT: usize = 10;

    /// Bytes of opaque display data per slot
    pub const SLOT_DATA_SIZE: usize = 16;

    /// Bytes in a holder identity
    pub const HOLDER_ID_SIZE: usize = 20;
}
