//! Error types for slotledger-core

use thiserror::Error;

use crate::{Day, HolderId, RingPosition, RoomId, SlotIndex};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown room: {room}")]
    UnknownRoom { room: RoomId },

    #[error("Invalid slot index {slot}: rooms have {max} slots")]
    InvalidSlot { slot: SlotIndex, max: usize },

    #[error("Day {day} is outside the booking window [{first}, {last}]")]
    OutOfWindow { day: Day, first: Day, last: Day },

    #[error("Slot {slot} of room {room} is disabled")]
    SlotDisabled { room: RoomId, slot: SlotIndex },

    #[error("Slot {slot} of room {room} is already reserved for day {day}")]
    AlreadyReserved { room: RoomId, slot: SlotIndex, day: Day },

    #[error("Caller {caller} does not hold slot {slot} of room {room} for day {day}")]
    NotOwner {
        room: RoomId,
        slot: SlotIndex,
        day: Day,
        caller: HolderId,
    },

    #[error("Invalid time: timestamp must be non-zero")]
    InvalidTime,

    #[error("Insufficient supply: requested {requested}, outstanding {supply}")]
    InsufficientSupply { requested: u128, supply: u128 },

    #[error("Insufficient payment: cost {cost}, paid {payment}")]
    InsufficientPayment { cost: u128, payment: u128 },

    #[error("Token at position {position} backs day {day}, which has not elapsed (today is {current_day})")]
    TokenNotYetRedeemable {
        position: RingPosition,
        day: Day,
        current_day: Day,
    },

    #[error("Caller {caller} is not the ledger owner")]
    Unauthorized { caller: HolderId },

    #[error("The zero identity cannot hold reservations")]
    ZeroHolder,

    #[error("Invalid holder id: {0}")]
    InvalidHolder(String),

    #[error("Slot data too long: {len} bytes, max {max}")]
    SlotDataTooLong { len: usize, max: usize },

    #[error("Token ring exhausted")]
    RingExhausted,

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Stable machine-readable name of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::UnknownRoom { .. } => "unknown_room",
            LedgerError::InvalidSlot { .. } => "invalid_slot",
            LedgerError::OutOfWindow { .. } => "out_of_window",
            LedgerError::SlotDisabled { .. } => "slot_disabled",
            LedgerError::AlreadyReserved { .. } => "already_reserved",
            LedgerError::NotOwner { .. } => "not_owner",
            LedgerError::InvalidTime => "invalid_time",
            LedgerError::InsufficientSupply { .. } => "insufficient_supply",
            LedgerError::InsufficientPayment { .. } => "insufficient_payment",
            LedgerError::TokenNotYetRedeemable { .. } => "token_not_yet_redeemable",
            LedgerError::Unauthorized { .. } => "unauthorized",
            LedgerError::ZeroHolder => "zero_holder",
            LedgerError::InvalidHolder(_) => "invalid_holder",
            LedgerError::SlotDataTooLong { .. } => "slot_data_too_long",
            LedgerError::RingExhausted => "ring_exhausted",
            LedgerError::Overflow(_) => "overflow",
            LedgerError::InvalidConfig(_) => "invalid_config",
            LedgerError::InvalidSnapshot(_) => "invalid_snapshot",
            LedgerError::Io(_) => "io",
            LedgerError::Json(_) => "json",
        }
    }
}
