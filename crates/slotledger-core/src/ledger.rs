//! The ledger facade
//!
//! Owns the catalog, the reservation book and the token ring, and runs the
//! two coupled flows: reserve-then-mint and redeem-then-clear. Each public
//! operation either completes or returns an error with nothing changed.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{check_slot, AdminFacade, Room, RoomCatalog};
use crate::clock::Clock;
use crate::events::{EventKind, EventLog, LedgerEvent};
use crate::reservation::{ClearReservation, ReservationEngine, RoomView};
use crate::snapshot::{LedgerSnapshot, ReservationRecord, RoomRecord, SNAPSHOT_VERSION};
use crate::token::{ReclamationToken, TokenWord};
use crate::tokens::{Redemption, TokenLedger, TokenPricing};
use crate::{Day, HolderId, LedgerConfig, LedgerError, Result, RingPosition, RoomId, SlotIndex};

pub struct Ledger {
    config: LedgerConfig,
    catalog: RoomCatalog,
    admin: AdminFacade,
    reservations: ReservationEngine,
    tokens: TokenLedger,
    events: EventLog,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Empty ledger
    pub fn new(config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog: RoomCatalog::new(),
            admin: AdminFacade::new(config.owner),
            reservations: ReservationEngine::new(config.max_advance_days),
            tokens: TokenLedger::new(TokenPricing::from(&config)),
            events: EventLog::new(config.max_events),
            config,
            clock,
        })
    }

    /// Ledger rebuilt from a snapshot
    pub fn restore(snapshot: LedgerSnapshot, config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        snapshot.validate()?;

        let mut catalog = RoomCatalog::new();
        for record in snapshot.rooms {
            catalog.insert(
                record.room,
                Room {
                    capacity: record.capacity,
                    slots: record.slots,
                },
            );
        }

        let mut reservations = ReservationEngine::new(config.max_advance_days);
        for record in snapshot.reservations {
            check_slot(record.slot).map_err(|e| LedgerError::InvalidSnapshot(e.to_string()))?;
            reservations.insert(record.room, record.slot, record.day, record.holder);
        }

        let words = snapshot
            .tokens
            .iter()
            .map(|hex| ReclamationToken::word_from_hex(hex).map_err(LedgerError::InvalidSnapshot))
            .collect::<Result<Vec<TokenWord>>>()?;
        let tokens = TokenLedger::from_parts(TokenPricing::from(&config), snapshot.start_index, words)?;

        tracing::info!(
            rooms = catalog.room_count(),
            reservations = reservations.len(),
            start_index = tokens.start_index(),
            supply = tokens.supply(),
            "Ledger restored from snapshot"
        );

        Ok(Self {
            catalog,
            admin: AdminFacade::new(config.owner),
            reservations,
            tokens,
            events: EventLog::starting_at(snapshot.next_event_seq, config.max_events),
            config,
            clock,
        })
    }

    /// Restore from `config.snapshot_path` when that file exists, else start empty
    pub fn open(config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        match config.snapshot_path.clone() {
            Some(path) if path.exists() => {
                let snapshot = LedgerSnapshot::load(&path)?;
                Self::restore(snapshot, config, clock)
            }
            _ => Self::new(config, clock),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            rooms: self
                .catalog
                .iter()
                .map(|(room, record)| RoomRecord {
                    room,
                    capacity: record.capacity,
                    slots: record.slots,
                })
                .collect(),
            reservations: self
                .reservations
                .iter()
                .map(|(room, slot, day, holder)| ReservationRecord { room, slot, day, holder })
                .collect(),
            start_index: self.tokens.start_index(),
            supply: self.tokens.supply(),
            tokens: self
                .tokens
                .live_words()
                .iter()
                .map(ReclamationToken::word_hex)
                .collect(),
            next_event_seq: self.events.next_seq(),
        }
    }

    /// Authorize a persist and capture what to write; owner only
    ///
    /// Lets async callers do the file IO off the lock.
    pub fn prepare_persist(&self, caller: HolderId) -> Result<(PathBuf, LedgerSnapshot)> {
        self.admin.authorize(caller)?;
        let path = self
            .config
            .snapshot_path
            .clone()
            .ok_or_else(|| LedgerError::InvalidConfig("no snapshot_path configured".to_string()))?;
        Ok((path, self.snapshot()))
    }

    /// Write a snapshot to the configured path; owner only
    pub fn persist(&self, caller: HolderId) -> Result<PathBuf> {
        let (path, snapshot) = self.prepare_persist(caller)?;
        snapshot.save(&path)?;
        tracing::info!(path = %path.display(), supply = snapshot.supply, "Snapshot saved");
        Ok(path)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    pub fn reservations(&self) -> &ReservationEngine {
        &self.reservations
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn today(&self) -> Day {
        self.clock.today()
    }

    /// Book a slot and mint the token backing it
    pub fn reserve(&mut self, room: RoomId, slot: SlotIndex, timestamp: u64, holder: HolderId) -> Result<Day> {
        let today = self.today();
        let day = self
            .reservations
            .reserve(&self.catalog, room, slot, timestamp, holder, today)?;

        if let Err(e) = self.tokens.mint(ReclamationToken::new(day, slot, room)) {
            self.reservations.clear_reservation(room, slot, day);
            tracing::error!(room, slot, day, error = %e, "Mint failed, reservation rolled back");
            return Err(e);
        }

        self.events.push(EventKind::ReservationMade {
            room,
            slot,
            holder,
            day,
        });
        Ok(day)
    }

    /// Release a booking the caller holds; its token stays in the ring
    pub fn cancel(&mut self, room: RoomId, slot: SlotIndex, timestamp: u64, holder: HolderId) -> Result<Day> {
        let today = self.today();
        let day = self
            .reservations
            .cancel(&self.catalog, room, slot, timestamp, holder, today)?;
        self.events.push(EventKind::ReservationCleared { room, slot, day });
        Ok(day)
    }

    /// Redeem the `amount` oldest tokens; returns the batch with the refund owed
    pub fn redeem(&mut self, amount: u128, payment: u128) -> Result<Redemption> {
        let current_day = self.today();
        let redemption = self
            .tokens
            .redeem(amount, payment, current_day, &mut self.reservations)?;
        self.events.push(EventKind::TokensRedeemed {
            amount,
            cost: redemption.cost,
            refund: redemption.refund,
            start_index: redemption.start_index,
        });
        Ok(redemption)
    }

    pub fn query_room(&self, room: RoomId, timestamp: u64) -> Result<RoomView> {
        self.reservations.query_room(&self.catalog, room, timestamp)
    }

    pub fn quote_cost(&self, amount: u128) -> Result<u128> {
        self.tokens.quote_cost(amount)
    }

    pub fn estimate_optimal_amount(&self, resource_budget: u128) -> Result<u128> {
        self.tokens.estimate_optimal_amount(resource_budget)
    }

    pub fn token_supply(&self) -> u128 {
        self.tokens.supply()
    }

    pub fn token_start_index(&self) -> RingPosition {
        self.tokens.start_index()
    }

    pub fn token_at(&self, position: RingPosition) -> Option<ReclamationToken> {
        self.tokens.token_at(position)
    }

    pub fn word_at(&self, position: RingPosition) -> TokenWord {
        self.tokens.word_at(position)
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    /// Retained events with `seq >= since`
    pub fn events_since(&self, since: u64) -> Vec<LedgerEvent> {
        self.events.since(since)
    }

    pub fn set_capacity(&mut self, caller: HolderId, room: RoomId, capacity: u64) -> Result<()> {
        self.admin.set_capacity(&mut self.catalog, caller, room, capacity)
    }

    pub fn set_slot_enabled(&mut self, caller: HolderId, room: RoomId, slot: SlotIndex, enabled: bool) -> Result<()> {
        self.admin
            .set_slot_enabled(&mut self.catalog, caller, room, slot, enabled)
    }

    pub fn set_slot_data(&mut self, caller: HolderId, room: RoomId, slot: SlotIndex, label: &[u8]) -> Result<()> {
        self.admin
            .set_slot_data(&mut self.catalog, caller, room, slot, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{day_start, ManualClock};
    use crate::reservation::SlotStatus;

    const OWNER: HolderId = HolderId([0x01; 20]);
    const ALICE: HolderId = HolderId([0xa1; 20]);

    fn ledger() -> (Ledger, ManualClock) {
        let clock = ManualClock::at_day(100);
        let config = LedgerConfig::new(OWNER);
        let mut ledger = Ledger::new(config, Arc::new(clock.clone())).unwrap();
        ledger.set_capacity(OWNER, 1, 5).unwrap();
        ledger.set_slot_enabled(OWNER, 1, 0, true).unwrap();
        (ledger, clock)
    }

    #[test]
    fn test_reserve_mints_matching_token() {
        let (mut ledger, _clock) = ledger();
        let day = ledger.reserve(1, 0, day_start(103), ALICE).unwrap();

        assert_eq!(day, 103);
        assert_eq!(ledger.token_supply(), 1);
        assert_eq!(ledger.token_at(0), Some(ReclamationToken::new(103, 0, 1)));
        assert_eq!(
            ledger.events_since(0)[0].kind,
            EventKind::ReservationMade {
                room: 1,
                slot: 0,
                holder: ALICE,
                day: 103
            }
        );
    }

    #[test]
    fn test_failed_reserve_mints_nothing() {
        let (mut ledger, _clock) = ledger();
        assert!(ledger.reserve(1, 1, day_start(103), ALICE).is_err());
        assert_eq!(ledger.token_supply(), 0);
        assert!(ledger.events_since(0).is_empty());
    }

    #[test]
    fn test_mint_failure_rolls_back_reservation() {
        let clock = ManualClock::at_day(100);
        let snapshot = LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            rooms: vec![RoomRecord {
                room: 1,
                capacity: 1,
                slots: [crate::Slot {
                    enabled: true,
                    data: [0u8; 16],
                }; 10],
            }],
            reservations: Vec::new(),
            start_index: u128::MAX,
            supply: 0,
            tokens: Vec::new(),
            next_event_seq: 0,
        };
        let mut ledger = Ledger::restore(snapshot, LedgerConfig::new(OWNER), Arc::new(clock)).unwrap();

        assert!(matches!(
            ledger.reserve(1, 0, day_start(101), ALICE),
            Err(LedgerError::RingExhausted)
        ));
        assert!(ledger.reservations().holder(1, 0, 101).is_zero());
        assert!(ledger.events_since(0).is_empty());
    }

    #[test]
    fn test_cancel_keeps_token() {
        let (mut ledger, _clock) = ledger();
        ledger.reserve(1, 0, day_start(101), ALICE).unwrap();
        ledger.cancel(1, 0, day_start(101), ALICE).unwrap();

        let view = ledger.query_room(1, day_start(101)).unwrap();
        assert_eq!(view.statuses[0], SlotStatus::Available);
        assert_eq!(ledger.token_supply(), 1);
        assert_eq!(ledger.events_since(1).len(), 1);
    }

    #[test]
    fn test_redeem_uses_clock() {
        let (mut ledger, clock) = ledger();
        ledger.reserve(1, 0, day_start(103), ALICE).unwrap();
        let cost = ledger.quote_cost(1).unwrap();

        clock.set_day(102);
        assert!(matches!(
            ledger.redeem(1, cost),
            Err(LedgerError::TokenNotYetRedeemable { .. })
        ));

        clock.set_day(104);
        let redemption = ledger.redeem(1, cost).unwrap();
        assert_eq!(redemption.start_index, 1);
        assert!(ledger.reservations().holder(1, 0, 103).is_zero());
    }

    #[test]
    fn test_admin_requires_owner() {
        let (mut ledger, _clock) = ledger();
        assert!(matches!(
            ledger.set_capacity(ALICE, 2, 5),
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(ledger.persist(ALICE).is_err());
    }

    #[test]
    fn test_persist_without_path() {
        let (ledger, _clock) = ledger();
        assert!(matches!(ledger.persist(OWNER), Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_open_restores_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::at_day(100);
        let config = LedgerConfig::new(OWNER).with_snapshot_path(dir.path().join("state.json"));

        let mut ledger = Ledger::open(config.clone(), Arc::new(clock.clone())).unwrap();
        ledger.set_capacity(OWNER, 1, 5).unwrap();
        ledger.set_slot_enabled(OWNER, 1, 0, true).unwrap();
        ledger.set_slot_data(OWNER, 1, 0, b"Desk A").unwrap();
        ledger.reserve(1, 0, day_start(102), ALICE).unwrap();
        ledger.persist(OWNER).unwrap();

        let reopened = Ledger::open(config, Arc::new(clock)).unwrap();
        assert_eq!(reopened.snapshot(), ledger.snapshot());
        assert_eq!(reopened.reservations().holder(1, 0, 102), ALICE);
        assert_eq!(reopened.token_at(0), Some(ReclamationToken::new(102, 0, 1)));
        assert_eq!(&reopened.catalog().slot_data(1, 0)[..6], b"Desk A");
    }

    #[test]
    fn test_event_log_is_bounded() {
        let clock = ManualClock::at_day(100);
        let config = LedgerConfig::new(OWNER).with_max_events(64);
        let mut ledger = Ledger::new(config, Arc::new(clock.clone())).unwrap();
        ledger.set_capacity(OWNER, 1, 5).unwrap();
        ledger.set_slot_enabled(OWNER, 1, 0, true).unwrap();
        let cost = ledger.quote_cost(1).unwrap();

        for day in 100..1100 {
            clock.set_day(day);
            ledger.reserve(1, 0, day_start(day), ALICE).unwrap();
            clock.set_day(day + 1);
            ledger.redeem(1, cost).unwrap();
        }

        assert!(ledger.reservations().is_empty());
        assert_eq!(ledger.token_supply(), 0);
        let events = ledger.events_since(0);
        assert_eq!(events.len(), 64);
        assert_eq!(events[0].seq, 2000 - 64);
        assert_eq!(ledger.snapshot().next_event_seq, 2000);
    }

    #[test]
    fn test_epoch_day_token_survives_restore() {
        // Room 0, slot 0, day 0 packs to the all-zero word
        let clock = ManualClock::new(60);
        let mut ledger = Ledger::new(LedgerConfig::new(OWNER), Arc::new(clock.clone())).unwrap();
        ledger.set_capacity(OWNER, 0, 1).unwrap();
        ledger.set_slot_enabled(OWNER, 0, 0, true).unwrap();
        assert_eq!(ledger.reserve(0, 0, 60, ALICE).unwrap(), 0);
        assert_eq!(ledger.token_at(0), Some(ReclamationToken::new(0, 0, 0)));

        let restored = Ledger::restore(ledger.snapshot(), LedgerConfig::new(OWNER), Arc::new(clock.clone())).unwrap();
        assert_eq!(restored.token_supply(), 1);
        assert_eq!(restored.token_at(0), Some(ReclamationToken::new(0, 0, 0)));
        assert_eq!(restored.snapshot(), ledger.snapshot());
    }

    #[test]
    fn test_prepare_persist_captures_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let clock = ManualClock::at_day(100);
        let mut ledger = Ledger::new(
            LedgerConfig::new(OWNER).with_snapshot_path(&path),
            Arc::new(clock),
        )
        .unwrap();
        ledger.set_capacity(OWNER, 1, 5).unwrap();

        assert!(matches!(ledger.prepare_persist(ALICE), Err(LedgerError::Unauthorized { .. })));
        let (target, snapshot) = ledger.prepare_persist(OWNER).unwrap();
        assert_eq!(target, path);
        assert_eq!(snapshot, ledger.snapshot());
        // Nothing is written until the caller saves
        assert!(!path.exists());
    }
}
