//! Reclamation-token ring
//!
//! Live tokens occupy positions `[start_index, start_index + supply)`. Mint
//! appends at `start_index + supply`; redemption consumes a prefix of the live
//! range, oldest first. Positions below `start_index` hold the zero word and
//! are never read again. Positions are never reused.
//!
//! Redemption is all-or-nothing: every token in the batch is decoded and
//! checked before any reservation record or ring word is touched.

use std::collections::BTreeMap;

use crate::reservation::ClearReservation;
use crate::token::{ReclamationToken, TokenWord, TOKEN_WORD_SIZE};
use crate::{Day, LedgerConfig, LedgerError, Result, RingPosition};

/// Resource units one redeemed token is worth
pub const REFUND_UNIT_VALUE: u128 = 15_000;

/// Fixed-point scale of [`TokenPricing::estimate_optimal_amount`]
const ESTIMATE_SCALE: u128 = 1_000;

/// Flat-rate pricing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPricing {
    pub cost_per_resource_unit: u128,
    pub per_token_resource_yield: u128,
    pub rounding_bias: u128,
}

impl TokenPricing {
    /// Payment `redeem(amount, ..)` requires
    pub fn quote_cost(&self, amount: u128) -> Result<u128> {
        amount
            .checked_mul(self.cost_per_resource_unit)
            .and_then(|v| v.checked_mul(REFUND_UNIT_VALUE))
            .ok_or(LedgerError::Overflow("quote_cost"))
    }

    /// Batch size recommended for a resource budget
    pub fn estimate_optimal_amount(&self, resource_budget: u128) -> Result<u128> {
        if self.per_token_resource_yield == 0 {
            return Err(LedgerError::InvalidConfig(
                "per_token_resource_yield must be non-zero".to_string(),
            ));
        }
        let scaled = resource_budget
            .checked_mul(ESTIMATE_SCALE)
            .ok_or(LedgerError::Overflow("estimate_optimal_amount"))?;
        let biased = (scaled / self.per_token_resource_yield)
            .checked_add(self.rounding_bias)
            .ok_or(LedgerError::Overflow("estimate_optimal_amount"))?;
        Ok(biased / ESTIMATE_SCALE)
    }
}

impl From<&LedgerConfig> for TokenPricing {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            cost_per_resource_unit: config.cost_per_resource_unit,
            per_token_resource_yield: config.per_token_resource_yield,
            rounding_bias: config.rounding_bias,
        }
    }
}

/// Outcome of a successful redemption batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub amount: u128,
    pub cost: u128,
    /// `payment - cost`, owed back to the caller
    pub refund: u128,
    /// Tokens cleared, oldest first
    pub cleared: Vec<ReclamationToken>,
    pub start_index: RingPosition,
    pub supply: u128,
}

#[derive(Debug, Clone)]
pub struct TokenLedger {
    start_index: RingPosition,
    supply: u128,
    /// Non-zero physical words; absent positions read as zero
    words: BTreeMap<RingPosition, TokenWord>,
    pricing: TokenPricing,
}

impl TokenLedger {
    pub fn new(pricing: TokenPricing) -> Self {
        Self {
            start_index: 0,
            supply: 0,
            words: BTreeMap::new(),
            pricing,
        }
    }

    /// Rebuild a ring from its live words in position order
    ///
    /// Liveness is positional: a live word may be all zeros, since the
    /// token `(day 0, slot 0, room 0)` packs to the zero word.
    pub fn from_parts(
        pricing: TokenPricing,
        start_index: RingPosition,
        live: Vec<TokenWord>,
    ) -> Result<Self> {
        let supply = live.len() as u128;
        start_index
            .checked_add(supply)
            .ok_or(LedgerError::RingExhausted)?;

        let words = live
            .into_iter()
            .enumerate()
            .map(|(offset, word)| (start_index + offset as u128, word))
            .collect();

        Ok(Self {
            start_index,
            supply,
            words,
            pricing,
        })
    }

    pub fn start_index(&self) -> RingPosition {
        self.start_index
    }

    pub fn supply(&self) -> u128 {
        self.supply
    }

    pub fn pricing(&self) -> &TokenPricing {
        &self.pricing
    }

    /// Physical word at `position`; zero outside the live range
    pub fn word_at(&self, position: RingPosition) -> TokenWord {
        self.words
            .get(&position)
            .copied()
            .unwrap_or([0u8; TOKEN_WORD_SIZE])
    }

    /// Decoded live token at `position`
    pub fn token_at(&self, position: RingPosition) -> Option<ReclamationToken> {
        self.words.get(&position).map(ReclamationToken::from_word)
    }

    /// Live tokens with their positions, oldest first
    pub fn live(&self) -> impl Iterator<Item = (RingPosition, ReclamationToken)> + '_ {
        self.words
            .iter()
            .map(|(pos, word)| (*pos, ReclamationToken::from_word(word)))
    }

    /// Live words, oldest first
    pub fn live_words(&self) -> Vec<TokenWord> {
        self.words.values().copied().collect()
    }

    /// Append a token at the end of the live range; returns its position
    pub fn mint(&mut self, token: ReclamationToken) -> Result<RingPosition> {
        let position = self
            .start_index
            .checked_add(self.supply)
            .ok_or(LedgerError::RingExhausted)?;
        let supply = self.supply.checked_add(1).ok_or(LedgerError::RingExhausted)?;
        // start_index must stay representable once this position is redeemed
        position.checked_add(1).ok_or(LedgerError::RingExhausted)?;

        self.words.insert(position, token.to_word());
        self.supply = supply;

        tracing::debug!(
            position,
            day = token.day,
            slot = token.slot,
            room = token.room,
            "Token minted"
        );
        Ok(position)
    }

    pub fn quote_cost(&self, amount: u128) -> Result<u128> {
        self.pricing.quote_cost(amount)
    }

    pub fn estimate_optimal_amount(&self, resource_budget: u128) -> Result<u128> {
        self.pricing.estimate_optimal_amount(resource_budget)
    }

    /// Redeem the `amount` oldest tokens, clearing the records they back
    pub fn redeem<C: ClearReservation>(
        &mut self,
        amount: u128,
        payment: u128,
        current_day: Day,
        records: &mut C,
    ) -> Result<Redemption> {
        if amount > self.supply {
            return Err(LedgerError::InsufficientSupply {
                requested: amount,
                supply: self.supply,
            });
        }
        let cost = self.quote_cost(amount)?;
        if payment < cost {
            return Err(LedgerError::InsufficientPayment { cost, payment });
        }

        let mut batch = Vec::new();
        for offset in 0..amount {
            let position = self.start_index + offset;
            let token = ReclamationToken::from_word(&self.word_at(position));
            if token.day >= current_day {
                return Err(LedgerError::TokenNotYetRedeemable {
                    position,
                    day: token.day,
                    current_day,
                });
            }
            batch.push(token);
        }

        for token in &batch {
            records.clear_reservation(token.room, token.slot, token.day);
            self.words.remove(&self.start_index);
            self.start_index += 1;
        }
        self.supply -= amount;

        let refund = payment - cost;
        tracing::info!(
            amount,
            cost,
            refund,
            start_index = self.start_index,
            supply = self.supply,
            "Tokens redeemed"
        );

        Ok(Redemption {
            amount,
            cost,
            refund,
            cleared: batch,
            start_index: self.start_index,
            supply: self.supply,
        })
    }
}
