//! Packed reclamation-token word
//!
//! A token is stored as one 32-byte word read as a big-endian 256-bit
//! integer. The word carries no tag, checksum or version marker: the field
//! windows below are the whole format, and decode must use exactly the
//! windows encode wrote.
//!
//! ```text
//! bits    255..192   191..128   127..64    63..0
//! bytes    0..8       8..16      16..24     24..32
//!         reserved    room       slot       day
//! ```
//!
//! The reserved window is written as zero and ignored on read. Changing any
//! width means a new format, coordinated across every reader of the ring.

use crate::{Day, RoomId, SlotIndex};

/// Bytes in one packed token word
pub const TOKEN_WORD_SIZE: usize = 32;

/// One physical ring word
pub type TokenWord = [u8; TOKEN_WORD_SIZE];

/// Width of each packed field in bytes
pub const FIELD_SIZE: usize = 8;

/// Byte range of the reserved high field
pub const RESERVED_RANGE: std::ops::Range<usize> = 0..8;
/// Byte range of the room id
pub const ROOM_RANGE: std::ops::Range<usize> = 8..16;
/// Byte range of the slot index
pub const SLOT_RANGE: std::ops::Range<usize> = 16..24;
/// Byte range of the day index (lowest 64 bits)
pub const DAY_RANGE: std::ops::Range<usize> = 24..32;

/// Decoded token: the reservation record a ring word points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ReclamationToken {
    pub day: Day,
    pub slot: SlotIndex,
    pub room: RoomId,
}

impl ReclamationToken {
    pub fn new(day: Day, slot: SlotIndex, room: RoomId) -> Self {
        Self { day, slot, room }
    }

    /// Pack into a ring word
    pub fn to_word(&self) -> TokenWord {
        let mut word = [0u8; TOKEN_WORD_SIZE];
        word[ROOM_RANGE].copy_from_slice(&self.room.to_be_bytes());
        word[SLOT_RANGE].copy_from_slice(&self.slot.to_be_bytes());
        word[DAY_RANGE].copy_from_slice(&self.day.to_be_bytes());
        word
    }

    /// Unpack a ring word; the reserved window is ignored
    pub fn from_word(word: &TokenWord) -> Self {
        Self {
            day: read_field(word, DAY_RANGE),
            slot: read_field(word, SLOT_RANGE),
            room: read_field(word, ROOM_RANGE),
        }
    }

    /// True for the all-zero word a reclaimed position holds
    ///
    /// `(0, 0, 0)` also packs to zero, so liveness is decided by ring position.
    pub fn is_cleared(word: &TokenWord) -> bool {
        word.iter().all(|b| *b == 0)
    }

    /// `0x`-prefixed hex of the packed word
    pub fn word_hex(word: &TokenWord) -> String {
        format!("0x{}", hex::encode(word))
    }

    /// Parse a word from its hex form
    pub fn word_from_hex(s: &str) -> Result<TokenWord, String> {
        crate::identity::hex_bytes::decode_fixed(s)
    }
}

fn read_field(word: &TokenWord, range: std::ops::Range<usize>) -> u64 {
    let mut field = [0u8; FIELD_SIZE];
    field.copy_from_slice(&word[range]);
    u64::from_be_bytes(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_windows_are_disjoint() {
        assert_eq!(RESERVED_RANGE.end, ROOM_RANGE.start);
        assert_eq!(ROOM_RANGE.end, SLOT_RANGE.start);
        assert_eq!(SLOT_RANGE.end, DAY_RANGE.start);
        assert_eq!(DAY_RANGE.end, TOKEN_WORD_SIZE);
        for range in [RESERVED_RANGE, ROOM_RANGE, SLOT_RANGE, DAY_RANGE] {
            assert_eq!(range.len(), FIELD_SIZE);
        }
    }

    #[test]
    fn test_layout_matches_integer_view() {
        let word = ReclamationToken::new(103, 0, 1).to_word();
        // As a 256-bit integer: 1 << 128 | 0 << 64 | 103
        let mut expected = [0u8; TOKEN_WORD_SIZE];
        expected[15] = 1;
        expected[31] = 103;
        assert_eq!(word, expected);
    }

    #[test]
    fn test_extreme_values() {
        let token = ReclamationToken::new(u64::MAX, u64::MAX, u64::MAX);
        let word = token.to_word();
        assert_eq!(&word[RESERVED_RANGE], &[0u8; 8]);
        assert_eq!(ReclamationToken::from_word(&word), token);
    }

    #[test]
    fn test_reserved_bits_ignored_on_read() {
        let token = ReclamationToken::new(7, 3, 42);
        let mut word = token.to_word();
        word[RESERVED_RANGE].copy_from_slice(&[0xff; 8]);
        assert_eq!(ReclamationToken::from_word(&word), token);
    }

    #[test]
    fn test_cleared_word() {
        assert!(ReclamationToken::is_cleared(&[0u8; TOKEN_WORD_SIZE]));
        assert!(!ReclamationToken::is_cleared(&ReclamationToken::new(1, 0, 0).to_word()));
    }

    #[test]
    fn test_hex_form() {
        let word = ReclamationToken::new(103, 0, 1).to_word();
        let text = ReclamationToken::word_hex(&word);
        assert_eq!(text.len(), 2 + 2 * TOKEN_WORD_SIZE);
        assert_eq!(ReclamationToken::word_from_hex(&text).unwrap(), word);
        assert!(ReclamationToken::word_from_hex("0x00").is_err());
    }
}
