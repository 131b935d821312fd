//! Tests for the packed token word layout
//!
//! A token word is 32 bytes read as a big-endian 256-bit integer:
//! bytes 0..8 reserved, 8..16 room, 16..24 slot, 24..32 day.

use slotledger_core::token::{DAY_RANGE, FIELD_SIZE, RESERVED_RANGE, ROOM_RANGE, SLOT_RANGE};
use slotledger_core::{ReclamationToken, TOKEN_WORD_SIZE};

#[test]
fn test_word_constants() {
    assert_eq!(TOKEN_WORD_SIZE, 32);
    assert_eq!(FIELD_SIZE, 8);
    assert_eq!(RESERVED_RANGE, 0..8);
    assert_eq!(ROOM_RANGE, 8..16);
    assert_eq!(SLOT_RANGE, 16..24);
    assert_eq!(DAY_RANGE, 24..32);
}

#[test]
fn test_day_occupies_lowest_bits() {
    let word = ReclamationToken::new(103, 0, 1).to_word();

    // Day 103 is the integer's least significant byte
    assert_eq!(word[31], 103);
    assert_eq!(&word[24..31], &[0u8; 7]);
    // Room 1 sits at bit 128
    assert_eq!(word[15], 1);
    assert_eq!(&word[RESERVED_RANGE], &[0u8; 8]);
}

#[test]
fn test_word_roundtrip() {
    let token = ReclamationToken::new(20_000, 9, 0x0102_0304_0506_0708);
    let word = token.to_word();
    assert_eq!(word.len(), TOKEN_WORD_SIZE);

    assert_eq!(&word[ROOM_RANGE], &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(&word[SLOT_RANGE], &9u64.to_be_bytes());
    assert_eq!(&word[DAY_RANGE], &20_000u64.to_be_bytes());

    assert_eq!(ReclamationToken::from_word(&word), token);
}

#[test]
fn test_hex_form() {
    let word = ReclamationToken::new(103, 0, 1).to_word();
    let hex = ReclamationToken::word_hex(&word);

    assert!(hex.starts_with("0x"));
    assert_eq!(hex.len(), 2 + 2 * TOKEN_WORD_SIZE);
    assert!(hex.ends_with("0000000000000067"));

    let parsed = ReclamationToken::word_from_hex(&hex).unwrap();
    assert_eq!(parsed, word);
}

#[test]
fn test_hex_rejects_wrong_length() {
    assert!(ReclamationToken::word_from_hex("0x1234").is_err());
    assert!(ReclamationToken::word_from_hex("not hex").is_err());
}

#[test]
fn test_ring_of_words() {
    // Simulate a run of consecutive ring words
    let tokens = vec![
        ReclamationToken::new(101, 0, 1),
        ReclamationToken::new(102, 4, 1),
        ReclamationToken::new(102, 9, 77),
    ];

    let mut bytes = Vec::with_capacity(tokens.len() * TOKEN_WORD_SIZE);
    for token in &tokens {
        bytes.extend_from_slice(&token.to_word());
    }
    assert_eq!(bytes.len(), 3 * TOKEN_WORD_SIZE);

    for (i, expected) in tokens.iter().enumerate() {
        let start = i * TOKEN_WORD_SIZE;
        let word: [u8; TOKEN_WORD_SIZE] = bytes[start..start + TOKEN_WORD_SIZE].try_into().unwrap();
        assert_eq!(ReclamationToken::from_word(&word), *expected);
    }
}
