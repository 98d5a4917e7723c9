//! Minimal 32-byte word ABI encoding.
//!
//! Only the static types the engine touches are supported: `address`,
//! `uint8` and `uint256` (values limited to `u128`).

use crate::types::{Address, Amount};
use thiserror::Error;

/// Width of one ABI word.
pub const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("input too short: need {needed} bytes, have {available}")]
    TooShort { needed: usize, available: usize },

    #[error("word {index} has non-zero padding")]
    DirtyPadding { index: usize },

    #[error("expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("unexpected selector 0x{0}")]
    UnexpectedSelector(String),
}

/// Left-pad an address into a word.
pub fn encode_address(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - Address::LEN..].copy_from_slice(address.as_bytes());
    word
}

/// Big-endian uint256 word.
pub fn encode_uint(value: Amount) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_at(data: &[u8], index: usize) -> Result<&[u8], AbiError> {
    let start = index * WORD;
    let end = start + WORD;
    if data.len() < end {
        return Err(AbiError::TooShort {
            needed: end,
            available: data.len(),
        });
    }
    Ok(&data[start..end])
}

/// Decode the address stored in word `index`.
pub fn decode_address(data: &[u8], index: usize) -> Result<Address, AbiError> {
    let word = word_at(data, index)?;
    let (padding, body) = word.split_at(WORD - Address::LEN);
    if padding.iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyPadding { index });
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(body);
    Ok(Address::new(bytes))
}

/// Decode a uint256 that must fit in `u128`.
pub fn decode_uint(data: &[u8], index: usize) -> Result<Amount, AbiError> {
    let word = word_at(data, index)?;
    let (high, low) = word.split_at(WORD - 16);
    if high.iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyPadding { index });
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(low);
    Ok(u128::from_be_bytes(bytes))
}

/// Decode a uint8 word.
pub fn decode_u8(data: &[u8], index: usize) -> Result<u8, AbiError> {
    let word = word_at(data, index)?;
    if word[..WORD - 1].iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyPadding { index });
    }
    Ok(word[WORD - 1])
}
