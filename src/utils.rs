#![allow(clippy::cast_possible_truncation)]

use crate::error::{HwFactsError, HwFactsResult};
use std::fmt::Write;

const RATIO_FIELD_BITS: u32 = 8;
const RATIO_FIELD_MASK: u64 = (1 << RATIO_FIELD_BITS) - 1;

/// Number of 8-bit fields in a 64-bit ratio-limit register.
pub const RATIO_FIELDS: usize = (u64::BITS / RATIO_FIELD_BITS) as usize;

/// Decodes a hex string into one value per two-digit group, rightmost group first.
///
/// Firmware stores the highest-index entry in the most significant byte, so
/// `"0x0102"` decodes to `[2, 1]`.
pub fn decode_hex_vector(hex: &str) -> HwFactsResult<Vec<u8>> {
    let trimmed = hex.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let malformed = |reason| HwFactsError::MalformedHex {
        input: hex.to_string(),
        reason,
    };

    if digits.is_empty() {
        return Err(malformed("empty"));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed("non-hex character"));
    }
    if digits.len() % 2 != 0 {
        return Err(malformed("odd number of digits"));
    }

    let mut values = Vec::with_capacity(digits.len() / 2);
    for pair in digits.as_bytes().chunks_exact(2).rev() {
        // Both bytes are ASCII hex digits, checked above.
        let text = std::str::from_utf8(pair).map_err(|_| malformed("non-hex character"))?;
        let value = u8::from_str_radix(text, 16).map_err(|_| malformed("non-hex character"))?;
        values.push(value);
    }
    Ok(values)
}

/// Inverse of [`decode_hex_vector`]: the first value lands in the rightmost group.
#[must_use]
pub fn encode_hex_vector(values: &[u8]) -> String {
    let mut out = String::with_capacity(2 + values.len() * 2);
    out.push_str("0x");
    for value in values.iter().rev() {
        let _ = write!(out, "{value:02x}");
    }
    out
}

/// Places `value` in the `index`-th byte of a ratio-limit register.
#[must_use]
pub const fn ratio_field(value: u8, index: u32) -> u64 {
    ((value as u64) & RATIO_FIELD_MASK) << (index * RATIO_FIELD_BITS)
}

/// Reads the `index`-th byte of a ratio-limit register.
#[must_use]
pub const fn ratio_field_value(register: u64, index: u32) -> u8 {
    ((register >> (index * RATIO_FIELD_BITS)) & RATIO_FIELD_MASK) as u8
}
