//! CRC-16 over a frame's bit payload.
//!
//! Bit-serial polynomial long division, equivalent to appending 16 zero
//! bits to the frame and dividing by x^16 + x^12 + x^5 + 1. Initial
//! value 0x0000, no final XOR, no reflection. The byte-oriented
//! 0xFFFF-seeded CCITT variant produces different codes and is not used
//! here.

/// Generator polynomial: x^16 + x^12 + x^5 + 1.
pub const CRC_POLY: u16 = 0x1021;

/// Compute the CRC-16 of the first `bit_len` bits of `payload`,
/// MSB-first within each byte.
///
/// Pure and deterministic: identical inputs always yield the identical
/// 16-bit code.
///
/// # Panics
/// Panics if `payload` holds fewer than `bit_len` bits.
pub fn crc16(payload: &[u8], bit_len: usize) -> u16 {
    assert!(
        bit_len <= payload.len() * 8,
        "bit_len {} exceeds payload capacity {}",
        bit_len,
        payload.len() * 8
    );

    let mut crc: u16 = 0;
    for i in 0..bit_len {
        let bit = (payload[i / 8] >> (7 - (i % 8))) & 1 == 1;
        let top = crc & 0x8000 != 0;
        crc <<= 1;
        if top != bit {
            crc ^= CRC_POLY;
        }
    }
    crc
}

/// Recompute the CRC of `payload` and compare against `expected`.
pub fn verify(payload: &[u8], bit_len: usize, expected: u16) -> bool {
    crc16(payload, bit_len) == expected
}
