//! Bit twiddling helpers for 16-bit two's complement values.

/// Implements sign extension as described at [Sign extension](https://en.wikipedia.org/wiki/Sign_extension).
///
/// Only the lowest `valid_bits` bits of `bits` are taken into account, the result is the 16-bit
/// two's complement representation of that field.
///
/// # Panics
/// - in debug builds if `valid_bits` is not in `1..16`
#[must_use]
pub const fn sign_extend(bits: u16, valid_bits: u8) -> u16 {
    debug_assert!(valid_bits > 0 && valid_bits < 16, "invalid field width");
    let bits = bits & ((1 << valid_bits) - 1);
    let most_significant_bit = bits >> (valid_bits - 1);
    if most_significant_bit == 1 {
        // negative: 1-extend
        bits | (0xFFFF << valid_bits)
    } else {
        // positive, already 0-extended
        bits
    }
}
