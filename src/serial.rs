//! Domain-derived certificate serial numbers.
//!
//! `serial = (sum of code points) * (character count) * r`, with `r` drawn
//! uniformly from `[0, SERIAL_RANDOM_BOUND)` on every call. Nothing is
//! persisted, so two runs can collide; the random factor only makes that
//! unlikely. Callers needing strict uniqueness should allocate serials from
//! a counter or a UUID instead.

use rand::Rng;

/// Exclusive upper bound of the random factor.
pub const SERIAL_RANDOM_BOUND: u64 = 100_000;

/// Derive a fresh serial number for `hostname`.
pub fn derive_serial(hostname: &str) -> u64 {
    let draw = rand::rng().random_range(0..SERIAL_RANDOM_BOUND);
    let serial = serial_from_parts(hostname, draw);
    tracing::debug!(hostname, serial, "derived certificate serial");
    serial
}

/// The deterministic part of [`derive_serial`] for a given random draw.
///
/// Hostnames are at most 253 characters, which keeps the product far below
/// `u64::MAX` for any draw under [`SERIAL_RANDOM_BOUND`].
pub fn serial_from_parts(hostname: &str, draw: u64) -> u64 {
    let code_point_sum: u64 = hostname.chars().map(|c| u64::from(u32::from(c))).sum();
    let length = hostname.chars().count() as u64;
    code_point_sum
        .saturating_mul(length)
        .saturating_mul(draw)
}

/// Minimal big-endian encoding of `serial` for an X.509 INTEGER.
pub fn to_serial_bytes(serial: u64) -> Vec<u8> {
    let bytes = serial.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_from_parts() {
        // 'a' + 'b' = 97 + 98 = 195; length 2
        assert_eq!(serial_from_parts("ab", 1), 390);
        assert_eq!(serial_from_parts("ab", 10), 3900);
        assert_eq!(serial_from_parts("ab", 0), 0);
        assert_eq!(serial_from_parts("", 99_999), 0);
    }

    #[test]
    fn test_serial_counts_characters_not_bytes() {
        // 'é' is U+00E9 (233) and two bytes in UTF-8.
        assert_eq!(serial_from_parts("é", 1), 233);
    }

    #[test]
    fn test_derive_serial_is_a_multiple_of_the_host_weight() {
        let weight = serial_from_parts("example.com", 1);
        for _ in 0..32 {
            let serial = derive_serial("example.com");
            assert_eq!(serial % weight, 0);
            assert!(serial < weight * SERIAL_RANDOM_BOUND);
        }
    }

    #[test]
    fn test_derive_serial_varies_between_calls() {
        let serials: std::collections::HashSet<u64> =
            (0..8).map(|_| derive_serial("example.com")).collect();
        assert!(serials.len() > 1);
    }

    #[test]
    fn test_to_serial_bytes() {
        assert_eq!(to_serial_bytes(0), vec![0]);
        assert_eq!(to_serial_bytes(390), vec![0x01, 0x86]);
        assert_eq!(to_serial_bytes(u64::MAX), vec![0xFF; 8]);
    }
}
