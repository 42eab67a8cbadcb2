//! Zero checksum as used by the FRU common header and all info areas
//!
//! See the IPMI Platform Management FRU Information Storage Definition v1.0,
//! section 16.2: the checksum byte is chosen so that all bytes of the covered
//! span, including the checksum itself, add up to zero modulo 256.

use core::num::Wrapping;

/// Two's complement of the sum of the bytes
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().map(|b| Wrapping(*b)).sum::<Wrapping<u8>>();
    (-sum).0
}

/// Check a stored checksum against the data it covers.
pub fn verify(data: &[u8], stored: u8) -> bool {
    checksum(data) == stored
}

#[test]
fn checksum_closes_span() {
    let data = [0x01, 0x00, 0x01, 0x03, 0x0a, 0x00, 0x00];
    let c = checksum(&data);
    assert_eq!(c, 0xf1);
    let sum = data.iter().fold(c, |acc, b| acc.wrapping_add(*b));
    assert_eq!(sum, 0);
}

#[test]
fn checksum_of_nothing_is_zero() {
    assert_eq!(checksum(&[]), 0);
    assert_eq!(checksum(&[0x00; 8]), 0);
}

#[test]
fn verify_detects_mismatch() {
    let data = [0xc4, b'A', b'c', b'm', b'e'];
    let c = checksum(&data);
    assert!(verify(&data, c));
    assert!(!verify(&data, c.wrapping_add(1)));
}
