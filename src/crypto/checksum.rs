use sha1::{Digest, Sha1};

use crate::errors::{ensure_eq, Result};

/// Two octet checksum: sum of all octets mod 65536.
#[inline]
pub fn calculate_simple(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |acc, v| acc.wrapping_add(u16::from(*v)))
}

/// Verifies a two octet checksum.
#[inline]
pub fn simple(actual: [u8; 2], data: &[u8]) -> Result<()> {
    // The checksum is the sum of the preceding octets, not including the
    // algorithm identifier, modulo 65536.
    let checksum = u16::from_be_bytes(actual);
    let expected_checksum = calculate_simple(data);

    ensure_eq!(checksum, expected_checksum, "invalid simple checksum");

    Ok(())
}

/// SHA1 checksum, first 20 octets.
#[inline]
pub fn calculate_sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Verifies a SHA1 checksum.
#[inline]
pub fn sha1(hash: &[u8], data: &[u8]) -> Result<()> {
    ensure_eq!(hash, &calculate_sha1(data)[..], "invalid SHA1 checksum");

    Ok(())
}
