use log::debug;
use rand::{CryptoRng, Rng};

use crate::composed::KeyRing;
use crate::errors::{Error, Result};
use crate::packet::{PacketTrait, PublicKeyEncryptedSessionKey, SymKeyEncryptedSessionKey};
use crate::session::{SessionConfig, SessionSplit};
use crate::types::{Password, StringToKey};

fn serialization(err: Error) -> Error {
    Error::Serialization {
        source: Box::new(err),
    }
}

/// Encrypts the session key to the first usable key of an armored public keyring.
///
/// Returns a complete key packet, header included.
pub fn key_packet_with_public_key<R: CryptoRng + Rng>(
    rng: R,
    split: &SessionSplit,
    public_key: &str,
) -> Result<Vec<u8>> {
    let ring = KeyRing::from_armor(public_key)?;
    key_packet_for_ring(rng, split, &ring)
}

/// Encrypts the session key to the first usable key of a binary public keyring.
pub fn key_packet_with_public_key_bin<R: CryptoRng + Rng>(
    rng: R,
    split: &SessionSplit,
    public_key: &[u8],
) -> Result<Vec<u8>> {
    let ring = KeyRing::from_bytes(public_key.to_vec())?;
    key_packet_for_ring(rng, split, &ring)
}

fn key_packet_for_ring<R: CryptoRng + Rng>(
    rng: R,
    split: &SessionSplit,
    ring: &KeyRing,
) -> Result<Vec<u8>> {
    if ring.is_empty() {
        return Err(Error::EmptyKeyRing);
    }
    let key = ring.encryption_key().ok_or(Error::NoUsablePublicKey)?;
    debug!(
        "encrypting {} session key to {:x}",
        split.algorithm_name(),
        key.key_id()
    );

    let pkesk = PublicKeyEncryptedSessionKey::from_session_key(
        rng,
        split.session(),
        split.algorithm(),
        key.details(),
    )
    .map_err(serialization)?;

    pkesk.to_bytes_with_header().map_err(serialization)
}

/// Wraps the session key with a password, using the default [`SessionConfig`].
pub fn symmetric_key_packet_with_password<R: CryptoRng + Rng>(
    rng: R,
    split: &SessionSplit,
    password: &Password,
) -> Result<Vec<u8>> {
    symmetric_key_packet_with_config(rng, split, password, &SessionConfig::default())
}

/// Wraps the session key with a password, with the S2K parameters from `config`.
pub fn symmetric_key_packet_with_config<R: CryptoRng + Rng>(
    rng: R,
    split: &SessionSplit,
    password: &Password,
    config: &SessionConfig,
) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(Error::EmptyPassword);
    }

    let s2k = StringToKey::new_iterated(rng, config.s2k_hash, config.s2k_count);
    let skesk =
        SymKeyEncryptedSessionKey::encrypt_v4(password, split.session(), s2k, split.algorithm())
            .map_err(serialization)?;

    skesk.to_bytes_with_header().map_err(serialization)
}
