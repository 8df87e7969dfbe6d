use log::{debug, warn};
use zeroize::Zeroizing;

use crate::composed::KeyRing;
use crate::crypto::{self, sym::SymmetricKeyAlgorithm};
use crate::errors::{unsupported_err, Error, Result};
use crate::packet::{first_packet, Packet, PacketParser, PubKeyInner, PublicKeyEncryptedSessionKey};
use crate::session::SessionSplit;
use crate::types::{Password, PlainSecretParams, PublicParams};

/// Recovers the session key from a public key encrypted key packet,
/// using an armored private keyring.
pub fn session_from_key_packet(
    key_packet: &[u8],
    private_key: &str,
    passphrase: &Password,
) -> Result<SessionSplit> {
    let pkesk = read_key_packet(key_packet)?;
    let ring = KeyRing::from_armor(private_key).map_err(|err| match err {
        Error::ArmorDecode { message } => Error::KeyRingParse { message },
        other => other,
    })?;

    decrypt_with_ring(&pkesk, &ring, passphrase)
}

/// Recovers the session key from a public key encrypted key packet,
/// using a binary private keyring.
pub fn session_from_key_packet_bin(
    key_packet: &[u8],
    private_key: &[u8],
    passphrase: &Password,
) -> Result<SessionSplit> {
    let pkesk = read_key_packet(key_packet)?;
    let ring = KeyRing::from_bytes(private_key.to_vec())?;

    decrypt_with_ring(&pkesk, &ring, passphrase)
}

/// Recovers the session key from the password protected key packets in `key_packet`.
///
/// Every symmetric key packet is tried in order. A wrong password is detected only by the
/// recovered algorithm and key length, so it can go unnoticed.
pub fn session_from_symmetric_packet(key_packet: &[u8], password: &Password) -> Result<SessionSplit> {
    let mut packets = Vec::new();
    for packet in PacketParser::new(key_packet.to_vec()) {
        match packet {
            Ok(Packet::SymKeyEncryptedSessionKey(skesk)) => packets.push(skesk),
            Ok(packet) => debug!("ignoring {:?} packet", packet.tag()),
            Err(err) => {
                debug!("stopping at invalid packet: {}", err);
                break;
            }
        }
    }
    debug!("found {} symmetric key packets", packets.len());

    if !password.is_empty() {
        for skesk in &packets {
            match skesk.decrypt(password) {
                Ok((alg, session)) => return Ok(SessionSplit::from_parts(session, alg)),
                Err(err) => debug!("symmetric key packet did not decrypt: {}", err),
            }
        }
    }

    Err(Error::IncorrectPassword)
}

fn read_key_packet(input: &[u8]) -> Result<PublicKeyEncryptedSessionKey> {
    match first_packet(input.to_vec()) {
        Ok(Packet::PublicKeyEncryptedSessionKey(pkesk)) => Ok(pkesk),
        Ok(packet) => Err(Error::PacketParse {
            message: format!(
                "expected a public key encrypted session key, got {:?}",
                packet.tag()
            ),
        }),
        Err(err) => Err(err.into_packet_parse()),
    }
}

fn decrypt_with_ring(
    pkesk: &PublicKeyEncryptedSessionKey,
    ring: &KeyRing,
    passphrase: &Password,
) -> Result<SessionSplit> {
    let mut recovered = None;

    for key in ring.decryption_keys() {
        let key_id = key.key_id();
        if !pkesk.matches(&key_id) {
            debug!("skipping key {:x}: not the recipient {:x}", key_id, pkesk.id());
            continue;
        }

        match key.unlock(passphrase, |details, plain| decrypt_session_key(pkesk, details, plain)) {
            Ok(res) => {
                debug!("decrypted session key with {:x}", key_id);
                recovered = Some(res);
                break;
            }
            Err(err) => warn!("key {:x} failed to decrypt: {}", key_id, err),
        }
    }

    let Some((alg, session)) = recovered else {
        return Err(Error::DecryptionFailed);
    };
    if session.is_empty() {
        return Err(Error::NilSessionKey);
    }

    Ok(SessionSplit::from_parts(session, alg))
}

fn decrypt_session_key(
    pkesk: &PublicKeyEncryptedSessionKey,
    details: &PubKeyInner,
    plain: &PlainSecretParams,
) -> Result<(SymmetricKeyAlgorithm, Zeroizing<Vec<u8>>)> {
    let (PublicParams::RSA { n, e }, PlainSecretParams::RSA { d, p, q, .. }) =
        (details.public_params(), plain)
    else {
        unsupported_err!("decryption with {:?}", details.algorithm());
    };

    let key = crypto::rsa::private_key(n, e, d.as_bytes(), p.as_bytes(), q.as_bytes())?;
    pkesk.decrypt(&key)
}
