use std::io;

use bytes::{Buf, Bytes};
use log::debug;
use zeroize::Zeroizing;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, unsupported_err, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{Password, SkeskVersion, StringToKey, Tag};

/// Symmetric-Key Encrypted Session Key Packet, version 4.
/// <https://www.rfc-editor.org/rfc/rfc9580.html#name-version-4-symmetric-key-enc>
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct SymKeyEncryptedSessionKey {
    sym_algorithm: SymmetricKeyAlgorithm,
    s2k: StringToKey,
    #[debug("{:?}", encrypted_key.as_ref().map(hex::encode))]
    encrypted_key: Option<Bytes>,
}

impl SymKeyEncryptedSessionKey {
    /// Parses a `SymKeyEncryptedSessionKey` packet body.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let version = i.read_u8().map(SkeskVersion::from)?;
        if version != SkeskVersion::V4 {
            unsupported_err!("SKESK version {:?}", version);
        }

        let sym_algorithm = i.read_u8().map(SymmetricKeyAlgorithm::from)?;
        let s2k = StringToKey::from_buf(&mut i)?;
        let encrypted_key = i.rest();
        let encrypted_key = if encrypted_key.is_empty() {
            None
        } else {
            Some(encrypted_key)
        };

        Ok(SymKeyEncryptedSessionKey {
            sym_algorithm,
            s2k,
            encrypted_key,
        })
    }

    /// Wraps `session_key` with a key derived from `password`.
    ///
    /// The same algorithm protects the wrapped key and is recorded for the session key.
    pub fn encrypt_v4(
        password: &Password,
        session_key: &[u8],
        s2k: StringToKey,
        alg: SymmetricKeyAlgorithm,
    ) -> Result<Self> {
        ensure!(!password.is_empty(), "password must not be empty");
        ensure!(s2k.hash_alg().is_some(), "S2K must be able to derive keys");

        let key = s2k.derive_key(password.read(), alg.key_size())?;

        let mut encrypted_key = Zeroizing::new(Vec::with_capacity(1 + session_key.len()));
        encrypted_key.push(u8::from(alg));
        encrypted_key.extend_from_slice(session_key);

        let iv = vec![0u8; alg.block_size()];
        alg.encrypt_with_iv_regular(&key, &iv, &mut encrypted_key)?;

        Ok(SymKeyEncryptedSessionKey {
            sym_algorithm: alg,
            s2k,
            encrypted_key: Some(Bytes::copy_from_slice(&encrypted_key)),
        })
    }

    /// Recovers the session key and its algorithm with the given password.
    ///
    /// Without an encrypted key, the derived key is the session key.
    pub fn decrypt(&self, password: &Password) -> Result<(SymmetricKeyAlgorithm, Zeroizing<Vec<u8>>)> {
        debug!("decrypt session key, s2k {:?}", self.s2k.hash_alg());

        let key = self
            .s2k
            .derive_key(password.read(), self.sym_algorithm.key_size())?;

        let Some(encrypted_key) = &self.encrypted_key else {
            return Ok((self.sym_algorithm, key));
        };

        let mut decrypted = Zeroizing::new(encrypted_key.to_vec());
        let iv = vec![0u8; self.sym_algorithm.block_size()];
        self.sym_algorithm
            .decrypt_with_iv_regular(&key, &iv, &mut decrypted)?;

        let alg = SymmetricKeyAlgorithm::from(decrypted[0]);
        let session_key = &decrypted[1..];

        // without an integrity check, a wrong password shows as a bogus algorithm or length
        ensure!(alg.is_registered(), "invalid session key algorithm {:?}", alg);
        ensure!(
            session_key.len() == alg.key_size(),
            "invalid session key length {} for {:?}",
            session_key.len(),
            alg
        );

        Ok((alg, Zeroizing::new(session_key.to_vec())))
    }

    pub fn sym_algorithm(&self) -> SymmetricKeyAlgorithm {
        self.sym_algorithm
    }

    pub fn s2k(&self) -> &StringToKey {
        &self.s2k
    }
}

impl Serialize for SymKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[u8::from(SkeskVersion::V4), u8::from(self.sym_algorithm)])?;
        self.s2k.to_writer(writer)?;
        if let Some(ref key) = self.encrypted_key {
            writer.write_all(key)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let mut sum = 1 + 1;
        sum += self.s2k.write_len();
        if let Some(ref key) = self.encrypted_key {
            sum += key.len();
        }
        sum
    }
}

impl PacketTrait for SymKeyEncryptedSessionKey {
    fn tag(&self) -> Tag {
        Tag::SymKeyEncryptedSessionKey
    }
}
