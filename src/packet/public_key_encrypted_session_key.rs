use std::io;

use bytes::{Buf, Bytes};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::crypto::{self, Decryptor};
use crate::errors::{ensure, unsupported_err, Result};
use crate::packet::{PacketTrait, PubKeyInner};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{KeyId, Mpi, PkeskVersion, PublicParams, Tag};

/// The algorithm specific part of a PKESK.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum PkeskBytes {
    /// `m^e mod n`
    Rsa { mpi: Mpi },
    /// Fields of algorithms we only carry along.
    Other {
        #[debug("{}", hex::encode(data))]
        data: Bytes,
    },
}

/// Public Key Encrypted Session Key Packet (PKESK), version 3.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-public-key-encrypted-sessio>
///
/// A PKESK contains a session key that has been encrypted to a specific public key.
/// The recipient is named by key id, the all-zero id addresses an anonymous recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEncryptedSessionKey {
    id: KeyId,
    pk_algo: PublicKeyAlgorithm,
    values: PkeskBytes,
}

impl PublicKeyEncryptedSessionKey {
    /// Parses a `PublicKeyEncryptedSessionKey` packet body.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let version = i.read_u8().map(PkeskVersion::from)?;
        if version != PkeskVersion::V3 {
            unsupported_err!("PKESK version {:?}", version);
        }

        let id = KeyId::from(i.read_array::<8>()?);
        let pk_algo = i.read_u8().map(PublicKeyAlgorithm::from)?;

        let values = match pk_algo {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
                let mpi = Mpi::from_buf(&mut i)?;
                ensure!(!i.has_remaining(), "trailing data in RSA PKESK");
                PkeskBytes::Rsa { mpi }
            }
            _ => PkeskBytes::Other { data: i.rest() },
        };

        Ok(PublicKeyEncryptedSessionKey {
            id,
            pk_algo,
            values,
        })
    }

    /// Encrypts the given session key to `pkey` as a v3 pkesk.
    pub fn from_session_key<R: CryptoRng + Rng>(
        mut rng: R,
        session_key: &[u8],
        alg: SymmetricKeyAlgorithm,
        pkey: &PubKeyInner,
    ) -> Result<Self> {
        // the symmetric key algorithm, the session key and its checksum
        let mut data = Zeroizing::new(Vec::with_capacity(1 + session_key.len() + 2));
        data.push(u8::from(alg));
        data.extend_from_slice(session_key);
        data.extend_from_slice(&checksum::calculate_simple(session_key).to_be_bytes());

        let values = match pkey.public_params() {
            PublicParams::RSA { n, e } => {
                let mpi = crypto::rsa::encrypt(&mut rng, n, e, &data)?;
                PkeskBytes::Rsa { mpi }
            }
            _ => unsupported_err!("encryption to {:?}", pkey.algorithm()),
        };

        Ok(PublicKeyEncryptedSessionKey {
            id: pkey.key_id(),
            pk_algo: pkey.algorithm(),
            values,
        })
    }

    /// Decrypts the session key, returning the algorithm and the raw key.
    ///
    /// The decrypted payload is `alg || key || checksum`.
    pub fn decrypt<D>(&self, key: &D) -> Result<(SymmetricKeyAlgorithm, Zeroizing<Vec<u8>>)>
    where
        D: for<'a> Decryptor<EncryptionFields<'a> = &'a Mpi>,
    {
        let PkeskBytes::Rsa { mpi } = &self.values else {
            unsupported_err!("decryption of {:?} session keys", self.pk_algo);
        };

        let decrypted = key.decrypt(mpi)?;
        ensure!(decrypted.len() >= 3, "session key payload too short");

        let alg = SymmetricKeyAlgorithm::from(decrypted[0]);
        let (session_key, sum) = decrypted[1..].split_at(decrypted.len() - 3);
        checksum::simple([sum[0], sum[1]], session_key)?;

        Ok((alg, Zeroizing::new(session_key.to_vec())))
    }

    /// The recipient key id.
    pub fn id(&self) -> &KeyId {
        &self.id
    }

    /// True if `key_id` may be the recipient of this packet.
    pub fn matches(&self, key_id: &KeyId) -> bool {
        self.id.is_wildcard() || &self.id == key_id
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    pub fn values(&self) -> &PkeskBytes {
        &self.values
    }
}

impl Serialize for PublicKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[u8::from(PkeskVersion::V3)])?;
        writer.write_all(self.id.as_ref())?;
        writer.write_all(&[u8::from(self.pk_algo)])?;

        match &self.values {
            PkeskBytes::Rsa { mpi } => mpi.to_writer(writer)?,
            PkeskBytes::Other { data } => writer.write_all(data)?,
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let values = match &self.values {
            PkeskBytes::Rsa { mpi } => mpi.write_len(),
            PkeskBytes::Other { data } => data.len(),
        };
        1 + 8 + 1 + values
    }
}

impl PacketTrait for PublicKeyEncryptedSessionKey {
    fn tag(&self) -> Tag {
        Tag::PublicKeyEncryptedSessionKey
    }
}
