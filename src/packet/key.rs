use bytes::{Buf, Bytes};
use log::debug;
use sha1::{Digest, Sha1};

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::types::{KeyId, KeyVersion, PublicParams, SecretParams};

/// The public part of a key packet, shared by all four key packet types.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.2>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct PubKeyInner {
    version: KeyVersion,
    created_at: u32,
    algorithm: PublicKeyAlgorithm,
    public_params: PublicParams,
    key_id: KeyId,
    /// The serialized public fields, as hashed for the fingerprint.
    #[debug(skip)]
    raw: Bytes,
}

impl PubKeyInner {
    /// Parses the public fields of a key packet.
    ///
    /// Returns the parsed fields and leaves `i` positioned after them.
    fn from_bytes(i: &mut Bytes) -> Result<Self> {
        let start = i.clone();

        let version = i.read_u8().map(KeyVersion::from)?;
        if version != KeyVersion::V4 {
            unsupported_err!("key version {:?}", version);
        }

        let created_at = i.read_be_u32()?;
        let algorithm = i.read_u8().map(PublicKeyAlgorithm::from)?;
        let public_params = PublicParams::from_buf(algorithm, &mut *i)?;

        let consumed = start.len() - i.remaining();
        let raw = start.slice(..consumed);
        let key_id = v4_key_id(&raw);

        debug!("key {:x} ({:?})", key_id, algorithm);

        Ok(PubKeyInner {
            version,
            created_at,
            algorithm,
            public_params,
            key_id,
            raw,
        })
    }

    pub fn version(&self) -> KeyVersion {
        self.version
    }

    /// Creation time, seconds since the unix epoch.
    pub fn created_at(&self) -> u32 {
        self.created_at
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn public_params(&self) -> &PublicParams {
        &self.public_params
    }

    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// The v4 fingerprint, SHA1 over the public key packet.
    pub fn fingerprint(&self) -> [u8; 20] {
        v4_fingerprint(&self.raw)
    }
}

fn v4_fingerprint(raw: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update([0x99]);
    hasher.update((raw.len() as u16).to_be_bytes());
    hasher.update(raw);
    hasher.finalize().into()
}

/// The key id is the low 64 bits of the fingerprint.
fn v4_key_id(raw: &[u8]) -> KeyId {
    let fp = v4_fingerprint(raw);
    let mut id = [0u8; 8];
    id.copy_from_slice(&fp[12..]);
    KeyId::from(id)
}

macro_rules! impl_public_key {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Debug)]
        pub struct $name(PubKeyInner);

        impl $name {
            pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
                let mut data = i.rest();
                let inner = PubKeyInner::from_bytes(&mut data)?;
                Ok(Self(inner))
            }

            pub fn inner(&self) -> &PubKeyInner {
                &self.0
            }

            pub fn into_inner(self) -> PubKeyInner {
                self.0
            }
        }
    };
}

macro_rules! impl_secret_key {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug)]
        pub struct $name {
            details: PubKeyInner,
            secret_params: SecretParams,
        }

        impl $name {
            pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
                let mut data = i.rest();
                let details = PubKeyInner::from_bytes(&mut data)?;
                let secret_params = SecretParams::from_buf(data, details.algorithm())?;
                Ok(Self {
                    details,
                    secret_params,
                })
            }

            pub fn inner(&self) -> &PubKeyInner {
                &self.details
            }

            pub fn secret_params(&self) -> &SecretParams {
                &self.secret_params
            }

            pub fn into_parts(self) -> (PubKeyInner, SecretParams) {
                (self.details, self.secret_params)
            }
        }
    };
}

impl_public_key!(PublicKey, "Public Key Packet");
impl_public_key!(PublicSubkey, "Public Subkey Packet");
impl_secret_key!(SecretKey, "Secret Key Packet");
impl_secret_key!(SecretSubkey, "Secret Subkey Packet");

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::crypto::checksum;
    use crate::types::{Mpi, PlainSecretParams};

    fn rsa_public_body() -> Vec<u8> {
        hex!("04 5f5e1000 01 0009 01ff 0011 010001").to_vec()
    }

    #[test]
    fn test_public_key() {
        let body = rsa_public_body();
        let key = PublicKey::from_buf(&body[..]).unwrap();
        let inner = key.inner();
        assert_eq!(inner.version(), KeyVersion::V4);
        assert_eq!(inner.created_at(), 0x5f5e1000);
        assert_eq!(inner.algorithm(), PublicKeyAlgorithm::RSA);
        assert_eq!(
            inner.public_params(),
            &PublicParams::RSA {
                n: Mpi::from_slice(&hex!("01ff")),
                e: Mpi::from_slice(&hex!("010001")),
            }
        );

        let mut hashed = vec![0x99, 0x00, body.len() as u8];
        hashed.extend_from_slice(&body);
        let fp: [u8; 20] = Sha1::digest(&hashed).into();
        assert_eq!(inner.fingerprint(), fp);
        assert_eq!(inner.key_id().as_ref(), &fp[12..]);
    }

    #[test]
    fn test_secret_key_same_id() {
        let body = rsa_public_body();
        let fields = hex!("0009 0101 0003 05 0003 07 0002 03");
        let mut secret = body.clone();
        secret.push(0);
        secret.extend_from_slice(&fields);
        secret.extend_from_slice(&checksum::calculate_simple(&fields).to_be_bytes());

        let public = PublicKey::from_buf(&body[..]).unwrap();
        let key = SecretKey::from_buf(&secret[..]).unwrap();
        assert_eq!(key.inner().key_id(), public.inner().key_id());
        assert!(matches!(
            key.secret_params(),
            SecretParams::Plain(PlainSecretParams::RSA { .. })
        ));
    }

    #[test]
    fn test_v3_key_unsupported() {
        let err = PublicSubkey::from_buf(&hex!("03 00000000 0000 01")[..]).unwrap_err();
        assert!(err.is_unsupported());
    }
}
