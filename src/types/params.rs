use std::io;

use bytes::{Buf, Bytes};
use zeroize::Zeroizing;

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, unsupported_err, Error, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{Mpi, Password, StringToKey};

/// Represent the public parameters for the different algorithms.
#[derive(PartialEq, Eq, Clone, derive_more::Debug)]
pub enum PublicParams {
    RSA {
        n: Mpi,
        e: Mpi,
    },
    DSA {
        p: Mpi,
        q: Mpi,
        g: Mpi,
        y: Mpi,
    },
    Elgamal {
        p: Mpi,
        g: Mpi,
        y: Mpi,
    },
    /// ECDSA and legacy EdDSA share a layout: curve OID and point.
    EC {
        #[debug("{}", hex::encode(oid))]
        oid: Bytes,
        p: Mpi,
    },
    ECDH {
        #[debug("{}", hex::encode(oid))]
        oid: Bytes,
        p: Mpi,
        #[debug("{}", hex::encode(kdf))]
        kdf: Bytes,
    },
    Unknown {
        #[debug("{}", hex::encode(data))]
        data: Bytes,
    },
}

/// Reads a field prefixed by a single length octet (curve OIDs, KDF parameters).
fn read_short<B: Buf>(i: &mut B) -> Result<Bytes> {
    let len = i.read_u8()?;
    let data = i.read_take(len.into())?;
    Ok(data)
}

impl PublicParams {
    /// Parses the algorithm specific public fields of a key packet.
    ///
    /// Unknown algorithms consume the rest of the buffer.
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, mut i: B) -> Result<Self> {
        let params = match alg {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
                let n = Mpi::from_buf(&mut i)?;
                let e = Mpi::from_buf(&mut i)?;
                PublicParams::RSA { n, e }
            }
            PublicKeyAlgorithm::DSA => {
                let p = Mpi::from_buf(&mut i)?;
                let q = Mpi::from_buf(&mut i)?;
                let g = Mpi::from_buf(&mut i)?;
                let y = Mpi::from_buf(&mut i)?;
                PublicParams::DSA { p, q, g, y }
            }
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncryptSign => {
                let p = Mpi::from_buf(&mut i)?;
                let g = Mpi::from_buf(&mut i)?;
                let y = Mpi::from_buf(&mut i)?;
                PublicParams::Elgamal { p, g, y }
            }
            PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSALegacy => {
                let oid = read_short(&mut i)?;
                let p = Mpi::from_buf(&mut i)?;
                PublicParams::EC { oid, p }
            }
            PublicKeyAlgorithm::ECDH => {
                let oid = read_short(&mut i)?;
                let p = Mpi::from_buf(&mut i)?;
                let kdf = read_short(&mut i)?;
                PublicParams::ECDH { oid, p, kdf }
            }
            PublicKeyAlgorithm::Unknown(_) => PublicParams::Unknown { data: i.rest() },
        };

        Ok(params)
    }
}

impl Serialize for PublicParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PublicParams::RSA { n, e } => {
                n.to_writer(writer)?;
                e.to_writer(writer)?;
            }
            PublicParams::DSA { p, q, g, y } => {
                p.to_writer(writer)?;
                q.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
            PublicParams::Elgamal { p, g, y } => {
                p.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
            PublicParams::EC { oid, p } => {
                writer.write_all(&[oid.len().try_into()?])?;
                writer.write_all(oid)?;
                p.to_writer(writer)?;
            }
            PublicParams::ECDH { oid, p, kdf } => {
                writer.write_all(&[oid.len().try_into()?])?;
                writer.write_all(oid)?;
                p.to_writer(writer)?;
                writer.write_all(&[kdf.len().try_into()?])?;
                writer.write_all(kdf)?;
            }
            PublicParams::Unknown { data } => {
                writer.write_all(data)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        match self {
            PublicParams::RSA { n, e } => n.write_len() + e.write_len(),
            PublicParams::DSA { p, q, g, y } => {
                p.write_len() + q.write_len() + g.write_len() + y.write_len()
            }
            PublicParams::Elgamal { p, g, y } => p.write_len() + g.write_len() + y.write_len(),
            PublicParams::EC { oid, p } => 1 + oid.len() + p.write_len(),
            PublicParams::ECDH { oid, p, kdf } => 1 + oid.len() + p.write_len() + 1 + kdf.len(),
            PublicParams::Unknown { data } => data.len(),
        }
    }
}

/// A secret MPI, held in memory that is wiped on drop.
#[derive(Clone, derive_more::Debug)]
#[debug("SecretMpi(***)")]
pub struct SecretMpi(Zeroizing<Vec<u8>>);

impl SecretMpi {
    fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let len_bits = i.read_be_u16()?;
        let len_bytes = (usize::from(len_bits) + 7) >> 3;
        i.ensure_remaining(len_bytes)
            .map_err(|source| crate::parsing::Error::TooShort {
                typ: crate::parsing::Typ::Take(len_bytes),
                context: "secret mpi",
                source,
            })?;

        let mut value = Zeroizing::new(vec![0u8; len_bytes]);
        i.copy_to_slice(&mut value);
        Ok(SecretMpi(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Unlocked secret key material.
#[derive(Clone, derive_more::Debug)]
pub enum PlainSecretParams {
    RSA {
        d: SecretMpi,
        p: SecretMpi,
        q: SecretMpi,
        u: SecretMpi,
    },
    /// Material for algorithms this crate does not decrypt with.
    #[debug("Unsupported(***)")]
    Unsupported(Zeroizing<Vec<u8>>),
}

impl PlainSecretParams {
    /// Parses the cleartext secret fields, without any trailing checksum.
    pub fn from_slice(data: &[u8], alg: PublicKeyAlgorithm) -> Result<Self> {
        let mut i = data;
        match alg {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
                let d = SecretMpi::from_buf(&mut i)?;
                let p = SecretMpi::from_buf(&mut i)?;
                let q = SecretMpi::from_buf(&mut i)?;
                let u = SecretMpi::from_buf(&mut i)?;
                ensure!(!i.has_remaining(), "trailing data after RSA secret parameters");
                Ok(PlainSecretParams::RSA { d, p, q, u })
            }
            _ => Ok(PlainSecretParams::Unsupported(Zeroizing::new(data.to_vec()))),
        }
    }
}

/// Protected secret key material, as stored in a secret key packet.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct EncryptedSecretParams {
    /// The encrypted data.
    #[debug("{} bytes", data.len())]
    data: Bytes,
    /// IV.
    #[debug("{}", hex::encode(iv))]
    iv: Bytes,
    /// The encryption algorithm used.
    encryption_algorithm: SymmetricKeyAlgorithm,
    /// The string-to-key method and its parameters.
    string_to_key: Option<StringToKey>,
    /// The identifier for how this data is stored.
    string_to_key_id: u8,
}

impl EncryptedSecretParams {
    pub fn encryption_algorithm(&self) -> SymmetricKeyAlgorithm {
        self.encryption_algorithm
    }

    pub fn string_to_key(&self) -> Option<&StringToKey> {
        self.string_to_key.as_ref()
    }

    pub fn string_to_key_id(&self) -> u8 {
        self.string_to_key_id
    }

    /// Decrypts the secret material with the given passphrase.
    ///
    /// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.3>
    pub fn unlock(&self, pw: &Password, alg: PublicKeyAlgorithm) -> Result<PlainSecretParams> {
        let Some(s2k) = &self.string_to_key else {
            unsupported_err!("legacy secret key protection {}", self.string_to_key_id);
        };
        if s2k.is_gnu_dummy() {
            unsupported_err!("secret key material is not available (gnu-dummy)");
        }

        let key = s2k.derive_key(pw.read(), self.encryption_algorithm.key_size())?;

        let mut plaintext = Zeroizing::new(self.data.to_vec());
        self.encryption_algorithm
            .decrypt_with_iv_regular(&key, &self.iv, &mut plaintext)?;

        let secret = match self.string_to_key_id {
            254 => {
                ensure!(plaintext.len() >= 20, "secret key data too short");
                let (secret, hash) = plaintext.split_at(plaintext.len() - 20);
                checksum::sha1(hash, secret).map_err(|_| Error::InvalidInput)?;
                secret
            }
            _ => {
                ensure!(plaintext.len() >= 2, "secret key data too short");
                let (secret, sum) = plaintext.split_at(plaintext.len() - 2);
                checksum::simple([sum[0], sum[1]], secret).map_err(|_| Error::InvalidInput)?;
                secret
            }
        };

        PlainSecretParams::from_slice(secret, alg)
    }
}

/// The secret part of a secret key packet.
#[derive(Clone, derive_more::Debug)]
pub enum SecretParams {
    Plain(PlainSecretParams),
    Encrypted(EncryptedSecretParams),
}

impl SecretParams {
    /// Parses everything after the public fields of a secret key packet.
    ///
    /// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.3>
    pub fn from_buf<B: Buf>(mut i: B, alg: PublicKeyAlgorithm) -> Result<Self> {
        let s2k_usage = i.read_u8()?;

        match s2k_usage {
            0 => {
                let data = i.rest();
                ensure!(data.len() >= 2, "secret key data too short");
                let (secret, sum) = data.split_at(data.len() - 2);
                checksum::simple([sum[0], sum[1]], secret)?;
                let plain = PlainSecretParams::from_slice(secret, alg)?;
                Ok(SecretParams::Plain(plain))
            }
            254 | 255 => {
                let encryption_algorithm = i.read_u8().map(SymmetricKeyAlgorithm::from)?;
                let s2k = StringToKey::from_buf(&mut i)?;
                let iv = if s2k.is_gnu_dummy() {
                    Bytes::new()
                } else {
                    i.read_take(encryption_algorithm.block_size())?
                };
                let data = i.rest();

                Ok(SecretParams::Encrypted(EncryptedSecretParams {
                    data,
                    iv,
                    encryption_algorithm,
                    string_to_key: Some(s2k),
                    string_to_key_id: s2k_usage,
                }))
            }
            _ => {
                // the usage octet is the cipher, keyed with a simple MD5 S2K
                let encryption_algorithm = SymmetricKeyAlgorithm::from(s2k_usage);
                let iv = i.read_take(encryption_algorithm.block_size())?;
                let data = i.rest();

                Ok(SecretParams::Encrypted(EncryptedSecretParams {
                    data,
                    iv,
                    encryption_algorithm,
                    string_to_key: None,
                    string_to_key_id: s2k_usage,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;

    fn rsa_secret_fields() -> Vec<u8> {
        // d = 0x0101, p = 0x05, q = 0x07, u = 0x03
        hex!("0009 0101 0003 05 0003 07 0002 03").to_vec()
    }

    #[test]
    fn test_public_params_rsa() {
        let raw = hex!("0009 01ff 0011 010001");
        let params = PublicParams::from_buf(PublicKeyAlgorithm::RSA, &raw[..]).unwrap();
        assert_eq!(
            params,
            PublicParams::RSA {
                n: Mpi::from_slice(&hex!("01ff")),
                e: Mpi::from_slice(&hex!("010001")),
            }
        );
        assert_eq!(params.to_bytes().unwrap(), raw.to_vec());
    }

    #[test]
    fn test_public_params_ecdh() {
        let raw = hex!("0a 2b060104019755010501 000f 4001 03 010807");
        let params = PublicParams::from_buf(PublicKeyAlgorithm::ECDH, &raw[..]).unwrap();
        assert!(matches!(params, PublicParams::ECDH { .. }));
        assert_eq!(params.to_bytes().unwrap(), raw.to_vec());
        assert_eq!(params.write_len(), raw.len());
    }

    #[test]
    fn test_plain_secret_params() {
        let mut raw = vec![0u8];
        let fields = rsa_secret_fields();
        raw.extend_from_slice(&fields);
        raw.extend_from_slice(&checksum::calculate_simple(&fields).to_be_bytes());

        let params = SecretParams::from_buf(&raw[..], PublicKeyAlgorithm::RSA).unwrap();
        let SecretParams::Plain(PlainSecretParams::RSA { d, p, q, u }) = params else {
            panic!("unexpected params");
        };
        assert_eq!(d.as_bytes(), &hex!("0101"));
        assert_eq!(p.as_bytes(), &[5]);
        assert_eq!(q.as_bytes(), &[7]);
        assert_eq!(u.as_bytes(), &[3]);
        assert_eq!(format!("{d:?}"), "SecretMpi(***)");
    }

    #[test]
    fn test_plain_secret_params_bad_checksum() {
        let mut raw = vec![0u8];
        raw.extend_from_slice(&rsa_secret_fields());
        raw.extend_from_slice(&[0, 0]);

        assert!(SecretParams::from_buf(&raw[..], PublicKeyAlgorithm::RSA).is_err());
    }

    #[test]
    fn test_encrypted_secret_params_unlock() {
        let alg = SymmetricKeyAlgorithm::AES256;
        let s2k = StringToKey::IteratedAndSalted {
            hash_alg: HashAlgorithm::Sha256,
            salt: [9u8; 8],
            count: 0x10,
        };
        let iv = [3u8; 16];
        let pw = Password::from("correct horse");

        let fields = rsa_secret_fields();
        let mut data = fields.clone();
        data.extend_from_slice(&checksum::calculate_sha1(&fields));
        let key = s2k.derive_key(pw.read(), alg.key_size()).unwrap();
        alg.encrypt_with_iv_regular(&key, &iv, &mut data).unwrap();

        let mut raw = vec![254, u8::from(alg)];
        raw.extend_from_slice(&s2k.to_bytes().unwrap());
        raw.extend_from_slice(&iv);
        raw.extend_from_slice(&data);

        let params = SecretParams::from_buf(&raw[..], PublicKeyAlgorithm::RSA).unwrap();
        let SecretParams::Encrypted(enc) = params else {
            panic!("expected encrypted params");
        };
        assert_eq!(enc.string_to_key_id(), 254);

        let plain = enc.unlock(&pw, PublicKeyAlgorithm::RSA).unwrap();
        assert!(matches!(plain, PlainSecretParams::RSA { .. }));

        assert!(enc
            .unlock(&Password::from("wrong"), PublicKeyAlgorithm::RSA)
            .is_err());
    }

    #[test]
    fn test_gnu_dummy_not_unlockable() {
        let raw = hex!("fe 09 65 02 474e55 01");
        let params = SecretParams::from_buf(&raw[..], PublicKeyAlgorithm::RSA).unwrap();
        let SecretParams::Encrypted(enc) = params else {
            panic!("expected encrypted params");
        };
        let err = enc
            .unlock(&Password::from("pw"), PublicKeyAlgorithm::RSA)
            .unwrap_err();
        assert!(err.is_unsupported());
    }
}
