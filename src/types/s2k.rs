use std::io;

use bytes::{Buf, Bytes};
use log::debug;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{ensure, unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// GnuPG private S2K type, used for secret keys that are stored elsewhere.
const GNU_DUMMY: u8 = 101;

/// The default coded count for iterated and salted S2K, 65536 octets.
pub const DEFAULT_ITER_SALTED_COUNT: u8 = 0x60;

/// A String-To-Key specifier.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-string-to-key-s2k-specifier>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum StringToKey {
    /// Type ID 0
    Simple { hash_alg: HashAlgorithm },
    /// Type ID 1
    Salted {
        hash_alg: HashAlgorithm,
        #[debug("{}", hex::encode(salt))]
        salt: [u8; 8],
    },
    /// Type ID 3
    IteratedAndSalted {
        hash_alg: HashAlgorithm,
        #[debug("{}", hex::encode(salt))]
        salt: [u8; 8],
        /// Coded count
        count: u8,
    },
    /// Private (100-110) or unknown types.
    ///
    /// The parameters can't be delimited, so they swallow the rest of the input.
    Other {
        typ: u8,
        #[debug("{}", hex::encode(unknown))]
        unknown: Bytes,
    },
}

impl StringToKey {
    /// Creates an iterated and salted S2K with a fresh salt.
    pub fn new_iterated<R: CryptoRng + Rng>(
        mut rng: R,
        hash_alg: HashAlgorithm,
        count: u8,
    ) -> Self {
        let mut salt = [0u8; 8];
        rng.fill(&mut salt[..]);

        StringToKey::IteratedAndSalted {
            hash_alg,
            salt,
            count,
        }
    }

    /// The S2K type id.
    pub fn id(&self) -> u8 {
        match self {
            Self::Simple { .. } => 0,
            Self::Salted { .. } => 1,
            Self::IteratedAndSalted { .. } => 3,
            Self::Other { typ, .. } => *typ,
        }
    }

    /// True for the GnuPG "gnu-dummy" extension, which carries no secret material.
    pub fn is_gnu_dummy(&self) -> bool {
        matches!(self, Self::Other { typ, unknown } if *typ == GNU_DUMMY && unknown.get(1..4) == Some(&b"GNU"[..]))
    }

    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let typ = i.read_u8()?;
        let s2k = match typ {
            0 => {
                let hash_alg = i.read_u8().map(HashAlgorithm::from)?;
                StringToKey::Simple { hash_alg }
            }
            1 => {
                let hash_alg = i.read_u8().map(HashAlgorithm::from)?;
                let salt = i.read_array::<8>()?;
                StringToKey::Salted { hash_alg, salt }
            }
            3 => {
                let hash_alg = i.read_u8().map(HashAlgorithm::from)?;
                let salt = i.read_array::<8>()?;
                let count = i.read_u8()?;
                StringToKey::IteratedAndSalted {
                    hash_alg,
                    salt,
                    count,
                }
            }
            _ => {
                let unknown = i.rest();
                StringToKey::Other { typ, unknown }
            }
        };

        Ok(s2k)
    }

    /// Converts a coded count into the number of octets to hash.
    pub fn decode_count(c: u8) -> usize {
        (16usize + (c as usize & 15)) << ((c as usize >> 4) + 6)
    }

    /// The hash algorithm, if this S2K is derivable.
    pub fn hash_alg(&self) -> Option<HashAlgorithm> {
        match self {
            Self::Simple { hash_alg }
            | Self::Salted { hash_alg, .. }
            | Self::IteratedAndSalted { hash_alg, .. } => Some(*hash_alg),
            Self::Other { .. } => None,
        }
    }

    /// Derives a key of `key_size` octets from the passphrase.
    ///
    /// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-string-to-key-s2k-specifie>
    pub fn derive_key(&self, passphrase: &[u8], key_size: usize) -> Result<Zeroizing<Vec<u8>>> {
        let (hash_alg, salt, count) = match self {
            Self::Simple { hash_alg } => (*hash_alg, &[][..], None),
            Self::Salted { hash_alg, salt } => (*hash_alg, &salt[..], None),
            Self::IteratedAndSalted {
                hash_alg,
                salt,
                count,
            } => (*hash_alg, &salt[..], Some(Self::decode_count(*count))),
            Self::Other { typ, .. } => {
                unsupported_err!("S2K type {} can not derive keys", typ)
            }
        };

        let digest_size = hash_alg
            .digest_size()
            .ok_or_else(|| crate::errors::Error::Unsupported {
                message: format!("S2K hash {hash_alg}"),
            })?;
        ensure!(key_size > 0, "S2K key size must not be zero");

        let rounds = key_size.div_ceil(digest_size);
        let mut key = Zeroizing::new(Vec::with_capacity(rounds * digest_size));

        debug!("derive key: {hash_alg} rounds={rounds} count={count:?}");

        for round in 0..rounds {
            let mut hasher = hash_alg.new_hasher()?;

            // Each extra context is preloaded with one more zero octet.
            hasher.update(&vec![0u8; round]);

            match count {
                None => {
                    hasher.update(salt);
                    hasher.update(passphrase);
                }
                Some(count) => {
                    let data_len = salt.len() + passphrase.len();
                    // At least one full copy of salt and passphrase is hashed.
                    let mut remaining = count.max(data_len);

                    while remaining > 0 {
                        if remaining >= data_len {
                            hasher.update(salt);
                            hasher.update(passphrase);
                            remaining -= data_len;
                        } else if remaining > salt.len() {
                            hasher.update(salt);
                            hasher.update(&passphrase[..remaining - salt.len()]);
                            remaining = 0;
                        } else {
                            hasher.update(&salt[..remaining]);
                            remaining = 0;
                        }
                    }
                }
            }

            key.extend_from_slice(&hasher.finalize());
        }

        key.truncate(key_size);

        Ok(key)
    }
}

impl Serialize for StringToKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.id()])?;

        match self {
            Self::Simple { hash_alg } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
            }
            Self::Salted { hash_alg, salt } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
                writer.write_all(salt)?;
            }
            Self::IteratedAndSalted {
                hash_alg,
                salt,
                count,
            } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
                writer.write_all(salt)?;
                writer.write_all(&[*count])?;
            }
            Self::Other { unknown, .. } => {
                writer.write_all(unknown)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + match self {
            Self::Simple { .. } => 1,
            Self::Salted { .. } => 1 + 8,
            Self::IteratedAndSalted { .. } => 1 + 8 + 1,
            Self::Other { unknown, .. } => unknown.len(),
        }
    }
}
