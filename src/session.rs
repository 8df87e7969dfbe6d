//! # Session keys
//!
//! Recover, re-wrap and split the symmetric session key of an OpenPGP message
//! without touching the encrypted payload.
//!
//! ```no_run
//! use pgp_session::{session_from_key_packet, key_packet_with_public_key, Password};
//!
//! # fn run(key_packet: &[u8], secret: &str, public: &str) -> pgp_session::errors::Result<()> {
//! let split = session_from_key_packet(key_packet, secret, &Password::from("passphrase"))?;
//! let rewrapped = key_packet_with_public_key(&mut rand::thread_rng(), &split, public)?;
//! # Ok(())
//! # }
//! ```

use derive_builder::Builder;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::armor::{self, BlockType};
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::{algorithm_to_id, id_to_algorithm, SymmetricKeyAlgorithm};
use crate::errors::{Error, Result};
use crate::types::DEFAULT_ITER_SALTED_COUNT;

mod decrypt;
mod encrypt;
mod random;
mod split;

pub use self::{decrypt::*, encrypt::*, random::*, split::*};

/// A raw session key and the cipher it is used with.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct SessionSplit {
    #[debug("***")]
    session: Zeroizing<Vec<u8>>,
    algorithm: SymmetricKeyAlgorithm,
}

impl SessionSplit {
    /// Creates a split, checking the key length against the cipher.
    pub fn new(session: &[u8], algorithm: SymmetricKeyAlgorithm) -> Result<Self> {
        let expected = algorithm.key_size();
        if session.len() != expected {
            return Err(Error::InvalidSessionKeyLength {
                expected,
                actual: session.len(),
            });
        }

        Ok(Self::from_parts(Zeroizing::new(session.to_vec()), algorithm))
    }

    /// Builds a split from a recovered key, unchecked.
    ///
    /// Algorithms outside the registry are recorded as AES-256.
    pub(crate) fn from_parts(session: Zeroizing<Vec<u8>>, algorithm: SymmetricKeyAlgorithm) -> Self {
        SessionSplit {
            session,
            algorithm: algorithm_to_id(id_to_algorithm(algorithm)),
        }
    }

    pub fn session(&self) -> &[u8] {
        &self.session
    }

    pub fn algorithm(&self) -> SymmetricKeyAlgorithm {
        self.algorithm
    }

    /// The registry name of the cipher, e.g. `"aes256"`.
    pub fn algorithm_name(&self) -> &'static str {
        id_to_algorithm(self.algorithm)
    }
}

/// A message split into its key packet and its data packet, both with headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSplit {
    pub key_packet: Vec<u8>,
    pub data_packet: Vec<u8>,
}

impl EncryptedSplit {
    /// Joins the two packets back into a binary message.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.key_packet.len() + self.data_packet.len());
        out.extend_from_slice(&self.key_packet);
        out.extend_from_slice(&self.data_packet);
        out
    }

    /// Joins the two packets back into an armored message.
    pub fn to_armored(&self) -> Result<String> {
        armor::write(&self.to_bytes(), BlockType::Message, None)
    }
}

/// Parameters for creating session keys and password key packets.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SessionConfig {
    /// Cipher for fresh session keys.
    #[builder(default = "SymmetricKeyAlgorithm::AES256")]
    pub default_cipher: SymmetricKeyAlgorithm,
    /// Hash for the iterated and salted S2K of password key packets.
    #[builder(default = "HashAlgorithm::Sha256")]
    pub s2k_hash: HashAlgorithm,
    /// Coded iteration count for the S2K.
    #[builder(default = "DEFAULT_ITER_SALTED_COUNT")]
    pub s2k_count: u8,
}

impl SessionConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(cipher) = self.default_cipher {
            if !cipher.is_registered() {
                return Err(format!("cipher {cipher:?} can't be used for session keys"));
            }
        }
        if let Some(hash) = self.s2k_hash {
            if hash.new_hasher().is_err() {
                return Err(format!("hash {hash} is not supported for S2K"));
            }
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_cipher: SymmetricKeyAlgorithm::AES256,
            s2k_hash: HashAlgorithm::Sha256,
            s2k_count: DEFAULT_ITER_SALTED_COUNT,
        }
    }
}

impl SessionConfig {
    /// A fresh session key sized for [`SessionConfig::default_cipher`].
    pub fn random_token<R: CryptoRng + RngCore>(&self, rng: R) -> Result<SessionSplit> {
        let token = random_token_with(rng, self.default_cipher.key_size())?;
        Ok(SessionSplit::from_parts(token, self.default_cipher))
    }
}
