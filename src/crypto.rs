//! # Cryptography module

use zeroize::Zeroizing;

// Symmetric

pub mod sym;

// Encryption

pub mod rsa;

// Misc

pub mod checksum;
pub mod hash;
pub mod public_key;

/// Describes keys that can decrypt data.
pub trait Decryptor {
    type EncryptionFields<'a>;

    fn decrypt(&self, data: Self::EncryptionFields<'_>) -> crate::errors::Result<Zeroizing<Vec<u8>>>;
}
