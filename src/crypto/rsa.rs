use log::debug;
use rand::{CryptoRng, Rng};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::crypto::Decryptor;
use crate::errors::Result;
use crate::types::Mpi;

/// Builds a private key from the OpenPGP secret parameters.
///
/// `u` is not needed, the CRT values are recomputed.
pub fn private_key(n: &Mpi, e: &Mpi, d: &[u8], p: &[u8], q: &[u8]) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_components(
        n.into(),
        e.into(),
        BigUint::from_bytes_be(d),
        vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
    )?;
    Ok(key)
}

/// RSA decryption using PKCS1v15 padding.
pub fn decrypt(priv_key: &RsaPrivateKey, mpi: &Mpi) -> Result<Zeroizing<Vec<u8>>> {
    // MPIs drop leading zeros, the ciphertext must be as wide as the modulus
    let size = priv_key.size();
    let mut ciphertext = vec![0u8; size.saturating_sub(mpi.len())];
    ciphertext.extend_from_slice(mpi.as_bytes());

    let m = priv_key.decrypt(Pkcs1v15Encrypt, &ciphertext)?;
    debug!("RSA decrypted {} bytes", m.len());

    Ok(Zeroizing::new(m))
}

impl Decryptor for RsaPrivateKey {
    type EncryptionFields<'a> = &'a Mpi;

    fn decrypt(&self, mpi: Self::EncryptionFields<'_>) -> Result<Zeroizing<Vec<u8>>> {
        decrypt(self, mpi)
    }
}

/// RSA encryption using PKCS1v15 padding.
pub fn encrypt<R: CryptoRng + Rng>(
    rng: &mut R,
    n: &Mpi,
    e: &Mpi,
    plaintext: &[u8],
) -> Result<Mpi> {
    debug!("RSA encrypt");

    let key = RsaPublicKey::new(BigUint::from(n), BigUint::from(e))?;
    let data = key.encrypt(rng, Pkcs1v15Encrypt, plaintext)?;

    Ok(Mpi::from_slice(&data))
}
