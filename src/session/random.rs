use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::session::SessionConfig;

/// Generates a session key sized for the default cipher, 32 bytes.
pub fn random_token<R: CryptoRng + RngCore>(rng: R) -> Result<Zeroizing<Vec<u8>>> {
    random_token_with(rng, SessionConfig::default().default_cipher.key_size())
}

/// Generates `size` random bytes.
///
/// A failing random source is reported, never replaced.
pub fn random_token_with<R: CryptoRng + RngCore>(
    mut rng: R,
    size: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut token = Zeroizing::new(vec![0u8; size]);
    rng.try_fill_bytes(&mut token)
        .map_err(|source| Error::RandomSource { source })?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::io;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unimplemented!()
        }

        fn next_u64(&mut self) -> u64 {
            unimplemented!()
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unimplemented!()
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(io::Error::new(
                io::ErrorKind::Other,
                "entropy exhausted",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_random_token_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(random_token(&mut rng).unwrap().len(), 32);
        assert_eq!(random_token_with(&mut rng, 16).unwrap().len(), 16);
        assert!(random_token_with(&mut rng, 0).unwrap().is_empty());
    }

    #[test]
    fn test_random_tokens_differ() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let a = random_token(&mut rng).unwrap();
        let b = random_token(&mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_broken_source() {
        let err = random_token(BrokenRng).unwrap_err();
        assert!(matches!(err, Error::RandomSource { .. }), "{err:?}");
    }
}
