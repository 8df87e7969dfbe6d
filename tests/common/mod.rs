//! Keyring fixtures for the integration tests.
//!
//! Keys are assembled packet by packet. Signatures carry the right types, flags and issuers,
//! but their MPIs are dummies, as nothing here verifies them.

#![allow(dead_code)]

use pgp_session::armor::{self, BlockType};
use pgp_session::crypto::checksum;
use pgp_session::crypto::hash::HashAlgorithm;
use pgp_session::crypto::sym::SymmetricKeyAlgorithm;
use pgp_session::ser::Serialize;
use pgp_session::types::{encode_length, KeyId, StringToKey};
use rand::{CryptoRng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use sha1::{Digest, Sha1};

pub const KEY_BITS: usize = 1024;

pub const FLAG_SIGN: u8 = 0x02;
pub const FLAG_ENCRYPT: u8 = 0x0C;

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// How a subkey is bound to its primary key.
#[derive(Debug, Clone)]
pub struct SubkeySpec {
    pub flags: Option<u8>,
    pub bound: bool,
    pub revoked: bool,
}

impl SubkeySpec {
    pub fn encrypt() -> Self {
        SubkeySpec {
            flags: Some(FLAG_ENCRYPT),
            bound: true,
            revoked: false,
        }
    }

    pub fn sign_only() -> Self {
        SubkeySpec {
            flags: Some(FLAG_SIGN),
            ..Self::encrypt()
        }
    }

    pub fn no_flags() -> Self {
        SubkeySpec {
            flags: None,
            ..Self::encrypt()
        }
    }
}

/// The shape of one transferable key.
#[derive(Debug, Clone)]
pub struct KeySpec {
    pub user_id: String,
    /// Key flags on the self-signature of the user id.
    pub user_flags: Option<u8>,
    pub subkeys: Vec<SubkeySpec>,
    /// Protects all secret material, with an iterated S2K, AES256 and a SHA1 checksum.
    pub passphrase: Option<String>,
}

impl KeySpec {
    /// A signing primary key with one encryption subkey.
    pub fn standard(user_id: &str) -> Self {
        KeySpec {
            user_id: user_id.to_string(),
            user_flags: Some(0x03),
            subkeys: vec![SubkeySpec::encrypt()],
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(passphrase.to_string());
        self
    }
}

/// A generated transferable key.
pub struct TestKey {
    pub primary: RsaPrivateKey,
    pub primary_id: KeyId,
    pub subkeys: Vec<(RsaPrivateKey, KeyId)>,
    pub public: Vec<u8>,
    pub secret: Vec<u8>,
}

impl TestKey {
    pub fn generate<R: CryptoRng + Rng>(rng: &mut R, spec: &KeySpec) -> Self {
        let created = 0x5f5e_1000;
        let primary = RsaPrivateKey::new(rng, KEY_BITS).expect("rsa key");
        let primary_body = public_body(&primary, created);
        let primary_id = key_id(&primary_body);

        let mut public = packet(6, &primary_body);
        let mut secret = packet(5, &secret_body(rng, &primary, created, spec.passphrase.as_deref()));

        let user = packet(13, spec.user_id.as_bytes());
        let self_sig = packet(2, &signature(0x13, spec.user_flags, &primary_id));
        for out in [&mut public, &mut secret] {
            out.extend_from_slice(&user);
            out.extend_from_slice(&self_sig);
        }

        let mut subkeys = Vec::new();
        for (i, sub_spec) in spec.subkeys.iter().enumerate() {
            let sub_created = created + 1 + i as u32;
            let sub = RsaPrivateKey::new(rng, KEY_BITS).expect("rsa key");
            let sub_body = public_body(&sub, sub_created);
            let sub_id = key_id(&sub_body);

            let mut sigs = Vec::new();
            if sub_spec.bound {
                sigs.extend(packet(2, &signature(0x18, sub_spec.flags, &primary_id)));
            }
            if sub_spec.revoked {
                sigs.extend(packet(2, &signature(0x28, None, &primary_id)));
            }

            public.extend(packet(14, &sub_body));
            public.extend_from_slice(&sigs);
            secret.extend(packet(
                7,
                &secret_body(rng, &sub, sub_created, spec.passphrase.as_deref()),
            ));
            secret.extend_from_slice(&sigs);

            subkeys.push((sub, sub_id));
        }

        TestKey {
            primary,
            primary_id,
            subkeys,
            public,
            secret,
        }
    }

    pub fn public_armored(&self) -> String {
        armor::write(&self.public, BlockType::PublicKey, None).expect("armor")
    }

    pub fn secret_armored(&self) -> String {
        armor::write(&self.secret, BlockType::PrivateKey, None).expect("armor")
    }
}

/// A packet with a new format header.
pub fn packet(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![0xC0 | tag];
    out.extend(encode_length(body.len() as u32));
    out.extend_from_slice(body);
    out
}

pub fn mpi(value: &BigUint) -> Vec<u8> {
    let bits = value.bits() as u16;
    let mut out = bits.to_be_bytes().to_vec();
    out.extend(value.to_bytes_be());
    out
}

fn public_body(key: &RsaPrivateKey, created: u32) -> Vec<u8> {
    let mut body = vec![0x04];
    body.extend_from_slice(&created.to_be_bytes());
    body.push(0x01);
    body.extend(mpi(key.n()));
    body.extend(mpi(key.e()));
    body
}

fn key_id(public_body: &[u8]) -> KeyId {
    let mut hasher = Sha1::new();
    hasher.update([0x99]);
    hasher.update((public_body.len() as u16).to_be_bytes());
    hasher.update(public_body);
    let fp = hasher.finalize();
    KeyId::from_slice(&fp[12..]).expect("key id")
}

fn secret_fields(key: &RsaPrivateKey) -> Vec<u8> {
    // u = p^-1 mod q, which is the rsa crate's coefficient with the primes swapped
    let primes = key.primes();
    let (p, q) = (&primes[1], &primes[0]);
    let u = key.crt_coefficient().expect("crt coefficient");

    let mut fields = mpi(key.d());
    fields.extend(mpi(p));
    fields.extend(mpi(q));
    fields.extend(mpi(&u));
    fields
}

fn secret_body<R: CryptoRng + Rng>(
    rng: &mut R,
    key: &RsaPrivateKey,
    created: u32,
    passphrase: Option<&str>,
) -> Vec<u8> {
    let mut body = public_body(key, created);
    let fields = secret_fields(key);

    match passphrase {
        None => {
            body.push(0);
            body.extend_from_slice(&fields);
            body.extend_from_slice(&checksum::calculate_simple(&fields).to_be_bytes());
        }
        Some(passphrase) => {
            let alg = SymmetricKeyAlgorithm::AES256;
            let s2k = StringToKey::new_iterated(&mut *rng, HashAlgorithm::Sha256, 0x60);
            let key = s2k
                .derive_key(passphrase.as_bytes(), alg.key_size())
                .expect("derive key");
            let mut iv = vec![0u8; alg.block_size()];
            rng.fill(&mut iv[..]);

            let mut data = fields.clone();
            data.extend_from_slice(&checksum::calculate_sha1(&fields));
            alg.encrypt_with_iv_regular(&key, &iv, &mut data)
                .expect("encrypt");

            body.push(254);
            body.push(u8::from(alg));
            body.extend(s2k.to_bytes().expect("s2k"));
            body.extend_from_slice(&iv);
            body.extend_from_slice(&data);
        }
    }

    body
}

fn signature(typ: u8, flags: Option<u8>, issuer: &KeyId) -> Vec<u8> {
    let mut hashed = Vec::new();
    if let Some(flags) = flags {
        hashed.extend_from_slice(&[0x02, 0x1b, flags]);
    }
    let mut unhashed = vec![0x09, 0x10];
    unhashed.extend_from_slice(issuer.as_ref());

    let mut body = vec![0x04, typ, 0x01, 0x08];
    body.extend_from_slice(&(hashed.len() as u16).to_be_bytes());
    body.extend_from_slice(&hashed);
    body.extend_from_slice(&(unhashed.len() as u16).to_be_bytes());
    body.extend_from_slice(&unhashed);
    body.extend_from_slice(&[0xab, 0xcd]);
    body.extend(mpi(&BigUint::from(0x01ffu32)));
    body
}

/// Rewrites the recipient of a single PKESK packet with a one octet length header.
pub fn set_recipient(key_packet: &mut [u8], id: &KeyId) {
    assert_eq!(key_packet[0], 0xC1);
    assert!(key_packet[1] < 192);
    key_packet[3..11].copy_from_slice(id.as_ref());
}
