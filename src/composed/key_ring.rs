use bytes::Bytes;
use log::{debug, warn};

use crate::armor::{self, BlockType};
use crate::errors::{bail, Error, Result};
use crate::packet::{Packet, PacketParser, PubKeyInner, Signature, SignatureType, UserId};
use crate::types::{KeyId, Password, PlainSecretParams, SecretParams, Tag};

/// A primary key or subkey, with its secret material when read from a secret keyring.
#[derive(Debug, Clone)]
pub struct Key {
    details: PubKeyInner,
    secret_params: Option<SecretParams>,
}

impl Key {
    fn new(details: PubKeyInner, secret_params: Option<SecretParams>) -> Self {
        Key {
            details,
            secret_params,
        }
    }

    pub fn details(&self) -> &PubKeyInner {
        &self.details
    }

    pub fn key_id(&self) -> KeyId {
        self.details.key_id()
    }

    pub fn has_secret(&self) -> bool {
        self.secret_params.is_some()
    }

    /// Only RSA keys are used to encrypt session keys.
    fn can_encrypt_session_keys(&self) -> bool {
        let ok = self.details.algorithm().is_rsa_encrypt();
        if !ok {
            debug!(
                "skipping key {:x}: can't encrypt with {:?}",
                self.key_id(),
                self.details.algorithm()
            );
        }
        ok
    }

    /// Runs `work` with the unlocked secret material.
    ///
    /// The passphrase is ignored for unprotected keys. The plain material only lives for the
    /// duration of the call, the key itself stays locked.
    pub fn unlock<G, T>(&self, pw: &Password, work: G) -> Result<T>
    where
        G: FnOnce(&PubKeyInner, &PlainSecretParams) -> Result<T>,
    {
        match &self.secret_params {
            None => bail!("key {:x} has no secret material", self.key_id()),
            Some(SecretParams::Plain(plain)) => work(&self.details, plain),
            Some(SecretParams::Encrypted(enc)) => {
                let plain = enc.unlock(pw, self.details.algorithm())?;
                work(&self.details, &plain)
            }
        }
    }
}

/// A user id and the signatures over it.
#[derive(Debug, Clone)]
pub struct SignedUser {
    pub id: UserId,
    pub signatures: Vec<Signature>,
}

impl SignedUser {
    /// The latest certification issued by `primary`.
    ///
    /// Certifications without an issuer subpacket are attributed to the primary key.
    pub fn self_signature(&self, primary: &KeyId) -> Option<&Signature> {
        self.signatures.iter().rev().find(|sig| {
            sig.typ().is_certification() && sig.issuer().map(|id| id == primary).unwrap_or(true)
        })
    }
}

/// A subkey and the signatures binding or revoking it.
#[derive(Debug, Clone)]
pub struct SignedSubKey {
    pub key: Key,
    pub signatures: Vec<Signature>,
}

impl SignedSubKey {
    /// The latest subkey binding signature.
    pub fn binding_signature(&self) -> Option<&Signature> {
        self.signatures
            .iter()
            .rev()
            .find(|sig| sig.typ() == SignatureType::SubkeyBinding)
    }

    pub fn is_revoked(&self) -> bool {
        self.signatures
            .iter()
            .any(|sig| sig.typ() == SignatureType::SubkeyRevocation)
    }

    /// Bound, not revoked, and without flags that rule out encryption.
    pub fn is_encryption_capable(&self) -> bool {
        if self.is_revoked() {
            return false;
        }
        match self.binding_signature() {
            Some(sig) => sig.key_flags().map(|f| f.can_encrypt()).unwrap_or(true),
            None => false,
        }
    }
}

/// A transferable key: the primary key with its user ids and subkeys.
///
/// Direct key signatures are not kept.
#[derive(Debug, Clone)]
pub struct SignedKey {
    pub primary: Key,
    pub users: Vec<SignedUser>,
    pub subkeys: Vec<SignedSubKey>,
}

impl SignedKey {
    fn new(primary: Key) -> Self {
        SignedKey {
            primary,
            users: Vec::new(),
            subkeys: Vec::new(),
        }
    }

    pub fn key_id(&self) -> KeyId {
        self.primary.key_id()
    }

    /// The primary key may encrypt if the self-signature on the first user id says so.
    pub fn primary_is_encryption_capable(&self) -> bool {
        let primary_id = self.key_id();
        self.users
            .first()
            .and_then(|user| user.self_signature(&primary_id))
            .and_then(Signature::key_flags)
            .map(|f| f.can_encrypt())
            .unwrap_or(false)
    }

    /// Keys that may decrypt a session key: qualifying subkeys first, then the primary key.
    pub fn decryption_keys(&self) -> impl Iterator<Item = &Key> {
        let subkeys = self
            .subkeys
            .iter()
            .filter(|sub| sub.key.has_secret() && sub.is_encryption_capable())
            .map(|sub| &sub.key);
        let primary = (self.primary.has_secret() && self.primary_is_encryption_capable())
            .then_some(&self.primary);

        subkeys.chain(primary)
    }

    /// The key to encrypt a session key to.
    ///
    /// The first qualifying subkey wins, the primary key is the fallback.
    /// Only RSA keys qualify.
    pub fn encryption_key(&self) -> Option<&Key> {
        let subkey = self
            .subkeys
            .iter()
            .filter(|sub| sub.is_encryption_capable())
            .map(|sub| &sub.key)
            .find(|key| key.can_encrypt_session_keys());

        subkey.or_else(|| {
            (self.primary_is_encryption_capable() && self.primary.can_encrypt_session_keys())
                .then_some(&self.primary)
        })
    }
}

/// Where the next signature packet belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    Primary,
    User,
    Subkey,
    /// Signatures on a component we don't keep.
    Skipped,
    /// Everything up to the next primary key.
    SkippedKey,
}

/// A list of transferable keys, public or secret.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: Vec<SignedKey>,
}

impl KeyRing {
    /// Reads a binary keyring.
    ///
    /// Keys of unsupported versions are stepped over, along with everything that belongs to them.
    pub fn from_bytes(input: impl Into<Bytes>) -> Result<Self> {
        Self::from_packets(PacketParser::new(input)).map_err(Error::into_key_ring_parse)
    }

    /// Reads an armored public or private key block.
    pub fn from_armor(input: &str) -> Result<Self> {
        let dearmored = armor::decode(input)?;
        match dearmored.typ {
            BlockType::PublicKey | BlockType::PrivateKey => {}
            typ => {
                return Err(Error::ArmorDecode {
                    message: format!("expected a key block, got {typ}"),
                })
            }
        }

        Self::from_bytes(dearmored.data)
    }

    fn from_packets(packets: impl Iterator<Item = Result<Packet>>) -> Result<Self> {
        let mut keys: Vec<SignedKey> = Vec::new();
        let mut pos = Position::Start;

        for packet in packets {
            let packet = match packet {
                Ok(packet) => packet,
                Err(err) if err.is_unsupported() => {
                    warn!("skipping packet: {}", err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let packet = match packet {
                Packet::PublicKey(key) => {
                    debug!("primary key {:x}", key.inner().key_id());
                    keys.push(SignedKey::new(Key::new(key.into_inner(), None)));
                    pos = Position::Primary;
                    continue;
                }
                Packet::SecretKey(key) => {
                    debug!("primary secret key {:x}", key.inner().key_id());
                    let (details, secret) = key.into_parts();
                    keys.push(SignedKey::new(Key::new(details, Some(secret))));
                    pos = Position::Primary;
                    continue;
                }
                Packet::Other(tag @ (Tag::PublicKey | Tag::SecretKey)) => {
                    debug!("skipping unsupported {:?} and its components", tag);
                    pos = Position::SkippedKey;
                    continue;
                }
                packet => packet,
            };

            if pos == Position::SkippedKey {
                continue;
            }
            let Some(current) = keys.last_mut() else {
                bail!("key ring must start with a primary key");
            };

            match packet {
                Packet::PublicSubkey(key) => {
                    current.subkeys.push(SignedSubKey {
                        key: Key::new(key.into_inner(), None),
                        signatures: Vec::new(),
                    });
                    pos = Position::Subkey;
                }
                Packet::SecretSubkey(key) => {
                    let (details, secret) = key.into_parts();
                    current.subkeys.push(SignedSubKey {
                        key: Key::new(details, Some(secret)),
                        signatures: Vec::new(),
                    });
                    pos = Position::Subkey;
                }
                Packet::UserId(id) => {
                    current.users.push(SignedUser {
                        id,
                        signatures: Vec::new(),
                    });
                    pos = Position::User;
                }
                Packet::Signature(sig) => match pos {
                    Position::User => {
                        if let Some(user) = current.users.last_mut() {
                            user.signatures.push(sig);
                        }
                    }
                    Position::Subkey => {
                        if let Some(sub) = current.subkeys.last_mut() {
                            sub.signatures.push(sig);
                        }
                    }
                    Position::Start
                    | Position::Primary
                    | Position::Skipped
                    | Position::SkippedKey => {
                        debug!("ignoring signature {:?}", sig.typ());
                    }
                },
                Packet::Other(tag @ (Tag::PublicSubkey | Tag::SecretSubkey | Tag::UserAttribute)) => {
                    debug!("skipping {:?}", tag);
                    pos = Position::Skipped;
                }
                packet => {
                    debug!("ignoring {:?} packet in key ring", packet.tag());
                }
            }
        }

        debug!("read {} keys", keys.len());
        Ok(KeyRing { keys })
    }

    pub fn keys(&self) -> &[SignedKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All keys that may decrypt a session key, in keyring order.
    pub fn decryption_keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().flat_map(SignedKey::decryption_keys)
    }

    /// The first key in the ring that a session key can be encrypted to.
    pub fn encryption_key(&self) -> Option<&Key> {
        self.keys.iter().find_map(SignedKey::encryption_key)
    }
}
