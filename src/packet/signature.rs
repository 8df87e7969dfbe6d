use bytes::{Buf, Bytes};
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{ensure, unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::types::KeyId;

/// Signature Packet, version 4.
///
/// Only the parts needed to select keys are read: the type, the key flags and the issuer.
/// Signatures are not verified.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-signature-packet-type-id-2>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct Signature {
    typ: SignatureType,
    pub_alg: PublicKeyAlgorithm,
    hash_alg: HashAlgorithm,
    hashed_subpackets: Vec<Subpacket>,
    unhashed_subpackets: Vec<Subpacket>,
    #[debug("{}", hex::encode(signed_hash_value))]
    signed_hash_value: [u8; 2],
    #[debug("{} bytes", signature.len())]
    signature: Bytes,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document.
    Binary = 0x00,
    /// Signature of a canonical text document.
    Text = 0x01,
    /// Standalone signature.
    Standalone = 0x02,
    /// Generic certification of a User ID and Public-Key packet.
    CertGeneric = 0x10,
    /// Persona certification of a User ID and Public-Key packet.
    CertPersona = 0x11,
    /// Casual certification of a User ID and Public-Key packet.
    CertCasual = 0x12,
    /// Positive certification of a User ID and Public-Key packet.
    CertPositive = 0x13,
    /// Subkey Binding Signature
    SubkeyBinding = 0x18,
    /// Primary Key Binding Signature
    KeyBinding = 0x19,
    /// Signature directly on a key
    Key = 0x1F,
    /// Key revocation signature
    KeyRevocation = 0x20,
    /// Subkey revocation signature
    SubkeyRevocation = 0x28,
    /// Certification revocation signature
    CertRevocation = 0x30,
    /// Timestamp signature.
    Timestamp = 0x40,
    /// Third-Party Confirmation signature.
    ThirdParty = 0x50,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SignatureType {
    /// True for the four certification types that self-sign a user id.
    pub fn is_certification(self) -> bool {
        matches!(
            self,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
        )
    }
}

/// Key flags, from the subpacket of type 27.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-key-flags>
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct KeyFlags(u8);

impl KeyFlags {
    const CERTIFY: u8 = 0x01;
    const SIGN: u8 = 0x02;
    const ENCRYPT_COMMS: u8 = 0x04;
    const ENCRYPT_STORAGE: u8 = 0x08;

    pub fn certify(self) -> bool {
        self.0 & Self::CERTIFY != 0
    }

    pub fn sign(self) -> bool {
        self.0 & Self::SIGN != 0
    }

    pub fn encrypt_comms(self) -> bool {
        self.0 & Self::ENCRYPT_COMMS != 0
    }

    pub fn encrypt_storage(self) -> bool {
        self.0 & Self::ENCRYPT_STORAGE != 0
    }

    /// Either of the two encryption flags.
    pub fn can_encrypt(self) -> bool {
        self.encrypt_comms() || self.encrypt_storage()
    }
}

impl From<u8> for KeyFlags {
    fn from(value: u8) -> Self {
        KeyFlags(value)
    }
}

impl From<&[u8]> for KeyFlags {
    fn from(other: &[u8]) -> Self {
        other.first().map(|b| KeyFlags(*b)).unwrap_or_default()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Subpacket {
    pub is_critical: bool,
    pub data: SubpacketData,
}

#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum SubpacketData {
    Issuer(KeyId),
    KeyFlags(KeyFlags),
    Other(u8, #[debug("{}", hex::encode(_1))] Bytes),
}

impl Subpacket {
    const ISSUER: u8 = 16;
    const KEY_FLAGS: u8 = 27;

    fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let olen = i.read_u8()?;
        let len: usize = match olen {
            0..=191 => olen.into(),
            192..=254 => {
                let a = i.read_u8()?;
                ((usize::from(olen) - 192) << 8) + 192 + usize::from(a)
            }
            255 => i.read_be_u32()?.try_into()?,
        };
        ensure!(len > 0, "empty subpacket");

        let typ = i.read_u8()?;
        let mut body = i.read_take(len - 1)?;

        let is_critical = typ & 0x80 != 0;
        let data = match typ & 0x7F {
            Self::ISSUER => SubpacketData::Issuer(KeyId::from(body.read_array::<8>()?)),
            Self::KEY_FLAGS => SubpacketData::KeyFlags(KeyFlags::from(&body[..])),
            other => SubpacketData::Other(other, body),
        };

        Ok(Subpacket { is_critical, data })
    }
}

fn subpackets<B: Buf>(mut i: B) -> Result<Vec<Subpacket>> {
    let len = i.read_be_u16()?;
    let mut area = i.read_take(len.into())?;

    let mut res = Vec::new();
    while area.has_remaining() {
        res.push(Subpacket::from_buf(&mut area)?);
    }
    Ok(res)
}

impl Signature {
    /// Parses a `Signature` packet body.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 4 {
            unsupported_err!("signature version {}", version);
        }

        let typ = i.read_u8().map(SignatureType::from)?;
        let pub_alg = i.read_u8().map(PublicKeyAlgorithm::from)?;
        let hash_alg = i.read_u8().map(HashAlgorithm::from)?;
        let hashed_subpackets = subpackets(&mut i)?;
        let unhashed_subpackets = subpackets(&mut i)?;
        let signed_hash_value = i.read_array::<2>()?;
        let signature = i.rest();

        debug!("signature {:?}", typ);

        Ok(Signature {
            typ,
            pub_alg,
            hash_alg,
            hashed_subpackets,
            unhashed_subpackets,
            signed_hash_value,
            signature,
        })
    }

    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    pub fn pub_alg(&self) -> PublicKeyAlgorithm {
        self.pub_alg
    }

    pub fn hash_alg(&self) -> HashAlgorithm {
        self.hash_alg
    }

    /// The key flags, if set. Only the hashed area counts.
    pub fn key_flags(&self) -> Option<KeyFlags> {
        self.hashed_subpackets.iter().find_map(|p| match p.data {
            SubpacketData::KeyFlags(flags) => Some(flags),
            _ => None,
        })
    }

    /// The issuer key id from either subpacket area.
    pub fn issuer(&self) -> Option<&KeyId> {
        self.hashed_subpackets
            .iter()
            .chain(self.unhashed_subpackets.iter())
            .find_map(|p| match &p.data {
                SubpacketData::Issuer(id) => Some(id),
                _ => None,
            })
    }
}
