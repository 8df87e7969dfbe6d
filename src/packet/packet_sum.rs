use std::io;

use bytes::Bytes;
use log::debug;

use crate::errors::Result;
use crate::packet::{
    PacketHeader, PublicKey, PublicKeyEncryptedSessionKey, PublicSubkey, SecretKey, SecretSubkey,
    Signature, SymEncryptedData, SymEncryptedProtectedData, SymKeyEncryptedSessionKey, UserId,
};
use crate::ser::Serialize;
use crate::types::Tag;

/// Represents a Packet. A packet is the record structure used to encode a chunk of data in OpenPGP.
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-packet-syntax>
///
/// Only the packets needed for session key handling are parsed,
/// everything else is reported by its tag.
#[derive(Debug, Clone)]
pub enum Packet {
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    SymKeyEncryptedSessionKey(SymKeyEncryptedSessionKey),
    SymEncryptedData(SymEncryptedData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    PublicKey(PublicKey),
    PublicSubkey(PublicSubkey),
    SecretKey(SecretKey),
    SecretSubkey(SecretSubkey),
    Signature(Signature),
    UserId(UserId),
    Other(Tag),
}

impl Packet {
    /// Parses the body of a packet with the given tag.
    ///
    /// Keys and signatures of unsupported versions are returned as [`Packet::Other`],
    /// so that a keyring can step over them.
    pub fn from_bytes(tag: Tag, body: Bytes) -> Result<Self> {
        let res = match tag {
            Tag::PublicKeyEncryptedSessionKey => {
                PublicKeyEncryptedSessionKey::from_buf(body).map(Packet::from)
            }
            Tag::SymKeyEncryptedSessionKey => {
                SymKeyEncryptedSessionKey::from_buf(body).map(Packet::from)
            }
            Tag::SymEncryptedData => SymEncryptedData::from_buf(body).map(Packet::from),
            Tag::SymEncryptedProtectedData => {
                SymEncryptedProtectedData::from_buf(body).map(Packet::from)
            }
            Tag::PublicKey => PublicKey::from_buf(body).map(Packet::from),
            Tag::PublicSubkey => PublicSubkey::from_buf(body).map(Packet::from),
            Tag::SecretKey => SecretKey::from_buf(body).map(Packet::from),
            Tag::SecretSubkey => SecretSubkey::from_buf(body).map(Packet::from),
            Tag::Signature => Signature::from_buf(body).map(Packet::from),
            Tag::UserId => UserId::from_buf(body).map(Packet::from),
            _ => Ok(Packet::Other(tag)),
        };

        match res {
            Err(err) if err.is_unsupported() && is_keyring_tag(tag) => {
                debug!("skipping {:?} packet: {}", tag, err);
                Ok(Packet::Other(tag))
            }
            res => res,
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            Self::PublicKeyEncryptedSessionKey(_) => Tag::PublicKeyEncryptedSessionKey,
            Self::SymKeyEncryptedSessionKey(_) => Tag::SymKeyEncryptedSessionKey,
            Self::SymEncryptedData(_) => Tag::SymEncryptedData,
            Self::SymEncryptedProtectedData(_) => Tag::SymEncryptedProtectedData,
            Self::PublicKey(_) => Tag::PublicKey,
            Self::PublicSubkey(_) => Tag::PublicSubkey,
            Self::SecretKey(_) => Tag::SecretKey,
            Self::SecretSubkey(_) => Tag::SecretSubkey,
            Self::Signature(_) => Tag::Signature,
            Self::UserId(_) => Tag::UserId,
            Self::Other(tag) => *tag,
        }
    }
}

macro_rules! impl_from_packet {
    ($( $name:ident ),*) => {
        $(
            impl From<$name> for Packet {
                fn from(other: $name) -> Packet {
                    Packet::$name(other)
                }
            }
        )*
    };
}

impl_from_packet!(
    PublicKeyEncryptedSessionKey,
    SymKeyEncryptedSessionKey,
    SymEncryptedData,
    SymEncryptedProtectedData,
    PublicKey,
    PublicSubkey,
    SecretKey,
    SecretSubkey,
    Signature,
    UserId
);

/// Tags of the packets that make up a keyring.
fn is_keyring_tag(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::PublicKey | Tag::PublicSubkey | Tag::SecretKey | Tag::SecretSubkey | Tag::Signature
    )
}

pub trait PacketTrait: Serialize {
    fn tag(&self) -> Tag;

    /// Write this packet including a new style packet header.
    fn to_writer_with_header<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let header = PacketHeader::new_fixed(self.tag(), self.write_len().try_into()?);
        header.to_writer(writer)?;

        // the actual packet body
        self.to_writer(writer)?;

        Ok(())
    }

    /// Length in bytes used when calling `to_writer_with_header`.
    fn write_len_with_header(&self) -> usize {
        let len = self.write_len();
        PacketHeader::new_fixed(self.tag(), len as u32).write_len() + len
    }

    /// Serializes the packet including its header.
    fn to_bytes_with_header(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.write_len_with_header());
        self.to_writer_with_header(&mut buf)?;
        Ok(buf)
    }
}
