use std::io;

use bytes::{Buf, Bytes};

use crate::errors::{unsupported_err, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Tag;

/// Symmetrically Encrypted Integrity Protected Data Packet
/// <https://www.rfc-editor.org/rfc/rfc9580.html#name-symmetrically-encrypted-and>
///
/// Only version 1 is read. The ciphertext is opaque.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct SymEncryptedProtectedData {
    #[debug("{}", hex::encode(data))]
    data: Bytes,
}

impl SymEncryptedProtectedData {
    /// Parses a `SymEncryptedProtectedData` packet from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 1 {
            unsupported_err!("integrity protected data version {}", version);
        }
        let data = i.rest();
        Ok(SymEncryptedProtectedData { data })
    }

    /// Wraps already encrypted v1 content.
    pub fn v1(data: Bytes) -> Self {
        SymEncryptedProtectedData { data }
    }

    /// The content after the version octet.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Serialize for SymEncryptedProtectedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[1])?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + self.data.len()
    }
}

impl PacketTrait for SymEncryptedProtectedData {
    fn tag(&self) -> Tag {
        Tag::SymEncryptedProtectedData
    }
}
