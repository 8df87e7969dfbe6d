use bytes::{Buf, Bytes};

use crate::errors::Result;
use crate::parsing::BufParsing;

/// Symmetrically Encrypted Data Packet
/// <https://www.rfc-editor.org/rfc/rfc9580.html#name-symmetrically-encrypted-dat>
///
/// The packet is obsolete. Its content is carried over into an integrity protected
/// packet when a message is split, never decrypted.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct SymEncryptedData {
    #[debug("{}", hex::encode(data))]
    data: Bytes,
}

impl SymEncryptedData {
    /// Parses a `SymEncryptedData` packet from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let data = i.rest();
        Ok(SymEncryptedData { data })
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
