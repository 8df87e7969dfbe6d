use bytes::{Buf, Bytes};

use crate::errors::Result;
use crate::parsing::BufParsing;

/// User ID Packet
/// <https://www.rfc-editor.org/rfc/rfc9580.html#name-user-id-packet-type-id-13>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct UserId {
    #[debug("{:?}", String::from_utf8_lossy(id))]
    id: Bytes,
}

impl UserId {
    /// Parses a `UserId` packet from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let id = i.rest();
        Ok(UserId { id })
    }

    /// The raw id, usually but not necessarily UTF-8.
    pub fn id(&self) -> &[u8] {
        &self.id
    }
}
