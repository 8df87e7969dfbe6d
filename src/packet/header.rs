use std::io;

use bytes::Buf;
use log::debug;

use crate::errors::{bail, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{encode_length, PacketLength, Tag};

/// Represents a packet header.
///
/// Both header formats are read. Headers are always written in the new format, with a fixed
/// length.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-packet-headers>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    tag: Tag,
    length: PacketLength,
}

impl PacketHeader {
    /// Parse a single packet header from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let header = i.read_u8()?;

        let first_two_bits = header & 0b1100_0000;
        let res = match first_two_bits {
            0b1100_0000 => {
                // new starts with 0b11
                let tag = Tag::from(header & 0b0011_1111);
                let length = PacketLength::from_buf(&mut i)?;
                PacketHeader { tag, length }
            }
            0b1000_0000 => {
                // old starts with 0b10, four bits of tag, two bits of length type
                let tag = Tag::from((header >> 2) & 0b0000_1111);
                let length = match header & 0b0000_0011 {
                    // One-Octet Lengths
                    0 => PacketLength::Fixed(i.read_u8()?.into()),
                    // Two-Octet Lengths
                    1 => PacketLength::Fixed(i.read_be_u16()?.into()),
                    // Four-Octet Lengths
                    2 => PacketLength::Fixed(i.read_be_u32()?),
                    _ => PacketLength::Indeterminate,
                };
                PacketHeader { tag, length }
            }
            _ => {
                bail!("unknown packet header version {:b}", header);
            }
        };

        debug!("parsed packet header {:?}", res);
        Ok(res)
    }

    /// Creates a new format packet header with a fixed length.
    pub fn new_fixed(tag: Tag, length: u32) -> Self {
        PacketHeader {
            tag,
            length: PacketLength::Fixed(length),
        }
    }

    /// Returns the packet length.
    pub fn packet_length(&self) -> PacketLength {
        self.length
    }

    /// Returns the packet tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }
}

impl Serialize for PacketHeader {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let PacketLength::Fixed(len) = self.length else {
            bail!("only fixed length headers are written, got {:?}", self.length);
        };
        writer.write_all(&[self.tag.encode()])?;
        writer.write_all(&encode_length(len))?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        match self.length {
            PacketLength::Fixed(len) => 1 + PacketLength::fixed_encoding_len(len),
            _ => 1,
        }
    }
}
