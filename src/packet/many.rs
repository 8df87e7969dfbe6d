use bytes::{Buf, Bytes, BytesMut};
use log::{debug, warn};

use crate::errors::{Error, Result};
use crate::packet::{Packet, PacketHeader};
use crate::parsing::BufParsing;
use crate::types::PacketLength;

/// Parses packets from an in-memory buffer, one at a time.
///
/// Errors in a packet body are reported and parsing continues with the next packet.
/// Errors in the framing end the iteration, as the next packet can't be located.
#[derive(Debug)]
pub struct PacketParser {
    input: Bytes,
    done: bool,
}

impl PacketParser {
    pub fn new(input: impl Into<Bytes>) -> Self {
        PacketParser {
            input: input.into(),
            done: false,
        }
    }

    /// Reads the next header and body, joining partial body chunks.
    fn next_raw(&mut self) -> Result<(PacketHeader, Bytes)> {
        let header = PacketHeader::from_buf(&mut self.input)?;

        let body = match header.packet_length() {
            PacketLength::Fixed(len) => self.input.read_take(len.try_into()?)?,
            PacketLength::Indeterminate => self.input.rest(),
            PacketLength::Partial(len) => {
                let mut body = BytesMut::new();
                let mut len = len;
                loop {
                    let chunk = self.input.read_take(len.try_into()?)?;
                    body.extend_from_slice(&chunk);

                    match PacketLength::from_buf(&mut self.input)? {
                        PacketLength::Partial(next) => len = next,
                        PacketLength::Fixed(last) => {
                            let chunk = self.input.read_take(last.try_into()?)?;
                            body.extend_from_slice(&chunk);
                            break;
                        }
                        PacketLength::Indeterminate => {
                            return Err(Error::InvalidInput);
                        }
                    }
                }
                debug!("joined partial body of {} bytes", body.len());
                body.freeze()
            }
        };

        Ok((header, body))
    }
}

impl Iterator for PacketParser {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.input.has_remaining() {
            return None;
        }

        let (header, body) = match self.next_raw() {
            Ok(res) => res,
            Err(err) => {
                warn!("invalid packet framing: {}", err);
                self.done = true;
                return Some(Err(err));
            }
        };

        let tag = header.tag();
        let res = Packet::from_bytes(tag, body);
        if let Err(ref err) = res {
            debug!("failed to parse {:?} packet: {}", tag, err);
        }

        Some(res)
    }
}

/// Parses exactly the first packet of `input`.
pub fn first_packet(input: impl Into<Bytes>) -> Result<Packet> {
    PacketParser::new(input)
        .next()
        .unwrap_or_else(|| Err(Error::PacketParse {
            message: "no packets".to_string(),
        }))
}
