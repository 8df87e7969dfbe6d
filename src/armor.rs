//! # Armor module
//!
//! ASCII armor for the three block types this crate reads and writes.
//!
//! Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-forming-ascii-armor>

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::hash::Hasher;

use base64::engine::{general_purpose::STANDARD, Engine as _};
use byteorder::{BigEndian, ByteOrder};
use crc24::Crc24Hasher;
use log::debug;

use crate::errors::{Error, Result};

/// Armor block types.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BlockType {
    /// PGP public key
    PublicKey,
    /// PGP private key
    PrivateKey,
    Message,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::PublicKey => f.write_str("PGP PUBLIC KEY BLOCK"),
            BlockType::PrivateKey => f.write_str("PGP PRIVATE KEY BLOCK"),
            BlockType::Message => f.write_str("PGP MESSAGE"),
        }
    }
}

impl BlockType {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "PGP PUBLIC KEY BLOCK" => Some(BlockType::PublicKey),
            "PGP PRIVATE KEY BLOCK" => Some(BlockType::PrivateKey),
            "PGP MESSAGE" => Some(BlockType::Message),
            _ => None,
        }
    }
}

/// Armor Headers.
pub type Headers = BTreeMap<String, Vec<String>>;

/// A decoded armor block.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Dearmored {
    pub typ: BlockType,
    pub headers: Headers,
    pub data: Vec<u8>,
}

const LINE_LENGTH: usize = 64;

fn armor_err(message: impl Into<String>) -> Error {
    Error::ArmorDecode {
        message: message.into(),
    }
}

fn crc24(data: &[u8]) -> u32 {
    let mut hasher = Crc24Hasher::new();
    hasher.write(data);
    hasher.finish() as u32
}

/// Decodes the first armor block found in `input`.
///
/// Text before the armor header line is ignored. The CRC-24 checksum is verified when present.
pub fn decode(input: &str) -> Result<Dearmored> {
    let mut lines = input.lines().map(str::trim_end);

    let typ = loop {
        let Some(line) = lines.next() else {
            return Err(armor_err("missing armor header line"));
        };
        let Some(label) = line
            .strip_prefix("-----BEGIN ")
            .and_then(|l| l.strip_suffix("-----"))
        else {
            continue;
        };
        match BlockType::from_label(label) {
            Some(typ) => break typ,
            None => return Err(armor_err(format!("unknown armor type {label:?}"))),
        }
    };
    debug!("armor block {}", typ);

    let footer = format!("-----END {typ}-----");
    let mut headers = Headers::new();
    let mut in_headers = true;
    let mut body = String::new();
    let mut checksum = None;
    let mut found_footer = false;

    for line in lines {
        let line = line.trim_start();
        if line == footer {
            found_footer = true;
            break;
        }
        if checksum.is_some() {
            return Err(armor_err("data after armor checksum"));
        }

        if in_headers {
            if line.is_empty() {
                in_headers = false;
                continue;
            }
            if let Some((key, value)) = line.split_once(": ") {
                headers
                    .entry(key.to_string())
                    .or_default()
                    .push(value.to_string());
                continue;
            }
            // no header section
            in_headers = false;
        }

        match line.strip_prefix('=') {
            Some(sum) => checksum = Some(sum.to_string()),
            None => body.push_str(line),
        }
    }

    if !found_footer {
        return Err(armor_err(format!("missing armor footer for {typ}")));
    }

    let data = STANDARD.decode(body.as_bytes()).map_err(|err| armor_err(err.to_string()))?;

    if let Some(sum) = checksum {
        let raw = STANDARD
            .decode(sum.as_bytes())
            .map_err(|err| armor_err(format!("invalid checksum: {err}")))?;
        if raw.len() != 3 {
            return Err(armor_err("invalid checksum length"));
        }
        let expected = BigEndian::read_u24(&raw);
        let actual = crc24(&data);
        if expected != actual {
            return Err(armor_err(format!(
                "invalid crc24 checksum: expected {expected:06x}, got {actual:06x}"
            )));
        }
    }

    Ok(Dearmored {
        typ,
        headers,
        data,
    })
}

/// Armors `data` as a block of the given type, with a CRC-24 checksum line.
pub fn write(data: &[u8], typ: BlockType, headers: Option<&Headers>) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "-----BEGIN {typ}-----").map_err(fmt_err)?;

    if let Some(headers) = headers {
        for (key, values) in headers.iter() {
            for value in values {
                writeln!(out, "{key}: {value}").map_err(fmt_err)?;
            }
        }
    }
    out.push('\n');

    let encoded = STANDARD.encode(data);
    // base64 output is ascii, so byte chunks are valid str
    for chunk in encoded.as_bytes().chunks(LINE_LENGTH) {
        out.push_str(std::str::from_utf8(chunk).map_err(|_| Error::InvalidInput)?);
        out.push('\n');
    }

    let crc = crc24(data);
    let mut crc_buf = [0u8; 3];
    BigEndian::write_u24(&mut crc_buf, crc);
    writeln!(out, "={}", STANDARD.encode(crc_buf)).map_err(fmt_err)?;
    writeln!(out, "-----END {typ}-----").map_err(fmt_err)?;

    Ok(out)
}

fn fmt_err(_: fmt::Error) -> Error {
    Error::InvalidInput
}
