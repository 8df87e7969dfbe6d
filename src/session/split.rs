use log::{debug, warn};

use crate::armor;
use crate::errors::{Error, Result};
use crate::packet::{
    Packet, PacketParser, PacketTrait, PublicKeyEncryptedSessionKey, SymEncryptedProtectedData,
};
use crate::session::EncryptedSplit;

/// Splits an armored message into its key packet and its data packet.
pub fn separate_key_and_data(armored: &str) -> Result<EncryptedSplit> {
    let dearmored = armor::decode(armored)?;
    debug!("dearmored {} ({} bytes)", dearmored.typ, dearmored.data.len());

    separate_key_and_data_bin(&dearmored.data)
}

/// Splits a binary message into its key packet and its data packet.
///
/// Of several public key encrypted session key packets, the last one wins, as does the last
/// data packet. The data packet is re-framed as a version 1 integrity protected data packet
/// with a fixed length header, joining partial body chunks. The ciphertext is not touched.
pub fn separate_key_and_data_bin(input: &[u8]) -> Result<EncryptedSplit> {
    let mut key_packet: Option<PublicKeyEncryptedSessionKey> = None;
    let mut data_packet: Option<Vec<u8>> = None;

    for packet in PacketParser::new(input.to_vec()) {
        let packet = match packet {
            Ok(packet) => packet,
            Err(err) if err.is_unsupported() => {
                warn!("skipping packet: {}", err);
                continue;
            }
            Err(err) => return Err(err.into_packet_parse()),
        };

        match packet {
            Packet::PublicKeyEncryptedSessionKey(pkesk) => {
                if let Some(prev) = &key_packet {
                    debug!("key packet for {:x} replaces {:x}", pkesk.id(), prev.id());
                } else {
                    debug!("key packet for {:x}", pkesk.id());
                }
                key_packet = Some(pkesk);
            }
            Packet::SymEncryptedProtectedData(data) => {
                debug!("integrity protected data, {} bytes", data.data().len());
                data_packet = Some(data.to_bytes_with_header().map_err(Error::into_packet_parse)?);
            }
            Packet::SymEncryptedData(data) => {
                debug!("legacy encrypted data, {} bytes", data.data().len());
                let data = SymEncryptedProtectedData::v1(data.data().clone());
                data_packet = Some(data.to_bytes_with_header().map_err(Error::into_packet_parse)?);
            }
            Packet::SymKeyEncryptedSessionKey(_)
            | Packet::PublicKey(_)
            | Packet::PublicSubkey(_)
            | Packet::SecretKey(_)
            | Packet::SecretSubkey(_)
            | Packet::Signature(_)
            | Packet::UserId(_) => {
                debug!("ignoring {:?} packet", packet.tag());
            }
            Packet::Other(tag) => {
                debug!("ignoring {:?} packet", tag);
            }
        }
    }

    let key_packet = key_packet.ok_or(Error::NoKeyPacket)?;
    let data_packet = data_packet.ok_or(Error::NoDataPacket)?;

    Ok(EncryptedSplit {
        key_packet: key_packet
            .to_bytes_with_header()
            .map_err(Error::into_packet_parse)?,
        data_packet,
    })
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::encode_length;

    const PKESK: [u8; 16] = hex!("c1 0e 03 0102030405060708 01 0009 01ff");

    #[test]
    fn test_split_seipd() {
        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("d2 04 01 aabbcc"));

        let split = separate_key_and_data_bin(&msg).unwrap();
        assert_eq!(split.key_packet, PKESK.to_vec());
        assert_eq!(split.data_packet, hex!("d2 04 01 aabbcc").to_vec());
        assert_eq!(split.to_bytes(), msg);
    }

    #[test]
    fn test_old_format_reframed() {
        // old format pkesk and seipd
        let mut msg = hex!("84 0e 03 0102030405060708 01 0009 01ff").to_vec();
        msg.extend_from_slice(&hex!("c9 03 aabbcc"));
        // old format tag 18 is not possible, use an indeterminate tag 9
        msg.extend_from_slice(&hex!("a7 ddeeff"));

        let split = separate_key_and_data_bin(&msg).unwrap();
        assert_eq!(split.key_packet, PKESK.to_vec());
        // the last data packet wins, written as a v1 integrity protected packet
        assert_eq!(split.data_packet, hex!("d2 04 01 ddeeff").to_vec());
    }

    #[test]
    fn test_partial_body_reframed() {
        let content: Vec<u8> = (0..=255u8).cycle().take(700).collect();

        // version octet plus 511 octets in a 512 chunk, then a 189 octet tail
        let mut msg = PKESK.to_vec();
        msg.push(0xD2);
        msg.push(0xE9);
        msg.push(0x01);
        msg.extend_from_slice(&content[..511]);
        msg.extend(encode_length(189));
        msg.extend_from_slice(&content[511..]);

        let split = separate_key_and_data_bin(&msg).unwrap();

        let mut expected = vec![0xD2];
        expected.extend(encode_length(701));
        expected.push(0x01);
        expected.extend_from_slice(&content);
        assert_eq!(split.data_packet, expected);
    }

    #[test]
    fn test_last_key_packet_wins() {
        let second = hex!("c1 0e 03 1111111111111111 01 0009 01ff");
        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&second);
        msg.extend_from_slice(&hex!("d2 02 01 aa"));

        let split = separate_key_and_data_bin(&msg).unwrap();
        assert_eq!(split.key_packet, second.to_vec());
    }

    #[test]
    fn test_legacy_data_reframed() {
        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("c9 03 aabbcc"));

        let split = separate_key_and_data_bin(&msg).unwrap();
        assert_eq!(split.data_packet, hex!("d2 04 01 aabbcc").to_vec());
    }

    #[test]
    fn test_unsupported_data_version_skipped() {
        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("d2 02 01 aa"));
        msg.extend_from_slice(&hex!("d2 02 02 bb"));

        let split = separate_key_and_data_bin(&msg).unwrap();
        assert_eq!(split.data_packet, hex!("d2 02 01 aa").to_vec());

        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("d2 02 02 bb"));
        let err = separate_key_and_data_bin(&msg).unwrap_err();
        assert!(matches!(err, Error::NoDataPacket), "{err:?}");
    }

    #[test]
    fn test_other_packets_ignored() {
        // marker, v6 pkesk, skesk, pkesk, seipd
        let mut msg = hex!("ca 03 504750").to_vec();
        msg.extend_from_slice(&hex!("c1 03 060000"));
        msg.extend_from_slice(&hex!("c3 04 04 07 00 02"));
        msg.extend_from_slice(&PKESK);
        msg.extend_from_slice(&hex!("d2 02 01 aa"));

        let split = separate_key_and_data_bin(&msg).unwrap();
        assert_eq!(split.key_packet, PKESK.to_vec());
        assert_eq!(split.data_packet, hex!("d2 02 01 aa").to_vec());
    }

    #[test]
    fn test_missing_packets() {
        let err = separate_key_and_data_bin(&hex!("d2 02 01 aa")).unwrap_err();
        assert!(matches!(err, Error::NoKeyPacket), "{err:?}");

        let err = separate_key_and_data_bin(&PKESK).unwrap_err();
        assert!(matches!(err, Error::NoDataPacket), "{err:?}");

        let err = separate_key_and_data_bin(&[]).unwrap_err();
        assert!(matches!(err, Error::NoKeyPacket), "{err:?}");
    }

    #[test]
    fn test_malformed() {
        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("d2 09 01 aa"));
        let err = separate_key_and_data_bin(&msg).unwrap_err();
        assert!(matches!(err, Error::PacketParse { .. }), "{err:?}");

        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("d2 00"));
        let err = separate_key_and_data_bin(&msg).unwrap_err();
        assert!(matches!(err, Error::PacketParse { .. }), "{err:?}");
    }

    #[test]
    fn test_armored() {
        let mut msg = PKESK.to_vec();
        msg.extend_from_slice(&hex!("d2 02 01 aa"));
        let armored = armor::write(&msg, armor::BlockType::Message, None).unwrap();

        let split = separate_key_and_data(&armored).unwrap();
        assert_eq!(split.to_bytes(), msg);
        assert_eq!(separate_key_and_data(&split.to_armored().unwrap()).unwrap(), split);

        let err = separate_key_and_data("no armor here").unwrap_err();
        assert!(matches!(err, Error::ArmorDecode { .. }), "{err:?}");
    }
}
