mod common;

use pgp_session::armor::{self, BlockType};
use pgp_session::crypto::sym::SymmetricKeyAlgorithm;
use pgp_session::errors::Error;
use pgp_session::types::encode_length;
use pgp_session::{
    key_packet_with_public_key_bin, separate_key_and_data, separate_key_and_data_bin,
    session_from_key_packet_bin, EncryptedSplit, Password, SessionSplit,
};
use pretty_assertions::assert_eq;
use rand::Rng;

use crate::common::{init_logger, packet, rng, KeySpec, TestKey};

/// A SEIPD v1 packet with a fixed length header.
fn seipd(content: &[u8]) -> Vec<u8> {
    let mut body = vec![0x01];
    body.extend_from_slice(content);
    packet(18, &body)
}

#[test]
fn split_recovers_session_key() {
    init_logger();
    let mut rng = rng(30);
    let key = TestKey::generate(&mut rng, &KeySpec::standard("alice"));
    let split = SessionSplit::new(&[0x77; 32], SymmetricKeyAlgorithm::AES256).unwrap();

    let key_packet = key_packet_with_public_key_bin(&mut rng, &split, &key.public).unwrap();
    let mut content = vec![0u8; 300];
    rng.fill(&mut content[..]);

    let mut msg = key_packet.clone();
    msg.extend(seipd(&content));
    let armored = armor::write(&msg, BlockType::Message, None).unwrap();

    let parts = separate_key_and_data(&armored).unwrap();
    assert_eq!(parts.key_packet, key_packet);
    assert_eq!(parts.data_packet, seipd(&content));

    let recovered =
        session_from_key_packet_bin(&parts.key_packet, &key.secret, &Password::empty()).unwrap();
    assert_eq!(recovered, split);
}

#[test]
fn data_packet_of_8000_bytes() {
    let mut rng = rng(31);
    let key = TestKey::generate(&mut rng, &KeySpec::standard("bob"));
    let split = SessionSplit::new(&[0x01; 32], SymmetricKeyAlgorithm::AES256).unwrap();
    let key_packet = key_packet_with_public_key_bin(&mut rng, &split, &key.public).unwrap();

    let content = vec![0xEE; 8000];
    let mut msg = key_packet;
    msg.extend(seipd(&content));

    let parts = separate_key_and_data_bin(&msg).unwrap();
    let data = &parts.data_packet;
    assert_eq!(data[0], 0xD2);
    // two octet length: 192 + ((8001 - 192) >> 8), (8001 - 192) & 0xff
    assert_eq!(&data[1..3], &[222, 129]);
    let len = ((usize::from(data[1]) - 192) << 8) + usize::from(data[2]) + 192;
    assert_eq!(len, 8001);
    assert_eq!(data[3], 0x01);
    assert_eq!(&data[4..], &content[..]);
}

#[test]
fn partial_lengths_are_joined() {
    let mut rng = rng(32);
    let key = TestKey::generate(&mut rng, &KeySpec::standard("carol"));
    let split = SessionSplit::new(&[0x02; 16], SymmetricKeyAlgorithm::AES128).unwrap();
    let key_packet = key_packet_with_public_key_bin(&mut rng, &split, &key.public).unwrap();

    let mut content = vec![0u8; 3000];
    rng.fill(&mut content[..]);

    // version octet and 2047 octets, 512 more, then the 441 octet tail
    let mut msg = key_packet.clone();
    msg.push(0xD2);
    msg.push(0xEB);
    msg.push(0x01);
    msg.extend_from_slice(&content[..2047]);
    msg.push(0xE9);
    msg.extend_from_slice(&content[2047..2559]);
    msg.extend(encode_length(441));
    msg.extend_from_slice(&content[2559..]);

    let parts = separate_key_and_data_bin(&msg).unwrap();
    assert_eq!(parts.key_packet, key_packet);
    assert_eq!(parts.data_packet, seipd(&content));
}

#[test]
fn legacy_data_packet() {
    let mut rng = rng(33);
    let key = TestKey::generate(&mut rng, &KeySpec::standard("dave"));
    let split = SessionSplit::new(&[0x03; 24], SymmetricKeyAlgorithm::TripleDES).unwrap();
    let key_packet = key_packet_with_public_key_bin(&mut rng, &split, &key.public).unwrap();

    let mut msg = key_packet.clone();
    // old format, indeterminate length
    msg.push(0xA7);
    msg.extend_from_slice(&[0x10; 500]);

    let parts = separate_key_and_data_bin(&msg).unwrap();
    assert_eq!(parts.key_packet, key_packet);
    // carried over as a v1 integrity protected packet, version octet included
    assert_eq!(&parts.data_packet[..4], &[0xD2, 193, 53, 0x01]);
    assert_eq!(parts.data_packet, seipd(&[0x10; 500]));
}

#[test]
fn last_of_several_key_packets() {
    let mut rng = rng(34);
    let alice = TestKey::generate(&mut rng, &KeySpec::standard("alice"));
    let bob = TestKey::generate(&mut rng, &KeySpec::standard("bob"));
    let split = SessionSplit::new(&[0x04; 32], SymmetricKeyAlgorithm::AES256).unwrap();

    let for_alice = key_packet_with_public_key_bin(&mut rng, &split, &alice.public).unwrap();
    let for_bob = key_packet_with_public_key_bin(&mut rng, &split, &bob.public).unwrap();

    let mut msg = for_alice.clone();
    msg.extend_from_slice(&for_bob);
    msg.extend(seipd(b"ciphertext"));

    let parts = separate_key_and_data_bin(&msg).unwrap();
    assert_eq!(parts.key_packet, for_bob);

    let recovered =
        session_from_key_packet_bin(&parts.key_packet, &bob.secret, &Password::empty()).unwrap();
    assert_eq!(recovered, split);
}

#[test]
fn armored_join_round_trip() {
    let mut rng = rng(35);
    let key = TestKey::generate(&mut rng, &KeySpec::standard("erin"));
    let split = SessionSplit::new(&[0x05; 32], SymmetricKeyAlgorithm::AES256).unwrap();

    let parts = EncryptedSplit {
        key_packet: key_packet_with_public_key_bin(&mut rng, &split, &key.public).unwrap(),
        data_packet: seipd(&[0xAB; 1000]),
    };

    let armored = parts.to_armored().unwrap();
    assert_eq!(separate_key_and_data(&armored).unwrap(), parts);
    assert_eq!(separate_key_and_data_bin(&parts.to_bytes()).unwrap(), parts);
}

#[test]
fn missing_packets() {
    let err = separate_key_and_data_bin(&seipd(b"data")).unwrap_err();
    assert!(matches!(err, Error::NoKeyPacket), "{err:?}");

    let armored = armor::write(&seipd(b"data"), BlockType::Message, None).unwrap();
    let err = separate_key_and_data(&armored).unwrap_err();
    assert!(matches!(err, Error::NoKeyPacket), "{err:?}");

    let mut rng = rng(36);
    let key = TestKey::generate(&mut rng, &KeySpec::standard("frank"));
    let split = SessionSplit::new(&[0x06; 32], SymmetricKeyAlgorithm::AES256).unwrap();
    let key_packet = key_packet_with_public_key_bin(&mut rng, &split, &key.public).unwrap();
    let err = separate_key_and_data_bin(&key_packet).unwrap_err();
    assert!(matches!(err, Error::NoDataPacket), "{err:?}");
}

#[test]
fn bad_armor() {
    let err = separate_key_and_data("-----BEGIN PGP MESSAGE-----\n\nAAAA\n").unwrap_err();
    assert!(matches!(err, Error::ArmorDecode { .. }), "{err:?}");
}
