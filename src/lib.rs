//! # pgp-session
//!
//! Extract, re-wrap and split the session key of OpenPGP messages.
//!
//! An encrypted OpenPGP message is a key packet, holding the session key encrypted to a
//! recipient, followed by a data packet encrypted with that session key. This crate works on
//! the key packet only:
//!
//! - [`session_from_key_packet`] and [`session_from_symmetric_packet`] recover the session key,
//! - [`key_packet_with_public_key`] and [`symmetric_key_packet_with_password`] wrap it for a
//!   new recipient,
//! - [`separate_key_and_data`] splits a message into its two packets.
//!
//! Only RSA keys are supported for encryption and decryption.

#![deny(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod armor;
pub mod composed;
pub mod crypto;
pub mod errors;
pub mod packet;
pub mod ser;
pub mod session;
pub mod types;

mod parsing;

pub use self::composed::KeyRing;
pub use self::session::*;
pub use self::types::Password;
