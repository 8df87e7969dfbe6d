//! Handle OpenPGP objects that are composed of multiple packets.
//!
//! Only transferable keys are composed here, and only as far as session key handling needs:
//! the primary key, its user ids with their self-signatures, and its subkeys with their
//! binding signatures. Signatures are taken at face value, they are not verified.
//!
//! See <https://www.rfc-editor.org/rfc/rfc9580#name-transferable-public-keys>

mod key_ring;

pub use self::key_ring::*;
