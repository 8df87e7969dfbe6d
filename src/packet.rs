//! # Packet module
//!
//! Handles everything in relationship to packets.

mod header;
mod many;
mod packet_sum;

mod key;
mod public_key_encrypted_session_key;
mod signature;
mod sym_encrypted_data;
mod sym_encrypted_protected_data;
mod sym_key_encrypted_session_key;
mod user_id;

pub use self::{
    header::PacketHeader,
    key::*,
    many::*,
    packet_sum::*,
    public_key_encrypted_session_key::*,
    signature::{KeyFlags, Signature, SignatureType, Subpacket, SubpacketData},
    sym_encrypted_data::*,
    sym_encrypted_protected_data::*,
    sym_key_encrypted_session_key::*,
    user_id::*,
};
pub use crate::types::encode_length;
