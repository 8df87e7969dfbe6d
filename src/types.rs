mod key_id;
mod mpi;
mod packet;
mod params;
mod password;
mod s2k;

pub use self::{
    key_id::KeyId,
    mpi::Mpi,
    packet::*,
    params::*,
    password::Password,
    s2k::{StringToKey, DEFAULT_ITER_SALTED_COUNT},
};
