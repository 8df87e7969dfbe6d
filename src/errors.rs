use std::num::TryFromIntError;

use snafu::{Backtrace, Snafu};

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

pub use crate::parsing::{Error as ParsingError, RemainingError};

/// Error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The packet stream is malformed or truncated, or a packet was not of the expected type.
    #[snafu(display("failed to parse packet: {message}"))]
    PacketParse { message: String },
    /// The keyring input (binary or armored) could not be read.
    #[snafu(display("failed to parse key ring: {message}"))]
    KeyRingParse { message: String },
    /// None of the candidate private keys could decrypt the key packet.
    #[snafu(display("can't decrypt key packet"))]
    DecryptionFailed,
    /// Decryption succeeded, but no key material was recovered.
    #[snafu(display("can't decrypt key packet: key is nil"))]
    NilSessionKey,
    #[snafu(display("cannot set key: key ring is empty"))]
    EmptyKeyRing,
    #[snafu(display("cannot set key: no public key available"))]
    NoUsablePublicKey,
    #[snafu(display("password can't be empty"))]
    EmptyPassword,
    #[snafu(display("password incorrect"))]
    IncorrectPassword,
    /// Building or writing a key packet failed.
    #[snafu(display("cannot set key: {source}"))]
    Serialization { source: Box<Error> },
    #[snafu(display("no encrypted session key packet found"))]
    NoKeyPacket,
    #[snafu(display("no encrypted data packet found"))]
    NoDataPacket,
    #[snafu(display("failed to decode armor: {message}"))]
    ArmorDecode { message: String },
    #[snafu(display("random source failed: {source}"))]
    RandomSource { source: rand::Error },
    #[snafu(display("invalid session key length: expected {expected}, got {actual}"))]
    InvalidSessionKeyLength { expected: usize, actual: usize },

    #[snafu(display("invalid input"))]
    InvalidInput,
    #[snafu(transparent)]
    Parsing { source: ParsingError },
    #[snafu(transparent)]
    IO {
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(transparent)]
    RSAError { source: rsa::errors::Error },
    #[snafu(transparent)]
    TryFromInt { source: TryFromIntError },
    #[snafu(transparent)]
    Base64Decode { source: base64::DecodeError },
    #[snafu(display("cfb: invalid key iv length"))]
    CfbInvalidKeyIvLength,
    /// Signals packet versions and parameters we don't support, but can safely skip
    #[snafu(display("Unsupported: {message}"))]
    Unsupported { message: String },
    #[snafu(display("{message}"))]
    Message { message: String },
}

impl Error {
    /// Returns true for errors that flag a known-but-unsupported construct,
    /// as opposed to malformed input.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }

    /// Maps internal failures onto [`Error::PacketParse`], keeping the public kinds intact.
    pub(crate) fn into_packet_parse(self) -> Error {
        match self {
            Error::Parsing { .. }
            | Error::IO { .. }
            | Error::InvalidInput
            | Error::TryFromInt { .. }
            | Error::Unsupported { .. }
            | Error::Message { .. } => Error::PacketParse {
                message: self.to_string(),
            },
            other => other,
        }
    }

    /// Maps any failure onto [`Error::KeyRingParse`], except armor failures.
    pub(crate) fn into_key_ring_parse(self) -> Error {
        match self {
            Error::ArmorDecode { .. } | Error::KeyRingParse { .. } => self,
            other => Error::KeyRingParse {
                message: other.to_string(),
            },
        }
    }
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Error {
        Error::CfbInvalidKeyIvLength
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::Message { message: err }
    }
}

macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unsupported { message: $e.to_string()})
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unsupported { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            $crate::errors::bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::errors::bail!($fmt, $($arg)+);
        }
    };
}

macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::errors::bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::errors::bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}

pub(crate) use bail;
pub(crate) use ensure;
pub(crate) use ensure_eq;
pub(crate) use unsupported_err;
