//! Binary property lists (`bplist00`).
//!
//! Text attributes inside a package are stored as keyed archives written
//! in this format. The layout is:
//!
//! ```text
//! "bplist00" | object table | offset table | trailer (32 bytes)
//! ```
//!
//! The trailer gives the width of offsets and object references, the
//! object count, the top object and where the offset table starts. Every
//! multi-byte number is big-endian.
//!
//! [`from_bytes`] accepts any conforming encoding. [`to_bytes`] writes one
//! canonical encoding, so decoding and re-encoding a foreign file keeps the
//! structure but not necessarily the bytes.

mod reader;
mod value;
mod writer;

pub use reader::from_bytes;
pub use value::Value;
pub use writer::to_bytes;

use thiserror::Error;

/// The eight magic bytes every binary property list starts with.
pub const MAGIC: &[u8; 8] = b"bplist00";

/// Size of the trailer at the end of the file.
pub const TRAILER_SIZE: usize = 32;

/// Errors produced while reading a binary property list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlistError {
    #[error("missing bplist00 header")]
    BadMagic,
    #[error("invalid trailer: {0}")]
    BadTrailer(&'static str),
    #[error("object #{index} offset {offset} is outside the object table")]
    BadOffset { index: u64, offset: u64 },
    #[error("reference to object #{index}, but only {count} objects exist")]
    BadReference { index: u64, count: u64 },
    #[error("unexpected end of data at offset {0}")]
    Truncated(usize),
    #[error("unknown object marker 0x{marker:02x} at offset {offset}")]
    UnknownMarker { marker: u8, offset: usize },
    #[error("invalid string data at offset {0}")]
    InvalidString(usize),
    #[error("dictionary key at offset {0} is not a string")]
    NonStringKey(usize),
    #[error("object #{0} contains itself")]
    Cycle(u64),
    #[error("objects nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("more than {0} objects decoded")]
    TooManyObjects(u64),
}
