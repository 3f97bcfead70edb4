//! Zip container access for package files.
//!
//! - [`structures`]: records of the zip format (EOCD, ZIP64 records, entries)
//! - [`parser`]: locating and parsing the central directory
//! - [`extractor`]: reading, inflating and CRC-checking entry data
//!
//! Supported: standard zip and ZIP64, STORED and DEFLATE entries.
//! Not supported: encryption, multi-disk archives, other compression methods.

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
