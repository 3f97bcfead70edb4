//! # sketchfile
//!
//! Decoder for Sketch document packages.
//!
//! A package is a zip archive of JSON documents: `document.json`, `meta.json`
//! and one `pages/<id>.json` per page. This crate reads the archive from a
//! local file, an HTTP URL (using Range requests, so only the JSON entries
//! are downloaded) or memory, and decodes every document into typed records.
//!
//! ## Features
//!
//! - Typed model of documents, pages, layers and styles
//! - Decoding of the string encodings used inside the JSON: coordinate
//!   tuples `"{x, y}"`, coordinate lists and base64 binary property lists
//! - Binary property list reader and writer (`bplist00`)
//! - Concurrent page decoding with a configurable limit
//! - ZIP64, STORED and DEFLATE support with CRC-32 checks
//!
//! ## Example
//!
//! ```no_run
//! use sketchfile::{LoadOptions, Package};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let package = Package::open("design.sketch").await?;
//!
//!     for page in package.ordered_pages() {
//!         println!("{}: {} layers", page.name.as_deref().unwrap_or(""), page.layer_count());
//!     }
//!
//!     let remote = Package::from_url(
//!         "https://example.com/design.sketch",
//!         &LoadOptions { concurrency: 4, ..LoadOptions::default() },
//!     )
//!     .await?;
//!     println!("{} pages", remote.pages.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod codec;
pub mod io;
pub mod model;
pub mod package;
pub mod plist;
pub mod zip;

pub use cli::Cli;
pub use codec::{Archive, CodecError, Point, PointList};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use package::{LoadError, LoadOptions, Package};
pub use zip::{ZipExtractor, ZipFileEntry};
