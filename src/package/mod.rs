//! Loading a whole package.
//!
//! A package is a zip archive holding:
//!
//! - `document.json`: the document descriptor
//! - `meta.json`: information about the app that saved it
//! - `pages/<id>.json`: one descriptor per page
//! - previews, images and other assets, which are ignored here
//!
//! Pages are keyed by the `name` field inside each page document, not by
//! their entry name. When two pages share a name, the one later in the
//! archive wins.

mod error;
mod loader;

pub use error::LoadError;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
use crate::model::{Document, Meta, Page};
use crate::zip::{ZipExtractor, ZipFileEntry};

pub const DOCUMENT_ENTRY: &str = "document.json";
pub const META_ENTRY: &str = "meta.json";
pub const PAGES_PREFIX: &str = "pages/";

/// Role of an archive entry within a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Document,
    Meta,
    Page,
    Other,
}

impl EntryKind {
    pub fn classify(entry: &ZipFileEntry) -> Self {
        let name = entry.file_name.as_str();
        if name == DOCUMENT_ENTRY {
            EntryKind::Document
        } else if name == META_ENTRY {
            EntryKind::Meta
        } else if name.starts_with(PAGES_PREFIX) && !entry.is_directory {
            EntryKind::Page
        } else {
            EntryKind::Other
        }
    }
}

/// Knobs for [`Package::from_reader`]
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Maximum number of pages decoded at once; 1 decodes them one by one.
    pub concurrency: usize,
    /// Check every decoded entry against its CRC-32.
    pub verify_crc: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism().map_or(1, |n| n.get()),
            verify_crc: true,
        }
    }
}

/// A decoded package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    /// `None` when the archive has no `document.json`.
    pub document: Option<Document>,
    pub meta: Option<Meta>,
    pub pages: HashMap<String, Page>,
}

impl Package {
    /// Load a package from a local file with default options.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::open_with(path, &LoadOptions::default()).await
    }

    pub async fn open_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, LoadError> {
        let reader = LocalFileReader::new(path.as_ref()).map_err(LoadError::Open)?;
        Self::from_reader(Arc::new(reader), options).await
    }

    /// Load a package over HTTP, fetching only the ranges that are needed.
    pub async fn from_url(url: &str, options: &LoadOptions) -> Result<Self, LoadError> {
        let reader = HttpRangeReader::new(url.to_owned())
            .await
            .map_err(LoadError::Open)?;
        Self::from_reader(Arc::new(reader), options).await
    }

    pub async fn from_bytes(data: Vec<u8>, options: &LoadOptions) -> Result<Self, LoadError> {
        Self::from_reader(Arc::new(MemoryReader::new(data)), options).await
    }

    /// Load a package from any random-access source.
    ///
    /// The document and meta descriptors are decoded first, then all pages.
    /// The source is released when this returns, whatever the outcome.
    pub async fn from_reader<R>(reader: Arc<R>, options: &LoadOptions) -> Result<Self, LoadError>
    where
        R: ReadAt + 'static,
    {
        let extractor =
            Arc::new(ZipExtractor::new(reader).with_crc_check(options.verify_crc));
        let entries = extractor.list_files().await.map_err(LoadError::Open)?;
        debug!(entries = entries.len(), "listed package entries");

        let mut package = Package::default();
        let mut page_entries = Vec::new();

        for entry in entries {
            match EntryKind::classify(&entry) {
                EntryKind::Document => {
                    package.document = Some(loader::decode_entry(&extractor, &entry).await?);
                }
                EntryKind::Meta => {
                    package.meta = Some(loader::decode_entry(&extractor, &entry).await?);
                }
                EntryKind::Page => page_entries.push(entry),
                EntryKind::Other => trace!(entry = %entry.file_name, "ignoring entry"),
            }
        }

        let names: Vec<String> = page_entries.iter().map(|e| e.file_name.clone()).collect();
        let pages = loader::decode_pages(extractor, page_entries, options.concurrency).await?;

        for (entry, page) in names.into_iter().zip(pages) {
            let name = match &page.name {
                Some(name) => name.clone(),
                None => {
                    warn!(%entry, "page has no name, keying it by the empty string");
                    String::new()
                }
            };
            if package.pages.insert(name.clone(), page).is_some() {
                debug!(%entry, %name, "page replaces an earlier page with the same name");
            }
        }

        if package.document.is_none() {
            debug!("package has no {}", DOCUMENT_ENTRY);
        }
        Ok(package)
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.get(name)
    }

    /// Pages in the order the document lists them.
    ///
    /// Pages the document does not reference (or all of them, when there is
    /// no document) follow, sorted by name.
    pub fn ordered_pages(&self) -> Vec<&Page> {
        let mut ordered: Vec<&Page> = Vec::with_capacity(self.pages.len());
        let references = self
            .document
            .as_ref()
            .and_then(|document| document.pages.as_deref())
            .unwrap_or_default();

        for reference in references {
            let Some(id) = reference
                .reference
                .as_deref()
                .and_then(|r| r.strip_prefix(PAGES_PREFIX))
            else {
                continue;
            };
            if let Some(page) = self
                .pages
                .values()
                .find(|page| page.object_id.as_deref() == Some(id))
            {
                ordered.push(page);
            }
        }

        let mut rest: Vec<&Page> = self
            .pages
            .values()
            .filter(|page| !ordered.iter().any(|seen| std::ptr::eq(*seen, *page)))
            .collect();
        rest.sort_by(|a, b| a.name.cmp(&b.name));
        ordered.extend(rest);
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::CompressionMethod;

    fn entry(name: &str) -> ZipFileEntry {
        ZipFileEntry {
            file_name: name.to_owned(),
            compression_method: CompressionMethod::Deflate,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            flags: 0,
            is_directory: name.ends_with('/'),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(EntryKind::classify(&entry("document.json")), EntryKind::Document);
        assert_eq!(EntryKind::classify(&entry("meta.json")), EntryKind::Meta);
        assert_eq!(EntryKind::classify(&entry("pages/0A4B.json")), EntryKind::Page);
        assert_eq!(EntryKind::classify(&entry("pages/")), EntryKind::Other);
        assert_eq!(EntryKind::classify(&entry("images/1f.png")), EntryKind::Other);
        assert_eq!(EntryKind::classify(&entry("previews/preview.png")), EntryKind::Other);
        assert_eq!(EntryKind::classify(&entry("sub/document.json")), EntryKind::Other);
    }

    #[test]
    fn test_ordered_pages_follow_document() {
        let page = |id: &str, name: &str| Page {
            object_id: Some(id.to_owned()),
            name: Some(name.to_owned()),
            ..Page::default()
        };
        let document: Document = serde_json::from_str(
            r#"{"pages": [{"_ref": "pages/B"}, {"_ref": "pages/A"}]}"#,
        )
        .unwrap();

        let mut package = Package {
            document: Some(document),
            ..Package::default()
        };
        for p in [page("A", "Alpha"), page("B", "Beta"), page("C", "Aardvark")] {
            package.pages.insert(p.name.clone().unwrap(), p);
        }

        let names: Vec<_> = package
            .ordered_pages()
            .iter()
            .filter_map(|p| p.name.as_deref())
            .collect();
        assert_eq!(names, ["Beta", "Alpha", "Aardvark"]);
    }
}
