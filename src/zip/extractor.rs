use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Reads entry contents out of a package archive
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
    verify_crc: bool,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
            verify_crc: true,
        }
    }

    /// Toggle CRC-32 verification of extracted entries (on by default).
    pub fn with_crc_check(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract and decompress one entry into memory
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("Entry {} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        match data_offset.checked_add(entry.compressed_size) {
            Some(end) if end <= self.parser.size() => {}
            _ => bail!(
                "Entry {} ({} bytes at {}) runs past the end of the archive",
                entry.file_name,
                entry.compressed_size,
                data_offset
            ),
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => inflate(&raw, entry.uncompressed_size)
                .with_context(|| format!("Cannot inflate {}", entry.file_name))?,
            CompressionMethod::Unknown(_) => bail!(
                "Unsupported compression method in {}: {} (only stored and deflate are supported)",
                entry.file_name,
                entry.compression_method
            ),
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Entry {} expanded to {} bytes, central directory says {}",
                entry.file_name,
                data.len(),
                entry.uncompressed_size
            );
        }

        if self.verify_crc {
            let mut crc = Crc::new();
            crc.update(&data);
            if crc.sum() != entry.crc32 {
                bail!(
                    "CRC mismatch in {}: expected {:08x}, got {:08x}",
                    entry.file_name,
                    entry.crc32,
                    crc.sum()
                );
            }
        }

        Ok(data)
    }
}

/// Inflate a raw deflate stream, refusing to grow past the declared size.
fn inflate(raw: &[u8], uncompressed_size: u64) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(uncompressed_size.min(64 << 20) as usize);
    DeflateDecoder::new(raw)
        .take(uncompressed_size.saturating_add(1))
        .read_to_end(&mut out)?;
    Ok(out)
}
