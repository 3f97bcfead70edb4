use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

use super::LoadError;
use crate::io::ReadAt;
use crate::model::Page;
use crate::zip::{ZipExtractor, ZipFileEntry};

/// Extract one entry and decode its JSON into `T`.
pub(super) async fn decode_entry<T, R>(
    extractor: &ZipExtractor<R>,
    entry: &ZipFileEntry,
) -> Result<T, LoadError>
where
    T: DeserializeOwned,
    R: ReadAt,
{
    debug!(
        entry = %entry.file_name,
        method = %entry.compression_method,
        size = entry.uncompressed_size,
        "decoding entry"
    );
    let bytes = extractor
        .extract_to_memory(entry)
        .await
        .map_err(|error| LoadError::Extract {
            entry: entry.file_name.clone(),
            error,
        })?;
    decode_json(&entry.file_name, &bytes)
}

/// Decode a JSON document, recording the path of the failing field.
pub(crate) fn decode_json<T: DeserializeOwned>(entry: &str, bytes: &[u8]) -> Result<T, LoadError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|err| LoadError::Decode {
        entry: entry.to_owned(),
        path: err.path().to_string(),
        source: err.into_inner(),
    })?;
    de.end().map_err(|source| LoadError::Decode {
        entry: entry.to_owned(),
        path: ".".to_owned(),
        source,
    })?;
    Ok(value)
}

/// Decode page entries on up to `concurrency` tasks.
///
/// Pages come back in the order of `entries`. The first failure aborts
/// the remaining tasks.
pub(super) async fn decode_pages<R>(
    extractor: Arc<ZipExtractor<R>>,
    entries: Vec<ZipFileEntry>,
    concurrency: usize,
) -> Result<Vec<Page>, LoadError>
where
    R: ReadAt + 'static,
{
    let limit = concurrency.max(1);
    let mut tasks: JoinSet<Result<(usize, Page), LoadError>> = JoinSet::new();
    let mut pages = Vec::with_capacity(entries.len());

    // Returning early drops `tasks`, which aborts whatever is still running.
    for (index, entry) in entries.into_iter().enumerate() {
        if tasks.len() >= limit {
            if let Some(joined) = tasks.join_next().await {
                pages.push(joined??);
            }
        }
        let extractor = Arc::clone(&extractor);
        tasks.spawn(async move {
            let page: Page = decode_entry(&extractor, &entry).await?;
            Ok((index, page))
        });
    }
    while let Some(joined) = tasks.join_next().await {
        pages.push(joined??);
    }

    pages.sort_by_key(|(index, _)| *index);
    Ok(pages.into_iter().map(|(_, page)| page).collect())
}
