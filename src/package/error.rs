use thiserror::Error;

/// Why a package could not be loaded.
///
/// Every variant aborts the whole load; no partial package is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source is unreadable or not a zip archive.
    #[error("cannot open package: {0:#}")]
    Open(anyhow::Error),

    /// A matched entry could not be read, inflated or checked.
    #[error("cannot read {entry}: {error:#}")]
    Extract { entry: String, error: anyhow::Error },

    /// A matched entry is not valid JSON, or a field does not have the
    /// expected shape or grammar. `path` locates the field, e.g.
    /// `layers[0].style.fills[1].gradient.from`.
    #[error("cannot decode {entry} at {path}: {source}")]
    Decode {
        entry: String,
        path: String,
        source: serde_json::Error,
    },

    /// A page decoding task panicked or was cancelled.
    #[error("page decoding task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LoadError {
    /// Name of the package entry that failed, when one is involved.
    pub fn entry(&self) -> Option<&str> {
        match self {
            LoadError::Extract { entry, .. } | LoadError::Decode { entry, .. } => Some(entry),
            LoadError::Open(_) | LoadError::Task(_) => None,
        }
    }
}
