use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to parse '{path}': {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Document '{path}' is not a JSON object")]
    NotAnObject { path: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Which side of the diff a document is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// Last committed state (e.g. `HEAD`)
    Before,
    /// Working state about to be committed (e.g. the index)
    After,
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Short identifier used in logs (e.g., "directory", "memory").
    fn source_id(&self) -> &str;

    /// Reads the raw bytes of `path` at `revision`.
    ///
    /// Returns `Ok(None)` when the document does not exist on that revision.
    async fn read(&self, revision: Revision, path: &str) -> Result<Option<Vec<u8>>, SourceError>;
}
