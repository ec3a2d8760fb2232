//! Built-in [`SnapshotSource`] implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use crate::traits::{Revision, SnapshotSource, SourceError};

/// Reads both revisions from two directories on disk, e.g. a checkout of the
/// previous commit and the working tree.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    before_root: PathBuf,
    after_root: PathBuf,
}

impl DirectorySource {
    pub fn new(before_root: impl Into<PathBuf>, after_root: impl Into<PathBuf>) -> Self {
        Self {
            before_root: before_root.into(),
            after_root: after_root.into(),
        }
    }

    fn root(&self, revision: Revision) -> &PathBuf {
        match revision {
            Revision::Before => &self.before_root,
            Revision::After => &self.after_root,
        }
    }
}

#[async_trait]
impl SnapshotSource for DirectorySource {
    fn source_id(&self) -> &str {
        "directory"
    }

    async fn read(&self, revision: Revision, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let full = self.root(revision).join(path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %full.display(), "Document not found");
                Ok(None)
            }
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}

/// In-memory documents keyed by revision and path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<(Revision, String), Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(
        mut self,
        revision: Revision,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(revision, path, content);
        self
    }

    pub fn insert(
        &mut self,
        revision: Revision,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) {
        self.documents
            .insert((revision, path.into()), content.into());
    }
}

#[async_trait]
impl SnapshotSource for MemorySource {
    fn source_id(&self) -> &str {
        "memory"
    }

    async fn read(&self, revision: Revision, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self.documents.get(&(revision, path.to_string())).cloned())
    }
}
