//! Lock/manifest quartets: path derivation and concurrent loading.
//!
//! A quartet is the before/after pair of a lock file plus the before/after
//! pair of its manifest (`x.lock` is always paired with `x.json`).

use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::lockdiff::differ::LockDiffer;
use crate::lockdiff::pipeline::PipelineError;
use crate::model::{decode_document, ComposerJson, ComposerLock, LockDiffEntry};
use crate::traits::{Revision, SnapshotSource};

/// Decoded documents for one lock file.
#[derive(Debug, Clone, Default)]
pub struct Quartet {
    pub left_lock: Option<ComposerLock>,
    pub right_lock: Option<ComposerLock>,
    pub left_json: Option<ComposerJson>,
    pub right_json: Option<ComposerJson>,
}

impl Quartet {
    pub fn diff(&self, differ: &LockDiffer) -> Vec<LockDiffEntry> {
        differ.diff(
            self.left_lock.as_ref(),
            self.right_lock.as_ref(),
            self.left_json.as_ref(),
            self.right_json.as_ref(),
        )
    }
}

/// `composer.dev.lock` -> `composer.dev.json`.
pub fn manifest_path_for(lock_path: &str) -> String {
    match lock_path.strip_suffix(".lock") {
        Some(stem) => format!("{stem}.json"),
        None => format!("{lock_path}.json"),
    }
}

/// Paths worth watching for composer changes.
///
/// `composer_env` is the value of the `COMPOSER` environment variable, if
/// the caller has one; it names an alternative manifest whose lock file is
/// tracked too. The result keeps first-seen order without duplicates.
pub fn tracked_paths(composer_env: Option<&str>) -> Vec<String> {
    let manifest = composer_env
        .filter(|value| !value.is_empty())
        .unwrap_or("./composer.json");
    let manifest = manifest.strip_prefix("./").unwrap_or(manifest);
    let lock = match manifest.strip_suffix(".json") {
        Some(stem) => format!("{stem}.lock"),
        None => manifest.to_string(),
    };

    let candidates = [
        "composer.json".to_string(),
        "composer.lock".to_string(),
        manifest.to_string(),
        lock,
        "composer.*.json".to_string(),
        "composer.*.lock".to_string(),
    ];

    let mut paths: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !paths.contains(&candidate) {
            paths.push(candidate);
        }
    }
    paths
}

/// Keeps the lock files out of a list of changed paths.
pub fn lock_files<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths
        .into_iter()
        .filter(|path| path.as_ref().ends_with(".lock"))
        .map(|path| path.as_ref().to_string())
        .collect()
}

fn revision_label(revision: Revision, path: &str) -> String {
    match revision {
        Revision::Before => format!("before:{path}"),
        Revision::After => format!("after:{path}"),
    }
}

async fn read_with_timeout<S>(
    source: &S,
    revision: Revision,
    path: &str,
    limit: Duration,
) -> Result<Option<Vec<u8>>, PipelineError>
where
    S: SnapshotSource + ?Sized,
{
    let bytes = timeout(limit, source.read(revision, path))
        .await
        .map_err(|_| PipelineError::LoadTimeout {
            path: revision_label(revision, path),
            timeout: limit,
        })??;
    Ok(bytes)
}

/// Reads and decodes the four documents of `lock_path`.
///
/// Each read is bounded by `limit`. Missing documents decode to `None`.
///
/// # Errors
///
/// Returns [`PipelineError`] if a read times out or fails, or if a document
/// is not a JSON object.
#[instrument(skip(source), fields(source_id = source.source_id()))]
pub async fn load_quartet<S>(
    source: &S,
    lock_path: &str,
    limit: Duration,
) -> Result<Quartet, PipelineError>
where
    S: SnapshotSource + ?Sized,
{
    let json_path = manifest_path_for(lock_path);

    let (left_lock, right_lock, left_json, right_json) = tokio::try_join!(
        read_with_timeout(source, Revision::Before, lock_path, limit),
        read_with_timeout(source, Revision::After, lock_path, limit),
        read_with_timeout(source, Revision::Before, &json_path, limit),
        read_with_timeout(source, Revision::After, &json_path, limit),
    )?;

    debug!(
        left_lock = left_lock.is_some(),
        right_lock = right_lock.is_some(),
        left_json = left_json.is_some(),
        right_json = right_json.is_some(),
        "Documents read"
    );

    Ok(Quartet {
        left_lock: decode_document(
            &revision_label(Revision::Before, lock_path),
            left_lock.as_deref(),
        )?,
        right_lock: decode_document(
            &revision_label(Revision::After, lock_path),
            right_lock.as_deref(),
        )?,
        left_json: decode_document(
            &revision_label(Revision::Before, &json_path),
            left_json.as_deref(),
        )?,
        right_json: decode_document(
            &revision_label(Revision::After, &json_path),
            right_json.as_deref(),
        )?,
    })
}
