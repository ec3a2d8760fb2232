use crate::lockdiff::differ::LockDiffer;
use crate::lockdiff::pipeline::PipelineError;
use crate::lockdiff::quartet::load_quartet;
use crate::model::LockDiffEntry;
use crate::traits::SnapshotSource;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument};

/// Diffs several lock files of one project (e.g. `composer.lock` plus
/// `composer.*.lock` variants) with bounded concurrency.
pub struct DiffExecutor {
    semaphore: Arc<Semaphore>,
    differ: Arc<LockDiffer>,
    load_timeout: Duration,
}

impl DiffExecutor {
    /// A `concurrency_limit` of 0 is treated as 1.
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            differ: Arc::new(LockDiffer::new()),
            load_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_differ(mut self, differ: LockDiffer) -> Self {
        self.differ = Arc::new(differ);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Returns `lock path -> entries`, ordered by lock path. Lock files whose
    /// diff is empty are left out.
    #[instrument(skip(self, source, lock_paths), fields(source_id = source.source_id(), locks = lock_paths.len()))]
    pub async fn diff_lock_files<S>(
        &self,
        source: Arc<S>,
        lock_paths: &[String],
    ) -> Result<BTreeMap<String, Vec<LockDiffEntry>>, PipelineError>
    where
        S: SnapshotSource + 'static,
    {
        let mut tasks = JoinSet::new();

        for lock_path in lock_paths {
            let semaphore = Arc::clone(&self.semaphore);
            let differ = Arc::clone(&self.differ);
            let source = Arc::clone(&source);
            let lock_path = lock_path.clone();
            let load_timeout = self.load_timeout;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    PipelineError::Join(format!("Semaphore error: {}", e))
                })?;

                info!("Starting lock diff for: {}", lock_path);
                let quartet = load_quartet(source.as_ref(), &lock_path, load_timeout).await?;
                let entries = quartet.diff(&differ);
                info!("Finished lock diff for: {} ({} entries)", lock_path, entries.len());

                Ok::<_, PipelineError>((lock_path, entries))
            });
        }

        let mut entries_list = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (lock_path, entries) =
                joined.map_err(|e| PipelineError::Join(e.to_string()))??;
            if !entries.is_empty() {
                entries_list.insert(lock_path, entries);
            }
        }

        Ok(entries_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::traits::Revision;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_document(
                Revision::After,
                "composer.lock",
                r#"{"packages": [{"name": "x/y", "version": "2.0.0"}]}"#,
            )
            .with_document(
                Revision::Before,
                "composer.dev.lock",
                r#"{"packages-dev": [{"name": "p/q", "version": "1.0.0"}]}"#,
            )
            .with_document(
                Revision::After,
                "composer.dev.lock",
                r#"{"packages-dev": [{"name": "p/q", "version": "1.0.0"}]}"#,
            )
    }

    #[tokio::test]
    async fn test_diff_lock_files() {
        let executor = DiffExecutor::new(2);
        let locks = vec!["composer.lock".to_string(), "composer.dev.lock".to_string()];

        let entries_list = executor
            .diff_lock_files(Arc::new(source()), &locks)
            .await
            .unwrap();

        let keys: Vec<&str> = entries_list.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["composer.dev.lock", "composer.lock"]);
        assert_eq!(entries_list["composer.lock"][0].name, "x/y");
    }

    #[tokio::test]
    async fn test_empty_diffs_are_omitted() {
        let executor = DiffExecutor::new(1).with_differ(LockDiffer::new().with_unchanged(false));
        let locks = vec![
            "composer.lock".to_string(),
            "composer.dev.lock".to_string(),
            "missing.lock".to_string(),
        ];

        let entries_list = executor
            .diff_lock_files(Arc::new(source()), &locks)
            .await
            .unwrap();

        assert_eq!(entries_list.len(), 1);
        assert!(entries_list.contains_key("composer.lock"));
    }

    #[tokio::test]
    async fn test_decode_failure_propagates() {
        let source = MemorySource::new().with_document(Revision::Before, "composer.lock", "{");
        let executor = DiffExecutor::new(1).with_timeout(Duration::from_secs(5));

        let err = executor
            .diff_lock_files(Arc::new(source), &["composer.lock".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[tokio::test]
    async fn test_zero_concurrency_limit_runs_one_at_a_time() {
        let executor = DiffExecutor::new(0);
        let locks = vec!["composer.lock".to_string(), "composer.dev.lock".to_string()];

        let entries_list = tokio::time::timeout(
            Duration::from_secs(2),
            executor.diff_lock_files(Arc::new(source()), &locks),
        )
        .await
        .expect("diff with a zero limit should not wait forever")
        .unwrap();

        assert_eq!(entries_list.len(), 2);
    }
}
