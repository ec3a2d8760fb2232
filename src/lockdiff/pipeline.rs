//! Lock diff pipeline executor.
//!
//! This module provides the [`LockDiffPipeline`] coordinator that runs the
//! stages for one lock file (Load → Diff → Report) with:
//! - Async, timeout-bounded document loading via `tokio`
//! - Structured logging via `tracing`
//! - Explicit hand-over of entries from the diff stage to the report stage

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::lockdiff::differ::LockDiffer;
use crate::lockdiff::quartet::load_quartet;
use crate::lockdiff::traits::{ReportError, Reporter};
use crate::model::{ChangeKind, LockDiffEntry};
use crate::traits::{DecodeError, SnapshotSource, SourceError};

/// Asset key under which the diff entries are published.
pub const ENTRIES_ASSET: &str = "composer_lock_differ.entries";

// ============================================================================
// Pipeline Types
// ============================================================================

/// What the report stage did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The reporter wrote a table with this many rows
    Rendered { rows: usize },

    /// Neither a reporter nor entries were available
    Skipped,
}

/// Complete pipeline result.
#[derive(Debug)]
pub struct LockDiffResult {
    /// 0 on success
    pub exit_code: i32,

    /// Human-readable status line
    pub message: String,

    /// The computed diff
    pub entries: Vec<LockDiffEntry>,

    /// Named outputs for downstream consumers, keys carry the configured
    /// asset name prefix.
    pub assets: BTreeMap<String, Value>,

    pub report: ReportOutcome,

    pub stats: DiffStats,
}

/// Statistics about one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub reclassified: usize,
    pub unchanged: usize,

    /// Time spent reading and decoding documents (milliseconds)
    pub load_duration_ms: u64,

    /// Time spent diffing (milliseconds)
    pub diff_duration_ms: u64,
}

impl DiffStats {
    pub fn count(&mut self, entries: &[LockDiffEntry]) {
        for entry in entries {
            match entry.change() {
                ChangeKind::Added => self.added += 1,
                ChangeKind::Removed => self.removed += 1,
                ChangeKind::Updated => self.updated += 1,
                ChangeKind::Reclassified => self.reclassified += 1,
                ChangeKind::Unchanged => self.unchanged += 1,
            }
        }
    }

    pub fn changed(&self) -> usize {
        self.added + self.removed + self.updated + self.reclassified
    }
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors that can occur during pipeline execution.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Reading a document exceeded the load timeout
    #[error("Loading '{path}' timed out after {timeout:?}")]
    LoadTimeout { path: String, timeout: Duration },

    /// The snapshot source failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A document could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The report stage failed
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// The entries could not be published as an asset
    #[error("Failed to serialize entries: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A spawned diff task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}

// ============================================================================
// Report Stage
// ============================================================================

/// Hands entries to a reporter.
///
/// - no reporter and no entries: logs a warning and skips
/// - no reporter but entries: [`ReportError::Configuration`]
/// - a reporter: renders, treating missing entries as an empty list
///
/// An empty entry list counts as "no entries".
pub fn report<R>(
    reporter: Option<&R>,
    entries: Option<&[LockDiffEntry]>,
    out: &mut dyn Write,
) -> Result<ReportOutcome, ReportError>
where
    R: Reporter + ?Sized,
{
    let entries = entries.unwrap_or_default();

    match reporter {
        None if entries.is_empty() => {
            warn!("Both the reporter and the entries are missing");
            Ok(ReportOutcome::Skipped)
        }
        None => Err(ReportError::Configuration(format!(
            "{} entries but no reporter configured",
            entries.len()
        ))),
        Some(reporter) => {
            reporter.render(entries, out)?;
            info!(
                reporter = reporter.name(),
                rows = entries.len(),
                "Report rendered"
            );
            Ok(ReportOutcome::Rendered {
                rows: entries.len(),
            })
        }
    }
}

/// Reports several lock files, each under a `Changes in <lock path>` heading.
pub fn report_all<R>(
    reporter: &R,
    entries_list: &BTreeMap<String, Vec<LockDiffEntry>>,
    out: &mut dyn Write,
) -> Result<usize, ReportError>
where
    R: Reporter + ?Sized,
{
    for (lock_path, entries) in entries_list {
        writeln!(out, "\nChanges in {lock_path}")?;
        report(Some(reporter), Some(entries.as_slice()), out)?;
    }
    Ok(entries_list.len())
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Load → Diff → Report for a single lock file.
///
/// # Example
///
/// ```ignore
/// use composer_lock_diff::{DirectorySource, LockDiffPipeline, MarkdownTableReporter};
///
/// let pipeline = LockDiffPipeline::new(DirectorySource::new("old", "."), "composer.lock")
///     .with_reporter(MarkdownTableReporter::new())
///     .with_timeout(Duration::from_secs(10));
///
/// let result = pipeline.execute(&mut std::io::stdout()).await?;
/// println!("{} packages changed", result.stats.changed());
/// ```
pub struct LockDiffPipeline<S, R>
where
    S: SnapshotSource,
    R: Reporter,
{
    source: S,

    reporter: Option<R>,

    differ: LockDiffer,

    lock_path: String,

    /// Timeout for each document read (default: 30 seconds)
    load_timeout: Duration,

    asset_name_prefix: String,
}

impl<S, R> LockDiffPipeline<S, R>
where
    S: SnapshotSource,
    R: Reporter,
{
    /// Creates a pipeline without a reporter and with a default differ.
    pub fn new(source: S, lock_path: impl Into<String>) -> Self {
        Self {
            source,
            reporter: None,
            differ: LockDiffer::new(),
            lock_path: lock_path.into(),
            load_timeout: Duration::from_secs(30),
            asset_name_prefix: String::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: R) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_differ(mut self, differ: LockDiffer) -> Self {
        self.differ = differ;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Prefix prepended to every asset key of the result.
    pub fn with_asset_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.asset_name_prefix = prefix.into();
        self
    }

    /// Runs all stages and writes the report to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if loading or decoding fails, if the entries
    /// cannot be serialized, or if the report stage rejects its configuration.
    #[instrument(skip(self, out), fields(lock_path = %self.lock_path))]
    pub async fn execute(
        &self,
        out: &mut (dyn Write + Send),
    ) -> Result<LockDiffResult, PipelineError> {
        let mut stats = DiffStats::default();

        // ====================================================================
        // Stage 1: Load
        // ====================================================================

        info!("Starting load stage");
        let load_start = Instant::now();
        let quartet = load_quartet(&self.source, &self.lock_path, self.load_timeout).await?;
        stats.load_duration_ms = load_start.elapsed().as_millis() as u64;

        // ====================================================================
        // Stage 2: Diff
        // ====================================================================

        let diff_start = Instant::now();
        let entries = quartet.diff(&self.differ);
        stats.diff_duration_ms = diff_start.elapsed().as_millis() as u64;
        stats.count(&entries);

        info!(
            entries = entries.len(),
            changed = stats.changed(),
            duration_ms = stats.diff_duration_ms,
            "Diff completed"
        );

        // ====================================================================
        // Stage 3: Report
        // ====================================================================

        let mut assets = BTreeMap::new();
        assets.insert(
            format!("{}{}", self.asset_name_prefix, ENTRIES_ASSET),
            serde_json::to_value(&entries)?,
        );

        let outcome = report(self.reporter.as_ref(), Some(entries.as_slice()), out)?;

        Ok(LockDiffResult {
            exit_code: 0,
            message: format!("{} packages compared, {} changed", entries.len(), stats.changed()),
            entries,
            assets,
            report: outcome,
            stats,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockdiff::formats::{ConsoleTableReporter, MarkdownTableReporter};
    use crate::model::{Directness, RequiredKind};
    use crate::source::MemorySource;
    use crate::traits::Revision;

    fn entry(name: &str) -> LockDiffEntry {
        LockDiffEntry {
            name: name.to_string(),
            version_before: None,
            version_after: Some("2.0.0".to_string()),
            required_before: RequiredKind::None,
            required_after: RequiredKind::Prod,
            direct_before: None,
            direct_after: Some(Directness::Child),
        }
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_document(
                Revision::Before,
                "composer.lock",
                r#"{"packages": [{"name": "a/b", "version": "1.2.3"}]}"#,
            )
            .with_document(
                Revision::After,
                "composer.lock",
                r#"{"packages": [{"name": "a/b", "version": "1.2.3"}, {"name": "x/y", "version": "2.0.0"}]}"#,
            )
            .with_document(Revision::Before, "composer.json", r#"{"require": []}"#)
            .with_document(Revision::After, "composer.json", r#"{"require": {"a/b": "^1.0"}}"#)
    }

    #[test]
    fn test_report_skips_when_everything_is_missing() {
        let mut out = Vec::new();
        let outcome = report::<MarkdownTableReporter>(None, None, &mut out).unwrap();
        assert_eq!(outcome, ReportOutcome::Skipped);
        assert!(out.is_empty());

        let outcome = report::<MarkdownTableReporter>(None, Some(&[][..]), &mut out).unwrap();
        assert_eq!(outcome, ReportOutcome::Skipped);
    }

    #[test]
    fn test_report_requires_reporter_for_entries() {
        let mut out = Vec::new();
        let entries = vec![entry("x/y")];
        let err = report::<MarkdownTableReporter>(None, Some(entries.as_slice()), &mut out).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn test_report_renders_empty_table_without_entries() {
        let mut out = Vec::new();
        let reporter = MarkdownTableReporter::new();
        let outcome = report(Some(&reporter), None, &mut out).unwrap();
        assert_eq!(outcome, ReportOutcome::Rendered { rows: 0 });
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_report_all_headings() {
        let mut entries_list = BTreeMap::new();
        entries_list.insert("composer.lock".to_string(), vec![entry("x/y")]);
        entries_list.insert("composer.dev.lock".to_string(), vec![entry("p/q")]);

        let mut out = Vec::new();
        let count = report_all(&MarkdownTableReporter::new(), &entries_list, &mut out).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let dev = text.find("\nChanges in composer.dev.lock\n").unwrap();
        let main = text.find("\nChanges in composer.lock\n").unwrap();
        assert!(dev < main);
        assert!(text.contains("| p/q |"));
    }

    #[tokio::test]
    async fn test_pipeline_execution() {
        let pipeline =
            LockDiffPipeline::new(source(), "composer.lock").with_reporter(MarkdownTableReporter::new());

        let mut out = Vec::new();
        let result = pipeline.execute(&mut out).await.unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.report, ReportOutcome::Rendered { rows: 2 });
        assert_eq!(result.stats.added, 1);
        assert_eq!(result.stats.reclassified, 1);
        assert_eq!(result.stats.changed(), 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("| a/b | 1.2.3 | 1.2.3 | prod : prod | child  : direct |"));
        assert!(text.contains("| x/y |  | 2.0.0 |      : prod |        : child |"));
    }

    #[tokio::test]
    async fn test_pipeline_assets_are_prefixed() {
        let pipeline = LockDiffPipeline::new(source(), "composer.lock")
            .with_reporter(ConsoleTableReporter::new())
            .with_asset_name_prefix("app.cld.");

        let mut out = Vec::new();
        let result = pipeline.execute(&mut out).await.unwrap();

        let asset = &result.assets["app.cld.composer_lock_differ.entries"];
        assert_eq!(asset[0]["name"], "a/b");
        assert_eq!(asset[0]["directAfter"], "direct");
        assert_eq!(asset[1]["versionBefore"], Value::Null);
    }

    #[tokio::test]
    async fn test_pipeline_without_reporter_fails_on_entries() {
        let pipeline: LockDiffPipeline<_, MarkdownTableReporter> =
            LockDiffPipeline::new(source(), "composer.lock");

        let mut out = Vec::new();
        let err = pipeline.execute(&mut out).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Report(ReportError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_pipeline_without_reporter_or_documents_is_skipped() {
        let pipeline: LockDiffPipeline<_, MarkdownTableReporter> =
            LockDiffPipeline::new(MemorySource::new(), "composer.lock");

        let mut out = Vec::new();
        let result = pipeline.execute(&mut out).await.unwrap();
        assert!(result.entries.is_empty());
        assert_eq!(result.report, ReportOutcome::Skipped);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_filters_unchanged() {
        let pipeline = LockDiffPipeline::new(source(), "composer.lock")
            .with_reporter(MarkdownTableReporter::new())
            .with_differ(LockDiffer::new().with_unchanged(false))
            .with_timeout(Duration::from_secs(5));

        let mut out = Vec::new();
        let result = pipeline.execute(&mut out).await.unwrap();
        assert_eq!(result.stats.unchanged, 0);
        assert_eq!(result.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_asset_matches_entries() {
        let pipeline = LockDiffPipeline::new(source(), "composer.lock")
            .with_reporter(MarkdownTableReporter::new());

        let mut out = Vec::new();
        let result = pipeline.execute(&mut out).await.unwrap();

        let asset = &result.assets[ENTRIES_ASSET];
        assert!(!asset.is_null());
        assert_eq!(*asset, serde_json::to_value(&result.entries).unwrap());
    }

    #[test]
    fn test_serialize_error_is_reported() {
        let cause = serde_json::from_str::<Value>("{").unwrap_err();
        let err = PipelineError::from(cause);
        assert!(matches!(err, PipelineError::Serialize(_)));
        assert!(err.to_string().starts_with("Failed to serialize entries"));
    }

    #[tokio::test]
    async fn test_pipeline_runs_on_spawned_task() {
        let pipeline = LockDiffPipeline::new(source(), "composer.lock")
            .with_reporter(ConsoleTableReporter::new());

        let handle = tokio::spawn(async move {
            let mut out = Vec::new();
            let result = pipeline.execute(&mut out).await?;
            Ok::<_, PipelineError>((result, out))
        });

        let (result, out) = handle.await.unwrap().unwrap();
        assert_eq!(result.report, ReportOutcome::Rendered { rows: 2 });
        assert!(String::from_utf8(out).unwrap().contains("| x/y "));
    }
}
