//! Lock diff module - diffing and reporting of composer lock files.
//!
//! - **Differ**: pure before/after comparison via [`LockDiffer`]
//! - **Reporting**: the [`Reporter`] trait and its [`formats`]
//! - **Quartets**: lock/manifest path pairing and loading
//! - **Pipeline**: async Load → Diff → Report via [`pipeline::LockDiffPipeline`]

pub mod differ;
pub mod formats;
pub mod pipeline;
pub mod quartet;
pub mod traits;

// Re-export commonly used types
pub use differ::{DifferOptions, LockDiffer, SectionPrecedence};
pub use formats::{ConsoleTableReporter, FormatReporter, MarkdownTableReporter, ReportFormat};
pub use traits::{ReportError, Reporter};

pub use pipeline::{
    report, report_all, DiffStats, LockDiffPipeline, LockDiffResult, PipelineError,
    ReportOutcome, ENTRIES_ASSET,
};
pub use quartet::{load_quartet, lock_files, manifest_path_for, tracked_paths, Quartet};
