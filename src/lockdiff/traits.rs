//! Reporter abstraction and reporting errors.

use std::io::Write;
use thiserror::Error;

use crate::model::LockDiffEntry;

// ============================================================================
// Reporter Trait
// ============================================================================

/// Output sink for lock diff entries.
///
/// Implementations render one row per entry with the columns
/// `Name | Before | After | Required | Direct` and must produce well-formed
/// output for an empty slice.
///
/// # Thread Safety
///
/// Reporters hold no per-render state and are `Send + Sync`, so a single
/// instance can render several lock files in turn.
pub trait Reporter: Send + Sync {
    /// Returns the format identifier (e.g., "markdown", "console").
    fn name(&self) -> &'static str;

    /// Writes the formatted entries to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if writing to `out` fails.
    fn render(&self, entries: &[LockDiffEntry], out: &mut dyn Write) -> Result<(), ReportError>;
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the reporting step.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Entries are available but nothing is configured to render them
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Writing the report failed
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}
