//! Reporter implementations.
//!
//! - `markdown` - pipe table for commit messages and pull request bodies
//! - `console` - boxed, column-aligned table for terminals
//!
//! [`FormatReporter`] selects one of them at runtime from configuration while
//! keeping dispatch static.

pub mod console;
pub mod markdown;

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::lockdiff::traits::{ReportError, Reporter};
use crate::model::{Directness, LockDiffEntry, RequiredKind};

pub use console::ConsoleTableReporter;
pub use markdown::MarkdownTableReporter;

pub(crate) const HEADERS: [&str; 5] = ["Name", "Before", "After", "Required", "Direct"];

const REQUIRED_LABEL_WIDTH: usize = 4;
const DIRECT_LABEL_WIDTH: usize = 6;

/// Cell contents of one table row, in [`HEADERS`] order.
pub(crate) fn row_cells(entry: &LockDiffEntry) -> [String; 5] {
    [
        entry.name.clone(),
        entry.version_before.clone().unwrap_or_default(),
        entry.version_after.clone().unwrap_or_default(),
        pair(
            required_label(entry.required_before),
            required_label(entry.required_after),
            REQUIRED_LABEL_WIDTH,
        ),
        pair(
            direct_label(entry.direct_before),
            direct_label(entry.direct_after),
            DIRECT_LABEL_WIDTH,
        ),
    ]
}

fn required_label(kind: RequiredKind) -> &'static str {
    match kind {
        RequiredKind::None => "",
        other => other.as_str(),
    }
}

fn direct_label(directness: Option<Directness>) -> &'static str {
    directness.map(|d| d.as_str()).unwrap_or("")
}

fn pair(before: &str, after: &str, width: usize) -> String {
    format!("{before:<width$} : {after}").trim_end().to_string()
}

/// Report format names accepted in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    #[default]
    Console,
}

impl ReportFormat {
    pub fn reporter(self) -> FormatReporter {
        match self {
            Self::Markdown => FormatReporter::Markdown(MarkdownTableReporter::new()),
            Self::Console => FormatReporter::Console(ConsoleTableReporter::new()),
        }
    }
}

/// Closed set of built-in reporters.
#[derive(Debug, Clone)]
pub enum FormatReporter {
    Markdown(MarkdownTableReporter),
    Console(ConsoleTableReporter),
}

impl Reporter for FormatReporter {
    fn name(&self) -> &'static str {
        match self {
            Self::Markdown(r) => r.name(),
            Self::Console(r) => r.name(),
        }
    }

    fn render(&self, entries: &[LockDiffEntry], out: &mut dyn Write) -> Result<(), ReportError> {
        match self {
            Self::Markdown(r) => r.render(entries, out),
            Self::Console(r) => r.render(entries, out),
        }
    }
}
