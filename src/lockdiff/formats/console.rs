use std::io::Write;
use unicode_width::UnicodeWidthStr;

use super::{row_cells, HEADERS};
use crate::lockdiff::traits::{ReportError, Reporter};
use crate::model::LockDiffEntry;

/// Renders entries as a boxed table with auto-sized columns:
///
/// ```text
/// +------+--------+-------+-------------+-----------------+
/// | Name | Before | After | Required    | Direct          |
/// +------+--------+-------+-------------+-----------------+
/// | a/b  | 1.2.3  | 1.2.3 | prod : prod | child  : direct |
/// +------+--------+-------+-------------+-----------------+
/// ```
///
/// With no entries the header is closed by the bottom border directly.
#[derive(Debug, Clone, Default)]
pub struct ConsoleTableReporter;

impl ConsoleTableReporter {
    pub fn new() -> Self {
        Self
    }
}

fn border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}

fn row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let cell = cell.as_ref();
        let pad = width.saturating_sub(cell.width());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

impl Reporter for ConsoleTableReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    fn render(&self, entries: &[LockDiffEntry], out: &mut dyn Write) -> Result<(), ReportError> {
        let rows: Vec<[String; 5]> = entries.iter().map(row_cells).collect();

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.width()).collect();
        for cells in &rows {
            for (width, cell) in widths.iter_mut().zip(cells.iter()) {
                *width = (*width).max(cell.width());
            }
        }

        let separator = border(&widths);
        writeln!(out, "{separator}")?;
        writeln!(out, "{}", row(&HEADERS, &widths))?;
        if !rows.is_empty() {
            writeln!(out, "{separator}")?;
            for cells in &rows {
                writeln!(out, "{}", row(cells, &widths))?;
            }
        }
        writeln!(out, "{separator}")?;
        Ok(())
    }
}
