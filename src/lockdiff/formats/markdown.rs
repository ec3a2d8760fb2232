use std::io::Write;

use super::{row_cells, HEADERS};
use crate::lockdiff::traits::{ReportError, Reporter};
use crate::model::LockDiffEntry;

/// Renders entries as a GitHub-flavoured markdown table.
///
/// An empty entry list yields the header and separator rows only.
#[derive(Debug, Clone, Default)]
pub struct MarkdownTableReporter;

impl MarkdownTableReporter {
    pub fn new() -> Self {
        Self
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

fn write_row<I, S>(out: &mut dyn Write, cells: I) -> std::io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line: Vec<String> = cells.into_iter().map(|c| escape(c.as_ref())).collect();
    writeln!(out, "| {} |", line.join(" | "))
}

impl Reporter for MarkdownTableReporter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, entries: &[LockDiffEntry], out: &mut dyn Write) -> Result<(), ReportError> {
        write_row(out, HEADERS)?;
        write_row(out, HEADERS.iter().map(|_| "---"))?;
        for entry in entries {
            write_row(out, row_cells(entry))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Directness, RequiredKind};

    fn render(entries: &[LockDiffEntry]) -> String {
        let mut buf = Vec::new();
        MarkdownTableReporter::new().render(entries, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_table_is_header_only() {
        assert_eq!(
            render(&[]),
            "| Name | Before | After | Required | Direct |\n| --- | --- | --- | --- | --- |\n"
        );
    }

    #[test]
    fn test_row() {
        let entry = LockDiffEntry {
            name: "a/b".to_string(),
            version_before: Some("1.2.3".to_string()),
            version_after: Some("1.2.3".to_string()),
            required_before: RequiredKind::Prod,
            required_after: RequiredKind::Prod,
            direct_before: Some(Directness::Child),
            direct_after: Some(Directness::Direct),
        };

        let output = render(&[entry]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "| a/b | 1.2.3 | 1.2.3 | prod : prod | child  : direct |");
    }

    #[test]
    fn test_pipes_are_escaped() {
        let entry = LockDiffEntry {
            name: "odd/name".to_string(),
            version_before: None,
            version_after: Some("dev-main | 1.x".to_string()),
            required_before: RequiredKind::None,
            required_after: RequiredKind::Dev,
            direct_before: None,
            direct_after: Some(Directness::Child),
        };

        let output = render(&[entry]);
        assert!(output.contains("dev-main \\| 1.x"));
    }
}
