//! Notion table → Markdown pipe table.

use spoketome_shared::{Block, BlockKind};

use crate::rich_text::render_rich_text;

/// Render a table block's rows as a pipe-delimited grid.
///
/// A `---` separator row always follows the first row, whether or not the
/// table has `has_column_header` set: without a header the first data row is
/// promoted to the header position, since Markdown tables cannot be headerless.
pub(crate) fn render_table(rows: &[Block]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .filter_map(|row| match &row.kind {
            BlockKind::TableRow(r) => Some(r.cells.iter().map(|c| render_rich_text(c)).collect()),
            _ => None,
        })
        .collect();

    let Some(first) = rows.first() else {
        return String::new();
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, cells) in rows.iter().enumerate() {
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(separator(first.len()));
        }
    }

    lines.join("\n")
}

fn separator(columns: usize) -> String {
    format!("| {} |", vec!["---"; columns].join(" | "))
}
