//! Notion block tree → Markdown conversion.
//!
//! Rendering is a pure function of the block tree: it performs no I/O and never
//! fails. Block types without a Markdown form degrade to a visible HTML comment
//! placeholder.

mod rich_text;
mod table;

use spoketome_shared::blocks::{LinkBlock, MediaBlock};
use spoketome_shared::{Block, BlockKind};

pub use rich_text::render_rich_text;

/// Indentation added per nesting level for list items.
const INDENT: &str = "  ";

/// Language tag Notion uses for code blocks without highlighting.
const PLAIN_TEXT_LANGUAGE: &str = "plain text";

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert a page's hydrated top-level blocks to a Markdown document.
///
/// The document starts with the title as an H1. Each block is followed by a
/// blank line; blocks that render to nothing (breadcrumbs, stray table rows,
/// empty tables) are skipped entirely.
pub fn blocks_to_markdown(blocks: &[Block], title: &str) -> String {
    let mut lines: Vec<String> = vec![format!("# {title}"), String::new()];

    for block in blocks {
        let md = convert_block(block, 0);
        if !md.is_empty() {
            lines.push(md);
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Render one block (and its children) at the given nesting depth.
pub fn convert_block(block: &Block, depth: usize) -> String {
    let prefix = INDENT.repeat(depth);

    match &block.kind {
        BlockKind::Paragraph(b) => format!("{prefix}{}", render_rich_text(&b.rich_text)),

        BlockKind::Heading1(b) => format!("# {}", render_rich_text(&b.rich_text)),
        BlockKind::Heading2(b) => format!("## {}", render_rich_text(&b.rich_text)),
        BlockKind::Heading3(b) => format!("### {}", render_rich_text(&b.rich_text)),

        BlockKind::BulletedListItem(b) => list_item(
            block,
            format!("{prefix}- {}", render_rich_text(&b.rich_text)),
            depth,
        ),
        BlockKind::NumberedListItem(b) => list_item(
            block,
            format!("{prefix}1. {}", render_rich_text(&b.rich_text)),
            depth,
        ),
        BlockKind::ToDo(b) => {
            let checkbox = if b.checked { "[x]" } else { "[ ]" };
            list_item(
                block,
                format!("{prefix}- {checkbox} {}", render_rich_text(&b.rich_text)),
                depth,
            )
        }

        BlockKind::Toggle(b) => {
            let summary = render_rich_text(&b.rich_text);
            let children = join_children(block, depth, "\n\n");
            format!(
                "{prefix}<details><summary>{summary}</summary>\n\n{children}\n\n{prefix}</details>"
            )
        }

        BlockKind::Code(b) => {
            let lang = if b.language == PLAIN_TEXT_LANGUAGE {
                ""
            } else {
                b.language.as_str()
            };
            let code = render_rich_text(&b.rich_text);
            format!("{prefix}```{lang}\n{code}\n```")
        }

        BlockKind::Quote(b) => render_rich_text(&b.rich_text)
            .split('\n')
            .map(|line| format!("{prefix}> {line}"))
            .collect::<Vec<_>>()
            .join("\n"),

        BlockKind::Callout(b) => {
            let text = render_rich_text(&b.rich_text);
            match b.icon.as_ref().and_then(|i| i.emoji.as_deref()) {
                Some(emoji) => format!("{prefix}> {emoji} {text}"),
                None => format!("{prefix}> {text}"),
            }
        }

        BlockKind::Divider => format!("{prefix}---"),
        BlockKind::Equation(b) => format!("{prefix}$${}$$", b.expression),
        BlockKind::TableOfContents => format!("{prefix}*(Table of contents)*"),
        BlockKind::Breadcrumb => String::new(),

        BlockKind::Image(m) => format!("{prefix}![{}]({})", caption_or(m, ""), m.url()),
        BlockKind::File(m) => {
            let fallback = m.name.as_deref().unwrap_or("File");
            format!("{prefix}[{}]({})", caption_or(m, fallback), m.url())
        }
        BlockKind::Video(m) => format!("{prefix}[{}]({})", caption_or(m, "Video"), m.url()),
        BlockKind::Pdf(m) => format!("{prefix}[{}]({})", caption_or(m, "PDF"), m.url()),

        BlockKind::Bookmark(l) | BlockKind::LinkPreview(l) | BlockKind::Embed(l) => {
            format!("{prefix}[{}]({})", link_label(l), l.url)
        }

        BlockKind::Table(_) => table::render_table(&block.children),
        // Rows only render through their parent table.
        BlockKind::TableRow(_) => String::new(),

        BlockKind::ColumnList | BlockKind::Column | BlockKind::SyncedBlock => {
            join_children(block, depth, "\n\n")
        }

        BlockKind::ChildPage(c) => format!("{prefix}[{}] (child page)", c.title),
        BlockKind::ChildDatabase(c) => format!("{prefix}[{}] (child database)", c.title),

        BlockKind::Unsupported { kind } => format!("{prefix}<!-- unsupported block: {kind} -->"),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append a list item's children, one level deeper, on the following lines.
fn list_item(block: &Block, line: String, depth: usize) -> String {
    let children = join_children(block, depth + 1, "\n");
    if children.is_empty() {
        line
    } else {
        format!("{line}\n{children}")
    }
}

fn join_children(block: &Block, depth: usize, separator: &str) -> String {
    block
        .children
        .iter()
        .map(|child| convert_block(child, depth))
        .collect::<Vec<_>>()
        .join(separator)
}

fn caption_or(media: &MediaBlock, fallback: &str) -> String {
    if media.caption.is_empty() {
        fallback.to_string()
    } else {
        render_rich_text(&media.caption)
    }
}

fn link_label(link: &LinkBlock) -> String {
    if link.caption.is_empty() {
        link.url.clone()
    } else {
        render_rich_text(&link.caption)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
