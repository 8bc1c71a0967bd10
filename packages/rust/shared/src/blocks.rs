//! Notion block tree model.
//!
//! Notion encodes a block as `{"id", "type": "<kind>", "has_children", "<kind>": {payload}}`.
//! [`Block`] deserializes that shape into a [`BlockKind`] variant holding only the
//! payload for its type. Unknown types, and known types whose payload does not
//! match the expected shape, become [`BlockKind::Unsupported`] instead of failing
//! the whole response.

use serde::Deserialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

/// Style flags on a rich text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

/// A span of text with optional link and styling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    /// An unstyled, unlinked run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }
}

/// Concatenate the plain text of a run list, ignoring styling.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload for blocks that carry only text (paragraphs, headings, list items, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToDoBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub language: String,
}

/// Callout icon. Only emoji icons have a Markdown rendering.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Icon {
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalloutBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EquationBlock {
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileUrl {
    #[serde(default)]
    pub url: String,
}

/// Payload for image, file, video and pdf blocks.
///
/// The media is either hosted by Notion (`file`) or linked (`external`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaBlock {
    #[serde(default)]
    pub external: Option<FileUrl>,
    #[serde(default)]
    pub file: Option<FileUrl>,
    #[serde(default)]
    pub caption: Vec<RichText>,
    #[serde(default)]
    pub name: Option<String>,
}

impl MediaBlock {
    /// The external URL if present, else the Notion-hosted URL.
    pub fn url(&self) -> &str {
        self.external
            .as_ref()
            .or(self.file.as_ref())
            .map(|f| f.url.as_str())
            .unwrap_or_default()
    }
}

/// Payload for bookmark, link_preview and embed blocks.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinkBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TableBlock {
    #[serde(default)]
    pub table_width: usize,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TableRowBlock {
    #[serde(default)]
    pub cells: Vec<Vec<RichText>>,
}

/// Payload for child_page and child_database references.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChildBlock {
    #[serde(default)]
    pub title: String,
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// The type-specific part of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextBlock),
    Heading1(TextBlock),
    Heading2(TextBlock),
    Heading3(TextBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    ToDo(ToDoBlock),
    Toggle(TextBlock),
    Code(CodeBlock),
    Quote(TextBlock),
    Callout(CalloutBlock),
    Divider,
    Equation(EquationBlock),
    TableOfContents,
    Breadcrumb,
    Image(MediaBlock),
    File(MediaBlock),
    Video(MediaBlock),
    Pdf(MediaBlock),
    Bookmark(LinkBlock),
    LinkPreview(LinkBlock),
    Embed(LinkBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    ColumnList,
    Column,
    SyncedBlock,
    ChildPage(ChildBlock),
    ChildDatabase(ChildBlock),
    /// Any type this crate does not model, keyed by its Notion type name.
    Unsupported { kind: String },
}

impl BlockKind {
    /// Decode a payload for the given Notion type name.
    fn from_payload(kind: &str, payload: Value) -> Self {
        fn de<T: serde::de::DeserializeOwned>(payload: Value) -> Option<T> {
            // Unit-like kinds sometimes omit the payload object entirely.
            let payload = if payload.is_null() {
                Value::Object(Map::new())
            } else {
                payload
            };
            serde_json::from_value(payload).ok()
        }

        let decoded = match kind {
            "paragraph" => de(payload).map(Self::Paragraph),
            "heading_1" => de(payload).map(Self::Heading1),
            "heading_2" => de(payload).map(Self::Heading2),
            "heading_3" => de(payload).map(Self::Heading3),
            "bulleted_list_item" => de(payload).map(Self::BulletedListItem),
            "numbered_list_item" => de(payload).map(Self::NumberedListItem),
            "to_do" => de(payload).map(Self::ToDo),
            "toggle" => de(payload).map(Self::Toggle),
            "code" => de(payload).map(Self::Code),
            "quote" => de(payload).map(Self::Quote),
            "callout" => de(payload).map(Self::Callout),
            "divider" => Some(Self::Divider),
            "equation" => de(payload).map(Self::Equation),
            "table_of_contents" => Some(Self::TableOfContents),
            "breadcrumb" => Some(Self::Breadcrumb),
            "image" => de(payload).map(Self::Image),
            "file" => de(payload).map(Self::File),
            "video" => de(payload).map(Self::Video),
            "pdf" => de(payload).map(Self::Pdf),
            "bookmark" => de(payload).map(Self::Bookmark),
            "link_preview" => de(payload).map(Self::LinkPreview),
            "embed" => de(payload).map(Self::Embed),
            "table" => de(payload).map(Self::Table),
            "table_row" => de(payload).map(Self::TableRow),
            "column_list" => Some(Self::ColumnList),
            "column" => Some(Self::Column),
            "synced_block" => Some(Self::SyncedBlock),
            "child_page" => de(payload).map(Self::ChildPage),
            "child_database" => de(payload).map(Self::ChildDatabase),
            _ => None,
        };

        decoded.unwrap_or_else(|| Self::Unsupported {
            kind: kind.to_string(),
        })
    }

    /// Child pages and databases are document boundaries: their content is
    /// never fetched as part of the parent.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::ChildPage(_) | Self::ChildDatabase(_))
    }
}

/// One node of a page's content tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawBlock")]
pub struct Block {
    pub id: String,
    /// Whether Notion reports children for this block (drives hydration).
    pub has_children: bool,
    pub kind: BlockKind,
    /// Hydrated children, owned by this block. Always empty for boundaries.
    pub children: Vec<Block>,
}

impl Block {
    /// A childless block with an empty id, mostly for tests and fixtures.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: String::new(),
            has_children: false,
            kind,
            children: Vec::new(),
        }
    }

    /// Attach hydrated children.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// Whether the client should fetch this block's children.
    pub fn needs_children(&self) -> bool {
        self.has_children && !self.kind.is_boundary()
    }
}

/// Wire shape of a block before the payload is matched to its type.
#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<RawBlock> for Block {
    fn from(mut raw: RawBlock) -> Self {
        let payload = raw.rest.remove(&raw.kind).unwrap_or(Value::Null);
        Self {
            id: raw.id,
            has_children: raw.has_children,
            kind: BlockKind::from_payload(&raw.kind, payload),
            children: Vec::new(),
        }
    }
}
