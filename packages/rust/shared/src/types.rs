//! Core domain types for spoketome runs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::page_id::PageId;

/// Current schema version for the `context.yaml` run manifest.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Name of the output subdirectory created next to each manifest.
pub const OUTPUT_DIR_NAME: &str = "spoketome";

/// Name of the run manifest written into each output directory.
pub const CONTEXT_FILENAME: &str = "context.yaml";

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

/// A single document reference from a manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The raw URL exactly as written in the manifest (trimmed).
    pub notion_url: String,
    /// Canonical page id extracted from the URL.
    pub page_id: PageId,
}

/// The final set of pages to pull for one directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedManifest {
    /// Directory containing the manifest file(s).
    pub dir_path: PathBuf,
    /// Where pulled pages are written (`<dir_path>/spoketome`).
    pub output_dir: PathBuf,
    /// Manifest files that contributed entries (base first, then override).
    pub sources: Vec<PathBuf>,
    /// Ordered, deduplicated entries to fetch.
    pub entries: Vec<ManifestEntry>,
}

// ---------------------------------------------------------------------------
// Pulled pages
// ---------------------------------------------------------------------------

/// Uniform projection of a Notion property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl PropertyValue {
    /// `Some(s)` becomes a string value, `None` becomes [`PropertyValue::Null`].
    pub fn from_opt_string(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::String)
    }
}

/// A page fetched from Notion and rendered to Markdown, ready to be written.
#[derive(Debug, Clone)]
pub struct PulledPage {
    /// Page title (from the page's title property, `Untitled` when empty).
    pub title: String,
    /// Canonical page id.
    pub page_id: PageId,
    /// The manifest URL this page was pulled from.
    pub notion_url: String,
    /// Rendered Markdown document.
    pub markdown: String,
    /// `last_edited_time` exactly as reported by Notion.
    pub last_edited_time: String,
    /// Filesystem-safe file name derived from the title (with `.md`).
    pub sanitized_filename: String,
    /// Extracted page properties, title excluded.
    pub properties: BTreeMap<String, PropertyValue>,
}

// ---------------------------------------------------------------------------
// Run manifest (context.yaml)
// ---------------------------------------------------------------------------

/// One pulled page as recorded in `context.yaml`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub title: String,
    pub notion_url: String,
    pub notion_page_id: String,
    /// File name relative to the output directory.
    pub file_path: String,
    pub last_pulled_at: String,
    pub notion_last_edited_at: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// The `context.yaml` structure written to each output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextFile {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Tool name and version, e.g. `spoketome@0.1.0`.
    pub generated_by: String,
    /// When this run happened (RFC 3339, UTC).
    pub last_run_at: String,
    /// Pulled pages, in pull order.
    pub pages: Vec<ContextEntry>,
}
