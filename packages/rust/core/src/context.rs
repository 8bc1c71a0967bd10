//! `context.yaml` run manifest: construction and serialization.
//!
//! The YAML is written by hand with a fixed field order so the output is
//! stable across runs and easy to diff. Every string value is double-quoted.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::debug;

use spoketome_shared::{
    CONTEXT_FILENAME, CURRENT_SCHEMA_VERSION, ContextEntry, ContextFile, PropertyValue,
    PulledPage, Result, SpoketomeError,
};

static BARE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Build the run manifest for the pages written to one output directory.
///
/// `pages` pairs each pulled page with the file name it was written under.
/// `now` stamps both the run and every page's pull time.
pub fn build_context_file(
    pages: &[(PulledPage, String)],
    tool_version: &str,
    now: DateTime<Utc>,
) -> ContextFile {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    ContextFile {
        version: CURRENT_SCHEMA_VERSION,
        generated_by: format!("spoketome@{tool_version}"),
        last_run_at: stamp.clone(),
        pages: pages
            .iter()
            .map(|(page, file_path)| ContextEntry {
                title: page.title.clone(),
                notion_url: page.notion_url.clone(),
                notion_page_id: page.page_id.to_string(),
                file_path: file_path.clone(),
                last_pulled_at: stamp.clone(),
                notion_last_edited_at: page.last_edited_time.clone(),
                properties: page.properties.clone(),
            })
            .collect(),
    }
}

/// Render a run manifest as YAML. The result always ends with a newline.
pub fn serialize_context_file(ctx: &ContextFile) -> String {
    let mut lines = vec![
        format!("version: {}", ctx.version),
        format!("generatedBy: {}", quote(&ctx.generated_by)),
        format!("lastRunAt: {}", quote(&ctx.last_run_at)),
        "pages:".to_string(),
    ];

    for page in &ctx.pages {
        lines.push(format!("  - title: {}", quote(&page.title)));
        lines.push(format!("    notionUrl: {}", quote(&page.notion_url)));
        lines.push(format!("    notionPageId: {}", quote(&page.notion_page_id)));
        lines.push(format!("    filePath: {}", quote(&page.file_path)));
        lines.push(format!("    lastPulledAt: {}", quote(&page.last_pulled_at)));
        lines.push(format!(
            "    notionLastEditedAt: {}",
            quote(&page.notion_last_edited_at)
        ));

        if !page.properties.is_empty() {
            lines.push("    properties:".to_string());
            for (key, value) in &page.properties {
                lines.push(format!("      {}: {}", yaml_key(key), yaml_value(value)));
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write `context.yaml` into `output_dir`, replacing any previous file.
pub fn write_context_file(output_dir: &Path, ctx: &ContextFile) -> Result<()> {
    let path = output_dir.join(CONTEXT_FILENAME);
    let temp = output_dir.join(format!(".{CONTEXT_FILENAME}.tmp"));

    std::fs::write(&temp, serialize_context_file(ctx)).map_err(|e| SpoketomeError::io(&temp, e))?;
    std::fs::rename(&temp, &path).map_err(|e| SpoketomeError::io(&path, e))?;

    debug!(path = %path.display(), pages = ctx.pages.len(), "wrote run manifest");
    Ok(())
}

// ---------------------------------------------------------------------------
// YAML scalars
// ---------------------------------------------------------------------------

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn yaml_key(key: &str) -> String {
    if BARE_KEY_RE.is_match(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn yaml_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Number(n) => n.to_string(),
        PropertyValue::String(s) => quote(s),
        PropertyValue::List(items) => {
            let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
            format!("[{}]", quoted.join(", "))
        }
    }
}
