//! `.spoketome` manifest format parser.
//!
//! One Notion URL per line:
//! - Blank lines and lines starting with `#` are ignored
//! - Lines that are not Notion page URLs are dropped (reported when verbose)
//! - In the `.spoketome.local` override, `!<url>` excludes a base entry

use std::collections::HashSet;

use spoketome_shared::{ManifestEntry, extract_page_id};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parsed representation of a `.spoketome.local` override file.
#[derive(Debug, Clone, Default)]
pub struct OverrideManifest {
    /// Raw URL strings to remove from the base manifest (exact string match).
    pub exclusions: HashSet<String>,
    /// Entries to add after the base entries, in file order.
    pub inclusions: Vec<ManifestEntry>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a base manifest into entries, in file order. Duplicates are kept.
pub(crate) fn parse_manifest(content: &str, source: &str, verbose: bool) -> Vec<ManifestEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !is_skippable(line))
        .filter_map(|line| parse_entry(line, source, verbose))
        .collect()
}

/// Parse an override manifest into exclusion directives and inclusion entries.
pub(crate) fn parse_override(content: &str, source: &str, verbose: bool) -> OverrideManifest {
    let mut parsed = OverrideManifest::default();

    for line in content.lines().map(str::trim) {
        if is_skippable(line) {
            continue;
        }

        if let Some(excluded) = line.strip_prefix('!') {
            let excluded = excluded.trim();
            if !excluded.is_empty() {
                parsed.exclusions.insert(excluded.to_string());
            }
            continue;
        }

        if let Some(entry) = parse_entry(line, source, verbose) {
            parsed.inclusions.push(entry);
        }
    }

    parsed
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

fn parse_entry(line: &str, source: &str, verbose: bool) -> Option<ManifestEntry> {
    match extract_page_id(line) {
        Some(page_id) => Some(ManifestEntry {
            notion_url: line.to_string(),
            page_id,
        }),
        None => {
            if verbose {
                warn!(source, line, "invalid Notion URL, skipping");
            } else {
                debug!(source, line, "invalid Notion URL, skipping");
            }
            None
        }
    }
}
