//! Merge a base manifest with its local override.
//!
//! Precedence: base entries first (minus exclusions), then override entries
//! whose page id is not already present. Exclusions match the raw URL string,
//! not the page id, so the same page referenced through two differently
//! formatted URLs is not excluded by the other spelling.

use std::collections::HashSet;

use spoketome_shared::{ManifestEntry, PageId};
use tracing::info;

use crate::parser::{parse_manifest, parse_override};

/// Resolve the entries for one directory.
///
/// Returns `None` when neither manifest is present. `base` and `local` are the
/// file contents; `dir` labels diagnostics.
pub(crate) fn resolve_entries(
    base: Option<&str>,
    local: Option<&str>,
    dir: &str,
    verbose: bool,
) -> Option<Vec<ManifestEntry>> {
    match (base, local) {
        (None, None) => None,
        (Some(base), None) => Some(parse_manifest(base, dir, verbose)),
        (None, Some(local)) => Some(parse_override(local, dir, verbose).inclusions),
        (Some(base), Some(local)) => Some(merge(base, local, dir, verbose)),
    }
}

fn merge(base: &str, local: &str, dir: &str, verbose: bool) -> Vec<ManifestEntry> {
    let base_entries = parse_manifest(base, dir, verbose);
    let overrides = parse_override(local, dir, verbose);

    let before = base_entries.len();
    let mut merged: Vec<ManifestEntry> = base_entries
        .into_iter()
        .filter(|e| !overrides.exclusions.contains(&e.notion_url))
        .collect();

    let excluded = before - merged.len();
    if verbose && excluded > 0 {
        info!(dir, excluded, "excluded entries via local override");
    }

    let mut seen: HashSet<PageId> = merged.iter().map(|e| e.page_id).collect();
    for entry in overrides.inclusions {
        if seen.insert(entry.page_id) {
            merged.push(entry);
        }
    }

    merged
}
