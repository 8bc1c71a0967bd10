//! `.spoketome` manifest discovery and resolution.
//!
//! Walks a project tree looking for `.spoketome` manifests (and their
//! `.spoketome.local` overrides), parses them into Notion page references,
//! and merges each directory's pair into a [`ResolvedManifest`].

mod parser;
mod resolver;
mod root;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use spoketome_shared::{OUTPUT_DIR_NAME, ResolvedManifest, Result, SpoketomeError};
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

pub use parser::OverrideManifest;
pub use root::{ROOT_MARKER_FILENAME, find_project_root};

/// Shared manifest, usually committed.
pub const MANIFEST_FILENAME: &str = ".spoketome";

/// Local override manifest, usually git-ignored.
pub const LOCAL_MANIFEST_FILENAME: &str = ".spoketome.local";

/// Directory names never descended into (relative to the search root).
const SKIP_DIRS: &[&str] = &[".git", "node_modules", OUTPUT_DIR_NAME];

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Report skipped manifest lines and exclusion counts as warnings/info.
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// ManifestSet
// ---------------------------------------------------------------------------

/// The manifest files found in one directory. At least one path is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSet {
    pub dir: PathBuf,
    pub base: Option<PathBuf>,
    pub local: Option<PathBuf>,
}

impl ManifestSet {
    /// Read both files and merge them.
    ///
    /// Returns `Ok(None)` when the merge yields no entries.
    pub fn resolve(&self, opts: &DiscoveryOptions) -> Result<Option<ResolvedManifest>> {
        let base = self.base.as_deref().map(read_manifest).transpose()?;
        let local = self.local.as_deref().map(read_manifest).transpose()?;
        let label = self.dir.display().to_string();

        let Some(entries) =
            resolver::resolve_entries(base.as_deref(), local.as_deref(), &label, opts.verbose)
        else {
            return Ok(None);
        };

        if entries.is_empty() {
            debug!(dir = %label, "manifest resolved to zero entries, skipping");
            return Ok(None);
        }

        Ok(Some(ResolvedManifest {
            dir_path: self.dir.clone(),
            output_dir: self.dir.join(OUTPUT_DIR_NAME),
            sources: self.base.iter().chain(self.local.iter()).cloned().collect(),
            entries,
        }))
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Discover and resolve every manifest under `root`.
///
/// `root` should already be the project root (see [`find_project_root`]).
/// Directories are returned sorted by path; directories whose manifests
/// resolve to nothing or cannot be read are omitted.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover(root: &Path, opts: &DiscoveryOptions) -> Result<Vec<ResolvedManifest>> {
    let sets = find_manifest_sets(root);

    let mut resolved = Vec::new();
    for set in sets {
        match set.resolve(opts) {
            Ok(Some(manifest)) => resolved.push(manifest),
            Ok(None) => {}
            Err(e) => {
                warn!(dir = %set.dir.display(), error = %e, "cannot read manifest, skipping directory");
            }
        }
    }

    info!(
        directories = resolved.len(),
        entries = resolved.iter().map(|m| m.entries.len()).sum::<usize>(),
        "manifest discovery complete"
    );

    Ok(resolved)
}

/// Walk `root` and group manifest files by their containing directory.
pub fn find_manifest_sets(root: &Path) -> Vec<ManifestSet> {
    let mut sets: BTreeMap<PathBuf, ManifestSet> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_skipped(root, entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "cannot read directory entry, skipping");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name();
        let is_base = name == MANIFEST_FILENAME;
        let is_local = name == LOCAL_MANIFEST_FILENAME;
        if !is_base && !is_local {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };

        let set = sets.entry(dir.to_path_buf()).or_insert_with(|| ManifestSet {
            dir: dir.to_path_buf(),
            ..ManifestSet::default()
        });

        let path = entry.path().to_path_buf();
        debug!(path = %path.display(), "found manifest");
        if is_base {
            set.base = Some(path);
        } else {
            set.local = Some(path);
        }
    }

    sets.into_values().collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether `entry` lies under a skipped directory, judged on the path relative
/// to `root` so the root itself is never skipped.
fn is_skipped(root: &Path, entry: &DirEntry) -> bool {
    let Ok(rel) = entry.path().strip_prefix(root) else {
        return false;
    };

    rel.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|segment| SKIP_DIRS.contains(&segment))
    })
}

/// Read a manifest, replacing invalid UTF-8 so a bad line is skipped by the
/// parser instead of failing the whole file.
fn read_manifest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| SpoketomeError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
