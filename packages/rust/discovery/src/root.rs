//! Project root detection via the `.spoketome-root` marker file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Marker file that establishes a project boundary for discovery.
pub const ROOT_MARKER_FILENAME: &str = ".spoketome-root";

/// Find the closest directory at or above `start` containing the marker.
///
/// Falls back to `start` itself when no ancestor has one: a missing marker just
/// means there is no broader project boundary.
pub fn find_project_root(start: &Path, verbose: bool) -> PathBuf {
    match start
        .ancestors()
        .find(|dir| dir.join(ROOT_MARKER_FILENAME).is_file())
    {
        Some(root) => {
            if verbose {
                info!(root = %root.display(), "found {ROOT_MARKER_FILENAME}");
            } else {
                debug!(root = %root.display(), "found {ROOT_MARKER_FILENAME}");
            }
            root.to_path_buf()
        }
        None => {
            debug!(start = %start.display(), "no {ROOT_MARKER_FILENAME} found, using start directory");
            start.to_path_buf()
        }
    }
}
