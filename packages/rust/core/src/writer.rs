//! Output directory and Markdown file writing.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use spoketome_shared::{Result, SpoketomeError};

/// Longest file stem kept from a title, before the `.md` extension.
const MAX_FILENAME_LENGTH: usize = 100;

/// Stem used when a title sanitizes to nothing.
const FALLBACK_STEM: &str = "untitled";

/// Derive a filesystem-safe `.md` file name from a page title.
///
/// Lowercases, drops everything but ASCII letters, digits, whitespace and
/// `-`, turns whitespace runs into `-`, collapses repeated `-`, trims `-`
/// from both ends and keeps at most 100 characters.
pub fn sanitize_filename(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut dashed = String::with_capacity(kept.len());
    for c in kept.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && dashed.ends_with('-') {
            continue;
        }
        dashed.push(c);
    }

    // Only ASCII remains, so byte truncation is safe.
    let mut stem = dashed.trim_matches('-').to_string();
    stem.truncate(MAX_FILENAME_LENGTH);

    if stem.is_empty() {
        stem.push_str(FALLBACK_STEM);
    }
    format!("{stem}.md")
}

/// Create `output_dir` if needed and remove temp files left by an interrupted run.
///
/// Previously written pages are left in place and overwritten as pages are
/// pulled again.
pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir).map_err(|e| SpoketomeError::io(output_dir, e))?;

    let entries = std::fs::read_dir(output_dir).map_err(|e| SpoketomeError::io(output_dir, e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_temp = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.') && n.ends_with(".tmp"));
        if is_temp && path.is_file() {
            std::fs::remove_file(&path).map_err(|e| SpoketomeError::io(&path, e))?;
            debug!(path = %path.display(), "removed stale temp file");
        }
    }

    Ok(())
}

/// Write `content` under `output_dir`, avoiding names already used this run.
///
/// `filename` gets a `-1`, `-2`, ... suffix before `.md` until it is not in
/// `used`. The file is written to a temp file first, then renamed into
/// place. Only once the rename succeeds is the name added to `used` and
/// returned.
pub fn write_markdown_file(
    output_dir: &Path,
    filename: &str,
    content: &str,
    used: &mut HashSet<String>,
) -> Result<String> {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let mut candidate = filename.to_string();
    let mut suffix = 1;
    while used.contains(&candidate) {
        candidate = format!("{stem}-{suffix}.md");
        suffix += 1;
    }
    let target = output_dir.join(&candidate);
    let temp = output_dir.join(format!(".{candidate}.tmp"));

    std::fs::write(&temp, content).map_err(|e| SpoketomeError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| SpoketomeError::io(&target, e))?;

    debug!(file = %candidate, size = content.len(), "wrote page");
    used.insert(candidate.clone());
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_basic_titles() {
        assert_eq!(sanitize_filename("API Design Guide"), "api-design-guide.md");
        assert_eq!(sanitize_filename("Q3: Plans & Goals!"), "q3-plans-goals.md");
        assert_eq!(sanitize_filename("  spaced   out  "), "spaced-out.md");
        assert_eq!(sanitize_filename("a -- b"), "a-b.md");
    }

    #[test]
    fn sanitize_falls_back_to_untitled() {
        assert_eq!(sanitize_filename(""), "untitled.md");
        assert_eq!(sanitize_filename("!!!"), "untitled.md");
        assert_eq!(sanitize_filename("日本語"), "untitled.md");
        assert_eq!(sanitize_filename("---"), "untitled.md");
    }

    #[test]
    fn sanitize_truncates_long_titles() {
        let title = "word ".repeat(40);
        let name = sanitize_filename(&title);
        assert_eq!(name.len(), MAX_FILENAME_LENGTH + ".md".len());
        assert!(name.starts_with("word-word-"));
    }

    #[test]
    fn sanitize_drops_accented_letters() {
        assert_eq!(sanitize_filename("Café Menu"), "caf-menu.md");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut used = HashSet::new();

        let first = write_markdown_file(tmp.path(), "notes.md", "one", &mut used).unwrap();
        let second = write_markdown_file(tmp.path(), "notes.md", "two", &mut used).unwrap();
        let third = write_markdown_file(tmp.path(), "notes.md", "three", &mut used).unwrap();

        assert_eq!([first.as_str(), second.as_str(), third.as_str()], ["notes.md", "notes-1.md", "notes-2.md"]);
        assert_eq!(std::fs::read_to_string(tmp.path().join("notes-1.md")).unwrap(), "two");
        assert_eq!(std::fs::read_to_string(tmp.path().join("notes-2.md")).unwrap(), "three");
    }

    #[test]
    fn failed_write_does_not_reserve_the_name() {
        let tmp = tempfile::tempdir().unwrap();
        let mut used = HashSet::new();

        let missing = tmp.path().join("missing");
        assert!(write_markdown_file(&missing, "notes.md", "lost", &mut used).is_err());
        assert!(used.is_empty());

        let name = write_markdown_file(tmp.path(), "notes.md", "kept", &mut used).unwrap();
        assert_eq!(name, "notes.md");
    }

    #[test]
    fn fresh_set_overwrites_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_markdown_file(tmp.path(), "page.md", "old", &mut HashSet::new()).unwrap();
        let name = write_markdown_file(tmp.path(), "page.md", "new", &mut HashSet::new()).unwrap();

        assert_eq!(name, "page.md");
        assert_eq!(std::fs::read_to_string(tmp.path().join("page.md")).unwrap(), "new");
    }

    #[test]
    fn no_temp_files_remain_after_write() {
        let tmp = tempfile::tempdir().unwrap();
        write_markdown_file(tmp.path(), "a.md", "x", &mut HashSet::new()).unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.md"]);
    }

    #[test]
    fn ensure_output_dir_creates_and_cleans() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("docs").join("spoketome");

        ensure_output_dir(&out).unwrap();
        assert!(out.is_dir());

        std::fs::write(out.join(".stale.md.tmp"), "partial").unwrap();
        std::fs::write(out.join("kept.md"), "page").unwrap();
        ensure_output_dir(&out).unwrap();

        assert!(!out.join(".stale.md.tmp").exists());
        assert!(out.join("kept.md").exists());
    }
}
