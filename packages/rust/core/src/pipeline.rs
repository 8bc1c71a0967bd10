//! End-to-end `pull` pipeline: discover → fetch → render → write → record.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use spoketome_discovery::{DiscoveryOptions, find_project_root};
use spoketome_notion::{FetchedPage, NotionClient, extract_properties, extract_title};
use spoketome_shared::{
    ManifestEntry, OUTPUT_DIR_NAME, PageId, PulledPage, ResolvedManifest, Result, SpoketomeError,
};

use crate::context::{build_context_file, write_context_file};
use crate::writer::{ensure_output_dir, sanitize_filename, write_markdown_file};

/// Configuration for a `pull` run.
#[derive(Debug, Clone)]
pub struct PullConfig {
    /// Directory to start the search from (the project root is located from here).
    pub dir: PathBuf,
    /// List what would be pulled without fetching or writing anything.
    pub dry_run: bool,
    /// Surface skipped manifest lines and exclusion counts at higher log levels.
    pub verbose: bool,
    /// Tool version recorded in `context.yaml`.
    pub tool_version: String,
}

/// Outcome of a `pull` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullResult {
    /// Directories with a non-empty resolved manifest.
    pub manifests: usize,
    /// Pages fetched and written.
    pub succeeded: usize,
    /// Entries that could not be fetched or written.
    pub failed: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Source of hydrated Notion pages.
pub trait PageFetcher {
    /// Retrieve a page object and its full block tree.
    fn fetch_page(&self, page_id: &PageId) -> impl Future<Output = Result<FetchedPage>>;
}

impl PageFetcher for NotionClient {
    fn fetch_page(&self, page_id: &PageId) -> impl Future<Output = Result<FetchedPage>> {
        NotionClient::fetch_page(self, page_id)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a directory's entries are processed.
    fn manifest_started(&self, manifest: &ResolvedManifest);
    /// Called for each entry during a dry run.
    fn would_pull(&self, entry: &ManifestEntry);
    /// Called after a page is written; `file_path` is relative to the manifest directory.
    fn page_pulled(&self, title: &str, file_path: &str);
    /// Called when an entry fails.
    fn page_failed(&self, entry: &ManifestEntry, error: &SpoketomeError);
    /// Called when the run completes.
    fn done(&self, result: &PullResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn manifest_started(&self, _manifest: &ResolvedManifest) {}
    fn would_pull(&self, _entry: &ManifestEntry) {}
    fn page_pulled(&self, _title: &str, _file_path: &str) {}
    fn page_failed(&self, _entry: &ManifestEntry, _error: &SpoketomeError) {}
    fn done(&self, _result: &PullResult) {}
}

/// Run the full `pull` pipeline.
///
/// 1. Locate the project root and discover manifests
/// 2. Per directory: fetch, render and write each entry in order
/// 3. Per directory with at least one success: write `context.yaml`
///
/// Entry and directory failures are counted and reported; they never abort
/// the run. Only discovery errors are returned.
#[instrument(skip_all, fields(dir = %config.dir.display(), dry_run = config.dry_run))]
pub async fn pull(
    config: &PullConfig,
    fetcher: &impl PageFetcher,
    progress: &dyn ProgressReporter,
) -> Result<PullResult> {
    let start = Instant::now();

    progress.phase("Discovering manifests");
    let root = find_project_root(&config.dir, config.verbose);
    let opts = DiscoveryOptions {
        verbose: config.verbose,
    };
    let manifests = spoketome_discovery::discover(&root, &opts)?;

    info!(
        root = %root.display(),
        manifests = manifests.len(),
        pages = manifests.iter().map(|m| m.entries.len()).sum::<usize>(),
        "starting pull"
    );

    let mut succeeded = 0;
    let mut failed = 0;

    for manifest in &manifests {
        progress.manifest_started(manifest);

        if config.dry_run {
            for entry in &manifest.entries {
                progress.would_pull(entry);
            }
            continue;
        }

        progress.phase("Pulling pages");
        let (ok, err) = pull_manifest(manifest, config, fetcher, progress).await;
        succeeded += ok;
        failed += err;
    }

    let result = PullResult {
        manifests: manifests.len(),
        succeeded,
        failed,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        manifests = result.manifests,
        succeeded = result.succeeded,
        failed = result.failed,
        elapsed_ms = result.elapsed.as_millis(),
        "pull complete"
    );

    Ok(result)
}

/// Pull every entry of one directory. Returns `(succeeded, failed)`.
///
/// If the output directory cannot be prepared, every entry fails. If
/// `context.yaml` cannot be written, the entries already written are
/// reported failed too, since the directory has no index for them; their
/// Markdown files stay on disk. Either way the run moves on to the next
/// directory.
#[instrument(skip_all, fields(dir = %manifest.dir_path.display(), entries = manifest.entries.len()))]
async fn pull_manifest(
    manifest: &ResolvedManifest,
    config: &PullConfig,
    fetcher: &impl PageFetcher,
    progress: &dyn ProgressReporter,
) -> (usize, usize) {
    if let Err(e) = ensure_output_dir(&manifest.output_dir) {
        error!(output_dir = %manifest.output_dir.display(), error = %e, "cannot prepare output directory");
        for entry in &manifest.entries {
            progress.page_failed(entry, &e);
        }
        return (0, manifest.entries.len());
    }

    let mut used = HashSet::new();
    let mut written: Vec<(PulledPage, String)> = Vec::new();
    let mut written_entries: Vec<&ManifestEntry> = Vec::new();
    let mut failed = 0;

    for entry in &manifest.entries {
        debug!(url = %entry.notion_url, "pulling page");

        let outcome = pull_page(fetcher, entry).await.and_then(|page| {
            let file = write_markdown_file(
                &manifest.output_dir,
                &page.sanitized_filename,
                &page.markdown,
                &mut used,
            )?;
            Ok((page, file))
        });

        match outcome {
            Ok((page, file)) => {
                progress.page_pulled(&page.title, &format!("{OUTPUT_DIR_NAME}/{file}"));
                written.push((page, file));
                written_entries.push(entry);
            }
            Err(e) => {
                warn!(url = %entry.notion_url, page_id = %entry.page_id, error = %e, "failed to pull page");
                progress.page_failed(entry, &e);
                failed += 1;
            }
        }
    }

    if written.is_empty() {
        return (0, failed);
    }

    let ctx = build_context_file(&written, &config.tool_version, Utc::now());
    if let Err(e) = write_context_file(&manifest.output_dir, &ctx) {
        error!(output_dir = %manifest.output_dir.display(), error = %e, "cannot write context file");
        for entry in written_entries {
            progress.page_failed(entry, &e);
        }
        return (0, manifest.entries.len());
    }

    (written.len(), failed)
}

/// Fetch one entry and turn it into a renderable page.
pub async fn pull_page(fetcher: &impl PageFetcher, entry: &ManifestEntry) -> Result<PulledPage> {
    let fetched = fetcher.fetch_page(&entry.page_id).await?;

    let title = extract_title(&fetched.page.properties);
    let markdown = spoketome_markdown::blocks_to_markdown(&fetched.blocks, &title);

    Ok(PulledPage {
        sanitized_filename: sanitize_filename(&title),
        properties: extract_properties(&fetched.page.properties),
        page_id: entry.page_id,
        notion_url: entry.notion_url.clone(),
        last_edited_time: fetched.page.last_edited_time,
        markdown,
        title,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    use serde_json::json;
    use spoketome_notion::NotionPage;
    use spoketome_shared::{Block, CONTEXT_FILENAME};

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const C: &str = "cccccccccccccccccccccccccccccccc";

    fn url(id: &str) -> String {
        format!("https://www.notion.so/Page-{id}")
    }

    /// In-memory fetcher; ids without a page fail like a 404.
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<PageId, FetchedPage>,
    }

    impl FakeFetcher {
        fn with_page(mut self, id: &str, title: &str, body: &str) -> Self {
            let blocks: Vec<Block> = serde_json::from_value(json!([{
                "id": "b", "type": "paragraph", "has_children": false,
                "paragraph": { "rich_text": [{ "plain_text": body }] }
            }]))
            .unwrap();
            let properties = serde_json::from_value(json!({
                "Name": { "type": "title", "title": [{ "plain_text": title }] },
                "Status": { "type": "status", "status": { "name": "Draft" } }
            }))
            .unwrap();
            let page = NotionPage {
                id: id.into(),
                last_edited_time: "2024-05-01T00:00:00.000Z".into(),
                url: None,
                properties,
            };
            self.pages
                .insert(id.parse().unwrap(), FetchedPage { page, blocks });
            self
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, page_id: &PageId) -> Result<FetchedPage> {
            self.pages
                .get(page_id)
                .cloned()
                .ok_or_else(|| SpoketomeError::Network("HTTP 404: Could not find page".into()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for Recorder {
        fn phase(&self, _name: &str) {}
        fn manifest_started(&self, manifest: &ResolvedManifest) {
            self.push(format!("dir {}", manifest.entries.len()));
        }
        fn would_pull(&self, entry: &ManifestEntry) {
            self.push(format!("would {}", entry.notion_url));
        }
        fn page_pulled(&self, title: &str, file_path: &str) {
            self.push(format!("ok {title} {file_path}"));
        }
        fn page_failed(&self, entry: &ManifestEntry, _error: &SpoketomeError) {
            self.push(format!("fail {}", entry.notion_url));
        }
        fn done(&self, result: &PullResult) {
            self.push(format!("done {} {}", result.succeeded, result.failed));
        }
    }

    fn config(dir: &Path, dry_run: bool) -> PullConfig {
        PullConfig {
            dir: dir.to_path_buf(),
            dry_run,
            verbose: false,
            tool_version: "0.1.0".into(),
        }
    }

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(spoketome_discovery::ROOT_MARKER_FILENAME), "").unwrap();
        tmp
    }

    #[tokio::test]
    async fn failed_entry_is_counted_and_others_still_written() {
        let tmp = project();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(
            docs.join(spoketome_discovery::MANIFEST_FILENAME),
            format!("{}\n{}\n", url(A), url(B)),
        )
        .unwrap();

        let fetcher = FakeFetcher::default().with_page(B, "Design Notes", "Hello");
        let recorder = Recorder::default();
        let result = pull(&config(tmp.path(), false), &fetcher, &recorder)
            .await
            .unwrap();

        assert_eq!(result.manifests, 1);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);

        let out = docs.join(OUTPUT_DIR_NAME);
        let md = fs::read_to_string(out.join("design-notes.md")).unwrap();
        assert_eq!(md, "# Design Notes\n\nHello\n");

        let ctx = fs::read_to_string(out.join(CONTEXT_FILENAME)).unwrap();
        assert_eq!(ctx.matches("  - title:").count(), 1);
        assert!(ctx.contains("  - title: \"Design Notes\""));
        assert!(ctx.contains("filePath: \"design-notes.md\""));
        assert!(ctx.contains("Status: \"Draft\""));

        assert_eq!(
            recorder.events(),
            [
                "dir 2".to_string(),
                format!("fail {}", url(A)),
                "ok Design Notes spoketome/design-notes.md".to_string(),
                "done 1 1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn same_titles_get_suffixed_files() {
        let tmp = project();
        fs::write(
            tmp.path().join(spoketome_discovery::MANIFEST_FILENAME),
            format!("{}\n{}\n", url(A), url(B)),
        )
        .unwrap();

        let fetcher = FakeFetcher::default()
            .with_page(A, "Meeting Notes", "first")
            .with_page(B, "Meeting Notes", "second");
        let result = pull(&config(tmp.path(), false), &fetcher, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(result.succeeded, 2);

        let out = tmp.path().join(OUTPUT_DIR_NAME);
        assert!(fs::read_to_string(out.join("meeting-notes.md")).unwrap().contains("first"));
        assert!(fs::read_to_string(out.join("meeting-notes-1.md")).unwrap().contains("second"));
    }

    #[tokio::test]
    async fn all_failures_write_no_context_file() {
        let tmp = project();
        fs::write(
            tmp.path().join(spoketome_discovery::MANIFEST_FILENAME),
            url(C),
        )
        .unwrap();

        let result = pull(&config(tmp.path(), false), &FakeFetcher::default(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!((result.succeeded, result.failed), (0, 1));
        let out = tmp.path().join(OUTPUT_DIR_NAME);
        assert!(out.is_dir());
        assert!(!out.join(CONTEXT_FILENAME).exists());
    }

    #[tokio::test]
    async fn context_write_failure_fails_only_that_directory() {
        let tmp = project();
        let broken = tmp.path().join("broken");
        let fine = tmp.path().join("fine");
        // A non-empty directory where context.yaml belongs blocks the rename.
        fs::create_dir_all(broken.join(OUTPUT_DIR_NAME).join(CONTEXT_FILENAME).join("x")).unwrap();
        fs::create_dir_all(&fine).unwrap();
        fs::write(broken.join(spoketome_discovery::MANIFEST_FILENAME), url(A)).unwrap();
        fs::write(fine.join(spoketome_discovery::MANIFEST_FILENAME), url(B)).unwrap();

        let fetcher = FakeFetcher::default()
            .with_page(A, "Lost Index", "a")
            .with_page(B, "Kept", "b");
        let recorder = Recorder::default();
        let result = pull(&config(tmp.path(), false), &fetcher, &recorder)
            .await
            .unwrap();

        assert_eq!((result.succeeded, result.failed), (1, 1));
        assert!(broken.join(OUTPUT_DIR_NAME).join("lost-index.md").is_file());
        assert!(fine.join(OUTPUT_DIR_NAME).join(CONTEXT_FILENAME).is_file());
        assert_eq!(
            recorder.events(),
            [
                "dir 1".to_string(),
                "ok Lost Index spoketome/lost-index.md".to_string(),
                format!("fail {}", url(A)),
                "dir 1".to_string(),
                "ok Kept spoketome/kept.md".to_string(),
                "done 1 1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_reports_without_fetching_or_writing() {
        let tmp = project();
        let notes = tmp.path().join("notes");
        fs::create_dir_all(&notes).unwrap();
        fs::write(notes.join(spoketome_discovery::MANIFEST_FILENAME), url(A)).unwrap();

        let recorder = Recorder::default();
        let result = pull(&config(tmp.path(), true), &FakeFetcher::default(), &recorder)
            .await
            .unwrap();

        assert_eq!(result.manifests, 1);
        assert_eq!((result.succeeded, result.failed), (0, 0));
        assert!(!notes.join(OUTPUT_DIR_NAME).exists());
        assert_eq!(recorder.events()[1], format!("would {}", url(A)));
    }

    #[tokio::test]
    async fn no_manifests_is_a_successful_empty_run() {
        let tmp = project();
        fs::write(tmp.path().join("README.md"), "# readme").unwrap();

        let result = pull(&config(tmp.path(), false), &FakeFetcher::default(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.manifests, 0);
        assert_eq!((result.succeeded, result.failed), (0, 0));
        assert!(!tmp.path().join(OUTPUT_DIR_NAME).exists());
    }

    #[tokio::test]
    async fn runs_from_nested_dir_use_project_root() {
        let tmp = project();
        let deep = tmp.path().join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        fs::write(tmp.path().join(spoketome_discovery::MANIFEST_FILENAME), url(A)).unwrap();

        let fetcher = FakeFetcher::default().with_page(A, "Top", "x");
        let result = pull(&config(&deep, false), &fetcher, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.succeeded, 1);
        assert!(tmp.path().join(OUTPUT_DIR_NAME).join("top.md").exists());
    }

    #[tokio::test]
    async fn pull_page_builds_renderable_page() {
        let fetcher = FakeFetcher::default().with_page(A, "Q3: Roadmap!", "body");
        let entry = ManifestEntry {
            notion_url: url(A),
            page_id: A.parse().unwrap(),
        };

        let page = pull_page(&fetcher, &entry).await.unwrap();
        assert_eq!(page.title, "Q3: Roadmap!");
        assert_eq!(page.sanitized_filename, "q3-roadmap.md");
        assert_eq!(page.notion_url, url(A));
        assert_eq!(page.last_edited_time, "2024-05-01T00:00:00.000Z");
        assert!(!page.properties.contains_key("Name"));
        assert!(page.markdown.starts_with("# Q3: Roadmap!\n\nbody"));
    }
}
