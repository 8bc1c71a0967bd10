//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use spoketome_core::{ProgressReporter, PullConfig, PullResult};
use spoketome_discovery::{DiscoveryOptions, find_project_root};
use spoketome_notion::NotionClient;
use spoketome_shared::{
    AppConfig, ManifestEntry, ResolvedManifest, SpoketomeError, config_file_path, init_config,
    load_config, validate_token,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// spoketome: keep Notion pages next to the code that depends on them.
#[derive(Parser)]
#[command(
    name = "spoketome",
    version,
    about = "Pull Notion pages referenced by .spoketome files into local Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch every referenced page and write it as Markdown.
    Pull {
        /// Directory to search from (the project root is found from here).
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Show what would be pulled without fetching or writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the resolved manifests without contacting Notion.
    List {
        /// Directory to search from.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Print the resolved manifests as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.quiet {
        "spoketome=warn"
    } else {
        match cli.verbose {
            0 => "spoketome=info",
            1 => "spoketome=debug",
            _ => "spoketome=trace",
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let verbose = cli.verbose > 0;
    match cli.command {
        Command::Pull { dir, dry_run } => cmd_pull(&dir, dry_run, verbose, cli.quiet).await,
        Command::List { dir, json } => cmd_list(&dir, json, verbose),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_pull(dir: &Path, dry_run: bool, verbose: bool, quiet: bool) -> Result<()> {
    // Token and client problems are fatal before any discovery happens.
    let config = load_config()?;
    let token = validate_token(&config)?;
    let client = NotionClient::new(&token, &config.notion)?;

    let dir = std::path::absolute(dir).map_err(|e| eyre!("invalid directory '{}': {e}", dir.display()))?;
    let pull_config = PullConfig {
        dir: dir.clone(),
        dry_run,
        verbose,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(dir = %dir.display(), dry_run, "pulling Notion pages");

    let reporter = CliProgress::new(quiet);
    let result = spoketome_core::pull(&pull_config, &client, &reporter).await?;

    if result.manifests == 0 {
        reporter.say("No .spoketome files found.");
        return Ok(());
    }

    if !dry_run {
        reporter.say(&format!(
            "\nDone: {} page(s) pulled, {} failed.",
            result.succeeded, result.failed
        ));
    }

    if result.failed > 0 {
        return Err(eyre!("{} page(s) failed to pull", result.failed));
    }

    Ok(())
}

fn cmd_list(dir: &Path, json: bool, verbose: bool) -> Result<()> {
    let dir = std::path::absolute(dir).map_err(|e| eyre!("invalid directory '{}': {e}", dir.display()))?;
    let root = find_project_root(&dir, verbose);
    let manifests = spoketome_discovery::discover(&root, &DiscoveryOptions { verbose })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifests)?);
        return Ok(());
    }

    if manifests.is_empty() {
        println!("No .spoketome files found under {}.", root.display());
        return Ok(());
    }

    for manifest in &manifests {
        println!("{}", manifest.dir_path.display());
        for entry in &manifest.entries {
            println!("  {} ({})", entry.notion_url, entry.page_id);
        }
    }

    let total: usize = manifests.iter().map(|m| m.entries.len()).sum();
    println!("\n{} director(ies), {total} page(s).", manifests.len());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", config_file_path()?.display());
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a spinner for the current phase, plus one line per page.
struct CliProgress {
    spinner: ProgressBar,
    quiet: bool,
}

impl CliProgress {
    fn new(quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
            spinner.enable_steady_tick(std::time::Duration::from_millis(80));
            spinner
        };
        Self { spinner, quiet }
    }

    /// Print a line to stdout without tearing the spinner.
    fn say(&self, line: &str) {
        if !self.quiet {
            self.spinner.suspend(|| println!("{line}"));
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn manifest_started(&self, manifest: &ResolvedManifest) {
        self.say(&format!("\nProcessing {}", manifest.dir_path.display()));
    }

    fn would_pull(&self, entry: &ManifestEntry) {
        self.say(&format!("  Would pull: {}", entry.notion_url));
    }

    fn page_pulled(&self, title: &str, file_path: &str) {
        self.say(&format!("  ✓ {title} → {file_path}"));
    }

    fn page_failed(&self, entry: &ManifestEntry, error: &SpoketomeError) {
        self.spinner
            .suspend(|| eprintln!("  ✗ Failed to pull {}: {error}", entry.notion_url));
    }

    fn done(&self, _result: &PullResult) {
        self.spinner.finish_and_clear();
    }
}
