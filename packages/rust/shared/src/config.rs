//! Application configuration for spoketome.
//!
//! User config lives at `~/.spoketome/spoketome.toml` and is optional.
//! CLI flags override config file values, which override defaults.
//! The Notion token itself is never stored in the file, only the name of
//! the environment variable holding it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SpoketomeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "spoketome.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".spoketome";

// ---------------------------------------------------------------------------
// Config structs (matching spoketome.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Notion API settings.
    #[serde(default)]
    pub notion: NotionConfig,
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Name of the env var holding the integration token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Base URL of the Notion REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Value sent in the `Notion-Version` header.
    #[serde(default = "default_notion_version")]
    pub notion_version: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Children requested per block-listing call (Notion caps this at 100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            api_base_url: default_api_base_url(),
            notion_version: default_notion_version(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl NotionConfig {
    /// Parse and validate [`NotionConfig::api_base_url`].
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_base_url).map_err(|e| {
            SpoketomeError::config(format!("invalid api_base_url '{}': {e}", self.api_base_url))
        })?;
        if url.cannot_be_a_base() {
            return Err(SpoketomeError::config(format!(
                "api_base_url '{}' cannot be used as a base URL",
                self.api_base_url
            )));
        }
        Ok(url)
    }
}

fn default_token_env() -> String {
    "NOTION_TOKEN".into()
}
fn default_api_base_url() -> String {
    "https://api.notion.com/v1".into()
}
fn default_notion_version() -> String {
    "2022-06-28".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_page_size() -> u32 {
    100
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.spoketome/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SpoketomeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.spoketome/spoketome.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SpoketomeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SpoketomeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SpoketomeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SpoketomeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SpoketomeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the Notion integration token from the configured env var.
pub fn validate_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.notion.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(SpoketomeError::config(format!(
            "{var_name} environment variable is required.\n\
             Create an integration at https://www.notion.so/my-integrations and set the token."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("NOTION_TOKEN"));
        assert!(toml_str.contains("api.notion.com"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[notion]
timeout_secs = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.notion.timeout_secs, 5);
        assert_eq!(config.notion.page_size, 100);
        assert_eq!(config.notion.token_env, "NOTION_TOKEN");
    }

    #[test]
    fn empty_config_is_default() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.notion.notion_version, "2022-06-28");
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[notion]\ntoken_env = \"MY_TOKEN\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.notion.token_env, "MY_TOKEN");

        std::fs::write(&path, "[notion\nbroken").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, SpoketomeError::Config { .. }));
    }

    #[test]
    fn base_url_validation() {
        let mut notion = NotionConfig::default();
        assert_eq!(notion.base_url().unwrap().as_str(), "https://api.notion.com/v1");

        notion.api_base_url = "not a url".into();
        assert!(notion.base_url().is_err());

        notion.api_base_url = "mailto:someone@example.com".into();
        assert!(notion.base_url().is_err());
    }

    #[test]
    fn token_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.notion.token_env = "SPOKETOME_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = validate_token(&config);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("SPOKETOME_TEST_NONEXISTENT_TOKEN_12345")
        );
    }
}
