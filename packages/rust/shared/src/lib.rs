//! Shared types, error model, and configuration for spoketome.
//!
//! This crate is the foundation depended on by all other spoketome crates.
//! It provides:
//! - [`SpoketomeError`], the unified error type
//! - Domain types ([`ManifestEntry`], [`ResolvedManifest`], [`PulledPage`], [`ContextFile`])
//! - The Notion wire model for blocks ([`blocks`]) and page properties ([`properties`])
//! - Page-id extraction from Notion URLs ([`page_id`])
//! - Configuration ([`AppConfig`], config loading, token validation)

pub mod blocks;
pub mod config;
pub mod error;
pub mod page_id;
pub mod properties;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use blocks::{Block, BlockKind, RichText};
pub use config::{
    AppConfig, NotionConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_token,
};
pub use error::{Result, SpoketomeError};
pub use page_id::{PageId, extract_page_id, is_valid_notion_url};
pub use properties::RawProperty;
pub use types::{
    CONTEXT_FILENAME, CURRENT_SCHEMA_VERSION, ContextEntry, ContextFile, ManifestEntry,
    OUTPUT_DIR_NAME, PropertyValue, PulledPage, ResolvedManifest,
};
