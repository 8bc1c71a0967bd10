//! Notion REST API access.
//!
//! This crate provides:
//! - [`NotionClient`]: page retrieval and depth-first block-tree hydration
//! - [`properties`]: title and property-value extraction from page objects

pub mod client;
pub mod properties;

pub use client::{BlockList, FetchedPage, NotionClient, NotionPage};
pub use properties::{extract_properties, extract_title, extract_value};
