//! Pull orchestration for spoketome.
//!
//! This crate ties together manifest discovery, Notion fetching, Markdown
//! rendering, and output writing into the end-to-end `pull` run.

pub mod context;
pub mod pipeline;
pub mod writer;

pub use pipeline::{
    PageFetcher, ProgressReporter, PullConfig, PullResult, SilentProgress, pull, pull_page,
};
