//! Shared types, error model, and configuration for SiteCrawl.
//!
//! This crate is the foundation depended on by all other SiteCrawl crates.
//! It provides:
//! - [`SiteCrawlError`], the unified error type
//! - Output types ([`Record`], [`FieldValue`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlSettings, DEFAULT_PATH_FILTER, config_dir, config_file_path,
    init_config, load_config, load_config_from, parse_seed_url,
};
pub use error::{Result, SiteCrawlError};
pub use types::{FieldValue, Fields, RESERVED_FIELDS, Record};
