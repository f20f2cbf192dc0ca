//! Application configuration for SiteCrawl.
//!
//! User config lives at `~/.sitecrawl/sitecrawl.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SiteCrawlError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitecrawl.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitecrawl";

/// Path keywords that mark a page as worth following by default.
pub const DEFAULT_PATH_FILTER: &str = "(blog|article|post|category|archive|news)";

// ---------------------------------------------------------------------------
// Config structs (matching sitecrawl.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Crawl limits and politeness settings.
    #[serde(default)]
    pub crawl: CrawlSettings,
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// Maximum link depth from the seed URL.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of pages fetched per run.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed delay between requests, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Regex searched (case-insensitively) in a link's path.
    #[serde(default = "default_path_filter")]
    pub path_filter: String,

    /// Glob patterns for paths that are never followed.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Number of pages fetched at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Fetch each new record's own page to fill in missing fields.
    #[serde(default = "default_true")]
    pub follow_details: bool,

    /// Extractor name, or `auto` to detect from the seed page.
    #[serde(default = "default_extractor")]
    pub extractor: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
            delay_ms: default_delay_ms(),
            path_filter: default_path_filter(),
            exclude_patterns: Vec::new(),
            concurrency: default_concurrency(),
            follow_details: default_true(),
            extractor: default_extractor(),
        }
    }
}

fn default_max_depth() -> u32 {
    3
}
fn default_max_pages() -> usize {
    500
}
fn default_timeout_secs() -> u64 {
    8
}
fn default_delay_ms() -> u64 {
    500
}
fn default_path_filter() -> String {
    DEFAULT_PATH_FILTER.into()
}
fn default_concurrency() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_extractor() -> String {
    "auto".into()
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum link depth from the seed URL (0 = seed page only).
    pub max_depth: u32,
    /// Maximum number of pages fetched.
    pub max_pages: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between requests in milliseconds.
    pub delay_ms: u64,
    /// Path allowlist regex.
    pub path_filter: String,
    /// Path exclude glob patterns.
    pub exclude_patterns: Vec<String>,
    /// Pages fetched at once.
    pub concurrency: u32,
    /// Whether to enrich new records from their own page.
    pub follow_details: bool,
    /// Extractor name or `auto`.
    pub extractor: String,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        let crawl = &config.crawl;
        Self {
            max_depth: crawl.max_depth,
            max_pages: crawl.max_pages,
            timeout_secs: crawl.timeout_secs,
            delay_ms: crawl.delay_ms,
            path_filter: crawl.path_filter.clone(),
            exclude_patterns: crawl.exclude_patterns.clone(),
            concurrency: crawl.concurrency,
            follow_details: crawl.follow_details,
            extractor: crawl.extractor.clone(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl CrawlConfig {
    /// Check limits and that the path filter compiles.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(SiteCrawlError::config("max_pages must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(SiteCrawlError::config("concurrency must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(SiteCrawlError::config("timeout_secs must be at least 1"));
        }
        RegexBuilder::new(&self.path_filter)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                SiteCrawlError::config(format!("invalid path_filter '{}': {e}", self.path_filter))
            })?;
        Ok(())
    }
}

/// Parse a seed URL, requiring an http(s) scheme and a host.
pub fn parse_seed_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| SiteCrawlError::validation(format!("invalid URL '{raw}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SiteCrawlError::validation(format!(
            "unsupported scheme '{}' in {url}: expected http or https",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(SiteCrawlError::validation(format!("URL has no host: {url}")));
    }

    url.set_fragment(None);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitecrawl/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SiteCrawlError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitecrawl/sitecrawl.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| SiteCrawlError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SiteCrawlError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteCrawlError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SiteCrawlError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteCrawlError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("[crawl]"));
        assert!(toml_str.contains("max_pages = 500"));
        assert!(toml_str.contains("blog|article"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.crawl.max_depth, 3);
        assert_eq!(parsed.crawl.timeout_secs, 8);
        assert_eq!(parsed.crawl.extractor, "auto");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[crawl]
max_depth = 1
exclude_patterns = ["/news/tag/**"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.crawl.max_depth, 1);
        assert_eq!(config.crawl.max_pages, 500);
        assert_eq!(config.crawl.delay_ms, 500);
        assert_eq!(config.crawl.exclude_patterns, vec!["/news/tag/**".to_string()]);
        assert!(config.crawl.follow_details);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.crawl.concurrency, 1);
        assert_eq!(config.crawl.path_filter, DEFAULT_PATH_FILTER);
    }

    #[test]
    fn crawl_config_from_app_config() {
        let crawl = CrawlConfig::from(&AppConfig::default());
        assert_eq!(crawl.max_depth, 3);
        assert_eq!(crawl.max_pages, 500);
        assert_eq!(crawl.delay_ms, 500);
        assert!(crawl.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_limits() {
        let mut crawl = CrawlConfig::default();
        crawl.max_pages = 0;
        assert!(crawl.validate().unwrap_err().to_string().contains("max_pages"));

        let mut crawl = CrawlConfig::default();
        crawl.concurrency = 0;
        assert!(crawl.validate().unwrap_err().to_string().contains("concurrency"));

        let mut crawl = CrawlConfig::default();
        crawl.path_filter = "(unclosed".into();
        assert!(crawl.validate().unwrap_err().to_string().contains("path_filter"));
    }

    #[test]
    fn seed_url_validation() {
        assert!(parse_seed_url("https://www.example.com/").is_ok());
        assert!(parse_seed_url("  http://example.com/news ").is_ok());
        assert!(parse_seed_url("ftp://example.com/").is_err());
        assert!(parse_seed_url("not a url").is_err());
    }

    #[test]
    fn seed_url_drops_fragment() {
        let url = parse_seed_url("https://www.example.com/news#top").expect("valid seed");
        assert_eq!(url.as_str(), "https://www.example.com/news");
    }

    #[test]
    fn load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("sitecrawl-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("sitecrawl.toml");
        std::fs::write(&path, "[crawl]\nmax_pages = 12\nextractor = \"page\"\n").expect("write");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.crawl.max_pages, 12);
        assert_eq!(config.crawl.extractor, "page");

        std::fs::write(&path, "[crawl]\nmax_pages = \"many\"\n").expect("write");
        assert!(load_config_from(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
