//! Decides which discovered links are worth following.

use regex::{Regex, RegexBuilder};
use sitecrawl_shared::{CrawlConfig, Result, SiteCrawlError};
use url::Url;

/// Link filter for one crawl: same network host as the seed, http(s) only,
/// path matching the allowlist regex and none of the exclude globs.
#[derive(Debug, Clone)]
pub struct CrawlScope {
    /// Seed host.
    host: String,
    /// Seed port, with the scheme default filled in.
    port: Option<u16>,
    /// Path allowlist, searched anywhere in the path.
    path_filter: Regex,
    /// Paths matching any of these are never followed.
    exclude_patterns: Vec<Regex>,
}

impl CrawlScope {
    /// Build the scope for a crawl rooted at `seed`.
    pub fn new(seed: &Url, config: &CrawlConfig) -> Result<Self> {
        let host = seed
            .host_str()
            .ok_or_else(|| SiteCrawlError::validation(format!("URL has no host: {seed}")))?
            .to_string();

        let path_filter = RegexBuilder::new(&config.path_filter)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                SiteCrawlError::config(format!(
                    "invalid path_filter '{}': {e}",
                    config.path_filter
                ))
            })?;

        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|p| glob_to_regex(p))
            .collect();

        Ok(Self {
            host,
            port: seed.port_or_known_default(),
            path_filter,
            exclude_patterns,
        })
    }

    /// Same scheme family, host and port as the seed.
    pub fn same_site(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str() == Some(self.host.as_str())
            && url.port_or_known_default() == self.port
    }

    /// Whether a link should enter the frontier.
    pub fn in_scope(&self, url: &Url) -> bool {
        if !self.same_site(url) {
            return false;
        }

        let path = url.path();

        if self.exclude_patterns.iter().any(|p| p.is_match(path)) {
            return false;
        }

        self.path_filter.is_match(path)
    }
}

/// Convert a glob-like pattern to a regex.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{escaped}$")).ok()
}
