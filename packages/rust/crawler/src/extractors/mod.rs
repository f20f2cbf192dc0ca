//! Content extractor trait and built-in extractors.
//!
//! An extractor turns one parsed page into zero or more [`Record`]s. Each
//! site layout gets its own extractor so selector breakage stays out of the
//! crawl engine.

mod article_cards;
mod page;

use scraper::Html;
use sitecrawl_shared::{Fields, Record};
use url::Url;

pub use article_cards::ArticleCardExtractor;
pub use page::PageExtractor;

/// Extractor name that selects by detection on the seed page.
pub const AUTO_EXTRACTOR: &str = "auto";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Site-specific record extraction.
pub trait ContentExtractor: Send + Sync {
    /// Whether this extractor recognizes the page layout.
    fn detect(&self, doc: &Html, url: &Url) -> bool;

    /// Pull records out of a crawled page. Each record's `url` identifies it.
    fn extract_records(&self, doc: &Html, page_url: &Url) -> Vec<Record>;

    /// Parse a record's own page for fields the listing did not carry.
    /// `None` means this extractor has no detail pages.
    fn extract_details(&self, _doc: &Html) -> Option<Fields> {
        None
    }

    /// Whether record pages are worth fetching for [`extract_details`].
    ///
    /// [`extract_details`]: ContentExtractor::extract_details
    fn has_details(&self) -> bool {
        false
    }

    /// Short name used in config and logs.
    fn name(&self) -> &str;

    /// One-line description for `sitecrawl extractors`.
    fn description(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered extractors in detection priority order.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Registry with all built-in extractors (site-specific first, `page` last).
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(ArticleCardExtractor), Box::new(PageExtractor)],
        }
    }

    /// Registry with a custom extractor list. The last entry acts as the
    /// detection fallback.
    pub fn with_extractors(extractors: Vec<Box<dyn ContentExtractor>>) -> Self {
        Self { extractors }
    }

    /// Look up an extractor by name.
    pub fn get(&self, name: &str) -> Option<&dyn ContentExtractor> {
        self.extractors
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    /// Whether `choice` is `auto` or a registered name.
    pub fn is_known(&self, choice: &str) -> bool {
        choice == AUTO_EXTRACTOR || self.get(choice).is_some()
    }

    /// First extractor that detects the document; falls back to the last one.
    pub fn detect(&self, doc: &Html, url: &Url) -> Option<&dyn ContentExtractor> {
        self.extractors
            .iter()
            .find(|e| e.detect(doc, url))
            .or_else(|| self.extractors.last())
            .map(|e| e.as_ref())
    }

    /// Resolve a configured choice against the first fetched page.
    pub fn select(&self, choice: &str, doc: &Html, url: &Url) -> Option<&dyn ContentExtractor> {
        if choice == AUTO_EXTRACTOR {
            self.detect(doc, url)
        } else {
            self.get(choice)
        }
    }

    /// All registered extractors, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ContentExtractor> {
        self.extractors.iter().map(|e| e.as_ref())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
