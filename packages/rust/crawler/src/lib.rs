//! Web crawler and record extraction.
//!
//! This crate provides:
//! - [`engine`]: Breadth-first, same-host crawler with dedup and limits
//! - [`extractors`]: Site-layout record extractors and the [`ExtractorRegistry`]
//! - [`fetch`]: The [`PageFetcher`] seam and its HTTP implementation
//! - [`scope`]: Which links the crawler follows

pub mod engine;
pub mod extractors;
pub mod fetch;
pub mod scope;
pub mod text;

pub use engine::{
    CrawlResult, Crawler, FrontierEntry, ProgressReporter, SilentProgress, extract_links,
};
pub use extractors::{
    AUTO_EXTRACTOR, ArticleCardExtractor, ContentExtractor, ExtractorRegistry, PageExtractor,
};
pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use scope::CrawlScope;
