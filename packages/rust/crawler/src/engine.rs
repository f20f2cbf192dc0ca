//! Breadth-first, same-host crawl engine.
//!
//! The crawler starts from a seed URL, walks links in FIFO order within
//! scope, respects depth/page/concurrency limits, and collects the records
//! the configured extractor finds on each page.
//!
//! Each URL is fetched at most once per run and each record URL appears at
//! most once in the output. Page failures are logged and absorbed; a run
//! always ends with whatever it has collected.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use sitecrawl_shared::{CrawlConfig, Record, Result, SiteCrawlError};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::extractors::{ContentExtractor, ExtractorRegistry};
use crate::fetch::{FetchedPage, HttpFetcher, PageFetcher};
use crate::scope::CrawlScope;

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// Records and statistics from one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Unique records, in discovery order.
    pub records: Vec<Record>,
    /// Pages fetched with a 2xx status.
    pub pages_fetched: usize,
    /// Pages whose fetch failed (transport error or non-2xx).
    pub pages_failed: usize,
    /// Frontier entries dropped for exceeding depth or page limits.
    pub pages_dropped: usize,
    /// Frontier entries skipped because the URL was already visited.
    pub duplicates_skipped: usize,
    /// Record pages fetched for enrichment (not part of the crawl budget).
    pub detail_fetches: usize,
    /// Every crawl fetch attempt, in order.
    pub fetch_log: Vec<String>,
    /// Failures encountered (URL, error message).
    pub errors: Vec<(String, String)>,
    /// Extractor used, if any page was fetched.
    pub extractor: Option<String>,
    /// Total duration of the crawl.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for crawl status.
pub trait ProgressReporter: Send + Sync {
    /// A page was fetched successfully.
    fn page_fetched(&self, url: &str, depth: u32, processed: usize, max_pages: usize);
    /// A page fetch failed and was skipped.
    fn page_failed(&self, url: &str, reason: &str);
    /// The crawl finished.
    fn done(&self, result: &CrawlResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn page_fetched(&self, _url: &str, _depth: u32, _processed: usize, _max_pages: usize) {}
    fn page_failed(&self, _url: &str, _reason: &str) {}
    fn done(&self, _result: &CrawlResult) {}
}

// ---------------------------------------------------------------------------
// Crawl state
// ---------------------------------------------------------------------------

/// A discovered URL waiting to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    /// Link hops from the seed.
    pub depth: u32,
}

/// Everything one run owns: frontier, dedup sets, budget and output.
#[derive(Debug)]
struct CrawlState {
    frontier: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    seen_records: HashSet<String>,
    /// Pages admitted for fetching, counted against `max_pages`.
    pages_processed: usize,
    records: Vec<Record>,
    pages_fetched: usize,
    pages_dropped: usize,
    duplicates_skipped: usize,
    detail_fetches: usize,
    fetch_log: Vec<String>,
    errors: Vec<(String, String)>,
}

impl CrawlState {
    fn new(seed: &Url) -> Self {
        Self {
            frontier: VecDeque::from([FrontierEntry {
                url: seed.clone(),
                depth: 0,
            }]),
            visited: HashSet::new(),
            seen_records: HashSet::new(),
            pages_processed: 0,
            records: Vec::new(),
            pages_fetched: 0,
            pages_dropped: 0,
            duplicates_skipped: 0,
            detail_fetches: 0,
            fetch_log: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Dequeue up to `limit` entries to fetch.
    ///
    /// Every dequeued URL is marked visited, including ones dropped for
    /// exceeding the depth or page limits. The page budget is reserved here,
    /// so a batch can never push the fetch count past `max_pages`.
    fn admit_batch(&mut self, limit: usize, config: &CrawlConfig) -> Vec<FrontierEntry> {
        let mut batch = Vec::with_capacity(limit);

        while batch.len() < limit {
            let Some(entry) = self.frontier.pop_front() else {
                break;
            };

            if !self.visited.insert(entry.url.to_string()) {
                self.duplicates_skipped += 1;
                continue;
            }

            if entry.depth > config.max_depth || self.pages_processed >= config.max_pages {
                debug!(url = %entry.url, depth = entry.depth, "beyond crawl limits, dropping");
                self.pages_dropped += 1;
                continue;
            }

            self.pages_processed += 1;
            self.fetch_log.push(entry.url.to_string());
            batch.push(entry);
        }

        batch
    }

    fn enqueue_links(&mut self, links: Vec<Url>, depth: u32, scope: &CrawlScope) -> usize {
        let mut enqueued = 0;
        for url in links {
            if self.visited.contains(url.as_str()) || !scope.in_scope(&url) {
                continue;
            }
            self.frontier.push_back(FrontierEntry { url, depth });
            enqueued += 1;
        }
        enqueued
    }

    fn into_result(self, extractor: Option<String>, duration: Duration) -> CrawlResult {
        CrawlResult {
            records: self.records,
            pages_fetched: self.pages_fetched,
            pages_failed: self.errors.len(),
            pages_dropped: self.pages_dropped,
            duplicates_skipped: self.duplicates_skipped,
            detail_fetches: self.detail_fetches,
            fetch_log: self.fetch_log,
            errors: self.errors,
            extractor,
            duration,
        }
    }
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Breadth-first crawler with scope filtering and record deduplication.
pub struct Crawler<F = HttpFetcher> {
    config: CrawlConfig,
    fetcher: Arc<F>,
    registry: ExtractorRegistry,
}

impl Crawler<HttpFetcher> {
    /// Create a crawler that fetches over HTTP with the configured timeout.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: PageFetcher + 'static> Crawler<F> {
    /// Create a crawler over any page source, with the built-in extractors.
    pub fn with_fetcher(config: CrawlConfig, fetcher: F) -> Result<Self> {
        Self::with_parts(config, fetcher, ExtractorRegistry::new())
    }

    /// Create a crawler with a custom extractor registry.
    pub fn with_parts(config: CrawlConfig, fetcher: F, registry: ExtractorRegistry) -> Result<Self> {
        config.validate()?;

        if !registry.is_known(&config.extractor) {
            let available: Vec<&str> = registry.iter().map(|e| e.name()).collect();
            return Err(SiteCrawlError::config(format!(
                "unknown extractor '{}' (available: auto, {})",
                config.extractor,
                available.join(", ")
            )));
        }

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            registry,
        })
    }

    /// The runtime configuration.
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// The page source.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Crawl from `seed` until the frontier is empty or the limits are hit.
    ///
    /// Only an invalid seed or configuration returns `Err`; page failures
    /// are counted in the result.
    #[instrument(skip_all, fields(seed = %seed))]
    pub async fn run(&self, seed: &Url, progress: &dyn ProgressReporter) -> Result<CrawlResult> {
        let start = Instant::now();
        let mut seed = seed.clone();
        seed.set_fragment(None);
        let scope = CrawlScope::new(&seed, &self.config)?;
        let mut state = CrawlState::new(&seed);
        let mut extractor: Option<&dyn ContentExtractor> = None;
        let batch_size = self.config.concurrency.max(1) as usize;
        let delay = Duration::from_millis(self.config.delay_ms);

        info!(
            max_depth = self.config.max_depth,
            max_pages = self.config.max_pages,
            concurrency = self.config.concurrency,
            delay_ms = self.config.delay_ms,
            path_filter = %self.config.path_filter,
            "starting crawl"
        );

        while !state.frontier.is_empty() {
            let batch = state.admit_batch(batch_size, &self.config);
            if batch.is_empty() {
                continue;
            }

            let handles: Vec<_> = batch
                .iter()
                .map(|entry| {
                    let fetcher = Arc::clone(&self.fetcher);
                    let url = entry.url.clone();
                    tokio::spawn(async move { fetcher.fetch(&url).await })
                })
                .collect();

            // Results are handled in admission order so record attribution
            // and enqueue order do not depend on which fetch finished first.
            for (entry, handle) in batch.into_iter().zip(handles) {
                let fetched = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(SiteCrawlError::Network(format!(
                        "{}: fetch task failed: {e}",
                        entry.url
                    ))),
                };
                self.process_page(entry, fetched, &scope, &mut state, &mut extractor, progress)
                    .await;
            }

            if !delay.is_zero() && !state.frontier.is_empty() {
                tokio::time::sleep(delay).await;
            }
        }

        let result = state.into_result(
            extractor.map(|e| e.name().to_string()),
            start.elapsed(),
        );

        info!(
            records = result.records.len(),
            pages_fetched = result.pages_fetched,
            pages_failed = result.pages_failed,
            pages_dropped = result.pages_dropped,
            duration_ms = result.duration.as_millis() as u64,
            "crawl completed"
        );

        progress.done(&result);
        Ok(result)
    }

    /// Extract records and follow links for one fetched frontier entry.
    async fn process_page<'a>(
        &'a self,
        entry: FrontierEntry,
        fetched: Result<FetchedPage>,
        scope: &CrawlScope,
        state: &mut CrawlState,
        extractor: &mut Option<&'a dyn ContentExtractor>,
        progress: &dyn ProgressReporter,
    ) {
        let page = match fetched.and_then(|page| ensure_success(&entry.url, page)) {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %entry.url, depth = entry.depth, error = %e, "fetch failed, skipping");
                progress.page_failed(entry.url.as_str(), &e.to_string());
                state.errors.push((entry.url.to_string(), e.to_string()));
                return;
            }
        };

        state.pages_fetched += 1;
        progress.page_fetched(
            entry.url.as_str(),
            entry.depth,
            state.pages_processed,
            self.config.max_pages,
        );

        let follow_links = entry.depth < self.config.max_depth
            && state.pages_processed < self.config.max_pages;

        let (chosen, records, links) = {
            let doc = Html::parse_document(&page.body);

            let chosen = match *extractor {
                Some(e) => Some(e),
                None => {
                    let selected = self
                        .registry
                        .select(&self.config.extractor, &doc, &page.url);
                    if let Some(e) = selected {
                        info!(extractor = e.name(), "selected extractor");
                    }
                    *extractor = selected;
                    selected
                }
            };

            let records = chosen
                .map(|e| e.extract_records(&doc, &page.url))
                .unwrap_or_default();
            let links = if follow_links {
                extract_links(&doc, &page.url)
            } else {
                Vec::new()
            };
            (chosen, records, links)
        };

        let mut new_records = 0;
        for mut record in records {
            if !state.seen_records.insert(record.url.clone()) {
                debug!(record = %record.url, "record already collected");
                continue;
            }

            if let Some(e) = chosen.filter(|e| self.config.follow_details && e.has_details()) {
                self.enrich(e, &mut record, state).await;
            }

            record.source_page = Some(entry.url.to_string());
            state.records.push(record);
            new_records += 1;
        }

        let enqueued = state.enqueue_links(links, entry.depth + 1, scope);

        debug!(
            url = %entry.url,
            depth = entry.depth,
            records = new_records,
            enqueued,
            "page processed"
        );
    }

    /// Fill a new record's empty fields from its own page.
    async fn enrich(
        &self,
        extractor: &dyn ContentExtractor,
        record: &mut Record,
        state: &mut CrawlState,
    ) {
        let Ok(url) = Url::parse(&record.url) else {
            debug!(record = %record.url, "record URL not fetchable, skipping details");
            return;
        };

        state.detail_fetches += 1;
        let page = match self.fetcher.fetch(&url).await {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                warn!(%url, status = page.status, "detail page unavailable");
                return;
            }
            Err(e) => {
                warn!(%url, error = %e, "detail page fetch failed");
                return;
            }
        };

        if let Some(fields) = extractor.extract_details(&Html::parse_document(&page.body)) {
            record.fill_missing(fields);
        }
    }
}

/// Turn a non-2xx response into an error.
fn ensure_success(url: &Url, page: FetchedPage) -> Result<FetchedPage> {
    if page.is_success() {
        Ok(page)
    } else {
        Err(SiteCrawlError::HttpStatus {
            url: url.to_string(),
            status: page.status,
        })
    }
}

// ---------------------------------------------------------------------------
// Link extraction
// ---------------------------------------------------------------------------

/// Extract all anchor links from a document in markup order, resolved
/// against the page URL with fragments stripped.
pub fn extract_links(doc: &Html, base_url: &Url) -> Vec<Url> {
    static LINK_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

    let mut links = Vec::new();

    for el in doc.select(&LINK_SEL) {
        let Some(href) = el.value().attr("href").map(str::trim) else {
            continue;
        };

        let lower = href.to_ascii_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || lower.starts_with("javascript:")
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
        {
            continue;
        }

        if let Ok(mut resolved) = base_url.join(href) {
            resolved.set_fragment(None);
            links.push(resolved);
        }
    }

    links
}
