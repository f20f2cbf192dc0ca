//! Fallback extractor: one record per crawled page.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use sitecrawl_shared::Record;
use url::Url;

use super::ContentExtractor;
use crate::text::{clean_text, element_text, inline_text};

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
        .expect("valid selector")
});
static PARAGRAPHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main p, article p").expect("valid selector"));
static ALL_PARAGRAPHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));

/// Turns every crawled page into a record of its title, description and
/// paragraph text. Matches any document.
pub struct PageExtractor;

impl ContentExtractor for PageExtractor {
    fn detect(&self, _doc: &Html, _url: &Url) -> bool {
        true
    }

    fn extract_records(&self, doc: &Html, page_url: &Url) -> Vec<Record> {
        let mut url = page_url.clone();
        url.set_fragment(None);

        let title = doc
            .select(&H1)
            .next()
            .or_else(|| doc.select(&TITLE).next())
            .map(inline_text)
            .unwrap_or_default();

        let description = doc
            .select(&DESCRIPTION)
            .find_map(|el| el.value().attr("content"))
            .map(clean_text)
            .unwrap_or_default();

        let mut paragraphs: Vec<String> = doc.select(&PARAGRAPHS).map(element_text).collect();
        if paragraphs.is_empty() {
            paragraphs = doc.select(&ALL_PARAGRAPHS).map(element_text).collect();
        }
        paragraphs.retain(|p| !p.is_empty());

        vec![
            Record::new(url.to_string())
                .with_field("title", title)
                .with_field("description", description)
                .with_field("text", paragraphs.join(" ")),
        ]
    }

    fn name(&self) -> &str {
        "page"
    }

    fn description(&self) -> &str {
        "one record per page: title, meta description and paragraph text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_page_record() {
        let html = r#"<html><head>
            <title>Site | Blog</title>
            <meta name="description" content="  All the   news ">
        </head><body>
            <nav><p>Menu</p></nav>
            <main><h1>Blog</h1><p>First.</p><p></p><p>Second.</p></main>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let url = Url::parse("https://example.com/blog#latest").unwrap();
        let records = PageExtractor.extract_records(&doc, &url);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.url, "https://example.com/blog");
        assert_eq!(record.text("title"), Some("Blog"));
        assert_eq!(record.text("description"), Some("All the news"));
        assert_eq!(record.text("text"), Some("First. Second."));
    }

    #[test]
    fn falls_back_to_title_and_all_paragraphs() {
        let html = "<html><head><title>Plain</title></head><body><p>Body.</p></body></html>";
        let doc = Html::parse_document(html);
        let url = Url::parse("https://example.com/").unwrap();
        let record = &PageExtractor.extract_records(&doc, &url)[0];

        assert_eq!(record.text("title"), Some("Plain"));
        assert_eq!(record.text("description"), Some(""));
        assert_eq!(record.text("text"), Some("Body."));
        assert!(PageExtractor.extract_details(&doc).is_none());
    }
}
