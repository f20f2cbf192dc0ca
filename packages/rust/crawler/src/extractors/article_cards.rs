//! News/blog listing pages built from `div.card-post` preview cards.
//!
//! Each card links to one article. The card carries title, sections,
//! posted date, byline and a short dek; the article page itself carries the
//! body text and a fuller byline.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use sitecrawl_shared::{Fields, Record};
use url::Url;

use super::ContentExtractor;
use crate::text::{element_text, inline_text, strip_date_label};

macro_rules! selector {
    ($css:expr) => {
        LazyLock::new(|| Selector::parse($css).expect("valid selector"))
    };
}

static CARD: LazyLock<Selector> = selector!("div.card-post");
static TITLE_LINK: LazyLock<Selector> = selector!("a.card-post-title-link");
static IMAGE_LINK: LazyLock<Selector> = selector!("a.card-post-image-link");
static CARD_TITLE: LazyLock<Selector> = selector!("h3.card-post-title");
static BADGES: LazyLock<Selector> = selector!(".post-tax-badges .cat-name-badge");
static BADGE_LINKS: LazyLock<Selector> = selector!("a.cat-name-badge");
static CARD_DATE: LazyLock<Selector> = selector!(r#"p[class*="card-post-date"]"#);
static CARD_BYLINE: LazyLock<Selector> = selector!(".card-post-byline a");
static CARD_DEK: LazyLock<Selector> = selector!("p.card-post-dek");

static ENTRY_PARAGRAPHS: LazyLock<Selector> = selector!("div.entry-content p");
static ALL_PARAGRAPHS: LazyLock<Selector> = selector!("p");
static BYLINE_TIMESTAMP: LazyLock<Selector> = selector!(r#"[class*="byline-item-timestamp"]"#);
static BYLINE_AUTHORS: LazyLock<Selector> = selector!(".byline-item-author a");
static ARTICLE_BYLINE: LazyLock<Selector> = selector!(".article-byline a");

/// Extracts one record per preview card on a listing page.
pub struct ArticleCardExtractor;

impl ContentExtractor for ArticleCardExtractor {
    fn detect(&self, doc: &Html, _url: &Url) -> bool {
        doc.select(&CARD).next().is_some()
    }

    fn extract_records(&self, doc: &Html, page_url: &Url) -> Vec<Record> {
        doc.select(&CARD)
            .filter_map(|card| parse_card(card, page_url))
            .collect()
    }

    fn extract_details(&self, doc: &Html) -> Option<Fields> {
        let mut fields = Fields::new();

        let mut paragraphs = doc.select(&ENTRY_PARAGRAPHS).peekable();
        let body = if paragraphs.peek().is_some() {
            join_texts(paragraphs)
        } else {
            join_texts(doc.select(&ALL_PARAGRAPHS))
        };
        fields.insert("full_article".into(), body.into());

        let date = doc
            .select(&BYLINE_TIMESTAMP)
            .next()
            .or_else(|| doc.select(&CARD_DATE).next())
            .map(|el| strip_date_label(&element_text(el)))
            .unwrap_or_default();
        fields.insert("date_posted".into(), date.into());

        let mut authors = names(doc.select(&BYLINE_AUTHORS));
        if authors.is_empty() {
            authors = names(doc.select(&ARTICLE_BYLINE));
        }
        fields.insert("authors".into(), authors.into());

        Some(fields)
    }

    fn has_details(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "article-cards"
    }

    fn description(&self) -> &str {
        "listing pages of div.card-post preview cards, enriched from each article page"
    }
}

/// Build a record from one preview card. Cards without a link are skipped.
fn parse_card(card: ElementRef<'_>, page_url: &Url) -> Option<Record> {
    let link = card
        .select(&TITLE_LINK)
        .next()
        .or_else(|| card.select(&IMAGE_LINK).next())?;

    let href = link.value().attr("href").map(str::trim).unwrap_or("");
    if href.is_empty() {
        return None;
    }
    let mut url = page_url.join(href).ok()?;
    url.set_fragment(None);

    let title = link
        .select(&CARD_TITLE)
        .next()
        .or_else(|| card.select(&CARD_TITLE).next())
        .map(inline_text)
        .unwrap_or_default();

    let mut badges: Vec<ElementRef<'_>> = card.select(&BADGES).collect();
    if badges.is_empty() {
        badges = card.select(&BADGE_LINKS).collect();
    }
    let sections = badges
        .into_iter()
        .map(inline_text)
        .collect::<Vec<_>>()
        .join(", ");

    let date_posted = card
        .select(&CARD_DATE)
        .next()
        .map(|el| strip_date_label(&element_text(el)))
        .unwrap_or_default();

    let updates = card
        .select(&CARD_DEK)
        .next()
        .map(element_text)
        .unwrap_or_default();

    Some(
        Record::new(url.to_string())
            .with_field("section", sections)
            .with_field("title", title)
            .with_field("authors", names(card.select(&CARD_BYLINE)))
            .with_field("date_posted", date_posted)
            .with_field("date_updated", "")
            .with_field("updates", updates)
            .with_field("full_article", ""),
    )
}

/// Non-empty cleaned texts of the given elements.
fn names<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(inline_text)
        .filter(|name| !name.is_empty())
        .collect()
}

fn join_texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> String {
    elements
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecrawl_shared::FieldValue;

    const LISTING: &str = r#"<html><body>
        <div class="card-post">
            <a class="card-post-image-link" href="/news/alpha"><img src="a.png"></a>
            <a class="card-post-title-link" href="/news/alpha#top">
                <h3 class="card-post-title">  Alpha
                    launch </h3>
            </a>
            <div class="post-tax-badges">
                <a class="cat-name-badge">Air</a>
                <a class="cat-name-badge">Sea</a>
            </div>
            <p class="card-post-date small">Posted on Apr 3, 2025</p>
            <div class="card-post-byline"><a href="/a/ada">Ada</a> <a href="/a/x"> </a></div>
            <p class="card-post-dek">Updated with new photos</p>
        </div>
        <div class="card-post">
            <a class="card-post-image-link" href="https://example.com/news/beta">
                <h3 class="card-post-title">Beta</h3>
            </a>
        </div>
        <div class="card-post"><h3 class="card-post-title">No link here</h3></div>
    </body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://example.com/category/air").unwrap()
    }

    #[test]
    fn detects_card_layout() {
        let doc = Html::parse_document(LISTING);
        assert!(ArticleCardExtractor.detect(&doc, &page_url()));

        let plain = Html::parse_document("<html><body><p>hi</p></body></html>");
        assert!(!ArticleCardExtractor.detect(&plain, &page_url()));
    }

    #[test]
    fn extracts_cards_with_links() {
        let doc = Html::parse_document(LISTING);
        let records = ArticleCardExtractor.extract_records(&doc, &page_url());

        assert_eq!(records.len(), 2);

        let alpha = &records[0];
        assert_eq!(alpha.url, "https://example.com/news/alpha");
        assert_eq!(alpha.text("title"), Some("Alpha launch"));
        assert_eq!(alpha.text("section"), Some("Air, Sea"));
        assert_eq!(alpha.text("date_posted"), Some("Apr 3, 2025"));
        assert_eq!(alpha.text("updates"), Some("Updated with new photos"));
        assert_eq!(
            alpha.field("authors"),
            Some(&FieldValue::List(vec!["Ada".into()]))
        );
        assert_eq!(alpha.text("full_article"), Some(""));

        let beta = &records[1];
        assert_eq!(beta.url, "https://example.com/news/beta");
        assert_eq!(beta.text("title"), Some("Beta"));
        assert_eq!(beta.text("date_posted"), Some(""));
    }

    #[test]
    fn details_from_entry_content() {
        let html = r#"<html><body>
            <p>Site banner</p>
            <div class="article-byline">
                <span class="byline-item-author"><a>Grace Hopper</a></span>
                <span class="byline-item-timestamp">Published Apr 3, 2025 6:01 PM EDT</span>
            </div>
            <div class="entry-content">
                <p>First   paragraph.</p>
                <p>Second
                   paragraph.</p>
            </div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let fields = ArticleCardExtractor.extract_details(&doc).unwrap();

        assert_eq!(
            fields["full_article"],
            FieldValue::Text("First paragraph. Second paragraph.".into())
        );
        assert_eq!(
            fields["date_posted"],
            FieldValue::Text("Apr 3, 2025 6:01 PM EDT".into())
        );
        assert_eq!(
            fields["authors"],
            FieldValue::List(vec!["Grace Hopper".into()])
        );
    }

    #[test]
    fn details_fall_back_to_all_paragraphs() {
        let html = r#"<html><body>
            <div class="article-byline"><a>Ada</a></div>
            <p>Only text.</p>
            <p class="card-post-date">Posted Yesterday</p>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let fields = ArticleCardExtractor.extract_details(&doc).unwrap();

        assert_eq!(
            fields["full_article"],
            FieldValue::Text("Only text. Posted Yesterday".into())
        );
        assert_eq!(fields["date_posted"], FieldValue::Text("Yesterday".into()));
        assert_eq!(fields["authors"], FieldValue::List(vec!["Ada".into()]));
    }

    #[test]
    fn inline_markup_does_not_split_titles() {
        let html = r#"<html><body><div class="card-post">
            <a class="card-post-title-link" href="/news/f35">
                <h3 class="card-post-title">F-<em>35</em>A deliveries resume</h3>
            </a>
            <div class="post-tax-badges"><a class="cat-name-badge">Air<b>Power</b></a></div>
        </div></body></html>"#;
        let doc = Html::parse_document(html);
        let record = &ArticleCardExtractor.extract_records(&doc, &page_url())[0];

        assert_eq!(record.text("title"), Some("F-35A deliveries resume"));
        assert_eq!(record.text("section"), Some("AirPower"));
    }
}
