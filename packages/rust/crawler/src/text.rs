//! Whitespace and label cleanup for scraped text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

/// Collapse every whitespace run to a single space and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a leading `Posted` / `Published` / `Updated` label (and an optional
/// `on`) from a date line.
///
/// `"Posted on Apr 3, 2025"` becomes `"Apr 3, 2025"`.
pub fn strip_date_label(text: &str) -> String {
    static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^(posted|published|updated)\s+(on\s+)?").expect("valid regex")
    });

    let cleaned = clean_text(text);
    LABEL_RE.replace(&cleaned, "").trim().to_string()
}

/// Text content of an element, with text nodes separated by spaces and
/// whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text content of an inline element such as a title or a name, with text
/// nodes concatenated as they appear and whitespace collapsed.
pub(crate) fn inline_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Hello\n\t  world  "), "Hello world");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n "), "");
    }

    #[test]
    fn strip_date_label_variants() {
        assert_eq!(strip_date_label("Posted on Apr 3, 2025"), "Apr 3, 2025");
        assert_eq!(
            strip_date_label("Published Apr 3, 2025 6:01 PM EDT"),
            "Apr 3, 2025 6:01 PM EDT"
        );
        assert_eq!(strip_date_label("updated   on\nMay 1"), "May 1");
        assert_eq!(strip_date_label("Yesterday"), "Yesterday");
    }

    #[test]
    fn element_text_joins_nodes() {
        let doc = Html::parse_fragment("<p>One<b>two</b>\n three</p>");
        let sel = Selector::parse("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(p), "One two three");
    }

    #[test]
    fn inline_text_keeps_words_whole() {
        let doc = Html::parse_fragment("<h3> Alpha<b>launch</b>\n  day </h3>");
        let sel = Selector::parse("h3").unwrap();
        let h3 = doc.select(&sel).next().unwrap();
        assert_eq!(inline_text(h3), "Alphalaunch day");
        assert_eq!(element_text(h3), "Alpha launch day");
    }
}
