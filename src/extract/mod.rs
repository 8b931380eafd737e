//! HTML extractor
//!
//! Reduces one HTML document to:
//! - The document title
//! - Link records (every `<a href>`, in document order)
//! - Table records (every `<table>`, in document order)
//!
//! Extraction never fails. Malformed markup is recovered by the parser and
//! whatever structure survives is returned.

mod tables;

use crate::model::{LinkRecord, TableRecord};
use scraper::{Html, Selector};

pub use tables::extract_tables;

/// Everything extracted from one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub title: Option<String>,
    pub links: Vec<LinkRecord>,
    pub tables: Vec<TableRecord>,
}

/// Parses `html` and extracts its title, links and tables
///
/// Pure: the same input always yields identical output.
///
/// # Example
///
/// ```
/// use terminal_scraper::extract::extract;
///
/// let html = r#"<title>Gate</title><a href="/moves">Moves</a>
///     <table><tr><th>Col1</th></tr><tr><td>A</td></tr></table>"#;
/// let extraction = extract(html);
/// assert_eq!(extraction.title.as_deref(), Some("Gate"));
/// assert_eq!(extraction.links[0].href, "/moves");
/// assert_eq!(extraction.tables[0].row_count, 1);
/// ```
pub fn extract(html: &str) -> Extraction {
    let document = Html::parse_document(html);

    Extraction {
        title: extract_title(&document),
        links: extract_links(&document),
        tables: extract_tables(&document),
    }
}

/// Extracts the document title, if present and non-blank
pub fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

/// Extracts one record per anchor carrying an `href`
///
/// Hrefs are kept as written (trimmed). Filtering and resolution are left to
/// the caller.
pub fn extract_links(document: &Html) -> Vec<LinkRecord> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            links.push(LinkRecord {
                text: collapse_whitespace(&element.text().collect::<String>()),
                href: href.trim().to_string(),
            });
        }
    }

    links
}

/// Collapses whitespace runs to a single space and trims both ends
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
