//! Search engine query building and result scraping.
//!
//! Results are read from the engine's HTML page: every anchor that directly
//! wraps an `<h3>` is one hit, titled by the headings inside it.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use textweb_core::Error;
use url::Url;

/// Number of hits the CLI shows.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Heading text of the result
    pub title: String,
    /// Link target, resolved against the results page when possible
    pub href: String,
}

/// Build the query URL for `term` by appending it, form-encoded, to `base`.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for a blank term.
pub fn search_url(base: &str, term: &str) -> Result<String, Error> {
    let term = term.trim();
    if term.is_empty() {
        return Err(Error::InvalidInput("search term cannot be empty".into()));
    }

    let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
    Ok(format!("{base}{encoded}"))
}

/// Scrape up to `limit` hits from a results page.
///
/// Relative hrefs are joined onto `page_url` when one is given. Anchors with
/// no href are skipped. An anchor wrapping several headings counts once, with
/// the text of every heading inside it as the title.
pub fn parse_search_results(html: &str, page_url: Option<&Url>, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a > h3").expect("invalid selector");
    let headings = Selector::parse("h3").expect("invalid selector");

    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for heading in document.select(&selector) {
        if hits.len() >= limit {
            break;
        }

        let Some(anchor) = heading.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        if !seen.insert(anchor.id()) {
            continue;
        }

        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let href = match page_url.map(|base| base.join(href)) {
            Some(Ok(resolved)) => resolved.to_string(),
            _ => href.to_string(),
        };

        let title = anchor
            .select(&headings)
            .flat_map(|h3| h3.text())
            .collect::<Vec<_>>()
            .join(" ");
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");

        hits.push(SearchHit { title, href });
    }

    hits
}
