//! Title and favicon extraction.
//!
//! Pure functions over a parsed document; missing elements yield empty
//! strings rather than errors.

use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::models::PageMetadata;

const FAVICON_MIME_TYPE: &str = "image/x-icon";
const FAVICON_REL: &str = "shortcut icon";

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| static_selector("head title"));

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| static_selector("link"));

/// Parses one of the selectors above.
///
/// # Panics
///
/// Panics on an invalid selector, which can only be a programming error.
fn static_selector(css: &'static str) -> Selector {
    Selector::parse(css)
        .unwrap_or_else(|e| panic!("built-in selector {:?} does not parse: {}", css, e))
}

/// Text of the first `<title>` inside `<head>`, trimmed.
pub fn extract_title(document: &Html) -> String {
    match document.select(&TITLE_SELECTOR).next() {
        Some(element) => element.text().collect::<String>().trim().to_string(),
        None => {
            log::debug!("No title element found in document");
            String::new()
        }
    }
}

/// `href` of the page's favicon link.
///
/// Two passes over every `<link>`: first by `type="image/x-icon"`, then by
/// `rel="shortcut icon"`. Both compare case-insensitively and the last
/// matching link of a pass wins. The href is returned as written, relative
/// or not.
pub fn extract_favicon(document: &Html) -> String {
    let by_type = last_link_href(document, "type", FAVICON_MIME_TYPE);
    if let Some(href) = by_type.filter(|href| !href.is_empty()) {
        return href;
    }
    log::debug!("No {} link, falling back to rel=\"{}\"", FAVICON_MIME_TYPE, FAVICON_REL);
    last_link_href(document, "rel", FAVICON_REL).unwrap_or_default()
}

fn last_link_href(document: &Html, attribute: &str, expected: &str) -> Option<String> {
    document
        .select(&LINK_SELECTOR)
        .filter(|link| {
            link.value()
                .attr(attribute)
                .is_some_and(|value| value.eq_ignore_ascii_case(expected))
        })
        .last()
        .map(|link| link.value().attr("href").unwrap_or_default().to_string())
}

/// Parses `html` and extracts title and favicon.
pub fn parse_page_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    PageMetadata {
        title: extract_title(&document),
        favicon: extract_favicon(&document),
    }
}
