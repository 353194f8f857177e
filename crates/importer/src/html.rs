//! Small text helpers shared by the site extractors.

use scraper::ElementRef;
use url::Url;

/// Replaces non-breaking spaces (raw or as a leftover `&nbsp;` entity) and
/// collapses runs of whitespace.
pub fn clean_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Text of the first link inside `cell`, or of the whole cell if it has none.
pub fn link_or_text(cell: ElementRef<'_>) -> String {
    cell.children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "a")
        .map(element_text)
        .unwrap_or_else(|| element_text(cell))
}

/// Resolves a possibly relative `href` against the page it was found on.
pub fn resolve_href(page_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    base.join(href.trim()).ok().map(|u| u.to_string())
}
