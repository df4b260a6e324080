// src/analyzer/document.rs
// =============================================================================
// Walks the parsed HTML once and pulls out everything the report needs:
// title, meta description, heading counts, login-form signal, and the raw
// href of every anchor worth checking.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever, so broken tag soup still gives us a tree
//
// No network access happens here. Links are only collected; resolving them
// is links.rs's job and checking them is verify.rs's job.
//
// Rust concepts:
// - Enums with data: ElementKind says which elements we care about
// - match: one place that decides what to do with each kind of element
// =============================================================================

use log::debug;
use scraper::{ElementRef, Html};

use super::report::{HeadingLevel, PageFacts};
use crate::error::AnalysisError;

// How many leading bytes we look at when deciding whether the input is
// binary data rather than a (possibly very broken) HTML document.
const SNIFF_LEN: usize = 1024;

// The elements the traversal reacts to. Everything else is Other and is
// just walked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Title,
    Meta,
    Form,
    Input,
    Heading(HeadingLevel),
    Anchor,
    Other,
}

impl ElementKind {
    fn from_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        match tag.as_str() {
            "title" => ElementKind::Title,
            "meta" => ElementKind::Meta,
            "form" => ElementKind::Form,
            "input" => ElementKind::Input,
            "a" => ElementKind::Anchor,
            other => HeadingLevel::from_tag(other)
                .map(ElementKind::Heading)
                .unwrap_or(ElementKind::Other),
        }
    }
}

// Parses `html` and extracts the page facts.
//
// Malformed HTML is fine (html5ever never gives up on tag soup). The only
// failure is input that isn't text at all, e.g. someone pointed us at an
// image or a zip file.
pub fn traverse(html: &[u8]) -> Result<PageFacts, AnalysisError> {
    if looks_binary(html) {
        return Err(AnalysisError::Parse(
            "document contains NUL bytes and looks like binary data".to_string(),
        ));
    }

    // Invalid UTF-8 sequences become U+FFFD instead of failing
    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);

    let mut facts = PageFacts::default();

    // descendants() is a pre-order depth-first walk, i.e. document order
    for node in document.tree.root().descendants() {
        if let Some(element) = ElementRef::wrap(node) {
            visit(element, &mut facts);
        }
    }

    debug!(
        "traversal found {} candidate link(s), title present: {}",
        facts.hrefs.len(),
        facts.title.is_some()
    );

    Ok(facts)
}

fn visit(element: ElementRef<'_>, facts: &mut PageFacts) {
    let el = element.value();

    match ElementKind::from_tag(el.name()) {
        ElementKind::Title => {
            // First title with actual text wins
            if facts.title.is_none() {
                let text = element
                    .children()
                    .find_map(|child| child.value().as_text().map(|t| t.trim().to_string()));
                if let Some(text) = text.filter(|t| !t.is_empty()) {
                    facts.title = Some(text);
                }
            }
        }
        ElementKind::Meta => {
            let is_description = el
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"));
            if is_description && facts.meta_description.is_none() {
                let content = el.attr("content").map(str::trim).unwrap_or("");
                if !content.is_empty() {
                    facts.meta_description = Some(content.to_string());
                }
            }
        }
        ElementKind::Form => {
            if el
                .attr("action")
                .is_some_and(|action| action.to_lowercase().contains("login"))
            {
                facts.has_login_form = true;
            }
        }
        ElementKind::Input => {
            if el
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
            {
                facts.has_login_form = true;
            }
        }
        ElementKind::Heading(level) => facts.headings.increment(level),
        ElementKind::Anchor => {
            if let Some(href) = el.attr("href").filter(|href| is_candidate_href(href)) {
                facts.hrefs.push(href.to_string());
            }
        }
        ElementKind::Other => {}
    }
}

// We skip:
// - empty hrefs
// - in-page fragments (#section)
// - javascript: pseudo-links
//
// The checks look at the attribute exactly as written. " #x" or
// "JavaScript:void(0)" are still links as far as the counts go.
fn is_candidate_href(href: &str) -> bool {
    !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:")
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(SNIFF_LEN).any(|&b| b == 0)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not CSS selectors here?
//    - We'd need one selector (and one pass over the tree) per thing we want
//    - A single walk with a match on ElementKind looks at each node once
//
// 2. What does ElementRef::wrap do?
//    - The tree holds text, comments, the doctype, etc. as well as elements
//    - wrap() returns Some only for element nodes, so we skip everything else
//
// 3. Why is_some_and?
//    - attr() returns Option<&str> (the attribute may be missing)
//    - is_some_and(|v| ...) is "present AND the closure says yes"
// -----------------------------------------------------------------------------
