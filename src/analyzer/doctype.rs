// src/analyzer/doctype.rs
// =============================================================================
// Works out which HTML version a page declares.
//
// This runs on the raw bytes, before parsing: html5ever normalizes the
// doctype, so the declaration as written wouldn't survive a round trip
// through the tree.
// =============================================================================

use std::sync::OnceLock;

use regex::bytes::Regex;

pub const UNKNOWN_VERSION: &str = "Unknown";

// (?i) = case-insensitive, so <!doctype html> matches too.
// -u turns Unicode off: [^>] then matches any byte, not just whole UTF-8
// characters, so a doctype with stray Latin-1 bytes still matches.
fn doctype_regex() -> &'static Regex {
    static DOCTYPE: OnceLock<Regex> = OnceLock::new();
    DOCTYPE.get_or_init(|| {
        Regex::new(r"(?i-u)<!DOCTYPE\s+([^>]+)>").expect("doctype pattern is a valid regex")
    })
}

// Returns the version label for a document.
//
// Examples:
//   <!DOCTYPE html>                                   -> "HTML5"
//   <!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN"> -> "HTML 4.01"
//   (no doctype)                                      -> "Unknown"
//
// The order of the checks matters. A bare `<!DOCTYPE html>` has no PUBLIC
// identifier and must be HTML5 even if the rest of the declaration happens
// to contain a "2.0" or "3.2" somewhere.
pub fn classify_doctype(html: &[u8]) -> String {
    let Some(captures) = doctype_regex().captures(html) else {
        return UNKNOWN_VERSION.to_string();
    };

    // Not trimmed: the fallback label is the declaration exactly as written
    let raw = String::from_utf8_lossy(&captures[1]).into_owned();
    let doctype = raw.to_lowercase();

    if doctype.contains("html") && !doctype.contains("public") {
        "HTML5".to_string()
    } else if doctype.contains("xhtml") {
        "XHTML".to_string()
    } else if doctype.contains("4.01") {
        "HTML 4.01".to_string()
    } else if doctype.contains("3.2") {
        "HTML 3.2".to_string()
    } else if doctype.contains("2.0") {
        "HTML 2.0".to_string()
    } else {
        // Something we don't recognize - report it as written
        raw
    }
}
