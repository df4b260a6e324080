// src/analyzer/links.rs
// =============================================================================
// Turns raw hrefs into absolute URLs and sorts them into internal and
// external links.
//
// We use the `url` crate to:
// - Resolve relative URLs against the page URL (like a browser does)
// - Compare hosts
// =============================================================================

use log::debug;
use url::Url;

use super::report::{LinkKind, LinkRecord, Liveness};

// Resolves `href` against the page URL and classifies it.
//
// Parameters:
//   base: the URL of the page the href was found on
//   href: the attribute value as written in the HTML
//
// Returns: Some(LinkRecord) with liveness still Unknown, or None when the
// href can't be resolved (it is then left out of every count).
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs"                -> https://example.com/docs, Internal
//   href = "//example.com/x"      -> https://example.com/x,    Internal
//   href = "https://other.com"    -> https://other.com/,       External
//   href = "mailto:a@example.com" -> no host,                  Internal
pub fn classify_link(base: &Url, href: &str) -> Option<LinkRecord> {
    let resolved = match base.join(href) {
        Ok(url) => url,
        Err(e) => {
            debug!("dropping unresolvable href '{}': {}", href, e);
            return None;
        }
    };

    let kind = match resolved.host_str() {
        None => LinkKind::Internal,
        Some(host) if host.is_empty() => LinkKind::Internal,
        Some(host) => {
            let same_host = base
                .host_str()
                .is_some_and(|base_host| base_host.eq_ignore_ascii_case(host));
            if same_host {
                LinkKind::Internal
            } else {
                LinkKind::External
            }
        }
    };

    // Keep the author's spelling for absolute links ("https://example.com"
    // rather than the normalized "https://example.com/")
    let reported = if Url::parse(href).is_ok() {
        href.to_string()
    } else {
        resolved.to_string()
    };

    Some(LinkRecord {
        href: reported,
        resolved,
        kind,
        liveness: Liveness::Unknown,
        status_code: None,
    })
}

// Classifies every candidate, in order, dropping the ones that don't resolve.
pub fn classify_links(base: &Url, hrefs: &[String]) -> Vec<LinkRecord> {
    hrefs
        .iter()
        .filter_map(|href| classify_link(base, href))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_relative_link_is_internal() {
        let link = classify_link(&base(), "/about").unwrap();
        assert_eq!(link.resolved.as_str(), "https://example.com/about");
        assert_eq!(link.href, "https://example.com/about");
        assert_eq!(link.kind, LinkKind::Internal);
        assert_eq!(link.liveness, Liveness::Unknown);
    }

    #[test]
    fn test_path_relative_link() {
        let link = classify_link(&base(), "../archive").unwrap();
        assert_eq!(link.resolved.as_str(), "https://example.com/archive");
        assert_eq!(link.kind, LinkKind::Internal);
    }

    #[test]
    fn test_absolute_same_host_is_internal() {
        let link = classify_link(&base(), "http://EXAMPLE.com/contact").unwrap();
        assert_eq!(link.kind, LinkKind::Internal);
        assert_eq!(link.href, "http://EXAMPLE.com/contact");
    }

    #[test]
    fn test_protocol_relative_same_host_is_internal() {
        let link = classify_link(&base(), "//example.com/x").unwrap();
        assert_eq!(link.resolved.as_str(), "https://example.com/x");
        assert_eq!(link.kind, LinkKind::Internal);
    }

    #[test]
    fn test_other_host_is_external() {
        let link = classify_link(&base(), "https://www.rust-lang.org").unwrap();
        assert_eq!(link.kind, LinkKind::External);
        assert_eq!(link.href, "https://www.rust-lang.org");
        assert_eq!(link.resolved.as_str(), "https://www.rust-lang.org/");
    }

    #[test]
    fn test_subdomain_is_external() {
        let link = classify_link(&base(), "https://docs.example.com/").unwrap();
        assert_eq!(link.kind, LinkKind::External);
    }

    #[test]
    fn test_mailto_has_no_host() {
        let link = classify_link(&base(), "mailto:test@example.com").unwrap();
        assert_eq!(link.kind, LinkKind::Internal);
        assert!(!link.is_checkable());
    }

    #[test]
    fn test_unresolvable_href_is_dropped() {
        assert!(classify_link(&base(), "https://[not-an-ip").is_none());

        let hrefs = vec![
            "/ok".to_string(),
            "http://[::1".to_string(),
            "https://other.test/".to_string(),
        ];
        let links = classify_links(&base(), &hrefs);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "https://example.com/ok");
        assert_eq!(links[1].href, "https://other.test/");
    }
}
