// src/analyzer/report.rs
// =============================================================================
// The analysis report and the small types it is built from.
//
// A report is assembled once, at the very end of an analysis, and never
// changed afterwards. It is also the thing we store in the database and
// print as JSON, hence the serde derives.
// =============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

pub const NO_TITLE: &str = "(no title found)";
pub const NO_META_DESCRIPTION: &str = "(no meta description found)";

/// Heading level h1..h6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub const ALL: [HeadingLevel; 6] = [
        HeadingLevel::H1,
        HeadingLevel::H2,
        HeadingLevel::H3,
        HeadingLevel::H4,
        HeadingLevel::H5,
        HeadingLevel::H6,
    ];

    /// Matches a (lowercase) tag name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(HeadingLevel::H1),
            "h2" => Some(HeadingLevel::H2),
            "h3" => Some(HeadingLevel::H3),
            "h4" => Some(HeadingLevel::H4),
            "h5" => Some(HeadingLevel::H5),
            "h6" => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        }
    }
}

/// Number of headings per level.
///
/// A struct rather than a map: all six keys are always there, even when the
/// count is 0, and they serialize as `{"h1": .., ..., "h6": ..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

impl HeadingCounts {
    pub fn increment(&mut self, level: HeadingLevel) {
        *self.slot(level) += 1;
    }

    pub fn get(&self, level: HeadingLevel) -> usize {
        match level {
            HeadingLevel::H1 => self.h1,
            HeadingLevel::H2 => self.h2,
            HeadingLevel::H3 => self.h3,
            HeadingLevel::H4 => self.h4,
            HeadingLevel::H5 => self.h5,
            HeadingLevel::H6 => self.h6,
        }
    }

    pub fn set(&mut self, level: HeadingLevel, count: usize) {
        *self.slot(level) = count;
    }

    fn slot(&mut self, level: HeadingLevel) -> &mut usize {
        match level {
            HeadingLevel::H1 => &mut self.h1,
            HeadingLevel::H2 => &mut self.h2,
            HeadingLevel::H3 => &mut self.h3,
            HeadingLevel::H4 => &mut self.h4,
            HeadingLevel::H5 => &mut self.h5,
            HeadingLevel::H6 => &mut self.h6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Same host as the page (or no host at all).
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    /// Not checked (non-http scheme).
    Unknown,
    Alive,
    Broken,
}

// One anchor from the page, after URL resolution.
//
// Starts out as Unknown and gets its liveness filled in exactly once by the
// verifier (src/analyzer/verify.rs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// What we report for this link: the href as written if it was already
    /// absolute, otherwise the resolved URL.
    pub href: String,
    pub resolved: Url,
    pub kind: LinkKind,
    pub liveness: Liveness,
    pub status_code: Option<u16>,
}

impl LinkRecord {
    /// Only http(s) links get probed.
    pub fn is_checkable(&self) -> bool {
        matches!(self.resolved.scheme(), "http" | "https")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub href: String,
    /// 0 when the probe failed before any response came back
    /// (DNS failure, refused connection, timeout).
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub title: String,
    pub meta_description: String,
    pub html_version: String,
    pub headings: HeadingCounts,
    pub internal_link_count: usize,
    pub external_link_count: usize,
    pub broken_link_count: usize,
    pub broken_links: Vec<BrokenLink>,
    pub has_login_form: bool,
}

/// Everything the traversal found, before any links are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFacts {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: HeadingCounts,
    pub has_login_form: bool,
    /// Raw href values, in document order.
    pub hrefs: Vec<String>,
}

// Builds the final report.
//
// Pure bookkeeping: count internal vs external, collect the broken ones in
// the order they appeared on the page, and substitute the placeholder text
// for a missing title or description.
//
// `links` must already be in document order. Broken links are collected
// regardless of whether they're internal or external.
pub fn assemble(
    title: Option<String>,
    meta_description: Option<String>,
    html_version: String,
    headings: HeadingCounts,
    links: &[LinkRecord],
    has_login_form: bool,
) -> AnalysisReport {
    let internal_link_count = links.iter().filter(|l| l.kind == LinkKind::Internal).count();
    let external_link_count = links.len() - internal_link_count;

    let broken_links: Vec<BrokenLink> = links
        .iter()
        .filter(|l| l.liveness == Liveness::Broken)
        .map(|l| BrokenLink {
            href: l.href.clone(),
            status: l.status_code.unwrap_or(0),
        })
        .collect();

    AnalysisReport {
        title: title.unwrap_or_else(|| NO_TITLE.to_string()),
        meta_description: meta_description.unwrap_or_else(|| NO_META_DESCRIPTION.to_string()),
        html_version,
        headings,
        internal_link_count,
        external_link_count,
        broken_link_count: broken_links.len(),
        broken_links,
        has_login_form,
    }
}
