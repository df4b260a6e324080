// src/analyzer/mod.rs
// =============================================================================
// The page analysis engine.
//
// Submodules:
// - doctype: which HTML version the page declares (raw bytes, regex)
// - document: one walk over the parsed tree for title/meta/headings/links
// - links: resolves hrefs and sorts them into internal / external
// - verify: checks links with a bounded number of concurrent HEAD requests
// - report: the report types and the final assembly step
//
// Data flow:
//   bytes -> doctype + document -> hrefs -> links -> verify -> report
//
// Parsing and classification are plain, fast, synchronous code. The only
// slow part is verification, and it is the only part that runs concurrently.
// =============================================================================

mod doctype;
mod document;
mod links;
mod report;
mod verify;

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::fetch::fetch_page;

pub use doctype::classify_doctype;
pub use document::traverse;
pub use links::{classify_link, classify_links};
pub use report::{
    assemble, AnalysisReport, BrokenLink, HeadingCounts, HeadingLevel, LinkKind, LinkRecord,
    Liveness, PageFacts, NO_META_DESCRIPTION, NO_TITLE,
};
pub use verify::{verify_links, HttpProber, LinkProber, ProbeOutcome};

/// Analyzes pages. Holds no per-page state, so one instance can serve any
/// number of analyses.
#[derive(Clone)]
pub struct Analyzer {
    prober: Arc<dyn LinkProber>,
    concurrency: usize,
}

impl Analyzer {
    pub fn new(prober: Arc<dyn LinkProber>, concurrency: usize) -> Self {
        Self {
            prober,
            concurrency: concurrency.max(1),
        }
    }

    /// An analyzer that probes links over HTTP with `client`.
    pub fn with_client(client: Client, config: &AnalyzerConfig) -> Self {
        let prober = HttpProber::new(client, config.probe_timeout);
        Self::new(Arc::new(prober), config.probe_concurrency)
    }

    // Analyzes a page we already have the bytes for.
    //
    // Parameters:
    //   page_url: the page's URL, used as the base for relative links
    //   html: the raw response body
    //   cancel: cancelling this aborts the analysis (in-flight probes are
    //           dropped) and returns AnalysisError::Cancelled
    //
    // Returns: the full report, or Parse / Cancelled. Broken links are part
    // of the report, never an error.
    pub async fn analyze(
        &self,
        page_url: &Url,
        html: &[u8],
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let html_version = classify_doctype(html);
        let facts = traverse(html)?;
        let links = classify_links(page_url, &facts.hrefs);

        let dropped = facts.hrefs.len() - links.len();
        if dropped > 0 {
            info!("{}: skipped {} href(s) that could not be resolved", page_url, dropped);
        }

        // Dropping the verify future drops every probe still in flight
        let links = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("{}: analysis cancelled during link verification", page_url);
                return Err(AnalysisError::Cancelled);
            }
            links = verify_links(links, self.prober.as_ref(), self.concurrency) => links,
        };

        let report = assemble(
            facts.title,
            facts.meta_description,
            html_version,
            facts.headings,
            &links,
            facts.has_login_form,
        );

        info!(
            "{}: {} internal, {} external, {} broken",
            page_url, report.internal_link_count, report.external_link_count, report.broken_link_count
        );

        Ok(report)
    }

    // Fetches the page and analyzes it. A fetch failure (bad status, timeout,
    // network error) fails the whole thing before any analysis starts.
    pub async fn fetch_and_analyze(
        &self,
        client: &Client,
        page_url: &Url,
        fetch_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        let html = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            fetched = fetch_page(client, page_url, fetch_timeout) => fetched?,
        };

        self.analyze(page_url, &html, cancel).await
    }
}
