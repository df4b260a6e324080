// src/pipeline.rs
// =============================================================================
// One `analyze` run from start to finish: fetch, analyze, save.
//
// The rule this module exists for: a report only reaches the store if the
// whole analysis succeeded AND nobody cancelled in the meantime. The CLI
// calls this, so the rule is tested here instead of inside main.rs.
// =============================================================================

use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::analyzer::{AnalysisReport, Analyzer};
use crate::error::{AnalysisError, RunError};
use crate::storage::ReportStore;

/// A finished run: the report, and its store id if it was saved.
#[derive(Debug)]
pub struct AnalyzedPage {
    pub report: AnalysisReport,
    pub saved_as: Option<i64>,
}

// Fetches and analyzes `page_url`, then upserts the report into `store`
// (pass None to skip saving).
//
// Cancellation is honored right up to the upsert. The upsert itself is a
// single statement, so it is never interrupted halfway: once it has
// started, the row lands and its id is returned.
//
// Returns: the report plus its id, or the first error. On any error,
// including Cancelled, nothing has been written.
pub async fn analyze_and_store(
    analyzer: &Analyzer,
    client: &Client,
    page_url: &Url,
    fetch_timeout: Duration,
    store: Option<&ReportStore>,
    cancel: &CancellationToken,
) -> Result<AnalyzedPage, RunError> {
    let report = analyzer
        .fetch_and_analyze(client, page_url, fetch_timeout, cancel)
        .await?;

    let Some(store) = store else {
        return Ok(AnalyzedPage {
            report,
            saved_as: None,
        });
    };

    // The analysis may have finished in the same instant the token fired
    if cancel.is_cancelled() {
        warn!("{}: cancelled before saving, report discarded", page_url);
        return Err(AnalysisError::Cancelled.into());
    }

    let id = store.upsert(page_url.as_str(), &report).await?;
    info!("saved analysis of {} as id {}", page_url, id);

    Ok(AnalyzedPage {
        report,
        saved_as: Some(id),
    })
}
