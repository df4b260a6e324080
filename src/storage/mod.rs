// src/storage/mod.rs
// =============================================================================
// Keeps analysis reports around between runs.
//
// One row per page URL. Analyzing the same URL again replaces the old report
// (but keeps its id), so `list` always shows the latest result per page.
//
// The analyzer itself never touches the store: pipeline.rs hands a finished
// report over once the analysis has fully succeeded.
// =============================================================================

mod sqlite;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzer::AnalysisReport;

pub use sqlite::ReportStore;

/// A report as it comes back out of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPage {
    pub id: i64,
    pub url: String,
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AnalysisReport,
}
