// src/error.rs
// =============================================================================
// Error types for the whole program.
//
// Only two things can stop an analysis: the page could not be fetched, or the
// bytes we got back are not HTML at all. A broken link is NOT an error - it
// ends up in the report. Cancellation (Ctrl-C) also stops the analysis as a
// whole, so it gets its own variant.
//
// Rust concepts:
// - thiserror: derive macro that writes the Display and Error impls for us
// - #[from]: lets the ? operator convert one error type into another
// =============================================================================

use thiserror::Error;

/// Failure to fetch the page that is about to be analyzed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed at all.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only http and https pages can be fetched.
    #[error("unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    /// The whole fetch (connect + headers + body) took too long.
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    /// The server answered, but not with a 2xx status.
    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Anything else reqwest reports (DNS, connection refused, TLS, ...).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Terminal failure of one analysis request.
///
/// Callers either get a full report or exactly one of these.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The bytes could not be treated as an HTML document.
    #[error("could not parse document as HTML: {0}")]
    Parse(String),

    /// The request was cancelled before the report was complete.
    #[error("analysis cancelled")]
    Cancelled,
}

/// Errors from the report store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("could not encode broken link details: {0}")]
    Encode(#[from] serde_json::Error),

    /// A row exists but cannot be turned back into a report.
    #[error("stored row {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("no stored analysis with id {0}")]
    NotFound(i64),
}

/// Failure of an analyze-then-save run: either half can fail.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
