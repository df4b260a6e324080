// src/config.rs
// =============================================================================
// Tuning knobs for one run of the analyzer.
//
// The CLI (src/cli.rs) fills these in from flags or environment variables.
// Tests build them directly, usually starting from Default and overriding
// just the field they care about.
// =============================================================================

use std::time::Duration;

use reqwest::Client;

/// How many link probes may be in flight at once for one page.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 10;

/// Per-probe timeout. One slow link must not hold up the whole report.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 4;

/// Timeout for fetching the page itself.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Default SQLite database file.
pub const DEFAULT_DB_PATH: &str = "page_analyzer.db";

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub probe_concurrency: usize,
    pub probe_timeout: Duration,
    pub fetch_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: format!("page-analyzer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AnalyzerConfig {
    // Builds the one HTTP client used for both the page fetch and the link
    // probes. reqwest clients pool connections internally, and cloning one is
    // cheap (it's an Arc inside), so every probe task gets a clone.
    //
    // No client-wide timeout is set here: the fetch and the probes each wrap
    // their own request in a timeout of the right length.
    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()
    }
}
