// src/lib.rs
// =============================================================================
// Library root. The binary (src/main.rs) is a thin CLI on top of this, and
// the analysis engine can also be used on its own:
//
//   let analyzer = Analyzer::with_client(client, &AnalyzerConfig::default());
//   let report = analyzer.analyze(&page_url, &html_bytes, &cancel).await?;
// =============================================================================

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logger;
pub mod pipeline;
pub mod storage;

pub use analyzer::{AnalysisReport, Analyzer};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, FetchError, RunError, StoreError};
pub use pipeline::{analyze_and_store, AnalyzedPage};
