// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things). The `env = ...` bits let
// the same settings come from environment variables, which is handy in CI.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::config::{
    AnalyzerConfig, DEFAULT_DB_PATH, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PROBE_CONCURRENCY,
    DEFAULT_PROBE_TIMEOUT_SECS,
};

#[derive(Parser, Debug)]
#[command(
    name = "page-analyzer",
    version,
    about = "Analyze a web page's HTML structure and check its links",
    long_about = "page-analyzer fetches a single page, reports its title, meta description, \
                  HTML version, heading counts and whether it has a login form, and checks \
                  every link on it. Results are saved to a local SQLite database."
)]
pub struct Cli {
    /// SQLite database file where analyses are stored
    #[arg(long, global = true, env = "PAGE_ANALYZER_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Log level: off, error, warn, info, debug or trace [default: warn,
    /// or whatever RUST_LOG says]
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a page, analyze it and check its links
    ///
    /// Example: page-analyzer analyze https://example.com --json
    Analyze(AnalyzeArgs),

    /// List every stored analysis
    List {
        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one stored analysis in detail
    Show {
        /// Id of the analysis (see `list`)
        id: i64,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Delete stored analyses
    ///
    /// Example: page-analyzer delete 3 4 7
    Delete {
        /// One or more ids to delete
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Page to analyze (http or https)
    pub url: String,

    /// Output the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Don't store the report in the database
    #[arg(long)]
    pub no_save: bool,

    /// Maximum number of links checked at the same time
    #[arg(
        long,
        env = "PAGE_ANALYZER_CONCURRENCY",
        default_value_t = DEFAULT_PROBE_CONCURRENCY as u16,
        value_parser = clap::value_parser!(u16).range(1..=64)
    )]
    pub concurrency: u16,

    /// Seconds to wait for each link check before calling the link broken
    #[arg(
        long,
        env = "PAGE_ANALYZER_PROBE_TIMEOUT",
        default_value_t = DEFAULT_PROBE_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub probe_timeout: u64,

    /// Seconds to wait for the page itself
    #[arg(
        long,
        env = "PAGE_ANALYZER_FETCH_TIMEOUT",
        default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout: u64,
}

impl AnalyzeArgs {
    pub fn config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            probe_concurrency: usize::from(self.concurrency),
            probe_timeout: Duration::from_secs(self.probe_timeout),
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            ..AnalyzerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["page-analyzer", "analyze", "https://example.com"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.url, "https://example.com");
        assert!(!args.json);
        assert!(!args.no_save);

        let config = args.config();
        assert_eq!(config.probe_concurrency, DEFAULT_PROBE_CONCURRENCY);
        assert_eq!(config.probe_timeout, Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS));
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "page-analyzer",
            "--db",
            "/tmp/x.db",
            "analyze",
            "https://example.com",
            "--json",
            "--concurrency",
            "3",
            "--probe-timeout",
            "2",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/x.db"));
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.json);
        assert_eq!(args.config().probe_concurrency, 3);
        assert_eq!(args.config().probe_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_concurrency_must_be_in_range() {
        let result = Cli::try_parse_from([
            "page-analyzer",
            "analyze",
            "https://example.com",
            "--concurrency",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_needs_ids() {
        assert!(Cli::try_parse_from(["page-analyzer", "delete"]).is_err());

        let cli = Cli::try_parse_from(["page-analyzer", "delete", "1", "5"]).unwrap();
        match cli.command {
            Commands::Delete { ids } => assert_eq!(ids, vec![1, 5]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
