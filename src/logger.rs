// src/logger.rs
// =============================================================================
// Logger setup.
//
// Logs go to stderr, results go to stdout. That way `--json` output can be
// piped into another program without log lines getting mixed in.
// =============================================================================

use env_logger::Builder;
use log::LevelFilter;

// Used when neither RUST_LOG nor --log-level says otherwise
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

// Initializes env_logger.
//
// Precedence, lowest first:
//   1. warn for everything, with the chatty parser/HTTP crates capped
//   2. RUST_LOG, so `RUST_LOG=page_analyzer=debug` works as usual
//   3. --log-level, but only when it was actually passed
pub fn init_logger(level: Option<LevelFilter>) -> Result<(), log::SetLoggerError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut builder = configure(level, rust_log.as_deref());
    builder.format_timestamp_millis();
    builder.try_init()
}

fn configure(level: Option<LevelFilter>, rust_log: Option<&str>) -> Builder {
    let mut builder = Builder::new();

    builder.filter_level(DEFAULT_LEVEL);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("sqlx", LevelFilter::Warn);

    // A directive for the same module replaces the one above it
    if let Some(spec) = rust_log {
        builder.parse_filters(spec);
    }

    if let Some(level) = level {
        builder.filter_level(level);
        builder.filter_module("page_analyzer", level);
    }

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, level: Level, target: &str) -> bool {
        logger.enabled(&Metadata::builder().level(level).target(target).build())
    }

    #[test]
    fn test_defaults_to_warn() {
        let logger = configure(None, None).build();
        assert!(enabled(&logger, Level::Warn, "page_analyzer::analyzer"));
        assert!(!enabled(&logger, Level::Info, "page_analyzer::analyzer"));
        assert!(!enabled(&logger, Level::Warn, "html5ever::tree_builder"));
    }

    #[test]
    fn test_rust_log_module_directive_is_honored() {
        let logger = configure(None, Some("page_analyzer=debug")).build();
        assert!(enabled(&logger, Level::Debug, "page_analyzer::analyzer"));
        assert!(!enabled(&logger, Level::Debug, "reqwest::connect"));
    }

    #[test]
    fn test_explicit_flag_wins_over_rust_log() {
        let logger = configure(Some(LevelFilter::Error), Some("page_analyzer=debug")).build();
        assert!(!enabled(&logger, Level::Warn, "page_analyzer::analyzer"));
        assert!(enabled(&logger, Level::Error, "page_analyzer::analyzer"));
    }

    #[test]
    fn test_noisy_crates_stay_capped_at_debug() {
        let logger = configure(Some(LevelFilter::Debug), None).build();
        assert!(enabled(&logger, Level::Debug, "page_analyzer::storage"));
        assert!(!enabled(&logger, Level::Debug, "hyper::proto"));
        assert!(!enabled(&logger, Level::Warn, "html5ever::tree_builder"));
    }
}
