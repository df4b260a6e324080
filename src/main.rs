// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging
// 3. Dispatch to the appropriate subcommand handler
// 4. Print results
// 5. Exit with proper code (0 = success, 1 = broken links, 2 = error)
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use log::warn;
use tokio_util::sync::CancellationToken;

use page_analyzer::analyzer::{AnalysisReport, Analyzer, HeadingLevel};
use page_analyzer::cli::{AnalyzeArgs, Cli, Commands};
use page_analyzer::error::StoreError;
use page_analyzer::storage::{ReportStore, StoredPage};
use page_analyzer::{analyze_and_store, fetch, logger};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_logger(cli.log_level) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain: "outer: inner: cause"
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = success (and no broken links, for `analyze`)
//   Ok(1) = the analyzed page has broken links
//   Err   = anything went wrong; main turns this into exit code 2
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&cli.db, args).await,
        Commands::List { json } => handle_list(&cli.db, json).await,
        Commands::Show { id, json } => handle_show(&cli.db, id, json).await,
        Commands::Delete { ids } => handle_delete(&cli.db, &ids).await,
    }
}

async fn open_store(db: &Path) -> Result<ReportStore> {
    ReportStore::open(db)
        .await
        .with_context(|| format!("could not open database {}", db.display()))
}

// Handles the 'analyze' subcommand
//
// The report is only stored once the whole analysis has succeeded. If the
// fetch fails, the page isn't HTML, or the user hits Ctrl-C, nothing is
// written and nothing is printed.
async fn handle_analyze(db: &Path, args: AnalyzeArgs) -> Result<i32> {
    let page_url = fetch::parse_page_url(&args.url)?;
    let config = args.config();

    // Open the store first so a bad --db path fails before any network work
    let store = if args.no_save {
        None
    } else {
        Some(open_store(db).await?)
    };

    let client = config
        .build_client()
        .context("could not build HTTP client")?;
    let analyzer = Analyzer::with_client(client.clone(), &config);

    // Ctrl-C cancels the analysis; outstanding link checks are dropped.
    // The listener stays up until the report is saved.
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling analysis");
                cancel.cancel();
            }
        })
    };

    if !args.json {
        eprintln!("🔍 Analyzing: {}", page_url);
    }

    let result = analyze_and_store(
        &analyzer,
        &client,
        &page_url,
        config.fetch_timeout,
        store.as_ref(),
        &cancel,
    )
    .await;
    let interrupted = cancel.is_cancelled();
    interrupt.abort();

    let analyzed = result.with_context(|| format!("analysis of {} failed", page_url))?;

    // Ctrl-C arrived while the upsert was running: the row is there, but
    // the user asked us to stop, so don't print.
    if interrupted {
        match analyzed.saved_as {
            Some(id) => bail!("interrupted after saving analysis of {} as id {}", page_url, id),
            None => bail!("interrupted, analysis of {} discarded", page_url),
        }
    }

    // NOTES: from here on Ctrl-C is ignored. tokio keeps its signal handler
    // installed for the rest of the process, and printing is all that's left.
    let report = analyzed.report;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(page_url.as_str(), &report);
    }

    if report.broken_link_count > 0 {
        Ok(1) // Exit code 1 = broken links found
    } else {
        Ok(0) // Exit code 0 = all good
    }
}

// Handles the 'list' subcommand
async fn handle_list(db: &Path, json: bool) -> Result<i32> {
    let store = open_store(db).await?;
    let pages = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
    } else if pages.is_empty() {
        println!("No analyses stored yet");
    } else {
        print_table(&pages);
    }
    Ok(0)
}

// Handles the 'show' subcommand
async fn handle_show(db: &Path, id: i64, json: bool) -> Result<i32> {
    let store = open_store(db).await?;
    let page = store
        .get(id)
        .await?
        .ok_or(StoreError::NotFound(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("🆔 {} (analyzed {})", page.id, page.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"));
        print_report(&page.url, &page.report);
    }
    Ok(0)
}

// Handles the 'delete' subcommand
async fn handle_delete(db: &Path, ids: &[i64]) -> Result<i32> {
    let store = open_store(db).await?;
    let removed = store.delete(ids).await?;
    println!("🗑️  Deleted {} of {} requested analysis(es)", removed, ids.len());
    Ok(0)
}

// Prints one report in a human-readable form
fn print_report(url: &str, report: &AnalysisReport) {
    println!("🌐 {}", url);
    println!("   Title:            {}", report.title);
    println!("   Meta description: {}", report.meta_description);
    println!("   HTML version:     {}", report.html_version);

    let headings: Vec<String> = HeadingLevel::ALL
        .iter()
        .map(|level| format!("{}={}", level.tag(), report.headings.get(*level)))
        .collect();
    println!("   Headings:         {}", headings.join(" "));
    println!(
        "   Login form:       {}",
        if report.has_login_form { "yes" } else { "no" }
    );
    println!();

    println!("📊 Links:");
    println!("   🏠 Internal: {}", report.internal_link_count);
    println!("   🔗 External: {}", report.external_link_count);
    println!("   ❌ Broken:   {}", report.broken_link_count);

    if !report.broken_links.is_empty() {
        println!();
        println!("{:<70} {:<10}", "BROKEN LINK", "STATUS");
        println!("{}", "=".repeat(80));
        for link in &report.broken_links {
            let status = if link.status == 0 {
                "no reply".to_string()
            } else {
                format!("HTTP {}", link.status)
            };
            println!("{:<70} {:<10}", truncate(&link.href, 67), status);
        }
    }
}

// Prints stored analyses as a table
fn print_table(pages: &[StoredPage]) {
    println!(
        "{:<6} {:<50} {:<12} {:>9} {:>9} {:>7} {:<6}",
        "ID", "URL", "VERSION", "INTERNAL", "EXTERNAL", "BROKEN", "LOGIN"
    );
    println!("{}", "=".repeat(105));

    for page in pages {
        let report = &page.report;
        println!(
            "{:<6} {:<50} {:<12} {:>9} {:>9} {:>7} {:<6}",
            page.id,
            truncate(&page.url, 47),
            truncate(&report.html_version, 12),
            report.internal_link_count,
            report.external_link_count,
            report.broken_link_count,
            if report.has_login_form { "yes" } else { "no" }
        );
    }

    println!();
    println!("📋 Total: {}", pages.len());
}

// Shortens long strings for table display, adding "..." when cut
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
