//! zhk-scout main entry point
//!
//! This is the command-line front end: it reads queries, runs searches and
//! prints the replies a chat user would get.

use anyhow::{bail, Context};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use zhk_scout::config::{load_config_with_hash, Config};
use zhk_scout::output::{write_statistics, Reply, ReplySink, StdoutSink};
use zhk_scout::Searcher;

/// zhk-scout: finds housing complexes (ЖК) on a real-estate site
///
/// Crawls the configured site (city list, city listings, complex pages)
/// within a fixed page budget and prints the complexes whose names match
/// the query.
#[derive(Parser, Debug)]
#[command(name = "zhk-scout")]
#[command(version)]
#[command(about = "Finds housing complexes on a real-estate site", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root URL of the site to search (overrides the config file)
    #[arg(long, env = "ZHK_SCOUT_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print crawl statistics to stderr after each search
    #[arg(long)]
    stats: bool,

    /// Validate config and show the search settings without crawling
    #[arg(long)]
    dry_run: bool,

    /// Query to search for; without one, queries are read from stdin line by line
    #[arg(value_name = "QUERY")]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let searcher = Searcher::new(config).context("Failed to initialize search service")?;
    let mut sink = StdoutSink::stdout();

    if cli.query.is_empty() {
        return handle_stdin(&searcher, &mut sink, cli.stats).await;
    }

    let query = cli.query.join(" ");
    if !handle_query(&searcher, &mut sink, &query, cli.stats).await? {
        std::process::exit(1);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("zhk_scout=info,warn"),
            1 => EnvFilter::new("zhk_scout=debug,info"),
            2 => EnvFilter::new("zhk_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the configuration from the config file, the base URL, or both
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => match &cli.base_url {
            Some(base_url) => Config::for_site(base_url.clone()),
            None => bail!("No site configured: pass --config FILE or --base-url URL"),
        },
    };

    if let (Some(_), Some(base_url)) = (&cli.config, &cli.base_url) {
        tracing::info!("Overriding site root with {}", base_url);
        config.site.base_url = base_url.clone();
    }

    Ok(config)
}

/// Handles the --dry-run mode: shows what a search would do
fn handle_dry_run(config: &Config) {
    println!("=== zhk-scout Dry Run ===\n");

    println!("Site: {}", config.site.base_url);

    println!("\nCrawler Configuration:");
    println!("  Mode: {:?}", config.crawler.mode);
    println!("  Stop policy: {:?}", config.crawler.stop_policy);
    println!("  Page cap: {}", config.crawler.page_cap);
    println!("  Result cap: {}", config.crawler.result_cap);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Concurrent fetches: {}", config.crawler.max_concurrent_fetches);
    println!("  Enrich details: {}", config.crawler.enrich_details);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSelectors:");
    println!("  Cities: {}", config.selectors.cities);
    println!("  Card: {}", config.selectors.card);
    println!("  Detail description: {}", config.selectors.detail_description);

    match zhk_scout::config::validate(config) {
        Ok(()) => println!("\n✓ Configuration is valid"),
        Err(e) => println!("\n✗ Configuration is invalid: {}", e),
    }
}

/// Reads queries from stdin, one per line, until end of input
async fn handle_stdin(
    searcher: &Searcher,
    sink: &mut impl ReplySink,
    show_stats: bool,
) -> anyhow::Result<()> {
    sink.deliver(&Reply::Greeting)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        handle_query(searcher, sink, &line, show_stats).await?;
    }

    Ok(())
}

/// Runs one query and delivers its reply
///
/// Returns false when the search failed hard (site unavailable); the reply
/// has been delivered either way.
async fn handle_query(
    searcher: &Searcher,
    sink: &mut impl ReplySink,
    query: &str,
    show_stats: bool,
) -> anyhow::Result<bool> {
    let query = query.trim();
    if query.is_empty() {
        sink.deliver(&Reply::EmptyQuery)?;
        return Ok(true);
    }

    if let Some(reply) = command_reply(query) {
        sink.deliver(&reply)?;
        return Ok(true);
    }

    sink.deliver(&Reply::Searching {
        query: query.to_string(),
    })?;

    let result = searcher.search(query).await;
    match &result {
        Ok(report) if show_stats => write_statistics(&mut io::stderr(), &report.stats)?,
        Ok(_) => {}
        Err(e) => tracing::error!("Search for '{}' failed: {}", query, e),
    }

    sink.deliver(&Reply::from_result(&result))?;
    Ok(result.is_ok())
}

/// Answers the chat commands that are not searches
fn command_reply(query: &str) -> Option<Reply> {
    let command = query.split_whitespace().next()?;
    let command = command.split('@').next().unwrap_or(command);

    if command.eq_ignore_ascii_case("/start") || command.eq_ignore_ascii_case("/help") {
        Some(Reply::Greeting)
    } else {
        None
    }
}
