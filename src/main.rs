//! libgen-comics main entry point
//!
//! Command-line interface for locating comic issue files on the catalog.

use anyhow::{bail, Context};
use clap::Parser;
use libgen_comics::catalog::{mirror_download_link, CatalogResolver, SeriesQuery};
use libgen_comics::config::{load_config_with_hash, read_api_key, Config};
use libgen_comics::fetcher::{build_http_client, ChallengeSolver, Fetcher, FlareSolverr};
use libgen_comics::metadata::ComicVineClient;
use libgen_comics::output::{format_json, format_markdown, OutputFormat};
use libgen_comics::records::{IssueNumber, ResultFile};
use libgen_comics::search::{search_external_id, SearchRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Default download partner on the mirror
const MIRROR_PARTNER: u32 = 4;

/// libgen-comics: find comic issue files on a library catalog
///
/// Resolves a series by metadata provider id, explicit catalog series ids,
/// or plain search text, then lists the downloadable files of its editions.
#[derive(Parser, Debug)]
#[command(name = "libgen-comics")]
#[command(version = "1.0.0")]
#[command(about = "Find comic issue files on a library catalog", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Metadata provider volume id to search for
    #[arg(long, value_name = "ID")]
    comicvine_id: Option<u64>,

    /// Catalog series id to use instead of searching (repeatable)
    #[arg(long = "series-id", value_name = "ID")]
    series_ids: Vec<u64>,

    /// Issue number or range, e.g. 3, 34.2 or 13-14
    #[arg(long, value_parser = parse_issue)]
    issue: Option<IssueNumber>,

    /// Search text; overrides the volume name when --comicvine-id is given
    #[arg(long)]
    query: Option<String>,

    /// Start year a series must have (without --comicvine-id)
    #[arg(long, requires = "query")]
    start_year: Option<i32>,

    /// Reference URL a series must carry (without --comicvine-id)
    #[arg(long, requires = "query")]
    external_url: Option<String>,

    /// Skip the search for files not linked to an edition
    #[arg(long)]
    no_unsorted: bool,

    /// Output format: json or markdown
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    /// Look up direct download links on the configured mirror
    #[arg(long)]
    mirror_links: bool,

    /// Validate config and show the query without contacting the catalog
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_issue(text: &str) -> Result<IssueNumber, String> {
    text.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.comicvine_id.is_none() && cli.query.is_none() && cli.series_ids.is_empty() {
        bail!("One of --comicvine-id, --query or --series-id is required");
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli);
        return Ok(ExitCode::SUCCESS);
    }

    handle_search(config, cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("libgen_comics=info,warn"),
            1 => EnvFilter::new("libgen_comics=debug,info"),
            2 => EnvFilter::new("libgen_comics=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be searched
fn handle_dry_run(config: &Config, cli: &Cli) {
    println!("=== libgen-comics Dry Run ===\n");

    println!("Catalog:");
    println!("  Site: {}", config.catalog.site_url);
    println!("  Page size: {}", config.catalog.page_size);
    println!("  Search unsorted: {}", config.catalog.search_unsorted && !cli.no_unsorted);
    if let Some(mirror) = &config.catalog.mirror_url {
        println!("  Mirror: {}", mirror);
    }

    println!("\nFetcher:");
    println!("  Fallback chunk size: {}", config.fetcher.fallback_chunk_size);
    match config.fetcher.max_rounds {
        Some(rounds) => println!("  Max rounds: {}", rounds),
        None => println!("  Max rounds: unbounded"),
    }
    match &config.solver {
        Some(solver) => println!("  Challenge solver: {}", solver.url),
        None => println!("  Challenge solver: none"),
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nQuery:");
    if let Some(id) = cli.comicvine_id {
        println!("  Metadata volume id: {}", id);
        println!("  Metadata API: {}", config.metadata.api_url);
    }
    if let Some(query) = &cli.query {
        println!("  Text: {}", query);
    }
    if !cli.series_ids.is_empty() {
        println!("  Series ids: {:?}", cli.series_ids);
    }
    if let Some(issue) = &cli.issue {
        println!("  Issue: {}", issue);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main search operation
async fn handle_search(config: Config, cli: Cli) -> anyhow::Result<ExitCode> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding requests");
            let _ = cancel_tx.send(true);
        }
    });

    let solver: Option<Arc<dyn ChallengeSolver>> = match &config.solver {
        Some(solver_config) => Some(Arc::new(
            FlareSolverr::new(solver_config).context("Failed to build challenge solver client")?,
        )),
        None => None,
    };

    let mut fetcher = Fetcher::new(config.fetcher.clone(), config.user_agent.clone())
        .with_cancellation(cancel_rx);
    if let Some(solver) = &solver {
        fetcher = fetcher.with_solver(Arc::clone(solver));
    }
    tracing::info!("Fetching in chunks of up to {} requests", fetcher.chunk_size());

    let resolver = CatalogResolver::new(&config.catalog, fetcher);
    let search_unsorted = config.catalog.search_unsorted && !cli.no_unsorted;

    let (label, outcome) = match cli.comicvine_id {
        Some(id) => {
            let api_key = read_api_key(&config.metadata)?;
            let http = build_http_client(&config.user_agent, &config.fetcher)?;
            let provider = ComicVineClient::new(http, config.metadata.api_url.clone(), api_key);

            let request = SearchRequest {
                external_id: id,
                series_ids: cli.series_ids.clone(),
                issue_number: cli.issue,
                search_unsorted,
                query: cli.query.clone(),
            };
            let label = cli.query.clone().unwrap_or_else(|| format!("volume {}", id));
            (label, search_external_id(&provider, &resolver, &request).await)
        }
        None => {
            let query = SeriesQuery {
                query: cli.query.clone().unwrap_or_default(),
                start_year: cli.start_year,
                external_url: cli.external_url.clone().unwrap_or_default(),
                series_ids: cli.series_ids.clone(),
                issue_number: cli.issue,
                search_unsorted,
            };
            let label = if query.query.is_empty() {
                format!("series {:?}", query.series_ids)
            } else {
                query.query.clone()
            };
            (label, resolver.resolve(&query).await)
        }
    };

    let files = match outcome {
        Ok(files) => files,
        Err(e) if e.is_not_found() => {
            tracing::warn!("{}", e);
            eprintln!("No matching series for '{}'", label);
            return Ok(ExitCode::from(2));
        }
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            return Err(e.into());
        }
    };

    if cli.mirror_links {
        report_mirror_links(&config, solver.as_deref(), &files).await?;
    }

    let rendered = match cli.format {
        OutputFormat::Json => format_json(&files)?,
        OutputFormat::Markdown => format_markdown(&label, &files),
    };
    println!("{}", rendered);

    Ok(ExitCode::SUCCESS)
}

/// Handles --mirror-links: writes the mirror link of every file to stderr
async fn report_mirror_links(
    config: &Config,
    solver: Option<&dyn ChallengeSolver>,
    files: &[ResultFile],
) -> anyhow::Result<()> {
    let Some(mirror_url) = config.catalog.mirror_url.as_deref() else {
        bail!("--mirror-links needs catalog.mirror-url in the configuration");
    };
    let Some(solver) = solver else {
        bail!("--mirror-links needs a [solver] section in the configuration");
    };

    for file in files {
        let Some(md5) = file.details().and_then(|d| d.md5.as_deref()) else {
            continue;
        };
        match mirror_download_link(solver, mirror_url, md5, MIRROR_PARTNER).await {
            Ok(Some(link)) => eprintln!("{}: {}", md5, link),
            Ok(None) => tracing::warn!("Mirror has no download link for {}", md5),
            Err(e) => tracing::warn!("Mirror lookup for {} failed: {}", md5, e),
        }
    }

    Ok(())
}
