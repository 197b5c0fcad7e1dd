//! Flickr-Harvest main entry point
//!
//! This is the command-line interface for the Flickr-Harvest media lister.

use anyhow::{bail, Context};
use clap::Parser;
use flickr_harvest::config::{load_config_with_hash, Config};
use flickr_harvest::crawler::{harvest, preview};
use flickr_harvest::model::CrawlMode;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Flickr-Harvest: a paged media lister
///
/// Flickr-Harvest walks the photo or favourites listing of each configured
/// account, stores the media records in SQLite and exports their download
/// links to a text file.
#[derive(Parser, Debug)]
#[command(name = "flickr-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paged media lister for Flickr accounts", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Harvest this user instead of the configured ones (repeatable)
    #[arg(short, long = "user", value_name = "NAME")]
    users: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and look up the users without harvesting
    #[arg(long, conflicts_with_all = ["stats", "export_links"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_links"])]
    stats: bool,

    /// Append un-exported download links to the export file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_links: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }
    if cli.export_links {
        return handle_export_links(&config);
    }

    let users = if cli.users.is_empty() {
        config.crawler.users.clone()
    } else {
        cli.users.clone()
    };
    if users.is_empty() {
        bail!("No users to harvest: set crawler.users or pass --user");
    }

    if cli.dry_run {
        handle_dry_run(&config, &users).await
    } else {
        handle_harvest(config, &users).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("flickr_harvest=info,warn"),
            1 => EnvFilter::new("flickr_harvest=debug,info"),
            2 => EnvFilter::new("flickr_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: looks up every user and shows what would be fetched
async fn handle_dry_run(config: &Config, users: &[String]) -> anyhow::Result<()> {
    println!("=== Flickr-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Mode: {}", config.crawler.mode);
    println!("  Concurrency limit: {}", config.crawler.concurrency_limit);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Page size: {}", config.crawler.page_size);
    match config.crawler.max_page_attempts {
        Some(max) => println!("  Max attempts per page: {}", max),
        None => println!("  Max attempts per page: unbounded"),
    }

    println!("\nAPI:");
    println!("  Endpoint: {}", config.api.endpoint);
    println!("  Media base URL: {}", config.api.media_base_url);
    println!("  Cookie: {}", if config.api.cookie.is_some() { "set" } else { "none" });
    println!("  Extra headers: {}", config.api.headers.len());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export: {}", config.output.export_path);

    let mode = config.crawler.mode;

    println!("\nUsers ({}):", users.len());
    let mut pages = 0u64;
    for outcome in preview(config, users).await? {
        match outcome.result {
            Ok(profile) => {
                println!(
                    "  - {} ({}): {} photos in {} pages, {} favorites in {} pages",
                    profile.username,
                    profile.nsid,
                    profile.item_count(CrawlMode::Photos),
                    profile.page_count(CrawlMode::Photos),
                    profile.item_count(CrawlMode::Favorites),
                    profile.page_count(CrawlMode::Favorites)
                );
                pages += u64::from(profile.page_count(mode));
            }
            Err(e) => println!("  - {}: lookup failed: {}", outcome.user, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} {} pages", pages, mode);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use flickr_harvest::output::{load_statistics, print_statistics};
    use flickr_harvest::storage::open_store;

    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))
        .context("Failed to open the database")?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-links mode: appends new links to the export file
fn handle_export_links(config: &Config) -> anyhow::Result<()> {
    use flickr_harvest::output::export_links;
    use flickr_harvest::storage::open_store;

    println!("=== Exporting Download Links ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.export_path);
    println!();

    let mut store = open_store(Path::new(&config.output.database_path))
        .context("Failed to open the database")?;
    let written = export_links(&mut store, Path::new(&config.output.export_path))?;

    println!("✓ {} links exported to: {}", written, config.output.export_path);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, users: &[String]) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} listing of {} users ({} concurrent fetches)",
        config.crawler.mode,
        users.len(),
        config.crawler.concurrency_limit
    );

    let outcomes = harvest(config, users).await?;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "✓ {} ({}): {} pages, {} attempts, {} records ({} new)",
                outcome.user,
                report.user_id,
                report.total_pages,
                report.attempts,
                report.media_collected,
                report.media_inserted
            ),
            Err(e) => {
                failed += 1;
                println!("✗ {}: {}", outcome.user, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} sessions failed", failed, outcomes.len());
    }
    Ok(())
}
