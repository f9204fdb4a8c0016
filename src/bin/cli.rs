//! revisit CLI
//!
//! Inspection and validation commands over per-site crawl-state directories.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revisit::{
    error::Result,
    models::Config,
    state::{CrawlState, LocalSnapshots, snapshot},
    utils::SiteRules,
};

/// revisit - crawl-state snapshot inspector
#[derive(Parser, Debug)]
#[command(name = "revisit", version, about = "Incremental crawl-state inspector")]
struct Cli {
    /// Path to the per-site state directory
    #[arg(short, long, default_value = "state")]
    site_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the latest run's crawl state for the site
    Info,

    /// Validate a configuration file
    Validate {
        /// Path to config.toml
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Info => {
            let snapshots = LocalSnapshots::new(&cli.site_dir);

            match snapshot::read_pointer(&snapshots).await? {
                Some(run_id) => println!("Latest run: {run_id}"),
                None => {
                    println!(
                        "No completed run under {}",
                        cli.site_dir.display()
                    );
                    return Ok(());
                }
            }

            let state = CrawlState::load(&snapshots).await;
            println!("Blacklist: {} urls", state.blacklist().len());

            println!("Scraped keys: {}", state.scraped().len());
            for (key, urls) in state.scraped() {
                println!("  {key}: {} urls (pivot: {})",
                    urls.len(),
                    urls.pivot().unwrap_or("none")
                );
            }

            println!("Expired keys: {}", state.expired().len());
            for (key, urls) in state.expired() {
                println!("  {key}: {} urls", urls.len());
            }
        }

        Command::Validate { config } => {
            let config = Config::load(&config)?;
            config.validate()?;
            SiteRules::compile(&config.sites)?;

            log::info!(
                "Configuration OK: {} site pattern(s), trim bound {}",
                config.sites.len(),
                config.state.max_urls_per_key
            );
            println!("Configuration OK");
        }
    }

    Ok(())
}
