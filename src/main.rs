use std::{env, fs::File};

use anyhow::{Context, Result, bail};
use log::{error, info};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use sep2md::batch::{fetch_entry_urls, scrape_all};
use sep2md::cli::{CliArgs, Mode, Output, USAGE};
use sep2md::{Fetcher, ScraperConfig, panic_handler, scrape_article, validate_url};

/// How many failed entries a batch run lists before summarising the rest.
const FAILURES_SHOWN: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse(env::args().skip(1))?;
    init_logging(&args)?;
    panic_handler::initialize_panic_handler();

    let config = ScraperConfig::load_or_default(args.config.as_deref());
    let fetcher = Fetcher::new(config)?;

    match &args.mode {
        Mode::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Mode::Single { url } => run_single(&fetcher, url, &args.output).await,
        Mode::All => run_all(&fetcher, &args.output).await,
    }
}

// html5ever and hyper are chatty at debug level, keep them out of the log.
fn init_logging(args: &CliArgs) -> Result<()> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = simplelog::ConfigBuilder::new()
        .set_max_level(level)
        .add_filter_ignore_str("html5ever")
        .add_filter_ignore_str("hyper")
        .build();

    match &args.log_file {
        Some(path) => WriteLogger::init(
            level,
            config,
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )?,
        None => TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

async fn run_single(fetcher: &Fetcher, url: &str, output: &Output) -> Result<()> {
    validate_url(url, fetcher.config())?;
    info!("Scraping {url}");

    let markdown = scrape_article(fetcher, url)
        .await
        .inspect_err(|e| error!("Scraping {url} failed: {e}"))?;

    if let Some(path) = output.write(url, &markdown)? {
        eprintln!("Written to {}", path.display());
    }
    Ok(())
}

async fn run_all(fetcher: &Fetcher, output: &Output) -> Result<()> {
    let Output::Directory(dir) = output else {
        bail!("--all requires -d DIR");
    };

    eprintln!("Fetching list of all entries...");
    let urls = fetch_entry_urls(fetcher).await?;
    eprintln!("Found {} entries to scrape.", urls.len());

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let report = scrape_all(fetcher, &urls, dir, fetcher.config().concurrency).await;

    eprintln!("{}", report.summary());
    eprintln!("Output directory: {}", dir.display());

    let failed = report.failed();
    if failed > 0 {
        eprintln!("\nFailed entries ({failed}):");
        for (url, message) in report.failures().take(FAILURES_SHOWN) {
            eprintln!("  - {}: {message}", sep2md::batch::entry_name(url));
        }
        if failed > FAILURES_SHOWN {
            eprintln!("  ... and {} more", failed - FAILURES_SHOWN);
        }
    }
    Ok(())
}
