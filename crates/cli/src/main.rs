//! textweb entry point.
//!
//! Fetches a page (or a search engine results page) over the hand-rolled
//! HTTP client and prints its readable text. Logging goes to stderr so stdout
//! carries only page content.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use textweb_client::{
    DEFAULT_RESULT_LIMIT, FetchClient, FetchConfig, FetchOutcome, extract_text_blocks, parse_search_results,
    search_url,
};
use textweb_core::{AppConfig, Error, ResponseCache};
use tracing_subscriber::EnvFilter;
use url::Url;

mod output;

/// A simple HTTP client that displays human-readable content.
#[derive(Debug, Parser)]
#[command(name = "textweb", version)]
struct Args {
    /// URL to fetch and display content
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Search term to query a search engine and display top results
    #[arg(short, long, value_name = "TERM")]
    search: Option<String>,

    /// Neither read nor write the cache file
    #[arg(long)]
    no_cache: bool,

    /// Maximum number of redirects to follow
    #[arg(long, value_name = "N")]
    max_redirects: Option<u32>,

    /// Accept any TLS certificate
    #[arg(long, conflicts_with = "verify_tls")]
    insecure: bool,

    /// Verify TLS certificates against the bundled root store
    #[arg(long)]
    verify_tls: bool,

    /// Write logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Apply command-line overrides on top of loaded configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(max_redirects) = self.max_redirects {
            config.max_redirects = max_redirects;
        }
        if self.insecure {
            config.accept_invalid_certs = true;
        }
        if self.verify_tls {
            config.accept_invalid_certs = false;
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if args.url.is_none() && args.search.is_none() {
        Args::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = AppConfig::load().context("failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let cache = if args.no_cache {
        ResponseCache::in_memory()
    } else {
        ResponseCache::load(&config.cache_path).await
    };
    let client = FetchClient::new(FetchConfig::from(&config), cache)?;

    let (label, result) = match (&args.url, &args.search) {
        (Some(url), _) => ("Error fetching URL:", show_page(&client, url).await),
        (None, Some(term)) => (
            "Error fetching search results:",
            show_search(&client, &config.search_url, term).await,
        ),
        (None, None) => return Ok(ExitCode::SUCCESS),
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::debug!(code = err.code(), "command failed");
            eprintln!("{} {}", label.red(), err.to_string().red());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_page(client: &FetchClient, url: &str) -> Result<(), Error> {
    let outcome = client.fetch(url).await?;
    log_outcome(&outcome);

    let blocks = extract_text_blocks(&outcome.response.body);
    println!("{}", output::render_page(&blocks));
    Ok(())
}

async fn show_search(client: &FetchClient, search_base: &str, term: &str) -> Result<(), Error> {
    let query = search_url(search_base, term)?;
    let outcome = client.fetch(&query).await?;
    log_outcome(&outcome);

    let page_url = Url::parse(&outcome.final_url).ok();
    let hits = parse_search_results(&outcome.response.body, page_url.as_ref(), DEFAULT_RESULT_LIMIT);
    println!("{}", output::render_search(&hits));
    Ok(())
}

fn log_outcome(outcome: &FetchOutcome) {
    tracing::info!(
        url = %outcome.url,
        final_url = %outcome.final_url,
        status = outcome.response.status_code,
        from_cache = outcome.from_cache,
        redirects = outcome.redirects_followed,
        fetch_ms = outcome.fetch_ms,
        "fetched"
    );

    if let Some(err) = &outcome.cache_error {
        tracing::warn!(url = %outcome.url, code = err.code(), error = %err, "response not saved to cache");
    }
}
