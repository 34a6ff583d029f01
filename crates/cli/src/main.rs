// ABOUTME: CLI for the socd product catalog.
// ABOUTME: Prints a feed as a JSON tree or the cheapest product matching a search term.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;
use serde_json::{json, Value};
use socd_catalog::{
    load_or_default, AppSettings, Catalog, CatalogError, FetchOptions, FileSettings,
    SettingsProvider, StaticSettings,
};

/// Query XML product feeds.
#[derive(Parser, Debug)]
#[command(name = "socd-catalog")]
#[command(about = "Read product feeds and find the cheapest matching item", long_about = None)]
struct Args {
    /// JSON settings file (feedSourceUrls, cacheEnabled, cacheTtlSeconds, allowedOrigins).
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Feed URL; repeat for a failover chain. Replaces the URLs from --settings.
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Disable the feed cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Cache time-to-live in seconds; fractions allowed.
    #[arg(long)]
    ttl: Option<f64>,

    /// Per-attempt HTTP timeout in seconds.
    #[arg(long, default_value_t = 4)]
    timeout: u64,

    /// Extra attempts per URL after a failure.
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole feed as a JSON tree.
    Feed,
    /// Print the cheapest product whose title contains QUERY.
    Cheapest {
        /// Search term, matched case and accent insensitively.
        query: String,
    },
}

impl Args {
    fn app_settings(&self) -> AppSettings {
        let provider: Box<dyn SettingsProvider> = match &self.settings {
            Some(path) => Box::new(FileSettings::new(path)),
            None => Box::new(StaticSettings::default()),
        };
        let mut settings = load_or_default(provider.as_ref());
        if !self.urls.is_empty() {
            settings.feed_source_urls = self.urls.clone();
        }
        if self.no_cache {
            settings.cache_enabled = false;
        }
        if let Some(ttl) = self.ttl {
            settings.cache_ttl_seconds = ttl;
        }
        settings
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.timeout),
            retries: self.retries,
            ..Default::default()
        }
    }
}

/// HTTP-style status for an error, as a request layer would report it.
fn status_for(err: &CatalogError) -> u16 {
    match err {
        CatalogError::EmptyQuery | CatalogError::NoSourcesConfigured => 400,
        CatalogError::NotFound(_) => 404,
        CatalogError::FetchExhausted(_) => 502,
        CatalogError::Parse(_) => 500,
    }
}

fn error_body(err: &CatalogError) -> Value {
    let mut body = json!({ "error": err.to_string(), "status": status_for(err) });
    match err {
        CatalogError::NotFound(query) => body["query"] = json!(query),
        CatalogError::FetchExhausted(errors) => {
            body["sources"] = errors.iter().map(|e| json!(e.to_string())).collect();
        }
        _ => {}
    }
    body
}

async fn run(args: &Args) -> Result<std::result::Result<Value, Value>> {
    let settings = args.app_settings();
    debug!("settings: {:?}", settings);

    let catalog = Catalog::builder().fetch_options(args.fetch_options()).build()?;

    let outcome = match &args.command {
        Command::Feed => catalog
            .get_feed_as_tree(&settings)
            .await
            .map(|tree| serde_json::to_value(tree))
            .map_err(|e| error_body(&e)),
        Command::Cheapest { query } => catalog
            .find_cheapest_match(&settings, query)
            .await
            .map(|found| serde_json::to_value(found))
            .map_err(|e| error_body(&e)),
    };

    Ok(match outcome {
        Ok(value) => Ok(value?),
        Err(body) => Err(body),
    })
}

fn print(value: &Value, compact: bool) -> Result<()> {
    if compact {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let (body, ok) = match run(&args).await {
        Ok(Ok(value)) => (value, true),
        Ok(Err(body)) => (body, false),
        Err(err) => (json!({ "error": err.to_string() }), false),
    };

    if let Err(err) = print(&body, args.compact) {
        eprintln!("error writing output: {}", err);
        return ExitCode::from(1);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
