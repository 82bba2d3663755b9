//! Silver Rates - silver quote scraper and rates API
//!
//! Polls the FENEGOSIDA rate board and serves the cached quote over /api/rates.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use silver_rates::adapters::api::{self, ApiState, RatesResponse};
use silver_rates::adapters::cli::{self, CliApp, Command, FetchCmd, ServeCmd, ShowCmd};
use silver_rates::adapters::source::{HttpSourceFetcher, SourceFetcherConfig};
use silver_rates::application::{PollerConfig, QuotePoller};
use silver_rates::config::{load_config_or_default, Config};
use silver_rates::domain::extractor::{ExtractorConfig, QuoteExtractor};
use silver_rates::domain::pricing::PricingPolicy;
use silver_rates::domain::snapshot_store::SnapshotStore;
use silver_rates::ports::SourcePort;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (PORT, SILVER_SOURCE_URL, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();

    let config = load_config_or_default(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;

    init_logging(&app, &config)?;

    match app.command {
        Command::Serve(cmd) => serve_command(cmd, config).await,
        Command::Fetch(cmd) => fetch_command(cmd, config).await,
        Command::Show(cmd) => show_command(cmd, config),
    }
}

fn init_logging(app: &CliApp, config: &Config) -> Result<()> {
    let filter = if app.debug {
        EnvFilter::new("debug")
    } else if app.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{},tower_http=info", config.logging.level))
        })
    };

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

fn build_extractor(config: &Config) -> Result<QuoteExtractor> {
    QuoteExtractor::new(&ExtractorConfig::from(config)).context("Invalid source label pattern")
}

fn store_path(config: &Config, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override.unwrap_or_else(|| config.store.resolved_path())
}

async fn serve_command(cmd: ServeCmd, config: Config) -> Result<()> {
    tracing::info!("Starting silver rates service...");

    // Build components
    let store = Arc::new(SnapshotStore::open(store_path(&config, cmd.store)));
    let fetcher = HttpSourceFetcher::new(SourceFetcherConfig::from(&config))
        .context("Failed to create source fetcher")?;
    let extractor = build_extractor(&config)?;

    tracing::info!("Scraping {} every {}s", fetcher.url(), config.polling.steady_interval_secs);

    let poller = QuotePoller::new(
        Arc::new(fetcher),
        Arc::new(extractor),
        Arc::clone(&store),
        PollerConfig::from(&config),
    );

    let state = ApiState::new(store, PricingPolicy::from(&config), config.source.name.clone());

    let port = cmd.port.unwrap_or_else(|| config.server.get_port());
    let addr = config.server.bind_addr(port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Background scraper loop
    let poller_task = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.run().await })
    };

    // Ctrl+C stops the poller and drains the server
    let shutdown = {
        let poller = poller.clone();
        async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
            poller.stop().await;
        }
    };

    api::serve(listener, state, shutdown).await.context("Rates API failed")?;

    poller_task.await.context("Poller task panicked")?;
    tracing::info!("Silver rates service stopped");
    Ok(())
}

async fn fetch_command(cmd: FetchCmd, config: Config) -> Result<()> {
    let mut fetcher_config = SourceFetcherConfig::from(&config);
    if let Some(url) = cmd.url {
        fetcher_config.url = url;
    }

    let fetcher = HttpSourceFetcher::new(fetcher_config)?;
    let extractor = build_extractor(&config)?;

    let markup = fetcher
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch {}", fetcher.url()))?;
    let snapshot = extractor.extract(&markup).context("Failed to extract quotes")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("Source:        {}", fetcher.url());
        println!("Per 1 tola:    {:.2}", snapshot.per_tola);
        println!("Per 10 grams:  {:.2}", snapshot.per_ten_gram);
    }

    Ok(())
}

fn show_command(cmd: ShowCmd, config: Config) -> Result<()> {
    let path = store_path(&config, cmd.store);
    let store = SnapshotStore::open(&path);
    let snapshot = store.current();

    let rates = RatesResponse::from_snapshot(&snapshot, &PricingPolicy::from(&config), &config.source.name);
    let age = snapshot.age(chrono::Utc::now());

    println!("Store:      {}", path.display());
    println!("Provenance: {:?}", snapshot.provenance);
    println!("Observed:   {} ({} min ago)", snapshot.observed_at.to_rfc3339(), age.num_minutes());
    println!("{}", serde_json::to_string_pretty(&rates)?);

    Ok(())
}
