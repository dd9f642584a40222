//! # Crypto Converter Application
//!
//! Binary that wires together all the components. It runs in one of two roles:
//! - `api`: serve conversions over HTTP
//! - `ingest`: poll the price feed and maintain the quote store

mod config;
mod telemetry;

use clap::{Parser, Subcommand};

use converter_feed::BinanceFeed;
use converter_hex::{
    ConversionService, QuoteIngester,
    inbound::HttpServer,
    shutdown::{cancel_on_signal, shutdown_signal},
};
use converter_repo::build_repo;
use converter_types::QuoteRepository;

use config::Config;
use telemetry::LogFormat;

#[derive(Parser)]
#[command(name = "converter", version, about = "Crypto currency conversion service")]
struct Cli {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP conversion API
    Api,
    /// Run the quote consumer
    Ingest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let otel_provider = telemetry::init(cli.log_format)?;

    let result = match Config::from_env() {
        Ok(config) => match cli.command {
            Command::Api => run_api(&config).await,
            Command::Ingest => run_ingest(&config).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        tracing::error!("Exiting with error: {:#}", e);
    }

    // Ensure traces are flushed before exit
    telemetry::shutdown(otel_provider);
    result
}

async fn run_api(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting conversion API on {}", config.bind_addr());
    tracing::info!("Using database: {}", config.database_url);

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    let service = ConversionService::with_config(repo, config.resolver_config());
    let server = HttpServer::new(service);

    let result = server.run(&config.bind_addr(), shutdown_signal()).await;

    server.service().repo().close().await;
    tracing::info!("Conversion API stopped");
    result
}

async fn run_ingest(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting quote consumer against {}", config.binance_rest_url);
    tracing::info!("Using database: {}", config.database_url);

    let repo = build_repo(&config.database_url).await?;
    let feed = BinanceFeed::new(&config.binance_rest_url, config.feed_timeout)?;
    let ingester = QuoteIngester::new(repo, feed, config.ingest_config());

    ingester.run(cancel_on_signal()).await;

    ingester.repo().close().await;
    Ok(())
}
