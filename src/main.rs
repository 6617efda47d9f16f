use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use commodities_etl::analysis::{format_report, summarize, ReportFilter};
use commodities_etl::api::YahooClient;
use commodities_etl::database;
use commodities_etl::models::{Config, FailurePolicy, Symbol};
use commodities_etl::{BatchLoader, IngestionPipeline};

/// Fetch commodity price series and replace the commodities table.
///
/// With no subcommand the ingestion pipeline runs once and exits.
#[derive(Parser)]
#[command(name = "commodities-etl", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every symbol and replace the destination table
    Run {
        /// Comma separated symbols, overriding COMMODITY_SYMBOLS
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<Symbol>,
        /// Skip symbols that fail to fetch instead of aborting
        #[arg(long)]
        skip_failed: bool,
    },
    /// Summarize closing prices stored in the destination table
    Report {
        #[arg(long)]
        symbol: Option<Symbol>,
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    commodities_etl::init_logging();
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            eprintln!("❌ Configuration Error: {:#}", e);
            eprintln!(
                "Set DB_HOST, DB_NAME, DB_USER and DB_PASS (or SQLITE_PATH), e.g. in a .env file."
            );
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Command::Run { symbols: Vec::new(), skip_failed: false });
    let result = match command {
        Command::Run { symbols, skip_failed } => run_ingestion(&config, symbols, skip_failed).await,
        Command::Report { symbol, from, to } => {
            print_report(&config, ReportFilter { symbol, from, to }).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run_ingestion(config: &Config, symbols: Vec<Symbol>, skip_failed: bool) -> Result<()> {
    let symbols = if symbols.is_empty() { config.symbols.clone() } else { symbols };

    let mut settings = config.pipeline.clone();
    if skip_failed {
        settings.failure_policy = FailurePolicy::SkipFailed;
    }

    let sink = database::connect(&config.sink).await?;
    let loader = BatchLoader::new(sink, &config.schema)?;
    let target = loader.target().clone();
    let provider = Arc::new(YahooClient::new(&config.provider)?);

    let pipeline = IngestionPipeline::new(provider, loader, settings);
    match pipeline.run(&symbols).await {
        Ok(written) => {
            println!("✅ Loaded {} rows for {} symbols into {}", written, symbols.len(), target);
            Ok(())
        }
        Err(e) => {
            error!(
                stage = e.stage(),
                symbol = e.symbol().unwrap_or("-"),
                "Ingestion failed: {}",
                e
            );
            Err(e.into())
        }
    }
}

async fn print_report(config: &Config, filter: ReportFilter) -> Result<()> {
    let sink = database::connect(&config.sink).await?;
    let loader = BatchLoader::new(sink, &config.schema)?;

    let rows = loader.read_back().await?;
    info!("📊 Read {} rows from {}", rows.len(), loader.target());

    let summaries = summarize(&rows, &filter);
    if summaries.is_empty() {
        println!("No rows match the requested filter.");
    } else {
        print!("{}", format_report(&summaries));
    }
    Ok(())
}
