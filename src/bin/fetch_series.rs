use anyhow::Result;
use clap::Parser;
use tracing::info;

use commodities_etl::api::{MarketDataProvider, YahooClient};
use commodities_etl::models::{Config, Interval, Period, Symbol};

/// Print one symbol's series without touching the sink
#[derive(Parser)]
struct Args {
    symbol: Symbol,
    #[arg(long, default_value = "1y")]
    period: Period,
    #[arg(long, default_value = "1d")]
    interval: Interval,
}

#[tokio::main]
async fn main() -> Result<()> {
    commodities_etl::init_logging();
    let args = Args::parse();

    let client = YahooClient::new(&Config::provider_from_env()?)?;

    info!("📈 Fetching {} ({} / {})", args.symbol, args.period, args.interval);
    let series = client.fetch(&args.symbol, args.period, args.interval).await?;
    let observations = series.observations();

    println!("\n📊 {} closing prices:", args.symbol);
    println!("Date                | Close");
    println!("--------------------|-----------");

    let display_count = std::cmp::min(5, observations.len());
    for o in observations.iter().take(display_count) {
        println!("{} | ${:.2}", o.timestamp, o.close);
    }
    if observations.len() > display_count * 2 {
        println!("...                 | ...");
    }
    for o in observations.iter().skip(display_count.max(observations.len().saturating_sub(5))) {
        println!("{} | ${:.2}", o.timestamp, o.close);
    }

    if let (Some(first), Some(last)) = (observations.first(), observations.last()) {
        let max_price = observations.iter().map(|o| o.close).fold(f64::NEG_INFINITY, f64::max);
        let min_price = observations.iter().map(|o| o.close).fold(f64::INFINITY, f64::min);
        let total_return = (last.close - first.close) / first.close * 100.0;

        println!("\n📈 Statistics:");
        println!("First Price:    ${:.2}", first.close);
        println!("Last Price:     ${:.2}", last.close);
        println!("Total Return:   {:.1}%", total_return);
        println!("Highest Price:  ${:.2}", max_price);
        println!("Lowest Price:   ${:.2}", min_price);
        println!("Total Records:  {}", observations.len());
    }

    Ok(())
}
