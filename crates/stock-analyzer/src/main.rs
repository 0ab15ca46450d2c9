use std::str::FromStr;
use std::time::Duration;

use alphavantage_client::{AlphaVantageClient, NewsSentimentSource};
use analyzer_core::{Horizon, SentimentSource};
use anyhow::Context;
use finbert_client::{FinbertClient, FinbertNewsSource};
use finnhub_client::{FinnhubClient, InsiderSentimentSource};
use stock_analyzer::StockAnalyzer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let symbol = args
        .next()
        .context("usage: stock-analyzer <SYMBOL> [1W|1M|3M|6M|1Y]")?;
    let timeframe = match args.next() {
        Some(label) => Horizon::from_str(&label)?,
        None => Horizon::Month1,
    };

    let finnhub_key =
        std::env::var("FINNHUB_API_KEY").context("FINNHUB_API_KEY is not set")?;
    let alphavantage_key =
        std::env::var("ALPHAVANTAGE_API_KEY").context("ALPHAVANTAGE_API_KEY is not set")?;
    let finbert_url =
        std::env::var("FINBERT_URL").unwrap_or_else(|_| "http://localhost:8001".to_string());

    let finnhub = FinnhubClient::new(finnhub_key);
    let alphavantage = AlphaVantageClient::new(alphavantage_key);
    let finbert = FinbertClient::new(finbert_url, Duration::from_secs(10));

    let sources: Vec<Box<dyn SentimentSource>> = vec![
        Box::new(FinbertNewsSource::new(finbert, finnhub.clone())),
        Box::new(NewsSentimentSource::new(alphavantage)),
        Box::new(InsiderSentimentSource::new(finnhub.clone())),
    ];

    // Finnhub serves both quotes and fundamentals; Alpha Vantage's free quota
    // (25 requests/day) is reserved for its sentiment feed.
    let analyzer = StockAnalyzer::new(sources, Box::new(finnhub.clone()), Box::new(finnhub));

    let sentiment = analyzer.comprehensive_sentiment(&symbol).await?;
    println!("{}", serde_json::to_string_pretty(&sentiment)?);

    let outlook = analyzer.enhanced_scenarios(&symbol, timeframe).await?;
    println!("{}", serde_json::to_string_pretty(&outlook)?);

    let metrics = analyzer.detailed_metrics(&symbol).await?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}
