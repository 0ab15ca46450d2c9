use async_trait::async_trait;

use crate::{AnalysisError, FundamentalSnapshot, SourceReading};

/// One named sentiment provider. Implementations are thin adapters over a
/// wire API or model service; they return a raw reading and leave
/// normalization to the collector.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Stable key used as the source's slot in reports (e.g. "finnhub_insider").
    fn id(&self) -> &'static str;

    /// Human-readable provider label.
    fn provider(&self) -> &'static str;

    async fn reading(&self, symbol: &str) -> Result<SourceReading, AnalysisError>;
}

/// Provider of fundamental ratios for one ticker.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, AnalysisError>;
}

/// Provider of the current price for one ticker. A price of 0 means
/// "unknown" and must never be negative.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn current_price(&self, symbol: &str) -> Result<f64, AnalysisError>;
}
