use std::time::Duration;

use analyzer_core::{
    AnalysisError, QuoteProvider, RawSignal, SentimentSource, SourceReading,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage reports numeric fields as JSON strings; parse leniently and
/// drop what does not parse.
fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickerSentiment {
    pub ticker: String,
    #[serde(default)]
    pub ticker_sentiment_score: String,
    #[serde(default)]
    pub relevance_score: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsSentimentFeed {
    #[serde(default)]
    pub feed: Vec<FeedArticle>,
    /// Present when the daily request quota is exhausted.
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote", default)]
    quote: Option<GlobalQuoteFields>,
}

#[derive(Debug, Clone, Deserialize)]
struct GlobalQuoteFields {
    #[serde(rename = "05. price", default)]
    price: String,
}

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    client: Client,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        query: &[(&str, String)],
    ) -> Result<T, AnalysisError> {
        let response = self
            .client
            .get(BASE_URL)
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Alpha Vantage HTTP {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }

    /// NEWS_SENTIMENT feed for one ticker. The free tier allows only 25
    /// requests per day, so callers should treat failures as routine.
    pub async fn get_news_sentiment(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<NewsSentimentFeed, AnalysisError> {
        let feed: NewsSentimentFeed = self
            .get_json(&[
                ("function", "NEWS_SENTIMENT".to_string()),
                ("tickers", symbol.to_string()),
                ("sort", "LATEST".to_string()),
                ("limit", limit.to_string()),
            ])
            .await?;

        if let Some(note) = &feed.note {
            return Err(AnalysisError::SourceUnavailable(format!(
                "Alpha Vantage quota: {}",
                note
            )));
        }
        Ok(feed)
    }

    /// GLOBAL_QUOTE price, or an error when the payload is empty or
    /// unparseable.
    pub async fn get_global_quote(&self, symbol: &str) -> Result<f64, AnalysisError> {
        let envelope: GlobalQuoteEnvelope = self
            .get_json(&[
                ("function", "GLOBAL_QUOTE".to_string()),
                ("symbol", symbol.to_string()),
            ])
            .await?;

        envelope
            .quote
            .as_ref()
            .and_then(|q| parse_f64(&q.price))
            .ok_or_else(|| {
                AnalysisError::InsufficientData(format!("No quote returned for {}", symbol))
            })
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn current_price(&self, symbol: &str) -> Result<f64, AnalysisError> {
        self.get_global_quote(symbol).await
    }
}

/// News-sentiment source: averages the per-ticker bipolar scores (and their
/// relevance weights) across every feed entry mentioning the symbol.
pub struct NewsSentimentSource {
    client: AlphaVantageClient,
    limit: u32,
}

impl NewsSentimentSource {
    pub fn new(client: AlphaVantageClient) -> Self {
        Self { client, limit: 50 }
    }
}

/// Extract the (score, relevance) pairs for `symbol` from a feed.
fn ticker_scores(feed: &NewsSentimentFeed, symbol: &str) -> Vec<(f64, f64)> {
    feed.feed
        .iter()
        .flat_map(|article| article.ticker_sentiment.iter())
        .filter(|ts| ts.ticker.eq_ignore_ascii_case(symbol))
        .filter_map(|ts| {
            let score = parse_f64(&ts.ticker_sentiment_score)?;
            let relevance = parse_f64(&ts.relevance_score).unwrap_or(0.0);
            Some((score, relevance))
        })
        .collect()
}

#[async_trait]
impl SentimentSource for NewsSentimentSource {
    fn id(&self) -> &'static str {
        "alphavantage"
    }

    fn provider(&self) -> &'static str {
        "Alpha Vantage News Sentiment"
    }

    async fn reading(&self, symbol: &str) -> Result<SourceReading, AnalysisError> {
        let feed = self.client.get_news_sentiment(symbol, self.limit).await?;
        let scores = ticker_scores(&feed, symbol);

        if scores.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "No ticker sentiment entries for {}",
                symbol
            )));
        }

        let n = scores.len() as f64;
        let avg_score = scores.iter().map(|(s, _)| s).sum::<f64>() / n;
        let avg_relevance = scores.iter().map(|(_, r)| r).sum::<f64>() / n;
        tracing::debug!(
            "Alpha Vantage sentiment for {}: {:.3} over {} scores",
            symbol,
            avg_score,
            scores.len()
        );

        Ok(SourceReading {
            raw: RawSignal::Bipolar { score: avg_score },
            confidence: None,
            relevance: Some(avg_relevance),
            articles_analyzed: scores.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_json() -> NewsSentimentFeed {
        serde_json::from_value(serde_json::json!({
            "feed": [
                {
                    "title": "Chip maker beats estimates",
                    "ticker_sentiment": [
                        {"ticker": "NVDA", "ticker_sentiment_score": "0.4", "relevance_score": "0.9"},
                        {"ticker": "AMD", "ticker_sentiment_score": "0.1", "relevance_score": "0.3"}
                    ]
                },
                {
                    "title": "Sector wobbles",
                    "ticker_sentiment": [
                        {"ticker": "NVDA", "ticker_sentiment_score": "-0.2", "relevance_score": "0.5"}
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn only_matching_ticker_entries_count() {
        let scores = ticker_scores(&feed_json(), "NVDA");
        assert_eq!(scores.len(), 2);
        let avg: f64 = scores.iter().map(|(s, _)| s).sum::<f64>() / 2.0;
        assert!((avg - 0.1).abs() < 1e-9);
    }

    #[test]
    fn unparseable_scores_are_dropped() {
        let feed: NewsSentimentFeed = serde_json::from_value(serde_json::json!({
            "feed": [{
                "title": "x",
                "ticker_sentiment": [
                    {"ticker": "NVDA", "ticker_sentiment_score": "n/a", "relevance_score": "0.5"}
                ]
            }]
        }))
        .unwrap();
        assert!(ticker_scores(&feed, "NVDA").is_empty());
    }
}
