use std::time::Duration;

use analyzer_core::{
    AnalysisError, RawSignal, SentimentCategory, SentimentSource, SourceReading,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use finnhub_client::FinnhubClient;
use serde::{Deserialize, Serialize};

/// Days of company news fed into one classification request.
const NEWS_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
struct AnalyzeNewsRequest {
    headlines: Vec<String>,
    symbol: Option<String>,
}

/// Aggregate classification for a batch of headlines, as returned by the
/// FinBERT service.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsSentimentResponse {
    pub overall_sentiment: SentimentCategory,
    pub confidence: f64,
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    #[serde(default)]
    pub neutral_ratio: f64,
    pub article_count: u32,
}

/// HTTP client for an external FinBERT classification service. The model
/// itself lives behind the service; only its result shape is consumed here.
#[derive(Clone)]
pub struct FinbertClient {
    client: reqwest::Client,
    base_url: String,
}

impl FinbertClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, base_url }
    }

    /// Classify a batch of headlines as one aggregate sentiment.
    pub async fn analyze_news(
        &self,
        headlines: Vec<String>,
        symbol: Option<String>,
    ) -> Result<NewsSentimentResponse, AnalysisError> {
        let request = AnalyzeNewsRequest { headlines, symbol };

        let response = self
            .client
            .post(format!("{}/analyze-news", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::SourceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::SourceUnavailable(format!(
                "FinBERT service HTTP {}",
                response.status()
            )));
        }

        response
            .json::<NewsSentimentResponse>()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }
}

/// Ratio-based sentiment source: trailing company news from Finnhub,
/// classified by the FinBERT service into positive/negative/neutral ratios.
pub struct FinbertNewsSource {
    finbert: FinbertClient,
    news: FinnhubClient,
}

impl FinbertNewsSource {
    pub fn new(finbert: FinbertClient, news: FinnhubClient) -> Self {
        Self { finbert, news }
    }
}

#[async_trait]
impl SentimentSource for FinbertNewsSource {
    fn id(&self) -> &'static str {
        "finbert_finnhub"
    }

    fn provider(&self) -> &'static str {
        "FinBERT (AI) + Finnhub News"
    }

    async fn reading(&self, symbol: &str) -> Result<SourceReading, AnalysisError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(NEWS_WINDOW_DAYS);

        let news = self
            .news
            .get_company_news(
                symbol,
                &from.format("%Y-%m-%d").to_string(),
                &to.format("%Y-%m-%d").to_string(),
            )
            .await?;

        if news.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "No news articles for {} in the last {} days",
                symbol, NEWS_WINDOW_DAYS
            )));
        }

        let headlines: Vec<String> = news.iter().map(|a| a.headline.clone()).collect();
        let result = self
            .finbert
            .analyze_news(headlines, Some(symbol.to_string()))
            .await?;
        tracing::info!(
            "FinBERT classified {} articles for {}: {}",
            result.article_count,
            symbol,
            result.overall_sentiment
        );

        Ok(SourceReading {
            raw: RawSignal::Ratios {
                positive_ratio: result.positive_ratio,
                negative_ratio: result.negative_ratio,
                label: result.overall_sentiment,
            },
            confidence: Some(result.confidence),
            relevance: None,
            articles_analyzed: result.article_count,
        })
    }
}
