use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use analyzer_core::{
    AnalysisError, FundamentalSnapshot, FundamentalsProvider, QuoteProvider, RawSignal,
    SentimentSource, SourceReading,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Months of insider sentiment history averaged into one MSPR reading.
const INSIDER_MONTHS: usize = 3;

/// Sliding-window rate limiter: at most `max_requests` per `window`.
/// Finnhub's free tier allows 60 calls/min, which is the practical
/// bottleneck when analyzing several tickers back to back.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while ts.front().is_some_and(|&t| now.duration_since(t) >= self.window) {
                ts.pop_front();
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let Some(&oldest) = ts.front() else { continue };
            let wait = self.window.saturating_sub(now.duration_since(oldest))
                + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for a Finnhub slot", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResponse {
    /// Current price.
    pub c: f64,
    /// Previous close.
    #[serde(default)]
    pub pc: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct BasicFinancialsResponse {
    #[serde(default)]
    metric: MetricFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MetricFields {
    #[serde(rename = "peBasicExclExtraTTM")]
    pe_ratio: Option<f64>,
    #[serde(rename = "roeTTM")]
    roe: Option<f64>,
    #[serde(rename = "netProfitMarginTTM")]
    profit_margin: Option<f64>,
    #[serde(rename = "epsGrowthTTMYoy")]
    eps_growth: Option<f64>,
    #[serde(rename = "revenueGrowthTTMYoy")]
    revenue_growth: Option<f64>,
    #[serde(rename = "totalDebt/totalEquityQuarterly")]
    debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsHeadline {
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    /// Unix seconds.
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsiderSentimentEntry {
    pub year: i32,
    pub month: u32,
    /// Net share change for the month.
    #[serde(default)]
    pub change: f64,
    /// Monthly share purchase ratio.
    #[serde(default)]
    pub mspr: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct InsiderSentimentResponse {
    #[serde(default)]
    data: Vec<InsiderSentimentEntry>,
}

#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        // Free tier is 60 req/min; paid plans can raise FINNHUB_RATE_LIMIT.
        let rate_limit: usize = std::env::var("FINNHUB_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AnalysisError> {
        let url = format!("{}/{}", BASE_URL, path);

        // One retry on 429: the local limiter keeps us under the documented
        // quota, but Finnhub also throttles bursts across connections.
        for attempt in 0..2 {
            self.rate_limiter.acquire().await;

            let response = self
                .client
                .get(&url)
                .query(query)
                .query(&[("token", self.api_key.as_str())])
                .send()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() == 429 {
                if attempt == 0 {
                    tracing::warn!("Finnhub returned 429 for {}, retrying", path);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    continue;
                }
                return Err(AnalysisError::ApiError(
                    "Rate limited by Finnhub".to_string(),
                ));
            }
            if !response.status().is_success() {
                return Err(AnalysisError::ApiError(format!(
                    "Finnhub HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                )));
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()));
        }

        Err(AnalysisError::ApiError(
            "Rate limited by Finnhub".to_string(),
        ))
    }

    /// Real-time quote. Finnhub reports 0 for unknown symbols, which callers
    /// treat as "price unknown".
    pub async fn get_quote(&self, symbol: &str) -> Result<QuoteResponse, AnalysisError> {
        self.get_json("quote", &[("symbol", symbol.to_string())]).await
    }

    /// Basic financials (`metric=all`), mapped onto the snapshot fields the
    /// graders consume. Anything Finnhub omits stays `None`.
    pub async fn get_basic_financials(
        &self,
        symbol: &str,
    ) -> Result<FundamentalSnapshot, AnalysisError> {
        let response: BasicFinancialsResponse = self
            .get_json(
                "stock/metric",
                &[("symbol", symbol.to_string()), ("metric", "all".to_string())],
            )
            .await?;

        let m = response.metric;
        Ok(FundamentalSnapshot {
            pe_ratio: m.pe_ratio,
            roe: m.roe,
            profit_margin: m.profit_margin,
            eps_growth: m.eps_growth,
            revenue_growth: m.revenue_growth,
            debt_to_equity: m.debt_to_equity,
        })
    }

    /// Company news between two dates (YYYY-MM-DD).
    pub async fn get_company_news(
        &self,
        symbol: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<NewsHeadline>, AnalysisError> {
        self.get_json(
            "company-news",
            &[
                ("symbol", symbol.to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ],
        )
        .await
    }

    /// Monthly insider sentiment entries between two dates (YYYY-MM-DD).
    pub async fn get_insider_sentiment(
        &self,
        symbol: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<InsiderSentimentEntry>, AnalysisError> {
        let response: InsiderSentimentResponse = self
            .get_json(
                "stock/insider-sentiment",
                &[
                    ("symbol", symbol.to_string()),
                    ("from", from.to_string()),
                    ("to", to.to_string()),
                ],
            )
            .await?;
        Ok(response.data)
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn current_price(&self, symbol: &str) -> Result<f64, AnalysisError> {
        let quote = self.get_quote(symbol).await?;
        Ok(quote.c)
    }
}

#[async_trait]
impl FundamentalsProvider for FinnhubClient {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, AnalysisError> {
        self.get_basic_financials(symbol).await
    }
}

/// Insider-trading sentiment source: averages MSPR over the last few monthly
/// entries. MSPR > 0 reads bullish, < 0 bearish.
pub struct InsiderSentimentSource {
    client: FinnhubClient,
}

impl InsiderSentimentSource {
    pub fn new(client: FinnhubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SentimentSource for InsiderSentimentSource {
    fn id(&self) -> &'static str {
        "finnhub_insider"
    }

    fn provider(&self) -> &'static str {
        "Finnhub Insider Trading Sentiment"
    }

    async fn reading(&self, symbol: &str) -> Result<SourceReading, AnalysisError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(90);

        let entries = self
            .client
            .get_insider_sentiment(
                symbol,
                &from.format("%Y-%m-%d").to_string(),
                &to.format("%Y-%m-%d").to_string(),
            )
            .await?;

        let recent = &entries[..entries.len().min(INSIDER_MONTHS)];
        if recent.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "No insider sentiment entries for {}",
                symbol
            )));
        }

        let mspr = recent.iter().map(|e| e.mspr).sum::<f64>() / recent.len() as f64;
        let net_change: f64 = recent.iter().map(|e| e.change).sum();
        tracing::debug!(
            "Insider sentiment for {}: mspr {:.3} over {} months (net change {:.0})",
            symbol,
            mspr,
            recent.len(),
            net_change
        );

        Ok(SourceReading {
            raw: RawSignal::InsiderRatio { mspr },
            confidence: None,
            relevance: None,
            articles_analyzed: recent.len() as u32,
        })
    }
}
