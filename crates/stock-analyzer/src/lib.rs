use analyzer_core::{
    AgreementMetrics, AnalysisError, ConsensusResult, FundamentalSnapshot, FundamentalsProvider,
    Horizon, QuoteProvider, SentimentSource, SourceMap,
};
use chrono::{DateTime, Utc};
use fundamental_grading::GradeReport;
use scenario_projection::ScenarioSet;
use sentiment_consensus::{collect_sources, compare_sources, derive_consensus};
use serde::Serialize;

/// Cross-source sentiment view for one ticker: every source's slot, the
/// agreement comparison, and the majority-vote consensus.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentReport {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub sources: SourceMap,
    pub comparison: AgreementMetrics,
    pub consensus: ConsensusResult,
}

/// Bull/base/bear projection plus the inputs it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutlook {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub timeframe: Horizon,
    pub sentiment_score: f64,
    pub eps_growth: f64,
    pub scenarios: ScenarioSet,
    /// Every sentiment source attempted, successful or not.
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub report: GradeReport,
}

/// Uppercase and validate a ticker. Rejecting here keeps garbage symbols
/// from producing plausible-looking neutral reports downstream.
fn validate_symbol(symbol: &str) -> Result<String, AnalysisError> {
    let normalized = symbol.trim().to_uppercase();
    let well_formed = !normalized.is_empty()
        && normalized.len() <= 12
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    if well_formed {
        Ok(normalized)
    } else {
        Err(AnalysisError::InvalidInput(format!(
            "Malformed ticker symbol '{}'",
            symbol
        )))
    }
}

/// Multi-source analyzer for one process. Holds no per-request state: each
/// call builds a fresh result from provider responses, so concurrent
/// analyses never share mutable data.
pub struct StockAnalyzer {
    sentiment_sources: Vec<Box<dyn SentimentSource>>,
    fundamentals: Box<dyn FundamentalsProvider>,
    quotes: Box<dyn QuoteProvider>,
}

impl StockAnalyzer {
    pub fn new(
        sentiment_sources: Vec<Box<dyn SentimentSource>>,
        fundamentals: Box<dyn FundamentalsProvider>,
        quotes: Box<dyn QuoteProvider>,
    ) -> Self {
        Self {
            sentiment_sources,
            fundamentals,
            quotes,
        }
    }

    /// Query every sentiment source and compare them. Individual source
    /// failures degrade to error slots; only a malformed symbol errors.
    pub async fn comprehensive_sentiment(
        &self,
        symbol: &str,
    ) -> Result<SentimentReport, AnalysisError> {
        let symbol = validate_symbol(symbol)?;
        tracing::info!("Comparing {} sentiment sources for {}", self.sentiment_sources.len(), symbol);

        let sources = collect_sources(&self.sentiment_sources, &symbol).await;
        let comparison = compare_sources(&sources);
        let consensus = derive_consensus(&sources);

        Ok(SentimentReport {
            symbol,
            timestamp: Utc::now(),
            sources,
            comparison,
            consensus,
        })
    }

    /// Price scenarios over the requested horizon, blending the fundamental
    /// growth estimate with the sentiment consensus. Provider failures fall
    /// back to neutral defaults (price 0, EPS growth 10, score 50) so the
    /// projection is always well-formed.
    pub async fn enhanced_scenarios(
        &self,
        symbol: &str,
        timeframe: Horizon,
    ) -> Result<ScenarioOutlook, AnalysisError> {
        let symbol = validate_symbol(symbol)?;
        tracing::info!("Projecting {} scenarios for {}", timeframe, symbol);

        // Independent fetches run concurrently; all aggregate math waits for
        // every attempt to settle.
        let (price_result, fundamentals_result, sources) = tokio::join!(
            self.quotes.current_price(&symbol),
            self.fundamentals.fundamentals(&symbol),
            collect_sources(&self.sentiment_sources, &symbol),
        );

        let current_price = price_result.unwrap_or_else(|e| {
            tracing::warn!("Quote lookup failed for {}: {} (treating price as unknown)", symbol, e);
            0.0
        });
        let snapshot = fundamentals_result.unwrap_or_else(|e| {
            tracing::warn!("Fundamentals lookup failed for {}: {}", symbol, e);
            FundamentalSnapshot::default()
        });

        let eps_growth = snapshot
            .eps_growth
            .unwrap_or(FundamentalSnapshot::DEFAULT_EPS_GROWTH);
        let consensus = derive_consensus(&sources);

        let scenarios =
            scenario_projection::project(current_price, eps_growth, consensus.score, timeframe)?;

        Ok(ScenarioOutlook {
            symbol,
            timestamp: Utc::now(),
            current_price,
            timeframe,
            sentiment_score: consensus.score,
            eps_growth,
            scenarios,
            data_sources: sources.keys().cloned().collect(),
        })
    }

    /// Letter grades across the four fundamental dimensions. An unavailable
    /// fundamentals provider grades the default snapshot rather than failing.
    pub async fn detailed_metrics(&self, symbol: &str) -> Result<MetricsReport, AnalysisError> {
        let symbol = validate_symbol(symbol)?;
        tracing::info!("Grading fundamentals for {}", symbol);

        let snapshot = match self.fundamentals.fundamentals(&symbol).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Fundamentals lookup failed for {}: {}", symbol, e);
                FundamentalSnapshot::default()
            }
        };

        Ok(MetricsReport {
            symbol,
            timestamp: Utc::now(),
            report: fundamental_grading::grade(&snapshot),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_core::{ConsensusSentiment, RawSignal, SentimentCategory, SourceReading};
    use async_trait::async_trait;
    use fundamental_grading::Grade;

    struct StubSource {
        id: &'static str,
        score: f64,
    }

    #[async_trait]
    impl SentimentSource for StubSource {
        fn id(&self) -> &'static str {
            self.id
        }

        fn provider(&self) -> &'static str {
            "Stub Provider"
        }

        async fn reading(&self, _symbol: &str) -> Result<SourceReading, AnalysisError> {
            Ok(SourceReading {
                raw: RawSignal::Bipolar { score: self.score },
                confidence: None,
                relevance: None,
                articles_analyzed: 5,
            })
        }
    }

    struct DownSource;

    #[async_trait]
    impl SentimentSource for DownSource {
        fn id(&self) -> &'static str {
            "down"
        }

        fn provider(&self) -> &'static str {
            "Down Provider"
        }

        async fn reading(&self, _symbol: &str) -> Result<SourceReading, AnalysisError> {
            Err(AnalysisError::SourceUnavailable("503".to_string()))
        }
    }

    struct StubFundamentals {
        snapshot: Option<FundamentalSnapshot>,
    }

    #[async_trait]
    impl FundamentalsProvider for StubFundamentals {
        async fn fundamentals(
            &self,
            _symbol: &str,
        ) -> Result<FundamentalSnapshot, AnalysisError> {
            self.snapshot
                .clone()
                .ok_or_else(|| AnalysisError::SourceUnavailable("no fundamentals".to_string()))
        }
    }

    struct StubQuotes {
        price: Option<f64>,
    }

    #[async_trait]
    impl QuoteProvider for StubQuotes {
        async fn current_price(&self, _symbol: &str) -> Result<f64, AnalysisError> {
            self.price
                .ok_or_else(|| AnalysisError::SourceUnavailable("no quote".to_string()))
        }
    }

    fn analyzer(
        sources: Vec<Box<dyn SentimentSource>>,
        snapshot: Option<FundamentalSnapshot>,
        price: Option<f64>,
    ) -> StockAnalyzer {
        StockAnalyzer::new(
            sources,
            Box::new(StubFundamentals { snapshot }),
            Box::new(StubQuotes { price }),
        )
    }

    #[tokio::test]
    async fn malformed_symbol_fails_fast_everywhere() {
        let a = analyzer(vec![], None, None);
        assert!(matches!(
            a.comprehensive_sentiment("not a ticker!").await,
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            a.enhanced_scenarios("", Horizon::Month1).await,
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            a.detailed_metrics("WAY_TOO_LONG_SYMBOL").await,
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn symbol_is_uppercased() {
        let a = analyzer(vec![], None, None);
        let report = a.comprehensive_sentiment("nvda").await.unwrap();
        assert_eq!(report.symbol, "NVDA");
    }

    #[tokio::test]
    async fn all_sources_down_returns_unknown_consensus() {
        let a = analyzer(vec![Box::new(DownSource)], None, None);
        let report = a.comprehensive_sentiment("AAPL").await.unwrap();
        assert_eq!(report.consensus.sentiment, ConsensusSentiment::Unknown);
        assert_eq!(report.consensus.confidence, 0.0);
        assert_eq!(report.consensus.score, 50.0);
        assert!(report.sources["down"].is_failed());
    }

    #[tokio::test]
    async fn agreeing_sources_produce_positive_consensus() {
        let sources: Vec<Box<dyn SentimentSource>> = vec![
            Box::new(StubSource { id: "a", score: 0.4 }),
            Box::new(StubSource { id: "b", score: 0.5 }),
            Box::new(StubSource { id: "c", score: 0.3 }),
        ];
        let a = analyzer(sources, None, None);
        let report = a.comprehensive_sentiment("MSFT").await.unwrap();
        assert_eq!(report.consensus.sentiment, ConsensusSentiment::Positive);
        assert_eq!(report.consensus.confidence, 1.0);
        assert_eq!(
            report.sources["a"].signal().unwrap().category,
            SentimentCategory::Positive
        );
    }

    #[tokio::test]
    async fn base_case_return_matches_reference() {
        // price 100, eps growth 10, neutral sentiment (no sources), 1M
        let snapshot = FundamentalSnapshot {
            eps_growth: Some(10.0),
            ..Default::default()
        };
        let a = analyzer(vec![], Some(snapshot), Some(100.0));
        let outlook = a.enhanced_scenarios("AAPL", Horizon::Month1).await.unwrap();

        assert_eq!(outlook.sentiment_score, 50.0);
        let expected = 10.0 / 100.0 * (30.0 / 365.0) * 100.0;
        assert!((outlook.scenarios.base_case.return_pct - expected).abs() < 1e-6);
    }

    #[tokio::test]
    async fn missing_quote_degrades_to_zero_price() {
        let a = analyzer(vec![], None, None);
        let outlook = a.enhanced_scenarios("AAPL", Horizon::Year1).await.unwrap();
        assert_eq!(outlook.current_price, 0.0);
        assert_eq!(outlook.scenarios.bull_case.return_pct, 0.0);
        assert_eq!(outlook.eps_growth, FundamentalSnapshot::DEFAULT_EPS_GROWTH);
    }

    #[tokio::test]
    async fn data_sources_list_every_attempt() {
        let sources: Vec<Box<dyn SentimentSource>> = vec![
            Box::new(StubSource { id: "alpha", score: 0.2 }),
            Box::new(DownSource),
        ];
        let a = analyzer(sources, None, Some(50.0));
        let outlook = a.enhanced_scenarios("AAPL", Horizon::Month3).await.unwrap();
        assert_eq!(outlook.data_sources, vec!["alpha", "down"]);
    }

    #[tokio::test]
    async fn metrics_grade_from_provider_snapshot() {
        let snapshot = FundamentalSnapshot {
            pe_ratio: Some(12.0),
            roe: Some(25.0),
            profit_margin: Some(20.0),
            eps_growth: Some(25.0),
            revenue_growth: Some(20.0),
            debt_to_equity: Some(0.2),
        };
        let a = analyzer(vec![], Some(snapshot), None);
        let report = a.detailed_metrics("NVDA").await.unwrap();
        assert_eq!(report.report.overall_grade, Grade::A);
        assert_eq!(report.report.metrics.valuation.grade, Grade::A);
    }

    #[tokio::test]
    async fn metrics_fall_back_to_defaults_when_provider_is_down() {
        let a = analyzer(vec![], None, None);
        let report = a.detailed_metrics("NVDA").await.unwrap();
        // Default snapshot grades C overall (average 71.25)
        assert_eq!(report.report.overall_grade, Grade::C);
    }
}
