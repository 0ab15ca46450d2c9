use analyzer_core::{SentimentSignal, SentimentSource, SourceMap, SourceOutcome};

use crate::normalize;

/// Query every configured sentiment source for one ticker, one attempt each.
///
/// Failures are isolated per source: an error from one provider is recorded
/// in that source's slot and the rest still run. The returned map always has
/// one entry per source, success or not.
pub async fn collect_sources(sources: &[Box<dyn SentimentSource>], symbol: &str) -> SourceMap {
    let mut outcomes = SourceMap::new();

    for source in sources {
        tracing::info!("Querying {} sentiment for {}", source.id(), symbol);
        let outcome = match source.reading(symbol).await {
            Ok(reading) => {
                let (category, score) = normalize(&reading.raw);
                SourceOutcome::Signal(SentimentSignal {
                    provider: source.provider().to_string(),
                    category,
                    score,
                    confidence: reading.confidence,
                    relevance: reading.relevance,
                    articles_analyzed: reading.articles_analyzed,
                })
            }
            Err(e) => {
                tracing::warn!("Sentiment source {} failed for {}: {}", source.id(), symbol, e);
                SourceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        outcomes.insert(source.id().to_string(), outcome);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_core::{AnalysisError, RawSignal, SentimentCategory, SourceReading};
    use async_trait::async_trait;

    struct FixedSource {
        id: &'static str,
        mspr: f64,
    }

    #[async_trait]
    impl SentimentSource for FixedSource {
        fn id(&self) -> &'static str {
            self.id
        }

        fn provider(&self) -> &'static str {
            "Fixed Test Source"
        }

        async fn reading(&self, _symbol: &str) -> Result<SourceReading, AnalysisError> {
            Ok(SourceReading {
                raw: RawSignal::InsiderRatio { mspr: self.mspr },
                confidence: None,
                relevance: None,
                articles_analyzed: 3,
            })
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl SentimentSource for BrokenSource {
        fn id(&self) -> &'static str {
            "broken"
        }

        fn provider(&self) -> &'static str {
            "Broken Test Source"
        }

        async fn reading(&self, _symbol: &str) -> Result<SourceReading, AnalysisError> {
            Err(AnalysisError::SourceUnavailable("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let sources: Vec<Box<dyn SentimentSource>> = vec![
            Box::new(FixedSource { id: "bullish", mspr: 0.9 }),
            Box::new(BrokenSource),
            Box::new(FixedSource { id: "bearish", mspr: -0.9 }),
        ];

        let outcomes = collect_sources(&sources, "AAPL").await;
        assert_eq!(outcomes.len(), 3);

        let bullish = outcomes["bullish"].signal().unwrap();
        assert_eq!(bullish.category, SentimentCategory::Positive);

        assert!(outcomes["broken"].is_failed());
        match &outcomes["broken"] {
            SourceOutcome::Failed { error } => assert!(error.contains("connection reset")),
            SourceOutcome::Signal(_) => unreachable!(),
        }

        let bearish = outcomes["bearish"].signal().unwrap();
        assert_eq!(bearish.category, SentimentCategory::Negative);
    }

    #[tokio::test]
    async fn every_source_gets_a_slot() {
        let sources: Vec<Box<dyn SentimentSource>> =
            vec![Box::new(BrokenSource)];
        let outcomes = collect_sources(&sources, "TSLA").await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes.values().all(|o| o.is_failed()));
    }
}
