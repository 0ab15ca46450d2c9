use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Three-way categorical sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

impl SentimentCategory {
    /// Fixed tie-break order for majority voting. When two or three categories
    /// share the highest count, the earliest entry here wins. This is a
    /// documented convention, not data-driven.
    pub const TIE_BREAK_ORDER: [SentimentCategory; 3] = [
        SentimentCategory::Positive,
        SentimentCategory::Negative,
        SentimentCategory::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentCategory::Positive => "positive",
            SentimentCategory::Negative => "negative",
            SentimentCategory::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific raw sentiment signal, before normalization onto the
/// common 0-100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSignal {
    /// Classifier output as positive/negative/neutral ratios, with the label
    /// the classifier itself assigned.
    Ratios {
        positive_ratio: f64,
        negative_ratio: f64,
        label: SentimentCategory,
    },
    /// Continuous bipolar score in [-1, 1] (e.g. relevance-weighted news
    /// sentiment).
    Bipolar { score: f64 },
    /// Insider monthly share purchase ratio (MSPR), typically a small value
    /// around 0.
    InsiderRatio { mspr: f64 },
}

/// What a sentiment provider hands back for one (symbol, request).
#[derive(Debug, Clone)]
pub struct SourceReading {
    pub raw: RawSignal,
    pub confidence: Option<f64>,
    pub relevance: Option<f64>,
    pub articles_analyzed: u32,
}

/// One provider's sentiment normalized onto 0-100. Immutable once produced;
/// one instance per (ticker, source, request).
#[derive(Debug, Clone, Serialize)]
pub struct SentimentSignal {
    pub provider: String,
    pub category: SentimentCategory,
    /// Always in [0, 100].
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
    pub articles_analyzed: u32,
}

/// Per-source result slot: either a normalized signal or the failure that
/// kept this source out of the aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SourceOutcome {
    Signal(SentimentSignal),
    Failed { error: String },
}

impl SourceOutcome {
    pub fn signal(&self) -> Option<&SentimentSignal> {
        match self {
            SourceOutcome::Signal(signal) => Some(signal),
            SourceOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }
}

/// Mapping from source id (e.g. "finnhub_insider") to its outcome, ordered
/// for stable report output.
pub type SourceMap = BTreeMap<String, SourceOutcome>;

/// Majority-vote sentiment; `Unknown` only when no source succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusSentiment {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl From<SentimentCategory> for ConsensusSentiment {
    fn from(category: SentimentCategory) -> Self {
        match category {
            SentimentCategory::Positive => ConsensusSentiment::Positive,
            SentimentCategory::Negative => ConsensusSentiment::Negative,
            SentimentCategory::Neutral => ConsensusSentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentBreakdown {
    pub fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }

    pub fn count(&self, category: SentimentCategory) -> u32 {
        match category {
            SentimentCategory::Positive => self.positive,
            SentimentCategory::Negative => self.negative,
            SentimentCategory::Neutral => self.neutral,
        }
    }
}

/// Majority-vote consensus across sources. Derived per request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusResult {
    pub sentiment: ConsensusSentiment,
    /// winning_count / total_count, in [0, 1].
    pub confidence: f64,
    /// Mean of the non-error normalized scores, in [0, 100].
    pub score: f64,
    pub breakdown: SentimentBreakdown,
}

impl ConsensusResult {
    /// Default returned when every source failed: a well-formed neutral
    /// object rather than an error.
    pub fn unknown() -> Self {
        Self {
            sentiment: ConsensusSentiment::Unknown,
            confidence: 0.0,
            score: 50.0,
            breakdown: SentimentBreakdown::default(),
        }
    }
}

/// Qualitative bucket of score variance across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    Strong,
    Moderate,
    Weak,
    /// No successful sources to compare.
    Unknown,
}

/// How many distinct categorical labels the sources produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentSpread {
    Unanimous,
    Mixed,
    Divided,
}

/// Cross-source comparison: spread of normalized scores and of categorical
/// labels. Read-only view over the collected signals.
#[derive(Debug, Clone, Serialize)]
pub struct AgreementMetrics {
    pub average_score: f64,
    /// Population variance of the non-error scores.
    pub variance: f64,
    pub agreement_level: AgreementLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_consensus: Option<SentimentSpread>,
    pub scores: BTreeMap<String, f64>,
    pub sentiments: BTreeMap<String, SentimentCategory>,
}

/// Fundamental ratios as reported by a provider. All fields optional; the
/// graders and the projector substitute the defaults below when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub pe_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub profit_margin: Option<f64>,
    pub eps_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

impl FundamentalSnapshot {
    pub const DEFAULT_PE: f64 = 20.0;
    pub const DEFAULT_ROE: f64 = 15.0;
    pub const DEFAULT_PROFIT_MARGIN: f64 = 10.0;
    pub const DEFAULT_EPS_GROWTH: f64 = 10.0;
    pub const DEFAULT_REVENUE_GROWTH: f64 = 10.0;
    pub const DEFAULT_DEBT_TO_EQUITY: f64 = 0.5;

    /// Snapshot with every field resolved, substituting defaults for gaps.
    pub fn with_defaults(&self) -> ResolvedFundamentals {
        ResolvedFundamentals {
            pe_ratio: self.pe_ratio.unwrap_or(Self::DEFAULT_PE),
            roe: self.roe.unwrap_or(Self::DEFAULT_ROE),
            profit_margin: self.profit_margin.unwrap_or(Self::DEFAULT_PROFIT_MARGIN),
            eps_growth: self.eps_growth.unwrap_or(Self::DEFAULT_EPS_GROWTH),
            revenue_growth: self.revenue_growth.unwrap_or(Self::DEFAULT_REVENUE_GROWTH),
            debt_to_equity: self.debt_to_equity.unwrap_or(Self::DEFAULT_DEBT_TO_EQUITY),
        }
    }
}

/// `FundamentalSnapshot` after default substitution; what the grading and
/// projection math actually consumes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolvedFundamentals {
    pub pe_ratio: f64,
    pub roe: f64,
    pub profit_margin: f64,
    pub eps_growth: f64,
    pub revenue_growth: f64,
    pub debt_to_equity: f64,
}

/// Projection window. Only the five labels below are recognized; anything
/// else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1W")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
    #[serde(rename = "3M")]
    Month3,
    #[serde(rename = "6M")]
    Month6,
    #[serde(rename = "1Y")]
    Year1,
}

impl Horizon {
    pub fn days(&self) -> u32 {
        match self {
            Horizon::Week1 => 7,
            Horizon::Month1 => 30,
            Horizon::Month3 => 90,
            Horizon::Month6 => 180,
            Horizon::Year1 => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::Week1 => "1W",
            Horizon::Month1 => "1M",
            Horizon::Month3 => "3M",
            Horizon::Month6 => "6M",
            Horizon::Year1 => "1Y",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Horizon {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1W" => Ok(Horizon::Week1),
            "1M" => Ok(Horizon::Month1),
            "3M" => Ok(Horizon::Month3),
            "6M" => Ok(Horizon::Month6),
            "1Y" => Ok(Horizon::Year1),
            other => Err(AnalysisError::InvalidInput(format!(
                "Unrecognized timeframe '{}' (expected one of 1W, 1M, 3M, 6M, 1Y)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_parses_known_labels() {
        assert_eq!("1w".parse::<Horizon>().unwrap(), Horizon::Week1);
        assert_eq!("1M".parse::<Horizon>().unwrap(), Horizon::Month1);
        assert_eq!("1Y".parse::<Horizon>().unwrap().days(), 365);
    }

    #[test]
    fn horizon_rejects_unknown_labels() {
        let err = "2Y".parse::<Horizon>().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn categories_serialize_lowercase() {
        let json = serde_json::to_string(&SentimentCategory::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
        let json = serde_json::to_string(&ConsensusSentiment::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }

    #[test]
    fn source_outcome_serializes_untagged() {
        let failed = SourceOutcome::Failed {
            error: "timeout".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "timeout");
    }

    #[test]
    fn defaults_fill_missing_fundamentals() {
        let snapshot = FundamentalSnapshot {
            pe_ratio: Some(12.0),
            ..Default::default()
        };
        let resolved = snapshot.with_defaults();
        assert_eq!(resolved.pe_ratio, 12.0);
        assert_eq!(resolved.eps_growth, FundamentalSnapshot::DEFAULT_EPS_GROWTH);
        assert_eq!(resolved.debt_to_equity, 0.5);
    }
}
