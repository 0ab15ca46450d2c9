use std::collections::BTreeMap;

use analyzer_core::{
    stats, AgreementLevel, AgreementMetrics, ConsensusResult, SentimentBreakdown,
    SentimentCategory, SentimentSpread, SourceMap,
};

/// Variance below this counts as strong agreement.
const STRONG_AGREEMENT_VARIANCE: f64 = 100.0;

/// Variance below this (and above the strong band) counts as moderate.
const MODERATE_AGREEMENT_VARIANCE: f64 = 300.0;

/// Majority-vote consensus over the non-error signals.
///
/// The winning category is the one with the highest count; equal counts are
/// resolved by the fixed order positive, negative, neutral. Confidence is
/// winning_count / total_count. With no successful sources at all the
/// well-formed `unknown` default is returned instead of an error.
pub fn derive_consensus(outcomes: &SourceMap) -> ConsensusResult {
    let signals: Vec<_> = outcomes.values().filter_map(|o| o.signal()).collect();

    if signals.is_empty() {
        return ConsensusResult::unknown();
    }

    let mut breakdown = SentimentBreakdown::default();
    for signal in &signals {
        match signal.category {
            SentimentCategory::Positive => breakdown.positive += 1,
            SentimentCategory::Negative => breakdown.negative += 1,
            SentimentCategory::Neutral => breakdown.neutral += 1,
        }
    }

    let total = breakdown.total();
    // First category in the fixed order holding the max count wins ties.
    let mut winner = SentimentCategory::Positive;
    let mut max_count = 0;
    for category in SentimentCategory::TIE_BREAK_ORDER {
        let count = breakdown.count(category);
        if count > max_count {
            max_count = count;
            winner = category;
        }
    }

    let scores: Vec<f64> = signals.iter().map(|s| s.score).collect();

    ConsensusResult {
        sentiment: winner.into(),
        confidence: breakdown.count(winner) as f64 / total as f64,
        score: stats::mean(&scores),
        breakdown,
    }
}

/// Cross-source agreement metrics over the non-error signals: average score,
/// population variance, a fixed-band agreement level, and how many distinct
/// labels appeared.
pub fn compare_sources(outcomes: &SourceMap) -> AgreementMetrics {
    let mut scores = BTreeMap::new();
    let mut sentiments = BTreeMap::new();

    for (id, outcome) in outcomes {
        if let Some(signal) = outcome.signal() {
            scores.insert(id.clone(), signal.score);
            sentiments.insert(id.clone(), signal.category);
        }
    }

    let score_values: Vec<f64> = scores.values().copied().collect();
    let average_score = stats::mean(&score_values);
    let variance = stats::population_variance(&score_values);

    let agreement_level = if score_values.is_empty() {
        AgreementLevel::Unknown
    } else if variance < STRONG_AGREEMENT_VARIANCE {
        AgreementLevel::Strong
    } else if variance < MODERATE_AGREEMENT_VARIANCE {
        AgreementLevel::Moderate
    } else {
        AgreementLevel::Weak
    };

    let sentiment_consensus = if sentiments.is_empty() {
        None
    } else {
        let mut labels: Vec<SentimentCategory> = sentiments.values().copied().collect();
        labels.sort();
        labels.dedup();
        Some(match labels.len() {
            1 => SentimentSpread::Unanimous,
            2 => SentimentSpread::Mixed,
            _ => SentimentSpread::Divided,
        })
    };

    AgreementMetrics {
        average_score,
        variance,
        agreement_level,
        sentiment_consensus,
        scores,
        sentiments,
    }
}
