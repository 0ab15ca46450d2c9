use analyzer_core::{stats, RawSignal, SentimentCategory};

/// Bipolar scores above this are labelled positive, below the negation
/// negative.
const BIPOLAR_THRESHOLD: f64 = 0.15;

/// MSPR above this is bullish, below the negation bearish.
const MSPR_THRESHOLD: f64 = 0.5;

/// Map a provider's raw signal onto the common representation: a categorical
/// label and a score in [0, 100].
///
/// Callers filter out failed sources first; this function never sees an
/// error record.
pub fn normalize(raw: &RawSignal) -> (SentimentCategory, f64) {
    match *raw {
        RawSignal::Ratios {
            positive_ratio,
            negative_ratio,
            label,
        } => {
            // Ratio spread in [-1, 1] shifted onto 0-100. The source already
            // assigned its own label, so keep it.
            let score = (positive_ratio - negative_ratio + 1.0) * 50.0;
            (label, stats::clamp_score(score))
        }
        RawSignal::Bipolar { score } => {
            let category = if score > BIPOLAR_THRESHOLD {
                SentimentCategory::Positive
            } else if score < -BIPOLAR_THRESHOLD {
                SentimentCategory::Negative
            } else {
                SentimentCategory::Neutral
            };
            (category, stats::clamp_score((score + 1.0) * 50.0))
        }
        RawSignal::InsiderRatio { mspr } => {
            let category = if mspr > MSPR_THRESHOLD {
                SentimentCategory::Positive
            } else if mspr < -MSPR_THRESHOLD {
                SentimentCategory::Negative
            } else {
                SentimentCategory::Neutral
            };
            (category, stats::clamp_score(50.0 + mspr * 50.0))
        }
    }
}
