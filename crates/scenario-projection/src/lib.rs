use analyzer_core::{AnalysisError, Horizon};
use serde::Serialize;

/// Fixed scenario weights. Deliberately not calibrated to any signal:
/// bull/base/bear are always 25/50/25.
const BULL_PROBABILITY: u8 = 25;
const BASE_PROBABILITY: u8 = 50;
const BEAR_PROBABILITY: u8 = 25;

/// One named price-projection case.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub price_target: f64,
    /// Percent weight, fixed per case.
    pub probability: u8,
    pub return_pct: f64,
    pub factors: Vec<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSet {
    pub bull_case: Scenario,
    pub base_case: Scenario,
    pub bear_case: Scenario,
}

/// Project bull/base/bear price targets from the current price, a fundamental
/// growth estimate, and the consensus sentiment score over the requested
/// horizon.
///
/// A price of 0 means "unknown": targets come out 0 and every return is
/// pinned to 0 instead of dividing by zero. A negative price is an invariant
/// violation and errors out rather than producing nonsense targets.
pub fn project(
    price: f64,
    eps_growth_pct: f64,
    consensus_score: f64,
    horizon: Horizon,
) -> Result<ScenarioSet, AnalysisError> {
    if price < 0.0 {
        return Err(AnalysisError::CalculationError(format!(
            "Cannot project scenarios from a negative price ({})",
            price
        )));
    }

    let multiplier = horizon.days() as f64 / 365.0;
    let base_growth = (eps_growth_pct / 100.0) * multiplier;
    // Consensus 0-100 recentered to -0.5..+0.5.
    let sentiment_factor = (consensus_score - 50.0) / 100.0;

    let bull_target = price * (1.0 + base_growth * 1.5 + sentiment_factor * 0.2);
    let base_target = price * (1.0 + base_growth + sentiment_factor * 0.1);
    let bear_target = price * (1.0 + base_growth * 0.3 - sentiment_factor.abs() * 0.2);

    let return_pct = |target: f64| {
        if price == 0.0 {
            0.0
        } else {
            (target - price) / price * 100.0
        }
    };

    Ok(ScenarioSet {
        bull_case: Scenario {
            price_target: bull_target,
            probability: BULL_PROBABILITY,
            return_pct: return_pct(bull_target),
            factors: vec![
                format!("EPS growth exceeds {}% forecast", eps_growth_pct),
                "Strong positive sentiment across all sources".to_string(),
                "Sector momentum remains strong".to_string(),
                "Market conditions favorable".to_string(),
            ],
            rationale: format!(
                "Optimistic scenario assuming {}% EPS growth with positive market sentiment.",
                (eps_growth_pct * 1.5) as i64
            ),
        },
        base_case: Scenario {
            price_target: base_target,
            probability: BASE_PROBABILITY,
            return_pct: return_pct(base_target),
            factors: vec![
                format!("EPS growth meets {}% expectations", eps_growth_pct),
                "Sentiment remains stable".to_string(),
                "Normal market conditions".to_string(),
                "Company executes on plan".to_string(),
            ],
            rationale: format!(
                "Most likely scenario with {}% EPS growth and stable market conditions.",
                eps_growth_pct
            ),
        },
        bear_case: Scenario {
            price_target: bear_target,
            probability: BEAR_PROBABILITY,
            return_pct: return_pct(bear_target),
            factors: vec![
                "EPS growth disappoints".to_string(),
                "Negative sentiment develops".to_string(),
                "Market correction or sector weakness".to_string(),
                "Execution challenges emerge".to_string(),
            ],
            rationale: format!(
                "Conservative scenario with only {}% growth and market headwinds.",
                (eps_growth_pct * 0.3) as i64
            ),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_case_matches_reference_numbers() {
        // price=100, eps_growth=10, 1M horizon, neutral sentiment (factor 0):
        // base_growth = 0.1 * 30/365, target = 100.822..., return 0.822%
        let set = project(100.0, 10.0, 50.0, Horizon::Month1).unwrap();
        let expected_growth = 0.10 * 30.0 / 365.0;
        let expected_target = 100.0 * (1.0 + expected_growth);
        assert!((set.base_case.price_target - expected_target).abs() < 1e-6);
        assert!((set.base_case.return_pct - expected_growth * 100.0).abs() < 1e-6);
    }

    #[test]
    fn probabilities_are_fixed() {
        for score in [0.0, 50.0, 100.0] {
            let set = project(50.0, 25.0, score, Horizon::Year1).unwrap();
            assert_eq!(set.bull_case.probability, 25);
            assert_eq!(set.base_case.probability, 50);
            assert_eq!(set.bear_case.probability, 25);
        }
    }

    #[test]
    fn sentiment_lifts_bull_and_drags_bear() {
        let bullish = project(100.0, 10.0, 90.0, Horizon::Year1).unwrap();
        let bearish = project(100.0, 10.0, 10.0, Horizon::Year1).unwrap();
        assert!(bullish.bull_case.price_target > bearish.bull_case.price_target);
        // |sentiment_factor| penalizes the bear case in both directions
        let neutral = project(100.0, 10.0, 50.0, Horizon::Year1).unwrap();
        assert!(bullish.bear_case.price_target < neutral.bear_case.price_target);
        assert!(bearish.bear_case.price_target < neutral.bear_case.price_target);
    }

    #[test]
    fn zero_price_returns_zero_pct_without_panicking() {
        let set = project(0.0, 10.0, 80.0, Horizon::Month3).unwrap();
        assert_eq!(set.bull_case.return_pct, 0.0);
        assert_eq!(set.base_case.return_pct, 0.0);
        assert_eq!(set.bear_case.return_pct, 0.0);
        assert_eq!(set.base_case.price_target, 0.0);
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = project(-1.0, 10.0, 50.0, Horizon::Month1).unwrap_err();
        assert!(matches!(err, AnalysisError::CalculationError(_)));
    }

    #[test]
    fn rationale_mentions_scaled_growth() {
        let set = project(100.0, 10.0, 50.0, Horizon::Month1).unwrap();
        assert!(set.bull_case.rationale.contains("15%"));
        assert!(set.bear_case.rationale.contains("3%"));
    }
}
