use analyzer_core::{FundamentalSnapshot, ResolvedFundamentals};
use serde::Serialize;

/// Letter grade over a fixed numeric band. The same ≥90/80/70/60 boundaries
/// apply to the overall average as to nothing else; per-dimension grades use
/// their own ratio bands below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// One graded dimension: letter, numeric score, and the canned explanation
/// for the band it landed in.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionGrade {
    pub grade: Grade,
    pub score: f64,
    pub description: &'static str,
    pub factors: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsBreakdown {
    pub valuation: DimensionGrade,
    pub profitability: DimensionGrade,
    pub growth: DimensionGrade,
    pub financial_health: DimensionGrade,
}

/// Full grading report for one snapshot. The overall grade is the letter for
/// the unweighted average of the four dimension scores.
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub overall_grade: Grade,
    pub average_score: f64,
    /// The ratios the grades were computed from, defaults substituted.
    pub inputs: ResolvedFundamentals,
    pub metrics: MetricsBreakdown,
}

/// Valuation from the P/E ratio. Lower is better.
pub fn grade_valuation(pe: f64) -> DimensionGrade {
    let factors: &'static [&'static str] = &["P/E Ratio", "Price to Book", "Price to Sales"];
    let (grade, score, description) = if pe < 15.0 {
        (Grade::A, 95.0, "Undervalued - PE ratio significantly below market average")
    } else if pe < 20.0 {
        (Grade::B, 85.0, "Fair value - PE ratio near market average")
    } else if pe < 25.0 {
        (Grade::C, 75.0, "Market value - PE ratio at market average")
    } else if pe < 35.0 {
        (Grade::D, 60.0, "Overvalued - PE ratio above market average")
    } else {
        (Grade::F, 40.0, "Significantly overvalued")
    };
    DimensionGrade { grade, score, description, factors }
}

/// Profitability from the average of ROE and net margin (both in percent).
pub fn grade_profitability(roe: f64, profit_margin: f64) -> DimensionGrade {
    let factors: &'static [&'static str] = &["ROE", "Profit Margin", "ROA"];
    let avg = (roe + profit_margin) / 2.0;
    let (grade, score, description) = if avg > 20.0 {
        (Grade::A, 95.0, "Excellent profitability metrics")
    } else if avg > 15.0 {
        (Grade::B, 85.0, "Strong profitability")
    } else if avg > 10.0 {
        (Grade::C, 75.0, "Adequate profitability")
    } else if avg > 5.0 {
        (Grade::D, 60.0, "Below average profitability")
    } else {
        (Grade::F, 40.0, "Weak profitability")
    };
    DimensionGrade { grade, score, description, factors }
}

/// Growth from the average of EPS growth and revenue growth (percent YoY).
pub fn grade_growth(eps_growth: f64, revenue_growth: f64) -> DimensionGrade {
    let factors: &'static [&'static str] = &["EPS Growth", "Revenue Growth", "Market Share"];
    let avg = (eps_growth + revenue_growth) / 2.0;
    let (grade, score, description) = if avg > 20.0 {
        (Grade::A, 95.0, "High growth company")
    } else if avg > 15.0 {
        (Grade::B, 85.0, "Strong growth")
    } else if avg > 10.0 {
        (Grade::C, 75.0, "Moderate growth")
    } else if avg > 5.0 {
        (Grade::D, 60.0, "Slow growth")
    } else {
        (Grade::F, 40.0, "Declining or no growth")
    };
    DimensionGrade { grade, score, description, factors }
}

/// Financial health from debt-to-equity. The scale runs inverted relative to
/// the other dimensions: lower debt grades higher.
pub fn grade_financial_health(debt_to_equity: f64) -> DimensionGrade {
    let factors: &'static [&'static str] = &["Debt/Equity", "Current Ratio", "Quick Ratio"];
    let (grade, score, description) = if debt_to_equity < 0.3 {
        (Grade::A, 95.0, "Excellent financial health - Low debt")
    } else if debt_to_equity < 0.5 {
        (Grade::B, 85.0, "Good financial health")
    } else if debt_to_equity < 1.0 {
        (Grade::C, 75.0, "Moderate debt levels")
    } else if debt_to_equity < 2.0 {
        (Grade::D, 60.0, "High debt levels")
    } else {
        (Grade::F, 40.0, "Very high debt - Financial risk")
    };
    DimensionGrade { grade, score, description, factors }
}

/// Grade a fundamentals snapshot across all four dimensions. Missing ratios
/// fall back to the snapshot defaults, so an entirely absent snapshot still
/// grades (rather than erroring) per the graceful-degradation contract.
pub fn grade(snapshot: &FundamentalSnapshot) -> GradeReport {
    let inputs = snapshot.with_defaults();

    let valuation = grade_valuation(inputs.pe_ratio);
    let profitability = grade_profitability(inputs.roe, inputs.profit_margin);
    let growth = grade_growth(inputs.eps_growth, inputs.revenue_growth);
    let financial_health = grade_financial_health(inputs.debt_to_equity);

    let average_score =
        (valuation.score + profitability.score + growth.score + financial_health.score) / 4.0;

    GradeReport {
        overall_grade: Grade::from_score(average_score),
        average_score,
        inputs,
        metrics: MetricsBreakdown {
            valuation,
            profitability,
            growth,
            financial_health,
        },
    }
}
