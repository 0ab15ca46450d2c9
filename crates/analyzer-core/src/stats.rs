//! Small statistics helpers shared by the aggregation code. The agreement
//! math uses population variance (divide by n, not n-1): the collected
//! sources are the whole population for a request, not a sample.

/// Mean of a data slice. Empty input yields 0.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance around the mean. Empty input yields 0.
pub fn population_variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Clamp a score onto the common 0-100 sentiment scale.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}
