//! Descriptive statistics over a set of measurements.

use serde::Serialize;

/// Distribution summary of one group of measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// Sample variance (n - 1); 0 for a single value.
    pub variance: f64,
    pub std: f64,
    pub p05: f64,
    pub p95: f64,
    /// The raw values, in record order.
    pub values: Vec<f64>,
}

impl Distribution {
    /// Summarize `values`. `None` for an empty set.
    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        Some(Self {
            count: n,
            mean,
            min: sorted[0],
            max: sorted[n - 1],
            median,
            variance,
            std: variance.sqrt(),
            p05: percentile(&sorted, 5.0),
            p95: percentile(&sorted, 95.0),
            values,
        })
    }
}

/// Arithmetic mean; `None` for an empty set.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Percentile by linear interpolation between closest ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
