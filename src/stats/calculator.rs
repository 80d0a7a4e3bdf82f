//! Statistics Calculator Module
//! Descriptive statistics, rolling means and histogram binning over plain slices.

use statrs::statistics::Statistics;

/// Descriptive statistics for the price column.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// One equal-width histogram bin. `end` is exclusive except for the last bin.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Handles numeric reductions that do not need a DataFrame.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summarize a set of values. Returns `None` when there is nothing to summarize.
    pub fn summarize(values: &[f64]) -> Option<PriceSummary> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let std = if values.len() > 1 { values.std_dev() } else { 0.0 };

        Some(PriceSummary {
            count: values.len(),
            mean: values.mean(),
            median: Self::percentile(&sorted, 50.0),
            std,
            min: Statistics::min(values),
            max: Statistics::max(values),
        })
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Centered rolling mean. Positions without a full window are `None`.
    ///
    /// For even windows the extra element falls before the center, so a window
    /// of 4 at index `i` covers `i - 2 ..= i + 1`.
    pub fn centered_rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
        let n = values.len();
        if window == 0 {
            return vec![None; n];
        }

        let before = window / 2;
        let after = window - before - 1;

        (0..n)
            .map(|i| {
                if i < before || i + after >= n {
                    return None;
                }
                let slice = &values[i - before..=i + after];
                Some(slice.iter().sum::<f64>() / window as f64)
            })
            .collect()
    }

    /// Split values into `bins` equal-width bins spanning their range.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return Vec::new();
        }

        let min = Statistics::min(&finite);
        let max = Statistics::max(&finite);

        if min == max {
            return vec![HistogramBin {
                start: min - 0.5,
                end: max + 0.5,
                count: finite.len(),
            }];
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in &finite {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: min + i as f64 * width,
                end: if i + 1 == bins {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count,
            })
            .collect()
    }
}
