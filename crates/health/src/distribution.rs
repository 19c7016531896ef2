use crate::types::Severity;
use serde::{Deserialize, Serialize};

/// z-score offsets above the base threshold for the medium and high tiers
const MEDIUM_TIER_OFFSET: f64 = 0.5;
const HIGH_TIER_OFFSET: f64 = 1.5;

/// Summary statistics over a numeric sample.
///
/// `median` is the upper-middle element of the sorted sample for even
/// sizes, not an interpolated average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Distribution {
    /// Summarize `samples`. An empty sample yields the all-zero distribution.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        #[allow(clippy::cast_precision_loss)]
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted
            .iter()
            .map(|value| {
                let diff = value - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;

        let last = sorted.len() - 1;
        let percentile = |fraction: f64| -> f64 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let idx = (n * fraction) as usize;
            sorted[idx.min(last)]
        };

        Self {
            mean,
            median: sorted[sorted.len() / 2],
            std_dev: variance.sqrt(),
            p95: percentile(0.95),
            p99: percentile(0.99),
            min: sorted[0],
            max: sorted[last],
            count: sorted.len(),
        }
    }

    /// Convenience for integer samples such as line counts
    pub fn from_counts(samples: &[usize]) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let values: Vec<f64> = samples.iter().map(|&v| v as f64).collect();
        Self::from_samples(&values)
    }

    /// True iff `value` is more than `num_std_devs` standard deviations above
    /// the mean. Always false for a zero standard deviation.
    pub fn is_upper_outlier(&self, value: f64, num_std_devs: f64) -> bool {
        if self.std_dev == 0.0 {
            return false;
        }
        value > self.mean + num_std_devs * self.std_dev
    }

    /// Standard deviations above the mean, `None` when the sample is degenerate
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.std_dev == 0.0 {
            return None;
        }
        Some((value - self.mean) / self.std_dev)
    }

    /// Tier an outlier by how far it sits past `base_threshold` standard
    /// deviations. A degenerate sample reports medium.
    pub fn outlier_severity(&self, value: f64, base_threshold: f64) -> Severity {
        let Some(z) = self.z_score(value) else {
            return Severity::Medium;
        };

        if z > base_threshold + HIGH_TIER_OFFSET {
            Severity::High
        } else if z > base_threshold + MEDIUM_TIER_OFFSET {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}
