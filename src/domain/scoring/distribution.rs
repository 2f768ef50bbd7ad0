//! Summary statistics over a list of factor scores.

use serde::{Deserialize, Serialize};

/// Min, max, mean, median and population standard deviation of a score list.
///
/// Every field is rounded to two decimals. An empty list yields all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl ScoreDistribution {
    /// Computes the distribution of `scores`.
    ///
    /// # Edge Cases
    /// - Empty input: all fields are 0
    /// - Even count: median is the mean of the two middle values
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        Self {
            min: round2(sorted[0]),
            max: round2(sorted[n - 1]),
            mean: round2(mean),
            median: round2(median),
            std_dev: round2(variance.sqrt()),
        }
    }

    /// Difference between the highest and lowest score.
    pub fn spread(&self) -> f64 {
        round2(self.max - self.min)
    }
}

/// Rounds to two decimal places, halves away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scores_yield_zeros() {
        assert_eq!(ScoreDistribution::from_scores(&[]), ScoreDistribution::default());
    }

    #[test]
    fn even_count_distribution() {
        let dist = ScoreDistribution::from_scores(&[2.0, 4.0, 4.0, 6.0]);
        assert_eq!(dist.min, 2.0);
        assert_eq!(dist.max, 6.0);
        assert_eq!(dist.mean, 4.0);
        assert_eq!(dist.median, 4.0);
        assert_eq!(dist.std_dev, 1.41);
    }

    #[test]
    fn odd_count_uses_middle_value() {
        let dist = ScoreDistribution::from_scores(&[9.0, 1.0, 5.0]);
        assert_eq!(dist.median, 5.0);
        assert_eq!(dist.mean, 5.0);
    }

    #[test]
    fn single_score_has_zero_deviation() {
        let dist = ScoreDistribution::from_scores(&[7.25]);
        assert_eq!(dist.min, 7.25);
        assert_eq!(dist.max, 7.25);
        assert_eq!(dist.std_dev, 0.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = ScoreDistribution::from_scores(&[3.0, 8.5, 1.0, 6.0]);
        let b = ScoreDistribution::from_scores(&[6.0, 1.0, 8.5, 3.0]);
        assert_eq!(a, b);
        assert_eq!(a.median, 4.5);
    }

    #[test]
    fn spread_is_max_minus_min() {
        let dist = ScoreDistribution::from_scores(&[2.0, 9.5]);
        assert_eq!(dist.spread(), 7.5);
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(1.41421), 1.41);
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(0.0), 0.0);
    }
}
