/// Per-item uncertainty from score history.
use crate::constants::UNBOUNDED_UNCERTAINTY;

/// Sample variance (n - 1 denominator). `None` for fewer than two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sum_sq / (n - 1) as f64).max(0.0))
}

/// Uncertainty for one item's chronological score snapshots.
pub fn estimate_uncertainty(history: &[f64]) -> f64 {
    sample_variance(history).unwrap_or(UNBOUNDED_UNCERTAINTY)
}

/// Recompute uncertainty for every item from its full history.
pub fn estimate_all(histories: &[Vec<f64>]) -> Vec<f64> {
    histories.iter().map(|h| estimate_uncertainty(h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_signal_below_two_snapshots() {
        assert!(estimate_uncertainty(&[]).is_infinite());
        assert!(estimate_uncertainty(&[4.0]).is_infinite());
    }

    #[test]
    fn test_sample_variance_matches_n_minus_one() {
        // mean 8, squared deviations 16 + 0 + 16, divided by 2.
        assert_eq!(sample_variance(&[4.0, 8.0, 12.0]), Some(16.0));
        assert_eq!(sample_variance(&[1.0, 2.0]), Some(0.5));
    }

    #[test]
    fn test_flat_history_is_zero() {
        assert_eq!(estimate_uncertainty(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_estimate_all() {
        let histories = vec![vec![1.0, 2.0], vec![5.0]];
        let u = estimate_all(&histories);
        assert_eq!(u[0], 0.5);
        assert!(u[1].is_infinite());
    }
}
