/// Stopping rule: aggregate confidence and the final ordering.
use crate::constants::CONFIDENCE_EPSILON;
use crate::types::StopReason;

/// Outcome of checking a completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    Stop(StopReason),
}

/// Mean of `1 / (uncertainty + ε)` over all items.
///
/// Items with no signal yet (infinite uncertainty) contribute zero.
pub fn aggregate_confidence(uncertainties: &[f64]) -> f64 {
    if uncertainties.is_empty() {
        return 0.0;
    }
    let total: f64 = uncertainties
        .iter()
        .map(|u| 1.0 / (u + CONFIDENCE_EPSILON))
        .sum();
    total / uncertainties.len() as f64
}

/// Decide whether to stop after the round with zero-based index `round`.
pub fn evaluate(confidence: f64, threshold: f64, round: usize, max_rounds: usize) -> StopDecision {
    if confidence >= threshold {
        StopDecision::Stop(StopReason::ConfidenceReached)
    } else if round + 1 >= max_rounds {
        StopDecision::Stop(StopReason::MaxRounds)
    } else {
        StopDecision::Continue
    }
}

/// Item indices by descending score. Ties go to the lower index, i.e. the
/// item registered first.
pub fn final_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_zero_without_signal() {
        assert_eq!(aggregate_confidence(&[f64::INFINITY, f64::INFINITY]), 0.0);
        assert_eq!(aggregate_confidence(&[]), 0.0);
    }

    #[test]
    fn test_confidence_mean_of_inverses() {
        let c = aggregate_confidence(&[1.0, 4.0]);
        assert!((c - 0.625).abs() < 1e-5);
    }

    #[test]
    fn test_zero_uncertainty_is_finite() {
        let c = aggregate_confidence(&[0.0]);
        assert!(c.is_finite());
        assert!(c > 1e5);
    }

    #[test]
    fn test_evaluate_threshold() {
        assert_eq!(evaluate(0.95, 0.9, 0, 20), StopDecision::Stop(StopReason::ConfidenceReached));
        assert_eq!(evaluate(0.5, 0.9, 0, 20), StopDecision::Continue);
    }

    #[test]
    fn test_evaluate_round_cap() {
        assert_eq!(evaluate(0.0, 0.9, 0, 1), StopDecision::Stop(StopReason::MaxRounds));
        assert_eq!(evaluate(0.0, 0.9, 18, 20), StopDecision::Continue);
        assert_eq!(evaluate(0.0, 0.9, 19, 20), StopDecision::Stop(StopReason::MaxRounds));
    }

    #[test]
    fn test_final_order_breaks_ties_by_registration() {
        let scores = vec![3.0, 7.0, 3.0, 7.0, 1.0];
        assert_eq!(final_order(&scores), vec![1, 3, 0, 2, 4]);
    }
}
