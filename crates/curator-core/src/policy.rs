//! Acceptance policy: keep an image when its score reaches the threshold.

/// Whether a scored image is kept for the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
}

/// Decide acceptance for a score. The comparison is inclusive, so a score
/// equal to the threshold is accepted. A NaN score is never accepted.
pub fn decide(score: f32, threshold: f32) -> Decision {
    if score >= threshold {
        Decision::Accepted
    } else {
        Decision::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_iff_score_at_or_above_threshold() {
        let steps: Vec<f32> = (0..=20).map(|i| i as f32 * 0.05).collect();
        for &score in &steps {
            for &threshold in &steps {
                let expected = if score >= threshold {
                    Decision::Accepted
                } else {
                    Decision::Rejected
                };
                assert_eq!(decide(score, threshold), expected, "{score} vs {threshold}");
            }
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(decide(0.8, 0.8), Decision::Accepted);
        assert_eq!(decide(0.79, 0.8), Decision::Rejected);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(decide(0.0, 0.0), Decision::Accepted);
        assert_eq!(decide(1.0, 1.0), Decision::Accepted);
        assert_eq!(decide(0.99, 1.0), Decision::Rejected);
    }

    #[test]
    fn test_nan_is_rejected() {
        assert_eq!(decide(f32::NAN, 0.0), Decision::Rejected);
    }
}
