//! Consensus scoring - vote-score agreement per project
//!
//! Derived on every read from the raw vote scores; never stored.

/// Consensus assigned when a project has exactly one vote. A single data
/// point cannot show disagreement, so it counts as unanimous by convention.
pub const SINGLE_VOTE_CONSENSUS: i64 = 100;

/// Agreement metric over a project's vote scores.
///
/// `None` with no votes. With one vote, `SINGLE_VOTE_CONSENSUS`. Otherwise
/// a linear decay of the population standard deviation: sigma 0 scores 100,
/// sigma >= `divisor` clamps to 0.
pub fn consensus_score(scores: &[f64], divisor: f64) -> Option<i64> {
    match scores.len() {
        0 => None,
        1 => Some(SINGLE_VOTE_CONSENSUS),
        n => {
            let n = n as f64;
            let mean = scores.iter().sum::<f64>() / n;
            let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            let std_dev = variance.sqrt();
            let score = (100.0 - (std_dev / divisor) * 100.0).round() as i64;
            Some(score.max(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIVISOR: f64 = 50.0;

    #[test]
    fn test_no_votes_is_unknown() {
        assert_eq!(consensus_score(&[], DIVISOR), None);
    }

    #[test]
    fn test_single_vote_is_unanimous() {
        assert_eq!(consensus_score(&[42.0], DIVISOR), Some(100));
        assert_eq!(consensus_score(&[0.0], DIVISOR), Some(100));
    }

    #[test]
    fn test_identical_scores() {
        assert_eq!(consensus_score(&[80.0, 80.0, 80.0], DIVISOR), Some(100));
    }

    #[test]
    fn test_maximum_disagreement() {
        // sigma = 50 exactly, decay bottoms out
        assert_eq!(consensus_score(&[0.0, 100.0], DIVISOR), Some(0));
    }

    #[test]
    fn test_clamped_at_zero() {
        // sigma > divisor would go negative without the clamp
        assert_eq!(consensus_score(&[0.0, 100.0], 40.0), Some(0));
    }

    #[test]
    fn test_moderate_spread() {
        // scores 60/80: mean 70, sigma 10 -> 100 - 20 = 80
        assert_eq!(consensus_score(&[60.0, 80.0], DIVISOR), Some(80));
    }
}
