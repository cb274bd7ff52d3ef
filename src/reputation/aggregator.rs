//! Total score aggregation

use crate::reputation::score::ScoreBreakdown;

pub const MAX_TOTAL_SCORE: u32 = 1000;

/// `clamp(repayment + staking + activity + attestation - risk, 0, 1000)`,
/// clamped once after summing.
pub fn total_score(breakdown: &ScoreBreakdown) -> u32 {
    let positive = i64::from(breakdown.repayment.score)
        + i64::from(breakdown.staking.score)
        + i64::from(breakdown.activity.score)
        + i64::from(breakdown.attestation.score);
    let total = positive - i64::from(breakdown.risk.score);

    total.clamp(0, i64::from(MAX_TOTAL_SCORE)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reputation::score::ScoreCategory;

    fn breakdown(scores: [f64; 5]) -> ScoreBreakdown {
        ScoreBreakdown {
            repayment: ScoreCategory::Repayment.component(scores[0]),
            staking: ScoreCategory::Staking.component(scores[1]),
            activity: ScoreCategory::Activity.component(scores[2]),
            attestation: ScoreCategory::Attestation.component(scores[3]),
            risk: ScoreCategory::Risk.component(scores[4]),
        }
    }

    #[test]
    fn test_risk_subtracted() {
        assert_eq!(total_score(&breakdown([300.0, 100.0, 50.0, 20.0, 35.0])), 435);
    }

    #[test]
    fn test_maximum_total() {
        // positive ceilings sum to 950; risk only subtracts
        assert_eq!(total_score(&breakdown([400.0, 250.0, 200.0, 100.0, 0.0])), 950);
        assert_eq!(total_score(&breakdown([400.0, 250.0, 200.0, 100.0, 50.0])), 900);
    }

    #[test]
    fn test_clamped_at_zero() {
        assert_eq!(total_score(&breakdown([10.0, 0.0, 5.0, 0.0, 50.0])), 0);
    }
}
