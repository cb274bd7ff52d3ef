//! Per-Category Score Calculators
//!
//! Five independent, total functions over the event list. Each one reads only
//! the events of its own category; an empty or unrelated history scores 0.

use crate::reputation::events::{CreditEvent, EventDetails, LendingAction, StakingAction};
use crate::reputation::score::{ScoreBreakdown, ScoreCategory, ScoreComponent};
use chrono::{DateTime, Duration, Utc};

pub const ONE_YEAR_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

const RECENT_WINDOW_DAYS: i64 = 30;
const MEDIUM_WINDOW_DAYS: i64 = 90;

/// Repayment: share of borrowed value repaid, plus share of repayments on time
pub fn repayment_score(events: &[CreditEvent]) -> ScoreComponent {
    let mut total_borrowed = 0.0;
    let mut total_repaid = 0.0;
    let mut repayments = 0u32;
    let mut on_time = 0u32;

    for event in events {
        let EventDetails::Lending(details) = &event.details else {
            continue;
        };
        match details.action {
            LendingAction::Borrow => total_borrowed += event.value,
            // Zero-value repayments settle nothing and are not counted
            LendingAction::Repay if event.value > 0.0 => {
                total_repaid += event.value;
                repayments += 1;
                if details.on_time {
                    on_time += 1;
                }
            }
            LendingAction::Repay => {}
        }
    }

    let repaid_ratio = if total_borrowed > 0.0 {
        total_repaid / total_borrowed
    } else {
        0.0
    };
    let on_time_ratio = if repayments > 0 {
        on_time as f64 / repayments as f64
    } else {
        0.0
    };

    ScoreCategory::Repayment.component((repaid_ratio * 300.0).min(300.0) + on_time_ratio * 100.0)
}

/// Staking: amount currently staked plus average lock duration
pub fn staking_score(events: &[CreditEvent]) -> ScoreComponent {
    let mut total_staked: f64 = 0.0;
    let mut duration_sum = 0.0;
    let mut duration_count = 0u32;

    for event in events {
        let EventDetails::Staking(details) = &event.details else {
            continue;
        };
        match details.action {
            StakingAction::Stake => total_staked += event.value,
            StakingAction::Unstake => total_staked = (total_staked - event.value).max(0.0),
        }
        if let Some(duration) = details.duration {
            duration_sum += duration as f64;
            duration_count += 1;
        }
    }

    let avg_duration = if duration_count > 0 {
        duration_sum / duration_count as f64
    } else {
        0.0
    };

    let amount_points = ((total_staked / 10.0) * 150.0).min(150.0);
    let duration_points = ((avg_duration / ONE_YEAR_SECONDS) * 100.0).min(100.0);

    ScoreCategory::Staking.component(amount_points + duration_points)
}

/// Activity: recency-weighted transaction count plus total volume.
///
/// Windows are measured back from `as_of`; transactions dated after `as_of`
/// count as recent.
pub fn activity_score(events: &[CreditEvent], as_of: DateTime<Utc>) -> ScoreComponent {
    let recent_cutoff = as_of - Duration::days(RECENT_WINDOW_DAYS);
    let medium_cutoff = as_of - Duration::days(MEDIUM_WINDOW_DAYS);

    let mut recent = 0u32;
    let mut medium = 0u32;
    let mut total_volume = 0.0;

    for event in events {
        if !matches!(event.details, EventDetails::Transaction) {
            continue;
        }
        total_volume += event.value;
        if event.timestamp >= recent_cutoff {
            recent += 1;
        } else if event.timestamp >= medium_cutoff {
            medium += 1;
        }
    }

    let frequency_points = (recent as f64 * 10.0 + medium as f64 * 5.0).min(100.0);
    let volume_points = ((total_volume / 100.0) * 100.0).min(100.0);

    ScoreCategory::Activity.component(frequency_points + volume_points)
}

pub fn attestation_score(events: &[CreditEvent]) -> ScoreComponent {
    let count = events
        .iter()
        .filter(|e| matches!(e.details, EventDetails::Attestation(_)))
        .count();

    ScoreCategory::Attestation.component((count as f64 * 20.0).min(100.0))
}

/// Risk: fixed penalty per risk type, summed and capped
pub fn risk_score(events: &[CreditEvent]) -> ScoreComponent {
    let sum: f64 = events
        .iter()
        .filter_map(|e| match &e.details {
            EventDetails::Risk(details) => Some(details.risk_type.penalty()),
            _ => None,
        })
        .sum();

    ScoreCategory::Risk.component(sum.min(50.0))
}

/// Run all five calculators over one user's history
pub fn compute_breakdown(events: &[CreditEvent], as_of: DateTime<Utc>) -> ScoreBreakdown {
    ScoreBreakdown {
        repayment: repayment_score(events),
        staking: staking_score(events),
        activity: activity_score(events, as_of),
        attestation: attestation_score(events),
        risk: risk_score(events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reputation::events::RiskType;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    #[test]
    fn test_repayment_full_on_time() {
        let events = vec![
            CreditEvent::borrow(days_ago(60), 1000.0),
            CreditEvent::repay(days_ago(30), 1000.0, true),
            CreditEvent::repay(days_ago(10), 0.0, false),
        ];
        let component = repayment_score(&events);
        assert_eq!(component.score, 400);
        assert_eq!(component.reason, "Excellent repayment history");
    }

    #[test]
    fn test_repayment_partial_and_late() {
        let events = vec![
            CreditEvent::borrow(days_ago(60), 1000.0),
            CreditEvent::repay(days_ago(30), 250.0, true),
            CreditEvent::repay(days_ago(20), 250.0, false),
        ];
        // 0.5 * 300 + 0.5 * 100
        assert_eq!(repayment_score(&events).score, 200);
    }

    #[test]
    fn test_repayment_without_borrowing() {
        let events = vec![CreditEvent::repay(days_ago(5), 100.0, true)];
        // repaid ratio is 0 with nothing borrowed; on-time ratio still counts
        assert_eq!(repayment_score(&events).score, 100);
    }

    #[test]
    fn test_over_repayment_capped() {
        let events = vec![
            CreditEvent::borrow(days_ago(60), 100.0),
            CreditEvent::repay(days_ago(30), 500.0, true),
        ];
        assert_eq!(repayment_score(&events).score, 400);
    }

    #[test]
    fn test_staking_amount_and_duration() {
        let events = vec![
            CreditEvent::stake(days_ago(100), 5.0, Some(ONE_YEAR_SECONDS as u64 / 2)),
            CreditEvent::stake(days_ago(50), 5.0, Some(ONE_YEAR_SECONDS as u64 / 2)),
        ];
        // min(1.0 * 150, 150) + 0.5 * 100
        assert_eq!(staking_score(&events).score, 200);
    }

    #[test]
    fn test_unstake_reduces_stake_floor_zero() {
        let events = vec![
            CreditEvent::stake(days_ago(100), 2.0, None),
            CreditEvent::unstake(days_ago(50), 10.0),
        ];
        assert_eq!(staking_score(&events).score, 0);
    }

    #[test]
    fn test_activity_windows() {
        let events = vec![
            CreditEvent::transaction(days_ago(1), 10.0),
            CreditEvent::transaction(days_ago(29), 10.0),
            CreditEvent::transaction(days_ago(45), 10.0),
            CreditEvent::transaction(days_ago(200), 10.0),
            CreditEvent::transaction(now() + Duration::days(1), 10.0),
        ];
        // 3 recent * 10 + 1 medium * 5 = 35; volume 50 -> 50
        assert_eq!(activity_score(&events, now()).score, 85);
    }

    #[test]
    fn test_activity_caps() {
        let events: Vec<CreditEvent> = (0..20)
            .map(|i| CreditEvent::transaction(days_ago(i), 1000.0))
            .collect();
        assert_eq!(activity_score(&events, now()).score, 200);
    }

    #[test]
    fn test_attestation_count() {
        let three: Vec<CreditEvent> = (0..3)
            .map(|_| CreditEvent::attestation(days_ago(3), Some("kyc")))
            .collect();
        assert_eq!(attestation_score(&three).score, 60);

        let many: Vec<CreditEvent> = (0..9)
            .map(|_| CreditEvent::attestation(days_ago(3), None))
            .collect();
        assert_eq!(attestation_score(&many).score, 100);
    }

    #[test]
    fn test_risk_sum_capped() {
        let one = vec![CreditEvent::risk(days_ago(2), RiskType::HighLeverage)];
        assert_eq!(risk_score(&one).score, 15);

        let many = vec![
            CreditEvent::risk(days_ago(2), RiskType::LatePayment),
            CreditEvent::risk(days_ago(2), RiskType::SuspiciousActivity),
            CreditEvent::risk(days_ago(2), RiskType::HighLeverage),
        ];
        assert_eq!(risk_score(&many).score, 50);
    }

    #[test]
    fn test_calculators_ignore_other_categories() {
        let events = vec![
            CreditEvent::risk(days_ago(2), RiskType::LatePayment),
            CreditEvent::attestation(days_ago(2), None),
        ];
        assert_eq!(repayment_score(&events).score, 0);
        assert_eq!(staking_score(&events).score, 0);
        assert_eq!(activity_score(&events, now()).score, 0);
    }

    #[test]
    fn test_empty_history_scores_lowest_bucket() {
        let breakdown = compute_breakdown(&[], now());
        for component in breakdown.components() {
            assert_eq!(component.score, 0, "{}", component.name);
        }
        assert_eq!(breakdown.risk.reason, ScoreCategory::Risk.lowest_reason());
        assert_eq!(breakdown.repayment.reason, ScoreCategory::Repayment.lowest_reason());
    }
}
