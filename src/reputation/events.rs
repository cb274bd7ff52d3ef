//! Canonical Credit Events
//!
//! Behavioral facts produced by the external indexer. Each category carries
//! only the details its scoring formula reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event category as reported by the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Transaction,
    Staking,
    Lending,
    Attestation,
    Risk,
}

/// One observed behavioral fact. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEvent {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,

    /// Non-negative magnitude (token amount, volume)
    pub value: f64,

    /// Reserved category-local multiplier, not read by the default formulas
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(flatten)]
    pub details: EventDetails,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum EventDetails {
    Transaction,
    Staking(StakingDetails),
    Lending(LendingDetails),
    Attestation(AttestationDetails),
    Risk(RiskDetails),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakingAction {
    Stake,
    Unstake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingDetails {
    pub action: StakingAction,
    /// Lock duration in seconds
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendingAction {
    Borrow,
    Repay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingDetails {
    pub action: LendingAction,
    #[serde(default)]
    pub on_time: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationDetails {
    #[serde(default)]
    pub attestation_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    LatePayment,
    HighLeverage,
    SuspiciousActivity,
}

impl RiskType {
    /// Risk points contributed by one occurrence
    pub fn penalty(&self) -> f64 {
        match self {
            RiskType::LatePayment => 20.0,
            RiskType::HighLeverage => 15.0,
            RiskType::SuspiciousActivity => 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDetails {
    pub risk_type: RiskType,
}

impl CreditEvent {
    pub fn category(&self) -> EventCategory {
        match self.details {
            EventDetails::Transaction => EventCategory::Transaction,
            EventDetails::Staking(_) => EventCategory::Staking,
            EventDetails::Lending(_) => EventCategory::Lending,
            EventDetails::Attestation(_) => EventCategory::Attestation,
            EventDetails::Risk(_) => EventCategory::Risk,
        }
    }

    pub fn transaction(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self::with_details(timestamp, value, EventDetails::Transaction)
    }

    pub fn stake(timestamp: DateTime<Utc>, value: f64, duration: Option<u64>) -> Self {
        Self::with_details(
            timestamp,
            value,
            EventDetails::Staking(StakingDetails {
                action: StakingAction::Stake,
                duration,
            }),
        )
    }

    pub fn unstake(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self::with_details(
            timestamp,
            value,
            EventDetails::Staking(StakingDetails {
                action: StakingAction::Unstake,
                duration: None,
            }),
        )
    }

    pub fn borrow(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self::with_details(
            timestamp,
            value,
            EventDetails::Lending(LendingDetails {
                action: LendingAction::Borrow,
                on_time: false,
            }),
        )
    }

    pub fn repay(timestamp: DateTime<Utc>, value: f64, on_time: bool) -> Self {
        Self::with_details(
            timestamp,
            value,
            EventDetails::Lending(LendingDetails {
                action: LendingAction::Repay,
                on_time,
            }),
        )
    }

    pub fn attestation(timestamp: DateTime<Utc>, attestation_type: Option<&str>) -> Self {
        Self::with_details(
            timestamp,
            1.0,
            EventDetails::Attestation(AttestationDetails {
                attestation_type: attestation_type.map(str::to_string),
            }),
        )
    }

    pub fn risk(timestamp: DateTime<Utc>, risk_type: RiskType) -> Self {
        Self::with_details(timestamp, 0.0, EventDetails::Risk(RiskDetails { risk_type }))
    }

    fn with_details(timestamp: DateTime<Utc>, value: f64, details: EventDetails) -> Self {
        Self {
            timestamp,
            value,
            weight: default_weight(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserialize_indexer_json() {
        let raw = r#"[
            {"category":"lending","timestamp":1700000000,"value":1000.0,"action":"repay","onTime":true},
            {"category":"transaction","timestamp":1700000100,"value":5.5,"weight":2.0},
            {"category":"risk","timestamp":1700000200,"value":0,"riskType":"high_leverage"},
            {"category":"staking","timestamp":1700000300,"value":20,"action":"stake","duration":86400}
        ]"#;

        let events: Vec<CreditEvent> = serde_json::from_str(raw).unwrap();
        assert_eq!(events.len(), 4);

        assert_eq!(events[0].category(), EventCategory::Lending);
        assert_eq!(
            events[0].details,
            EventDetails::Lending(LendingDetails {
                action: LendingAction::Repay,
                on_time: true
            })
        );
        assert_eq!(events[0].weight, 1.0);
        assert_eq!(events[0].timestamp, Utc.timestamp_opt(1_700_000_000, 0).unwrap());

        assert_eq!(events[1].details, EventDetails::Transaction);
        assert_eq!(events[1].weight, 2.0);

        assert_eq!(
            events[2].details,
            EventDetails::Risk(RiskDetails {
                risk_type: RiskType::HighLeverage
            })
        );

        match &events[3].details {
            EventDetails::Staking(details) => assert_eq!(details.duration, Some(86_400)),
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_risk_type_rejected() {
        let raw = r#"{"category":"risk","timestamp":1,"value":0,"riskType":"rug_pull"}"#;
        assert!(serde_json::from_str::<CreditEvent>(raw).is_err());
    }

    #[test]
    fn test_risk_penalties() {
        assert_eq!(RiskType::LatePayment.penalty(), 20.0);
        assert_eq!(RiskType::HighLeverage.penalty(), 15.0);
        assert_eq!(RiskType::SuspiciousActivity.penalty(), 25.0);
    }
}
