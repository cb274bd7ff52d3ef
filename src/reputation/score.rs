//! Score Components and Rationale Buckets
//!
//! Each category contributes one bounded component. The rationale text is a
//! pure function of the component's score, looked up in a per-category table
//! of `(min_score, text)` thresholds ordered from highest to lowest.

use serde::{Deserialize, Serialize};

/// Scoring category, in commitment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Repayment,
    Staking,
    Activity,
    Attestation,
    Risk,
}

const REPAYMENT_REASONS: &[(u32, &str)] = &[
    (350, "Excellent repayment history"),
    (250, "Good repayment history"),
    (100, "Fair repayment history"),
    (0, "Limited repayment history"),
];

const STAKING_REASONS: &[(u32, &str)] = &[
    (200, "Strong long-term staking commitment"),
    (125, "Consistent staking participation"),
    (50, "Moderate staking activity"),
    (0, "Minimal staking activity"),
];

const ACTIVITY_REASONS: &[(u32, &str)] = &[
    (150, "Highly active on-chain presence"),
    (100, "Regular on-chain activity"),
    (40, "Occasional on-chain activity"),
    (0, "Low on-chain activity"),
];

const ATTESTATION_REASONS: &[(u32, &str)] = &[
    (80, "Extensively attested identity"),
    (40, "Well attested identity"),
    (20, "Some attestations on record"),
    (0, "No attestations on record"),
];

const RISK_REASONS: &[(u32, &str)] = &[
    (40, "High risk indicators detected"),
    (20, "Moderate risk indicators detected"),
    (1, "Minor risk indicators detected"),
    (0, "No risk indicators detected"),
];

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Repayment,
        ScoreCategory::Staking,
        ScoreCategory::Activity,
        ScoreCategory::Attestation,
        ScoreCategory::Risk,
    ];

    /// Label committed in the Merkle leaf
    pub fn name(&self) -> &'static str {
        match self {
            ScoreCategory::Repayment => "repayment",
            ScoreCategory::Staking => "staking",
            ScoreCategory::Activity => "activity",
            ScoreCategory::Attestation => "attestation",
            ScoreCategory::Risk => "risk",
        }
    }

    pub fn max_score(&self) -> u32 {
        match self {
            ScoreCategory::Repayment => 400,
            ScoreCategory::Staking => 250,
            ScoreCategory::Activity => 200,
            ScoreCategory::Attestation => 100,
            ScoreCategory::Risk => 50,
        }
    }

    /// Fractional contribution to the 1000-point total
    pub fn weight(&self) -> f64 {
        match self {
            ScoreCategory::Repayment => 0.40,
            ScoreCategory::Staking => 0.25,
            ScoreCategory::Activity => 0.20,
            ScoreCategory::Attestation => 0.10,
            ScoreCategory::Risk => 0.05,
        }
    }

    fn reasons(&self) -> &'static [(u32, &'static str)] {
        match self {
            ScoreCategory::Repayment => REPAYMENT_REASONS,
            ScoreCategory::Staking => STAKING_REASONS,
            ScoreCategory::Activity => ACTIVITY_REASONS,
            ScoreCategory::Attestation => ATTESTATION_REASONS,
            ScoreCategory::Risk => RISK_REASONS,
        }
    }

    /// First bucket whose threshold the score reaches
    pub fn reason_for(&self, score: u32) -> &'static str {
        let table = self.reasons();
        table
            .iter()
            .find(|(min_score, _)| score >= *min_score)
            .or(table.last())
            .map(|(_, text)| *text)
            .unwrap_or_default()
    }

    /// Text of the bottom bucket (what an empty history reports)
    pub fn lowest_reason(&self) -> &'static str {
        self.reason_for(0)
    }

    /// Clamp a raw formula result to `[0, max_score]`, floor it to the
    /// integer committed on-chain, and attach the matching rationale.
    pub fn component(&self, raw: f64) -> ScoreComponent {
        let max = self.max_score();
        // NaN saturates to 0 in the cast
        let score = (raw.clamp(0.0, max as f64).floor() as u32).min(max);

        ScoreComponent {
            name: self.name().to_string(),
            score,
            weight: self.weight(),
            reason: self.reason_for(score).to_string(),
            max_score: max,
        }
    }
}

/// One named, weighted sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub name: String,
    pub score: u32,
    pub weight: f64,
    pub reason: String,
    pub max_score: u32,
}

/// The five category components of one scoring run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub repayment: ScoreComponent,
    pub staking: ScoreComponent,
    pub activity: ScoreComponent,
    pub attestation: ScoreComponent,
    pub risk: ScoreComponent,
}

impl ScoreBreakdown {
    /// Components in commitment order (repayment, staking, activity,
    /// attestation, risk)
    pub fn components(&self) -> Vec<ScoreComponent> {
        vec![
            self.repayment.clone(),
            self.staking.clone(),
            self.activity.clone(),
            self.attestation.clone(),
            self.risk.clone(),
        ]
    }
}
