//! Credit Scoring
//!
//! Turns an indexer's categorized events into a bounded, explainable score.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────┐
//! │ CreditEvent  │────►│ calculator (x5)  │────►│ ScoreBreakdown │
//! │ (indexer)    │     │ pure, per-cat.   │     │ (components)   │
//! └──────────────┘     └──────────────────┘     └────────────────┘
//!                                                   │         │
//!                                                   ▼         ▼
//!                                           aggregator   crypto::merkle
//!                                           (total)      (leaves, root)
//!                                                   │         │
//!                                                   ▼         ▼
//!                                             ┌──────────────────┐
//!                                             │ ScoringEngine    │──► CreditScore
//!                                             │ (signs root)     │
//!                                             └──────────────────┘
//! ```
//!
//! ## Score Model
//!
//! - repayment 0-400, staking 0-250, activity 0-200, attestation 0-100
//! - risk 0-50, subtracted from the sum
//! - total clamped to 0-1000 once, after summing

pub mod aggregator;
pub mod bundle;
pub mod calculator;
pub mod engine;
pub mod events;
mod score;

pub use aggregator::{MAX_TOTAL_SCORE, total_score};
pub use bundle::CreditScore;
pub use calculator::compute_breakdown;
pub use engine::{ScoreRequest, ScoredHistory, ScoringEngine};
pub use events::{
    AttestationDetails, CreditEvent, EventCategory, EventDetails, LendingAction, LendingDetails,
    RiskDetails, RiskType, StakingAction, StakingDetails,
};
pub use score::{ScoreBreakdown, ScoreCategory, ScoreComponent};
