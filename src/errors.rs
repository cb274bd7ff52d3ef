//! Error types for scoring, commitment and signing.

use thiserror::Error;

/// Errors surfaced by the commitment engine and bundle builder.
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("cannot build a Merkle tree over zero leaves")]
    EmptyInput,

    #[error("leaf index {index} out of range (tree has {len} leaves)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("evaluation time {0} is before the unix epoch")]
    InvalidTimestamp(i64),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),
}

/// Failures reported by a signing capability.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signer rejected the request: {0}")]
    Rejected(String),

    #[error("signer unavailable: {0}")]
    Unavailable(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

pub type CreditResult<T> = std::result::Result<T, CreditError>;
