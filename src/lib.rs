//! Chert Credit Scoring
//!
//! Deterministic, explainable credit scores over normalized on-chain activity,
//! committed to a Merkle tree and signed for on-chain anchoring.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Scoring run entrypoint
//! ├── config.rs      - Configuration management
//! ├── errors.rs      - Error types
//! ├── crypto/        - Commitment primitives
//! │   ├── abi.rs     - Keccak-256 and ABI tuple encoding
//! │   ├── merkle.rs  - Merkle tree, proofs and verification
//! │   └── signing.rs - Commitment signing (Ed25519)
//! └── reputation/    - Credit scoring
//!     ├── events.rs     - Canonical indexer events
//!     ├── score.rs      - Components, ceilings & rationale buckets
//!     ├── calculator.rs - Per-category score formulas
//!     ├── aggregator.rs - Clamped total
//!     ├── bundle.rs     - Signed score bundle
//!     └── engine.rs     - Orchestrator
//! ```

pub mod config;
pub mod crypto;
pub mod errors;
pub mod reputation;

// Re-export main types for convenience
pub use config::CreditConfig;
pub use crypto::{
    Address, Bytes32, CryptoSignature, Ed25519Signer, MerkleProof, MerkleTree, SignerRegistry,
    SigningCapability, build_leaves, generate_proof, generate_root, tree_depth, verify_proof,
};
pub use errors::{CreditError, CreditResult, SigningError};
pub use reputation::{
    CreditEvent, CreditScore, EventCategory, RiskType, ScoreBreakdown, ScoreCategory,
    ScoreComponent, ScoreRequest, ScoringEngine,
};
