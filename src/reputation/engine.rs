//! Scoring Engine - Main Orchestrator
//!
//! Runs the calculators, aggregates the total, commits the components to a
//! Merkle tree and has the commitment signed. Scoring and commitment are pure;
//! only signing suspends, and the signer is passed per call.

use crate::crypto::abi::{self, Address, Bytes32};
use crate::crypto::merkle::{self, MerkleProof, MerkleTree};
use crate::crypto::signing::{self, SigningCapability};
use crate::errors::{CreditError, CreditResult};
use crate::reputation::aggregator;
use crate::reputation::bundle::CreditScore;
use crate::reputation::calculator;
use crate::reputation::events::CreditEvent;
use crate::reputation::score::ScoreBreakdown;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const DEFAULT_TREE_CACHE_CAPACITY: usize = 1024;

/// Scores and total of one history, before commitment
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHistory {
    pub breakdown: ScoreBreakdown,
    pub total_score: u32,
}

/// One user's history queued for batch scoring
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub user: Address,
    pub events: Vec<CreditEvent>,
}

pub struct ScoringEngine {
    /// Built trees keyed by the hash of their leaf sequence
    tree_cache: Arc<RwLock<HashMap<Bytes32, Arc<MerkleTree>>>>,
    tree_cache_capacity: usize,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_TREE_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(tree_cache_capacity: usize) -> Self {
        Self {
            tree_cache: Arc::new(RwLock::new(HashMap::new())),
            tree_cache_capacity,
        }
    }

    /// Compute the five components and the clamped total
    pub fn score(&self, events: &[CreditEvent], as_of: DateTime<Utc>) -> ScoredHistory {
        let breakdown = calculator::compute_breakdown(events, as_of);
        let total_score = aggregator::total_score(&breakdown);

        debug!(
            events = events.len(),
            repayment = breakdown.repayment.score,
            staking = breakdown.staking.score,
            activity = breakdown.activity.score,
            attestation = breakdown.attestation.score,
            risk = breakdown.risk.score,
            total_score,
            "Scored credit history"
        );

        ScoredHistory {
            breakdown,
            total_score,
        }
    }

    /// Get the tree for a leaf sequence, building and caching it on a miss
    pub async fn tree(&self, leaves: &[Bytes32]) -> CreditResult<Arc<MerkleTree>> {
        let key = leaf_sequence_key(leaves);

        {
            let cache = self.tree_cache.read().await;
            if let Some(tree) = cache.get(&key) {
                return Ok(tree.clone());
            }
        }

        let tree = Arc::new(MerkleTree::build(leaves)?);

        if self.tree_cache_capacity > 0 {
            let mut cache = self.tree_cache.write().await;
            if cache.len() >= self.tree_cache_capacity {
                debug!(entries = cache.len(), "Tree cache full, clearing");
                cache.clear();
            }
            cache.insert(key, tree.clone());
        }

        Ok(tree)
    }

    /// Inclusion proof served from the tree cache
    pub async fn prove(&self, leaves: &[Bytes32], leaf_index: usize) -> CreditResult<MerkleProof> {
        if leaf_index >= leaves.len() {
            return Err(CreditError::IndexOutOfRange {
                index: leaf_index,
                len: leaves.len(),
            });
        }
        self.tree(leaves).await?.proof(leaf_index)
    }

    pub async fn cached_trees(&self) -> usize {
        self.tree_cache.read().await.len()
    }

    /// Score, commit and sign one user's history
    pub async fn build_bundle<S: SigningCapability>(
        &self,
        user: &Address,
        events: &[CreditEvent],
        as_of: DateTime<Utc>,
        signer: &S,
    ) -> CreditResult<CreditScore> {
        // The commitment message carries the time as uint256
        let timestamp = u64::try_from(as_of.timestamp())
            .map_err(|_| CreditError::InvalidTimestamp(as_of.timestamp()))?;

        let scored = self.score(events, as_of);
        let components = scored.breakdown.components();

        let leaves = merkle::build_leaves(&components, user);
        let merkle_root = self.tree(&leaves).await?.root();

        let indexer_signature = signing::sign_commitment(user, &merkle_root, timestamp, signer)
            .await
            .map_err(|e| {
                warn!(user = %user, error = %e, "Bundle signing failed");
                e
            })?;

        info!(
            user = %user,
            total_score = scored.total_score,
            merkle_root = %hex::encode(merkle_root),
            "Built credit score bundle"
        );

        Ok(CreditScore {
            total_score: scored.total_score,
            components,
            timestamp,
            user_address: *user,
            merkle_root,
            proof_leaves: leaves,
            indexer_signature,
        })
    }

    /// Build bundles for independent users concurrently.
    ///
    /// Results keep request order; one user's failure does not affect others.
    pub async fn score_batch<S: SigningCapability>(
        &self,
        requests: &[ScoreRequest],
        as_of: DateTime<Utc>,
        signer: &S,
    ) -> Vec<CreditResult<CreditScore>> {
        let results = join_all(
            requests
                .iter()
                .map(|request| self.build_bundle(&request.user, &request.events, as_of, signer)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            users = requests.len(),
            failed,
            "Batch scoring complete"
        );

        results
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn leaf_sequence_key(leaves: &[Bytes32]) -> Bytes32 {
    abi::keccak256(&leaves.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signing::Ed25519Signer;
    use crate::errors::SigningError;
    use crate::reputation::events::RiskType;
    use chrono::TimeZone;

    struct OfflineSigner;

    impl SigningCapability for OfflineSigner {
        async fn sign_digest(
            &self,
            _digest: &Bytes32,
        ) -> Result<signing::CryptoSignature, SigningError> {
            Err(SigningError::Unavailable("hsm offline".to_string()))
        }
    }

    fn as_of() -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000, 0).unwrap()
    }

    fn user() -> Address {
        "0x2222222222222222222222222222222222222222".parse().unwrap()
    }

    #[test]
    fn test_empty_history_scores_zero() {
        let engine = ScoringEngine::new();
        let scored = engine.score(&[], as_of());
        assert_eq!(scored.total_score, 0);
    }

    #[tokio::test]
    async fn test_bundle_is_self_consistent() {
        let engine = ScoringEngine::new();
        let signer = Ed25519Signer::generate();
        let events = vec![
            CreditEvent::borrow(as_of(), 100.0),
            CreditEvent::repay(as_of(), 100.0, true),
            CreditEvent::risk(as_of(), RiskType::LatePayment),
        ];

        let bundle = engine
            .build_bundle(&user(), &events, as_of(), &signer)
            .await
            .unwrap();

        assert_eq!(bundle.total_score, 380);
        assert_eq!(bundle.components.len(), 5);
        assert_eq!(bundle.proof_leaves.len(), 5);
        assert_eq!(bundle.timestamp, 1_750_000_000);
        assert!(bundle.verify_commitment());
        for i in 0..5 {
            assert!(bundle.verify_component(i));
        }
    }

    #[tokio::test]
    async fn test_signing_failure_surfaces() {
        let engine = ScoringEngine::new();
        let result = engine.build_bundle(&user(), &[], as_of(), &OfflineSigner).await;
        assert!(matches!(
            result,
            Err(CreditError::Signing(SigningError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_pre_epoch_evaluation_rejected() {
        let engine = ScoringEngine::new();
        let signer = Ed25519Signer::generate();
        let before_epoch = Utc.timestamp_opt(-86_400, 0).unwrap();

        let result = engine.build_bundle(&user(), &[], before_epoch, &signer).await;
        assert!(matches!(result, Err(CreditError::InvalidTimestamp(-86_400))));
    }

    #[tokio::test]
    async fn test_prove_rejects_missing_leaf() {
        let engine = ScoringEngine::new();
        assert!(matches!(
            engine.prove(&[], 0).await,
            Err(CreditError::IndexOutOfRange { index: 0, len: 0 })
        ));

        let leaves = [abi::keccak256(b"a"), abi::keccak256(b"b")];
        assert!(matches!(
            engine.prove(&leaves, 2).await,
            Err(CreditError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(engine.cached_trees().await, 0);
    }

    #[tokio::test]
    async fn test_tree_cache_reuse_and_eviction() {
        let engine = ScoringEngine::with_cache_capacity(2);
        let a = [abi::keccak256(b"a"), abi::keccak256(b"b")];
        let b = [abi::keccak256(b"c")];
        let c = [abi::keccak256(b"d"), abi::keccak256(b"e"), abi::keccak256(b"f")];

        let first = engine.tree(&a).await.unwrap();
        let again = engine.tree(&a).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        engine.tree(&b).await.unwrap();
        assert_eq!(engine.cached_trees().await, 2);

        engine.tree(&c).await.unwrap();
        assert_eq!(engine.cached_trees().await, 1);

        let proof = engine.prove(&c, 2).await.unwrap();
        assert!(proof.verify(&merkle::generate_root(&c).unwrap()));
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let engine = ScoringEngine::with_cache_capacity(0);
        engine.tree(&[abi::keccak256(b"a")]).await.unwrap();
        assert_eq!(engine.cached_trees().await, 0);
        assert!(matches!(engine.tree(&[]).await, Err(CreditError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let engine = ScoringEngine::new();
        let signer = Ed25519Signer::generate();
        let other: Address = "0x3333333333333333333333333333333333333333".parse().unwrap();

        let requests = vec![
            ScoreRequest {
                user: user(),
                events: vec![CreditEvent::attestation(as_of(), None)],
            },
            ScoreRequest {
                user: other,
                events: vec![],
            },
        ];

        let results = engine.score_batch(&requests, as_of(), &signer).await;
        assert_eq!(results.len(), 2);

        let first = results[0].as_ref().unwrap();
        let second = results[1].as_ref().unwrap();
        assert_eq!(first.user_address, user());
        assert_eq!(first.total_score, 20);
        assert_eq!(second.user_address, other);
        assert_eq!(second.total_score, 0);
    }
}
