//! Signed Credit Score Bundle
//!
//! Immutable snapshot of one scoring run: the total, the components, the
//! Merkle commitment over them and the indexer's signature on the commitment.

use crate::crypto::abi::{self, Address, Bytes32};
use crate::crypto::merkle::{self, MerkleProof};
use crate::crypto::signing::{self, CryptoSignature, SignerRegistry};
use crate::errors::CreditResult;
use crate::reputation::score::ScoreComponent;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScore {
    pub total_score: u32,
    pub components: Vec<ScoreComponent>,
    /// Unix seconds the score was evaluated at
    pub timestamp: u64,
    pub user_address: Address,
    #[serde(with = "abi::serde_hex::bytes32")]
    pub merkle_root: Bytes32,
    /// Every leaf, in component order
    #[serde(with = "abi::serde_hex::bytes32_vec")]
    pub proof_leaves: Vec<Bytes32>,
    pub indexer_signature: CryptoSignature,
}

impl CreditScore {
    /// Inclusion proof for the component at `index`
    pub fn proof(&self, index: usize) -> CreditResult<MerkleProof> {
        merkle::generate_proof(&self.proof_leaves, index)
    }

    /// Digest the indexer signed
    pub fn message_hash(&self) -> Bytes32 {
        signing::commitment_message(&self.user_address, &self.merkle_root, self.timestamp)
    }

    /// Check that the leaves commit to the listed components and that the
    /// root is built from those leaves.
    pub fn verify_commitment(&self) -> bool {
        let leaves = merkle::build_leaves(&self.components, &self.user_address);
        if leaves != self.proof_leaves {
            debug!(user = %self.user_address, "Bundle leaves do not match components");
            return false;
        }

        match merkle::generate_root(&leaves) {
            Ok(root) => root == self.merkle_root,
            Err(_) => false,
        }
    }

    /// Check one component against the root without trusting the other leaves
    pub fn verify_component(&self, index: usize) -> bool {
        let Some(component) = self.components.get(index) else {
            return false;
        };
        let Ok(proof) = self.proof(index) else {
            return false;
        };

        proof.leaf == merkle::leaf_hash(component, &self.user_address)
            && proof.verify(&self.merkle_root)
    }

    /// Signature is valid and made by an authorized indexer
    pub fn verify_signature(&self, registry: &SignerRegistry) -> bool {
        registry.verify(&self.indexer_signature, &self.message_hash())
    }
}
