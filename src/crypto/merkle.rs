use crate::crypto::abi::{self, AbiToken, Address, Bytes32};
use crate::errors::{CreditError, CreditResult};
use crate::reputation::ScoreComponent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Merkle commitment over score components
/// Leaves commit to one component and the scored address; internal nodes are
/// ordered pair hashes, so proofs check against an on-chain verifier as-is.

/// Node hash used to combine two children.
pub trait MerkleHasher {
    fn hash_pair(&self, left: &Bytes32, right: &Bytes32) -> Bytes32;
}

/// `keccak256(left ‖ right)`, the default node hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl MerkleHasher for Keccak256Hasher {
    fn hash_pair(&self, left: &Bytes32, right: &Bytes32) -> Bytes32 {
        abi::hash_pair(left, right)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    #[serde(with = "abi::serde_hex::bytes32")]
    pub leaf: Bytes32,
    #[serde(with = "abi::serde_hex::bytes32_vec")]
    pub siblings: Vec<Bytes32>,
    pub indices: Vec<u8>, // 1 = current node is the right child
}

/// Leaf for one component: `keccak256(abi.encode(name, score, maxScore, user))`.
pub fn leaf_hash(component: &ScoreComponent, user: &Address) -> Bytes32 {
    abi::hash_tuple(&[
        AbiToken::String(&component.name),
        AbiToken::Uint(component.score.into()),
        AbiToken::Uint(component.max_score.into()),
        AbiToken::Address(*user),
    ])
}

/// Build one leaf per component, preserving order.
pub fn build_leaves(components: &[ScoreComponent], user: &Address) -> Vec<Bytes32> {
    components.iter().map(|c| leaf_hash(c, user)).collect()
}

/// Fully materialized tree: level 0 holds the (padded) leaves, the last level
/// holds the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Bytes32>>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a Keccak-256 tree over the given leaves
    pub fn build(leaves: &[Bytes32]) -> CreditResult<Self> {
        Self::build_with(&Keccak256Hasher, leaves)
    }

    /// Build with an explicit node hasher.
    ///
    /// Every level with more than one node is padded to even length by
    /// duplicating its last node before pairing.
    pub fn build_with<H: MerkleHasher>(hasher: &H, leaves: &[Bytes32]) -> CreditResult<Self> {
        if leaves.is_empty() {
            return Err(CreditError::EmptyInput);
        }

        let mut levels = Vec::with_capacity(tree_depth(leaves.len()) + 1);
        let mut current = leaves.to_vec();

        while current.len() > 1 {
            if current.len() % 2 == 1 {
                let last = current[current.len() - 1];
                current.push(last);
            }

            let next: Vec<Bytes32> = current
                .chunks_exact(2)
                .map(|pair| hasher.hash_pair(&pair[0], &pair[1]))
                .collect();

            levels.push(current);
            current = next;
        }
        levels.push(current);

        debug!(
            leaves = leaves.len(),
            depth = levels.len() - 1,
            "Built Merkle tree"
        );

        Ok(Self {
            levels,
            leaf_count: leaves.len(),
        })
    }

    pub fn root(&self) -> Bytes32 {
        // build_with always pushes at least one level holding one node
        self.levels[self.levels.len() - 1][0]
    }

    pub fn levels(&self) -> &[Vec<Bytes32>] {
        &self.levels
    }

    /// Number of leaves before padding
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Generate an inclusion proof for the leaf at `leaf_index`.
    ///
    /// Padded levels always hold the sibling at `index ^ 1`; an unpaired node
    /// is proven against its own duplicate, matching how the root was built.
    pub fn proof(&self, leaf_index: usize) -> CreditResult<MerkleProof> {
        if leaf_index >= self.leaf_count {
            return Err(CreditError::IndexOutOfRange {
                index: leaf_index,
                len: self.leaf_count,
            });
        }

        let depth = self.levels.len() - 1;
        let mut siblings = Vec::with_capacity(depth);
        let mut indices = Vec::with_capacity(depth);
        let mut index = leaf_index;

        for level in &self.levels[..depth] {
            siblings.push(level[index ^ 1]);
            indices.push((index & 1) as u8);
            index /= 2;
        }

        Ok(MerkleProof {
            leaf: self.levels[0][leaf_index],
            siblings,
            indices,
        })
    }
}

/// Merkle root over `leaves`; a single leaf is its own root.
pub fn generate_root(leaves: &[Bytes32]) -> CreditResult<Bytes32> {
    Ok(MerkleTree::build(leaves)?.root())
}

/// Rebuilds the tree and proves the leaf at `leaf_index`.
pub fn generate_proof(leaves: &[Bytes32], leaf_index: usize) -> CreditResult<MerkleProof> {
    if leaf_index >= leaves.len() {
        return Err(CreditError::IndexOutOfRange {
            index: leaf_index,
            len: leaves.len(),
        });
    }
    MerkleTree::build(leaves)?.proof(leaf_index)
}

/// Verify a Keccak-256 inclusion proof. Malformed proofs fail closed.
pub fn verify_proof(leaf: &Bytes32, siblings: &[Bytes32], root: &Bytes32, indices: &[u8]) -> bool {
    verify_proof_with(&Keccak256Hasher, leaf, siblings, root, indices)
}

pub fn verify_proof_with<H: MerkleHasher>(
    hasher: &H,
    leaf: &Bytes32,
    siblings: &[Bytes32],
    root: &Bytes32,
    indices: &[u8],
) -> bool {
    if siblings.len() != indices.len() {
        debug!(
            siblings = siblings.len(),
            indices = indices.len(),
            "Rejecting malformed Merkle proof"
        );
        return false;
    }

    let mut current = *leaf;
    for (sibling, side) in siblings.iter().zip(indices) {
        current = match side {
            0 => hasher.hash_pair(&current, sibling),
            1 => hasher.hash_pair(sibling, &current),
            other => {
                debug!(side = other, "Rejecting Merkle proof with invalid side bit");
                return false;
            }
        };
    }

    current == *root
}

impl MerkleProof {
    pub fn verify(&self, root: &Bytes32) -> bool {
        verify_proof(&self.leaf, &self.siblings, root, &self.indices)
    }
}

/// `ceil(log2(leaf_count))`, i.e. the proof length for that many leaves.
pub fn tree_depth(leaf_count: usize) -> usize {
    if leaf_count <= 1 {
        return 0;
    }
    (usize::BITS - (leaf_count - 1).leading_zeros()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> Bytes32 {
        abi::keccak256(&[n])
    }

    #[test]
    fn test_single_leaf_is_root() {
        let x = leaf(7);
        assert_eq!(generate_root(&[x]).unwrap(), x);

        let proof = generate_proof(&[x], 0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_proof(&x, &proof.siblings, &x, &proof.indices));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(generate_root(&[]), Err(CreditError::EmptyInput)));
    }

    #[test]
    fn test_two_leaf_root() {
        let (a, b) = (leaf(1), leaf(2));
        assert_eq!(generate_root(&[a, b]).unwrap(), abi::hash_pair(&a, &b));
    }

    #[test]
    fn test_odd_leaf_padding() {
        let (a, b, c) = (leaf(1), leaf(2), leaf(3));
        assert_eq!(
            generate_root(&[a, b, c]).unwrap(),
            generate_root(&[a, b, c, c]).unwrap()
        );
    }

    #[test]
    fn test_odd_level_above_leaves_is_padded() {
        // 5 leaves -> 6 -> 3 (padded to 4) -> 2 -> 1
        let leaves: Vec<Bytes32> = (0..5).map(leaf).collect();
        let tree = MerkleTree::build(&leaves).unwrap();
        let widths: Vec<usize> = tree.levels().iter().map(Vec::len).collect();
        assert_eq!(widths, vec![6, 4, 2, 1]);
    }

    #[test]
    fn test_three_leaf_proofs_verify() {
        let leaves = [leaf(1), leaf(2), leaf(3)];
        let root = generate_root(&leaves).unwrap();

        for i in 0..leaves.len() {
            let proof = generate_proof(&leaves, i).unwrap();
            assert_eq!(proof.leaf, leaves[i]);
            assert_eq!(proof.siblings.len(), tree_depth(leaves.len()));
            assert!(proof.verify(&root), "proof for leaf {} failed", i);
        }
    }

    #[test]
    fn test_unpaired_leaf_proves_against_itself() {
        let leaves = [leaf(1), leaf(2), leaf(3)];
        let proof = generate_proof(&leaves, 2).unwrap();
        assert_eq!(proof.siblings[0], leaves[2]);
        assert_eq!(proof.indices, vec![0, 1]);
    }

    #[test]
    fn test_index_out_of_range() {
        let leaves = [leaf(1), leaf(2)];
        assert!(matches!(
            generate_proof(&leaves, 2),
            Err(CreditError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_verify_fails_closed() {
        let leaves = [leaf(1), leaf(2), leaf(3), leaf(4)];
        let root = generate_root(&leaves).unwrap();
        let proof = generate_proof(&leaves, 1).unwrap();

        assert!(!verify_proof(&proof.leaf, &proof.siblings, &root, &proof.indices[..1]));
        assert!(!verify_proof(&proof.leaf, &proof.siblings, &root, &[1, 2]));
        assert!(!verify_proof(&leaf(9), &proof.siblings, &root, &proof.indices));

        let mut flipped = proof.indices.clone();
        flipped[0] ^= 1;
        assert!(!verify_proof(&proof.leaf, &proof.siblings, &root, &flipped));
    }

    #[test]
    fn test_tree_depth() {
        assert_eq!(tree_depth(0), 0);
        assert_eq!(tree_depth(1), 0);
        assert_eq!(tree_depth(2), 1);
        assert_eq!(tree_depth(3), 2);
        assert_eq!(tree_depth(4), 2);
        assert_eq!(tree_depth(5), 3);
        assert_eq!(tree_depth(1024), 10);
        assert_eq!(tree_depth(1025), 11);
    }

    #[test]
    fn test_custom_hasher() {
        struct XorHasher;
        impl MerkleHasher for XorHasher {
            fn hash_pair(&self, left: &Bytes32, right: &Bytes32) -> Bytes32 {
                let mut out = [0u8; 32];
                for i in 0..32 {
                    out[i] = left[i] ^ right[i].rotate_left(1);
                }
                out
            }
        }

        let leaves = [leaf(1), leaf(2), leaf(3)];
        let tree = MerkleTree::build_with(&XorHasher, &leaves).unwrap();
        let proof = tree.proof(1).unwrap();
        assert!(verify_proof_with(
            &XorHasher,
            &proof.leaf,
            &proof.siblings,
            &tree.root(),
            &proof.indices
        ));
        assert_ne!(tree.root(), generate_root(&leaves).unwrap());
    }
}
