//! Cryptographic utilities for score commitments
//!
//! Provides:
//! - Keccak-256 and ABI tuple encoding matching Solidity's `abi.encode`
//! - Merkle tree construction, inclusion proofs and verification
//! - Commitment signing through an injected capability (Ed25519 built in)

pub mod abi;
pub mod merkle;
pub mod signing;

pub use abi::{AbiToken, Address, Bytes32, hash_pair, keccak256};
pub use merkle::{
    Keccak256Hasher, MerkleHasher, MerkleProof, MerkleTree, build_leaves, generate_proof,
    generate_root, leaf_hash, tree_depth, verify_proof,
};
pub use signing::{
    CryptoSignature, Ed25519Signer, SignerRegistry, SigningCapability, commitment_message,
    sign_commitment, verify_signature,
};
