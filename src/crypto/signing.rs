use crate::crypto::abi::{self, AbiToken, Address, Bytes32};
use crate::errors::SigningError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Bundle signing
/// The engine never holds key material: a signing capability is passed to the
/// one call that needs it and is dropped by the caller afterwards.

pub const ED25519: &str = "Ed25519";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSignature {
    #[serde(with = "abi::serde_hex::bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "abi::serde_hex::bytes")]
    pub public_key: Vec<u8>,
    pub algorithm: String,
}

/// A secret-holding handle able to sign a 32-byte digest.
///
/// Signing may suspend (remote signer, HSM); failures are returned as-is and
/// never retried here.
///
/// [`Ed25519Signer`] embeds its public key in every signature and cannot be
/// recovered from `(digest, signature)`. A deployment anchored on an EVM
/// verifier that recovers the signer address must inject a recoverable
/// secp256k1 ECDSA capability instead.
pub trait SigningCapability {
    fn sign_digest(
        &self,
        digest: &Bytes32,
    ) -> impl Future<Output = Result<CryptoSignature, SigningError>> + Send;
}

/// In-process Ed25519 signer
pub struct Ed25519Signer {
    secret_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a fresh key from the OS RNG
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let mut secret_bytes: [u8; 32] = [0u8; 32];
        csprng.fill_bytes(&mut secret_bytes);

        Self::from_bytes(&secret_bytes)
    }

    pub fn from_bytes(secret_bytes: &[u8; 32]) -> Self {
        Self {
            secret_key: SigningKey::from_bytes(secret_bytes),
        }
    }

    /// Load a 32-byte secret given as 64 hex characters (optional `0x`)
    pub fn from_hex(secret_hex: &str) -> Result<Self, SigningError> {
        let stripped = secret_hex.strip_prefix("0x").unwrap_or(secret_hex);
        let mut secret_bytes = [0u8; 32];
        hex::decode_to_slice(stripped, &mut secret_bytes).map_err(|e| {
            SigningError::InvalidKey(format!("expected 32 hex-encoded bytes: {}", e))
        })?;
        Ok(Self::from_bytes(&secret_bytes))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.secret_key.verifying_key()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("public_key", &hex::encode(self.verifying_key().to_bytes()))
            .finish_non_exhaustive()
    }
}

impl SigningCapability for Ed25519Signer {
    async fn sign_digest(&self, digest: &Bytes32) -> Result<CryptoSignature, SigningError> {
        let signature = self.secret_key.sign(digest);

        Ok(CryptoSignature {
            signature: signature.to_bytes().to_vec(),
            public_key: self.verifying_key().to_bytes().to_vec(),
            algorithm: ED25519.to_string(),
        })
    }
}

/// `keccak256(abi.encode(address user, bytes32 root, uint256 timestamp))`
pub fn commitment_message(user: &Address, merkle_root: &Bytes32, timestamp: u64) -> Bytes32 {
    abi::hash_tuple(&[
        AbiToken::Address(*user),
        AbiToken::Bytes32(*merkle_root),
        AbiToken::Uint(timestamp.into()),
    ])
}

/// Sign the `(user, root, timestamp)` commitment with the given capability
pub async fn sign_commitment<S: SigningCapability>(
    user: &Address,
    merkle_root: &Bytes32,
    timestamp: u64,
    signer: &S,
) -> Result<CryptoSignature, SigningError> {
    let message = commitment_message(user, merkle_root, timestamp);
    let signature = signer.sign_digest(&message).await?;

    debug!(
        user = %user,
        timestamp,
        algorithm = %signature.algorithm,
        "Signed score commitment"
    );

    Ok(signature)
}

/// Verify an Ed25519 signature over a digest
pub fn verify_signature(signature: &CryptoSignature, digest: &Bytes32) -> Result<bool, SigningError> {
    if signature.algorithm != ED25519 {
        return Err(SigningError::InvalidKey(format!(
            "unsupported algorithm: {}",
            signature.algorithm
        )));
    }

    let public_key_bytes: [u8; 32] = signature
        .public_key
        .as_slice()
        .try_into()
        .map_err(|_| SigningError::InvalidKey("invalid public key length".to_string()))?;
    let public_key = VerifyingKey::from_bytes(&public_key_bytes)
        .map_err(|e| SigningError::InvalidKey(format!("invalid public key: {}", e)))?;

    let signature_bytes: [u8; 64] = match signature.signature.as_slice().try_into() {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    let sig = Signature::from_bytes(&signature_bytes);

    Ok(public_key.verify(digest, &sig).is_ok())
}

/// Set of signers whose bundles a consumer accepts
#[derive(Debug, Default, Clone)]
pub struct SignerRegistry {
    signers: HashMap<String, VerifyingKey>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize a signer under an entity id (indexer name, operator, ...)
    pub fn register(&mut self, entity_id: &str, key: VerifyingKey) {
        self.signers.insert(entity_id.to_string(), key);
    }

    pub fn revoke(&mut self, entity_id: &str) -> Option<VerifyingKey> {
        self.signers.remove(entity_id)
    }

    /// Entity id owning this public key, if authorized
    pub fn signer_of(&self, public_key: &[u8]) -> Option<&str> {
        self.signers
            .iter()
            .find(|(_, key)| key.as_bytes().as_slice() == public_key)
            .map(|(entity_id, _)| entity_id.as_str())
    }

    /// True iff the signature is valid and made by an authorized key
    pub fn verify(&self, signature: &CryptoSignature, digest: &Bytes32) -> bool {
        let Some(entity_id) = self.signer_of(&signature.public_key) else {
            warn!(
                public_key = %hex::encode(&signature.public_key),
                "Signature from unauthorized signer"
            );
            return false;
        };

        match verify_signature(signature, digest) {
            Ok(valid) => {
                debug!(signer = %entity_id, valid, "Checked commitment signature");
                valid
            }
            Err(e) => {
                warn!(signer = %entity_id, error = %e, "Malformed commitment signature");
                false
            }
        }
    }
}
