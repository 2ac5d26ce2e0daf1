//! Identity derivation from raw credentials
//!
//! A credential is an Ed25519 seed, given either as a Bech32 `suiprivkey1…`
//! string or as 64 hex characters (optionally `0x`-prefixed). Derivation is a
//! pure function: the same credential always yields the same identity.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};
use thiserror::Error;
use tracing::debug;

use crate::domain::Credential;

type Blake2b256 = Blake2b<U32>;

/// Human-readable prefix of Bech32-encoded private keys
const BECH32_PREFIX: &str = "suiprivkey";

/// Signature scheme flag for Ed25519
const ED25519_FLAG: u8 = 0x00;

/// Intent prefix for transaction data (scope, version, app id)
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

const SEED_LEN: usize = 32;

/// Errors that can occur while deriving an identity
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Empty credential")]
    Empty,

    #[error("Invalid encoding: {0}")]
    Encoding(String),

    #[error("Expected seed length {expected}, got {actual}")]
    SeedLength { expected: usize, actual: usize },
}

/// Signing identity for one task
///
/// Owned exclusively by its task; never shared.
pub struct Identity {
    signing_key: SigningKey,
    address: String,
}

impl Identity {
    fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let public_key = signing_key.verifying_key().to_bytes();

        let mut hasher = Blake2b256::new();
        hasher.update([ED25519_FLAG]);
        hasher.update(public_key);
        let address = format!("0x{}", hex::encode(hasher.finalize()));

        Self { signing_key, address }
    }

    /// On-chain address derived from the public key
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Raw Ed25519 public key
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign transaction bytes, returning the base64 serialized signature
    ///
    /// Layout: `flag ‖ signature(64) ‖ public_key(32)` over the BLAKE2b-256
    /// digest of the intent message.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(tx_bytes);
        let digest = hasher.finalize();

        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&self.public_key());
        BASE64.encode(serialized)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity").field("address", &self.address).finish_non_exhaustive()
    }
}

/// Derives signing identities from credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProvider;

impl IdentityProvider {
    /// Derive the identity for a credential
    pub fn derive(credential: &Credential) -> Result<Identity, IdentityError> {
        let secret = credential.expose().trim();
        if secret.is_empty() {
            return Err(IdentityError::Empty);
        }

        let seed = if secret.starts_with(BECH32_PREFIX) {
            debug!("IdentityProvider::derive: bech32 credential");
            let (_, data) = bech32::decode(secret).map_err(|e| IdentityError::Encoding(e.to_string()))?;
            // Payload is `flag ‖ seed`; a bare seed is accepted too
            if data.len() == SEED_LEN + 1 {
                data[1..].to_vec()
            } else {
                data
            }
        } else {
            debug!("IdentityProvider::derive: hex credential");
            let cleaned = secret.strip_prefix("0x").unwrap_or(secret);
            hex::decode(cleaned).map_err(|e| IdentityError::Encoding(e.to_string()))?
        };

        let seed: [u8; SEED_LEN] = seed.as_slice().try_into().map_err(|_| IdentityError::SeedLength {
            expected: SEED_LEN,
            actual: seed.len(),
        })?;

        Ok(Identity::from_seed(seed))
    }
}
