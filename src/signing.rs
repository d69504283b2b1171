//! Signature primitives for match results and settlement records.
//!
//! ## Trust Model
//!
//! Two signing identities exist in the protocol:
//!
//! - the **matching network key** signs [`MatchResult`](crate::types::MatchResult)
//!   payloads; the result processor rejects anything else with `BadSignature`
//! - the **submission authority key** signs [`TradeSettlement`](crate::types::TradeSettlement)
//!   records; the settlement bridge rejects anything else with `BadSignature`
//!
//! Verification failures are authenticity errors: tampering or key
//! misconfiguration, never retried automatically.

use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signature, Signer, Verifier};
use thiserror::Error;

use crate::types::settlement::SIGNATURE_LEN;

/// Width of a public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Key material errors.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The provided seed or key bytes are not valid ed25519 material
    #[error("invalid key material: {0}")]
    InvalidKey(#[from] ed25519_dalek::SignatureError),
}

// ============================================================================
// Verification
// ============================================================================

/// Verify `signature` over `payload` against `expected_key`.
///
/// Returns `false` for malformed keys or signatures as well as for honest
/// verification failures; the caller cannot distinguish these and must not
/// retry either.
pub fn verify(payload: &[u8], signature: &[u8; SIGNATURE_LEN], expected_key: &[u8; PUBLIC_KEY_LEN]) -> bool {
    let key = match PublicKey::from_bytes(expected_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let sig = match Signature::try_from(&signature[..]) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    key.verify(payload, &sig).is_ok()
}

// ============================================================================
// Signing
// ============================================================================

/// An ed25519 signing identity (matching network or submission authority).
pub struct Ed25519Signer {
    keypair: Keypair,
}

impl Ed25519Signer {
    /// Construct a signer from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, SigningError> {
        let secret = SecretKey::from_bytes(seed)?;
        let public = PublicKey::from(&secret);
        Ok(Self {
            keypair: Keypair { secret, public },
        })
    }

    /// The signer's public key bytes.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.keypair.public.to_bytes()
    }

    /// Sign a payload, returning the 64-byte signature.
    pub fn sign(&self, payload: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.keypair.sign(payload).to_bytes()
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secret material
        f.debug_struct("Ed25519Signer")
            .field("public_key", &hex::encode(self.public_key()))
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; 32] = [11u8; 32];

    #[test]
    fn test_sign_verify_roundtrip() {
        let signer = Ed25519Signer::from_seed(&SEED).unwrap();
        let payload = b"settlement payload";

        let signature = signer.sign(payload);
        assert!(verify(payload, &signature, &signer.public_key()));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let signer = Ed25519Signer::from_seed(&SEED).unwrap();
        let signature = signer.sign(b"original");

        assert!(!verify(b"tampered", &signature, &signer.public_key()));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let signer = Ed25519Signer::from_seed(&SEED).unwrap();
        let other = Ed25519Signer::from_seed(&[12u8; 32]).unwrap();
        let payload = b"payload";

        let signature = signer.sign(payload);
        assert!(!verify(payload, &signature, &other.public_key()));
    }

    #[test]
    fn test_verify_rejects_corrupted_signature() {
        let signer = Ed25519Signer::from_seed(&SEED).unwrap();
        let payload = b"payload";

        let mut signature = signer.sign(payload);
        signature[0] ^= 0xFF;
        assert!(!verify(payload, &signature, &signer.public_key()));
    }

    #[test]
    fn test_deterministic_keys_from_seed() {
        let a = Ed25519Signer::from_seed(&SEED).unwrap();
        let b = Ed25519Signer::from_seed(&SEED).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }
}
