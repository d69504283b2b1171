//! Opaque transport envelope for encrypted orders.
//!
//! ## Padding Contract
//!
//! The ciphertext buffer is always exactly [`ENVELOPE_CAPACITY`] bytes, no
//! matter how large the true payload is, so observers cannot infer payload
//! size from ciphertext length. Batch computations seal one envelope per
//! order.
//!
//! ## Encryption Seam
//!
//! The sealing algorithm belongs to the confidential network's client
//! library, not to this crate. [`EnvelopeCipher`] is the seam: production
//! deployments plug the network's sealer in, and [`Sha256Keystream`] is a
//! deterministic stand-in for local pipelines and tests.
//!
//! ## Nonces
//!
//! The envelope nonce is stamped by the builder and exists only for
//! ciphertext freshness. It is unrelated to the order's own nonce, which
//! alone carries replay semantics.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::codec::order::encode_order;
use crate::types::order::DarkOrder;

/// Fixed ciphertext capacity of an envelope in bytes.
///
/// Large enough for one serialized order plus padding, and the unit the
/// confidential network ingests per computation argument.
pub const ENVELOPE_CAPACITY: usize = 256;

/// Envelope construction failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The payload exceeds the fixed envelope capacity
    #[error("payload of {0} bytes exceeds envelope capacity of {ENVELOPE_CAPACITY}")]
    PayloadTooLarge(usize),
}

// ============================================================================
// EncryptedEnvelope
// ============================================================================

/// Opaque transport wrapper around a sealed order payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Sealed payload, always padded to [`ENVELOPE_CAPACITY`]
    pub ciphertext: [u8; ENVELOPE_CAPACITY],

    /// Public key of the confidential network the payload is sealed to
    pub network_key: [u8; 32],

    /// Builder-stamped freshness nonce
    pub nonce: u64,
}

// ============================================================================
// EnvelopeCipher seam
// ============================================================================

/// Sealing primitive provided by the confidential network's client.
///
/// Implementations transform the padded plaintext buffer in place under
/// `(network_key, nonce)`. Length must be preserved: the padding contract is
/// the envelope's, not the cipher's.
pub trait EnvelopeCipher {
    /// Seal a padded payload buffer in place.
    fn seal(&self, buf: &mut [u8; ENVELOPE_CAPACITY], network_key: &[u8; 32], nonce: u64);
}

/// Deterministic stand-in cipher: SHA-256 keystream XOR.
///
/// Not a production sealer. It exists so local pipelines and tests can run
/// the full lifecycle without the confidential network's client library.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Keystream;

impl EnvelopeCipher for Sha256Keystream {
    fn seal(&self, buf: &mut [u8; ENVELOPE_CAPACITY], network_key: &[u8; 32], nonce: u64) {
        let mut offset = 0usize;
        let mut counter = 0u64;

        while offset < ENVELOPE_CAPACITY {
            let mut hasher = Sha256::new();
            hasher.update(network_key);
            hasher.update(nonce.to_le_bytes());
            hasher.update(counter.to_le_bytes());
            let block = hasher.finalize();

            for byte in block.iter().take(ENVELOPE_CAPACITY - offset) {
                buf[offset] ^= byte;
                offset += 1;
            }
            counter += 1;
        }
    }
}

// ============================================================================
// EnvelopeBuilder
// ============================================================================

/// Builds sealed envelopes and stamps freshness nonces.
#[derive(Debug)]
pub struct EnvelopeBuilder<C: EnvelopeCipher> {
    cipher: C,
    next_nonce: u64,
}

impl<C: EnvelopeCipher> EnvelopeBuilder<C> {
    /// Create a builder with the given cipher.
    ///
    /// `nonce_seed` initializes the freshness counter; callers typically pass
    /// a wall-clock-derived value so restarts do not reuse recent nonces.
    pub fn new(cipher: C, nonce_seed: u64) -> Self {
        Self {
            cipher,
            next_nonce: nonce_seed,
        }
    }

    /// Seal a single order into an envelope.
    ///
    /// The 177-byte encoding always fits; the capacity check stays for the
    /// day the wire layout grows.
    pub fn build(
        &mut self,
        order: &DarkOrder,
        network_key: &[u8; 32],
    ) -> Result<EncryptedEnvelope, EnvelopeError> {
        self.build_raw(&encode_order(order), network_key)
    }

    /// Seal an arbitrary payload, zero-padded to the fixed capacity.
    ///
    /// Batch computations seal one envelope per order rather than
    /// concatenating payloads; a payload larger than the capacity fails with
    /// [`EnvelopeError::PayloadTooLarge`].
    pub fn build_raw(
        &mut self,
        payload: &[u8],
        network_key: &[u8; 32],
    ) -> Result<EncryptedEnvelope, EnvelopeError> {
        if payload.len() > ENVELOPE_CAPACITY {
            return Err(EnvelopeError::PayloadTooLarge(payload.len()));
        }

        let nonce = self.next_nonce;
        self.next_nonce = self.next_nonce.wrapping_add(1);

        let mut buf = [0u8; ENVELOPE_CAPACITY];
        buf[..payload.len()].copy_from_slice(payload);
        self.cipher.seal(&mut buf, network_key, nonce);

        Ok(EncryptedEnvelope {
            ciphertext: buf,
            network_key: *network_key,
            nonce,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::order::{decode_order, ORDER_WIRE_LEN};
    use crate::types::order::Side;

    const NETWORK_KEY: [u8; 32] = [7u8; 32];

    fn sample_order(nonce: u64) -> DarkOrder {
        DarkOrder::new(
            [1u8; 32],
            Side::Long,
            1_000_000_000,
            200_000_000,
            50_000_000_000,
            5,
            [2u8; 32],
            [3u8; 32],
            [4u8; 32],
            1_700_000_000,
            nonce,
        )
    }

    fn unseal(envelope: &EncryptedEnvelope) -> [u8; ENVELOPE_CAPACITY] {
        // Keystream XOR is its own inverse
        let mut buf = envelope.ciphertext;
        Sha256Keystream.seal(&mut buf, &envelope.network_key, envelope.nonce);
        buf
    }

    #[test]
    fn test_envelope_fixed_capacity() {
        let mut builder = EnvelopeBuilder::new(Sha256Keystream, 1);
        let envelope = builder.build(&sample_order(1), &NETWORK_KEY).unwrap();

        assert_eq!(envelope.ciphertext.len(), ENVELOPE_CAPACITY);
        assert_eq!(envelope.network_key, NETWORK_KEY);
    }

    #[test]
    fn test_envelope_nonces_advance() {
        let mut builder = EnvelopeBuilder::new(Sha256Keystream, 100);

        let first = builder.build(&sample_order(1), &NETWORK_KEY).unwrap();
        let second = builder.build(&sample_order(2), &NETWORK_KEY).unwrap();

        assert_eq!(first.nonce, 100);
        assert_eq!(second.nonce, 101);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_envelope_roundtrip_through_cipher() {
        let mut builder = EnvelopeBuilder::new(Sha256Keystream, 1);
        let order = sample_order(42);
        let envelope = builder.build(&order, &NETWORK_KEY).unwrap();

        // Ciphertext must not be the plaintext
        assert_ne!(&envelope.ciphertext[..ORDER_WIRE_LEN], &encode_order(&order)[..]);

        let plaintext = unseal(&envelope);
        assert_eq!(decode_order(&plaintext).unwrap(), order);
        // Padding beyond the order is all zeros
        assert!(plaintext[ORDER_WIRE_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_same_order_different_nonce_differs() {
        // Identical payloads must not produce identical ciphertexts
        let mut builder = EnvelopeBuilder::new(Sha256Keystream, 1);
        let order = sample_order(42);

        let a = builder.build(&order, &NETWORK_KEY).unwrap();
        let b = builder.build(&order, &NETWORK_KEY).unwrap();
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_raw_payload_at_capacity() {
        let mut builder = EnvelopeBuilder::new(Sha256Keystream, 1);
        let payload = [0x55u8; ENVELOPE_CAPACITY];

        let envelope = builder.build_raw(&payload, &NETWORK_KEY).unwrap();
        assert_eq!(envelope.ciphertext.len(), ENVELOPE_CAPACITY);
    }

    #[test]
    fn test_raw_payload_too_large() {
        let mut builder = EnvelopeBuilder::new(Sha256Keystream, 1);
        let payload = [0x55u8; ENVELOPE_CAPACITY + 1];

        assert_eq!(
            builder.build_raw(&payload, &NETWORK_KEY),
            Err(EnvelopeError::PayloadTooLarge(ENVELOPE_CAPACITY + 1))
        );
    }
}
