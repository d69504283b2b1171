//! Match results and settlement records.
//!
//! ## Trust Boundary
//!
//! A [`MatchResult`] is produced by the confidential matching network, which
//! is treated as an untrusted black box: its only guarantee is the signature
//! carried by [`SignedMatchResult`]. Every pair inside is re-validated by the
//! matching result processor before it becomes a [`TradeSettlement`].
//!
//! ## SSZ Serialization
//!
//! `TradeSettlement` and `SettlementReceipt` are fixed-size containers and
//! derive `SimpleSerialize` for deterministic encoding: the serialized bytes
//! of a `TradeSettlement` are its signing preimage, and receipt record hashes
//! are SHA-256 over the same encoding. `MatchResult` is variable-length, so
//! its signing preimage is a count-prefixed little-endian framing built from
//! the order codec.

use sha2::{Digest, Sha256};
use ssz_rs::prelude::*;

use crate::codec::encode_order;
use crate::types::order::DarkOrder;

/// Width of an authenticity signature (ed25519).
pub const SIGNATURE_LEN: usize = 64;

// ============================================================================
// MatchResult
// ============================================================================

/// One matched pair of opposing dark orders.
///
/// Embeds both full orders: the processor needs their sizes, limit prices
/// and collateral to validate the match and split collateral proportionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    /// First matched order
    pub order_a: DarkOrder,

    /// Second matched order (opposing side)
    pub order_b: DarkOrder,

    /// Matched size in USD minor units
    pub matched_size: u64,

    /// Execution price (scaled by 10^6)
    pub execution_price: u64,

    /// Match time (Unix seconds)
    pub timestamp: u64,
}

/// Output of one confidential matching computation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    /// Matched pairs, in match order
    pub pairs: Vec<MatchedPair>,

    /// Sum of matched sizes across all pairs
    pub total_volume: u64,

    /// Volume-weighted average execution price
    pub average_price: u64,

    /// Result production time (Unix seconds)
    pub timestamp: u64,
}

impl MatchResult {
    /// Deterministic signing preimage for this result.
    ///
    /// Layout: pair count (u32 LE), then per pair the two encoded orders
    /// followed by matched_size / execution_price / timestamp (u64 LE each),
    /// then the three aggregate fields (u64 LE each).
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.pairs.len() * 378);

        out.extend_from_slice(&(self.pairs.len() as u32).to_le_bytes());
        for pair in &self.pairs {
            out.extend_from_slice(&encode_order(&pair.order_a));
            out.extend_from_slice(&encode_order(&pair.order_b));
            out.extend_from_slice(&pair.matched_size.to_le_bytes());
            out.extend_from_slice(&pair.execution_price.to_le_bytes());
            out.extend_from_slice(&pair.timestamp.to_le_bytes());
        }
        out.extend_from_slice(&self.total_volume.to_le_bytes());
        out.extend_from_slice(&self.average_price.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());

        out
    }
}

/// A match result plus the matching network's signature over
/// [`MatchResult::signing_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMatchResult {
    /// The claimed result
    pub result: MatchResult,

    /// Network signature over the result's signing payload
    pub signature: [u8; SIGNATURE_LEN],
}

// ============================================================================
// TradeSettlement
// ============================================================================

/// The on-ledger-visible record derived from one accepted matched pair.
///
/// Fixed-size SSZ container; `ssz_rs::serialize` of this struct is the
/// signing preimage verified by the settlement bridge. The authenticity
/// signature travels alongside in [`SignedSettlement`].
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct TradeSettlement {
    /// Trader A identity
    pub trader_a: [u8; 32],

    /// Trader B identity
    pub trader_b: [u8; 32],

    /// Trader A's side as u8 (0=Long, 1=Short); B holds the opposite
    pub side_a: u8,

    /// Matched size in USD minor units
    pub size: u64,

    /// Execution price (scaled by 10^6)
    pub price: u64,

    /// Pool identity
    pub pool: [u8; 32],

    /// Custody identity of the traded asset
    pub custody: [u8; 32],

    /// Custody identity of the collateral token
    pub collateral_custody: [u8; 32],

    /// Settlement record time (Unix seconds)
    pub timestamp: u64,

    /// Collateral delta for trader A (minor units, debited on settlement)
    pub collateral_delta_a: u64,

    /// Collateral delta for trader B
    pub collateral_delta_b: u64,

    /// Maximum allowed deviation from oracle price, in basis points
    pub max_slippage_bps: u16,
}

impl TradeSettlement {
    /// Deterministic signing preimage (SSZ encoding of the record).
    pub fn signing_payload(&self) -> Vec<u8> {
        ssz_rs::serialize(self).expect("fixed-size container serialization cannot fail")
    }

    /// SHA-256 hash of the record, used in settlement receipts.
    pub fn record_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_payload());
        let digest = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }
}

/// A settlement record plus the submission authority's signature over
/// [`TradeSettlement::signing_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSettlement {
    /// The settlement record
    pub record: TradeSettlement,

    /// Authority signature over the record's signing payload
    pub signature: [u8; SIGNATURE_LEN],
}

// ============================================================================
// SettlementReceipt
// ============================================================================

/// Receipt for one applied settlement.
///
/// Immutable historical record returned by the bridge after both traders'
/// mutations landed.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct SettlementReceipt {
    /// Matched size applied to both positions
    pub size: u64,

    /// Execution price
    pub price: u64,

    /// Protocol fee accrued on this trade (minor units)
    pub fee: u64,

    /// Collateral debited from trader A
    pub collateral_delta_a: u64,

    /// Collateral debited from trader B
    pub collateral_delta_b: u64,

    /// SHA-256 hash of the settled record
    pub record_hash: [u8; 32],

    /// Application time (Unix seconds)
    pub timestamp: u64,
}

impl SettlementReceipt {
    /// Get the record hash as a hex string
    pub fn record_hash_hex(&self) -> String {
        hex::encode(self.record_hash)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::order::Side;

    fn order(owner_byte: u8, side: Side, size: u64, max_price: u64, nonce: u64) -> DarkOrder {
        DarkOrder::new(
            [owner_byte; 32],
            side,
            size,
            size / 5,
            max_price,
            5,
            [2u8; 32],
            [3u8; 32],
            [4u8; 32],
            1_700_000_000,
            nonce,
        )
    }

    fn sample_result() -> MatchResult {
        let a = order(1, Side::Long, 1_000_000_000, 50_000_000_000, 42);
        let b = order(9, Side::Short, 1_000_000_000, 49_000_000_000, 7);
        MatchResult {
            pairs: vec![MatchedPair {
                order_a: a,
                order_b: b,
                matched_size: 1_000_000_000,
                execution_price: 49_000_000_000,
                timestamp: 1_700_000_100,
            }],
            total_volume: 1_000_000_000,
            average_price: 49_000_000_000,
            timestamp: 1_700_000_100,
        }
    }

    fn sample_settlement() -> TradeSettlement {
        TradeSettlement {
            trader_a: [1u8; 32],
            trader_b: [9u8; 32],
            side_a: Side::Long.to_u8(),
            size: 1_000_000_000,
            price: 49_000_000_000,
            pool: [2u8; 32],
            custody: [3u8; 32],
            collateral_custody: [4u8; 32],
            timestamp: 1_700_000_100,
            collateral_delta_a: 200_000_000,
            collateral_delta_b: 200_000_000,
            max_slippage_bps: 100,
        }
    }

    #[test]
    fn test_match_result_payload_deterministic() {
        let result = sample_result();
        assert_eq!(result.signing_payload(), result.signing_payload());
    }

    #[test]
    fn test_match_result_payload_binds_fields() {
        let result = sample_result();
        let base = result.signing_payload();

        let mut tampered = result.clone();
        tampered.pairs[0].execution_price += 1;
        assert_ne!(base, tampered.signing_payload());

        let mut tampered = result.clone();
        tampered.total_volume += 1;
        assert_ne!(base, tampered.signing_payload());
    }

    #[test]
    fn test_settlement_ssz_roundtrip() {
        let record = sample_settlement();

        let serialized = ssz_rs::serialize(&record).expect("Failed to serialize");
        let deserialized: TradeSettlement =
            ssz_rs::deserialize(&serialized).expect("Failed to deserialize");

        assert_eq!(record, deserialized);
    }

    #[test]
    fn test_settlement_payload_deterministic() {
        let record = sample_settlement();
        assert_eq!(record.signing_payload(), record.signing_payload());
    }

    #[test]
    fn test_settlement_record_hash_binds_fields() {
        let record = sample_settlement();
        let base = record.record_hash();

        let mut tampered = record.clone();
        tampered.size += 1;
        assert_ne!(base, tampered.record_hash());

        let mut tampered = record.clone();
        tampered.collateral_delta_b += 1;
        assert_ne!(base, tampered.record_hash());
    }

    #[test]
    fn test_receipt_hash_hex() {
        let receipt = SettlementReceipt {
            record_hash: [0xAB; 32],
            ..Default::default()
        };

        let hex = receipt.record_hash_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_receipt_ssz_roundtrip() {
        let receipt = SettlementReceipt {
            size: 1_000_000_000,
            price: 49_000_000_000,
            fee: 3_000_000,
            collateral_delta_a: 200_000_000,
            collateral_delta_b: 200_000_000,
            record_hash: [0xCD; 32],
            timestamp: 1_700_000_200,
        };

        let serialized = ssz_rs::serialize(&receipt).expect("Failed to serialize");
        let deserialized: SettlementReceipt =
            ssz_rs::deserialize(&serialized).expect("Failed to deserialize");

        assert_eq!(receipt, deserialized);
    }
}
