//! Verification and transformation of confidential match results.
//!
//! ## Trust Model
//!
//! The matching network is an untrusted black box. Its output is accepted
//! only if (1) the signature over [`MatchResult::signing_payload`] verifies
//! against the configured network key, and (2) every claimed pair passes
//! re-validation against the embedded orders. Signature failure rejects the
//! whole result; per-pair validation failure drops only that pair, so one
//! bad pair never blocks the rest of a batch.
//!
//! ## Output
//!
//! Each accepted pair becomes a [`TradeSettlement`] signed by the processor's
//! submission authority, ready for the settlement bridge. Collateral deltas
//! are split proportionally to the matched fraction of each order, rounding
//! down, so partial fills never over-debit.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::bridge::pool::PoolState;
use crate::coordinator::ComputationHandle;
use crate::events::{DarkPoolEvent, EventLog};
use crate::signing::{self, Ed25519Signer, PUBLIC_KEY_LEN};
use crate::types::price;
use crate::types::settlement::{
    MatchedPair, SignedMatchResult, SignedSettlement, TradeSettlement,
};

// ============================================================================
// MatchingNetwork
// ============================================================================

/// Source of signed match results.
///
/// Implemented by the transport to the confidential matching network; tests
/// and demos plug in local simulations. `None` means the computation has not
/// produced a result yet.
pub trait MatchingNetwork {
    /// Fetch the result for a queued computation, if ready.
    fn resolve(&mut self, handle: &ComputationHandle) -> Option<SignedMatchResult>;
}

// ============================================================================
// Errors
// ============================================================================

/// Processing failures. `BadSignature`, `EmptyResult` and `VolumeMismatch`
/// reject the whole result; `InvalidMatch` is per-pair and surfaces through
/// [`ProcessOutcome::rejected`] without blocking the other pairs.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The signature does not verify against the network key
    #[error("match result signature verification failed")]
    BadSignature,

    /// The result carries no pairs
    #[error("match result contains no pairs")]
    EmptyResult,

    /// One claimed pair violates the match invariants
    #[error("invalid matched pair at index {index}: {reason}")]
    InvalidMatch {
        /// Position of the pair in the result
        index: usize,
        /// Which rule the pair violated
        reason: &'static str,
    },

    /// Claimed total volume disagrees with the sum of accepted pair sizes
    #[error("claimed volume {claimed} != validated volume {validated}")]
    VolumeMismatch {
        /// Volume the network claimed
        claimed: u64,
        /// Volume over pairs that passed validation
        validated: u64,
    },
}

/// Outcome of processing one signed match result.
#[derive(Debug)]
pub struct ProcessOutcome {
    /// One signed settlement per accepted pair, in match order
    pub settlements: Vec<SignedSettlement>,

    /// One [`ProcessingError::InvalidMatch`] per dropped pair
    pub rejected: Vec<ProcessingError>,
}

// ============================================================================
// MatchResultProcessor
// ============================================================================

/// Verifies signed match results and emits signed settlement records.
pub struct MatchResultProcessor {
    network_key: [u8; PUBLIC_KEY_LEN],
    authority: Ed25519Signer,
}

impl MatchResultProcessor {
    /// Create a processor trusting `network_key` for result signatures and
    /// signing settlements with `authority`.
    pub fn new(network_key: [u8; PUBLIC_KEY_LEN], authority: Ed25519Signer) -> Self {
        Self {
            network_key,
            authority,
        }
    }

    /// Public key under which emitted settlements verify.
    pub fn authority_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.authority.public_key()
    }

    /// Verify a signed result and transform accepted pairs into signed
    /// settlements.
    ///
    /// Order of checks: signature over the whole result, then per-pair
    /// validation (invalid pairs are dropped, valid ones kept), then the
    /// claimed total volume against the accepted sum. Pool counters and the
    /// `DarkOrdersMatched` event reflect accepted pairs only.
    pub fn process(
        &self,
        handle: &ComputationHandle,
        signed: &SignedMatchResult,
        max_slippage_bps: u16,
        pool: &mut PoolState,
        now: u64,
        events: &mut EventLog,
    ) -> Result<ProcessOutcome, ProcessingError> {
        let result = &signed.result;

        if !signing::verify(
            &result.signing_payload(),
            &signed.signature,
            &self.network_key,
        ) {
            error!(
                offset = handle.offset,
                "match result signature rejected"
            );
            return Err(ProcessingError::BadSignature);
        }
        if result.pairs.is_empty() {
            return Err(ProcessingError::EmptyResult);
        }

        let mut settlements = Vec::with_capacity(result.pairs.len());
        let mut rejected = Vec::new();
        let mut accepted_volume: u64 = 0;
        let mut accepted_terms: Vec<(u64, u64)> = Vec::with_capacity(result.pairs.len());

        for (index, pair) in result.pairs.iter().enumerate() {
            match self.settle_pair(pair, max_slippage_bps) {
                Ok(settlement) => {
                    accepted_volume = accepted_volume.saturating_add(pair.matched_size);
                    accepted_terms.push((pair.matched_size, pair.execution_price));
                    settlements.push(settlement);
                }
                Err(reason) => {
                    warn!(offset = handle.offset, index, reason, "matched pair rejected");
                    rejected.push(ProcessingError::InvalidMatch { index, reason });
                }
            }
        }

        // The network's claimed volume must cover exactly what survived
        // validation; anything else means the aggregates were fabricated.
        if rejected.is_empty() && result.total_volume != accepted_volume {
            return Err(ProcessingError::VolumeMismatch {
                claimed: result.total_volume,
                validated: accepted_volume,
            });
        }

        if !settlements.is_empty() {
            let average_price = price::weighted_average_price(accepted_terms).unwrap_or(0);

            pool.record_match(now);
            events.record(DarkPoolEvent::DarkOrdersMatched {
                total_volume: accepted_volume,
                average_price,
                pair_count: settlements.len() as u64,
                timestamp: now,
            });
            info!(
                offset = handle.offset,
                accepted = settlements.len(),
                rejected = rejected.len(),
                volume = accepted_volume,
                "match result processed"
            );
        }

        Ok(ProcessOutcome {
            settlements,
            rejected,
        })
    }

    /// Validate one claimed pair and build its signed settlement.
    ///
    /// Fails with the violated rule when: sides do not oppose, the
    /// pool/custody identities disagree, the matched size is zero or exceeds
    /// either order, or the execution price breaks either limit price. Both
    /// limit prices are caps: each trader stated the worst price they accept.
    fn settle_pair(
        &self,
        pair: &MatchedPair,
        max_slippage_bps: u16,
    ) -> Result<SignedSettlement, &'static str> {
        let a = &pair.order_a;
        let b = &pair.order_b;

        if a.side != b.side.opposite() {
            return Err("sides do not oppose");
        }
        if a.pool != b.pool
            || a.custody != b.custody
            || a.collateral_custody != b.collateral_custody
        {
            return Err("pool or custody mismatch");
        }
        if pair.matched_size == 0
            || pair.matched_size > a.size
            || pair.matched_size > b.size
        {
            return Err("matched size outside order bounds");
        }
        if pair.execution_price == 0 {
            return Err("execution price is zero");
        }
        if pair.execution_price > a.max_price || pair.execution_price > b.max_price {
            return Err("execution price breaks a limit price");
        }

        let delta_a = price::proportional(a.collateral, pair.matched_size, a.size)
            .ok_or("collateral delta overflow")?;
        let delta_b = price::proportional(b.collateral, pair.matched_size, b.size)
            .ok_or("collateral delta overflow")?;

        let record = TradeSettlement {
            trader_a: a.owner,
            trader_b: b.owner,
            side_a: a.side.to_u8(),
            size: pair.matched_size,
            price: pair.execution_price,
            pool: a.pool,
            custody: a.custody,
            collateral_custody: a.collateral_custody,
            timestamp: pair.timestamp,
            collateral_delta_a: delta_a,
            collateral_delta_b: delta_b,
            max_slippage_bps,
        };

        let signature = self.authority.sign(&record.signing_payload());
        Ok(SignedSettlement { record, signature })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
