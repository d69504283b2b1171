//! Submission coordinator: drives an order from creation to a queued
//! confidential computation.
//!
//! ## State Machine
//!
//! ```text
//! Created -> Encoded -> Enveloped -> Queued -> { Resolved | Expired }
//! ```
//!
//! The first three transitions happen inside a single `submit` call
//! (validate, encode, seal); a successful submit leaves the computation
//! Queued. A signed result moves it to Resolved; a timeout moves it to
//! Expired. Once Resolved is recorded, a later expiry sweep is a no-op, and
//! a result arriving after expiry is rejected.
//!
//! ## Replay Prevention
//!
//! At most one live computation exists per (owner, nonce) pair. A resolved
//! pair is consumed forever; an expired pair is released so the order can be
//! resubmitted. When submits race on the same pair, exactly one wins —
//! whichever reaches the table first under the caller's serialization of
//! `&mut self`.
//!
//! ## Storage
//!
//! In-flight computations live in a pre-allocated `Slab` with two indexes:
//! computation offset -> slab key, and (owner, nonce) -> slab key. Offsets
//! are allocated from a monotone counter, skipping any offset that is
//! somehow still occupied, so concurrent in-flight computations never share
//! one.

use std::collections::{HashMap, HashSet};

use slab::Slab;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bridge::pool::PoolState;
use crate::codec::{EncryptedEnvelope, EnvelopeBuilder, EnvelopeCipher, EnvelopeError};
use crate::events::{DarkPoolEvent, EventLog};
use crate::locator::{self, Address};
use crate::types::order::DarkOrder;
use crate::types::settlement::{MatchResult, SignedMatchResult};

// ============================================================================
// Handles and statuses
// ============================================================================

/// Kind of confidential computation being queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputationKind {
    /// Validate and register a single order
    SubmitOrder,
    /// Match a set of orders against each other
    MatchOrders,
    /// Validate and match a batch in one computation
    BatchProcess,
}

/// Tracks one in-flight matching request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputationHandle {
    /// Offset unique among concurrently in-flight computations
    pub offset: u64,

    /// What the computation does
    pub kind: ComputationKind,

    /// Queue time (Unix seconds)
    pub created_at: u64,
}

/// Externally visible status of a computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputationStatus {
    /// Waiting on the confidential network
    Queued,
    /// A signed result arrived
    Resolved(MatchResult),
    /// No result arrived within the configured window
    Expired,
}

#[derive(Debug, Clone)]
enum NodeStatus {
    Queued,
    Resolved(SignedMatchResult),
    Expired,
}

/// One tracked computation: handle, sealed payload(s), and the replay keys
/// it holds while live.
#[derive(Debug)]
struct FlightNode {
    handle: ComputationHandle,
    replay_keys: Vec<([u8; 32], u64)>,
    envelopes: Vec<EncryptedEnvelope>,
    status: NodeStatus,
}

// ============================================================================
// Errors
// ============================================================================

/// Submission and lifecycle errors.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// An order invariant or pool bound was violated; rejected before any
    /// state change
    #[error("invalid order: {reason}")]
    InvalidOrder {
        /// Which rule was violated
        reason: &'static str,
    },

    /// The (owner, nonce) pair is already live or was already consumed
    #[error("duplicate nonce {nonce} for owner")]
    DuplicateNonce {
        /// The repeated order nonce
        nonce: u64,
    },

    /// Envelope construction failed
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// No computation is tracked under this offset
    #[error("unknown computation offset {0}")]
    UnknownComputation(u64),

    /// A result was already recorded for this computation
    #[error("computation {0} already resolved")]
    AlreadyResolved(u64),

    /// The computation expired before the result arrived; resubmit with a
    /// fresh nonce
    #[error("computation {0} expired")]
    Expired(u64),

    /// A batch submission carried no orders
    #[error("empty batch")]
    EmptyBatch,
}

// ============================================================================
// SubmissionCoordinator
// ============================================================================

/// Coordinates order submission and computation lifecycle.
#[derive(Debug)]
pub struct SubmissionCoordinator<C: EnvelopeCipher> {
    in_flight: Slab<FlightNode>,
    by_offset: HashMap<u64, usize>,
    live_nonces: HashMap<([u8; 32], u64), usize>,
    consumed_nonces: HashSet<([u8; 32], u64)>,
    next_offset: u64,
    queue_timeout_secs: u64,
    builder: EnvelopeBuilder<C>,
}

impl<C: EnvelopeCipher> SubmissionCoordinator<C> {
    /// Create a coordinator.
    ///
    /// `queue_timeout_secs` bounds how long a Queued computation waits for a
    /// result before an [`expire_stale`](Self::expire_stale) sweep marks it
    /// Expired. The timeout is configuration, deliberately without a
    /// built-in default.
    pub fn new(builder: EnvelopeBuilder<C>, queue_timeout_secs: u64) -> Self {
        Self {
            in_flight: Slab::with_capacity(256),
            by_offset: HashMap::new(),
            live_nonces: HashMap::new(),
            consumed_nonces: HashSet::new(),
            next_offset: 1,
            queue_timeout_secs,
            builder,
        }
    }

    // ========================================================================
    // Capacity and size
    // ========================================================================

    /// Number of tracked computations (any status)
    #[inline]
    pub fn tracked_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of computations still waiting on the network
    pub fn queued_count(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|(_, node)| matches!(node.status, NodeStatus::Queued))
            .count()
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit one order: validate, encode, seal, queue.
    ///
    /// Fails with [`SubmissionError::InvalidOrder`] on any §3 invariant or
    /// pool size bound, or [`SubmissionError::DuplicateNonce`] if the
    /// (owner, nonce) pair is live or consumed. Emits `DarkOrderSubmitted`
    /// exactly once on success.
    pub fn submit(
        &mut self,
        order: &DarkOrder,
        network_key: &[u8; 32],
        pool: &mut PoolState,
        now: u64,
        events: &mut EventLog,
    ) -> Result<ComputationHandle, SubmissionError> {
        self.validate_order(order, pool)?;
        self.check_replay_key(order.replay_key())?;

        // Created -> Encoded -> Enveloped
        let envelope = self.builder.build(order, network_key)?;

        // Enveloped -> Queued
        let handle = self.queue_node(
            ComputationKind::SubmitOrder,
            vec![order.replay_key()],
            vec![envelope],
            now,
        );

        pool.record_order(now);
        info!(
            offset = handle.offset,
            nonce = order.nonce,
            "dark order queued"
        );
        events.record(DarkPoolEvent::DarkOrderSubmitted {
            owner: order.owner,
            computation_offset: handle.offset,
            timestamp: now,
        });

        Ok(handle)
    }

    /// Submit a batch of orders as one matching computation.
    ///
    /// Each order is validated and sealed into its own envelope; the batch
    /// shares a single computation offset. All replay keys are checked
    /// before any is claimed, so a duplicate anywhere rejects the whole
    /// batch without state change.
    pub fn submit_batch(
        &mut self,
        orders: &[DarkOrder],
        kind: ComputationKind,
        network_key: &[u8; 32],
        pool: &mut PoolState,
        now: u64,
        events: &mut EventLog,
    ) -> Result<ComputationHandle, SubmissionError> {
        if orders.is_empty() {
            return Err(SubmissionError::EmptyBatch);
        }

        let mut keys = Vec::with_capacity(orders.len());
        for order in orders {
            self.validate_order(order, pool)?;
            self.check_replay_key(order.replay_key())?;
            if keys.contains(&order.replay_key()) {
                return Err(SubmissionError::DuplicateNonce { nonce: order.nonce });
            }
            keys.push(order.replay_key());
        }

        let mut envelopes = Vec::with_capacity(orders.len());
        for order in orders {
            envelopes.push(self.builder.build(order, network_key)?);
        }

        let handle = self.queue_node(kind, keys, envelopes, now);

        for order in orders {
            pool.record_order(now);
            events.record(DarkPoolEvent::DarkOrderSubmitted {
                owner: order.owner,
                computation_offset: handle.offset,
                timestamp: now,
            });
        }
        info!(
            offset = handle.offset,
            orders = orders.len(),
            kind = ?kind,
            "batch queued"
        );

        Ok(handle)
    }

    fn validate_order(
        &self,
        order: &DarkOrder,
        pool: &PoolState,
    ) -> Result<(), SubmissionError> {
        order
            .check_invariants()
            .map_err(|reason| SubmissionError::InvalidOrder { reason })?;
        pool.check_order_size(order.size)
            .map_err(|reason| SubmissionError::InvalidOrder { reason })?;
        Ok(())
    }

    fn check_replay_key(&self, key: ([u8; 32], u64)) -> Result<(), SubmissionError> {
        if self.live_nonces.contains_key(&key) || self.consumed_nonces.contains(&key) {
            return Err(SubmissionError::DuplicateNonce { nonce: key.1 });
        }
        Ok(())
    }

    fn queue_node(
        &mut self,
        kind: ComputationKind,
        replay_keys: Vec<([u8; 32], u64)>,
        envelopes: Vec<EncryptedEnvelope>,
        now: u64,
    ) -> ComputationHandle {
        let offset = self.allocate_offset();
        let handle = ComputationHandle {
            offset,
            kind,
            created_at: now,
        };
        let key = self.in_flight.insert(FlightNode {
            handle,
            replay_keys: replay_keys.clone(),
            envelopes,
            status: NodeStatus::Queued,
        });
        self.by_offset.insert(offset, key);
        for replay_key in replay_keys {
            self.live_nonces.insert(replay_key, key);
        }

        handle
    }

    fn allocate_offset(&mut self) -> u64 {
        // Monotone counter; skip anything still occupied after wraparound.
        loop {
            let offset = self.next_offset;
            self.next_offset = self.next_offset.wrapping_add(1);
            if !self.by_offset.contains_key(&offset) {
                return offset;
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Non-blocking status check.
    ///
    /// An unknown offset reports `Expired`: a released record and a
    /// timed-out one are indistinguishable.
    pub fn poll(&self, handle: &ComputationHandle) -> ComputationStatus {
        match self.by_offset.get(&handle.offset) {
            Some(&key) => match &self.in_flight[key].status {
                NodeStatus::Queued => ComputationStatus::Queued,
                NodeStatus::Resolved(signed) => {
                    ComputationStatus::Resolved(signed.result.clone())
                }
                NodeStatus::Expired => ComputationStatus::Expired,
            },
            None => ComputationStatus::Expired,
        }
    }

    /// Sealed payload(s) queued under an offset, for the transport layer.
    pub fn queued_envelopes(&self, offset: u64) -> Option<&[EncryptedEnvelope]> {
        let &key = self.by_offset.get(&offset)?;
        Some(&self.in_flight[key].envelopes)
    }

    /// Derived slot address for a tracked computation.
    pub fn slot_address(&self, offset: u64) -> Option<Address> {
        self.by_offset.get(&offset)?;
        locator::computation_slot_address(offset).ok()
    }

    /// Record the signed result for a queued computation.
    ///
    /// Transitions Queued -> Resolved and consumes the computation's replay
    /// keys permanently. Rejects results for expired computations and
    /// second results for resolved ones.
    pub fn record_result(
        &mut self,
        offset: u64,
        signed: SignedMatchResult,
    ) -> Result<(), SubmissionError> {
        let &key = self
            .by_offset
            .get(&offset)
            .ok_or(SubmissionError::UnknownComputation(offset))?;

        let node = &mut self.in_flight[key];
        match node.status {
            NodeStatus::Queued => {}
            NodeStatus::Resolved(_) => return Err(SubmissionError::AlreadyResolved(offset)),
            NodeStatus::Expired => {
                warn!(offset, "result arrived after expiry; rejected");
                return Err(SubmissionError::Expired(offset));
            }
        }

        for replay_key in node.replay_keys.drain(..) {
            self.live_nonces.remove(&replay_key);
            self.consumed_nonces.insert(replay_key);
        }
        node.status = NodeStatus::Resolved(signed);
        debug!(offset, "computation resolved");

        Ok(())
    }

    /// Expire queued computations older than the configured timeout.
    ///
    /// Resolved computations are untouched: expiry after resolution is a
    /// no-op. Expired replay keys are released so the orders can be
    /// resubmitted with fresh nonces. Returns how many computations expired.
    pub fn expire_stale(&mut self, now: u64) -> usize {
        let mut expired = 0usize;

        for (_, node) in self.in_flight.iter_mut() {
            if !matches!(node.status, NodeStatus::Queued) {
                continue;
            }
            if now.saturating_sub(node.handle.created_at) <= self.queue_timeout_secs {
                continue;
            }

            for replay_key in node.replay_keys.drain(..) {
                self.live_nonces.remove(&replay_key);
            }
            node.envelopes.clear();
            node.status = NodeStatus::Expired;
            expired += 1;
            debug!(offset = node.handle.offset, "computation expired");
        }

        expired
    }

    /// Drop the record of a terminal (Resolved or Expired) computation.
    ///
    /// Queued computations cannot be released; expiry is the only exit
    /// short of a result.
    pub fn release(&mut self, offset: u64) -> Result<(), SubmissionError> {
        let &key = self
            .by_offset
            .get(&offset)
            .ok_or(SubmissionError::UnknownComputation(offset))?;

        if matches!(self.in_flight[key].status, NodeStatus::Queued) {
            return Err(SubmissionError::UnknownComputation(offset));
        }

        self.by_offset.remove(&offset);
        self.in_flight.remove(key);
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
