//! # Darkpool Core
//!
//! Order lifecycle and settlement protocol for a privacy-preserving
//! perpetuals dark pool.
//!
//! ## Architecture
//!
//! The lifecycle runs through five stages:
//! - **Types**: Core data structures (DarkOrder, MatchResult, TradeSettlement)
//! - **Codec**: Fixed 177-byte order layout and the 256-byte transport envelope
//! - **Locator**: Pure seeded derivation of resource addresses
//! - **Coordinator**: Submission state machine with replay prevention
//! - **Matching**: Verification of signed results from the confidential network
//! - **Bridge**: Settlement validation and atomic ledger application
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical inputs produce identical bytes, addresses
//!    and settlement outcomes
//! 2. **No Floating Point**: All money math uses fixed-point u64 (10^6
//!    scaling) with u128 intermediates
//! 3. **Untrusted Matching**: The confidential network's output is accepted
//!    only under signature and full per-pair re-validation
//! 4. **Explicit Time**: No component reads a clock; callers pass `now`

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: DarkOrder, MatchResult, TradeSettlement, price math
pub mod types;

/// Wire codec: 177-byte order layout and encrypted transport envelope
pub mod codec;

/// Deterministic resource address derivation
pub mod locator;

/// ed25519 signing and verification
pub mod signing;

/// Lifecycle events
pub mod events;

/// Submission coordinator: order intake and computation lifecycle
pub mod coordinator;

/// Match result verification and settlement record production
pub mod matching;

/// Pool state and the settlement bridge
pub mod bridge;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use types::{DarkOrder, MatchResult, Side, SignedSettlement, TradeSettlement};
pub use codec::{decode_order, encode_order, EncryptedEnvelope, EnvelopeBuilder};
pub use locator::Address;
pub use coordinator::{ComputationHandle, ComputationStatus, SubmissionCoordinator};
pub use matching::{MatchResultProcessor, MatchingNetwork};
pub use bridge::{PoolState, SettlementBridge};
