//! Dark order types for the darkpool lifecycle.
//!
//! ## Privacy Model
//!
//! A `DarkOrder` is created client-side, serialized, sealed into an
//! [`EncryptedEnvelope`](crate::codec::EncryptedEnvelope) and only ever seen
//! in plaintext by the submitting context and the confidential matching
//! network. Nothing here is persisted in the clear after submission.
//!
//! ## Fixed-Point Representation
//!
//! Sizes, collateral and prices are u64 USD minor units scaled by 10^6
//! (6 decimal places). See `crate::types::price::SCALE`.
//!
//! ## Replay Prevention
//!
//! The (owner, nonce) pair is the sole replay key: the order body is never
//! revealed on the open ledger before matching, so there is nothing else to
//! deduplicate on. Uniqueness is enforced by the submission coordinator.

// ============================================================================
// Side enum
// ============================================================================

/// Position side: Long or Short
///
/// Represented as u8 on the wire:
/// - Long = 0
/// - Short = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Long position - profits when price rises
    #[default]
    Long,
    /// Short position - profits when price falls
    Short,
}

impl Side {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Long => 0,
            Side::Short => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Long),
            1 => Some(Side::Short),
            _ => None,
        }
    }

    /// Returns the opposing side
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

// ============================================================================
// DarkOrder struct
// ============================================================================

/// Maximum leverage multiplier accepted by order validation.
pub const MAX_LEVERAGE: u64 = 100;

/// A trader's private order intent.
///
/// Immutable once created; consumed exactly once by the matching result
/// processor. All identities are 32-byte public keys / derived addresses.
///
/// ## Example
///
/// ```
/// use darkpool_core::types::{DarkOrder, Side};
///
/// // $1,000 long at max price $50,000, 5x leverage (6-decimal units)
/// let order = DarkOrder::new(
///     [1u8; 32],              // owner
///     Side::Long,             // side
///     1_000_000_000,          // size: 1000.000000
///     200_000_000,            // collateral: 200.000000
///     50_000_000_000,         // max_price: 50000.000000
///     5,                      // leverage
///     [2u8; 32],              // pool
///     [3u8; 32],              // custody
///     [4u8; 32],              // collateral_custody
///     1_700_000_000,          // timestamp (s)
///     42,                     // nonce
/// );
/// assert!(order.check_invariants().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DarkOrder {
    /// Order owner's public key
    pub owner: [u8; 32],

    /// Position side
    pub side: Side,

    /// Position size in USD minor units (scaled by 10^6)
    pub size: u64,

    /// Collateral amount in collateral-token minor units
    pub collateral: u64,

    /// Maximum acceptable execution price (scaled by 10^6)
    pub max_price: u64,

    /// Leverage multiplier (1..=100)
    pub leverage: u64,

    /// Pool identity
    pub pool: [u8; 32],

    /// Custody identity of the traded asset
    pub custody: [u8; 32],

    /// Custody identity of the collateral token
    pub collateral_custody: [u8; 32],

    /// Order creation time (Unix seconds)
    pub timestamp: u64,

    /// Caller-chosen nonce, unique per owner
    pub nonce: u64,
}

impl DarkOrder {
    /// Create a new dark order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: [u8; 32],
        side: Side,
        size: u64,
        collateral: u64,
        max_price: u64,
        leverage: u64,
        pool: [u8; 32],
        custody: [u8; 32],
        collateral_custody: [u8; 32],
        timestamp: u64,
        nonce: u64,
    ) -> Self {
        Self {
            owner,
            side,
            size,
            collateral,
            max_price,
            leverage,
            pool,
            custody,
            collateral_custody,
            timestamp,
            nonce,
        }
    }

    /// Validate the order invariants.
    ///
    /// Returns the first violated rule as a static description. The
    /// (owner, nonce) uniqueness rule is stateful and enforced by the
    /// submission coordinator, not here.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        if self.size == 0 {
            return Err("size must be positive");
        }
        if self.collateral == 0 {
            return Err("collateral must be positive");
        }
        if self.max_price == 0 {
            return Err("max price must be positive");
        }
        if self.leverage == 0 {
            return Err("leverage must be at least 1");
        }
        if self.leverage > MAX_LEVERAGE {
            return Err("leverage exceeds maximum");
        }
        Ok(())
    }

    /// Replay-prevention key for this order
    #[inline]
    pub fn replay_key(&self) -> ([u8; 32], u64) {
        (self.owner, self.nonce)
    }

    /// Notional value of the full order (size * max_price, unscaled raw)
    pub fn notional_raw(&self) -> u128 {
        (self.size as u128) * (self.max_price as u128)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
