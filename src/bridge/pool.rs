//! Pool state: configuration and aggregate statistics.
//!
//! One `PoolState` exists per dark pool. It owns the aggregate counters
//! (total orders / matches / settlements / volume) as explicit mutable
//! state — there are no ambient counters anywhere in the crate. Every
//! lifecycle call that moves a counter takes `&mut PoolState`.
//!
//! Counters are u64 and monotonically non-decreasing; they only ever move
//! through the `record_*` methods.

use thiserror::Error;
use tracing::info;

use crate::events::{DarkPoolEvent, EventLog};
use crate::locator::{self, Address};
use crate::types::price::BPS_DENOMINATOR;

/// Pool initialization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// fee_rate_bps was above 10000
    #[error("fee rate {0} bps exceeds {BPS_DENOMINATOR}")]
    FeeRateTooHigh(u16),

    /// min_order_size was above max_order_size
    #[error("min order size {min} exceeds max order size {max}")]
    InvalidSizeBounds {
        /// Configured floor
        min: u64,
        /// Configured ceiling
        max: u64,
    },

    /// The pool name failed address derivation
    #[error(transparent)]
    Derivation(#[from] locator::DerivationError),
}

/// Configuration recognized at pool initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    /// Human-readable pool name, the seed of the pool address
    pub name: String,

    /// Identity of the linked position-ledger program
    pub ledger_program: Address,

    /// Floor on DarkOrder.size
    pub min_order_size: u64,

    /// Ceiling on DarkOrder.size
    pub max_order_size: u64,

    /// Fee applied per settled trade, in basis points (0..=10000)
    pub fee_rate_bps: u16,
}

/// Persisted aggregate state of one dark pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    /// Derived pool address
    pub address: Address,

    /// Pool authority identity
    pub authority: [u8; 32],

    /// Linked position-ledger program identity
    pub ledger_program: Address,

    /// Floor on order size
    pub min_order_size: u64,

    /// Ceiling on order size
    pub max_order_size: u64,

    /// Fee in basis points
    pub fee_rate_bps: u16,

    /// Orders accepted for submission
    pub total_orders: u64,

    /// Match results processed
    pub total_matches: u64,

    /// Settlements applied
    pub total_settlements: u64,

    /// Cumulative settled volume (USD minor units)
    pub total_volume: u64,

    /// Accrued protocol fees (minor units)
    pub total_fees: u64,

    /// Last order submission time (Unix seconds)
    pub last_order_time: u64,

    /// Last match processing time (Unix seconds)
    pub last_match_time: u64,
}

impl PoolState {
    /// Initialize a pool from its configuration.
    ///
    /// Validates `fee_rate_bps <= 10000` and `min <= max`, derives the pool
    /// address from its name, and emits `DarkpoolInitialized`.
    pub fn initialize(
        authority: [u8; 32],
        params: PoolParams,
        events: &mut EventLog,
    ) -> Result<Self, PoolError> {
        if params.fee_rate_bps as u64 > BPS_DENOMINATOR {
            return Err(PoolError::FeeRateTooHigh(params.fee_rate_bps));
        }
        if params.min_order_size > params.max_order_size {
            return Err(PoolError::InvalidSizeBounds {
                min: params.min_order_size,
                max: params.max_order_size,
            });
        }

        let address = locator::pool_address(&params.name)?;
        let pool = Self {
            address,
            authority,
            ledger_program: params.ledger_program,
            min_order_size: params.min_order_size,
            max_order_size: params.max_order_size,
            fee_rate_bps: params.fee_rate_bps,
            total_orders: 0,
            total_matches: 0,
            total_settlements: 0,
            total_volume: 0,
            total_fees: 0,
            last_order_time: 0,
            last_match_time: 0,
        };

        info!(pool = %address, name = %params.name, "darkpool initialized");
        events.record(DarkPoolEvent::DarkpoolInitialized {
            pool: address,
            authority,
            min_order_size: pool.min_order_size,
            max_order_size: pool.max_order_size,
            fee_rate_bps: pool.fee_rate_bps,
        });

        Ok(pool)
    }

    /// Check an order size against the pool's configured bounds.
    pub fn check_order_size(&self, size: u64) -> Result<(), &'static str> {
        if size < self.min_order_size {
            return Err("order size below pool minimum");
        }
        if size > self.max_order_size {
            return Err("order size above pool maximum");
        }
        Ok(())
    }

    /// Record an accepted order submission.
    pub fn record_order(&mut self, now: u64) {
        self.total_orders += 1;
        self.last_order_time = now;
    }

    /// Record one processed match result.
    pub fn record_match(&mut self, now: u64) {
        self.total_matches += 1;
        self.last_match_time = now;
    }

    /// Record one applied settlement.
    pub fn record_settlement(&mut self, size: u64, fee: u64) {
        self.total_settlements += 1;
        self.total_volume = self.total_volume.saturating_add(size);
        self.total_fees = self.total_fees.saturating_add(fee);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
