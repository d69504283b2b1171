//! Settlement validation and atomic ledger application.
//!
//! ## Validation Order
//!
//! Checks short-circuit in a fixed sequence, cheapest first:
//!
//! 1. freshness - settlement timestamp within the window of `now`
//! 2. authenticity - authority signature over the record's signing payload
//! 3. slippage - execution price within `max_slippage_bps` of the oracle
//! 4. collateral - both traders' free collateral covers their deltas
//!
//! An authenticity failure is logged at error level; it means a forged or
//! corrupted record reached the bridge, which is a different animal from an
//! ordinary validation miss.
//!
//! ## Atomicity
//!
//! All validation happens before the single [`Ledger::apply_trade`] call, so
//! a rejected settlement leaves the ledger untouched and an applied one
//! lands both traders' mutations together.

use thiserror::Error;
use tracing::{error, info};

use crate::bridge::ledger::{Ledger, LedgerError, PriceOracle, TradeApplication};
use crate::bridge::pool::PoolState;
use crate::events::{DarkPoolEvent, EventLog};
use crate::signing::{self, PUBLIC_KEY_LEN};
use crate::types::order::Side;
use crate::types::price;
use crate::types::settlement::{SettlementReceipt, SignedSettlement};

/// Default freshness window in seconds.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 300;

// ============================================================================
// Errors
// ============================================================================

/// Settlement rejection reasons, in check order.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The record's timestamp is outside the freshness window
    #[error("stale settlement: recorded at {recorded_at}, now {now}")]
    Stale {
        /// Record timestamp (Unix seconds)
        recorded_at: u64,
        /// Bridge's view of the current time
        now: u64,
    },

    /// The authority signature does not verify
    #[error("settlement signature verification failed")]
    BadSignature,

    /// The oracle has no quote for the traded custody
    #[error("no oracle price for custody")]
    OracleUnavailable,

    /// Execution price deviates from the oracle beyond the record's bound
    #[error("slippage {actual_bps} bps exceeds limit {limit_bps} bps")]
    SlippageExceeded {
        /// Observed deviation in basis points
        actual_bps: u64,
        /// The record's maximum allowed deviation
        limit_bps: u64,
    },

    /// A trader's free collateral does not cover their delta
    #[error("insufficient collateral: needed {needed}, available {available}")]
    InsufficientCollateral {
        /// The underfunded trader
        trader: [u8; 32],
        /// Collateral the settlement requires
        needed: u64,
        /// Collateral the trader holds
        available: u64,
    },

    /// The record carries an undecodable side byte
    #[error("invalid side byte {0}")]
    InvalidSide(u8),

    /// The ledger rejected the application
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ============================================================================
// SettlementBridge
// ============================================================================

/// Validates signed settlements and applies them to a ledger.
#[derive(Debug, Clone)]
pub struct SettlementBridge {
    authority_key: [u8; PUBLIC_KEY_LEN],
    freshness_window_secs: u64,
}

impl SettlementBridge {
    /// Create a bridge trusting `authority_key` for settlement signatures,
    /// with the default 300-second freshness window.
    pub fn new(authority_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self {
            authority_key,
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
        }
    }

    /// Override the freshness window.
    pub fn with_freshness_window(mut self, secs: u64) -> Self {
        self.freshness_window_secs = secs;
        self
    }

    /// Validate one signed settlement and apply it atomically.
    ///
    /// On success every mutation has landed: both traders debited, both
    /// positions grown, the fee accrued, pool counters advanced, and a
    /// `DarkPoolTradeSettled` event recorded. On any `Err` the ledger is
    /// untouched.
    pub fn settle<L: Ledger, O: PriceOracle>(
        &self,
        signed: &SignedSettlement,
        pool: &mut PoolState,
        ledger: &mut L,
        oracle: &O,
        now: u64,
        events: &mut EventLog,
    ) -> Result<SettlementReceipt, SettlementError> {
        let record = &signed.record;

        // 1. Freshness. A future-dated record is stale too.
        let age = now.abs_diff(record.timestamp);
        if age > self.freshness_window_secs {
            return Err(SettlementError::Stale {
                recorded_at: record.timestamp,
                now,
            });
        }

        // 2. Authenticity
        if !signing::verify(
            &record.signing_payload(),
            &signed.signature,
            &self.authority_key,
        ) {
            error!(
                price = record.price,
                size = record.size,
                "settlement signature rejected"
            );
            return Err(SettlementError::BadSignature);
        }

        // 3. Slippage against the oracle
        let oracle_price = oracle
            .price(&record.custody)
            .and_then(price::decimal_to_fixed)
            .ok_or(SettlementError::OracleUnavailable)?;
        let actual_bps = price::slippage_bps(record.price, oracle_price)
            .ok_or(SettlementError::OracleUnavailable)?;
        if actual_bps > record.max_slippage_bps as u64 {
            return Err(SettlementError::SlippageExceeded {
                actual_bps,
                limit_bps: record.max_slippage_bps as u64,
            });
        }

        // 4. Collateral sufficiency. A self-match draws both deltas from one
        // balance, so requirements aggregate per trader.
        let requirements = if record.trader_a == record.trader_b {
            vec![(
                record.trader_a,
                record
                    .collateral_delta_a
                    .saturating_add(record.collateral_delta_b),
            )]
        } else {
            vec![
                (record.trader_a, record.collateral_delta_a),
                (record.trader_b, record.collateral_delta_b),
            ]
        };
        for (trader, needed) in requirements {
            let available = ledger.available_collateral(&trader);
            if available < needed {
                return Err(SettlementError::InsufficientCollateral {
                    trader,
                    needed,
                    available,
                });
            }
        }

        let side_a =
            Side::from_u8(record.side_a).ok_or(SettlementError::InvalidSide(record.side_a))?;

        // Single atomic application. The fee is bounded by the size, so the
        // computation cannot overflow.
        let fee = price::fee_amount(record.size, pool.fee_rate_bps).unwrap_or(0);
        let applied = ledger.apply_trade(&TradeApplication {
            trader_a: record.trader_a,
            trader_b: record.trader_b,
            side_a,
            size: record.size,
            price: record.price,
            pool: record.pool,
            custody: record.custody,
            collateral_delta_a: record.collateral_delta_a,
            collateral_delta_b: record.collateral_delta_b,
            fee,
            timestamp: now,
        })?;

        pool.record_settlement(record.size, fee);
        events.record(DarkPoolEvent::DarkPoolTradeSettled {
            trader_a: record.trader_a,
            trader_b: record.trader_b,
            size: record.size,
            price: record.price,
            timestamp: now,
        });
        info!(
            size = record.size,
            price = record.price,
            fee,
            slippage_bps = actual_bps,
            balance_a = applied.balance_a,
            balance_b = applied.balance_b,
            "trade settled"
        );

        Ok(SettlementReceipt {
            size: record.size,
            price: record.price,
            fee,
            collateral_delta_a: record.collateral_delta_a,
            collateral_delta_b: record.collateral_delta_b,
            record_hash: record.record_hash(),
            timestamp: now,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
