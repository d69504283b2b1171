//! Ledger and oracle seams for the settlement bridge.
//!
//! ## Seams
//!
//! The bridge never talks to a concrete ledger or price feed directly: it
//! goes through [`Ledger`] and [`PriceOracle`]. Production wires these to
//! the host ledger program and its oracle accounts; tests and demos use the
//! in-memory implementations here.
//!
//! ## Atomicity
//!
//! [`Ledger::apply_trade`] is all-or-nothing. [`InMemoryLedger`] enforces
//! this by staging: balances are checked (aggregated per trader, so a
//! self-match needs its combined delta) and both legs' new position values
//! are computed before the first write, so a failed application leaves no
//! partial mutation behind.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::locator::{self, Address, DerivationError};
use crate::types::order::Side;

// ============================================================================
// Traits
// ============================================================================

/// Collateral accounting surface the settlement bridge writes through.
pub trait Ledger {
    /// Free collateral available to a trader, in minor units.
    fn available_collateral(&self, trader: &[u8; 32]) -> u64;

    /// Apply one settled trade atomically: debit both traders, grow both
    /// positions, accrue the fee. Either every mutation lands or none do.
    fn apply_trade(&mut self, trade: &TradeApplication) -> Result<LedgerReceipt, LedgerError>;
}

/// Price feed surface for the bridge's slippage check.
pub trait PriceOracle {
    /// Current price for a custody, as a decimal in whole USD. `None` when
    /// the feed has no quote for this custody.
    fn price(&self, custody: &[u8; 32]) -> Option<Decimal>;
}

// ============================================================================
// TradeApplication
// ============================================================================

/// The mutations one settled trade asks of the ledger.
#[derive(Debug, Clone)]
pub struct TradeApplication {
    /// Trader A identity
    pub trader_a: [u8; 32],

    /// Trader B identity
    pub trader_b: [u8; 32],

    /// Trader A's side; B takes the opposite
    pub side_a: Side,

    /// Matched size in USD minor units
    pub size: u64,

    /// Execution price (scaled by 10^6)
    pub price: u64,

    /// Pool identity
    pub pool: [u8; 32],

    /// Custody identity of the traded asset
    pub custody: [u8; 32],

    /// Collateral to debit from trader A
    pub collateral_delta_a: u64,

    /// Collateral to debit from trader B
    pub collateral_delta_b: u64,

    /// Protocol fee to accrue
    pub fee: u64,

    /// Application time (Unix seconds)
    pub timestamp: u64,
}

/// Acknowledgement of one applied trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Derived address of trader A's position
    pub position_a: Address,

    /// Derived address of trader B's position
    pub position_b: Address,

    /// Trader A's free collateral after the debit
    pub balance_a: u64,

    /// Trader B's free collateral after the debit
    pub balance_b: u64,
}

// ============================================================================
// Errors
// ============================================================================

/// Ledger application failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A trader's free collateral does not cover their delta
    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance {
        /// The underfunded trader
        trader: [u8; 32],
        /// Collateral the trade requires
        needed: u64,
        /// Collateral the trader holds
        available: u64,
    },

    /// Position arithmetic left u64 range
    #[error("position arithmetic overflow")]
    Overflow,

    /// Position address derivation failed
    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

// ============================================================================
// InMemoryLedger
// ============================================================================

/// One open position, keyed by its derived address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Position owner
    pub owner: [u8; 32],

    /// Position side
    pub side: Side,

    /// Open size in USD minor units
    pub size: u64,

    /// Collateral locked against the position
    pub collateral: u64,

    /// Volume-weighted average entry price (scaled by 10^6)
    pub average_price: u64,

    /// Last update time (Unix seconds)
    pub updated_at: u64,
}

/// In-memory [`Ledger`] for tests and demos.
///
/// Positions are keyed by the same derived addresses a host ledger would
/// use, one per (owner, pool, custody, side).
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<[u8; 32], u64>,
    positions: HashMap<Address, Position>,
    accrued_fees: u64,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit free collateral to a trader
    pub fn credit(&mut self, trader: [u8; 32], amount: u64) {
        let balance = self.balances.entry(trader).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Look up a position by its identity components
    pub fn position(
        &self,
        owner: &[u8; 32],
        pool: &[u8; 32],
        custody: &[u8; 32],
        side: Side,
    ) -> Option<&Position> {
        let address = locator::position_address(owner, pool, custody, side.to_u8()).ok()?;
        self.positions.get(&address)
    }

    /// Total protocol fees accrued across applied trades
    pub fn accrued_fees(&self) -> u64 {
        self.accrued_fees
    }

    fn grow_position(
        position: &mut Position,
        size: u64,
        price: u64,
        collateral: u64,
        now: u64,
    ) -> Result<(), LedgerError> {
        // Volume-weighted entry price across the old size and the new fill
        let old_notional = (position.average_price as u128) * (position.size as u128);
        let new_notional = (price as u128) * (size as u128);
        let combined_size = position
            .size
            .checked_add(size)
            .ok_or(LedgerError::Overflow)?;

        let average = (old_notional + new_notional) / (combined_size as u128);
        position.average_price = u64::try_from(average).map_err(|_| LedgerError::Overflow)?;
        position.size = combined_size;
        position.collateral = position
            .collateral
            .checked_add(collateral)
            .ok_or(LedgerError::Overflow)?;
        position.updated_at = now;

        Ok(())
    }

    /// Compute one leg's post-trade position without mutating anything.
    fn stage_leg(
        &self,
        owner: [u8; 32],
        side: Side,
        trade: &TradeApplication,
        collateral_delta: u64,
    ) -> Result<(Address, Position), LedgerError> {
        let address =
            locator::position_address(&owner, &trade.pool, &trade.custody, side.to_u8())?;

        let mut position = self.positions.get(&address).cloned().unwrap_or(Position {
            owner,
            side,
            size: 0,
            collateral: 0,
            average_price: 0,
            updated_at: trade.timestamp,
        });
        Self::grow_position(
            &mut position,
            trade.size,
            trade.price,
            collateral_delta,
            trade.timestamp,
        )?;

        Ok((address, position))
    }

    // Infallible: aggregate sufficiency was checked before commit
    fn debit(&mut self, trader: &[u8; 32], amount: u64) {
        if let Some(balance) = self.balances.get_mut(trader) {
            *balance -= amount;
        }
    }
}

impl Ledger for InMemoryLedger {
    fn available_collateral(&self, trader: &[u8; 32]) -> u64 {
        self.balances.get(trader).copied().unwrap_or(0)
    }

    fn apply_trade(&mut self, trade: &TradeApplication) -> Result<LedgerReceipt, LedgerError> {
        // Validate everything before the first mutation. A trade where both
        // legs belong to one trader needs the combined delta from that one
        // balance, so requirements aggregate per trader.
        let requirements = if trade.trader_a == trade.trader_b {
            vec![(
                trade.trader_a,
                trade
                    .collateral_delta_a
                    .saturating_add(trade.collateral_delta_b),
            )]
        } else {
            vec![
                (trade.trader_a, trade.collateral_delta_a),
                (trade.trader_b, trade.collateral_delta_b),
            ]
        };
        for (trader, needed) in requirements {
            let available = self.available_collateral(&trader);
            if available < needed {
                return Err(LedgerError::InsufficientBalance {
                    trader,
                    needed,
                    available,
                });
            }
        }

        // Stage both legs, then commit. The sides oppose, so the two
        // position addresses are distinct even for a single owner.
        let (position_a, staged_a) =
            self.stage_leg(trade.trader_a, trade.side_a, trade, trade.collateral_delta_a)?;
        let (position_b, staged_b) = self.stage_leg(
            trade.trader_b,
            trade.side_a.opposite(),
            trade,
            trade.collateral_delta_b,
        )?;

        self.positions.insert(position_a, staged_a);
        self.positions.insert(position_b, staged_b);
        self.debit(&trade.trader_a, trade.collateral_delta_a);
        self.debit(&trade.trader_b, trade.collateral_delta_b);
        self.accrued_fees = self.accrued_fees.saturating_add(trade.fee);

        debug!(
            size = trade.size,
            price = trade.price,
            fee = trade.fee,
            "trade applied to ledger"
        );
        Ok(LedgerReceipt {
            position_a,
            position_b,
            balance_a: self.available_collateral(&trade.trader_a),
            balance_b: self.available_collateral(&trade.trader_b),
        })
    }
}

// ============================================================================
// StaticOracle
// ============================================================================

/// Fixed-quote [`PriceOracle`] for tests and demos.
#[derive(Debug, Default)]
pub struct StaticOracle {
    quotes: HashMap<[u8; 32], Decimal>,
}

impl StaticOracle {
    /// Create an empty oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quote for a custody
    pub fn set(&mut self, custody: [u8; 32], price: Decimal) {
        self.quotes.insert(custody, price);
    }
}

impl PriceOracle for StaticOracle {
    fn price(&self, custody: &[u8; 32]) -> Option<Decimal> {
        self.quotes.get(custody).copied()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
