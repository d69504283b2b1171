//! Pool state and the settlement bridge.
//!
//! The bridge is the last stage of the lifecycle: a [`SignedSettlement`]
//! produced by the matching result processor is validated (freshness,
//! authenticity, slippage, collateral) and applied to a [`Ledger`] in one
//! atomic step, yielding a [`SettlementReceipt`].
//!
//! [`SignedSettlement`]: crate::types::settlement::SignedSettlement
//! [`SettlementReceipt`]: crate::types::settlement::SettlementReceipt

pub mod ledger;
pub mod pool;
pub mod settle;

pub use ledger::{
    InMemoryLedger, Ledger, LedgerError, LedgerReceipt, Position, PriceOracle, StaticOracle,
    TradeApplication,
};
pub use pool::{PoolError, PoolParams, PoolState};
pub use settle::{SettlementBridge, SettlementError, DEFAULT_FRESHNESS_WINDOW_SECS};
