//! Core data types for the darkpool protocol.
//!
//! - [`order`]: DarkOrder and Side
//! - [`settlement`]: MatchResult, TradeSettlement, SettlementReceipt
//! - [`price`]: fixed-point money math (10^6 scale)

pub mod order;
pub mod price;
pub mod settlement;

pub use order::{DarkOrder, Side, MAX_LEVERAGE};
pub use settlement::{
    MatchResult, MatchedPair, SettlementReceipt, SignedMatchResult, SignedSettlement,
    TradeSettlement, SIGNATURE_LEN,
};
