//! Protocol events.
//!
//! Events are appended to an [`EventLog`] passed explicitly through each
//! lifecycle call — no ambient or global sinks. Emission happens before the
//! emitting call returns, so per-order ordering follows call ordering, and
//! subscribers draining the log observe events at least once.

use crate::locator::Address;

/// All events produced across the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DarkPoolEvent {
    /// A pool was initialized with its configuration
    DarkpoolInitialized {
        /// Derived pool state address
        pool: Address,
        /// Pool authority identity
        authority: [u8; 32],
        /// Floor on order size
        min_order_size: u64,
        /// Ceiling on order size
        max_order_size: u64,
        /// Fee in basis points
        fee_rate_bps: u16,
    },

    /// An order was validated, sealed and queued for matching
    DarkOrderSubmitted {
        /// Order owner
        owner: [u8; 32],
        /// Assigned computation offset
        computation_offset: u64,
        /// Submission time (Unix seconds)
        timestamp: u64,
    },

    /// A signed match result was processed
    DarkOrdersMatched {
        /// Aggregate volume over accepted pairs
        total_volume: u64,
        /// Volume-weighted average price over accepted pairs
        average_price: u64,
        /// Number of accepted pairs
        pair_count: u64,
        /// Processing time (Unix seconds)
        timestamp: u64,
    },

    /// A settlement was applied to the external ledger
    DarkPoolTradeSettled {
        /// Trader A identity
        trader_a: [u8; 32],
        /// Trader B identity
        trader_b: [u8; 32],
        /// Matched size
        size: u64,
        /// Execution price
        price: u64,
        /// Settlement time (Unix seconds)
        timestamp: u64,
    },
}

/// Append-only event log handed explicitly through lifecycle calls.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<DarkPoolEvent>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event
    pub fn record(&mut self, event: DarkPoolEvent) {
        self.events.push(event);
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate recorded events in emission order
    pub fn iter(&self) -> impl Iterator<Item = &DarkPoolEvent> {
        self.events.iter()
    }

    /// Drain all recorded events for delivery to subscribers
    pub fn drain(&mut self) -> Vec<DarkPoolEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
