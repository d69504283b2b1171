//! End-to-end lifecycle tests: submit, match, settle.
//!
//! These tests drive the public API the way a host program would, with an
//! in-memory ledger and a static oracle:
//! 1. Codec round-trips survive the full submit path
//! 2. Replay prevention holds across resolution and expiry
//! 3. Slippage enforcement at and around the boundary
//! 4. Settlement atomicity under injected ledger failures
//! 5. Partial acceptance of mixed-validity match results
//!
//! ## Running
//!
//! ```bash
//! cargo test --test lifecycle_test
//! ```

use darkpool_core::bridge::{
    InMemoryLedger, Ledger, LedgerError, LedgerReceipt, PoolParams, PoolState, SettlementBridge,
    SettlementError, StaticOracle, TradeApplication,
};
use darkpool_core::codec::{decode_order, EnvelopeBuilder, EnvelopeCipher, Sha256Keystream};
use darkpool_core::coordinator::{
    ComputationKind, ComputationStatus, SubmissionCoordinator, SubmissionError,
};
use darkpool_core::events::{DarkPoolEvent, EventLog};
use darkpool_core::locator::Address;
use darkpool_core::matching::MatchResultProcessor;
use darkpool_core::signing::Ed25519Signer;
use darkpool_core::types::settlement::{MatchResult, MatchedPair, SignedMatchResult};
use darkpool_core::types::{DarkOrder, Side};

use rust_decimal::Decimal;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

const NETWORK_SEED: [u8; 32] = [11u8; 32];
const AUTHORITY_SEED: [u8; 32] = [22u8; 32];
const NETWORK_ENVELOPE_KEY: [u8; 32] = [0x55u8; 32];

const POOL_ID: [u8; 32] = [2u8; 32];
const CUSTODY: [u8; 32] = [3u8; 32];
const COLLATERAL_CUSTODY: [u8; 32] = [4u8; 32];

const TRADER_A: [u8; 32] = [1u8; 32];
const TRADER_B: [u8; 32] = [9u8; 32];

const T0: u64 = 1_700_000_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn pool() -> (PoolState, EventLog) {
    let mut events = EventLog::new();
    let pool = PoolState::initialize(
        [0xAAu8; 32],
        PoolParams {
            name: "BTC-PERP".to_string(),
            ledger_program: Address([8u8; 32]),
            min_order_size: 1_000_000,
            max_order_size: 100_000_000_000,
            fee_rate_bps: 30,
        },
        &mut events,
    )
    .expect("pool initialization");
    events.drain();
    (pool, events)
}

fn coordinator() -> SubmissionCoordinator<Sha256Keystream> {
    SubmissionCoordinator::new(EnvelopeBuilder::new(Sha256Keystream, 1), 60)
}

fn processor() -> MatchResultProcessor {
    let network = Ed25519Signer::from_seed(&NETWORK_SEED).expect("network signer");
    let authority = Ed25519Signer::from_seed(&AUTHORITY_SEED).expect("authority signer");
    MatchResultProcessor::new(network.public_key(), authority)
}

fn bridge() -> SettlementBridge {
    let authority = Ed25519Signer::from_seed(&AUTHORITY_SEED).expect("authority signer");
    SettlementBridge::new(authority.public_key())
}

fn sign_result(result: MatchResult) -> SignedMatchResult {
    let network = Ed25519Signer::from_seed(&NETWORK_SEED).expect("network signer");
    let signature = network.sign(&result.signing_payload());
    SignedMatchResult { result, signature }
}

fn long_order(nonce: u64) -> DarkOrder {
    DarkOrder::new(
        TRADER_A,
        Side::Long,
        1_000_000_000,
        200_000_000,
        50_000_000_000,
        5,
        POOL_ID,
        CUSTODY,
        COLLATERAL_CUSTODY,
        T0,
        nonce,
    )
}

fn short_order(nonce: u64) -> DarkOrder {
    DarkOrder::new(
        TRADER_B,
        Side::Short,
        1_000_000_000,
        200_000_000,
        49_500_000_000,
        5,
        POOL_ID,
        CUSTODY,
        COLLATERAL_CUSTODY,
        T0,
        nonce,
    )
}

fn crossed_result(order_a: DarkOrder, order_b: DarkOrder, price: u64) -> MatchResult {
    let matched_size = order_a.size.min(order_b.size);
    MatchResult {
        pairs: vec![MatchedPair {
            order_a,
            order_b,
            matched_size,
            execution_price: price,
            timestamp: T0 + 5,
        }],
        total_volume: matched_size,
        average_price: price,
        timestamp: T0 + 5,
    }
}

fn funded_ledger() -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    ledger.credit(TRADER_A, 500_000_000);
    ledger.credit(TRADER_B, 500_000_000);
    ledger
}

fn oracle(price_usd: u64) -> StaticOracle {
    let mut oracle = StaticOracle::new();
    oracle.set(CUSTODY, Decimal::from(price_usd));
    oracle
}

/// Ledger wrapper that fails application after passing all bridge
/// pre-checks, for atomicity testing.
struct FailingLedger {
    inner: InMemoryLedger,
    fail: bool,
}

impl Ledger for FailingLedger {
    fn available_collateral(&self, trader: &[u8; 32]) -> u64 {
        self.inner.available_collateral(trader)
    }

    fn apply_trade(&mut self, trade: &TradeApplication) -> Result<LedgerReceipt, LedgerError> {
        if self.fail {
            return Err(LedgerError::Overflow);
        }
        self.inner.apply_trade(trade)
    }
}

// ============================================================================
// CODEC THROUGH THE SUBMIT PATH
// ============================================================================

#[test]
fn submitted_envelope_decrypts_to_the_original_order() {
    let mut coordinator = coordinator();
    let (mut pool, mut events) = pool();
    let order = long_order(42);

    let handle = coordinator
        .submit(&order, &NETWORK_ENVELOPE_KEY, &mut pool, T0, &mut events)
        .expect("submit");

    let envelopes = coordinator
        .queued_envelopes(handle.offset)
        .expect("queued envelope");
    assert_eq!(envelopes.len(), 1);

    // The keystream cipher is self-inverse: sealing the ciphertext again
    // with the same key and nonce recovers the padded plaintext.
    let envelope = &envelopes[0];
    let mut plaintext = envelope.ciphertext;
    Sha256Keystream.seal(&mut plaintext, &envelope.network_key, envelope.nonce);

    let decoded = decode_order(&plaintext).expect("decode padded plaintext");
    assert_eq!(decoded, order);
}

// ============================================================================
// REPLAY PREVENTION
// ============================================================================

#[test]
fn nonce_is_held_while_queued_and_consumed_on_resolution() {
    let mut coordinator = coordinator();
    let (mut pool, mut events) = pool();

    let handle = coordinator
        .submit(&long_order(42), &NETWORK_ENVELOPE_KEY, &mut pool, T0, &mut events)
        .expect("first submit");

    // Queued: duplicate rejected
    assert!(matches!(
        coordinator.submit(&long_order(42), &NETWORK_ENVELOPE_KEY, &mut pool, T0, &mut events),
        Err(SubmissionError::DuplicateNonce { nonce: 42 })
    ));

    let signed = sign_result(crossed_result(long_order(42), short_order(7), 49_000_000_000));
    coordinator
        .record_result(handle.offset, signed)
        .expect("record result");

    // Resolved: consumed forever
    assert!(matches!(
        coordinator.submit(&long_order(42), &NETWORK_ENVELOPE_KEY, &mut pool, T0 + 100, &mut events),
        Err(SubmissionError::DuplicateNonce { .. })
    ));
}

#[test]
fn expiry_releases_the_nonce_for_resubmission() {
    let mut coordinator = coordinator();
    let (mut pool, mut events) = pool();

    let handle = coordinator
        .submit(&long_order(42), &NETWORK_ENVELOPE_KEY, &mut pool, T0, &mut events)
        .expect("submit");

    assert_eq!(coordinator.expire_stale(T0 + 61), 1);
    assert_eq!(coordinator.poll(&handle), ComputationStatus::Expired);

    // A late result is refused, but the order can go again
    let signed = sign_result(crossed_result(long_order(42), short_order(7), 49_000_000_000));
    assert!(matches!(
        coordinator.record_result(handle.offset, signed),
        Err(SubmissionError::Expired(_))
    ));
    coordinator
        .submit(&long_order(42), &NETWORK_ENVELOPE_KEY, &mut pool, T0 + 62, &mut events)
        .expect("resubmit after expiry");
}

// ============================================================================
// SLIPPAGE ENFORCEMENT
// ============================================================================

#[test]
fn slippage_over_the_limit_rejects_settlement() {
    let (mut pool, mut events) = pool();
    let processor = processor();
    let bridge = bridge();
    let mut ledger = funded_ledger();

    let handle = queue_pair(&mut pool, &mut events);
    let signed = sign_result(crossed_result(long_order(42), short_order(7), 49_000_000_000));
    let outcome = processor
        .process(&handle, &signed, 100, &mut pool, T0 + 6, &mut events)
        .expect("process");

    // 49_000 vs oracle 49_500 -> 101 bps, limit 100
    let err = bridge
        .settle(
            &outcome.settlements[0],
            &mut pool,
            &mut ledger,
            &oracle(49_500),
            T0 + 10,
            &mut events,
        )
        .expect_err("rejection");
    assert!(matches!(
        err,
        SettlementError::SlippageExceeded {
            actual_bps: 101,
            limit_bps: 100
        }
    ));
    assert_eq!(pool.total_settlements, 0);
    assert_eq!(ledger.available_collateral(&TRADER_A), 500_000_000);
}

#[test]
fn slippage_exactly_at_the_limit_settles() {
    let (mut pool, mut events) = pool();
    let processor = processor();
    let bridge = bridge();
    let mut ledger = funded_ledger();

    let handle = queue_pair(&mut pool, &mut events);
    let signed = sign_result(crossed_result(long_order(42), short_order(7), 49_000_000_000));
    let outcome = processor
        .process(&handle, &signed, 100, &mut pool, T0 + 6, &mut events)
        .expect("process");

    // 49_000 vs oracle 49_495 -> exactly 100 bps after flooring
    bridge
        .settle(
            &outcome.settlements[0],
            &mut pool,
            &mut ledger,
            &oracle(49_495),
            T0 + 10,
            &mut events,
        )
        .expect("boundary accepted");
}

// ============================================================================
// ATOMICITY
// ============================================================================

#[test]
fn failed_application_leaves_pool_and_events_untouched() {
    let (mut pool, mut events) = pool();
    let processor = processor();
    let bridge = bridge();

    let handle = queue_pair(&mut pool, &mut events);
    let signed = sign_result(crossed_result(long_order(42), short_order(7), 49_000_000_000));
    let outcome = processor
        .process(&handle, &signed, 100, &mut pool, T0 + 6, &mut events)
        .expect("process");
    events.drain();

    let mut ledger = FailingLedger {
        inner: funded_ledger(),
        fail: true,
    };
    let err = bridge
        .settle(
            &outcome.settlements[0],
            &mut pool,
            &mut ledger,
            &oracle(48_900),
            T0 + 10,
            &mut events,
        )
        .expect_err("injected failure");
    assert!(matches!(err, SettlementError::Ledger(_)));

    assert_eq!(pool.total_settlements, 0);
    assert_eq!(pool.total_volume, 0);
    assert!(events.is_empty());
    assert_eq!(ledger.available_collateral(&TRADER_A), 500_000_000);

    // The same settlement succeeds once the fault clears
    ledger.fail = false;
    bridge
        .settle(
            &outcome.settlements[0],
            &mut pool,
            &mut ledger,
            &oracle(48_900),
            T0 + 10,
            &mut events,
        )
        .expect("retry succeeds");
    assert_eq!(pool.total_settlements, 1);
}

// ============================================================================
// PARTIAL ACCEPTANCE
// ============================================================================

#[test]
fn one_bad_pair_does_not_block_the_good_one() {
    let (mut pool, mut events) = pool();
    let processor = processor();

    let good = MatchedPair {
        order_a: long_order(42),
        order_b: short_order(7),
        matched_size: 1_000_000_000,
        execution_price: 49_000_000_000,
        timestamp: T0 + 5,
    };
    let mut bad_short = short_order(8);
    bad_short.side = Side::Long; // same side as its counterparty
    let bad = MatchedPair {
        order_a: long_order(43),
        order_b: bad_short,
        matched_size: 1_000_000_000,
        execution_price: 49_000_000_000,
        timestamp: T0 + 5,
    };

    let result = MatchResult {
        pairs: vec![good, bad],
        total_volume: 2_000_000_000,
        average_price: 49_000_000_000,
        timestamp: T0 + 5,
    };
    let handle = queue_pair(&mut pool, &mut events);
    let outcome = processor
        .process(&handle, &sign_result(result), 100, &mut pool, T0 + 6, &mut events)
        .expect("process");

    assert_eq!(outcome.settlements.len(), 1);
    assert_eq!(outcome.settlements[0].record.trader_a, TRADER_A);
    assert!(matches!(
        outcome.rejected[..],
        [darkpool_core::matching::ProcessingError::InvalidMatch { index: 1, .. }]
    ));
}

// ============================================================================
// END-TO-END
// ============================================================================

#[test]
fn full_lifecycle_settles_and_reports() {
    let mut coordinator = coordinator();
    let (mut pool, mut events) = pool();
    let processor = processor();
    let bridge = bridge();
    let mut ledger = funded_ledger();

    // Submit both orders as one matching computation
    let orders = vec![long_order(42), short_order(7)];
    let handle = coordinator
        .submit_batch(
            &orders,
            ComputationKind::MatchOrders,
            &NETWORK_ENVELOPE_KEY,
            &mut pool,
            T0,
            &mut events,
        )
        .expect("batch submit");
    assert_eq!(pool.total_orders, 2);

    // Network resolves
    let signed = sign_result(crossed_result(long_order(42), short_order(7), 49_000_000_000));
    coordinator
        .record_result(handle.offset, signed.clone())
        .expect("record result");
    let resolved = match coordinator.poll(&handle) {
        ComputationStatus::Resolved(result) => result,
        other => panic!("expected resolution, got {other:?}"),
    };
    assert_eq!(resolved.total_volume, 1_000_000_000);

    // Process and settle
    let outcome = processor
        .process(&handle, &signed, 100, &mut pool, T0 + 6, &mut events)
        .expect("process");
    let receipt = bridge
        .settle(
            &outcome.settlements[0],
            &mut pool,
            &mut ledger,
            &oracle(48_900),
            T0 + 10,
            &mut events,
        )
        .expect("settle");

    assert_eq!(receipt.size, 1_000_000_000);
    assert_eq!(receipt.price, 49_000_000_000);
    assert_eq!(receipt.fee, 3_000_000);

    // Pool totals reflect the whole run
    assert_eq!(pool.total_orders, 2);
    assert_eq!(pool.total_matches, 1);
    assert_eq!(pool.total_settlements, 1);
    assert_eq!(pool.total_volume, 1_000_000_000);
    assert_eq!(pool.total_fees, 3_000_000);

    // Both traders debited, both positions open
    assert_eq!(ledger.available_collateral(&TRADER_A), 300_000_000);
    assert_eq!(ledger.available_collateral(&TRADER_B), 300_000_000);
    let long = ledger
        .position(&TRADER_A, &POOL_ID, &CUSTODY, Side::Long)
        .expect("long position");
    assert_eq!(long.size, 1_000_000_000);
    assert_eq!(long.average_price, 49_000_000_000);

    // Exactly one settled event in the stream
    let settled: Vec<_> = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, DarkPoolEvent::DarkPoolTradeSettled { .. }))
        .collect();
    assert_eq!(settled.len(), 1);
}

fn queue_pair(pool: &mut PoolState, events: &mut EventLog) -> darkpool_core::ComputationHandle {
    let mut coordinator = coordinator();
    coordinator
        .submit_batch(
            &[long_order(42), short_order(7)],
            ComputationKind::MatchOrders,
            &NETWORK_ENVELOPE_KEY,
            pool,
            T0,
            events,
        )
        .expect("batch submit")
}
