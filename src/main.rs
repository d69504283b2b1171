//! Darkpool Core - Binary Entry Point
//!
//! Drives one full order lifecycle against in-memory collaborators:
//! submit two opposing orders, resolve a simulated match, and settle the
//! trade through the bridge.

use darkpool_core::bridge::{
    InMemoryLedger, Ledger, PoolParams, PoolState, SettlementBridge, StaticOracle,
};
use darkpool_core::codec::{EnvelopeBuilder, Sha256Keystream};
use darkpool_core::coordinator::{ComputationKind, SubmissionCoordinator};
use darkpool_core::events::EventLog;
use darkpool_core::locator::Address;
use darkpool_core::matching::{MatchResultProcessor, MatchingNetwork};
use darkpool_core::signing::Ed25519Signer;
use darkpool_core::types::settlement::{MatchResult, MatchedPair, SignedMatchResult};
use darkpool_core::types::{DarkOrder, Side};
use darkpool_core::ComputationHandle;
use rust_decimal::Decimal;

/// Simulated matching network: crosses a pre-loaded pair at the taker's
/// limit and signs the result.
struct LocalNetwork {
    signer: Ed25519Signer,
    pending: Option<MatchResult>,
}

impl MatchingNetwork for LocalNetwork {
    fn resolve(&mut self, _handle: &ComputationHandle) -> Option<SignedMatchResult> {
        let result = self.pending.take()?;
        let signature = self.signer.sign(&result.signing_payload());
        Some(SignedMatchResult { result, signature })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("===========================================");
    println!("  Darkpool Core - Lifecycle Demo");
    println!("===========================================");
    println!();

    let now = 1_700_000_000u64;
    let mut events = EventLog::new();

    // Pool
    let mut pool = PoolState::initialize(
        [0xAAu8; 32],
        PoolParams {
            name: "BTC-PERP".to_string(),
            ledger_program: Address([9u8; 32]),
            min_order_size: 1_000_000,
            max_order_size: 100_000_000_000,
            fee_rate_bps: 30,
        },
        &mut events,
    )?;
    println!("Pool initialized at {}", pool.address);

    // Two opposing orders: 1000.000000 USD of size each
    let pool_id = pool.address.0;
    let long = DarkOrder::new(
        [1u8; 32],
        Side::Long,
        1_000_000_000,
        200_000_000,
        50_000_000_000,
        5,
        pool_id,
        [3u8; 32],
        [4u8; 32],
        now,
        42,
    );
    let short = DarkOrder::new(
        [9u8; 32],
        Side::Short,
        1_000_000_000,
        200_000_000,
        49_500_000_000,
        5,
        pool_id,
        [3u8; 32],
        [4u8; 32],
        now,
        7,
    );

    // Submit both as one matching computation
    let network_key = [0x55u8; 32];
    let mut coordinator =
        SubmissionCoordinator::new(EnvelopeBuilder::new(Sha256Keystream, 1), 60);
    let handle = coordinator.submit_batch(
        &[long.clone(), short.clone()],
        ComputationKind::MatchOrders,
        &network_key,
        &mut pool,
        now,
        &mut events,
    )?;
    println!(
        "Queued computation {} with {} sealed envelope(s)",
        handle.offset,
        coordinator
            .queued_envelopes(handle.offset)
            .map(|e| e.len())
            .unwrap_or(0),
    );

    // Simulated confidential network crosses the pair at 49000
    let network_signer = Ed25519Signer::from_seed(&[11u8; 32])?;
    let mut network = LocalNetwork {
        signer: network_signer,
        pending: Some(MatchResult {
            pairs: vec![MatchedPair {
                order_a: long,
                order_b: short,
                matched_size: 1_000_000_000,
                execution_price: 49_000_000_000,
                timestamp: now + 5,
            }],
            total_volume: 1_000_000_000,
            average_price: 49_000_000_000,
            timestamp: now + 5,
        }),
    };
    let signed = network
        .resolve(&handle)
        .ok_or("network produced no result")?;
    coordinator.record_result(handle.offset, signed.clone())?;
    println!("Computation {} resolved", handle.offset);

    // Verify the result and produce signed settlements
    let authority = Ed25519Signer::from_seed(&[22u8; 32])?;
    let network_pubkey = Ed25519Signer::from_seed(&[11u8; 32])?.public_key();
    let processor = MatchResultProcessor::new(network_pubkey, authority);
    let outcome = processor.process(&handle, &signed, 100, &mut pool, now + 6, &mut events)?;
    println!(
        "Processed match result: {} settlement(s), {} rejected",
        outcome.settlements.len(),
        outcome.rejected.len(),
    );

    // Settle through the bridge
    let mut ledger = InMemoryLedger::new();
    ledger.credit([1u8; 32], 500_000_000);
    ledger.credit([9u8; 32], 500_000_000);
    let mut oracle = StaticOracle::new();
    oracle.set([3u8; 32], Decimal::from(48_900u64));

    let bridge = SettlementBridge::new(processor.authority_key());
    for settlement in &outcome.settlements {
        let receipt = bridge.settle(
            settlement,
            &mut pool,
            &mut ledger,
            &oracle,
            now + 10,
            &mut events,
        )?;
        println!(
            "Settled {} @ {} (fee {}), record {}",
            receipt.size,
            receipt.price,
            receipt.fee,
            receipt.record_hash_hex(),
        );
    }

    println!();
    println!("Pool totals:");
    println!("  orders:      {}", pool.total_orders);
    println!("  matches:     {}", pool.total_matches);
    println!("  settlements: {}", pool.total_settlements);
    println!("  volume:      {}", pool.total_volume);
    println!("  fees:        {}", pool.total_fees);
    println!(
        "Trader A collateral remaining: {}",
        ledger.available_collateral(&[1u8; 32]),
    );
    println!("Events recorded: {}", events.len());

    Ok(())
}
