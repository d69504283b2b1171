//! Fixed-layout binary codec for dark orders.
//!
//! ## Wire Layout
//!
//! A serialized order is exactly 177 bytes, little-endian throughout:
//!
//! ```text
//! owner(32) | side(1) | size(8) | collateral(8) | max_price(8) |
//! leverage(8) | pool(32) | custody(32) | collateral_custody(32) |
//! timestamp(8) | nonce(8)
//! ```
//!
//! ## Laws
//!
//! - `decode(encode(o)) == o` for every valid order
//! - Identical orders always produce identical bytes (no padding variance,
//!   no map iteration, no platform dependence)
//! - Invalid input never decodes to a default value: every violation yields
//!   a distinguishable [`DecodeError`]

use thiserror::Error;

use crate::types::order::{DarkOrder, Side};

/// Serialized length of a dark order in bytes.
pub const ORDER_WIRE_LEN: usize = 177;

/// Decoding failures for the order wire format.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer than [`ORDER_WIRE_LEN`] bytes were available
    #[error("truncated order: need {ORDER_WIRE_LEN} bytes, got {0}")]
    Truncated(usize),

    /// The side byte was outside {0, 1}
    #[error("invalid side byte: {0}")]
    InvalidSide(u8),
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a dark order to its fixed 177-byte wire layout.
pub fn encode_order(order: &DarkOrder) -> [u8; ORDER_WIRE_LEN] {
    let mut buf = [0u8; ORDER_WIRE_LEN];
    let mut at = 0usize;

    put(&mut buf, &mut at, &order.owner);
    put(&mut buf, &mut at, &[order.side.to_u8()]);
    put(&mut buf, &mut at, &order.size.to_le_bytes());
    put(&mut buf, &mut at, &order.collateral.to_le_bytes());
    put(&mut buf, &mut at, &order.max_price.to_le_bytes());
    put(&mut buf, &mut at, &order.leverage.to_le_bytes());
    put(&mut buf, &mut at, &order.pool);
    put(&mut buf, &mut at, &order.custody);
    put(&mut buf, &mut at, &order.collateral_custody);
    put(&mut buf, &mut at, &order.timestamp.to_le_bytes());
    put(&mut buf, &mut at, &order.nonce.to_le_bytes());
    debug_assert_eq!(at, ORDER_WIRE_LEN);

    buf
}

fn put(buf: &mut [u8], at: &mut usize, bytes: &[u8]) {
    buf[*at..*at + bytes.len()].copy_from_slice(bytes);
    *at += bytes.len();
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a dark order from the first [`ORDER_WIRE_LEN`] bytes of `buf`.
///
/// Trailing bytes (envelope padding) are ignored. Fails with
/// [`DecodeError::Truncated`] if fewer bytes are available, or
/// [`DecodeError::InvalidSide`] if the side byte is outside {0, 1}.
pub fn decode_order(buf: &[u8]) -> Result<DarkOrder, DecodeError> {
    if buf.len() < ORDER_WIRE_LEN {
        return Err(DecodeError::Truncated(buf.len()));
    }

    let mut at = 0usize;
    let owner = take_32(buf, &mut at);
    let side_raw = take_u8(buf, &mut at);
    let side = Side::from_u8(side_raw).ok_or(DecodeError::InvalidSide(side_raw))?;
    let size = take_u64(buf, &mut at);
    let collateral = take_u64(buf, &mut at);
    let max_price = take_u64(buf, &mut at);
    let leverage = take_u64(buf, &mut at);
    let pool = take_32(buf, &mut at);
    let custody = take_32(buf, &mut at);
    let collateral_custody = take_32(buf, &mut at);
    let timestamp = take_u64(buf, &mut at);
    let nonce = take_u64(buf, &mut at);
    debug_assert_eq!(at, ORDER_WIRE_LEN);

    Ok(DarkOrder {
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
    })
}

fn take_u8(buf: &[u8], at: &mut usize) -> u8 {
    let v = buf[*at];
    *at += 1;
    v
}

fn take_u64(buf: &[u8], at: &mut usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[*at..*at + 8]);
    *at += 8;
    u64::from_le_bytes(bytes)
}

fn take_32(buf: &[u8], at: &mut usize) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&buf[*at..*at + 32]);
    *at += 32;
    bytes
}

// ============================================================================
// Unit Tests
// ============================================================================
