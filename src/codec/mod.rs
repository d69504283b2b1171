//! Binary codec and transport envelope for dark orders.
//!
//! ## Pipeline Position
//!
//! The codec is the first stage of the lifecycle: a [`DarkOrder`] is encoded
//! to its fixed 177-byte layout, sealed into a fixed-capacity
//! [`EncryptedEnvelope`], and only then queued for confidential matching.
//!
//! ```
//! use darkpool_core::codec::{encode_order, decode_order};
//! use darkpool_core::types::{DarkOrder, Side};
//!
//! let order = DarkOrder::new(
//!     [1u8; 32], Side::Long, 1_000_000_000, 200_000_000,
//!     50_000_000_000, 5, [2u8; 32], [3u8; 32], [4u8; 32],
//!     1_700_000_000, 42,
//! );
//! assert_eq!(decode_order(&encode_order(&order)).unwrap(), order);
//! ```
//!
//! [`DarkOrder`]: crate::types::DarkOrder

pub mod envelope;
pub mod order;

pub use envelope::{
    EncryptedEnvelope, EnvelopeBuilder, EnvelopeCipher, EnvelopeError, Sha256Keystream,
    ENVELOPE_CAPACITY,
};
pub use order::{decode_order, encode_order, DecodeError, ORDER_WIRE_LEN};
