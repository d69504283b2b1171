//! Deterministic resource address derivation.
//!
//! ## Purpose
//!
//! Every addressable resource in the system — pools, positions, computation
//! slots, fee accounts, oracles, custody token accounts — is located by a
//! pure derivation from stable seeds. Same kind and seeds always yield the
//! same [`Address`]; there is no hidden state and no I/O. This isolates all
//! addressing logic so every other component can be tested against fixed,
//! reproducible addresses.
//!
//! ## Derivation
//!
//! `SHA-256(domain_tag || kind_tag || framed seeds)`, where each seed is
//! framed as a type byte, a little-endian length, and its raw bytes. The
//! framing makes seed boundaries unambiguous: `("ab", "c")` and
//! `("a", "bc")` derive different addresses.
//!
//! ## Seed Shapes
//!
//! Each resource kind expects a fixed seed shape; anything else is a
//! programming or configuration error surfaced as
//! [`DerivationError::InvalidSeeds`], never silently coerced.
//!
//! | Kind                | Seeds                                        |
//! |---------------------|----------------------------------------------|
//! | Pool                | pool name tag                                |
//! | Position            | owner, pool, custody, side byte (0 or 1)     |
//! | ComputationSlot     | computation offset                           |
//! | FeePool             | (none)                                       |
//! | Oracle              | custody                                      |
//! | CustodyTokenAccount | pool, mint                                   |

use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Domain separator for all address derivations in this protocol.
const DERIVATION_DOMAIN: &[u8] = b"darkpool:locator:v1";

// ============================================================================
// Address
// ============================================================================

/// A derived 32-byte resource address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Raw address bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering of the address
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

// ============================================================================
// ResourceKind and Seed
// ============================================================================

/// Addressable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A trading pool
    Pool,
    /// A trader's position in (pool, custody, side)
    Position,
    /// A queued confidential computation slot
    ComputationSlot,
    /// The protocol fee account
    FeePool,
    /// Price oracle for one custody
    Oracle,
    /// Token account holding a pool's custody balance
    CustodyTokenAccount,
}

impl ResourceKind {
    fn tag(self) -> &'static [u8] {
        match self {
            ResourceKind::Pool => b"pool",
            ResourceKind::Position => b"position",
            ResourceKind::ComputationSlot => b"computation_slot",
            ResourceKind::FeePool => b"fee_pool",
            ResourceKind::Oracle => b"oracle",
            ResourceKind::CustodyTokenAccount => b"custody_token_account",
        }
    }
}

/// One seed component of a derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    /// A 32-byte identity (public key or derived address)
    Identity([u8; 32]),
    /// A 64-bit integer (computation offsets, indices)
    U64(u64),
    /// A single byte (side discriminants)
    Byte(u8),
    /// A literal tag (pool names, mint symbols)
    Tag(Vec<u8>),
}

impl Seed {
    fn type_byte(&self) -> u8 {
        match self {
            Seed::Identity(_) => 0,
            Seed::U64(_) => 1,
            Seed::Byte(_) => 2,
            Seed::Tag(_) => 3,
        }
    }

    fn bytes(&self) -> Vec<u8> {
        match self {
            Seed::Identity(id) => id.to_vec(),
            Seed::U64(v) => v.to_le_bytes().to_vec(),
            Seed::Byte(b) => vec![*b],
            Seed::Tag(t) => t.clone(),
        }
    }
}

/// Seed-shape violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// The seed sequence does not match the kind's expected shape
    #[error("invalid seeds for {kind:?}: {reason}")]
    InvalidSeeds {
        /// Resource kind being derived
        kind: ResourceKind,
        /// Which shape rule was violated
        reason: &'static str,
    },
}

fn invalid(kind: ResourceKind, reason: &'static str) -> DerivationError {
    DerivationError::InvalidSeeds { kind, reason }
}

// ============================================================================
// Derivation
// ============================================================================

/// Derive the address of a resource from its kind and seed components.
///
/// Pure function: identical inputs always produce identical addresses.
/// Fails with [`DerivationError::InvalidSeeds`] when the seed sequence
/// violates the kind's shape rules.
pub fn derive(kind: ResourceKind, seeds: &[Seed]) -> Result<Address, DerivationError> {
    check_shape(kind, seeds)?;

    let mut hasher = Sha256::new();
    hasher.update(DERIVATION_DOMAIN);
    hasher.update(kind.tag());
    for seed in seeds {
        hasher.update([seed.type_byte()]);
        let bytes = seed.bytes();
        hasher.update((bytes.len() as u32).to_le_bytes());
        hasher.update(&bytes);
    }
    let digest = hasher.finalize();

    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(Address(out))
}

fn check_shape(kind: ResourceKind, seeds: &[Seed]) -> Result<(), DerivationError> {
    match kind {
        ResourceKind::Pool => match seeds {
            [Seed::Tag(name)] if !name.is_empty() => Ok(()),
            [Seed::Tag(_)] => Err(invalid(kind, "pool name tag must be non-empty")),
            _ => Err(invalid(kind, "expected [Tag(name)]")),
        },
        ResourceKind::Position => match seeds {
            [Seed::Identity(_), Seed::Identity(_), Seed::Identity(_), Seed::Byte(side)] => {
                if *side <= 1 {
                    Ok(())
                } else {
                    Err(invalid(kind, "side byte must be 0 or 1"))
                }
            }
            _ => Err(invalid(
                kind,
                "expected [Identity(owner), Identity(pool), Identity(custody), Byte(side)]",
            )),
        },
        ResourceKind::ComputationSlot => match seeds {
            [Seed::U64(_)] => Ok(()),
            _ => Err(invalid(kind, "expected [U64(computation_offset)]")),
        },
        ResourceKind::FeePool => {
            if seeds.is_empty() {
                Ok(())
            } else {
                Err(invalid(kind, "expected no seeds"))
            }
        }
        ResourceKind::Oracle => match seeds {
            [Seed::Identity(_)] => Ok(()),
            _ => Err(invalid(kind, "expected [Identity(custody)]")),
        },
        ResourceKind::CustodyTokenAccount => match seeds {
            [Seed::Identity(_), Seed::Identity(_)] => Ok(()),
            _ => Err(invalid(kind, "expected [Identity(pool), Identity(mint)]")),
        },
    }
}

// ============================================================================
// Convenience derivations
// ============================================================================

/// Derive a pool address from its name.
pub fn pool_address(name: &str) -> Result<Address, DerivationError> {
    derive(ResourceKind::Pool, &[Seed::Tag(name.as_bytes().to_vec())])
}

/// Derive a position address for (owner, pool, custody, side byte).
pub fn position_address(
    owner: &[u8; 32],
    pool: &[u8; 32],
    custody: &[u8; 32],
    side: u8,
) -> Result<Address, DerivationError> {
    derive(
        ResourceKind::Position,
        &[
            Seed::Identity(*owner),
            Seed::Identity(*pool),
            Seed::Identity(*custody),
            Seed::Byte(side),
        ],
    )
}

/// Derive the slot address for one queued computation.
pub fn computation_slot_address(computation_offset: u64) -> Result<Address, DerivationError> {
    derive(ResourceKind::ComputationSlot, &[Seed::U64(computation_offset)])
}

// ============================================================================
// Unit Tests
// ============================================================================
