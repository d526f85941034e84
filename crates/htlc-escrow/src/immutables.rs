//! The frozen parameter tuple identifying an escrow, its canonical
//! hash (the escrow identity), and deterministic escrow-address
//! derivation.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::timelock::Timelocks;

/// Opaque counterparty/recipient identifier. Fixed at 20 bytes to match
/// the `extraData` wire layout (§G); the core never interprets the
/// bytes beyond equality and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Opaque fungible-asset identifier — never a specific token-standard
/// type, per §9's "fungible-asset interface" instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub [u8; 20]);

impl From<[u8; 20]> for TokenId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

pub type ImmutablesHash = [u8; 32];

/// The parameter tuple that identifies one escrow. Immutable after
/// creation; every entry operation re-supplies it and the escrow
/// re-verifies `hash(passed) == stored_immutables_hash` (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowImmutables {
    pub order_hash: [u8; 32],
    pub hashlock: [u8; 32],
    pub maker: Address,
    pub taker: Address,
    pub token_id: TokenId,
    pub amount: u64,
    pub safety_deposit: u64,
    pub timelocks: Timelocks,
}

impl EscrowImmutables {
    /// Canonical, fixed-field-order byte encoding, hashed with
    /// SHA3-256. This hash is the escrow identity.
    pub fn hash(&self) -> ImmutablesHash {
        let mut hasher = Sha3_256::new();
        hasher.update(self.order_hash);
        hasher.update(self.hashlock);
        hasher.update(self.maker.0);
        hasher.update(self.taker.0);
        hasher.update(self.token_id.0);
        hasher.update(self.amount.to_be_bytes());
        hasher.update(self.safety_deposit.to_be_bytes());
        hasher.update(self.timelocks.deployed_at().to_be_bytes());
        for stage in crate::timelock::Stage::ALL {
            hasher.update(self.timelocks.offset(stage).to_be_bytes());
        }
        hasher.finalize().into()
    }
}

/// Which chain an escrow instance lives on — the domain separator that
/// keeps a source and destination escrow for the same order from ever
/// deriving the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainRole {
    Src,
    Dst,
}

/// A deterministically derived escrow location. Pure function of
/// `(factory_id, immutables_hash, role)` so a resolver can precompute
/// it and pre-fund the safety deposit before the escrow exists (§4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EscrowAddress(pub [u8; 32]);

impl EscrowAddress {
    pub fn derive(factory_id: [u8; 32], immutables_hash: ImmutablesHash, role: ChainRole) -> Self {
        let role_tag: u8 = match role {
            ChainRole::Src => 0,
            ChainRole::Dst => 1,
        };
        let mut hasher = Sha3_256::new();
        hasher.update(factory_id);
        hasher.update([role_tag]);
        hasher.update(immutables_hash);
        Self(hasher.finalize().into())
    }
}
