//! Canonical event payloads emitted by the factory and escrow entry
//! operations (§6). These are plain data — emission (log topics, host
//! event bus) is the caller's responsibility, not this crate's.

use serde::{Deserialize, Serialize};

use crate::immutables::{Address, EscrowImmutables, ImmutablesHash, TokenId};

/// What the off-chain observer needs to know the destination escrow
/// must commit to, carried inside [`SrcEscrowCreated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DstImmutablesComplement {
    pub maker: Address,
    pub amount: u64,
    pub token_id: TokenId,
    pub safety_deposit: u64,
    pub chain_id: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcEscrowCreated {
    pub immutables: EscrowImmutables,
    pub dst_complement: DstImmutablesComplement,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DstEscrowCreated {
    pub immutables_hash: ImmutablesHash,
    pub taker: Address,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowWithdrawn {
    pub immutables_hash: ImmutablesHash,
    pub secret: [u8; 32],
    pub recipient: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCancelled {
    pub immutables_hash: ImmutablesHash,
    pub recipient: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsRescued {
    pub immutables_hash: ImmutablesHash,
    pub amount: u64,
    pub token_id: TokenId,
}
