//! HTLC escrow lifecycle engine for a cross-chain atomic swap protocol.
//!
//! The on-chain core: deterministic escrow address derivation,
//! hashlock+timelock state machine, partial-fill accounting via
//! Merkle-proven secret trees, fee-bank-gated resolver admission, and
//! safety-deposit economics. Off-chain order relaying, secret custody,
//! and the host limit-order protocol itself are out of scope — this
//! crate only implements the two callbacks the host invokes.

pub mod asset;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;
pub mod factory;
pub mod fee_bank;
pub mod immutables;
pub mod merkle_validator;
pub mod order;
pub mod timelock;

pub use asset::{FungibleAsset, Ledger};
pub use config::FactoryConfig;
pub use error::{Error, Result};
pub use escrow::{Escrow, Side, Status};
pub use events::{DstEscrowCreated, DstImmutablesComplement, EscrowCancelled, EscrowWithdrawn, FundsRescued, SrcEscrowCreated};
pub use factory::{Factory, NATIVE_GAS, SAFETY_MARGIN_SECONDS};
pub use fee_bank::{AccessTokenConfig, FeeBank, FeeConfig, Whitelist};
pub use immutables::{Address, ChainRole, EscrowAddress, EscrowImmutables, ImmutablesHash, TokenId};
pub use merkle_validator::{MerkleValidator, PartialFillRecord};
pub use order::{AuctionConfig, AuctionPoint, OrderIntegration, OrderIntegrationConfig};
pub use timelock::{Stage, TimelockConfig, Timelocks};
