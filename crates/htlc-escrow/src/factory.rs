//! Deploys source/destination escrows at their deterministic addresses
//! and validates the invariants that span the pair.
//!
//! The registry is the one piece of explicitly-constructed, long-lived
//! state this module owns — no hidden singleton, per §9's instruction
//! on "global module state". A `Factory` is built once at system start
//! and threaded through by its owner for the rest of its life.

use std::collections::HashMap;

use crate::asset::FungibleAsset;
use crate::config::FactoryConfig;
use crate::error::{Error, Result};
use crate::escrow::{Escrow, Side};
use crate::events::{DstEscrowCreated, DstImmutablesComplement, SrcEscrowCreated};
use crate::immutables::{ChainRole, EscrowAddress, EscrowImmutables, TokenId};
use crate::timelock::Stage;

/// One window's worth of finality margin added to the cross-chain
/// cancellation check in [`Factory::create_dst_escrow`]. Not named by
/// the source; chosen here as a conservative fixed constant rather
/// than a per-chain parameter, since the factory has no notion of
/// "the slower chain's finality time" to plug in dynamically.
pub const SAFETY_MARGIN_SECONDS: u64 = 600;

/// Native-gas token id used for safety-deposit transfers, matching
/// [`crate::escrow`]'s convention of treating gas as just another
/// [`TokenId`].
pub const NATIVE_GAS: TokenId = TokenId([0u8; 20]);

#[derive(Debug)]
pub struct Factory {
    config: FactoryConfig,
    escrows: HashMap<EscrowAddress, Escrow>,
}

impl Factory {
    pub fn new(config: FactoryConfig) -> Self {
        Self { config, escrows: HashMap::new() }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn escrow_at(&self, address: EscrowAddress) -> Option<&Escrow> {
        self.escrows.get(&address)
    }

    pub fn escrow_at_mut(&mut self, address: EscrowAddress) -> Option<&mut Escrow> {
        self.escrows.get_mut(&address)
    }

    fn address_for(&self, immutables: &EscrowImmutables, role: ChainRole) -> EscrowAddress {
        EscrowAddress::derive(self.config.factory_id, immutables.hash(), role)
    }

    pub fn rescue_start(&self, side: Side, immutables: &EscrowImmutables) -> Result<u64> {
        let delay = match side {
            Side::Src => self.config.src_rescue_delay,
            Side::Dst => self.config.dst_rescue_delay,
        };
        immutables
            .timelocks
            .deployed_at()
            .checked_add(delay)
            .ok_or(Error::Overflow("factory rescue_start"))
    }

    /// Called only by Order Integration's post-interaction callback.
    /// `immutables.timelocks` must already be stamped with
    /// `deployed_at = now` by the caller (the order integration layer
    /// owns the clock read). Binds the maker tokens LOP already moved
    /// to the deterministic address, and emits the cross-chain event.
    pub fn create_src_escrow(
        &mut self,
        immutables: EscrowImmutables,
        dst_chain_id: u16,
        dst_token_id: TokenId,
        dst_amount: u64,
        dst_safety_deposit: u64,
        asset: &impl FungibleAsset,
    ) -> Result<SrcEscrowCreated> {
        let address = self.address_for(&immutables, ChainRole::Src);

        if self.escrows.contains_key(&address) {
            return Err(Error::AlreadyInitialized);
        }

        let escrowed = asset.balance_of(address_as_party(address), immutables.token_id);
        if escrowed < immutables.amount {
            return Err(Error::AddressMismatch);
        }

        let escrow = Escrow::new(
            immutables.hash(),
            Side::Src,
            address_as_party(address),
            immutables.amount,
            immutables.safety_deposit,
        );
        self.escrows.insert(address, escrow);

        let dst_complement = DstImmutablesComplement {
            maker: immutables.maker,
            amount: dst_amount,
            token_id: dst_token_id,
            safety_deposit: dst_safety_deposit,
            chain_id: dst_chain_id,
        };

        Ok(SrcEscrowCreated { immutables, dst_complement, timestamp: immutables.timelocks.deployed_at() })
    }

    /// Called directly by a resolver on the destination chain. Pulls
    /// the destination tokens and safety deposit from the caller,
    /// enforces the cross-chain timing invariant, then instantiates
    /// the escrow.
    #[allow(clippy::too_many_arguments)]
    pub fn create_dst_escrow(
        &mut self,
        immutables: EscrowImmutables,
        caller: crate::immutables::Address,
        src_cancellation_timestamp: u64,
        asset: &mut impl FungibleAsset,
    ) -> Result<DstEscrowCreated> {
        let address = self.address_for(&immutables, ChainRole::Dst);

        if self.escrows.contains_key(&address) {
            return Err(Error::AlreadyInitialized);
        }

        let dst_cancellation_at = immutables.timelocks.stage_start(Stage::DstCancellation)?;
        let latest_allowed = src_cancellation_timestamp
            .checked_sub(SAFETY_MARGIN_SECONDS)
            .ok_or(Error::Overflow("factory create_dst_escrow: safety margin"))?;
        if dst_cancellation_at > latest_allowed {
            return Err(Error::DstTooLate);
        }

        asset.transfer(caller, address_as_party(address), immutables.token_id, immutables.amount)?;
        asset.transfer(caller, address_as_party(address), NATIVE_GAS, immutables.safety_deposit)?;

        let escrow = Escrow::new(
            immutables.hash(),
            Side::Dst,
            address_as_party(address),
            immutables.amount,
            immutables.safety_deposit,
        );
        self.escrows.insert(address, escrow);

        Ok(DstEscrowCreated {
            immutables_hash: immutables.hash(),
            taker: caller,
            timestamp: immutables.timelocks.deployed_at(),
        })
    }
}

/// Escrow addresses and token-holder addresses share the same 32-byte
/// namespace as far as the fungible-asset interface is concerned — the
/// escrow's own deterministic address *is* its holding account.
fn address_as_party(address: EscrowAddress) -> crate::immutables::Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&address.0[..20]);
    crate::immutables::Address(bytes)
}
