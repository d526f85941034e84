//! Glue consumed by the host limit-order protocol: the two callbacks
//! it invokes around a fill, `pre_interaction` (pricing) and
//! `post_interaction` (fee charge + escrow creation).

pub mod auction;
pub mod codec;

use crate::asset::FungibleAsset;
use crate::error::Result;
use crate::events::SrcEscrowCreated;
use crate::factory::Factory;
use crate::fee_bank::{AccessTokenConfig, FeeBank, FeeConfig, Whitelist};
use crate::immutables::{Address, EscrowImmutables};
use crate::timelock::TimelockConfig;

pub use auction::{AuctionConfig, AuctionPoint};
pub use codec::{decode_src_escrow_args, CodecError, SrcEscrowArgs};

/// Unpacks the 32-byte `timelocks_raw` field into the seven relative
/// offsets `TimelockConfig` expects: big-endian `u32`s packed into the
/// first 28 bytes, with 4 bytes of trailing padding.
fn decode_timelock_offsets(raw: [u8; 32]) -> [u32; 7] {
    let mut offsets = [0u32; 7];
    for (i, offset) in offsets.iter_mut().enumerate() {
        let start = i * 4;
        *offset = u32::from_be_bytes(raw[start..start + 4].try_into().unwrap());
    }
    offsets
}

/// Fee/access configuration the order-integration layer was deployed
/// with; the long-lived counterpart to [`crate::config::FactoryConfig`].
#[derive(Debug, Clone, Copy)]
pub struct OrderIntegrationConfig {
    pub access_token_cfg: AccessTokenConfig,
    pub fee_cfg: FeeConfig,
}

pub struct OrderIntegration {
    config: OrderIntegrationConfig,
}

impl OrderIntegration {
    pub fn new(config: OrderIntegrationConfig) -> Self {
        Self { config }
    }

    /// Computes the current effective taking amount from the signed
    /// Dutch-auction curve. Pure — does not touch the fee bank or
    /// factory, matching LOP's calling convention of pricing before
    /// any state mutation.
    pub fn pre_interaction(&self, auction: &AuctionConfig, now: u64) -> u64 {
        auction.effective_taking_amount(now)
    }

    /// Decodes `extraData`, charges the resolver's fill fee, and
    /// triggers the factory. Reverts the whole transaction (returns
    /// `Err` without mutating factory/fee-bank state) on any failure —
    /// §5's "partial failure" guarantee.
    #[allow(clippy::too_many_arguments)]
    pub fn post_interaction(
        &self,
        factory: &mut Factory,
        fee_bank: &mut FeeBank,
        whitelist: &Whitelist,
        taker: Address,
        extra_data: &[u8],
        deployed_at: u64,
        asset: &impl FungibleAsset,
    ) -> Result<(SrcEscrowCreated, SrcEscrowArgs)> {
        let args = decode_src_escrow_args(extra_data)?;

        fee_bank.validate_access(whitelist, taker, &self.config.access_token_cfg, &self.config.fee_cfg, asset)?;

        let offsets = decode_timelock_offsets(args.timelocks_raw);
        let timelocks = TimelockConfig::new(offsets)?.stamp(deployed_at);

        let immutables = EscrowImmutables {
            order_hash: args.order_hash,
            hashlock: args.hashlock,
            maker: args.maker,
            taker,
            token_id: args.token_id,
            amount: args.amount,
            safety_deposit: args.safety_deposit,
            timelocks,
        };

        let created = factory.create_src_escrow(
            immutables,
            args.dst_chain_id,
            args.dst_token_id,
            args.dst_amount,
            args.dst_safety_deposit,
            asset,
        )?;

        Ok((created, args))
    }
}
