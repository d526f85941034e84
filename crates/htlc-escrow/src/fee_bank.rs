//! Credit accounting for resolvers and the access-token gate that
//! decides who may act during a "public" window.
//!
//! §4.D's intent: public-withdrawal/public-cancellation phases stay
//! open to *any* permissioned party, not just the original taker, so
//! liveness survives a taker that disappears — but "permissioned"
//! still means something, so griefing isn't free either.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::asset::FungibleAsset;
use crate::error::{Error, Result};
use crate::immutables::{Address, TokenId};

/// Names the one fungible-asset type whose balance can substitute for
/// whitelist membership, and the threshold that counts as "holds it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenConfig {
    pub token_id: TokenId,
    pub min_balance: u64,
}

/// The per-fill fee `validate_access` charges on a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub per_fill_fee: u64,
}

/// Resolvers pre-registered by the off-chain relayer (out of scope) as
/// always permissioned, independent of their access-token balance.
#[derive(Debug, Default, Clone)]
pub struct Whitelist(BTreeSet<Address>);

impl Whitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resolver: Address) {
        self.0.insert(resolver);
    }

    pub fn contains(&self, resolver: Address) -> bool {
        self.0.contains(&resolver)
    }
}

/// Whether `who` counts as permissioned: whitelisted, or holding
/// enough of the configured access-token asset. Pure — no fee charge,
/// so escrow entry operations can gate a caller without touching
/// credit accounting (only the initial fill, through
/// [`FeeBank::validate_access`], charges a fee).
pub fn is_permissioned(
    whitelist: &Whitelist,
    who: Address,
    access_token_cfg: &AccessTokenConfig,
    asset: &impl FungibleAsset,
) -> bool {
    whitelist.contains(who) || asset.balance_of(who, access_token_cfg.token_id) >= access_token_cfg.min_balance
}

/// Per-resolver credit balance, mutated only through this module's own
/// routines — the one piece of state every escrow shares, per §5.
#[derive(Debug, Default, Clone)]
pub struct FeeBank {
    credits: HashMap<Address, u64>,
}

impl FeeBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit_of(&self, resolver: Address) -> u64 {
        self.credits.get(&resolver).copied().unwrap_or(0)
    }

    pub fn deposit(&mut self, resolver: Address, amount: u64) -> Result<()> {
        let balance = self.credit_of(resolver);
        let updated = balance.checked_add(amount).ok_or(Error::Overflow("fee bank deposit"))?;
        self.credits.insert(resolver, updated);
        Ok(())
    }

    pub fn withdraw(&mut self, resolver: Address, amount: u64) -> Result<()> {
        self.charge(resolver, amount)
    }

    /// Atomic debit, used both by plain `withdraw` and by
    /// `validate_access`'s fill-fee charge.
    pub fn charge(&mut self, resolver: Address, amount: u64) -> Result<()> {
        let balance = self.credit_of(resolver);
        let updated = balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientCredit { have: balance, need: amount })?;
        self.credits.insert(resolver, updated);
        Ok(())
    }

    /// Succeeds iff `taker` is whitelisted or holds enough of the
    /// access-token asset; on success, charges `fee_cfg.per_fill_fee`.
    pub fn validate_access(
        &mut self,
        whitelist: &Whitelist,
        taker: Address,
        access_token_cfg: &AccessTokenConfig,
        fee_cfg: &FeeConfig,
        asset: &impl FungibleAsset,
    ) -> Result<()> {
        if !is_permissioned(whitelist, taker, access_token_cfg, asset) {
            return Err(Error::AccessDenied);
        }
        self.charge(taker, fee_cfg.per_fill_fee)
    }
}
