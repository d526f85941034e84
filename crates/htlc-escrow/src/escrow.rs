//! Per-instance escrow state: locked tokens, safety deposit, status,
//! and the seven timelock-gated entry operations that move an escrow
//! from `Active` to a terminal state.
//!
//! §9's redesign instruction for "dispatch on stage" is followed
//! literally: each entry point matches `(stage window, caller role)`
//! and yields one of two outcomes (token recipient, deposit recipient)
//! rather than branching on ad-hoc booleans.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::asset::FungibleAsset;
use crate::error::{Error, Result};
use crate::events::{EscrowCancelled, EscrowWithdrawn, FundsRescued};
use crate::fee_bank::{is_permissioned, AccessTokenConfig, Whitelist};
use crate::immutables::{Address, EscrowImmutables, ImmutablesHash};
use crate::timelock::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Withdrawn,
    Cancelled,
}

/// Which chain this instance secures. Determines which stage windows
/// and which recipient rules its entry operations use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Src,
    Dst,
}

/// One deployed escrow instance. Created once by the Factory, mutated
/// only through the entry operations below; immutables never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    immutables_hash: ImmutablesHash,
    side: Side,
    locked_tokens: u64,
    safety_deposit_balance: u64,
    status: Status,
    /// The account the escrow's own balance lives under in the
    /// [`FungibleAsset`] backend — its deterministic address, not the
    /// maker's or taker's. Every `settle` moves funds out of here.
    holding: Address,
}

impl Escrow {
    pub fn new(
        immutables_hash: ImmutablesHash,
        side: Side,
        holding: Address,
        amount: u64,
        safety_deposit: u64,
    ) -> Self {
        Self {
            immutables_hash,
            side,
            locked_tokens: amount,
            safety_deposit_balance: safety_deposit,
            status: Status::Active,
            holding,
        }
    }

    pub fn immutables_hash(&self) -> ImmutablesHash {
        self.immutables_hash
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn locked_tokens(&self) -> u64 {
        self.locked_tokens
    }

    pub fn safety_deposit_balance(&self) -> u64 {
        self.safety_deposit_balance
    }

    fn assert_active(&self) -> Result<()> {
        if self.status != Status::Active {
            return Err(Error::NotActive);
        }
        Ok(())
    }

    /// Re-derives the escrow identity from the caller-supplied tuple and
    /// checks it against what's stored — the immutables-authentication
    /// rule every entry operation shares (§4.E).
    fn assert_immutables(&self, immutables: &EscrowImmutables) -> Result<()> {
        if immutables.hash() != self.immutables_hash {
            return Err(Error::ImmutablesMismatch);
        }
        Ok(())
    }

    fn assert_secret(immutables: &EscrowImmutables, secret: &[u8; 32]) -> Result<()> {
        let mut hasher = Sha3_256::new();
        hasher.update(secret);
        let digest: [u8; 32] = hasher.finalize().into();
        if digest != immutables.hashlock {
            return Err(Error::BadSecret);
        }
        Ok(())
    }

    fn settle(
        &mut self,
        immutables: &EscrowImmutables,
        asset: &mut impl FungibleAsset,
        token_recipient: Address,
        deposit_recipient: Address,
        next_status: Status,
    ) -> Result<()> {
        asset.transfer(self.holding, token_recipient, immutables.token_id, self.locked_tokens)?;
        self.locked_tokens = 0;

        const NATIVE_GAS: crate::immutables::TokenId = crate::immutables::TokenId([0u8; 20]);
        asset.transfer(self.holding, deposit_recipient, NATIVE_GAS, self.safety_deposit_balance)?;
        self.safety_deposit_balance = 0;

        self.status = next_status;
        Ok(())
    }

    /// `[src_withdrawal, src_cancellation)`, caller must be the taker,
    /// tokens to taker, deposit to whoever calls it.
    pub fn withdraw_src_private(
        &mut self,
        immutables: &EscrowImmutables,
        secret: [u8; 32],
        now: u64,
        caller: Address,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowWithdrawn> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Src {
            return Err(Error::CallerNotTaker);
        }
        if caller != immutables.taker {
            return Err(Error::CallerNotTaker);
        }
        immutables
            .timelocks
            .assert_in_window(now, Stage::SrcWithdrawal, Stage::SrcCancellation)?;
        Self::assert_secret(immutables, &secret)?;
        self.settle(immutables, asset, immutables.taker, caller, Status::Withdrawn)?;
        Ok(EscrowWithdrawn { immutables_hash: self.immutables_hash, secret, recipient: immutables.taker })
    }

    /// `[src_public_withdrawal, src_cancellation)`, any permissioned
    /// caller, tokens still go to the taker but the deposit follows
    /// whoever actually advanced the escrow.
    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_src_public(
        &mut self,
        immutables: &EscrowImmutables,
        secret: [u8; 32],
        now: u64,
        caller: Address,
        whitelist: &Whitelist,
        access_token_cfg: &AccessTokenConfig,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowWithdrawn> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Src {
            return Err(Error::NotActive);
        }
        if !is_permissioned(whitelist, caller, access_token_cfg, asset) {
            return Err(Error::AccessDenied);
        }
        immutables
            .timelocks
            .assert_in_window(now, Stage::SrcPublicWithdrawal, Stage::SrcCancellation)?;
        Self::assert_secret(immutables, &secret)?;
        self.settle(immutables, asset, immutables.taker, caller, Status::Withdrawn)?;
        Ok(EscrowWithdrawn { immutables_hash: self.immutables_hash, secret, recipient: immutables.taker })
    }

    /// `[src_cancellation, src_public_cancellation)`, taker only, tokens
    /// refunded to maker.
    pub fn cancel_src_private(
        &mut self,
        immutables: &EscrowImmutables,
        now: u64,
        caller: Address,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowCancelled> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Src {
            return Err(Error::NotActive);
        }
        if caller != immutables.taker {
            return Err(Error::CallerNotTaker);
        }
        immutables
            .timelocks
            .assert_in_window(now, Stage::SrcCancellation, Stage::SrcPublicCancellation)?;
        self.settle(immutables, asset, immutables.maker, caller, Status::Cancelled)?;
        Ok(EscrowCancelled { immutables_hash: self.immutables_hash, recipient: immutables.maker })
    }

    /// `[src_public_cancellation, ∞)`, any permissioned caller.
    pub fn cancel_src_public(
        &mut self,
        immutables: &EscrowImmutables,
        now: u64,
        caller: Address,
        whitelist: &Whitelist,
        access_token_cfg: &AccessTokenConfig,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowCancelled> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Src {
            return Err(Error::NotActive);
        }
        if !is_permissioned(whitelist, caller, access_token_cfg, asset) {
            return Err(Error::AccessDenied);
        }
        immutables.timelocks.assert_after_stage(now, Stage::SrcPublicCancellation)?;
        self.settle(immutables, asset, immutables.maker, caller, Status::Cancelled)?;
        Ok(EscrowCancelled { immutables_hash: self.immutables_hash, recipient: immutables.maker })
    }

    /// `[dst_withdrawal, dst_cancellation)`, taker only, tokens go to
    /// the maker (destination-side liquidity flows to them).
    pub fn withdraw_dst_private(
        &mut self,
        immutables: &EscrowImmutables,
        secret: [u8; 32],
        now: u64,
        caller: Address,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowWithdrawn> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Dst {
            return Err(Error::NotActive);
        }
        if caller != immutables.taker {
            return Err(Error::CallerNotTaker);
        }
        immutables
            .timelocks
            .assert_in_window(now, Stage::DstWithdrawal, Stage::DstCancellation)?;
        Self::assert_secret(immutables, &secret)?;
        self.settle(immutables, asset, immutables.maker, caller, Status::Withdrawn)?;
        Ok(EscrowWithdrawn { immutables_hash: self.immutables_hash, secret, recipient: immutables.maker })
    }

    /// `[dst_public_withdrawal, dst_cancellation)`, any permissioned
    /// caller; tokens still go to the maker, deposit to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_dst_public(
        &mut self,
        immutables: &EscrowImmutables,
        secret: [u8; 32],
        now: u64,
        caller: Address,
        whitelist: &Whitelist,
        access_token_cfg: &AccessTokenConfig,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowWithdrawn> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Dst {
            return Err(Error::NotActive);
        }
        if !is_permissioned(whitelist, caller, access_token_cfg, asset) {
            return Err(Error::AccessDenied);
        }
        immutables
            .timelocks
            .assert_in_window(now, Stage::DstPublicWithdrawal, Stage::DstCancellation)?;
        Self::assert_secret(immutables, &secret)?;
        self.settle(immutables, asset, immutables.maker, caller, Status::Withdrawn)?;
        Ok(EscrowWithdrawn { immutables_hash: self.immutables_hash, secret, recipient: immutables.maker })
    }

    /// `[dst_cancellation, ∞)`, taker first, then anyone (the spec's
    /// single dst cancellation window has no private/public split —
    /// taker is just who's expected to call it first).
    pub fn cancel_dst(
        &mut self,
        immutables: &EscrowImmutables,
        now: u64,
        caller: Address,
        asset: &mut impl FungibleAsset,
    ) -> Result<EscrowCancelled> {
        self.assert_active()?;
        self.assert_immutables(immutables)?;
        if self.side != Side::Dst {
            return Err(Error::NotActive);
        }
        immutables.timelocks.assert_after_stage(now, Stage::DstCancellation)?;
        self.settle(immutables, asset, immutables.taker, caller, Status::Cancelled)?;
        Ok(EscrowCancelled { immutables_hash: self.immutables_hash, recipient: immutables.taker })
    }

    /// The only action permitted after a terminal transition: sweep any
    /// residual balance (stuck dust, wrong-asset transfers) to the
    /// taker, once `deployed_at + rescue_delay` has passed.
    #[allow(clippy::too_many_arguments)]
    pub fn rescue_funds(
        &mut self,
        immutables: &EscrowImmutables,
        rescue_start: u64,
        now: u64,
        caller: Address,
        token_id: crate::immutables::TokenId,
        amount: u64,
        asset: &mut impl FungibleAsset,
    ) -> Result<FundsRescued> {
        self.assert_immutables(immutables)?;
        if caller != immutables.taker {
            return Err(Error::CallerNotTaker);
        }
        if now < rescue_start {
            return Err(Error::TimeWindowNotOpen);
        }
        asset.transfer(self.holding, caller, token_id, amount)?;
        Ok(FundsRescued { immutables_hash: self.immutables_hash, amount, token_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Ledger;
    use crate::fee_bank::{AccessTokenConfig, Whitelist};
    use crate::immutables::{Address, TokenId};
    use crate::timelock::TimelockConfig;

    fn sample_immutables(maker: Address, taker: Address, amount: u64, deployed_at: u64) -> EscrowImmutables {
        EscrowImmutables {
            order_hash: [1u8; 32],
            hashlock: {
                let mut hasher = Sha3_256::new();
                hasher.update([0x01u8; 32]);
                hasher.finalize().into()
            },
            maker,
            taker,
            token_id: TokenId([9u8; 20]),
            amount,
            safety_deposit: 50,
            timelocks: TimelockConfig::new([100, 200, 300, 400, 50, 150, 250]).unwrap().stamp(deployed_at),
        }
    }

    const HOLDING: Address = Address([0x42u8; 20]);

    fn funded_ledger(immutables: &EscrowImmutables) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.set_balance(HOLDING, immutables.token_id, immutables.amount);
        ledger.set_balance(HOLDING, TokenId([0u8; 20]), immutables.safety_deposit);
        ledger
    }

    fn new_escrow(immutables: &EscrowImmutables, side: Side) -> Escrow {
        Escrow::new(immutables.hash(), side, HOLDING, immutables.amount, immutables.safety_deposit)
    }

    #[test]
    fn withdraw_src_private_in_window_pays_taker_and_caller() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        let event = escrow
            .withdraw_src_private(&immutables, [0x01u8; 32], 1_150, taker, &mut ledger)
            .unwrap();

        assert_eq!(escrow.status(), Status::Withdrawn);
        assert_eq!(ledger.balance_of(taker, immutables.token_id), 1_000);
        assert_eq!(ledger.balance_of(taker, TokenId([0u8; 20])), 50);
        assert_eq!(event.recipient, taker);
        assert_eq!(event.secret, [0x01u8; 32]);
    }

    #[test]
    fn withdraw_src_private_before_window_fails() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        let err = escrow
            .withdraw_src_private(&immutables, [0x01u8; 32], 1_050, taker, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, Error::TimeWindowNotOpen));
    }

    #[test]
    fn withdraw_src_private_by_non_taker_fails() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let other = Address([3u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        let err = escrow
            .withdraw_src_private(&immutables, [0x01u8; 32], 1_150, other, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, Error::CallerNotTaker));
    }

    #[test]
    fn bad_secret_is_rejected_and_escrow_stays_active() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        let err = escrow
            .withdraw_src_private(&immutables, [0xFFu8; 32], 1_150, taker, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, Error::BadSecret));
        assert_eq!(escrow.status(), Status::Active);
    }

    #[test]
    fn cancel_src_private_refunds_maker() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        let event = escrow.cancel_src_private(&immutables, 1_300, taker, &mut ledger).unwrap();

        assert_eq!(escrow.status(), Status::Cancelled);
        assert_eq!(ledger.balance_of(maker, immutables.token_id), 1_000);
        assert_eq!(event.recipient, maker);
    }

    #[test]
    fn replaying_a_terminal_transition_fails_not_active() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        escrow.cancel_src_private(&immutables, 1_300, taker, &mut ledger).unwrap();
        let err = escrow.cancel_src_private(&immutables, 1_300, taker, &mut ledger).unwrap_err();
        assert!(matches!(err, Error::NotActive));
    }

    #[test]
    fn tampered_immutables_are_rejected() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut wrong = immutables;
        wrong.amount = 999;
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Src);

        let err = escrow
            .withdraw_src_private(&wrong, [0x01u8; 32], 1_150, taker, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, Error::ImmutablesMismatch));
    }

    #[test]
    fn withdraw_dst_private_pays_maker() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 997, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Dst);

        escrow
            .withdraw_dst_private(&immutables, [0x01u8; 32], 1_050, taker, &mut ledger)
            .unwrap();

        assert_eq!(ledger.balance_of(maker, immutables.token_id), 997);
        assert_eq!(ledger.balance_of(taker, TokenId([0u8; 20])), 50);
    }

    #[test]
    fn public_withdrawal_by_permissioned_third_party_still_pays_maker_but_deposit_to_caller() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let third_party = Address([3u8; 20]);
        let immutables = sample_immutables(maker, taker, 997, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Dst);
        let mut whitelist = Whitelist::new();
        whitelist.insert(third_party);
        let access_cfg = AccessTokenConfig { token_id: TokenId([0xAAu8; 20]), min_balance: 1_000 };

        escrow
            .withdraw_dst_public(&immutables, [0x01u8; 32], 1_160, third_party, &whitelist, &access_cfg, &mut ledger)
            .unwrap();

        assert_eq!(ledger.balance_of(maker, immutables.token_id), 997);
        assert_eq!(ledger.balance_of(third_party, TokenId([0u8; 20])), 50);
        assert_eq!(ledger.balance_of(taker, TokenId([0u8; 20])), 0);
    }

    #[test]
    fn public_withdrawal_by_unpermissioned_caller_is_denied() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let third_party = Address([3u8; 20]);
        let immutables = sample_immutables(maker, taker, 997, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let mut escrow = new_escrow(&immutables, Side::Dst);
        let whitelist = Whitelist::new();
        let access_cfg = AccessTokenConfig { token_id: TokenId([0xAAu8; 20]), min_balance: 1_000 };

        let err = escrow
            .withdraw_dst_public(&immutables, [0x01u8; 32], 1_160, third_party, &whitelist, &access_cfg, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, Error::AccessDenied));
        assert_eq!(escrow.status(), Status::Active);
    }

    #[test]
    fn public_cancellation_by_caller_holding_enough_access_token_succeeds() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let third_party = Address([3u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = funded_ledger(&immutables);
        let access_cfg = AccessTokenConfig { token_id: TokenId([0xAAu8; 20]), min_balance: 1_000 };
        ledger.set_balance(third_party, access_cfg.token_id, 1_000);
        let mut escrow = new_escrow(&immutables, Side::Src);
        let whitelist = Whitelist::new();

        let event = escrow
            .cancel_src_public(&immutables, 1_650, third_party, &whitelist, &access_cfg, &mut ledger)
            .unwrap();

        assert_eq!(event.recipient, maker);
        assert_eq!(ledger.balance_of(maker, immutables.token_id), 1_000);
        assert_eq!(ledger.balance_of(third_party, TokenId([0u8; 20])), 50);
    }

    #[test]
    fn rescue_path_requires_taker_and_elapsed_delay() {
        let maker = Address([1u8; 20]);
        let taker = Address([2u8; 20]);
        let immutables = sample_immutables(maker, taker, 1_000, 1_000);
        let mut ledger = Ledger::new();
        ledger.set_balance(HOLDING, TokenId([77u8; 20]), 5);
        let mut escrow = Escrow::new(immutables.hash(), Side::Src, HOLDING, 1_000, 50);
        escrow.status = Status::Withdrawn;
        escrow.locked_tokens = 0;
        escrow.safety_deposit_balance = 0;

        let err = escrow
            .rescue_funds(&immutables, 2_000, 1_500, taker, TokenId([77u8; 20]), 5, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, Error::TimeWindowNotOpen));

        escrow
            .rescue_funds(&immutables, 2_000, 2_500, taker, TokenId([77u8; 20]), 5, &mut ledger)
            .unwrap();
        assert_eq!(ledger.balance_of(taker, TokenId([77u8; 20])), 5);
    }
}
