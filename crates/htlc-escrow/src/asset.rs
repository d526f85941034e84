//! The fungible-asset capability the escrow core transfers through.
//!
//! §9 is explicit that no specific token-standard detail may leak into
//! the core: every balance movement — maker tokens, destination
//! tokens, safety deposits (native gas treated as just another
//! `TokenId`) — goes through this one trait.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::immutables::{Address, TokenId};

pub trait FungibleAsset {
    fn transfer(&mut self, from: Address, to: Address, token_id: TokenId, amount: u64) -> Result<()>;
    fn balance_of(&self, addr: Address, token_id: TokenId) -> u64;
}

/// Reference/testing implementation of [`FungibleAsset`]: an
/// in-memory ledger keyed by `(address, token)`. Ships unconditionally
/// rather than behind `#[cfg(test)]` so integration tests elsewhere in
/// the workspace (and downstream callers writing their own end-to-end
/// tests) have something concrete to drive the Factory/Escrow/FeeBank
/// flow with — the host chain supplies the real implementation.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    balances: HashMap<(Address, TokenId), u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint/seed a balance for tests and setup — not part of
    /// `FungibleAsset`, since real asset backends don't expose minting.
    pub fn set_balance(&mut self, addr: Address, token_id: TokenId, amount: u64) {
        self.balances.insert((addr, token_id), amount);
    }
}

impl FungibleAsset for Ledger {
    fn transfer(&mut self, from: Address, to: Address, token_id: TokenId, amount: u64) -> Result<()> {
        let from_balance = self.balances.get(&(from, token_id)).copied().unwrap_or(0);
        let new_from_balance = from_balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientDeposit { have: from_balance, need: amount })?;
        let to_balance = self.balances.get(&(to, token_id)).copied().unwrap_or(0);
        let new_to_balance = to_balance.checked_add(amount).ok_or(Error::Overflow("ledger transfer"))?;

        self.balances.insert((from, token_id), new_from_balance);
        self.balances.insert((to, token_id), new_to_balance);
        Ok(())
    }

    fn balance_of(&self, addr: Address, token_id: TokenId) -> u64 {
        self.balances.get(&(addr, token_id)).copied().unwrap_or(0)
    }
}
