//! Configuration set once at factory deployment (§6) and threaded
//! through for the life of the system — constructed once, never
//! re-initialized, never torn down, per §9's "global module state"
//! note.

use serde::{Deserialize, Serialize};

use crate::immutables::{Address, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Domain separator mixed into every escrow address this factory
    /// derives; distinguishes one factory deployment from another.
    pub factory_id: [u8; 32],
    pub src_rescue_delay: u64,
    pub dst_rescue_delay: u64,
    /// Where the shared [`crate::fee_bank::FeeBank`] this factory's
    /// order integration charges into is hosted. Opaque to this crate
    /// — the host wires the actual reference together.
    pub fee_bank_address: Address,
    pub access_token_id: TokenId,
    pub access_token_min_balance: u64,
    /// Address of the limit-order protocol contract whose
    /// pre/post-interaction callbacks this core is wired into.
    pub limit_order_protocol_address: Address,
}
