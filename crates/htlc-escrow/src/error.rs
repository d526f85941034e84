//! error types for the escrow core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // === authentication ===
    #[error("immutables do not hash to the stored identity")]
    ImmutablesMismatch,

    #[error("caller is not a permissioned resolver")]
    AccessDenied,

    #[error("caller is not the taker recorded in the immutables")]
    CallerNotTaker,

    // === state ===
    #[error("escrow is not active")]
    NotActive,

    #[error("escrow already initialized at this address")]
    AlreadyInitialized,

    #[error("maker tokens are not present at the deterministic escrow address")]
    AddressMismatch,

    // === temporal ===
    #[error("time window is not open yet")]
    TimeWindowNotOpen,

    #[error("time window has already closed")]
    TimeWindowClosed,

    #[error("destination escrow cancellation would close too late relative to source")]
    DstTooLate,

    // === cryptographic ===
    #[error("secret does not hash to the escrow's hashlock")]
    BadSecret,

    #[error("merkle proof failed to verify against the stored root")]
    InvalidProof,

    // === accounting ===
    #[error("insufficient fee bank credit: have {have}, need {need}")]
    InsufficientCredit { have: u64, need: u64 },

    #[error("destination deposit insufficient: have {have}, need {need}")]
    InsufficientDeposit { have: u64, need: u64 },

    #[error("partial-fill index {index} is not greater than last validated index {last}")]
    IndexNotMonotonic { index: u64, last: i64 },

    #[error("partial-fill index {index} exceeds parts_count {parts_count}")]
    PartsExceeded { index: u64, parts_count: u64 },

    #[error("partial fill does not cross the boundary of any valid partition")]
    InvalidPartialFill,

    #[error("extraData failed to decode: {0}")]
    InvalidExtraData(#[from] crate::order::codec::CodecError),

    // === arithmetic ===
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
