//! Packed stage offsets + deployment timestamp, and the stage-boundary
//! predicates every escrow entry operation gates on.
//!
//! A [`TimelockConfig`] is what the maker signs into an order: seven
//! relative offsets, no absolute timestamp yet. The factory stamps it
//! with `deployed_at` exactly once, at escrow creation, producing the
//! [`Timelocks`] that becomes part of the escrow's immutable identity.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the seven windows an escrow operation can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SrcWithdrawal,
    SrcPublicWithdrawal,
    SrcCancellation,
    SrcPublicCancellation,
    DstWithdrawal,
    DstPublicWithdrawal,
    DstCancellation,
}

impl Stage {
    const COUNT: usize = 7;

    /// All seven stages in packed-word order.
    pub const ALL: [Stage; 7] = [
        Stage::SrcWithdrawal,
        Stage::SrcPublicWithdrawal,
        Stage::SrcCancellation,
        Stage::SrcPublicCancellation,
        Stage::DstWithdrawal,
        Stage::DstPublicWithdrawal,
        Stage::DstCancellation,
    ];

    /// Fixed position of this stage's offset inside the packed word.
    fn index(self) -> usize {
        match self {
            Stage::SrcWithdrawal => 0,
            Stage::SrcPublicWithdrawal => 1,
            Stage::SrcCancellation => 2,
            Stage::SrcPublicCancellation => 3,
            Stage::DstWithdrawal => 4,
            Stage::DstPublicWithdrawal => 5,
            Stage::DstCancellation => 6,
        }
    }
}

/// Source-chain stages must be non-decreasing among themselves, and
/// likewise for destination-chain stages — the two chains run
/// independent schedules (see [`super::factory`]'s cross-chain check).
const SRC_ORDER: [Stage; 4] = [
    Stage::SrcWithdrawal,
    Stage::SrcPublicWithdrawal,
    Stage::SrcCancellation,
    Stage::SrcPublicCancellation,
];
const DST_ORDER: [Stage; 3] = [Stage::DstWithdrawal, Stage::DstPublicWithdrawal, Stage::DstCancellation];

/// The unstamped offsets a maker signs into an order, before any
/// escrow exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockConfig {
    offsets: [u32; Stage::COUNT],
}

impl TimelockConfig {
    /// Validates monotonicity within each chain's stage order.
    pub fn new(offsets: [u32; Stage::COUNT]) -> Result<Self> {
        let config = Self { offsets };
        for window in SRC_ORDER.windows(2) {
            if config.offset(window[0]) > config.offset(window[1]) {
                return Err(Error::Overflow("timelock offsets must be non-decreasing (src)"));
            }
        }
        for window in DST_ORDER.windows(2) {
            if config.offset(window[0]) > config.offset(window[1]) {
                return Err(Error::Overflow("timelock offsets must be non-decreasing (dst)"));
            }
        }
        Ok(config)
    }

    pub fn offset(&self, stage: Stage) -> u32 {
        self.offsets[stage.index()]
    }

    /// Set `deployed_at` once, at escrow creation, producing the
    /// escrow's final [`Timelocks`].
    pub fn stamp(self, deployed_at: u64) -> Timelocks {
        Timelocks {
            deployed_at,
            offsets: self.offsets,
        }
    }
}

/// The frozen timelock schedule of a deployed escrow: `deployed_at`
/// plus the same seven offsets, now load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timelocks {
    deployed_at: u64,
    offsets: [u32; Stage::COUNT],
}

impl Timelocks {
    pub fn deployed_at(&self) -> u64 {
        self.deployed_at
    }

    pub fn offset(&self, stage: Stage) -> u32 {
        self.offsets[stage.index()]
    }

    /// Absolute unix timestamp at which `stage` opens.
    pub fn stage_start(&self, stage: Stage) -> Result<u64> {
        self.deployed_at
            .checked_add(self.offset(stage) as u64)
            .ok_or(Error::Overflow("timelock stage_start"))
    }

    /// Succeeds iff `now` is in `[start(open_stage), start(close_stage))`.
    pub fn assert_in_window(&self, now: u64, open_stage: Stage, close_stage: Stage) -> Result<()> {
        let open = self.stage_start(open_stage)?;
        let close = self.stage_start(close_stage)?;
        if now < open {
            return Err(Error::TimeWindowNotOpen);
        }
        if now >= close {
            return Err(Error::TimeWindowClosed);
        }
        Ok(())
    }

    /// Succeeds iff `now >= start(stage)`, i.e. an unbounded `[stage, ∞)`
    /// window such as public cancellation.
    pub fn assert_after_stage(&self, now: u64, stage: Stage) -> Result<()> {
        if now < self.stage_start(stage)? {
            return Err(Error::TimeWindowNotOpen);
        }
        Ok(())
    }
}
