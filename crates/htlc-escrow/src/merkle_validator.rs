//! Verification and bookkeeping for multiple-fill orders' secret
//! trees: one [`PartialFillRecord`] per order, holding the maker's
//! published root and the last index anyone has successfully proven.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use htlc_merkle::Hash;

/// Per-order commitment plus the strictly monotonic fill cursor.
/// `last_validated_index` has no sentinel field in this representation
/// — `None` stands in for the spec's `-1` ("none validated yet").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFillRecord {
    pub root: Hash,
    pub parts_count: u64,
    pub last_validated_index: Option<u64>,
}

/// Registry of partial-fill records, keyed by order hash.
#[derive(Debug, Default)]
pub struct MerkleValidator {
    records: HashMap<[u8; 32], PartialFillRecord>,
}

impl MerkleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_of(&self, order_hash: [u8; 32]) -> Option<&PartialFillRecord> {
        self.records.get(&order_hash)
    }

    /// Verify `proof` against `root` for leaf `H(index || hashed_secret)`,
    /// require `index` to strictly advance the order's cursor, then
    /// store it. The first call for an order establishes its root and
    /// `parts_count`; later calls must agree with what was established.
    pub fn validate_and_store(
        &mut self,
        order_hash: [u8; 32],
        root: Hash,
        parts_count: u64,
        proof: &[Hash],
        index: u64,
        hashed_secret: [u8; 32],
    ) -> Result<()> {
        if index > parts_count {
            return Err(Error::PartsExceeded { index, parts_count });
        }

        let leaf = htlc_merkle::leaf_hash(index, &hashed_secret);
        if !htlc_merkle::verify(&root, &leaf, index as usize, proof) {
            return Err(Error::InvalidProof);
        }

        let record = self
            .records
            .entry(order_hash)
            .or_insert_with(|| PartialFillRecord { root, parts_count, last_validated_index: None });

        if record.root != root || record.parts_count != parts_count {
            return Err(Error::InvalidProof);
        }

        let last = record.last_validated_index.map(|v| v as i64).unwrap_or(-1);
        if index as i64 <= last {
            return Err(Error::IndexNotMonotonic { index, last });
        }

        record.last_validated_index = Some(index);
        Ok(())
    }

    /// Checks that a fill of `fill_amount`, leaving `remaining_before`
    /// of `making_amount` before it lands, puts the cumulative filled
    /// amount inside the partition that `validated_index` names.
    ///
    /// Partition `k` owns the interval `(k*part_size, (k+1)*part_size]`
    /// — upper-inclusive, so a fill that exactly completes partition
    /// `k` uses index `k`, matching §8 scenario 3 ("first fill of 250
    /// at index 0 succeeds" with `part_size = 250`). The extra tail
    /// leaf (`k = parts_count`) is only the valid choice when
    /// `making_amount` doesn't divide evenly by `parts_count` — when it
    /// does, the last regular partition's upper bound already equals
    /// `making_amount`, and §4.C's "tie-break: the lowest valid k"
    /// picks that regular partition over the tail leaf.
    pub fn is_valid_partial_fill(
        fill_amount: u64,
        remaining_before: u64,
        making_amount: u64,
        parts_count: u64,
        validated_index: u64,
    ) -> Result<()> {
        if parts_count == 0 {
            return Err(Error::InvalidPartialFill);
        }
        if validated_index > parts_count {
            return Err(Error::PartsExceeded { index: validated_index, parts_count });
        }

        let part_size = making_amount / parts_count;
        let filled_before = making_amount
            .checked_sub(remaining_before)
            .ok_or(Error::Overflow("partial fill: filled_before"))?;
        let filled_after = filled_before
            .checked_add(fill_amount)
            .ok_or(Error::Overflow("partial fill: filled_after"))?;

        if validated_index == parts_count {
            let remainder = making_amount % parts_count;
            return if remainder != 0 && filled_after == making_amount {
                Ok(())
            } else {
                Err(Error::InvalidPartialFill)
            };
        }

        let lower = validated_index
            .checked_mul(part_size)
            .ok_or(Error::Overflow("partial fill: lower bound"))?;
        let upper = lower.checked_add(part_size).ok_or(Error::Overflow("partial fill: upper bound"))?;

        if filled_after > lower && filled_after <= upper {
            Ok(())
        } else {
            Err(Error::InvalidPartialFill)
        }
    }
}
