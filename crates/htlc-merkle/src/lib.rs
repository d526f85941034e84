//! Domain-separated SHA3-256 Merkle tree for partial-fill secret trees.
//!
//! A maker committing to a multiple-fill order publishes the root of a
//! tree over `N + 1` leaves `leaf_i = H(0x00 || i || H(s_i))`, one per
//! partial-fill secret plus one extra leaf for the final (dust-covering)
//! fill. Unlike a proof-system Merkle tree the leaf count here is not
//! required to be a power of two (`N` comes from the maker's chosen
//! `parts_count` and can be anything `> 0`): odd layers carry their last
//! node up unchanged rather than rejecting the tree outright.

use sha3::{Digest, Sha3_256};

pub type Hash = [u8; 32];

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Hash of a partial-fill leaf: `H(0x00 || index_be || hashed_secret)`.
///
/// `hashed_secret` is `H(secret)`, never the secret itself — the tree
/// commits to hashlocks, the same way `EscrowImmutables.hashlock` does.
pub fn leaf_hash(index: u64, hashed_secret: &Hash) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(index.to_be_bytes());
    hasher.update(hashed_secret);
    hasher.finalize().into()
}

/// Hash of an internal node: `H(0x01 || left || right)`.
pub fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// A fully materialized tree, kept only long enough to produce a root
/// and proofs from it — the maker builds this off-chain and publishes
/// just the root; the core never stores more than `root`.
pub struct MerkleTree {
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over already-hashed leaves. Odd-sized layers
    /// duplicate their last node when pairing, so any non-empty leaf
    /// count is accepted.
    pub fn build(leaves: &[Hash]) -> Self {
        assert!(!leaves.is_empty(), "merkle tree needs at least one leaf");

        let mut layers = vec![leaves.to_vec()];
        while layers.last().unwrap().len() > 1 {
            let current = layers.last().unwrap();
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            let mut i = 0;
            while i < current.len() {
                let left = current[i];
                let right = if i + 1 < current.len() {
                    current[i + 1]
                } else {
                    current[i]
                };
                next.push(node_hash(&left, &right));
                i += 2;
            }
            layers.push(next);
        }
        Self { layers }
    }

    pub fn root(&self) -> Hash {
        self.layers.last().unwrap()[0]
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Sibling hashes from leaf to root for `index`.
    pub fn proof(&self, index: usize) -> Vec<Hash> {
        let num_leaves = self.layers[0].len();
        assert!(index < num_leaves, "leaf index {index} out of range ({num_leaves} leaves)");

        let mut proof = Vec::with_capacity(self.depth());
        let mut current_index = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_index = if current_index.is_multiple_of(2) {
                current_index + 1
            } else {
                current_index - 1
            };
            let sibling = layer.get(sibling_index).copied().unwrap_or(layer[current_index]);
            proof.push(sibling);
            current_index /= 2;
        }
        proof
    }
}

/// Verify that `leaf` at `index` is included under `root`, given a
/// sibling path produced by [`MerkleTree::proof`].
pub fn verify(root: &Hash, leaf: &Hash, index: usize, proof: &[Hash]) -> bool {
    let mut current_hash = *leaf;
    let mut current_index = index;
    for sibling in proof {
        current_hash = if current_index.is_multiple_of(2) {
            node_hash(&current_hash, sibling)
        } else {
            node_hash(sibling, &current_hash)
        };
        current_index /= 2;
    }
    current_hash == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, RngCore};

    fn secret_leaves(n: u64) -> Vec<Hash> {
        (0..n)
            .map(|i| {
                let mut hasher = Sha3_256::new();
                hasher.update(format!("secret-{i}"));
                let hashed_secret: Hash = hasher.finalize().into();
                leaf_hash(i, &hashed_secret)
            })
            .collect()
    }

    #[test]
    fn single_leaf_tree_has_no_siblings() {
        let leaves = secret_leaves(1);
        let tree = MerkleTree::build(&leaves);
        assert_eq!(tree.depth(), 0);
        assert!(tree.proof(0).is_empty());
        assert!(verify(&tree.root(), &leaves[0], 0, &[]));
    }

    #[test]
    fn proof_round_trips_for_every_leaf_power_of_two() {
        let leaves = secret_leaves(8);
        let tree = MerkleTree::build(&leaves);
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.proof(i);
            assert!(verify(&tree.root(), leaf, i, &proof), "leaf {i} failed to verify");
        }
    }

    #[test]
    fn proof_round_trips_for_odd_leaf_counts() {
        // parts_count = 4 -> N+1 = 5 leaves, not a power of two.
        for n in [2u64, 3, 5, 7, 9, 13] {
            let leaves = secret_leaves(n);
            let tree = MerkleTree::build(&leaves);
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.proof(i);
                assert!(verify(&tree.root(), leaf, i, &proof), "n={n} leaf {i} failed");
            }
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let leaves = secret_leaves(5);
        let tree = MerkleTree::build(&leaves);
        let proof = tree.proof(2);
        let wrong_leaf = leaf_hash(2, &[0xFFu8; 32]);
        assert!(!verify(&tree.root(), &wrong_leaf, 2, &proof));
    }

    #[test]
    fn tampered_proof_fails_verification() {
        let leaves = secret_leaves(5);
        let tree = MerkleTree::build(&leaves);
        let mut proof = tree.proof(2);
        proof[0][0] ^= 0xFF;
        assert!(!verify(&tree.root(), &leaves[2], 2, &proof));
    }

    #[test]
    fn random_leaf_counts_round_trip() {
        let mut rng = thread_rng();
        for _ in 0..20 {
            let n = 1 + (rng.next_u32() % 64) as u64;
            let leaves = secret_leaves(n);
            let tree = MerkleTree::build(&leaves);
            let index = (rng.next_u32() as u64 % n) as usize;
            let proof = tree.proof(index);
            assert!(verify(&tree.root(), &leaves[index], index, &proof));
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_index_panics() {
        let leaves = secret_leaves(4);
        let tree = MerkleTree::build(&leaves);
        let _ = tree.proof(4);
    }

    #[test]
    fn leaf_hash_is_domain_separated_from_node_hash() {
        // same 32 bytes fed through both should not collide, since the
        // prefix byte differs and sha3 mixes the whole input.
        let a = [0x11u8; 32];
        let b = [0x22u8; 32];
        assert_ne!(leaf_hash(0x2211_0000_0000_0000, &b), node_hash(&a, &b));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_leaf_at_every_count_verifies(n in 1u64..200, seed in 0u8..=255) {
            let leaves: Vec<Hash> = (0..n)
                .map(|i| {
                    let mut hasher = Sha3_256::new();
                    hasher.update([seed]);
                    hasher.update(format!("secret-{i}"));
                    let hashed_secret: Hash = hasher.finalize().into();
                    leaf_hash(i, &hashed_secret)
                })
                .collect();
            let tree = MerkleTree::build(&leaves);
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.proof(i);
                prop_assert!(verify(&tree.root(), leaf, i, &proof));
            }
        }
    }
}
