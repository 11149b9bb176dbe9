//! Merkle-tree commitment and spot-check disclosure (component C, part 2).
//!
//! Grounded on `original_source/include/zkp/merkle_tree.hpp`'s
//! `merkle_tree<Hash>`: a `builder` hashes one column at a time into leaf
//! digests, the tree is completed bottom-up with [`hash_pair`], and
//! `decommit`/`recommit` walk the `[start, end)` node-range recursion so
//! that only the sibling digests not implied by the revealed leaf set are
//! sent.

use crate::hash::{self, Digest};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from Merkle commit/decommit/recommit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    /// Leaf count passed to `commit` was not a power of two.
    #[error("merkle tree requires a power-of-two leaf count, got {0}")]
    NotPowerOfTwo(usize),
    /// A `decommit`/`recommit` index was out of range for the tree.
    #[error("merkle index {0} out of range for {1} leaves")]
    IndexOutOfRange(usize, usize),
    /// `recommit` lacked a sibling digest it needed to recompute the root.
    #[error("recommit is missing a sibling digest needed to rebuild the root")]
    MissingSibling,
    /// The recomputed root did not match the committed root.
    #[error("recommit root mismatch: proof does not open to the committed root")]
    RootMismatch,
}

/// A committed Merkle tree: full node array, `tree[0]` is the root,
/// leaves occupy `tree[num_leaves-1 .. 2*num_leaves-1]`.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    num_leaves: usize,
    nodes: Vec<Digest>,
}

impl MerkleTree {
    /// Build a tree over `num_leaves` column digests (already hashed via
    /// [`crate::hash::ColumnHasher`]). `num_leaves` must be a power of two.
    pub fn commit(leaves: Vec<Digest>) -> Result<Self, MerkleError> {
        let n = leaves.len();
        if n == 0 || (n & (n - 1)) != 0 {
            return Err(MerkleError::NotPowerOfTwo(n));
        }
        let mut nodes = vec![[0u8; 32]; 2 * n - 1];
        nodes[n - 1..].copy_from_slice(&leaves);
        for i in (0..n - 1).rev() {
            nodes[i] = hash::hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }
        Ok(MerkleTree { num_leaves: n, nodes })
    }

    /// The committed root digest.
    pub fn root(&self) -> Digest {
        self.nodes[0]
    }

    fn leaf_node(&self, leaf_idx: usize) -> usize {
        self.num_leaves - 1 + leaf_idx
    }

    /// Produce a decommitment opening the leaves at `indices`: the minimal
    /// set of sibling digests not already implied by the known leaves,
    /// keyed by node index, per `decommit_helper`'s recursion over
    /// `[start, end)` ranges.
    pub fn decommit(&self, indices: &[usize]) -> Result<Decommitment, MerkleError> {
        for &i in indices {
            if i >= self.num_leaves {
                return Err(MerkleError::IndexOutOfRange(i, self.num_leaves));
            }
        }
        let mut known: BTreeMap<usize, Digest> = BTreeMap::new();
        for &i in indices {
            known.insert(self.leaf_node(i), self.nodes[self.leaf_node(i)]);
        }
        let mut siblings = BTreeMap::new();
        self.decommit_helper(0, &known, &mut siblings);
        Ok(Decommitment {
            num_leaves: self.num_leaves,
            siblings,
        })
    }

    /// Recurse over the tree; `node` is a 0-based index into `self.nodes`
    /// (level order). Returns whether `node`'s subtree contains a known
    /// (to-be-revealed) leaf, inserting any sibling digest required to
    /// authenticate that subtree's path to the root.
    fn decommit_helper(&self, node: usize, known: &BTreeMap<usize, Digest>, out: &mut BTreeMap<usize, Digest>) -> bool {
        if node >= self.num_leaves - 1 {
            return known.contains_key(&node);
        }
        let left = 2 * node + 1;
        let right = 2 * node + 2;
        let left_has = self.decommit_helper(left, known, out);
        let right_has = self.decommit_helper(right, known, out);
        if left_has && !right_has {
            out.insert(right, self.nodes[right]);
        } else if right_has && !left_has {
            out.insert(left, self.nodes[left]);
        }
        left_has || right_has
    }

    /// Verify that the indexed leaves plus the decommitment's siblings
    /// recompute the given `root`, per `recommit_helper`.
    pub fn recommit(
        root: &Digest,
        num_leaves: usize,
        revealed: &[(usize, Digest)],
        decommitment: &Decommitment,
    ) -> Result<(), MerkleError> {
        if num_leaves != decommitment.num_leaves {
            return Err(MerkleError::IndexOutOfRange(0, num_leaves));
        }
        let mut known: BTreeMap<usize, Digest> = decommitment.siblings.clone();
        for &(idx, digest) in revealed {
            if idx >= num_leaves {
                return Err(MerkleError::IndexOutOfRange(idx, num_leaves));
            }
            known.insert(num_leaves - 1 + idx, digest);
        }
        let recomputed = Self::recommit_helper(0, num_leaves, &mut known)?;
        if &recomputed == root {
            Ok(())
        } else {
            Err(MerkleError::RootMismatch)
        }
    }

    fn recommit_helper(node: usize, num_leaves: usize, known: &mut BTreeMap<usize, Digest>) -> Result<Digest, MerkleError> {
        if node >= num_leaves - 1 {
            return known.get(&node).copied().ok_or(MerkleError::MissingSibling);
        }
        if let Some(d) = known.get(&node) {
            return Ok(*d);
        }
        let left = Self::recommit_helper(2 * node + 1, num_leaves, known)?;
        let right = Self::recommit_helper(2 * node + 2, num_leaves, known)?;
        let digest = hash::hash_pair(&left, &right);
        known.insert(node, digest);
        Ok(digest)
    }
}

/// Sibling digests needed to authenticate a subset of leaves against a
/// committed root, keyed by level-order node index (not including the
/// revealed leaves themselves, which the verifier recomputes from the
/// disclosed symbols).
#[derive(Clone, Debug)]
pub struct Decommitment {
    num_leaves: usize,
    siblings: BTreeMap<usize, Digest>,
}

impl Decommitment {
    /// Number of sibling digests carried by this decommitment.
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    /// True if this decommitment carries no sibling digests (only possible
    /// for a single-leaf tree).
    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// The number of leaves in the tree this decommitment was built
    /// against, for serialization round-trips.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Sibling digests as `(node_index, digest)` pairs, in ascending node
    /// order, for serialization.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &Digest)> {
        self.siblings.iter().map(|(&i, d)| (i, d))
    }

    /// Rebuild a decommitment from its serialized `(node_index, digest)`
    /// pairs.
    pub fn from_entries(num_leaves: usize, entries: Vec<(usize, Digest)>) -> Self {
        Decommitment { num_leaves, siblings: entries.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ColumnHasher;

    fn leaf(byte: u8) -> Digest {
        let mut h = ColumnHasher::new();
        h.absorb(&[byte]);
        h.finalize()
    }

    #[test]
    fn commit_rejects_non_power_of_two() {
        let leaves = vec![leaf(0), leaf(1), leaf(2)];
        assert_eq!(
            MerkleTree::commit(leaves).unwrap_err(),
            MerkleError::NotPowerOfTwo(3)
        );
    }

    #[test]
    fn decommit_recommit_round_trip() {
        let leaves: Vec<Digest> = (0..8u8).map(leaf).collect();
        let tree = MerkleTree::commit(leaves.clone()).unwrap();
        let root = tree.root();

        let indices = [1usize, 5, 6];
        let decommitment = tree.decommit(&indices).unwrap();
        let revealed: Vec<(usize, Digest)> = indices.iter().map(|&i| (i, leaves[i])).collect();

        MerkleTree::recommit(&root, leaves.len(), &revealed, &decommitment).unwrap();
    }

    #[test]
    fn recommit_rejects_tampered_leaf() {
        let leaves: Vec<Digest> = (0..8u8).map(leaf).collect();
        let tree = MerkleTree::commit(leaves.clone()).unwrap();
        let root = tree.root();

        let indices = [2usize];
        let decommitment = tree.decommit(&indices).unwrap();
        let tampered = leaf(99);
        let revealed = vec![(2usize, tampered)];

        assert_eq!(
            MerkleTree::recommit(&root, leaves.len(), &revealed, &decommitment).unwrap_err(),
            MerkleError::RootMismatch
        );
    }

    #[test]
    fn single_leaf_tree_has_empty_decommitment() {
        let leaves = vec![leaf(7)];
        let tree = MerkleTree::commit(leaves.clone()).unwrap();
        let decommitment = tree.decommit(&[0]).unwrap();
        assert!(decommitment.is_empty());
        MerkleTree::recommit(&tree.root(), 1, &[(0, leaves[0])], &decommitment).unwrap();
    }
}
