// This file is part of midnight-ledger.
// Copyright (C) 2025 Midnight Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sparse, bounded-height Merkle trees with lazy rehashing and range
//! collapsing.
//!
//! Leaves are hashed with [`leaf_hash`] into the persistent domain, then
//! degraded into the transient field; interior hashes are
//! [`transient_hash`]es of the child roots. Untouched (blank) subtrees hash
//! to zero at every height.

use crate::curve::Fr;
use crate::hash::{degrade_to_transient, transient_hash};
use crate::repr::FieldRepr;
use base_crypto::hash::{persistent_hash, HashOutput};
use base_crypto::repr::BinaryHashRepr;
use serialize::{
    serializable_struct, tag_enforcement_test, Deserializable, Serializable, Tagged, VecExt,
};
use std::error::Error;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read, Write};
use storage::arena::Sp;

use MerkleTreeNode::*;

/// The domain separator for [`leaf_hash`].
pub const LEAF_HASH_DOMAIN_SEP: &[u8] = b"mdn:lh";

/// An index outside the tree, or into a part of the tree that cannot answer
/// the query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidIndex(pub u64);

impl fmt::Display for InvalidIndex {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "invalid index into Merkle tree: {}", self.0)
    }
}

impl Error for InvalidIndex {}

/// The ways applying an update to a tree can fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidUpdate {
    /// The targeted region was already collapsed.
    CollapsedIndex(u64, u8),
    /// The targeted region was already populated.
    StubUpdate(u64, u8),
    /// The range ends before it starts.
    EndBeforeStart(u64, u64),
    /// The range ends outside of the tree.
    EndOutOfTree(u64),
    /// The update's segmentation does not match its hash count.
    WrongNumberOfSegments(usize, usize),
    /// The source tree had pending rehashes.
    NotFullyRehashed,
    /// The update path does not fit the target tree.
    BadUpdatePath,
}

impl fmt::Display for InvalidUpdate {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use InvalidUpdate::*;
        match self {
            CollapsedIndex(idx, height) => write!(
                f,
                "attempted update on collapsed sub-tree at {idx}/{height}"
            ),
            StubUpdate(idx, height) => {
                write!(f, "attempted update on updated sub-tree at {idx}/{height}")
            }
            EndBeforeStart(start, end) => write!(
                f,
                "attempted update with end ({end}) before start ({start})"
            ),
            EndOutOfTree(end) => write!(f, "attempted update with end ({end}) outside of the tree"),
            WrongNumberOfSegments(..) => write!(f, "attempted update with mismatched segment count"),
            NotFullyRehashed => write!(f, "attempted update without the tree being fully rehashed"),
            BadUpdatePath => write!(
                f,
                "attempted to apply an update path that wasn't compatible with the tree"
            ),
        }
    }
}

impl Error for InvalidUpdate {}

/// The hash of any given leaf.
pub fn leaf_hash<T: BinaryHashRepr + ?Sized>(value: &T) -> HashOutput {
    let mut data = Vec::with_bounded_capacity(value.binary_len() + LEAF_HASH_DOMAIN_SEP.len());
    data.extend(LEAF_HASH_DOMAIN_SEP);
    value.binary_repr(&mut data);
    persistent_hash(&data)
}

/// The hash of a Merkle tree node.
#[derive(Copy, Clone, Hash, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct MerkleTreeDigest(pub Fr);
tag_enforcement_test!(MerkleTreeDigest);

serialize::serializable_newtype!(MerkleTreeDigest: "merkle-tree-digest[v1]" = "fr");

impl rand::distributions::Distribution<MerkleTreeDigest> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> MerkleTreeDigest {
        MerkleTreeDigest(rng.r#gen())
    }
}

impl From<Fr> for MerkleTreeDigest {
    fn from(field: Fr) -> MerkleTreeDigest {
        MerkleTreeDigest(field)
    }
}

impl From<MerkleTreeDigest> for Fr {
    fn from(digest: MerkleTreeDigest) -> Fr {
        digest.0
    }
}

impl Debug for MerkleTreeDigest {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{:?}", self.0)
    }
}

impl FieldRepr for MerkleTreeDigest {
    fn field_repr<W: base_crypto::repr::MemWrite<Fr>>(&self, writer: &mut W) {
        self.0.field_repr(writer)
    }
    fn field_size(&self) -> usize {
        1
    }
}

/// One entry in the Merkle path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePathEntry {
    /// The hash of the sibling element.
    pub sibling: MerkleTreeDigest,
    /// Whether the path went left at this branch.
    pub goes_left: bool,
}
tag_enforcement_test!(MerklePathEntry);

serializable_struct!(MerklePathEntry: "merkle-path-entry[v1]" = "(merkle-tree-digest[v1],bool)" {
    sibling, goes_left,
});

impl FieldRepr for MerklePathEntry {
    fn field_repr<W: base_crypto::repr::MemWrite<Fr>>(&self, writer: &mut W) {
        self.sibling.field_repr(writer);
        self.goes_left.field_repr(writer);
    }
    fn field_size(&self) -> usize {
        2
    }
}

/// An authentication path from a leaf to a tree root, ordered from the leaf
/// up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath<T> {
    /// The leaf authenticated by this path.
    pub leaf: T,
    /// The path entries, nearest the leaf first.
    pub path: Vec<MerklePathEntry>,
}

impl<T: Serializable> Serializable for MerklePath<T> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.leaf.serialize(writer)?;
        self.path.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.leaf.serialized_size() + self.path.serialized_size()
    }
}

impl<T: Deserializable> Deserializable for MerklePath<T> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        Ok(MerklePath {
            leaf: T::deserialize(reader, recursion_depth)?,
            path: Vec::deserialize(reader, recursion_depth)?,
        })
    }
}

impl<T: Tagged> Tagged for MerklePath<T> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("merkle-path[v1]({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("({},vec(merkle-path-entry[v1]))", T::tag())
    }
}

impl<T: BinaryHashRepr> MerklePath<T> {
    /// The tree root that matches this Merkle path.
    pub fn root(&self) -> MerkleTreeDigest {
        MerkleTreeDigest(self.path.iter().fold(
            degrade_to_transient(leaf_hash(&self.leaf)),
            |acc, entry| {
                if entry.goes_left {
                    transient_hash(&[acc, entry.sibling.0])
                } else {
                    transient_hash(&[entry.sibling.0, acc])
                }
            },
        ))
    }
}

/// A path describing a specific tree insertion, together with intermediate
/// hashes. This allows replaying this insertion, even against collapsed
/// trees. The intermediate hashes may be missing, in case the tree was not
/// fully rehashed, in which case its success depends on the non-rehashed
/// parts not being collapsed in the target for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeInsertionPath<A> {
    /// The leaf that was ultimately inserted
    pub leaf: (HashOutput, A),
    /// The path itself, from the leaf up
    pub path: Vec<TreeInsertionPathEntry>,
}
tag_enforcement_test!(TreeInsertionPath<()>);

impl<A: Serializable> Serializable for TreeInsertionPath<A> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.leaf.serialize(writer)?;
        self.path.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.leaf.serialized_size() + self.path.serialized_size()
    }
}

impl<A: Deserializable> Deserializable for TreeInsertionPath<A> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        Ok(TreeInsertionPath {
            leaf: Deserializable::deserialize(reader, recursion_depth)?,
            path: Vec::deserialize(reader, recursion_depth)?,
        })
    }
}

impl<A: Tagged> Tagged for TreeInsertionPath<A> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("tree-insertion-path[v1]({})", A::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("((array(u8,32),{}),vec(tree-insertion-path-entry[v1]))", A::tag())
    }
}

/// An item in [`TreeInsertionPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeInsertionPathEntry {
    /// The hash of the element along the path (*not* the sibling!), if
    /// available.
    pub hash: Option<MerkleTreeDigest>,
    /// Whether the path went left at this branch.
    pub goes_left: bool,
}
tag_enforcement_test!(TreeInsertionPathEntry);

serializable_struct!(TreeInsertionPathEntry: "tree-insertion-path-entry[v1]" = "(option(merkle-tree-digest[v1]),bool)" {
    hash, goes_left,
});

/// A concise update covering a range of the tree, in collapsed form.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct MerkleTreeCollapsedUpdate {
    /// The first index covered by the update range.
    pub start: u64,
    /// The last index covered by the update range.
    pub end: u64,
    hashes: Vec<MerkleTreeDigest>,
}
tag_enforcement_test!(MerkleTreeCollapsedUpdate);

serializable_struct!(MerkleTreeCollapsedUpdate: "merkle-tree-collapsed-update[v1]" = "(u64,u64,vec(merkle-tree-digest[v1]))" {
    start, end, hashes,
});

impl Debug for MerkleTreeCollapsedUpdate {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("MerkleTreeCollapsedUpdate")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

impl MerkleTreeCollapsedUpdate {
    // A hash of height h can step from x to x+(2^h) iff 2^h | x; decompose
    // [a, b) into the fewest such steps.
    fn step_sizes(mut a: u64, b: u64) -> Vec<u8> {
        let mut res = Vec::new();
        while a < b {
            let mut height = 0u8;
            while height < 63
                && a % (1u64 << (height + 1)) == 0
                && a as u128 + (1u128 << (height + 1)) <= b as u128
            {
                height += 1;
            }
            res.push(height);
            a += 1u64 << height;
        }
        res
    }

    /// Captures the sub-range `[start, end]` (inclusive) of a fully rehashed
    /// tree as a replayable update.
    pub fn new<A: Clone>(
        state: &MerkleTree<A>,
        start: u64,
        end: u64,
    ) -> Result<Self, InvalidUpdate> {
        if end < start {
            return Err(InvalidUpdate::EndBeforeStart(start, end));
        }
        if state.height() < 64 && end as u128 >= 1u128 << state.height() {
            return Err(InvalidUpdate::EndOutOfTree(end));
        }
        let segments = Self::step_sizes(start, end + 1);
        let mut hashes = Vec::with_bounded_capacity(segments.len());
        let mut idx = start;
        for segment in segments.iter() {
            hashes.push(MerkleTreeDigest(state.0.subtree_root(
                idx as u128,
                *segment,
                state.height(),
            )?));
            idx += 1u64 << segment;
        }
        Ok(MerkleTreeCollapsedUpdate { start, end, hashes })
    }
}

/// Inner Merkle tree node type
#[derive(Clone, PartialEq, Eq)]
enum MerkleTreeNode<A> {
    /// A populated leaf.
    Leaf { hash: HashOutput, aux: A },
    /// A subtree replaced by its root digest.
    Collapsed { hash: Fr, height: u8 },
    /// An untouched blank subtree.
    Stub { height: u8 },
    /// A branching node; `hash` is cached by `rehash` and cleared on update.
    Node {
        hash: Option<Fr>,
        left: Sp<MerkleTreeNode<A>>,
        right: Sp<MerkleTreeNode<A>>,
        height: u8,
    },
}

enum LeafOrCollapsed<'a, A> {
    Leaf {
        index: u64,
        hash: HashOutput,
        aux: &'a A,
    },
    Collapsed {
        start: u64,
        end: u64,
    },
}

impl<A> LeafOrCollapsed<'_, A> {
    fn upgrade(self, shift: u64) -> Self {
        use LeafOrCollapsed as L;
        match self {
            L::Leaf { index, hash, aux } => L::Leaf {
                index: index + shift,
                hash,
                aux,
            },
            L::Collapsed { start, end } => L::Collapsed {
                start: start + shift,
                end: end + shift,
            },
        }
    }
}

impl<A: Clone> MerkleTreeNode<A> {
    fn height(&self) -> u8 {
        match self {
            Leaf { .. } => 0,
            Stub { height } => *height,
            Collapsed { height, .. } => *height,
            Node { height, .. } => *height,
        }
    }

    fn root(&self) -> Option<Fr> {
        match self {
            Leaf { hash, .. } => Some(degrade_to_transient(*hash)),
            Stub { .. } => Some(Fr::default()),
            Collapsed { hash, .. } => Some(*hash),
            Node { hash, .. } => *hash,
        }
    }

    fn children(&self) -> (Sp<MerkleTreeNode<A>>, Sp<MerkleTreeNode<A>>) {
        match self {
            Stub { height } => (
                Sp::new(Stub { height: height - 1 }),
                Sp::new(Stub { height: height - 1 }),
            ),
            Node { left, right, .. } => (left.clone(), right.clone()),
            Collapsed { .. } => panic!("Attempted to update collapsed portion of Merkle tree!"),
            Leaf { .. } => unreachable!("leaves have no children"),
        }
    }

    fn update_hash(&self, index: u64, new_leaf: HashOutput, new_aux: A) -> MerkleTreeNode<A> {
        let height = self.height();
        if height == 0 {
            if matches!(self, Collapsed { .. }) {
                panic!("Attempted to update collapsed portion of Merkle tree!");
            }
            return Leaf {
                hash: new_leaf,
                aux: new_aux,
            };
        }
        let (left, right) = self.children();
        let goes_left = index >> (height - 1) & 1 == 0;
        let sub_index = index & !(1u64 << (height - 1));
        let (left, right) = if goes_left {
            (Sp::new(left.update_hash(sub_index, new_leaf, new_aux)), right)
        } else {
            (left, Sp::new(right.update_hash(sub_index, new_leaf, new_aux)))
        };
        Node {
            hash: None,
            left,
            right,
            height,
        }
    }

    fn rehash(&self) -> MerkleTreeNode<A> {
        match self {
            Node {
                hash: None,
                left,
                right,
                height,
            } => {
                let left = left.rehash();
                let right = right.rehash();
                let hash = transient_hash(&[
                    left.root().expect("rehashed child must have root"),
                    right.root().expect("rehashed child must have root"),
                ]);
                Node {
                    hash: Some(hash),
                    left: Sp::new(left),
                    right: Sp::new(right),
                    height: *height,
                }
            }
            other => other.clone(),
        }
    }

    // `start`/`end` relative to this subtree, inclusive, `start <= end`.
    fn collapse(&self, start: u128, end: u128) -> MerkleTreeNode<A> {
        let height = self.height();
        let cap: u128 = 1u128 << height;
        if start >= cap || end < start {
            return self.clone();
        }
        let end = u128::min(end, cap - 1);
        if start == 0 && end == cap - 1 {
            if matches!(self, Collapsed { .. } | Stub { .. }) {
                return self.clone();
            }
            let hashed = self.rehash();
            return Collapsed {
                hash: hashed.root().expect("rehashed tree must have root"),
                height,
            };
        }
        match self {
            // A partially covered collapsed or blank region stays as-is.
            Collapsed { .. } | Stub { .. } => self.clone(),
            Leaf { .. } => unreachable!("leaves are fully covered by any range"),
            Node {
                hash,
                left,
                right,
                height,
            } => {
                let half = cap / 2;
                let new_left = if start < half {
                    Sp::new(left.collapse(start, u128::min(end, half - 1)))
                } else {
                    left.clone()
                };
                let new_right = if end >= half {
                    Sp::new(right.collapse(start.saturating_sub(half), end - half))
                } else {
                    right.clone()
                };
                Node {
                    hash: *hash,
                    left: new_left,
                    right: new_right,
                    height: *height,
                }
            }
        }
    }

    fn index(&self, index: u64) -> Option<(HashOutput, &A)> {
        match self {
            Leaf { hash, aux } => Some((*hash, aux)),
            Stub { .. } => None,
            Collapsed { .. } => {
                panic!("Attempted to index into collapsed portion of Merkle tree!")
            }
            Node {
                left,
                right,
                height,
                ..
            } => {
                if index >> (height - 1) & 1 == 0 {
                    left.index(index & !(1u64 << (height - 1)))
                } else {
                    right.index(index & !(1u64 << (height - 1)))
                }
            }
        }
    }

    fn leaves(&self) -> Vec<LeafOrCollapsed<'_, A>> {
        match self {
            Leaf { hash, aux } => vec![LeafOrCollapsed::Leaf {
                index: 0,
                hash: *hash,
                aux,
            }],
            Stub { .. } => Vec::new(),
            Collapsed { height, .. } => vec![LeafOrCollapsed::Collapsed {
                start: 0,
                end: if *height >= 64 {
                    u64::MAX
                } else {
                    (1u64 << height) - 1
                },
            }],
            Node { left, right, .. } => left
                .leaves()
                .into_iter()
                .chain(
                    right
                        .leaves()
                        .into_iter()
                        .map(|leaf| leaf.upgrade(1 << left.height())),
                )
                .collect(),
        }
    }

    // The sibling path for `index`, nearest the leaf first. Requires the
    // tree to be rehashed along the siblings.
    fn sibling_path(&self, index: u64) -> Result<Vec<MerklePathEntry>, InvalidIndex> {
        match self {
            Leaf { .. } | Stub { .. } => Ok(Vec::new()),
            Collapsed { .. } => Err(InvalidIndex(index)),
            Node {
                left,
                right,
                height,
                ..
            } => {
                let goes_left = index >> (height - 1) & 1 == 0;
                let sub_index = index & !(1u64 << (height - 1));
                let (descend, sibling) = if goes_left {
                    (left, right)
                } else {
                    (right, left)
                };
                let mut path = descend.sibling_path(sub_index)?;
                path.push(MerklePathEntry {
                    sibling: MerkleTreeDigest(
                        sibling.root().expect("tree must be rehashed for paths"),
                    ),
                    goes_left,
                });
                Ok(path)
            }
        }
    }

    // The insertion evidence path for `index`, nearest the leaf first; each
    // entry carries this node's own (possibly pending) hash.
    fn insertion_path(&self, index: u64) -> Result<Vec<TreeInsertionPathEntry>, InvalidIndex> {
        match self {
            Leaf { .. } | Stub { .. } => Ok(Vec::new()),
            Collapsed { .. } => Err(InvalidIndex(index)),
            Node {
                left,
                right,
                height,
                ..
            } => {
                let goes_left = index >> (height - 1) & 1 == 0;
                let sub_index = index & !(1u64 << (height - 1));
                let descend = if goes_left { left } else { right };
                let mut path = descend.insertion_path(sub_index)?;
                path.push(TreeInsertionPathEntry {
                    hash: self.root().map(MerkleTreeDigest),
                    goes_left,
                });
                Ok(path)
            }
        }
    }

    fn update_from_evidence(
        &self,
        leaf: (HashOutput, A),
        path: &[TreeInsertionPathEntry],
    ) -> Result<MerkleTreeNode<A>, InvalidUpdate> {
        if path.is_empty() {
            return Ok(Leaf {
                hash: leaf.0,
                aux: leaf.1,
            });
        }
        let entry = path.last().expect("non-empty");
        Ok(match self {
            Collapsed { height, .. } => Collapsed {
                hash: entry.hash.ok_or(InvalidUpdate::BadUpdatePath)?.0,
                height: *height,
            },
            Stub { .. } if self.height() as usize == path.len() => {
                let (left, right) = self.children();
                let half = if entry.goes_left { left } else { right };
                let updated = half.update_from_evidence(leaf, &path[..path.len() - 1])?;
                let (left, right) = self.children();
                if entry.goes_left {
                    Node {
                        hash: None,
                        left: Sp::new(updated),
                        right,
                        height: self.height(),
                    }
                } else {
                    Node {
                        hash: None,
                        left,
                        right: Sp::new(updated),
                        height: self.height(),
                    }
                }
            }
            Node {
                left,
                right,
                height,
                ..
            } => {
                if entry.goes_left {
                    Node {
                        hash: None,
                        left: Sp::new(left.update_from_evidence(leaf, &path[..path.len() - 1])?),
                        right: right.clone(),
                        height: *height,
                    }
                } else {
                    Node {
                        hash: None,
                        left: left.clone(),
                        right: Sp::new(right.update_from_evidence(leaf, &path[..path.len() - 1])?),
                        height: *height,
                    }
                }
            }
            Stub { .. } | Leaf { .. } => return Err(InvalidUpdate::BadUpdatePath),
        })
    }

    // The root of the aligned subtree of `seg_height` at absolute index
    // `idx`; `height` is this node's height.
    fn subtree_root(&self, idx: u128, seg_height: u8, height: u8) -> Result<Fr, InvalidUpdate> {
        if height == seg_height {
            return self.root().ok_or(InvalidUpdate::NotFullyRehashed);
        }
        match self {
            Stub { .. } => Ok(Fr::default()),
            Collapsed { .. } => Err(InvalidUpdate::CollapsedIndex(idx as u64, height)),
            Leaf { .. } => Err(InvalidUpdate::BadUpdatePath),
            Node { left, right, .. } => {
                let half = 1u128 << (height - 1);
                if idx & half == 0 {
                    left.subtree_root(idx & !half, seg_height, height - 1)
                } else {
                    right.subtree_root(idx & !half, seg_height, height - 1)
                }
            }
        }
    }

    fn partial_insert(
        &self,
        idx: u128,
        seg_height: u8,
        digest: MerkleTreeDigest,
    ) -> Result<MerkleTreeNode<A>, InvalidUpdate> {
        let height = self.height();
        if height == seg_height {
            return match self {
                Stub { .. } => Ok(Collapsed {
                    hash: digest.0,
                    height,
                }),
                Collapsed { .. } => Err(InvalidUpdate::CollapsedIndex(idx as u64, height)),
                _ => Err(InvalidUpdate::StubUpdate(idx as u64, height)),
            };
        }
        match self {
            Leaf { .. } => Err(InvalidUpdate::StubUpdate(idx as u64, height)),
            Collapsed { .. } => Err(InvalidUpdate::CollapsedIndex(idx as u64, height)),
            Stub { .. } | Node { .. } => {
                let (left, right) = self.children();
                let half = 1u128 << (height - 1);
                let (left, right) = if idx & half == 0 {
                    (
                        Sp::new(left.partial_insert(idx & !half, seg_height, digest)?),
                        right,
                    )
                } else {
                    (
                        left,
                        Sp::new(right.partial_insert(idx & !half, seg_height, digest)?),
                    )
                };
                Ok(Node {
                    hash: None,
                    left,
                    right,
                    height,
                })
            }
        }
    }
}

/// A sparse Merkle tree of a fixed height, with leaves carrying auxiliary
/// data `A`.
#[derive(Clone, PartialEq, Eq)]
pub struct MerkleTree<A>(Sp<MerkleTreeNode<A>>);

impl<A: Clone> MerkleTree<A> {
    /// Create an empty Merkle tree with a given height. Must be O(1).
    pub fn blank(height: u8) -> Self {
        MerkleTree(Sp::new(Stub { height }))
    }

    /// Inserts a hash value at a specific index, returning the resulting
    /// tree. `index` *must* be within range of the tree height.
    ///
    /// # Panics
    ///
    /// May panic if this index was previously in a range passed to
    /// [`collapse`](MerkleTree::collapse).
    pub fn update_hash(&self, index: u64, new_leaf: HashOutput, aux: A) -> Self {
        MerkleTree(Sp::new(self.0.update_hash(index, new_leaf, aux)))
    }

    /// Inserts a value into a specific index of the tree.
    ///
    /// # Panics
    ///
    /// May panic if this index was previously in a range passed to
    /// [`collapse`](MerkleTree::collapse).
    pub fn update<T: BinaryHashRepr + ?Sized>(&self, index: u64, value: &T, aux: A) -> Self {
        self.update_hash(index, leaf_hash(value), aux)
    }

    /// Collapses the tree between `start` and `end` (inclusive) into their
    /// hashes. This prevents future `update`s to this portion of the tree.
    pub fn collapse(&self, start: u64, end: u64) -> Self {
        if end < start {
            return self.clone();
        }
        MerkleTree(Sp::new(self.0.collapse(start as u128, end as u128)))
    }

    /// Apply a collapsed update to the current tree. This update should *not*
    /// touch any collapsed part of the current tree, and should be
    /// well-formed.
    pub fn apply_collapsed_update(
        &self,
        update: &MerkleTreeCollapsedUpdate,
    ) -> Result<Self, InvalidUpdate> {
        if update.end < update.start {
            return Err(InvalidUpdate::EndBeforeStart(update.start, update.end));
        }
        let segments = MerkleTreeCollapsedUpdate::step_sizes(update.start, update.end + 1);
        if segments.len() != update.hashes.len() {
            return Err(InvalidUpdate::WrongNumberOfSegments(
                segments.len(),
                update.hashes.len(),
            ));
        }
        let mut curr_idx = update.start as u128;
        let mut curr = self.0.as_ref().clone();
        for (segment, hash) in segments.into_iter().zip(update.hashes.iter()) {
            curr = curr.partial_insert(curr_idx, segment, *hash)?;
            curr_idx += 1u128 << segment;
        }
        Ok(MerkleTree(Sp::new(curr)))
    }

    /// Retrieves the height of this tree. Must be O(1).
    pub fn height(&self) -> u8 {
        self.0.height()
    }

    /// Retrieves the Merkle root of this tree. Must be O(1).
    ///
    /// This returns `Some` iff the underlying tree has been rehashed.
    pub fn root(&self) -> Option<MerkleTreeDigest> {
        self.0.root().map(MerkleTreeDigest)
    }

    /// Rehashes the Merkle tree, computing the new root and intermediate
    /// hashes. This is a separate operation as it amortizes costs across
    /// sequential insertions to `O(n + h)` instead of `O(nh)`.
    pub fn rehash(&self) -> Self {
        MerkleTree(Sp::new(self.0.rehash()))
    }

    /// Retrieves the leaf hash value at a given index, if available.
    /// `index` *must* be within range of the tree height.
    ///
    /// # Panics
    ///
    /// Panics if the index is in a collapsed part of the tree.
    pub fn index(&self, index: u64) -> Option<(HashOutput, &A)> {
        self.0.index(index)
    }

    /// Iterate over the leaves and leaf indices of the tree.
    pub fn iter(&self) -> impl Iterator<Item = (u64, HashOutput)> {
        self.0
            .leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                LeafOrCollapsed::Leaf { index, hash, .. } => Some((index, hash)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Iterate over the leaves and leaf indices of the tree, including aux
    /// data.
    pub fn iter_aux(&self) -> impl Iterator<Item = (u64, (HashOutput, A))> {
        self.0
            .leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                LeafOrCollapsed::Leaf { index, hash, aux } => Some((index, (hash, aux.clone()))),
                _ => None,
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Does a linear search for a given leaf.
    ///
    /// `O(2^height)` worst-case behavior, this should only be used for small
    /// trees.
    ///
    /// May panic if the Merkle tree has not been rehashed.
    pub fn find_path_for_leaf<T: BinaryHashRepr>(&self, leaf: T) -> Option<MerklePath<T>> {
        let hash = leaf_hash(&leaf);
        let index = self
            .0
            .leaves()
            .into_iter()
            .find_map(|entry| match entry {
                LeafOrCollapsed::Leaf { index, hash: h, .. } if h == hash => Some(index),
                _ => None,
            })?;
        self.path_for_leaf(index, leaf).ok()
    }

    /// Given a leaf at a specific index, produces a [`MerklePath`] for it.
    ///
    /// May panic if the Merkle tree has not been rehashed.
    pub fn path_for_leaf<T: BinaryHashRepr>(
        &self,
        index: u64,
        leaf: T,
    ) -> Result<MerklePath<T>, InvalidIndex> {
        if self.height() < 64 && index as u128 >= 1u128 << self.height() {
            return Err(InvalidIndex(index));
        }
        self.index(index).ok_or(InvalidIndex(index))?;
        let path = self.0.sibling_path(index)?;
        Ok(MerklePath { leaf, path })
    }

    /// Produces insertion evidence for a specific index; this index must be
    /// present and not collapsed.
    pub fn insertion_evidence(&self, index: u64) -> Result<TreeInsertionPath<A>, InvalidIndex> {
        let leaf = self.index(index).ok_or(InvalidIndex(index))?;
        let leaf = (leaf.0, leaf.1.clone());
        let path = self.0.insertion_path(index)?;
        Ok(TreeInsertionPath { leaf, path })
    }

    /// Attempts to replay a piece of insertion evidence against this tree.
    /// Note that this requires the insertion to be from a trusted source, as
    /// hashes may not be checkable.
    pub fn update_from_evidence(
        &self,
        insertion: TreeInsertionPath<A>,
    ) -> Result<Self, InvalidUpdate> {
        Ok(MerkleTree(Sp::new(
            self.0
                .update_from_evidence(insertion.leaf, &insertion.path)?,
        )))
    }
}

impl<A: Clone + Debug> Debug for MerkleTree<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        for leaf in self.0.leaves() {
            match leaf {
                LeafOrCollapsed::Leaf { index, hash, aux } => {
                    map.entry(&index, &(hash, aux));
                }
                LeafOrCollapsed::Collapsed { start, end } => {
                    map.entry(&(start..=end), &"<collapsed>");
                }
            }
        }
        map.finish()
    }
}

const NODE_STUB: u8 = 0;
const NODE_LEAF: u8 = 1;
const NODE_COLLAPSED: u8 = 2;
const NODE_BRANCH: u8 = 3;

impl<A: Serializable> Serializable for MerkleTreeNode<A> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Stub { height } => {
                NODE_STUB.serialize(writer)?;
                height.serialize(writer)
            }
            Leaf { hash, aux } => {
                NODE_LEAF.serialize(writer)?;
                hash.serialize(writer)?;
                aux.serialize(writer)
            }
            Collapsed { hash, height } => {
                NODE_COLLAPSED.serialize(writer)?;
                hash.serialize(writer)?;
                height.serialize(writer)
            }
            Node {
                hash,
                left,
                right,
                height,
            } => {
                NODE_BRANCH.serialize(writer)?;
                hash.serialize(writer)?;
                left.serialize(writer)?;
                right.serialize(writer)?;
                height.serialize(writer)
            }
        }
    }

    fn serialized_size(&self) -> usize {
        1 + match self {
            Stub { height } => height.serialized_size(),
            Leaf { hash, aux } => hash.serialized_size() + aux.serialized_size(),
            Collapsed { hash, height } => hash.serialized_size() + height.serialized_size(),
            Node {
                hash,
                left,
                right,
                height,
            } => {
                hash.serialized_size()
                    + left.serialized_size()
                    + right.serialized_size()
                    + height.serialized_size()
            }
        }
    }
}

impl<A: Deserializable + Clone> Deserializable for MerkleTreeNode<A> {
    // Recursion here is bounded by the 255 tree height levels, checked below
    // instead of through the global recursion limit.
    const LIMIT_RECURSION: bool = false;

    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        if recursion_depth > 256 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Merkle tree deeper than maximum height",
            ));
        }
        let invalid = |msg: &str| io::Error::new(io::ErrorKind::InvalidData, msg.to_string());
        let node = match u8::deserialize(reader, recursion_depth)? {
            NODE_STUB => Stub {
                height: u8::deserialize(reader, recursion_depth)?,
            },
            NODE_LEAF => Leaf {
                hash: HashOutput::deserialize(reader, recursion_depth)?,
                aux: A::deserialize(reader, recursion_depth)?,
            },
            NODE_COLLAPSED => Collapsed {
                hash: Fr::deserialize(reader, recursion_depth)?,
                height: u8::deserialize(reader, recursion_depth)?,
            },
            NODE_BRANCH => {
                let hash = Option::<Fr>::deserialize(reader, recursion_depth)?;
                let left: MerkleTreeNode<A> =
                    MerkleTreeNode::deserialize(reader, recursion_depth + 1)?;
                let right: MerkleTreeNode<A> =
                    MerkleTreeNode::deserialize(reader, recursion_depth + 1)?;
                let height = u8::deserialize(reader, recursion_depth)?;
                if height == 0 || left.height() != height - 1 || right.height() != height - 1 {
                    return Err(invalid("MerkleTree inconsistent height on deserialization"));
                }
                // NOTE: We *cannot* check the hash invariant on
                // deserialization; hashing is compute-heavy and
                // deserialization is severely compute-time limited. If we *do*
                // have a computed hash, children need to as well.
                if hash.is_some() && (left.root().is_none() || right.root().is_none()) {
                    return Err(invalid(
                        "MerkleTree children not rehashed, but parent claiming to be",
                    ));
                }
                Node {
                    hash,
                    left: Sp::new(left),
                    right: Sp::new(right),
                    height,
                }
            }
            _ => return Err(invalid("unknown Merkle tree node discriminant")),
        };
        Ok(node)
    }
}

impl<A: Serializable> Serializable for MerkleTree<A> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.0.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.0.serialized_size()
    }
}

impl<A: Deserializable + Clone> Deserializable for MerkleTree<A> {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(MerkleTree(Sp::new(MerkleTreeNode::deserialize(
            reader,
            recursion_depth,
        )?)))
    }
}

impl<A: Tagged> Tagged for MerkleTree<A> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("merkle-tree[v1]({})", A::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("merkle-tree[v1]({})", A::tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(entries: &[(u64, u64)]) -> MerkleTree<()> {
        entries
            .iter()
            .fold(MerkleTree::blank(8), |tree, (idx, value)| {
                tree.update(*idx, &value.to_le_bytes(), ())
            })
            .rehash()
    }

    #[test]
    fn root_pending_until_rehash() {
        let tree = MerkleTree::blank(8).update(0, &1u64.to_le_bytes(), ());
        assert_eq!(tree.root(), None);
        assert!(tree.rehash().root().is_some());
    }

    #[test]
    fn root_depends_on_position_and_content() {
        let t1 = tree_with(&[(0, 1), (1, 2)]);
        let t2 = tree_with(&[(0, 2), (1, 1)]);
        let t3 = tree_with(&[(0, 1), (1, 2)]);
        assert_ne!(t1.root(), t2.root());
        assert_eq!(t1.root(), t3.root());
    }

    #[test]
    fn collapse_preserves_root() {
        let full = tree_with(&[(0, 1), (1, 2), (2, 3), (5, 7)]);
        let collapsed = full.collapse(0, 3).rehash();
        assert_eq!(full.root(), collapsed.root());
        assert_eq!(collapsed.iter().count(), 1);
    }

    #[test]
    fn paths_authenticate_leaves() {
        let tree = tree_with(&[(0, 1), (3, 4), (200, 9)]);
        let path = tree.path_for_leaf(3, 4u64.to_le_bytes()).unwrap();
        assert_eq!(path.root(), tree.root().unwrap());
        let found = tree.find_path_for_leaf(9u64.to_le_bytes()).unwrap();
        assert_eq!(found.root(), tree.root().unwrap());
        assert!(tree.find_path_for_leaf(10u64.to_le_bytes()).is_none());
    }

    #[test]
    fn collapsed_updates_replay() {
        let source = tree_with(&[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let update = MerkleTreeCollapsedUpdate::new(&source, 0, 3).unwrap();
        let target: MerkleTree<()> = MerkleTree::blank(8)
            .apply_collapsed_update(&update)
            .unwrap()
            .rehash();
        assert_eq!(target.root(), source.root());
    }

    #[test]
    fn collapsed_update_bounds_are_checked() {
        let source = tree_with(&[(0, 1)]);
        assert_eq!(
            MerkleTreeCollapsedUpdate::new(&source, 3, 1),
            Err(InvalidUpdate::EndBeforeStart(3, 1))
        );
        assert_eq!(
            MerkleTreeCollapsedUpdate::new(&source, 0, 1 << 9),
            Err(InvalidUpdate::EndOutOfTree(1 << 9))
        );
    }

    #[test]
    fn insertion_evidence_replays_into_collapsed_tree() {
        let mut source: MerkleTree<()> = MerkleTree::blank(8);
        for i in 0..4u64 {
            source = source.update(i, &i.to_le_bytes(), ());
        }
        source = source.rehash();
        // A sparse follower who collapsed the first two leaves.
        let follower = source.collapse(0, 1).rehash();
        let source = source.update(4, &100u64.to_le_bytes(), ()).rehash();
        let evidence = source.insertion_evidence(4).unwrap();
        let follower = follower.update_from_evidence(evidence).unwrap().rehash();
        assert_eq!(follower.root(), source.root());
    }

    #[test]
    fn serialization_roundtrips() {
        let tree = tree_with(&[(0, 1), (17, 3)]).collapse(2, 9).rehash();
        let mut bytes = Vec::new();
        tree.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), tree.serialized_size());
        let back = MerkleTree::<()>::deserialize(&mut &bytes[..], 0).unwrap();
        assert_eq!(back, tree);
    }
}
