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

//! The shielded pool's chain state: the commitment tree and its history,
//! and the nullifier set.

use crate::error::TransactionInvalid;
use crate::structure::*;
use crate::ZSWAP_TREE_HEIGHT;
use base_crypto::time::{Duration, Timestamp};
use coin_structure::coin::{Commitment, Nullifier};
use coin_structure::contract::ContractAddress;
use serialize::{serializable_struct, tag_enforcement_test};
use std::ops::Deref;
use storage::arena::Sp;
use storage::storage::{HashSet, Map, TimeFilterMap};
use transient_crypto::merkle_tree::{MerkleTree, MerkleTreeDigest};

/// How long past roots stay valid to spend against.
const PAST_ROOT_RETENTION: Duration = Duration::from_secs(3600);

/// The Zswap ledger state.
///
/// Invariant: `coin_coms.root()` equals the most recent entry of
/// `past_roots`.
#[derive(Clone, PartialEq, Eq, Debug)]
#[must_use]
pub struct State {
    /// The coin commitment tree; leaves carry the owning contract for
    /// contract-owned coins.
    pub coin_coms: MerkleTree<Option<Sp<ContractAddress>>>,
    /// Commitment membership, for faerie-gold rejection.
    pub coin_coms_set: HashSet<Commitment>,
    /// The next free commitment tree index.
    pub first_free: u64,
    /// All spent nullifiers.
    pub nullifiers: HashSet<Nullifier>,
    /// The retained window of historic tree roots.
    pub past_roots: TimeFilterMap<MerkleTreeDigest>,
}
tag_enforcement_test!(State);

serializable_struct!(State: "zswap-ledger-state[v4]" = "(merkle-tree,set,u64,set,time-filter-map)" {
    coin_coms, coin_coms_set, first_free, nullifiers, past_roots,
});

impl Default for State {
    fn default() -> Self {
        State {
            coin_coms: MerkleTree::blank(ZSWAP_TREE_HEIGHT),
            coin_coms_set: HashSet::new(),
            first_free: 0,
            nullifiers: HashSet::new(),
            past_roots: TimeFilterMap::new(),
        }
    }
}

impl State {
    pub fn new() -> Self {
        Default::default()
    }

    fn apply_input<P>(
        mut self,
        inp: &Input<P>,
        whitelist: &Option<Map<ContractAddress, ()>>,
    ) -> Result<Self, TransactionInvalid> {
        if !self.past_roots.contains(&inp.merkle_tree_root) {
            warn!(
                ?inp.merkle_tree_root,
                "attempted spend with unknown Merkle tree"
            );
            return Err(TransactionInvalid::UnknownMerkleRoot(inp.merkle_tree_root));
        };

        if self.nullifiers.contains(&inp.nullifier) {
            warn!(?inp.nullifier, "attempted double spend");
            return Err(TransactionInvalid::NullifierAlreadyPresent(inp.nullifier));
        }

        if Self::on_whitelist(
            whitelist,
            &inp.contract_address.as_ref().map(|x| *x.deref()),
        ) {
            self.nullifiers = self.nullifiers.insert(inp.nullifier);
        }
        Ok(self)
    }

    fn apply_output<P>(
        mut self,
        out: &Output<P>,
        whitelist: &Option<Map<ContractAddress, ()>>,
    ) -> Result<(Self, Commitment, u64), TransactionInvalid> {
        if self.coin_coms_set.contains(&out.coin_com) {
            warn!(?out.coin_com, "attempted faerie gold");
            return Err(TransactionInvalid::CommitmentAlreadyPresent(out.coin_com));
        }
        self.coin_coms_set = self.coin_coms_set.insert(out.coin_com);
        let first_free = self.first_free;
        self.coin_coms = self.coin_coms.update_hash(
            first_free,
            out.coin_com.0,
            out.contract_address.clone(),
        );

        if !Self::on_whitelist(
            whitelist,
            &out.contract_address.as_ref().map(|x| *x.deref()),
        ) {
            self.coin_coms = self.coin_coms.collapse(first_free, first_free);
        }

        self.first_free = first_free + 1;
        Ok((self, out.coin_com, first_free))
    }

    fn apply_transient<P: Clone>(
        mut self,
        trans: &Transient<P>,
        whitelist: &Option<Map<ContractAddress, ()>>,
    ) -> Result<(Self, Commitment, u64), TransactionInvalid> {
        if self.coin_coms_set.contains(&trans.coin_com) {
            warn!(?trans.coin_com, "attempted faerie gold");
            return Err(TransactionInvalid::CommitmentAlreadyPresent(trans.coin_com));
        }

        if self.nullifiers.contains(&trans.nullifier) {
            return Err(TransactionInvalid::NullifierAlreadyPresent(trans.nullifier));
        } else if Self::on_whitelist(
            whitelist,
            &trans.contract_address.as_ref().map(|x| *x.deref()),
        ) {
            self.nullifiers = self.nullifiers.insert(trans.nullifier);
        }

        self.coin_coms_set = self.coin_coms_set.insert(trans.coin_com);
        let first_free = self.first_free;
        self.coin_coms = self.coin_coms.update_hash(
            first_free,
            trans.coin_com.0,
            trans.contract_address.clone(),
        );

        if !Self::on_whitelist(
            whitelist,
            &trans.contract_address.as_ref().map(|x| *x.deref()),
        ) {
            self.coin_coms = self.coin_coms.collapse(first_free, first_free);
        }

        self.first_free = first_free + 1;
        Ok((self, trans.coin_com, first_free))
    }

    fn on_whitelist(
        whitelist: &Option<Map<ContractAddress, ()>>,
        contract: &Option<ContractAddress>,
    ) -> bool {
        match (whitelist, contract) {
            (Some(list), Some(addr)) => list.contains_key(addr),
            // If we have a contract whitelist, the assumption is that we're
            // tracking a contract, *not* a user state!
            (Some(_), None) => false,
            (None, None) | (None, Some(_)) => true,
        }
    }

    /// Applies an offer, returning the updated state and the tree index
    /// assigned to each commitment.
    ///
    /// With a whitelist, only commitments owned by listed contracts are
    /// retained in expanded form; everything else is collapsed away
    /// immediately.
    #[instrument(skip(self, offer, whitelist))]
    pub fn try_apply<P: Clone>(
        &self,
        offer: &Offer<P>,
        whitelist: Option<Map<ContractAddress, ()>>,
    ) -> Result<(Self, Map<Commitment, u64>), TransactionInvalid> {
        let mut com_indices = Map::new();
        let mut new_st = offer
            .inputs
            .iter()
            .try_fold(self.clone(), |state, inp| {
                state.apply_input(inp, &whitelist)
            })?;
        for output in offer.outputs.iter() {
            let (state, com, index) = new_st.apply_output(output, &whitelist)?;
            new_st = state;
            com_indices = com_indices.insert(com, index);
        }
        for trans in offer.transient.iter() {
            let (state, com, index) = new_st.apply_transient(trans, &whitelist)?;
            new_st = state;
            com_indices = com_indices.insert(com, index);
        }
        Ok((new_st, com_indices))
    }

    /// A view of the commitment tree retaining only leaves owned by the
    /// given contracts, everything else collapsed.
    pub fn filter(&self, filter: &[ContractAddress]) -> MerkleTree<Option<Sp<ContractAddress>>> {
        let retained_indices: Vec<u64> = self
            .coin_coms
            .iter_aux()
            .filter(|(_index, (_hash, opt_aux))| match opt_aux {
                Some(aux) => filter.contains(aux),
                None => false,
            })
            .map(|(index, ..)| index)
            .collect();
        let mut tree = self.coin_coms.clone();
        let mut p = 0;
        for i in retained_indices {
            if i > 0 {
                tree = tree.collapse(p, i - 1);
            }
            if i < u64::MAX {
                p = i + 1;
            }
        }
        if self.first_free > 0 {
            tree.collapse(p, self.first_free - 1)
        } else {
            tree
        }
    }

    /// Rolls the state past a block boundary: rehashes the tree and rotates
    /// the historic root window.
    pub fn post_block_update(&self, tblock: Timestamp) -> Self {
        let mut new_st = self.clone();
        new_st.coin_coms = new_st.coin_coms.rehash();
        new_st.past_roots = new_st.past_roots.insert(
            tblock,
            new_st
                .coin_coms
                .root()
                .expect("rehashed tree must have root"),
        );
        new_st.past_roots = new_st.past_roots.filter(tblock - PAST_ROOT_RETENTION);

        new_st
    }
}
