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

//! Wallet-local shielded state: the coins we can spend, the ones in
//! flight, and a sparse mirror of the commitment tree.

use crate::error::OfferCreationFailed;
use crate::keys::SecretKeys;
use crate::structure::*;
use crate::ZSWAP_TREE_HEIGHT;
use coin_structure::coin::{
    self, Commitment, Info as CoinInfo, Nullifier, QualifiedInfo as QualifiedCoinInfo,
};
use coin_structure::transfer::{Recipient, SenderEvidence};
use rand::{CryptoRng, Rng};
use storage::storage::Map;
use transient_crypto::merkle_tree::{self, MerkleTree, MerkleTreeCollapsedUpdate};
use transient_crypto::proofs::ProofPreimage;

/// The wallet's view of the shielded pool.
#[derive(Clone, Debug)]
#[must_use]
pub struct State {
    /// Spendable coins, by their nullifier.
    pub coins: Map<Nullifier, QualifiedCoinInfo>,
    /// Coins we've spent but not yet seen applied.
    pub pending_spends: Map<Nullifier, QualifiedCoinInfo>,
    /// Coins we expect to receive but haven't seen applied.
    pub pending_outputs: Map<Commitment, CoinInfo>,
    /// A sparse mirror of the global commitment tree.
    pub merkle_tree: MerkleTree<()>,
    /// The next free global tree index.
    pub first_free: u64,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn new() -> Self {
        State {
            coins: Map::new(),
            pending_spends: Map::new(),
            pending_outputs: Map::new(),
            merkle_tree: MerkleTree::blank(ZSWAP_TREE_HEIGHT),
            first_free: 0,
        }
    }

    /// Fast-forwards the tree mirror through a collapsed update from a
    /// chain follower.
    pub fn apply_collapsed_update(
        &self,
        update: &MerkleTreeCollapsedUpdate,
    ) -> Result<Self, merkle_tree::InvalidUpdate> {
        Ok(Self {
            merkle_tree: self.merkle_tree.apply_collapsed_update(update)?.rehash(),
            first_free: u64::max(self.first_free, update.end + 1),
            ..self.clone()
        })
    }

    /// Processes a claim we know the preimage of.
    pub fn apply_claim<P>(&self, secret_keys: &SecretKeys, tx: &AuthorizedClaim<P>) -> Self {
        let mut res = self.clone();
        res.merkle_tree = res
            .merkle_tree
            .update_hash(
                res.first_free,
                tx.coin.commitment(&Recipient::User(tx.recipient)).0,
                (),
            )
            .rehash();
        if secret_keys.coin_public_key() == tx.recipient {
            res.coins = self.coins.insert(
                tx.coin
                    .nullifier(&SenderEvidence::User(secret_keys.coin_secret_key)),
                tx.coin.qualify(self.first_free),
            );
        } else {
            res.merkle_tree = res.merkle_tree.collapse(res.first_free, res.first_free);
        }
        res.first_free += 1;
        res
    }

    /// Releases the pending entries of an offer that failed to apply.
    #[instrument(skip(self, tx))]
    pub fn apply_failed<P: Clone>(&self, tx: &Offer<P>) -> State {
        let mut res = self.clone();
        for nullifier in tx
            .inputs
            .iter()
            .map(|o| &o.nullifier)
            .chain(tx.transient.iter().map(|io| &io.nullifier))
        {
            res.pending_spends = res.pending_spends.remove(nullifier);
        }
        for coin_com in tx
            .outputs
            .iter()
            .map(|o| &o.coin_com)
            .chain(tx.transient.iter().map(|io| &io.coin_com))
        {
            res.pending_outputs = res.pending_outputs.remove(coin_com);
        }
        res
    }

    /// Applies a successful offer: tracks our new coins, finalizes our
    /// spends, and advances the tree mirror.
    #[instrument(skip(self, tx))]
    pub fn apply<P: Clone>(&self, secret_keys: &SecretKeys, tx: &Offer<P>) -> State {
        let mut res = self.clone();
        for (coin_com, ciph) in tx
            .outputs
            .iter()
            .map(|o| (&o.coin_com, o.ciphertext.clone()))
            .chain(
                tx.transient
                    .iter()
                    .map(|io| (&io.coin_com, io.ciphertext.clone())),
            )
        {
            res.merkle_tree = res.merkle_tree.update_hash(res.first_free, coin_com.0, ());
            if let Some(ci) = ciph.as_ref().and_then(|ciph| secret_keys.try_decrypt(ciph)) {
                info!(coin=?ci, "received coin");
                let qci = ci.qualify(res.first_free);
                // Verify that what we got is actually valid.
                if &ci.commitment(&Recipient::User(secret_keys.coin_public_key())) == coin_com {
                    res.coins = res.coins.insert(
                        CoinInfo::nullifier(
                            &(&qci).into(),
                            &SenderEvidence::User(secret_keys.coin_secret_key),
                        ),
                        qci,
                    );
                    res.pending_outputs = res.pending_outputs.remove(coin_com);
                }
            } else if let Some(coin) = res.pending_outputs.get(coin_com).copied() {
                info!(?coin, "received coin");
                let qci = coin.qualify(res.first_free);
                res.coins = res.coins.insert(
                    CoinInfo::nullifier(
                        &(&qci).into(),
                        &SenderEvidence::User(secret_keys.coin_secret_key),
                    ),
                    qci,
                );
                res.pending_outputs = res.pending_outputs.remove(coin_com);
            } else {
                res.merkle_tree = res.merkle_tree.collapse(res.first_free, res.first_free);
            }
            res.first_free += 1;
        }
        for nul in tx
            .inputs
            .iter()
            .map(|i| &i.nullifier)
            .chain(tx.transient.iter().map(|io| &io.nullifier))
        {
            if let Some(coin) = res.coins.get(nul) {
                info!(?coin, "spent coin finalized");
                res.coins = res.coins.remove(nul);
            }
            if let Some(coin) = res.pending_spends.get(nul) {
                info!(?coin, "pending spend removed");
                res.pending_spends = res.pending_spends.remove(nul);
            }
        }
        res.merkle_tree = res.merkle_tree.rehash();
        res
    }

    /// Spends one of our coins, marking it pending.
    #[instrument(skip(self, rng))]
    pub fn spend<R: Rng + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        secret_keys: &SecretKeys,
        coin: &QualifiedCoinInfo,
        segment: u16,
    ) -> Result<(State, Input<ProofPreimage>), OfferCreationFailed> {
        self.spend_from_tree(rng, secret_keys, coin, segment, &self.merkle_tree.clone())
    }

    fn spend_from_tree<R: Rng + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        secret_keys: &SecretKeys,
        coin: &QualifiedCoinInfo,
        segment: u16,
        tree: &MerkleTree<()>,
    ) -> Result<(State, Input<ProofPreimage>), OfferCreationFailed> {
        let inp = Input::new_from_secret_key(
            rng,
            coin,
            segment,
            SenderEvidence::User(secret_keys.coin_secret_key),
            tree,
        )?;
        let res = State {
            pending_spends: self.pending_spends.insert(inp.nullifier, *coin),
            ..self.clone()
        };
        Ok((res, inp))
    }

    /// Spends an output created in the same transaction.
    #[instrument(skip(self, rng))]
    pub fn spend_from_output<R: Rng + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        secret_keys: &SecretKeys,
        coin: &QualifiedCoinInfo,
        segment: u16,
        output: Output<ProofPreimage>,
    ) -> Result<(State, Transient<ProofPreimage>), OfferCreationFailed> {
        let tree = MerkleTree::blank(ZSWAP_TREE_HEIGHT)
            .update_hash(0, output.coin_com.0, ())
            .rehash();
        let (res, input) = self.spend_from_tree(rng, secret_keys, coin, segment, &tree)?;
        let io = Transient {
            nullifier: input.nullifier,
            coin_com: output.coin_com,
            value_commitment_input: input.value_commitment,
            value_commitment_output: output.value_commitment,
            contract_address: output.contract_address,
            ciphertext: output.ciphertext,
            proof_input: input.proof,
            proof_output: output.proof,
        };
        Ok((res, io))
    }

    /// Authorizes claiming a coin minted to us out-of-band.
    #[instrument(skip(rng))]
    pub fn authorize_claim<R: Rng + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        secret_keys: &SecretKeys,
        coin: CoinInfo,
    ) -> Result<AuthorizedClaim<ProofPreimage>, OfferCreationFailed> {
        AuthorizedClaim::new(rng, coin, &secret_keys.coin_secret_key)
    }

    /// Registers an expected incoming coin, so `apply` can pick it up even
    /// without a ciphertext.
    pub fn watch_for(&self, coin_public_key: &coin::PublicKey, coin: &CoinInfo) -> State {
        debug!(?coin, "watching for coin");
        State {
            pending_outputs: self
                .pending_outputs
                .insert(coin.commitment(&Recipient::User(*coin_public_key)), *coin),
            ..self.clone()
        }
    }
}
