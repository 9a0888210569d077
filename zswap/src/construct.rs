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

//! Building offers: inputs spending tree positions, outputs minting
//! commitments, and the pre-proof witnesses for both.

use crate::error::OfferCreationFailed;
use crate::structure::*;
use crate::verify::{input_statement, output_statement, OUTPUT_CIRCUIT, SIGN_CIRCUIT, SPEND_CIRCUIT};
use crate::ZSWAP_TREE_HEIGHT;
use coin_structure::coin::{
    self, Commitment, Info as CoinInfo, QualifiedInfo as QualifiedCoinInfo,
    SecretKey as CoinSecretKey,
};
use coin_structure::contract::ContractAddress;
use coin_structure::transfer::{Recipient, SenderEvidence};
use rand::{CryptoRng, Rng};
use std::ops::Deref;
use storage::arena::Sp;
use transient_crypto::commitment::Pedersen;
use transient_crypto::curve::{EmbeddedFr, Fr};
use transient_crypto::encryption;
use transient_crypto::hash::transient_commit;
use transient_crypto::merkle_tree::MerkleTree;
use transient_crypto::proofs::ProofPreimage;
use transient_crypto::repr::FieldRepr;

impl AuthorizedClaim<ProofPreimage> {
    /// Authorizes claiming `coin` to the key matching `sk`.
    pub fn new<R: Rng + CryptoRng + ?Sized>(
        _rng: &mut R,
        coin: CoinInfo,
        sk: &CoinSecretKey,
    ) -> Result<Self, OfferCreationFailed> {
        let pk = match Recipient::from(&SenderEvidence::User(*sk)) {
            Recipient::User(pk) => pk,
            Recipient::Contract(_) => unreachable!(),
        };
        let mut inputs = Vec::new();
        sk.field_repr(&mut inputs);
        let proof_preimage = ProofPreimage {
            inputs,
            private_transcript: Vec::new(),
            public_transcript_inputs: Vec::new(),
            public_transcript_outputs: Vec::new(),
            binding_input: transient_commit(&coin, Fr::from(0u64)),
            communications_commitment: None,
            key_location: SIGN_CIRCUIT,
        };
        Ok(AuthorizedClaim {
            coin,
            recipient: pk,
            proof: proof_preimage,
        })
    }
}

impl Input<ProofPreimage> {
    /// Spends a contract-owned coin from a (filtered) commitment tree.
    #[instrument(skip(rng))]
    pub fn new_contract_owned<A: Clone + std::fmt::Debug, R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &QualifiedCoinInfo,
        segment: u16,
        contract: ContractAddress,
        tree: &MerkleTree<A>,
    ) -> Result<Self, OfferCreationFailed> {
        Self::new_from_secret_key(rng, coin, segment, SenderEvidence::Contract(contract), tree)
    }

    pub(crate) fn new_from_secret_key<A: Clone, R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &QualifiedCoinInfo,
        segment: u16,
        sk: SenderEvidence,
        tree: &MerkleTree<A>,
    ) -> Result<Self, OfferCreationFailed> {
        let rc_e: EmbeddedFr = rng.r#gen();
        let rc = Fr::from(rc_e);
        let nullifier = CoinInfo::from(coin).nullifier(&sk);
        let value_commitment =
            Pedersen::commit(&(coin.type_, segment), &EmbeddedFr::from(coin.value), &rc_e);
        let merkle_tree_root = tree.root().ok_or(OfferCreationFailed::TreeNotRehashed)?;
        let Commitment(hash) = CoinInfo::from(coin).commitment(&(&sk).into());
        let mut inputs = Vec::new();
        sk.field_repr(&mut inputs);
        tree.path_for_leaf(coin.mt_index, hash)
            .map_err(OfferCreationFailed::InvalidIndex)?
            .path
            .field_repr(&mut inputs);
        CoinInfo::from(coin).field_repr(&mut inputs);
        inputs.push(rc);
        let mut inp = Input {
            nullifier,
            value_commitment,
            contract_address: match sk {
                SenderEvidence::Contract(addr) => Some(Sp::new(addr)),
                _ => None,
            },
            merkle_tree_root,
            proof: ProofPreimage {
                inputs,
                private_transcript: Vec::new(),
                public_transcript_inputs: Vec::new(),
                public_transcript_outputs: vec![Fr::from(true), Fr::from(segment)],
                binding_input: Fr::from(0u64),
                communications_commitment: None,
                key_location: SPEND_CIRCUIT,
            },
        };
        inp.proof.public_transcript_inputs = input_statement(&inp, segment);
        Ok(inp)
    }
}

impl Output<ProofPreimage> {
    /// A user-owned output, optionally with a ciphertext so the recipient
    /// can discover it on-chain.
    #[instrument(skip(rng))]
    pub fn new<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &CoinInfo,
        segment: u16,
        target_cpk: &coin::PublicKey,
        target_epk: Option<encryption::PublicKey>,
    ) -> Result<Self, OfferCreationFailed> {
        let ciphertext = target_epk.map(|epk| CoinCiphertext::new(rng, coin, epk));
        Self::new_with_ciphertext(rng, coin, segment, target_cpk, ciphertext)
    }

    #[instrument(skip(rng))]
    pub fn new_with_ciphertext<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &CoinInfo,
        segment: u16,
        target_cpk: &coin::PublicKey,
        ciph: Option<CoinCiphertext>,
    ) -> Result<Self, OfferCreationFailed> {
        Self::new_for_recipient(rng, coin, segment, Recipient::User(*target_cpk), ciph)
    }

    /// A contract-owned output; contracts discover coins through the chain
    /// state filter, so no ciphertext is attached.
    #[instrument(skip(rng))]
    pub fn new_contract_owned<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &CoinInfo,
        segment: u16,
        contract: ContractAddress,
    ) -> Result<Self, OfferCreationFailed> {
        Self::new_for_recipient(rng, coin, segment, Recipient::Contract(contract), None)
    }

    pub(crate) fn new_for_recipient<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &CoinInfo,
        segment: u16,
        recipient: Recipient,
        ciphertext: Option<CoinCiphertext>,
    ) -> Result<Self, OfferCreationFailed> {
        let rc_e: EmbeddedFr = rng.r#gen();
        let rc = Fr::from(rc_e);
        let coin_com = coin.commitment(&recipient);
        let value_commitment =
            Pedersen::commit(&(coin.type_, segment), &EmbeddedFr::from(coin.value), &rc_e);
        let mut inputs = Vec::new();
        recipient.field_repr(&mut inputs);
        coin.field_repr(&mut inputs);
        inputs.push(rc);
        let mut outp = Output {
            coin_com,
            value_commitment,
            contract_address: match recipient {
                Recipient::Contract(addr) => Some(Sp::new(addr)),
                _ => None,
            },
            ciphertext: ciphertext.map(Sp::new),
            proof: ProofPreimage {
                inputs,
                private_transcript: Vec::new(),
                public_transcript_inputs: Vec::new(),
                public_transcript_outputs: vec![Fr::from(segment)],
                binding_input: Fr::from(0u64),
                communications_commitment: None,
                key_location: OUTPUT_CIRCUIT,
            },
        };
        outp.proof.public_transcript_inputs = output_statement(&outp, segment);
        Ok(outp)
    }
}

impl Transient<ProofPreimage> {
    /// Builds a transient from an output spent within the same transaction.
    #[instrument(skip(rng))]
    pub fn new_from_contract_owned_output<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &QualifiedCoinInfo,
        segment: u16,
        output: Output<ProofPreimage>,
    ) -> Result<Self, OfferCreationFailed> {
        let tree = MerkleTree::<()>::blank(ZSWAP_TREE_HEIGHT)
            .update_hash(0, output.coin_com.0, ())
            .rehash();
        let addr = output
            .contract_address
            .clone()
            .ok_or(OfferCreationFailed::NotContractOwned)?;
        let input = Input::new_contract_owned(rng, coin, segment, *addr.deref(), &tree)?;
        Ok(Transient {
            nullifier: input.nullifier,
            coin_com: output.coin_com,
            value_commitment_input: input.value_commitment,
            value_commitment_output: output.value_commitment,
            contract_address: output.contract_address,
            ciphertext: output.ciphertext,
            proof_input: input.proof,
            proof_output: output.proof,
        })
    }
}
