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

use crate::error::MalformedOffer;
use crate::ZSWAP_TREE_HEIGHT;
use coin_structure::coin::{
    Commitment, Info as CoinInfo, Nullifier, PublicKey as CoinPublicKey, ShieldedTokenType,
};
use coin_structure::contract::ContractAddress;
use rand::{CryptoRng, Rng};
use serialize::{
    serializable_struct, tag_enforcement_test, Deserializable, Serializable, Tagged,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read, Write};
use storage::arena::Sp;
use storage::storage::Array;
use transient_crypto::commitment::{Pedersen, PedersenRandomness};
use transient_crypto::curve::{EmbeddedGroupAffine, Fr};
use transient_crypto::encryption;
use transient_crypto::merkle_tree::{MerkleTree, MerkleTreeDigest};
use transient_crypto::proofs::ProofPreimage;

pub(crate) const COIN_CIPHERTEXT_LEN: usize = 6;

/// An encrypted coin preimage, addressed to the recipient's encryption key.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CoinCiphertext {
    /// The ephemeral El Gamal challenge.
    pub c: EmbeddedGroupAffine,
    /// The encrypted coin, in fixed-width field elements.
    pub ciph: [Fr; COIN_CIPHERTEXT_LEN],
}

impl Tagged for CoinCiphertext {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("zswap-coin-ciphertext[v1]")
    }
    fn tag_unique_factor() -> String {
        format!("(embedded-group-affine[v1],array(fr,{COIN_CIPHERTEXT_LEN}))")
    }
}
tag_enforcement_test!(CoinCiphertext);

impl Serializable for CoinCiphertext {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.c.serialize(writer)?;
        // Because this is unversioned we need not send COIN_CIPHERTEXT_LEN
        for elem in self.ciph {
            elem.serialize(writer)?;
        }
        Ok(())
    }

    fn serialized_size(&self) -> usize {
        self.c.serialized_size()
            + self
                .ciph
                .iter()
                .map(Serializable::serialized_size)
                .sum::<usize>()
    }
}

impl Deserializable for CoinCiphertext {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(Self {
            c: EmbeddedGroupAffine::deserialize(reader, recursion_depth)?,
            ciph: {
                let mut res = [Fr::default(); COIN_CIPHERTEXT_LEN];
                for elem in res.iter_mut() {
                    *elem = Fr::deserialize(reader, recursion_depth)?;
                }
                res
            },
        })
    }
}

impl CoinCiphertext {
    /// Encrypts a coin towards a recipient's encryption key.
    pub fn new<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        coin: &CoinInfo,
        pk: encryption::PublicKey,
    ) -> CoinCiphertext {
        pk.encrypt(rng, coin)
            .try_into()
            .expect("ciphertext should have ciphertext length")
    }
}

impl TryFrom<encryption::Ciphertext> for CoinCiphertext {
    type Error = ();

    fn try_from(ciph: encryption::Ciphertext) -> Result<Self, ()> {
        if ciph.ciph.len() != COIN_CIPHERTEXT_LEN {
            return Err(());
        }
        let mut arr = [Fr::default(); COIN_CIPHERTEXT_LEN];
        arr.copy_from_slice(&ciph.ciph);
        Ok(CoinCiphertext { c: ciph.c, ciph: arr })
    }
}

impl From<CoinCiphertext> for encryption::Ciphertext {
    fn from(ciph: CoinCiphertext) -> encryption::Ciphertext {
        encryption::Ciphertext {
            c: ciph.c,
            ciph: ciph.ciph.to_vec(),
        }
    }
}

/// A claim to a specific public key, authorized by the user's private key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AuthorizedClaim<P> {
    pub coin: CoinInfo,
    pub recipient: CoinPublicKey,
    pub proof: P,
}
tag_enforcement_test!(AuthorizedClaim<()>);

impl<P: Tagged> Tagged for AuthorizedClaim<P> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("zswap-authorized-claim[v2]({})", P::tag()))
    }
    fn tag_unique_factor() -> String {
        format!(
            "(shielded-coin-info[v2],zswap-coin-public-key[v1],{})",
            P::tag()
        )
    }
}

impl<P: Serializable> Serializable for AuthorizedClaim<P> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.coin.serialize(writer)?;
        self.recipient.serialize(writer)?;
        self.proof.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.coin.serialized_size()
            + self.recipient.serialized_size()
            + self.proof.serialized_size()
    }
}

impl<P: Deserializable> Deserializable for AuthorizedClaim<P> {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(AuthorizedClaim {
            coin: CoinInfo::deserialize(reader, recursion_depth)?,
            recipient: CoinPublicKey::deserialize(reader, recursion_depth)?,
            proof: P::deserialize(reader, recursion_depth)?,
        })
    }
}

impl<P> AuthorizedClaim<P> {
    pub fn erase_proof(&self) -> AuthorizedClaim<()> {
        AuthorizedClaim {
            coin: self.coin,
            recipient: self.recipient,
            proof: (),
        }
    }
}

impl<P> Debug for AuthorizedClaim<P> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "<claim of {} of token {:?} for recipient {:?}>",
            self.coin.value, self.coin.type_, self.recipient
        )
    }
}

/// The spending half of a shielded transfer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Input<P> {
    pub nullifier: Nullifier,
    pub value_commitment: Pedersen,
    pub contract_address: Option<Sp<ContractAddress>>,
    pub merkle_tree_root: MerkleTreeDigest,
    pub proof: P,
}
tag_enforcement_test!(Input<()>);

impl<P: Tagged> Tagged for Input<P> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("zswap-input[v1]({})", P::tag()))
    }
    fn tag_unique_factor() -> String {
        format!(
            "(zswap-nullifier[v1],pedersen[v1],option(contract-address[v2]),merkle-tree-digest[v1],{})",
            P::tag()
        )
    }
}

impl<P: Serializable> Serializable for Input<P> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.nullifier.serialize(writer)?;
        self.value_commitment.serialize(writer)?;
        self.contract_address.serialize(writer)?;
        self.merkle_tree_root.serialize(writer)?;
        self.proof.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.nullifier.serialized_size()
            + self.value_commitment.serialized_size()
            + self.contract_address.serialized_size()
            + self.merkle_tree_root.serialized_size()
            + self.proof.serialized_size()
    }
}

impl<P: Deserializable> Deserializable for Input<P> {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(Input {
            nullifier: Deserializable::deserialize(reader, recursion_depth)?,
            value_commitment: Deserializable::deserialize(reader, recursion_depth)?,
            contract_address: Deserializable::deserialize(reader, recursion_depth)?,
            merkle_tree_root: Deserializable::deserialize(reader, recursion_depth)?,
            proof: P::deserialize(reader, recursion_depth)?,
        })
    }
}

impl<P> Input<P> {
    pub fn erase_proof(&self) -> Input<()> {
        Input {
            nullifier: self.nullifier,
            value_commitment: self.value_commitment,
            contract_address: self.contract_address.clone(),
            merkle_tree_root: self.merkle_tree_root,
            proof: (),
        }
    }
}

impl Input<ProofPreimage> {
    /// The binding randomness embedded in this input's witness.
    pub fn binding_randomness(&self) -> PedersenRandomness {
        // NOTE: This is tied to the implementation in construct.rs.
        // rc is the last input, and should be a single Fr element.
        (*self
            .proof
            .inputs
            .last()
            .expect("must have witness to extract from"))
        .try_into()
        .expect("extracted binding randomness is invalid")
    }

    /// The segment the proof commits to, recoverable from its public
    /// transcript.
    pub fn segment(&self) -> Option<u16> {
        self.proof
            .public_transcript_outputs
            .last()
            .copied()
            .and_then(|fr| u16::try_from(fr).ok())
    }
}

impl<P> Debug for Input<P> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match &self.contract_address {
            Some(addr) => write!(
                formatter,
                "<shielded input {:?} for: {:?}>",
                self.nullifier, addr
            ),
            None => write!(formatter, "<shielded input {:?}>", self.nullifier),
        }
    }
}

/// The receiving half of a shielded transfer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Output<P> {
    pub coin_com: Commitment,
    pub value_commitment: Pedersen,
    pub contract_address: Option<Sp<ContractAddress>>,
    pub ciphertext: Option<Sp<CoinCiphertext>>,
    pub proof: P,
}
tag_enforcement_test!(Output<()>);

impl<P: Tagged> Tagged for Output<P> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("zswap-output[v1]({})", P::tag()))
    }
    fn tag_unique_factor() -> String {
        format!(
            "(zswap-coin-commitment[v1],pedersen[v1],option(contract-address[v2]),option(zswap-coin-ciphertext[v1]),{})",
            P::tag()
        )
    }
}

impl<P: Serializable> Serializable for Output<P> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.coin_com.serialize(writer)?;
        self.value_commitment.serialize(writer)?;
        self.contract_address.serialize(writer)?;
        self.ciphertext.serialize(writer)?;
        self.proof.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.coin_com.serialized_size()
            + self.value_commitment.serialized_size()
            + self.contract_address.serialized_size()
            + self.ciphertext.serialized_size()
            + self.proof.serialized_size()
    }
}

impl<P: Deserializable> Deserializable for Output<P> {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(Output {
            coin_com: Deserializable::deserialize(reader, recursion_depth)?,
            value_commitment: Deserializable::deserialize(reader, recursion_depth)?,
            contract_address: Deserializable::deserialize(reader, recursion_depth)?,
            ciphertext: Deserializable::deserialize(reader, recursion_depth)?,
            proof: P::deserialize(reader, recursion_depth)?,
        })
    }
}

impl<P> Output<P> {
    pub fn erase_proof(&self) -> Output<()> {
        Output {
            coin_com: self.coin_com,
            value_commitment: self.value_commitment,
            contract_address: self.contract_address.clone(),
            ciphertext: self.ciphertext.clone(),
            proof: (),
        }
    }
}

impl Output<ProofPreimage> {
    /// The binding randomness embedded in this output's witness.
    pub fn binding_randomness(&self) -> PedersenRandomness {
        // NOTE: rc negated because output commitments are subtracted
        -PedersenRandomness::try_from(
            *self
                .proof
                .inputs
                .last()
                .expect("must have witness to extract from"),
        )
        .expect("extracted binding randomness is invalid")
    }

    /// The segment the proof commits to.
    pub fn segment(&self) -> Option<u16> {
        self.proof
            .public_transcript_outputs
            .last()
            .copied()
            .and_then(|fr| u16::try_from(fr).ok())
    }
}

impl<P> Debug for Output<P> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match &self.contract_address {
            Some(addr) => write!(
                formatter,
                "<shielded output {:?} for: {:?}>",
                self.coin_com, addr
            ),
            None => write!(formatter, "<shielded output {:?}>", self.coin_com),
        }
    }
}

/// A coin that is created and spent in the same transaction.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transient<P> {
    pub nullifier: Nullifier,
    pub coin_com: Commitment,
    pub value_commitment_input: Pedersen,
    pub value_commitment_output: Pedersen,
    pub contract_address: Option<Sp<ContractAddress>>,
    pub ciphertext: Option<Sp<CoinCiphertext>>,
    pub proof_input: P,
    pub proof_output: P,
}
tag_enforcement_test!(Transient<()>);

impl<P: Tagged> Tagged for Transient<P> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("zswap-transient[v1]({})", P::tag()))
    }
    fn tag_unique_factor() -> String {
        format!(
            "(zswap-nullifier[v1],zswap-coin-commitment[v1],pedersen[v1],pedersen[v1],option(contract-address[v2]),option(zswap-coin-ciphertext[v1]),{p},{p})",
            p = P::tag()
        )
    }
}

impl<P: Serializable> Serializable for Transient<P> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.nullifier.serialize(writer)?;
        self.coin_com.serialize(writer)?;
        self.value_commitment_input.serialize(writer)?;
        self.value_commitment_output.serialize(writer)?;
        self.contract_address.serialize(writer)?;
        self.ciphertext.serialize(writer)?;
        self.proof_input.serialize(writer)?;
        self.proof_output.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.nullifier.serialized_size()
            + self.coin_com.serialized_size()
            + self.value_commitment_input.serialized_size()
            + self.value_commitment_output.serialized_size()
            + self.contract_address.serialized_size()
            + self.ciphertext.serialized_size()
            + self.proof_input.serialized_size()
            + self.proof_output.serialized_size()
    }
}

impl<P: Deserializable> Deserializable for Transient<P> {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(Transient {
            nullifier: Deserializable::deserialize(reader, recursion_depth)?,
            coin_com: Deserializable::deserialize(reader, recursion_depth)?,
            value_commitment_input: Deserializable::deserialize(reader, recursion_depth)?,
            value_commitment_output: Deserializable::deserialize(reader, recursion_depth)?,
            contract_address: Deserializable::deserialize(reader, recursion_depth)?,
            ciphertext: Deserializable::deserialize(reader, recursion_depth)?,
            proof_input: P::deserialize(reader, recursion_depth)?,
            proof_output: P::deserialize(reader, recursion_depth)?,
        })
    }
}

impl<P> Transient<P> {
    pub fn erase_proof(&self) -> Transient<()> {
        Transient {
            nullifier: self.nullifier,
            coin_com: self.coin_com,
            value_commitment_input: self.value_commitment_input,
            value_commitment_output: self.value_commitment_output,
            contract_address: self.contract_address.clone(),
            ciphertext: self.ciphertext.clone(),
            proof_input: (),
            proof_output: (),
        }
    }
}

impl Transient<ProofPreimage> {
    pub fn binding_randomness(&self) -> PedersenRandomness {
        self.as_input().binding_randomness() + self.as_output().binding_randomness()
    }

    pub fn segment(&self) -> Option<u16> {
        self.as_input().segment()
    }
}

impl<P: Clone> Transient<P> {
    /// This transient's input half, against a single-leaf tree.
    pub fn as_input(&self) -> Input<P> {
        Input {
            nullifier: self.nullifier,
            value_commitment: self.value_commitment_input,
            contract_address: self.contract_address.clone(),
            merkle_tree_root: MerkleTree::<()>::blank(ZSWAP_TREE_HEIGHT)
                .update_hash(0, self.coin_com.0, ())
                .rehash()
                .root()
                .expect("rehashed tree must have root"),
            proof: self.proof_input.clone(),
        }
    }

    /// This transient's output half.
    pub fn as_output(&self) -> Output<P> {
        Output {
            coin_com: self.coin_com,
            value_commitment: self.value_commitment_output,
            contract_address: self.contract_address.clone(),
            ciphertext: self.ciphertext.clone(),
            proof: self.proof_output.clone(),
        }
    }
}

impl<P> Debug for Transient<P> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self.contract_address.clone() {
            Some(addr) => {
                write!(
                    formatter,
                    "<shielded transient coin {:?} {:?} for: {:?}>",
                    self.coin_com, self.nullifier, addr
                )
            }
            None => write!(
                formatter,
                "<shielded transient coin {:?} {:?}>",
                self.coin_com, self.nullifier
            ),
        }
    }
}

/// An offer's net movement in a single token type. A positive value means
/// more coins have been spent, a negative value means more coins were
/// created.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delta {
    pub token_type: ShieldedTokenType,
    pub value: i128,
}
tag_enforcement_test!(Delta);

serializable_struct!(Delta: "zswap-delta" = "(shielded-token-type[v1],i128)" {
    token_type, value,
});

impl Debug for Delta {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{:?} -> {:?}", self.token_type, self.value)
    }
}

/// A Zswap offer consists of a potentially unbalanced set of Zswap
/// inputs/outputs.
///
/// All vectors must be sorted to be valid, and `deltas` must be key-unique
/// (i.e. not contain tuples sharing their first element `(a, b)` and
/// `(a, c)`). This is to have a canonical representation while operating on
/// sets and maps.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Offer<P> {
    /// A set of Inputs
    pub inputs: Array<Input<P>>,
    /// A set of Outputs
    pub outputs: Array<Output<P>>,
    /// A set of "transient" Zswap coins: Coins that are created and spent in
    /// the same transaction
    pub transient: Array<Transient<P>>,
    /// A map from types (coin colors) to the offer value in this type.
    pub deltas: Array<Delta>,
}
tag_enforcement_test!(Offer<()>);

impl<P: Tagged> Tagged for Offer<P> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("zswap-offer[v4]({})", P::tag()))
    }
    fn tag_unique_factor() -> String {
        format!(
            "(vec(zswap-input[v1]({p})),vec(zswap-output[v1]({p})),vec(zswap-transient[v1]({p})),vec(zswap-delta))",
            p = P::tag()
        )
    }
}

impl<P: Serializable + Clone> Serializable for Offer<P> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.inputs.serialize(writer)?;
        self.outputs.serialize(writer)?;
        self.transient.serialize(writer)?;
        self.deltas.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.inputs.serialized_size()
            + self.outputs.serialized_size()
            + self.transient.serialized_size()
            + self.deltas.serialized_size()
    }
}

impl<P: Deserializable + Clone> Deserializable for Offer<P> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        Ok(Offer {
            inputs: Array::deserialize(reader, recursion_depth)?,
            outputs: Array::deserialize(reader, recursion_depth)?,
            transient: Array::deserialize(reader, recursion_depth)?,
            deltas: Array::deserialize(reader, recursion_depth)?,
        })
    }
}

impl Offer<ProofPreimage> {
    /// The total binding randomness of this offer's commitments.
    pub fn binding_randomness(&self) -> PedersenRandomness {
        self.inputs
            .iter()
            .map(|i| i.binding_randomness())
            .chain(self.outputs.iter().map(|o| o.binding_randomness()))
            .chain(self.transient.iter().map(|t| t.binding_randomness()))
            .fold(PedersenRandomness::from(0), |a, b| a + b)
    }
}

impl<P: Clone> Offer<P> {
    pub fn erase_proofs(&self) -> Offer<()> {
        Offer {
            inputs: self.inputs.iter().map(Input::erase_proof).collect(),
            outputs: self.outputs.iter().map(Output::erase_proof).collect(),
            transient: self.transient.iter().map(Transient::erase_proof).collect(),
            deltas: self.deltas.clone(),
        }
    }
}

impl<P> Debug for Offer<P> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("Offer")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("transient", &self.transient)
            .field("deltas", &self.deltas)
            .finish()
    }
}

/// Folds duplicate delta keys together, dropping zeroes, in sorted order.
pub fn normalize_deltas<T: Ord, I: Iterator<Item = (T, i128)>>(deltas: I) -> Vec<(T, i128)> {
    let mut new_deltas: Vec<_> = deltas
        .fold(BTreeMap::new(), |mut map, (k, v)| {
            *map.entry(k).or_insert(0) += v;
            map
        })
        .into_iter()
        .collect();
    new_deltas.retain(|(_, v)| *v != 0);
    new_deltas.sort();
    new_deltas
}

impl<P: Clone + Ord> Offer<P> {
    /// Rewrites this offer into its canonical form.
    pub fn normalize(&mut self) {
        let mut inputs: Vec<_> = self.inputs.iter().cloned().collect();
        inputs.sort();
        self.inputs = inputs.into_iter().collect();
        let mut outputs: Vec<_> = self.outputs.iter().cloned().collect();
        outputs.sort();
        self.outputs = outputs.into_iter().collect();
        let mut transient: Vec<_> = self.transient.iter().cloned().collect();
        transient.sort();
        self.transient = transient.into_iter().collect();
        self.deltas = normalize_deltas(
            self.deltas
                .iter()
                .map(|delta| (delta.token_type, delta.value)),
        )
        .into_iter()
        .map(|(token_type, value)| Delta { token_type, value })
        .collect();
    }

    /// Whether this offer is in the canonical form `normalize` produces.
    pub fn is_normalized(&self) -> bool {
        fn is_sorted_unique<T: Ord>(iter: impl Iterator<Item = T>) -> bool {
            let mut last: Option<T> = None;
            for item in iter {
                if let Some(prev) = &last {
                    if *prev >= item {
                        return false;
                    }
                }
                last = Some(item);
            }
            true
        }
        is_sorted_unique(self.inputs.iter())
            && is_sorted_unique(self.outputs.iter())
            && is_sorted_unique(self.transient.iter())
            && is_sorted_unique(self.deltas.iter().map(|d| d.token_type))
            && self.deltas.iter().all(|d| d.value != 0)
    }

    /// Merges two disjoint offers.
    #[instrument(skip(self, other))]
    pub fn merge(&self, other: &Self) -> Result<Self, MalformedOffer> {
        let inputs1: BTreeSet<_> = self.inputs.iter().cloned().collect();
        let inputs2: BTreeSet<_> = other.inputs.iter().cloned().collect();
        let outputs1: BTreeSet<_> = self.outputs.iter().cloned().collect();
        let outputs2: BTreeSet<_> = other.outputs.iter().cloned().collect();
        let transient1: BTreeSet<_> = self.transient.iter().cloned().collect();
        let transient2: BTreeSet<_> = other.transient.iter().cloned().collect();
        if inputs1.is_disjoint(&inputs2)
            && outputs1.is_disjoint(&outputs2)
            && transient1.is_disjoint(&transient2)
        {
            let mut res = Offer {
                inputs: inputs1.into_iter().chain(inputs2).collect(),
                outputs: outputs1.into_iter().chain(outputs2).collect(),
                transient: transient1.iter().chain(transient2.iter()).cloned().collect(),
                deltas: self
                    .deltas
                    .iter()
                    .chain(other.deltas.iter())
                    .cloned()
                    .collect(),
            };
            res.normalize();
            Ok(res)
        } else {
            warn!("overlap in coins attempted to merge");
            Err(MalformedOffer::NonDisjointCoinMerge)
        }
    }
}

/// Number of public inputs of the input circuit.
pub const INPUT_PIS: usize = 68;
/// The size of a proven input's proof blob.
pub const INPUT_PROOF_SIZE: usize = 6_064;
/// Number of public inputs of the output circuit.
pub const OUTPUT_PIS: usize = 77;
/// The size of a proven output's proof blob.
pub const OUTPUT_PROOF_SIZE: usize = 6_064;
/// Number of public inputs of the claim circuit.
pub const AUTHORIZED_CLAIM_PIS: usize = 13;
