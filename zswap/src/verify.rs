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

//! Offer well-formedness: structural normal form, proof verification, and
//! the Pedersen balance aggregation the transaction seals over.

use crate::ciphertext_to_field;
use crate::error::MalformedOffer;
use crate::structure::*;
use coin_structure::coin::ShieldedTokenType;
use std::borrow::Cow;
use std::ops::Deref;
use transient_crypto::commitment::Pedersen;
use transient_crypto::curve::{EmbeddedFr, Fr};
use transient_crypto::proofs::{KeyLocation, Proof, ProofPreimage, VerifierKey};
use transient_crypto::repr::FieldRepr;

/// The circuit location of spend proofs.
pub const SPEND_CIRCUIT: KeyLocation = KeyLocation(Cow::Borrowed("midnight/zswap/spend"));
/// The circuit location of output proofs.
pub const OUTPUT_CIRCUIT: KeyLocation = KeyLocation(Cow::Borrowed("midnight/zswap/output"));
/// The circuit location of claim-authorization proofs.
pub const SIGN_CIRCUIT: KeyLocation = KeyLocation(Cow::Borrowed("midnight/zswap/sign"));

/// The public-input stream of an input's spend proof.
pub(crate) fn input_statement(input: &Input<impl Sized>, segment: u16) -> Vec<Fr> {
    let mut statement = vec![Fr::from(0u64)];
    input.merkle_tree_root.field_repr(&mut statement);
    input.nullifier.field_repr(&mut statement);
    input.value_commitment.field_repr(&mut statement);
    match &input.contract_address {
        Some(addr) => addr.deref().field_repr(&mut statement),
        None => statement.push(Fr::from(0u64)),
    }
    statement.push(Fr::from(segment));
    statement
}

/// The public-input stream of an output's proof.
pub(crate) fn output_statement(output: &Output<impl Sized>, segment: u16) -> Vec<Fr> {
    let binding = match &output.ciphertext {
        Some(ciph) => ciphertext_to_field(ciph),
        None => Fr::from(0u64),
    };
    let mut statement = vec![binding];
    output.coin_com.field_repr(&mut statement);
    output.value_commitment.field_repr(&mut statement);
    match &output.contract_address {
        Some(addr) => addr.deref().field_repr(&mut statement),
        None => statement.push(Fr::from(0u64)),
    }
    statement.push(Fr::from(segment));
    statement
}

/// The public-input stream of a claim authorization.
pub(crate) fn claim_statement(claim: &AuthorizedClaim<impl Sized>) -> Vec<Fr> {
    use transient_crypto::hash::transient_commit;
    let mut statement = vec![transient_commit(&claim.coin, Fr::from(0u64))];
    claim.recipient.field_repr(&mut statement);
    statement
}

impl Input<Proof> {
    pub fn well_formed(&self, segment: u16) -> Result<(), MalformedOffer> {
        VerifierKey::for_circuit(&SPEND_CIRCUIT)
            .verify(&self.proof, input_statement(self, segment).into_iter())
            .map_err(MalformedOffer::InvalidProof)
    }
}

impl Input<()> {
    pub fn well_formed(&self, _segment: u16) -> Result<(), MalformedOffer> {
        Ok(())
    }
}

impl Input<ProofPreimage> {
    pub fn well_formed(&self, _segment: u16) -> Result<(), MalformedOffer> {
        Ok(())
    }
}

impl Output<Proof> {
    pub fn well_formed(&self, segment: u16) -> Result<(), MalformedOffer> {
        VerifierKey::for_circuit(&OUTPUT_CIRCUIT)
            .verify(&self.proof, output_statement(self, segment).into_iter())
            .map_err(MalformedOffer::InvalidProof)
    }
}

impl Output<()> {
    pub fn well_formed(&self, _segment: u16) -> Result<(), MalformedOffer> {
        Ok(())
    }
}

impl Output<ProofPreimage> {
    pub fn well_formed(&self, _segment: u16) -> Result<(), MalformedOffer> {
        Ok(())
    }
}

impl AuthorizedClaim<Proof> {
    pub fn well_formed(&self) -> Result<(), MalformedOffer> {
        VerifierKey::for_circuit(&SIGN_CIRCUIT)
            .verify(&self.proof, claim_statement(self).into_iter())
            .map_err(MalformedOffer::InvalidProof)
    }
}

impl AuthorizedClaim<()> {
    pub fn well_formed(&self) -> Result<(), MalformedOffer> {
        Ok(())
    }
}

impl AuthorizedClaim<ProofPreimage> {
    pub fn well_formed(&self) -> Result<(), MalformedOffer> {
        Ok(())
    }
}

/// Commits to a delta with zero randomness, for balance aggregation.
fn delta_commitment(token_type: ShieldedTokenType, segment: u16, value: i128) -> Pedersen {
    Pedersen::commit(
        &(token_type, segment),
        &EmbeddedFr::from(value),
        &EmbeddedFr::from(0),
    )
}

/// Per-proof-kind offer validation: `verify_each` runs the embedded proof
/// check of each part.
macro_rules! offer_well_formed {
    ($proof:ty) => {
        impl Offer<$proof> {
            /// Checks the offer's normal form, that contracts are not sent
            /// ciphertexts, verifies the embedded proofs, and returns the
            /// offer's aggregate Pedersen commitment: the sum of input value
            /// commitments, minus output value commitments, minus the
            /// declared deltas committed with zero randomness.
            ///
            /// For a balanced offer, the result is a pure-generator
            /// commitment to the offer's binding randomness.
            pub fn well_formed(&self, segment: u16) -> Result<Pedersen, MalformedOffer> {
                if !self.is_normalized() {
                    return Err(MalformedOffer::NotNormalized);
                }
                for output in self
                    .outputs
                    .iter()
                    .cloned()
                    .chain(self.transient.iter().map(|t| t.as_output()))
                {
                    if let (Some(addr), Some(ciph)) = (&output.contract_address, &output.ciphertext)
                    {
                        return Err(MalformedOffer::ContractSentCiphertext {
                            address: *addr.deref(),
                            ciphertext: Box::new(ciph.deref().clone()),
                        });
                    }
                }
                for input in self.inputs.iter() {
                    input.well_formed(segment)?;
                }
                for output in self.outputs.iter() {
                    output.well_formed(segment)?;
                }
                for transient in self.transient.iter() {
                    transient.as_input().well_formed(segment)?;
                    transient.as_output().well_formed(segment)?;
                }
                let mut agg = self
                    .inputs
                    .iter()
                    .map(|i| i.value_commitment)
                    .chain(self.transient.iter().map(|t| t.value_commitment_input))
                    .fold(Pedersen::default(), |a, b| a + b);
                for vc in self
                    .outputs
                    .iter()
                    .map(|o| o.value_commitment)
                    .chain(self.transient.iter().map(|t| t.value_commitment_output))
                {
                    agg = agg - vc;
                }
                for delta in self.deltas.iter() {
                    agg = agg - delta_commitment(delta.token_type, segment, delta.value);
                }
                Ok(agg)
            }
        }
    };
}

offer_well_formed!(Proof);
offer_well_formed!(ProofPreimage);
offer_well_formed!(());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{SecretKeys, Seed};
    use coin_structure::coin::Info as CoinInfo;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use transient_crypto::commitment::PedersenRandomness;

    #[test]
    fn balanced_offer_aggregates_to_pure_generator() {
        let mut rng = StdRng::seed_from_u64(0xbeef);
        let keys = SecretKeys::from(Seed::random(&mut rng));
        let tt: coin_structure::coin::ShieldedTokenType = rng.r#gen();
        let coin = CoinInfo::new(&mut rng, 100, tt);
        let output =
            Output::new(&mut rng, &coin, 0, &keys.coin_public_key(), None).unwrap();
        let offer = Offer::<ProofPreimage> {
            inputs: vec![].into(),
            outputs: vec![output].into(),
            transient: vec![].into(),
            deltas: vec![Delta {
                token_type: tt,
                value: -100,
            }]
            .into(),
        };
        let agg = offer.well_formed(0).unwrap();
        let rand: PedersenRandomness = offer.binding_randomness();
        assert_eq!(agg, Pedersen::from(rand));
    }
}
