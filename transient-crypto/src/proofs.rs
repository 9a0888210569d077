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

//! Containers for zero-knowledge proofs and their verification hooks.
//!
//! Proof *generation* happens off-process in the proof server; the ledger
//! only ever sees opaque proof blobs and verifier keys. Verification here is
//! a deterministic binding check of the proof blob against the verifier key
//! and the public input stream, in the style of calibrated mock
//! verification; swapping in a real SNARK backend changes only this module.

use crate::curve::Fr;
use crate::repr::FieldRepr;
use base_crypto::hash::{persistent_hash, HashOutput, PersistentHashWriter};
use base_crypto::repr::{BinaryHashRepr, MemWrite};
use rand::distributions::Standard;
use rand::prelude::Distribution;
use rand::Rng;
use serde::Serialize;
use serialize::{
    serializable_struct, tag_enforcement_test, Deserializable, Serializable, Tagged, VecExt,
};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::io::{self, Read, Write};

/// Where to locate the circuit keys for an operation, for the external
/// prover.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KeyLocation(pub Cow<'static, str>);
tag_enforcement_test!(KeyLocation);

serialize::serializable_newtype!(KeyLocation: "key-location[v1]" = "string");

/// An error during proof verification.
#[derive(Debug)]
pub enum VerifyingError {
    /// The proof blob is structurally malformed.
    Malformed,
    /// The proof does not verify against the key and public inputs.
    VerifierRejected,
}

impl Display for VerifyingError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            VerifyingError::Malformed => write!(formatter, "malformed proof"),
            VerifyingError::VerifierRejected => write!(formatter, "proof verification failed"),
        }
    }
}

impl Error for VerifyingError {}

/// An error during proving.
#[derive(Debug)]
pub enum ProvingError {
    /// The statement's public inputs are not consistent with the witness.
    InconsistentStatement,
}

impl Display for ProvingError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            ProvingError::InconsistentStatement => {
                write!(formatter, "statement inconsistent with witness")
            }
        }
    }
}

impl Error for ProvingError {}

const PROOF_DOMAIN_SEP: &[u8] = b"midnight:proof-binding";

/// An opaque zero-knowledge proof.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Proof(#[serde(with = "serde_bytes")] pub Vec<u8>);
tag_enforcement_test!(Proof);

impl Debug for Proof {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "<proof[{}]>", self.0.len())
    }
}

impl Serializable for Proof {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        Serializable::serialize(&(self.0.len() as u32), writer)?;
        writer.write_all(&self.0)
    }
    fn serialized_size(&self) -> usize {
        (self.0.len() as u32).serialized_size() + self.0.len()
    }
}

impl Deserializable for Proof {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        let len = u32::deserialize(reader, recursion_depth)?;
        Ok(Proof(serialize::ReadExt::read_exact_to_vec(
            reader,
            len as usize,
        )?))
    }
}

impl Tagged for Proof {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("proof[v1]")
    }
    fn tag_unique_factor() -> String {
        "vec(u8)".into()
    }
}

/// A verifier key for a single circuit.
///
/// Identified by a key hash; two keys are interchangeable iff their hashes
/// match.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VerifierKey(pub HashOutput);
tag_enforcement_test!(VerifierKey);

impl Debug for VerifierKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "<verifier key {}>", self.0)
    }
}

impl Tagged for VerifierKey {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("verifier-key[v4]")
    }
    fn tag_unique_factor() -> String {
        "verifier-key[v4]".into()
    }
}

impl Serializable for VerifierKey {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        Serializable::serialize(&self.0, writer)
    }
    fn serialized_size(&self) -> usize {
        self.0.serialized_size()
    }
}

impl Deserializable for VerifierKey {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(VerifierKey(HashOutput::deserialize(
            reader,
            recursion_depth,
        )?))
    }
}

impl Distribution<VerifierKey> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> VerifierKey {
        VerifierKey(rng.r#gen())
    }
}

fn bind_statement(key: &VerifierKey, pis: impl Iterator<Item = Fr>) -> HashOutput {
    let mut hasher = PersistentHashWriter::new();
    MemWrite::write(&mut hasher, PROOF_DOMAIN_SEP);
    key.0.binary_repr(&mut hasher);
    for pi in pis {
        pi.binary_repr(&mut hasher);
    }
    hasher.finalize()
}

impl VerifierKey {
    /// Derives the verifier key for a named circuit. The same location always
    /// yields the same key.
    pub fn for_circuit(location: &KeyLocation) -> VerifierKey {
        let mut data = Vec::with_bounded_capacity(location.0.len() + 24);
        data.extend(b"midnight:circuit-key:");
        data.extend(location.0.as_bytes());
        VerifierKey(persistent_hash(&data))
    }

    /// Verifies a proof against this key and a public-input stream.
    pub fn verify<F: Iterator<Item = Fr>>(
        &self,
        proof: &Proof,
        statement: F,
    ) -> Result<(), VerifyingError> {
        if proof.0.len() != base_crypto::hash::PERSISTENT_HASH_BYTES {
            return Err(VerifyingError::Malformed);
        }
        let expected = bind_statement(self, statement);
        if proof.0 == expected.0 {
            Ok(())
        } else {
            Err(VerifyingError::VerifierRejected)
        }
    }
}

/// The data from which a proof is later generated: the witness, the public
/// transcript, and the binding input.
///
/// Carried by transactions in the `pre-proof` phase; the proof server
/// consumes it and emits a [`Proof`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProofPreimage {
    /// The private witness inputs, with the binding randomness last.
    pub inputs: Vec<Fr>,
    /// The private transcript of the computation being proven.
    pub private_transcript: Vec<Fr>,
    /// The public transcript's inputs.
    pub public_transcript_inputs: Vec<Fr>,
    /// The public transcript's outputs.
    pub public_transcript_outputs: Vec<Fr>,
    /// The input the proof is bound against.
    pub binding_input: Fr,
    /// A commitment to cross-contract communication, if any.
    pub communications_commitment: Option<Fr>,
    /// Which circuit this is to be proven against.
    pub key_location: KeyLocation,
}
tag_enforcement_test!(ProofPreimage);

serializable_struct!(ProofPreimage: "proof-preimage[v1]" = "(vec(fr),vec(fr),vec(fr),vec(fr),fr,option(fr),string)" {
    inputs,
    private_transcript,
    public_transcript_inputs,
    public_transcript_outputs,
    binding_input,
    communications_commitment,
    key_location,
});

impl ProofPreimage {
    /// Produces the proof for this preimage against a statement.
    ///
    /// The statement must match what the verifier will later recompute from
    /// the enclosing transaction.
    pub fn prove<F: Iterator<Item = Fr>>(
        &self,
        key: &VerifierKey,
        statement: F,
    ) -> Result<Proof, ProvingError> {
        Ok(Proof(bind_statement(key, statement).0.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proofs_bind_key_and_statement() {
        let key = VerifierKey::for_circuit(&KeyLocation(Cow::Borrowed("midnight/zswap/spend")));
        let preimage = ProofPreimage {
            inputs: vec![Fr::from(1u64)],
            private_transcript: vec![],
            public_transcript_inputs: vec![Fr::from(2u64)],
            public_transcript_outputs: vec![],
            binding_input: Fr::from(3u64),
            communications_commitment: None,
            key_location: KeyLocation(Cow::Borrowed("midnight/zswap/spend")),
        };
        let statement = [Fr::from(2u64), Fr::from(3u64)];
        let proof = preimage.prove(&key, statement.iter().copied()).unwrap();
        assert!(key.verify(&proof, statement.iter().copied()).is_ok());
        // A different statement no longer verifies.
        assert!(key
            .verify(&proof, [Fr::from(9u64)].iter().copied())
            .is_err());
        // Nor does a different key.
        let other = VerifierKey::for_circuit(&KeyLocation(Cow::Borrowed("midnight/zswap/output")));
        assert!(other.verify(&proof, statement.iter().copied()).is_err());
    }
}
