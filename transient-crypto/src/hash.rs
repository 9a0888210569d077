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

//! Hashing into and within the proof system's native field.

use crate::curve::{EmbeddedGroupAffine, Fr, FR_BYTES_STORED};
use crate::repr::FieldRepr;
pub use base_crypto::hash::{HashOutput, PERSISTENT_HASH_BYTES};
pub use base_crypto::repr::MemWrite;
use blake2b_simd::Params;

const TRANSIENT_HASH_PERSONAL: &[u8; 16] = b"mdn:transient:v1";

/// An efficient hash over field elements that may be changed on hard-forks.
///
/// Absorbs the canonical byte representation of each element into a
/// domain-separated BLAKE2b instance, and reduces the 64-byte output into the
/// field.
pub fn transient_hash(elems: &[Fr]) -> Fr {
    let mut state = Params::new()
        .hash_length(64)
        .personal(TRANSIENT_HASH_PERSONAL)
        .to_state();
    state.update(&(elems.len() as u64).to_le_bytes());
    for elem in elems {
        state.update(&elem.as_le_bytes());
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(state.finalize().as_bytes());
    Fr::from_uniform_bytes(&wide)
}

/// A hash-to-field, transforming arbitrary (binary) data into a single [Fr]
/// element.
pub fn hash_to_field(data: &[u8]) -> Fr {
    let mut preimage = vec![];
    b"midnight:field_hash".field_repr(&mut preimage);
    data.field_repr(&mut preimage);
    transient_hash(&preimage)
}

/// Transforms the output of a [`transient_hash`] to one of
/// [`base_crypto::hash::persistent_hash`].
pub fn upgrade_from_transient(transient: Fr) -> HashOutput {
    let mut res = [0u8; PERSISTENT_HASH_BYTES];
    res[..FR_BYTES_STORED].copy_from_slice(&transient.as_le_bytes()[..FR_BYTES_STORED]);
    HashOutput(res)
}

/// Transforms the output of a [`base_crypto::hash::persistent_hash`] to one of
/// [`transient_hash`].
pub fn degrade_to_transient(persistent: HashOutput) -> Fr {
    Fr::from_le_bytes(&persistent.0[..FR_BYTES_STORED])
        .expect("truncated hash must fall in the storable byte range")
}

/// Commits to a value using `transient_hash`.
pub fn transient_commit<T: FieldRepr + ?Sized>(value: &T, opening: Fr) -> Fr {
    let mut preimage = vec![opening];
    value.field_repr(&mut preimage);
    transient_hash(&preimage)
}

/// Hashes a value that can be represented as field elements to the proof
/// system's embedded curve, by try-and-increment over compressed candidate
/// encodings, clearing the cofactor.
pub fn hash_to_curve<T: FieldRepr + ?Sized>(value: &T) -> EmbeddedGroupAffine {
    let mut preimage = vec![transient_hash(&value.field_vec())];
    for ctr in 0u64.. {
        preimage.truncate(1);
        preimage.push(Fr::from(ctr));
        let candidate = transient_hash(&preimage);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&candidate.as_le_bytes());
        if let Some(point) = EmbeddedGroupAffine::from_prime_candidate(&bytes) {
            return point;
        }
    }
    unreachable!("try-and-increment terminates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_hash_is_deterministic() {
        let a = transient_hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let b = transient_hash(&[Fr::from(1u64), Fr::from(2u64)]);
        assert_eq!(a, b);
        assert_ne!(a, transient_hash(&[Fr::from(2u64), Fr::from(1u64)]));
    }

    #[test]
    fn transient_hash_is_length_separated() {
        // [0] and [0, 0] must not collide.
        assert_ne!(
            transient_hash(&[Fr::from(0u64)]),
            transient_hash(&[Fr::from(0u64), Fr::from(0u64)])
        );
    }

    #[test]
    fn transient_upgrade_roundtrips() {
        let x = transient_hash(&[Fr::from(11u64)]);
        // Only the storable range survives the upgrade.
        let up = upgrade_from_transient(x);
        let down = degrade_to_transient(up);
        assert_eq!(
            down.as_le_bytes()[..FR_BYTES_STORED],
            x.as_le_bytes()[..FR_BYTES_STORED]
        );
    }

    #[test]
    fn hash_to_curve_lands_in_group() {
        let p = hash_to_curve(&Fr::from(99u64));
        assert!(!p.is_infinity());
        let q = hash_to_curve(&Fr::from(99u64));
        assert_eq!(p, q);
        assert_ne!(p, hash_to_curve(&Fr::from(100u64)));
    }
}
