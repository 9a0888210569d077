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

//! SNARK-friendly public key encryption.
//! Our encryption scheme is:
//! We use part of El Gamal to establish a shared secret K* (a point in the
//! embedded curve) between sender and receiver. (Receiver's PK: `g^x`, we
//! send `g^y` to establish `K* = g^{xy}`.)
//! We derive a key `K` in the main curve as `H(K*.x, K*.y)`, where H is our
//! transient hash.
//!
//! The main message is then encrypted using the transient hash as a block
//! cipher, in CTR mode, keyed with `K`. As `K` is ephemeral, we do not use an
//! IV, and we substitute field addition for xor.

use crate::curve::{embedded, EmbeddedFr, EmbeddedGroupAffine, Fr, FR_BYTES};
use crate::hash::transient_hash;
use crate::repr::{FieldRepr, FromFieldRepr};
use rand::distributions::Standard;
use rand::prelude::Distribution;
use rand::{CryptoRng, Rng};
use serialize::{serializable_newtype, serializable_struct, tag_enforcement_test};
use std::fmt::{self, Debug, Formatter};
use std::iter::once;

/// A public key, consisting of a group element `g^x`
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PublicKey(pub(crate) EmbeddedGroupAffine);
tag_enforcement_test!(PublicKey);

serializable_newtype!(PublicKey: "encryption-public-key[v1]" = "embedded-group-affine[v1]");

impl Distribution<PublicKey> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PublicKey {
        PublicKey(rng.r#gen())
    }
}

/// A secret key, the discrete logarithm of the corresponding [`PublicKey`].
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct SecretKey(EmbeddedFr);
tag_enforcement_test!(SecretKey);

serializable_newtype!(SecretKey: "encryption-secret-key[v1]" = "embedded-fr");

impl Debug for SecretKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "<encryption secret key>")
    }
}

/// A ciphertext. The ciphertext includes an encryption of a zero element,
/// which is used for testing decryption.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ciphertext {
    /// The challenge `g^y`.
    pub c: EmbeddedGroupAffine,
    /// The ciphertext, encrypted with `g^{xy}`.
    pub ciph: Vec<Fr>,
}
tag_enforcement_test!(Ciphertext);

serializable_struct!(Ciphertext: "encryption-ciphertext[v1]" = "(embedded-group-affine[v1],vec(fr))" {
    c, ciph,
});

impl PublicKey {
    /// Encrypts a message that can be represented as field elements to a
    /// public key.
    pub fn encrypt<R: Rng + CryptoRng + ?Sized, T: FieldRepr>(
        &self,
        rng: &mut R,
        msg: &T,
    ) -> Ciphertext {
        let y: EmbeddedFr = rng.r#gen();
        let c = EmbeddedGroupAffine::generator() * y;
        let k_star = self.0 * y;
        let coords = if k_star.is_infinity() {
            (Fr::from(0u64), Fr::from(0u64))
        } else {
            (k_star.x().unwrap(), k_star.y().unwrap())
        };
        let k = transient_hash(&[coords.0, coords.1]);
        let ciph = once(Fr::from(0u64))
            .chain(msg.field_vec())
            .enumerate()
            .map(|(ctr, msg)| transient_hash(&[k, (ctr as u64).into()]) + msg)
            .collect();
        Ciphertext { c, ciph }
    }
}

impl SecretKey {
    /// Number of bytes needed to represent a secret key in memory
    pub const BYTES: usize = FR_BYTES;

    /// Initializes a key-pair.
    pub fn new<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        SecretKey(rng.r#gen())
    }

    /// Initialize a key-pair from arbitrary 64 bytes (little-endian) ensuring
    /// the result falls into the scalar field by taking the modulus.
    pub fn from_uniform_bytes(bytes: &[u8; 64]) -> Self {
        SecretKey(EmbeddedFr(embedded::Scalar::from_bytes_wide(bytes)))
    }

    /// Derives the public key from the secret key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(EmbeddedGroupAffine::generator() * self.0)
    }

    /// Attempts decryption of a given ciphertext.
    pub fn decrypt<T: FromFieldRepr>(&self, ciph: &Ciphertext) -> Option<T> {
        let k_star = ciph.c * self.0;
        let coords = if k_star.is_infinity() {
            (Fr::from(0u64), Fr::from(0u64))
        } else {
            (k_star.x().unwrap(), k_star.y().unwrap())
        };
        let k = transient_hash(&[coords.0, coords.1]);
        let plain = ciph
            .ciph
            .iter()
            .enumerate()
            .map(|(ctr, ciph)| *ciph - transient_hash(&[k, (ctr as u64).into()]))
            .collect::<Vec<_>>();
        if plain.is_empty() || plain[0] != Fr::from(0u64) {
            return None;
        }
        T::from_field_repr(&plain[1..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn correctness() {
        let mut rng = StdRng::from_seed([0x42; 32]);
        let key = SecretKey::new(&mut rng);
        let msg = [7u8; 32];
        let ciph = key.public_key().encrypt(&mut rng, &msg);
        let dec: Option<[u8; 32]> = key.decrypt(&ciph);
        assert_eq!(dec, Some(msg));
    }

    #[test]
    fn decryption_with_wrong_key_fails() {
        let mut rng = StdRng::from_seed([0x43; 32]);
        let key = SecretKey::new(&mut rng);
        let other = SecretKey::new(&mut rng);
        let msg = [1u8; 32];
        let ciph = key.public_key().encrypt(&mut rng, &msg);
        assert_eq!(other.decrypt::<[u8; 32]>(&ciph), None);
    }
}
