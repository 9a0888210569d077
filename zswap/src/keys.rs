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

//! Wallet key material: a seed, and the coin/encryption key pair derived
//! from it.

use crate::structure::CoinCiphertext;
use base_crypto::hash::{PersistentHashWriter, PERSISTENT_HASH_BYTES};
use base_crypto::repr::MemWrite;
use coin_structure::coin::{self, Info as CoinInfo};
use rand::{CryptoRng, Rng};
use std::fmt::{self, Debug, Formatter};
use transient_crypto::encryption;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The root entropy of a wallet.
pub struct Seed([u8; 32]);

impl Debug for Seed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<wallet seed>")
    }
}

impl From<[u8; 32]> for Seed {
    fn from(value: [u8; 32]) -> Self {
        Seed(value)
    }
}

impl Seed {
    pub fn random<T: Rng + CryptoRng>(rng: &mut T) -> Seed {
        let mut out: [u8; 32] = [0; 32];
        rng.fill_bytes(&mut out);
        Seed(out)
    }

    /// Derives the shielded coin secret key from this seed.
    pub fn derive_coin_secret_key(&self) -> coin::SecretKey {
        let domain_separator = b"midnight:csk";
        let mut hash_writer = PersistentHashWriter::new();
        MemWrite::write(&mut hash_writer, domain_separator);
        MemWrite::write(&mut hash_writer, &self.0);
        coin::SecretKey(hash_writer.finalize())
    }

    /// Derives the coin encryption secret key from this seed.
    pub fn derive_encryption_secret_key(&self) -> encryption::SecretKey {
        const DOMAIN_SEPARATOR: &[u8; 12] = b"midnight:esk";
        const NUMBER_OF_BYTES: usize = 64;
        let raw_bytes = self.sample_bytes(NUMBER_OF_BYTES, DOMAIN_SEPARATOR);
        let raw_bytes_arr: [u8; 64] = raw_bytes
            .try_into()
            .expect("sample_bytes returns the requested length");
        encryption::SecretKey::from_uniform_bytes(&raw_bytes_arr)
    }

    /// Expands this seed into `no_of_bytes` bytes under a domain separator.
    pub fn sample_bytes(&self, no_of_bytes: usize, domain_separator: &[u8]) -> Vec<u8> {
        let hash_bytes = PERSISTENT_HASH_BYTES;
        let rounds = no_of_bytes.div_ceil(hash_bytes);
        let mut res: Vec<u8> = Vec::new();
        for round in 0..rounds {
            let mut outer_writer = PersistentHashWriter::new();
            MemWrite::write(&mut outer_writer, domain_separator);
            MemWrite::write(&mut outer_writer, &{
                let mut inner_writer = PersistentHashWriter::new();
                MemWrite::write(&mut inner_writer, &((round as u64).to_le_bytes()));
                MemWrite::write(&mut inner_writer, &self.0);
                inner_writer.finalize().0
            });
            let round_hash = outer_writer.finalize();
            let bytes_to_add = hash_bytes.min(no_of_bytes - round * 32);
            res.extend_from_slice(&round_hash.0[0..bytes_to_add])
        }
        res
    }
}

/// The secret keys of a shielded wallet.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeys {
    /// Controls spending.
    pub coin_secret_key: coin::SecretKey,
    /// Controls output discovery.
    #[zeroize(skip)]
    pub encryption_secret_key: encryption::SecretKey,
}

impl Debug for SecretKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<secret keys>")
    }
}

impl From<Seed> for SecretKeys {
    fn from(seed: Seed) -> Self {
        SecretKeys {
            coin_secret_key: seed.derive_coin_secret_key(),
            encryption_secret_key: seed.derive_encryption_secret_key(),
        }
    }
}

impl SecretKeys {
    pub fn from_rng_seed<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        SecretKeys {
            coin_secret_key: coin::SecretKey(rng.r#gen()),
            encryption_secret_key: encryption::SecretKey::new(rng),
        }
    }

    pub fn coin_public_key(&self) -> coin::PublicKey {
        self.coin_secret_key.public_key()
    }

    pub fn enc_public_key(&self) -> encryption::PublicKey {
        self.encryption_secret_key.public_key()
    }

    /// Attempts to decrypt an output's ciphertext as one of ours.
    pub fn try_decrypt(&self, msg: &CoinCiphertext) -> Option<CoinInfo> {
        self.encryption_secret_key.decrypt(&msg.clone().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn derivation_is_deterministic() {
        let seed = Seed::from([7u8; 32]);
        let keys1 = SecretKeys::from(seed);
        let keys2 = SecretKeys::from(Seed::from([7u8; 32]));
        assert_eq!(keys1.coin_public_key(), keys2.coin_public_key());
        assert_eq!(keys1.enc_public_key(), keys2.enc_public_key());
    }

    #[test]
    fn decryption_finds_own_outputs() {
        let mut rng = StdRng::seed_from_u64(0x77);
        let keys = SecretKeys::from(Seed::random(&mut rng));
        let other = SecretKeys::from(Seed::random(&mut rng));
        let coin = CoinInfo::new(&mut rng, 100, rng.r#gen());
        let ciph = CoinCiphertext::new(&mut rng, &coin, keys.enc_public_key());
        assert_eq!(keys.try_decrypt(&ciph), Some(coin));
        assert_eq!(other.try_decrypt(&ciph), None);
    }
}
