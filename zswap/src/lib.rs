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

#![deny(unreachable_pub)]

//! Zswap: shielded value transfer through commitments and nullifiers.

#[macro_use]
extern crate tracing;

/// The height of the global coin commitment tree.
pub const ZSWAP_TREE_HEIGHT: u8 = 32;

pub(crate) fn ciphertext_to_field(c: &CoinCiphertext) -> transient_crypto::curve::Fr {
    use transient_crypto::curve::Fr;
    use transient_crypto::hash::{transient_commit, transient_hash};
    transient_commit(
        &c.ciph[..],
        transient_hash(&[
            c.c.x().unwrap_or(Fr::from(0u64)),
            c.c.y().unwrap_or(Fr::from(0u64)),
        ]),
    )
}

mod construct;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod local;
mod structure;
pub mod verify;

pub use structure::*;
