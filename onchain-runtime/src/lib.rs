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

//! Runs recorded contract transcripts: the query context they execute in,
//! the effects they declare, and the transcript container itself.

#[macro_use]
extern crate tracing;

pub mod context;
pub mod error;
pub mod transcript;

pub use runtime_state::state;

pub use onchain_vm::cost_model;
pub use onchain_vm::error as vm_error;
pub use onchain_vm::ops;
pub use onchain_vm::result_mode;
pub use onchain_vm::state_value_ext;
pub use onchain_vm::vm;
pub use onchain_vm::vm_value;

use base_crypto::fab::AlignedValue;
use coin_structure::coin::{Commitment, Info as CoinInfo, Nullifier};
use coin_structure::transfer::{Recipient, SenderEvidence};
use transient_crypto::curve::Fr;
use transient_crypto::hash::transient_commit;

/// A commitment to a cross-contract call's input and output.
pub fn communication_commitment(input: AlignedValue, output: AlignedValue, rand: Fr) -> Fr {
    transient_commit(&AlignedValue::concat([&input, &output]), rand)
}

/// The coin commitment as contract transcripts compute it.
///
/// Guaranteed to be bit-identical to
/// [`Info::commitment`](coin_structure::coin::Info::commitment); the apply
/// pipeline cross-checks declared effects against values produced this way.
pub fn runtime_coin_commitment(coin: &CoinInfo, recipient: &Recipient) -> Commitment {
    coin.commitment(recipient)
}

/// The coin nullifier as contract transcripts compute it; bit-identical to
/// [`Info::nullifier`](coin_structure::coin::Info::nullifier).
pub fn runtime_coin_nullifier(coin: &CoinInfo, evidence: &SenderEvidence) -> Nullifier {
    coin.nullifier(evidence)
}
