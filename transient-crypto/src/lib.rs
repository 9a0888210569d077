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

//! Cryptography tied to the proof system's native field: transient hashing,
//! Pedersen commitments on the embedded curve, coin encryption, Merkle trees,
//! and the containers proofs travel in.
//!
//! "Transient" here contrasts with the guarantees of
//! [`base_crypto::hash::persistent_hash`]: these primitives may be swapped on
//! hard-forks as the proof system evolves.

pub mod commitment;
pub mod curve;
pub mod encryption;
pub mod fab;
pub mod hash;
pub mod merkle_tree;
pub mod proofs;
pub mod repr;
