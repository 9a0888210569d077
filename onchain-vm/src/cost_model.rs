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

//! The calibrated per-operation cost model of the VM and its surrounding
//! cryptography.
//!
//! All durations are benchmarked medians, in picoseconds, and are protocol
//! constants: changing them is a hard fork.

use base_crypto::cost_model::{CostDuration, RunningCost};
use serde::{Deserialize, Serialize};
use serialize::{serializable_struct, tag_enforcement_test};

const fn ps(picoseconds: u64) -> CostDuration {
    CostDuration::from_picoseconds(picoseconds)
}

/// The gas prices of each VM operation, plus the primitive cryptographic
/// operations the transaction pipeline charges for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CostModel {
    // Per-opcode compute costs.
    pub noop_constant: CostDuration,
    pub noop_coeff_arg: CostDuration,
    pub branch_constant: CostDuration,
    pub branch_coeff_arg: CostDuration,
    pub jmp_constant: CostDuration,
    pub jmp_coeff_arg: CostDuration,
    pub ckpt: CostDuration,
    pub lt: CostDuration,
    pub eq: CostDuration,
    pub type_op: CostDuration,
    pub size_op: CostDuration,
    pub new_op: CostDuration,
    pub and: CostDuration,
    pub or: CostDuration,
    pub neg: CostDuration,
    pub root: CostDuration,
    pub pop: CostDuration,
    pub popeq_constant: CostDuration,
    pub popeq_coeff_value_size: CostDuration,
    pub addi: CostDuration,
    pub subi: CostDuration,
    pub add: CostDuration,
    pub sub: CostDuration,
    pub push_constant: CostDuration,
    pub push_coeff_value_size: CostDuration,
    pub concat_constant: CostDuration,
    pub concat_coeff_total_size: CostDuration,
    pub member_constant: CostDuration,
    pub member_coeff_key_size: CostDuration,
    pub member_coeff_container_log_size: CostDuration,
    pub rem_constant: CostDuration,
    pub rem_coeff_container_log_size: CostDuration,
    pub dup_constant: CostDuration,
    pub dup_coeff_arg: CostDuration,
    pub swap_constant: CostDuration,
    pub swap_coeff_arg: CostDuration,
    pub idx_constant: CostDuration,
    pub idx_coeff_key_size: CostDuration,
    pub idx_coeff_container_log_size: CostDuration,
    pub ins_constant: CostDuration,
    pub ins_coeff_key_size: CostDuration,
    pub ins_coeff_container_log_size: CostDuration,
    pub log_constant: CostDuration,
    pub log_coeff_value_size: CostDuration,
    // Read model: constants plus per-size / per-depth coefficients.
    pub read_cell_constant: CostDuration,
    pub read_cell_coeff_size: CostDuration,
    pub read_map_constant: CostDuration,
    pub read_map_coeff_log_size: CostDuration,
    pub read_bmt_constant: CostDuration,
    pub read_bmt_coeff_log_size: CostDuration,
    pub read_array: CostDuration,
    // Map insertion as charged by the ledger's own state updates.
    pub ins_map_constant: CostDuration,
    pub ins_map_coeff_container_log_size: CostDuration,
    pub ins_map_coeff_key_size: CostDuration,
    // State-delta accounting for contract state swaps.
    pub state_update_constant: CostDuration,
    pub state_update_coeff_bytes: CostDuration,
    // Cryptographic primitives.
    pub transient_hash: CostDuration,
    pub persistent_hash_per_chunk: CostDuration,
    pub signature_verify_constant: CostDuration,
    pub pedersen_valid: CostDuration,
    pub hash_to_curve: CostDuration,
    pub ec_mul: CostDuration,
    pub proof_verify_constant: CostDuration,
    pub proof_verify_coeff_size: CostDuration,
    pub verifier_key_load: CostDuration,
}
tag_enforcement_test!(CostModel);

serializable_struct!(CostModel: "vm-cost-model[v1]" = "vec(u64)" {
    noop_constant, noop_coeff_arg, branch_constant, branch_coeff_arg,
    jmp_constant, jmp_coeff_arg, ckpt, lt, eq, type_op, size_op, new_op,
    and, or, neg, root, pop, popeq_constant, popeq_coeff_value_size,
    addi, subi, add, sub, push_constant, push_coeff_value_size,
    concat_constant, concat_coeff_total_size, member_constant,
    member_coeff_key_size, member_coeff_container_log_size, rem_constant,
    rem_coeff_container_log_size, dup_constant, dup_coeff_arg,
    swap_constant, swap_coeff_arg, idx_constant, idx_coeff_key_size,
    idx_coeff_container_log_size, ins_constant, ins_coeff_key_size,
    ins_coeff_container_log_size, log_constant, log_coeff_value_size,
    read_cell_constant, read_cell_coeff_size, read_map_constant,
    read_map_coeff_log_size, read_bmt_constant, read_bmt_coeff_log_size,
    read_array, ins_map_constant, ins_map_coeff_container_log_size,
    ins_map_coeff_key_size, state_update_constant, state_update_coeff_bytes,
    transient_hash, persistent_hash_per_chunk, signature_verify_constant,
    pedersen_valid, hash_to_curve, ec_mul, proof_verify_constant,
    proof_verify_coeff_size, verifier_key_load,
});

impl CostModel {
    /// The cost model all networks launch with.
    pub const fn initial_cost_model() -> CostModel {
        INITIAL_COST_MODEL
    }

    /// The modeled cost of reading a cell of `size` bytes.
    pub fn read_cell(&self, size: u64, from_disk: bool) -> RunningCost {
        let time = self.read_cell_constant + self.read_cell_coeff_size * size;
        if from_disk {
            RunningCost {
                read_time: time,
                ..RunningCost::ZERO
            }
        } else {
            RunningCost::compute(time)
        }
    }

    /// The modeled cost of indexing into a map of `2^log_size` entries.
    pub fn read_map(&self, log_size: usize, from_disk: bool) -> RunningCost {
        let time = self.read_map_constant + self.read_map_coeff_log_size * log_size as u64;
        if from_disk {
            RunningCost {
                read_time: time,
                ..RunningCost::ZERO
            }
        } else {
            RunningCost::compute(time)
        }
    }

    /// The modeled cost of indexing into a Merkle tree of height `log_size`.
    pub fn read_bmt(&self, log_size: usize, from_disk: bool) -> RunningCost {
        let time = self.read_bmt_constant + self.read_bmt_coeff_log_size * log_size as u64;
        if from_disk {
            RunningCost {
                read_time: time,
                ..RunningCost::ZERO
            }
        } else {
            RunningCost::compute(time)
        }
    }

    /// The modeled cost of indexing into an array.
    pub fn read_array(&self, from_disk: bool) -> RunningCost {
        if from_disk {
            RunningCost {
                read_time: self.read_array,
                ..RunningCost::ZERO
            }
        } else {
            RunningCost::compute(self.read_array)
        }
    }
}

/// The initial, calibrated cost model.
pub const INITIAL_COST_MODEL: CostModel = CostModel {
    noop_constant: ps(3_300),
    noop_coeff_arg: ps(200),
    branch_constant: ps(4_100),
    branch_coeff_arg: ps(150),
    jmp_constant: ps(3_700),
    jmp_coeff_arg: ps(150),
    ckpt: ps(3_300),
    lt: ps(6_800),
    eq: ps(7_500),
    type_op: ps(5_200),
    size_op: ps(5_600),
    new_op: ps(9_400),
    and: ps(6_200),
    or: ps(6_200),
    neg: ps(5_400),
    root: ps(24_000),
    pop: ps(3_600),
    popeq_constant: ps(8_200),
    popeq_coeff_value_size: ps(180),
    addi: ps(6_400),
    subi: ps(6_400),
    add: ps(7_100),
    sub: ps(7_100),
    push_constant: ps(9_800),
    push_coeff_value_size: ps(210),
    concat_constant: ps(12_400),
    concat_coeff_total_size: ps(240),
    member_constant: ps(14_100),
    member_coeff_key_size: ps(260),
    member_coeff_container_log_size: ps(1_900),
    rem_constant: ps(16_800),
    rem_coeff_container_log_size: ps(2_200),
    dup_constant: ps(4_900),
    dup_coeff_arg: ps(310),
    swap_constant: ps(4_700),
    swap_coeff_arg: ps(310),
    idx_constant: ps(13_700),
    idx_coeff_key_size: ps(260),
    idx_coeff_container_log_size: ps(2_000),
    ins_constant: ps(18_900),
    ins_coeff_key_size: ps(280),
    ins_coeff_container_log_size: ps(2_400),
    log_constant: ps(11_200),
    log_coeff_value_size: ps(190),
    read_cell_constant: ps(120_000),
    read_cell_coeff_size: ps(90),
    read_map_constant: ps(130_000),
    read_map_coeff_log_size: ps(32_000),
    read_bmt_constant: ps(130_000),
    read_bmt_coeff_log_size: ps(36_000),
    read_array: ps(120_000),
    ins_map_constant: ps(21_000),
    ins_map_coeff_container_log_size: ps(2_400),
    ins_map_coeff_key_size: ps(280),
    state_update_constant: ps(46_000),
    state_update_coeff_bytes: ps(110),
    transient_hash: ps(1_250_000),
    persistent_hash_per_chunk: ps(220_000),
    signature_verify_constant: ps(55_000_000),
    pedersen_valid: ps(130_000_000),
    hash_to_curve: ps(38_000_000),
    ec_mul: ps(21_000_000),
    proof_verify_constant: ps(1_100_000_000),
    proof_verify_coeff_size: ps(1_400_000),
    verifier_key_load: ps(12_000_000),
};
