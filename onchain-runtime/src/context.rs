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

use crate::error::TranscriptRejected;
use crate::transcript::Transcript;
use base_crypto::cost_model::RunningCost;
use base_crypto::fab::{Aligned, Alignment, InvalidBuiltinDecode, Value, ValueSlice};
use base_crypto::hash::HashOutput;
use base_crypto::time::Timestamp;
use coin_structure::coin::{
    Commitment as CoinCommitment, Info as CoinInfo, Nullifier, PublicAddress,
    QualifiedInfo as QualifiedCoinInfo, TokenType,
};
use coin_structure::contract::ContractAddress;
use coin_structure::transfer::Recipient;
use onchain_vm::cost_model::CostModel;
use onchain_vm::error::OnchainProgramError;
use onchain_vm::ops::Op;
use onchain_vm::result_mode::{ResultMode, ResultModeVerify};
use onchain_vm::state_value_ext::StateValueExt;
use onchain_vm::vm::run_program;
use onchain_vm::vm_value::{ValueStrength, VmValue};
use runtime_state::state::{ChargedState, StateValue};
use serialize::{serializable_struct, tag_enforcement_test, Deserializable, Serializable};
use std::fmt::Debug;
use storage::arena::Sp;
use storage::storage::{HashSet, Map};
use transient_crypto::curve::Fr;

/// The block-level context a transaction executes in; the only source of
/// time for the deterministic core.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContext {
    /// The block's timestamp.
    #[serde(rename = "secondsSinceEpoch")]
    pub tblock: Timestamp,
    /// The claimed error margin on the timestamp, in seconds.
    #[serde(rename = "secondsSinceEpochErr")]
    pub tblock_err: u32,
    /// The parent block's hash.
    pub parent_block_hash: HashOutput,
}
tag_enforcement_test!(BlockContext);

serializable_struct!(BlockContext: "block-context[v1]" = "(timestamp,u32,array(u8,32))" {
    tblock, tblock_err, parent_block_hash,
});

/// The contract-call-level context: the block context plus the caller's
/// identity, the contract's balances, and the commitment indices assigned
/// so far in this transaction.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    pub own_address: ContractAddress,
    pub tblock: Timestamp,
    pub tblock_err: u32,
    pub parent_block_hash: HashOutput,
    pub caller: Option<PublicAddress>,
    pub balance: Map<TokenType, u128>,
    pub com_indices: Map<CoinCommitment, u64>,
}

/// A value of [`Effects::claimed_contract_calls`]: the call's sequence
/// number, callee, entry point hash, and communication commitment.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimedContractCallsValue(pub u64, pub ContractAddress, pub HashOutput, pub Fr);
tag_enforcement_test!(ClaimedContractCallsValue);

impl serialize::Tagged for ClaimedContractCallsValue {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("contract-effects-claimed-contract-calls-value[v1]")
    }
    fn tag_unique_factor() -> String {
        "(u64,contract-address[v2],array(u8,32),fr)".into()
    }
}

impl Serializable for ClaimedContractCallsValue {
    fn serialize(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
        self.0.serialize(writer)?;
        self.1.serialize(writer)?;
        self.2.serialize(writer)?;
        self.3.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.0.serialized_size()
            + self.1.serialized_size()
            + self.2.serialized_size()
            + self.3.serialized_size()
    }
}

impl Deserializable for ClaimedContractCallsValue {
    fn deserialize(reader: &mut impl std::io::Read, recursion_depth: u32) -> std::io::Result<Self> {
        Ok(ClaimedContractCallsValue(
            Deserializable::deserialize(reader, recursion_depth)?,
            Deserializable::deserialize(reader, recursion_depth)?,
            Deserializable::deserialize(reader, recursion_depth)?,
            Deserializable::deserialize(reader, recursion_depth)?,
        ))
    }
}

impl ClaimedContractCallsValue {
    pub fn into_inner(&self) -> (u64, ContractAddress, HashOutput, Fr) {
        (self.0, self.1, self.2, self.3)
    }

    pub fn from_inner(
        pos: u64,
        addr: ContractAddress,
        hash: HashOutput,
        rnd: Fr,
    ) -> ClaimedContractCallsValue {
        ClaimedContractCallsValue(pos, addr, hash, rnd)
    }
}

impl From<ClaimedContractCallsValue> for Value {
    fn from(val: ClaimedContractCallsValue) -> Value {
        let v1: Value = val.0.into();
        let v2: Value = val.1.into();
        let v3: Value = val.2.into();
        let v4: Value = val.3.into();
        Value::concat([&v1, &v2, &v3, &v4])
    }
}

impl TryFrom<&ValueSlice> for ClaimedContractCallsValue {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<ClaimedContractCallsValue, InvalidBuiltinDecode> {
        if value.0.len() == 4 {
            Ok(ClaimedContractCallsValue(
                (&value.0[0]).try_into()?,
                (&value.0[1]).try_into()?,
                (&value.0[2]).try_into()?,
                (&value.0[3]).try_into()?,
            ))
        } else {
            Err(InvalidBuiltinDecode("ClaimedContractCallsValue"))
        }
    }
}

impl Aligned for ClaimedContractCallsValue {
    fn alignment() -> Alignment {
        Alignment::concat([
            &u64::alignment(),
            &ContractAddress::alignment(),
            &HashOutput::alignment(),
            &Fr::alignment(),
        ])
    }
}

/// A key of [`Effects::claimed_unshielded_spends`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimedUnshieldedSpendsKey(pub TokenType, pub PublicAddress);
tag_enforcement_test!(ClaimedUnshieldedSpendsKey);

impl serialize::Tagged for ClaimedUnshieldedSpendsKey {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("contract-effects-claimed-unshielded-spends-key[v1]")
    }
    fn tag_unique_factor() -> String {
        "(token-type[v1],public-address[v1])".into()
    }
}

impl Serializable for ClaimedUnshieldedSpendsKey {
    fn serialize(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
        self.0.serialize(writer)?;
        self.1.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.0.serialized_size() + self.1.serialized_size()
    }
}

impl Deserializable for ClaimedUnshieldedSpendsKey {
    fn deserialize(reader: &mut impl std::io::Read, recursion_depth: u32) -> std::io::Result<Self> {
        Ok(ClaimedUnshieldedSpendsKey(
            Deserializable::deserialize(reader, recursion_depth)?,
            Deserializable::deserialize(reader, recursion_depth)?,
        ))
    }
}

impl ClaimedUnshieldedSpendsKey {
    pub fn into_inner(&self) -> (TokenType, PublicAddress) {
        (self.0, self.1)
    }

    pub fn from_inner(tt: TokenType, addr: PublicAddress) -> ClaimedUnshieldedSpendsKey {
        ClaimedUnshieldedSpendsKey(tt, addr)
    }
}

impl From<ClaimedUnshieldedSpendsKey> for Value {
    fn from(val: ClaimedUnshieldedSpendsKey) -> Value {
        let v1: Value = val.0.into();
        let v2: Value = val.1.into();
        Value::concat([&v1, &v2])
    }
}

impl TryFrom<&ValueSlice> for ClaimedUnshieldedSpendsKey {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<ClaimedUnshieldedSpendsKey, InvalidBuiltinDecode> {
        if value.0.len() == 6 {
            Ok(ClaimedUnshieldedSpendsKey(
                (&value[0..3]).try_into()?,
                (&value[3..6]).try_into()?,
            ))
        } else {
            Err(InvalidBuiltinDecode("ClaimedUnshieldedSpendsKey"))
        }
    }
}

impl Aligned for ClaimedUnshieldedSpendsKey {
    fn alignment() -> Alignment {
        Alignment::concat([&TokenType::alignment(), &PublicAddress::alignment()])
    }
}

/// The side-effects a transcript declares; the caller must ratify each
/// family against what the enclosing transaction actually does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Effects {
    pub claimed_nullifiers: HashSet<Nullifier>,
    pub claimed_shielded_receives: HashSet<CoinCommitment>,
    pub claimed_shielded_spends: HashSet<CoinCommitment>,
    pub claimed_contract_calls: HashSet<ClaimedContractCallsValue>,
    pub shielded_mints: Map<HashOutput, u64>,
    pub unshielded_mints: Map<HashOutput, u64>,
    pub unshielded_inputs: Map<TokenType, u128>,
    pub unshielded_outputs: Map<TokenType, u128>,
    pub claimed_unshielded_spends: Map<ClaimedUnshieldedSpendsKey, u128>,
}
tag_enforcement_test!(Effects);

serializable_struct!(Effects: "contract-effects[v2]" = "(set,set,set,set,map,map,map,map,map)" {
    claimed_nullifiers,
    claimed_shielded_receives,
    claimed_shielded_spends,
    claimed_contract_calls,
    shielded_mints,
    unshielded_mints,
    unshielded_inputs,
    unshielded_outputs,
    claimed_unshielded_spends,
});

impl<'a> From<&'a Effects> for VmValue {
    fn from(eff: &'a Effects) -> VmValue {
        VmValue::new(
            ValueStrength::Weak,
            StateValue::Array(
                vec![
                    StateValue::Map(
                        eff.claimed_nullifiers
                            .iter()
                            .map(|k| ((*k).into(), StateValue::Null))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.claimed_shielded_receives
                            .iter()
                            .map(|k| ((*k).into(), StateValue::Null))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.claimed_shielded_spends
                            .iter()
                            .map(|k| ((*k).into(), StateValue::Null))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.claimed_contract_calls
                            .iter()
                            .map(|value| (value.clone().into(), StateValue::Null))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.shielded_mints
                            .iter()
                            .map(|(k, v)| ((*k).into(), StateValue::Cell(Sp::new((*v).into()))))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.unshielded_mints
                            .iter()
                            .map(|(k, v)| ((*k).into(), StateValue::Cell(Sp::new((*v).into()))))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.unshielded_inputs
                            .iter()
                            .map(|(k, v)| ((*k).into(), StateValue::Cell(Sp::new((*v).into()))))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.unshielded_outputs
                            .iter()
                            .map(|(k, v)| ((*k).into(), StateValue::Cell(Sp::new((*v).into()))))
                            .collect(),
                    ),
                    StateValue::Map(
                        eff.claimed_unshielded_spends
                            .iter()
                            .map(|(k, v)| {
                                (k.clone().into(), StateValue::Cell(Sp::new((*v).into())))
                            })
                            .collect(),
                    ),
                ]
                .into(),
            ),
        )
    }
}

impl TryFrom<VmValue> for Effects {
    type Error = TranscriptRejected;

    fn try_from(val: VmValue) -> Result<Effects, TranscriptRejected> {
        fn set_from<K>(st: &StateValue) -> Result<HashSet<K>, TranscriptRejected>
        where
            K: Ord + Clone + for<'a> TryFrom<&'a ValueSlice, Error = InvalidBuiltinDecode>,
        {
            if let StateValue::Map(m) = st {
                m.iter()
                    .map(|(k, v)| match v {
                        StateValue::Null => {
                            Ok(K::try_from(&**AsRef::<Value>::as_ref(k))?)
                        }
                        _ => Err(TranscriptRejected::EffectDecodeError),
                    })
                    .collect::<Result<_, _>>()
            } else {
                Err(TranscriptRejected::EffectDecodeError)
            }
        }
        fn map_from<K, V>(st: &StateValue) -> Result<Map<K, V>, TranscriptRejected>
        where
            K: Ord + Clone + for<'a> TryFrom<&'a ValueSlice, Error = InvalidBuiltinDecode>,
            V: Clone + for<'a> TryFrom<&'a ValueSlice, Error = InvalidBuiltinDecode>,
        {
            if let StateValue::Map(m) = st {
                m.iter()
                    .map(|(k, v)| {
                        let v = match v {
                            StateValue::Cell(v) => (&**AsRef::<Value>::as_ref(&**v)).try_into()?,
                            _ => return Err(TranscriptRejected::EffectDecodeError),
                        };
                        Ok((K::try_from(&**AsRef::<Value>::as_ref(k))?, v))
                    })
                    .collect::<Result<_, _>>()
            } else {
                Err(TranscriptRejected::EffectDecodeError)
            }
        }
        if let StateValue::Array(arr) = &val.value {
            if arr.len() == 9 {
                return Ok(Effects {
                    claimed_nullifiers: set_from(arr.get(0).unwrap())?,
                    claimed_shielded_receives: set_from(arr.get(1).unwrap())?,
                    claimed_shielded_spends: set_from(arr.get(2).unwrap())?,
                    claimed_contract_calls: set_from(arr.get(3).unwrap())?,
                    shielded_mints: map_from(arr.get(4).unwrap())?,
                    unshielded_mints: map_from(arr.get(5).unwrap())?,
                    unshielded_inputs: map_from(arr.get(6).unwrap())?,
                    unshielded_outputs: map_from(arr.get(7).unwrap())?,
                    claimed_unshielded_spends: map_from(arr.get(8).unwrap())?,
                });
            }
        }
        Err(TranscriptRejected::EffectDecodeError)
    }
}

/// The state and context a contract query executes against.
#[derive(Clone, Debug)]
pub struct QueryContext {
    pub state: ChargedState,
    pub effects: Effects,
    pub address: ContractAddress,
    pub call_context: CallContext,
}

impl From<&QueryContext> for VmValue {
    fn from(context: &QueryContext) -> VmValue {
        VmValue::new(
            ValueStrength::Weak,
            StateValue::Array(
                vec![
                    StateValue::Cell(Sp::new(context.address.into())),
                    StateValue::Map(
                        context
                            .call_context
                            .com_indices
                            .iter()
                            .map(|(k, v)| ((*k).into(), StateValue::Cell(Sp::new((*v).into()))))
                            .collect(),
                    ),
                    StateValue::Cell(Sp::new(context.call_context.tblock.into())),
                    StateValue::Cell(Sp::new(context.call_context.tblock_err.into())),
                    StateValue::Cell(Sp::new(context.call_context.parent_block_hash.into())),
                    StateValue::Map(
                        context
                            .call_context
                            .balance
                            .iter()
                            .map(|(tt, amount)| {
                                ((*tt).into(), StateValue::Cell(Sp::new((*amount).into())))
                            })
                            .collect(),
                    ),
                    match context.call_context.caller {
                        Some(x) => StateValue::Cell(Sp::new(x.into())),
                        None => StateValue::Null,
                    },
                ]
                .into(),
            ),
        )
    }
}

/// The outcome of a query: the updated context, emitted events, and gas
/// spent.
pub struct QueryResults<M: ResultMode> {
    pub context: QueryContext,
    pub events: Vec<M::Event>,
    pub gas_cost: RunningCost,
}

impl<M: ResultMode> Debug for QueryResults<M>
where
    M::Event: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("QueryResults")
            .field("context", &self.context)
            .field("events", &self.events)
            .field("gas_cost", &self.gas_cost)
            .finish()
    }
}

impl QueryContext {
    pub fn new(state: ChargedState, address: ContractAddress) -> Self {
        QueryContext {
            state,
            address,
            effects: Effects::default(),
            call_context: CallContext::default(),
        }
    }

    /// Qualifies a coin against the commitment indices recorded in this
    /// context.
    pub fn qualify(&self, coin: &CoinInfo) -> Option<QualifiedCoinInfo> {
        self.call_context
            .com_indices
            .get(&coin.commitment(&Recipient::Contract(self.address)))
            .map(|idx| coin.qualify(*idx))
    }

    /// Runs a program against this context, returning the updated context.
    ///
    /// The program must leave exactly the context, effects, and state on the
    /// stack, and the state must be strong (paid for).
    #[instrument(skip(self, query, cost_model))]
    pub fn query<M: ResultMode>(
        &self,
        query: &[Op<M>],
        gas_limit: Option<RunningCost>,
        cost_model: &CostModel,
    ) -> Result<QueryResults<M>, TranscriptRejected> {
        let mut state: Self = (*self).clone();
        let mut res = run_program(&self.to_vm_stack(), query, gas_limit, cost_model)?;
        if res.stack.len() != 3 {
            return Err(TranscriptRejected::FinalStackWrongLength);
        }
        let new_state = match res.stack.pop().unwrap() {
            VmValue {
                strength: ValueStrength::Strong,
                value,
            } => value,
            VmValue {
                strength: ValueStrength::Weak,
                ..
            } => return Err(TranscriptRejected::WeakStateReturned),
        };
        state.effects = res.stack.pop().unwrap().try_into()?;

        let (new_charged_state, state_cost) = state.state.update(new_state, |writes, deletes| {
            RunningCost::compute(
                cost_model.state_update_constant
                    + cost_model.state_update_coeff_bytes * (writes + deletes),
            )
        });
        state.state = new_charged_state;
        let gas_cost = res.gas_cost + state_cost;
        if let Some(gas_limit) = gas_limit {
            if gas_cost > gas_limit {
                return Err(TranscriptRejected::Execution(OnchainProgramError::OutOfGas));
            }
        }

        trace!("transcript application successful");
        Ok(QueryResults {
            context: state,
            events: res.events,
            gas_cost,
        })
    }

    /// The initial VM stack for programs running in this context.
    pub fn to_vm_stack(&self) -> Vec<VmValue> {
        vec![
            self.into(),
            (&self.effects).into(),
            VmValue::new(ValueStrength::Strong, (*self.state.get()).clone()),
        ]
    }

    /// Replays a recorded transcript against this context, under its
    /// declared gas bound.
    #[instrument(skip(self, cost_model))]
    pub fn run_transcript(
        &self,
        transcript: &Transcript,
        cost_model: &CostModel,
    ) -> Result<QueryResults<ResultModeVerify>, TranscriptRejected> {
        self.query(
            &Vec::from(&transcript.program),
            Some(transcript.gas),
            cost_model,
        )
    }
}
