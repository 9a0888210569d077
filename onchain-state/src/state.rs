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

use base_crypto::cost_model::RunningCost;
use base_crypto::fab::{Aligned, AlignedValue, Alignment, AlignmentAtom};
use base_crypto::hash::{persistent_commit, HashOutput};
use base_crypto::repr::MemWrite;
use base_crypto::signatures::VerifyingKey;
use coin_structure::coin::TokenType;
use const_hex::ToHexExt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serialize::{
    serializable_struct, tag_enforcement_test, tagged_deserialize, tagged_serialize,
    tagged_serialized_size, Deserializable, Serializable, Tagged, VecExt,
};
use std::borrow::Borrow;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read, Write};
use std::ops::Deref;
use storage::arena::Sp;
use storage::storage::{Array, Map};
use transient_crypto::curve::Fr;
use transient_crypto::merkle_tree::MerkleTree;
use transient_crypto::proofs::VerifierKey;
use transient_crypto::repr::FieldRepr;

/// The size limit for cells. Currently 32 kiB
pub const CELL_BOUND: usize = 1 << 15;

/// The maximum number of entries in a state array.
pub const ARRAY_BOUND: usize = 15;

/// The maximum height of a bounded Merkle tree in contract state.
pub const BMT_HEIGHT_BOUND: u8 = 32;

/// A value in the typed on-chain state tree.
#[derive(Default, Clone, PartialEq, Eq)]
pub enum StateValue {
    /// The empty value.
    #[default]
    Null,
    /// A single aligned binary value.
    Cell(Sp<AlignedValue>),
    /// An ordered map keyed by encoded values.
    Map(Map<AlignedValue, StateValue>),
    /// A fixed size array, with `0 <= len <= 15`. The upper 5 bits of the
    /// argument to the `new` opcode specify the length at creation time. The
    /// underlying `storage::Array` type is not fixed length, but the VM only
    /// allows size preserving operations.
    Array(Array<StateValue>),
    /// Merkle tree with `0 < height <= 32`.
    BoundedMerkleTree(MerkleTree<()>),
}
tag_enforcement_test!(StateValue);

impl Tagged for StateValue {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("impact-state-value[v2]")
    }
    fn tag_unique_factor() -> String {
        "[(),fab-aligned-value[v1],map,array,merkle-tree[v1](())]".into()
    }
}

impl From<u64> for StateValue {
    fn from(value: u64) -> Self {
        StateValue::Cell(Sp::new(value.into()))
    }
}

impl From<AlignedValue> for StateValue {
    fn from(val: AlignedValue) -> StateValue {
        StateValue::Cell(Sp::new(val))
    }
}

/// Errors constructing state values outside their bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateConstructionError {
    /// Pushing onto a full array.
    ArrayFull,
    /// A cell larger than [`CELL_BOUND`].
    CellBound,
    /// A Merkle tree taller than [`BMT_HEIGHT_BOUND`].
    TreeHeight(u8),
}

impl fmt::Display for StateConstructionError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            StateConstructionError::ArrayFull => {
                write!(f, "Push would cause array to exceed {ARRAY_BOUND} elements")
            }
            StateConstructionError::CellBound => {
                write!(f, "Cell exceeded maximum bound of {CELL_BOUND}")
            }
            StateConstructionError::TreeHeight(h) => {
                write!(f, "Merkle tree height {h} exceeds maximum of {BMT_HEIGHT_BOUND}")
            }
        }
    }
}

impl std::error::Error for StateConstructionError {}

impl StateValue {
    /// Constructs a cell, checking the cell size bound.
    pub fn cell(value: AlignedValue) -> Result<StateValue, StateConstructionError> {
        if Serializable::serialized_size(&value) > CELL_BOUND {
            return Err(StateConstructionError::CellBound);
        }
        Ok(StateValue::Cell(Sp::new(value)))
    }

    /// Constructs a bounded Merkle tree value, checking the height bound and
    /// that the tree is hashed.
    pub fn bounded_merkle_tree(tree: MerkleTree<()>) -> Result<StateValue, StateConstructionError> {
        if tree.height() > BMT_HEIGHT_BOUND {
            return Err(StateConstructionError::TreeHeight(tree.height()));
        }
        Ok(StateValue::BoundedMerkleTree(tree.rehash()))
    }

    /// Appends to an array value; fails on non-arrays, and on arrays already
    /// at the 15-element bound.
    pub fn array_push(&self, value: StateValue) -> Result<StateValue, StateConstructionError> {
        match self {
            StateValue::Array(arr) if arr.len() >= ARRAY_BOUND => {
                Err(StateConstructionError::ArrayFull)
            }
            StateValue::Array(arr) => Ok(StateValue::Array(arr.push(value))),
            _ => Err(StateConstructionError::ArrayFull),
        }
    }

    fn invariant(&self) -> io::Result<()> {
        let err = |msg: String| Err(io::Error::new(io::ErrorKind::InvalidData, msg));
        match self {
            StateValue::Null | StateValue::Map(_) => {}
            StateValue::Cell(v) => {
                if Serializable::serialized_size(&**v) > CELL_BOUND {
                    return err(format!("Cell exceeded maximum bound of {CELL_BOUND}"));
                }
            }
            StateValue::Array(arr) => {
                if arr.len() > ARRAY_BOUND {
                    return err(format!("Array exceeded maximum length of {ARRAY_BOUND}"));
                }
            }
            StateValue::BoundedMerkleTree(bmt) => {
                if bmt.height() > BMT_HEIGHT_BOUND {
                    return err(format!("BMT exceeded maximum height of {BMT_HEIGHT_BOUND}"));
                }
                if bmt.root().is_none() {
                    return err("BMT must be rehashed".into());
                }
            }
        }
        Ok(())
    }

    /// The log2 order of magnitude of this value, as used by the gas model.
    pub fn log_size(&self) -> usize {
        use StateValue::*;
        match self {
            Null => 0,
            Cell(a) => Serializable::serialized_size(&**a)
                .next_power_of_two()
                .ilog2() as usize,
            Map(m) => (m.size() as u128).next_power_of_two().ilog2() as usize,
            Array(a) => (a.len() as u128).next_power_of_two().ilog2() as usize,
            BoundedMerkleTree(t) => t.height() as usize,
        }
    }
}

impl FieldRepr for StateValue {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        use transient_crypto::fab::AlignedValueExt;
        use StateValue::*;
        match self {
            Null => writer.write(&[Fr::from(0u64)]),
            Cell(v) => {
                writer.write(&[Fr::from(1u64)]);
                v.value_only_field_repr(writer);
            }
            Map(m) => {
                writer.write(&[Fr::from(2u128 | ((m.size() as u128) << 4))]);
                for (k, v) in m.iter() {
                    k.value_only_field_repr(writer);
                    v.field_repr(writer);
                }
            }
            Array(arr) => {
                writer.write(&[Fr::from(3u64 | ((arr.len() as u64) << 4))]);
                for elem in arr.iter() {
                    elem.field_repr(writer);
                }
            }
            BoundedMerkleTree(t) => {
                let entries = t.iter().collect::<Vec<_>>();
                writer.write(&[Fr::from(
                    4u128 | ((t.height() as u128) << 4) | ((entries.len() as u128) << 12),
                )]);
                for (idx, hash) in entries.into_iter() {
                    idx.field_repr(writer);
                    hash.0.field_repr(writer);
                }
            }
        }
    }

    fn field_size(&self) -> usize {
        use transient_crypto::fab::AlignedValueExt;
        use StateValue::*;
        match self {
            Null => 1,
            Cell(v) => 1 + v.value_only_field_size(),
            Map(m) => {
                1 + m
                    .iter()
                    .map(|(k, v)| k.value_only_field_size() + v.field_size())
                    .sum::<usize>()
            }
            Array(arr) => 1 + arr.iter().map(|s| s.field_size()).sum::<usize>(),
            BoundedMerkleTree(t) => {
                1 + t
                    .iter()
                    .map(|(_, hash)| 1 + FieldRepr::field_size(&hash.0))
                    .sum::<usize>()
            }
        }
    }
}

const STATE_NULL: u8 = 0;
const STATE_CELL: u8 = 1;
const STATE_MAP: u8 = 2;
const STATE_ARRAY: u8 = 3;
const STATE_BMT: u8 = 4;

impl Serializable for StateValue {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            StateValue::Null => STATE_NULL.serialize(writer),
            StateValue::Cell(v) => {
                STATE_CELL.serialize(writer)?;
                v.serialize(writer)
            }
            StateValue::Map(m) => {
                STATE_MAP.serialize(writer)?;
                m.serialize(writer)
            }
            StateValue::Array(arr) => {
                STATE_ARRAY.serialize(writer)?;
                arr.serialize(writer)
            }
            StateValue::BoundedMerkleTree(t) => {
                STATE_BMT.serialize(writer)?;
                t.serialize(writer)
            }
        }
    }

    fn serialized_size(&self) -> usize {
        1 + match self {
            StateValue::Null => 0,
            StateValue::Cell(v) => v.serialized_size(),
            StateValue::Map(m) => m.serialized_size(),
            StateValue::Array(arr) => arr.serialized_size(),
            StateValue::BoundedMerkleTree(t) => t.serialized_size(),
        }
    }
}

impl Deserializable for StateValue {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let res = match u8::deserialize(reader, recursion_depth)? {
            STATE_NULL => StateValue::Null,
            STATE_CELL => StateValue::Cell(Sp::deserialize(reader, recursion_depth)?),
            STATE_MAP => StateValue::Map(Map::deserialize(reader, recursion_depth)?),
            STATE_ARRAY => StateValue::Array(Array::deserialize(reader, recursion_depth)?),
            STATE_BMT => {
                StateValue::BoundedMerkleTree(MerkleTree::deserialize(reader, recursion_depth)?)
            }
            disc => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown state value discriminant {disc}"),
                ))
            }
        };
        res.invariant()?;
        Ok(res)
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        match self {
            StateValue::Null => {
                let mut ser = ser.serialize_struct("StateValue", 1)?;
                ser.serialize_field("tag", "null")?;
                ser.end()
            }
            StateValue::Cell(val) => {
                let mut ser = ser.serialize_struct("StateValue", 2)?;
                ser.serialize_field("tag", "cell")?;
                ser.serialize_field("content", &**val)?;
                ser.end()
            }
            StateValue::Map(val) => {
                let mut ser = ser.serialize_struct("StateValue", 2)?;
                ser.serialize_field("tag", "map")?;
                ser.serialize_field("content", val)?;
                ser.end()
            }
            StateValue::Array(val) => {
                let mut ser = ser.serialize_struct("StateValue", 2)?;
                ser.serialize_field("tag", "array")?;
                ser.serialize_field("content", val)?;
                ser.end()
            }
            StateValue::BoundedMerkleTree(val) => {
                let mut ser = ser.serialize_struct("StateValue", 2)?;
                ser.serialize_field("tag", "boundedMerkleTree")?;
                // Trees serialize by their leaves for JSON consumers.
                ser.serialize_field(
                    "content",
                    &val.iter()
                        .map(|(idx, hash)| (idx, hash.0.encode_hex()))
                        .collect::<Vec<_>>(),
                )?;
                ser.end()
            }
        }
    }
}

/// Builds a [`StateValue`] from a terse literal syntax:
///
/// ```ignore
/// stval!({ 1u64 => [(2u64), null] })
/// ```
#[macro_export]
macro_rules! stval {
    (null) => {
        $crate::state::StateValue::Null
    };
    (($val:expr)) => {
        $crate::state::StateValue::Cell(storage::arena::Sp::new($val.into()))
    };
    ({MT($height:expr) {$($key:expr => $val:expr),*}}) => {
        $crate::state::StateValue::BoundedMerkleTree(
            transient_crypto::merkle_tree::MerkleTree::blank($height)
                $(.update_hash($key, $val, ()))*
                .rehash()
        )
    };
    ({$($key:expr => $val:tt),*}) => {
        $crate::state::StateValue::Map(
            storage::storage::Map::new()$(.insert($key.into(), stval!($val)))*
        )
    };
    ({$key:expr => $val:tt}; $n:expr) => {
        $crate::state::StateValue::Map(
            (0..$n).map(|x| {
                (base_crypto::fab::AlignedValue::from($key + x as u32), stval!($val))
            }).collect()
        )
    };
    ([$($val:tt),*]) => {
        $crate::state::StateValue::Array(vec![$(stval!($val)),*].into())
    };
    ([$elem:tt; $n:expr]) => {
        $crate::state::StateValue::Array(vec![stval!($elem); $n].into())
    };
}

pub use stval;

impl Debug for StateValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        use StateValue::*;
        match self {
            Null => write!(formatter, "null"),
            Cell(v) => write!(formatter, "{v:?}"),
            Map(m) => {
                write!(formatter, "Map ")?;
                formatter.debug_map().entries(m.iter()).finish()
            }
            Array(arr) => {
                write!(formatter, "Array({}) ", arr.len())?;
                formatter.debug_list().entries(arr.iter()).finish()
            }
            BoundedMerkleTree(t) => {
                write!(formatter, "MerkleTree({}) ", t.height())?;
                formatter.debug_map().entries(t.iter()).finish()
            }
        }
    }
}

/// The name of a contract operation.
pub type EntryPoint<'a> = &'a [u8];

/// An owned contract operation name; a short byte string, usually printable.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryPointBuf(pub Vec<u8>);
tag_enforcement_test!(EntryPointBuf);

impl Tagged for EntryPointBuf {
    fn tag() -> std::borrow::Cow<'static, str> {
        "entry-point".into()
    }
    fn tag_unique_factor() -> String {
        "vec(u8)".into()
    }
}

impl Serializable for EntryPointBuf {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.0.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.0.serialized_size()
    }
}

impl Deserializable for EntryPointBuf {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        Ok(EntryPointBuf(Vec::deserialize(reader, recursion_depth)?))
    }
}

fn maybe_str(buf: &[u8]) -> Option<&str> {
    std::str::from_utf8(buf)
        .ok()
        .filter(|s| s.chars().all(|c| !c.is_control()))
}

impl Serialize for EntryPointBuf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match maybe_str(&self.0) {
            Some(s) => serializer.serialize_str(s),
            None => serializer.serialize_bytes(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for EntryPointBuf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = EntryPointBuf;
            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("[byte]string")
            }
            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(EntryPointBuf(v.as_bytes().to_vec()))
            }
            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(EntryPointBuf(v.to_vec()))
            }
        }
        deserializer.deserialize_any(V)
    }
}

impl Debug for EntryPointBuf {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match maybe_str(&self.0) {
            Some(s) => formatter.write_str(s),
            None => formatter.write_str(&self.0.encode_hex::<String>()),
        }
    }
}

impl Deref for EntryPointBuf {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for EntryPointBuf {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EntryPointBuf {
    fn from(vec: Vec<u8>) -> EntryPointBuf {
        EntryPointBuf(vec)
    }
}

impl From<&[u8]> for EntryPointBuf {
    fn from(e: &[u8]) -> EntryPointBuf {
        EntryPointBuf(e.to_owned())
    }
}

impl rand::distributions::Distribution<EntryPointBuf> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> EntryPointBuf {
        let length = rng.gen_range(0..10);
        EntryPointBuf((0..length).map(|_| rng.r#gen::<u8>()).collect())
    }
}

impl EntryPointBuf {
    /// A short domain-separated hash of this entry point name.
    pub fn ep_hash(&self) -> HashOutput {
        persistent_commit(
            &self[..],
            HashOutput(*b"midnight:entry-point\0\0\0\0\0\0\0\0\0\0\0\0"),
        )
    }
}

impl Aligned for EntryPointBuf {
    fn alignment() -> Alignment {
        Alignment::singleton(AlignmentAtom::Compress)
    }
}

/// The authority allowed to maintain a contract: a signing committee and the
/// threshold of it required to authorize an update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMaintenanceAuthority {
    /// The keys allowed to authorize updates.
    pub committee: Vec<VerifyingKey>,
    /// How many committee signatures an update requires.
    pub threshold: u32,
    /// A replay-protection counter; updates must quote the current value.
    pub counter: u32,
}
tag_enforcement_test!(ContractMaintenanceAuthority);

serializable_struct!(ContractMaintenanceAuthority: "contract-maintenance-authority[v1]" = "(vec(signature-verifying-key[v1]),u32,u32)" {
    committee, threshold, counter,
});

impl ContractMaintenanceAuthority {
    /// An empty authority with threshold one: effectively unmaintainable.
    pub fn new() -> Self {
        ContractMaintenanceAuthority {
            committee: vec![],
            threshold: 1,
            counter: 0,
        }
    }
}

impl Default for ContractMaintenanceAuthority {
    fn default() -> Self {
        Self::new()
    }
}

/// The record kept for each deployed contract.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    /// The contract's storage tree, with its storage charge cache.
    pub data: ChargedState,
    /// The contract's named operations and their verifier keys.
    pub operations: Map<EntryPointBuf, ContractOperation>,
    /// Who may maintain the contract.
    pub maintenance_authority: ContractMaintenanceAuthority,
    /// Tokens held directly by the contract.
    pub balance: Map<TokenType, u128>,
}
tag_enforcement_test!(ContractState);

serializable_struct!(ContractState: "contract-state[v4]" = "(charged-state[v1],map(entry-point,contract-operation[v2]),contract-maintenance-authority[v1],map(token-type[v1],u128))" {
    data, operations, maintenance_authority, balance,
});

impl ContractState {
    /// Creates a contract record from its parts, with an empty balance.
    pub fn new(
        data: StateValue,
        operations: Map<EntryPointBuf, ContractOperation>,
        maintenance_authority: ContractMaintenanceAuthority,
    ) -> Self {
        ContractState {
            data: ChargedState::new(data),
            operations,
            maintenance_authority,
            balance: Map::new(),
        }
    }
}

impl Debug for ContractState {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "ContractState (")?;
        self.data.get_ref().fmt(formatter)?;
        self.operations.fmt(formatter)?;
        write!(formatter, "ContractState )")?;
        Ok(())
    }
}

impl Default for ContractState {
    fn default() -> Self {
        Self::new(
            StateValue::Null,
            Map::new(),
            ContractMaintenanceAuthority::default(),
        )
    }
}

/// A [`StateValue`] wrapped with its cached storage-size charge.
///
/// The charge is maintained on [`update`](ChargedState::update), so the
/// byte-delta of a contract call can be priced without re-walking the whole
/// tree.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargedState {
    state: Sp<StateValue>,
    charged_size: u64,
}
tag_enforcement_test!(ChargedState);

serializable_struct!(ChargedState: "charged-state[v1]" = "(impact-state-value[v2],u64)" {
    state, charged_size,
});

impl Debug for ChargedState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.state.fmt(f)
    }
}

impl ChargedState {
    /// Creates a new charged state from a given state value. This assumes
    /// that this state's storage is paid for elsewhere (for contract
    /// deployments this happens with a manual `tree_copy` costing of the
    /// deploy action).
    pub fn new(state: StateValue) -> Self {
        let charged_size = Serializable::serialized_size(&state) as u64;
        ChargedState {
            state: Sp::new(state),
            charged_size,
        }
    }

    /// The wrapped state, shared.
    pub fn get(&self) -> Sp<StateValue> {
        self.state.clone()
    }

    /// The wrapped state, borrowed.
    pub fn get_ref(&self) -> &StateValue {
        &self.state
    }

    /// The cached size charge of the wrapped state.
    pub fn charged_size(&self) -> u64 {
        self.charged_size
    }

    /// Swaps in a new state, returning the storage cost of the transition:
    /// grown bytes count as writes, shrunk bytes as deletions, plus the
    /// caller-supplied compute cost of the delta accounting itself.
    pub fn update(
        &self,
        new_state: StateValue,
        cpu_cost: impl Fn(u64, u64) -> RunningCost,
    ) -> (Self, RunningCost) {
        let new_size = Serializable::serialized_size(&new_state) as u64;
        let (writes, deletes) = if new_size >= self.charged_size {
            (new_size - self.charged_size, 0)
        } else {
            (0, self.charged_size - new_size)
        };
        let cost = RunningCost {
            bytes_written: writes,
            bytes_deleted: deletes,
            ..RunningCost::ZERO
        } + cpu_cost(writes, deletes);
        (
            ChargedState {
                state: Sp::new(new_state),
                charged_size: new_size,
            },
            cost,
        )
    }
}

/// A named operation of a contract: its (versioned) verifier key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[non_exhaustive]
pub struct ContractOperation {
    /// The latest verifier key, if one is set.
    pub v2: Option<VerifierKey>,
}
tag_enforcement_test!(ContractOperation);

impl Tagged for ContractOperation {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("contract-operation[v2]")
    }
    fn tag_unique_factor() -> String {
        "option(verifier-key[v4])".into()
    }
}

impl Serializable for ContractOperation {
    // The verifier key is embedded with its `midnight:verifier-key[v4]:`
    // header, so key blobs remain self-describing when extracted.
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        match &self.v2 {
            None => 0u8.serialize(writer),
            Some(vk) => {
                1u8.serialize(writer)?;
                let mut blob = Vec::with_bounded_capacity(tagged_serialized_size(vk));
                tagged_serialize(vk, &mut blob)?;
                (blob.len() as u32).serialize(writer)?;
                writer.write_all(&blob)
            }
        }
    }

    fn serialized_size(&self) -> usize {
        match &self.v2 {
            None => 1,
            Some(vk) => {
                let blob_len = tagged_serialized_size(vk);
                1 + (blob_len as u32).serialized_size() + blob_len
            }
        }
    }
}

impl Deserializable for ContractOperation {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        match u8::deserialize(reader, recursion_depth)? {
            0 => Ok(ContractOperation { v2: None }),
            1 => {
                let len = u32::deserialize(reader, recursion_depth)?;
                let blob = serialize::ReadExt::read_exact_to_vec(reader, len as usize)?;
                let vk: VerifierKey = tagged_deserialize(&blob[..])?;
                Ok(ContractOperation { v2: Some(vk) })
            }
            disc => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid discriminant: {}.", disc),
            )),
        }
    }
}

impl ContractOperation {
    /// Wraps a verifier key as an operation.
    pub fn new(vk: Option<VerifierKey>) -> Self {
        ContractOperation { v2: vk }
    }

    /// The latest verifier key, if present.
    pub fn latest(&self) -> Option<&VerifierKey> {
        self.v2.as_ref()
    }

    /// Mutable access to the latest verifier key slot.
    pub fn latest_mut(&mut self) -> &mut Option<VerifierKey> {
        &mut self.v2
    }
}

impl Debug for ContractOperation {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "<verifier key>")
    }
}

impl rand::distributions::Distribution<ContractOperation> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> ContractOperation {
        let some: bool = rng.r#gen();
        if some {
            ContractOperation {
                v2: Some(rng.r#gen()),
            }
        } else {
            ContractOperation { v2: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transient_crypto::proofs::KeyLocation;

    fn test_ser<T: Serializable + Deserializable + Eq + Debug>(val: T) {
        let mut bytes = Vec::new();
        T::serialize(&val, &mut bytes).unwrap();
        assert_eq!(bytes.len(), T::serialized_size(&val));
        let mut b = bytes.as_slice();
        let copy = T::deserialize(&mut b, 0).unwrap();
        assert!(b.is_empty());
        assert_eq!(val, copy);
    }

    #[test]
    fn state_values_roundtrip() {
        test_ser(ContractState::default());
        test_ser(stval!((512u64)));
        test_ser(stval!({ AlignedValue::from(512u64) => (12u64) }));
        test_ser(stval!([(512u64)]));
        test_ser(stval!(null));
        test_ser(stval!({MT(12) {}}));
    }

    #[test]
    fn array_push_enforces_bound() {
        let mut arr = StateValue::Array(Array::new());
        for _ in 0..ARRAY_BOUND {
            arr = arr.array_push(StateValue::Null).unwrap();
        }
        let err = arr.array_push(StateValue::Null).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Push would cause array to exceed 15 elements"
        );
    }

    #[test]
    fn oversized_arrays_fail_deserialization() {
        let arr = StateValue::Array((0..16).map(|_| StateValue::Null).collect::<Vec<_>>().into());
        let mut bytes = Vec::new();
        arr.serialize(&mut bytes).unwrap();
        assert!(StateValue::deserialize(&mut &bytes[..], 0).is_err());
    }

    #[test]
    fn verifier_keys_carry_their_header() {
        let vk = VerifierKey::for_circuit(&KeyLocation(std::borrow::Cow::Borrowed("count")));
        let op = ContractOperation::new(Some(vk));
        let mut bytes = Vec::new();
        op.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), op.serialized_size());
        let header = b"midnight:verifier-key[v4]:";
        assert!(bytes
            .windows(header.len())
            .any(|window| window == &header[..]));
        // Corrupting the embedded header is caught with the expected error.
        let pos = bytes
            .windows(header.len())
            .position(|window| window == &header[..])
            .unwrap();
        bytes[pos] ^= 0xff;
        let err = ContractOperation::deserialize(&mut &bytes[..], 0).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("expected header tag 'midnight:verifier-key"));
        test_ser(ContractOperation::new(None));
    }

    #[test]
    fn charged_state_tracks_size_deltas() {
        let charged = ChargedState::new(StateValue::Null);
        let (bigger, cost) = charged.update(stval!((7u64)), |_, _| RunningCost::ZERO);
        assert!(cost.bytes_written > 0);
        assert_eq!(cost.bytes_deleted, 0);
        let (_, cost2) = bigger.update(StateValue::Null, |_, _| RunningCost::ZERO);
        assert_eq!(cost2.bytes_written, 0);
        assert!(cost2.bytes_deleted > 0);
    }

    #[test]
    fn log_size_matches_orders_of_magnitude() {
        assert_eq!(stval!(null).log_size(), 0);
        assert_eq!(stval!((0u8)).log_size(), 1);
        assert_eq!(stval!([(1u32); 3]).log_size(), 2);
        assert_eq!(stval!([(1u32); 8]).log_size(), 3);
        for h in 0..16u8 {
            assert_eq!(stval!({MT(h) {}}).log_size(), h as usize);
        }
    }
}
