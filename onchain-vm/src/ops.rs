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

use crate::result_mode::{ResultMode, ResultModeVerify};
use base_crypto::fab::AlignedValue;
use base_crypto::repr::MemWrite;
use runtime_state::state::StateValue;
use serde::Serialize;
use serialize::{tag_enforcement_test, Deserializable, Serializable, Tagged};
use std::fmt::Debug;
use std::io::{self, Read, Write};
use storage::storage::Array;
use transient_crypto::curve::Fr;
use transient_crypto::repr::FieldRepr;

/// A single step in an [`Op::Idx`] path: either a literal key, or one taken
/// from the stack at runtime.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum Key {
    /// A literal key.
    Value(AlignedValue),
    /// A key popped from the stack.
    Stack,
}
tag_enforcement_test!(Key);

impl Tagged for Key {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("impact-idx-key")
    }
    fn tag_unique_factor() -> String {
        "[fab-aligned-value[v1],()]".into()
    }
}

impl Serializable for Key {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Key::Value(v) => {
                0u8.serialize(writer)?;
                v.serialize(writer)
            }
            Key::Stack => 1u8.serialize(writer),
        }
    }
    fn serialized_size(&self) -> usize {
        match self {
            Key::Value(v) => 1 + v.serialized_size(),
            Key::Stack => 1,
        }
    }
}

impl Deserializable for Key {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        match u8::deserialize(reader, recursion_depth)? {
            0 => Ok(Key::Value(AlignedValue::deserialize(
                reader,
                recursion_depth,
            )?)),
            1 => Ok(Key::Stack),
            disc => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid discriminant: {}.", disc),
            )),
        }
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Value(v) => v.fmt(f),
            Key::Stack => write!(f, "STK"),
        }
    }
}

impl TryFrom<Key> for AlignedValue {
    type Error = ();
    fn try_from(value: Key) -> Result<Self, Self::Error> {
        match value {
            Key::Value(v) => Ok(v),
            Key::Stack => Err(()),
        }
    }
}

impl FieldRepr for Key {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        use transient_crypto::fab::AlignedValueExt;
        match self {
            Key::Stack => writer.write(&[Fr::from(-1)]),
            Key::Value(v) => v.value_only_field_repr(writer),
        }
    }

    fn field_size(&self) -> usize {
        use transient_crypto::fab::AlignedValueExt;
        match self {
            Key::Stack => 1,
            Key::Value(v) => v.value_only_field_size(),
        }
    }
}

/// A VM operation.
///
/// The `M` parameter determines whether `popeq` results are annotated
/// ([`ResultModeVerify`]) or blank templates
/// ([`ResultModeGather`](crate::result_mode::ResultModeGather)).
#[non_exhaustive]
#[derive(Clone, PartialEq, Eq)]
pub enum Op<M: ResultMode> {
    Noop { n: u32 },
    Lt,
    Eq,
    Type,
    Size,
    New,
    And,
    Or,
    Neg,
    Log,
    Root,
    Pop,
    Popeq { cached: bool, result: M::ReadResult },
    Addi { immediate: u32 },
    Subi { immediate: u32 },
    Push { storage: bool, value: StateValue },
    Branch { skip: u32 },
    Jmp { skip: u32 },
    Add,
    Sub,
    Concat { cached: bool, n: u32 },
    Member,
    Rem { cached: bool },
    Dup { n: u8 },
    Swap { n: u8 },
    Idx { cached: bool, push_path: bool, path: Array<Key> },
    Ins { cached: bool, n: u8 },
    Ckpt,
}
tag_enforcement_test!(Op<ResultModeVerify>);

impl<M: ResultMode> Tagged for Op<M> {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("impact-op[v1]")
    }
    fn tag_unique_factor() -> String {
        "impact-op[v1]".into()
    }
}

const OP_NOOP: u8 = 0x00;
const OP_LT: u8 = 0x01;
const OP_EQ: u8 = 0x02;
const OP_TYPE: u8 = 0x03;
const OP_SIZE: u8 = 0x04;
const OP_NEW: u8 = 0x05;
const OP_AND: u8 = 0x06;
const OP_OR: u8 = 0x07;
const OP_NEG: u8 = 0x08;
const OP_LOG: u8 = 0x09;
const OP_ROOT: u8 = 0x0a;
const OP_POP: u8 = 0x0b;
const OP_POPEQ: u8 = 0x0c;
const OP_POPEQC: u8 = 0x0d;
const OP_ADDI: u8 = 0x0e;
const OP_SUBI: u8 = 0x0f;
const OP_PUSH: u8 = 0x10;
const OP_PUSHS: u8 = 0x11;
const OP_BRANCH: u8 = 0x12;
const OP_JMP: u8 = 0x13;
const OP_ADD: u8 = 0x14;
const OP_SUB: u8 = 0x15;
const OP_CONCAT: u8 = 0x16;
const OP_CONCATC: u8 = 0x17;
const OP_MEMBER: u8 = 0x18;
const OP_REM: u8 = 0x19;
const OP_REMC: u8 = 0x1a;
const OP_DUP: u8 = 0x1b;
const OP_SWAP: u8 = 0x1c;
const OP_IDX: u8 = 0x1d;
const OP_IDXC: u8 = 0x1e;
const OP_IDXP: u8 = 0x1f;
const OP_IDXPC: u8 = 0x20;
const OP_INS: u8 = 0x21;
const OP_INSC: u8 = 0x22;
const OP_CKPT: u8 = 0xff;

impl<M: ResultMode> Serializable for Op<M> {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        use Op::*;
        match self {
            Noop { n } => {
                OP_NOOP.serialize(writer)?;
                n.serialize(writer)
            }
            Lt => OP_LT.serialize(writer),
            Eq => OP_EQ.serialize(writer),
            Type => OP_TYPE.serialize(writer),
            Size => OP_SIZE.serialize(writer),
            New => OP_NEW.serialize(writer),
            And => OP_AND.serialize(writer),
            Or => OP_OR.serialize(writer),
            Neg => OP_NEG.serialize(writer),
            Log => OP_LOG.serialize(writer),
            Root => OP_ROOT.serialize(writer),
            Pop => OP_POP.serialize(writer),
            Popeq { cached, result } => {
                if *cached { OP_POPEQC } else { OP_POPEQ }.serialize(writer)?;
                result.serialize(writer)
            }
            Addi { immediate } => {
                OP_ADDI.serialize(writer)?;
                immediate.serialize(writer)
            }
            Subi { immediate } => {
                OP_SUBI.serialize(writer)?;
                immediate.serialize(writer)
            }
            Push { storage, value } => {
                if *storage { OP_PUSHS } else { OP_PUSH }.serialize(writer)?;
                value.serialize(writer)
            }
            Branch { skip } => {
                OP_BRANCH.serialize(writer)?;
                skip.serialize(writer)
            }
            Jmp { skip } => {
                OP_JMP.serialize(writer)?;
                skip.serialize(writer)
            }
            Add => OP_ADD.serialize(writer),
            Sub => OP_SUB.serialize(writer),
            Concat { cached, n } => {
                if *cached { OP_CONCATC } else { OP_CONCAT }.serialize(writer)?;
                n.serialize(writer)
            }
            Member => OP_MEMBER.serialize(writer),
            Rem { cached } => if *cached { OP_REMC } else { OP_REM }.serialize(writer),
            Dup { n } => {
                OP_DUP.serialize(writer)?;
                n.serialize(writer)
            }
            Swap { n } => {
                OP_SWAP.serialize(writer)?;
                n.serialize(writer)
            }
            Idx {
                cached,
                push_path,
                path,
            } => {
                match (*cached, *push_path) {
                    (false, false) => OP_IDX,
                    (true, false) => OP_IDXC,
                    (false, true) => OP_IDXP,
                    (true, true) => OP_IDXPC,
                }
                .serialize(writer)?;
                path.serialize(writer)
            }
            Ins { cached, n } => {
                if *cached { OP_INSC } else { OP_INS }.serialize(writer)?;
                n.serialize(writer)
            }
            Ckpt => OP_CKPT.serialize(writer),
        }
    }

    fn serialized_size(&self) -> usize {
        use Op::*;
        1 + match self {
            Noop { n } => n.serialized_size(),
            Popeq { result, .. } => result.serialized_size(),
            Addi { immediate } | Subi { immediate } => immediate.serialized_size(),
            Push { value, .. } => value.serialized_size(),
            Branch { skip } | Jmp { skip } => skip.serialized_size(),
            Concat { n, .. } => n.serialized_size(),
            Dup { n } | Swap { n } | Ins { n, .. } => n.serialized_size(),
            Idx { path, .. } => path.serialized_size(),
            _ => 0,
        }
    }
}

impl<M: ResultMode> Deserializable for Op<M> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        use Op::*;
        Ok(match u8::deserialize(reader, recursion_depth)? {
            OP_NOOP => Noop {
                n: u32::deserialize(reader, recursion_depth)?,
            },
            OP_LT => Lt,
            OP_EQ => Eq,
            OP_TYPE => Type,
            OP_SIZE => Size,
            OP_NEW => New,
            OP_AND => And,
            OP_OR => Or,
            OP_NEG => Neg,
            OP_LOG => Log,
            OP_ROOT => Root,
            OP_POP => Pop,
            disc @ (OP_POPEQ | OP_POPEQC) => Popeq {
                cached: disc == OP_POPEQC,
                result: M::ReadResult::deserialize(reader, recursion_depth)?,
            },
            OP_ADDI => Addi {
                immediate: u32::deserialize(reader, recursion_depth)?,
            },
            OP_SUBI => Subi {
                immediate: u32::deserialize(reader, recursion_depth)?,
            },
            disc @ (OP_PUSH | OP_PUSHS) => Push {
                storage: disc == OP_PUSHS,
                value: StateValue::deserialize(reader, recursion_depth)?,
            },
            OP_BRANCH => Branch {
                skip: u32::deserialize(reader, recursion_depth)?,
            },
            OP_JMP => Jmp {
                skip: u32::deserialize(reader, recursion_depth)?,
            },
            OP_ADD => Add,
            OP_SUB => Sub,
            disc @ (OP_CONCAT | OP_CONCATC) => Concat {
                cached: disc == OP_CONCATC,
                n: u32::deserialize(reader, recursion_depth)?,
            },
            OP_MEMBER => Member,
            disc @ (OP_REM | OP_REMC) => Rem {
                cached: disc == OP_REMC,
            },
            OP_DUP => Dup {
                n: u8::deserialize(reader, recursion_depth)?,
            },
            OP_SWAP => Swap {
                n: u8::deserialize(reader, recursion_depth)?,
            },
            disc @ (OP_IDX | OP_IDXC | OP_IDXP | OP_IDXPC) => Idx {
                cached: disc == OP_IDXC || disc == OP_IDXPC,
                push_path: disc == OP_IDXP || disc == OP_IDXPC,
                path: Array::deserialize(reader, recursion_depth)?,
            },
            disc @ (OP_INS | OP_INSC) => Ins {
                cached: disc == OP_INSC,
                n: u8::deserialize(reader, recursion_depth)?,
            },
            OP_CKPT => Ckpt,
            disc => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown opcode {disc:#x}"),
                ))
            }
        })
    }
}

/// Builds an [`Op::Idx`] path key.
#[macro_export]
macro_rules! key {
    (stack) => {
        $crate::ops::Key::Stack
    };
    ($val:expr) => {
        $crate::ops::Key::Value($val.into())
    };
}

/// Builds a single [`Op`] from assembler-style syntax.
#[macro_export]
macro_rules! op {
    (noop $val:expr) => { $crate::ops::Op::Noop { n: $val } };
    (lt) => { $crate::ops::Op::Lt };
    (eq) => { $crate::ops::Op::Eq };
    (type) => { $crate::ops::Op::Type };
    (size) => { $crate::ops::Op::Size };
    (new) => { $crate::ops::Op::New };
    (and) => { $crate::ops::Op::And };
    (or) => { $crate::ops::Op::Or };
    (neg) => { $crate::ops::Op::Neg };
    (log) => { $crate::ops::Op::Log };
    (root) => { $crate::ops::Op::Root };
    (pop) => { $crate::ops::Op::Pop };
    (popeq $res:expr) => { $crate::ops::Op::Popeq { cached: false, result: $res } };
    (popeqc $res:expr) => { $crate::ops::Op::Popeq { cached: true, result: $res } };
    (addi $imm:expr) => { $crate::ops::Op::Addi { immediate: $imm } };
    (subi $imm:expr) => { $crate::ops::Op::Subi { immediate: $imm } };
    (push $val:tt) => { $crate::ops::Op::Push { storage: false, value: runtime_state::stval! $val } };
    (pushs $val:tt) => { $crate::ops::Op::Push { storage: true, value: runtime_state::stval! $val } };
    (branch $skip:expr) => { $crate::ops::Op::Branch { skip: $skip } };
    (jmp $skip:expr) => { $crate::ops::Op::Jmp { skip: $skip } };
    (add) => { $crate::ops::Op::Add };
    (sub) => { $crate::ops::Op::Sub };
    (concat $n:expr) => { $crate::ops::Op::Concat { cached: false, n: $n } };
    (concatc $n:expr) => { $crate::ops::Op::Concat { cached: true, n: $n } };
    (member) => { $crate::ops::Op::Member };
    (rem) => { $crate::ops::Op::Rem { cached: false } };
    (remc) => { $crate::ops::Op::Rem { cached: true } };
    (dup $n:expr) => { $crate::ops::Op::Dup { n: $n } };
    (swap $n:expr) => { $crate::ops::Op::Swap { n: $n } };
    (idx [$($key:tt),*]) => { $crate::ops::Op::Idx { cached: false, push_path: false, path: vec![$($crate::key!($key)),*].into() }};
    (idxc [$($key:tt),*]) => { $crate::ops::Op::Idx { cached: true, push_path: false, path: vec![$($crate::key!($key)),*].into() }};
    (idxp [$($key:tt),*]) => { $crate::ops::Op::Idx { cached: false, push_path: true, path: vec![$($crate::key!($key)),*].into() }};
    (idxpc [$($key:tt),*]) => { $crate::ops::Op::Idx { cached: true, push_path: true, path: vec![$($crate::key!($key)),*].into() }};
    (ins $n:expr) => { $crate::ops::Op::Ins { cached: false, n: $n } };
    (insc $n:expr) => { $crate::ops::Op::Ins { cached: true, n: $n } };
    (ckpt) => { $crate::ops::Op::Ckpt };
}

#[doc(hidden)]
#[macro_export]
macro_rules! ops_int {
    [] => { std::iter::empty() };
    [;] => { std::iter::empty() };
    [$op0:tt ; $($ops:tt)*] => { std::iter::once($crate::op!($op0)).chain($crate::ops_int!($($ops)*)) };
    [$op0:tt $op1:tt ; $($ops:tt)*] => { std::iter::once($crate::op!($op0 $op1)).chain($crate::ops_int!($($ops)*)) };
    [$op0:tt $op1:tt $op2:tt ; $($ops:tt)*] => { std::iter::once($crate::op!($op0 $op1 $op2)).chain($crate::ops_int!($($ops)*)) };
    [$($ops:tt)*] => { std::iter::once($crate::op!($($ops)*)) };
}

/// Builds a program from `;`-separated assembler-style ops.
#[macro_export]
macro_rules! ops {
    [$($tts:tt)*] => { $crate::ops_int!($($tts)*).collect::<Vec<_>>() };
}

impl<M: ResultMode> Debug for Op<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Op::*;
        match self {
            Noop { n } => write!(f, "noop {n}"),
            Lt => write!(f, "lt"),
            Eq => write!(f, "eq"),
            Type => write!(f, "type"),
            Size => write!(f, "size"),
            New => write!(f, "new"),
            And => write!(f, "and"),
            Or => write!(f, "or"),
            Neg => write!(f, "neg"),
            Log => write!(f, "log"),
            Root => write!(f, "root"),
            Pop => write!(f, "pop"),
            Popeq {
                cached: false,
                result,
            } => write!(f, "popeq {result:?}"),
            Popeq {
                cached: true,
                result,
            } => write!(f, "popeqc {result:?}"),
            Addi { immediate } => write!(f, "addi {immediate:?}"),
            Subi { immediate } => write!(f, "subi {immediate:?}"),
            Push {
                storage: false,
                value,
            } => write!(f, "push {value:?}"),
            Push {
                storage: true,
                value,
            } => write!(f, "pushs {value:?}"),
            Branch { skip } => write!(f, "branch {skip}"),
            Jmp { skip } => write!(f, "jmp {skip}"),
            Add => write!(f, "add"),
            Sub => write!(f, "sub"),
            Concat { cached: false, n } => write!(f, "concat {n}"),
            Concat { cached: true, n } => write!(f, "concatc {n}"),
            Member => write!(f, "member"),
            Rem { cached: false } => write!(f, "rem"),
            Rem { cached: true } => write!(f, "remc"),
            Dup { n } => write!(f, "dup {n}"),
            Swap { n } => write!(f, "swap {n}"),
            Idx {
                cached,
                push_path,
                path,
            } => {
                write!(f, "idx")?;
                if *push_path {
                    write!(f, "p")?;
                }
                if *cached {
                    write!(f, "c")?;
                }
                write!(f, " [")?;
                let mut is_first = true;
                for key in path.iter() {
                    if is_first {
                        is_first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}")?;
                }
                write!(f, "]")
            }
            Ins { cached: false, n } => write!(f, "ins {n}"),
            Ins { cached: true, n } => write!(f, "insc {n}"),
            Ckpt => write!(f, "ckpt"),
        }
    }
}

impl<M: ResultMode> Op<M> {
    /// Rewrites this op into another result mode, mapping the `popeq`
    /// annotation through `f`.
    pub fn translate<M2: ResultMode, F: FnOnce(M::ReadResult) -> M2::ReadResult>(
        self,
        f: F,
    ) -> Op<M2> {
        match self {
            Op::Noop { n } => Op::Noop { n },
            Op::Lt => Op::Lt,
            Op::Eq => Op::Eq,
            Op::Type => Op::Type,
            Op::Size => Op::Size,
            Op::New => Op::New,
            Op::And => Op::And,
            Op::Or => Op::Or,
            Op::Neg => Op::Neg,
            Op::Log => Op::Log,
            Op::Root => Op::Root,
            Op::Pop => Op::Pop,
            Op::Popeq { cached, result } => Op::Popeq {
                cached,
                result: f(result),
            },
            Op::Addi { immediate } => Op::Addi { immediate },
            Op::Subi { immediate } => Op::Subi { immediate },
            Op::Push { storage, value } => Op::Push { storage, value },
            Op::Branch { skip } => Op::Branch { skip },
            Op::Jmp { skip } => Op::Jmp { skip },
            Op::Add => Op::Add,
            Op::Sub => Op::Sub,
            Op::Concat { cached, n } => Op::Concat { cached, n },
            Op::Member => Op::Member,
            Op::Rem { cached } => Op::Rem { cached },
            Op::Dup { n } => Op::Dup { n },
            Op::Swap { n } => Op::Swap { n },
            Op::Idx {
                cached,
                push_path,
                path,
            } => Op::Idx {
                cached,
                push_path,
                path,
            },
            Op::Ins { cached, n } => Op::Ins { cached, n },
            Op::Ckpt => Op::Ckpt,
        }
    }
}

impl FieldRepr for Op<ResultModeVerify> {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        use transient_crypto::fab::AlignedValueExt;
        use Op::*;
        match self {
            Noop { n } => writer.write(&vec![Fr::from(0x00u64); *n as usize]),
            Lt => writer.write(&[Fr::from(0x01u64)]),
            Eq => writer.write(&[Fr::from(0x02u64)]),
            Type => writer.write(&[Fr::from(0x03u64)]),
            Size => writer.write(&[Fr::from(0x04u64)]),
            New => writer.write(&[Fr::from(0x05u64)]),
            And => writer.write(&[Fr::from(0x06u64)]),
            Or => writer.write(&[Fr::from(0x07u64)]),
            Neg => writer.write(&[Fr::from(0x08u64)]),
            Log => writer.write(&[Fr::from(0x09u64)]),
            Root => writer.write(&[Fr::from(0x0au64)]),
            Pop => writer.write(&[Fr::from(0x0bu64)]),
            Popeq { cached, result } => {
                writer.write(&[Fr::from(0x0cu64 + *cached as u64)]);
                result.value_only_field_repr(writer);
            }
            Addi { immediate } => {
                writer.write(&[Fr::from(0x0eu64), Fr::from(*immediate)]);
            }
            Subi { immediate } => {
                writer.write(&[Fr::from(0x0fu64), Fr::from(*immediate)]);
            }
            Push { storage, value } => {
                writer.write(&[Fr::from(0x10u64 + *storage as u64)]);
                value.field_repr(writer);
            }
            Branch { skip } => writer.write(&[Fr::from(0x12u64), Fr::from(*skip)]),
            Jmp { skip } => writer.write(&[Fr::from(0x13u64), Fr::from(*skip)]),
            Add => writer.write(&[Fr::from(0x14u64)]),
            Sub => writer.write(&[Fr::from(0x15u64)]),
            Concat { cached: false, n } => writer.write(&[Fr::from(0x16u64), Fr::from(*n)]),
            Concat { cached: true, n } => writer.write(&[Fr::from(0x17u64), Fr::from(*n)]),
            Member => writer.write(&[Fr::from(0x18u64)]),
            Rem { cached: false } => writer.write(&[Fr::from(0x19u64)]),
            Rem { cached: true } => writer.write(&[Fr::from(0x1au64)]),
            Dup { n } => writer.write(&[Fr::from(0x30u64 | *n as u64)]),
            Swap { n } => writer.write(&[Fr::from(0x40u64 | *n as u64)]),
            Idx {
                cached,
                push_path,
                path,
            } => {
                if !path.is_empty() {
                    let opcode = match (*cached, *push_path) {
                        (false, false) => 0x50u64,
                        (true, false) => 0x60,
                        (false, true) => 0x70,
                        (true, true) => 0x80,
                    } | (path.len() as u64 - 1);
                    writer.write(&[Fr::from(opcode)]);
                    for entry in path.iter() {
                        entry.field_repr(writer);
                    }
                }
            }
            Ins { cached: false, n } => writer.write(&[Fr::from(0x90u64 | *n as u64)]),
            Ins { cached: true, n } => writer.write(&[Fr::from(0xa0u64 | *n as u64)]),
            Ckpt => writer.write(&[Fr::from(0xffu64)]),
        }
    }

    fn field_size(&self) -> usize {
        use transient_crypto::fab::AlignedValueExt;
        use Op::*;
        match self {
            Lt | Eq | Type | Size | New | And | Or | Neg | Log | Root | Pop | Add | Sub
            | Member | Rem { .. } | Dup { .. } | Swap { .. } | Ins { .. } | Ckpt => 1,
            Noop { n } => *n as usize,
            Branch { .. } | Jmp { .. } | Concat { .. } | Addi { .. } | Subi { .. } => 2,
            Popeq { result, .. } => 1 + result.value_only_field_size(),
            Push { value, .. } => 1 + value.field_size(),
            Idx { path, .. } => 1 + path.iter().map(|item| item.field_size()).sum::<usize>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result_mode::ResultModeGather;

    #[test]
    fn ops_roundtrip() {
        let program: Vec<Op<ResultModeVerify>> = vec![
            Op::Noop { n: 3 },
            Op::Push {
                storage: false,
                value: StateValue::Null,
            },
            Op::Popeq {
                cached: false,
                result: 42u64.into(),
            },
            Op::Idx {
                cached: true,
                push_path: false,
                path: vec![Key::Stack, Key::Value(7u64.into())].into(),
            },
            Op::Ckpt,
        ];
        let mut bytes = Vec::new();
        program.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), program.serialized_size());
        let back: Vec<Op<ResultModeVerify>> = Vec::deserialize(&mut &bytes[..], 0).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn translate_strips_results() {
        let op: Op<ResultModeVerify> = Op::Popeq {
            cached: false,
            result: 1u64.into(),
        };
        let gathered: Op<ResultModeGather> = op.translate(|_| ());
        assert!(matches!(gathered, Op::Popeq { result: (), .. }));
    }
}
