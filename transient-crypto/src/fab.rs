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

//! The field half of the field-aligned binary representation: interpreting
//! aligned values as sequences of field elements for proving, and parsing
//! them back.

use crate::curve::{EmbeddedFr, EmbeddedGroupAffine, Fr, FR_BYTES_STORED};
use crate::hash::transient_commit;
use crate::merkle_tree::{MerklePath, MerkleTreeDigest};
use crate::repr::{bytes_from_field_repr, FieldRepr};
use base_crypto::fab::{
    Aligned, AlignedValue, Alignment, AlignmentAtom, AlignmentSegment, DynAligned,
    InvalidBuiltinDecode, Value, ValueAtom, ValueSlice,
};
use base_crypto::repr::{BinaryHashRepr, MemWrite};
use std::iter::{once, repeat};

impl From<MerkleTreeDigest> for ValueAtom {
    fn from(val: MerkleTreeDigest) -> ValueAtom {
        Fr::from(val).into()
    }
}

impl TryFrom<&ValueAtom> for MerkleTreeDigest {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueAtom) -> Result<MerkleTreeDigest, InvalidBuiltinDecode> {
        Ok(Fr::try_from(value)?.into())
    }
}

impl<T: Into<Value>> From<MerklePath<T>> for Value {
    fn from(path: MerklePath<T>) -> Value {
        let mut parts = Vec::new();
        parts.push(path.leaf.into());
        for entry in path.path.iter() {
            parts.push(entry.sibling.into());
            parts.push(entry.goes_left.into());
        }
        Value::concat(parts.iter())
    }
}

impl From<MerkleTreeDigest> for Value {
    fn from(val: MerkleTreeDigest) -> Value {
        Value(vec![val.into()])
    }
}

impl TryFrom<&ValueSlice> for MerkleTreeDigest {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<MerkleTreeDigest, InvalidBuiltinDecode> {
        if value.0.len() == 1 {
            Ok(MerkleTreeDigest::try_from(&value.0[0])?)
        } else {
            Err(InvalidBuiltinDecode("MerkleTreeDigest"))
        }
    }
}

impl Aligned for MerkleTreeDigest {
    fn alignment() -> Alignment {
        Alignment::singleton(AlignmentAtom::Field)
    }
}

impl<T: DynAligned> DynAligned for MerklePath<T> {
    fn dyn_alignment(&self) -> Alignment {
        let leaf_align = self.leaf.dyn_alignment();
        let entry_align = Alignment::concat([&MerkleTreeDigest::alignment(), &bool::alignment()]);
        Alignment::concat(once(&leaf_align).chain(repeat(&entry_align).take(self.path.len())))
    }
}

impl From<EmbeddedGroupAffine> for Value {
    fn from(value: EmbeddedGroupAffine) -> Value {
        Value(vec![
            value.x().unwrap_or(Fr::from(0u64)).into(),
            value.y().unwrap_or(Fr::from(0u64)).into(),
        ])
    }
}

impl Aligned for EmbeddedGroupAffine {
    fn alignment() -> Alignment {
        Alignment::concat([&Fr::alignment(), &Fr::alignment()])
    }
}

impl From<EmbeddedFr> for ValueAtom {
    fn from(val: EmbeddedFr) -> ValueAtom {
        ValueAtom(val.as_le_bytes()).normalize()
    }
}

impl TryFrom<&ValueAtom> for EmbeddedFr {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueAtom) -> Result<EmbeddedFr, InvalidBuiltinDecode> {
        EmbeddedFr::from_le_bytes(&value.0).ok_or(InvalidBuiltinDecode("EmbeddedFr"))
    }
}

impl From<EmbeddedFr> for Value {
    fn from(val: EmbeddedFr) -> Value {
        Value(vec![val.into()])
    }
}

impl Aligned for EmbeddedFr {
    fn alignment() -> Alignment {
        Alignment::singleton(AlignmentAtom::Field)
    }
}

pub(crate) trait ValueExt {
    fn field_repr_unchecked<W: MemWrite<Fr>>(&self, align: &Alignment, writer: &mut W);
    fn binary_repr_unchecked<W: MemWrite<u8>>(&self, align: &Alignment, writer: &mut W);
}

fn repr_traverse<T, F, L, P>(
    atom_slice: &mut &[ValueAtom],
    align: &Alignment,
    f: &F,
    len: &L,
    pad: &P,
    mut acc: T,
) -> T
where
    F: Fn(T, &AlignmentAtom, &ValueAtom) -> T,
    L: Fn(&Alignment) -> usize,
    P: Fn(T, usize) -> T,
{
    for segment in align.0.iter() {
        match segment {
            AlignmentSegment::Atom(atom) => {
                acc = f(acc, atom, &atom_slice[0]);
                *atom_slice = &atom_slice[1..];
            }
            AlignmentSegment::Option(options) => {
                let discriminant =
                    u16::try_from(&atom_slice[0]).expect("unchecked discriminant should decode");
                acc = f(
                    acc,
                    &AlignmentAtom::Bytes { length: 2 },
                    &atom_slice[0],
                );
                *atom_slice = &atom_slice[1..];
                let choice = &options[discriminant as usize];
                acc = repr_traverse(atom_slice, choice, f, len, pad, acc);
                let padding = options.iter().map(len).max().unwrap_or(0) - len(choice);
                acc = pad(acc, padding);
            }
        }
    }
    acc
}

impl ValueExt for Value {
    fn field_repr_unchecked<W: MemWrite<Fr>>(&self, align: &Alignment, writer: &mut W) {
        repr_traverse(
            &mut &self.0[..],
            align,
            &|mut w: &mut W, a, v| {
                v.field_repr_unchecked(a, &mut w);
                w
            },
            &Alignment::field_len,
            &|w, n| {
                w.write(&vec![Fr::from(0u64); n]);
                w
            },
            writer,
        );
    }

    fn binary_repr_unchecked<W: MemWrite<u8>>(&self, align: &Alignment, writer: &mut W) {
        repr_traverse(
            &mut &self.0[..],
            align,
            &|mut w: &mut W, a, v| {
                v.binary_repr_unchecked(a, &mut w);
                w
            },
            &Alignment::bin_len,
            &|w, n| {
                w.write(&vec![0u8; n]);
                w
            },
            writer,
        );
    }
}

/// An extension for the alignment in the field-aligned binary encoding.
pub trait AlignmentExt {
    /// Parses a given field representation as this alignment, and returns the
    /// corresponding aligned value.
    fn parse_field_repr(&self, repr: &[Fr]) -> Option<AlignedValue>;

    /// Returns the field length.
    fn field_len(&self) -> usize;

    /// Returns the binary length.
    fn bin_len(&self) -> usize;
}

fn parse_field_repr_inner(
    segments: &[AlignmentSegment],
    repr: &mut &[Fr],
    val: &mut Vec<ValueAtom>,
) -> Option<()> {
    for segment in segments.iter() {
        match segment {
            AlignmentSegment::Atom(atom) => val.push(atom.parse_field_repr(repr)?),
            AlignmentSegment::Option(options) => {
                let variant = u16::try_from(*repr.first()?).ok()?;
                *repr = &repr[1..];
                val.push(variant.into());
                let choice = options.get(variant as usize)?;
                parse_field_repr_inner(&choice.0, repr, val)?;
                let padding =
                    options.iter().map(Alignment::field_len).max().unwrap_or(0) - choice.field_len();
                if repr.len() < padding || repr[..padding].iter().any(|f| *f != Fr::from(0u64)) {
                    return None;
                }
                *repr = &repr[padding..];
            }
        }
    }
    Some(())
}

impl AlignmentExt for Alignment {
    fn parse_field_repr(&self, mut repr: &[Fr]) -> Option<AlignedValue> {
        let mut value = Vec::new();
        parse_field_repr_inner(&self.0, &mut repr, &mut value)?;
        AlignedValue::new(Value(value), self.clone())
    }

    fn field_len(&self) -> usize {
        self.0.iter().map(AlignmentSegmentExt::field_len).sum()
    }

    fn bin_len(&self) -> usize {
        self.0.iter().map(AlignmentSegmentExt::bin_len).sum()
    }
}

impl FieldRepr for Alignment {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        (self.0.len() as u32).field_repr(writer);
        for segment in self.0.iter() {
            segment.field_repr(writer);
        }
    }

    fn field_size(&self) -> usize {
        1 + self.0.iter().map(FieldRepr::field_size).sum::<usize>()
    }
}

impl FieldRepr for AlignmentSegment {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        match self {
            AlignmentSegment::Atom(atom) => atom.field_repr(writer),
            AlignmentSegment::Option(options) => {
                writer.write(&[Fr::from(options.len() as u64)]);
                for option in options {
                    option.field_repr(writer);
                }
            }
        }
    }

    fn field_size(&self) -> usize {
        match self {
            AlignmentSegment::Atom(_) => 1,
            AlignmentSegment::Option(options) => {
                1 + options.iter().map(FieldRepr::field_size).sum::<usize>()
            }
        }
    }
}

impl FieldRepr for AlignmentAtom {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        match self {
            AlignmentAtom::Compress => writer.write(&[Fr::from(0u64), Fr::from(0u64)]),
            AlignmentAtom::Bytes { length } => {
                writer.write(&[Fr::from(1u64), Fr::from(*length as u64)])
            }
            AlignmentAtom::Field => writer.write(&[Fr::from(2u64), Fr::from(0u64)]),
        }
    }

    fn field_size(&self) -> usize {
        2
    }
}

impl FieldRepr for AlignedValue {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        self.alignment.field_repr(writer);
        self.value.field_repr_unchecked(&self.alignment, writer);
    }

    fn field_size(&self) -> usize {
        self.alignment.field_size() + self.alignment.field_len()
    }
}

/// An extension for the `AlignedValue`.
pub trait AlignedValueExt {
    /// Iterate over the field elements in this value, not encoding the
    /// alignment itself.
    fn value_only_field_repr<W: MemWrite<Fr>>(&self, writer: &mut W);

    /// Returns the number of elements output by
    /// [`Self::value_only_field_repr`].
    fn value_only_field_size(&self) -> usize;
}

impl AlignedValueExt for AlignedValue {
    fn value_only_field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        self.value.field_repr_unchecked(&self.alignment, writer)
    }

    fn value_only_field_size(&self) -> usize {
        self.alignment.field_len()
    }
}

/// Wrapper around [`AlignedValue`] whose [`FieldRepr`] implementation uses
/// [`AlignedValueExt::value_only_field_repr`].
pub struct ValueReprAlignedValue(pub AlignedValue);

impl From<ValueReprAlignedValue> for Value {
    fn from(value: ValueReprAlignedValue) -> Value {
        value.0.value
    }
}

impl FieldRepr for ValueReprAlignedValue {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        self.0.value_only_field_repr(writer);
    }

    fn field_size(&self) -> usize {
        self.0.value_only_field_size()
    }
}

impl BinaryHashRepr for ValueReprAlignedValue {
    fn binary_repr<W: MemWrite<u8>>(&self, writer: &mut W) {
        self.0
            .value
            .binary_repr_unchecked(&self.0.alignment, writer);
    }
    fn binary_len(&self) -> usize {
        self.0.alignment.bin_len()
    }
}

impl DynAligned for ValueReprAlignedValue {
    fn dyn_alignment(&self) -> Alignment {
        self.0.dyn_alignment()
    }
}

pub(crate) trait ValueAtomExt {
    /// Returns the field representation of a primitive value wrt. a primitive
    /// type.
    ///
    /// # Safety
    ///
    /// This is safe to call iff `ty.`[`fits`](AlignmentAtom::fits)`(self)`
    /// returns `true`.
    fn field_repr_unchecked<W: MemWrite<Fr>>(&self, ty: &AlignmentAtom, writer: &mut W);
    fn binary_repr_unchecked<W: MemWrite<u8>>(&self, ty: &AlignmentAtom, writer: &mut W);
}

impl ValueAtomExt for ValueAtom {
    fn field_repr_unchecked<W: MemWrite<Fr>>(&self, ty: &AlignmentAtom, writer: &mut W) {
        match ty {
            AlignmentAtom::Compress => {
                // Special case for the empty string to make defaults work
                // well.
                if self.0.is_empty() {
                    writer.write(&[Fr::from(0u64)]);
                } else {
                    writer.write(&[transient_commit(
                        &self.0[..],
                        (self.0.len() as u64).into(),
                    )])
                }
            }
            AlignmentAtom::Bytes { length } => {
                let prepend_zeros = (*length as usize).div_ceil(FR_BYTES_STORED)
                    - self.0.len().div_ceil(FR_BYTES_STORED);
                let raw = self
                    .0
                    .chunks(FR_BYTES_STORED)
                    .map(|bytes| {
                        Fr::from_le_bytes(bytes).expect("Bytes must fit into FR_BYTES_STORED chunk")
                    })
                    .rev();
                writer.write(&vec![Fr::from(0u64); prepend_zeros]);
                writer.write(&raw.collect::<Vec<_>>());
            }
            AlignmentAtom::Field => writer.write(&[Fr::from_le_bytes(&self.0)
                .expect("Unchecked field repr field should be in range")]),
        }
    }

    fn binary_repr_unchecked<W: MemWrite<u8>>(&self, ty: &AlignmentAtom, writer: &mut W) {
        match ty {
            AlignmentAtom::Compress => {
                transient_commit(&self.0[..], (self.0.len() as u64).into()).binary_repr(writer);
            }
            AlignmentAtom::Bytes { length } => {
                writer.write(&self.0);
                let missing_bytes = (*length as usize) - self.0.len();
                writer.write(&vec![0u8; missing_bytes]);
            }
            AlignmentAtom::Field => {
                Fr::from_le_bytes(&self.0)
                    .expect("Unchecked field repr field should be in range")
                    .binary_repr(writer);
            }
        }
    }
}

pub(crate) trait AlignmentAtomExt {
    fn parse_field_repr(&self, repr: &mut &[Fr]) -> Option<ValueAtom>;
    fn field_len(&self) -> usize;
    fn bin_len(&self) -> usize;
}

impl AlignmentAtomExt for AlignmentAtom {
    fn parse_field_repr(&self, repr: &mut &[Fr]) -> Option<ValueAtom> {
        match self {
            // Impossible to parse compress from a field!
            AlignmentAtom::Compress => None,
            AlignmentAtom::Field => {
                let res = repr.first()?;
                let atom = ValueAtom(res.as_le_bytes()).normalize();
                *repr = &repr[1..];
                Some(atom)
            }
            AlignmentAtom::Bytes { length } => {
                bytes_from_field_repr(repr, *length as usize).map(|b| ValueAtom(b).normalize())
            }
        }
    }

    fn field_len(&self) -> usize {
        match self {
            AlignmentAtom::Compress | AlignmentAtom::Field => 1,
            AlignmentAtom::Bytes { length } => (*length as usize).div_ceil(FR_BYTES_STORED),
        }
    }

    fn bin_len(&self) -> usize {
        match self {
            AlignmentAtom::Compress => 32,
            AlignmentAtom::Field => crate::curve::FR_BYTES,
            AlignmentAtom::Bytes { length } => *length as usize,
        }
    }
}

pub(crate) trait AlignmentSegmentExt {
    fn field_len(&self) -> usize;
    fn bin_len(&self) -> usize;
}

impl AlignmentSegmentExt for AlignmentSegment {
    fn field_len(&self) -> usize {
        match self {
            AlignmentSegment::Atom(atom) => atom.field_len(),
            AlignmentSegment::Option(options) => {
                1 + options.iter().map(Alignment::field_len).max().unwrap_or(0)
            }
        }
    }

    fn bin_len(&self) -> usize {
        match self {
            AlignmentSegment::Atom(atom) => atom.bin_len(),
            AlignmentSegment::Option(options) => {
                2 + options.iter().map(Alignment::bin_len).max().unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_repr_roundtrips_for_byte_alignments() {
        let value = AlignedValue::from((42u64, 7u8));
        let repr = {
            let mut repr = Vec::new();
            value.value_only_field_repr(&mut repr);
            repr
        };
        let parsed = value.alignment.parse_field_repr(&repr).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn compress_atoms_cannot_be_parsed_back() {
        let bytes: Vec<u8> = vec![1, 2, 3];
        let value = AlignedValue::from(bytes);
        let mut repr = Vec::new();
        value.value_only_field_repr(&mut repr);
        assert_eq!(repr.len(), 1);
        assert!(value.alignment.parse_field_repr(&repr).is_none());
    }
}
