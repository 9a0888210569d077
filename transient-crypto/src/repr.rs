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

//! This module deals with representing data as sequences of field elements
//! for use in proofs, primarily through the [`FieldRepr`] and
//! [`FromFieldRepr`] traits.

use crate::curve::{Fr, FR_BYTES, FR_BYTES_STORED};
use base_crypto::repr::{BinaryHashRepr, MemWrite};
use base_crypto::time::Timestamp;
use serialize::VecExt;

/// A type that implements this can be transformed into a sequence of [`Fr`]s.
pub trait FieldRepr {
    /// Writes out `self` as a sequence of [Fr] elements.
    /// As a general rule of thumb, this should produce a known number of
    /// elements.
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W);
    /// The size of a value when represented as field elements.
    fn field_size(&self) -> usize;
    /// Writes the field repr into a vector
    fn field_vec(&self) -> Vec<Fr> {
        let mut res = Vec::with_bounded_capacity(self.field_size());
        self.field_repr(&mut res);
        res
    }
}

/// A type that can be parsed from a sequence of [`Fr`]s.
pub trait FromFieldRepr: Sized {
    /// The number of elements this type can be reconstructed from.
    const FIELD_SIZE: usize;
    /// Attempts to parse from a slice of [`FIELD_SIZE`](Self::FIELD_SIZE)
    /// elements.
    fn from_field_repr(repr: &[Fr]) -> Option<Self>;
}

impl BinaryHashRepr for Fr {
    fn binary_repr<W: MemWrite<u8>>(&self, writer: &mut W) {
        writer.write(&self.as_le_bytes())
    }
    fn binary_len(&self) -> usize {
        FR_BYTES
    }
}

impl FieldRepr for Fr {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        writer.write(&[*self]);
    }
    fn field_size(&self) -> usize {
        1
    }
}

impl FromFieldRepr for Fr {
    const FIELD_SIZE: usize = 1;
    fn from_field_repr(repr: &[Fr]) -> Option<Self> {
        if repr.len() == 1 {
            Some(repr[0])
        } else {
            None
        }
    }
}

macro_rules! uint_field_repr {
    ($($ty:ty),*) => {
        $(
            impl FieldRepr for $ty {
                fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
                    writer.write(&[Fr::from(*self)]);
                }
                fn field_size(&self) -> usize {
                    1
                }
            }

            impl FromFieldRepr for $ty {
                const FIELD_SIZE: usize = 1;
                fn from_field_repr(repr: &[Fr]) -> Option<Self> {
                    if repr.len() != 1 {
                        return None;
                    }
                    <$ty>::try_from(repr[0]).ok()
                }
            }
        )*
    };
}

uint_field_repr!(u8, u16, u32, u64, u128);

impl FieldRepr for bool {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        writer.write(&[Fr::from(*self)]);
    }
    fn field_size(&self) -> usize {
        1
    }
}

impl FromFieldRepr for bool {
    const FIELD_SIZE: usize = 1;
    fn from_field_repr(repr: &[Fr]) -> Option<Self> {
        match u8::from_field_repr(repr)? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

impl FieldRepr for Timestamp {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        self.to_secs().field_repr(writer);
    }
    fn field_size(&self) -> usize {
        1
    }
}

impl FromFieldRepr for Timestamp {
    const FIELD_SIZE: usize = 1;
    fn from_field_repr(repr: &[Fr]) -> Option<Self> {
        u64::from_field_repr(repr).map(Timestamp::from_secs)
    }
}

macro_rules! tuple_repr {
    ($head:ident$(, $tail:ident)*) => {
        #[allow(unused_parens, non_snake_case)]
        impl<$head: FieldRepr$(, $tail: FieldRepr)*> FieldRepr for ($head, $($tail),*) {
            fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
                let ($head, $($tail),*) = self;
                $head.field_repr(writer);
                $($tail.field_repr(writer);)*
            }
            fn field_size(&self) -> usize {
                let ($head, $($tail),*) = self;
                $head.field_size() $(+ $tail.field_size())*
            }
        }
        #[allow(unused_parens, non_snake_case)]
        impl<$head: FromFieldRepr$(, $tail: FromFieldRepr)*> FromFieldRepr for ($head, $($tail),*) {
            const FIELD_SIZE: usize = <$head as FromFieldRepr>::FIELD_SIZE$( + <$tail as FromFieldRepr>::FIELD_SIZE)*;
            fn from_field_repr(repr: &[Fr]) -> Option<Self> {
                if repr.len() != Self::FIELD_SIZE {
                    return None;
                }
                let __head_size = <$head as FromFieldRepr>::FIELD_SIZE;
                let $head = <$head as FromFieldRepr>::from_field_repr(&repr[..__head_size])?;
                let ($($tail, )*) = <($($tail, )*) as FromFieldRepr>::from_field_repr(&repr[__head_size..])?;
                Some(($head, $($tail),*))
            }
        }
        tuple_repr!($($tail),*);
    };
    () => {
        impl FieldRepr for () {
            fn field_repr<W: MemWrite<Fr>>(&self, _: &mut W) {
            }
            fn field_size(&self) -> usize {
                0
            }
        }
        impl FromFieldRepr for () {
            const FIELD_SIZE: usize = 0;
            fn from_field_repr(repr: &[Fr]) -> Option<Self> {
                if repr.is_empty() {
                    Some(())
                } else {
                    None
                }
            }
        }
    };
}

tuple_repr!(A, B, C, D, E, F, G, H);

impl<T: FieldRepr> FieldRepr for Option<T> {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        match self {
            Some(val) => {
                true.field_repr(writer);
                val.field_repr(writer);
            }
            None => false.field_repr(writer),
        }
    }
    fn field_size(&self) -> usize {
        match self {
            Some(val) => 1 + val.field_size(),
            None => 1,
        }
    }
}

impl<T: FieldRepr> FieldRepr for [T] {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        for item in self {
            item.field_repr(writer);
        }
    }
    fn field_size(&self) -> usize {
        self.iter().map(FieldRepr::field_size).sum()
    }
}

impl<T: FieldRepr> FieldRepr for Vec<T> {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        self.as_slice().field_repr(writer)
    }
    fn field_size(&self) -> usize {
        self.as_slice().field_size()
    }
}

/// Converts a sequence of field elements into a corresponding byte vector.
/// Guarantees that the result's [`FieldRepr`] matches the input.
pub fn bytes_from_field_repr(repr: &mut &[Fr], n: usize) -> Option<Vec<u8>> {
    let stray = n % FR_BYTES_STORED;
    let chunks = n / FR_BYTES_STORED;
    let expected_size = chunks + (stray != 0) as usize;
    if repr.len() < expected_size {
        return None;
    }
    let mut res = vec![0u8; n];
    let bytes_from = |slice: &mut [u8], k: usize, f: Fr| {
        let raw = f.as_le_bytes();
        if raw[k..].iter().any(|b| *b != 0) {
            None
        } else {
            slice.copy_from_slice(&raw[..k]);
            Some(())
        }
    };
    if stray > 0 {
        bytes_from(&mut res[n - stray..], stray, repr[0])?;
        *repr = &repr[1..];
    }
    for i in 0..chunks {
        bytes_from(
            &mut res[i * FR_BYTES_STORED..(i + 1) * FR_BYTES_STORED],
            FR_BYTES_STORED,
            repr[chunks - 1 - i],
        )?;
    }
    *repr = &repr[chunks..];
    Some(res)
}

impl FieldRepr for [u8] {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        let mut slice = self;
        while !slice.is_empty() {
            let len = slice.len();
            let stray = len % FR_BYTES_STORED;
            if stray != 0 {
                writer.write(&[Fr::from_le_bytes(&slice[len - stray..])
                    .expect("Must fall in storable byte range")]);
                slice = &slice[..len - stray];
            } else {
                let start = len - usize::min(FR_BYTES_STORED, len);
                writer.write(&[Fr::from_le_bytes(&slice[start..])
                    .expect("Must fall in storable byte range")]);
                slice = &slice[..start];
            }
        }
    }
    fn field_size(&self) -> usize {
        self.len().div_ceil(FR_BYTES_STORED)
    }
}

impl<const N: usize> FieldRepr for [u8; N] {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        <[u8]>::field_repr(self, writer)
    }
    fn field_size(&self) -> usize {
        <[u8]>::field_size(self)
    }
}

impl<const N: usize> FromFieldRepr for [u8; N] {
    const FIELD_SIZE: usize = N.div_ceil(FR_BYTES_STORED);
    fn from_field_repr(mut repr: &[Fr]) -> Option<Self> {
        if repr.len() != Self::FIELD_SIZE {
            return None;
        }
        let bytes = bytes_from_field_repr(&mut repr, N)?;
        if !repr.is_empty() {
            return None;
        }
        bytes.try_into().ok()
    }
}
