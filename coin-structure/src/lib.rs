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

//! On-chain data formats and helpers for coins: addresses, token types,
//! commitments and nullifiers.

pub mod coin;
pub mod contract;
mod fab;
pub mod transfer;

/// Implements the standard bundle of impls for a newtype over
/// [`base_crypto::hash::HashOutput`]: binary and field representations,
/// serialization, alignment, and value conversions.
macro_rules! hash_newtype {
    ($($ty:ident: $tag:literal),* $(,)?) => {
        $(
            serialize::serializable_newtype!($ty: $tag = "array(u8,32)");

            impl base_crypto::repr::BinaryHashRepr for $ty {
                fn binary_repr<W: base_crypto::repr::MemWrite<u8>>(&self, writer: &mut W) {
                    base_crypto::repr::BinaryHashRepr::binary_repr(&self.0, writer)
                }
                fn binary_len(&self) -> usize {
                    base_crypto::repr::BinaryHashRepr::binary_len(&self.0)
                }
            }

            impl transient_crypto::repr::FieldRepr for $ty {
                fn field_repr<W: base_crypto::repr::MemWrite<transient_crypto::curve::Fr>>(
                    &self,
                    writer: &mut W,
                ) {
                    transient_crypto::repr::FieldRepr::field_repr(&self.0.0, writer)
                }
                fn field_size(&self) -> usize {
                    transient_crypto::repr::FieldRepr::field_size(&self.0.0)
                }
            }

            impl transient_crypto::repr::FromFieldRepr for $ty {
                const FIELD_SIZE: usize =
                    <[u8; 32] as transient_crypto::repr::FromFieldRepr>::FIELD_SIZE;
                fn from_field_repr(repr: &[transient_crypto::curve::Fr]) -> Option<Self> {
                    <[u8; 32] as transient_crypto::repr::FromFieldRepr>::from_field_repr(repr)
                        .map(|raw| $ty(base_crypto::hash::HashOutput(raw)))
                }
            }

            impl base_crypto::fab::Aligned for $ty {
                fn alignment() -> base_crypto::fab::Alignment {
                    <base_crypto::hash::HashOutput as base_crypto::fab::Aligned>::alignment()
                }
            }

            impl From<$ty> for base_crypto::fab::ValueAtom {
                fn from(val: $ty) -> base_crypto::fab::ValueAtom {
                    val.0.into()
                }
            }

            impl TryFrom<&base_crypto::fab::ValueAtom> for $ty {
                type Error = base_crypto::fab::InvalidBuiltinDecode;
                fn try_from(
                    value: &base_crypto::fab::ValueAtom,
                ) -> Result<$ty, base_crypto::fab::InvalidBuiltinDecode> {
                    Ok($ty(value.try_into()?))
                }
            }

            impl From<$ty> for base_crypto::fab::Value {
                fn from(val: $ty) -> base_crypto::fab::Value {
                    base_crypto::fab::Value(vec![val.into()])
                }
            }

            impl TryFrom<&base_crypto::fab::ValueSlice> for $ty {
                type Error = base_crypto::fab::InvalidBuiltinDecode;
                fn try_from(
                    value: &base_crypto::fab::ValueSlice,
                ) -> Result<$ty, base_crypto::fab::InvalidBuiltinDecode> {
                    Ok($ty(value.try_into()?))
                }
            }

            impl serde::Serialize for $ty {
                fn serialize<S: serde::ser::Serializer>(
                    &self,
                    serializer: S,
                ) -> Result<S::Ok, S::Error> {
                    serializer.serialize_bytes(&self.0.0)
                }
            }

            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D: serde::de::Deserializer<'de>>(
                    deserializer: D,
                ) -> Result<Self, D::Error> {
                    deserializer.deserialize_bytes(crate::HashVisitor).map($ty)
                }
            }
        )*
    }
}
pub(crate) use hash_newtype;

pub(crate) struct HashVisitor;

impl serde::de::Visitor<'_> for HashVisitor {
    type Value = base_crypto::hash::HashOutput;
    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "a hash value")
    }

    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        let mut res = [0u8; base_crypto::hash::PERSISTENT_HASH_BYTES];
        if v.len() == res.len() {
            res.copy_from_slice(v);
            Ok(base_crypto::hash::HashOutput(res))
        } else {
            Err(E::invalid_length(v.len(), &self))
        }
    }
}
