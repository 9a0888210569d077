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

//! Implementation macros for product types. Enums and phase-parameterised
//! types implement the traits by hand, as their wire formats are
//! discriminant- or phase-dependent.

/// Implements [`Serializable`](crate::Serializable),
/// [`Deserializable`](crate::Deserializable) and [`Tagged`](crate::Tagged)
/// for a struct as the concatenation of its fields.
///
/// ```ignore
/// serializable_struct!(CoinInfo: "shielded-coin-info[v2]" = "(nonce,token,u128)" {
///     nonce, type_, value,
/// });
/// ```
#[macro_export]
macro_rules! serializable_struct {
    ($ty:ident: $tag:literal = $factor:literal { $($field:ident),* $(,)? }) => {
        impl $crate::Serializable for $ty {
            fn serialize(&self, writer: &mut impl ::std::io::Write) -> ::std::io::Result<()> {
                $($crate::Serializable::serialize(&self.$field, writer)?;)*
                Ok(())
            }
            fn serialized_size(&self) -> usize {
                0usize $(+ $crate::Serializable::serialized_size(&self.$field))*
            }
        }

        impl $crate::Deserializable for $ty {
            fn deserialize(
                reader: &mut impl ::std::io::Read,
                mut recursion_depth: u32,
            ) -> ::std::io::Result<Self> {
                <Self as $crate::Deserializable>::check_rec(&mut recursion_depth)?;
                Ok($ty {
                    $($field: $crate::Deserializable::deserialize(reader, recursion_depth)?,)*
                })
            }
        }

        impl $crate::Tagged for $ty {
            fn tag() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed($tag)
            }
            fn tag_unique_factor() -> String {
                $factor.into()
            }
        }
    };
}

/// As [`serializable_struct!`], for newtype wrappers around a single inner
/// type whose tag the wrapper reuses structurally.
#[macro_export]
macro_rules! serializable_newtype {
    ($ty:ident: $tag:literal = $factor:literal) => {
        impl $crate::Serializable for $ty {
            fn serialize(&self, writer: &mut impl ::std::io::Write) -> ::std::io::Result<()> {
                $crate::Serializable::serialize(&self.0, writer)
            }
            fn serialized_size(&self) -> usize {
                $crate::Serializable::serialized_size(&self.0)
            }
        }

        impl $crate::Deserializable for $ty {
            fn deserialize(
                reader: &mut impl ::std::io::Read,
                recursion_depth: u32,
            ) -> ::std::io::Result<Self> {
                Ok($ty($crate::Deserializable::deserialize(reader, recursion_depth)?))
            }
        }

        impl $crate::Tagged for $ty {
            fn tag() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed($tag)
            }
            fn tag_unique_factor() -> String {
                $factor.into()
            }
        }
    };
}

/// Asserts that a type's tag decomposition is stable across runs by pinning
/// it in the workspace-level `.tag-decompositions` directory. A failure here
/// means a wire format changed without a tag version bump.
#[macro_export]
macro_rules! tag_enforcement_test {
    ($type:ident) => {
        $crate::tag_enforcement_test!($type < >);
    };
    ($type:ident < $($targ:ty),* >) => {
        #[cfg(test)]
        ::paste::paste! {
            #[allow(non_snake_case)]
            #[test]
            fn [<tag_enforcement_test_ $type>]() {
                let tag = <$type<$($targ),*> as $crate::Tagged>::tag();
                let unique_factor = <$type<$($targ),*> as $crate::Tagged>::tag_unique_factor();
                let mut dir = ::std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                dir.pop();
                dir.push(".tag-decompositions");
                ::std::fs::create_dir_all(&dir).unwrap();
                let fpath = dir.join(tag.as_ref());
                if fpath.exists() {
                    let read_factor = ::std::fs::read_to_string(&fpath).unwrap();
                    assert_eq!(read_factor, unique_factor);
                } else {
                    ::std::fs::write(&fpath, unique_factor).unwrap();
                }
            }
        }
    };
}
