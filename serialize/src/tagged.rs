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

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A type that can be described by a fixed type string.
///
/// The string should uniquely determine the type, and must never change its
/// meaning: a change in a type's wire representation must be accompanied by a
/// version bump in its tag (`"foo[v1]"` to `"foo[v2]"`).
///
/// Tags are kebab-case, with square brackets for versions and parentheses and
/// commas for generic arguments (`"option(foo)"`, `"(foo,bar)"`). They are
/// used by [`tagged_serialize`](crate::tagged_serialize) and
/// [`tagged_deserialize`](crate::tagged_deserialize) as prefixes of
/// serialized data.
pub trait Tagged {
    /// Retrieves the tag of `Self`. A `Cow` because generic arguments require
    /// allocation, but most tags are static.
    fn tag() -> Cow<'static, str>;

    /// A decomposition of this tag into primitive types, tuples (`(a,b)`) and
    /// sum types (`[a,b]`). Used by automated tests to ensure a change in
    /// representation also changes the tag.
    fn tag_unique_factor() -> String;
}

impl<'a, T: Tagged + 'a> Tagged for &'a T {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
    fn tag_unique_factor() -> String {
        T::tag_unique_factor()
    }
}

impl<T: Tagged> Tagged for Arc<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
    fn tag_unique_factor() -> String {
        T::tag_unique_factor()
    }
}

impl<T: Tagged> Tagged for Box<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
    fn tag_unique_factor() -> String {
        T::tag_unique_factor()
    }
}

impl<T: Tagged> Tagged for Option<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("option({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("[(),{}]", T::tag())
    }
}

impl<T: Tagged> Tagged for Vec<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("vec({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("vec({})", T::tag())
    }
}

impl<K: Tagged, V: Tagged> Tagged for HashMap<K, V> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("map({},{})", K::tag(), V::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("map({},{})", K::tag(), V::tag())
    }
}

impl<T: Tagged> Tagged for HashSet<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("set({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("set({})", T::tag())
    }
}

impl<const N: usize, T: Tagged> Tagged for [T; N] {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("array({},{})", T::tag(), N))
    }
    fn tag_unique_factor() -> String {
        format!("array({},{})", T::tag(), N)
    }
}

macro_rules! tuple_tagged {
    ($($ty:ident),+) => {
        impl<$($ty: Tagged),+> Tagged for ($($ty,)+) {
            fn tag() -> Cow<'static, str> {
                let tags = [$($ty::tag()),+];
                Cow::Owned(format!("({})", tags.join(",")))
            }
            fn tag_unique_factor() -> String {
                let tags = [$($ty::tag()),+];
                format!("({})", tags.join(","))
            }
        }
    };
}

tuple_tagged!(A);
tuple_tagged!(A, B);
tuple_tagged!(A, B, C);
tuple_tagged!(A, B, C, D);
tuple_tagged!(A, B, C, D, E);
tuple_tagged!(A, B, C, D, E, F);
